use crate::config::Settings;
use crate::core::{CandidateSource, QueryInterpreter, Recommender};
use crate::models::{RankedRestaurant, RestaurantRecord};
use crate::services::{ChatClient, RestaurantFinderClient, UpstreamError};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Errors surfaced to the caller of `submit`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Query must not be empty")]
    EmptyQuery,
}

/// Lifecycle of one session's search
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Loading { query: String },
    Results { ranked: Vec<RankedRestaurant>, query: String },
    /// A stage failed past its own fallback (panic or deadline)
    Failed { reason: String },
}

/// What a `submit` call did
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The run finished; holds `Results` or `Failed`
    Completed(PipelineState),
    /// Another run for this session is still loading; nothing was started
    Busy,
}

/// The three pipeline stages wired together
///
/// # Pipeline Stages
/// 1. Interpret the query (logged only)
/// 2. Fetch candidates for the location
/// 3. Rank and annotate candidates against the query
pub struct Pipeline {
    interpreter: QueryInterpreter,
    source: CandidateSource,
    recommender: Recommender,
    default_location: String,
    timeout: Duration,
}

impl Pipeline {
    pub fn new(
        interpreter: QueryInterpreter,
        source: CandidateSource,
        recommender: Recommender,
        default_location: String,
        timeout: Duration,
    ) -> Self {
        Self {
            interpreter,
            source,
            recommender,
            default_location,
            timeout,
        }
    }

    /// Build the clients and stages from configuration
    pub fn from_settings(settings: &Settings) -> Result<Self, UpstreamError> {
        let llm = Arc::new(ChatClient::from_settings(&settings.llm)?);
        let finder = Arc::new(RestaurantFinderClient::from_settings(&settings.search)?);

        if !llm.is_configured() {
            tracing::warn!("No LLM API key configured; queries will not be parsed or ranked");
        }
        if !finder.is_configured() {
            tracing::warn!("No restaurant finder token configured; serving the offline set");
        }

        let deadline = settings.pipeline_deadline();
        if deadline > settings.pipeline.timeout() {
            tracing::warn!(
                "pipeline.timeout_secs={} is below the stage timeouts ({:?}); using {:?}",
                settings.pipeline.timeout_secs,
                settings.stage_budget(),
                deadline
            );
        }

        Ok(Self::new(
            QueryInterpreter::new(Arc::clone(&llm)),
            CandidateSource::new(finder, settings.search.max_results),
            Recommender::new(
                llm,
                settings.recommender.candidate_window,
                settings.recommender.max_results,
            ),
            settings.search.default_location.clone(),
            deadline,
        ))
    }

    pub fn default_location(&self) -> &str {
        &self.default_location
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run all stages in order. Each stage absorbs its own upstream failures.
    pub async fn run(&self, query: &str, location: &str) -> Vec<RankedRestaurant> {
        let filter = self.interpreter.interpret(query).await;
        tracing::info!(
            cuisine = ?filter.cuisine,
            vibe = ?filter.vibe,
            price = ?filter.price_range,
            terms = ?filter.search_terms,
            "Interpreted query"
        );

        let candidates = self.source.fetch(location, Some(query)).await;
        let ranked = self.recommender.rank(&candidates, query).await;

        tracing::info!(
            "Recommending {} of {} candidates near {}",
            ranked.len(),
            candidates.len(),
            location
        );

        ranked
    }
}

/// One user's search state machine
///
/// At most one pipeline runs per session: a submit while `Loading` is ignored
/// and reported as `Busy`.
pub struct SearchSession {
    user_id: String,
    pipeline: Arc<Pipeline>,
    state: Mutex<PipelineState>,
}

impl SearchSession {
    pub fn new(user_id: impl Into<String>, pipeline: Arc<Pipeline>) -> Self {
        Self {
            user_id: user_id.into(),
            pipeline,
            state: Mutex::new(PipelineState::Idle),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> PipelineState {
        self.lock().clone()
    }

    /// Records currently on display, empty unless the session holds results
    pub fn displayed(&self) -> Vec<RestaurantRecord> {
        match &*self.lock() {
            PipelineState::Results { ranked, .. } => {
                ranked.iter().map(|r| r.restaurant.clone()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Submit a query.
    ///
    /// Blank queries are rejected without touching the state. The run itself
    /// is detached from the caller, so dropping the returned future still lets
    /// the session leave `Loading`.
    pub async fn submit(
        self: &Arc<Self>,
        query: &str,
        location: Option<&str>,
    ) -> Result<SubmitOutcome, PipelineError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PipelineError::EmptyQuery);
        }

        {
            let mut state = self.lock();
            if matches!(*state, PipelineState::Loading { .. }) {
                tracing::info!("Ignoring submit for {} while a search is loading", self.user_id);
                return Ok(SubmitOutcome::Busy);
            }
            *state = PipelineState::Loading { query: query.to_string() };
        }

        let location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| self.pipeline.default_location())
            .to_string();

        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("pipeline", %run_id, user_id = %self.user_id);
        let driver = tokio::spawn(Arc::clone(self).drive(query.to_string(), location).instrument(span));

        let outcome = match driver.await {
            Ok(outcome) => outcome,
            Err(e) => self.finish(PipelineState::Failed {
                reason: format!("pipeline driver aborted: {}", e),
            }),
        };

        Ok(SubmitOutcome::Completed(outcome))
    }

    async fn drive(self: Arc<Self>, query: String, location: String) -> PipelineState {
        let pipeline = Arc::clone(&self.pipeline);
        let stage_query = query.clone();
        let stages = tokio::spawn(
            async move { pipeline.run(&stage_query, &location).await }.in_current_span(),
        );

        let outcome = self.settle(stages, query).await;
        self.finish(outcome)
    }

    /// Wait for the stage task under the deadline. A panic or an overrun is `Failed`.
    async fn settle(
        &self,
        mut stages: JoinHandle<Vec<RankedRestaurant>>,
        query: String,
    ) -> PipelineState {
        match tokio::time::timeout(self.pipeline.timeout(), &mut stages).await {
            Ok(Ok(ranked)) => PipelineState::Results { ranked, query },
            Ok(Err(e)) => PipelineState::Failed {
                reason: format!("pipeline stage aborted: {}", e),
            },
            Err(_) => {
                stages.abort();
                PipelineState::Failed {
                    reason: format!("pipeline exceeded {:?}", self.pipeline.timeout()),
                }
            }
        }
    }

    /// Store the outcome. A failure is logged and the session recovers to `Idle`.
    fn finish(&self, outcome: PipelineState) -> PipelineState {
        let mut state = self.lock();
        match &outcome {
            PipelineState::Failed { reason } => {
                tracing::error!("Search failed for {}: {}", self.user_id, reason);
                *state = PipelineState::Idle;
            }
            _ => *state = outcome.clone(),
        }
        outcome
    }
}

/// Sessions kept when no capacity is configured
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Hands out one `SearchSession` per user
///
/// Holds at most `capacity` sessions; the least recently used one is dropped
/// to make room. A dropped session that is still loading finishes its run on
/// its own handle, and the user starts over at `Idle`.
pub struct SessionRegistry {
    pipeline: Arc<Pipeline>,
    sessions: Mutex<LruCache<String, Arc<SearchSession>>>,
}

impl SessionRegistry {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self::with_capacity(pipeline, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_capacity(pipeline: Arc<Pipeline>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            pipeline,
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Arc<SearchSession>>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The user's session, created on first use
    pub fn session(&self, user_id: &str) -> Arc<SearchSession> {
        let mut sessions = self.lock();
        if let Some(session) = sessions.get(user_id) {
            return Arc::clone(session);
        }

        let session = Arc::new(SearchSession::new(user_id, Arc::clone(&self.pipeline)));
        if let Some((evicted, _)) = sessions.push(user_id.to_string(), Arc::clone(&session)) {
            tracing::debug!("Session registry full, dropped session for {}", evicted);
        }
        session
    }

    /// The user's session if one exists
    pub fn get(&self, user_id: &str) -> Option<Arc<SearchSession>> {
        self.lock().get(user_id).cloned()
    }
}
