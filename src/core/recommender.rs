use crate::models::{RankedRestaurant, RestaurantRecord};
use crate::services::{extract_json, ChatClient, ChatParams, UpstreamError};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are a restaurant recommendation expert. Analyze restaurants and \
match them to user preferences with detailed explanations.";

const PARAMS: ChatParams = ChatParams { temperature: 0.7, max_tokens: 1500 };

const MAX_RELEVANCE_SCORE: f64 = 10.0;

/// Annotation fields read back from the ranking call; the record itself is
/// taken from the candidate with the same id.
#[derive(Debug, Deserialize)]
struct RankedAnnotation {
    id: String,
    #[serde(rename = "relevanceScore", default)]
    relevance_score: Option<f64>,
    #[serde(rename = "matchReason", default)]
    match_reason: Option<String>,
    #[serde(rename = "enhancedDescription", default)]
    enhanced_description: Option<String>,
}

/// Ranks and annotates candidates against the user's query text
#[derive(Debug, Clone)]
pub struct Recommender {
    llm: Arc<ChatClient>,
    candidate_window: usize,
    max_results: usize,
}

impl Recommender {
    pub fn new(llm: Arc<ChatClient>, candidate_window: usize, max_results: usize) -> Self {
        Self {
            llm,
            candidate_window,
            max_results,
        }
    }

    /// Rank candidates for a query.
    ///
    /// Returns at most `min(max_results, candidates.len())` items. On any upstream
    /// failure the first `max_results` candidates are returned unannotated.
    pub async fn rank(&self, candidates: &[RestaurantRecord], query_text: &str) -> Vec<RankedRestaurant> {
        if candidates.is_empty() {
            return Vec::new();
        }

        match self.try_rank(candidates, query_text).await {
            Ok(ranked) => {
                tracing::debug!("Ranked {} of {} candidates", ranked.len(), candidates.len());
                ranked
            }
            Err(e) => {
                tracing::warn!(class = e.class(), "Ranking unavailable, returning candidates unranked: {}", e);
                self.unranked(candidates)
            }
        }
    }

    /// The fallback path: a prefix of the input, fields untouched
    pub fn unranked(&self, candidates: &[RestaurantRecord]) -> Vec<RankedRestaurant> {
        candidates
            .iter()
            .take(self.max_results)
            .cloned()
            .map(RankedRestaurant::unranked)
            .collect()
    }

    async fn try_rank(
        &self,
        candidates: &[RestaurantRecord],
        query_text: &str,
    ) -> Result<Vec<RankedRestaurant>, UpstreamError> {
        let window = &candidates[..candidates.len().min(self.candidate_window)];

        let payload = serde_json::to_string(window)
            .map_err(|e| UpstreamError::MalformedResponse(format!("candidate payload: {}", e)))?;

        let content = self
            .llm
            .complete(SYSTEM_PROMPT, &build_prompt(query_text, &payload, self.max_results), PARAMS)
            .await?;

        join_annotations(&content, window, self.max_results)
    }
}

fn build_prompt(query: &str, candidates_json: &str, count: usize) -> String {
    format!(
        "Given this user query: \"{query}\"\n\
         And these restaurant options: {candidates_json}\n\n\
         Rank and filter the restaurants based on how well they match the user's mood and preferences.\n\
         Return the top {count} restaurants with enhanced descriptions that highlight why they match the query.\n\n\
         For each restaurant, include:\n\
         - All original data, including the unchanged \"id\"\n\
         - relevanceScore (1-10)\n\
         - matchReason: Brief explanation of why it matches\n\
         - enhancedDescription: 1-2 sentences describing the atmosphere and food\n\n\
         Return as JSON array."
    )
}

/// Validate the ranking response and join it against the candidates sent.
///
/// Items with unknown or repeated ids, or without an id at all, are dropped.
/// A response that matches no candidate is malformed. Output is ordered by
/// score, highest first, keeping the model's order for ties and unscored items
/// last.
fn join_annotations(
    content: &str,
    window: &[RestaurantRecord],
    max_results: usize,
) -> Result<Vec<RankedRestaurant>, UpstreamError> {
    let items: Vec<Value> = serde_json::from_str(extract_json(content, '[', ']'))
        .map_err(|e| UpstreamError::MalformedResponse(format!("ranking array: {}", e)))?;

    let mut seen = HashSet::new();
    let mut ranked: Vec<RankedRestaurant> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RankedAnnotation>(item).ok())
        .filter_map(|annotation| {
            let record = window.iter().find(|r| r.id == annotation.id)?;
            if !seen.insert(record.id.clone()) {
                return None;
            }
            Some(RankedRestaurant {
                restaurant: record.clone(),
                relevance_score: annotation
                    .relevance_score
                    .filter(|s| s.is_finite())
                    .map(|s| s.clamp(0.0, MAX_RELEVANCE_SCORE)),
                match_reason: non_blank(annotation.match_reason),
                enhanced_description: non_blank(annotation.enhanced_description),
            })
        })
        .collect();

    if ranked.is_empty() {
        return Err(UpstreamError::MalformedResponse(
            "ranking matched no candidate".into(),
        ));
    }

    ranked.sort_by(|a, b| match (a.relevance_score, b.relevance_score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    ranked.truncate(max_results);

    Ok(ranked)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
