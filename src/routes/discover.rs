use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{PipelineError, PipelineState, SavedSet, SubmitOutcome};
use crate::models::{ErrorResponse, HealthResponse, SearchRequest, SearchResponse, SearchStatus, UserQuery};
use crate::routes::{to_views, AppState};

/// Configure search routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/discover/search", web::post().to(search))
        .route("/discover/state", web::get().to(session_state));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Render a session state for one user
pub(crate) fn state_response(state: PipelineState, saved: &SavedSet, user_id: &str) -> SearchResponse {
    match state {
        PipelineState::Idle => SearchResponse {
            status: SearchStatus::Idle,
            query: None,
            restaurants: vec![],
            message: None,
        },
        PipelineState::Loading { query } => SearchResponse {
            status: SearchStatus::Loading,
            query: Some(query),
            restaurants: vec![],
            message: None,
        },
        PipelineState::Results { ranked, query } => SearchResponse {
            status: SearchStatus::Results,
            query: Some(query),
            restaurants: to_views(ranked, saved, Some(user_id)),
            message: None,
        },
        PipelineState::Failed { reason } => SearchResponse {
            status: SearchStatus::Failed,
            query: None,
            restaurants: vec![],
            message: Some(reason),
        },
    }
}

/// Run a mood search
///
/// POST /api/v1/discover/search
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "query": "cozy Italian dinner",
///   "location": "Brooklyn, NY"
/// }
/// ```
async fn search(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let session = state.sessions.session(&req.user_id);

    match session.submit(&req.query, req.location.as_deref()).await {
        Err(e @ PipelineError::EmptyQuery) => HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid query".to_string(),
            message: e.to_string(),
            status_code: 400,
        }),
        Ok(SubmitOutcome::Busy) => HttpResponse::Conflict().json(SearchResponse {
            status: SearchStatus::Busy,
            query: None,
            restaurants: vec![],
            message: Some("A search is already loading for this user".to_string()),
        }),
        Ok(SubmitOutcome::Completed(outcome)) => {
            let failed = matches!(outcome, PipelineState::Failed { .. });
            let body = state_response(outcome, &state.saved, &req.user_id);
            if failed {
                HttpResponse::ServiceUnavailable().json(body)
            } else {
                tracing::info!(
                    "Returning {} restaurants for user {}",
                    body.restaurants.len(),
                    req.user_id
                );
                HttpResponse::Ok().json(body)
            }
        }
    }
}

/// Current search state for a user
///
/// GET /api/v1/discover/state?userId={userId}
async fn session_state(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let current = state
        .sessions
        .get(&query.user_id)
        .map(|session| session.state())
        .unwrap_or(PipelineState::Idle);

    HttpResponse::Ok().json(state_response(current, &state.saved, &query.user_id))
}
