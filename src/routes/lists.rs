use actix_web::{web, HttpResponse, Responder};
use crate::models::{CurationListResponse, ErrorResponse, OptionalUserQuery, RankedRestaurant};
use crate::routes::{to_views, AppState};

/// Configure curation list routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/lists", web::get().to(list_curation_lists))
        .route("/lists/{id}", web::get().to(select_list));
}

/// GET /api/v1/lists
async fn list_curation_lists(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.catalog.lists())
}

/// Resolve one list's restaurants
///
/// GET /api/v1/lists/{id}?userId={userId}
///
/// With a user, restaurants from that user's current results are preferred and
/// saved flags are joined in.
async fn select_list(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<OptionalUserQuery>,
) -> impl Responder {
    let list_id = path.into_inner();
    let user_id = query.user_id.as_deref().filter(|u| !u.is_empty());

    let displayed = user_id
        .and_then(|user| state.sessions.get(user))
        .map(|session| session.displayed())
        .unwrap_or_default();

    match state.catalog.select_list(&list_id, &displayed) {
        Some((list, restaurants)) => {
            let ranked = restaurants.into_iter().map(RankedRestaurant::unranked).collect();
            HttpResponse::Ok().json(CurationListResponse {
                list: list.clone(),
                restaurant_details: to_views(ranked, &state.saved, user_id),
            })
        }
        None => HttpResponse::NotFound().json(ErrorResponse {
            error: "List not found".to_string(),
            message: format!("No curation list with id {}", list_id),
            status_code: 404,
        }),
    }
}
