use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::models::{BookmarkRequest, BookmarkResponse, ErrorResponse, SavedResponse, UserQuery};
use crate::routes::AppState;

/// Configure bookmark routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/saved")
            .route(web::get().to(list_saved))
            .route(web::post().to(save_restaurant))
            .route(web::delete().to(unsave_restaurant)),
    );
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Save a restaurant
///
/// POST /api/v1/saved
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "restaurantId": "string"
/// }
/// ```
async fn save_restaurant(
    state: web::Data<AppState>,
    req: web::Json<BookmarkRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    state.saved.save(&req.user_id, &req.restaurant_id);

    HttpResponse::Ok().json(BookmarkResponse {
        restaurant_id: req.restaurant_id.clone(),
        is_saved: true,
    })
}

/// Remove a saved restaurant; removing an absent bookmark succeeds
///
/// DELETE /api/v1/saved
async fn unsave_restaurant(
    state: web::Data<AppState>,
    req: web::Json<BookmarkRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    state.saved.unsave(&req.user_id, &req.restaurant_id);

    HttpResponse::Ok().json(BookmarkResponse {
        restaurant_id: req.restaurant_id.clone(),
        is_saved: false,
    })
}

/// List a user's bookmarks
///
/// GET /api/v1/saved?userId={userId}
async fn list_saved(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    let saved = state.saved.list_saved(&query.user_id);

    HttpResponse::Ok().json(SavedResponse {
        user_id: query.user_id.clone(),
        count: saved.len(),
        saved,
    })
}
