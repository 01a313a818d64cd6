// Route exports
pub mod discover;
pub mod lists;
pub mod saved;

use actix_web::web;
use crate::core::{CurationCatalog, SavedSet, SessionRegistry};
use crate::models::{RankedRestaurant, RestaurantView};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub saved: Arc<SavedSet>,
    pub catalog: Arc<CurationCatalog>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(discover::configure)
            .configure(saved::configure)
            .configure(lists::configure),
    );
}

/// Join restaurants with the user's saved state; no user means nothing is saved
pub(crate) fn to_views(
    restaurants: Vec<RankedRestaurant>,
    saved: &SavedSet,
    user_id: Option<&str>,
) -> Vec<RestaurantView> {
    restaurants
        .into_iter()
        .map(|restaurant| {
            let is_saved = user_id.is_some_and(|user| saved.is_saved(user, restaurant.id()));
            RestaurantView { restaurant, is_saved }
        })
        .collect()
}
