use serde::{Deserialize, Serialize};
use crate::models::domain::{Bookmark, CurationList, RankedRestaurant};

/// A ranked restaurant joined with the requesting user's saved state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantView {
    #[serde(flatten)]
    pub restaurant: RankedRestaurant,
    #[serde(rename = "isSaved")]
    pub is_saved: bool,
}

/// Outcome label of a search request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Idle,
    Loading,
    Results,
    Busy,
    Failed,
}

/// Response for the search and session state endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: SearchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub restaurants: Vec<RestaurantView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response listing a user's bookmarks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub saved: Vec<Bookmark>,
    pub count: usize,
}

/// Response after a save or unsave
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkResponse {
    #[serde(rename = "restaurantId")]
    pub restaurant_id: String,
    #[serde(rename = "isSaved")]
    pub is_saved: bool,
}

/// A curation list with its restaurants resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationListResponse {
    #[serde(flatten)]
    pub list: CurationList,
    #[serde(rename = "restaurantDetails")]
    pub restaurant_details: Vec<RestaurantView>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
