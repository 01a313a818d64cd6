use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to run a mood search
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Request to save or unsave a restaurant
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookmarkRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "restaurant_id", rename = "restaurantId")]
    pub restaurant_id: String,
}

/// Query string carrying the requesting user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

/// Optional user for read-only endpoints that join saved state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionalUserQuery {
    #[serde(alias = "user_id", rename = "userId", default)]
    pub user_id: Option<String>,
}
