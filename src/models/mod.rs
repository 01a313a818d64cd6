// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Bookmark, CurationList, PriceRange, PriceTier, RankedRestaurant, RestaurantRecord, StructuredFilter};
pub use requests::{BookmarkRequest, OptionalUserQuery, SearchRequest, UserQuery};
pub use responses::{BookmarkResponse, CurationListResponse, ErrorResponse, HealthResponse, RestaurantView, SavedResponse, SearchResponse, SearchStatus};
