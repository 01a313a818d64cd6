// Service exports
pub mod error;
pub mod finder;
pub mod llm;

pub use error::{extract_json, UpstreamError};
pub use finder::{RawListing, RestaurantFinderClient, SearchInput, PLACEHOLDER_IMAGE_URL};
pub use llm::{ChatClient, ChatParams};
