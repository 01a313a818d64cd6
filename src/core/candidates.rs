use crate::models::{PriceTier, RestaurantRecord};
use crate::services::{RestaurantFinderClient, SearchInput, UpstreamError};
use std::collections::HashSet;
use std::sync::Arc;

/// Search text sent when the user query is absent
const DEFAULT_SEARCH_QUERY: &str = "restaurants";

/// Fetches restaurant candidates, falling back to the offline set
pub struct CandidateSource {
    finder: Arc<RestaurantFinderClient>,
    max_results: usize,
}

impl CandidateSource {
    pub fn new(finder: Arc<RestaurantFinderClient>, max_results: usize) -> Self {
        Self { finder, max_results }
    }

    /// Fetch up to `max_results` candidates for a location.
    ///
    /// Never fails: missing credentials, transport errors, non-success statuses
    /// and malformed bodies all return `offline_restaurants()`.
    pub async fn fetch(&self, location: &str, query_text: Option<&str>) -> Vec<RestaurantRecord> {
        match self.try_fetch(location, query_text).await {
            Ok(records) => {
                tracing::debug!("Finder returned {} candidates for {}", records.len(), location);
                records
            }
            Err(e) => {
                tracing::warn!(class = e.class(), "Restaurant finder unavailable, using offline set: {}", e);
                offline_restaurants()
            }
        }
    }

    async fn try_fetch(
        &self,
        location: &str,
        query_text: Option<&str>,
    ) -> Result<Vec<RestaurantRecord>, UpstreamError> {
        let search_query = query_text
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_SEARCH_QUERY);

        let input = SearchInput {
            search_query,
            location,
            max_results: self.max_results,
        };

        let listings = self.finder.search(&input).await?;

        // First occurrence of each id wins
        let mut seen = HashSet::new();
        let mut repeated = 0;
        let records: Vec<RestaurantRecord> = listings
            .into_iter()
            .enumerate()
            .map(|(index, listing)| listing.into_record(index))
            .filter(|record| {
                let fresh = seen.insert(record.id.clone());
                if !fresh {
                    repeated += 1;
                }
                fresh
            })
            .take(self.max_results)
            .collect();

        if repeated > 0 {
            tracing::debug!("Dropped {} finder items with repeated ids", repeated);
        }

        Ok(records)
    }
}

#[allow(clippy::too_many_arguments)]
fn record(
    id: &str,
    name: &str,
    address: &str,
    cuisine: &str,
    vibe: &str,
    price_range: PriceTier,
    rating: f64,
    image_url: &str,
    open_hours: &str,
    description: &str,
) -> RestaurantRecord {
    RestaurantRecord {
        id: id.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        cuisine: cuisine.to_string(),
        vibe: vibe.to_string(),
        price_range,
        rating,
        image_url: image_url.to_string(),
        open_hours: open_hours.to_string(),
        description: Some(description.to_string()),
        distance: None,
    }
}

/// The fixed offline candidate set, identical on every call
pub fn offline_restaurants() -> Vec<RestaurantRecord> {
    vec![
        record(
            "mock-1",
            "The Cozy Corner",
            "123 Main St, Your City",
            "Italian",
            "Cozy",
            PriceTier::MidRange,
            4.5,
            "https://images.unsplash.com/photo-1555396273-367ea4eb4db5?w=400&h=300&fit=crop",
            "5:00 PM - 10:00 PM",
            "Intimate Italian bistro with handmade pasta and warm ambiance.",
        ),
        record(
            "mock-2",
            "Sunrise Cafe",
            "456 Oak Ave, Your City",
            "American",
            "Bright",
            PriceTier::Budget,
            4.2,
            "https://images.unsplash.com/photo-1554118811-1e0d58224f24?w=400&h=300&fit=crop",
            "7:00 AM - 3:00 PM",
            "Cheerful breakfast spot with fresh ingredients and friendly service.",
        ),
        record(
            "mock-3",
            "Zen Garden",
            "789 Pine St, Your City",
            "Asian",
            "Peaceful",
            PriceTier::MidRange,
            4.7,
            "https://images.unsplash.com/photo-1579027989536-b7b1f875659b?w=400&h=300&fit=crop",
            "12:00 PM - 9:00 PM",
            "Tranquil Asian fusion with beautiful garden seating.",
        ),
        record(
            "mock-4",
            "The Lively Pub",
            "321 Beer St, Your City",
            "Pub Food",
            "Energetic",
            PriceTier::Budget,
            4.0,
            "https://images.unsplash.com/photo-1543007630-9710e4a00a20?w=400&h=300&fit=crop",
            "4:00 PM - 12:00 AM",
            "Vibrant sports bar with craft beers and hearty comfort food.",
        ),
        record(
            "mock-5",
            "Fine Dining Experience",
            "555 Luxury Blvd, Your City",
            "French",
            "Elegant",
            PriceTier::Upscale,
            4.8,
            "https://images.unsplash.com/photo-1414235077428-338989a2e8c0?w=400&h=300&fit=crop",
            "6:00 PM - 11:00 PM",
            "Sophisticated French cuisine in an upscale setting.",
        ),
        record(
            "mock-6",
            "Taco Fiesta",
            "777 Spice Ave, Your City",
            "Mexican",
            "Fun",
            PriceTier::Budget,
            4.3,
            "https://images.unsplash.com/photo-1565299624946-b28f40a0ca4b?w=400&h=300&fit=crop",
            "11:00 AM - 10:00 PM",
            "Colorful Mexican cantina with authentic flavors and festive atmosphere.",
        ),
    ]
}
