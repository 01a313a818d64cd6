use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Coarse price category of a restaurant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceTier {
    Budget,
    MidRange,
    Upscale,
}

impl PriceTier {
    /// Parse a tier from provider or model text.
    ///
    /// Accepts the canonical names in any case plus dollar-sign notation.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "budget" | "cheap" | "$" => Some(PriceTier::Budget),
            "mid-range" | "midrange" | "mid range" | "moderate" | "$$" => Some(PriceTier::MidRange),
            "upscale" | "expensive" | "$$$" | "$$$$" => Some(PriceTier::Upscale),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Budget => "budget",
            PriceTier::MidRange => "mid-range",
            PriceTier::Upscale => "upscale",
        }
    }
}

/// Price constraint extracted from a query: a tier or no preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceRange {
    Budget,
    MidRange,
    Upscale,
    Any,
}

impl PriceRange {
    /// Unknown or missing values coerce to `Any`
    pub fn parse(value: &str) -> Self {
        match PriceTier::parse(value) {
            Some(PriceTier::Budget) => PriceRange::Budget,
            Some(PriceTier::MidRange) => PriceRange::MidRange,
            Some(PriceTier::Upscale) => PriceRange::Upscale,
            None => PriceRange::Any,
        }
    }
}

/// A restaurant as fetched from the finder (or the offline set)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub cuisine: String,
    pub vibe: String,
    #[serde(rename = "priceRange")]
    pub price_range: PriceTier,
    pub rating: f64,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "openHours")]
    pub open_hours: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
}

/// Structured interpretation of a free-text mood query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredFilter {
    pub cuisine: BTreeSet<String>,
    pub vibe: BTreeSet<String>,
    #[serde(rename = "priceRange")]
    pub price_range: PriceRange,
    #[serde(rename = "searchTerms")]
    pub search_terms: BTreeSet<String>,
}

impl StructuredFilter {
    /// Filter used when semantic parsing is unavailable: the raw text is the only search term.
    pub fn degraded(raw_text: &str) -> Self {
        Self {
            cuisine: BTreeSet::new(),
            vibe: BTreeSet::new(),
            price_range: PriceRange::Any,
            search_terms: BTreeSet::from([raw_text.to_string()]),
        }
    }
}

/// Pipeline output: a record plus the optional ranking annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRestaurant {
    #[serde(flatten)]
    pub restaurant: RestaurantRecord,
    #[serde(rename = "relevanceScore", default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    #[serde(rename = "matchReason", default, skip_serializing_if = "Option::is_none")]
    pub match_reason: Option<String>,
    #[serde(rename = "enhancedDescription", default, skip_serializing_if = "Option::is_none")]
    pub enhanced_description: Option<String>,
}

impl RankedRestaurant {
    pub fn unranked(restaurant: RestaurantRecord) -> Self {
        Self {
            restaurant,
            relevance_score: None,
            match_reason: None,
            enhanced_description: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.restaurant.id
    }

    pub fn is_annotated(&self) -> bool {
        self.relevance_score.is_some()
            || self.match_reason.is_some()
            || self.enhanced_description.is_some()
    }
}

/// A saved restaurant for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "restaurantId")]
    pub restaurant_id: String,
    #[serde(rename = "savedAt")]
    pub saved_at: chrono::DateTime<chrono::Utc>,
}

/// Hand-curated list of restaurant references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurationList {
    pub id: String,
    pub name: String,
    pub description: String,
    pub restaurants: Vec<String>,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
