use crate::config::SearchSettings;
use crate::models::{PriceTier, RestaurantRecord};
use crate::services::UpstreamError;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Image used when a listing carries none
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1517248135467-4c7edcad34c4?w=400&h=300&fit=crop";

const DEFAULT_RATING: f64 = 4.0;

/// Prefix for identifiers the provider supplies; generated ones use `apify-{index}`
const PROVIDER_ID_PREFIX: &str = "apify:";

/// Restaurant finder API client (Apify actor runs)
///
/// A search is a two-step job:
/// - start an actor run with the search input
/// - wait one fixed step, then read the run's dataset once
pub struct RestaurantFinderClient {
    base_url: String,
    actor: String,
    api_token: Option<String>,
    poll_wait: Duration,
    client: Client,
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    input: &'a SearchInput<'a>,
    build: &'static str,
}

/// Input document for one actor run
#[derive(Debug, Serialize)]
pub struct SearchInput<'a> {
    #[serde(rename = "searchQuery")]
    pub search_query: &'a str,
    pub location: &'a str,
    #[serde(rename = "maxResults")]
    pub max_results: usize,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    data: RunData,
}

#[derive(Debug, Deserialize)]
struct RunData {
    id: String,
}

/// One dataset item as the actor reports it; every field may be absent
#[derive(Debug, Default, Deserialize)]
pub struct RawListing {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, rename = "placeId", deserialize_with = "lenient_string")]
    pub place_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cuisine: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub atmosphere: Option<String>,
    #[serde(default, rename = "priceRange", deserialize_with = "lenient_string")]
    pub price_range: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rating: Option<f64>,
    #[serde(default, rename = "imageUrl", deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hours: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub distance: Option<String>,
}

impl RawListing {
    /// Coerce a listing into a record, filling documented defaults for absent fields.
    ///
    /// Provider identifiers (`id`, else `placeId`) are namespaced so they never
    /// equal a generated `apify-{index}` or an offline `mock-N` id.
    pub fn into_record(self, index: usize) -> RestaurantRecord {
        let rating = self
            .rating
            .filter(|r| r.is_finite())
            .map(|r| r.clamp(0.0, 5.0))
            .unwrap_or(DEFAULT_RATING);

        RestaurantRecord {
            id: self
                .id
                .or(self.place_id)
                .map(|id| format!("{}{}", PROVIDER_ID_PREFIX, id))
                .unwrap_or_else(|| format!("apify-{}", index)),
            name: self.name.unwrap_or_else(|| "Unknown Restaurant".to_string()),
            address: self.address.unwrap_or_else(|| "Address not available".to_string()),
            cuisine: self.cuisine.unwrap_or_else(|| "Various".to_string()),
            vibe: self.atmosphere.unwrap_or_else(|| "Casual".to_string()),
            price_range: self
                .price_range
                .as_deref()
                .and_then(PriceTier::parse)
                .unwrap_or(PriceTier::MidRange),
            rating,
            image_url: self.image_url.unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string()),
            open_hours: self.hours.unwrap_or_else(|| "Hours vary".to_string()),
            description: self.description,
            distance: self.distance,
        }
    }
}

/// Strings and numbers become text; null, blanks and anything else become `None`
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Numbers and numeric strings become `f64`; anything else becomes `None`
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl RestaurantFinderClient {
    /// Create a new finder client
    pub fn new(
        base_url: String,
        actor: String,
        api_token: Option<String>,
        poll_wait: Duration,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            actor,
            api_token: api_token.filter(|t| !t.trim().is_empty()),
            poll_wait,
            client,
        })
    }

    pub fn from_settings(settings: &SearchSettings) -> Result<Self, UpstreamError> {
        Self::new(
            settings.base_url.clone(),
            settings.actor.clone(),
            settings.api_token.clone(),
            settings.poll_wait(),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_token.is_some()
    }

    fn runs_url(&self) -> String {
        format!(
            "{}/v2/acts/{}/runs",
            self.base_url.trim_end_matches('/'),
            self.actor
        )
    }

    /// Run one search and return the raw dataset items.
    ///
    /// Items that are not JSON objects are dropped; nothing is retried.
    pub async fn search(&self, input: &SearchInput<'_>) -> Result<Vec<RawListing>, UpstreamError> {
        let token = self
            .api_token
            .as_deref()
            .ok_or(UpstreamError::ConfigurationMissing("restaurant finder"))?;

        let run_id = self.start_run(token, input).await?;

        tracing::debug!("Finder run {} started, waiting {:?}", run_id, self.poll_wait);
        tokio::time::sleep(self.poll_wait).await;

        self.fetch_items(token, &run_id).await
    }

    async fn start_run(&self, token: &str, input: &SearchInput<'_>) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(self.runs_url())
            .bearer_auth(token)
            .json(&RunRequest { input, build: "latest" })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(format!(
                "Failed to start finder run: {}",
                response.status()
            )));
        }

        let run: RunResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::MalformedResponse(format!("run response: {}", e)))?;

        Ok(run.data.id)
    }

    async fn fetch_items(&self, token: &str, run_id: &str) -> Result<Vec<RawListing>, UpstreamError> {
        let url = format!(
            "{}/{}/dataset/items",
            self.runs_url(),
            urlencoding::encode(run_id)
        );

        let response = self.client.get(&url).bearer_auth(token).send().await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(format!(
                "Failed to fetch finder results: {}",
                response.status()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::MalformedResponse(format!("dataset body: {}", e)))?;

        let items = json
            .as_array()
            .ok_or_else(|| UpstreamError::MalformedResponse("dataset is not an array".into()))?;

        let listings: Vec<RawListing> = items
            .iter()
            .filter(|item| item.is_object())
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect();

        if listings.len() < items.len() {
            tracing::warn!(
                "Rejected {} of {} finder items with an unusable shape",
                items.len() - listings.len(),
                items.len()
            );
        }

        Ok(listings)
    }
}
