use crate::models::{PriceRange, StructuredFilter};
use crate::services::{extract_json, ChatClient, ChatParams, UpstreamError};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are a restaurant search assistant. Parse user queries into \
structured data for restaurant matching. Always return valid JSON.";

const PARAMS: ChatParams = ChatParams { temperature: 0.3, max_tokens: 300 };

/// Shape the parsing call is asked to return
#[derive(Debug, Deserialize)]
struct ParsedQuery {
    #[serde(default)]
    cuisine: Vec<String>,
    #[serde(default)]
    vibe: Vec<String>,
    #[serde(rename = "priceRange", default)]
    price_range: Option<String>,
    #[serde(rename = "searchTerms", default)]
    search_terms: Vec<String>,
}

/// Turns free-text mood queries into a `StructuredFilter`
#[derive(Debug, Clone)]
pub struct QueryInterpreter {
    llm: Arc<ChatClient>,
}

impl QueryInterpreter {
    pub fn new(llm: Arc<ChatClient>) -> Self {
        Self { llm }
    }

    /// Interpret a query. Never fails: any upstream or parse error yields
    /// `StructuredFilter::degraded`.
    pub async fn interpret(&self, text: &str) -> StructuredFilter {
        match self.try_interpret(text).await {
            Ok(filter) => filter,
            Err(e) => {
                tracing::warn!(class = e.class(), "Query parsing unavailable, using raw text: {}", e);
                StructuredFilter::degraded(text)
            }
        }
    }

    async fn try_interpret(&self, text: &str) -> Result<StructuredFilter, UpstreamError> {
        let content = self.llm.complete(SYSTEM_PROMPT, &build_prompt(text), PARAMS).await?;
        parse_filter(&content, text)
    }
}

fn build_prompt(query: &str) -> String {
    format!(
        "Parse this restaurant search query and extract structured information:\n\
         Query: \"{query}\"\n\n\
         Return a JSON object with:\n\
         - cuisine: Array of cuisine types (e.g., [\"italian\", \"asian\", \"american\"])\n\
         - vibe: Array of atmosphere descriptors (e.g., [\"cozy\", \"lively\", \"quiet\", \"romantic\"])\n\
         - priceRange: One of \"budget\", \"mid-range\", \"upscale\", or \"any\"\n\
         - searchTerms: Array of key search terms for restaurant matching\n\n\
         Example output:\n\
         {{\"cuisine\": [\"italian\"], \"vibe\": [\"cozy\", \"romantic\"], \
         \"priceRange\": \"mid-range\", \"searchTerms\": [\"pasta\", \"wine\", \"intimate\"]}}"
    )
}

/// Validate the model's JSON object and coerce it into a filter.
///
/// Tags are lowercased and de-duplicated, blank entries dropped, unknown price
/// values become `Any`, and an empty term list falls back to the raw text.
fn parse_filter(content: &str, raw_text: &str) -> Result<StructuredFilter, UpstreamError> {
    let parsed: ParsedQuery = serde_json::from_str(extract_json(content, '{', '}'))
        .map_err(|e| UpstreamError::MalformedResponse(format!("query filter: {}", e)))?;

    let normalize = |items: Vec<String>| -> BTreeSet<String> {
        items
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    };

    let mut search_terms: BTreeSet<String> = parsed
        .search_terms
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if search_terms.is_empty() {
        search_terms.insert(raw_text.to_string());
    }

    Ok(StructuredFilter {
        cuisine: normalize(parsed.cuisine),
        vibe: normalize(parsed.vibe),
        price_range: parsed
            .price_range
            .as_deref()
            .map(PriceRange::parse)
            .unwrap_or(PriceRange::Any),
        search_terms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_clean_object() {
        let content = r#"{"cuisine": ["Italian"], "vibe": ["cozy", "Romantic"], "priceRange": "mid-range", "searchTerms": ["pasta", "wine"]}"#;
        let filter = parse_filter(content, "cozy italian").unwrap();

        assert!(filter.cuisine.contains("italian"));
        assert_eq!(filter.vibe.len(), 2);
        assert!(filter.vibe.contains("romantic"));
        assert_eq!(filter.price_range, PriceRange::MidRange);
        assert!(filter.search_terms.contains("pasta"));
    }

    #[test]
    fn test_parse_object_in_code_fence() {
        let content = "```json\n{\"cuisine\": [\"thai\"], \"vibe\": [], \"priceRange\": \"budget\", \"searchTerms\": []}\n```";
        let filter = parse_filter(content, "cheap thai").unwrap();

        assert_eq!(filter.price_range, PriceRange::Budget);
        assert!(filter.search_terms.contains("cheap thai"));
    }

    #[test]
    fn test_unknown_price_coerces_to_any() {
        let content = r#"{"cuisine": [], "vibe": [], "priceRange": "whatever"}"#;
        let filter = parse_filter(content, "anything").unwrap();
        assert_eq!(filter.price_range, PriceRange::Any);
    }

    #[test]
    fn test_malformed_content_is_error() {
        let err = parse_filter("I think you want pasta!", "pasta").unwrap_err();
        assert!(matches!(err, UpstreamError::MalformedResponse(_)));

        let err = parse_filter(r#"{"cuisine": "italian"}"#, "pasta").unwrap_err();
        assert!(matches!(err, UpstreamError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_interpret_without_credentials_degrades() {
        let llm = ChatClient::new(
            "http://127.0.0.1:9".to_string(),
            None,
            "m".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        let interpreter = QueryInterpreter::new(Arc::new(llm));

        let filter = interpreter.interpret("cozy Italian dinner").await;

        assert_eq!(filter, StructuredFilter::degraded("cozy Italian dinner"));
    }

    #[tokio::test]
    async fn test_interpret_with_model_response() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "choices": [{"message": {"content": "{\"cuisine\":[\"italian\"],\"vibe\":[\"cozy\"],\"priceRange\":\"upscale\",\"searchTerms\":[\"dinner\"]}"}}]
        });
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let llm = ChatClient::new(server.url(), Some("k".to_string()), "m".to_string(), Duration::from_secs(5))
            .unwrap();
        let filter = QueryInterpreter::new(Arc::new(llm)).interpret("cozy Italian dinner").await;

        assert!(filter.cuisine.contains("italian"));
        assert_eq!(filter.price_range, PriceRange::Upscale);
        assert!(filter.search_terms.contains("dinner"));
    }
}
