use thiserror::Error;

/// Errors that can occur when calling an upstream provider
///
/// None of these reach the user: every caller resolves them with a local fallback.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("No credentials configured for {0}")]
    ConfigurationMissing(&'static str),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    Status(String),

    #[error("Invalid response format: {0}")]
    MalformedResponse(String),
}

impl UpstreamError {
    /// Failure class used in fallback log lines
    pub fn class(&self) -> &'static str {
        match self {
            UpstreamError::ConfigurationMissing(_) => "configuration_missing",
            UpstreamError::Transport(_) | UpstreamError::Status(_) => "transport_failure",
            UpstreamError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// Cut the JSON value out of model output that wraps it in prose or code fences.
///
/// Returns the slice from the first `open` to the last `close`, or the input
/// unchanged when no such span exists.
pub fn extract_json(content: &str, open: char, close: char) -> &str {
    match (content.find(open), content.rfind(close)) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(UpstreamError::ConfigurationMissing("llm").class(), "configuration_missing");
        assert_eq!(UpstreamError::Status("500".into()).class(), "transport_failure");
        assert_eq!(UpstreamError::MalformedResponse("x".into()).class(), "malformed_response");
    }

    #[test]
    fn test_extract_json_from_code_fence() {
        let input = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(input, '{', '}'), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_array_embedded_in_text() {
        let input = "Here you go: [1, 2, 3] enjoy";
        assert_eq!(extract_json(input, '[', ']'), "[1, 2, 3]");
    }

    #[test]
    fn test_extract_json_without_delimiters() {
        assert_eq!(extract_json("no json here", '{', '}'), "no json here");
    }
}
