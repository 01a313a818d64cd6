use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub recommender: RecommenderSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Restaurant finder (Apify actor) settings
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
    #[serde(default = "default_actor")]
    pub actor: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_poll_wait_secs")]
    pub poll_wait_secs: u64,
    #[serde(default = "default_location")]
    pub default_location: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            actor: default_actor(),
            api_token: None,
            max_results: default_max_results(),
            poll_wait_secs: default_poll_wait_secs(),
            default_location: default_location(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SearchSettings {
    pub fn poll_wait(&self) -> Duration {
        Duration::from_secs(self.poll_wait_secs)
    }
}

fn default_search_base_url() -> String { "https://api.apify.com".to_string() }
fn default_actor() -> String { "cleansyntax~restaurant-finder-usa".to_string() }
fn default_max_results() -> usize { 20 }
fn default_poll_wait_secs() -> u64 { 3 }
fn default_location() -> String { "Brooklyn, NY".to_string() }
fn default_request_timeout_secs() -> u64 { 30 }

/// OpenAI-compatible chat gateway settings
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: None,
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_llm_base_url() -> String { "https://openrouter.ai/api/v1".to_string() }
fn default_model() -> String { "google/gemini-2.0-flash-001".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct RecommenderSettings {
    #[serde(default = "default_candidate_window")]
    pub candidate_window: usize,
    #[serde(default = "default_recommendation_count")]
    pub max_results: usize,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            candidate_window: default_candidate_window(),
            max_results: default_recommendation_count(),
        }
    }
}

fn default_candidate_window() -> usize { 10 }
fn default_recommendation_count() -> usize { 6 }

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_pipeline_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_pipeline_timeout_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl PipelineSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_pipeline_timeout_secs() -> u64 { 150 }
fn default_max_sessions() -> usize { 10_000 }

/// Slack on top of the summed stage timeouts
const DEADLINE_MARGIN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    /// Unknown names fall back to `Json`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" | "plain" | "text" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MOODBITE_)
    /// 5. Provider credentials from their conventional variables
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., MOODBITE__SEARCH__MAX_RESULTS -> search.max_results
            .add_source(
                Environment::with_prefix("MOODBITE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_credential_env(settings)?;

        settings.try_deserialize()
    }

    /// Worst case for one run when every upstream call times out:
    /// parse, start run, wait, read dataset, rank.
    pub fn stage_budget(&self) -> Duration {
        let llm = Duration::from_secs(self.llm.request_timeout_secs);
        let search = Duration::from_secs(self.search.request_timeout_secs);
        llm * 2 + search * 2 + self.search.poll_wait()
    }

    /// The configured deadline, raised when needed so it never fires before
    /// every stage has had the chance to time out and fall back.
    pub fn pipeline_deadline(&self) -> Duration {
        self.pipeline.timeout().max(self.stage_budget() + DEADLINE_MARGIN)
    }

    /// Load configuration from a custom path, with the same environment layers as `load`
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("MOODBITE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_credential_env(settings)?;

        settings.try_deserialize()
    }
}

/// Pick up provider credentials from the variables the hosting platform sets.
///
/// `APIFY_API_TOKEN` feeds `search.api_token`; `OPENROUTER_API_KEY` (or
/// `OPENAI_API_KEY`) feeds `llm.api_key`. Empty values are ignored.
fn apply_credential_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

    let apify_token = non_empty("APIFY_API_TOKEN");
    let llm_key = non_empty("OPENROUTER_API_KEY").or_else(|| non_empty("OPENAI_API_KEY"));

    let mut builder = Config::builder().add_source(settings);

    if let Some(token) = apify_token {
        builder = builder.set_override("search.api_token", token)?;
    }
    if let Some(key) = llm_key {
        builder = builder.set_override("llm.api_key", key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.search.max_results, 20);
        assert_eq!(settings.search.poll_wait_secs, 3);
        assert_eq!(settings.recommender.candidate_window, 10);
        assert_eq!(settings.recommender.max_results, 6);
        assert!(settings.search.api_token.is_none());
        assert!(settings.llm.api_key.is_none());
    }

    #[test]
    fn test_default_deadline_covers_stages() {
        let settings = Settings::default();

        assert_eq!(settings.stage_budget(), Duration::from_secs(123));
        assert_eq!(settings.pipeline_deadline(), Duration::from_secs(150));
        assert!(settings.pipeline.timeout() > settings.stage_budget());
    }

    #[test]
    fn test_short_deadline_is_raised() {
        let mut settings = Settings::default();
        settings.llm.request_timeout_secs = 1;
        settings.search.request_timeout_secs = 2;
        settings.search.poll_wait_secs = 0;
        settings.pipeline.timeout_secs = 1;

        assert_eq!(settings.stage_budget(), Duration::from_secs(6));
        assert_eq!(settings.pipeline_deadline(), Duration::from_secs(11));
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
        assert_eq!(LogFormat::parse(&format), LogFormat::Json);
    }

    #[test]
    fn test_log_format_names() {
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(" Compact "), LogFormat::Compact);
        assert_eq!(LogFormat::parse("text"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("nonsense"), LogFormat::Json);
    }

    #[test]
    fn test_load_from_applies_credential_env() {
        let path = std::env::temp_dir().join(format!("moodbite-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[search]\nmax_results = 7\n").unwrap();

        std::env::set_var("APIFY_API_TOKEN", "from-env");
        let loaded = Settings::load_from(&path);
        std::env::remove_var("APIFY_API_TOKEN");
        std::fs::remove_file(&path).unwrap();

        let settings = loaded.unwrap();
        assert_eq!(settings.search.max_results, 7);
        assert_eq!(settings.search.api_token.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_partial_file_keeps_section_defaults() {
        let source = r#"
            [search]
            max_results = 12
            default_location = "Austin, TX"

            [llm]
            model = "test-model"
        "#;

        let settings: Settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.search.max_results, 12);
        assert_eq!(settings.search.default_location, "Austin, TX");
        assert_eq!(settings.search.poll_wait_secs, 3);
        assert_eq!(settings.llm.model, "test-model");
        assert_eq!(settings.server.port, 8080);
    }
}
