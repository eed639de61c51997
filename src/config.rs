use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{NodeflowError, Result};

/// Default ceiling on node dispatches per run.
pub const DEFAULT_MAX_STEPS: u64 = 1000;
/// Default ceiling on run wall-clock time, 5 minutes.
pub const DEFAULT_MAX_DURATION_MS: u64 = 300_000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// execution limits
    pub limits: LimitsConfig,
    /// llm task config
    pub llm: LlmConfig,
    /// http task config
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// max node dispatches per run, defaults to 1000
    pub max_steps: u64,
    /// max run duration in milliseconds, defaults to 300000
    pub max_duration_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_duration_ms: DEFAULT_MAX_DURATION_MS,
        }
    }
}

impl LimitsConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }
}

/// Which adapter backs the LLM node type. Chosen once per process.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LlmAdapter {
    /// Talk to each provider's streaming API directly.
    #[default]
    Direct,
    /// Forward every request to a local relay that speaks to the providers.
    Proxy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// adapter used by the llm task
    pub adapter: LlmAdapter,
    /// base url of the relay, used when adapter is `proxy`
    pub proxy_url: String,
    /// override for the openai chat completions endpoint
    pub openai_url: Option<String>,
    /// override for the groq chat completions endpoint
    pub groq_url: Option<String>,
    /// override for the gemini api base
    pub gemini_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            adapter: LlmAdapter::Direct,
            proxy_url: "http://127.0.0.1:8000".to_string(),
            openai_url: None,
            groq_url: None,
            gemini_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref()).map_err(|e| NodeflowError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), e)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use crate::{Config, LlmAdapter};

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
        [limits]
        max_steps = 10
        max_duration_ms = 2000

        [llm]
        adapter = "proxy"
        proxy_url = "http://localhost:9000"

        [http]
        timeout_ms = 500
        "#;
        let config = Config::load_from_str(toml_str).unwrap();
        assert_eq!(config.limits.max_steps, 10);
        assert_eq!(config.limits.max_duration_ms, 2000);
        assert_eq!(config.llm.adapter, LlmAdapter::Proxy);
        assert_eq!(config.llm.proxy_url, "http://localhost:9000");
        assert_eq!(config.http.timeout_ms, 500);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::load_from_str("").unwrap();
        assert_eq!(config.limits.max_steps, 1000);
        assert_eq!(config.limits.max_duration_ms, 300_000);
        assert_eq!(config.llm.adapter, LlmAdapter::Direct);
        assert!(config.llm.openai_url.is_none());
    }

    #[test]
    fn test_config_rejects_unknown_adapter() {
        let err = Config::load_from_str("[llm]\nadapter = \"carrier-pigeon\"").unwrap_err();
        assert!(matches!(err, crate::NodeflowError::Config(_)));
    }
}
