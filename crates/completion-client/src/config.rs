use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Connection and retry settings for the completion endpoint.
///
/// Lives under the `completion:` key of `.raos/config.yaml`; every field has
/// a default so a partial (or absent) section is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Rate-limit backoff is `backoff_base_ms * 2^attempt`.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "x-ai/grok-4-fast:free".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            referer: None,
            title: None,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.timeout(), Duration::from_secs(60));
        assert_eq!(cfg.backoff_base(), Duration::from_secs(1));
        assert_eq!(cfg.api_key_env, "OPENROUTER_API_KEY");
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg: ClientConfig = parse_json(r#"{"model": "local/llama"}"#);
        assert_eq!(cfg.model, "local/llama");
        assert_eq!(cfg.base_url, "https://openrouter.ai/api/v1");
        assert!((cfg.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let cfg = ClientConfig {
            base_url: "http://localhost:8080/v1/".into(),
            ..Default::default()
        };
        assert_eq!(cfg.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    fn parse_json(json: &str) -> ClientConfig {
        serde_json::from_str(json).unwrap()
    }
}
