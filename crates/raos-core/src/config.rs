use crate::error::Result;
use crate::paths;
use completion_client::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of stage executions in flight at once.
    #[serde(default = "default_gate_capacity")]
    pub gate_capacity: usize,
    #[serde(default = "default_extraction_max_tokens")]
    pub extraction_max_tokens: u32,
    #[serde(default = "default_mockup_max_tokens")]
    pub mockup_max_tokens: u32,
    /// Full generate-and-validate attempts before the mockup stage gives up.
    #[serde(default = "default_mockup_attempts")]
    pub mockup_attempts: u32,
}

fn default_gate_capacity() -> usize {
    5
}

fn default_extraction_max_tokens() -> u32 {
    800
}

fn default_mockup_max_tokens() -> u32 {
    20_000
}

fn default_mockup_attempts() -> u32 {
    3
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gate_capacity: default_gate_capacity(),
            extraction_max_tokens: default_extraction_max_tokens(),
            mockup_max_tokens: default_mockup_max_tokens(),
            mockup_attempts: default_mockup_attempts(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Contents of `.raos/config.yaml`. Every section is optional on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub completion: ClientConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load from `root`, falling back to defaults when no file exists.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level: WarnLevel, message: String| {
            warnings.push(ConfigWarning { level, message })
        };

        if self.pipeline.gate_capacity == 0 {
            push(
                WarnLevel::Error,
                "pipeline.gate_capacity is 0; no stage could ever run".into(),
            );
        }
        if self.pipeline.mockup_attempts == 0 {
            push(
                WarnLevel::Error,
                "pipeline.mockup_attempts is 0; mockups would always fail".into(),
            );
        }
        if self.completion.max_attempts == 0 {
            push(
                WarnLevel::Error,
                "completion.max_attempts is 0; no request would be sent".into(),
            );
        }
        if self.completion.model.trim().is_empty() {
            push(WarnLevel::Error, "completion.model is empty".into());
        }
        if !self.completion.base_url.starts_with("http://")
            && !self.completion.base_url.starts_with("https://")
        {
            push(
                WarnLevel::Warning,
                format!(
                    "completion.base_url '{}' is not an http(s) URL",
                    self.completion.base_url
                ),
            );
        }
        if self.pipeline.extraction_max_tokens < 200 {
            push(
                WarnLevel::Warning,
                format!(
                    "pipeline.extraction_max_tokens={} is likely too small for a full extraction",
                    self.pipeline.extraction_max_tokens
                ),
            );
        }
        if self.pipeline.gate_capacity > 50 {
            push(
                WarnLevel::Warning,
                format!(
                    "pipeline.gate_capacity={} (>50 may trip upstream rate limits)",
                    self.pipeline.gate_capacity
                ),
            );
        }

        warnings
    }

    pub fn has_errors(&self) -> bool {
        self.validate().iter().any(|w| w.level == WarnLevel::Error)
    }
}
