//! Evaluation configuration
//!
//! Resolution order, lowest first: built-in defaults, `CPPEVAL_AGENT_URL`,
//! a TOML file, then command-line overrides applied by the caller.

use crate::error::ConfigError;
use crate::runner::DEFAULT_CHECKPOINT_INTERVAL;
use crate::workflow::WorkflowOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming the agent service base URL
pub const AGENT_URL_ENV: &str = "CPPEVAL_AGENT_URL";

/// Agent service base URL when nothing else is configured
pub const DEFAULT_AGENT_URL: &str = "http://localhost:8000";

/// Batch evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Options forwarded to the workflow for every defect
    pub workflow: WorkflowOptions,
    /// Maximum concurrent analyses
    pub max_concurrent: usize,
    /// Completions between checkpoints
    pub checkpoint_interval: usize,
    /// Per-defect timeout in seconds, none when unset
    pub analysis_timeout_secs: Option<u64>,
    /// Base URL of the agent service
    pub agent_url: String,
}

impl EvalConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file; missing keys keep their defaults
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Toml` if it does not parse
    /// - `ConfigError::Invalid` if a value is out of range
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first bad field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrent",
                message: "must be at least 1".to_string(),
            });
        }
        if self.checkpoint_interval == 0 {
            return Err(ConfigError::Invalid {
                field: "checkpoint_interval",
                message: "must be at least 1".to_string(),
            });
        }
        if self.analysis_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "analysis_timeout_secs",
                message: "must be positive when set".to_string(),
            });
        }
        if self.agent_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "agent_url",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// With workflow options
    #[inline]
    #[must_use]
    pub fn with_workflow(mut self, workflow: WorkflowOptions) -> Self {
        self.workflow = workflow;
        self
    }

    /// With concurrency cap
    #[inline]
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// With checkpoint interval
    #[inline]
    #[must_use]
    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// With per-defect timeout
    #[inline]
    #[must_use]
    pub fn with_analysis_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.analysis_timeout_secs = secs;
        self
    }

    /// With agent service URL
    #[inline]
    #[must_use]
    pub fn with_agent_url(mut self, url: impl Into<String>) -> Self {
        self.agent_url = url.into();
        self
    }

    /// Per-defect timeout as a duration
    #[inline]
    #[must_use]
    pub fn analysis_timeout(&self) -> Option<Duration> {
        self.analysis_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            workflow: WorkflowOptions::default(),
            max_concurrent: 1,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            analysis_timeout_secs: None,
            agent_url: std::env::var(AGENT_URL_ENV)
                .ok()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AGENT_URL.to_string()),
        }
    }
}
