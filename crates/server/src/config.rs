use std::path::{Path, PathBuf};
use std::time::Duration;

use orchestrator::{
    CleanupConfig, KubectlConfig, PipelineConfig, ReadinessConfig, DEFAULT_APPLY_SCRIPT,
    DEFAULT_PROD_TEMPLATE, DEFAULT_TEST_TEMPLATE, DEFAULT_TEST_WORKLOAD,
};
use serde::{Deserialize, Serialize};
use shipyard_core::EndpointConfig;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config file {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Service configuration, read from TOML. Every field has a default so an
/// empty file (or no file at all) gives a working service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerSection,
    pub cluster: ClusterSection,
    pub pipeline: PipelineSection,
    pub endpoint: EndpointConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSection {
    pub kubectl: String,
    pub apply_script: PathBuf,
    pub command_timeout_secs: u64,
    pub status_timeout_secs: u64,
}

impl Default for ClusterSection {
    fn default() -> Self {
        Self {
            kubectl: "kubectl".to_string(),
            apply_script: PathBuf::from(DEFAULT_APPLY_SCRIPT),
            command_timeout_secs: 30,
            status_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub test_template: PathBuf,
    pub prod_template: PathBuf,
    pub test_workload: String,
    pub poll_interval_secs: u64,
    pub ready_timeout_secs: u64,
    pub cleanup_delay_secs: u64,
    /// Unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_runs: Option<usize>,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            test_template: PathBuf::from(DEFAULT_TEST_TEMPLATE),
            prod_template: PathBuf::from(DEFAULT_PROD_TEMPLATE),
            test_workload: DEFAULT_TEST_WORKLOAD.to_string(),
            poll_interval_secs: 5,
            ready_timeout_secs: 120,
            cleanup_delay_secs: 60,
            max_concurrent_runs: None,
        }
    }
}

impl ServiceConfig {
    /// Read config from `path`. A missing file yields the defaults; an
    /// unreadable or malformed one is an error.
    pub async fn read(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Err(reason) = config.validate() {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason,
            });
        }

        debug!(path = %path.display(), "Config loaded successfully");
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.pipeline.poll_interval_secs == 0 {
            return Err("pipeline.poll_interval_secs must be greater than zero".to_string());
        }
        if self.pipeline.max_concurrent_runs == Some(0) {
            return Err("pipeline.max_concurrent_runs must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn kubectl_config(&self) -> KubectlConfig {
        KubectlConfig {
            kubectl: self.cluster.kubectl.clone(),
            apply_script: self.cluster.apply_script.clone(),
            command_timeout: Duration::from_secs(self.cluster.command_timeout_secs),
            status_timeout: Duration::from_secs(self.cluster.status_timeout_secs),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let pipeline = &self.pipeline;

        PipelineConfig {
            test_template: pipeline.test_template.clone(),
            prod_template: pipeline.prod_template.clone(),
            test_workload: pipeline.test_workload.clone(),
            readiness: ReadinessConfig::new(
                Duration::from_secs(pipeline.poll_interval_secs),
                Duration::from_secs(pipeline.ready_timeout_secs),
            ),
            cleanup: CleanupConfig {
                delay: Duration::from_secs(pipeline.cleanup_delay_secs),
                workload: pipeline.test_workload.clone(),
            },
            endpoint: self.endpoint.clone(),
        }
    }
}
