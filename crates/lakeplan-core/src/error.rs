//! Error types for the launcher
//!
//! Provides error handling for:
//! - Store and orchestrator transport failures
//! - Submission rejections
//! - Launcher settings
//! - The end-to-end launch of one pipeline run

use lakeplan_compiler::CompileError;
use lakeplan_config::ConfigError;
use std::path::PathBuf;

/// Status every failed invocation responds with
pub const BAD_REQUEST: u16 = 400;

/// Failure talking to an external collaborator
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Collaborator could not be reached or answered with an error
    #[error("{service} unavailable: {message}")]
    Unavailable {
        /// Collaborator name
        service: &'static str,
        /// Failure detail
        message: String,
    },

    /// Backing file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Collaborator returned data that could not be decoded
    #[error("malformed response from {service}: {message}")]
    Malformed {
        /// Collaborator name
        service: &'static str,
        /// Decoding detail
        message: String,
    },
}

impl TransportError {
    /// Create unavailable error
    #[inline]
    pub fn unavailable(service: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            service,
            message: message.into(),
        }
    }

    /// Create malformed response error
    #[inline]
    pub fn malformed(service: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            service,
            message: message.into(),
        }
    }
}

/// Orchestrator refused to start an execution
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// An execution with the same name already exists
    #[error("execution name '{0}' is already in use")]
    NameConflict(String),

    /// Job document or plan identity was rejected
    #[error("submission rejected: {0}")]
    Rejected(String),

    /// Submission never reached the orchestrator
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Launcher settings could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Required environment variable is unset or empty
    #[error("environment variable {0} is not set")]
    MissingVariable(&'static str),

    /// Settings file is not valid TOML
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failure of one launch invocation
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// Invocation payload could not be decoded
    #[error("invalid request: {0}")]
    InvalidRequest(#[source] serde_json::Error),

    /// Stored configuration is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Plan could not be compiled
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// An execution of the plan is already running
    #[error("execution '{execution_name}' of plan '{plan_identity}' is still running")]
    Conflict {
        /// Guarded plan identity
        plan_identity: String,
        /// Name of the running execution
        execution_name: String,
    },

    /// Store or orchestrator could not be reached
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Orchestrator refused the submission
    #[error("launch failed: {0}")]
    Submit(#[from] SubmitError),
}

impl LaunchError {
    /// Check if the concurrency guard may retry this error
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if the error stems from the tenant's configuration
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Compile(_))
    }

    /// Response status for this error
    #[inline]
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn status_code(&self) -> u16 {
        BAD_REQUEST
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakeplan_config::PipelineType;

    fn conflict() -> LaunchError {
        LaunchError::Conflict {
            plan_identity: "plan".to_string(),
            execution_name: "t1-bulk_insert-20240101000000".to_string(),
        }
    }

    #[test]
    fn only_conflict_is_retryable() {
        assert!(conflict().is_retryable());
        assert!(!LaunchError::from(TransportError::unavailable("store", "timeout")).is_retryable());
        assert!(!LaunchError::from(SubmitError::NameConflict("x".to_string())).is_retryable());
        assert!(!LaunchError::from(ConfigError::UnsupportedPipelineType("x".to_string())).is_retryable());
    }

    #[test]
    fn configuration_errors_are_classified() {
        let config = LaunchError::from(ConfigError::UnsupportedPipelineType("x".to_string()));
        let compile = LaunchError::from(CompileError::EmptyPlan {
            pipeline_type: PipelineType::BulkInsert,
            configured_tables: 0,
        });

        assert!(config.is_configuration());
        assert!(compile.is_configuration());
        assert!(!conflict().is_configuration());
    }

    #[test]
    fn every_error_maps_to_bad_request() {
        assert_eq!(conflict().status_code(), 400);
        assert_eq!(
            LaunchError::from(SubmitError::Rejected("bad".to_string())).status_code(),
            400
        );
    }

    #[test]
    fn display_names_running_execution() {
        let message = conflict().to_string();
        assert!(message.contains("t1-bulk_insert-20240101000000"));
        assert!(message.contains("plan"));
    }

    #[test]
    fn config_error_display_passes_through() {
        let err = LaunchError::from(ConfigError::UnsupportedPipelineType("nightly".to_string()));
        assert!(err.to_string().contains("'nightly' is not supported"));
    }
}
