//! Core types for the launcher
//!
//! Defines:
//! - Launcher settings and the guard's retry policy
//! - The invocation request/response contract
//! - Execution handles reported by the orchestrator

use crate::error::{LaunchError, SettingsError};
use chrono::{DateTime, Utc};
use lakeplan_compiler::{CompilerConfig, DEFAULT_CATALOG_DATABASE, DEFAULT_LOG_LEVEL};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use ulid::Ulid;

/// Status of a successful invocation
pub const OK: u16 = 200;

/// Caller identity recorded when none is configured
pub const DEFAULT_CALLER_IDENTITY: &str = "lakeplan";

/// Unique execution identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub Ulid);

impl ExecutionId {
    /// Generate new execution ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Execution lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Still running
    Running,
    /// Finished successfully
    Succeeded,
    /// Finished with a failure
    Failed,
    /// Stopped before finishing
    Aborted,
}

impl ExecutionStatus {
    /// Check if the execution still occupies its plan
    #[inline]
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Handle of a started execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionHandle {
    /// Orchestrator-assigned identifier
    pub execution_id: ExecutionId,
    /// `<tenant>-<pipeline_type>-<YYYYMMDDHHMMSS>`
    pub execution_name: String,
    /// Current state
    pub status: ExecutionStatus,
    /// Submission time
    pub started_at: DateTime<Utc>,
}

/// Backoff applied while a conflicting execution is running
///
/// Delays grow from `initial_delay_ms` by `multiplier`; the sum of all
/// delays never exceeds `max_elapsed_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// First delay in milliseconds
    pub initial_delay_ms: u64,
    /// Growth factor between consecutive delays
    pub multiplier: u32,
    /// Cap on the total time spent waiting, in milliseconds
    pub max_elapsed_ms: u64,
}

impl RetryPolicy {
    /// Policy that never waits
    pub const NONE: RetryPolicy = RetryPolicy {
        initial_delay_ms: 0,
        multiplier: 1,
        max_elapsed_ms: 0,
    };

    /// With initial delay
    #[inline]
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = duration_ms(delay);
        self
    }

    /// With total wait cap
    #[inline]
    #[must_use]
    pub fn with_max_elapsed(mut self, cap: Duration) -> Self {
        self.max_elapsed_ms = duration_ms(cap);
        self
    }

    /// Cap on the total wait
    #[inline]
    #[must_use]
    pub fn max_elapsed(&self) -> Duration {
        Duration::from_millis(self.max_elapsed_ms)
    }

    /// Delay before the attempt following `attempt`, given the time already waited
    ///
    /// Every delay is at least one millisecond. Returns `None` once the cap is exhausted.
    #[must_use]
    pub fn next_delay(&self, attempt: u32, waited: Duration) -> Option<Duration> {
        let remaining = self.max_elapsed().saturating_sub(waited);
        if remaining.is_zero() {
            return None;
        }

        let growth = u64::from(self.multiplier.max(1)).saturating_pow(attempt.saturating_sub(1));
        let delay = Duration::from_millis(self.initial_delay_ms.max(1).saturating_mul(growth));
        Some(delay.min(remaining))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            multiplier: 2,
            max_elapsed_ms: 60_000,
        }
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Launcher settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Orchestrator plan the compiled documents run under
    pub plan_identity: String,
    /// Identity recorded in every job document
    pub caller_identity: String,
    /// Log level passed to the steps
    pub log_level: String,
    /// Guard backoff
    pub retry: RetryPolicy,
    /// Compiler settings
    pub compiler: CompilerConfig,
}

impl LaunchConfig {
    /// Create settings for a plan identity and compiler configuration
    #[inline]
    #[must_use]
    pub fn new(plan_identity: impl Into<String>, compiler: CompilerConfig) -> Self {
        Self {
            plan_identity: plan_identity.into(),
            compiler,
            ..Self::default()
        }
    }

    /// With caller identity
    #[inline]
    #[must_use]
    pub fn with_caller_identity(mut self, caller: impl Into<String>) -> Self {
        self.caller_identity = caller.into();
        self
    }

    /// With log level
    #[inline]
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Load settings from the process environment
    ///
    /// # Errors
    /// - `SettingsError::MissingVariable` if a required variable is unset
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup
    ///
    /// Required: `RAW_LAKE_URI`, `CURATED_LAKE_URI`, `PLAN_IDENTITY`.
    /// Optional: `CATALOG_DATABASE`, `CALLER_IDENTITY`, `LOG_LEVEL`.
    ///
    /// # Errors
    /// - `SettingsError::MissingVariable` if a required variable is unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(SettingsError::MissingVariable(name));

        let compiler = CompilerConfig::new(require("RAW_LAKE_URI")?, require("CURATED_LAKE_URI")?)
            .with_catalog_database(
                get("CATALOG_DATABASE").unwrap_or_else(|| DEFAULT_CATALOG_DATABASE.to_string()),
            );

        let mut config = Self::new(require("PLAN_IDENTITY")?, compiler);
        if let Some(caller) = get("CALLER_IDENTITY") {
            config.caller_identity = caller;
        }
        if let Some(level) = get("LOG_LEVEL") {
            config.log_level = level;
        }
        Ok(config)
    }

    /// Parse settings from TOML
    ///
    /// # Errors
    /// - `SettingsError::Parse` on malformed TOML
    pub fn from_toml_str(raw: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(raw)?)
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            plan_identity: String::new(),
            caller_identity: DEFAULT_CALLER_IDENTITY.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            retry: RetryPolicy::default(),
            compiler: CompilerConfig::default(),
        }
    }
}

/// Invocation input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Tenant whose records are compiled
    #[serde(alias = "Identifier")]
    pub tenant_identifier: String,
    /// Requested pipeline type, validated before any record is inspected
    #[serde(alias = "PipelineType")]
    pub pipeline_type: String,
}

impl LaunchRequest {
    /// Create request
    #[inline]
    #[must_use]
    pub fn new(tenant_identifier: impl Into<String>, pipeline_type: impl Into<String>) -> Self {
        Self {
            tenant_identifier: tenant_identifier.into(),
            pipeline_type: pipeline_type.into(),
        }
    }
}

/// Invocation output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchResponse {
    /// 200 on launch, 400 otherwise
    pub status: u16,
    /// Started execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_handle: Option<ExecutionHandle>,
    /// Display text of the failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LaunchResponse {
    /// Response for a started execution
    #[inline]
    #[must_use]
    pub fn accepted(handle: ExecutionHandle) -> Self {
        Self {
            status: OK,
            execution_handle: Some(handle),
            error_message: None,
        }
    }

    /// Response for a failed invocation
    #[inline]
    #[must_use]
    pub fn rejected(error: &LaunchError) -> Self {
        Self {
            status: error.status_code(),
            execution_handle: None,
            error_message: Some(error.to_string()),
        }
    }

    /// Check if an execution was started
    #[inline]
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.status == OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn default_policy_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        let secs = |attempt, waited| {
            policy
                .next_delay(attempt, Duration::from_secs(waited))
                .map(|d| d.as_secs())
        };

        assert_eq!(secs(1, 0), Some(1));
        assert_eq!(secs(2, 1), Some(2));
        assert_eq!(secs(3, 3), Some(4));
        assert_eq!(secs(6, 31), Some(29));
        assert_eq!(secs(7, 60), None);
    }

    #[test]
    fn delays_never_exceed_cap() {
        let policy = RetryPolicy::default();
        let mut waited = Duration::ZERO;
        let mut attempt = 1;
        while let Some(delay) = policy.next_delay(attempt, waited) {
            waited += delay;
            attempt += 1;
        }
        assert_eq!(waited, policy.max_elapsed());
        assert!(attempt > 2);
    }

    #[test]
    fn zero_initial_delay_still_reaches_cap() {
        let policy = RetryPolicy {
            initial_delay_ms: 0,
            multiplier: 2,
            max_elapsed_ms: 60_000,
        };
        assert_eq!(policy.next_delay(1, Duration::ZERO), Some(Duration::from_millis(1)));

        let mut waited = Duration::ZERO;
        let mut attempt = 1;
        while let Some(delay) = policy.next_delay(attempt, waited) {
            assert!(!delay.is_zero());
            waited += delay;
            attempt += 1;
        }
        assert_eq!(waited, policy.max_elapsed());
        assert!(attempt < 64);
    }

    #[test]
    fn none_policy_never_waits() {
        assert_eq!(RetryPolicy::NONE.next_delay(1, Duration::ZERO), None);
    }

    #[test]
    fn request_accepts_aliases() {
        let canonical: LaunchRequest =
            serde_json::from_str(r#"{"tenant_identifier":"t1","pipeline_type":"bulk_insert"}"#).unwrap();
        let aliased: LaunchRequest =
            serde_json::from_str(r#"{"Identifier":"t1","PipelineType":"bulk_insert"}"#).unwrap();
        assert_eq!(canonical, aliased);
    }

    #[test]
    fn rejected_response_omits_handle() {
        let err = LaunchError::Conflict {
            plan_identity: "plan".to_string(),
            execution_name: "t1-bulk_insert-20240101000000".to_string(),
        };
        let value = serde_json::to_value(LaunchResponse::rejected(&err)).unwrap();

        assert_eq!(value["status"], 400);
        assert!(value.get("execution_handle").is_none());
        assert!(value["error_message"].as_str().unwrap().contains("still running"));
    }

    #[test]
    fn settings_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("RAW_LAKE_URI", "s3://raw"),
            ("CURATED_LAKE_URI", "s3://curated"),
            ("PLAN_IDENTITY", "arn:plan"),
            ("LOG_LEVEL", "DEBUG"),
        ]
        .into_iter()
        .collect();

        let config = LaunchConfig::from_lookup(|k| vars.get(k).map(ToString::to_string)).unwrap();
        assert_eq!(config.plan_identity, "arn:plan");
        assert_eq!(config.log_level, "DEBUG");
        assert_eq!(config.caller_identity, DEFAULT_CALLER_IDENTITY);
        assert_eq!(config.compiler.catalog_database, "default");
        assert_eq!(config.compiler.raw_lake_uri, "s3://raw");
    }

    #[test]
    fn missing_plan_identity_is_reported() {
        let err = LaunchConfig::from_lookup(|k| match k {
            "RAW_LAKE_URI" | "CURATED_LAKE_URI" => Some("s3://x".to_string()),
            "PLAN_IDENTITY" => Some("  ".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, SettingsError::MissingVariable("PLAN_IDENTITY")));
    }

    #[test]
    fn settings_from_toml() {
        let config = LaunchConfig::from_toml_str(
            r#"
            plan_identity = "plan"

            [retry]
            max_elapsed_ms = 5000

            [compiler]
            raw_lake_uri = "s3://raw"
            curated_lake_uri = "s3://curated"
            "#,
        )
        .unwrap();

        assert_eq!(config.retry.initial_delay_ms, 1_000);
        assert_eq!(config.retry.max_elapsed(), Duration::from_secs(5));
        assert_eq!(config.compiler.curated_lake_uri, "s3://curated");
        assert_eq!(config.log_level, "INFO");
    }

    #[test]
    fn malformed_toml_is_rejected() {
        assert!(matches!(
            LaunchConfig::from_toml_str("plan_identity = ["),
            Err(SettingsError::Parse(_))
        ));
    }
}
