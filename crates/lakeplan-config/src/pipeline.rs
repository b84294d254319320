//! Pipeline-level record
//!
//! Carries the cluster sizing for one (tenant, pipeline type) pair. Fields the
//! compiler does not interpret are preserved so the orchestration layer sees
//! the record as it was stored.

use crate::error::ConfigError;
use crate::normalize::{flag, integer};
use crate::record::{ConfigKey, ConfigRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The single pipeline record matched for an invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRecord {
    /// Owning tenant
    #[serde(rename = "identifier")]
    pub tenant_identifier: String,
    /// Record key (`pipeline::<type>`)
    #[serde(rename = "config")]
    pub config_key: ConfigKey,
    /// Cluster sizing
    #[serde(rename = "emr_config")]
    pub cluster: ClusterSizing,
    /// Uninterpreted fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Engine cluster sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSizing {
    /// Concurrent steps per cluster
    #[serde(deserialize_with = "integer")]
    pub step_parallelism: u32,
    /// Worker fleet
    pub worker: WorkerSpec,
    /// Let the engine size executors to the instance type
    #[serde(default, with = "flag")]
    pub maximize_resource_allocation: bool,
    /// Uninterpreted fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Worker fleet sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSpec {
    /// Number of worker nodes
    #[serde(deserialize_with = "integer")]
    pub count: u32,
    /// Uninterpreted fields (instance type, market, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PipelineRecord {
    /// Decode a stored record into its typed form
    ///
    /// # Errors
    /// - `ConfigError::InvalidRecord` if sizing fields are missing or not integers
    pub fn from_record(record: &ConfigRecord) -> Result<Self, ConfigError> {
        serde_json::from_value(record.to_value())
            .map_err(|e| ConfigError::invalid_record(record.config_key.to_string(), e))
    }
}
