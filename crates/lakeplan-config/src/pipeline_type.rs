//! Supported pipeline types

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ingestion mode of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineType {
    /// One-shot bulk load
    BulkInsert,
    /// Scheduled incremental merge
    IncrementalUpsert,
    /// Long-running continuous merge
    ContinuousUpsert,
}

impl PipelineType {
    /// Every supported variant
    pub const ALL: [PipelineType; 3] = [
        PipelineType::BulkInsert,
        PipelineType::IncrementalUpsert,
        PipelineType::ContinuousUpsert,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineType::BulkInsert => "bulk_insert",
            PipelineType::IncrementalUpsert => "incremental_upsert",
            PipelineType::ContinuousUpsert => "continuous_upsert",
        }
    }

    /// Check if this type merges into existing data
    #[inline]
    #[must_use]
    pub fn is_upsert(self) -> bool {
        matches!(
            self,
            PipelineType::IncrementalUpsert | PipelineType::ContinuousUpsert
        )
    }

    /// Check if the engine should keep running after the first sync
    #[inline]
    #[must_use]
    pub fn is_continuous(self) -> bool {
        matches!(self, PipelineType::ContinuousUpsert)
    }
}

impl fmt::Display for PipelineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConfigError::UnsupportedPipelineType(s.to_string()))
    }
}
