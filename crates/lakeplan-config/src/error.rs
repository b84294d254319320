//! Error types for configuration records
//!
//! Covers:
//! - Unsupported pipeline types
//! - Missing or duplicated pipeline records
//! - Malformed record payloads
//! - Required table fields that are absent

/// Configuration error
///
/// Always fatal to the invocation that produced it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Requested pipeline type is not one of the supported variants
    #[error("pipeline type '{0}' is not supported (expected one of: bulk_insert, incremental_upsert, continuous_upsert)")]
    UnsupportedPipelineType(String),

    /// No record keyed `pipeline::<type>` exists for the tenant
    #[error("no pipeline record '{key}' found for tenant '{tenant}'")]
    MissingPipelineRecord { tenant: String, key: String },

    /// More than one record keyed `pipeline::<type>` exists for the tenant
    #[error("{count} pipeline records keyed '{key}' found for tenant '{tenant}', expected exactly one")]
    DuplicatePipelineRecord {
        tenant: String,
        key: String,
        count: usize,
    },

    /// Record payload does not match its typed shape
    #[error("invalid record '{key}': {source}")]
    InvalidRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Required table field is absent or empty
    #[error("table '{table}' is missing required field '{field}'")]
    MissingField { table: String, field: &'static str },
}

impl ConfigError {
    /// Create missing field error
    #[inline]
    pub fn missing_field(table: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            table: table.into(),
            field,
        }
    }

    /// Create invalid record error
    #[inline]
    pub fn invalid_record(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidRecord {
            key: key.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_display_names_the_type() {
        let err = ConfigError::UnsupportedPipelineType("snapshot".to_string());
        assert!(err.to_string().contains("'snapshot'"));
    }

    #[test]
    fn missing_field_display() {
        let err = ConfigError::missing_field("orders", "record_key");
        assert_eq!(
            err.to_string(),
            "table 'orders' is missing required field 'record_key'"
        );
    }
}
