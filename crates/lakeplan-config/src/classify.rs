//! Record classification
//!
//! Splits a tenant's records into the pipeline record for the requested type
//! and the table records, keyed by table name.

use crate::error::ConfigError;
use crate::pipeline::PipelineRecord;
use crate::pipeline_type::PipelineType;
use crate::record::{ConfigKey, ConfigRecord};
use crate::table::TableRecord;
use std::collections::BTreeMap;

/// Records of one tenant, classified for one pipeline type
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedConfig {
    /// Tenant identifier
    pub tenant_identifier: String,
    /// Active pipeline type
    pub pipeline_type: PipelineType,
    /// Matched pipeline record
    pub pipeline: PipelineRecord,
    /// Table records in ascending name order
    pub tables: BTreeMap<String, TableRecord>,
}

/// Classify records for a requested pipeline type name
///
/// The type is checked before any record is inspected.
///
/// # Errors
/// - `ConfigError::UnsupportedPipelineType` for an unknown type name
/// - any error of [`classify`]
pub fn classify_requested(
    tenant_identifier: &str,
    records: impl IntoIterator<Item = ConfigRecord>,
    requested: &str,
) -> Result<ClassifiedConfig, ConfigError> {
    let pipeline_type: PipelineType = requested.parse()?;
    classify(tenant_identifier, records, pipeline_type)
}

/// Classify records for a pipeline type
///
/// # Errors
/// - `ConfigError::MissingPipelineRecord` if no `pipeline::<type>` record exists
/// - `ConfigError::DuplicatePipelineRecord` if more than one exists
/// - `ConfigError::InvalidRecord` if the pipeline or a table record is malformed
pub fn classify(
    tenant_identifier: &str,
    records: impl IntoIterator<Item = ConfigRecord>,
    pipeline_type: PipelineType,
) -> Result<ClassifiedConfig, ConfigError> {
    let wanted = ConfigKey::pipeline(pipeline_type);
    let mut pipelines = Vec::new();
    let mut tables = BTreeMap::new();

    for record in records {
        match &record.config_key {
            key if *key == wanted => pipelines.push(PipelineRecord::from_record(&record)?),
            ConfigKey::Table(_) => {
                let name = record.config_key.table_name().unwrap_or_default().to_string();
                let table = TableRecord::from_record(&record)?;
                tracing::info!(
                    tenant = tenant_identifier,
                    table = %name,
                    pipeline_type = %pipeline_type,
                    "Table config detected"
                );
                if tables.insert(name.clone(), table).is_some() {
                    tracing::warn!(table = %name, "Duplicate table config, keeping the last one read");
                }
            }
            ConfigKey::Pipeline(_) | ConfigKey::Other(_) => {
                tracing::debug!(key = %record.config_key, "Ignoring record");
            }
        }
    }

    let pipeline = match pipelines.len() {
        0 => {
            return Err(ConfigError::MissingPipelineRecord {
                tenant: tenant_identifier.to_string(),
                key: wanted.to_string(),
            })
        }
        1 => pipelines.remove(0),
        count => {
            return Err(ConfigError::DuplicatePipelineRecord {
                tenant: tenant_identifier.to_string(),
                key: wanted.to_string(),
                count,
            })
        }
    };

    Ok(ClassifiedConfig {
        tenant_identifier: tenant_identifier.to_string(),
        pipeline_type,
        pipeline,
        tables,
    })
}
