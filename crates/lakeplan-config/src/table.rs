//! Per-table records
//!
//! [`TableRecord`] mirrors what is stored and is deliberately lenient so that a
//! disabled, half-written table never blocks the rest of the plan.
//! [`TableRecord::validate`] produces a [`TableSpec`], the checked shape every
//! enabled table must satisfy before the compiler touches it.

use crate::error::ConfigError;
use crate::normalize::{scalar_to_string, strictly_true};
use crate::pipeline_type::PipelineType;
use crate::record::{ConfigKey, ConfigRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Stored table record
///
/// Only the `enabled` flag is decoded up front; everything else stays raw
/// until [`TableRecord::validate`] runs for an enabled table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    /// Only a literal `true` enables the table
    #[serde(default, deserialize_with = "strictly_true")]
    pub enabled: bool,
    /// Remaining stored fields, undecoded
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// Decoded settings of a table record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSettings {
    /// Runtime overrides keyed by pipeline type name
    #[serde(default, rename = "spark_conf")]
    pub runtime_overrides: BTreeMap<String, BTreeMap<String, Value>>,
    /// Engine block
    #[serde(default, rename = "hudi_config")]
    pub engine: EngineBlock,
    /// Uninterpreted fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TableSettings {
    /// Runtime overrides declared for a pipeline type
    #[must_use]
    pub fn overrides_for(&self, pipeline_type: PipelineType) -> Vec<(String, String)> {
        self.runtime_overrides
            .get(pipeline_type.as_str())
            .map(|entries| {
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), scalar_to_string(v)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Stored engine block of a table record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineBlock {
    /// Comma-separated record key field(s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_key: Option<String>,
    /// Field used to pick the latest version of a record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ordering_field: Option<String>,
    /// Partitioning flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_partitioned: Option<bool>,
    /// Catalog partition extractor, required when partitioned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_extractor_class: Option<String>,
    /// Partition path field(s), required when partitioned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_path: Option<String>,
    /// Storage layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_type: Option<TableType>,
    /// SQL transform applied before write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformer_sql: Option<String>,
    /// Transformer implementation class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformer_class: Option<String>,
    /// Explicit write operation override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<WriteOperation>,
}

/// Table storage layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableType {
    /// Columnar files rewritten on update
    #[default]
    CopyOnWrite,
    /// Row-based delta logs merged on read
    MergeOnRead,
}

impl TableType {
    /// Engine name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TableType::CopyOnWrite => "COPY_ON_WRITE",
            TableType::MergeOnRead => "MERGE_ON_READ",
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine write operation
///
/// Names outside the known set are kept verbatim and passed to the engine as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteOperation {
    /// Sort-and-write without index lookups
    #[serde(alias = "bulk_insert")]
    BulkInsert,
    /// Append without deduplication against the table
    #[serde(alias = "insert")]
    Insert,
    /// Merge on record key
    #[serde(alias = "upsert")]
    Upsert,
    /// Any other engine operation name
    #[serde(untagged)]
    Other(String),
}

impl WriteOperation {
    /// Engine CLI name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            WriteOperation::BulkInsert => "BULK_INSERT",
            WriteOperation::Insert => "INSERT",
            WriteOperation::Upsert => "UPSERT",
            WriteOperation::Other(name) => name,
        }
    }
}

impl fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-empty list of record key fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKey(Vec<String>);

impl RecordKey {
    /// Parse a comma-separated field list, ignoring blank entries
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let fields: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        if fields.is_empty() {
            None
        } else {
            Some(Self(fields))
        }
    }

    /// Field names
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// Check if more than one field identifies a record
    #[inline]
    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.0.len() > 1
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// Partition layout of a validated table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Partitioning {
    /// Single-partition table
    Unpartitioned,
    /// Hive-style partitions
    Hive {
        /// Catalog partition extractor class
        extractor_class: String,
        /// Partition path field(s)
        path: String,
    },
}

impl Partitioning {
    /// Check if partitioned
    #[inline]
    #[must_use]
    pub fn is_partitioned(&self) -> bool {
        matches!(self, Partitioning::Hive { .. })
    }
}

/// Checked shape of an enabled table
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    /// Table name as keyed in the store
    pub name: String,
    /// Record key field(s)
    pub record_key: RecordKey,
    /// Ordering field
    pub ordering_field: String,
    /// Partition layout
    pub partitioning: Partitioning,
    /// Storage layout
    pub table_type: TableType,
    /// SQL transform
    pub transformer_sql: Option<String>,
    /// Transformer class
    pub transformer_class: Option<String>,
    /// Write operation override
    pub operation: Option<WriteOperation>,
    /// Runtime overrides for the active pipeline type, sorted by key
    pub runtime_overrides: Vec<(String, String)>,
}

impl TableRecord {
    /// Decode a stored record
    ///
    /// # Errors
    /// - `ConfigError::InvalidRecord` if the payload is not an object
    pub fn from_record(record: &ConfigRecord) -> Result<Self, ConfigError> {
        serde_json::from_value(Value::Object(record.payload.clone()))
            .map_err(|e| ConfigError::invalid_record(record.config_key.to_string(), e))
    }

    /// Decode the overrides and engine block
    ///
    /// # Errors
    /// - `ConfigError::InvalidRecord` if a field has the wrong shape
    pub fn settings(&self, name: &str) -> Result<TableSettings, ConfigError> {
        serde_json::from_value(Value::Object(self.payload.clone()))
            .map_err(|e| ConfigError::invalid_record(ConfigKey::table(name).to_string(), e))
    }

    /// Check required fields and build the typed table shape
    ///
    /// # Errors
    /// - `ConfigError::InvalidRecord` if the settings have the wrong shape
    /// - `ConfigError::MissingField` for an absent record key, ordering field,
    ///   partitioning flag, or (when partitioned) extractor class / partition path
    pub fn validate(
        &self,
        name: &str,
        pipeline_type: PipelineType,
    ) -> Result<TableSpec, ConfigError> {
        let settings = self.settings(name)?;
        let engine = &settings.engine;

        let record_key = engine
            .record_key
            .as_deref()
            .and_then(RecordKey::parse)
            .ok_or_else(|| ConfigError::missing_field(name, "record_key"))?;

        let ordering_field = non_empty(engine.source_ordering_field.as_deref())
            .ok_or_else(|| ConfigError::missing_field(name, "source_ordering_field"))?;

        let partitioning = match engine.is_partitioned {
            None => return Err(ConfigError::missing_field(name, "is_partitioned")),
            Some(false) => Partitioning::Unpartitioned,
            Some(true) => Partitioning::Hive {
                extractor_class: non_empty(engine.partition_extractor_class.as_deref())
                    .ok_or_else(|| ConfigError::missing_field(name, "partition_extractor_class"))?,
                path: non_empty(engine.partition_path.as_deref())
                    .ok_or_else(|| ConfigError::missing_field(name, "partition_path"))?,
            },
        };

        Ok(TableSpec {
            name: name.to_string(),
            record_key,
            ordering_field,
            partitioning,
            table_type: engine.table_type.unwrap_or_default(),
            transformer_sql: engine.transformer_sql.clone(),
            transformer_class: engine.transformer_class.clone(),
            operation: engine.op.clone(),
            runtime_overrides: settings.overrides_for(pipeline_type),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
