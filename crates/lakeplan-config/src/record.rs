//! Raw configuration records as held by the config store
//!
//! The record key namespace is resolved into [`ConfigKey`] once, when a record
//! is read, so downstream code matches on variants instead of string prefixes.

use crate::pipeline_type::PipelineType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Prefix of pipeline-level record keys
pub const PIPELINE_PREFIX: &str = "pipeline::";

/// Prefix of per-table record keys
pub const TABLE_PREFIX: &str = "table::";

/// Tagged record key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConfigKey {
    /// `pipeline::<pipeline_type>`
    Pipeline(String),
    /// `table::<table_name>`, possibly with nested `::` segments
    Table(String),
    /// Any key outside the two namespaces
    Other(String),
}

impl ConfigKey {
    /// Resolve a raw key into its namespace
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix(PIPELINE_PREFIX) {
            ConfigKey::Pipeline(name.to_string())
        } else if let Some(name) = raw.strip_prefix(TABLE_PREFIX) {
            ConfigKey::Table(name.to_string())
        } else {
            ConfigKey::Other(raw.to_string())
        }
    }

    /// Key of the pipeline record for a pipeline type
    #[inline]
    #[must_use]
    pub fn pipeline(pipeline_type: PipelineType) -> Self {
        ConfigKey::Pipeline(pipeline_type.as_str().to_string())
    }

    /// Key of a table record
    #[inline]
    #[must_use]
    pub fn table(name: impl Into<String>) -> Self {
        ConfigKey::Table(name.into())
    }

    /// Name of the table a `table::` key addresses: its last `::` segment
    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        match self {
            ConfigKey::Table(path) => path.rsplit("::").next(),
            ConfigKey::Pipeline(_) | ConfigKey::Other(_) => None,
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKey::Pipeline(name) => write!(f, "{PIPELINE_PREFIX}{name}"),
            ConfigKey::Table(name) => write!(f, "{TABLE_PREFIX}{name}"),
            ConfigKey::Other(raw) => f.write_str(raw),
        }
    }
}

impl From<String> for ConfigKey {
    fn from(raw: String) -> Self {
        ConfigKey::parse(&raw)
    }
}

impl From<ConfigKey> for String {
    fn from(key: ConfigKey) -> Self {
        key.to_string()
    }
}

/// One stored configuration record
///
/// Stored items are flat objects; everything besides the tenant identifier
/// and the key is kept in `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Owning tenant
    #[serde(rename = "identifier")]
    pub tenant_identifier: String,
    /// Namespaced key
    #[serde(rename = "config")]
    pub config_key: ConfigKey,
    /// Remaining record fields
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ConfigRecord {
    /// Create new record
    #[inline]
    #[must_use]
    pub fn new(
        tenant_identifier: impl Into<String>,
        config_key: ConfigKey,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            tenant_identifier: tenant_identifier.into(),
            config_key,
            payload,
        }
    }

    /// Reassemble the flat stored object
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.payload.len() + 2);
        object.insert(
            "identifier".to_string(),
            Value::String(self.tenant_identifier.clone()),
        );
        object.insert(
            "config".to_string(),
            Value::String(self.config_key.to_string()),
        );
        for (k, v) in &self.payload {
            object.insert(k.clone(), v.clone());
        }
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_key_namespaces() {
        assert_eq!(
            ConfigKey::parse("pipeline::bulk_insert"),
            ConfigKey::Pipeline("bulk_insert".to_string())
        );
        assert_eq!(
            ConfigKey::parse("table::sales.orders"),
            ConfigKey::Table("sales.orders".to_string())
        );
        assert_eq!(
            ConfigKey::parse("tables::orders"),
            ConfigKey::Other("tables::orders".to_string())
        );
    }

    #[test]
    fn key_display_round_trips_raw_form() {
        for raw in ["pipeline::snapshot", "table::a::b", "misc"] {
            assert_eq!(ConfigKey::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn nested_table_key_names_last_segment() {
        assert_eq!(ConfigKey::parse("table::a::b").table_name(), Some("b"));
        assert_eq!(ConfigKey::table("orders").table_name(), Some("orders"));
        assert_eq!(ConfigKey::parse("pipeline::bulk_insert").table_name(), None);
    }

    #[test]
    fn record_deserializes_flat_item() {
        let record: ConfigRecord = serde_json::from_value(json!({
            "identifier": "t1",
            "config": "table::orders",
            "enabled": true
        }))
        .unwrap();

        assert_eq!(record.tenant_identifier, "t1");
        assert_eq!(record.config_key, ConfigKey::table("orders"));
        assert_eq!(record.payload.get("enabled"), Some(&json!(true)));
        assert!(!record.payload.contains_key("config"));
    }

    #[test]
    fn to_value_restores_identity_fields() {
        let mut payload = Map::new();
        payload.insert("enabled".to_string(), json!(false));
        let record = ConfigRecord::new("t1", ConfigKey::table("orders"), payload);

        assert_eq!(
            record.to_value(),
            json!({"identifier": "t1", "config": "table::orders", "enabled": false})
        );
    }
}
