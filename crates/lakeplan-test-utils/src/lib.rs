//! Testing utilities for Lakeplan workspace
//!
//! Shared record fixtures and builders.

#![allow(missing_docs)]

use lakeplan_config::{ConfigKey, ConfigRecord, PipelineType};
use serde_json::{json, Map, Value};

pub const TENANT: &str = "t1";
pub const RAW_LAKE: &str = "s3://raw-lake";
pub const CURATED_LAKE: &str = "s3://curated-lake";

fn into_payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture payload must be an object, got {other}"),
    }
}

pub fn pipeline_record(tenant: &str, pipeline_type: PipelineType) -> ConfigRecord {
    ConfigRecord::new(
        tenant,
        ConfigKey::pipeline(pipeline_type),
        into_payload(json!({
            "emr_config": {
                "step_parallelism": "2",
                "worker": { "count": "4", "type": "m5.xlarge" }
            }
        })),
    )
}

/// Builder for table records
#[derive(Debug, Clone)]
pub struct TableFixture {
    name: String,
    enabled: Option<Value>,
    engine: Map<String, Value>,
    overrides: Map<String, Value>,
}

impl TableFixture {
    /// Enabled, unpartitioned table keyed on `id`
    pub fn new(name: &str) -> Self {
        let mut engine = Map::new();
        engine.insert("record_key".to_string(), json!("id"));
        engine.insert("source_ordering_field".to_string(), json!("updated_at"));
        engine.insert("is_partitioned".to_string(), json!(false));
        Self {
            name: name.to_string(),
            enabled: Some(json!(true)),
            engine,
            overrides: Map::new(),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = Some(json!(false));
        self
    }

    pub fn without_enabled_flag(mut self) -> Self {
        self.enabled = None;
        self
    }

    pub fn record_key(self, key: &str) -> Self {
        self.engine_field("record_key", json!(key))
    }

    pub fn partitioned(self, path: &str) -> Self {
        self.engine_field("is_partitioned", json!(true))
            .engine_field(
                "partition_extractor_class",
                json!("org.apache.hudi.hive.MultiPartKeysValueExtractor"),
            )
            .engine_field("partition_path", json!(path))
    }

    pub fn engine_field(mut self, key: &str, value: Value) -> Self {
        self.engine.insert(key.to_string(), value);
        self
    }

    pub fn without_engine_field(mut self, key: &str) -> Self {
        self.engine.remove(key);
        self
    }

    pub fn runtime_override(mut self, pipeline_type: PipelineType, key: &str, value: &str) -> Self {
        let entry = self
            .overrides
            .entry(pipeline_type.as_str().to_string())
            .or_insert_with(|| json!({}));
        if let Value::Object(map) = entry {
            map.insert(key.to_string(), json!(value));
        }
        self
    }

    pub fn build(self, tenant: &str) -> ConfigRecord {
        let mut payload = Map::new();
        if let Some(enabled) = self.enabled {
            payload.insert("enabled".to_string(), enabled);
        }
        payload.insert("hudi_config".to_string(), Value::Object(self.engine));
        if !self.overrides.is_empty() {
            payload.insert("spark_conf".to_string(), Value::Object(self.overrides));
        }
        ConfigRecord::new(tenant, ConfigKey::table(self.name), payload)
    }
}

pub fn table_record(tenant: &str, name: &str) -> ConfigRecord {
    TableFixture::new(name).build(tenant)
}

/// Pipeline record plus one enabled, unpartitioned table
pub fn single_table_records(pipeline_type: PipelineType) -> Vec<ConfigRecord> {
    vec![
        pipeline_record(TENANT, pipeline_type),
        table_record(TENANT, "sales_orders"),
    ]
}
