//! Lakeplan Config - typed configuration records
//!
//! Resolves stored records into tagged keys, decodes the pipeline and table
//! records, and classifies a tenant's record set for one pipeline type.
//!
//! # Example
//!
//! ```rust,ignore
//! use lakeplan_config::{classify_requested, ConfigRecord};
//!
//! let records: Vec<ConfigRecord> = serde_json::from_str(stored_json)?;
//! let classified = classify_requested("t1", records, "bulk_insert")?;
//! println!("{} tables configured", classified.tables.len());
//! ```

#![warn(unreachable_pub)]

pub mod classify;
pub mod error;
mod normalize;
pub mod pipeline;
pub mod pipeline_type;
pub mod record;
pub mod table;

pub use classify::{classify, classify_requested, ClassifiedConfig};
pub use error::ConfigError;
pub use normalize::scalar_to_string;
pub use pipeline::{ClusterSizing, PipelineRecord, WorkerSpec};
pub use pipeline_type::PipelineType;
pub use record::{ConfigKey, ConfigRecord, PIPELINE_PREFIX, TABLE_PREFIX};
pub use table::{
    EngineBlock, Partitioning, RecordKey, TableRecord, TableSettings, TableSpec, TableType,
    WriteOperation,
};
