//! Engine configuration synthesis
//!
//! Derives the write-engine parameters for one table from its validated
//! [`TableSpec`] and the active pipeline type. The result is a typed
//! [`EngineConfig`]; [`EngineConfig::properties`] renders it into the ordered
//! `name=value` pairs the engine consumes.

use crate::config::{lake_dir, CompilerConfig};
use indexmap::IndexMap;
use lakeplan_config::{Partitioning, PipelineType, RecordKey, TableSpec, TableType};

/// Engine parameter names
pub mod keys {
    #![allow(missing_docs)]

    pub const CLUSTERING_INLINE: &str = "hoodie.clustering.inline";
    pub const ARCHIVE_MERGE_ENABLE: &str = "hoodie.archive.merge.enable";
    pub const TABLE_NAME: &str = "hoodie.table.name";
    pub const RECORD_KEY_FIELD: &str = "hoodie.datasource.write.recordkey.field";
    pub const PRECOMBINE_FIELD: &str = "hoodie.datasource.write.precombine.field";
    pub const SYNC_DATABASE: &str = "hoodie.datasource.hive_sync.database";
    pub const SYNC_ENABLE: &str = "hoodie.datasource.hive_sync.enable";
    pub const SYNC_TABLE: &str = "hoodie.datasource.hive_sync.table";
    pub const CLUSTERING_INLINE_ENABLE: &str = "hoodie.datasource.clustering.inline.enable";
    pub const SOURCE_ROOT: &str = "hoodie.deltastreamer.source.dfs.root";
    pub const WRITE_OPERATION: &str = "hoodie.datasource.write.operation";
    pub const BULK_INSERT_SORT_MODE: &str = "hoodie.bulkinsert.sort.mode";
    pub const CLEANER_COMMITS_RETAINED: &str = "hoodie.cleaner.commits.retained";
    pub const CLEAN_AUTOMATIC: &str = "hoodie.clean.automatic";
    pub const KEEP_MIN_COMMITS: &str = "hoodie.keep.min.commits";
    pub const KEEP_MAX_COMMITS: &str = "hoodie.keep.max.commits";
    pub const HIVE_STYLE_PARTITIONING: &str = "hoodie.datasource.write.hive_style_partitioning";
    pub const PARTITION_PATH_FIELD: &str = "hoodie.datasource.write.partitionpath.field";
    pub const SYNC_PARTITION_FIELDS: &str = "hoodie.datasource.hive_sync.partition_fields";
    pub const KEY_GENERATOR_CLASS: &str = "hoodie.datasource.write.keygenerator.class";
    pub const COMPACT_INLINE: &str = "hoodie.compact.inline";
    pub const TRANSFORMER_SQL: &str = "hoodie.deltastreamer.transformer.sql";
    pub const SYNC_PARTITION_EXTRACTOR: &str = "hoodie.datasource.hive_sync.partition_extractor_class";
}

/// Extractor used for single-partition tables
pub const NON_PARTITIONED_EXTRACTOR: &str = "org.apache.hudi.hive.NonPartitionedExtractor";

/// Commit retention applied to merging pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Commits the cleaner keeps
    pub commits_retained: u32,
    /// Lower bound of archived timeline
    pub min_commits: u32,
    /// Upper bound of archived timeline
    pub max_commits: u32,
    /// Clean after every commit
    pub auto_clean: bool,
}

impl RetentionPolicy {
    /// Fixed retention for all tenants
    pub const STANDARD: RetentionPolicy = RetentionPolicy {
        commits_retained: 5,
        min_commits: 10,
        max_commits: 15,
        auto_clean: true,
    };
}

/// Write settings selected by pipeline type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteSettings {
    /// Bulk load, sorted within each partition
    Bulk,
    /// Merge on record key with bounded commit history
    Upsert(RetentionPolicy),
}

impl WriteSettings {
    /// Select settings for a pipeline type
    #[inline]
    #[must_use]
    pub fn for_pipeline(pipeline_type: PipelineType) -> Self {
        match pipeline_type {
            PipelineType::BulkInsert => WriteSettings::Bulk,
            PipelineType::IncrementalUpsert | PipelineType::ContinuousUpsert => {
                WriteSettings::Upsert(RetentionPolicy::STANDARD)
            }
        }
    }
}

/// Record key generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGenerator {
    /// One key field, partitioned table
    Simple,
    /// Several key fields
    Complex,
    /// One key field, single-partition table
    Nonpartitioned,
}

impl KeyGenerator {
    /// Pick the generator for a key and partition layout
    ///
    /// Depends on nothing else; in particular the pipeline type never matters.
    #[must_use]
    pub fn select(partitioning: &Partitioning, record_key: &RecordKey) -> Self {
        if record_key.is_composite() {
            KeyGenerator::Complex
        } else if partitioning.is_partitioned() {
            KeyGenerator::Simple
        } else {
            KeyGenerator::Nonpartitioned
        }
    }

    /// Engine class name
    #[inline]
    #[must_use]
    pub fn class_name(self) -> &'static str {
        match self {
            KeyGenerator::Simple => "org.apache.hudi.keygen.SimpleKeyGenerator",
            KeyGenerator::Complex => "org.apache.hudi.keygen.ComplexKeyGenerator",
            KeyGenerator::Nonpartitioned => "org.apache.hudi.keygen.NonpartitionedKeyGenerator",
        }
    }
}

/// Synthesized engine configuration for one table
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Target table name
    pub table_name: String,
    /// Record key field(s)
    pub record_key: RecordKey,
    /// Precombine field
    pub ordering_field: String,
    /// Source directory
    pub source_root: String,
    /// Catalog database
    pub catalog_database: String,
    /// Write settings
    pub write: WriteSettings,
    /// Partition layout
    pub partitioning: Partitioning,
    /// Key generator
    pub key_generator: KeyGenerator,
    /// Compact delta logs inline
    pub inline_compaction: bool,
    /// SQL transform
    pub transformer_sql: Option<String>,
}

impl EngineConfig {
    /// Synthesize configuration for a validated table
    ///
    /// `table_name` is the target table name (dots already replaced).
    #[must_use]
    pub fn synthesize(
        config: &CompilerConfig,
        tenant_identifier: &str,
        table_name: &str,
        table: &TableSpec,
        pipeline_type: PipelineType,
    ) -> Self {
        let engine = Self {
            table_name: table_name.to_string(),
            record_key: table.record_key.clone(),
            ordering_field: table.ordering_field.clone(),
            source_root: source_root(&config.raw_lake_uri, tenant_identifier, table_name),
            catalog_database: config.catalog_database.clone(),
            write: WriteSettings::for_pipeline(pipeline_type),
            partitioning: table.partitioning.clone(),
            key_generator: KeyGenerator::select(&table.partitioning, &table.record_key),
            inline_compaction: table.table_type == TableType::MergeOnRead,
            transformer_sql: table.transformer_sql.clone(),
        };
        tracing::debug!(table = table_name, engine = ?engine, "Synthesized engine config");
        engine
    }

    /// Partition extractor synced to the catalog
    #[inline]
    #[must_use]
    pub fn partition_extractor(&self) -> &str {
        match &self.partitioning {
            Partitioning::Unpartitioned => NON_PARTITIONED_EXTRACTOR,
            Partitioning::Hive {
                extractor_class, ..
            } => extractor_class,
        }
    }

    /// Render as ordered engine parameters
    #[must_use]
    pub fn properties(&self) -> IndexMap<&'static str, String> {
        let mut props = IndexMap::new();
        let flag = |on: bool| (if on { "true" } else { "false" }).to_string();

        props.insert(keys::CLUSTERING_INLINE, flag(true));
        props.insert(keys::ARCHIVE_MERGE_ENABLE, flag(true));
        props.insert(keys::TABLE_NAME, self.table_name.clone());
        props.insert(keys::RECORD_KEY_FIELD, self.record_key.to_string());
        props.insert(keys::PRECOMBINE_FIELD, self.ordering_field.clone());
        props.insert(keys::SYNC_DATABASE, self.catalog_database.clone());
        props.insert(keys::SYNC_ENABLE, flag(true));
        props.insert(keys::SYNC_TABLE, self.table_name.clone());
        props.insert(keys::CLUSTERING_INLINE_ENABLE, flag(true));
        props.insert(keys::SOURCE_ROOT, self.source_root.clone());

        match self.write {
            WriteSettings::Bulk => {
                props.insert(keys::WRITE_OPERATION, "bulk_insert".to_string());
                props.insert(keys::BULK_INSERT_SORT_MODE, "PARTITION_SORT".to_string());
            }
            WriteSettings::Upsert(retention) => {
                props.insert(keys::WRITE_OPERATION, "upsert".to_string());
                props.insert(
                    keys::CLEANER_COMMITS_RETAINED,
                    retention.commits_retained.to_string(),
                );
                props.insert(keys::CLEAN_AUTOMATIC, flag(retention.auto_clean));
                props.insert(keys::KEEP_MIN_COMMITS, retention.min_commits.to_string());
                props.insert(keys::KEEP_MAX_COMMITS, retention.max_commits.to_string());
            }
        }

        if let Partitioning::Hive { path, .. } = &self.partitioning {
            props.insert(keys::HIVE_STYLE_PARTITIONING, flag(true));
            props.insert(keys::PARTITION_PATH_FIELD, path.clone());
            props.insert(keys::SYNC_PARTITION_FIELDS, path.clone());
        }

        props.insert(
            keys::KEY_GENERATOR_CLASS,
            self.key_generator.class_name().to_string(),
        );

        if self.inline_compaction {
            props.insert(keys::COMPACT_INLINE, flag(true));
        }
        if let Some(sql) = &self.transformer_sql {
            props.insert(keys::TRANSFORMER_SQL, sql.clone());
        }

        props.insert(
            keys::SYNC_PARTITION_EXTRACTOR,
            self.partition_extractor().to_string(),
        );
        props
    }
}

/// Source directory of a table: the first two `_` of the name become path separators
fn source_root(raw_lake_uri: &str, tenant_identifier: &str, table_name: &str) -> String {
    let relative = table_name.replacen('_', "/", 2);
    lake_dir(raw_lake_uri, &[tenant_identifier, &relative])
}
