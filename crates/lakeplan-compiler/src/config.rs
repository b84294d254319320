//! Compiler configuration
//!
//! Lake locations, catalog database, and the engine invocation layout.

use serde::{Deserialize, Serialize};

/// Default catalog database
pub const DEFAULT_CATALOG_DATABASE: &str = "default";

/// Compiler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Landing zone root the engine reads from
    pub raw_lake_uri: String,
    /// Curated zone root the engine writes to
    pub curated_lake_uri: String,
    /// Catalog database tables are synced into
    pub catalog_database: String,
    /// Engine invocation layout
    pub engine: EngineLayout,
}

impl CompilerConfig {
    /// Create configuration for a pair of lake roots
    #[inline]
    #[must_use]
    pub fn new(raw_lake_uri: impl Into<String>, curated_lake_uri: impl Into<String>) -> Self {
        Self {
            raw_lake_uri: raw_lake_uri.into(),
            curated_lake_uri: curated_lake_uri.into(),
            ..Self::default()
        }
    }

    /// With catalog database
    #[inline]
    #[must_use]
    pub fn with_catalog_database(mut self, database: impl Into<String>) -> Self {
        self.catalog_database = database.into();
        self
    }

    /// With engine layout
    #[inline]
    #[must_use]
    pub fn with_engine(mut self, engine: EngineLayout) -> Self {
        self.engine = engine;
        self
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            raw_lake_uri: String::new(),
            curated_lake_uri: String::new(),
            catalog_database: DEFAULT_CATALOG_DATABASE.to_string(),
            engine: EngineLayout::default(),
        }
    }
}

/// How one engine step is launched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineLayout {
    /// Launcher executable
    pub launcher: String,
    /// Streamer entry point class
    pub main_class: String,
    /// Bundle jar holding the entry point
    pub bundle_jar: String,
    /// Source reader class
    pub source_class: String,
}

impl Default for EngineLayout {
    fn default() -> Self {
        Self {
            launcher: "spark-submit".to_string(),
            main_class: "org.apache.hudi.utilities.deltastreamer.HoodieDeltaStreamer".to_string(),
            bundle_jar: "/usr/lib/hudi/hudi-utilities-bundle.jar".to_string(),
            source_class: "org.apache.hudi.utilities.sources.ParquetDFSSource".to_string(),
        }
    }
}

/// Join a lake root and path segments into a directory URI ending in `/`
#[must_use]
pub fn lake_dir(root: &str, segments: &[&str]) -> String {
    let mut uri = root.trim_end_matches('/').to_string();
    for segment in segments {
        let segment = segment.trim_matches('/');
        if !segment.is_empty() {
            uri.push('/');
            uri.push_str(segment);
        }
    }
    uri.push('/');
    uri
}
