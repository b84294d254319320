//! Step compilation
//!
//! Turns every enabled table of a [`ClassifiedConfig`] into one engine
//! invocation. Disabled tables are skipped, not rejected.

use crate::config::{lake_dir, CompilerConfig};
use crate::engine::EngineConfig;
use crate::error::CompileError;
use lakeplan_config::{ClassifiedConfig, PipelineType, TableRecord, WriteOperation};
use serde::{Deserialize, Serialize};

/// One engine invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDescriptor {
    /// Table name as keyed in the store
    pub step_name: String,
    /// Launcher command line
    pub argument_vector: Vec<String>,
}

impl StepDescriptor {
    /// Check if the argument vector holds a flag
    #[inline]
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.argument_vector.iter().any(|arg| arg == flag)
    }

    /// Value following the first occurrence of a flag
    #[must_use]
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.argument_vector
            .iter()
            .position(|arg| arg == flag)
            .and_then(|idx| self.argument_vector.get(idx + 1))
            .map(String::as_str)
    }

    /// Every value passed with a repeated flag
    #[must_use]
    pub fn flag_values(&self, flag: &str) -> Vec<&str> {
        self.argument_vector
            .windows(2)
            .filter(|pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
            .collect()
    }
}

/// Builds argument vectors for enabled tables
#[derive(Debug, Clone, Default)]
pub struct StepCompiler {
    config: CompilerConfig,
}

impl StepCompiler {
    /// Create new step compiler
    #[inline]
    #[must_use]
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile steps for every enabled table, in ascending table-name order
    ///
    /// Returns an empty list when no table is enabled; callers decide whether
    /// that is an error.
    ///
    /// # Errors
    /// - `CompileError::Config` if an enabled table is missing a required field
    pub fn compile(&self, classified: &ClassifiedConfig) -> Result<Vec<StepDescriptor>, CompileError> {
        let mut steps = Vec::new();

        for (name, table) in &classified.tables {
            if !table.enabled {
                tracing::info!(
                    table = %name,
                    "Table is disabled, skipping. To enable, set attribute \"enabled\": true"
                );
                continue;
            }

            let step = self.compile_table(
                &classified.tenant_identifier,
                name,
                table,
                classified.pipeline_type,
            )?;
            tracing::info!(
                table = %name,
                args = step.argument_vector.len(),
                "Table added to plan"
            );
            steps.push(step);
        }

        Ok(steps)
    }

    /// Compile the step of one enabled table
    ///
    /// # Errors
    /// - `CompileError::Config` if the table is missing a required field
    pub fn compile_table(
        &self,
        tenant_identifier: &str,
        name: &str,
        table: &TableRecord,
        pipeline_type: PipelineType,
    ) -> Result<StepDescriptor, CompileError> {
        let spec = table.validate(name, pipeline_type)?;
        let target_table = name.replace('.', "_");
        let engine = EngineConfig::synthesize(
            &self.config,
            tenant_identifier,
            &target_table,
            &spec,
            pipeline_type,
        );
        let layout = &self.config.engine;

        let mut args = ArgBuilder::new(&layout.launcher);

        for (key, value) in &spec.runtime_overrides {
            args.pair("--conf", format!("{key}={value}"));
        }

        args.pair("--class", &layout.main_class)
            .push(&layout.bundle_jar)
            .pair("--source-class", &layout.source_class)
            .push("--enable-sync")
            .pair("--target-table", &target_table)
            .pair(
                "--target-base-path",
                lake_dir(
                    &self.config.curated_lake_uri,
                    &[tenant_identifier, &target_table],
                ),
            )
            .pair("--source-ordering-field", &spec.ordering_field)
            .pair("--table-type", spec.table_type.as_str());

        if let Some(class) = &spec.transformer_class {
            args.pair("--transformer-class", class);
        }

        if let Some(op) = write_operation(pipeline_type, spec.operation.as_ref()) {
            args.pair("--op", op.as_str());
        }

        for (key, value) in engine.properties() {
            args.pair("--hoodie-conf", format!("{key}={value}"));
        }

        if pipeline_type.is_continuous() {
            args.push("--continuous");
        }

        Ok(StepDescriptor {
            step_name: name.to_string(),
            argument_vector: args.finish(),
        })
    }
}

/// Bulk pipelines always bulk insert; others honor the table override, if any
fn write_operation(
    pipeline_type: PipelineType,
    table_override: Option<&WriteOperation>,
) -> Option<WriteOperation> {
    match pipeline_type {
        PipelineType::BulkInsert => Some(WriteOperation::BulkInsert),
        PipelineType::IncrementalUpsert | PipelineType::ContinuousUpsert => table_override.cloned(),
    }
}

struct ArgBuilder(Vec<String>);

impl ArgBuilder {
    fn new(program: &str) -> Self {
        Self(vec![program.to_string()])
    }

    fn push(&mut self, arg: impl Into<String>) -> &mut Self {
        self.0.push(arg.into());
        self
    }

    fn pair(&mut self, flag: &str, value: impl Into<String>) -> &mut Self {
        self.0.push(flag.to_string());
        self.0.push(value.into());
        self
    }

    fn finish(self) -> Vec<String> {
        self.0
    }
}
