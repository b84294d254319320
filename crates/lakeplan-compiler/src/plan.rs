//! Plan assembly
//!
//! Wraps compiled steps and the pipeline record into the job document the
//! orchestration engine receives.

use crate::error::CompileError;
use crate::steps::{StepCompiler, StepDescriptor};
use lakeplan_config::{ClassifiedConfig, PipelineRecord, PipelineType};
use serde::{Deserialize, Serialize};

/// Log level used when the caller's environment sets none
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Orchestrator-ready description of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDocument {
    /// Identity of the invoking component
    pub caller_identity: String,
    /// Tenant identifier
    pub tenant_identifier: String,
    /// Active pipeline type
    pub pipeline_type: PipelineType,
    /// One step per enabled table, never empty
    pub steps: Vec<StepDescriptor>,
    /// Pipeline record as stored, sizing normalized
    pub pipeline: PipelineRecord,
    /// Log level for the steps
    pub log_level: String,
}

/// Assemble the job document
///
/// # Errors
/// - `CompileError::EmptyPlan` if `steps` is empty
pub fn assemble(
    steps: Vec<StepDescriptor>,
    classified: ClassifiedConfig,
    caller_identity: &str,
    log_level: Option<&str>,
) -> Result<JobDocument, CompileError> {
    if steps.is_empty() {
        return Err(CompileError::EmptyPlan {
            pipeline_type: classified.pipeline_type,
            configured_tables: classified.tables.len(),
        });
    }

    tracing::info!(
        tenant = %classified.tenant_identifier,
        pipeline_type = %classified.pipeline_type,
        steps = steps.len(),
        "Job document assembled"
    );

    Ok(JobDocument {
        caller_identity: caller_identity.to_string(),
        tenant_identifier: classified.tenant_identifier,
        pipeline_type: classified.pipeline_type,
        steps,
        pipeline: classified.pipeline,
        log_level: log_level
            .filter(|level| !level.trim().is_empty())
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_string(),
    })
}

/// Compile steps and assemble them in one go
///
/// # Errors
/// - any error of [`StepCompiler::compile`] or [`assemble`]
pub fn compile_plan(
    compiler: &StepCompiler,
    classified: ClassifiedConfig,
    caller_identity: &str,
    log_level: Option<&str>,
) -> Result<JobDocument, CompileError> {
    let steps = compiler.compile(&classified)?;
    assemble(steps, classified, caller_identity, log_level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use lakeplan_config::classify;
    use lakeplan_test_utils::{pipeline_record, single_table_records, TableFixture, TENANT};

    fn classified(records: Vec<lakeplan_config::ConfigRecord>, pipeline_type: PipelineType) -> ClassifiedConfig {
        classify(TENANT, records, pipeline_type).unwrap()
    }

    #[test]
    fn empty_steps_fail_with_pipeline_type() {
        let config = classified(
            vec![pipeline_record(TENANT, PipelineType::IncrementalUpsert)],
            PipelineType::IncrementalUpsert,
        );

        let err = assemble(Vec::new(), config, "launcher", None).unwrap_err();
        assert!(matches!(
            err,
            CompileError::EmptyPlan {
                pipeline_type: PipelineType::IncrementalUpsert,
                configured_tables: 0
            }
        ));
        assert!(err.to_string().contains("incremental_upsert"));
    }

    #[test]
    fn log_level_defaults_to_info() {
        let compiler = StepCompiler::new(CompilerConfig::new("s3://raw", "s3://curated"));
        let config = classified(single_table_records(PipelineType::BulkInsert), PipelineType::BulkInsert);

        let doc = compile_plan(&compiler, config.clone(), "launcher", None).unwrap();
        assert_eq!(doc.log_level, "INFO");

        let doc = compile_plan(&compiler, config, "launcher", Some("DEBUG")).unwrap();
        assert_eq!(doc.log_level, "DEBUG");
    }

    #[test]
    fn document_carries_pipeline_record_and_caller() {
        let compiler = StepCompiler::new(CompilerConfig::new("s3://raw", "s3://curated"));
        let config = classified(single_table_records(PipelineType::BulkInsert), PipelineType::BulkInsert);
        let expected_pipeline = config.pipeline.clone();

        let doc = compile_plan(&compiler, config, "launch-fn", Some("")).unwrap();
        assert_eq!(doc.caller_identity, "launch-fn");
        assert_eq!(doc.tenant_identifier, TENANT);
        assert_eq!(doc.pipeline, expected_pipeline);
        assert_eq!(doc.log_level, "INFO");

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["pipeline_type"], "bulk_insert");
        assert_eq!(value["pipeline"]["emr_config"]["worker"]["count"], 4);
        assert_eq!(value["steps"][0]["step_name"], "sales_orders");
    }

    #[test]
    fn all_disabled_reports_configured_count() {
        let compiler = StepCompiler::default();
        let config = classified(
            vec![
                pipeline_record(TENANT, PipelineType::BulkInsert),
                TableFixture::new("a").disabled().build(TENANT),
                TableFixture::new("b").disabled().build(TENANT),
            ],
            PipelineType::BulkInsert,
        );

        let err = compile_plan(&compiler, config, "launcher", None).unwrap_err();
        assert!(err.to_string().contains("2 tables configured, none enabled"));
    }
}
