//! Compilation errors

use lakeplan_config::{ConfigError, PipelineType};

/// Errors raised while turning classified configuration into a plan
///
/// Every variant is a configuration problem: fatal and never retried.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A table record failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No table produced a step
    #[error(
        "no steps generated for pipeline type '{pipeline_type}' ({}); ensure tables are configured and enabled",
        describe_tables(.configured_tables)
    )]
    EmptyPlan {
        /// Active pipeline type
        pipeline_type: PipelineType,
        /// Table records present, enabled or not
        configured_tables: usize,
    },
}

fn describe_tables(configured: &usize) -> String {
    match *configured {
        0 => "no tables configured".to_string(),
        1 => "1 table configured, none enabled".to_string(),
        n => format!("{n} tables configured, none enabled"),
    }
}
