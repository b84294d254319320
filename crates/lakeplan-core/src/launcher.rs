//! Execution launch

use crate::error::LaunchError;
use crate::orchestrator::Orchestrator;
use crate::types::ExecutionHandle;
use chrono::{DateTime, Utc};
use lakeplan_compiler::JobDocument;
use lakeplan_config::PipelineType;
use std::sync::Arc;

/// Timestamp layout of execution names, second resolution
pub const EXECUTION_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Name an execution `<tenant>-<pipeline_type>-<YYYYMMDDHHMMSS>`
#[must_use]
pub fn execution_name(tenant: &str, pipeline_type: PipelineType, at: DateTime<Utc>) -> String {
    format!(
        "{tenant}-{pipeline_type}-{}",
        at.format(EXECUTION_TIMESTAMP_FORMAT)
    )
}

/// Source of the current time
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Submits job documents to the orchestrator
#[derive(Clone)]
pub struct ExecutionLauncher {
    orchestrator: Arc<dyn Orchestrator>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ExecutionLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionLauncher")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl ExecutionLauncher {
    /// Create launcher
    #[inline]
    #[must_use]
    pub fn new(orchestrator: Arc<dyn Orchestrator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            orchestrator,
            clock,
        }
    }

    /// Start one execution of `document` under `plan_identity`
    ///
    /// Submission failures are returned as they are, never retried.
    ///
    /// # Errors
    /// - `LaunchError::Submit` if the orchestrator refuses the execution
    pub async fn launch(
        &self,
        plan_identity: &str,
        document: &JobDocument,
    ) -> Result<ExecutionHandle, LaunchError> {
        let name = execution_name(
            &document.tenant_identifier,
            document.pipeline_type,
            self.clock.now(),
        );

        let handle = self.orchestrator.start(plan_identity, &name, document).await?;
        tracing::info!(
            tenant = %document.tenant_identifier,
            pipeline_type = %document.pipeline_type,
            execution_name = %handle.execution_name,
            execution_id = %handle.execution_id,
            steps = document.steps.len(),
            "Execution started"
        );
        Ok(handle)
    }
}
