//! Pipeline launcher service
//!
//! Ties the pieces of one invocation together:
//! - Validates the requested pipeline type
//! - Fetches and classifies the tenant's records
//! - Compiles the job document
//! - Waits out running executions of the plan
//! - Starts the execution

use crate::error::LaunchError;
use crate::guard::ConcurrencyGuard;
use crate::launcher::{Clock, ExecutionLauncher, SystemClock};
use crate::orchestrator::Orchestrator;
use crate::store::{fetch_all_records, ConfigStore};
use crate::types::{ExecutionHandle, LaunchConfig, LaunchRequest, LaunchResponse};
use lakeplan_compiler::{compile_plan, JobDocument, StepCompiler};
use lakeplan_config::{classify, PipelineType};
use std::sync::Arc;

/// Entry point for launch invocations
///
/// Owns the compiler and both collaborator seams.
#[derive(Clone)]
pub struct PipelineLauncher {
    config: LaunchConfig,
    store: Arc<dyn ConfigStore>,
    compiler: StepCompiler,
    guard: ConcurrencyGuard,
    launcher: ExecutionLauncher,
}

impl std::fmt::Debug for PipelineLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineLauncher")
            .field("config", &self.config)
            .field("guard", &self.guard)
            .field("launcher", &self.launcher)
            .finish_non_exhaustive()
    }
}

impl PipelineLauncher {
    /// Create launcher reading the wall clock
    #[must_use]
    pub fn new(
        config: LaunchConfig,
        store: Arc<dyn ConfigStore>,
        orchestrator: Arc<dyn Orchestrator>,
    ) -> Self {
        Self::with_clock(config, store, orchestrator, Arc::new(SystemClock))
    }

    /// Create launcher with an explicit clock
    #[must_use]
    pub fn with_clock(
        config: LaunchConfig,
        store: Arc<dyn ConfigStore>,
        orchestrator: Arc<dyn Orchestrator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            compiler: StepCompiler::new(config.compiler.clone()),
            guard: ConcurrencyGuard::new(Arc::clone(&orchestrator), config.retry),
            launcher: ExecutionLauncher::new(orchestrator, clock),
            store,
            config,
        }
    }

    /// Launcher settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    /// Compile the job document for a tenant without launching it
    ///
    /// An unsupported pipeline type fails before the store is read.
    ///
    /// # Errors
    /// - `LaunchError::Config` for an unsupported type or unusable records
    /// - `LaunchError::Transport` if the store cannot be read
    /// - `LaunchError::Compile` if no table is enabled
    pub async fn compile(
        &self,
        tenant: &str,
        requested_type: &str,
    ) -> Result<JobDocument, LaunchError> {
        let pipeline_type: PipelineType = requested_type.parse()?;
        tracing::info!(tenant, %pipeline_type, "Compiling pipeline");

        let records = fetch_all_records(self.store.as_ref(), tenant).await?;
        let classified = classify(tenant, records, pipeline_type)?;
        let document = compile_plan(
            &self.compiler,
            classified,
            &self.config.caller_identity,
            Some(self.config.log_level.as_str()),
        )?;
        Ok(document)
    }

    /// Compile, guard and launch one pipeline run
    ///
    /// # Workflow
    /// 1. Compile the job document (configuration errors surface here)
    /// 2. Wait for running executions of the plan to finish
    /// 3. Start the execution
    ///
    /// # Errors
    /// - any error of [`PipelineLauncher::compile`]
    /// - `LaunchError::Conflict` if the plan stays busy past the wait cap
    /// - `LaunchError::Submit` if the orchestrator refuses the execution
    pub async fn launch(&self, request: &LaunchRequest) -> Result<ExecutionHandle, LaunchError> {
        let document = self
            .compile(&request.tenant_identifier, &request.pipeline_type)
            .await?;

        let attempts = self.guard.acquire(&self.config.plan_identity).await?;
        tracing::debug!(
            tenant = %request.tenant_identifier,
            attempts,
            "Concurrency guard passed"
        );

        self.launcher.launch(&self.config.plan_identity, &document).await
    }

    /// Run one invocation and map the outcome to a response
    pub async fn handle(&self, request: &LaunchRequest) -> LaunchResponse {
        match self.launch(request).await {
            Ok(handle) => LaunchResponse::accepted(handle),
            Err(err) => {
                tracing::error!(
                    tenant = %request.tenant_identifier,
                    pipeline_type = %request.pipeline_type,
                    configuration = err.is_configuration(),
                    error = %err,
                    "Launch failed"
                );
                LaunchResponse::rejected(&err)
            }
        }
    }

    /// Decode a raw invocation payload and handle it
    pub async fn handle_value(&self, payload: serde_json::Value) -> LaunchResponse {
        match serde_json::from_value::<LaunchRequest>(payload) {
            Ok(request) => self.handle(&request).await,
            Err(source) => {
                let err = LaunchError::InvalidRequest(source);
                tracing::error!(error = %err, "Rejected invocation payload");
                LaunchResponse::rejected(&err)
            }
        }
    }
}
