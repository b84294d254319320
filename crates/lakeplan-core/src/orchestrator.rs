//! Orchestration engine seam
//!
//! The orchestrator runs job documents under a plan identity. Only two
//! operations are needed: listing running executions and starting one.

use crate::error::{SubmitError, TransportError};
use crate::types::{ExecutionHandle, ExecutionId, ExecutionStatus};
use async_trait::async_trait;
use chrono::Utc;
use lakeplan_compiler::JobDocument;
use parking_lot::Mutex;

const ORCHESTRATOR: &str = "orchestrator";

/// One page of running executions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPage {
    /// Running executions on this page
    pub executions: Vec<ExecutionHandle>,
    /// Token of the next page, `None` on the last page
    pub next_page_token: Option<String>,
}

/// Orchestration engine client
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// List one page of running executions of `plan_identity`
    async fn list_running_page(
        &self,
        plan_identity: &str,
        page_token: Option<String>,
    ) -> Result<ExecutionPage, TransportError>;

    /// Start an execution of `plan_identity` named `execution_name`
    async fn start(
        &self,
        plan_identity: &str,
        execution_name: &str,
        document: &JobDocument,
    ) -> Result<ExecutionHandle, SubmitError>;
}

/// List every running execution of a plan, across all pages
///
/// # Errors
/// - any `TransportError` of the orchestrator
pub async fn list_all_running(
    orchestrator: &dyn Orchestrator,
    plan_identity: &str,
) -> Result<Vec<ExecutionHandle>, TransportError> {
    let mut running = Vec::new();
    let mut page_token = None;

    loop {
        let page = orchestrator
            .list_running_page(plan_identity, page_token.take())
            .await?;
        running.extend(page.executions);

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => return Ok(running),
        }
    }
}

/// Execution recorded by [`InMemoryOrchestrator`]
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedExecution {
    /// Plan the execution runs under
    pub plan_identity: String,
    /// Handle returned on start
    pub handle: ExecutionHandle,
    /// Submitted document
    pub document: JobDocument,
}

/// Orchestrator keeping executions in memory
///
/// Executions stay `Running` until [`InMemoryOrchestrator::complete`] is called.
#[derive(Debug)]
pub struct InMemoryOrchestrator {
    executions: Mutex<Vec<SubmittedExecution>>,
    page_size: usize,
}

impl InMemoryOrchestrator {
    /// Create empty orchestrator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            executions: Mutex::new(Vec::new()),
            page_size: 100,
        }
    }

    /// With listing page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Move a running execution to a terminal status
    ///
    /// Returns `false` if no running execution has that name.
    pub fn complete(&self, execution_name: &str, status: ExecutionStatus) -> bool {
        let mut executions = self.executions.lock();
        match executions
            .iter_mut()
            .find(|e| e.handle.execution_name == execution_name && e.handle.status.is_running())
        {
            Some(execution) => {
                execution.handle.status = status;
                tracing::info!(execution_name, ?status, "Execution completed");
                true
            }
            None => false,
        }
    }

    /// Every execution submitted so far, in submission order
    #[must_use]
    pub fn executions(&self) -> Vec<SubmittedExecution> {
        self.executions.lock().clone()
    }

    /// Number of running executions of a plan
    #[must_use]
    pub fn running_count(&self, plan_identity: &str) -> usize {
        self.executions
            .lock()
            .iter()
            .filter(|e| e.plan_identity == plan_identity && e.handle.status.is_running())
            .count()
    }
}

impl Default for InMemoryOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Orchestrator for InMemoryOrchestrator {
    async fn list_running_page(
        &self,
        plan_identity: &str,
        page_token: Option<String>,
    ) -> Result<ExecutionPage, TransportError> {
        let offset = match page_token.as_deref() {
            Some(token) => token.parse::<usize>().map_err(|_| {
                TransportError::malformed(ORCHESTRATOR, format!("unknown page token '{token}'"))
            })?,
            None => 0,
        };

        let running: Vec<ExecutionHandle> = self
            .executions
            .lock()
            .iter()
            .filter(|e| e.plan_identity == plan_identity && e.handle.status.is_running())
            .map(|e| e.handle.clone())
            .collect();

        let end = offset.saturating_add(self.page_size).min(running.len());
        Ok(ExecutionPage {
            executions: running.get(offset..end).map(<[_]>::to_vec).unwrap_or_default(),
            next_page_token: (end < running.len()).then(|| end.to_string()),
        })
    }

    async fn start(
        &self,
        plan_identity: &str,
        execution_name: &str,
        document: &JobDocument,
    ) -> Result<ExecutionHandle, SubmitError> {
        if plan_identity.is_empty() {
            return Err(SubmitError::Rejected("plan identity is empty".to_string()));
        }

        let mut executions = self.executions.lock();
        if executions
            .iter()
            .any(|e| e.plan_identity == plan_identity && e.handle.execution_name == execution_name)
        {
            return Err(SubmitError::NameConflict(execution_name.to_string()));
        }

        let handle = ExecutionHandle {
            execution_id: ExecutionId::new(),
            execution_name: execution_name.to_string(),
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
        };
        executions.push(SubmittedExecution {
            plan_identity: plan_identity.to_string(),
            handle: handle.clone(),
            document: document.clone(),
        });
        Ok(handle)
    }
}
