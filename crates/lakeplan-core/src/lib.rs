//! Lakeplan Core - fetch, guard and launch
//!
//! Runs one pipeline invocation end to end:
//! - Reads the tenant's records from a paginated store
//! - Compiles them into a job document
//! - Holds the launch while an execution of the plan is running
//! - Starts the execution under a timestamped name
//!
//! # Example
//!
//! ```rust,ignore
//! use lakeplan_core::{InMemoryConfigStore, InMemoryOrchestrator, LaunchConfig, LaunchRequest, PipelineLauncher};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LaunchConfig::from_env()?;
//! let launcher = PipelineLauncher::new(
//!     config,
//!     Arc::new(InMemoryConfigStore::new()),
//!     Arc::new(InMemoryOrchestrator::new()),
//! );
//!
//! let response = launcher.handle(&LaunchRequest::new("t1", "bulk_insert")).await;
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod guard;
pub mod launcher;
pub mod orchestrator;
pub mod service;
pub mod store;
pub mod types;

pub use error::{LaunchError, SettingsError, SubmitError, TransportError, BAD_REQUEST};
pub use guard::ConcurrencyGuard;
pub use launcher::{execution_name, Clock, ExecutionLauncher, FixedClock, SystemClock};
pub use orchestrator::{
    list_all_running, ExecutionPage, InMemoryOrchestrator, Orchestrator, SubmittedExecution,
};
pub use service::PipelineLauncher;
pub use store::{
    fetch_all_records, ConfigStore, InMemoryConfigStore, JsonFileConfigStore, RecordPage,
};
pub use types::{
    ExecutionHandle, ExecutionId, ExecutionStatus, LaunchConfig, LaunchRequest, LaunchResponse,
    RetryPolicy, OK,
};
