//! Lakeplan Compiler - configuration to job plan
//!
//! Pure, synchronous transformations over an already-classified record set:
//! - Engine configuration synthesis per table
//! - Step compilation (one engine invocation per enabled table)
//! - Job document assembly
//!
//! # Example
//!
//! ```rust,ignore
//! use lakeplan_compiler::{compile_plan, CompilerConfig, StepCompiler};
//!
//! let compiler = StepCompiler::new(CompilerConfig::new("s3://raw", "s3://curated"));
//! let document = compile_plan(&compiler, classified, "launcher", Some("INFO"))?;
//! println!("{} steps", document.steps.len());
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod engine;
pub mod error;
pub mod plan;
pub mod steps;

pub use config::{CompilerConfig, EngineLayout, DEFAULT_CATALOG_DATABASE};
pub use engine::{EngineConfig, KeyGenerator, RetentionPolicy, WriteSettings};
pub use error::CompileError;
pub use plan::{assemble, compile_plan, JobDocument, DEFAULT_LOG_LEVEL};
pub use steps::{StepCompiler, StepDescriptor};
