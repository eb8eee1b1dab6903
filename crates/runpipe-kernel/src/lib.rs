//! runpipe-kernel: the pipeline engine behind `runpipe`.
//!
//! This crate provides:
//!
//! - **Parser**: Splits a flat token list into stage argument vectors
//! - **Config**: Delimiter, stage limit and abort policy
//! - **Scheduler**: Pipe graph construction, stage launching, reaping and the
//!   orchestrator that sequences them
//! - **Errors**: Typed configuration, resource and wait errors

pub mod config;
pub mod error;
pub mod parser;
pub mod scheduler;

pub use config::{
    AbortPolicy, PipelineConfig, DEFAULT_DELIMITER, DEFAULT_MAX_STAGES, DEFAULT_TERMINATE_GRACE,
};
pub use error::{ConfigError, ParseError, PipelineError, WaitError};
pub use parser::parse_stages;
pub use scheduler::{
    signal_name, Endpoint, Pipe, Pipeline, PipelineRunner, ProcessHandle, Stage, StageSpec,
};

// Data types, re-exported so embedders need a single dependency.
pub use runpipe_types::{ExitStatus, PipelineEvent, PipelineReport, StageOutcome, StageReport};
