//! Error types for pipeline construction and lifecycle.
//!
//! Errors are split by when they can happen: configuration and parse errors
//! before anything is spawned, resource errors while wiring and launching,
//! and wait errors per stage during collection.

use thiserror::Error;

/// Invalid `PipelineConfig`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("stage delimiter must not be empty")]
    EmptyDelimiter,

    #[error("maximum stage count must be at least 1")]
    ZeroMaxStages,
}

/// The token list does not describe a valid pipeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing to run at all.
    #[error("specify at least one program to run; separate programs with {delimiter:?}")]
    NoStages { delimiter: String },

    /// A stage with no arguments, e.g. two delimiters in a row.
    #[error("stage {position} is empty")]
    EmptyStage { position: usize },

    /// The token list ends with the delimiter.
    #[error("last stage is empty: trailing {delimiter:?}")]
    TrailingDelimiter { delimiter: String },

    #[error("too many stages: at most {max} supported")]
    TooManyStages { max: usize },
}

/// Structural failure that aborts the whole pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Creating pipe `index` (between stage `index` and `index + 1`) failed.
    #[error("failed to create pipe {index}: {source}")]
    PipeCreation {
        index: usize,
        #[source]
        source: nix::Error,
    },

    /// `launch` was called twice for the same stage.
    #[error("stage {index} was already launched")]
    AlreadyLaunched { index: usize },

    /// The OS refused to create a process for a stage.
    #[error("failed to fork stage {index} ({program}): {source}")]
    Fork {
        index: usize,
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Waiting on one stage failed. Reported per stage, never fatal.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The stage was never successfully launched.
    #[error("stage {index} has no process to wait on")]
    InvalidHandle { index: usize },

    /// The stage was already waited on.
    #[error("stage {index} was already reaped")]
    AlreadyReaped { index: usize },

    /// The wait call itself failed.
    #[error("waiting on stage {index} failed: {source}")]
    Os {
        index: usize,
        #[source]
        source: std::io::Error,
    },
}
