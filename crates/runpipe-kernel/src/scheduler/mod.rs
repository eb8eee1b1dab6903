//! Scheduler module for runpipe — pipe wiring, launching and reaping.
//!
//! This module provides:
//! - **Stages**: `StageSpec` (what to run) and `Stage` (its endpoints and process)
//! - **Pipe graph**: N-1 close-on-exec pipes distributed to adjacent stages
//! - **Launcher**: spawns one stage with its endpoints as stdin/stdout
//! - **Collector**: reaps one stage and normalizes its exit status
//! - **Pipeline**: the orchestrator sequencing all of the above
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        PipelineRunner                        │
//! │  ┌─────────┐  pipe 0   ┌─────────┐  pipe 1   ┌─────────┐     │
//! │  │ stage 0 │──────────▶│ stage 1 │──────────▶│ stage 2 │     │
//! │  │ (spawn) │  stdout   │ (spawn) │  stdout   │ (spawn) │     │
//! │  └─────────┘           └─────────┘           └─────────┘     │
//! │   stdin: inherit                          stdout: inherit    │
//! └──────────────────────────────────────────────────────────────┘
//!
//!   wire ──▶ launch 0..N-1 ──▶ wait 0..N-1 ──▶ PipelineReport
//! ```
//!
//! Endpoints are `OwnedFd` values. Each one moves into exactly one child and
//! the parent's copy is dropped at launch, so once every stage is running the
//! orchestrator holds no pipe endpoints and every reader sees EOF when its
//! upstream writer exits.

mod collector;
mod launcher;
mod pipe_graph;
mod pipeline;
mod stage;

pub use collector::{signal_name, wait};
pub use launcher::{launch, Launched};
pub use pipe_graph::{build_pipes, build_pipes_with, Pipe};
pub use pipeline::{Pipeline, PipelineRunner};
pub use stage::{Endpoint, ProcessHandle, Stage, StageSpec};
