//! Progress events emitted while a pipeline runs.
//!
//! The orchestrator never prints. It hands each event to the caller's observer
//! as it happens and keeps a copy in the final report, so presentation is
//! entirely up to the caller.

use serde::{Deserialize, Serialize};

use crate::status::ExitStatus;

/// One step in the life of a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// The stage is about to be spawned.
    StageStarting { index: usize, program: String },
    /// The stage process is running.
    StageLaunched { index: usize, program: String, pid: u32 },
    /// The stage program could not be executed; it is reported as exited.
    StageExecFailed { index: usize, program: String, error: String },
    /// The orchestrator is blocking on this stage.
    StageWaiting { index: usize, program: String },
    /// The stage was reaped.
    StageExited { index: usize, program: String, status: ExitStatus },
    /// Waiting on the stage failed; other stages are still collected.
    StageWaitFailed { index: usize, program: String, error: String },
    /// The stage was signalled and reaped while aborting the pipeline.
    StageTerminated { index: usize, program: String, status: Option<ExitStatus> },
    /// The stage was left running while aborting the pipeline.
    StageAbandoned { index: usize, program: String, pid: Option<u32> },
}

impl PipelineEvent {
    /// Index of the stage this event concerns.
    pub fn index(&self) -> usize {
        match self {
            PipelineEvent::StageStarting { index, .. }
            | PipelineEvent::StageLaunched { index, .. }
            | PipelineEvent::StageExecFailed { index, .. }
            | PipelineEvent::StageWaiting { index, .. }
            | PipelineEvent::StageExited { index, .. }
            | PipelineEvent::StageWaitFailed { index, .. }
            | PipelineEvent::StageTerminated { index, .. }
            | PipelineEvent::StageAbandoned { index, .. } => *index,
        }
    }

    /// Program name of the stage this event concerns.
    pub fn program(&self) -> &str {
        match self {
            PipelineEvent::StageStarting { program, .. }
            | PipelineEvent::StageLaunched { program, .. }
            | PipelineEvent::StageExecFailed { program, .. }
            | PipelineEvent::StageWaiting { program, .. }
            | PipelineEvent::StageExited { program, .. }
            | PipelineEvent::StageWaitFailed { program, .. }
            | PipelineEvent::StageTerminated { program, .. }
            | PipelineEvent::StageAbandoned { program, .. } => program,
        }
    }
}
