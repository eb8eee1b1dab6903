//! Process launcher: spawn one stage with its endpoints as stdio.
//!
//! The parent's side of the classic fork/dup2/close dance is expressed through
//! ownership. The stage's endpoints move into the `Command` as `Stdio`, and
//! the `Command` is dropped as soon as the spawn call returns, which closes
//! the parent's copies. The child side needs no closing loop: every pipe end
//! is close-on-exec, so exec drops whatever the child inherited except the
//! descriptors installed as its stdin and stdout.

use std::io;
use std::process::Stdio;

use nix::errno::Errno;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::PipelineError;

use super::stage::{ProcessHandle, Stage};

/// What happened when a stage was launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launched {
    /// A child process is running.
    Running { pid: u32 },
    /// The program could not be executed. The stage will report `code`.
    ExecFailed { code: u8, error: String },
}

/// Spawn `stage`.
///
/// Exec failures (program missing, not executable) stay local to the stage
/// and surface through its exit status. Failure to create the process at all
/// is fatal to the pipeline.
///
/// Must be called from within a Tokio runtime.
pub fn launch(stage: &mut Stage) -> Result<Launched, PipelineError> {
    if !matches!(stage.handle, ProcessHandle::NotLaunched) {
        return Err(PipelineError::AlreadyLaunched { index: stage.index() });
    }

    let spawned = {
        let mut command = Command::new(stage.spec().program());
        command
            .args(stage.spec().args())
            .stdin(stage.stdin.take_stdio())
            .stdout(stage.stdout.take_stdio())
            .stderr(Stdio::inherit());
        command.spawn()
    };

    match spawned {
        Ok(child) => {
            let pid = child.id();
            debug!(stage = stage.index(), program = stage.program(), ?pid, "launched");
            stage.pid = pid;
            stage.handle = ProcessHandle::Running(child);
            // id() is only None after the child has been reaped
            Ok(Launched::Running { pid: pid.unwrap_or_default() })
        }
        Err(source) if is_fork_failure(&source) => Err(PipelineError::Fork {
            index: stage.index(),
            program: stage.program().to_string(),
            source,
        }),
        Err(err) => {
            let code = exec_failure_code(&err);
            let error = format!("{}: {}", stage.program(), err);
            warn!(stage = stage.index(), code, "{}", error);
            stage.handle = ProcessHandle::ExecFailed { code, error: error.clone() };
            Ok(Launched::ExecFailed { code, error })
        }
    }
}

/// The process could not be created, as opposed to created but unable to exec.
fn is_fork_failure(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(code) if code == Errno::EAGAIN as i32 || code == Errno::ENOMEM as i32
    )
}

/// Shell convention: 127 for "command not found", 126 for anything else.
fn exec_failure_code(err: &io::Error) -> u8 {
    if err.kind() == io::ErrorKind::NotFound {
        127
    } else {
        126
    }
}
