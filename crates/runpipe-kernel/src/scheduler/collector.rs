//! Lifecycle collector: reap a stage and normalize its status.

use nix::sys::signal::Signal;
use runpipe_types::ExitStatus;
use tracing::debug;

use crate::error::WaitError;

use super::stage::{ProcessHandle, Stage};

/// Wait for `stage` to terminate.
///
/// Must be called once per launched stage. A stage whose program failed to
/// exec reports the exit code chosen by the launcher.
pub async fn wait(stage: &mut Stage) -> Result<ExitStatus, WaitError> {
    let index = stage.index();

    let status = match &mut stage.handle {
        ProcessHandle::NotLaunched => return Err(WaitError::InvalidHandle { index }),
        ProcessHandle::Reaped(_) => return Err(WaitError::AlreadyReaped { index }),
        ProcessHandle::ExecFailed { code, .. } => ExitStatus::Exited { code: *code },
        ProcessHandle::Running(child) => {
            let raw = child
                .wait()
                .await
                .map_err(|source| WaitError::Os { index, source })?;
            ExitStatus::from(raw)
        }
    };

    debug!(stage = index, %status, "reaped");
    stage.handle = ProcessHandle::Reaped(status);
    Ok(status)
}

/// Symbolic name for a signal number, e.g. `SIGKILL` for 9.
pub fn signal_name(signal: i32) -> Option<&'static str> {
    Signal::try_from(signal).ok().map(Signal::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_common_signals() {
        assert_eq!(signal_name(9), Some("SIGKILL"));
        assert_eq!(signal_name(15), Some("SIGTERM"));
        assert_eq!(signal_name(0), None);
    }
}
