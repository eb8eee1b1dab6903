//! Normalized process termination status.

use serde::{Deserialize, Serialize};

/// How a stage process terminated.
///
/// Replaces raw wait-status bit twiddling with a tagged value. A stage that
/// was killed by a signal never reports a spurious exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitStatus {
    /// The process called `exit` (or returned from `main`) with this code.
    Exited { code: u8 },
    /// The process was terminated by a signal.
    Signaled { signal: i32, core_dumped: bool },
    /// The OS reported a status that is neither an exit nor a signal.
    Unknown,
}

impl ExitStatus {
    /// True if the process exited normally with code 0.
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Exited { code: 0 })
    }

    /// The exit code, if the process exited normally.
    pub fn code(&self) -> Option<u8> {
        match self {
            ExitStatus::Exited { code } => Some(*code),
            _ => None,
        }
    }

    /// The terminating signal, if the process was killed by one.
    pub fn signal(&self) -> Option<i32> {
        match self {
            ExitStatus::Signaled { signal, .. } => Some(*signal),
            _ => None,
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            // Exit codes are truncated to 8 bits by the kernel already.
            return ExitStatus::Exited { code: (code & 0xff) as u8 };
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitStatus::Signaled {
                    signal,
                    core_dumped: status.core_dumped(),
                };
            }
        }

        ExitStatus::Unknown
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitStatus::Exited { code } => write!(f, "exit code {}", code),
            ExitStatus::Signaled { signal, core_dumped: true } => {
                write!(f, "signal {} (core dumped)", signal)
            }
            ExitStatus::Signaled { signal, .. } => write!(f, "signal {}", signal),
            ExitStatus::Unknown => write!(f, "unknown status"),
        }
    }
}
