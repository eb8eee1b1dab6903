//! Stage specs and their runtime state.

use std::os::fd::OwnedFd;
use std::process::Stdio;

use runpipe_types::ExitStatus;
use tokio::process::Child;

/// Argument vector of one stage. The first element is the executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    argv: Vec<String>,
}

impl StageSpec {
    /// Create a spec; `None` if `argv` is empty.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            None
        } else {
            Some(Self { argv })
        }
    }

    /// The executable name.
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments after the executable name.
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    /// The full argument vector.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

/// Where a stage's stdin comes from or its stdout goes to.
#[derive(Debug)]
pub enum Endpoint {
    /// Use the orchestrator's own descriptor.
    Inherit,
    /// A pipe end (or caller-supplied descriptor) owned by this stage.
    Fd(OwnedFd),
    /// Moved into the child at launch.
    Released,
}

impl Endpoint {
    /// True while this stage still owns a descriptor.
    pub fn is_fd(&self) -> bool {
        matches!(self, Endpoint::Fd(_))
    }

    /// True once the descriptor has moved into a child.
    pub fn is_released(&self) -> bool {
        matches!(self, Endpoint::Released)
    }

    /// Move the endpoint out as a `Stdio`, leaving `Released` behind.
    pub(crate) fn take_stdio(&mut self) -> Stdio {
        match std::mem::replace(self, Endpoint::Released) {
            Endpoint::Inherit => Stdio::inherit(),
            Endpoint::Fd(fd) => Stdio::from(fd),
            // Only reachable for an already launched stage, which the launcher rejects.
            Endpoint::Released => Stdio::null(),
        }
    }
}

/// Process state of a stage.
#[derive(Debug)]
pub enum ProcessHandle {
    /// `launch` has not run (or failed with a structural error).
    NotLaunched,
    /// The child is running or exited but not yet reaped.
    Running(Child),
    /// The program could not be executed; `code` is what a shell would report.
    ExecFailed { code: u8, error: String },
    /// Already waited on.
    Reaped(ExitStatus),
}

/// One stage of a pipeline: its spec, its endpoints and its process.
#[derive(Debug)]
pub struct Stage {
    index: usize,
    spec: StageSpec,
    pub(crate) stdin: Endpoint,
    pub(crate) stdout: Endpoint,
    pub(crate) handle: ProcessHandle,
    pub(crate) pid: Option<u32>,
}

impl Stage {
    /// A not yet launched stage inheriting both stdin and stdout.
    pub fn new(index: usize, spec: StageSpec) -> Self {
        Self {
            index,
            spec,
            stdin: Endpoint::Inherit,
            stdout: Endpoint::Inherit,
            handle: ProcessHandle::NotLaunched,
            pid: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn spec(&self) -> &StageSpec {
        &self.spec
    }

    pub fn program(&self) -> &str {
        self.spec.program()
    }

    pub fn stdin(&self) -> &Endpoint {
        &self.stdin
    }

    pub fn stdout(&self) -> &Endpoint {
        &self.stdout
    }

    pub fn handle(&self) -> &ProcessHandle {
        &self.handle
    }

    /// OS process ID, once launched.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// True if a child process exists and has not been reaped.
    pub fn is_running(&self) -> bool {
        matches!(self.handle, ProcessHandle::Running(_))
    }

    /// Number of descriptors this stage still owns (0, 1 or 2).
    pub fn held_endpoints(&self) -> usize {
        usize::from(self.stdin.is_fd()) + usize::from(self.stdout.is_fd())
    }

    /// Close any descriptors the stage still owns.
    pub(crate) fn release_endpoints(&mut self) {
        if self.stdin.is_fd() {
            self.stdin = Endpoint::Released;
        }
        if self.stdout.is_fd() {
            self.stdout = Endpoint::Released;
        }
    }
}
