//! Pipeline orchestration for runpipe.
//!
//! Drives parse → wire → launch all → wait all, and the cleanup that runs
//! when a launch fails part way through. Progress is reported as
//! `PipelineEvent`s, handed to the caller's observer as they happen and kept
//! in the final `PipelineReport`.

use std::os::fd::OwnedFd;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use runpipe_types::{PipelineEvent, PipelineReport, StageOutcome, StageReport};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::config::{AbortPolicy, PipelineConfig};
use crate::error::PipelineError;
use crate::parser::parse_stages;

use super::collector;
use super::launcher::{self, Launched};
use super::pipe_graph::{build_pipes_with, connect, Pipe};
use super::stage::{Endpoint, ProcessHandle, Stage, StageSpec};

/// A wired pipeline: stages with their pipe endpoints assigned.
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<Stage>,
    pipe_count: usize,
    events: Vec<PipelineEvent>,
}

impl Pipeline {
    /// Create the pipe graph for `specs`.
    pub fn wire(specs: Vec<StageSpec>) -> Result<Self, PipelineError> {
        Self::wire_with(specs, Pipe::new)
    }

    /// Like [`Pipeline::wire`], with a caller-provided pipe factory.
    pub fn wire_with<F>(specs: Vec<StageSpec>, make_pipe: F) -> Result<Self, PipelineError>
    where
        F: FnMut() -> nix::Result<Pipe>,
    {
        let mut stages: Vec<Stage> = specs
            .into_iter()
            .enumerate()
            .map(|(index, spec)| Stage::new(index, spec))
            .collect();

        let pipes = build_pipes_with(stages.len(), make_pipe)?;
        let pipe_count = pipes.len();
        connect(&mut stages, pipes);

        debug!(stages = stages.len(), pipes = pipe_count, "pipe graph wired");
        Ok(Self {
            stages,
            pipe_count,
            events: Vec::new(),
        })
    }

    /// Feed the first stage from `fd` instead of the inherited stdin.
    ///
    /// Rejected with `AlreadyLaunched` once the stage has been launched or the
    /// pipeline aborted; `fd` is closed in that case.
    pub fn set_input(&mut self, fd: OwnedFd) -> Result<(), PipelineError> {
        if let Some(first) = self.stages.first_mut() {
            ensure_unlaunched(first, first.stdin.is_released())?;
            first.stdin = Endpoint::Fd(fd);
        }
        Ok(())
    }

    /// Send the last stage's output to `fd` instead of the inherited stdout.
    ///
    /// Rejected with `AlreadyLaunched` once the stage has been launched or the
    /// pipeline aborted; `fd` is closed in that case.
    pub fn set_output(&mut self, fd: OwnedFd) -> Result<(), PipelineError> {
        if let Some(last) = self.stages.last_mut() {
            ensure_unlaunched(last, last.stdout.is_released())?;
            last.stdout = Endpoint::Fd(fd);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Number of pipes created when wiring: always `len() - 1`.
    pub fn pipe_count(&self) -> usize {
        self.pipe_count
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Descriptors the orchestrator still owns across all stages.
    pub fn held_endpoints(&self) -> usize {
        self.stages.iter().map(Stage::held_endpoints).sum()
    }

    /// Launch every stage in index order.
    ///
    /// Stops at the first structural failure and returns it. Stages launched
    /// before that keep running; see [`Pipeline::abort`].
    pub fn launch_all(
        &mut self,
        observer: &mut dyn FnMut(&PipelineEvent),
    ) -> Result<(), PipelineError> {
        for index in 0..self.stages.len() {
            let program = self.stages[index].program().to_string();
            self.emit(
                observer,
                PipelineEvent::StageStarting {
                    index,
                    program: program.clone(),
                },
            );

            let event = match launcher::launch(&mut self.stages[index])? {
                Launched::Running { pid } => PipelineEvent::StageLaunched { index, program, pid },
                Launched::ExecFailed { error, .. } => {
                    PipelineEvent::StageExecFailed { index, program, error }
                }
            };
            self.emit(observer, event);
        }

        debug_assert_eq!(self.held_endpoints(), 0);
        Ok(())
    }

    /// Wait on every stage in index order and build the report.
    ///
    /// A stage that cannot be waited on is reported and skipped; the rest are
    /// still collected.
    pub async fn wait_all(&mut self, observer: &mut dyn FnMut(&PipelineEvent)) -> PipelineReport {
        let mut reports = Vec::with_capacity(self.stages.len());

        for index in 0..self.stages.len() {
            let program = self.stages[index].program().to_string();
            let pid = self.stages[index].pid();
            self.emit(
                observer,
                PipelineEvent::StageWaiting {
                    index,
                    program: program.clone(),
                },
            );

            let outcome = match collector::wait(&mut self.stages[index]).await {
                Ok(status) => {
                    self.emit(
                        observer,
                        PipelineEvent::StageExited {
                            index,
                            program: program.clone(),
                            status,
                        },
                    );
                    StageOutcome::Exited { status }
                }
                Err(err) => {
                    warn!(stage = index, "{}", err);
                    let error = err.to_string();
                    self.emit(
                        observer,
                        PipelineEvent::StageWaitFailed {
                            index,
                            program: program.clone(),
                            error: error.clone(),
                        },
                    );
                    StageOutcome::WaitFailed { error }
                }
            };

            reports.push(StageReport {
                index,
                program,
                pid,
                outcome,
            });
        }

        PipelineReport {
            stages: reports,
            events: std::mem::take(&mut self.events),
        }
    }

    /// Clean up after a failed launch.
    ///
    /// Descriptors of stages that never launched are closed first, so running
    /// stages see EOF or a broken pipe. Running stages are then either
    /// terminated and reaped, or left to the OS.
    ///
    /// Under `Terminate`, every running stage gets SIGTERM. Stages that have
    /// not exited once `grace` has elapsed get SIGKILL.
    pub async fn abort(
        &mut self,
        policy: AbortPolicy,
        grace: Duration,
        observer: &mut dyn FnMut(&PipelineEvent),
    ) {
        for stage in &mut self.stages {
            stage.release_endpoints();
        }

        let running: Vec<usize> = self
            .stages
            .iter()
            .filter(|s| s.is_running())
            .map(Stage::index)
            .collect();

        match policy {
            AbortPolicy::Orphan => {
                for index in running {
                    let stage = &self.stages[index];
                    let event = PipelineEvent::StageAbandoned {
                        index,
                        program: stage.program().to_string(),
                        pid: stage.pid(),
                    };
                    warn!(stage = index, pid = ?stage.pid(), "leaving stage running");
                    self.emit(observer, event);
                }
            }
            AbortPolicy::Terminate => {
                for &index in &running {
                    self.signal(index, Signal::SIGTERM);
                }

                // The grace period is shared by all stages, not per stage.
                let deadline = Instant::now() + grace;
                for index in running {
                    let waited = timeout_at(deadline, collector::wait(&mut self.stages[index])).await;
                    let result = match waited {
                        Ok(result) => result,
                        Err(_) => {
                            warn!(stage = index, ?grace, "stage ignored SIGTERM, killing");
                            self.signal(index, Signal::SIGKILL);
                            collector::wait(&mut self.stages[index]).await
                        }
                    };
                    let status = match result {
                        Ok(status) => Some(status),
                        Err(e) => {
                            warn!(stage = index, "{}", e);
                            None
                        }
                    };
                    let event = PipelineEvent::StageTerminated {
                        index,
                        program: self.stages[index].program().to_string(),
                        status,
                    };
                    self.emit(observer, event);
                }
            }
        }
    }

    fn signal(&self, index: usize, signal: Signal) {
        if let Some(pid) = self.stages[index].pid()
            && let Err(e) = kill(Pid::from_raw(pid as i32), signal)
        {
            warn!(stage = index, pid, "failed to send {}: {}", signal.as_str(), e);
        }
    }

    fn emit(&mut self, observer: &mut dyn FnMut(&PipelineEvent), event: PipelineEvent) {
        observer(&event);
        self.events.push(event);
    }
}

/// Runs pipelines from token lists according to a `PipelineConfig`.
#[derive(Debug, Clone, Default)]
pub struct PipelineRunner {
    config: PipelineConfig,
}

impl PipelineRunner {
    /// Create a new pipeline runner with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate the configuration and split `tokens` into stages.
    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<StageSpec>, PipelineError> {
        self.config.validate()?;
        Ok(parse_stages(
            tokens,
            &self.config.delimiter,
            self.config.max_stages,
        )?)
    }

    /// Parse `tokens` and run the resulting pipeline to completion.
    ///
    /// Returns `Err` only for structural failures. Individual stage failures,
    /// including programs that could not be executed, are in the report.
    #[tracing::instrument(level = "info", skip_all, fields(tokens = tokens.len()))]
    pub async fn run<S: AsRef<str>>(
        &self,
        tokens: &[S],
        observer: &mut dyn FnMut(&PipelineEvent),
    ) -> Result<PipelineReport, PipelineError> {
        let specs = self.parse(tokens)?;
        let pipeline = Pipeline::wire(specs)?;
        self.run_pipeline(pipeline, observer).await
    }

    /// Launch and wait on an already wired pipeline.
    pub async fn run_pipeline(
        &self,
        mut pipeline: Pipeline,
        observer: &mut dyn FnMut(&PipelineEvent),
    ) -> Result<PipelineReport, PipelineError> {
        if let Err(err) = pipeline.launch_all(observer) {
            debug!(error = %err, "launch failed, aborting pipeline");
            pipeline
                .abort(self.config.abort_policy, self.config.terminate_grace, observer)
                .await;
            return Err(err);
        }

        Ok(pipeline.wait_all(observer).await)
    }
}

/// A stage's endpoints can be replaced until it is launched or aborted.
fn ensure_unlaunched(stage: &Stage, released: bool) -> Result<(), PipelineError> {
    if !released && matches!(stage.handle(), ProcessHandle::NotLaunched) {
        Ok(())
    } else {
        Err(PipelineError::AlreadyLaunched {
            index: stage.index(),
        })
    }
}
