//! Pipeline configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// Token that separates stages when none is configured.
pub const DEFAULT_DELIMITER: &str = "--";

/// Stage limit when none is configured.
pub const DEFAULT_MAX_STAGES: usize = 10;

/// How long a terminated stage gets to exit before it is sent SIGKILL.
pub const DEFAULT_TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// What to do with stages that are already running when a later stage fails
/// to launch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AbortPolicy {
    /// Send SIGTERM to every launched stage and reap it before returning.
    /// Stages still alive after the grace period are sent SIGKILL.
    #[default]
    Terminate,
    /// Leave launched stages running; the OS reparents them when we exit.
    Orphan,
}

impl std::str::FromStr for AbortPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terminate" => Ok(AbortPolicy::Terminate),
            "orphan" => Ok(AbortPolicy::Orphan),
            other => Err(format!("unknown abort policy: {other} (expected terminate or orphan)")),
        }
    }
}

/// Configuration for parsing and running a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Token separating stage argument groups.
    pub delimiter: String,

    /// Maximum number of stages accepted by the parser.
    ///
    /// A validation rule only; storage is a `Vec` and grows as needed.
    pub max_stages: usize,

    /// Cleanup applied to launched stages when the pipeline aborts.
    pub abort_policy: AbortPolicy,

    /// Time between SIGTERM and SIGKILL under [`AbortPolicy::Terminate`].
    pub terminate_grace: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            max_stages: DEFAULT_MAX_STAGES,
            abort_policy: AbortPolicy::default(),
            terminate_grace: DEFAULT_TERMINATE_GRACE,
        }
    }
}

impl PipelineConfig {
    /// Set the stage delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the maximum stage count.
    pub fn with_max_stages(mut self, max_stages: usize) -> Self {
        self.max_stages = max_stages;
        self
    }

    /// Set the abort policy.
    pub fn with_abort_policy(mut self, policy: AbortPolicy) -> Self {
        self.abort_policy = policy;
        self
    }

    /// Set the SIGTERM grace period.
    pub fn with_terminate_grace(mut self, grace: Duration) -> Self {
        self.terminate_grace = grace;
        self
    }

    /// Reject configurations under which no pipeline could ever parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }
        if self.max_stages == 0 {
            return Err(ConfigError::ZeroMaxStages);
        }
        Ok(())
    }
}
