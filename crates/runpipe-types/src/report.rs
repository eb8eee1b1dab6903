//! PipelineReport — the per-stage outcome of a completed wait phase.

use serde::{Deserialize, Serialize};

use crate::event::PipelineEvent;
use crate::status::ExitStatus;

/// What the lifecycle collector learned about one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The stage terminated and was reaped.
    Exited { status: ExitStatus },
    /// The stage could not be waited on.
    WaitFailed { error: String },
}

/// Report for a single stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    /// Position in the pipeline, 0-based.
    pub index: usize,
    /// Executable name (first argument).
    pub program: String,
    /// OS process ID, if a process was spawned.
    pub pid: Option<u32>,
    pub outcome: StageOutcome,
}

impl StageReport {
    /// The termination status, if the stage was reaped.
    pub fn status(&self) -> Option<ExitStatus> {
        match &self.outcome {
            StageOutcome::Exited { status } => Some(*status),
            StageOutcome::WaitFailed { .. } => None,
        }
    }
}

/// Result of running a pipeline to completion.
///
/// Stage-level failures live here; they are reported, not escalated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// One entry per stage, in launch order.
    pub stages: Vec<StageReport>,
    /// Every event emitted, in emission order.
    pub events: Vec<PipelineEvent>,
}

impl PipelineReport {
    /// Exit codes per stage; `None` for signaled, unknown or unwaited stages.
    pub fn exit_codes(&self) -> Vec<Option<u8>> {
        self.stages
            .iter()
            .map(|s| s.status().and_then(|st| st.code()))
            .collect()
    }

    /// True if every stage exited with code 0.
    pub fn all_succeeded(&self) -> bool {
        self.stages
            .iter()
            .all(|s| s.status().is_some_and(|st| st.success()))
    }

    /// Status of the final stage, the one a shell would put in `$?`.
    pub fn last_status(&self) -> Option<ExitStatus> {
        self.stages.last().and_then(StageReport::status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(index: usize, outcome: StageOutcome) -> StageReport {
        StageReport {
            index,
            program: format!("p{}", index),
            pid: Some(100 + index as u32),
            outcome,
        }
    }

    #[test]
    fn exit_codes_skip_non_exits() {
        let report = PipelineReport {
            stages: vec![
                stage(0, StageOutcome::Exited { status: ExitStatus::Exited { code: 0 } }),
                stage(1, StageOutcome::Exited {
                    status: ExitStatus::Signaled { signal: 13, core_dumped: false },
                }),
                stage(2, StageOutcome::WaitFailed { error: "gone".into() }),
                stage(3, StageOutcome::Exited { status: ExitStatus::Exited { code: 2 } }),
            ],
            events: vec![],
        };

        assert_eq!(report.exit_codes(), vec![Some(0), None, None, Some(2)]);
        assert!(!report.all_succeeded());
        assert_eq!(report.last_status(), Some(ExitStatus::Exited { code: 2 }));
    }

    #[test]
    fn all_succeeded_when_every_stage_exits_zero() {
        let ok = StageOutcome::Exited { status: ExitStatus::Exited { code: 0 } };
        let report = PipelineReport {
            stages: vec![stage(0, ok.clone()), stage(1, ok)],
            events: vec![],
        };
        assert!(report.all_succeeded());
    }

    #[test]
    fn report_json_round_trip() {
        let report = PipelineReport {
            stages: vec![stage(0, StageOutcome::Exited { status: ExitStatus::Exited { code: 1 } })],
            events: vec![PipelineEvent::StageWaiting { index: 0, program: "p0".into() }],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""event":"stage_waiting""#));
        let back: PipelineReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
