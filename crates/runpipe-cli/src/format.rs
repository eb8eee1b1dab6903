//! Human-readable rendering of pipeline events.
//!
//! Lines go to stderr, never into the data stream of the stages.

use runpipe_kernel::{signal_name, ExitStatus, PipelineEvent, PipelineReport};

/// Render one event as a progress line, or `None` for events that are only
/// interesting in the JSON report.
pub fn format_event(event: &PipelineEvent) -> Option<String> {
    let line = match event {
        PipelineEvent::StageStarting { index, program } => {
            format!("Starting program {index}:{program}")
        }
        PipelineEvent::StageLaunched { .. } => return None,
        PipelineEvent::StageExecFailed { index, program, error } => {
            format!("Program {index}:{program} failed to start: {error}")
        }
        PipelineEvent::StageWaiting { index, program } => {
            format!("Waiting for program {index}:{program}")
        }
        PipelineEvent::StageExited { index, program, status } => {
            format!("Program {index}:{program} {}", describe_status(status))
        }
        PipelineEvent::StageWaitFailed { index, program, error } => {
            format!("Program {index}:{program} could not be waited on: {error}")
        }
        PipelineEvent::StageTerminated { index, program, status } => match status {
            Some(status) => format!(
                "Program {index}:{program} terminated during abort, {}",
                describe_status(status)
            ),
            None => format!("Program {index}:{program} terminated during abort"),
        },
        PipelineEvent::StageAbandoned { index, program, pid } => match pid {
            Some(pid) => format!("Program {index}:{program} left running as pid {pid}"),
            None => format!("Program {index}:{program} left running"),
        },
    };
    Some(line)
}

/// "exited with 3", "killed by SIGKILL (signal 9)", ...
pub fn describe_status(status: &ExitStatus) -> String {
    match status {
        ExitStatus::Exited { code } => format!("exited with {code}"),
        ExitStatus::Signaled { signal, core_dumped } => {
            let name = signal_name(*signal).unwrap_or("unknown signal");
            let core = if *core_dumped { ", core dumped" } else { "" };
            format!("killed by {name} (signal {signal}{core})")
        }
        ExitStatus::Unknown => "ended with an unknown status".to_string(),
    }
}

/// Closing line once every stage has been waited on.
pub fn format_summary(report: &PipelineReport) -> String {
    let count = report.stages.len();
    let noun = if count == 1 { "stage" } else { "stages" };
    format!("runpipe: all {count} {noun} reaped")
}
