//! End-to-end tests for the runpipe binary.

use std::process::{Command, Output};

fn runpipe(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_runpipe"))
        .args(args)
        .output()
        .expect("failed to run runpipe")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn pipes_stage_output_to_next_stage() {
    let output = runpipe(&["echo", "hi", "--", "tr", "a-z", "A-Z"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "HI\n");

    let err = stderr(&output);
    assert!(err.contains("Starting program 0:echo"), "{err}");
    assert!(err.contains("Waiting for program 1:tr"), "{err}");
    assert!(err.contains("Program 0:echo exited with 0"), "{err}");
    assert!(err.contains("Program 1:tr exited with 0"), "{err}");
    assert!(err.contains("runpipe: all 2 stages reaped"), "{err}");
}

#[test]
fn stage_failure_does_not_fail_the_tool() {
    let output = runpipe(&["false"]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("Program 0:false exited with 1"));
}

#[test]
fn missing_program_is_reported_not_fatal() {
    let output = runpipe(&["definitely_not_a_real_command_12345", "--", "cat"]);
    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("failed to start"), "{err}");
    assert!(err.contains("Program 0:definitely_not_a_real_command_12345 exited with 127"), "{err}");
}

#[test]
fn empty_stage_is_a_usage_error() {
    let output = runpipe(&["echo", "--", "--", "cat"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Error: stage 1 is empty"), "{err}");
    assert!(!err.contains("Starting program"), "nothing should be spawned: {err}");
}

#[test]
fn structural_error_is_reported_once() {
    let output = Command::new(env!("CARGO_BIN_EXE_runpipe"))
        .args(["echo", "--", "--", "cat"])
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run runpipe");
    assert!(!output.status.success());
    let err = stderr(&output);
    assert_eq!(err.lines().count(), 1, "{err}");
    assert!(err.starts_with("Error: "), "{err}");
    assert!(!err.contains("ERROR"), "no log line should repeat the error: {err}");
}

#[test]
fn trailing_delimiter_is_a_usage_error() {
    let output = runpipe(&["echo", "hi", "--"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("trailing"));
}

#[test]
fn no_arguments_is_a_usage_error() {
    let output = runpipe(&[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("at least one program"));
}

#[test]
fn too_many_stages_is_rejected() {
    let output = runpipe(&["--max-stages=2", "true", "--", "true", "--", "true"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("too many stages"));
}

#[test]
fn quiet_keeps_stderr_clean() {
    let output = runpipe(&["-q", "echo", "quiet"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "quiet\n");
    assert_eq!(stderr(&output), "");
}

#[test]
fn json_report_describes_every_stage() {
    let output = runpipe(&["--report=json", "--delimiter=|", "sh", "-c", "exit 3", "|", "cat"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report: serde_json::Value = serde_json::from_str(&stderr(&output)).expect("json report");
    let stages = report["stages"].as_array().expect("stages array");
    assert_eq!(stages.len(), 2);
    assert_eq!(stages[0]["program"], "sh");
    assert_eq!(stages[0]["outcome"]["status"]["kind"], "exited");
    assert_eq!(stages[0]["outcome"]["status"]["code"], 3);
    assert_eq!(stages[1]["outcome"]["status"]["code"], 0);
}

#[test]
fn help_and_version() {
    let help = runpipe(&["--help"]);
    assert!(help.status.success());
    assert!(stdout(&help).contains("Usage:"));

    let version = runpipe(&["-V"]);
    assert!(version.status.success());
    assert!(stdout(&version).starts_with("runpipe "));
}
