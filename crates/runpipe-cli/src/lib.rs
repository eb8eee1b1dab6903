//! runpipe CLI: option parsing and event rendering.
//!
//! The binary in `main.rs` is a thin shell around this library so that option
//! handling and output formatting can be tested without spawning it.

pub mod format;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use runpipe_kernel::{AbortPolicy, PipelineConfig};

/// How the final report is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Progress lines while running plus a summary line.
    #[default]
    Text,
    /// The serialized `PipelineReport`, printed once the wait phase is done.
    Json,
}

/// Options for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub config: PipelineConfig,
    pub report: ReportFormat,
    pub quiet: bool,
    /// Stage tokens, delimiters included.
    pub tokens: Vec<String>,
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Help,
    Version,
    Run(RunOptions),
}

/// Parse the arguments after the program name.
///
/// Options are only recognized before the first stage token, so stage
/// arguments like `--help` reach the stage untouched.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<Invocation> {
    let mut config = PipelineConfig::default();
    let mut report = ReportFormat::default();
    let mut quiet = false;

    let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
    let mut rest = args.iter().copied().peekable();
    while let Some(&arg) = rest.peek() {
        match arg {
            "-h" | "--help" => return Ok(Invocation::Help),
            "-V" | "--version" => return Ok(Invocation::Version),
            "-q" | "--quiet" => quiet = true,
            _ => {
                if let Some(value) = arg.strip_prefix("--delimiter=") {
                    config.delimiter = value.to_string();
                } else if let Some(value) = arg.strip_prefix("--max-stages=") {
                    config.max_stages = value
                        .parse()
                        .with_context(|| format!("invalid --max-stages value: {value}"))?;
                } else if let Some(value) = arg.strip_prefix("--on-abort=") {
                    config.abort_policy = value.parse::<AbortPolicy>().map_err(anyhow::Error::msg)?;
                } else if let Some(value) = arg.strip_prefix("--term-grace-ms=") {
                    let millis: u64 = value
                        .parse()
                        .with_context(|| format!("invalid --term-grace-ms value: {value}"))?;
                    config.terminate_grace = Duration::from_millis(millis);
                } else if let Some(value) = arg.strip_prefix("--report=") {
                    report = match value {
                        "text" => ReportFormat::Text,
                        "json" => ReportFormat::Json,
                        other => bail!("unknown report format: {other} (expected text or json)"),
                    };
                } else {
                    break;
                }
            }
        }
        rest.next();
    }

    config.validate()?;

    Ok(Invocation::Run(RunOptions {
        config,
        report,
        quiet,
        tokens: rest.map(String::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn run_options(args: &[&str]) -> RunOptions {
        match parse_args(args).expect("should parse") {
            Invocation::Run(opts) => opts,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn plain_tokens_use_defaults() {
        let opts = run_options(&["echo", "hi", "--", "tr", "a-z", "A-Z"]);
        assert_eq!(opts.config, PipelineConfig::default());
        assert_eq!(opts.report, ReportFormat::Text);
        assert!(!opts.quiet);
        assert_eq!(opts.tokens, ["echo", "hi", "--", "tr", "a-z", "A-Z"]);
    }

    #[test]
    fn options_before_first_stage() {
        let opts = run_options(&[
            "--delimiter=|",
            "--max-stages=3",
            "--on-abort=orphan",
            "--term-grace-ms=500",
            "--report=json",
            "-q",
            "ls",
            "|",
            "wc",
        ]);
        assert_eq!(opts.config.delimiter, "|");
        assert_eq!(opts.config.max_stages, 3);
        assert_eq!(opts.config.abort_policy, AbortPolicy::Orphan);
        assert_eq!(opts.config.terminate_grace, Duration::from_millis(500));
        assert_eq!(opts.report, ReportFormat::Json);
        assert!(opts.quiet);
        assert_eq!(opts.tokens, ["ls", "|", "wc"]);
    }

    #[test]
    fn options_after_first_stage_belong_to_the_stage() {
        let opts = run_options(&["grep", "--help", "-q"]);
        assert!(!opts.quiet);
        assert_eq!(opts.tokens, ["grep", "--help", "-q"]);
    }

    #[test]
    fn bare_delimiter_is_a_token() {
        let opts = run_options(&["--", "echo"]);
        assert_eq!(opts.tokens, ["--", "echo"]);
    }

    #[rstest]
    #[case::help_short(&["-h"], Invocation::Help)]
    #[case::help_long(&["--help", "echo"], Invocation::Help)]
    #[case::version_short(&["-V"], Invocation::Version)]
    #[case::version_after_option(&["-q", "--version"], Invocation::Version)]
    fn info_flags(#[case] args: &[&str], #[case] expected: Invocation) {
        assert_eq!(parse_args(args).unwrap(), expected);
    }

    #[rstest]
    #[case::bad_max(&["--max-stages=many", "true"])]
    #[case::zero_max(&["--max-stages=0", "true"])]
    #[case::empty_delimiter(&["--delimiter=", "true"])]
    #[case::bad_policy(&["--on-abort=explode", "true"])]
    #[case::bad_grace(&["--term-grace-ms=-1", "true"])]
    #[case::bad_report(&["--report=yaml", "true"])]
    fn invalid_options(#[case] args: &[&str]) {
        assert!(parse_args(args).is_err());
    }
}
