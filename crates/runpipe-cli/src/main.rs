//! runpipe CLI entry point.
//!
//! Usage:
//!   runpipe cmd1 [args] -- cmd2 [args] -- ...   # Run cmd1 | cmd2 | ...
//!   runpipe --report=json cmd1 -- cmd2         # Print a JSON report to stderr

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use runpipe_cli::format::{format_event, format_summary};
use runpipe_cli::{parse_args, Invocation, ReportFormat, RunOptions};
use runpipe_kernel::PipelineRunner;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var). Stdout belongs to the
    // last stage, so diagnostics go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();

    match parse_args(&args)? {
        Invocation::Help => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
        Invocation::Version => {
            println!("runpipe {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        Invocation::Run(opts) => run_pipeline(opts),
    }
}

fn print_help() {
    println!(r#"runpipe v{}

Run programs connected by pipes, like `cmd1 | cmd2 | ...` in a shell.

Usage:
  runpipe [OPTIONS] <cmd> [args...] [-- <cmd> [args...]]...

Options (only before the first program):
  --delimiter=<tok>            Stage separator (default: --)
  --max-stages=<n>             Maximum number of stages (default: 10)
  --on-abort=<policy>          terminate | orphan: what to do with running
                               stages if a later one cannot be started
                               (default: terminate)
  --term-grace-ms=<n>          Milliseconds between SIGTERM and SIGKILL when
                               terminating (default: 2000)
  --report=<format>            text | json (default: text)
  -q, --quiet                  No progress lines
  -h, --help                   Show this help
  -V, --version                Show version

Progress and reports are written to stderr. The exit code is 0 once every
stage has been waited on, whatever the stages returned.

Examples:
  runpipe echo hi -- tr a-z A-Z
  runpipe --delimiter='|' cat /etc/passwd '|' cut -d: -f1 '|' sort
"#, env!("CARGO_PKG_VERSION"));
}

/// Run the pipeline on a single-threaded runtime and report.
fn run_pipeline(opts: RunOptions) -> Result<ExitCode> {
    let show_progress = opts.report == ReportFormat::Text && !opts.quiet;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create runtime")?;

    let runner = PipelineRunner::new(opts.config);
    let report = rt.block_on(runner.run(opts.tokens.as_slice(), &mut |event| {
        if show_progress && let Some(line) = format_event(event) {
            eprintln!("{line}");
        }
    }))?;

    match opts.report {
        ReportFormat::Text => {
            if !opts.quiet {
                eprintln!("{}", format_summary(&report));
            }
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            eprintln!("{json}");
        }
    }

    tracing::debug!(codes = ?report.exit_codes(), "pipeline complete");
    Ok(ExitCode::SUCCESS)
}
