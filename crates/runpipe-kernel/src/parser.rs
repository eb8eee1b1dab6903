//! Stage parser: flat token list → ordered stage argument vectors.
//!
//! `echo hi -- tr a-z A-Z` becomes `[["echo", "hi"], ["tr", "a-z", "A-Z"]]`.
//! Performs no I/O; every error here is raised before any process exists.

use crate::error::ParseError;
use crate::scheduler::StageSpec;

/// Split `tokens` into stages at every `delimiter` token.
///
/// Fails if there are no tokens, if any stage is empty, if the list ends with
/// the delimiter, or if more than `max_stages` stages are described.
pub fn parse_stages<S: AsRef<str>>(
    tokens: &[S],
    delimiter: &str,
    max_stages: usize,
) -> Result<Vec<StageSpec>, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::NoStages {
            delimiter: delimiter.to_string(),
        });
    }

    let mut stages: Vec<StageSpec> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for token in tokens {
        let token = token.as_ref();
        if token != delimiter {
            current.push(token.to_string());
            continue;
        }

        if current.is_empty() {
            return Err(ParseError::EmptyStage {
                position: stages.len(),
            });
        }
        push_stage(&mut stages, std::mem::take(&mut current), max_stages)?;
    }

    // Tokens were non-empty, so an empty tail means the last token was the delimiter.
    if current.is_empty() {
        return Err(ParseError::TrailingDelimiter {
            delimiter: delimiter.to_string(),
        });
    }
    push_stage(&mut stages, current, max_stages)?;

    Ok(stages)
}

fn push_stage(
    stages: &mut Vec<StageSpec>,
    argv: Vec<String>,
    max_stages: usize,
) -> Result<(), ParseError> {
    if stages.len() >= max_stages {
        return Err(ParseError::TooManyStages { max: max_stages });
    }
    // argv is non-empty on every path that reaches here
    if let Some(spec) = StageSpec::new(argv) {
        stages.push(spec);
    }
    Ok(())
}
