//! Pipe graph builder.
//!
//! For N stages, creates N-1 pipes; pipe i's write end becomes stage i's
//! stdout and its read end stage i+1's stdin.

use std::os::fd::OwnedFd;

use nix::fcntl::OFlag;
use tracing::debug;

use crate::error::PipelineError;

use super::stage::{Endpoint, Stage};

/// One anonymous pipe. Both ends are close-on-exec, so a child only ever
/// keeps the ends that were explicitly installed as its stdin/stdout.
#[derive(Debug)]
pub struct Pipe {
    pub reader: OwnedFd,
    pub writer: OwnedFd,
}

impl Pipe {
    pub fn new() -> nix::Result<Self> {
        let (reader, writer) = nix::unistd::pipe2(OFlag::O_CLOEXEC)?;
        Ok(Self { reader, writer })
    }
}

/// Create the N-1 pipes for a pipeline of `stage_count` stages.
pub fn build_pipes(stage_count: usize) -> Result<Vec<Pipe>, PipelineError> {
    build_pipes_with(stage_count, Pipe::new)
}

/// Like [`build_pipes`], with a caller-provided pipe factory.
///
/// On failure every pipe created so far is dropped, closing both of its ends,
/// before the error is returned.
pub fn build_pipes_with<F>(stage_count: usize, mut make_pipe: F) -> Result<Vec<Pipe>, PipelineError>
where
    F: FnMut() -> nix::Result<Pipe>,
{
    let count = stage_count.saturating_sub(1);
    let mut pipes = Vec::with_capacity(count);

    for index in 0..count {
        let pipe = make_pipe().map_err(|source| PipelineError::PipeCreation { index, source })?;
        pipes.push(pipe);
    }

    debug!(pipes = pipes.len(), "created pipes");
    Ok(pipes)
}

/// Hand pipe ends to the stages they connect.
///
/// Pipe i joins stages i and i+1. Pipes beyond the last adjacent pair are
/// dropped, closing both ends.
pub(crate) fn connect(stages: &mut [Stage], pipes: Vec<Pipe>) {
    let mut pipes = pipes.into_iter();
    for index in 1..stages.len() {
        let Some(pipe) = pipes.next() else { break };
        let (left, right) = stages.split_at_mut(index);
        left[index - 1].stdout = Endpoint::Fd(pipe.writer);
        right[0].stdin = Endpoint::Fd(pipe.reader);
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Read;

    use super::*;
    use crate::scheduler::StageSpec;

    fn stage(index: usize) -> Stage {
        Stage::new(index, StageSpec::new(vec!["cat".to_string()]).unwrap())
    }

    #[test]
    fn creates_one_less_pipe_than_stages() {
        assert_eq!(build_pipes(1).unwrap().len(), 0);
        assert_eq!(build_pipes(2).unwrap().len(), 1);
        assert_eq!(build_pipes(5).unwrap().len(), 4);
        assert_eq!(build_pipes(0).unwrap().len(), 0);
    }

    #[test]
    fn connect_assigns_adjacent_ends() {
        let mut stages: Vec<Stage> = (0..3).map(stage).collect();
        connect(&mut stages, build_pipes(3).unwrap());

        assert!(matches!(stages[0].stdin(), Endpoint::Inherit));
        assert!(stages[0].stdout().is_fd());
        assert!(stages[1].stdin().is_fd());
        assert!(stages[1].stdout().is_fd());
        assert!(stages[2].stdin().is_fd());
        assert!(matches!(stages[2].stdout(), Endpoint::Inherit));
    }

    #[test]
    fn connect_closes_surplus_pipes() {
        let mut stages: Vec<Stage> = (0..2).map(stage).collect();
        let pipes = build_pipes(4).unwrap();
        let surplus: Vec<OwnedFd> = pipes[1..]
            .iter()
            .map(|p| p.reader.try_clone().expect("dup read end"))
            .collect();

        connect(&mut stages, pipes);

        assert!(stages[0].stdout().is_fd());
        assert!(stages[1].stdin().is_fd());
        assert_eq!(stages.iter().map(Stage::held_endpoints).sum::<usize>(), 2);
        for reader in surplus {
            let mut buf = [0u8; 1];
            let n = File::from(reader).read(&mut buf).expect("read surplus");
            assert_eq!(n, 0, "surplus write end left open");
        }
    }

    #[test]
    fn connect_tolerates_missing_pipes() {
        let mut stages: Vec<Stage> = (0..3).map(stage).collect();
        connect(&mut stages, build_pipes(2).unwrap());

        assert!(stages[0].stdout().is_fd());
        assert!(stages[1].stdin().is_fd());
        assert!(matches!(stages[1].stdout(), Endpoint::Inherit));
        assert!(matches!(stages[2].stdin(), Endpoint::Inherit));
    }

    #[test]
    fn partial_failure_closes_created_pipes() {
        // Keep a duplicate of every read end. Once all write ends are closed
        // each duplicate reads EOF instead of blocking.
        let mut read_ends = Vec::new();
        let mut made = 0;

        let result = build_pipes_with(5, || {
            if made == 2 {
                return Err(nix::Error::EMFILE);
            }
            made += 1;
            let pipe = Pipe::new()?;
            read_ends.push(pipe.reader.try_clone().expect("dup read end"));
            Ok(pipe)
        });

        assert!(matches!(
            result,
            Err(PipelineError::PipeCreation { index: 2, source: nix::Error::EMFILE })
        ));
        assert_eq!(read_ends.len(), 2);
        for reader in read_ends {
            let mut buf = [0u8; 1];
            let n = File::from(reader).read(&mut buf).expect("read dup");
            assert_eq!(n, 0, "write end leaked");
        }
    }
}
