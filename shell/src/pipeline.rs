//! Pipe-delimited lines.
//!
//! Stages are not connected by OS pipes. Each non-final stage runs with its
//! output captured, and the next stage receives that output as one extra
//! trailing argument: `echo a | echo b` prints `b a`.

use crate::dispatch::Dispatcher;
use crate::lexer::Invocation;
use crate::output::SharedOutput;

pub const PIPE: char = '|';

/// Splits a line into its stages, left to right.
pub fn split_stages(line: &str) -> Vec<&str> {
    line.split(PIPE).collect()
}

/// Per-session pipeline bookkeeping.
///
/// `buffer` only ever holds bytes while `in_pipeline` is set, and it is
/// cleared at the start of every stage.
#[derive(Debug, Default)]
pub struct PipelineState {
    in_pipeline: bool,
    buffer: Vec<u8>,
}

impl PipelineState {
    pub fn in_pipeline(&self) -> bool {
        self.in_pipeline
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Runs every stage of `line`. Failures are reported on `output` and the
    /// remaining stages still run.
    pub fn run(&mut self, line: &str, dispatcher: &Dispatcher, output: &mut SharedOutput) {
        let stages = split_stages(line);
        if stages.len() == 1 {
            if let Some(invocation) = Invocation::parse(line) {
                dispatcher.run_reported(&invocation, None, output);
            }
            return;
        }

        let last = stages.len() - 1;
        for (index, stage) in stages.into_iter().enumerate() {
            let carried = self.start_stage(index, last);

            let Some(mut invocation) = Invocation::parse(stage) else {
                tracing::debug!(index, "skipping empty pipeline stage");
                continue;
            };
            if let Some(token) = carried.filter(|t| !t.is_empty()) {
                invocation.push_arg(token);
            }
            tracing::debug!(index, stage = %invocation.raw, "running pipeline stage");

            let capture = self.in_pipeline.then_some(&mut self.buffer);
            dispatcher.run_reported(&invocation, capture, output);
        }

        self.in_pipeline = false;
        self.buffer.clear();
    }

    /// Moves to stage `index` of `last + 1`. Takes the previous stage's output
    /// out of the buffer and sets `in_pipeline` for every stage but the last.
    fn start_stage(&mut self, index: usize, last: usize) -> Option<String> {
        let carried = (index > 0).then(|| carried_token(&self.buffer));
        self.buffer.clear();
        self.in_pipeline = index != last;
        carried
    }
}

/// The previous stage's output as a single argument, without trailing newlines.
fn carried_token(buffer: &[u8]) -> String {
    String::from_utf8_lossy(buffer)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(line: &str) -> (PipelineState, String) {
        let dispatcher = Dispatcher::default();
        let (mut output, cap) = SharedOutput::capture();
        let mut state = PipelineState::default();
        state.run(line, &dispatcher, &mut output);
        drop(output);
        (state, cap.contents())
    }

    #[test]
    fn split_keeps_empty_stages() {
        assert_eq!(split_stages("a|b"), vec!["a", "b"]);
        assert_eq!(split_stages("a || b"), vec!["a ", "", " b"]);
        assert_eq!(split_stages("plain"), vec!["plain"]);
    }

    #[test]
    fn single_stage_goes_straight_through() {
        let (state, out) = run("echo a b c");
        assert_eq!(out, "a b c\n");
        assert!(!state.in_pipeline());
    }

    #[test]
    fn previous_output_becomes_trailing_argument() {
        let (state, out) = run("echo a | echo b");
        assert_eq!(out, "b a\n");
        assert!(state.buffer().is_empty());
        assert!(!state.in_pipeline());
    }

    #[test]
    fn carried_output_is_a_single_token() {
        let (_, out) = run(r#"echo "x  y" | echo z"#);
        assert_eq!(out, "z x  y\n");
    }

    #[test]
    fn three_stages_chain() {
        let (state, out) = run("echo a | echo b | echo c");
        assert_eq!(out, "c b a\n");
        assert!(state.buffer().is_empty());
    }

    #[test]
    fn stage_errors_do_not_stop_the_pipeline() {
        let (state, out) = run("pwd extra | nope | echo after");
        assert_eq!(
            out,
            "pwd takes no arguments\nunknown command 'nope'\nafter\n"
        );
        assert!(state.buffer().is_empty());
    }

    #[test]
    fn only_non_final_stages_are_in_pipeline() {
        let mut state = PipelineState::default();

        assert_eq!(state.start_stage(0, 2), None);
        assert!(state.in_pipeline());
        state.buffer.extend_from_slice(b"first\n");

        assert_eq!(state.start_stage(1, 2).as_deref(), Some("first"));
        assert!(state.in_pipeline());
        assert!(state.buffer().is_empty());
        state.buffer.extend_from_slice(b"second\n");

        assert_eq!(state.start_stage(2, 2).as_deref(), Some("second"));
        assert!(!state.in_pipeline());
        assert!(state.buffer().is_empty());
    }

    #[test]
    fn kill_failures_reach_the_output_not_the_next_stage() {
        let (state, out) = run("kill abc | echo next");
        assert_eq!(out, "kill: invalid process id 'abc'\nnext\n");
        assert!(state.buffer().is_empty());
    }

    #[test]
    fn empty_stages_are_skipped() {
        let (_, out) = run("echo a | | echo b");
        assert_eq!(out, "b\n");
    }

    #[test]
    fn carried_token_drops_trailing_newlines_only() {
        assert_eq!(carried_token(b"  a  b\n\n"), "  a  b");
        assert_eq!(carried_token(b""), "");
    }
}
