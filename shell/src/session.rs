use crate::config::ShellConfig;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::input::LineSource;
use crate::jobs::{self, JobHandle, JobLauncher};
use crate::output::SharedOutput;
use crate::pipeline::PipelineState;
use std::io::Write;

/// Why [`Session::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The quit token was entered.
    Quit,
    /// The input stream ran out.
    EndOfInput,
}

/// One interactive shell: the output stream, the builtins, the background
/// launcher and the pipeline state, alive for the whole REPL loop.
///
/// Example
/// ```
/// use std::io::Cursor;
/// use tinysh::{ReaderSource, Session, SharedOutput, ShellConfig};
///
/// let (output, captured) = SharedOutput::capture();
/// let mut sh = Session::new(ShellConfig::default(), output);
/// let mut input = ReaderSource::new(Cursor::new("echo a | echo b\n\\quit\n"));
/// sh.run(&mut input).unwrap();
/// assert_eq!(captured.contents(), "$ b a\n$ ");
/// ```
pub struct Session {
    config: ShellConfig,
    output: SharedOutput,
    dispatcher: Dispatcher,
    jobs: JobLauncher,
    pipeline: PipelineState,
}

impl Session {
    /// A session with the default builtins.
    pub fn new(config: ShellConfig, output: SharedOutput) -> Self {
        Self::with_dispatcher(config, output, Dispatcher::default())
    }

    /// A session that routes commands through `dispatcher` instead of the
    /// default builtins.
    pub fn with_dispatcher(
        config: ShellConfig,
        output: SharedOutput,
        dispatcher: Dispatcher,
    ) -> Self {
        let jobs = JobLauncher::new(config.interpreter.clone(), output.clone());
        Self {
            config,
            output,
            dispatcher,
            jobs,
            pipeline: PipelineState::default(),
        }
    }

    pub fn pipeline(&self) -> &PipelineState {
        &self.pipeline
    }

    /// Reads and executes lines until the quit token or the end of input.
    ///
    /// Only a failing input stream produces an error; everything a command
    /// reports has already been printed by the time the next prompt appears.
    pub fn run(&mut self, source: &mut dyn LineSource) -> Result<Exit> {
        loop {
            let Some(line) = source.read_line(&self.config.prompt, &mut self.output)? else {
                tracing::debug!("end of input");
                return Ok(Exit::EndOfInput);
            };
            if line == self.config.quit_token {
                tracing::debug!("quit token received");
                return Ok(Exit::Quit);
            }
            // Background jobs are never waited on from here.
            let _ = self.handle_line(&line);
        }
    }

    /// Executes one line: as a background job if it holds the marker,
    /// otherwise through the pipeline splitter and the dispatcher.
    ///
    /// Returns the handle of a started background job.
    pub fn handle_line(&mut self, line: &str) -> Option<JobHandle> {
        let line = line.trim();
        let job = if jobs::is_background(line) {
            match self.jobs.launch(line) {
                Ok(job) => Some(job),
                Err(err) => {
                    self.report(&err.to_string());
                    None
                }
            }
        } else {
            self.pipeline.run(line, &self.dispatcher, &mut self.output);
            None
        };
        if let Err(e) = self.output.flush() {
            tracing::warn!(error = %e, "failed to flush output");
        }
        job
    }

    fn report(&mut self, message: &str) {
        if let Err(e) = self.output.write_line(message) {
            tracing::warn!(error = %e, "failed to write to output");
        }
    }
}
