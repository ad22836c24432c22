//! Background jobs: lines containing `&` run through the platform command
//! interpreter without blocking the REPL loop.
//!
//! There is no job table. A job is announced as `[<pid>]\t<line>` when it
//! starts and as `[<pid>]+\tDone` when its waiter thread sees it exit.

use crate::error::{Result, ShellError};
use crate::output::SharedOutput;
use std::io;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};

pub const BACKGROUND_MARKER: char = '&';

/// Whether `line` must be launched as a background job.
pub fn is_background(line: &str) -> bool {
    line.contains(BACKGROUND_MARKER)
}

/// The command string handed to the interpreter.
///
/// A single trailing `&` is dropped so the interpreter waits on the command
/// instead of backgrounding it a second time and exiting at once. `&&` is
/// left alone.
pub fn interpreter_command(line: &str) -> &str {
    let trimmed = line.trim_end();
    match trimmed.strip_suffix(BACKGROUND_MARKER) {
        Some(rest) if !rest.ends_with(BACKGROUND_MARKER) => rest.trim_end(),
        _ => trimmed,
    }
}

/// A started job. Dropping it detaches the waiter thread.
pub struct JobHandle {
    pub pid: u32,
    waiter: JoinHandle<()>,
}

impl JobHandle {
    /// Blocks until the completion notice has been written.
    pub fn join(self) {
        if self.waiter.join().is_err() {
            tracing::warn!(pid = self.pid, "background waiter panicked");
        }
    }
}

/// Starts background jobs and reports their completion on the shared output.
pub struct JobLauncher {
    interpreter: Vec<String>,
    output: SharedOutput,
}

impl JobLauncher {
    pub fn new(interpreter: Vec<String>, output: SharedOutput) -> Self {
        Self {
            interpreter,
            output,
        }
    }

    /// Spawns `line` through the interpreter and returns as soon as the
    /// process exists; a dedicated thread waits for it.
    pub fn launch(&self, line: &str) -> Result<JobHandle> {
        let Some((program, flags)) = self.interpreter.split_first() else {
            return Err(ShellError::Os {
                op: "background",
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "no command interpreter configured",
                ),
            });
        };

        let mut child = Command::new(program)
            .args(flags)
            .arg(interpreter_command(line))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(ShellError::os("background"))?;
        let pid = child.id();
        tracing::info!(pid, line, "background job started");

        let mut out = self.output.clone();
        announce(&mut out, &format!("[{pid}]\t{line}"));

        let waiter = thread::Builder::new()
            .name(format!("job-{pid}"))
            .spawn(move || {
                match child.wait() {
                    Ok(status) => tracing::info!(pid, %status, "background job finished"),
                    Err(source) => {
                        let err = ShellError::Os { op: "wait", source };
                        announce(&mut out, &err.to_string());
                    }
                }
                announce(&mut out, &format!("[{pid}]+\tDone"));
            })
            .map_err(ShellError::os("background"))?;

        Ok(JobHandle { pid, waiter })
    }
}

fn announce(out: &mut SharedOutput, line: &str) {
    if let Err(e) = out.write_line(line) {
        tracing::warn!(error = %e, "failed to write job notice");
    }
}
