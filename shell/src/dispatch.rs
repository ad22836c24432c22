use crate::builtin;
use crate::command::BuiltinCommand;
use crate::error::{Result, ShellError};
use crate::lexer::Invocation;
use crate::output::SharedOutput;
use std::collections::BTreeMap;
use std::io::Write;

/// What the dispatcher did with a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// The line had no tokens.
    Empty,
    /// A builtin ran to completion.
    Builtin(&'static str),
    /// A best-effort builtin ran, but some of its targets failed. Each entry
    /// is one failure message.
    Partial {
        name: &'static str,
        failures: Vec<String>,
    },
    /// No builtin has this name. Not an error; callers print a notice.
    Unknown(String),
}

/// Routes invocations to builtins by name.
pub struct Dispatcher {
    builtins: BTreeMap<&'static str, Box<dyn BuiltinCommand>>,
}

impl Dispatcher {
    pub fn new(builtins: Vec<Box<dyn BuiltinCommand>>) -> Self {
        Self {
            builtins: builtins.into_iter().map(|b| (b.name(), b)).collect(),
        }
    }

    /// Names of every registered builtin, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builtins.keys().copied()
    }

    /// Tokenizes `line` and dispatches it.
    pub fn dispatch_line(&self, line: &str, stdout: &mut dyn Write) -> Result<Dispatched> {
        match Invocation::parse(line) {
            Some(invocation) => self.dispatch(&invocation, stdout),
            None => Ok(Dispatched::Empty),
        }
    }

    /// Validates the argument count and runs the builtin named by `invocation`.
    pub fn dispatch(&self, invocation: &Invocation, stdout: &mut dyn Write) -> Result<Dispatched> {
        let Some(builtin) = self.builtins.get(invocation.name.as_str()) else {
            return Ok(Dispatched::Unknown(invocation.name.clone()));
        };
        if !builtin.arity().accepts(invocation.args.len()) {
            return Err(ShellError::Arity(builtin.arity_error()));
        }
        tracing::debug!(command = builtin.name(), args = ?invocation.args, "dispatching builtin");
        match builtin.execute(invocation, stdout) {
            Ok(()) => Ok(Dispatched::Builtin(builtin.name())),
            Err(ShellError::TargetFailures(failures)) => Ok(Dispatched::Partial {
                name: builtin.name(),
                failures: failures.iter().map(ToString::to_string).collect(),
            }),
            Err(err) => Err(err),
        }
    }

    /// Dispatches `invocation` and shows any problem to the user.
    ///
    /// The command writes into `capture` when given, otherwise into `output`.
    /// Errors, per-target failures and unknown-command notices always go to
    /// `output`, and nothing is returned beyond whether the command succeeded.
    pub fn run_reported(
        &self,
        invocation: &Invocation,
        capture: Option<&mut Vec<u8>>,
        output: &mut SharedOutput,
    ) -> bool {
        let result = match capture {
            Some(buf) => self.dispatch(invocation, buf),
            None => self.dispatch(invocation, output),
        };
        let (succeeded, notices) = match result {
            Ok(Dispatched::Unknown(name)) => (false, vec![unknown_command_notice(&name)]),
            Ok(Dispatched::Partial { failures, .. }) => (true, failures),
            Ok(_) => return true,
            Err(err) => {
                tracing::debug!(command = %invocation.name, error = %err, "command failed");
                (false, vec![err.to_string()])
            }
        };
        for notice in &notices {
            if let Err(e) = output.write_line(notice) {
                tracing::warn!(error = %e, "failed to report command outcome");
            }
        }
        succeeded
    }
}

impl Default for Dispatcher {
    /// A dispatcher with `cd`, `pwd`, `echo`, `kill`, `ps` and `exec`.
    fn default() -> Self {
        Self::new(builtin::registry())
    }
}

/// Text of the notice printed for an unrecognised command name.
pub fn unknown_command_notice(name: &str) -> String {
    format!("unknown command '{name}'")
}
