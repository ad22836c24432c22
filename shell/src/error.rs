//! Error types shared by the dispatcher, the builtins and the REPL loop.

use std::io;
use std::process::ExitStatus;

/// Argument-count violations detected before a builtin body runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArityError {
    #[error("cd requires exactly 1 argument")]
    Cd,
    #[error("pwd takes no arguments")]
    Pwd,
    #[error("echo requires 1+ arguments")]
    Echo,
    #[error("kill requires 1+ arguments")]
    Kill,
    #[error("exec requires 1+ arguments")]
    Exec,
    #[error("ps takes no arguments")]
    Ps,
}

/// Everything a command, a background launch or the input stream can report.
///
/// Apart from [`ShellError::Read`], none of these ends the session: they are
/// printed on the output stream and the loop carries on.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Arity(#[from] ArityError),

    /// A failed OS call, tagged with the operation that issued it.
    #[error("{op}: {source}")]
    Os {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("kill: invalid process id '{0}'")]
    InvalidPid(String),

    #[error("kill: {pid}: {reason}")]
    Signal { pid: i32, reason: String },

    #[error("exec: failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("exec: '{program}' {status}")]
    ExitStatus { program: String, status: ExitStatus },

    /// Per-target failures of a best-effort command such as `kill`. The
    /// command itself still counts as having run.
    #[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n"))]
    TargetFailures(Vec<ShellError>),

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    /// The input stream failed. This is the only fatal error.
    #[error("failed to read input: {0}")]
    Read(String),
}

impl ShellError {
    /// Wraps an `io::Error` with the name of the operation that failed.
    pub fn os(op: &'static str) -> impl FnOnce(io::Error) -> ShellError {
        move |source| ShellError::Os { op, source }
    }
}

pub type Result<T, E = ShellError> = std::result::Result<T, E>;
