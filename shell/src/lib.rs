//! A small interactive command shell.
//!
//! Lines are read from a [`LineSource`] and handled by a [`Session`]: lines
//! holding `&` start background jobs through the platform command interpreter,
//! everything else is split on `|` and each stage is routed to one of the
//! builtins `cd`, `pwd`, `echo`, `kill`, `ps` and `exec`.
//!
//! This is not a POSIX shell. There is no globbing, no variable expansion and
//! no real piping: a pipeline stage receives the previous stage's output as
//! one extra argument. See [`pipeline`] for details.

pub mod builtin;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod jobs;
pub mod lexer;
pub mod output;
pub mod pipeline;
pub mod procs;
mod session;

pub use config::ShellConfig;
pub use dispatch::{Dispatched, Dispatcher};
pub use error::{ArityError, ShellError};
pub use input::{EditorSource, LineSource, ReaderSource};
pub use output::{Capture, SharedOutput};
pub use session::{Exit, Session};
