use crate::error::{ArityError, Result};
use crate::lexer::Invocation;
use std::io::Write;

/// How many arguments a builtin accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

/// A command implemented inside the shell process.
///
/// The dispatcher checks [`BuiltinCommand::arity`] before calling
/// [`BuiltinCommand::execute`], so implementations may rely on the argument
/// count being valid.
pub trait BuiltinCommand {
    /// Name the command is invoked by, e.g. "echo" or "cd".
    fn name(&self) -> &'static str;

    fn arity(&self) -> Arity;

    /// Error reported when the argument count does not satisfy [`BuiltinCommand::arity`].
    fn arity_error(&self) -> ArityError;

    /// Runs the command, writing anything it prints to `stdout`.
    fn execute(&self, invocation: &Invocation, stdout: &mut dyn Write) -> Result<()>;
}
