//! Where the REPL loop gets its lines from.

use crate::error::{Result, ShellError};
use crate::output::SharedOutput;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};

/// A source of input lines.
pub trait LineSource {
    /// Shows `prompt` and reads one line without its terminator.
    ///
    /// `Ok(None)` means the input is exhausted.
    fn read_line(&mut self, prompt: &str, output: &mut SharedOutput) -> Result<Option<String>>;
}

/// Reads from any buffered reader: a pipe, a file, or a test fixture.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self, prompt: &str, output: &mut SharedOutput) -> Result<Option<String>> {
        write!(output, "{prompt}").map_err(ShellError::os("prompt"))?;
        output.flush().map_err(ShellError::os("prompt"))?;

        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .map_err(|e| ShellError::Read(e.to_string()))?;
        if n == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

/// Interactive terminal input with line editing and history.
pub struct EditorSource {
    editor: DefaultEditor,
}

impl EditorSource {
    pub fn new() -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str, output: &mut SharedOutput) -> Result<Option<String>> {
        // Anything still pending must reach the terminal before the editor draws.
        output.flush().map_err(ShellError::os("prompt"))?;
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        tracing::warn!(error = %e, "failed to record history");
                    }
                }
                Ok(Some(line))
            }
            // Ctrl-C abandons the current line only.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(ShellError::Read(err.to_string())),
        }
    }
}
