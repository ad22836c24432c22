//! The shell's single output stream, shared between the foreground loop and
//! background job waiters.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Clonable writer over one mutex-guarded sink.
///
/// Every handle keeps its own pending buffer and only hands complete lines to
/// the sink, one lock acquisition per `write`. Lines from different handles can
/// therefore interleave, but never tear. [`Write::flush`] pushes out a partial
/// line, which is what the prompt needs.
pub struct SharedOutput {
    sink: Sink,
    pending: Vec<u8>,
}

impl SharedOutput {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(sink))),
            pending: Vec::new(),
        }
    }

    /// Output backed by memory; the returned [`Capture`] reads what was written.
    pub fn capture() -> (Self, Capture) {
        let capture = Capture::default();
        (Self::new(capture.clone()), capture)
    }

    /// Writes `line` plus a newline as one unit and flushes the sink.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let before = self.pending.len();
        self.pending.extend_from_slice(line.as_bytes());
        self.pending.push(b'\n');
        let len = self.pending.len();
        self.emit_or_discard(len, before)
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        // A panicking writer elsewhere must not silence the shell.
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&mut self, upto: usize) -> io::Result<()> {
        let mut sink = self.lock();
        sink.write_all(&self.pending[..upto])?;
        sink.flush()?;
        drop(sink);
        self.pending.drain(..upto);
        Ok(())
    }

    /// Emits up to `upto`. On failure the bytes past `keep` are dropped, so a
    /// caller that retries does not write them twice.
    fn emit_or_discard(&mut self, upto: usize, keep: usize) -> io::Result<()> {
        self.emit(upto).inspect_err(|_| self.pending.truncate(keep))
    }
}

impl Clone for SharedOutput {
    /// The clone shares the sink but starts with an empty pending buffer.
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            pending: Vec::new(),
        }
    }
}

impl Write for SharedOutput {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let before = self.pending.len();
        self.pending.extend_from_slice(data);
        if let Some(pos) = self.pending.iter().rposition(|&b| b == b'\n') {
            self.emit_or_discard(pos + 1, before)?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.emit(self.pending.len())
    }
}

impl Drop for SharedOutput {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "dropping unflushed output");
        }
    }
}

/// In-memory sink handle, mostly useful for tests.
#[derive(Clone, Default)]
pub struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    /// Everything written so far, decoded lossily.
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
