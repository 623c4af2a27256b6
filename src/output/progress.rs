//! Relay of git's progress stream.

use std::io::{self, Read, Write};

/// Upper bound of retained stream text; error lines come last, so the tail is kept.
const CAPTURE_LIMIT: usize = 64 * 1024;

/// Forwards a child process' progress stream to a sink as it arrives and
/// keeps the tail of it for error reporting.
///
/// git redraws progress lines in place with `\r`, so bytes are forwarded
/// unchanged and flushed per read.
pub struct ProgressRelay<W: Write> {
    /// Where progress is echoed; `None` when progress is suppressed
    sink: Option<W>,
    /// Tail of everything read so far
    captured: Vec<u8>,
}

impl ProgressRelay<io::Stdout> {
    /// Relay to standard output, or capture only when `echo` is false.
    #[must_use]
    pub fn stdout(echo: bool) -> Self {
        Self::new(echo.then(io::stdout))
    }
}

impl<W: Write> ProgressRelay<W> {
    /// Creates a relay writing to `sink`.
    #[must_use]
    pub const fn new(sink: Option<W>) -> Self {
        Self {
            sink,
            captured: Vec::new(),
        }
    }

    /// Copies `reader` until end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the stream or writing the sink fails.
    pub fn pump(&mut self, mut reader: impl Read) -> io::Result<()> {
        let mut buf = [0u8; 8192];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if let Some(sink) = self.sink.as_mut() {
                sink.write_all(&buf[..n])?;
                sink.flush()?;
            }

            self.captured.extend_from_slice(&buf[..n]);
            if self.captured.len() > CAPTURE_LIMIT {
                let excess = self.captured.len() - CAPTURE_LIMIT;
                self.captured.drain(..excess);
            }
        }
        Ok(())
    }

    /// The captured stream text.
    #[must_use]
    pub fn captured(&self) -> String {
        String::from_utf8_lossy(&self.captured).into_owned()
    }

    /// Returns the sink, if any.
    #[cfg(test)]
    pub fn into_sink(self) -> Option<W> {
        self.sink
    }
}
