//! Draining the engine's merged console stream.
//!
//! A single blocking worker reads the pipe line by line and forwards each
//! line over an unbounded channel. The async side consumes the channel while
//! the process is awaited; the channel closing is the signal that every line
//! has been seen.

use std::io::{self, BufRead, BufReader, Read};

use tokio::sync::mpsc;

/// Receives engine console lines as they are produced.
pub trait DiagnosticSink: Send {
    fn write_line(&mut self, line: &str);
}

impl DiagnosticSink for Vec<String> {
    fn write_line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

impl DiagnosticSink for String {
    fn write_line(&mut self, line: &str) {
        self.push_str(line);
        self.push('\n');
    }
}

impl DiagnosticSink for mpsc::UnboundedSender<String> {
    fn write_line(&mut self, line: &str) {
        // A closed receiver only means nobody is listening any more.
        let _ = self.send(line.to_string());
    }
}

/// Re-emits every engine line as a `debug` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn write_line(&mut self, line: &str) {
        tracing::debug!(target: "deblib_jktebop::engine", line = %line, "Engine output");
    }
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// Every console line captured from one invocation, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticBuffer {
    lines: Vec<String>,
}

impl DiagnosticBuffer {
    pub fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The captured text with a newline after each line.
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

/// Whether a console line should raise a warning notification.
pub fn is_warning(line: &str) -> bool {
    line.to_lowercase().contains("warning")
}

// ---------------------------------------------------------------------------
// Worker and consumer
// ---------------------------------------------------------------------------

/// Read `reader` to end-of-stream, sending each line without its terminator.
///
/// Invalid UTF-8 is replaced rather than failing the drain. Returns the
/// number of lines read. Stops early if the receiver goes away. End-of-stream
/// only arrives once every process holding the write end has exited,
/// including anything the engine forked.
pub(crate) fn read_lines<R: Read>(reader: R, tx: mpsc::UnboundedSender<String>) -> io::Result<usize> {
    let mut reader = BufReader::new(reader);
    let mut raw = Vec::new();
    let mut count = 0;
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            return Ok(count);
        }
        while matches!(raw.last(), Some(b'\n' | b'\r')) {
            raw.pop();
        }
        count += 1;
        if tx.send(String::from_utf8_lossy(&raw).into_owned()).is_err() {
            return Ok(count);
        }
    }
}

/// Consume drained lines until the channel closes.
///
/// Each line is buffered, forwarded to `sink` and, when `warn_on_warning_text`
/// is set, checked for warning text. Returns the warning lines.
pub(crate) async fn collect(
    mut rx: mpsc::UnboundedReceiver<String>,
    buffer: &mut DiagnosticBuffer,
    mut sink: Option<&mut dyn DiagnosticSink>,
    warn_on_warning_text: bool,
) -> Vec<String> {
    let mut warnings = Vec::new();
    while let Some(line) = rx.recv().await {
        if let Some(sink) = sink.as_mut() {
            sink.write_line(&line);
        }
        if warn_on_warning_text && is_warning(&line) {
            tracing::warn!(line = %line, "JKTEBOP reported a warning");
            warnings.push(line.clone());
        }
        buffer.push(line);
    }
    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
