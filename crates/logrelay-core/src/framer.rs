//! Line framing over a chunked byte stream

use std::fmt;

const NEWLINE: u8 = b'\n';

/// One line of child output, without its newline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    text: String,
    terminated: bool,
}

impl Line {
    /// A line that was ended by a newline in the stream
    pub fn terminated(bytes: &[u8]) -> Self {
        Self {
            text: String::from_utf8_lossy(bytes).into_owned(),
            terminated: true,
        }
    }

    /// The unterminated remainder left when the stream closed
    pub fn partial(bytes: &[u8]) -> Self {
        Self {
            text: String::from_utf8_lossy(bytes).into_owned(),
            terminated: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Splits an incoming byte stream into lines.
///
/// Bytes after the last newline are held back until a later chunk completes
/// them or the stream closes.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every line it completes, in stream order.
    ///
    /// With `stream_closed` set, a non-empty remainder is returned as a final
    /// partial line and the framer is left empty.
    pub fn feed(&mut self, chunk: &[u8], stream_closed: bool) -> Vec<Line> {
        // Everything already buffered is newline-free, so only scan the new bytes
        let scan_from = self.buffer.len();
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        for (offset, &byte) in self.buffer[scan_from..].iter().enumerate() {
            if byte == NEWLINE {
                let end = scan_from + offset;
                lines.push(Line::terminated(&self.buffer[start..end]));
                start = end + 1;
            }
        }
        self.buffer.drain(..start);

        if stream_closed && let Some(line) = self.finish() {
            lines.push(line);
        }

        lines
    }

    /// Take whatever is buffered as a final partial line
    pub fn finish(&mut self) -> Option<Line> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = Line::partial(&self.buffer);
        self.buffer.clear();
        Some(line)
    }

    /// Number of bytes held back waiting for a newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
