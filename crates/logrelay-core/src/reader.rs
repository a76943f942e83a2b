//! Async reader for the child's merged output pipe

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{trace, warn};

use crate::{Line, LineFramer};

/// Bytes requested per read
pub const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Result of one read from the pipe
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Data arrived; these lines were completed by it (possibly none)
    Lines(Vec<Line>),
    /// End of stream; the lines include the final partial line, if any
    Closed(Vec<Line>),
}

impl ReadOutcome {
    pub fn lines(&self) -> &[Line] {
        match self {
            ReadOutcome::Lines(lines) | ReadOutcome::Closed(lines) => lines,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ReadOutcome::Closed(_))
    }
}

/// Reads the child's output and frames it into lines.
///
/// The framer's buffer belongs to the reader alone. Each call to
/// [`PipeReader::read_lines`] issues one read and is cancel safe: bytes are
/// only taken from the source when the read completes, and are framed in
/// the same poll.
pub struct PipeReader<R> {
    source: R,
    framer: LineFramer,
    chunk: Box<[u8]>,
    closed: bool,
    bytes_read: u64,
}

impl<R: AsyncRead + Unpin> PipeReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            framer: LineFramer::new(),
            chunk: vec![0; READ_CHUNK_SIZE].into_boxed_slice(),
            closed: false,
            bytes_read: 0,
        }
    }

    /// Wait for the next chunk and return the lines it completes.
    ///
    /// Read errors other than `Interrupted` are treated as end of stream.
    /// Once closed, every further call returns `Closed` with no lines.
    pub async fn read_lines(&mut self) -> ReadOutcome {
        if self.closed {
            return ReadOutcome::Closed(Vec::new());
        }

        let n = match self.source.read(&mut self.chunk).await {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                return ReadOutcome::Lines(Vec::new());
            }
            Err(e) => {
                warn!(error = %e, "Pipe read failed, treating as end of stream");
                0
            }
        };

        trace!(bytes = n, pending = self.framer.pending(), "Pipe read completed");

        if n == 0 {
            self.closed = true;
            ReadOutcome::Closed(self.framer.feed(&[], true))
        } else {
            self.bytes_read += n as u64;
            ReadOutcome::Lines(self.framer.feed(&self.chunk[..n], false))
        }
    }

    /// Take the buffered partial line without waiting for end of stream
    pub fn flush(&mut self) -> Option<Line> {
        self.framer.finish()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Total bytes taken from the source so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    async fn collect<R: AsyncRead + Unpin>(reader: &mut PipeReader<R>) -> Vec<Line> {
        let mut lines = Vec::new();
        loop {
            let outcome = reader.read_lines().await;
            let closed = outcome.is_closed();
            lines.extend_from_slice(outcome.lines());
            if closed {
                return lines;
            }
        }
    }

    #[tokio::test]
    async fn reads_until_end_of_stream() {
        let mut reader = PipeReader::new(&b"alpha\nbeta\ngamma"[..]);
        let lines = collect(&mut reader).await;

        let texts: Vec<&str> = lines.iter().map(Line::text).collect();
        assert_eq!(texts, vec!["alpha", "beta", "gamma"]);
        assert!(!lines[2].is_terminated());
        assert!(reader.is_closed());
    }

    #[tokio::test]
    async fn closed_reader_stays_closed() {
        let mut reader = PipeReader::new(&b""[..]);
        assert_eq!(reader.read_lines().await, ReadOutcome::Closed(Vec::new()));
        assert_eq!(reader.read_lines().await, ReadOutcome::Closed(Vec::new()));
    }

    #[tokio::test]
    async fn lines_arrive_as_writer_produces_them() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = PipeReader::new(rx);

        tx.write_all(b"abc\n").await.unwrap();
        let outcome = reader.read_lines().await;
        assert_eq!(outcome, ReadOutcome::Lines(vec![Line::terminated(b"abc")]));

        tx.write_all(b"def").await.unwrap();
        assert_eq!(reader.read_lines().await, ReadOutcome::Lines(Vec::new()));

        tx.write_all(b"\nghi").await.unwrap();
        drop(tx);

        let rest = collect(&mut reader).await;
        assert_eq!(rest, vec![Line::terminated(b"def"), Line::partial(b"ghi")]);
    }

    #[tokio::test]
    async fn flush_takes_partial_line_while_open() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = PipeReader::new(rx);

        tx.write_all(b"no newline yet").await.unwrap();
        assert_eq!(reader.read_lines().await, ReadOutcome::Lines(Vec::new()));

        assert_eq!(reader.flush(), Some(Line::partial(b"no newline yet")));
        assert_eq!(reader.flush(), None);
        assert!(!reader.is_closed());
    }

    #[tokio::test]
    async fn large_output_is_not_truncated() {
        let mut input = Vec::new();
        for i in 0..5000 {
            input.extend_from_slice(format!("line {}\n", i).as_bytes());
        }
        assert!(input.len() > READ_CHUNK_SIZE);

        let mut reader = PipeReader::new(&input[..]);
        let lines = collect(&mut reader).await;

        assert_eq!(lines.len(), 5000);
        assert_eq!(lines[4999].text(), "line 4999");
        assert_eq!(reader.bytes_read(), input.len() as u64);
    }
}
