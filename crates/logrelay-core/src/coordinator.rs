//! Exit coordination between stream closure and child termination

use std::io::Write;
use tokio::io::AsyncRead;
use tracing::{debug, warn};

use crate::{DualSink, ExitStatus, LogFacility, PipeReader};

/// Lifecycle of the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Child running, output stream open
    Running,
    /// Output stream closed, child not yet reaped
    Draining,
    /// Child reaped; the supervisor exits with this status
    Exited(ExitStatus),
}

/// Joins the end of the output stream and the child's termination.
///
/// The two triggers may arrive in either order. Whichever comes last, the
/// buffered partial line is flushed before the exit code is handed out.
#[derive(Debug)]
pub struct ExitCoordinator {
    phase: Phase,
}

impl ExitCoordinator {
    pub fn new() -> Self {
        Self {
            phase: Phase::Running,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_exited(&self) -> bool {
        matches!(self.phase, Phase::Exited(_))
    }

    /// The pipe reported end of stream
    pub fn stream_closed(&mut self) {
        if self.phase == Phase::Running {
            debug!("Output stream closed");
            self.phase = Phase::Draining;
        }
    }

    /// The child terminated. Flushes any partial line still held by the
    /// reader and returns the code the supervisor should exit with.
    ///
    /// Only the first status is kept; later calls return the same code.
    pub fn child_exited<R, C, L>(
        &mut self,
        status: ExitStatus,
        reader: &mut PipeReader<R>,
        sink: &mut DualSink<C, L>,
    ) -> i32
    where
        R: AsyncRead + Unpin,
        C: Write,
        L: LogFacility,
    {
        if let Phase::Exited(first) = self.phase {
            warn!(status = %status, first = %first, "Child exit reported twice, keeping first status");
            return first.exit_code();
        }

        if let Some(line) = reader.flush() {
            sink.emit(&line);
        }

        debug!(status = %status, from = ?self.phase, "Child exited");
        self.phase = Phase::Exited(status);
        status.exit_code()
    }
}

impl Default for ExitCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryFacility, ReadOutcome};
    use tokio::io::AsyncWriteExt;

    fn sink() -> DualSink<Vec<u8>, MemoryFacility> {
        DualSink::new(Vec::new(), MemoryFacility::new())
    }

    #[tokio::test]
    async fn stream_closes_then_child_exits() {
        let mut reader = PipeReader::new(&b"done\n"[..]);
        let mut sink = sink();
        let mut coordinator = ExitCoordinator::new();

        loop {
            let outcome = reader.read_lines().await;
            for line in outcome.lines() {
                sink.emit(line);
            }
            if outcome.is_closed() {
                coordinator.stream_closed();
                break;
            }
        }
        assert_eq!(coordinator.phase(), Phase::Draining);

        let code = coordinator.child_exited(ExitStatus::with_code(3), &mut reader, &mut sink);
        assert_eq!(code, 3);
        assert_eq!(coordinator.phase(), Phase::Exited(ExitStatus::with_code(3)));
        assert_eq!(sink.console().as_slice(), b"done\n");
    }

    #[tokio::test]
    async fn child_exits_before_stream_closes() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = PipeReader::new(rx);
        let mut sink = sink();
        let mut coordinator = ExitCoordinator::new();

        tx.write_all(b"whole\nhalf").await.unwrap();
        if let ReadOutcome::Lines(lines) = reader.read_lines().await {
            for line in &lines {
                sink.emit(line);
            }
        }

        // Pipe still open (writer alive) when the child is reaped
        let code = coordinator.child_exited(ExitStatus::with_code(0), &mut reader, &mut sink);
        assert_eq!(code, 0);
        assert!(coordinator.is_exited());
        assert_eq!(sink.console().as_slice(), b"whole\nhalf");
        assert_eq!(sink.facility().messages(), vec!["whole", "half"]);
        drop(tx);
    }

    #[tokio::test]
    async fn first_exit_status_wins() {
        let mut reader = PipeReader::new(&b""[..]);
        let mut sink = sink();
        let mut coordinator = ExitCoordinator::new();

        assert_eq!(
            coordinator.child_exited(ExitStatus::signaled(15), &mut reader, &mut sink),
            143
        );
        assert_eq!(
            coordinator.child_exited(ExitStatus::with_code(0), &mut reader, &mut sink),
            143
        );
    }

    #[test]
    fn stream_closed_after_exit_is_ignored() {
        let mut coordinator = ExitCoordinator::new();
        coordinator.phase = Phase::Exited(ExitStatus::success());
        coordinator.stream_closed();
        assert_eq!(coordinator.phase(), Phase::Exited(ExitStatus::success()));
    }
}
