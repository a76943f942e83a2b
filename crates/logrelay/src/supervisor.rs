//! The supervisor event loop

use logrelay_core::{DualSink, ExitCoordinator, ExitStatus, LogFacility, PipeReader, ReadOutcome};
use logrelay_host_linux::{ChildProcess, Relayed, SignalRelay};
use std::io::Write;
use std::time::Duration;
use tokio::io::AsyncRead;
use tracing::{debug, error, info};

/// Default time to keep reading after the child exits with the pipe still open
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

/// Bytes drained after the child exits even past the drain timeout
/// (the default Linux pipe capacity)
pub const DRAIN_GUARANTEED_BYTES: u64 = 64 * 1024;

/// Runs one child to completion.
///
/// Pipe reads, intercepted signals and the child's exit are all handled on
/// a single loop, so lines reach the sink in the order their newlines
/// arrived. Signals and the exit are polled ahead of the pipe on every
/// pass; a child that never stops writing cannot starve them.
pub struct Supervisor<R, C, L> {
    child: ChildProcess,
    reader: PipeReader<R>,
    relay: Option<SignalRelay>,
    sink: DualSink<C, L>,
    coordinator: ExitCoordinator,
    drain_timeout: Duration,
}

impl<R, C, L> Supervisor<R, C, L>
where
    R: AsyncRead + Unpin,
    C: Write,
    L: LogFacility,
{
    pub fn new(child: ChildProcess, reader: PipeReader<R>, sink: DualSink<C, L>) -> Self {
        Self {
            child,
            reader,
            relay: None,
            sink,
            coordinator: ExitCoordinator::new(),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Forward the signals `relay` intercepts to the child
    pub fn with_signal_relay(mut self, relay: SignalRelay) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn sink(&self) -> &DualSink<C, L> {
        &self.sink
    }

    /// Relay output and signals until the child exits, then return the
    /// code the supervisor should exit with
    pub async fn run(&mut self) -> i32 {
        info!(pid = ?self.child.pid(), program = %self.child.program(), "Supervising child");

        let status = loop {
            tokio::select! {
                biased;

                which = next_signal(&mut self.relay) => {
                    if let Some(relay) = &self.relay {
                        relay.relay(which, &self.child);
                    }
                }

                // Output still in the pipe is picked up by `drain`
                status = self.child.wait() => {
                    break match status {
                        Ok(status) => status,
                        Err(e) => {
                            error!(error = %e, "Failed to wait for child");
                            ExitStatus::with_code(1)
                        }
                    };
                }

                outcome = self.reader.read_lines(), if !self.reader.is_closed() => {
                    self.relay_lines(outcome);
                }
            }
        };

        self.drain().await;

        let code = self
            .coordinator
            .child_exited(status, &mut self.reader, &mut self.sink);
        info!(status = %status, exit_code = code, "Child exited");
        code
    }

    /// Read whatever is still in the pipe after the child exited.
    ///
    /// Something else (a grandchild, usually) may keep the write end open,
    /// so this gives up after the drain timeout. The first
    /// [`DRAIN_GUARANTEED_BYTES`] are read regardless of the timeout; that
    /// covers whatever the child itself left in the pipe buffer.
    async fn drain(&mut self) {
        if self.reader.is_closed() {
            return;
        }

        let start = self.reader.bytes_read();
        let deadline = tokio::time::sleep(self.drain_timeout);
        tokio::pin!(deadline);

        loop {
            let guaranteed = self.reader.bytes_read() - start < DRAIN_GUARANTEED_BYTES;

            let closed = if guaranteed {
                tokio::select! {
                    biased;

                    outcome = self.reader.read_lines() => self.relay_lines(outcome),
                    _ = &mut deadline => break,
                }
            } else {
                tokio::select! {
                    biased;

                    _ = &mut deadline => break,
                    outcome = self.reader.read_lines() => self.relay_lines(outcome),
                }
            };

            if closed {
                return;
            }
        }

        debug!(timeout = ?self.drain_timeout, "Output pipe still open after child exit");
    }

    /// Emit the lines of one read; true once the stream has closed
    fn relay_lines(&mut self, outcome: ReadOutcome) -> bool {
        for line in outcome.lines() {
            self.sink.emit(line);
        }
        if outcome.is_closed() {
            self.coordinator.stream_closed();
        }
        outcome.is_closed()
    }
}

/// Next intercepted signal, or never when no relay is installed
async fn next_signal(relay: &mut Option<SignalRelay>) -> Relayed {
    match relay {
        Some(relay) => relay.recv().await,
        None => std::future::pending().await,
    }
}
