//! Pipe shared by the child's stdout and stderr

use nix::fcntl::OFlag;
use std::os::fd::OwnedFd;
use std::process::Stdio;
use tokio::net::unix::pipe::Receiver;

use crate::{HostError, HostResult};

/// Both ends of the child's output pipe.
///
/// The child gets two copies of the write end, one for stdout and one for
/// stderr, so both streams land in the same byte stream. Relative order
/// between the two is whatever the kernel observes; nothing here orders it.
pub struct OutputPipe {
    reader: OwnedFd,
    writer: OwnedFd,
}

impl OutputPipe {
    pub fn new() -> HostResult<Self> {
        // CLOEXEC keeps the read end out of the child; dup2 onto fds 1 and 2
        // clears the flag for the write end copies
        let (reader, writer) = nix::unistd::pipe2(OFlag::O_CLOEXEC)
            .map_err(|e| HostError::Pipe(e.to_string()))?;

        Ok(Self { reader, writer })
    }

    /// Stdio handles for the child's stdout and stderr
    pub fn child_stdio(&self) -> HostResult<(Stdio, Stdio)> {
        let stdout = self.writer.try_clone()?;
        let stderr = self.writer.try_clone()?;
        Ok((Stdio::from(stdout), Stdio::from(stderr)))
    }

    /// Close the parent's write end and register the read end with the
    /// runtime. End of stream arrives once every child-side copy is closed.
    pub fn into_receiver(self) -> HostResult<Receiver> {
        drop(self.writer);
        Ok(Receiver::from_owned_fd(self.reader)?)
    }
}
