//! Child process management

use logrelay_core::ExitStatus;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::{HostError, HostResult, OutputPipe};

/// The supervised child
pub struct ChildProcess {
    child: Child,
    program: String,
}

impl ChildProcess {
    /// Spawn `program` with `args`, stdout and stderr on `pipe`, stdin inherited.
    ///
    /// A bare program name is resolved through `PATH`.
    pub fn spawn(program: &str, args: &[String], pipe: &OutputPipe) -> HostResult<Self> {
        let (stdout, stderr) = pipe.child_stdio()?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::inherit())
            .stdout(stdout)
            .stderr(stderr);

        // `cmd` owns the child-side write ends; they close when it drops below
        let child = cmd.spawn().map_err(|source| HostError::Spawn {
            program: program.to_string(),
            source,
        })?;

        info!(pid = ?child.id(), program = %program, args = ?args, "Process spawned");

        Ok(Self {
            child,
            program: program.to_string(),
        })
    }

    /// Process ID, or `None` once the child has been reaped
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Send `sig` to the child.
    ///
    /// A child that is already gone is not an error; other failures are
    /// logged and dropped.
    pub fn signal(&self, sig: Signal) {
        let Some(pid) = self.child.id() else {
            debug!(signal = %sig, "Child already reaped, not signalling");
            return;
        };

        match signal::kill(Pid::from_raw(pid as i32), sig) {
            Ok(()) => {
                debug!(pid = pid, signal = %sig, "Signal sent to child");
            }
            Err(nix::errno::Errno::ESRCH) => {
                // Process already gone
                debug!(pid = pid, signal = %sig, "Child exited before signal");
            }
            Err(e) => {
                warn!(pid = pid, signal = %sig, error = %e, "Failed to signal child");
            }
        }
    }

    /// Wait for the child to exit. Cancel safe.
    pub async fn wait(&mut self) -> HostResult<ExitStatus> {
        let status = self.child.wait().await?;
        Ok(ExitStatus::from(status))
    }
}
