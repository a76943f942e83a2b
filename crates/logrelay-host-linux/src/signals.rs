//! Relay of SIGINT and SIGTERM to the child

use nix::sys::signal::{self, SigHandler, Signal};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal::unix::{signal as unix_signal, SignalKind};
use tracing::info;

use crate::{ChildProcess, HostError, HostResult};

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// A signal the supervisor forwards instead of acting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relayed {
    Interrupt,
    Terminate,
}

impl Relayed {
    pub fn as_signal(self) -> Signal {
        match self {
            Relayed::Interrupt => Signal::SIGINT,
            Relayed::Terminate => Signal::SIGTERM,
        }
    }
}

impl fmt::Display for Relayed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_signal().as_str())
    }
}

/// Intercepts SIGINT and SIGTERM aimed at the supervisor
pub struct SignalRelay {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

impl SignalRelay {
    /// Take over SIGINT and SIGTERM.
    ///
    /// Both are ignored first so there is no window in which the default
    /// action could kill the supervisor before the handlers are in place.
    /// Must be called before the child is spawned. Only one relay may
    /// exist per process; later calls fail without touching dispositions.
    pub fn install() -> HostResult<Self> {
        if INSTALLED.swap(true, Ordering::SeqCst) {
            return Err(HostError::Signal("signal relay already installed".into()));
        }

        for sig in [Signal::SIGINT, Signal::SIGTERM] {
            // SAFETY: SIG_IGN carries no handler code
            let previous = unsafe { signal::signal(sig, SigHandler::SigIgn) };
            previous.map_err(|e| HostError::Signal(format!("ignoring {}: {}", sig, e)))?;
        }

        let interrupt = unix_signal(SignalKind::interrupt())
            .map_err(|e| HostError::Signal(format!("SIGINT handler: {}", e)))?;
        let terminate = unix_signal(SignalKind::terminate())
            .map_err(|e| HostError::Signal(format!("SIGTERM handler: {}", e)))?;

        Ok(Self {
            interrupt,
            terminate,
        })
    }

    /// Wait for the next intercepted signal. Cancel safe.
    pub async fn recv(&mut self) -> Relayed {
        tokio::select! {
            Some(()) = self.interrupt.recv() => Relayed::Interrupt,
            Some(()) = self.terminate.recv() => Relayed::Terminate,
            else => std::future::pending().await,
        }
    }

    /// Forward `which` to the child. Safe to repeat, and a no-op once the
    /// child is gone.
    pub fn relay(&self, which: Relayed, child: &ChildProcess) {
        info!(signal = %which, pid = ?child.pid(), "Relaying signal to child");
        child.signal(which.as_signal());
    }
}
