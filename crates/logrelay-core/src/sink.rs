//! Console and log-facility output for relayed lines

use std::io::{self, Write};
use tracing::debug;

use crate::Line;

/// Severity of a record sent to the log facility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Ordinary relayed output
    Default,
    /// The supervisor itself failed (e.g. the child could not be spawned)
    Fault,
}

/// A system log facility that accepts one record per call
pub trait LogFacility {
    fn log(&mut self, severity: Severity, message: &str) -> io::Result<()>;
}

impl<L: LogFacility + ?Sized> LogFacility for Box<L> {
    fn log(&mut self, severity: Severity, message: &str) -> io::Result<()> {
        (**self).log(severity, message)
    }
}

/// In-memory log facility for testing
#[derive(Debug, Default)]
pub struct MemoryFacility {
    pub records: Vec<(Severity, String)>,

    /// Reject every record, as an unavailable syslog would
    pub fail: bool,
}

impl MemoryFacility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            records: Vec::new(),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<&str> {
        self.records.iter().map(|(_, m)| m.as_str()).collect()
    }
}

impl LogFacility for MemoryFacility {
    fn log(&mut self, severity: Severity, message: &str) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "log facility unavailable"));
        }
        self.records.push((severity, message.to_string()));
        Ok(())
    }
}

/// Writes each line to the console and to the log facility.
///
/// Neither destination can fail the caller; write errors are logged at
/// debug level and dropped.
pub struct DualSink<C, L> {
    console: C,
    facility: L,
}

impl<C: Write, L: LogFacility> DualSink<C, L> {
    pub fn new(console: C, facility: L) -> Self {
        Self { console, facility }
    }

    /// Relay one line of child output
    pub fn emit(&mut self, line: &Line) {
        let result = if line.is_terminated() {
            writeln!(self.console, "{}", line.text())
        } else {
            write!(self.console, "{}", line.text())
        };
        if let Err(e) = result.and_then(|()| self.console.flush()) {
            debug!(error = %e, "Console write failed");
        }

        if let Err(e) = self.facility.log(Severity::Default, line.text()) {
            debug!(error = %e, "Log facility write failed");
        }
    }

    /// Report a supervisor failure on both destinations
    pub fn fault(&mut self, message: &str) {
        if let Err(e) = writeln!(self.console, "{}", message).and_then(|()| self.console.flush()) {
            debug!(error = %e, "Console write failed");
        }

        if let Err(e) = self.facility.log(Severity::Fault, message) {
            debug!(error = %e, "Log facility write failed");
        }
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn facility(&self) -> &L {
        &self.facility
    }
}
