//! syslog(3) log facility

use logrelay_core::{LogFacility, Severity};
use std::ffi::CString;
use std::fmt;
use std::io;
use std::str::FromStr;
use tracing::debug;

/// syslog facility the relayed lines are filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facility {
    #[default]
    User,
    Daemon,
    Local0,
    Local1,
    Local2,
    Local3,
    Local4,
    Local5,
    Local6,
    Local7,
}

impl Facility {
    pub fn as_raw(self) -> libc::c_int {
        match self {
            Facility::User => libc::LOG_USER,
            Facility::Daemon => libc::LOG_DAEMON,
            Facility::Local0 => libc::LOG_LOCAL0,
            Facility::Local1 => libc::LOG_LOCAL1,
            Facility::Local2 => libc::LOG_LOCAL2,
            Facility::Local3 => libc::LOG_LOCAL3,
            Facility::Local4 => libc::LOG_LOCAL4,
            Facility::Local5 => libc::LOG_LOCAL5,
            Facility::Local6 => libc::LOG_LOCAL6,
            Facility::Local7 => libc::LOG_LOCAL7,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Facility::User => "user",
            Facility::Daemon => "daemon",
            Facility::Local0 => "local0",
            Facility::Local1 => "local1",
            Facility::Local2 => "local2",
            Facility::Local3 => "local3",
            Facility::Local4 => "local4",
            Facility::Local5 => "local5",
            Facility::Local6 => "local6",
            Facility::Local7 => "local7",
        }
    }
}

impl FromStr for Facility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Facility::User),
            "daemon" => Ok(Facility::Daemon),
            "local0" => Ok(Facility::Local0),
            "local1" => Ok(Facility::Local1),
            "local2" => Ok(Facility::Local2),
            "local3" => Ok(Facility::Local3),
            "local4" => Ok(Facility::Local4),
            "local5" => Ok(Facility::Local5),
            "local6" => Ok(Facility::Local6),
            "local7" => Ok(Facility::Local7),
            other => Err(format!(
                "unknown syslog facility '{}' (expected user, daemon or local0-local7)",
                other
            )),
        }
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where relayed lines are logged: a subsystem name plus a facility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDestination {
    pub subsystem: String,
    pub facility: Facility,
}

impl LogDestination {
    pub fn new(subsystem: impl Into<String>, facility: Facility) -> Self {
        Self {
            subsystem: subsystem.into(),
            facility,
        }
    }
}

/// Connection to the system logger.
///
/// Opened once at startup. The subsystem name becomes the syslog ident,
/// which syslog(3) keeps a pointer to, so it lives as long as this value.
pub struct Syslog {
    _ident: CString,
}

impl Syslog {
    pub fn open(destination: &LogDestination) -> Self {
        let ident = to_c_string(&destination.subsystem);

        // SAFETY: `ident` is NUL-terminated and outlives the connection
        unsafe { libc::openlog(ident.as_ptr(), libc::LOG_PID, destination.facility.as_raw()) };

        debug!(
            ident = %destination.subsystem,
            facility = %destination.facility,
            "Opened syslog"
        );
        Self { _ident: ident }
    }
}

impl LogFacility for Syslog {
    fn log(&mut self, severity: Severity, message: &str) -> io::Result<()> {
        let priority = match severity {
            Severity::Default => libc::LOG_NOTICE,
            Severity::Fault => libc::LOG_CRIT,
        };
        let message = to_c_string(message);

        // SAFETY: fixed "%s" format with one NUL-terminated argument
        unsafe { libc::syslog(priority, c"%s".as_ptr(), message.as_ptr()) };
        Ok(())
    }
}

impl Drop for Syslog {
    fn drop(&mut self) {
        // SAFETY: no other syslog connection is in use by this process
        unsafe { libc::closelog() };
    }
}

/// Build a C string, dropping interior NUL bytes
fn to_c_string(s: &str) -> CString {
    let bytes: Vec<u8> = s.bytes().filter(|&b| b != 0).collect();
    CString::new(bytes).unwrap_or_default()
}
