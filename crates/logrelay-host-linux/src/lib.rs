//! Linux host adapter for logrelay
//!
//! Provides:
//! - A single pipe carrying the child's stdout and stderr
//! - Child spawning with inherited stdin, and exit observation
//! - SIGINT/SIGTERM relay to the child
//! - The syslog log facility

mod error;
mod pipe;
mod process;
mod signals;
mod syslog;

pub use error::*;
pub use pipe::*;
pub use process::*;
pub use signals::*;
pub use syslog::*;
