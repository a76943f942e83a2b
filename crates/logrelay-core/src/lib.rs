//! Core of logrelay
//!
//! This crate provides:
//! - Line framing over an arbitrarily chunked byte stream
//! - The dual console/log-facility sink
//! - An async pipe reader that feeds the framer
//! - Exit coordination and the child exit status model
//! - Error types

mod coordinator;
mod error;
mod framer;
mod reader;
mod sink;
mod status;

pub use coordinator::*;
pub use error::*;
pub use framer::*;
pub use reader::*;
pub use sink::*;
pub use status::*;
