//! Gutencat Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the gutencat workspace members. At the moment this is
//! the logging setup used by both the HTTP server and the one-shot sync
//! binary.

pub mod logging;

pub use logging::{init_logging, LogConfig};
