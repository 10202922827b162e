//! Shared utilities for the NXD engine.

pub mod logging;

pub use logging::{init_logging, LogFormat};
