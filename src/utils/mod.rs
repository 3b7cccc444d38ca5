//! Process-level utilities.
//!
//! Provides:
//! - [`ChannelLogger`] - `log` backend with the `<millis> | <file>:<line>` preamble

pub mod logger;

pub use logger::ChannelLogger;
