//! Interactive shell over a flash-style filesystem.
//!
//! The [`app::Shell`] reads command lines from a byte channel and runs them
//! against a [`core::FlashFs`] driver.

pub mod app;
pub mod config;
pub mod core;
pub mod models;
pub mod utils;
