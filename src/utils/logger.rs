//! Debug log channel.
//!
//! Every record is written to stderr as `<millis> | <file>:<line> - <message>`,
//! where `millis` counts from logger installation.

use std::fmt;
use std::io::Write;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// [`Log`] implementation writing preambled lines to stderr.
pub struct ChannelLogger {
    start: Instant,
    level: LevelFilter,
}

impl ChannelLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self {
            start: Instant::now(),
            level,
        }
    }

    /// Install as the global logger.
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(Self::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }
}

/// Render one log line without its trailing newline.
pub fn format_line(millis: u128, file: &str, line: u32, message: &fmt::Arguments<'_>) -> String {
    format!("{} | {}:{} - {}", millis, file, line, message)
}

impl Log for ChannelLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let text = format_line(
            self.start.elapsed().as_millis(),
            record.file().unwrap_or("?"),
            record.line().unwrap_or(0),
            record.args(),
        );
        // Nowhere left to report a failing stderr.
        let _ = writeln!(std::io::stderr().lock(), "{}", text);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
