//! Terminal-related data types for output rendering.

use std::fmt;
use std::io::Write;

use crate::config::listing::{CREATED_WIDTH, SIZE_WIDTH};
use crate::models::EntryInfo;

/// Represents a single line of shell output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputLine {
    /// Echo of an executed command with the working path
    Command { prompt: String, input: String },
    /// Plain text output
    Text(String),
    /// Error message
    Error(String),
    /// Notice that does not stop the command
    Info(String),
    /// Directory listing row
    ListEntry {
        marker: char,
        size: u64,
        created: u64,
        name: String,
    },
}

impl OutputLine {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn error(s: impl Into<String>) -> Self {
        Self::Error(s.into())
    }

    pub fn info(s: impl Into<String>) -> Self {
        Self::Info(s.into())
    }

    pub fn command(prompt: impl Into<String>, input: impl Into<String>) -> Self {
        Self::Command {
            prompt: prompt.into(),
            input: input.into(),
        }
    }

    /// Create a listing row for `ls`
    pub fn list_entry(entry: &EntryInfo) -> Self {
        Self::ListEntry {
            marker: entry.kind.marker(),
            size: entry.size,
            created: entry.created,
            name: entry.name.clone(),
        }
    }
}

impl fmt::Display for OutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command { prompt, input } => write!(f, "{}$ {}", prompt, input),
            Self::Text(s) | Self::Error(s) | Self::Info(s) => f.write_str(s),
            Self::ListEntry {
                marker,
                size,
                created,
                name,
            } => write!(
                f,
                "{} {:<sw$} {:<cw$} {}",
                marker,
                size,
                created,
                name,
                sw = SIZE_WIDTH - 1,
                cw = CREATED_WIDTH - 1,
            ),
        }
    }
}

// =============================================================================
// Output Sink
// =============================================================================

/// Destination for output lines.
pub trait Output {
    fn emit(&mut self, line: OutputLine);
}

/// Collects lines, used by tests and by `-c` batch runs.
impl Output for Vec<OutputLine> {
    fn emit(&mut self, line: OutputLine) {
        self.push(line);
    }
}

/// Writes each line followed by a line feed to a byte channel.
pub struct ChannelOutput<W: Write> {
    writer: W,
}

impl<W: Write> ChannelOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write without a trailing newline, used for prompts.
    pub fn write_raw(&mut self, text: &str) {
        let result = self
            .writer
            .write_all(text.as_bytes())
            .and_then(|_| self.writer.flush());
        if let Err(err) = result {
            log::warn!("output channel write failed: {}", err);
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Output for ChannelOutput<W> {
    fn emit(&mut self, line: OutputLine) {
        if let Err(err) = writeln!(self.writer, "{}", line) {
            log::warn!("output channel write failed: {}", err);
        }
    }
}
