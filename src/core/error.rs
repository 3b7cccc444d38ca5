//! Error types for the shell.
//!
//! - [`FsError`] - failures reported by a filesystem driver
//! - [`ShellError`] - everything a command handler can report; printed by the
//!   dispatcher, never fatal
//! - [`ConfigError`] - configuration loading failures (startup only)

use std::path::PathBuf;

use thiserror::Error;

/// Which kind of entry a path was expected to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRole {
    File,
    Directory,
}

impl PathRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }
}

/// Errors returned by [`FlashFs`](crate::core::FlashFs) implementations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("{0}: no such file or directory")]
    NotFound(String),
    #[error("{0}: already exists")]
    AlreadyExists(String),
    #[error("{0}: not a directory")]
    NotADirectory(String),
    #[error("{0}: is a directory")]
    IsADirectory(String),
    #[error("{0}: directory not empty")]
    NotEmpty(String),
    #[error("{0}: invalid path")]
    InvalidPath(String),
    #[error("file handle not opened for {0}")]
    BadMode(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors reported by command handlers.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Invalid {} path: {path}", .role.as_str())]
    MalformedPath { path: String, role: PathRole },

    #[error("Missing operand")]
    MissingOperand,

    #[error("{what}")]
    MissingData { what: &'static str },

    #[error("{0} doesn't exist")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The entry exists but is of the wrong kind; `found` is what it is.
    #[error("{path} is a {}", .found.as_str())]
    WrongEntryKind { path: String, found: PathRole },

    #[error("{0}")]
    InvalidRange(String),

    #[error("{0}")]
    IncompatibleFlags(&'static str),

    #[error("Failed to {action} {path}: {source}")]
    IoFailure {
        action: &'static str,
        path: String,
        #[source]
        source: FsError,
    },

    #[error("Error: command {0} not found!")]
    UnknownCommand(String),

    #[error("Error: Too big command!")]
    LineTooLong,

    #[error("{0}")]
    Refused(&'static str),
}

impl ShellError {
    /// Wraps a driver error with the action and path it was part of.
    pub fn io(action: &'static str, path: impl Into<String>, source: FsError) -> Self {
        Self::IoFailure {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while loading a [`ShellConfig`](crate::config::ShellConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0} must be greater than zero")]
    Zero(&'static str),
    #[error("invalid config: {field} cannot be greater than {max}")]
    TooLarge { field: &'static str, max: usize },
    #[error("invalid config: unknown log level {0:?}")]
    LogLevel(String),
}
