//! Core logic of the shell.
//!
//! This module provides:
//! - [`parser`] - command line tokenizer and [`Command`]
//! - [`VirtualPath`] - working directory model and path resolution
//! - [`FlashFs`] with the [`MemoryFs`] and [`HostFs`] drivers
//! - [`reader`] and [`editor`] - bounded reads and line range removal
//! - [`execute_command`] - dispatch over the command table

pub mod channel;
mod commands;
pub mod editor;
pub mod error;
mod filesystem;
mod hostfs;
mod memfs;
pub mod parser;
mod path;
pub mod reader;

pub use channel::{Input, LineChannel};
pub use commands::{COMMANDS, CommandInfo, Handler, ShellContext, execute_command, lookup};
pub use editor::{EditReport, LineEditor, LineRange};
pub use error::{ConfigError, FsError, PathRole, ShellError};
pub use filesystem::{FileHandle, FlashFs};
pub use hostfs::HostFs;
pub use memfs::MemoryFs;
pub use parser::Command;
pub use path::{VirtualPath, is_valid_path};
