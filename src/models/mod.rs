//! Data models shared by the shell layers.
//!
//! Contains domain types for:
//! - [`EntryInfo`], [`EntryKind`], [`OpenMode`] - Filesystem entries and open modes
//! - [`OutputLine`], [`Output`], [`ChannelOutput`] - Shell output and its sinks

mod filesystem;
mod terminal;

pub use filesystem::{EntryInfo, EntryKind, OpenMode, sort_entries};
pub use terminal::{ChannelOutput, Output, OutputLine};
