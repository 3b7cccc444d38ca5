use std::fmt;

// =============================================================================
// Entry Metadata
// =============================================================================

/// Kind of a filesystem entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// Single-letter marker used in listings.
    pub fn marker(self) -> char {
        match self {
            Self::File => 'f',
            Self::Directory => 'd',
        }
    }
}

/// Metadata for one file or directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryInfo {
    /// Entry name (last path segment)
    pub name: String,
    pub kind: EntryKind,
    /// Size in bytes, 0 for directories
    pub size: u64,
    /// Creation time as Unix timestamp, 0 when the driver cannot tell
    pub created: u64,
}

impl EntryInfo {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Sort entries for display: directories first, then by name.
pub fn sort_entries(entries: &mut [EntryInfo]) {
    entries.sort_by(|a, b| match (a.is_dir(), b.is_dir()) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });
}

// =============================================================================
// Open Modes
// =============================================================================

/// How a file is opened, named after the flash driver mode strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// `r`: read only, must exist
    Read,
    /// `r+`: read and write, must exist, cursor at 0
    ReadWrite,
    /// `w+`: create or truncate, read and write
    Write,
    /// `a`: create if missing, writes go to the end
    Append,
}

impl OpenMode {
    pub fn can_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite | Self::Write)
    }

    pub fn can_write(self) -> bool {
        !matches!(self, Self::Read)
    }

    pub fn creates(self) -> bool {
        matches!(self, Self::Write | Self::Append)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "r",
            Self::ReadWrite => "r+",
            Self::Write => "w+",
            Self::Append => "a",
        })
    }
}
