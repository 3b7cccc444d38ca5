//! Filesystem driver interface.
//!
//! The shell talks to the mounted flash filesystem only through
//! [`FlashFs`] and the [`FileHandle`]s it opens. Both are object safe so the
//! dispatch table can hold plain function pointers over `&dyn FlashFs`.
//!
//! Paths are always normalized [`VirtualPath`]s; drivers never see `.` or
//! `..` segments.

use crate::core::error::FsError;
use crate::core::path::VirtualPath;
use crate::models::{EntryInfo, OpenMode};

/// An open file with a single read/write cursor.
pub trait FileHandle {
    /// Read up to `buf.len()` bytes at the cursor. Returns 0 at end of file.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError>;

    /// Write `data` at the cursor (or at the end in append mode) and
    /// advance past it. Returns the number of bytes written.
    fn write(&mut self, data: &[u8]) -> Result<usize, FsError>;

    /// Move the cursor to an absolute offset. Offsets past the end are
    /// clamped to the end.
    fn seek(&mut self, pos: u64) -> Result<(), FsError>;

    fn position(&self) -> u64;

    fn size(&self) -> u64;

    /// Cut the file to `len` bytes. The cursor is clamped to the new end.
    fn truncate(&mut self, len: u64) -> Result<(), FsError>;

    /// Bytes left between the cursor and the end of file.
    fn available(&self) -> u64 {
        self.size().saturating_sub(self.position())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, FsError> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Write all of `data`, failing if the driver accepts fewer bytes.
    fn write_all(&mut self, data: &[u8]) -> Result<(), FsError> {
        let written = self.write(data)?;
        if written != data.len() {
            return Err(FsError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", written, data.len()),
            )));
        }
        Ok(())
    }
}

/// Primitive operations of a mounted filesystem.
pub trait FlashFs {
    fn metadata(&self, path: &VirtualPath) -> Result<EntryInfo, FsError>;

    fn exists(&self, path: &VirtualPath) -> bool {
        self.metadata(path).is_ok()
    }

    /// Open a file. Directories cannot be opened.
    fn open(&self, path: &VirtualPath, mode: OpenMode) -> Result<Box<dyn FileHandle>, FsError>;

    /// Immediate children of a directory, in driver order.
    fn read_dir(&self, path: &VirtualPath) -> Result<Vec<EntryInfo>, FsError>;

    /// Create one directory. The parent must already exist.
    fn mkdir(&self, path: &VirtualPath) -> Result<(), FsError>;

    /// Remove an empty directory.
    fn rmdir(&self, path: &VirtualPath) -> Result<(), FsError>;

    /// Remove a file.
    fn remove(&self, path: &VirtualPath) -> Result<(), FsError>;

    /// Move an entry. An existing destination file is replaced.
    fn rename(&self, from: &VirtualPath, to: &VirtualPath) -> Result<(), FsError>;

    /// Delete everything.
    fn format(&self) -> Result<(), FsError>;
}
