//! Filesystem driver backed by a directory on the host.
//!
//! Every virtual path is mapped beneath `root`. Virtual paths are already
//! normalized, so a mapped path can never leave the root.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::core::error::FsError;
use crate::core::filesystem::{FileHandle, FlashFs};
use crate::core::path::VirtualPath;
use crate::models::{EntryInfo, EntryKind, OpenMode, sort_entries};

/// Host directory mounted as the shell filesystem.
#[derive(Debug, Clone)]
pub struct HostFs {
    root: PathBuf,
}

impl HostFs {
    /// Mount an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FsError> {
        let root = root.into();
        let meta = fs::metadata(&root)?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory(root.display().to_string()));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn host_path(&self, path: &VirtualPath) -> PathBuf {
        let mut host = self.root.clone();
        host.extend(path.segments());
        host
    }

    fn info(name: &str, meta: &fs::Metadata) -> EntryInfo {
        let created = meta
            .created()
            .or_else(|_| meta.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        EntryInfo {
            name: name.to_string(),
            kind,
            size: if meta.is_dir() { 0 } else { meta.len() },
            created,
        }
    }
}

/// Map `std::io` errors onto driver errors for `path`.
fn map_io(err: io::Error, path: &VirtualPath) -> FsError {
    match err.kind() {
        io::ErrorKind::NotFound => FsError::NotFound(path.to_string()),
        io::ErrorKind::AlreadyExists => FsError::AlreadyExists(path.to_string()),
        io::ErrorKind::NotADirectory => FsError::NotADirectory(path.to_string()),
        io::ErrorKind::IsADirectory => FsError::IsADirectory(path.to_string()),
        io::ErrorKind::DirectoryNotEmpty => FsError::NotEmpty(path.to_string()),
        _ => FsError::Io(err),
    }
}

impl FlashFs for HostFs {
    fn metadata(&self, path: &VirtualPath) -> Result<EntryInfo, FsError> {
        let meta = fs::metadata(self.host_path(path)).map_err(|e| map_io(e, path))?;
        Ok(Self::info(path.file_name().unwrap_or("/"), &meta))
    }

    fn open(&self, path: &VirtualPath, mode: OpenMode) -> Result<Box<dyn FileHandle>, FsError> {
        let host = self.host_path(path);
        if host.is_dir() {
            return Err(FsError::IsADirectory(path.to_string()));
        }
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Read => options.read(true),
            OpenMode::ReadWrite => options.read(true).write(true),
            OpenMode::Write => options.read(true).write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true).create(true),
        };
        let mut file = options.open(&host).map_err(|e| map_io(e, path))?;
        let pos = match mode {
            OpenMode::Append => file.seek(SeekFrom::End(0))?,
            _ => 0,
        };
        Ok(Box::new(HostFile { file, pos, mode }))
    }

    fn read_dir(&self, path: &VirtualPath) -> Result<Vec<EntryInfo>, FsError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.host_path(path)).map_err(|e| map_io(e, path))? {
            let entry = entry?;
            let meta = entry.metadata()?;
            entries.push(Self::info(&entry.file_name().to_string_lossy(), &meta));
        }
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn mkdir(&self, path: &VirtualPath) -> Result<(), FsError> {
        if path.is_root() {
            return Err(FsError::AlreadyExists(path.to_string()));
        }
        fs::create_dir(self.host_path(path)).map_err(|e| map_io(e, path))
    }

    fn rmdir(&self, path: &VirtualPath) -> Result<(), FsError> {
        if path.is_root() {
            return Err(FsError::InvalidPath(path.to_string()));
        }
        fs::remove_dir(self.host_path(path)).map_err(|e| map_io(e, path))
    }

    fn remove(&self, path: &VirtualPath) -> Result<(), FsError> {
        let host = self.host_path(path);
        if host.is_dir() {
            return Err(FsError::IsADirectory(path.to_string()));
        }
        fs::remove_file(host).map_err(|e| map_io(e, path))
    }

    fn rename(&self, from: &VirtualPath, to: &VirtualPath) -> Result<(), FsError> {
        if from.is_root() || to.is_root() {
            return Err(FsError::InvalidPath(to.to_string()));
        }
        fs::rename(self.host_path(from), self.host_path(to)).map_err(|e| map_io(e, from))
    }

    fn format(&self) -> Result<(), FsError> {
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

/// Open host file. The cursor is tracked here so `position` needs no syscall.
struct HostFile {
    file: File,
    pos: u64,
    mode: OpenMode,
}

impl HostFile {
    fn len(&self) -> Result<u64, FsError> {
        Ok(self.file.metadata()?.len())
    }
}

impl FileHandle for HostFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError> {
        if !self.mode.can_read() {
            return Err(FsError::BadMode("reading"));
        }
        let n = self.file.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, FsError> {
        if !self.mode.can_write() {
            return Err(FsError::BadMode("writing"));
        }
        let n = self.file.write(data)?;
        self.pos = if self.mode == OpenMode::Append {
            self.len()?
        } else {
            self.pos + n as u64
        };
        Ok(n)
    }

    fn seek(&mut self, pos: u64) -> Result<(), FsError> {
        let target = pos.min(self.len()?);
        self.pos = self.file.seek(SeekFrom::Start(target))?;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn size(&self) -> u64 {
        // The cursor is the last size known to be valid.
        self.len().unwrap_or_else(|err| {
            log::warn!("cannot stat open file, assuming {} bytes: {}", self.pos, err);
            self.pos
        })
    }

    fn truncate(&mut self, len: u64) -> Result<(), FsError> {
        if !self.mode.can_write() {
            return Err(FsError::BadMode("writing"));
        }
        self.file.set_len(len)?;
        if self.pos > len {
            self.pos = self.file.seek(SeekFrom::Start(len))?;
        }
        Ok(())
    }
}
