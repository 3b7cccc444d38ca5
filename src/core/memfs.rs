//! In-memory filesystem driver.
//!
//! Entries form a tree of [`Node`]s under a single root directory. File
//! contents are shared between the tree and open handles, so a handle sees
//! writes made through another handle to the same file.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::core::error::FsError;
use crate::core::filesystem::{FileHandle, FlashFs};
use crate::core::path::VirtualPath;
use crate::models::{EntryInfo, EntryKind, OpenMode, sort_entries};

type Content = Rc<RefCell<Vec<u8>>>;

#[derive(Clone, Debug)]
enum Node {
    File { data: Content, created: u64 },
    Directory {
        children: BTreeMap<String, Node>,
        created: u64,
    },
}

impl Node {
    fn empty_dir(created: u64) -> Self {
        Self::Directory {
            children: BTreeMap::new(),
            created,
        }
    }

    fn info(&self, name: &str) -> EntryInfo {
        match self {
            Self::File { data, created } => EntryInfo {
                name: name.to_string(),
                kind: EntryKind::File,
                size: data.borrow().len() as u64,
                created: *created,
            },
            Self::Directory { created, .. } => EntryInfo {
                name: name.to_string(),
                kind: EntryKind::Directory,
                size: 0,
                created: *created,
            },
        }
    }
}

/// Volatile filesystem kept entirely in memory.
#[derive(Debug)]
pub struct MemoryFs {
    root: RefCell<Node>,
    /// Fake creation timestamps, one tick per created entry.
    clock: Cell<u64>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        Self {
            root: RefCell::new(Node::empty_dir(0)),
            clock: Cell::new(0),
        }
    }

    /// Create a file with the given content, replacing any existing file.
    /// Parent directories must exist.
    pub fn insert_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let path = VirtualPath::parse(path);
        let mut file = self.open(&path, OpenMode::Write)?;
        file.write_all(content)
    }

    /// Full content of a file.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        let path = VirtualPath::parse(path);
        let root = self.root.borrow();
        match Self::lookup(&root, &path)? {
            Node::File { data, .. } => Some(data.borrow().clone()),
            Node::Directory { .. } => None,
        }
    }

    fn tick(&self) -> u64 {
        let now = self.clock.get() + 1;
        self.clock.set(now);
        now
    }

    fn lookup<'n>(root: &'n Node, path: &VirtualPath) -> Option<&'n Node> {
        let mut current = root;
        for part in path.segments() {
            match current {
                Node::Directory { children, .. } => current = children.get(part)?,
                Node::File { .. } => return None,
            }
        }
        Some(current)
    }

    /// Children map of the directory at `path`.
    fn dir_mut<'n>(
        root: &'n mut Node,
        path: &VirtualPath,
    ) -> Result<&'n mut BTreeMap<String, Node>, FsError> {
        let mut current = root;
        for part in path.segments() {
            current = match current {
                Node::Directory { children, .. } => children
                    .get_mut(part)
                    .ok_or_else(|| FsError::NotFound(path.to_string()))?,
                Node::File { .. } => return Err(FsError::NotADirectory(path.to_string())),
            };
        }
        match current {
            Node::Directory { children, .. } => Ok(children),
            Node::File { .. } => Err(FsError::NotADirectory(path.to_string())),
        }
    }

    /// Parent directory map and the entry name for `path`.
    fn parent_mut<'n, 'p>(
        root: &'n mut Node,
        path: &'p VirtualPath,
    ) -> Result<(&'n mut BTreeMap<String, Node>, &'p str), FsError> {
        let name = path
            .file_name()
            .ok_or_else(|| FsError::InvalidPath(path.to_string()))?;
        let children = Self::dir_mut(root, &path.parent())?;
        Ok((children, name))
    }
}

impl FlashFs for MemoryFs {
    fn metadata(&self, path: &VirtualPath) -> Result<EntryInfo, FsError> {
        let root = self.root.borrow();
        let node = Self::lookup(&root, path).ok_or_else(|| FsError::NotFound(path.to_string()))?;
        Ok(node.info(path.file_name().unwrap_or("/")))
    }

    fn open(&self, path: &VirtualPath, mode: OpenMode) -> Result<Box<dyn FileHandle>, FsError> {
        let created = self.tick();
        let mut root = self.root.borrow_mut();
        let (children, name) = Self::parent_mut(&mut root, path)?;
        let data = match children.get(name) {
            Some(Node::Directory { .. }) => return Err(FsError::IsADirectory(path.to_string())),
            Some(Node::File { data, .. }) => {
                if mode == OpenMode::Write {
                    data.borrow_mut().clear();
                }
                Rc::clone(data)
            }
            None if mode.creates() => {
                let data: Content = Rc::default();
                children.insert(
                    name.to_string(),
                    Node::File {
                        data: Rc::clone(&data),
                        created,
                    },
                );
                data
            }
            None => return Err(FsError::NotFound(path.to_string())),
        };
        let pos = match mode {
            OpenMode::Append => data.borrow().len() as u64,
            _ => 0,
        };
        Ok(Box::new(MemoryFile { data, pos, mode }))
    }

    fn read_dir(&self, path: &VirtualPath) -> Result<Vec<EntryInfo>, FsError> {
        let root = self.root.borrow();
        match Self::lookup(&root, path) {
            Some(Node::Directory { children, .. }) => {
                let mut entries: Vec<_> = children
                    .iter()
                    .map(|(name, node)| node.info(name))
                    .collect();
                sort_entries(&mut entries);
                Ok(entries)
            }
            Some(Node::File { .. }) => Err(FsError::NotADirectory(path.to_string())),
            None => Err(FsError::NotFound(path.to_string())),
        }
    }

    fn mkdir(&self, path: &VirtualPath) -> Result<(), FsError> {
        let created = self.tick();
        let mut root = self.root.borrow_mut();
        let (children, name) = Self::parent_mut(&mut root, path)?;
        if children.contains_key(name) {
            return Err(FsError::AlreadyExists(path.to_string()));
        }
        children.insert(name.to_string(), Node::empty_dir(created));
        Ok(())
    }

    fn rmdir(&self, path: &VirtualPath) -> Result<(), FsError> {
        let mut root = self.root.borrow_mut();
        let (children, name) = Self::parent_mut(&mut root, path)?;
        let empty = match children.get(name) {
            Some(Node::Directory { children: inner, .. }) => inner.is_empty(),
            Some(Node::File { .. }) => return Err(FsError::NotADirectory(path.to_string())),
            None => return Err(FsError::NotFound(path.to_string())),
        };
        if !empty {
            return Err(FsError::NotEmpty(path.to_string()));
        }
        children.remove(name);
        Ok(())
    }

    fn remove(&self, path: &VirtualPath) -> Result<(), FsError> {
        let mut root = self.root.borrow_mut();
        let (children, name) = Self::parent_mut(&mut root, path)?;
        match children.get(name) {
            Some(Node::File { .. }) => {
                children.remove(name);
                Ok(())
            }
            Some(Node::Directory { .. }) => Err(FsError::IsADirectory(path.to_string())),
            None => Err(FsError::NotFound(path.to_string())),
        }
    }

    fn rename(&self, from: &VirtualPath, to: &VirtualPath) -> Result<(), FsError> {
        if from == to {
            return Ok(());
        }
        if to.segments().starts_with(from.segments()) {
            return Err(FsError::InvalidPath(to.to_string()));
        }
        let mut root = self.root.borrow_mut();
        {
            // Check the destination before detaching the source.
            let (children, name) = Self::parent_mut(&mut root, to)?;
            if let Some(Node::Directory { .. }) = children.get(name) {
                return Err(FsError::AlreadyExists(to.to_string()));
            }
        }
        let node = {
            let (children, name) = Self::parent_mut(&mut root, from)?;
            children
                .remove(name)
                .ok_or_else(|| FsError::NotFound(from.to_string()))?
        };
        let (children, name) = Self::parent_mut(&mut root, to)?;
        children.insert(name.to_string(), node);
        Ok(())
    }

    fn format(&self) -> Result<(), FsError> {
        *self.root.borrow_mut() = Node::empty_dir(0);
        Ok(())
    }
}

/// Handle to a [`MemoryFs`] file.
struct MemoryFile {
    data: Content,
    pos: u64,
    mode: OpenMode,
}

impl FileHandle for MemoryFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError> {
        if !self.mode.can_read() {
            return Err(FsError::BadMode("reading"));
        }
        let data = self.data.borrow();
        let start = (self.pos as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, FsError> {
        if !self.mode.can_write() {
            return Err(FsError::BadMode("writing"));
        }
        let mut data = self.data.borrow_mut();
        if self.mode == OpenMode::Append {
            self.pos = data.len() as u64;
        }
        let start = self.pos as usize;
        let end = start + bytes.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(bytes);
        self.pos = end as u64;
        Ok(bytes.len())
    }

    fn seek(&mut self, pos: u64) -> Result<(), FsError> {
        self.pos = pos.min(self.size());
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn size(&self) -> u64 {
        self.data.borrow().len() as u64
    }

    fn truncate(&mut self, len: u64) -> Result<(), FsError> {
        if !self.mode.can_write() {
            return Err(FsError::BadMode("writing"));
        }
        self.data.borrow_mut().truncate(len as usize);
        self.pos = self.pos.min(len);
        Ok(())
    }
}
