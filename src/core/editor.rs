//! Removal of a line range from a file.
//!
//! Lines are CR LF delimited and counted from 0. Surviving lines are copied
//! byte for byte in pieces of at most `chunk` bytes (plus a terminator), so
//! memory use never depends on the length of a line.
//!
//! Two strategies are available, see [`EditStrategy`]:
//!
//! - `InPlace` compacts the file over itself. The write cursor trails the
//!   read cursor, so no unread byte is ever overwritten. A failure half way
//!   leaves a mix of old and new content.
//! - `Staged` streams survivors into `.<name>.lfse` next to the file and
//!   renames it over the original once complete.

use crate::config::{EditStrategy, STAGING_SUFFIX};
use crate::core::error::FsError;
use crate::core::filesystem::{FileHandle, FlashFs};
use crate::core::path::VirtualPath;
use crate::core::reader::{read_line, skip_line};
use crate::models::OpenMode;

/// Inclusive range of line indices. `last: None` runs to the end of file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    first: u64,
    last: Option<u64>,
}

impl LineRange {
    /// Returns `None` when `last < first`.
    pub fn new(first: u64, last: Option<u64>) -> Option<Self> {
        match last {
            Some(last) if last < first => None,
            _ => Some(Self { first, last }),
        }
    }

    pub fn single(line: u64) -> Self {
        Self {
            first: line,
            last: Some(line),
        }
    }

    pub fn contains(&self, index: u64) -> bool {
        index >= self.first && self.last.is_none_or(|last| index <= last)
    }

    /// How many of the lines `0..total` fall inside the range.
    fn covered(&self, total: u64) -> u64 {
        let end = match self.last {
            Some(last) => total.min(last + 1),
            None => total,
        };
        end.saturating_sub(self.first)
    }
}

/// Summary of a completed edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditReport {
    pub lines_removed: u64,
    pub new_len: u64,
}

/// Deletes line ranges with a fixed strategy and copy chunk size.
#[derive(Debug, Clone, Copy)]
pub struct LineEditor {
    strategy: EditStrategy,
    chunk: usize,
}

impl LineEditor {
    pub fn new(strategy: EditStrategy, chunk: usize) -> Self {
        Self {
            strategy,
            chunk: chunk.max(1),
        }
    }

    /// Remove the lines in `range` from the file at `path`.
    pub fn delete(
        &self,
        fs: &dyn FlashFs,
        path: &VirtualPath,
        range: LineRange,
    ) -> Result<EditReport, FsError> {
        let report = match self.strategy {
            EditStrategy::InPlace => self.delete_in_place(fs, path, range)?,
            EditStrategy::Staged => self.delete_staged(fs, path, range)?,
        };
        log::info!(
            "{:?}: removed {} line(s) from {}, {} bytes left",
            self.strategy,
            report.lines_removed,
            path,
            report.new_len
        );
        Ok(report)
    }

    fn delete_in_place(
        &self,
        fs: &dyn FlashFs,
        path: &VirtualPath,
        range: LineRange,
    ) -> Result<EditReport, FsError> {
        let mut file = fs.open(path, OpenMode::ReadWrite)?;

        // Lines before the range stay where they are.
        let mut index = 0;
        while index < range.first {
            let window = skip_line(file.as_mut())?;
            if window.len == 0 && !window.terminated {
                break;
            }
            index += 1;
        }
        let mut insert = file.position();
        log::debug!("in-place: range starts at byte {}", insert);

        let total = for_each_piece(file.as_mut(), index, self.chunk, |file, line, piece| {
            if range.contains(line) {
                return Ok(());
            }
            let resume = file.position();
            debug_assert!(insert + piece.len() as u64 <= resume);
            file.seek(insert)?;
            file.write_all(piece)?;
            insert += piece.len() as u64;
            file.seek(resume)?;
            log::trace!("in-place: line {} copied, write {} read {}", line, insert, resume);
            Ok(())
        })?;

        file.truncate(insert)?;
        file.seek(0)?;
        Ok(EditReport {
            lines_removed: range.covered(total),
            new_len: insert,
        })
    }

    fn delete_staged(
        &self,
        fs: &dyn FlashFs,
        path: &VirtualPath,
        range: LineRange,
    ) -> Result<EditReport, FsError> {
        let staging = staging_path(path)
            .ok_or_else(|| FsError::InvalidPath(path.to_string()))?;
        let mut source = fs.open(path, OpenMode::Read)?;

        let copied = fs.open(&staging, OpenMode::Write).and_then(|mut target| {
            let total = for_each_piece(source.as_mut(), 0, self.chunk, |_, line, piece| {
                if range.contains(line) {
                    Ok(())
                } else {
                    target.write_all(piece)
                }
            })?;
            Ok(EditReport {
                lines_removed: range.covered(total),
                new_len: target.position(),
            })
        });
        drop(source);

        let result = copied.and_then(|report| fs.rename(&staging, path).map(|_| report));
        if result.is_err() && fs.exists(&staging) {
            if let Err(err) = fs.remove(&staging) {
                log::warn!("could not remove staging file {}: {}", staging, err);
            }
        }
        result
    }
}

/// Sibling file used while staging an edit of `path`.
pub fn staging_path(path: &VirtualPath) -> Option<VirtualPath> {
    let name = path.file_name()?;
    Some(path.parent().join(&format!(".{}{}", name, STAGING_SUFFIX)))
}

/// Read the rest of `file` as line pieces of at most `chunk` bytes, each
/// keeping whatever part of the terminator it holds, and hand every piece to
/// `visit` together with its line index. Returns the number of lines seen.
fn for_each_piece(
    file: &mut dyn FileHandle,
    mut index: u64,
    chunk: usize,
    mut visit: impl FnMut(&mut dyn FileHandle, u64, &[u8]) -> Result<(), FsError>,
) -> Result<u64, FsError> {
    let mut piece = Vec::with_capacity(chunk + 2);
    loop {
        let window = read_line(file, Some(&mut piece), chunk, true)?;
        if window.len == 0 {
            return Ok(index);
        }
        visit(file, index, &piece)?;
        if !window.truncated {
            index += 1;
        }
    }
}
