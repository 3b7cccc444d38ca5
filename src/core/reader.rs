//! Bounded reads from a [`FileHandle`].
//!
//! [`read_line`] stops at a CR LF pair, at a length limit or at end of file
//! and reports which one happened. [`read_chars`] ignores line breaks and
//! stops only at the limit or end of file. Both leave the cursor exactly
//! after the bytes they report as consumed, and both can run without a
//! destination buffer to skip data in constant memory.

use crate::core::error::FsError;
use crate::core::filesystem::FileHandle;

/// Outcome of one bounded read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineWindow {
    /// Bytes of content delivered (or counted, without a buffer).
    pub len: usize,
    /// A CR LF terminator was found and consumed.
    pub terminated: bool,
    /// The read stopped because of the length limit.
    pub truncated: bool,
    /// Cursor position after the read.
    pub cursor: u64,
}

impl LineWindow {
    fn empty(cursor: u64) -> Self {
        Self {
            len: 0,
            terminated: false,
            truncated: false,
            cursor,
        }
    }
}

/// Destination of a read: a caller buffer, or just a byte count.
enum Sink<'a> {
    Buffer(&'a mut Vec<u8>),
    Count(usize),
}

impl<'a> Sink<'a> {
    fn new(buf: Option<&'a mut Vec<u8>>) -> Self {
        match buf {
            Some(buf) => {
                buf.clear();
                Self::Buffer(buf)
            }
            None => Self::Count(0),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Buffer(buf) => buf.len(),
            Self::Count(n) => *n,
        }
    }

    fn push(&mut self, c: u8) {
        match self {
            Self::Buffer(buf) => buf.push(c),
            Self::Count(n) => *n += 1,
        }
    }

    fn cut(&mut self, len: usize) {
        match self {
            Self::Buffer(buf) => buf.truncate(len),
            Self::Count(n) => *n = (*n).min(len),
        }
    }
}

/// Read one CR LF terminated line.
///
/// - `max_len == 0` means no limit; only use it without a buffer.
/// - Up to `max_len + 2` bytes are buffered so a terminator right after the
///   limit is still recognized. When the slack runs out the content is cut
///   to `max_len` and the cursor is put back to `start + max_len`.
/// - The terminator is stripped unless `keep_terminator` is set; the cursor
///   always moves past it.
/// - At end of file without a terminator the line is reported as neither
///   terminated nor truncated, unless it is longer than `max_len`.
pub fn read_line(
    file: &mut dyn FileHandle,
    buf: Option<&mut Vec<u8>>,
    max_len: usize,
    keep_terminator: bool,
) -> Result<LineWindow, FsError> {
    let mut sink = Sink::new(buf);
    let start = file.position();
    if file.available() == 0 {
        return Ok(LineWindow::empty(start));
    }

    let limit = if max_len == 0 {
        usize::MAX
    } else {
        max_len.saturating_add(2)
    };
    // Tracked separately so the counting sink can detect CR LF too.
    let mut last = None;
    let mut terminated = false;
    let mut slack_exhausted = false;
    while file.available() > 0 {
        if sink.len() >= limit {
            slack_exhausted = true;
            break;
        }
        let Some(c) = file.read_byte()? else {
            break;
        };
        sink.push(c);
        if c == b'\n' && last == Some(b'\r') {
            terminated = true;
            break;
        }
        last = Some(c);
    }

    if slack_exhausted {
        sink.cut(max_len);
        file.seek(start + max_len as u64)?;
        log::trace!("read_line: cut at {} bytes from {}", max_len, start);
        return Ok(LineWindow {
            len: sink.len(),
            terminated: false,
            truncated: true,
            cursor: file.position(),
        });
    }

    if terminated {
        if !keep_terminator {
            sink.cut(sink.len() - 2);
        }
        return Ok(LineWindow {
            len: sink.len(),
            terminated: true,
            truncated: false,
            cursor: file.position(),
        });
    }

    // End of file before any terminator.
    let truncated = max_len != 0 && sink.len() > max_len;
    if truncated {
        sink.cut(max_len);
        file.seek(start + max_len as u64)?;
    }
    Ok(LineWindow {
        len: sink.len(),
        terminated: false,
        truncated,
        cursor: file.position(),
    })
}

/// Read up to `max_len` bytes regardless of line breaks (`0` = no limit).
pub fn read_chars(
    file: &mut dyn FileHandle,
    buf: Option<&mut Vec<u8>>,
    max_len: usize,
) -> Result<LineWindow, FsError> {
    let mut sink = Sink::new(buf);
    let mut truncated = false;
    while file.available() > 0 {
        if max_len != 0 && sink.len() >= max_len {
            truncated = true;
            break;
        }
        let Some(c) = file.read_byte()? else {
            break;
        };
        sink.push(c);
    }
    Ok(LineWindow {
        len: sink.len(),
        terminated: false,
        truncated,
        cursor: file.position(),
    })
}

/// Move past one whole line without keeping it.
pub fn skip_line(file: &mut dyn FileHandle) -> Result<LineWindow, FsError> {
    read_line(file, None, 0, false)
}
