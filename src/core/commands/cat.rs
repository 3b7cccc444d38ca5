//! `cat`: windowed file display.
//!
//! Three views share one set of flags:
//! - text (default): lines `-f..-l`, each cut at `-c` columns
//! - bytes (`-b`): the same lines as hex, terminator included
//! - plain bytes (`-bp`): byte offsets `-f..-l` as hex rows of `-c` bytes
//!
//! `-l` is exclusive and `-l0` (or no `-l`) leaves the window open. Equal
//! `-f` and `-l` select that single line.
//!
//! `...>>` marks skipped leading data, ` ->...` a cut line and `<<...` data
//! left after the window.

use std::fmt::Write as _;

use crate::config::{ShellConfig, cat};
use crate::core::error::{FsError, PathRole, ShellError};
use crate::core::filesystem::{FileHandle, FlashFs};
use crate::core::parser::Command;
use crate::core::reader::{read_chars, read_line, skip_line};
use crate::models::{OpenMode, Output, OutputLine};

use super::ShellContext;
use super::execute::{existing, require_file};

const SKIPPED_MARKER: &str = "...>>";
const CUT_MARKER: &str = " ->...";
const REMAINING_MARKER: &str = "<<...";

/// Display options gathered from the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CatView {
    numbers: bool,
    bytes: bool,
    plain: bool,
    width: usize,
    first: u64,
    /// Exclusive end of the window.
    end: Option<u64>,
}

impl CatView {
    /// Read the flags, printing a notice for each one that is ignored.
    fn from_command(
        cmd: &Command,
        config: &ShellConfig,
        out: &mut dyn Output,
    ) -> Result<Self, ShellError> {
        let mut numbers = cmd.has_flag('n');
        let bytes = cmd.has_flag('b');
        let mut plain = cmd.has_flag('p');

        let width = match cmd.numeric_flag('c') {
            None if bytes => config.cat_hex_width,
            None => config.cat_text_width,
            Some(0) => return Err(ShellError::InvalidRange("cat: -c cannot be 0".into())),
            Some(n) => {
                let width = usize::try_from(n)
                    .map_err(|_| ShellError::InvalidRange("cat: -c cannot be negative".into()))?;
                if width > cat::MAX_WIDTH {
                    return Err(ShellError::InvalidRange(format!(
                        "cat: -c cannot be greater than {}",
                        cat::MAX_WIDTH
                    )));
                }
                width
            }
        };

        if plain && !bytes {
            out.emit(OutputLine::info("cat: -p ignored because -b is missing"));
            plain = false;
        }
        if plain && numbers {
            out.emit(OutputLine::info("cat: -n ignored because -bp are present"));
            numbers = false;
        }

        let index = |value: i64| {
            u64::try_from(value)
                .map_err(|_| ShellError::InvalidRange("cat: -f and -l cannot be negative".into()))
        };
        let first = index(cmd.numeric_flag('f').unwrap_or(0))?;
        let mut end = index(cmd.numeric_flag('l').unwrap_or(0))?;
        if cmd.has_flag('f') && cmd.has_flag('l') {
            if first > end {
                return Err(ShellError::InvalidRange(
                    "cat: -l cannot be smaller than -f".into(),
                ));
            }
            if first == end {
                end += 1;
            }
        }

        Ok(Self {
            numbers,
            bytes,
            plain,
            width,
            first,
            end: (end > 0).then_some(end),
        })
    }
}

pub(super) fn execute_cat(
    cmd: &Command,
    ctx: &mut ShellContext,
    fs: &dyn FlashFs,
    out: &mut dyn Output,
) -> Result<(), ShellError> {
    let (_, path) = ctx.operand(cmd, 0, PathRole::File)?;
    let info = existing(fs, &path)?;
    require_file(&path, &info)?;
    let view = CatView::from_command(cmd, ctx.config(), out)?;
    log::debug!("cat {}: {:?}", path, view);

    let mut file = fs
        .open(&path, OpenMode::Read)
        .map_err(|e| ShellError::io("open", path.to_string(), e))?;
    let shown = if view.plain {
        render_plain(file.as_mut(), &view, out)
    } else {
        render_lines(file.as_mut(), &view, out)
    };
    shown.map_err(|e| ShellError::io("read", path.to_string(), e))
}

fn render_lines(
    file: &mut dyn FileHandle,
    view: &CatView,
    out: &mut dyn Output,
) -> Result<(), FsError> {
    let mut buf = Vec::with_capacity(view.width + 2);
    let mut index = 0u64;
    if view.first > 0 && file.available() > 0 {
        out.emit(OutputLine::text(SKIPPED_MARKER));
    }
    while file.available() > 0 && view.end.is_none_or(|end| index < end) {
        if index < view.first {
            skip_line(file)?;
            index += 1;
            continue;
        }

        let window = read_line(file, Some(&mut buf), view.width, view.bytes)?;
        let mut row = String::new();
        if view.numbers {
            let _ = write!(row, "{}\t", index);
        }
        if view.bytes {
            for byte in buf.iter().take(view.width) {
                let _ = write!(row, "{:02x} ", byte);
            }
        } else {
            row.push_str(&String::from_utf8_lossy(&buf));
        }
        if (!window.terminated && file.available() > 0) || buf.len() > view.width {
            row.push_str(CUT_MARKER);
        }
        if !window.terminated {
            skip_line(file)?;
        }
        index += 1;
        out.emit(OutputLine::text(row));
    }
    if file.available() > 0 {
        out.emit(OutputLine::text(REMAINING_MARKER));
    }
    Ok(())
}

fn render_plain(
    file: &mut dyn FileHandle,
    view: &CatView,
    out: &mut dyn Output,
) -> Result<(), FsError> {
    let width = view.width as u64;
    if view.first > 0 {
        file.seek(view.first)?;
        if file.available() > 0 {
            out.emit(OutputLine::text(SKIPPED_MARKER));
        }
    }

    let mut cursor = file.position();
    let mut buf = Vec::with_capacity(view.width);
    let mut row = String::new();
    loop {
        let want = match view.end {
            Some(end) if cursor >= end => break,
            Some(end) => width.min(end - cursor),
            None => width,
        };
        let window = read_chars(file, Some(&mut buf), want as usize)?;
        if window.len == 0 {
            break;
        }
        for byte in &buf {
            if !row.is_empty() {
                row.push(' ');
            }
            let _ = write!(row, "{:02x}", byte);
            cursor += 1;
            // Rows end on absolute multiples of the width.
            if cursor % width == 0 {
                out.emit(OutputLine::text(std::mem::take(&mut row)));
            }
        }
    }
    if !row.is_empty() {
        out.emit(OutputLine::text(row));
    }
    if file.available() > 0 {
        out.emit(OutputLine::text(REMAINING_MARKER));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::run;
    use crate::core::filesystem::FlashFs;
    use crate::core::memfs::MemoryFs;
    use crate::core::path::VirtualPath;

    fn fs_with(content: &[u8]) -> MemoryFs {
        let fs = MemoryFs::new();
        fs.insert_file("/f.txt", content).unwrap();
        fs
    }

    #[test]
    fn test_whole_file() {
        let fs = fs_with(b"hello\r\nworld\r\n");
        assert_eq!(run(&fs, &["cat f.txt"]), vec!["hello", "world"]);
        assert_eq!(run(&fs, &["cat -n f.txt"]), vec!["0\thello", "1\tworld"]);
    }

    #[test]
    fn test_line_window() {
        let fs = fs_with(b"L0\r\nL1\r\nL2\r\nL3\r\nL4\r\n");
        assert_eq!(
            run(&fs, &["cat -f1 -l3 f.txt"]),
            vec!["...>>", "L1", "L2", "<<..."]
        );
        assert_eq!(run(&fs, &["cat -l2 f.txt"]), vec!["L0", "L1", "<<..."]);
        assert_eq!(run(&fs, &["cat -f3 -n f.txt"]), vec!["...>>", "3\tL3", "4\tL4"]);
    }

    #[test]
    fn test_window_edges() {
        let fs = fs_with(b"L0\r\nL1\r\nL2\r\n");
        assert_eq!(run(&fs, &["cat -l0 f.txt"]), vec!["L0", "L1", "L2"]);
        assert_eq!(run(&fs, &["cat -f0 -l0 f.txt"]), vec!["L0", "<<..."]);
        assert_eq!(
            run(&fs, &["cat -f1 -l1 f.txt"]),
            vec!["...>>", "L1", "<<..."]
        );
        assert_eq!(run(&fs, &["cat -f2 -l0 f.txt"]), vec!["cat: -l cannot be smaller than -f"]);
    }

    #[test]
    fn test_cut_lines() {
        let fs = fs_with(b"abcdefgh\r\nxy\r\ntail-without-end");
        assert_eq!(
            run(&fs, &["cat -c4 f.txt"]),
            vec!["abcd ->...", "xy", "tail ->..."]
        );
    }

    #[test]
    fn test_last_line_at_width_is_not_cut() {
        let fs = fs_with(b"abcd");
        assert_eq!(run(&fs, &["cat -c4 f.txt"]), vec!["abcd"]);
    }

    #[test]
    fn test_byte_view() {
        let fs = fs_with(b"ab\r\nc");
        assert_eq!(run(&fs, &["cat -b f.txt"]), vec!["61 62 0d 0a ", "63 "]);
        assert_eq!(
            run(&fs, &["cat -b -c2 f.txt"]),
            vec!["61 62  ->...", "63 "]
        );
    }

    #[test]
    fn test_plain_byte_rows_are_aligned() {
        let content: Vec<u8> = (0..20u8).collect();
        let fs = fs_with(&content);
        assert_eq!(
            run(&fs, &["cat -bp -c8 -f3 -l18 f.txt"]),
            vec![
                "...>>",
                "03 04 05 06 07",
                "08 09 0a 0b 0c 0d 0e 0f",
                "10 11",
                "<<...",
            ]
        );
        assert_eq!(
            run(&fs, &["cat -bp -c10 f.txt"]),
            vec![
                "00 01 02 03 04 05 06 07 08 09",
                "0a 0b 0c 0d 0e 0f 10 11 12 13",
            ]
        );
    }

    #[test]
    fn test_plain_window() {
        let content: Vec<u8> = (0..20u8).collect();
        let fs = fs_with(&content);
        assert_eq!(
            run(&fs, &["cat -bp -f4 -l4 f.txt"]),
            vec!["...>>", "04", "<<..."]
        );
        assert!(run(&fs, &["cat -bp -f30 f.txt"]).is_empty());
        assert!(run(&fs_with(b""), &["cat -bp -f2 f.txt"]).is_empty());
    }

    #[test]
    fn test_huge_width_is_rejected() {
        let fs = fs_with(b"x\r\n");
        assert_eq!(
            run(
                &fs,
                &[
                    "cat -c99999999999999999999 f.txt",
                    "cat -bp -c9223372036854775807 f.txt",
                    "pwd",
                ]
            ),
            vec![
                "cat: -c cannot be greater than 65535",
                "cat: -c cannot be greater than 65535",
                "/",
            ]
        );
        assert_eq!(run(&fs, &["cat -c65535 f.txt"]), vec!["x"]);
    }

    #[test]
    fn test_flag_notices() {
        let fs = fs_with(b"x\r\n");
        assert_eq!(
            run(&fs, &["cat -p f.txt"]),
            vec!["cat: -p ignored because -b is missing", "x"]
        );
        assert_eq!(
            run(&fs, &["cat -bpn f.txt"]),
            vec!["cat: -n ignored because -bp are present", "78 0d 0a"]
        );
    }

    #[test]
    fn test_flag_errors() {
        let fs = fs_with(b"x\r\n");
        fs.mkdir(&VirtualPath::parse("/d")).unwrap();
        assert_eq!(
            run(
                &fs,
                &["cat -c0 f.txt", "cat -f3 -l1 f.txt", "cat -f-2 f.txt", "cat d"]
            ),
            vec![
                "cat: -c cannot be 0",
                "cat: -l cannot be smaller than -f",
                "cat: -f and -l cannot be negative",
                "/d is a directory",
            ]
        );
    }

    #[test]
    fn test_empty_file() {
        let fs = fs_with(b"");
        assert!(run(&fs, &["cat f.txt", "cat -f2 f.txt"]).is_empty());
    }
}
