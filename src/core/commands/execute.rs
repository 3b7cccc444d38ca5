//! Filesystem command handlers.
//!
//! Each handler validates its operands and flags completely before it asks
//! the driver to change anything.

use crate::core::editor::LineRange;
use crate::core::error::{FsError, PathRole, ShellError};
use crate::core::filesystem::FlashFs;
use crate::core::parser::Command;
use crate::core::path::VirtualPath;
use crate::models::{EntryInfo, OpenMode, Output, OutputLine};

use super::{COMMANDS, ShellContext, lookup};

/// Metadata of `path`, mapping a missing entry to [`ShellError::NotFound`].
pub(super) fn existing(fs: &dyn FlashFs, path: &VirtualPath) -> Result<EntryInfo, ShellError> {
    match fs.metadata(path) {
        Ok(info) => Ok(info),
        Err(FsError::NotFound(_) | FsError::NotADirectory(_)) => {
            Err(ShellError::NotFound(path.to_string()))
        }
        Err(err) => Err(ShellError::io("access", path.to_string(), err)),
    }
}

/// Fail unless `info` is a regular file.
pub(super) fn require_file(path: &VirtualPath, info: &EntryInfo) -> Result<(), ShellError> {
    if info.is_dir() {
        return Err(ShellError::WrongEntryKind {
            path: path.to_string(),
            found: PathRole::Directory,
        });
    }
    Ok(())
}

fn require_dir(path: &VirtualPath, info: &EntryInfo) -> Result<(), ShellError> {
    if info.is_file() {
        return Err(ShellError::WrongEntryKind {
            path: path.to_string(),
            found: PathRole::File,
        });
    }
    Ok(())
}

fn ensure_absent(fs: &dyn FlashFs, path: &VirtualPath) -> Result<(), ShellError> {
    if path.is_root() || fs.exists(path) {
        return Err(ShellError::AlreadyExists(path.to_string()));
    }
    Ok(())
}

pub(super) fn execute_help(
    _cmd: &Command,
    _ctx: &mut ShellContext,
    _fs: &dyn FlashFs,
    out: &mut dyn Output,
) -> Result<(), ShellError> {
    out.emit(OutputLine::text(
        "The following commands are available for execution:",
    ));
    for info in COMMANDS {
        out.emit(OutputLine::text(format!(
            "{} {}\t{}",
            info.name, info.usage, info.description
        )));
    }
    Ok(())
}

pub(super) fn execute_wipe(
    cmd: &Command,
    ctx: &mut ShellContext,
    fs: &dyn FlashFs,
    out: &mut dyn Output,
) -> Result<(), ShellError> {
    if !cmd.has_flag('f') {
        return Err(ShellError::Refused(
            "wipe: this deletes everything, repeat with -f to confirm",
        ));
    }
    fs.format()
        .map_err(|e| ShellError::io("format", "the filesystem", e))?;
    log::info!("filesystem formatted");
    ctx.change_dir(VirtualPath::root());
    out.emit(OutputLine::info("Filesystem formatted"));
    Ok(())
}

pub(super) fn execute_pwd(
    _cmd: &Command,
    ctx: &mut ShellContext,
    _fs: &dyn FlashFs,
    out: &mut dyn Output,
) -> Result<(), ShellError> {
    out.emit(OutputLine::text(ctx.cwd().to_string()));
    Ok(())
}

pub(super) fn execute_ls(
    cmd: &Command,
    ctx: &mut ShellContext,
    fs: &dyn FlashFs,
    out: &mut dyn Output,
) -> Result<(), ShellError> {
    let dir = match cmd.filename(0) {
        Some(user_path) => ctx.resolve(user_path, PathRole::Directory)?,
        None => ctx.cwd().clone(),
    };
    let info = existing(fs, &dir)?;
    require_dir(&dir, &info)?;
    let entries = fs
        .read_dir(&dir)
        .map_err(|e| ShellError::io("list", dir.to_string(), e))?;
    for entry in &entries {
        out.emit(OutputLine::list_entry(entry));
    }
    Ok(())
}

pub(super) fn execute_cd(
    cmd: &Command,
    ctx: &mut ShellContext,
    fs: &dyn FlashFs,
    _out: &mut dyn Output,
) -> Result<(), ShellError> {
    let (_, dir) = ctx.operand(cmd, 0, PathRole::Directory)?;
    let info = existing(fs, &dir)?;
    require_dir(&dir, &info)?;
    ctx.change_dir(dir);
    Ok(())
}

pub(super) fn execute_mkdir(
    cmd: &Command,
    ctx: &mut ShellContext,
    fs: &dyn FlashFs,
    _out: &mut dyn Output,
) -> Result<(), ShellError> {
    let (_, dir) = ctx.operand(cmd, 0, PathRole::Directory)?;
    ensure_absent(fs, &dir)?;
    fs.mkdir(&dir)
        .map_err(|e| ShellError::io("create directory", dir.to_string(), e))?;
    log::info!("created directory {}", dir);
    Ok(())
}

pub(super) fn execute_touch(
    cmd: &Command,
    ctx: &mut ShellContext,
    fs: &dyn FlashFs,
    _out: &mut dyn Output,
) -> Result<(), ShellError> {
    let (_, file) = ctx.operand(cmd, 0, PathRole::File)?;
    ensure_absent(fs, &file)?;
    fs.open(&file, OpenMode::Write)
        .map_err(|e| ShellError::io("create file", file.to_string(), e))?;
    log::info!("created file {}", file);
    Ok(())
}

pub(super) fn execute_mv(
    cmd: &Command,
    ctx: &mut ShellContext,
    fs: &dyn FlashFs,
    _out: &mut dyn Output,
) -> Result<(), ShellError> {
    if cmd.count_filenames() < 2 {
        return Err(ShellError::MissingOperand);
    }
    let (src_index, src) = ctx.operand(cmd, 0, PathRole::File)?;
    let (_, dst) = ctx.operand(cmd, src_index + 1, PathRole::File)?;
    existing(fs, &src)?;
    ensure_absent(fs, &dst)?;
    fs.rename(&src, &dst)
        .map_err(|e| ShellError::io("move", format!("from {} to {}", src, dst), e))?;
    log::info!("moved {} to {}", src, dst);
    Ok(())
}

pub(super) fn execute_cp(
    cmd: &Command,
    ctx: &mut ShellContext,
    fs: &dyn FlashFs,
    out: &mut dyn Output,
) -> Result<(), ShellError> {
    if cmd.count_filenames() < 2 {
        return Err(ShellError::MissingOperand);
    }
    let (src_index, src) = ctx.operand(cmd, 0, PathRole::File)?;
    let (_, dst) = ctx.operand(cmd, src_index + 1, PathRole::File)?;
    let recursive = cmd.has_flag('r');
    let force = cmd.has_flag('f');

    let src_info = existing(fs, &src)?;
    if recursive {
        require_dir(&src, &src_info)?;
        out.emit(OutputLine::info("Not implemented yet!"));
        return Ok(());
    }
    require_file(&src, &src_info)?;

    if dst.is_root() {
        return Err(ShellError::AlreadyExists(dst.to_string()));
    }
    if let Ok(dst_info) = fs.metadata(&dst) {
        require_file(&dst, &dst_info)?;
        if !force {
            return Err(ShellError::AlreadyExists(dst.to_string()));
        }
        if src == dst {
            return Err(ShellError::Refused(
                "cp: source and destination are the same file",
            ));
        }
    }

    let copied = copy_file(fs, &src, &dst, ctx.config().file_buffer_len)
        .map_err(|e| ShellError::io("copy", format!("from {} to {}", src, dst), e))?;
    log::info!("copied {} bytes from {} to {}", copied, src, dst);
    Ok(())
}

/// Stream `src` into `dst` through a buffer of `chunk` bytes.
fn copy_file(
    fs: &dyn FlashFs,
    src: &VirtualPath,
    dst: &VirtualPath,
    chunk: usize,
) -> Result<u64, FsError> {
    let mut reader = fs.open(src, OpenMode::Read)?;
    let mut writer = fs.open(dst, OpenMode::Write)?;
    let mut buf = vec![0u8; chunk.max(1)];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Ok(total);
        }
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
}

pub(super) fn execute_rm(
    cmd: &Command,
    ctx: &mut ShellContext,
    fs: &dyn FlashFs,
    out: &mut dyn Output,
) -> Result<(), ShellError> {
    let (_, path) = ctx.operand(cmd, 0, PathRole::File)?;
    let recursive = cmd.has_flag('r');
    let first = cmd.numeric_flag('f');
    let last = cmd.numeric_flag('l');

    if first.is_none() && last.is_none() {
        let info = existing(fs, &path)?;
        if info.is_dir() {
            if !recursive {
                return Err(ShellError::WrongEntryKind {
                    path: path.to_string(),
                    found: PathRole::Directory,
                });
            }
            if path.is_root() {
                return Err(ShellError::Refused("rm: cannot remove the root directory"));
            }
            fs.rmdir(&path)
                .map_err(|e| ShellError::io("remove directory", path.to_string(), e))?;
        } else {
            if recursive {
                return Err(ShellError::WrongEntryKind {
                    path: path.to_string(),
                    found: PathRole::File,
                });
            }
            fs.remove(&path)
                .map_err(|e| ShellError::io("remove file", path.to_string(), e))?;
        }
        log::info!("removed {}", path);
        return Ok(());
    }

    if recursive {
        return Err(ShellError::IncompatibleFlags(
            "rm: flags -f/-l and -r are incompatible",
        ));
    }
    let range = line_range(first, last)?;
    let info = existing(fs, &path)?;
    require_file(&path, &info)?;

    let report = ctx
        .editor()
        .delete(fs, &path, range)
        .map_err(|e| ShellError::io("remove lines from", path.to_string(), e))?;
    out.emit(OutputLine::info(format!(
        "{} line(s) removed from {}",
        report.lines_removed, path
    )));
    Ok(())
}

/// Build the line range for `rm` from its `-f` and `-l` values.
fn line_range(first: Option<i64>, last: Option<i64>) -> Result<LineRange, ShellError> {
    let index = |value: i64| {
        u64::try_from(value)
            .map_err(|_| ShellError::InvalidRange("rm: line index cannot be negative".into()))
    };
    match (first, last) {
        (None, Some(line)) => Ok(LineRange::single(index(line)?)),
        (first, last) => {
            let first = index(first.unwrap_or(0))?;
            let last = last.map(index).transpose()?;
            LineRange::new(first, last)
                .ok_or_else(|| ShellError::InvalidRange("rm: -l should be >= than -f".into()))
        }
    }
}

pub(super) fn execute_write(
    cmd: &Command,
    ctx: &mut ShellContext,
    fs: &dyn FlashFs,
    _out: &mut dyn Output,
) -> Result<(), ShellError> {
    let (_, file) = ctx.operand(cmd, 0, PathRole::File)?;
    if cmd.quoted_strings().next().is_none() {
        return Err(ShellError::MissingData {
            what: "Missing data to write",
        });
    }
    if file.is_root() {
        return Err(ShellError::MalformedPath {
            path: file.to_string(),
            role: PathRole::File,
        });
    }
    if let Ok(info) = fs.metadata(&file) {
        require_file(&file, &info)?;
    }

    let mode = if cmd.has_flag('a') {
        OpenMode::Append
    } else {
        OpenMode::Write
    };
    let newline = !cmd.has_flag('n');
    let written = write_strings(fs, &file, mode, cmd.quoted_strings(), newline)
        .map_err(|e| ShellError::io("write", file.to_string(), e))?;
    log::info!("wrote {} bytes to {} ({})", written, file, mode);
    Ok(())
}

fn write_strings<'a>(
    fs: &dyn FlashFs,
    file: &VirtualPath,
    mode: OpenMode,
    strings: impl Iterator<Item = &'a [u8]>,
    newline: bool,
) -> Result<u64, FsError> {
    let mut handle = fs.open(file, mode)?;
    let mut total = 0u64;
    for data in strings {
        handle.write_all(data)?;
        total += data.len() as u64;
        if newline {
            handle.write_all(b"\r\n")?;
            total += 2;
        }
    }
    Ok(total)
}

pub(super) fn execute_man(
    cmd: &Command,
    _ctx: &mut ShellContext,
    _fs: &dyn FlashFs,
    out: &mut dyn Output,
) -> Result<(), ShellError> {
    let name = cmd.filename(0).ok_or(ShellError::MissingOperand)?;
    let name = name.to_ascii_lowercase();
    let info = lookup(&name).ok_or_else(|| ShellError::UnknownCommand(name.clone()))?;
    out.emit(OutputLine::text(format!("{} {}", info.name, info.usage)));
    out.emit(OutputLine::info(format!(
        "man: the manual for {} is not implemented yet",
        info.name
    )));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::{run, run_lines};
    use super::*;
    use crate::config::{EditStrategy, ShellConfig};
    use crate::core::memfs::MemoryFs;

    fn p(s: &str) -> VirtualPath {
        VirtualPath::parse(s)
    }

    #[test]
    fn test_help_lists_every_command() {
        let fs = MemoryFs::new();
        let out = run(&fs, &["help"]);
        assert_eq!(out[0], "The following commands are available for execution:");
        assert_eq!(out.len(), COMMANDS.len() + 1);
        assert_eq!(out[1], "cat [filepath] [-n] [-b] [-p] [-cN] [-fN] [-lN]\tprint content of the file");
        assert!(out.contains(&"pwd \tshow current working directory".to_string()));
    }

    #[test]
    fn test_mkdir_twice() {
        let fs = MemoryFs::new();
        let out = run(&fs, &["mkdir foo", "mkdir foo"]);
        assert_eq!(out, vec!["/foo already exists"]);
        assert_eq!(fs.read_dir(&VirtualPath::root()).unwrap().len(), 1);
    }

    #[test]
    fn test_mkdir_missing_parent() {
        let fs = MemoryFs::new();
        let out = run(&fs, &["mkdir a/b"]);
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("Failed to create directory /a/b"));
    }

    #[test]
    fn test_missing_operand() {
        let fs = MemoryFs::new();
        for line in ["cd", "mkdir", "touch", "rm", "cat", "man", "mv a", "cp a"] {
            assert_eq!(run(&fs, &[line]), vec!["Missing operand"], "{}", line);
        }
    }

    #[test]
    fn test_cd_and_pwd() {
        let fs = MemoryFs::new();
        fs.mkdir(&p("/logs")).unwrap();
        fs.insert_file("/boot.cfg", b"").unwrap();
        let out = run(
            &fs,
            &["cd logs", "pwd", "cd ..", "pwd", "cd boot.cfg", "cd nowhere", "pwd"],
        );
        assert_eq!(
            out,
            vec![
                "/logs",
                "/",
                "/boot.cfg is a file",
                "/nowhere doesn't exist",
                "/"
            ]
        );
    }

    #[test]
    fn test_ls_rows() {
        let fs = MemoryFs::new();
        fs.insert_file("/b.txt", b"1234").unwrap();
        fs.mkdir(&p("/a")).unwrap();
        let out = run(&fs, &["ls", "ls b.txt", "ls nope"]);
        assert_eq!(
            out,
            vec![
                "d 0     2         a",
                "f 4     1         b.txt",
                "/b.txt is a file",
                "/nope doesn't exist",
            ]
        );
    }

    #[test]
    fn test_touch_rm_cat() {
        let fs = MemoryFs::new();
        let out = run(&fs, &["touch a.txt", "touch a.txt", "rm a.txt", "cat a.txt"]);
        assert_eq!(out, vec!["/a.txt already exists", "/a.txt doesn't exist"]);
        assert!(!fs.exists(&p("/a.txt")));
    }

    #[test]
    fn test_mv() {
        let fs = MemoryFs::new();
        fs.insert_file("/a", b"data").unwrap();
        fs.insert_file("/b", b"keep").unwrap();
        let out = run(&fs, &["mv a b", "mv x y", "mv a c"]);
        assert_eq!(out, vec!["/b already exists", "/x doesn't exist"]);
        assert_eq!(fs.contents("/c").unwrap(), b"data");
        assert_eq!(fs.contents("/b").unwrap(), b"keep");
    }

    #[test]
    fn test_cp_rules() {
        let fs = MemoryFs::new();
        let long: Vec<u8> = (0..=255u8).cycle().take(300).collect();
        fs.insert_file("/src.bin", &long).unwrap();
        fs.insert_file("/old", b"old").unwrap();
        fs.mkdir(&p("/dir")).unwrap();

        let out = run(
            &fs,
            &[
                "cp src.bin copy.bin",
                "cp src.bin old",
                "cp -f src.bin old",
                "cp src.bin dir",
                "cp -r dir other",
                "cp -r src.bin other",
                "cp dir other",
                "cp -f old old",
            ],
        );
        assert_eq!(
            out,
            vec![
                "/old already exists",
                "/dir is a directory",
                "Not implemented yet!",
                "/src.bin is a file",
                "/dir is a directory",
                "cp: source and destination are the same file",
            ]
        );
        assert_eq!(fs.contents("/copy.bin").unwrap(), long);
        assert_eq!(fs.contents("/old").unwrap(), long);
        assert!(!fs.exists(&p("/other")));
    }

    #[test]
    fn test_rm_files_and_dirs() {
        let fs = MemoryFs::new();
        fs.mkdir(&p("/d")).unwrap();
        fs.insert_file("/d/f", b"x").unwrap();
        let out = run(&fs, &["rm d", "rm -r d/f", "rm -r d", "rm d/f", "rm -r d"]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], "/d is a directory");
        assert_eq!(out[1], "/d/f is a file");
        assert!(out[2].starts_with("Failed to remove directory /d"));
        assert!(!fs.exists(&p("/d")));
    }

    #[test]
    fn test_rm_line_ranges() {
        for strategy in [EditStrategy::Staged, EditStrategy::InPlace] {
            let fs = MemoryFs::new();
            fs.insert_file("/lines", b"L0\r\nL1\r\nL2\r\nL3\r\nL4\r\n").unwrap();
            let mut ctx = ShellContext::new(ShellConfig {
                line_edit: strategy,
                ..ShellConfig::default()
            });
            let out = run_lines(&fs, &mut ctx, &["rm -l1 lines", "rm -f1 -l2 lines"]);
            assert_eq!(
                out,
                vec![
                    "1 line(s) removed from /lines",
                    "2 line(s) removed from /lines"
                ]
            );
            assert_eq!(fs.contents("/lines").unwrap(), b"L0\r\nL4\r\n");
            let out = run_lines(&fs, &mut ctx, &["rm -f1 lines"]);
            assert_eq!(out, vec!["1 line(s) removed from /lines"]);
            assert_eq!(fs.contents("/lines").unwrap(), b"L0\r\n");
        }
    }

    #[test]
    fn test_rm_rejects_bad_ranges_before_editing() {
        let fs = MemoryFs::new();
        let content = b"L0\r\nL1\r\nL2\r\n";
        fs.insert_file("/lines", content).unwrap();
        fs.mkdir(&p("/dir")).unwrap();
        let out = run(
            &fs,
            &[
                "rm -f2 -l1 lines",
                "rm -l-1 lines",
                "rm -r -l1 lines",
                "rm -l0 dir",
                "rm -l0 missing",
            ],
        );
        assert_eq!(
            out,
            vec![
                "rm: -l should be >= than -f",
                "rm: line index cannot be negative",
                "rm: flags -f/-l and -r are incompatible",
                "/dir is a directory",
                "/missing doesn't exist",
            ]
        );
        assert_eq!(fs.contents("/lines").unwrap(), content);
    }

    #[test]
    fn test_write_and_append() {
        let fs = MemoryFs::new();
        let out = run(
            &fs,
            &[
                r#"write "one" "two" out.txt"#,
                r#"tee -a -n "three" out.txt"#,
            ],
        );
        assert!(out.is_empty());
        assert_eq!(fs.contents("/out.txt").unwrap(), b"one\r\ntwo\r\nthree");

        run(&fs, &[r#"tee "fresh" out.txt"#]);
        assert_eq!(fs.contents("/out.txt").unwrap(), b"fresh\r\n");
    }

    #[test]
    fn test_write_checks_before_touching_file() {
        let fs = MemoryFs::new();
        fs.insert_file("/keep.txt", b"precious").unwrap();
        fs.mkdir(&p("/dir")).unwrap();
        let out = run(
            &fs,
            &["write keep.txt", r#"write "x""#, r#"write "x" dir"#],
        );
        assert_eq!(
            out,
            vec!["Missing data to write", "Missing operand", "/dir is a directory"]
        );
        assert_eq!(fs.contents("/keep.txt").unwrap(), b"precious");
    }

    #[test]
    fn test_write_empty_string() {
        let fs = MemoryFs::new();
        run(&fs, &[r#"write "" blank"#]);
        assert_eq!(fs.contents("/blank").unwrap(), b"\r\n");
    }

    #[test]
    fn test_man() {
        let fs = MemoryFs::new();
        let out = run(&fs, &["man ls", "man frob"]);
        assert_eq!(
            out,
            vec![
                "ls [dirpath]",
                "man: the manual for ls is not implemented yet",
                "Error: command frob not found!",
            ]
        );
    }

    #[test]
    fn test_wipe() {
        let fs = MemoryFs::new();
        fs.mkdir(&p("/d")).unwrap();
        let mut ctx = ShellContext::new(ShellConfig::default());
        let out = run_lines(&fs, &mut ctx, &["cd d", "wipe"]);
        assert_eq!(
            out,
            vec!["wipe: this deletes everything, repeat with -f to confirm"]
        );
        assert!(fs.exists(&p("/d")));
        let out = run_lines(&fs, &mut ctx, &["wipe -f", "pwd"]);
        assert_eq!(out, vec!["Filesystem formatted", "/"]);
        assert!(fs.read_dir(&VirtualPath::root()).unwrap().is_empty());
    }
}
