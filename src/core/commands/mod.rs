//! Command dispatch and execution.
//!
//! This module provides:
//! - [`COMMANDS`], the static table mapping names to handlers
//! - [`ShellContext`], the working directory and settings handlers run in
//! - [`execute_command`], which looks up and runs one parsed [`Command`]
//!
//! Handlers report problems as [`ShellError`]; the dispatcher turns them
//! into error lines and the session carries on.

mod cat;
mod execute;

use crate::config::ShellConfig;
use crate::core::editor::LineEditor;
use crate::core::error::{PathRole, ShellError};
use crate::core::filesystem::FlashFs;
use crate::core::parser::Command;
use crate::core::path::{VirtualPath, is_valid_path};
use crate::models::{Output, OutputLine};

/// Signature shared by all command handlers.
pub type Handler =
    fn(&Command, &mut ShellContext, &dyn FlashFs, &mut dyn Output) -> Result<(), ShellError>;

/// One entry of the dispatch table.
pub struct CommandInfo {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub handler: Handler,
}

/// All commands, sorted by name.
pub static COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        name: "cat",
        usage: "[filepath] [-n] [-b] [-p] [-cN] [-fN] [-lN]",
        description: "print content of the file",
        handler: cat::execute_cat,
    },
    CommandInfo {
        name: "cd",
        usage: "[dirpath]",
        description: "change current working directory",
        handler: execute::execute_cd,
    },
    CommandInfo {
        name: "cp",
        usage: "[path_src] [path_dst] [-r] [-f]",
        description: "copy file/directory",
        handler: execute::execute_cp,
    },
    CommandInfo {
        name: "help",
        usage: "",
        description: "show help message",
        handler: execute::execute_help,
    },
    CommandInfo {
        name: "ls",
        usage: "[dirpath]",
        description: "list children files/directories",
        handler: execute::execute_ls,
    },
    CommandInfo {
        name: "man",
        usage: "[command]",
        description: "show manual for command",
        handler: execute::execute_man,
    },
    CommandInfo {
        name: "mkdir",
        usage: "[dirname]",
        description: "create directory (not recursive)",
        handler: execute::execute_mkdir,
    },
    CommandInfo {
        name: "mv",
        usage: "[path_from] [path_to]",
        description: "move and/or rename file/directory",
        handler: execute::execute_mv,
    },
    CommandInfo {
        name: "pwd",
        usage: "",
        description: "show current working directory",
        handler: execute::execute_pwd,
    },
    CommandInfo {
        name: "rm",
        usage: "[path] [-r] [-fN] [-lN]",
        description: "remove file/directory or a range of lines",
        handler: execute::execute_rm,
    },
    CommandInfo {
        name: "tee",
        usage: "[\"content_args\"] [filepath] [-a] [-n]",
        description: "(over)write arguments' content to file",
        handler: execute::execute_write,
    },
    CommandInfo {
        name: "touch",
        usage: "[filepath]",
        description: "create empty file",
        handler: execute::execute_touch,
    },
    CommandInfo {
        name: "wipe",
        usage: "-f",
        description: "delete all data from the filesystem",
        handler: execute::execute_wipe,
    },
    CommandInfo {
        name: "write",
        usage: "[\"content_args\"] [filepath] [-a] [-n]",
        description: "(over)write arguments' content to file",
        handler: execute::execute_write,
    },
];

/// Find a command by its lower-case name.
pub fn lookup(name: &str) -> Option<&'static CommandInfo> {
    COMMANDS
        .binary_search_by(|info| info.name.cmp(name))
        .ok()
        .map(|i| &COMMANDS[i])
}

// =============================================================================
// Shell Context
// =============================================================================

/// State shared by consecutive commands of one session.
///
/// The working directory changes only through [`ShellContext::change_dir`].
#[derive(Debug, Clone)]
pub struct ShellContext {
    cwd: VirtualPath,
    config: ShellConfig,
}

impl ShellContext {
    pub fn new(config: ShellConfig) -> Self {
        Self {
            cwd: VirtualPath::root(),
            config,
        }
    }

    pub fn cwd(&self) -> &VirtualPath {
        &self.cwd
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn change_dir(&mut self, path: VirtualPath) {
        log::debug!("cwd {} -> {}", self.cwd, path);
        self.cwd = path;
    }

    pub fn editor(&self) -> LineEditor {
        LineEditor::new(self.config.line_edit, self.config.file_buffer_len)
    }

    /// Resolve a user path against the working directory, rejecting text
    /// outside the path alphabet.
    pub fn resolve(&self, user_path: &str, role: PathRole) -> Result<VirtualPath, ShellError> {
        if !is_valid_path(user_path) {
            return Err(ShellError::MalformedPath {
                path: user_path.to_string(),
                role,
            });
        }
        Ok(self.cwd.resolve(user_path))
    }

    /// Resolve the first filename argument at or after `start`. Returns the
    /// argument position with the path.
    pub fn operand(
        &self,
        cmd: &Command,
        start: usize,
        role: PathRole,
    ) -> Result<(usize, VirtualPath), ShellError> {
        let index = cmd.filename_index(start).ok_or(ShellError::MissingOperand)?;
        let text = cmd.args[index].as_filename().unwrap_or_default();
        Ok((index, self.resolve(text, role)?))
    }
}

// =============================================================================
// Execution
// =============================================================================

/// Run one parsed command, printing any error it reports.
pub fn execute_command(
    cmd: &Command,
    ctx: &mut ShellContext,
    fs: &dyn FlashFs,
    out: &mut dyn Output,
) {
    let result = match lookup(&cmd.name) {
        Some(info) => (info.handler)(cmd, ctx, fs, out),
        None => Err(ShellError::UnknownCommand(cmd.name.clone())),
    };
    if let Err(err) = result {
        log::debug!("{}: {:?}", cmd.name, err);
        out.emit(OutputLine::error(err.to_string()));
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::memfs::MemoryFs;

    /// Run `lines` in order on `fs` and return everything printed.
    pub(crate) fn run_lines(fs: &MemoryFs, ctx: &mut ShellContext, lines: &[&str]) -> Vec<String> {
        let mut out: Vec<OutputLine> = Vec::new();
        for line in lines {
            execute_command(&Command::parse(line.as_bytes()), ctx, fs, &mut out);
        }
        out.iter().map(ToString::to_string).collect()
    }

    pub(crate) fn run(fs: &MemoryFs, lines: &[&str]) -> Vec<String> {
        run_lines(fs, &mut ShellContext::new(ShellConfig::default()), lines)
    }

    #[test]
    fn test_table_is_sorted() {
        let names: Vec<_> = COMMANDS.iter().map(|c| c.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("ls").map(|c| c.name), Some("ls"));
        assert_eq!(lookup("write").map(|c| c.name), Some("write"));
        assert!(lookup("format").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_unknown_command() {
        let fs = MemoryFs::new();
        assert_eq!(run(&fs, &["frob x"]), vec!["Error: command frob not found!"]);
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let fs = MemoryFs::new();
        assert_eq!(run(&fs, &["PWD"]), vec!["/"]);
    }

    #[test]
    fn test_context_resolve() {
        let mut ctx = ShellContext::new(ShellConfig::default());
        ctx.change_dir(VirtualPath::parse("/a/b"));
        assert_eq!(
            ctx.resolve("../c", PathRole::File).unwrap().to_string(),
            "/a/c"
        );
        assert!(matches!(
            ctx.resolve("", PathRole::Directory),
            Err(ShellError::MalformedPath { .. })
        ));
    }

    #[test]
    fn test_operand_skips_other_arguments() {
        let ctx = ShellContext::new(ShellConfig::default());
        let cmd = Command::parse(b"tee \"x\" -a out.txt");
        let (index, path) = ctx.operand(&cmd, 0, PathRole::File).unwrap();
        assert_eq!(index, 2);
        assert_eq!(path.to_string(), "/out.txt");
        assert!(matches!(
            ctx.operand(&cmd, 3, PathRole::File),
            Err(ShellError::MissingOperand)
        ));
    }
}
