//! Root application module.
//!
//! [`Shell`] owns the mounted filesystem and the session context, reads
//! lines from a channel and runs them one at a time.

use std::io::{self, BufRead, Write};

use crate::config::{APP_NAME, APP_VERSION, ShellConfig};
use crate::core::{
    Command, FlashFs, Input, LineChannel, ShellContext, ShellError, execute_command,
};
use crate::models::{ChannelOutput, Output, OutputLine};

// ============================================================================
// Shell
// ============================================================================

/// An interactive session over one filesystem.
///
/// Commands never end the session; only the end of the input channel does.
pub struct Shell<F: FlashFs> {
    fs: F,
    ctx: ShellContext,
}

impl<F: FlashFs> Shell<F> {
    pub fn new(fs: F, config: ShellConfig) -> Self {
        Self {
            fs,
            ctx: ShellContext::new(config),
        }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn context(&self) -> &ShellContext {
        &self.ctx
    }

    /// Gets the prompt string, `<cwd>$ `.
    pub fn prompt(&self) -> String {
        format!("{}$ ", self.ctx.cwd())
    }

    /// Run a single line as if it came from the channel.
    pub fn run_line(&mut self, line: &str, out: &mut dyn Output) {
        if line.len() >= self.ctx.config().line_buffer_len {
            out.emit(OutputLine::error(ShellError::LineTooLong.to_string()));
            return;
        }
        let echo = self.ctx.config().echo_commands;
        self.execute(line.as_bytes(), echo, out);
    }

    /// Read and run lines until the channel closes.
    ///
    /// In interactive mode a prompt is printed before each line and commands
    /// are not echoed, since the terminal already shows what was typed.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        input: R,
        out: &mut ChannelOutput<W>,
        interactive: bool,
    ) -> io::Result<()> {
        let config = self.ctx.config().clone();
        let mut channel = LineChannel::new(input, config.line_buffer_len);
        if interactive {
            out.emit(OutputLine::info(format!(
                "{} {} - type help to list the commands",
                APP_NAME, APP_VERSION
            )));
        }
        let echo = config.echo_commands && !interactive;
        loop {
            if interactive && config.prompt {
                out.write_raw(&self.prompt());
            }
            match channel.next_input()? {
                Input::Line(line) => self.execute(&line, echo, out),
                Input::TooLong => out.emit(OutputLine::error(ShellError::LineTooLong.to_string())),
                Input::End => {
                    log::debug!("input closed");
                    return Ok(());
                }
            }
        }
    }

    fn execute(&mut self, line: &[u8], echo: bool, out: &mut dyn Output) {
        let start = line
            .iter()
            .position(|c| !c.is_ascii_whitespace())
            .unwrap_or(line.len());
        let line = &line[start..];
        if line.is_empty() {
            return;
        }

        let cmd = Command::parse(line);
        if echo {
            let shown = if cmd.name.is_empty() {
                String::from_utf8_lossy(line).into_owned()
            } else {
                cmd.to_string()
            };
            out.emit(OutputLine::command(self.ctx.cwd().to_string(), shown));
        }
        if cmd.name.is_empty() {
            let word = line
                .split(|c| c.is_ascii_whitespace())
                .next()
                .unwrap_or_default();
            let err = ShellError::UnknownCommand(String::from_utf8_lossy(word).into_owned());
            out.emit(OutputLine::error(err.to_string()));
            return;
        }
        log::trace!("dispatch {:?}", cmd);
        execute_command(&cmd, &mut self.ctx, &self.fs, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemoryFs;

    fn shell() -> Shell<MemoryFs> {
        Shell::new(MemoryFs::new(), ShellConfig::default())
    }

    fn transcript(shell: &mut Shell<MemoryFs>, input: &[u8], interactive: bool) -> String {
        let mut out = ChannelOutput::new(Vec::new());
        shell.run(input, &mut out, interactive).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn test_batch_session_echoes_commands() {
        let mut shell = shell();
        let text = transcript(&mut shell, b"mkdir logs\r\ncd logs\npwd\n", false);
        assert_eq!(text, "/$ mkdir logs\n/$ cd logs\n/logs$ pwd\n/logs\n");
        assert_eq!(shell.context().cwd().to_string(), "/logs");
    }

    #[test]
    fn test_interactive_session_prompts() {
        let mut shell = shell();
        let text = transcript(&mut shell, b"pwd\n", true);
        assert!(text.starts_with(APP_NAME));
        assert!(text.ends_with("/$ /\n/$ "));
    }

    #[test]
    fn test_too_long_line_is_not_executed() {
        let config = ShellConfig {
            line_buffer_len: 12,
            ..ShellConfig::default()
        };
        let mut shell = Shell::new(MemoryFs::new(), config);
        let text = transcript(&mut shell, b"mkdir abcdefghij\nls\n", false);
        assert_eq!(text, "Error: Too big command!\n/$ ls\n");
        assert!(shell.fs().read_dir(&crate::core::VirtualPath::root()).unwrap().is_empty());
    }

    #[test]
    fn test_run_line_and_unnamed_command() {
        let mut shell = shell();
        let mut out: Vec<OutputLine> = Vec::new();
        shell.run_line("  touch a.txt", &mut out);
        shell.run_line("!! x", &mut out);
        let text: Vec<String> = out.iter().map(ToString::to_string).collect();
        assert_eq!(
            text,
            vec!["/$ touch a.txt", "/$ !! x", "Error: command !! not found!"]
        );
        assert!(shell.fs().contents("/a.txt").is_some());
    }
}
