use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use log::LevelFilter;

use flashsh::app::Shell;
use flashsh::config::{APP_NAME, ShellConfig};
use flashsh::core::{FlashFs, HostFs, MemoryFs};
use flashsh::models::ChannelOutput;
use flashsh::utils::ChannelLogger;

/// Interactive shell for a flash filesystem.
#[derive(Parser, Debug)]
#[command(name = "flashsh", version, about)]
struct Cli {
    /// Host directory mounted as the filesystem root (default: current directory).
    #[arg(long, value_name = "DIR", conflicts_with = "memory")]
    root: Option<PathBuf>,

    /// Use a volatile in-memory filesystem.
    #[arg(long)]
    memory: bool,

    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run a command line and exit. May be repeated.
    #[arg(short = 'c', long = "command", value_name = "COMMAND")]
    commands: Vec<String>,

    /// Raise the log level (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn level(&self, configured: LevelFilter) -> LevelFilter {
        let requested = match self.verbose {
            0 => LevelFilter::Off,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        configured.max(requested)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match ShellConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {}", APP_NAME, e);
                return ExitCode::FAILURE;
            }
        },
        None => ShellConfig::default(),
    };
    if let Err(e) = ChannelLogger::init(cli.level(config.level_filter())) {
        eprintln!("{}: logger unavailable: {}", APP_NAME, e);
    }

    if cli.memory {
        return session(MemoryFs::new(), config, &cli);
    }
    let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));
    match HostFs::new(&root) {
        Ok(fs) => {
            log::info!("mounted {}", fs.root().display());
            session(fs, config, &cli)
        }
        Err(e) => {
            eprintln!("{}: cannot mount {}: {}", APP_NAME, root.display(), e);
            ExitCode::FAILURE
        }
    }
}

fn session<F: FlashFs>(fs: F, config: ShellConfig, cli: &Cli) -> ExitCode {
    let mut shell = Shell::new(fs, config);
    let mut out = ChannelOutput::new(io::stdout().lock());

    if !cli.commands.is_empty() {
        for line in &cli.commands {
            shell.run_line(line, &mut out);
        }
        return ExitCode::SUCCESS;
    }

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    match shell.run(stdin.lock(), &mut out, interactive) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: input channel failed: {}", APP_NAME, e);
            ExitCode::FAILURE
        }
    }
}
