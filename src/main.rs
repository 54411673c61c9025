use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use salotto::cli_style::{get_styles, print_error, print_warning};
use salotto::commands::{execute, Command, CommandExecutionResult};
use salotto::config::{self, AppConfig, CliConfig, FileConfig};
use salotto::session::Session;
use salotto::shell::run_shell;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Control zone speakers and keep a local mirror of their music library.
#[derive(Parser, Debug)]
#[command(styles=get_styles(), version = VERSION)]
struct CliArgs {
    /// IP address of the speaker to target.
    #[clap(short, long)]
    pub speaker: Option<String>,

    /// Path to the SQLite music library mirror.
    #[clap(long = "db")]
    pub db_path: Option<PathBuf>,

    /// Path to a TOML config file.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Port the speakers listen on.
    #[clap(long)]
    pub device_port: Option<u16>,

    /// Timeout in seconds for speaker requests.
    #[clap(long)]
    pub timeout_secs: Option<u64>,

    /// Seconds to wait for discovery replies.
    #[clap(long)]
    pub discover_wait_secs: Option<u64>,

    /// Command to run; without one an interactive shell starts.
    #[command(subcommand)]
    pub command: Option<Command>,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = load_file_config(cli_args.config.as_deref())?;
    let cli_config = CliConfig {
        speaker: cli_args.speaker,
        db_path: cli_args.db_path,
        device_port: cli_args.device_port,
        timeout_secs: cli_args.timeout_secs,
        discover_wait_secs: cli_args.discover_wait_secs,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let mut session = Session::new(config);
    if let Some(ip) = session.config().speaker {
        if let Err(error) = session.set_speaker(ip) {
            print_warning(&format!("{:#}", error));
        }
    }

    match cli_args.command {
        Some(command) => match execute(command, &mut session) {
            CommandExecutionResult::Ok | CommandExecutionResult::Exit => Ok(()),
            CommandExecutionResult::Error(message) => {
                print_error(&message);
                std::process::exit(1);
            }
        },
        None => run_shell(&mut session),
    }
}

/// An explicitly given config file must load; the default location is
/// only read when it exists.
fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    match explicit {
        Some(path) => Ok(Some(FileConfig::load(path)?)),
        None => match config::default_config_path() {
            Some(path) if path.exists() => Ok(Some(FileConfig::load(&path)?)),
            _ => Ok(None),
        },
    }
}
