mod file_config;

pub use file_config::FileConfig;

use anyhow::{anyhow, bail, Result};
use std::net::IpAddr;
use std::path::PathBuf;

pub const DEFAULT_DEVICE_PORT: u16 = 1400;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DISCOVER_WAIT_SECS: u64 = 3;

/// CLI arguments that take part in config resolution.
/// This struct mirrors the flags the TOML file can also provide.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub speaker: Option<String>,
    pub db_path: Option<PathBuf>,
    pub device_port: Option<u16>,
    pub timeout_secs: Option<u64>,
    pub discover_wait_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Speaker to target when the session starts, none means pick later
    /// with `set`.
    pub speaker: Option<IpAddr>,
    pub db_path: PathBuf,
    pub device_port: u16,
    pub timeout_secs: u64,
    pub discover_wait_secs: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML config.
    /// A flag typed on the command line wins over the file; the file wins
    /// over built-in defaults.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let speaker = match cli.speaker.clone().or(file.speaker) {
            Some(raw) => Some(parse_speaker(&raw)?),
            None => None,
        };

        let db_path = match cli
            .db_path
            .clone()
            .or_else(|| file.db_path.map(PathBuf::from))
        {
            Some(path) => path,
            None => default_db_path()?,
        };

        let device_port = cli
            .device_port
            .or(file.device_port)
            .unwrap_or(DEFAULT_DEVICE_PORT);
        if device_port == 0 {
            bail!("device_port cannot be 0");
        }

        let timeout_secs = cli
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            bail!("timeout_secs cannot be 0");
        }

        let discover_wait_secs = cli
            .discover_wait_secs
            .or(file.discover_wait_secs)
            .unwrap_or(DEFAULT_DISCOVER_WAIT_SECS);

        Ok(Self {
            speaker,
            db_path,
            device_port,
            timeout_secs,
            discover_wait_secs,
        })
    }
}

/// `config.toml` under the platform config dir, if one can be resolved.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("salotto").join("config.toml"))
}

fn default_db_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Cannot determine the user config directory, pass --db explicitly"))?;
    Ok(dir.join("salotto").join("musiclib.db"))
}

fn parse_speaker(raw: &str) -> Result<IpAddr> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow!("Speaker address '{}' is not a valid IP address", raw))
}
