use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML settings, each field a fallback for its CLI twin.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    /// Default target speaker, an IP address.
    pub speaker: Option<String>,
    pub db_path: Option<String>,
    pub device_port: Option<u16>,
    pub timeout_secs: Option<u64>,
    pub discover_wait_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
