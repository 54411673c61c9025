//! The context commands run against: resolved configuration, the selected
//! speaker and the music library mirror, opened once and reused.

use std::net::IpAddr;

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::config::AppConfig;
use crate::device::Speaker;
use crate::music_library::MusicLibrary;

pub const NO_SPEAKER_MESSAGE: &str = "No speaker selected, run 'set IP' first";

pub struct Session {
    config: AppConfig,
    speaker: Option<Speaker>,
    library: Option<MusicLibrary>,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            speaker: None,
            library: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Connects to `ip` and makes it the session speaker, returning its
    /// room name. A previous selection survives a failed connect.
    pub fn set_speaker(&mut self, ip: IpAddr) -> Result<String> {
        let speaker = Speaker::connect(ip, self.config.device_port, self.config.timeout_secs)?;
        let room = speaker.zone_name().to_string();
        debug!(ip = %ip, room, "speaker selected");
        self.speaker = Some(speaker);
        Ok(room)
    }

    pub fn unset_speaker(&mut self) {
        self.speaker = None;
    }

    /// The selected speaker, an error until `set` picked one.
    pub fn speaker(&self) -> Result<&Speaker> {
        self.speaker
            .as_ref()
            .ok_or_else(|| anyhow!(NO_SPEAKER_MESSAGE))
    }

    pub fn current_speaker(&self) -> Option<&Speaker> {
        self.speaker.as_ref()
    }

    /// The library mirror, opened on first use and kept for the rest of
    /// the session.
    pub fn library(&mut self) -> Result<&mut MusicLibrary> {
        if self.library.is_none() {
            let library = MusicLibrary::open(&self.config.db_path)?;
            self.library = Some(library);
        }
        match &mut self.library {
            Some(library) => Ok(library),
            None => Err(anyhow!("Music library failed to open")),
        }
    }

    /// Split borrow for operations that drive the library and the speaker
    /// together, such as indexing and queueing search results.
    pub fn library_with_speaker(&mut self) -> Result<(&mut MusicLibrary, Option<&Speaker>)> {
        if self.library.is_none() {
            let library = MusicLibrary::open(&self.config.db_path)?;
            self.library = Some(library);
        }
        let speaker = self.speaker.as_ref();
        match &mut self.library {
            Some(library) => Ok((library, speaker)),
            None => Err(anyhow!("Music library failed to open")),
        }
    }
}
