//! The command set and its execution against a [`Session`]. The same enum
//! backs one-shot invocations and the interactive shell.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use clap::Subcommand;

use crate::cli_style::{self, print_empty_list, print_key_value, print_success};
use crate::device::{discovery, Speaker};
use crate::music_library::{
    ItemType, LibraryOutput, MusicItem, PlaybackController, TransportState,
};
use crate::session::{Session, NO_SPEAKER_MESSAGE};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discovers zone speakers on the local network.
    List,

    /// Selects the speaker at the given IP address.
    Set { ip: IpAddr },

    /// Clears the speaker selection.
    Unset,

    /// Shows identity details of the selected speaker.
    Info,

    /// Shows the transport state of the selected speaker.
    State,

    /// Resumes playback, or starts playing the given queue position.
    Play { number: Option<usize> },

    /// Pauses playback.
    Pause,

    /// Stops playback.
    Stop,

    /// Skips to the next queue entry.
    Next,

    /// Goes back to the previous queue entry.
    Previous,

    /// Shows the current track.
    Current,

    /// Shows the device queue, the playing entry highlighted.
    Queue,

    /// Shows the volume, or adjusts it by +N or -N.
    Volume {
        #[arg(allow_hyphen_values = true)]
        change: Option<String>,
    },

    /// Rebuilds the local music library mirror from the speaker.
    Index,

    /// Searches indexed tracks; add ACTION NUMBER to queue a result.
    Tracks { args: Vec<String> },

    /// Searches indexed albums; add ACTION NUMBER to queue a result.
    Albums { args: Vec<String> },

    /// Searches indexed artists; add ACTION NUMBER to queue a result.
    Artists { args: Vec<String> },

    /// Searches indexed playlists; add ACTION NUMBER to queue a result.
    Playlists { args: Vec<String> },

    /// Leaves the interactive shell.
    Exit,
}

pub enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

pub fn execute(command: Command, session: &mut Session) -> CommandExecutionResult {
    let result = match command {
        Command::Exit => return CommandExecutionResult::Exit,
        Command::List => list_speakers(session),
        Command::Set { ip } => set_speaker(session, ip),
        Command::Unset => unset_speaker(session),
        Command::Info => show_info(session),
        Command::State => show_state(session),
        Command::Play { number } => play(session, number),
        Command::Pause => pause(session),
        Command::Stop => stop(session),
        Command::Next => next_track(session),
        Command::Previous => previous_track(session),
        Command::Current => show_current(session),
        Command::Queue => show_queue(session),
        Command::Volume { change } => volume(session, change.as_deref()),
        Command::Index => rebuild_index(session),
        Command::Tracks { args } => search_library(session, ItemType::Tracks, &args),
        Command::Albums { args } => search_library(session, ItemType::Albums, &args),
        Command::Artists { args } => search_library(session, ItemType::Artists, &args),
        Command::Playlists { args } => search_library(session, ItemType::Playlists, &args),
    };
    match result {
        Ok(()) => CommandExecutionResult::Ok,
        Err(error) => CommandExecutionResult::Error(format!("{:#}", error)),
    }
}

fn list_speakers(session: &Session) -> Result<()> {
    let config = session.config();
    println!("Searching for speakers...");
    cli_style::flush();
    let ips = discovery::discover(Duration::from_secs(config.discover_wait_secs))?;
    if ips.is_empty() {
        print_empty_list("No speakers answered");
        return Ok(());
    }
    for ip in ips {
        match Speaker::connect(ip, config.device_port, config.timeout_secs) {
            Ok(speaker) => println!("{:<15}  {}", ip, speaker.zone_name()),
            Err(_) => println!("{}", ip),
        }
    }
    Ok(())
}

fn set_speaker(session: &mut Session, ip: IpAddr) -> Result<()> {
    let room = session.set_speaker(ip)?;
    print_success(&format!("Speaker set to '{}' ({})", room, ip));
    Ok(())
}

fn unset_speaker(session: &mut Session) -> Result<()> {
    session.unset_speaker();
    print_success("Speaker selection cleared");
    Ok(())
}

fn show_info(session: &Session) -> Result<()> {
    for (key, value) in session.speaker()?.info()? {
        print_key_value(key, &value);
    }
    Ok(())
}

fn show_state(session: &Session) -> Result<()> {
    let state = session.speaker()?.transport_state()?;
    println!("{}", cli_style::transport_label(state.as_device_str()));
    Ok(())
}

fn play(session: &Session, number: Option<usize>) -> Result<()> {
    let speaker = session.speaker()?;
    match number {
        Some(number) => {
            let length = speaker.queue_length()?;
            if length == 0 {
                bail!("The queue is empty");
            }
            if number == 0 || number > length {
                bail!("Queue position must be in the range 1 to {}", length);
            }
            speaker.play_from_queue(number)?;
        }
        None => speaker.play()?,
    }
    show_current_for(speaker)
}

fn pause(session: &Session) -> Result<()> {
    session.speaker()?.pause()?;
    print_success("Paused");
    Ok(())
}

fn stop(session: &Session) -> Result<()> {
    session.speaker()?.stop()?;
    print_success("Stopped");
    Ok(())
}

fn next_track(session: &Session) -> Result<()> {
    let speaker = session.speaker()?;
    speaker.next()?;
    show_current_for(speaker)
}

fn previous_track(session: &Session) -> Result<()> {
    let speaker = session.speaker()?;
    speaker.previous()?;
    show_current_for(speaker)
}

fn show_current(session: &Session) -> Result<()> {
    show_current_for(session.speaker()?)
}

fn show_current_for(speaker: &Speaker) -> Result<()> {
    let track = speaker.current_track()?;
    let record = match track.record {
        Some(record) => record,
        None => {
            print_empty_list("Nothing is playing");
            return Ok(());
        }
    };
    print_key_value("Track", &record.title);
    print_key_value("Artist", record.creator.as_deref().unwrap_or("-"));
    print_key_value("Album", record.album.as_deref().unwrap_or("-"));
    if track.queue_position > 0 {
        print_key_value("Queue", &track.queue_position.to_string());
    }
    if !track.duration.is_empty() {
        print_key_value(
            "Position",
            &format!("{} / {}", track.elapsed, track.duration),
        );
    }
    Ok(())
}

fn show_queue(session: &Session) -> Result<()> {
    let speaker = session.speaker()?;
    let entries = speaker.queue()?;
    if entries.is_empty() {
        print_empty_list("The queue is empty");
        return Ok(());
    }
    let playing = speaker
        .current_track()
        .map(|track| track.queue_position)
        .unwrap_or(0);
    let width = entries.len().to_string().len();
    for (position, record) in entries.iter().enumerate() {
        let number = position + 1;
        let line = format!(
            "({:>width$}) {}",
            number,
            ItemType::Tracks.display_line(record)
        );
        cli_style::print_queue_entry(&line, number == playing);
    }
    Ok(())
}

fn volume(session: &Session, change: Option<&str>) -> Result<()> {
    let speaker = session.speaker()?;
    let volume = match change {
        Some(raw) => speaker.adjust_volume(parse_volume_change(raw)?)?,
        None => speaker.volume()?,
    };
    println!("Volume: {}", volume);
    Ok(())
}

fn parse_volume_change(raw: &str) -> Result<i16> {
    let sign: i16 = match raw.chars().next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => bail!("Valid operators for volume are + and -"),
    };
    let magnitude: u8 = raw[1..]
        .parse()
        .map_err(|_| anyhow!("Volume change must be a number"))?;
    Ok(sign * i16::from(magnitude))
}

fn rebuild_index(session: &mut Session) -> Result<()> {
    let (library, speaker) = session.library_with_speaker()?;
    let speaker = speaker.ok_or_else(|| anyhow!(NO_SPEAKER_MESSAGE))?;
    for line in library.reindex(speaker) {
        println!("{}", line?);
        cli_style::flush();
    }
    print_success("Music library indexed");
    Ok(())
}

fn search_library(session: &mut Session, item_type: ItemType, args: &[String]) -> Result<()> {
    let (library, speaker) = session.library_with_speaker()?;
    let output = match speaker {
        Some(speaker) => library.search_and_play(speaker, item_type, args)?,
        None => {
            // Searching stays available offline, queueing needs a speaker
            if args.len() == 3 {
                bail!(NO_SPEAKER_MESSAGE);
            }
            library.search_and_play(&Disconnected, item_type, args)?
        }
    };
    match output {
        LibraryOutput::Results(lines) => {
            for line in lines {
                println!("{}", line?);
            }
        }
        LibraryOutput::Queued(message) => print_success(&message),
    }
    Ok(())
}

/// Stand-in player while no speaker is selected.
struct Disconnected;

impl PlaybackController for Disconnected {
    fn transport_state(&self) -> Result<TransportState> {
        bail!(NO_SPEAKER_MESSAGE)
    }

    fn clear_queue(&self) -> Result<()> {
        bail!(NO_SPEAKER_MESSAGE)
    }

    fn add_to_queue(&self, _item: &MusicItem) -> Result<()> {
        bail!(NO_SPEAKER_MESSAGE)
    }

    fn play(&self) -> Result<()> {
        bail!(NO_SPEAKER_MESSAGE)
    }
}
