//! Typed operations of one zone speaker.
//!
//! A [`Speaker`] wraps the four control services of a single device. It is
//! also the crate's concrete [`RemoteCatalog`] (browsing the device music
//! library) and [`PlaybackController`] (driving its queue and transport).

use std::net::IpAddr;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::music_library::{
    BrowsePage, ItemRecord, ItemType, MusicItem, PlaybackController, RemoteCatalog, RemoteItem,
    TransportState,
};

use super::didl;
use super::soap::{
    SoapClient, AV_TRANSPORT, CONTENT_DIRECTORY, DEVICE_PROPERTIES, RENDERING_CONTROL,
};

/// Device queue container.
const QUEUE_OBJECT: &str = "Q:0";

/// Window used when listing the device queue.
const QUEUE_PAGE: usize = 100;

/// Music library root container per item-type.
fn library_root(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Tracks => "A:TRACKS",
        ItemType::Albums => "A:ALBUM",
        ItemType::Artists => "A:ARTIST",
        ItemType::Playlists => "A:PLAYLISTS",
    }
}

fn playable_uri(record: &ItemRecord) -> Result<&str> {
    record
        .uri
        .as_deref()
        .ok_or_else(|| anyhow!("'{}' carries no playable URI", record.title))
}

/// What the transport is currently rendering.
#[derive(Debug)]
pub struct CurrentTrack {
    /// 1-based position in the device queue, 0 when nothing is loaded.
    pub queue_position: usize,
    pub duration: String,
    pub elapsed: String,
    pub record: Option<ItemRecord>,
}

#[derive(Debug)]
pub struct Speaker {
    ip: IpAddr,
    zone_name: String,
    soap: SoapClient,
}

impl Speaker {
    /// Connects and resolves the zone name, failing fast on a dead address.
    pub fn connect(ip: IpAddr, port: u16, timeout_secs: u64) -> Result<Self> {
        let soap = SoapClient::new(&ip.to_string(), port, timeout_secs);
        let response = soap
            .call(DEVICE_PROPERTIES, "GetZoneAttributes", &[])
            .with_context(|| format!("No zone speaker answered at {ip}"))?;
        let zone_name = response.field_or_empty("CurrentZoneName").to_string();
        debug!(ip = %ip, zone_name, "connected to speaker");
        Ok(Self {
            ip,
            zone_name,
            soap,
        })
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn zone_name(&self) -> &str {
        &self.zone_name
    }

    /// Identity and firmware details, ready for key/value display.
    pub fn info(&self) -> Result<Vec<(&'static str, String)>> {
        let zone = self.soap.call(DEVICE_PROPERTIES, "GetZoneInfo", &[])?;
        Ok(vec![
            ("Zone name", self.zone_name.clone()),
            ("IP address", self.ip.to_string()),
            (
                "MAC address",
                zone.field_or_empty("MACAddress").to_string(),
            ),
            (
                "Serial number",
                zone.field_or_empty("SerialNumber").to_string(),
            ),
            (
                "Software version",
                zone.field_or_empty("SoftwareVersion").to_string(),
            ),
            (
                "Hardware version",
                zone.field_or_empty("HardwareVersion").to_string(),
            ),
        ])
    }

    // =========================================================================
    // Transport
    // =========================================================================

    pub fn play(&self) -> Result<()> {
        self.transport("Play", &[("InstanceID", "0"), ("Speed", "1")])
    }

    pub fn pause(&self) -> Result<()> {
        self.transport("Pause", &[("InstanceID", "0")])
    }

    pub fn stop(&self) -> Result<()> {
        self.transport("Stop", &[("InstanceID", "0")])
    }

    pub fn next(&self) -> Result<()> {
        self.transport("Next", &[("InstanceID", "0")])
    }

    pub fn previous(&self) -> Result<()> {
        self.transport("Previous", &[("InstanceID", "0")])
    }

    /// Jumps to a 1-based queue position and starts playback there.
    pub fn play_from_queue(&self, position: usize) -> Result<()> {
        self.transport(
            "Seek",
            &[
                ("InstanceID", "0"),
                ("Unit", "TRACK_NR"),
                ("Target", &position.to_string()),
            ],
        )?;
        self.play()
    }

    pub fn transport_state(&self) -> Result<TransportState> {
        let response = self
            .soap
            .call(AV_TRANSPORT, "GetTransportInfo", &[("InstanceID", "0")])?;
        Ok(TransportState::from_device_str(
            response.field("CurrentTransportState")?,
        ))
    }

    pub fn current_track(&self) -> Result<CurrentTrack> {
        let response = self
            .soap
            .call(AV_TRANSPORT, "GetPositionInfo", &[("InstanceID", "0")])?;
        let metadata = response.field_or_empty("TrackMetaData");
        let record = if metadata.is_empty() || metadata == "NOT_IMPLEMENTED" {
            None
        } else {
            didl::parse_didl(metadata)?.into_iter().next()
        };
        Ok(CurrentTrack {
            queue_position: response.field_or_empty("Track").parse().unwrap_or(0),
            duration: response.field_or_empty("TrackDuration").to_string(),
            elapsed: response.field_or_empty("RelTime").to_string(),
            record,
        })
    }

    fn transport(&self, action: &str, args: &[(&str, &str)]) -> Result<()> {
        self.soap.call(AV_TRANSPORT, action, args).map(|_| ())
    }

    // =========================================================================
    // Volume
    // =========================================================================

    pub fn volume(&self) -> Result<u8> {
        let response = self.soap.call(
            RENDERING_CONTROL,
            "GetVolume",
            &[("InstanceID", "0"), ("Channel", "Master")],
        )?;
        let volume = response.uint_field("CurrentVolume")?;
        Ok(volume.min(100) as u8)
    }

    pub fn set_volume(&self, volume: u8) -> Result<()> {
        self.soap
            .call(
                RENDERING_CONTROL,
                "SetVolume",
                &[
                    ("InstanceID", "0"),
                    ("Channel", "Master"),
                    ("DesiredVolume", &volume.min(100).to_string()),
                ],
            )
            .map(|_| ())
    }

    /// Applies a signed change and returns the resulting volume.
    pub fn adjust_volume(&self, change: i16) -> Result<u8> {
        let current = i16::from(self.volume()?);
        let target = (current + change).clamp(0, 100) as u8;
        self.set_volume(target)?;
        Ok(target)
    }

    // =========================================================================
    // Queue
    // =========================================================================

    /// Number of entries in the device queue.
    pub fn queue_length(&self) -> Result<usize> {
        Ok(self.browse(QUEUE_OBJECT, 0, 1)?.total_matches)
    }

    /// The whole device queue, in queue order.
    pub fn queue(&self) -> Result<Vec<ItemRecord>> {
        let mut items: Vec<ItemRecord> = Vec::new();
        loop {
            let page = self.browse(QUEUE_OBJECT, items.len(), QUEUE_PAGE)?;
            let total = page.total_matches;
            let fetched = page.items.len();
            items.extend(page.items.into_iter().map(RemoteItem::into_record));
            if fetched == 0 || items.len() >= total {
                return Ok(items);
            }
        }
    }

    fn browse(&self, object_id: &str, start: usize, max_items: usize) -> Result<BrowsePage> {
        let response = self.soap.call(
            CONTENT_DIRECTORY,
            "Browse",
            &[
                ("ObjectID", object_id),
                ("BrowseFlag", "BrowseDirectChildren"),
                ("Filter", "*"),
                ("StartingIndex", &start.to_string()),
                ("RequestedCount", &max_items.to_string()),
                ("SortCriteria", ""),
            ],
        )?;
        let total_matches = response.uint_field("TotalMatches")?;
        let number_returned = response.uint_field("NumberReturned")?;
        let records = didl::parse_didl(response.field("Result")?)
            .context("Device returned unreadable browse metadata")?;
        Ok(BrowsePage {
            items: records.into_iter().map(RemoteItem::new).collect(),
            total_matches,
            number_returned,
        })
    }
}

impl RemoteCatalog for Speaker {
    fn fetch_page(
        &self,
        item_type: ItemType,
        start: usize,
        max_items: usize,
    ) -> Result<BrowsePage> {
        self.browse(library_root(item_type), start, max_items)
    }
}

impl PlaybackController for Speaker {
    fn transport_state(&self) -> Result<TransportState> {
        Speaker::transport_state(self)
    }

    fn clear_queue(&self) -> Result<()> {
        self.transport("RemoveAllTracksFromQueue", &[("InstanceID", "0")])
    }

    fn add_to_queue(&self, item: &MusicItem) -> Result<()> {
        let record = item.record();
        let uri = playable_uri(record)?;
        let metadata = didl::queue_metadata(record);
        self.transport(
            "AddURIToQueue",
            &[
                ("InstanceID", "0"),
                ("EnqueuedURI", uri),
                ("EnqueuedURIMetaData", &metadata),
                ("DesiredFirstTrackNumberEnqueued", "0"),
                ("EnqueueAsNext", "0"),
            ],
        )
    }

    fn play(&self) -> Result<()> {
        Speaker::play(self)
    }
}
