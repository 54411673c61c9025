//! Item records as stored in the mirror's content column.
//!
//! A record is the full remote description of one catalog item, serialized
//! to JSON at ingestion time and deserialized again only when a row is
//! displayed or queued. Unknown remote fields survive the round trip.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::item_type::ItemType;

/// One remote catalog item, field names as the remote reports them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub item_class: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_art_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_track_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemRecord {
    pub fn from_db_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to deserialize item record")
    }

    pub fn to_db_str(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize item record")
    }

    /// Attribute lookup by remote field name, typed fields first.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(&self.title),
            "creator" => self.creator.as_deref(),
            "album" => self.album.as_deref(),
            "item_id" => Some(&self.item_id),
            "parent_id" => Some(&self.parent_id),
            "item_class" => Some(&self.item_class),
            "album_art_uri" => self.album_art_uri.as_deref(),
            "uri" => self.uri.as_deref(),
            _ => self.extra.get(name).and_then(Value::as_str),
        }
    }
}

/// A selected search result, carried as the variant of its item-type.
#[derive(Clone, Debug, PartialEq)]
pub enum MusicItem {
    Track(ItemRecord),
    Album(ItemRecord),
    Artist(ItemRecord),
    Playlist(ItemRecord),
}

impl MusicItem {
    pub fn from_record(item_type: ItemType, record: ItemRecord) -> Self {
        match item_type {
            ItemType::Tracks => MusicItem::Track(record),
            ItemType::Albums => MusicItem::Album(record),
            ItemType::Artists => MusicItem::Artist(record),
            ItemType::Playlists => MusicItem::Playlist(record),
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            MusicItem::Track(_) => ItemType::Tracks,
            MusicItem::Album(_) => ItemType::Albums,
            MusicItem::Artist(_) => ItemType::Artists,
            MusicItem::Playlist(_) => ItemType::Playlists,
        }
    }

    pub fn record(&self) -> &ItemRecord {
        match self {
            MusicItem::Track(record)
            | MusicItem::Album(record)
            | MusicItem::Artist(record)
            | MusicItem::Playlist(record) => record,
        }
    }

    pub fn title(&self) -> &str {
        &self.record().title
    }
}
