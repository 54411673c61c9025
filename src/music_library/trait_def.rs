//! Interfaces the music library is built around.
//!
//! [`LibraryStore`] is the mirror's persistence surface, implemented by
//! the SQLite store; the indexer pulls catalog pages through
//! [`RemoteCatalog`]; the queue path drives a [`PlaybackController`]. The
//! concrete device client lives in `crate::device`; tests substitute
//! in-memory fakes and counting wrappers.

use anyhow::Result;

use super::item_type::{ItemType, CONTENT_COLUMN};
use super::records::{ItemRecord, MusicItem};
use super::store::LibraryRow;

/// The local mirror's persistence surface.
///
/// Column metadata comes from the implementor's live schema, not from
/// constants, so ingestion and search stay honest about what actually
/// exists on disk.
pub trait LibraryStore {
    fn table_names(&self) -> Result<Vec<String>>;

    /// Creates the four item-type tables; errors if any table exists.
    fn create_schema(&self) -> Result<()>;

    /// Drops the four item-type tables; errors when one is missing.
    fn drop_schema(&self) -> Result<()>;

    /// Column names of the live table, in declaration order.
    fn columns_of(&self, item_type: ItemType) -> Result<Vec<String>>;

    /// Appends one row, values in `columns_of` order.
    fn insert(&self, item_type: ItemType, values: &[String]) -> Result<()>;

    /// Appends a page of rows inside a single transaction.
    fn insert_page(&self, item_type: ItemType, rows: &[Vec<String>]) -> Result<()>;

    /// Substring search over one column, rows in insertion order.
    fn search_by_field(
        &self,
        item_type: ItemType,
        field: &str,
        pattern: &str,
    ) -> Result<Vec<LibraryRow>>;

    fn count(&self, item_type: ItemType) -> Result<i64>;

    /// True when exactly the four item-type tables exist. Anything else,
    /// including a partial leftover set, counts as not indexed.
    fn is_indexed(&self) -> Result<bool> {
        let names = self.table_names()?;
        Ok(names.len() == ItemType::ALL.len()
            && ItemType::ALL
                .iter()
                .all(|item_type| names.iter().any(|name| name == item_type.table_name())))
    }

    /// Columns a query may name: everything but the trailing content blob.
    fn searchable_columns(&self, item_type: ItemType) -> Result<Vec<String>> {
        let mut columns = self.columns_of(item_type)?;
        columns.retain(|column| column != CONTENT_COLUMN);
        Ok(columns)
    }
}

/// One page of a remote catalog browse.
#[derive(Clone, Debug)]
pub struct BrowsePage {
    pub items: Vec<RemoteItem>,
    /// Total items of the browsed type on the remote, regardless of paging.
    pub total_matches: usize,
    /// Items actually carried by this page.
    pub number_returned: usize,
}

/// A catalog item as the remote reports it, attribute access by remote
/// field names (the album-artist is `creator` here, never `artist`).
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteItem {
    record: ItemRecord,
}

impl RemoteItem {
    pub fn new(record: ItemRecord) -> Self {
        Self { record }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.record.attribute(name)
    }

    /// The full record serialized for the content column.
    pub fn to_db_str(&self) -> Result<String> {
        self.record.to_db_str()
    }

    pub fn record(&self) -> &ItemRecord {
        &self.record
    }

    pub fn into_record(self) -> ItemRecord {
        self.record
    }
}

/// Read access to the remote music catalog, one paging window at a time.
pub trait RemoteCatalog {
    fn fetch_page(
        &self,
        item_type: ItemType,
        start: usize,
        max_items: usize,
    ) -> Result<BrowsePage>;
}

/// Queue and transport control of the playback device.
pub trait PlaybackController {
    fn transport_state(&self) -> Result<TransportState>;
    fn clear_queue(&self) -> Result<()>;
    fn add_to_queue(&self, item: &MusicItem) -> Result<()>;
    fn play(&self) -> Result<()>;
}

/// Playback status as reported by the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportState {
    Playing,
    PausedPlayback,
    Stopped,
    Transitioning,
    NoMediaPresent,
    Other(String),
}

impl TransportState {
    pub fn from_device_str(raw: &str) -> Self {
        match raw {
            "PLAYING" => TransportState::Playing,
            "PAUSED_PLAYBACK" => TransportState::PausedPlayback,
            "STOPPED" => TransportState::Stopped,
            "TRANSITIONING" => TransportState::Transitioning,
            "NO_MEDIA_PRESENT" => TransportState::NoMediaPresent,
            other => TransportState::Other(other.to_string()),
        }
    }

    pub fn as_device_str(&self) -> &str {
        match self {
            TransportState::Playing => "PLAYING",
            TransportState::PausedPlayback => "PAUSED_PLAYBACK",
            TransportState::Stopped => "STOPPED",
            TransportState::Transitioning => "TRANSITIONING",
            TransportState::NoMediaPresent => "NO_MEDIA_PRESENT",
            TransportState::Other(raw) => raw,
        }
    }

    /// Only an actively playing transport resumes after a queue replace.
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }
}
