//! Item-type definitions for the local music library mirror.
//!
//! Each item-type is one relation in the mirror database. The enum carries
//! everything type-specific as data: table name, declared column order,
//! the remote attribute naming and the display template. Nothing else in
//! the crate switches on item-type strings.

use std::fmt;

use super::records::ItemRecord;

/// Column name under which the serialized remote record is stored.
/// Always the last declared column of every item-type.
pub const CONTENT_COLUMN: &str = "content";

/// Search field used when a query names none.
pub const DEFAULT_SEARCH_FIELD: &str = "title";

const TRACK_COLUMNS: &[&str] = &["title", "album", "artist", CONTENT_COLUMN];
const ALBUM_COLUMNS: &[&str] = &["title", "artist", CONTENT_COLUMN];
const ARTIST_COLUMNS: &[&str] = &["title", CONTENT_COLUMN];
const PLAYLIST_COLUMNS: &[&str] = &["title", CONTENT_COLUMN];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemType {
    Tracks,
    Albums,
    Artists,
    Playlists,
}

impl ItemType {
    /// Every item-type, in schema (create/drop) order.
    pub const ALL: [ItemType; 4] = [
        ItemType::Tracks,
        ItemType::Albums,
        ItemType::Artists,
        ItemType::Playlists,
    ];

    /// The order in which a full rebuild ingests the remote catalog.
    pub const INDEXING_ORDER: [ItemType; 4] = [
        ItemType::Playlists,
        ItemType::Artists,
        ItemType::Albums,
        ItemType::Tracks,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            ItemType::Tracks => "tracks",
            ItemType::Albums => "albums",
            ItemType::Artists => "artists",
            ItemType::Playlists => "playlists",
        }
    }

    /// Declared columns in order, the content blob last.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ItemType::Tracks => TRACK_COLUMNS,
            ItemType::Albums => ALBUM_COLUMNS,
            ItemType::Artists => ARTIST_COLUMNS,
            ItemType::Playlists => PLAYLIST_COLUMNS,
        }
    }

    /// The remote catalog labels the album-artist field `creator`; the
    /// mirror stores it as `artist`. Applied when asking the remote for
    /// attribute values, never when naming local columns.
    pub fn remote_attribute(column: &str) -> &str {
        if column == "artist" {
            "creator"
        } else {
            column
        }
    }

    /// How one hit of this type reads on screen. Values come from the
    /// deserialized record, so the album-artist keeps its remote name.
    pub fn display_line(&self, record: &ItemRecord) -> String {
        match self {
            ItemType::Tracks => format!(
                "'{}' on '{}' by '{}'",
                record.title,
                record.album.as_deref().unwrap_or_default(),
                record.creator.as_deref().unwrap_or_default(),
            ),
            ItemType::Albums => format!(
                "'{}' by '{}'",
                record.title,
                record.creator.as_deref().unwrap_or_default(),
            ),
            ItemType::Artists | ItemType::Playlists => format!("'{}'", record.title),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}
