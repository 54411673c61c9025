//! Common test infrastructure
//!
//! Shared fakes for the end-to-end flows: an in-memory remote catalog and
//! a playback controller that records every call it receives. Tests drive
//! them through the public library surface only.

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;
use salotto::music_library::{
    BrowsePage, ItemRecord, ItemType, MusicItem, PlaybackController, RemoteCatalog, RemoteItem,
    TransportState,
};

// =============================================================================
// Remote catalog fake
// =============================================================================

/// In-memory remote catalog serving fixed items per type, with paging.
#[derive(Default)]
pub struct FakeCatalog {
    items: HashMap<ItemType, Vec<RemoteItem>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(mut self, item_type: ItemType, records: Vec<ItemRecord>) -> Self {
        self.items
            .insert(item_type, records.into_iter().map(RemoteItem::new).collect());
        self
    }
}

impl RemoteCatalog for FakeCatalog {
    fn fetch_page(
        &self,
        item_type: ItemType,
        start: usize,
        max_items: usize,
    ) -> Result<BrowsePage> {
        let all = self.items.get(&item_type).cloned().unwrap_or_default();
        let total_matches = all.len();
        let items: Vec<RemoteItem> = all.into_iter().skip(start).take(max_items).collect();
        let number_returned = items.len();
        Ok(BrowsePage {
            items,
            total_matches,
            number_returned,
        })
    }
}

// =============================================================================
// Playback controller fake
// =============================================================================

/// Records the device calls a queue operation makes, in order.
pub struct RecordingPlayer {
    state: TransportState,
    calls: RefCell<Vec<String>>,
}

impl RecordingPlayer {
    pub fn new(state: TransportState) -> Self {
        Self {
            state,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl PlaybackController for RecordingPlayer {
    fn transport_state(&self) -> Result<TransportState> {
        self.calls.borrow_mut().push("state".to_string());
        Ok(self.state.clone())
    }

    fn clear_queue(&self) -> Result<()> {
        self.calls.borrow_mut().push("clear".to_string());
        Ok(())
    }

    fn add_to_queue(&self, item: &MusicItem) -> Result<()> {
        self.calls.borrow_mut().push(format!("add {}", item.title()));
        Ok(())
    }

    fn play(&self) -> Result<()> {
        self.calls.borrow_mut().push("play".to_string());
        Ok(())
    }
}

// =============================================================================
// Record builders
// =============================================================================

pub fn track_record(id: &str, title: &str, album: &str, creator: &str) -> ItemRecord {
    ItemRecord {
        item_id: id.to_string(),
        parent_id: format!("A:ALBUM/{}", album),
        item_class: "object.item.audioItem.musicTrack".to_string(),
        title: title.to_string(),
        creator: Some(creator.to_string()),
        album: Some(album.to_string()),
        uri: Some(format!("x-file-cifs://nas/music/{}.flac", id)),
        ..Default::default()
    }
}

pub fn titled_record(id: &str, title: &str) -> ItemRecord {
    ItemRecord {
        item_id: id.to_string(),
        title: title.to_string(),
        ..Default::default()
    }
}
