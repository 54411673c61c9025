//! Turning a selected search result into remote queue mutations.
//!
//! The transport state is captured once, before any mutation, and decides
//! whether playback resumes after a replace. Failures surface as-is; a
//! clear that succeeded before a failed append is not undone.

use tracing::debug;

use super::error::LibraryError;
use super::item_type::ItemType;
use super::records::{ItemRecord, MusicItem};
use super::store::LibraryRow;
use super::trait_def::PlaybackController;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueAction {
    Add,
    Replace,
}

impl QueueAction {
    pub fn parse(token: &str) -> Result<Self, LibraryError> {
        match token {
            "add" => Ok(QueueAction::Add),
            "replace" => Ok(QueueAction::Replace),
            _ => Err(LibraryError::InvalidAction),
        }
    }
}

/// Queues the 1-based selection from `results` and reports what happened.
pub(crate) fn enqueue_selection(
    player: &dyn PlaybackController,
    item_type: ItemType,
    results: &[LibraryRow],
    action_token: &str,
    number_token: &str,
) -> Result<String, LibraryError> {
    let action = QueueAction::parse(action_token)?;
    let number: i64 = number_token
        .trim()
        .parse()
        .map_err(|_| LibraryError::InvalidNumber)?;
    let index = number - 1;
    if index < 0 || index >= results.len() as i64 {
        return Err(LibraryError::NumberOutOfRange {
            result_count: results.len(),
        });
    }

    let record = ItemRecord::from_db_str(results[index as usize].content())?;
    let item = MusicItem::from_record(item_type, record);

    let state = player.transport_state().map_err(LibraryError::Device)?;
    if action == QueueAction::Replace {
        player.clear_queue().map_err(LibraryError::Device)?;
    }
    player.add_to_queue(&item).map_err(LibraryError::Device)?;
    if action == QueueAction::Replace && state.is_playing() {
        player.play().map_err(LibraryError::Device)?;
    }
    debug!(
        item_type = %item_type,
        title = item.title(),
        action = ?action,
        "queued library selection"
    );

    Ok(match action {
        QueueAction::Add => format!("Added to queue: '{}'", item.title()),
        QueueAction::Replace => format!("Queue replaced with: '{}'", item.title()),
    })
}
