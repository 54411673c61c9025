//! Local mirror of a zone speaker's music catalog.
//!
//! The speaker's ContentDirectory is slow to search interactively, so the
//! whole catalog is mirrored into four flat SQLite tables and queried
//! locally. [`MusicLibrary`] owns the store and a small FIFO result cache;
//! re-indexing streams its progress lazily and search results either
//! render as numbered lines or turn into queue mutations on the device.

pub mod cache;
pub mod error;
pub mod indexer;
pub mod item_type;
pub mod queue;
pub mod records;
pub mod search;
pub mod store;
pub mod trait_def;

pub use cache::{SearchCache, SearchKey, DEFAULT_CACHE_CAPACITY};
pub use error::LibraryError;
pub use indexer::Reindex;
pub use item_type::ItemType;
pub use queue::QueueAction;
pub use records::{ItemRecord, MusicItem};
pub use search::ResultLines;
pub use store::{LibraryRow, SqliteLibraryStore};
pub use trait_def::{
    BrowsePage, LibraryStore, PlaybackController, RemoteCatalog, RemoteItem, TransportState,
};

use std::path::Path;

use anyhow::Result;

pub struct MusicLibrary {
    store: Box<dyn LibraryStore>,
    cache: SearchCache,
}

/// What one search-and-play invocation produced.
#[derive(Debug)]
pub enum LibraryOutput {
    /// Display-only query: numbered lines, rendered lazily.
    Results(ResultLines),
    /// A queue mutation happened; this is the confirmation.
    Queued(String),
}

impl MusicLibrary {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::with_store(Box::new(SqliteLibraryStore::open(path)?)))
    }

    pub fn with_store(store: Box<dyn LibraryStore>) -> Self {
        Self {
            store,
            cache: SearchCache::default(),
        }
    }

    /// Streams a full rebuild; nothing runs until the iterator is pulled.
    pub fn reindex<'a>(&'a self, remote: &'a dyn RemoteCatalog) -> Reindex<'a> {
        Reindex::new(self.store.as_ref(), remote)
    }

    pub fn search(
        &mut self,
        item_type: ItemType,
        term: &str,
    ) -> Result<Vec<LibraryRow>, LibraryError> {
        search::execute(self.store.as_ref(), &mut self.cache, item_type, term)
    }

    /// One library invocation as the shell issues it: a bare query token
    /// displays results, query plus action and number mutates the queue,
    /// any other shape is a syntax error.
    pub fn search_and_play(
        &mut self,
        player: &dyn PlaybackController,
        item_type: ItemType,
        args: &[String],
    ) -> Result<LibraryOutput, LibraryError> {
        match args {
            [] => Err(LibraryError::MissingSearchTerm),
            [term] => {
                let rows = self.search(item_type, term)?;
                Ok(LibraryOutput::Results(ResultLines::new(item_type, rows)))
            }
            [term, action, number] => {
                let rows = self.search(item_type, term)?;
                let message = queue::enqueue_selection(player, item_type, &rows, action, number)?;
                Ok(LibraryOutput::Queued(message))
            }
            _ => Err(LibraryError::PlaySyntax),
        }
    }

    pub fn store(&self) -> &dyn LibraryStore {
        self.store.as_ref()
    }
}
