//! Bounded cache in front of the library search path.
//!
//! Keys are the full search identity (item-type, field, wildcard pattern);
//! values are the complete result set at search time. Eviction is strictly
//! by insertion order: a lookup does not refresh an entry's position, so
//! the oldest surviving insert always goes first. Entries never expire on
//! their own and a re-index does not clear the cache, which means a search
//! repeated after `index` may still serve rows from the previous mirror.

use indexmap::IndexMap;

use super::item_type::ItemType;
use super::store::LibraryRow;

pub const DEFAULT_CACHE_CAPACITY: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SearchKey {
    pub item_type: ItemType,
    pub field: String,
    pub pattern: String,
}

pub struct SearchCache {
    entries: IndexMap<SearchKey, Vec<LibraryRow>>,
    capacity: usize,
}

impl SearchCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            capacity,
        }
    }

    /// Non-promoting lookup.
    pub fn get(&self, key: &SearchKey) -> Option<&[LibraryRow]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn put(&mut self, key: SearchKey, rows: Vec<LibraryRow>) {
        self.entries.insert(key, rows);
        while self.entries.len() > self.capacity {
            self.entries.shift_remove_index(0);
        }
    }

    /// Shrinking the capacity evicts oldest entries immediately.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > self.capacity {
            self.entries.shift_remove_index(0);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
