//! Field-scoped substring search over the mirror.
//!
//! A query token is either `text` (searched in the title column) or
//! `field=text`. The text is wrapped in SQL wildcards and served through
//! the query cache; the cache is consulted before the field is validated,
//! so a hit short-circuits everything.

use tracing::debug;

use super::cache::{SearchCache, SearchKey};
use super::error::LibraryError;
use super::item_type::{ItemType, DEFAULT_SEARCH_FIELD};
use super::records::ItemRecord;
use super::store::LibraryRow;
use super::trait_def::LibraryStore;

/// Splits a raw query token into (field, text) by its `=` signs.
pub(crate) fn parse_query(term: &str) -> Result<(String, String), LibraryError> {
    match term.split_once('=') {
        None => Ok((DEFAULT_SEARCH_FIELD.to_string(), term.to_string())),
        Some((field, text)) if !text.contains('=') => {
            Ok((field.to_string(), text.to_string()))
        }
        Some(_) => Err(LibraryError::MalformedQuery),
    }
}

/// Runs one search, cache first, store on miss.
pub(crate) fn execute(
    store: &dyn LibraryStore,
    cache: &mut SearchCache,
    item_type: ItemType,
    term: &str,
) -> Result<Vec<LibraryRow>, LibraryError> {
    if !store.is_indexed()? {
        return Err(LibraryError::NotIndexed);
    }
    let (field, text) = parse_query(term)?;
    let key = SearchKey {
        item_type,
        field,
        pattern: format!("%{text}%"),
    };

    if let Some(rows) = cache.get(&key) {
        debug!(item_type = %item_type, field = %key.field, "search served from cache");
        return Ok(rows.to_vec());
    }

    let allowed = store.searchable_columns(item_type)?;
    if !allowed.iter().any(|column| column == &key.field) {
        return Err(LibraryError::UnknownField {
            field: key.field,
            allowed,
        });
    }

    let rows = store.search_by_field(item_type, &key.field, &key.pattern)?;
    debug!(
        item_type = %item_type,
        field = %key.field,
        results = rows.len(),
        "search executed against store"
    );
    cache.put(key, rows.clone());
    Ok(rows)
}

/// Lazily renders a result set into numbered display lines.
///
/// The index label is 1-based and right-padded to the width of the result
/// count; the line body comes from the item-type's template over the
/// deserialized content blob.
#[derive(Debug)]
pub struct ResultLines {
    item_type: ItemType,
    rows: std::vec::IntoIter<LibraryRow>,
    width: usize,
    position: usize,
}

impl ResultLines {
    pub fn new(item_type: ItemType, rows: Vec<LibraryRow>) -> Self {
        let width = rows.len().to_string().len();
        Self {
            item_type,
            rows: rows.into_iter(),
            width,
            position: 0,
        }
    }
}

impl Iterator for ResultLines {
    type Item = Result<String, LibraryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        self.position += 1;
        let record = match ItemRecord::from_db_str(row.content()) {
            Ok(record) => record,
            Err(e) => return Some(Err(LibraryError::Store(e))),
        };
        Some(Ok(format!(
            "({:>width$}) {}",
            self.position,
            self.item_type.display_line(&record),
            width = self.width
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music_library::store::SqliteLibraryStore;
    use std::cell::Cell;

    /// Store wrapper counting how often the search path hits SQLite.
    struct CountingStore {
        inner: SqliteLibraryStore,
        search_calls: Cell<usize>,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: SqliteLibraryStore::open_in_memory().unwrap(),
                search_calls: Cell::new(0),
            }
        }
    }

    impl LibraryStore for CountingStore {
        fn table_names(&self) -> anyhow::Result<Vec<String>> {
            self.inner.table_names()
        }

        fn create_schema(&self) -> anyhow::Result<()> {
            self.inner.create_schema()
        }

        fn drop_schema(&self) -> anyhow::Result<()> {
            self.inner.drop_schema()
        }

        fn columns_of(&self, item_type: ItemType) -> anyhow::Result<Vec<String>> {
            self.inner.columns_of(item_type)
        }

        fn insert(&self, item_type: ItemType, values: &[String]) -> anyhow::Result<()> {
            self.inner.insert(item_type, values)
        }

        fn insert_page(&self, item_type: ItemType, rows: &[Vec<String>]) -> anyhow::Result<()> {
            self.inner.insert_page(item_type, rows)
        }

        fn search_by_field(
            &self,
            item_type: ItemType,
            field: &str,
            pattern: &str,
        ) -> anyhow::Result<Vec<LibraryRow>> {
            self.search_calls.set(self.search_calls.get() + 1);
            self.inner.search_by_field(item_type, field, pattern)
        }

        fn count(&self, item_type: ItemType) -> anyhow::Result<i64> {
            self.inner.count(item_type)
        }
    }

    fn seeded_store() -> CountingStore {
        let store = CountingStore::new();
        store.create_schema().unwrap();
        for (title, album, artist) in [
            ("Black Dog", "IV", "Led Zeppelin"),
            ("Blackbird", "White Album", "The Beatles"),
            ("Money", "The Dark Side of the Moon", "Pink Floyd"),
        ] {
            store
                .insert(
                    ItemType::Tracks,
                    &[
                        title.to_string(),
                        album.to_string(),
                        artist.to_string(),
                        format!(
                            r#"{{"title": "{title}", "album": "{album}", "creator": "{artist}"}}"#
                        ),
                    ],
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn test_parse_query_defaults_to_title() {
        assert_eq!(
            parse_query("dark side").unwrap(),
            ("title".to_string(), "dark side".to_string())
        );
    }

    #[test]
    fn test_parse_query_splits_on_equals() {
        assert_eq!(
            parse_query("artist=Metallica").unwrap(),
            ("artist".to_string(), "Metallica".to_string())
        );
        // empty field is parsed, rejected later by validation
        assert_eq!(
            parse_query("=text").unwrap(),
            ("".to_string(), "text".to_string())
        );
    }

    #[test]
    fn test_parse_query_rejects_multiple_equals() {
        let err = parse_query("a=b=c").unwrap_err();
        assert!(matches!(err, LibraryError::MalformedQuery));
        assert!(matches!(
            parse_query("artist=AC=DC").unwrap_err(),
            LibraryError::MalformedQuery
        ));
    }

    #[test]
    fn test_search_requires_index() {
        let store = CountingStore::new();
        let mut cache = SearchCache::default();
        let err = execute(&store, &mut cache, ItemType::Tracks, "anything").unwrap_err();
        assert!(matches!(err, LibraryError::NotIndexed));
        assert_eq!(store.search_calls.get(), 0);
    }

    #[test]
    fn test_search_wraps_text_in_wildcards() {
        let store = seeded_store();
        let mut cache = SearchCache::default();
        let rows = execute(&store, &mut cache, ItemType::Tracks, "lack").unwrap();
        let titles: Vec<&str> = rows.iter().map(|row| row.title()).collect();
        assert_eq!(titles, vec!["Black Dog", "Blackbird"]);
    }

    #[test]
    fn test_unknown_field_lists_searchable_columns() {
        let store = seeded_store();
        let mut cache = SearchCache::default();
        let err = execute(&store, &mut cache, ItemType::Tracks, "bogus=x").unwrap_err();
        match err {
            LibraryError::UnknownField { field, allowed } => {
                assert_eq!(field, "bogus");
                assert_eq!(allowed, vec!["title", "album", "artist"]);
            }
            other => panic!("expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn test_second_search_is_served_from_cache() {
        let store = seeded_store();
        let mut cache = SearchCache::default();

        let first = execute(&store, &mut cache, ItemType::Tracks, "artist=zeppelin").unwrap();
        assert_eq!(store.search_calls.get(), 1);

        let second = execute(&store, &mut cache, ItemType::Tracks, "artist=zeppelin").unwrap();
        assert_eq!(store.search_calls.get(), 1, "cache hit must not query the store");
        assert_eq!(first, second);

        execute(&store, &mut cache, ItemType::Tracks, "artist=beatles").unwrap();
        assert_eq!(store.search_calls.get(), 2);
    }

    #[test]
    fn test_cache_is_consulted_before_field_validation() {
        let store = seeded_store();
        let mut cache = SearchCache::default();
        let cached_rows = vec![LibraryRow::new(vec![
            "x".to_string(),
            "x".to_string(),
            "x".to_string(),
            "{}".to_string(),
        ])];
        cache.put(
            SearchKey {
                item_type: ItemType::Tracks,
                field: "bogus".to_string(),
                pattern: "%x%".to_string(),
            },
            cached_rows.clone(),
        );

        let rows = execute(&store, &mut cache, ItemType::Tracks, "bogus=x").unwrap();
        assert_eq!(rows, cached_rows);
        assert_eq!(store.search_calls.get(), 0);
    }

    #[test]
    fn test_result_lines_format() {
        let rows: Vec<LibraryRow> = (1..=10)
            .map(|n| {
                LibraryRow::new(vec![
                    format!("Track {n}"),
                    "Album".to_string(),
                    "Artist".to_string(),
                    format!(
                        r#"{{"title": "Track {n}", "album": "Album", "creator": "Artist"}}"#
                    ),
                ])
            })
            .collect();

        let lines: Vec<String> = ResultLines::new(ItemType::Tracks, rows)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "( 1) 'Track 1' on 'Album' by 'Artist'");
        assert_eq!(lines[9], "(10) 'Track 10' on 'Album' by 'Artist'");
    }

    #[test]
    fn test_result_lines_use_blob_not_columns() {
        // column says one artist, blob another: the blob wins on display
        let rows = vec![LibraryRow::new(vec![
            "Song".to_string(),
            "Album".to_string(),
            "Column Artist".to_string(),
            r#"{"title": "Song", "album": "Album", "creator": "Blob Artist"}"#.to_string(),
        ])];
        let lines: Vec<String> = ResultLines::new(ItemType::Tracks, rows)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines[0], "(1) 'Song' on 'Album' by 'Blob Artist'");
    }

    #[test]
    fn test_result_lines_surface_corrupt_blob() {
        let rows = vec![LibraryRow::new(vec![
            "Song".to_string(),
            "not json".to_string(),
        ])];
        let mut lines = ResultLines::new(ItemType::Playlists, rows);
        assert!(lines.next().unwrap().is_err());
        assert!(lines.next().is_none());
    }
}
