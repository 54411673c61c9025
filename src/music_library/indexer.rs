//! Full rebuild of the mirror from the remote catalog.
//!
//! [`Reindex`] is a lazy iterator of status lines: pulling the next line
//! performs the next slice of work, so nothing touches the store or the
//! network until the caller starts consuming, and abandoning the iterator
//! abandons the rebuild. After yielding an error the iterator is finished.
//!
//! One pull boundary sits after every announcement and after every
//! ingested page; page inserts are committed before their progress line
//! is handed out.

use tracing::{debug, warn};

use super::error::LibraryError;
use super::item_type::ItemType;
use super::trait_def::{LibraryStore, RemoteCatalog};

/// Upper bound on items requested per catalog page.
const PAGE_SIZE: usize = 1000;

pub struct Reindex<'a> {
    store: &'a dyn LibraryStore,
    remote: &'a dyn RemoteCatalog,
    phase: Phase,
}

enum Phase {
    Start,
    DropPending,
    CreatePending,
    Ingest {
        position: usize,
        progress: Option<TypeProgress>,
    },
    Finished,
}

struct TypeProgress {
    fields: Vec<String>,
    total: usize,
    count: usize,
}

impl<'a> Reindex<'a> {
    pub(crate) fn new(store: &'a dyn LibraryStore, remote: &'a dyn RemoteCatalog) -> Self {
        Self {
            store,
            remote,
            phase: Phase::Start,
        }
    }

    fn step(&mut self) -> Result<Option<String>, LibraryError> {
        // phase stays Finished if the step below errors out
        match std::mem::replace(&mut self.phase, Phase::Finished) {
            Phase::Start => {
                if self.store.is_indexed()? {
                    self.phase = Phase::DropPending;
                    return Ok(Some("Deleting tables".to_string()));
                }
                let names = self.store.table_names()?;
                if !names.is_empty() {
                    warn!(
                        tables = names.join(", "),
                        "library database is in a partial state, leaving tables untouched"
                    );
                }
                self.phase = Phase::CreatePending;
                Ok(Some("Creating tables".to_string()))
            }
            Phase::DropPending => {
                self.store.drop_schema()?;
                self.phase = Phase::CreatePending;
                Ok(Some("Creating tables".to_string()))
            }
            Phase::CreatePending => {
                self.store.create_schema()?;
                self.phase = Phase::Ingest {
                    position: 0,
                    progress: None,
                };
                Ok(Some(announce(0)))
            }
            Phase::Ingest { position, progress } => self.ingest_step(position, progress),
            Phase::Finished => Ok(None),
        }
    }

    fn ingest_step(
        &mut self,
        position: usize,
        progress: Option<TypeProgress>,
    ) -> Result<Option<String>, LibraryError> {
        let item_type = ItemType::INDEXING_ORDER[position];
        let mut progress = match progress {
            Some(progress) => progress,
            None => {
                let fields = self.store.searchable_columns(item_type)?;
                let probe = self
                    .remote
                    .fetch_page(item_type, 0, 1)
                    .map_err(LibraryError::Device)?;
                debug!(item_type = %item_type, total = probe.total_matches, "probed catalog size");
                TypeProgress {
                    fields,
                    total: probe.total_matches,
                    count: 0,
                }
            }
        };

        if progress.count < progress.total {
            let page = self
                .remote
                .fetch_page(item_type, progress.count, PAGE_SIZE)
                .map_err(LibraryError::Device)?;
            if page.items.is_empty() {
                return Err(LibraryError::Device(anyhow::anyhow!(
                    "Remote returned an empty page for {} at offset {} of {}",
                    item_type,
                    progress.count,
                    progress.total
                )));
            }

            let mut rows = Vec::with_capacity(page.items.len());
            for item in &page.items {
                let mut values = Vec::with_capacity(progress.fields.len() + 1);
                for field in &progress.fields {
                    let remote_name = ItemType::remote_attribute(field);
                    values.push(item.attribute(remote_name).unwrap_or_default().to_string());
                }
                values.push(item.to_db_str()?);
                rows.push(values);
            }
            self.store.insert_page(item_type, &rows)?;
            progress.count += page.items.len();
            debug!(
                item_type = %item_type,
                count = progress.count,
                total = progress.total,
                "ingested catalog page"
            );

            let line = progress_line(progress.count, progress.total);
            self.phase = Phase::Ingest {
                position,
                progress: Some(progress),
            };
            return Ok(Some(line));
        }

        let next_position = position + 1;
        if next_position < ItemType::INDEXING_ORDER.len() {
            self.phase = Phase::Ingest {
                position: next_position,
                progress: None,
            };
            Ok(Some(announce(next_position)))
        } else {
            Ok(None)
        }
    }
}

impl Iterator for Reindex<'_> {
    type Item = Result<String, LibraryError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

fn announce(position: usize) -> String {
    format!("Adding: {}", ItemType::INDEXING_ORDER[position])
}

fn progress_line(count: usize, total: usize) -> String {
    let percent = count * 100 / total;
    let width = total.to_string().len();
    format!("{percent:>3}%  {count:>width$} out of {total:>width$}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music_library::records::ItemRecord;
    use crate::music_library::store::SqliteLibraryStore;
    use crate::music_library::trait_def::{BrowsePage, RemoteItem};
    use anyhow::bail;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeCatalog {
        items: HashMap<ItemType, Vec<RemoteItem>>,
        calls: RefCell<Vec<(ItemType, usize, usize)>>,
        fail_for: Option<ItemType>,
    }

    impl FakeCatalog {
        fn new() -> Self {
            Self {
                items: HashMap::new(),
                calls: RefCell::new(Vec::new()),
                fail_for: None,
            }
        }

        fn with_tracks(mut self, titles: &[(&str, &str, &str)]) -> Self {
            let items = titles
                .iter()
                .map(|(title, album, creator)| {
                    RemoteItem::new(ItemRecord {
                        title: title.to_string(),
                        album: Some(album.to_string()),
                        creator: Some(creator.to_string()),
                        ..Default::default()
                    })
                })
                .collect();
            self.items.insert(ItemType::Tracks, items);
            self
        }

        fn with_titles(mut self, item_type: ItemType, titles: &[&str]) -> Self {
            let items = titles
                .iter()
                .map(|title| {
                    RemoteItem::new(ItemRecord {
                        title: title.to_string(),
                        ..Default::default()
                    })
                })
                .collect();
            self.items.insert(item_type, items);
            self
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl RemoteCatalog for FakeCatalog {
        fn fetch_page(
            &self,
            item_type: ItemType,
            start: usize,
            max_items: usize,
        ) -> anyhow::Result<BrowsePage> {
            self.calls.borrow_mut().push((item_type, start, max_items));
            if self.fail_for == Some(item_type) {
                bail!("catalog browse failed");
            }
            let all = self.items.get(&item_type).cloned().unwrap_or_default();
            let end = (start + max_items).min(all.len());
            let items: Vec<RemoteItem> = all
                .get(start..end)
                .map(<[RemoteItem]>::to_vec)
                .unwrap_or_default();
            let number_returned = items.len();
            Ok(BrowsePage {
                items,
                total_matches: all.len(),
                number_returned,
            })
        }
    }

    fn test_store() -> SqliteLibraryStore {
        SqliteLibraryStore::open_in_memory().unwrap()
    }

    fn run_to_end(store: &SqliteLibraryStore, remote: &FakeCatalog) -> Vec<String> {
        Reindex::new(store, remote)
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn test_fresh_index_line_sequence() {
        let store = test_store();
        let remote = FakeCatalog::new()
            .with_titles(ItemType::Playlists, &["Morning", "Evening"])
            .with_titles(ItemType::Artists, &["Nina Simone"])
            .with_tracks(&[
                ("Feeling Good", "I Put a Spell on You", "Nina Simone"),
                ("Sinnerman", "Pastel Blues", "Nina Simone"),
                ("Four Women", "Wild Is the Wind", "Nina Simone"),
            ]);

        let lines = run_to_end(&store, &remote);
        assert_eq!(
            lines,
            vec![
                "Creating tables",
                "Adding: playlists",
                "100%  2 out of 2",
                "Adding: artists",
                "100%  1 out of 1",
                "Adding: albums",
                "Adding: tracks",
                "100%  3 out of 3",
            ]
        );

        assert_eq!(store.count(ItemType::Playlists).unwrap(), 2);
        assert_eq!(store.count(ItemType::Artists).unwrap(), 1);
        assert_eq!(store.count(ItemType::Albums).unwrap(), 0);
        assert_eq!(store.count(ItemType::Tracks).unwrap(), 3);
        assert!(store.is_indexed().unwrap());
    }

    #[test]
    fn test_row_counts_match_probed_totals() {
        let store = test_store();
        let titles: Vec<String> = (1..=2500).map(|n| format!("Track {n}")).collect();
        let title_refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let remote = FakeCatalog::new().with_titles(ItemType::Tracks, &title_refs);

        let lines = run_to_end(&store, &remote);
        assert_eq!(store.count(ItemType::Tracks).unwrap(), 2500);

        let progress: Vec<&String> =
            lines.iter().filter(|line| line.contains("out of")).collect();
        assert_eq!(
            progress,
            vec![
                " 40%  1000 out of 2500",
                " 80%  2000 out of 2500",
                "100%  2500 out of 2500",
            ]
        );

        // probe first, then pages from the running offset
        let calls = remote.calls.borrow();
        let track_calls: Vec<(usize, usize)> = calls
            .iter()
            .filter(|(item_type, _, _)| *item_type == ItemType::Tracks)
            .map(|(_, start, max)| (*start, *max))
            .collect();
        assert_eq!(
            track_calls,
            vec![(0, 1), (0, 1000), (1000, 1000), (2000, 1000)]
        );
    }

    #[test]
    fn test_nothing_happens_before_first_pull() {
        let store = test_store();
        let remote = FakeCatalog::new().with_titles(ItemType::Playlists, &["Lazy"]);
        {
            let _reindex = Reindex::new(&store, &remote);
        }
        assert_eq!(remote.call_count(), 0);
        assert!(store.table_names().unwrap().is_empty());
    }

    #[test]
    fn test_work_happens_between_pulls() {
        let store = test_store();
        let remote = FakeCatalog::new().with_titles(ItemType::Playlists, &["Only One"]);
        let mut reindex = Reindex::new(&store, &remote);

        assert_eq!(reindex.next().unwrap().unwrap(), "Creating tables");
        // announced but not yet created: the work runs on the next pull
        assert!(store.table_names().unwrap().is_empty());

        assert_eq!(reindex.next().unwrap().unwrap(), "Adding: playlists");
        assert!(store.is_indexed().unwrap());
        assert_eq!(remote.call_count(), 0, "no probe before its pull");

        assert_eq!(reindex.next().unwrap().unwrap(), "100%  1 out of 1");
        assert_eq!(store.count(ItemType::Playlists).unwrap(), 1);
    }

    #[test]
    fn test_reindex_of_indexed_store_deletes_first() {
        let store = test_store();
        let remote = FakeCatalog::new().with_titles(ItemType::Playlists, &["Morning"]);
        run_to_end(&store, &remote);

        let second = run_to_end(&store, &remote);
        assert_eq!(second.first().map(String::as_str), Some("Deleting tables"));
        assert_eq!(store.count(ItemType::Playlists).unwrap(), 1);
    }

    #[test]
    fn test_reindex_twice_yields_identical_rows() {
        let store = test_store();
        let remote = FakeCatalog::new()
            .with_titles(ItemType::Playlists, &["Morning", "Evening"])
            .with_tracks(&[("Feeling Good", "Spell", "Nina Simone")]);

        run_to_end(&store, &remote);
        let first = store
            .search_by_field(ItemType::Tracks, "title", "%%")
            .unwrap();
        run_to_end(&store, &remote);
        let second = store
            .search_by_field(ItemType::Tracks, "title", "%%")
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_album_artist_is_ingested_from_creator() {
        let store = test_store();
        let remote = FakeCatalog::new().with_tracks(&[("Song", "Album", "The Creator")]);
        run_to_end(&store, &remote);

        let rows = store
            .search_by_field(ItemType::Tracks, "artist", "%The Creator%")
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values()[2], "The Creator");

        // the stored record keeps the remote field name
        let record = ItemRecord::from_db_str(rows[0].content()).unwrap();
        assert_eq!(record.creator.as_deref(), Some("The Creator"));
    }

    #[test]
    fn test_remote_failure_aborts_and_fuses() {
        let store = test_store();
        let mut remote = FakeCatalog::new()
            .with_titles(ItemType::Playlists, &["Morning"])
            .with_titles(ItemType::Artists, &["Someone"]);
        remote.fail_for = Some(ItemType::Artists);

        let mut reindex = Reindex::new(&store, &remote);
        let mut lines = Vec::new();
        let error = loop {
            match reindex.next().unwrap() {
                Ok(line) => lines.push(line),
                Err(e) => break e,
            }
        };
        assert!(matches!(error, LibraryError::Device(_)));
        assert_eq!(
            lines,
            vec![
                "Creating tables",
                "Adding: playlists",
                "100%  1 out of 1",
                "Adding: artists",
            ]
        );
        assert!(reindex.next().is_none(), "iterator must finish after an error");

        // playlists landed before the abort, artists never did
        assert_eq!(store.count(ItemType::Playlists).unwrap(), 1);
        assert_eq!(store.count(ItemType::Artists).unwrap(), 0);
    }

    #[test]
    fn test_partial_table_state_is_never_dropped() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("musiclib.db");
        {
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.execute("CREATE TABLE tracks (title TEXT, content TEXT)", [])
                .unwrap();
        }
        let store = SqliteLibraryStore::open(&path).unwrap();
        let remote = FakeCatalog::new();

        let mut reindex = Reindex::new(&store, &remote);
        assert_eq!(reindex.next().unwrap().unwrap(), "Creating tables");
        assert!(reindex.next().unwrap().is_err());
        assert!(reindex.next().is_none());

        // the leftover table is still there, untouched
        assert_eq!(store.table_names().unwrap(), vec!["tracks"]);
    }

    #[test]
    fn test_abandoned_rebuild_leaves_partial_state() {
        let store = test_store();
        let remote = FakeCatalog::new()
            .with_titles(ItemType::Playlists, &["Morning"])
            .with_tracks(&[("Song", "Album", "Artist")]);

        let mut reindex = Reindex::new(&store, &remote);
        for _ in 0..3 {
            reindex.next().unwrap().unwrap();
        }
        drop(reindex);

        assert_eq!(store.count(ItemType::Playlists).unwrap(), 1);
        assert_eq!(store.count(ItemType::Tracks).unwrap(), 0);
    }
}
