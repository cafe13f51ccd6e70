use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use courtrank_shared::{MatchRecord, QuerySpec, SortKey};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;

const CACHE_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedMatch {
    record: MatchRecord,
    cached_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: Vec<CachedMatch>,
}

/// Cached matches of one league, indexed by listing position.
#[derive(Debug, Default)]
struct LeagueEntries {
    by_key: BTreeMap<SortKey, CachedMatch>,
    keys: HashMap<String, SortKey>,
    touched_at: Option<DateTime<Utc>>,
}

impl LeagueEntries {
    fn len(&self) -> usize {
        self.by_key.len()
    }

    fn contains_key(&self, key: &SortKey) -> bool {
        self.by_key.contains_key(key)
    }

    fn oldest(&self) -> Option<&SortKey> {
        self.by_key.keys().next_back()
    }

    fn insert(&mut self, record: MatchRecord, cached_at: DateTime<Utc>) {
        let key = record.sort_key();
        if let Some(previous) = self.keys.insert(record.id.clone(), key.clone())
            && previous != key
        {
            self.by_key.remove(&previous);
        }
        self.by_key.insert(key, CachedMatch { record, cached_at });
        self.touched_at = self.touched_at.max(Some(cached_at));
    }

    fn pop_oldest(&mut self) -> Option<MatchRecord> {
        let (key, cached) = self.by_key.pop_last()?;
        self.keys.remove(&key.id);
        Some(cached.record)
    }

    /// Drop every entry listed after `key`. Returns how many were dropped.
    fn truncate_after(&mut self, key: &SortKey) -> usize {
        let mut tail = self.by_key.split_off(key);
        if let Some(kept) = tail.remove(key) {
            self.by_key.insert(key.clone(), kept);
        }
        for dropped in tail.keys() {
            self.keys.remove(&dropped.id);
        }
        tail.len()
    }
}

/// On-device copy of match documents previously read from the server.
///
/// Each league's entries are always a newest-first run of the server listing
/// with no holes: reads that would not join the cached run are skipped or cut
/// it back, and eviction only ever removes a league's oldest entry. Losing the
/// old end is then something a `start_after` read of the oldest entry repairs.
///
/// Holds at most `max_entries` records. At capacity, the league cached least
/// recently gives up its oldest entry.
#[derive(Debug)]
pub struct LocalCache {
    leagues: DashMap<String, LeagueEntries>,
    max_entries: usize,
}

impl LocalCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            leagues: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.leagues.iter().map(|league| league.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.leagues
            .iter()
            .any(|league| league.keys.contains_key(id))
    }

    pub fn query(&self, query: &QuerySpec) -> Vec<MatchRecord> {
        let Some(league) = self.leagues.get(&query.league_id) else {
            return Vec::new();
        };
        league
            .by_key
            .values()
            .map(|cached| &cached.record)
            .filter(|record| query.admits(record))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Cache the result of a server read of `query`.
    ///
    /// A `start_after` read is only kept when its cursor is cached, since the
    /// records between would otherwise be missing. A read from the top of the
    /// listing that does not reach the cached run replaces everything cached
    /// below its last record.
    pub fn store_read(&self, query: &QuerySpec, records: &[MatchRecord]) {
        let Some(last) = records.last() else {
            return;
        };
        let league_id = query.league_id.as_str();
        let last_key = last.sort_key();

        let connected = {
            let league = self.leagues.entry(league_id.to_string()).or_default();
            match &query.start_after {
                Some(cursor) => {
                    if !league.contains_key(cursor) {
                        debug!(league_id, cursor = %cursor.id, "skipping read past uncached cursor");
                        return;
                    }
                    true
                }
                None => {
                    let reached_cursor = query
                        .end_before
                        .as_ref()
                        .is_some_and(|cursor| league.contains_key(cursor))
                        && query.limit.is_none_or(|limit| records.len() < limit);
                    reached_cursor
                        || league.contains_key(&last_key)
                        || league.oldest().is_none_or(|oldest| *oldest <= last_key)
                }
            }
        };

        if !connected && let Some(mut league) = self.leagues.get_mut(league_id) {
            let dropped = league.truncate_after(&last_key);
            debug!(league_id, dropped, "dropped cached matches cut off by newer server read");
        }

        let now = Utc::now();
        let mut previous = query.start_after.clone();
        for record in records.iter().filter(|record| record.league_id() == league_id) {
            {
                let mut league = self.leagues.entry(league_id.to_string()).or_default();
                if let Some(previous) = &previous
                    && !league.contains_key(previous)
                {
                    break;
                }
                league.insert(record.clone(), now);
            }
            self.evict_to_capacity();
            previous = Some(record.sort_key());
        }
    }

    fn evict_to_capacity(&self) {
        while self.len() > self.max_entries {
            let Some(victim) = self.least_recent_league() else {
                break;
            };
            let Some(evicted) = self
                .leagues
                .get_mut(&victim)
                .and_then(|mut league| league.pop_oldest())
            else {
                break;
            };
            debug!(league_id = %victim, match_id = %evicted.id, "evicting oldest cached match");
        }
    }

    fn least_recent_league(&self) -> Option<String> {
        self.leagues
            .iter()
            .filter(|league| league.len() > 0)
            .min_by(|a, b| {
                a.touched_at
                    .cmp(&b.touched_at)
                    .then_with(|| a.key().cmp(b.key()))
            })
            .map(|league| league.key().clone())
    }

    /// Load a cache persisted by [`LocalCache::save`].
    ///
    /// A missing file yields an empty cache. An unreadable, corrupt, or
    /// version-mismatched file is logged and also yields an empty cache.
    pub fn load(path: &Path, max_entries: usize) -> Self {
        let cache = Self::new(max_entries);
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return cache,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read match cache file");
                return cache;
            }
        };
        let file = match serde_json::from_str::<CacheFile>(&raw) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding corrupt match cache file");
                return cache;
            }
        };
        if file.version != CACHE_VERSION {
            warn!(
                path = %path.display(),
                version = file.version,
                "discarding match cache file with unsupported version"
            );
            return cache;
        }

        for entry in file.entries {
            cache
                .leagues
                .entry(entry.record.league_id().to_string())
                .or_default()
                .insert(entry.record, entry.cached_at);
        }
        cache.evict_to_capacity();
        debug!(path = %path.display(), entries = cache.len(), "loaded match cache");
        cache
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let file = CacheFile {
            version: CACHE_VERSION,
            entries: self
                .leagues
                .iter()
                .flat_map(|league| league.by_key.values().cloned().collect::<Vec<_>>())
                .collect(),
        };
        let json = serde_json::to_string(&file)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::window::MatchWindowManager;

    fn temp_cache_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "courtrank-cache-{name}-{}-{}.json",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    /// `count` matches for league `l`, newest first.
    fn fake_matches(count: i64) -> Vec<MatchRecord> {
        (0..count)
            .rev()
            .map(|i| MatchRecord::new(format!("s_{i:03}"), "l", 1000 + i * 10))
            .collect()
    }

    fn top(league_id: &str, limit: usize) -> QuerySpec {
        QuerySpec::league_matches(league_id).limit(limit)
    }

    fn ids(records: &[MatchRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn query_filters_by_league_and_orders_newest_first() {
        let cache = LocalCache::new(10);
        cache.store_read(
            &QuerySpec::league_matches("a"),
            &[MatchRecord::new("a2", "a", 30), MatchRecord::new("a1", "a", 10)],
        );
        cache.store_read(&QuerySpec::league_matches("b"), &[MatchRecord::new("b1", "b", 50)]);
        assert_eq!(ids(&cache.query(&QuerySpec::league_matches("a"))), vec!["a2", "a1"]);
        assert_eq!(ids(&cache.query(&top("a", 1))), vec!["a2"]);
        assert!(cache.query(&QuerySpec::league_matches("c")).is_empty());
    }

    #[test]
    fn capacity_evicts_the_oldest_listed_match() {
        let server = fake_matches(6);
        let cache = LocalCache::new(4);
        cache.store_read(&top("l", 6), &server);

        assert_eq!(cache.len(), 4);
        assert_eq!(ids(&cache.query(&QuerySpec::league_matches("l"))), ids(&server[..4]));
    }

    #[test]
    fn eviction_prefers_the_least_recently_cached_league() {
        let cache = LocalCache::new(3);
        cache.store_read(
            &QuerySpec::league_matches("a"),
            &[MatchRecord::new("a2", "a", 20), MatchRecord::new("a1", "a", 10)],
        );
        std::thread::sleep(std::time::Duration::from_millis(2));
        cache.store_read(
            &QuerySpec::league_matches("b"),
            &[MatchRecord::new("b2", "b", 20), MatchRecord::new("b1", "b", 10)],
        );

        assert_eq!(cache.len(), 3);
        assert!(cache.contains("a2"));
        assert!(!cache.contains("a1"));
        assert!(cache.contains("b1"));
    }

    #[test]
    fn reads_past_an_uncached_cursor_are_skipped() {
        let server = fake_matches(10);
        let cache = LocalCache::new(10);
        cache.store_read(&top("l", 3), &server[..3]);

        cache.store_read(
            &top("l", 3).start_after(server[4].sort_key()),
            &server[5..8],
        );
        assert_eq!(cache.len(), 3);

        cache.store_read(
            &top("l", 3).start_after(server[2].sort_key()),
            &server[3..6],
        );
        assert_eq!(ids(&cache.query(&QuerySpec::league_matches("l"))), ids(&server[..6]));
    }

    #[test]
    fn a_full_page_of_updates_replaces_the_older_run() {
        let server = fake_matches(10);
        let cache = LocalCache::new(20);
        cache.store_read(&top("l", 3), &server[7..]);

        // Newest three above the cached run; server[3..7] is still unseen.
        cache.store_read(
            &top("l", 3).end_before(server[7].sort_key()),
            &server[..3],
        );
        assert_eq!(ids(&cache.query(&QuerySpec::league_matches("l"))), ids(&server[..3]));
    }

    #[test]
    fn updates_that_reach_the_cached_run_are_joined() {
        let server = fake_matches(10);
        let cache = LocalCache::new(20);
        cache.store_read(&top("l", 7), &server[3..]);

        cache.store_read(
            &top("l", 6).end_before(server[3].sort_key()),
            &server[..3],
        );
        assert_eq!(ids(&cache.query(&QuerySpec::league_matches("l"))), ids(&server));
    }

    #[tokio::test]
    async fn evicted_cache_still_pages_through_every_match() {
        let server = fake_matches(60);
        let cache = LocalCache::new(50);
        cache.store_read(&top("l", 40), &server[..40]);
        cache.store_read(
            &top("l", 20).start_after(server[39].sort_key()),
            &server[40..60],
        );
        let cached = cache.query(&QuerySpec::league_matches("l"));
        assert_eq!(ids(&cached), ids(&server[..50]));

        let mut manager = MatchWindowManager::new(MemoryStore::with_tiers(cached, server.clone()), 20);
        manager.initialize(["l"]);
        let mut pages = BTreeMap::new();
        pages.insert(0, ids(&manager.select_league("l").await.expect("select")));
        while !manager.at_end() {
            manager.next_page().await.expect("next page");
            pages.insert(manager.page(), ids(manager.window()));
        }
        let seen: Vec<String> = pages.into_values().flatten().collect();
        assert_eq!(seen, ids(&server));
    }

    #[test]
    fn save_and_load_preserve_entries() {
        let path = temp_cache_path("roundtrip");
        let cache = LocalCache::new(10);
        cache.store_read(
            &QuerySpec::league_matches("l"),
            &[MatchRecord::new("m2", "l", 6), MatchRecord::new("m1", "l", 5)],
        );
        cache.save(&path).expect("save cache");

        let loaded = LocalCache::load(&path, 10);
        assert_eq!(loaded.len(), 2);
        assert_eq!(ids(&loaded.query(&QuerySpec::league_matches("l"))), vec!["m2", "m1"]);

        let smaller = LocalCache::load(&path, 1);
        assert_eq!(ids(&smaller.query(&QuerySpec::league_matches("l"))), vec!["m2"]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_or_corrupt_files_load_empty() {
        let missing = temp_cache_path("missing");
        assert!(LocalCache::load(&missing, 10).is_empty());

        let corrupt = temp_cache_path("corrupt");
        fs::write(&corrupt, "{not json").expect("write corrupt file");
        assert!(LocalCache::load(&corrupt, 10).is_empty());
        let _ = fs::remove_file(&corrupt);
    }
}
