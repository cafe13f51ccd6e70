use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use courtrank_shared::{MatchRecord, QuerySpec};
use tokio::sync::{Mutex, RwLock};

use crate::error::StoreError;
use crate::store::{DocumentStore, Snapshot};

/// In-process [`DocumentStore`] with independently controlled cache and server tiers.
///
/// Server reads are not written through to the cache tier; callers arrange both
/// tiers explicitly. Every server query is recorded so its shape can be inspected.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cache: RwLock<Vec<MatchRecord>>,
    server: RwLock<Vec<MatchRecord>>,
    server_queries: Mutex<Vec<QuerySpec>>,
    cache_reads: AtomicU64,
    fail_cache: AtomicBool,
    fail_server: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tiers(cache: Vec<MatchRecord>, server: Vec<MatchRecord>) -> Self {
        Self {
            cache: RwLock::new(cache),
            server: RwLock::new(server),
            ..Self::default()
        }
    }

    pub async fn insert_server(&self, records: impl IntoIterator<Item = MatchRecord>) {
        self.server.write().await.extend(records);
    }

    pub fn fail_cache_reads(&self, fail: bool) {
        self.fail_cache.store(fail, Ordering::Relaxed);
    }

    pub fn fail_server_reads(&self, fail: bool) {
        self.fail_server.store(fail, Ordering::Relaxed);
    }

    pub fn cache_read_count(&self) -> u64 {
        self.cache_reads.load(Ordering::Relaxed)
    }

    pub async fn server_queries(&self) -> Vec<QuerySpec> {
        self.server_queries.lock().await.clone()
    }

    pub async fn server_read_count(&self) -> usize {
        self.server_queries.lock().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read_from_cache(&self, query: &QuerySpec) -> Result<Snapshot, StoreError> {
        self.cache_reads.fetch_add(1, Ordering::Relaxed);
        if self.fail_cache.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("cache read failed".to_string()));
        }
        let cache = self.cache.read().await;
        Ok(Snapshot::new(query.evaluate(cache.iter())))
    }

    async fn read_from_server(&self, query: &QuerySpec) -> Result<Snapshot, StoreError> {
        self.server_queries.lock().await.push(query.clone());
        if self.fail_server.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("server read failed".to_string()));
        }
        let server = self.server.read().await;
        Ok(Snapshot::new(query.evaluate(server.iter())))
    }
}
