use async_trait::async_trait;
use courtrank_shared::{MatchRecord, QuerySpec};

use crate::error::StoreError;

/// Records returned by one query, in listing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub records: Vec<MatchRecord>,
}

impl Snapshot {
    pub fn new(records: Vec<MatchRecord>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn first(&self) -> Option<&MatchRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&MatchRecord> {
        self.records.last()
    }
}

/// Two-tier source of match documents.
///
/// Both reads must return records sorted newest first by `(timestamp, id)`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read from the on-device cache only. Never touches the network.
    async fn read_from_cache(&self, query: &QuerySpec) -> Result<Snapshot, StoreError>;

    /// Read from the authoritative server.
    async fn read_from_server(&self, query: &QuerySpec) -> Result<Snapshot, StoreError>;
}
