use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Name of the collection holding match documents.
pub const MATCHES_COLLECTION: &str = "matches";

/// Fields stored on a match document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchData {
    pub league_id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league_k_factor: Option<f64>,
    #[serde(default)]
    pub winning_players: Vec<String>,
    #[serde(default)]
    pub losing_players: Vec<String>,
}

/// A match document: store-assigned id plus its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    #[serde(flatten)]
    pub data: MatchData,
}

impl MatchRecord {
    pub fn new(id: impl Into<String>, league_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            data: MatchData {
                league_id: league_id.into(),
                timestamp,
                league_k_factor: None,
                winning_players: Vec::new(),
                losing_players: Vec::new(),
            },
        }
    }

    pub fn league_id(&self) -> &str {
        &self.data.league_id
    }

    pub fn timestamp(&self) -> i64 {
        self.data.timestamp
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey {
            timestamp: self.data.timestamp,
            id: self.id.clone(),
        }
    }
}

/// Position of a record in the canonical match ordering.
///
/// Matches are listed newest first: descending by `timestamp`, ties broken
/// descending by `id` so that equal timestamps still page deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub timestamp: i64,
    pub id: String,
}

impl SortKey {
    pub fn new(timestamp: i64, id: impl Into<String>) -> Self {
        Self {
            timestamp,
            id: id.into(),
        }
    }

    /// Compare two keys by their position in the listing: `Less` means `self`
    /// is listed before `other` (it is newer).
    pub fn listing_cmp(&self, other: &SortKey) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Keys order by listing position, so ascending iteration runs newest to oldest.
impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.listing_cmp(other)
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Canonical listing order for match records.
pub fn cmp_newest_first(a: &MatchRecord, b: &MatchRecord) -> Ordering {
    b.data
        .timestamp
        .cmp(&a.data.timestamp)
        .then_with(|| b.id.cmp(&a.id))
}

/// Request body for creating a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMatch {
    pub league_id: String,
    /// Epoch milliseconds; the server stamps the current time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league_k_factor: Option<f64>,
    #[serde(default)]
    pub winning_players: Vec<String>,
    #[serde(default)]
    pub losing_players: Vec<String>,
}

/// One page of matches from the server, in listing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPage {
    pub records: Vec<MatchRecord>,
    pub has_more: bool,
}
