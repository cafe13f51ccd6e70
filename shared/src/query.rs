use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matches::{MATCHES_COLLECTION, MatchRecord, SortKey, cmp_newest_first};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    Timestamp,
    Id,
}

impl OrderField {
    pub fn column(self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Id => "id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: OrderField,
    pub direction: Direction,
}

/// Every match query is ordered newest first with the record id as tie-break.
pub const MATCH_ORDER: [OrderBy; 2] = [
    OrderBy {
        field: OrderField::Timestamp,
        direction: Direction::Desc,
    },
    OrderBy {
        field: OrderField::Id,
        direction: Direction::Desc,
    },
];

/// A filtered, ordered, optionally bounded query over the matches of one league.
///
/// Cursors are exclusive. Results are the first `limit` records of the ordering
/// that fall strictly after `start_after` and strictly before `end_before`, so
/// `end_before` combined with `limit` yields the newest records above the
/// cursor rather than the ones adjacent to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub collection: &'static str,
    pub league_id: String,
    pub limit: Option<usize>,
    pub start_after: Option<SortKey>,
    pub end_before: Option<SortKey>,
}

impl QuerySpec {
    pub fn league_matches(league_id: impl Into<String>) -> Self {
        Self {
            collection: MATCHES_COLLECTION,
            league_id: league_id.into(),
            limit: None,
            start_after: None,
            end_before: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, key: SortKey) -> Self {
        self.start_after = Some(key);
        self
    }

    pub fn end_before(mut self, key: SortKey) -> Self {
        self.end_before = Some(key);
        self
    }

    pub fn order(&self) -> &'static [OrderBy] {
        &MATCH_ORDER
    }

    /// `ORDER BY` body for SQL backends, e.g. `"timestamp" DESC, "id" DESC`.
    pub fn order_clause(&self) -> String {
        self.order()
            .iter()
            .map(|order| format!("\"{}\" {}", order.field.column(), order.direction.keyword()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether `record` passes the league filter and both cursors.
    pub fn admits(&self, record: &MatchRecord) -> bool {
        if record.league_id() != self.league_id {
            return false;
        }
        let key = record.sort_key();
        if let Some(start_after) = &self.start_after
            && key.listing_cmp(start_after) != Ordering::Greater
        {
            return false;
        }
        if let Some(end_before) = &self.end_before
            && key.listing_cmp(end_before) != Ordering::Less
        {
            return false;
        }
        true
    }

    /// Evaluate the query against an unordered set of records.
    pub fn evaluate<'a, I>(&self, records: I) -> Vec<MatchRecord>
    where
        I: IntoIterator<Item = &'a MatchRecord>,
    {
        let mut selected: Vec<MatchRecord> = records
            .into_iter()
            .filter(|record| self.admits(record))
            .cloned()
            .collect();
        selected.sort_by(cmp_newest_first);
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} where league_id == {}", self.collection, self.league_id)?;
        if let Some(key) = &self.start_after {
            write!(f, " start_after ({}, {})", key.timestamp, key.id)?;
        }
        if let Some(key) = &self.end_before {
            write!(f, " end_before ({}, {})", key.timestamp, key.id)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit {limit}")?;
        }
        Ok(())
    }
}

/// Query-string form of a [`QuerySpec`] for `GET /api/matches`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchQueryParams {
    #[serde(default)]
    pub league_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_after_ts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_after_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_before_ts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_before_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryParamsError {
    #[error("league_id is required")]
    MissingLeague,
    #[error("{0} needs both its timestamp and id components")]
    HalfCursor(&'static str),
}

fn cursor_from_parts(
    name: &'static str,
    timestamp: Option<i64>,
    id: Option<String>,
) -> Result<Option<SortKey>, QueryParamsError> {
    match (timestamp, id) {
        (Some(timestamp), Some(id)) => Ok(Some(SortKey { timestamp, id })),
        (None, None) => Ok(None),
        _ => Err(QueryParamsError::HalfCursor(name)),
    }
}

impl MatchQueryParams {
    pub fn from_spec(spec: &QuerySpec) -> Self {
        Self {
            league_id: spec.league_id.clone(),
            limit: spec.limit,
            start_after_ts: spec.start_after.as_ref().map(|key| key.timestamp),
            start_after_id: spec.start_after.as_ref().map(|key| key.id.clone()),
            end_before_ts: spec.end_before.as_ref().map(|key| key.timestamp),
            end_before_id: spec.end_before.as_ref().map(|key| key.id.clone()),
        }
    }

    pub fn into_spec(self) -> Result<QuerySpec, QueryParamsError> {
        let league_id = self.league_id.trim().to_string();
        if league_id.is_empty() {
            return Err(QueryParamsError::MissingLeague);
        }
        Ok(QuerySpec {
            collection: MATCHES_COLLECTION,
            league_id,
            limit: self.limit,
            start_after: cursor_from_parts("start_after", self.start_after_ts, self.start_after_id)?,
            end_before: cursor_from_parts("end_before", self.end_before_ts, self.end_before_id)?,
        })
    }
}
