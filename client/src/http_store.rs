use async_trait::async_trait;
use courtrank_shared::{MatchPage, MatchQueryParams, MatchRecord, NewMatch, QuerySpec};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::StoreError;
use crate::local_cache::LocalCache;
use crate::store::{DocumentStore, Snapshot};

/// [`DocumentStore`] backed by the match server, with a [`LocalCache`] as its cache tier.
///
/// Successful server reads are offered to the cache, which keeps the ones that
/// extend its cached run of each league.
pub struct HttpMatchStore {
    http_client: reqwest::Client,
    matches_url: String,
    cache: LocalCache,
}

impl HttpMatchStore {
    pub fn new(config: &ClientConfig, cache: LocalCache) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .user_agent("courtrank-client/0.1")
            .timeout(config.http_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self::with_client(http_client, &config.api_url, cache))
    }

    pub fn with_client(http_client: reqwest::Client, api_url: &str, cache: LocalCache) -> Self {
        Self {
            http_client,
            matches_url: format!("{}/api/matches", api_url.trim_end_matches('/')),
            cache,
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    async fn fetch_page(&self, params: &MatchQueryParams) -> Result<MatchPage, StoreError> {
        let resp = self
            .http_client
            .get(&self.matches_url)
            .query(params)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(StoreError::Status(resp.status().as_u16()));
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice::<MatchPage>(&body)?)
    }

    /// Create a match on the server and return the stored record.
    ///
    /// The record is not cached: other matches may sit between it and the
    /// cached run. The next update read picks it up.
    pub async fn create_match(&self, new_match: &NewMatch) -> Result<MatchRecord, StoreError> {
        let resp = self
            .http_client
            .post(&self.matches_url)
            .json(new_match)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(StoreError::Status(resp.status().as_u16()));
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice::<MatchRecord>(&body)?)
    }
}

#[async_trait]
impl DocumentStore for HttpMatchStore {
    async fn read_from_cache(&self, query: &QuerySpec) -> Result<Snapshot, StoreError> {
        Ok(Snapshot::new(self.cache.query(query)))
    }

    /// Follows `has_more` continuation pages until the query's limit is met or
    /// the server runs out of records, so an unlimited query returns the full set.
    async fn read_from_server(&self, query: &QuerySpec) -> Result<Snapshot, StoreError> {
        let mut records: Vec<MatchRecord> = Vec::new();
        let mut params = MatchQueryParams::from_spec(query);

        loop {
            params.limit = query.limit.map(|limit| limit.saturating_sub(records.len()));
            if params.limit == Some(0) {
                break;
            }
            let page = self.fetch_page(&params).await?;
            let Some(last) = page.records.last() else {
                break;
            };
            let cursor = last.sort_key();
            records.extend(page.records);
            if !page.has_more {
                break;
            }
            params.start_after_ts = Some(cursor.timestamp);
            params.start_after_id = Some(cursor.id);
        }

        if let Some(limit) = query.limit
            && records.len() > limit
        {
            warn!(
                limit,
                returned = records.len(),
                "match server returned more records than requested"
            );
            records.truncate(limit);
        }

        debug!(query = %query, returned = records.len(), "server read");
        self.cache.store_read(query, &records);
        Ok(Snapshot::new(records))
    }
}
