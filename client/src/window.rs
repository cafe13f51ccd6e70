use std::collections::HashMap;

use courtrank_shared::{MatchRecord, QuerySpec, ValidationReport};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::WindowError;
use crate::reconcile::fetch_league_matches;
use crate::store::DocumentStore;

/// Paging position for the selected league, published to subscribers on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorState {
    pub league: Option<String>,
    pub page: usize,
    pub at_start: bool,
    pub at_end: bool,
    pub window_len: usize,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            league: None,
            page: 0,
            at_start: true,
            at_end: false,
            window_len: 0,
        }
    }
}

/// Per-league match lists with a page-sized window over the selected league.
///
/// Lists only grow: they are filled by the reconciliation fetch on first
/// selection and extended one page at a time as the window nears their end.
/// Mutating operations take `&mut self`, so at most one can be in flight.
pub struct MatchWindowManager<S> {
    store: S,
    page_size: usize,
    leagues: HashMap<String, Vec<MatchRecord>>,
    cursor: watch::Sender<CursorState>,
}

fn window_bounds(len: usize, page: usize, page_size: usize) -> (usize, usize) {
    let start = (page * page_size).min(len);
    let end = ((page + 1) * page_size).min(len);
    (start, end)
}

impl<S: DocumentStore> MatchWindowManager<S> {
    pub fn new(store: S, page_size: usize) -> Self {
        let (cursor, _) = watch::channel(CursorState::default());
        Self {
            store,
            page_size: page_size.max(1),
            leagues: HashMap::new(),
            cursor,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn subscribe(&self) -> watch::Receiver<CursorState> {
        self.cursor.subscribe()
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor.borrow().clone()
    }

    pub fn current_league(&self) -> Option<String> {
        self.cursor.borrow().league.clone()
    }

    pub fn page(&self) -> usize {
        self.cursor.borrow().page
    }

    pub fn at_start(&self) -> bool {
        self.cursor.borrow().at_start
    }

    pub fn at_end(&self) -> bool {
        self.cursor.borrow().at_end
    }

    /// Number of matches held in memory for `league_id`.
    pub fn league_len(&self, league_id: &str) -> Option<usize> {
        self.leagues.get(league_id).map(Vec::len)
    }

    /// The visible page of the selected league.
    pub fn window(&self) -> &[MatchRecord] {
        let cursor = self.cursor.borrow();
        let Some(list) = cursor
            .league
            .as_deref()
            .and_then(|league| self.leagues.get(league))
        else {
            return &[];
        };
        let (start, end) = window_bounds(list.len(), cursor.page, self.page_size);
        &list[start..end]
    }

    fn window_len(&self, league_id: &str, page: usize) -> usize {
        let len = self.league_len(league_id).unwrap_or(0);
        let (start, end) = window_bounds(len, page, self.page_size);
        end - start
    }

    /// Reset to an empty list for each league. Discards all fetched matches and the cursor.
    pub fn initialize<I, L>(&mut self, league_ids: I)
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.leagues = league_ids
            .into_iter()
            .map(|id| (id.into(), Vec::new()))
            .collect();
        self.cursor.send_replace(CursorState::default());
        info!(leagues = self.leagues.len(), "match window manager initialized");
    }

    /// Select a league and return its first page, fetching its matches on first use.
    pub async fn select_league(&mut self, league_id: &str) -> Result<Vec<MatchRecord>, WindowError> {
        let Some(list) = self.leagues.get(league_id) else {
            return Err(WindowError::NotFound(league_id.to_string()));
        };

        if list.is_empty() {
            let fetched = fetch_league_matches(&self.store, league_id, self.page_size).await?;
            info!(league_id, matches = fetched.len(), "loaded league matches");
            self.leagues.insert(league_id.to_string(), fetched);
        }

        let len = self.league_len(league_id).unwrap_or(0);
        let at_end = len <= self.page_size;
        let window_len = self.window_len(league_id, 0);
        self.cursor.send_replace(CursorState {
            league: Some(league_id.to_string()),
            page: 0,
            at_start: true,
            at_end,
            window_len,
        });
        Ok(self.window().to_vec())
    }

    /// Advance one page, keeping one page of lookahead buffered.
    ///
    /// Slides the window when the list already holds records past it, then
    /// fetches the next page from the server whenever the list does not extend
    /// beyond the new window. An empty fetch marks the end of the league and
    /// triggers a consistency check against the server.
    pub async fn next_page(&mut self) -> Result<(), WindowError> {
        let cursor = self.cursor();
        let Some(league_id) = cursor.league else {
            return Err(WindowError::NoLeagueSelected);
        };
        if cursor.at_end {
            return Err(WindowError::AtEnd);
        }
        let list = self
            .leagues
            .get(&league_id)
            .ok_or_else(|| WindowError::NotFound(league_id.clone()))?;

        let mut page = cursor.page;
        if list.len() > (page + 1) * self.page_size {
            page += 1;
        }

        let mut fetched = None;
        if list.len() <= (page + 1) * self.page_size {
            let mut query = QuerySpec::league_matches(&league_id).limit(self.page_size);
            if let Some(last) = list.last() {
                query = query.start_after(last.sort_key());
            }
            let snapshot = self.store.read_from_server(&query).await?;
            debug!(league_id, fetched = snapshot.len(), "fetched lookahead page");
            fetched = Some(snapshot.records);
        }

        let reached_end = fetched.as_ref().is_some_and(Vec::is_empty);
        if let Some(records) = fetched
            && let Some(list) = self.leagues.get_mut(&league_id)
        {
            list.extend(records);
        }

        let window_len = self.window_len(&league_id, page);
        self.cursor.send_modify(|state| {
            state.page = page;
            state.at_start = page == 0;
            state.at_end = reached_end;
            state.window_len = window_len;
        });

        if reached_end {
            info!(league_id, page, "reached end of league matches");
            self.check_consistency(&league_id).await;
        }
        Ok(())
    }

    /// Step back one page. Never fetches: every earlier page is still in memory.
    pub fn prev_page(&mut self) -> Result<(), WindowError> {
        let cursor = self.cursor();
        if cursor.at_start {
            return Err(WindowError::AtStart);
        }
        let Some(league_id) = cursor.league else {
            return Err(WindowError::NoLeagueSelected);
        };

        let page = cursor.page.saturating_sub(1);
        let window_len = self.window_len(&league_id, page);
        self.cursor.send_modify(|state| {
            state.page = page;
            state.at_start = page == 0;
            state.at_end = false;
            state.window_len = window_len;
        });
        Ok(())
    }

    /// Compare the in-memory list for `league_id` with the server's full ordered set.
    ///
    /// Diagnostic only: never changes the held matches or the cursor.
    pub async fn validate_against_server(
        &self,
        league_id: &str,
    ) -> Result<ValidationReport, WindowError> {
        let Some(memory) = self.leagues.get(league_id) else {
            return Err(WindowError::NotFound(league_id.to_string()));
        };
        let server = self
            .store
            .read_from_server(&QuerySpec::league_matches(league_id))
            .await?;
        Ok(ValidationReport::compare(league_id, &server.records, memory))
    }

    async fn check_consistency(&self, league_id: &str) {
        match self.validate_against_server(league_id).await {
            Ok(report) if report.is_consistent() => {
                debug!(league_id, matches = report.memory_count, "league matches consistent with server");
            }
            Ok(report) => {
                warn!(
                    league_id,
                    server_count = report.server_count,
                    memory_count = report.memory_count,
                    missing = ?report.missing_from_memory,
                    extra = ?report.extra_in_memory,
                    duplicated = ?report.duplicated_in_memory,
                    "league matches diverge from server"
                );
            }
            Err(e) => {
                warn!(league_id, error = %e, "failed to validate league matches against server");
            }
        }
    }
}
