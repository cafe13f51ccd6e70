use thiserror::Error;

/// Failure of a cache or server read.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to match server failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("match server responded with status {0}")]
    Status(u16),
    #[error("failed to decode match data: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("match cache file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("match store unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by [`crate::MatchWindowManager`] operations.
#[derive(Debug, Error)]
pub enum WindowError {
    #[error("league {0} is not known to the match window manager")]
    NotFound(String),
    #[error("already at the last page of matches")]
    AtEnd,
    #[error("already at the first page of matches")]
    AtStart,
    #[error("no league selected")]
    NoLeagueSelected,
    #[error(transparent)]
    Store(#[from] StoreError),
}
