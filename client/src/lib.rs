pub mod config;
pub mod error;
pub mod http_store;
pub mod local_cache;
pub mod memory_store;
pub mod reconcile;
pub mod store;
pub mod window;

pub use config::ClientConfig;
pub use error::{StoreError, WindowError};
pub use http_store::HttpMatchStore;
pub use local_cache::LocalCache;
pub use memory_store::MemoryStore;
pub use reconcile::fetch_league_matches;
pub use store::{DocumentStore, Snapshot};
pub use window::{CursorState, MatchWindowManager};
