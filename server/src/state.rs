use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use sqlx::PgPool;

use crate::config::PageLimits;

#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL pool holding the match collection. None if no database is configured.
    pub db: Option<PgPool>,
    pub page_limits: PageLimits,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    match_list_requests_total: AtomicU64,
    matches_created_total: AtomicU64,
    db_errors_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub match_list_requests_total: u64,
    pub matches_created_total: u64,
    pub db_errors_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            match_list_requests_total: self.match_list_requests_total.load(Ordering::Relaxed),
            matches_created_total: self.matches_created_total.load(Ordering::Relaxed),
            db_errors_total: self.db_errors_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_match_list_request(&self) {
        self.match_list_requests_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_match_created(&self) {
        self.matches_created_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_db_error(&self) {
        self.db_errors_total.fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(db: Option<PgPool>) -> Self {
        Self {
            db,
            page_limits: PageLimits::from_env(),
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }
}
