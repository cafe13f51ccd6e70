pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_MAX_PAGE_LIMIT: i64 = 1000;
pub const DEFAULT_PAGE_LIMIT: i64 = 500;

pub fn db_max_connections() -> u32 {
    std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
}

pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

/// Upper bound on records returned by one `GET /api/matches` page.
pub fn max_page_limit() -> i64 {
    std::env::var("MAX_PAGE_LIMIT")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_PAGE_LIMIT)
}

/// Page size used when a request names no limit. Never above [`max_page_limit`].
pub fn default_page_limit() -> i64 {
    std::env::var("DEFAULT_PAGE_LIMIT")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .min(max_page_limit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default: i64,
    pub max: i64,
}

impl PageLimits {
    pub fn from_env() -> Self {
        Self {
            default: default_page_limit(),
            max: max_page_limit(),
        }
    }

    pub fn resolve(&self, requested: Option<usize>) -> i64 {
        match requested {
            Some(limit) => i64::try_from(limit).unwrap_or(i64::MAX).clamp(1, self.max),
            None => self.default,
        }
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default: DEFAULT_PAGE_LIMIT,
            max: DEFAULT_MAX_PAGE_LIMIT,
        }
    }
}
