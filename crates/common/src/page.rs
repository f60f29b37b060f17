use serde::{Deserialize, Serialize};

/// Page size used when the caller does not supply a usable one.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// A clamped, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl PageRequest {
    /// Builds a page request, clamping out-of-range values.
    ///
    /// `page < 1` becomes 1, `limit < 1` becomes `default_limit`, and any
    /// limit above [`MAX_PAGE_LIMIT`] is capped.
    pub fn new(page: i64, limit: i64, default_limit: i64) -> Self {
        let page = page.max(1);
        let limit = if limit < 1 { default_limit } else { limit };
        Self {
            page,
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Builds a request from optional query parameters.
    pub fn from_query(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self::new(page.unwrap_or(1), limit.unwrap_or(default_limit), default_limit)
    }

    /// The 1-based page number.
    pub fn page(&self) -> i64 {
        self.page
    }

    /// Number of rows per page.
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Number of rows to skip, saturating at `i64::MAX` for absurd page
    /// numbers.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT, DEFAULT_PAGE_LIMIT)
    }
}
