//! Offset pagination directives.

use crate::config::ListingConfig;

/// Clamped page and page size for one listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSpec {
    current_page: u32,
    limit: u32,
}

impl PaginationSpec {
    /// Parse raw page and limit values.
    ///
    /// A missing, non-numeric or non-positive page becomes 1. A missing or
    /// non-numeric limit becomes the configured default; a numeric one is
    /// clamped into `[1, max_limit_allowed]`.
    pub fn new(config: &ListingConfig, raw_page: Option<&str>, raw_limit: Option<&str>) -> Self {
        let current_page = raw_page
            .and_then(parse_number)
            .filter(|page| *page >= 1)
            .map_or(1, |page| u32::try_from(page).unwrap_or(u32::MAX));

        let limit = raw_limit
            .and_then(parse_number)
            .map_or(config.default_limit(), |limit| {
                let ceiling = config.max_limit_allowed();
                u32::try_from(limit.clamp(1, i64::from(ceiling))).unwrap_or(ceiling)
            });

        Self {
            current_page,
            limit,
        }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Page size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows skipped before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.limit) * u64::from(self.current_page - 1)
    }

    /// Number of pages needed for `record_count` rows. Never zero.
    #[must_use]
    pub fn max_page(&self, record_count: u64) -> u64 {
        if record_count == 0 {
            return 1;
        }
        record_count.div_ceil(u64::from(self.limit))
    }
}

fn parse_number(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
