use serde::Serialize;

use crate::options::QueryOptions;

/// Raw pagination parameters in either convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Offset of the first row (PrimeNG lazy load).
    pub first: Option<i64>,
    /// Rows per page (PrimeNG lazy load).
    pub rows: Option<i64>,
}

/// Canonical 1-based page and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Pagination {
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    #[must_use]
    pub const fn total_pages(&self, total: u64) -> u64 {
        let per_page = if self.per_page == 0 { 1 } else { self.per_page };
        total.div_ceil(per_page)
    }
}

fn clamp(value: i64, min: u64, max: u64) -> u64 {
    u64::try_from(value).unwrap_or(0).clamp(min, max)
}

/// Normalize either convention to `(page, per_page)`.
///
/// `first`/`rows` win when both are present: `rows` is clamped to
/// `[1, min(max_rows, max_per_page)]` and becomes the page size, then
/// `page = first / rows + 1`, so the window starts at `first` whenever `first`
/// is a multiple of the page size.
#[must_use]
pub fn resolve_pagination(request: &PageRequest, options: &QueryOptions) -> Pagination {
    let max_per_page = options.max_per_page.max(1);

    if let (Some(first), Some(rows)) = (request.first, request.rows) {
        let rows = clamp(rows, 1, options.max_rows.clamp(1, max_per_page));
        let first = u64::try_from(first).unwrap_or(0);
        return Pagination {
            page: first / rows + 1,
            per_page: rows,
        };
    }

    Pagination {
        page: request.page.map_or(1, |page| clamp(page, 1, u64::MAX)),
        per_page: request
            .per_page
            .map_or(options.default_per_page, |per_page| clamp(per_page, 1, max_per_page))
            .clamp(1, max_per_page),
    }
}
