use serde::{Deserialize, Serialize};
use showscout_store::ShowRecord;

/// One page of a filtered, ordered result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub data: Vec<ShowRecord>,
    /// Rows left after every filter, across all pages.
    pub total_count: usize,
    pub page_size: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

impl PageResult {
    /// A well-formed page with nothing in it.
    #[must_use]
    pub const fn empty(page: usize, page_size: usize) -> Self {
        Self {
            data: Vec::new(),
            total_count: 0,
            page_size,
            current_page: page,
            total_pages: 0,
        }
    }

    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Slice `rows` (already filtered and ordered) into page `page` (1-based).
/// Pages past the end come back empty with the real totals.
#[must_use]
pub fn paginate(rows: Vec<ShowRecord>, page: usize, page_size: usize) -> PageResult {
    let total_count = rows.len();
    if page_size == 0 {
        return PageResult {
            total_count,
            ..PageResult::empty(page, page_size)
        };
    }
    let total_pages = total_count.div_ceil(page_size);
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let data = if start >= total_count {
        Vec::new()
    } else {
        let end = start.saturating_add(page_size).min(total_count);
        rows.into_iter().skip(start).take(end - start).collect()
    };
    PageResult {
        data,
        total_count,
        page_size,
        current_page: page,
        total_pages,
    }
}
