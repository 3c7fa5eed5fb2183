//! This modules defines the common functionality for paging data.

use serde::{Deserialize, Serialize};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of transactions per page when not specified in a request.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
        }
    }
}

/// The rows of a sorted result set that make up one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// The number of rows to skip.
    pub offset: u64,
    /// The maximum number of rows to take.
    pub limit: u64,
}

/// Navigation metadata for one page of a filtered result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// The 1-based page being served.
    pub current_page: u64,
    /// The maximum number of rows per page.
    pub page_size: u64,
    /// The number of rows in the whole filtered set.
    pub total_items: u64,
    /// The number of pages needed for the filtered set, zero if it is empty.
    pub total_pages: u64,
    /// Whether a page follows the current one.
    pub has_next_page: bool,
    /// Whether a page precedes the current one.
    pub has_prev_page: bool,
}

impl Pagination {
    /// Work out the page to serve for `requested_page`.
    ///
    /// The served page is clamped to `1..=max(total_pages, 1)`, so asking for
    /// page 9999 of a 3 page result serves page 3. A `page_size` of zero is
    /// treated as one.
    pub fn new(requested_page: u64, page_size: u64, total_items: u64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size);
        let current_page = requested_page.clamp(1, total_pages.max(1));

        Self {
            current_page,
            page_size,
            total_items,
            total_pages,
            has_next_page: current_page < total_pages,
            has_prev_page: current_page > 1,
        }
    }

    /// The rows covered by the current page.
    pub fn window(&self) -> PageWindow {
        PageWindow {
            offset: (self.current_page - 1) * self.page_size,
            limit: self.page_size,
        }
    }
}
