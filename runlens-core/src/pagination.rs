//! Paging over the ordered runs of a sweep.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Runs shown per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Direction of a page-button click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageDelta {
    Previous,
    Next,
}

/// Current page over `total_items` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageState {
    current_page: usize,
    page_size: usize,
    total_items: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

impl PageState {
    /// A page size of zero is treated as one.
    pub fn new(total_items: usize, page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_items,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    /// `ceil(total / page_size)`, and 1 for an empty sweep.
    pub fn max_page(&self) -> usize {
        self.total_items.div_ceil(self.page_size).max(1)
    }

    /// Start over on page 1 for a newly selected sweep.
    pub fn reset(self, total_items: usize) -> Self {
        Self::new(total_items, self.page_size)
    }

    /// Move one page, clamped to `[1, max_page]`.
    pub fn goto(self, delta: PageDelta) -> Self {
        let target = match delta {
            PageDelta::Previous => self.current_page.saturating_sub(1),
            PageDelta::Next => self.current_page + 1,
        };
        Self {
            current_page: target.clamp(1, self.max_page()),
            ..self
        }
    }

    /// Item indices on the current page; the last page may be short.
    pub fn range(&self) -> Range<usize> {
        let start = (self.current_page - 1) * self.page_size;
        let end = self.current_page * self.page_size;
        start.min(self.total_items)..end.min(self.total_items)
    }

    /// 1-based absolute number of the first item on this page.
    pub fn first_item_number(&self) -> usize {
        (self.current_page - 1) * self.page_size + 1
    }

    pub fn prev_disabled(&self) -> bool {
        self.current_page == 1
    }

    pub fn next_disabled(&self) -> bool {
        self.current_page == self.max_page()
    }
}
