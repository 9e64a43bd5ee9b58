//! # Pagination
//!
//! `page` is 1-based. Page `p` covers `[(p-1)*size, p*size)` clipped to the
//! collection. Out-of-range requests yield an empty window, never an error.

use serde::Serialize;

/// One page of a collection plus the numbers the pager displays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
}

/// Pages needed for `total_items` at `page_size`. Zero for an empty
/// collection or a zero page size.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total_items.div_ceil(page_size)
    }
}

/// Slices out page `page` of `records`.
pub fn paginate<T>(records: &[T], page: usize, page_size: usize) -> PageWindow<'_, T> {
    let total_items = records.len();
    let page = if total_items == 0 { 1 } else { page.max(1) };

    let start = (page - 1).saturating_mul(page_size);
    let items = if page_size == 0 || start >= total_items {
        &records[..0]
    } else {
        let end = start.saturating_add(page_size).min(total_items);
        &records[start..end]
    };

    PageWindow {
        items,
        page,
        page_size,
        total_items,
    }
}

impl<T> PageWindow<'_, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.total_items, self.page_size)
    }

    /// Index of the first item in the unpaged collection.
    pub fn start_index(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// 1-based number of the first row shown, zero when the window is empty.
    pub fn first_item_number(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.start_index() + 1
        }
    }

    /// 1-based number of the last row shown, zero when the window is empty.
    pub fn last_item_number(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.start_index() + self.items.len()
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}
