//! # Table State
//!
//! The user's filter, sort and page choices for one list view.
//!
//! ```text
//!   set_filter ─┐
//!   sort_by   ──┼──► page = 1
//!   set_page_size┘
//!
//!   render(records) = paginate(sort(filter(records)))
//! ```

use crate::DEFAULT_PAGE_SIZE;

use super::filter::{filter_records, FilterSet};
use super::page::{paginate, PageWindow};
use super::record::Tabular;
use super::sort::{sort_records, SortState};

#[derive(Debug, Clone, PartialEq)]
pub struct TableState<C> {
    filters: FilterSet,
    sort: SortState<C>,
    page: usize,
    page_size: usize,
}

impl<C: Copy + Eq> Default for TableState<C> {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl<C: Copy + Eq> TableState<C> {
    pub fn new(page_size: usize) -> Self {
        Self {
            filters: FilterSet::new(),
            sort: SortState::unsorted(),
            page: 1,
            page_size,
        }
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn sort(&self) -> SortState<C> {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Updates one filter. A changed value sends the view back to page 1.
    pub fn set_filter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if self.filters.set(name, value) {
            self.page = 1;
        }
    }

    pub fn clear_filters(&mut self) {
        if self.filters.clear() {
            self.page = 1;
        }
    }

    /// Header click on `key`.
    pub fn sort_by(&mut self, key: C) {
        self.sort = self.sort.cycle(key);
        self.page = 1;
    }

    /// Pages below 1 are treated as 1.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        if self.page_size != page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    /// Runs the pipeline over `records`.
    pub fn render<T>(&self, records: &[T]) -> TableView<T>
    where
        T: Tabular<Column = C>,
        C: 'static + std::fmt::Debug,
    {
        let filtered = filter_records(records, &self.filters);
        let matched = sort_records(&filtered, &self.sort);
        TableView {
            matched,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Filtered and sorted rows plus the page to show.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView<T> {
    matched: Vec<T>,
    page: usize,
    page_size: usize,
}

impl<T> TableView<T> {
    /// Every row that passed the filters, in display order.
    pub fn matched(&self) -> &[T] {
        &self.matched
    }

    pub fn total_matched(&self) -> usize {
        self.matched.len()
    }

    pub fn window(&self) -> PageWindow<'_, T> {
        paginate(&self.matched, self.page, self.page_size)
    }

    pub fn into_matched(self) -> Vec<T> {
        self.matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Customer;
    use crate::view::columns::CustomerColumn;
    use crate::view::sort::SortDirection;

    fn customers(count: usize) -> Vec<Customer> {
        (0..count)
            .map(|i| Customer {
                customer_id: format!("C-{i:03}"),
                billing_name: format!("Customer {i:03}"),
                contact_name: String::new(),
                default_branch: if i % 2 == 0 { "North".into() } else { "South".into() },
                is_active: true,
                price_multiplier: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_page_three_of_twenty_five_customers() {
        let records = customers(25);
        let mut table: TableState<CustomerColumn> = TableState::default();
        table.set_page(3);

        let view = table.render(&records);
        let window = view.window();

        assert_eq!(window.len(), 5);
        assert_eq!(window.items, &records[20..25]);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let records = customers(25);
        let mut table: TableState<CustomerColumn> = TableState::default();
        table.set_page(3);

        table.set_filter("branch", "North");
        assert_eq!(table.page(), 1);

        let view = table.render(&records);
        assert_eq!(view.total_matched(), 13);
        assert_eq!(view.window().len(), 10);
    }

    #[test]
    fn test_unchanged_filter_keeps_page() {
        let mut table: TableState<CustomerColumn> = TableState::default();
        table.set_filter("branch", "North");
        table.set_page(2);
        table.set_filter("branch", "North");
        assert_eq!(table.page(), 2);
    }

    #[test]
    fn test_sort_resets_page_and_orders_before_paging() {
        let records = customers(25);
        let mut table: TableState<CustomerColumn> = TableState::default();
        table.set_page(2);

        table.sort_by(CustomerColumn::BillingName);
        table.sort_by(CustomerColumn::BillingName);
        assert_eq!(table.page(), 1);
        assert_eq!(table.sort().direction(), SortDirection::Descending);

        let view = table.render(&records);
        let window = view.window();
        assert_eq!(window.items[0].customer_id, "C-024");
        assert_eq!(window.items[9].customer_id, "C-015");
    }

    #[test]
    fn test_page_navigation_bounds() {
        let mut table: TableState<CustomerColumn> = TableState::new(5);
        table.previous_page();
        assert_eq!(table.page(), 1);
        table.next_page();
        table.next_page();
        assert_eq!(table.page(), 3);
        table.set_page_size(20);
        assert_eq!(table.page(), 1);
    }
}
