//! # Tabular View Pipeline
//!
//! Every list view runs the same three pure stages, always in this order:
//!
//! ```text
//!  records ──► filter_records ──► sort_records ──► paginate ──► PageWindow
//!              (FilterSet)        (SortState)      (page, size)
//! ```
//!
//! Stages take a snapshot and return a new collection, so a view never
//! holds a mutable alias into a cache. [`TableState`] keeps the user's
//! choices for one list and composes the stages in [`TableState::render`].

pub mod columns;
pub mod filter;
pub mod page;
pub mod record;
pub mod sort;
pub mod table;

pub use columns::{CustomerColumn, ProductColumn, QuoteColumn};
pub use filter::{filter_records, FilterDef, FilterSet, Matcher};
pub use page::{paginate, total_pages, PageWindow};
pub use record::{FieldValue, Tabular};
pub use sort::{sort_by, sort_records, SortDirection, SortState};
pub use table::{TableState, TableView};
