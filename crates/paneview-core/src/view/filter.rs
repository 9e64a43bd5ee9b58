//! # Filtering
//!
//! A [`FilterSet`] holds the current value of every filter control by
//! name. Each record type declares which predicate a name drives through
//! [`Tabular::filters`]. An empty value switches its predicate off.
//!
//! ```text
//!   FilterSet { "search": "acme", "branch": "" }
//!        │                    │
//!        ▼                    ▼
//!   Contains([BillingName,    (inactive, never excludes)
//!             ContactName])
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::Tabular;

// =============================================================================
// Predicate Definitions
// =============================================================================

/// How a filter value is matched against a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher<C: 'static> {
    /// Case-insensitive substring over any of the columns.
    Contains(&'static [C]),
    /// Exact match on one column.
    Equals(C),
}

/// A named predicate a filter control feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDef<C: 'static> {
    pub name: &'static str,
    pub matcher: Matcher<C>,
}

impl<C: 'static> FilterDef<C> {
    pub const fn contains(name: &'static str, columns: &'static [C]) -> Self {
        Self {
            name,
            matcher: Matcher::Contains(columns),
        }
    }

    pub const fn equals(name: &'static str, column: C) -> Self {
        Self {
            name,
            matcher: Matcher::Equals(column),
        }
    }
}

// =============================================================================
// Filter Set
// =============================================================================

/// Current filter values, keyed by predicate name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    values: BTreeMap<String, String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FilterSet::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Stores a value. Returns true when the stored value changed.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        let value = value.into();
        if self.get(&name) == value {
            return false;
        }
        if value.is_empty() {
            self.values.remove(&name);
        } else {
            self.values.insert(name, value);
        }
        true
    }

    /// The value for `name`, empty when unset.
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map_or("", String::as_str)
    }

    pub fn is_active(&self, name: &str) -> bool {
        !self.get(name).is_empty()
    }

    /// True when no predicate is active.
    pub fn is_empty(&self) -> bool {
        self.values.values().all(String::is_empty)
    }

    /// Clears every value. Returns true when anything was active.
    pub fn clear(&mut self) -> bool {
        let had_any = !self.is_empty();
        self.values.clear();
        had_any
    }
}

// =============================================================================
// Filtering
// =============================================================================

enum ActivePredicate<C: 'static> {
    Contains(&'static [C], String),
    Equals(C, String),
}

/// Keeps the records every active predicate accepts, in input order.
///
/// Names in the set that the record type does not declare are ignored.
pub fn filter_records<T: Tabular>(records: &[T], filters: &FilterSet) -> Vec<T> {
    let active: Vec<ActivePredicate<T::Column>> = T::filters()
        .iter()
        .filter_map(|def| {
            let value = filters.get(def.name);
            if value.is_empty() {
                return None;
            }
            Some(match def.matcher {
                Matcher::Contains(columns) => ActivePredicate::Contains(columns, value.to_lowercase()),
                Matcher::Equals(column) => ActivePredicate::Equals(column, value.to_owned()),
            })
        })
        .collect();

    if active.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| active.iter().all(|p| accepts(*record, p)))
        .cloned()
        .collect()
}

fn accepts<T: Tabular>(record: &T, predicate: &ActivePredicate<T::Column>) -> bool {
    match predicate {
        ActivePredicate::Contains(columns, needle) => columns
            .iter()
            .any(|column| record.value(*column).contains_lowercase(needle)),
        ActivePredicate::Equals(column, expected) => record.value(*column).equals(expected),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Customer;
    use crate::view::columns::CustomerColumn;

    fn customer(id: &str, billing: &str, contact: &str, branch: &str) -> Customer {
        Customer {
            customer_id: id.into(),
            billing_name: billing.into(),
            contact_name: contact.into(),
            default_branch: branch.into(),
            is_active: true,
            price_multiplier: 1.0,
        }
    }

    fn sample() -> Vec<Customer> {
        vec![
            customer("1", "Acme Glass", "Jo", "North"),
            customer("2", "Birch Doors", "Acme Contact", "South"),
            customer("3", "Cedar Works", "Sam", "North"),
        ]
    }

    fn ids(records: &[Customer]) -> Vec<&str> {
        records.iter().map(|c| c.customer_id.as_str()).collect()
    }

    #[test]
    fn test_empty_set_keeps_everything() {
        let records = sample();
        assert_eq!(filter_records(&records, &FilterSet::new()), records);
    }

    #[test]
    fn test_search_matches_any_column_case_insensitively() {
        let records = sample();
        let filtered = filter_records(&records, &FilterSet::new().with("search", "ACME"));
        assert_eq!(ids(&filtered), ["1", "2"]);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let records = sample();
        let filters = FilterSet::new().with("search", "acme").with("branch", "North");
        assert_eq!(ids(&filter_records(&records, &filters)), ["1"]);
    }

    #[test]
    fn test_equality_is_exact() {
        let records = sample();
        let filtered = filter_records(&records, &FilterSet::new().with("branch", "north"));
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let records = sample();
        let filtered = filter_records(&records, &FilterSet::new().with("colour", "red"));
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let records = sample();
        let filters = FilterSet::new().with("search", "o");
        let once = filter_records(&records, &filters);
        let twice = filter_records(&once, &filters);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_set_reports_changes() {
        let mut filters = FilterSet::new();
        assert!(filters.set("branch", "North"));
        assert!(!filters.set("branch", "North"));
        assert!(filters.set("branch", ""));
        assert!(!filters.is_active("branch"));
        assert!(!filters.set("search", ""));
        assert!(filters.is_empty());
    }

    #[test]
    fn test_declared_filters_reference_columns() {
        let names: Vec<&str> = Customer::filters().iter().map(|d| d.name).collect();
        assert_eq!(names, ["search", "branch"]);
        assert_eq!(
            Customer::filters()[1].matcher,
            Matcher::Equals(CustomerColumn::DefaultBranch)
        );
    }
}
