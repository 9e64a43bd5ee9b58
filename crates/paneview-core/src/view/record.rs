//! Field access shared by filtering and sorting.

use std::cmp::Ordering;
use std::fmt::Debug;

use super::filter::FilterDef;

/// A record that can be shown in a list view.
pub trait Tabular: Clone {
    /// The sortable/filterable columns of this record.
    type Column: Copy + Eq + Debug + 'static;

    fn value(&self, column: Self::Column) -> FieldValue<'_>;

    /// Named predicates the list's filter controls feed.
    fn filters() -> &'static [FilterDef<Self::Column>];
}

/// One cell, typed for comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Flag(bool),
    Missing,
}

impl FieldValue<'_> {
    fn rank(&self) -> u8 {
        match self {
            Self::Flag(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
            Self::Missing => 3,
        }
    }

    /// Natural ordering: numbers numerically, text lexicographically,
    /// `false < true`. Missing values order after everything else.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Flag(a), Self::Flag(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Case-insensitive containment. `needle` must already be lowercase.
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        match self {
            Self::Text(text) => text.to_lowercase().contains(needle),
            _ => false,
        }
    }

    /// Exact match against a filter control's string value.
    pub fn equals(&self, expected: &str) -> bool {
        match self {
            Self::Text(text) => *text == expected,
            Self::Number(n) => expected.trim().parse::<f64>().is_ok_and(|e| e == *n),
            Self::Flag(flag) => expected.parse::<bool>().is_ok_and(|e| e == *flag),
            Self::Missing => false,
        }
    }

    /// Owned text for option lists; `None` for missing values.
    pub fn display(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some((*text).to_owned()),
            Self::Number(n) => Some(n.to_string()),
            Self::Flag(flag) => Some(flag.to_string()),
            Self::Missing => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_same_kind() {
        assert_eq!(FieldValue::Number(2.0).compare(&FieldValue::Number(10.0)), Ordering::Less);
        assert_eq!(FieldValue::Text("b").compare(&FieldValue::Text("a")), Ordering::Greater);
        assert_eq!(FieldValue::Flag(false).compare(&FieldValue::Flag(true)), Ordering::Less);
    }

    #[test]
    fn test_missing_orders_last() {
        assert_eq!(FieldValue::Missing.compare(&FieldValue::Text("z")), Ordering::Greater);
        assert_eq!(FieldValue::Number(1.0).compare(&FieldValue::Missing), Ordering::Less);
        assert_eq!(FieldValue::Missing.compare(&FieldValue::Missing), Ordering::Equal);
    }

    #[test]
    fn test_equals() {
        assert!(FieldValue::Text("North").equals("North"));
        assert!(!FieldValue::Text("North").equals("north"));
        assert!(FieldValue::Number(1.5).equals("1.5"));
        assert!(FieldValue::Flag(true).equals("true"));
        assert!(!FieldValue::Missing.equals(""));
    }
}
