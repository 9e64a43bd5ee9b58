//! # Sorting
//!
//! Clicking a column header cycles its direction:
//!
//! ```text
//!   same key:       Ascending ──► Descending ──► None ──► Ascending ...
//!   different key:  always starts at Ascending
//! ```
//!
//! Sorts are stable, and `Descending` compares in reverse rather than
//! reversing the ascending result, so ties keep their input order both ways.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::record::Tabular;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
    #[default]
    #[serde(rename = "none")]
    None,
}

/// Active sort column and direction for one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<C> {
    key: Option<C>,
    direction: SortDirection,
}

impl<C> Default for SortState<C> {
    fn default() -> Self {
        Self::unsorted()
    }
}

impl<C> SortState<C> {
    pub const fn unsorted() -> Self {
        Self {
            key: None,
            direction: SortDirection::None,
        }
    }
}

impl<C: Copy + Eq> SortState<C> {
    /// A state with no key is always unsorted.
    pub fn new(key: Option<C>, direction: SortDirection) -> Self {
        match key {
            Some(_) => Self { key, direction },
            None => Self::unsorted(),
        }
    }

    pub fn key(&self) -> Option<C> {
        self.key
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// True when the order differs from the input order.
    pub fn is_active(&self) -> bool {
        self.key.is_some() && self.direction != SortDirection::None
    }

    /// The state after clicking `key`.
    pub fn cycle(&self, key: C) -> Self {
        let direction = if self.key == Some(key) {
            match self.direction {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::None,
                SortDirection::None => SortDirection::Ascending,
            }
        } else {
            SortDirection::Ascending
        };
        Self {
            key: Some(key),
            direction,
        }
    }
}

/// Orders a copy of `records` per `state`.
pub fn sort_records<T: Tabular>(records: &[T], state: &SortState<T::Column>) -> Vec<T> {
    let mut sorted = records.to_vec();
    let Some(key) = state.key else {
        return sorted;
    };

    match state.direction {
        SortDirection::Ascending => sorted.sort_by(|a, b| a.value(key).compare(&b.value(key))),
        SortDirection::Descending => sorted.sort_by(|a, b| b.value(key).compare(&a.value(key))),
        SortDirection::None => {}
    }
    sorted
}

/// Applies a header click: cycles the state for `key` and sorts with it.
pub fn sort_by<T: Tabular>(
    records: &[T],
    current: &SortState<T::Column>,
    key: T::Column,
) -> (Vec<T>, SortState<T::Column>) {
    let next = current.cycle(key);
    (sort_records(records, &next), next)
}
