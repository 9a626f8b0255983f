//! Delivery retry tokens
//!
//! A transport reports the outcome of each delivery attempt as a
//! [`RetryOutcome`]. The scheduling layer feeds the failed items back into
//! the next attempt as [`RetryItems`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Item ordinals still to deliver
///
/// Empty means "first attempt, deliver everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryItems(Vec<usize>);

impl RetryItems {
    /// First attempt: nothing has failed yet
    pub fn first_attempt() -> Self {
        Self(Vec::new())
    }

    /// Retry only the listed ordinals
    pub fn only(items: Vec<usize>) -> Self {
        let mut items = items;
        items.sort_unstable();
        items.dedup();
        Self(items)
    }

    /// True on the first attempt
    pub fn is_first_attempt(&self) -> bool {
        self.0.is_empty()
    }

    /// Ordinals selected for this attempt out of `total` items
    pub fn selected(&self, total: usize) -> Vec<usize> {
        if self.0.is_empty() {
            (0..total).collect()
        } else {
            self.0.iter().copied().filter(|i| *i < total).collect()
        }
    }

    /// Listed ordinals
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "items", rename_all = "snake_case")]
pub enum RetryOutcome {
    /// Everything selected for this attempt was delivered
    Delivered,

    /// The adapter can't tell what failed; resubmit the whole report
    RetryAll,

    /// Only these item ordinals failed
    RetryItems(Vec<usize>),
}

impl RetryOutcome {
    /// Builds an outcome from the ordinals that failed
    ///
    /// An empty list means full success.
    pub fn from_failed(failed: Vec<usize>) -> Self {
        if failed.is_empty() {
            RetryOutcome::Delivered
        } else {
            let mut failed = failed;
            failed.sort_unstable();
            failed.dedup();
            RetryOutcome::RetryItems(failed)
        }
    }

    /// True if nothing is left to retry
    pub fn is_delivered(&self) -> bool {
        matches!(self, RetryOutcome::Delivered)
    }

    /// Items to hand to the next attempt, or `None` when delivered
    pub fn next_attempt(&self) -> Option<RetryItems> {
        match self {
            RetryOutcome::Delivered => None,
            RetryOutcome::RetryAll => Some(RetryItems::first_attempt()),
            RetryOutcome::RetryItems(items) => Some(RetryItems::only(items.clone())),
        }
    }
}

impl fmt::Display for RetryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryOutcome::Delivered => f.write_str("delivered"),
            RetryOutcome::RetryAll => f.write_str("retry-all"),
            RetryOutcome::RetryItems(items) => write!(f, "retry-items{items:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_selects_everything() {
        let items = RetryItems::first_attempt();
        assert!(items.is_first_attempt());
        assert_eq!(items.selected(3), vec![0, 1, 2]);
    }

    #[test]
    fn test_retry_items_selects_subset() {
        let items = RetryItems::only(vec![4, 1, 1, 9]);
        assert_eq!(items.as_slice(), &[1, 4, 9]);
        assert_eq!(items.selected(5), vec![1, 4]);
    }

    #[test]
    fn test_from_failed() {
        assert_eq!(RetryOutcome::from_failed(vec![]), RetryOutcome::Delivered);
        assert_eq!(
            RetryOutcome::from_failed(vec![2, 0, 2]),
            RetryOutcome::RetryItems(vec![0, 2])
        );
    }

    #[test]
    fn test_next_attempt() {
        assert_eq!(RetryOutcome::Delivered.next_attempt(), None);
        assert_eq!(
            RetryOutcome::RetryAll.next_attempt(),
            Some(RetryItems::first_attempt())
        );
        assert_eq!(
            RetryOutcome::RetryItems(vec![3]).next_attempt(),
            Some(RetryItems::only(vec![3]))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(RetryOutcome::RetryAll.to_string(), "retry-all");
        assert_eq!(RetryOutcome::RetryItems(vec![1, 2]).to_string(), "retry-items[1, 2]");
    }
}
