//! # Identifier Sets
//!
//! Ordered sets of vertex or edge identifiers.
//!
//! Used as the contraction work queue, the forbidden-vertex set and the
//! contracted-vertex payload of shortcut edges. Backed by `BTreeSet`, so
//! `front()` is always the smallest member and draining the set with
//! `pop_front()` visits each member exactly once in ascending order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::collections::btree_set;
use std::fmt;

/// An ordered set of unique identifiers.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifiers<T: Ord> {
    ids: BTreeSet<T>,
}

impl<T: Ord> Default for Identifiers<T> {
    fn default() -> Self {
        Self {
            ids: BTreeSet::new(),
        }
    }
}

impl<T: Ord + Copy> Identifiers<T> {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id`. Returns `false` if it was already present.
    pub fn insert(&mut self, id: T) -> bool {
        self.ids.insert(id)
    }

    /// Remove `id`. Removing a non-member is a no-op that returns `false`.
    pub fn remove(&mut self, id: &T) -> bool {
        self.ids.remove(id)
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, id: &T) -> bool {
        self.ids.contains(id)
    }

    /// The smallest member, or `None` when empty.
    #[must_use]
    pub fn front(&self) -> Option<T> {
        self.ids.first().copied()
    }

    /// Remove and return the smallest member.
    pub fn pop_front(&mut self) -> Option<T> {
        self.ids.pop_first()
    }

    /// Remove every member of `other` from `self`.
    pub fn difference_update(&mut self, other: &Self) {
        if other.ids.is_empty() {
            return;
        }
        self.ids.retain(|id| !other.ids.contains(id));
    }

    /// Add every member of `other` to `self`.
    pub fn union_with(&mut self, other: &Self) {
        self.ids.extend(other.ids.iter().copied());
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate in ascending order.
    pub fn iter(&self) -> btree_set::Iter<'_, T> {
        self.ids.iter()
    }

    /// Members in ascending order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.ids.iter().copied().collect()
    }
}

impl<T: Ord + fmt::Debug> fmt::Debug for Identifiers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ids.iter()).finish()
    }
}

impl<T: Ord + fmt::Display> fmt::Display for Identifiers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, id) in self.ids.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id}")?;
        }
        f.write_str("}")
    }
}

impl<T: Ord> FromIterator<T> for Identifiers<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl<T: Ord> Extend<T> for Identifiers<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.ids.extend(iter);
    }
}

impl<T: Ord> IntoIterator for Identifiers<T> {
    type Item = T;
    type IntoIter = btree_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

impl<'a, T: Ord> IntoIterator for &'a Identifiers<T> {
    type Item = &'a T;
    type IntoIter = btree_set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut ids = Identifiers::new();
        assert!(ids.insert(3));
        assert!(!ids.insert(3));
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn remove_non_member_is_noop() {
        let mut ids: Identifiers<i64> = [1, 2].into_iter().collect();
        assert!(!ids.remove(&9));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn front_is_smallest() {
        let ids: Identifiers<i64> = [5, 1, 3].into_iter().collect();
        assert_eq!(ids.front(), Some(1));

        let empty: Identifiers<i64> = Identifiers::new();
        assert_eq!(empty.front(), None);
    }

    #[test]
    fn pop_front_drains_in_order() {
        let mut ids: Identifiers<i64> = [4, 2, 8, 6].into_iter().collect();
        let mut drained = Vec::new();
        while let Some(id) = ids.pop_front() {
            drained.push(id);
        }
        assert_eq!(drained, vec![2, 4, 6, 8]);
        assert!(ids.is_empty());
    }

    #[test]
    fn difference_update_removes_members() {
        let mut ids: Identifiers<i64> = (1..=6).collect();
        let forbidden: Identifiers<i64> = [2, 4, 10].into_iter().collect();

        ids.difference_update(&forbidden);

        assert_eq!(ids.to_vec(), vec![1, 3, 5, 6]);
    }

    #[test]
    fn union_with_has_no_duplicates() {
        let mut ids: Identifiers<i64> = [1, 2].into_iter().collect();
        let other: Identifiers<i64> = [2, 3].into_iter().collect();

        ids.union_with(&other);

        assert_eq!(ids.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn display_lists_members() {
        let ids: Identifiers<i64> = [3, 1].into_iter().collect();
        assert_eq!(ids.to_string(), "{1, 3}");
    }
}
