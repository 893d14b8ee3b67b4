//! Generic binary min-heap.
//!
//! Thin ordering adapter over [`BinaryHeap`], which is a max-heap. Values are
//! wrapped in [`Reverse`] so the smallest element sits at the root.
//! Duplicates are kept as distinct entries and there is no capacity bound.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Min-heap over any totally ordered value type.
#[derive(Clone, Debug)]
pub struct MinHeap<T: Ord> {
    inner: BinaryHeap<Reverse<T>>,
}

impl<T: Ord> MinHeap<T> {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self {
            inner: BinaryHeap::new(),
        }
    }

    /// Insert a value. O(log n).
    pub fn push(&mut self, value: T) {
        self.inner.push(Reverse(value));
    }

    /// Remove and return the smallest value. O(log n).
    pub fn pop(&mut self) -> Option<T> {
        self.inner.pop().map(|Reverse(value)| value)
    }

    /// Smallest value without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.inner.peek().map(|Reverse(value)| value)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drain into an ascending vector.
    pub fn into_sorted_vec(self) -> Vec<T> {
        // BinaryHeap sorts ascending by `Reverse<T>`, i.e. descending by `T`.
        let mut values: Vec<T> = self
            .inner
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(value)| value)
            .collect();
        values.reverse();
        values
    }
}

impl<T: Ord> Default for MinHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> FromIterator<T> for MinHeap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(Reverse).collect(),
        }
    }
}

impl<T: Ord> Extend<T> for MinHeap<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.inner.extend(iter.into_iter().map(Reverse));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_returns_minimum_first() {
        let mut heap = MinHeap::new();
        for value in [9u64, 3, 7, 1, 5] {
            heap.push(value);
        }

        assert_eq!(heap.peek(), Some(&1));
        let drained: Vec<_> = std::iter::from_fn(|| heap.pop()).collect();
        assert_eq!(drained, vec![1, 3, 5, 7, 9]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_duplicates_are_distinct_entries() {
        let mut heap: MinHeap<u64> = [4, 4, 2].into_iter().collect();
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.pop(), Some(2));
        assert_eq!(heap.pop(), Some(4));
        assert_eq!(heap.pop(), Some(4));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn test_empty_heap() {
        let mut heap: MinHeap<u64> = MinHeap::default();
        assert_eq!(heap.peek(), None);
        assert_eq!(heap.pop(), None);
        assert_eq!(heap.len(), 0);
    }

    #[test]
    fn test_into_sorted_vec_is_ascending() {
        let mut heap: MinHeap<u64> = [10, 6].into_iter().collect();
        heap.extend([8, 5]);
        assert_eq!(heap.into_sorted_vec(), vec![5, 6, 8, 10]);
    }

    #[test]
    fn test_works_for_any_ord_type() {
        let mut heap = MinHeap::new();
        heap.push("delta");
        heap.push("alpha");
        heap.push("charlie");
        assert_eq!(heap.pop(), Some("alpha"));
        assert_eq!(heap.peek(), Some(&"charlie"));
    }
}
