//! Bounded Append-Only Buffer
//!
//! Every output list of an analysis has a fixed capacity. Entries past the
//! capacity are dropped, but the number of entries *offered* is still counted
//! exactly so callers can tell that truncation happened.
//!
//! # Memory Optimizations
//! - Storage is reserved once up to the capacity; pushes never reallocate

use serde::{Deserialize, Serialize};

/// Fixed-capacity list that keeps an exact count of offered entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedBuffer<T> {
    capacity: usize,
    items: Vec<T>,
    total: usize,
}

impl<T> BoundedBuffer<T> {
    /// Create an empty buffer holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::with_capacity(capacity),
            total: 0usize,
        }
    }

    /// Offer an entry. It is stored only while there is room; the total
    /// count is incremented either way.
    ///
    /// # Returns
    /// `bool` - whether the entry was stored
    #[inline]
    pub fn push(&mut self, item: T) -> bool {
        self.total = self.total.saturating_add(1usize);
        if self.items.len() < self.capacity {
            self.items.push(item);
            true
        } else {
            false
        }
    }

    /// Entries actually stored.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Number of entries stored (never above the capacity).
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of entries offered, including dropped ones.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether any entry was dropped.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.total > self.items.len()
    }

    /// Iterate over the stored entries.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Drop all entries and reset the count; the capacity is kept.
    pub fn clear(&mut self) {
        self.items.clear();
        self.total = 0usize;
    }
}

impl<'a, T> IntoIterator for &'a BoundedBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
