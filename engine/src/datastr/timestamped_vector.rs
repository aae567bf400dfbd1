//! A fast resettable vector based on timestamps.

use std::ops::{Index, IndexMut};

/// A fast resettable vector based on 32bit timestamps.
/// Resetting takes amortized constant time, which makes this the backing
/// storage of choice for label arrays which get cleared once per search run.
/// The elements can be modified through the index traits.
/// Other modifications are not permitted.
#[derive(Debug, Clone)]
pub struct TimestampedVector<T> {
    data: Vec<T>,
    // timestamp of the current run. Up to date values will have this one
    current: u32,
    // timestamp of the run which last wrote each entry
    timestamps: Vec<u32>,
    default: T,
}

impl<T: Clone> TimestampedVector<T> {
    /// Create a new `TimestampedVector` with `size` elements of the given default.
    pub fn new(size: usize, default: T) -> TimestampedVector<T> {
        TimestampedVector {
            data: vec![default.clone(); size],
            current: 0,
            timestamps: vec![0; size],
            default,
        }
    }

    /// Reset all elements to the default.
    /// Amortized O(1).
    pub fn reset(&mut self) {
        let (new, overflow) = self.current.overflowing_add(1);
        self.current = new;

        // on overflow we might encounter stale timestamps from u32::MAX runs ago,
        // so everything has to be reset manually once
        if overflow {
            for element in &mut self.data {
                *element = self.default.clone();
            }
        }
    }

    /// Update an individual element.
    pub fn set(&mut self, index: usize, value: T) {
        self.data[index] = value;
        self.timestamps[index] = self.current;
    }

    /// Number of elements in the data structure
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Are there no elements in the data structure
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Index<usize> for TimestampedVector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        // entries written by older runs count as the default
        if self.timestamps[index] == self.current {
            &self.data[index]
        } else {
            &self.default
        }
    }
}

impl<T: Clone> IndexMut<usize> for TimestampedVector<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        if self.timestamps[index] != self.current {
            self.set(index, self.default.clone());
        }
        &mut self.data[index]
    }
}
