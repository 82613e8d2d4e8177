#![forbid(unsafe_code)]

//! Per-item height ledger with prefix offsets.
//!
//! The ledger spans the whole collection: one slot per item, in lock-step
//! with inserts and removals. Items that have never been measured hold a
//! height of zero, so every pixel computation over them contributes nothing
//! until real heights arrive.
//!
//! Offsets are kept as a prefix-sum array one longer than the heights, so
//! `offset(len)` is the total content height and any `[a, b)` sum is a
//! single subtraction.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Index past the end | `height` is 0, `offset` clamps to the total |
//! | Write past the end | Extra heights are dropped |
//! | Sum overflows `u32` | Saturates at `u32::MAX` |

use crate::range::ItemRange;

/// Heights and cumulative offsets for every item in the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightLedger {
    heights: Vec<u32>,
    /// `offsets[i]` = sum of `heights[..i]`; length is `heights.len() + 1`.
    offsets: Vec<u32>,
}

impl Default for HeightLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl HeightLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            offsets: vec![0],
        }
    }

    /// Ledger of `len` unmeasured items.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self {
            heights: vec![0; len],
            offsets: vec![0; len + 1],
        }
    }

    #[must_use]
    pub fn from_heights(heights: &[u32]) -> Self {
        let mut ledger = Self {
            heights: heights.to_vec(),
            offsets: Vec::with_capacity(heights.len() + 1),
        };
        ledger.offsets.push(0);
        ledger.rebuild_from(0);
        ledger
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn heights(&self) -> &[u32] {
        &self.heights
    }

    /// Offsets of every item (without the trailing total).
    #[inline]
    #[must_use]
    pub fn offsets(&self) -> &[u32] {
        &self.offsets[..self.heights.len()]
    }

    /// Height of item `index`, or 0 past the end.
    #[inline]
    #[must_use]
    pub fn height(&self, index: usize) -> u32 {
        self.heights.get(index).copied().unwrap_or(0)
    }

    /// Offset of item `index`; `offset(len)` is the total height.
    #[inline]
    #[must_use]
    pub fn offset(&self, index: usize) -> u32 {
        self.offsets[index.min(self.heights.len())]
    }

    #[inline]
    #[must_use]
    pub fn total(&self) -> u32 {
        self.offsets[self.heights.len()]
    }

    /// Sum of heights over `range`, clamped to the ledger.
    #[inline]
    #[must_use]
    pub fn sum(&self, range: ItemRange) -> u32 {
        self.offset(range.stop).saturating_sub(self.offset(range.start))
    }

    /// Number of leading items whose bottom edge is at or above `position`.
    ///
    /// A negative position counts nothing.
    #[must_use]
    pub fn count_fully_above(&self, position: i64) -> usize {
        if position < 0 {
            return 0;
        }
        self.offsets[1..].partition_point(|&end| i64::from(end) <= position)
    }

    /// Forget every height and size the ledger to `len` unmeasured items.
    pub fn reset(&mut self, len: usize) {
        self.heights.clear();
        self.heights.resize(len, 0);
        self.offsets.clear();
        self.offsets.resize(len + 1, 0);
    }

    /// Replace every height; `heights` is truncated or zero-padded to `len`.
    pub fn replace(&mut self, heights: &[u32], len: usize) {
        self.heights.clear();
        self.heights
            .extend_from_slice(&heights[..heights.len().min(len)]);
        self.heights.resize(len, 0);
        self.offsets.truncate(1);
        self.rebuild_from(0);
    }

    /// Insert `count` unmeasured items before `index`.
    pub fn insert(&mut self, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        let index = index.min(self.heights.len());
        self.heights
            .splice(index..index, std::iter::repeat_n(0, count));
        self.offsets.truncate(index + 1);
        self.rebuild_from(index);
    }

    /// Remove up to `count` items starting at `index`.
    pub fn remove(&mut self, index: usize, count: usize) {
        let start = index.min(self.heights.len());
        let end = index.saturating_add(count).min(self.heights.len());
        if start == end {
            return;
        }
        self.heights.drain(start..end);
        self.offsets.truncate(start + 1);
        self.rebuild_from(start);
    }

    /// Overwrite heights starting at `start`. Heights past the end of the
    /// collection are ignored. Returns how many slots were written.
    pub fn write_at(&mut self, start: usize, heights: &[u32]) -> usize {
        if start >= self.heights.len() {
            return 0;
        }
        let written = heights.len().min(self.heights.len() - start);
        self.heights[start..start + written].copy_from_slice(&heights[..written]);
        self.offsets.truncate(start + 1);
        self.rebuild_from(start);
        written
    }

    /// Recompute `offsets[from + 1..]`; `offsets[..=from]` must be valid.
    fn rebuild_from(&mut self, from: usize) {
        let mut acc = self.offsets[from];
        for &height in &self.heights[from..] {
            acc = acc.saturating_add(height);
            self.offsets.push(acc);
        }
    }
}
