#![forbid(unsafe_code)]

//! Scroll-restoration bookkeeping.
//!
//! When a mutation changes which content sits above the row the user is
//! looking at, the caller must nudge its scroll position after re-rendering
//! or the content visibly jumps. The advisor pins an anchor item at the
//! first such mutation, remembers the anchor's offset at that moment, and
//! reports how far the anchor has moved since once the caller asks.
//!
//! The anchor index follows inserts and removals so a sequence of mutations
//! (shift, insert above, shift again, measure) still compares the same item.

use crate::ledger::HeightLedger;
use crate::range::{ScrollRestoreParams, ShiftDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    index: usize,
    offset: u32,
}

/// Tracks the pending scroll compensation, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestorationAdvisor {
    pending: Option<Anchor>,
    direction: Option<ShiftDirection>,
}

impl RestorationAdvisor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the caller still has to compensate its scroll position.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Direction of the pending compensation, if any.
    #[inline]
    #[must_use]
    pub fn direction(&self) -> Option<ShiftDirection> {
        self.direction
    }

    /// Index of the pinned anchor item, if restoration is pending.
    #[inline]
    #[must_use]
    pub fn anchor_index(&self) -> Option<usize> {
        self.pending.map(|anchor| anchor.index)
    }

    /// Note a mutation that moved content around `anchor_index`.
    ///
    /// The first call pins the anchor and its current offset; later calls
    /// before [`commit`](Self::commit) only update the direction.
    pub fn record(
        &mut self,
        direction: ShiftDirection,
        anchor_index: usize,
        ledger: &HeightLedger,
    ) {
        self.direction = Some(direction);
        if self.pending.is_none() {
            self.pending = Some(Anchor {
                index: anchor_index,
                offset: ledger.offset(anchor_index),
            });
        }
    }

    /// Renumber the anchor after `count` items were inserted at `index`.
    pub fn on_insert(&mut self, index: usize, count: usize) {
        if let Some(anchor) = self.pending.as_mut()
            && index <= anchor.index
        {
            anchor.index = anchor.index.saturating_add(count);
        }
    }

    /// Renumber the anchor after `count` items were removed at `index`.
    ///
    /// An anchor inside the removed span moves to the first surviving item.
    pub fn on_remove(&mut self, index: usize, count: usize) {
        if let Some(anchor) = self.pending.as_mut() {
            let end = index.saturating_add(count);
            if anchor.index >= end {
                anchor.index -= count;
            } else if anchor.index >= index {
                anchor.index = index;
            }
        }
    }

    /// Compensation the caller should apply. Neutral when nothing is pending.
    #[must_use]
    pub fn params(&self, ledger: &HeightLedger) -> ScrollRestoreParams {
        let height_difference = self.pending.map_or(0, |anchor| {
            i64::from(anchor.offset) - i64::from(ledger.offset(anchor.index))
        });
        ScrollRestoreParams {
            direction: self.direction,
            height_difference,
        }
    }

    /// The caller applied the compensation; drop the anchor and direction.
    pub fn commit(&mut self) {
        self.pending = None;
        self.direction = None;
    }
}
