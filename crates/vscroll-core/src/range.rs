#![forbid(unsafe_code)]

//! Value types exchanged between the controller and its caller.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Half-open window `[start, stop)` over the item index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemRange {
    pub start: usize,
    pub stop: usize,
}

impl ItemRange {
    /// Create a window. `stop` is raised to `start` if it is smaller.
    #[inline]
    #[must_use]
    pub const fn new(start: usize, stop: usize) -> Self {
        let stop = if stop < start { start } else { stop };
        Self { start, stop }
    }

    /// Number of items inside the window.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.stop - self.start
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    /// Whether `index` lies inside the window.
    #[inline]
    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.stop
    }

    /// Clamp both ends into `[0, count]`.
    #[inline]
    #[must_use]
    pub fn clamped(self, count: usize) -> Self {
        Self::new(self.start.min(count), self.stop.min(count))
    }
}

impl fmt::Display for ItemRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.stop)
    }
}

/// Pixel space reserved for the items outside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placeholders {
    /// Aggregate height of items before `start`.
    pub top: u32,
    /// Aggregate height of items at or after `stop`.
    pub bottom: u32,
}

impl Placeholders {
    #[inline]
    #[must_use]
    pub const fn new(top: u32, bottom: u32) -> Self {
        Self { top, bottom }
    }
}

/// The pair every range mutation returns: what to render and how much
/// spacer to put around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangeShiftResult {
    pub range: ItemRange,
    pub placeholders: Placeholders,
}

/// Direction of a window shift or of a predicted insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ShiftDirection {
    /// Toward index 0.
    Up,
    /// Toward the end of the collection.
    Down,
}

impl ShiftDirection {
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for ShiftDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which edge triggers of the rendered window are currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TriggerVisibility {
    pub up: bool,
    pub down: bool,
}

impl TriggerVisibility {
    pub const NONE: Self = Self {
        up: false,
        down: false,
    };
}

/// Scroll compensation the caller should apply after re-rendering.
///
/// `height_difference` is the anchor row's offset when the pending mutation
/// began minus its offset now, so it goes negative when content grew above
/// the anchor. Keeping the anchor visually still means
/// `scroll_top -= height_difference`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScrollRestoreParams {
    pub direction: Option<ShiftDirection>,
    pub height_difference: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_never_inverts() {
        let r = ItemRange::new(5, 2);
        assert_eq!(r, ItemRange { start: 5, stop: 5 });
        assert!(r.is_empty());
    }

    #[test]
    fn contains_is_half_open() {
        let r = ItemRange::new(2, 4);
        assert!(!r.contains(1));
        assert!(r.contains(2));
        assert!(r.contains(3));
        assert!(!r.contains(4));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn clamped_pulls_into_collection() {
        assert_eq!(ItemRange::new(3, 12).clamped(8), ItemRange::new(3, 8));
        assert_eq!(ItemRange::new(10, 12).clamped(8), ItemRange::new(8, 8));
    }

    #[test]
    fn direction_opposite_and_display() {
        assert_eq!(ShiftDirection::Up.opposite(), ShiftDirection::Down);
        assert_eq!(ShiftDirection::Down.to_string(), "down");
        assert_eq!(ItemRange::new(1, 3).to_string(), "[1, 3)");
    }
}
