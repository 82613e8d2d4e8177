#![forbid(unsafe_code)]

//! Static options, container geometry, and the sizing-mode discriminant.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Windowing options fixed for a rendering session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RangeOptions {
    /// Target number of rendered items. `None` renders the whole collection.
    pub page_size: Option<usize>,
    /// Items moved per directional shift. Default: 1.
    pub segment_size: usize,
    /// Extra items an insertion may grow the window by beyond `page_size`
    /// before trimming kicks in. Default: 0.
    pub insert_overflow: usize,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            page_size: None,
            segment_size: 1,
            insert_overflow: 0,
        }
    }
}

impl RangeOptions {
    /// Options with a page size and default segment.
    #[must_use]
    pub fn paged(page_size: usize) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_segment_size(mut self, segment_size: usize) -> Self {
        self.segment_size = segment_size;
        self
    }

    #[must_use]
    pub fn with_insert_overflow(mut self, insert_overflow: usize) -> Self {
        self.insert_overflow = insert_overflow;
        self
    }

    /// Page size if one is configured and non-zero.
    #[inline]
    #[must_use]
    pub fn effective_page_size(&self) -> Option<usize> {
        self.page_size.filter(|&p| p > 0)
    }

    /// Segment size, never below one item.
    #[inline]
    #[must_use]
    pub fn effective_segment_size(&self) -> usize {
        self.segment_size.max(1)
    }

    /// Maximum window width an insertion may produce.
    #[inline]
    #[must_use]
    pub fn growth_cap(&self) -> Option<usize> {
        self.effective_page_size()
            .map(|p| p.saturating_add(self.insert_overflow))
    }
}

/// Pixel geometry of the scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContainerGeometry {
    /// Visible height.
    pub viewport: u32,
    /// Scrollable content height.
    pub scroll: u32,
    /// Distance from the window's top edge at which more items are wanted.
    pub top_trigger: u32,
    /// Distance from the window's bottom edge at which more items are wanted.
    pub bottom_trigger: u32,
}

impl ContainerGeometry {
    #[must_use]
    pub const fn new(viewport: u32, scroll: u32) -> Self {
        Self {
            viewport,
            scroll,
            top_trigger: 0,
            bottom_trigger: 0,
        }
    }

    #[must_use]
    pub const fn with_triggers(mut self, top: u32, bottom: u32) -> Self {
        self.top_trigger = top;
        self.bottom_trigger = bottom;
        self
    }

    /// `viewport + top_trigger + bottom_trigger`, widened to avoid overflow.
    #[inline]
    #[must_use]
    pub fn trigger_span(&self) -> u64 {
        u64::from(self.viewport) + u64::from(self.top_trigger) + u64::from(self.bottom_trigger)
    }

    /// Apply a partial update, leaving unset fields alone.
    #[must_use]
    pub fn merged(mut self, update: GeometryUpdate) -> Self {
        if let Some(v) = update.viewport {
            self.viewport = v;
        }
        if let Some(v) = update.scroll {
            self.scroll = v;
        }
        if let Some(v) = update.top_trigger {
            self.top_trigger = v;
        }
        if let Some(v) = update.bottom_trigger {
            self.bottom_trigger = v;
        }
        self
    }
}

/// Partial geometry change; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeometryUpdate {
    pub viewport: Option<u32>,
    pub scroll: Option<u32>,
    pub top_trigger: Option<u32>,
    pub bottom_trigger: Option<u32>,
}

/// How a fresh window is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingMode {
    /// Fill the viewport using measured heights.
    ByHeight { viewport: u32 },
    /// Render a fixed number of items.
    ByCount { page_size: usize },
    /// Render the whole collection.
    Unbounded,
}

impl SizingMode {
    /// Pick the mode for the given state.
    ///
    /// Height-driven sizing needs both measured heights and a positive
    /// viewport; otherwise the page size decides, and without one the window
    /// covers everything. `ByHeight` still honours the page size for
    /// unmeasured items, see [`range_by_heights`](crate::calculator::range_by_heights).
    #[must_use]
    pub fn select(
        options: &RangeOptions,
        geometry: &ContainerGeometry,
        heights_known: bool,
    ) -> Self {
        if heights_known && geometry.viewport > 0 {
            return Self::ByHeight {
                viewport: geometry.viewport,
            };
        }
        match options.effective_page_size() {
            Some(page_size) => Self::ByCount { page_size },
            None => Self::Unbounded,
        }
    }
}
