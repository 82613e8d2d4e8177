#![forbid(unsafe_code)]

//! The range controller state machine.
//!
//! [`RangeController`] owns the height ledger, the current window, and the
//! restoration advisor. Every mutation returns the new
//! [`RangeShiftResult`]; the caller slices its items with `range`, sizes its
//! spacer elements from `placeholders`, re-renders, reports measured heights
//! through [`update_items_heights`](RangeController::update_items_heights),
//! and finally applies [`params_to_restore_scroll`](RangeController::params_to_restore_scroll)
//! if [`is_need_to_restore_position`](RangeController::is_need_to_restore_position)
//! says so.
//!
//! Call order matters: each result depends on the state left by the previous
//! call, so one logical caller must drive the controller per render cycle.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Heights shorter than the window | Update ignored, `range_changed` stays set |
//! | Heights past the collection end | Dropped |
//! | Viewport is 0 | Count-driven sizing via `page_size` |
//! | No `page_size` | Window covers the whole collection |
//! | Insert index past the end | Clamped to the item count |
//! | Removal span past the end | Clamped to the collection; may remove nothing |
//! | Insert count overflows `usize` | [`RangeError::InvalidArgument`] |
//! | Heights only partly measured | Unmeasured items fill up to `page_size` |

use crate::calculator::{self, SegmentShift};
use crate::error::RangeError;
use crate::geometry::{ContainerGeometry, GeometryUpdate, RangeOptions, SizingMode};
use crate::ledger::HeightLedger;
use crate::range::{
    ItemRange, Placeholders, RangeShiftResult, ScrollRestoreParams, ShiftDirection,
    TriggerVisibility,
};
use crate::restore::RestorationAdvisor;

/// Virtual-scroll window controller.
#[derive(Debug, Clone)]
pub struct RangeController {
    options: RangeOptions,
    geometry: ContainerGeometry,
    ledger: HeightLedger,
    range: ItemRange,
    old_range: ItemRange,
    range_changed: bool,
    restore: RestorationAdvisor,
    last_scroll_top: u32,
}

impl Default for RangeController {
    fn default() -> Self {
        Self::new(RangeOptions::default(), ContainerGeometry::default())
    }
}

impl RangeController {
    /// Create a controller over an empty collection.
    #[must_use]
    pub fn new(options: RangeOptions, geometry: ContainerGeometry) -> Self {
        Self {
            options,
            geometry,
            ledger: HeightLedger::new(),
            range: ItemRange::default(),
            old_range: ItemRange::default(),
            range_changed: false,
            restore: RestorationAdvisor::new(),
            last_scroll_top: 0,
        }
    }

    /// Create a controller from loaded configuration.
    #[cfg(feature = "config")]
    #[must_use]
    pub fn from_config(config: &crate::config::ControllerConfig) -> Self {
        Self::new(config.options, config.geometry)
    }

    // ─── accessors ───

    #[inline]
    #[must_use]
    pub fn options(&self) -> &RangeOptions {
        &self.options
    }

    /// Replace the options. The current window is kept until the next
    /// mutation.
    pub fn set_options(&mut self, options: RangeOptions) {
        self.options = options;
    }

    #[inline]
    #[must_use]
    pub fn geometry(&self) -> &ContainerGeometry {
        &self.geometry
    }

    pub fn set_geometry(&mut self, geometry: ContainerGeometry) {
        self.geometry = geometry;
    }

    /// Merge a partial geometry update.
    pub fn apply_geometry(&mut self, update: GeometryUpdate) {
        self.geometry = self.geometry.merged(update);
    }

    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &HeightLedger {
        &self.ledger
    }

    #[inline]
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.ledger.len()
    }

    #[inline]
    #[must_use]
    pub fn range(&self) -> ItemRange {
        self.range
    }

    /// Window as it stood when the pending restoration began, or the
    /// current window when nothing is pending.
    #[inline]
    #[must_use]
    pub fn old_range(&self) -> ItemRange {
        self.old_range
    }

    /// True after the window moved and before heights for it arrived.
    #[inline]
    #[must_use]
    pub fn range_changed(&self) -> bool {
        self.range_changed
    }

    #[inline]
    #[must_use]
    pub fn last_scroll_top(&self) -> u32 {
        self.last_scroll_top
    }

    #[inline]
    #[must_use]
    pub fn restoration(&self) -> &RestorationAdvisor {
        &self.restore
    }

    #[must_use]
    pub fn placeholders(&self) -> Placeholders {
        calculator::placeholders_for(self.range, &self.ledger)
    }

    /// Current window and placeholders.
    #[must_use]
    pub fn result(&self) -> RangeShiftResult {
        RangeShiftResult {
            range: self.range,
            placeholders: self.placeholders(),
        }
    }

    /// Sizing mode a scroll-driven recompute would use right now.
    #[must_use]
    pub fn sizing_mode(&self) -> SizingMode {
        SizingMode::select(&self.options, &self.geometry, self.ledger.total() > 0)
    }

    // ─── range mutations ───

    /// Start over with `total` items and a window containing `start`.
    ///
    /// With `heights` and a known viewport the window is sized to fill the
    /// viewport; otherwise it holds `page_size` items. Unmeasured items past
    /// the supplied heights only fill the window up to `page_size`.
    pub fn reset_range(
        &mut self,
        start: usize,
        total: usize,
        heights: Option<&[u32]>,
    ) -> RangeShiftResult {
        #[cfg(feature = "tracing")]
        let from = self.range;
        let heights_known = heights.is_some_and(|h| !h.is_empty());
        match heights {
            Some(heights) => self.ledger.replace(heights, total),
            None => self.ledger.reset(total),
        }

        let start = start.min(total);
        self.range = match SizingMode::select(&self.options, &self.geometry, heights_known) {
            SizingMode::ByHeight { viewport } => calculator::range_by_heights(
                start,
                viewport,
                &self.ledger,
                self.options.effective_page_size(),
            ),
            SizingMode::ByCount { page_size } => {
                calculator::range_by_count(start, page_size, total)
            }
            SizingMode::Unbounded => ItemRange::new(0, total),
        };
        self.old_range = self.range;
        self.range_changed = true;
        self.restore.commit();

        #[cfg(feature = "tracing")]
        self.log_change("vscroll.reset", from, None);
        self.result()
    }

    /// Recompute the window around the item at `scroll_top`.
    ///
    /// An unchanged window leaves `range_changed` alone. Either way any
    /// pending restoration is dropped: the caller's scroll position is
    /// already the reference.
    pub fn shift_range_to_scroll_position(&mut self, scroll_top: u32) -> RangeShiftResult {
        let from = self.range;
        self.last_scroll_top = scroll_top;

        let next = match self.sizing_mode() {
            SizingMode::ByHeight { viewport } => {
                let located = calculator::locate_scroll_position(
                    &self.ledger,
                    scroll_top,
                    self.geometry.top_trigger,
                );
                calculator::range_by_heights(
                    located,
                    viewport,
                    &self.ledger,
                    self.options.effective_page_size(),
                )
            }
            SizingMode::ByCount { page_size } => calculator::range_by_scroll_position(
                &self.ledger,
                scroll_top,
                self.geometry.top_trigger,
                page_size,
            ),
            SizingMode::Unbounded => ItemRange::new(0, self.item_count()),
        };

        if next != from {
            self.range = next;
            self.range_changed = true;
        }
        self.old_range = self.range;
        self.restore.commit();

        #[cfg(feature = "tracing")]
        self.log_change("vscroll.shift_to_scroll", from, None);
        self.result()
    }

    /// Move the window one segment toward `direction`.
    ///
    /// Always leaves a restoration pending: the rows at a fixed screen
    /// position change even when the caller did not scroll.
    pub fn shift_range(&mut self, direction: ShiftDirection) -> RangeShiftResult {
        let from = self.range;
        let total = self.item_count();

        let next = match self.options.effective_page_size() {
            Some(page_size) => calculator::shift_by_segment(&SegmentShift {
                direction,
                current: from,
                page_size,
                segment_size: self.options.effective_segment_size(),
                geometry: &self.geometry,
                ledger: &self.ledger,
            }),
            None => ItemRange::new(0, total),
        };

        let anchor = match direction {
            ShiftDirection::Up => from.start,
            ShiftDirection::Down => next.start,
        };
        self.begin_restoration(direction, anchor, from);
        if next != from {
            self.range = next;
            self.range_changed = true;
        }

        #[cfg(feature = "tracing")]
        self.log_change("vscroll.shift", from, Some(direction));
        self.result()
    }

    /// Insert `count` items before `index`, clamped to the item count.
    ///
    /// `triggers` says which edge triggers are on screen; `predicted` is the
    /// direction the caller expects the user to scroll next. Inserting above
    /// the window with `predicted == Up` and the top trigger hidden leaves a
    /// restoration pending so the visible rows stay put.
    ///
    /// # Errors
    ///
    /// [`RangeError::InvalidArgument`] if the new item count overflows.
    pub fn add_items(
        &mut self,
        index: usize,
        count: usize,
        triggers: TriggerVisibility,
        predicted: Option<ShiftDirection>,
    ) -> Result<RangeShiftResult, RangeError> {
        let item_count = self.item_count();
        if item_count.checked_add(count).is_none() {
            return Err(self.reject(RangeError::invalid(
                "add_items",
                format!("adding {count} items to {item_count} overflows"),
            )));
        }
        if count == 0 {
            return Ok(self.result());
        }

        let index = index.min(item_count);
        let from = self.range;
        self.ledger.insert(index, count);
        self.restore.on_insert(index, count);
        let total = self.item_count();

        let hold_top = predicted == Some(ShiftDirection::Up) && !triggers.up;
        let shifted_anchor = if index <= from.start {
            from.start + count
        } else {
            from.start
        };
        let inside = index < from.stop || (from.is_empty() && index == from.start);

        let next = match self.options.growth_cap() {
            None => ItemRange::new(0, total),
            Some(_) if index < from.start => {
                if hold_top {
                    self.begin_restoration(ShiftDirection::Up, shifted_anchor, from);
                }
                ItemRange::new(from.start + count, from.stop + count)
            }
            Some(cap) if inside => {
                let mut start = from.start;
                let mut stop = from.stop + count;
                if stop - start > cap {
                    if hold_top {
                        start = stop - cap;
                    } else {
                        stop = start + cap;
                    }
                }
                if hold_top && (index == from.start || start > from.start) {
                    self.begin_restoration(ShiftDirection::Up, shifted_anchor, from);
                }
                ItemRange::new(start, stop)
            }
            Some(cap) if triggers.down => {
                let stop = from
                    .stop
                    .saturating_add(count)
                    .min(from.start.saturating_add(cap))
                    .max(from.stop);
                ItemRange::new(from.start, stop)
            }
            Some(_) => from,
        };

        if next != from || inside {
            self.range_changed = true;
        }
        self.range = next.clamped(total);

        #[cfg(feature = "tracing")]
        self.log_change("vscroll.add", from, predicted);
        Ok(self.result())
    }

    /// Remove `count` items starting at `index`.
    ///
    /// The span is clamped to the collection. The window follows its
    /// surviving items and then backfills toward `page_size` from below (or
    /// from above first when `force` is set, for removals that happened
    /// above the visual anchor).
    pub fn remove_items(&mut self, index: usize, count: usize, force: bool) -> RangeShiftResult {
        let item_count = self.item_count();
        let end = index.saturating_add(count).min(item_count);
        let index = index.min(item_count);
        let count = end - index;
        if count == 0 {
            return self.result();
        }

        let from = self.range;
        self.ledger.remove(index, count);
        self.restore.on_remove(index, count);
        let total = self.item_count();

        let removed_before = end.min(from.start).saturating_sub(index);
        let removed_inside = end.min(from.stop).saturating_sub(index.max(from.start));
        let survivors = ItemRange::new(
            from.start - removed_before,
            from.stop - removed_before - removed_inside,
        );

        let next = match self.options.effective_page_size() {
            Some(page_size) => calculator::backfill(survivors, page_size, total, force),
            None => ItemRange::new(0, total),
        };
        if next != from || removed_inside > 0 {
            self.range_changed = true;
        }
        self.range = next;

        #[cfg(feature = "tracing")]
        self.log_change("vscroll.remove", from, None);
        self.result()
    }

    // ─── measurements ───

    /// Report measured heights for the rendered window, starting at
    /// `range.start`.
    ///
    /// Returns `false` (and keeps `range_changed` set) when fewer heights
    /// than rendered items were supplied.
    pub fn update_items_heights(&mut self, heights: &[u32]) -> bool {
        let applied = self.write_window_heights(heights);
        if applied {
            self.range_changed = false;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "vscroll.heights",
            supplied = heights.len(),
            start = self.range.start,
            stop = self.range.stop,
            applied
        );
        applied
    }

    /// The scroll container's content height changed.
    ///
    /// Optional `heights` are applied like
    /// [`update_items_heights`](Self::update_items_heights) without clearing
    /// `range_changed`. If the window no longer fills the viewport and more
    /// items exist below, the window is recomputed at `scroll_top`.
    pub fn view_resize(
        &mut self,
        new_height: u32,
        scroll_top: u32,
        heights: Option<&[u32]>,
    ) -> RangeShiftResult {
        self.geometry.scroll = new_height;
        self.last_scroll_top = scroll_top;
        if let Some(heights) = heights {
            self.write_window_heights(heights);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(message = "vscroll.resize", scroll = new_height, scroll_top);
        self.refill_after_resize()
    }

    /// The visible area or its trigger offsets changed.
    ///
    /// Same recompute rule as [`view_resize`](Self::view_resize), anchored
    /// at the last reported scroll position.
    pub fn viewport_resize(
        &mut self,
        viewport: u32,
        top_offset: u32,
        bottom_offset: u32,
        heights: Option<&[u32]>,
    ) -> RangeShiftResult {
        self.geometry.viewport = viewport;
        self.geometry.top_trigger = top_offset;
        self.geometry.bottom_trigger = bottom_offset;
        if let Some(heights) = heights {
            self.write_window_heights(heights);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "vscroll.resize",
            viewport,
            top_trigger = top_offset,
            bottom_trigger = bottom_offset
        );
        self.refill_after_resize()
    }

    // ─── queries ───

    /// True when the window touches the start (`Up`) or end (`Down`) of the
    /// collection.
    #[must_use]
    pub fn is_range_on_edge(&self, direction: ShiftDirection) -> bool {
        match direction {
            ShiftDirection::Up => self.range.start == 0,
            ShiftDirection::Down => self.range.stop == self.item_count(),
        }
    }

    /// True when unrendered items exist beyond the window in `direction`.
    #[must_use]
    pub fn has_items_out_of_range(&self, direction: ShiftDirection) -> bool {
        !self.is_range_on_edge(direction)
    }

    /// Whether the caller can scroll to `index` without moving the window.
    ///
    /// The item must be rendered. With `force_container` (and not
    /// `force_virtual`) the container must also be tall enough to bring the
    /// item to the top of the viewport.
    #[must_use]
    pub fn can_scroll_to_item(
        &self,
        index: usize,
        force_virtual: bool,
        force_container: bool,
    ) -> bool {
        if !self.range.contains(index) {
            return false;
        }
        if force_virtual || !force_container {
            return true;
        }
        u64::from(self.ledger.offset(index)) + u64::from(self.geometry.viewport)
            <= u64::from(self.geometry.scroll)
    }

    /// Item the user is looking at for `scroll_top`; `None` when nothing is
    /// rendered.
    #[must_use]
    pub fn active_element_index(&self, scroll_top: u32) -> Option<usize> {
        calculator::active_element_index(self.range, &self.ledger, &self.geometry, scroll_top)
    }

    /// First rendered item whose top edge is at or below `scroll_top`.
    #[must_use]
    pub fn first_visible_item_index(&self, scroll_top: u32) -> Option<usize> {
        calculator::first_visible_item_index(self.range, &self.ledger, scroll_top)
    }

    /// Height of the rendered items.
    #[must_use]
    pub fn rendered_height(&self) -> u32 {
        self.ledger.sum(self.range)
    }

    /// Total scrollable height: top placeholder, rendered items, bottom
    /// placeholder.
    #[must_use]
    pub fn calculate_virtual_scroll_height(&self) -> u32 {
        let placeholders = self.placeholders();
        placeholders
            .top
            .saturating_add(self.rendered_height())
            .saturating_add(placeholders.bottom)
    }

    // ─── restoration ───

    #[inline]
    #[must_use]
    pub fn is_need_to_restore_position(&self) -> bool {
        self.restore.is_pending()
    }

    /// Scroll compensation for the pending mutation; neutral when none is
    /// pending.
    #[must_use]
    pub fn params_to_restore_scroll(&self) -> ScrollRestoreParams {
        self.restore.params(&self.ledger)
    }

    /// The caller applied the compensation.
    pub fn before_restore_scroll_position(&mut self) {
        #[cfg(feature = "tracing")]
        {
            let params = self.params_to_restore_scroll();
            tracing::debug!(
                message = "vscroll.restore",
                pending = self.restore.is_pending(),
                height_difference = params.height_difference
            );
        }
        self.restore.commit();
        self.old_range = self.range;
    }

    // ─── diagnostics ───

    /// Broken internal invariants, if any. Empty for a healthy controller.
    #[must_use]
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let count = self.item_count();
        if self.range.start > self.range.stop {
            violations.push(format!("range {} is inverted", self.range));
        }
        if self.range.stop > count {
            violations.push(format!("range {} exceeds {count} items", self.range));
        }
        let heights = self.ledger.heights();
        let offsets = self.ledger.offsets();
        let mut expected: u32 = 0;
        for (index, (&height, &offset)) in heights.iter().zip(offsets).enumerate() {
            if offset != expected {
                violations.push(format!("offset[{index}] = {offset}, expected {expected}"));
                break;
            }
            expected = expected.saturating_add(height);
        }
        if self.ledger.total() != expected {
            violations.push(format!(
                "ledger total {} does not match height sum {expected}",
                self.ledger.total()
            ));
        }
        if let Some(anchor) = self.restore.anchor_index()
            && anchor > count
        {
            violations.push(format!("restoration anchor {anchor} exceeds {count} items"));
        }
        violations
    }

    // ─── internals ───

    fn begin_restoration(&mut self, direction: ShiftDirection, anchor: usize, from: ItemRange) {
        if !self.restore.is_pending() {
            self.old_range = from;
        }
        self.restore.record(direction, anchor, &self.ledger);
    }

    fn write_window_heights(&mut self, heights: &[u32]) -> bool {
        if heights.len() < self.range.len() {
            return false;
        }
        self.ledger.write_at(self.range.start, heights);
        true
    }

    fn refill_after_resize(&mut self) -> RangeShiftResult {
        let underfilled = self.rendered_height() < self.geometry.viewport;
        if self.item_count() > 0 && underfilled && !self.is_range_on_edge(ShiftDirection::Down) {
            return self.shift_range_to_scroll_position(self.last_scroll_top);
        }
        self.result()
    }

    fn reject(&self, error: RangeError) -> RangeError {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            message = "vscroll.rejected",
            operation = error.operation(),
            reason = %error,
            item_count = self.item_count()
        );
        error
    }

    #[cfg(feature = "tracing")]
    fn log_change(&self, op: &'static str, from: ItemRange, direction: Option<ShiftDirection>) {
        tracing::debug!(
            message = op,
            direction = direction.map(ShiftDirection::as_str),
            from_start = from.start,
            from_stop = from.stop,
            start = self.range.start,
            stop = self.range.stop,
            item_count = self.item_count(),
            restore_pending = self.restore.is_pending()
        );
    }
}
