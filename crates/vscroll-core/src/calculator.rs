#![forbid(unsafe_code)]

//! Pure window computations.
//!
//! Every function here is a total function of its inputs: no controller
//! state, no side effects. The controller composes them and owns the
//! bookkeeping around the results.
//!
//! Pixel accumulation is done in `u64` so a long run of tall items cannot
//! overflow mid-walk; results are clamped back into the collection.

use crate::geometry::ContainerGeometry;
use crate::ledger::HeightLedger;
use crate::range::{ItemRange, Placeholders, ShiftDirection};

/// Lower bound of the active-item index line, as a fraction of the viewport.
pub const MIN_INDEX_LINE_RATIO: f64 = 0.15;
/// Upper bound of the active-item index line, as a fraction of the viewport.
pub const MAX_INDEX_LINE_RATIO: f64 = 0.85;

/// Window of `page_size` items starting at `start`.
///
/// Near the end the window slides back so it keeps its full width; with
/// fewer than `page_size` items in total it covers the whole collection.
#[must_use]
pub fn range_by_count(start: usize, page_size: usize, total: usize) -> ItemRange {
    if page_size >= total {
        return ItemRange::new(0, total);
    }
    let start = start.min(total);
    let stop = start.saturating_add(page_size);
    if stop >= total {
        ItemRange::new(total - page_size, total)
    } else {
        ItemRange::new(start, stop)
    }
}

/// Window starting at `start` that over-fills `viewport` by at most one item.
///
/// Items are added while the height accumulated so far is still within the
/// viewport. When the collection runs out first and `start > 0`, the start
/// is walked back from the end with the same rule so the viewport stays
/// filled.
///
/// Unmeasured items (height 0) only join while the window holds fewer than
/// `page_size` items, so a partly measured ledger degrades to a page-sized
/// window instead of swallowing the unmeasured tail. Without a page size
/// they join freely.
#[must_use]
pub fn range_by_heights(
    start: usize,
    viewport: u32,
    ledger: &HeightLedger,
    page_size: Option<usize>,
) -> ItemRange {
    let total = ledger.len();
    if total == 0 {
        return ItemRange::default();
    }
    let budget = page_size.unwrap_or(usize::MAX);
    let admits = |index: usize, width: usize| ledger.height(index) > 0 || width < budget;

    let viewport = u64::from(viewport);
    let mut start = start.min(total);
    let mut stop = start;
    let mut filled: u64 = 0;
    while stop < total && filled <= viewport && admits(stop, stop - start) {
        filled += u64::from(ledger.height(stop));
        stop += 1;
    }

    if stop == total && filled <= viewport && start > 0 {
        let mut back = total;
        let mut back_filled: u64 = 0;
        while back > 0 && back_filled <= viewport && admits(back - 1, total - back) {
            back -= 1;
            back_filled += u64::from(ledger.height(back));
        }
        start = start.min(back);
    }
    ItemRange::new(start, stop)
}

/// Index of the first item not entirely above `scroll_top - top_trigger`.
#[must_use]
pub fn locate_scroll_position(ledger: &HeightLedger, scroll_top: u32, top_trigger: u32) -> usize {
    let threshold = i64::from(scroll_top) - i64::from(top_trigger);
    ledger.count_fully_above(threshold)
}

/// `page_size` window centred on the item at `scroll_top`.
#[must_use]
pub fn range_by_scroll_position(
    ledger: &HeightLedger,
    scroll_top: u32,
    top_trigger: u32,
    page_size: usize,
) -> ItemRange {
    let total = ledger.len();
    let located = locate_scroll_position(ledger, scroll_top, top_trigger);
    let mut start = located.saturating_sub(page_size / 2);
    let stop = start.saturating_add(page_size).min(total);
    if stop == total {
        let missing = page_size.saturating_sub(stop.saturating_sub(start));
        start = start.saturating_sub(missing);
    }
    ItemRange::new(start.min(stop), stop)
}

/// Inputs for a one-segment directional shift.
#[derive(Debug, Clone, Copy)]
pub struct SegmentShift<'a> {
    pub direction: ShiftDirection,
    pub current: ItemRange,
    pub page_size: usize,
    pub segment_size: usize,
    pub geometry: &'a ContainerGeometry,
    pub ledger: &'a HeightLedger,
}

/// Move `current` one segment toward `direction`.
///
/// The leading edge advances by `max(segment_size, page_size - width)`
/// items; the trailing edge drops items that are already far enough past the
/// viewport (see [`items_to_hide`]) but never below a full page.
#[must_use]
pub fn shift_by_segment(shift: &SegmentShift<'_>) -> ItemRange {
    let total = shift.ledger.len();
    let current = shift.current.clamped(total);
    let page_size = shift.page_size;
    let segment = shift
        .segment_size
        .max(page_size.saturating_sub(current.len()));
    let hidden = items_to_hide(shift);

    match shift.direction {
        ShiftDirection::Up => {
            let start = current.start.saturating_sub(segment);
            let floor = start.saturating_add(page_size).min(total);
            let stop = current.stop.saturating_sub(hidden).max(floor);
            ItemRange::new(start, stop)
        }
        ShiftDirection::Down => {
            let mut stop = current.stop.saturating_add(segment).min(total);
            if stop < page_size && stop < total {
                stop = page_size.min(total);
            }
            let start = current
                .start
                .saturating_add(hidden)
                .min(stop.saturating_sub(page_size));
            ItemRange::new(start, stop)
        }
    }
}

/// How many items on the trailing side of `current` can be dropped.
///
/// Shifting up trims the bottom: items whose offset below the window's top
/// exceeds `viewport + triggers` are out of reach. Shifting down trims the
/// top: leading items whose running height stays under
/// `scroll - viewport - triggers` have scrolled away.
#[must_use]
pub fn items_to_hide(shift: &SegmentShift<'_>) -> usize {
    let ledger = shift.ledger;
    let current = shift.current.clamped(ledger.len());
    let span = shift.geometry.trigger_span();

    match shift.direction {
        ShiftDirection::Up => {
            let top = ledger.offset(current.start);
            let mut hidden = 0;
            let mut index = current.stop;
            while index > current.start + 1 {
                index -= 1;
                let below_top = u64::from(ledger.offset(index).saturating_sub(top));
                if below_top > span {
                    hidden += 1;
                } else {
                    break;
                }
            }
            hidden
        }
        ShiftDirection::Down => {
            let span = i64::try_from(span).unwrap_or(i64::MAX);
            let distance = i64::from(shift.geometry.scroll) - span;
            if distance < 0 {
                return 0;
            }
            let mut hidden = 0;
            let mut accumulated: i64 = 0;
            for index in current.start..current.stop {
                let next = accumulated + i64::from(ledger.height(index));
                if next >= distance {
                    break;
                }
                accumulated = next;
                hidden += 1;
            }
            hidden
        }
    }
}

/// Grow `range` back toward `page_size` items after a removal.
///
/// Fills from below first, then from above; `above_first` reverses that.
#[must_use]
pub fn backfill(range: ItemRange, page_size: usize, total: usize, above_first: bool) -> ItemRange {
    let range = range.clamped(total);
    if range.len() >= page_size {
        return range;
    }
    if above_first {
        let start = range.stop.saturating_sub(page_size);
        let stop = start.saturating_add(page_size).min(total).max(range.stop);
        ItemRange::new(start, stop)
    } else {
        let stop = range.start.saturating_add(page_size).min(total);
        let start = stop.saturating_sub(page_size).min(range.start);
        ItemRange::new(start, stop)
    }
}

/// Placeholder heights for the items outside `range`.
#[must_use]
pub fn placeholders_for(range: ItemRange, ledger: &HeightLedger) -> Placeholders {
    let total = ledger.len();
    let range = range.clamped(total);
    Placeholders {
        top: ledger.sum(ItemRange::new(0, range.start)),
        bottom: ledger.sum(ItemRange::new(range.stop, total)),
    }
}

/// Index of the item the user is "looking at" for a scroll position.
///
/// At either edge of the collection the edge item wins. Elsewhere an index
/// line is placed inside the viewport, sliding from 15% to 85% of its
/// height as the scroll position moves through the content, and the last
/// item starting above that line is returned.
#[must_use]
pub fn active_element_index(
    range: ItemRange,
    ledger: &HeightLedger,
    geometry: &ContainerGeometry,
    scroll_top: u32,
) -> Option<usize> {
    let total = ledger.len();
    let range = range.clamped(total);
    if range.is_empty() {
        return None;
    }

    let viewport = f64::from(geometry.viewport);
    let max_position = (f64::from(geometry.scroll) - viewport).max(0.0);
    let position = f64::from(scroll_top).min(max_position);

    if range.start == 0 && position <= 0.0 {
        return Some(range.start);
    }
    if range.stop == total && position >= max_position {
        return Some(range.stop - 1);
    }

    let ratio = if max_position > 0.0 {
        position / max_position
    } else {
        0.0
    };
    let line = position + viewport * ratio.clamp(MIN_INDEX_LINE_RATIO, MAX_INDEX_LINE_RATIO);

    let mut active = None;
    for index in range.start..range.stop {
        if f64::from(ledger.offset(index)) < line {
            active = Some(index);
        } else {
            break;
        }
    }
    active
}

/// First item of `range` whose top edge is at or below `scroll_top`; the
/// last item of the window when none is.
#[must_use]
pub fn first_visible_item_index(
    range: ItemRange,
    ledger: &HeightLedger,
    scroll_top: u32,
) -> Option<usize> {
    let range = range.clamped(ledger.len());
    if range.is_empty() {
        return None;
    }
    let found = (range.start..range.stop).find(|&index| ledger.offset(index) >= scroll_top);
    Some(found.unwrap_or(range.stop - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: [u32; 8] = [20, 30, 40, 50, 60, 70, 80, 90];

    // ─── count sizing ───

    #[test]
    fn count_window_from_start_middle_end() {
        assert_eq!(range_by_count(0, 5, 10), ItemRange::new(0, 5));
        assert_eq!(range_by_count(3, 5, 10), ItemRange::new(3, 8));
        assert_eq!(range_by_count(8, 5, 10), ItemRange::new(5, 10));
        assert_eq!(range_by_count(10, 5, 10), ItemRange::new(5, 10));
    }

    #[test]
    fn count_window_covers_small_collections() {
        assert_eq!(range_by_count(2, 5, 3), ItemRange::new(0, 3));
        assert_eq!(range_by_count(0, 5, 0), ItemRange::new(0, 0));
    }

    // ─── height sizing ───

    #[test]
    fn height_window_from_start() {
        let ledger = HeightLedger::from_heights(&MIXED);
        assert_eq!(range_by_heights(0, 200, &ledger, None), ItemRange::new(0, 6));
    }

    #[test]
    fn height_window_from_middle() {
        let ledger = HeightLedger::from_heights(&MIXED);
        assert_eq!(range_by_heights(2, 200, &ledger, None), ItemRange::new(2, 6));
    }

    #[test]
    fn height_window_hugging_end_walks_back() {
        let ledger = HeightLedger::from_heights(&MIXED);
        assert_eq!(range_by_heights(6, 200, &ledger, None), ItemRange::new(5, 8));
        assert_eq!(range_by_heights(8, 200, &ledger, None), ItemRange::new(5, 8));
    }

    #[test]
    fn height_window_short_collection_from_zero() {
        let ledger = HeightLedger::from_heights(&[10, 10]);
        assert_eq!(range_by_heights(0, 200, &ledger, None), ItemRange::new(0, 2));
        assert_eq!(range_by_heights(1, 200, &ledger, None), ItemRange::new(0, 2));
    }

    #[test]
    fn height_window_stops_at_unmeasured_tail() {
        let mut ledger = HeightLedger::with_len(1_000);
        ledger.write_at(0, &[20; 5]);
        assert_eq!(range_by_heights(0, 200, &ledger, Some(5)), ItemRange::new(0, 5));
        assert_eq!(range_by_heights(0, 200, &ledger, Some(8)), ItemRange::new(0, 8));
    }

    #[test]
    fn height_window_measured_items_exceed_page_size() {
        let mut ledger = HeightLedger::with_len(1_000);
        ledger.write_at(0, &[10; 30]);
        assert_eq!(range_by_heights(0, 200, &ledger, Some(5)), ItemRange::new(0, 21));
    }

    #[test]
    fn height_window_unmeasured_end_walks_back_one_page() {
        let mut ledger = HeightLedger::with_len(1_000);
        ledger.write_at(0, &[20; 5]);
        assert_eq!(range_by_heights(1_000, 200, &ledger, Some(5)), ItemRange::new(995, 1_000));
    }

    #[test]
    fn height_window_empty() {
        assert_eq!(range_by_heights(3, 200, &HeightLedger::new(), None), ItemRange::default());
    }

    // ─── scroll position ───

    #[test]
    fn scroll_window_centres_on_located_item() {
        let ledger = HeightLedger::from_heights(&[20; 8]);
        assert_eq!(range_by_scroll_position(&ledger, 0, 10, 5), ItemRange::new(0, 5));
        assert_eq!(range_by_scroll_position(&ledger, 100, 10, 5), ItemRange::new(2, 7));
        assert_eq!(range_by_scroll_position(&ledger, 160, 10, 5), ItemRange::new(3, 8));
    }

    #[test]
    fn scroll_window_with_unmeasured_items_hugs_end() {
        let ledger = HeightLedger::with_len(10);
        assert_eq!(range_by_scroll_position(&ledger, 50, 0, 4), ItemRange::new(6, 10));
    }

    // ─── segment shift ───

    fn shift(
        direction: ShiftDirection,
        current: ItemRange,
        geometry: &ContainerGeometry,
        ledger: &HeightLedger,
    ) -> ItemRange {
        shift_by_segment(&SegmentShift {
            direction,
            current,
            page_size: 5,
            segment_size: 1,
            geometry,
            ledger,
        })
    }

    #[test]
    fn shift_up_keeps_bottom_within_reach() {
        let ledger = HeightLedger::from_heights(&[60; 10]);
        let geometry = ContainerGeometry::new(200, 600).with_triggers(60, 60);
        let next = shift(ShiftDirection::Up, ItemRange::new(2, 6), &geometry, &ledger);
        assert_eq!(next, ItemRange::new(1, 6));
    }

    #[test]
    fn shift_down_fills_page_before_hiding() {
        let ledger = HeightLedger::from_heights(&[60; 10]);
        let geometry = ContainerGeometry::new(200, 240).with_triggers(60, 60);
        let next = shift(ShiftDirection::Down, ItemRange::new(0, 4), &geometry, &ledger);
        assert_eq!(next, ItemRange::new(0, 5));
    }

    #[test]
    fn shift_down_hides_scrolled_away_items() {
        let mut ledger = HeightLedger::with_len(5);
        ledger.write_at(0, &[60, 60, 60]);
        let geometry = ContainerGeometry::new(80, 300).with_triggers(24, 24);
        let next = shift_by_segment(&SegmentShift {
            direction: ShiftDirection::Down,
            current: ItemRange::new(0, 3),
            page_size: 3,
            segment_size: 1,
            geometry: &geometry,
            ledger: &ledger,
        });
        assert_eq!(next, ItemRange::new(1, 4));
    }

    #[test]
    fn shift_clamps_at_edges() {
        let ledger = HeightLedger::with_len(5);
        let geometry = ContainerGeometry::default();
        assert_eq!(
            shift(ShiftDirection::Up, ItemRange::new(0, 5), &geometry, &ledger),
            ItemRange::new(0, 5)
        );
        assert_eq!(
            shift(ShiftDirection::Down, ItemRange::new(0, 5), &geometry, &ledger),
            ItemRange::new(0, 5)
        );
    }

    #[test]
    fn hide_nothing_when_viewport_not_scrolled_past() {
        let ledger = HeightLedger::from_heights(&[60; 10]);
        let geometry = ContainerGeometry::new(200, 240).with_triggers(60, 60);
        let params = SegmentShift {
            direction: ShiftDirection::Down,
            current: ItemRange::new(0, 4),
            page_size: 5,
            segment_size: 1,
            geometry: &geometry,
            ledger: &ledger,
        };
        assert_eq!(items_to_hide(&params), 0);
    }

    // ─── backfill ───

    #[test]
    fn backfill_below_then_above() {
        assert_eq!(backfill(ItemRange::new(0, 4), 5, 4, false), ItemRange::new(0, 4));
        assert_eq!(backfill(ItemRange::new(3, 3), 5, 3, false), ItemRange::new(0, 3));
        assert_eq!(backfill(ItemRange::new(4, 6), 4, 8, false), ItemRange::new(4, 8));
        assert_eq!(backfill(ItemRange::new(6, 8), 4, 8, false), ItemRange::new(4, 8));
    }

    #[test]
    fn backfill_above_first() {
        assert_eq!(backfill(ItemRange::new(4, 6), 4, 8, true), ItemRange::new(2, 6));
        assert_eq!(backfill(ItemRange::new(0, 3), 5, 3, true), ItemRange::new(0, 3));
        assert_eq!(backfill(ItemRange::new(0, 1), 3, 8, true), ItemRange::new(0, 3));
        assert_eq!(backfill(ItemRange::new(0, 0), 5, 0, true), ItemRange::new(0, 0));
    }

    #[test]
    fn backfill_leaves_full_window() {
        assert_eq!(backfill(ItemRange::new(2, 9), 5, 10, false), ItemRange::new(2, 9));
    }

    // ─── placeholders ───

    #[test]
    fn placeholders_from_ledger() {
        let ledger = HeightLedger::from_heights(&MIXED);
        assert_eq!(
            placeholders_for(ItemRange::new(2, 6), &ledger),
            Placeholders::new(50, 170)
        );
        assert_eq!(
            placeholders_for(ItemRange::new(0, 8), &ledger),
            Placeholders::new(0, 0)
        );
    }

    // ─── active element ───

    const ACTIVE: [u32; 11] = [30, 30, 60, 30, 120, 120, 60, 60, 120, 30, 30];

    fn active(scroll_top: u32) -> Option<usize> {
        let ledger = HeightLedger::from_heights(&ACTIVE);
        let geometry = ContainerGeometry::new(90, 690).with_triggers(30, 30);
        active_element_index(ItemRange::new(0, 11), &ledger, &geometry, scroll_top)
    }

    #[test]
    fn active_element_at_edges() {
        assert_eq!(active(0), Some(0));
        assert_eq!(active(600), Some(10));
        assert_eq!(active(9_999), Some(10));
    }

    #[test]
    fn active_element_follows_index_line() {
        let expected = [
            (15, 0),
            (30, 1),
            (60, 2),
            (90, 2),
            (105, 3),
            (135, 4),
            (225, 4),
            (240, 5),
            (330, 5),
            (345, 6),
            (405, 7),
            (450, 8),
            (540, 8),
            (555, 9),
            (585, 10),
        ];
        for (scroll_top, index) in expected {
            assert_eq!(active(scroll_top), Some(index), "scroll_top={scroll_top}");
        }
    }

    #[test]
    fn active_element_empty_window() {
        let ledger = HeightLedger::new();
        let geometry = ContainerGeometry::new(90, 690);
        assert_eq!(active_element_index(ItemRange::default(), &ledger, &geometry, 0), None);
    }

    // ─── first visible ───

    #[test]
    fn first_visible_item() {
        let ledger = HeightLedger::from_heights(&[20; 8]);
        let range = ItemRange::new(2, 6);
        assert_eq!(first_visible_item_index(range, &ledger, 0), Some(2));
        assert_eq!(first_visible_item_index(range, &ledger, 61), Some(4));
        assert_eq!(first_visible_item_index(range, &ledger, 500), Some(5));
        assert_eq!(first_visible_item_index(ItemRange::default(), &ledger, 0), None);
    }
}
