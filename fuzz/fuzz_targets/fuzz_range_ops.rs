#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vscroll_core::{
    ContainerGeometry, RangeController, RangeOptions, ShiftDirection, SizingMode,
    TriggerVisibility,
};

#[derive(Debug, Arbitrary)]
struct Session {
    page_size: Option<u8>,
    segment_size: u8,
    insert_overflow: u8,
    viewport: u16,
    scroll: u16,
    top_trigger: u8,
    bottom_trigger: u8,
    ops: Vec<Op>,
}

#[derive(Debug, Arbitrary)]
enum Op {
    Reset { start: u16, total: u16, heights: Option<Vec<u8>> },
    ShiftToScroll(u16),
    Shift(bool),
    Add { index: u16, count: u8, up: bool, down: bool, predicted: Option<bool> },
    Remove { index: u16, count: u16, force: bool },
    Heights(Vec<u8>),
    ViewResize { height: u16, scroll_top: u16 },
    ViewportResize { viewport: u16, top: u8, bottom: u8 },
    Restore,
}

fn direction(down: bool) -> ShiftDirection {
    if down { ShiftDirection::Down } else { ShiftDirection::Up }
}

fn widen(heights: &[u8]) -> Vec<u32> {
    heights.iter().map(|&h| u32::from(h)).collect()
}

fuzz_target!(|session: Session| {
    let options = RangeOptions {
        page_size: session.page_size.map(usize::from),
        segment_size: usize::from(session.segment_size),
        insert_overflow: usize::from(session.insert_overflow),
    };
    let geometry = ContainerGeometry::new(u32::from(session.viewport), u32::from(session.scroll))
        .with_triggers(u32::from(session.top_trigger), u32::from(session.bottom_trigger));
    let mut controller = RangeController::new(options, geometry);

    for op in session.ops.iter().take(256) {
        let count = controller.item_count();
        match op {
            Op::Reset { start, total, heights } => {
                let heights = heights.as_deref().map(widen);
                let (start, total) = (usize::from(*start), usize::from(*total));
                controller.reset_range(start, total, heights.as_deref());
            }
            Op::ShiftToScroll(scroll_top) => {
                controller.shift_range_to_scroll_position(u32::from(*scroll_top));
            }
            Op::Shift(down) => {
                controller.shift_range(direction(*down));
            }
            Op::Add { index, count: added, up, down, predicted } => {
                let index = usize::from(*index);
                let result = controller.add_items(
                    index,
                    usize::from(*added),
                    TriggerVisibility { up: *up, down: *down },
                    predicted.map(direction),
                );
                // Past-the-end indices append; only overflow is rejected.
                assert!(result.is_ok(), "add_items({index}) on {count}");
                assert_eq!(controller.item_count(), count + usize::from(*added));
            }
            Op::Remove { index, count: removed, force } => {
                let (index, removed) = (usize::from(*index), usize::from(*removed));
                let before = controller.result();
                let result = controller.remove_items(index, removed, *force);
                let expected = count - (index + removed).min(count) + index.min(count);
                assert_eq!(controller.item_count(), expected);
                if index >= count {
                    assert_eq!(result, before);
                }
            }
            Op::Heights(heights) => {
                let applied = controller.update_items_heights(&widen(heights));
                assert_eq!(applied, heights.len() >= controller.range().len());
            }
            Op::ViewResize { height, scroll_top } => {
                controller.view_resize(u32::from(*height), u32::from(*scroll_top), None);
            }
            Op::ViewportResize { viewport, top, bottom } => {
                controller.viewport_resize(
                    u32::from(*viewport),
                    u32::from(*top),
                    u32::from(*bottom),
                    None,
                );
            }
            Op::Restore => {
                controller.before_restore_scroll_position();
                assert!(!controller.is_need_to_restore_position());
            }
        }

        // Post-conditions that must always hold:
        let range = controller.range();
        assert!(range.start <= range.stop, "inverted window {range}");
        assert!(range.stop <= controller.item_count(), "window {range} past end");
        let violations = controller.invariant_violations();
        assert!(violations.is_empty(), "{violations:?}");

        let placeholders = controller.placeholders();
        let rendered = u64::from(controller.rendered_height());
        assert_eq!(
            u64::from(placeholders.top) + rendered + u64::from(placeholders.bottom),
            u64::from(controller.ledger().total()),
        );
        if let (Some(page_size), SizingMode::ByHeight { .. }) =
            (controller.options().effective_page_size(), controller.sizing_mode())
        {
            let ledger = controller.ledger();
            let unmeasured = (range.start..range.stop)
                .filter(|&index| ledger.height(index) == 0)
                .count();
            if matches!(op, Op::Reset { .. } | Op::ShiftToScroll(_)) {
                assert!(unmeasured <= page_size, "{unmeasured} unmeasured in {range}");
            }
        }
        if let Some(index) = controller.active_element_index(u32::from(session.scroll)) {
            assert!(range.contains(index));
        }
    }
});
