//! Record a controller session as an op trace, replay it, and compare.

use vscroll_core::trace::{OpReplayer, OpTraceReader, OpTraceWriter, TraceRecord};
use vscroll_core::{
    ContainerGeometry, GeometryUpdate, RangeController, RangeOptions, ShiftDirection,
    TriggerVisibility,
};

fn session() -> Vec<TraceRecord> {
    vec![
        TraceRecord::Reset {
            start: 0,
            total: 40,
            heights: None,
        },
        TraceRecord::UpdateHeights {
            heights: vec![40, 55, 30, 80, 60, 45, 70, 35],
        },
        TraceRecord::ShiftToScroll { scroll_top: 120 },
        TraceRecord::Shift {
            direction: ShiftDirection::Down,
        },
        TraceRecord::UpdateHeights {
            heights: vec![50; 10],
        },
        TraceRecord::Add {
            index: 0,
            count: 3,
            triggers: TriggerVisibility::NONE,
            direction: Some(ShiftDirection::Up),
        },
        TraceRecord::Restore,
        TraceRecord::Remove {
            index: 5,
            count: 4,
            force: true,
        },
        TraceRecord::ViewResize {
            height: 2400,
            scroll_top: 300,
            heights: None,
        },
        TraceRecord::SetGeometry {
            update: GeometryUpdate {
                viewport: Some(250),
                ..GeometryUpdate::default()
            },
        },
        TraceRecord::ViewportResize {
            viewport: 320,
            top_offset: 20,
            bottom_offset: 20,
            heights: None,
        },
        TraceRecord::SetOptions {
            options: RangeOptions::paged(12).with_segment_size(3),
        },
        TraceRecord::Shift {
            direction: ShiftDirection::Up,
        },
    ]
}

fn settings() -> (RangeOptions, ContainerGeometry) {
    (
        RangeOptions::paged(8).with_segment_size(2),
        ContainerGeometry::new(200, 1600).with_triggers(30, 30),
    )
}

#[test]
fn replay_matches_live_session() {
    let (options, geometry) = settings();
    let mut live = RangeController::new(options, geometry);
    let mut writer = OpTraceWriter::from_writer(Vec::new(), options, geometry).unwrap();
    let mut live_results = Vec::new();
    for record in session() {
        let result = record.apply_to(&mut live).unwrap().unwrap();
        live_results.push((result, live.params_to_restore_scroll()));
        writer.record(&record).unwrap();
    }
    let bytes = writer.finish().unwrap();

    let trace = OpTraceReader::from_bytes(&bytes).unwrap();
    assert_eq!(trace.total_ops(), Some(session().len() as u64));

    let mut replayer = OpReplayer::from_trace(&trace);
    let steps = replayer.replay(&trace).unwrap();
    assert_eq!(steps.len(), live_results.len());
    for (step, (result, restore)) in steps.iter().zip(&live_results) {
        assert_eq!(&step.result, result, "step {} ({})", step.seq, step.op);
        assert_eq!(&step.restore, restore, "step {} ({})", step.seq, step.op);
    }

    let replayed = replayer.into_controller();
    assert_eq!(replayed.range(), live.range());
    assert_eq!(replayed.ledger(), live.ledger());
    assert_eq!(replayed.geometry(), live.geometry());
    assert!(replayed.invariant_violations().is_empty());
}

#[test]
fn replay_is_deterministic() {
    let (options, geometry) = settings();
    let mut writer = OpTraceWriter::from_writer(Vec::new(), options, geometry).unwrap();
    for record in session() {
        writer.record(&record).unwrap();
    }
    let trace = OpTraceReader::from_bytes(&writer.finish().unwrap()).unwrap();

    let first = OpReplayer::from_trace(&trace).replay(&trace).unwrap();
    let second = OpReplayer::from_trace(&trace).replay(&trace).unwrap();
    assert_eq!(first, second);
}

#[test]
fn steps_serialize_as_json_lines() {
    let (options, geometry) = settings();
    let mut writer = OpTraceWriter::from_writer(Vec::new(), options, geometry).unwrap();
    writer
        .record(&TraceRecord::Reset {
            start: 0,
            total: 20,
            heights: None,
        })
        .unwrap();
    let trace = OpTraceReader::from_bytes(&writer.finish().unwrap()).unwrap();
    let steps = OpReplayer::from_trace(&trace).replay(&trace).unwrap();

    let value = serde_json::to_value(&steps[0]).unwrap();
    assert_eq!(value["seq"], 1);
    assert_eq!(value["op"], "reset");
    assert_eq!(value["result"]["range"]["start"], 0);
    assert_eq!(value["result"]["range"]["stop"], 8);
    assert_eq!(value["restore"]["direction"], serde_json::Value::Null);
}

#[test]
fn trace_file_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.jsonl");
    let (options, geometry) = settings();

    let mut writer = OpTraceWriter::create(&path, options, geometry).unwrap();
    for record in session() {
        writer.record(&record).unwrap();
    }
    writer.finish().unwrap();

    let trace = OpTraceReader::open(&path).unwrap();
    assert_eq!(trace.ops().cloned().collect::<Vec<_>>(), session());
    assert_eq!(trace.settings(), (options, geometry));
}
