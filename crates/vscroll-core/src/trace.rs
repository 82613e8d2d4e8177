#![forbid(unsafe_code)]

//! Op-trace recording and replay for deterministic debugging.
//!
//! A trace captures every call a host made on a [`RangeController`] so a
//! misbehaving session can be replayed outside the host, step by step.
//!
//! # Format
//!
//! JSONL, one `{"event": ..., ...payload}` object per line. The first line
//! is always a `trace_header` carrying the options and geometry the
//! controller was created with; an optional `trace_summary` closes the file.
//!
//! ```text
//! {"event":"trace_header","schema_version":"vscroll-trace-v1","options":{...},"geometry":{...}}
//! {"event":"reset","start":0,"total":100}
//! {"event":"heights","heights":[20,20,20,20,20]}
//! {"event":"shift","direction":"down"}
//! {"event":"restore"}
//! {"event":"trace_summary","total_ops":3}
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut writer = OpTraceWriter::create("session.jsonl", options, geometry)?;
//! writer.record(&TraceRecord::Reset { start: 0, total: 100, heights: None })?;
//! writer.finish()?;
//!
//! let trace = OpTraceReader::open("session.jsonl")?;
//! let mut replayer = OpReplayer::from_trace(&trace);
//! for record in trace.ops() {
//!     let step = replayer.apply(record)?;
//! }
//! ```

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::controller::RangeController;
use crate::error::RangeError;
use crate::geometry::{ContainerGeometry, GeometryUpdate, RangeOptions};
use crate::range::{RangeShiftResult, ScrollRestoreParams, ShiftDirection, TriggerVisibility};

/// Current schema version for op-trace files.
pub const SCHEMA_VERSION: &str = "vscroll-trace-v1";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A single line of an op-trace file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum TraceRecord {
    /// Header record (first line).
    #[serde(rename = "trace_header")]
    Header {
        schema_version: String,
        #[serde(default)]
        options: RangeOptions,
        #[serde(default)]
        geometry: ContainerGeometry,
    },

    #[serde(rename = "reset")]
    Reset {
        start: usize,
        total: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        heights: Option<Vec<u32>>,
    },

    #[serde(rename = "shift_to_scroll")]
    ShiftToScroll { scroll_top: u32 },

    #[serde(rename = "shift")]
    Shift { direction: ShiftDirection },

    #[serde(rename = "add")]
    Add {
        index: usize,
        count: usize,
        #[serde(default)]
        triggers: TriggerVisibility,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        direction: Option<ShiftDirection>,
    },

    #[serde(rename = "remove")]
    Remove {
        index: usize,
        count: usize,
        #[serde(default)]
        force: bool,
    },

    /// Measured heights for the current window.
    #[serde(rename = "heights")]
    UpdateHeights { heights: Vec<u32> },

    #[serde(rename = "view_resize")]
    ViewResize {
        height: u32,
        scroll_top: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        heights: Option<Vec<u32>>,
    },

    #[serde(rename = "viewport_resize")]
    ViewportResize {
        viewport: u32,
        top_offset: u32,
        bottom_offset: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        heights: Option<Vec<u32>>,
    },

    /// The host applied the pending scroll compensation.
    #[serde(rename = "restore")]
    Restore,

    #[serde(rename = "set_options")]
    SetOptions { options: RangeOptions },

    #[serde(rename = "set_geometry")]
    SetGeometry { update: GeometryUpdate },

    /// Summary record (last line).
    #[serde(rename = "trace_summary")]
    Summary { total_ops: u64 },
}

impl TraceRecord {
    /// Short name of the record kind, as written in the `event` field.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Header { .. } => "trace_header",
            Self::Reset { .. } => "reset",
            Self::ShiftToScroll { .. } => "shift_to_scroll",
            Self::Shift { .. } => "shift",
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::UpdateHeights { .. } => "heights",
            Self::ViewResize { .. } => "view_resize",
            Self::ViewportResize { .. } => "viewport_resize",
            Self::Restore => "restore",
            Self::SetOptions { .. } => "set_options",
            Self::SetGeometry { .. } => "set_geometry",
            Self::Summary { .. } => "trace_summary",
        }
    }

    /// Whether this record is a controller call (not header/summary).
    #[must_use]
    pub const fn is_op(&self) -> bool {
        !matches!(self, Self::Header { .. } | Self::Summary { .. })
    }

    /// Perform the recorded call on `controller`.
    ///
    /// Returns `Ok(None)` for header and summary records.
    ///
    /// # Errors
    ///
    /// Whatever the controller rejects.
    pub fn apply_to(
        &self,
        controller: &mut RangeController,
    ) -> Result<Option<RangeShiftResult>, RangeError> {
        let result = match self {
            Self::Header { .. } | Self::Summary { .. } => return Ok(None),
            Self::Reset {
                start,
                total,
                heights,
            } => controller.reset_range(*start, *total, heights.as_deref()),
            Self::ShiftToScroll { scroll_top } => {
                controller.shift_range_to_scroll_position(*scroll_top)
            }
            Self::Shift { direction } => controller.shift_range(*direction),
            Self::Add {
                index,
                count,
                triggers,
                direction,
            } => controller.add_items(*index, *count, *triggers, *direction)?,
            Self::Remove {
                index,
                count,
                force,
            } => controller.remove_items(*index, *count, *force),
            Self::UpdateHeights { heights } => {
                controller.update_items_heights(heights);
                controller.result()
            }
            Self::ViewResize {
                height,
                scroll_top,
                heights,
            } => controller.view_resize(*height, *scroll_top, heights.as_deref()),
            Self::ViewportResize {
                viewport,
                top_offset,
                bottom_offset,
                heights,
            } => controller.viewport_resize(
                *viewport,
                *top_offset,
                *bottom_offset,
                heights.as_deref(),
            ),
            Self::Restore => {
                controller.before_restore_scroll_position();
                controller.result()
            }
            Self::SetOptions { options } => {
                controller.set_options(*options);
                controller.result()
            }
            Self::SetGeometry { update } => {
                controller.apply_geometry(*update);
                controller.result()
            }
        };
        Ok(Some(result))
    }
}

// ---------------------------------------------------------------------------
// OpTraceWriter
// ---------------------------------------------------------------------------

/// Writes op-trace records as JSONL.
pub struct OpTraceWriter<W: Write> {
    writer: BufWriter<W>,
    op_count: u64,
}

impl OpTraceWriter<std::fs::File> {
    /// Create a trace file at `path`.
    pub fn create(
        path: impl AsRef<Path>,
        options: RangeOptions,
        geometry: ContainerGeometry,
    ) -> io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Self::from_writer(file, options, geometry)
    }
}

impl<W: Write> OpTraceWriter<W> {
    /// Wrap any writer and emit the header line.
    pub fn from_writer(
        writer: W,
        options: RangeOptions,
        geometry: ContainerGeometry,
    ) -> io::Result<Self> {
        let mut this = Self {
            writer: BufWriter::new(writer),
            op_count: 0,
        };
        this.write_line(&TraceRecord::Header {
            schema_version: SCHEMA_VERSION.to_string(),
            options,
            geometry,
        })?;
        Ok(this)
    }

    /// Append one record. Header and summary records are not counted.
    pub fn record(&mut self, record: &TraceRecord) -> io::Result<()> {
        self.write_line(record)?;
        if record.is_op() {
            self.op_count += 1;
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn op_count(&self) -> u64 {
        self.op_count
    }

    /// Write the summary, flush, and return the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        let summary = TraceRecord::Summary {
            total_ops: self.op_count,
        };
        self.write_line(&summary)?;
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn write_line(&mut self, record: &TraceRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")
    }
}

// ---------------------------------------------------------------------------
// OpTraceReader
// ---------------------------------------------------------------------------

/// A trace line that could not be understood.
///
/// Carried inside the `InvalidData` [`io::Error`] returned by
/// [`OpTraceReader`]; retrieve it with `err.get_ref()` and `downcast_ref`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceParseError {
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for TraceParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for TraceParseError {}

impl TraceParseError {
    fn into_io(self) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, self)
    }
}

/// Reads op-trace files.
pub struct OpTraceReader;

impl OpTraceReader {
    /// Open and parse a trace file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<OpTraceFile> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Parse trace records from raw JSONL bytes.
    ///
    /// Blank lines are skipped. A header with an unknown schema version or a
    /// malformed line is an `InvalidData` error wrapping a
    /// [`TraceParseError`].
    pub fn from_bytes(data: &[u8]) -> io::Result<OpTraceFile> {
        let reader = BufReader::new(data);
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: TraceRecord = serde_json::from_str(&line).map_err(|e| {
                TraceParseError {
                    line: index + 1,
                    message: e.to_string(),
                }
                .into_io()
            })?;
            if let TraceRecord::Header { schema_version, .. } = &record
                && schema_version != SCHEMA_VERSION
            {
                return Err(TraceParseError {
                    line: index + 1,
                    message: format!("unsupported schema version {schema_version:?}"),
                }
                .into_io());
            }
            records.push(record);
        }
        Ok(OpTraceFile { records })
    }
}

/// A parsed op-trace file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpTraceFile {
    records: Vec<TraceRecord>,
}

impl OpTraceFile {
    /// All records, header and summary included.
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    /// The header record, if the first line is one.
    #[must_use]
    pub fn header(&self) -> Option<&TraceRecord> {
        self.records
            .first()
            .filter(|r| matches!(r, TraceRecord::Header { .. }))
    }

    /// The summary record, if the last line is one.
    #[must_use]
    pub fn summary(&self) -> Option<&TraceRecord> {
        self.records
            .last()
            .filter(|r| matches!(r, TraceRecord::Summary { .. }))
    }

    /// Controller calls in order.
    pub fn ops(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter().filter(|r| r.is_op())
    }

    /// Options and geometry from the header; defaults without one.
    #[must_use]
    pub fn settings(&self) -> (RangeOptions, ContainerGeometry) {
        match self.header() {
            Some(TraceRecord::Header {
                options, geometry, ..
            }) => (*options, *geometry),
            _ => (RangeOptions::default(), ContainerGeometry::default()),
        }
    }

    /// Op count claimed by the summary.
    #[must_use]
    pub fn total_ops(&self) -> Option<u64> {
        match self.summary() {
            Some(TraceRecord::Summary { total_ops }) => Some(*total_ops),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// OpReplayer
// ---------------------------------------------------------------------------

/// Controller state after one replayed op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayStep {
    pub seq: u64,
    pub op: &'static str,
    pub result: RangeShiftResult,
    pub item_count: usize,
    pub range_changed: bool,
    pub need_restore: bool,
    pub restore: ScrollRestoreParams,
    pub virtual_height: u32,
}

/// Feeds trace records into a controller.
#[derive(Debug, Clone)]
pub struct OpReplayer {
    controller: RangeController,
    seq: u64,
}

impl OpReplayer {
    #[must_use]
    pub fn new(controller: RangeController) -> Self {
        Self { controller, seq: 0 }
    }

    /// Replayer with a fresh controller built from the trace header.
    #[must_use]
    pub fn from_trace(trace: &OpTraceFile) -> Self {
        let (options, geometry) = trace.settings();
        Self::new(RangeController::new(options, geometry))
    }

    /// Apply one record. Header and summary records yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Whatever the controller rejects; the replayer's sequence number is
    /// not advanced in that case.
    pub fn apply(&mut self, record: &TraceRecord) -> Result<Option<ReplayStep>, RangeError> {
        let Some(result) = record.apply_to(&mut self.controller)? else {
            return Ok(None);
        };
        self.seq += 1;
        let controller = &self.controller;
        Ok(Some(ReplayStep {
            seq: self.seq,
            op: record.name(),
            result,
            item_count: controller.item_count(),
            range_changed: controller.range_changed(),
            need_restore: controller.is_need_to_restore_position(),
            restore: controller.params_to_restore_scroll(),
            virtual_height: controller.calculate_virtual_scroll_height(),
        }))
    }

    /// Apply every op of `trace`, stopping at the first rejection.
    ///
    /// # Errors
    ///
    /// The first rejected op, paired with its sequence number.
    pub fn replay(&mut self, trace: &OpTraceFile) -> Result<Vec<ReplayStep>, (u64, RangeError)> {
        let mut steps = Vec::new();
        for record in trace.ops() {
            match self.apply(record) {
                Ok(Some(step)) => steps.push(step),
                Ok(None) => {}
                Err(err) => return Err((self.seq + 1, err)),
            }
        }
        Ok(steps)
    }

    /// Ops applied so far.
    #[inline]
    #[must_use]
    pub fn position(&self) -> u64 {
        self.seq
    }

    #[inline]
    #[must_use]
    pub fn controller(&self) -> &RangeController {
        &self.controller
    }

    #[must_use]
    pub fn into_controller(self) -> RangeController {
        self.controller
    }
}
