#![forbid(unsafe_code)]

//! Trace replay with per-step invariant checks and a stable digest.
//!
//! The digest is blake3 over the JSONL rendering of every [`ReplayStep`]
//! (one line per step, `\n`-terminated), so two runs agree exactly when the
//! controller produced the same windows, placeholders, and restoration
//! advice for the same ops.

use std::path::Path;

use vscroll_core::trace::{OpReplayer, OpTraceFile, OpTraceReader, ReplayStep};

use crate::error::{HarnessError, Result};

/// Incremental digest over JSONL step lines.
#[derive(Debug, Clone, Default)]
pub struct StepDigest {
    hasher: blake3::Hasher,
}

impl StepDigest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, line: &str) {
        self.hasher.update(line.as_bytes());
        self.hasher.update(b"\n");
    }

    /// Lowercase hex digest.
    #[must_use]
    pub fn finalize(&self) -> String {
        self.hasher.finalize().to_hex().to_string()
    }
}

/// Result of replaying a whole trace.
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub steps: Vec<ReplayStep>,
    /// JSONL rendering of `steps`, in order.
    pub lines: Vec<String>,
    pub digest: String,
}

/// Load a trace file, mapping malformed lines to [`HarnessError::Trace`].
pub fn load_trace(path: &Path) -> Result<OpTraceFile> {
    OpTraceReader::open(path).map_err(HarnessError::from_trace_io)
}

/// Replay every op of `trace` against a fresh controller.
///
/// With `check_invariants`, the controller's
/// [`invariant_violations`](vscroll_core::RangeController::invariant_violations)
/// are checked after each step and the first failure aborts the replay.
pub fn replay_trace(trace: &OpTraceFile, check_invariants: bool) -> Result<ReplayOutcome> {
    let mut replayer = OpReplayer::from_trace(trace);
    let mut digest = StepDigest::new();
    let mut steps = Vec::new();
    let mut lines = Vec::new();

    for record in trace.ops() {
        let seq = replayer.position() + 1;
        let step = match replayer.apply(record) {
            Ok(Some(step)) => step,
            Ok(None) => continue,
            Err(source) => return Err(HarnessError::Range { seq, source }),
        };

        if check_invariants {
            let violations = replayer.controller().invariant_violations();
            if !violations.is_empty() {
                tracing::error!(
                    message = "harness.invariant_violation",
                    seq,
                    op = step.op,
                    count = violations.len()
                );
                return Err(HarnessError::InvariantViolation {
                    seq,
                    details: violations.join("; "),
                });
            }
        }

        let line = serde_json::to_string(&step)?;
        digest.update(&line);
        tracing::trace!(message = "harness.step", seq, op = step.op);
        lines.push(line);
        steps.push(step);
    }

    if let Some(claimed) = trace.total_ops()
        && claimed != steps.len() as u64
    {
        tracing::warn!(
            message = "harness.summary_mismatch",
            claimed,
            replayed = steps.len()
        );
    }

    let digest = digest.finalize();
    tracing::info!(message = "harness.replayed", steps = steps.len(), digest = %digest);
    Ok(ReplayOutcome {
        steps,
        lines,
        digest,
    })
}

/// One human-readable table row for `step`.
#[must_use]
pub fn format_step_text(step: &ReplayStep) -> String {
    let range = step.result.range;
    let placeholders = step.result.placeholders;
    let restore = match step.restore.direction {
        Some(direction) if step.need_restore => {
            format!("{direction}/{}", step.restore.height_difference)
        }
        _ => "-".to_string(),
    };
    format!(
        "{:>5}  {:<16} {:<12} top={:<7} bottom={:<7} items={:<7} changed={:<5} restore={restore}",
        step.seq,
        step.op,
        range.to_string(),
        placeholders.top,
        placeholders.bottom,
        step.item_count,
        step.range_changed,
    )
}

/// Compare `actual` with an expected hex digest, case-insensitively.
pub fn verify_digest(expected: &str, actual: &str) -> Result<()> {
    let expected = expected.trim();
    if expected.len() != 64 || !expected.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(HarnessError::invalid(format!(
            "expected digest must be 64 hex characters, got {expected:?}"
        )));
    }
    if expected.eq_ignore_ascii_case(actual) {
        Ok(())
    } else {
        Err(HarnessError::DigestMismatch {
            expected: expected.to_ascii_lowercase(),
            actual: actual.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = concat!(
        "{\"event\":\"trace_header\",\"schema_version\":\"vscroll-trace-v1\",",
        "\"options\":{\"page_size\":5},\"geometry\":{\"viewport\":200,\"scroll\":300,",
        "\"top_trigger\":10,\"bottom_trigger\":10}}\n",
        "{\"event\":\"reset\",\"start\":0,\"total\":10}\n",
        "{\"event\":\"heights\",\"heights\":[60,60,60,60,60]}\n",
        "{\"event\":\"shift\",\"direction\":\"down\"}\n",
        "{\"event\":\"trace_summary\",\"total_ops\":3}\n",
    );

    fn trace() -> OpTraceFile {
        OpTraceReader::from_bytes(TRACE.as_bytes()).unwrap()
    }

    #[test]
    fn replay_produces_one_line_per_op() {
        let outcome = replay_trace(&trace(), true).unwrap();
        assert_eq!(outcome.steps.len(), 3);
        assert_eq!(outcome.lines.len(), 3);
        assert!(outcome.lines[2].contains("\"op\":\"shift\""));
        assert_eq!(outcome.digest.len(), 64);
    }

    #[test]
    fn digest_is_stable_and_order_sensitive() {
        let first = replay_trace(&trace(), true).unwrap().digest;
        let second = replay_trace(&trace(), false).unwrap().digest;
        assert_eq!(first, second);

        let mut a = StepDigest::new();
        a.update("x");
        a.update("y");
        let mut b = StepDigest::new();
        b.update("y");
        b.update("x");
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn rejected_op_reports_sequence() {
        let data = concat!(
            "{\"event\":\"reset\",\"start\":0,\"total\":2}\n",
            "{\"event\":\"add\",\"index\":1,\"count\":18446744073709551615}\n",
        );
        let trace = OpTraceReader::from_bytes(data.as_bytes()).unwrap();
        match replay_trace(&trace, true) {
            Err(HarnessError::Range { seq, source }) => {
                assert_eq!(seq, 2);
                assert_eq!(source.operation(), "add_items");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn text_row_shows_restore_only_when_pending() {
        let outcome = replay_trace(&trace(), true).unwrap();
        let reset_row = format_step_text(&outcome.steps[0]);
        assert!(reset_row.contains("reset"));
        assert!(reset_row.contains("[0, 5)"));
        assert!(reset_row.ends_with("restore=-"));

        let shift_row = format_step_text(&outcome.steps[2]);
        assert!(shift_row.ends_with("restore=down/0"), "{shift_row}");
    }

    #[test]
    fn digest_verification() {
        let outcome = replay_trace(&trace(), true).unwrap();
        assert!(verify_digest(&outcome.digest.to_ascii_uppercase(), &outcome.digest).is_ok());
        assert!(matches!(
            verify_digest(&"0".repeat(64), &outcome.digest),
            Err(HarnessError::DigestMismatch { .. })
        ));
        assert!(matches!(
            verify_digest("abc", &outcome.digest),
            Err(HarnessError::InvalidArgument { .. })
        ));
    }
}
