#![forbid(unsafe_code)]

//! Replay and digest tooling for vscroll op traces.
//!
//! `vscroll-harness replay session.jsonl` feeds a recorded session through a
//! fresh [`RangeController`](vscroll_core::RangeController), checks its
//! invariants after every op, prints one step per op on stdout, and a
//! blake3 digest of the step stream on stderr. Pinning that digest in CI
//! (`--expect-digest`) catches any behavioral drift in the controller.

pub mod cli;
pub mod error;
pub mod logging;
pub mod replay;

pub use cli::{run, run_from_env};
pub use error::{HarnessError, Result};
