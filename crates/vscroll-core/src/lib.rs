#![forbid(unsafe_code)]

//! Virtual-scroll range controller.
//!
//! Decides which contiguous slice of a (possibly huge) item collection should
//! be materialized, how much placeholder space belongs above and below it, and
//! how the caller must compensate its scroll position after the slice moves.
//!
//! The controller only consumes numbers: item counts, measured item heights,
//! viewport/trigger geometry, and scroll offsets. It never sees the items.
//!
//! # Layers
//!
//! | Module | Role |
//! |--------|------|
//! | [`ledger`] | Per-item heights and prefix offsets |
//! | [`range`] | Window, placeholder and restoration value types |
//! | [`geometry`] | Options, container geometry, sizing mode |
//! | [`calculator`] | Pure range/placeholder/index computations |
//! | [`restore`] | Scroll-restoration anchor bookkeeping |
//! | [`controller`] | The [`RangeController`] state machine |
//!
//! # Example
//!
//! ```
//! use vscroll_core::{ContainerGeometry, RangeController, RangeOptions, ShiftDirection};
//!
//! let mut controller = RangeController::new(
//!     RangeOptions::paged(5),
//!     ContainerGeometry::default(),
//! );
//! let result = controller.reset_range(0, 10, None);
//! assert_eq!((result.range.start, result.range.stop), (0, 5));
//!
//! let shifted = controller.shift_range(ShiftDirection::Down);
//! assert_eq!(shifted.range.stop, 6);
//! assert!(controller.is_need_to_restore_position());
//! ```

pub mod calculator;
#[cfg(feature = "config")]
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod ledger;
pub mod range;
pub mod restore;
#[cfg(feature = "trace")]
pub mod trace;

#[cfg(feature = "config")]
pub use config::{ConfigError, ControllerConfig};
pub use controller::RangeController;
pub use error::{RangeError, RangeErrorKind};
pub use geometry::{ContainerGeometry, GeometryUpdate, RangeOptions, SizingMode};
pub use ledger::HeightLedger;
pub use range::{
    ItemRange, Placeholders, RangeShiftResult, ScrollRestoreParams, ShiftDirection,
    TriggerVisibility,
};
pub use restore::RestorationAdvisor;
