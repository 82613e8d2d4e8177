#![forbid(unsafe_code)]

//! Errors for caller misuse of the controller.
//!
//! Geometry and index arithmetic never fail: out-of-range positions are
//! clamped. Only mutations whose arguments have no windowing interpretation,
//! such as an insert that would overflow the item count, are rejected.

use std::fmt;

/// Broad category of a [`RangeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeErrorKind {
    /// Arguments violate the operation's contract.
    InvalidArgument,
}

/// Error returned by [`RangeController`](crate::RangeController) mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// Arguments violate the operation's contract.
    InvalidArgument {
        operation: &'static str,
        reason: String,
    },
}

impl RangeError {
    #[must_use]
    pub fn invalid(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> RangeErrorKind {
        match self {
            Self::InvalidArgument { .. } => RangeErrorKind::InvalidArgument,
        }
    }

    /// Name of the rejected operation.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::InvalidArgument { operation, .. } => operation,
        }
    }
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { operation, reason } => {
                write!(f, "invalid argument to {operation}: {reason}")
            }
        }
    }
}

impl std::error::Error for RangeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_operation() {
        let err = RangeError::invalid("add_items", "adding 9 items to 5 overflows");
        assert_eq!(
            err.to_string(),
            "invalid argument to add_items: adding 9 items to 5 overflows"
        );
        assert_eq!(err.kind(), RangeErrorKind::InvalidArgument);
        assert_eq!(err.operation(), "add_items");
    }
}
