#![forbid(unsafe_code)]

use std::io;

use thiserror::Error;
use vscroll_core::trace::TraceParseError;
use vscroll_core::{ConfigError, RangeError};

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("malformed trace at line {line}: {message}")]
    Trace { line: usize, message: String },

    #[error("op {seq} rejected: {source}")]
    Range {
        seq: u64,
        #[source]
        source: RangeError,
    },

    #[error("invariant violated after op {seq}: {details}")]
    InvariantViolation { seq: u64, details: String },

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl HarnessError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) | Self::Json(_) | Self::Trace { .. } | Self::Range { .. } => 1,
            Self::Config(_) | Self::InvalidArgument { .. } => 2,
            Self::DigestMismatch { .. } => 3,
            Self::InvariantViolation { .. } => 4,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Classify an error from the trace reader: malformed lines become
    /// [`HarnessError::Trace`], everything else stays I/O.
    #[must_use]
    pub fn from_trace_io(error: io::Error) -> Self {
        let parse = error
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<TraceParseError>())
            .cloned();
        match parse {
            Some(TraceParseError { line, message }) => Self::Trace { line, message },
            None => Self::Io(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HarnessError;
    use vscroll_core::trace::OpTraceReader;

    #[test]
    fn exit_codes_by_category() {
        let io = HarnessError::Io(std::io::Error::other("boom"));
        assert_eq!(io.exit_code(), 1);
        assert_eq!(HarnessError::invalid("bad").exit_code(), 2);
        let mismatch = HarnessError::DigestMismatch {
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert_eq!(mismatch.exit_code(), 3);
        assert_eq!(mismatch.to_string(), "digest mismatch: expected aa, got bb");
        let violation = HarnessError::InvariantViolation {
            seq: 7,
            details: "range [3, 2) is inverted".to_string(),
        };
        assert_eq!(violation.exit_code(), 4);
    }

    #[test]
    fn reader_errors_keep_line_numbers() {
        let data = b"{\"event\":\"reset\",\"start\":0,\"total\":1}\nnot json\n";
        let err = OpTraceReader::from_bytes(data).unwrap_err();
        match HarnessError::from_trace_io(err) {
            HarnessError::Trace { line, .. } => assert_eq!(line, 2),
            other => panic!("expected trace error, got {other:?}"),
        }
    }

    #[test]
    fn plain_io_errors_stay_io() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            HarnessError::from_trace_io(err),
            HarnessError::Io(_)
        ));
    }
}
