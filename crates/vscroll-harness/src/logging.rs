#![forbid(unsafe_code)]

//! Subscriber setup. Logs always go to stderr so stdout stays
//! machine-readable.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Preferred filter variable; `RUST_LOG` is consulted after it.
pub const LOG_ENV: &str = "VSCROLL_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// First non-empty directive among `VSCROLL_LOG`, `RUST_LOG`, and `warn`.
#[must_use]
pub fn filter_directive(vscroll_log: Option<&str>, rust_log: Option<&str>) -> String {
    [vscroll_log, rust_log]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|directive| !directive.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVE)
        .to_string()
}

fn env_filter() -> EnvFilter {
    let vscroll_log = std::env::var(LOG_ENV).ok();
    let rust_log = std::env::var("RUST_LOG").ok();
    let directive = filter_directive(vscroll_log.as_deref(), rust_log.as_deref());
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(json: bool) {
    let registry = tracing_subscriber::registry().with(env_filter());
    let installed = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if installed.is_ok() {
        tracing::debug!(message = "harness.logging", json);
    }
}
