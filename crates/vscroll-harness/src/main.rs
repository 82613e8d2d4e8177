#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = vscroll_harness::run_from_env() {
        tracing::debug!(message = "harness.exit", code = error.exit_code());
        eprintln!("{error}");
        std::process::exit(error.exit_code());
    }
}
