//! Structured logging bootstrap using **tracing**.
//!
//! The engine itself only emits events through tracing macros (it never
//! writes to stdout); embedding binaries call [`init_structured_logging`]
//! once to get machine-readable JSON on stderr.

/// Initializes the global tracing collector (subscriber).
///
/// Call *once* at the start of the embedding application. Output is JSON on
/// stderr, so stdout stays clean for tool output.
///
/// # Environment Variables
/// - `RUST_LOG`: controls filtering (e.g. `RUST_LOG=deadfunc_core=debug`)
pub fn init_structured_logging() {
    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}
