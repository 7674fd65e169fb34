//! Tracing and logging setup shared by the catalog binaries and tests.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Like [`init`], but with human-readable output for local runs and tests.
pub fn init_pretty() {
    tracing::init_pretty();
}

/// Tracing configuration (filters, layers).
pub mod tracing;
