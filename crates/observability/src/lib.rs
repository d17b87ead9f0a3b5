//! Tracing/logging setup shared by every entry point.

/// Initialize process-wide tracing with an `info` default.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_with_filter(tracing::DEFAULT_FILTER);
}

/// Like [`init`], with `directive` as the default when `RUST_LOG` is unset.
pub fn init_with_filter(directive: &str) {
    tracing::init_with_filter(directive);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
