//! Tracing/logging initialization: JSON lines filtered by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

/// Install the global JSON subscriber. Later calls are no-ops.
pub fn init_with_filter(default_directive: &str) {
    let filter = env_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), default_directive);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

/// `RUST_LOG` wins when set and parseable; otherwise the default directive,
/// and `info` if even that does not parse.
pub fn env_filter(from_env: Option<&str>, default_directive: &str) -> EnvFilter {
    from_env
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .or_else(|| EnvFilter::try_new(default_directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
