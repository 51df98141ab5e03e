//! Log filter selection for the binaries.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is not set.
pub fn default_directive(debug: Option<&str>) -> &'static str {
    match debug {
        Some(v) if v.trim().eq_ignore_ascii_case("true") => "weather2mqtt=debug",
        _ => "weather2mqtt=info",
    }
}

/// Build the log filter. A non-empty, valid `RUST_LOG` replaces `default` entirely.
pub fn env_filter(rust_log: Option<&str>, default: &str) -> EnvFilter {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}
