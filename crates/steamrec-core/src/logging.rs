//! Tracing targets and subscriber setup.
//!
//! The core only emits events: fit summaries at debug, clamped K or rank and
//! unconverged factorizations at warn, model save/load at debug. Embedding
//! applications install their own subscriber or call [`init`].

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Event targets used by the core, usable as `RUST_LOG` directives
pub mod target {
    /// Matrix building and fitting
    pub const FIT: &str = "steamrec::fit";
    /// Model save/load
    pub const PERSIST: &str = "steamrec::persist";
}

/// Install a compact stderr subscriber showing warnings and above
pub fn init() {
    init_with_filter("warn");
}

/// Install a compact subscriber, `RUST_LOG` overriding `default_filter`.
///
/// Later calls are no-ops once a global subscriber exists.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
