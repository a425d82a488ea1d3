//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default level, still overridable through `RUST_LOG`.
///
/// Unknown level names fall back to `info`. Calling this more than once is
/// harmless; only the first logger is installed.
pub fn init_with_level(level: &str) {
    let _ = builder(level).try_init();
}

// `RUST_LOG` is parsed after the default so its directives win
fn builder(level: &str) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(parse_level(level)).parse_default_env();
    builder
}

/// Map a config level name onto a `LevelFilter`
pub fn parse_level(level: &str) -> log::LevelFilter {
    level.parse().unwrap_or(log::LevelFilter::Info)
}
