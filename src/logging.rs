//! Logger setup for the binary. The library itself only uses the `log` macros.

use log::LevelFilter;

/// Map the number of `-v` flags to a default level.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install `env_logger`. `RUST_LOG` takes precedence over `verbosity`.
pub fn initialize(verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level_for(verbosity));
    builder.parse_default_env();
    builder.format_timestamp(None);
    // A second initialization (tests, embedding) keeps the first logger.
    let _ = builder.try_init();
}
