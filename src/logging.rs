//! Tracing subscriber setup for the binary.
//!
//! The library only emits events; installing a subscriber is left to the
//! caller.

use tracing_subscriber::filter::EnvFilter;

/// Default directive for each `-v` count.
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Builds the event filter.
///
/// `RUST_LOG` wins when set and valid. Otherwise the level follows the
/// verbosity count, scoped to this crate.
pub fn filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,pv_quote={}", default_directive(verbosity)))
    })
}

/// Installs a stderr `fmt` subscriber. Calling it twice is a no-op.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbosity))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
