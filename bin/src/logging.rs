//! Tracing initialization.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize tracing for the CLI.
///
/// Uses `RUST_LOG` for filtering when set. Otherwise the level follows the
/// flags: `info` by default, `debug` with `-v`, `trace` with `-vv`, `warn`
/// with `-q`.
pub(crate) fn init(verbose: u8, quiet: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose, quiet)));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(verbose > 0);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}

const fn default_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "warn";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
