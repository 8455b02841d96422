//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber on stderr.
///
/// `RUST_LOG` wins when set; otherwise `-q` shows errors only and each `-v`
/// raises the level from warn through info and debug to trace.
pub(crate) fn init(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
