// repomark logging setup
// Structured logs go to stderr so stdout stays free for RPC frames and CLI output.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise `level` is used as an `EnvFilter`
/// directive such as `"info"` or `"repomark=debug"`, and an unparsable
/// directive falls back to `info`. Calling this twice is harmless.
pub fn init(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };
    if installed {
        tracing::debug!(level, json, "logging initialized");
    }
}
