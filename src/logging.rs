use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::EnvFilter;

/// Environment variable naming a log file prefix. When set, logs go to
/// `{prefix}.{unix_seconds}.{pid}` instead of stderr.
pub const LOG_FILE_ENV: &str = "FLIPDECK_LOG";

/// Install the global subscriber. The filter comes from `RUST_LOG` and
/// defaults to `warn`, or to debug output for this crate when `verbose`.
/// Calling it twice is harmless.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "flipdeck=debug,warn" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339());

    let file = std::env::var(LOG_FILE_ENV)
        .ok()
        .filter(|prefix| !prefix.is_empty())
        .and_then(|prefix| {
            let path = log_file_name(&prefix);
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => Some(file),
                Err(err) => {
                    eprintln!("cannot open log file {}: {}", path, err);
                    None
                }
            }
        });

    let _ = match file {
        Some(file) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
}

fn log_file_name(prefix: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{}.{}.{}", prefix, timestamp, std::process::id())
}
