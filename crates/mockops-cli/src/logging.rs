//! Subscriber setup

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub(crate) const LOG_ENV: &str = "MOCKOPS_LOG";

/// Install the global subscriber
///
/// The filter comes from `MOCKOPS_LOG` (default `info`). Output goes to
/// stderr so command output on stdout stays machine readable.
pub(crate) fn init(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = installed {
        eprintln!("mockops: logging already initialised: {e}");
    }
}
