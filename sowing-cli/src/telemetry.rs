use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;

/// Install the global subscriber. Filtering follows `RUST_LOG`, defaulting to
/// `info`. Output goes to stderr so stdout stays machine-readable.
pub fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
