// Logger initialization

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber. Logs go to stderr so that the
/// summary printed on stdout stays machine-readable.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose {
        "patent_scout=debug"
    } else {
        "patent_scout=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
