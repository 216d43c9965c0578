use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Initialize logging.
///
/// `RUST_LOG` wins over the configured `logging.filter`. Output goes to
/// stderr so it never mixes with command output; `logging.json` switches to
/// one JSON object per event.
pub fn init(config: &LoggingConfig) {
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let (compact_layer, json_layer) = if config.json {
        (
            None,
            Some(fmt::layer().json().with_writer(std::io::stderr)),
        )
    } else {
        (
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            ),
            None,
        )
    };

    // A second init keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(compact_layer)
        .with(json_layer)
        .try_init();
}
