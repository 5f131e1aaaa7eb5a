use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::configuration::LogFormat;

/// Initialize structured logging.
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_telemetry(default_level: &str, format: LogFormat) {
    let env_filter = build_filter(default_level);

    match format {
        LogFormat::Json => {
            let formatting_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .json();
            tracing_subscriber::registry()
                .with(env_filter)
                .with(formatting_layer)
                .init();
        }
        LogFormat::Pretty => {
            let formatting_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .pretty();
            tracing_subscriber::registry()
                .with(env_filter)
                .with(formatting_layer)
                .init();
        }
    }
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(default_level))
}

/// Filter for the configured level, `info` if it does not parse.
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}
