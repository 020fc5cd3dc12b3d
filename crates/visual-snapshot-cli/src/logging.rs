//! Tracing subscriber setup

use crate::config::CliConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "VSNAP_LOG";

/// Install the global subscriber writing to stderr.
///
/// `VSNAP_LOG` wins over the verbosity flags when set. Returns `false` if a
/// subscriber was already installed.
pub fn init_tracing(config: &CliConfig) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_ansi(config.color.should_color()),
            )
            .try_init()
    };
    installed.is_ok()
}
