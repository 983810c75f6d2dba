//! Logging setup

use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides the filter derived from the verbosity flags. Logs go
/// to stderr so stdout carries only the report.
pub fn init_logging(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()));

    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.color.should_color())
        .with_target(config.verbosity.is_verbose())
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Verbosity;

    #[test]
    fn test_init_twice_is_harmless() {
        let config = CliConfig::new().with_verbosity(Verbosity::Debug);
        init_logging(&config);
        init_logging(&config);
        tracing::debug!("logging initialised");
    }
}
