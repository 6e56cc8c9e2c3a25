use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{ConfigError, LogFormat, NetworkConfig, Result};

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(network: &NetworkConfig) -> String {
    format!(
        "{level},relay_intents={level}",
        level = network.log_level.to_lowercase()
    )
}

/// Install the global tracing subscriber described by `network`
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a
/// subscriber is already installed.
pub fn init_tracing(network: &NetworkConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(network)))
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    let (json, plain) = match network.log_format {
        LogFormat::Json => (
            Some(fmt::layer().with_target(true).with_level(true).json()),
            None,
        ),
        LogFormat::Plain => (None, Some(fmt::layer().with_target(true).with_level(true))),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(plain)
        .try_init()
        .map_err(|e| ConfigError::LoggingError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Environment;

    #[test]
    fn test_default_filter_uses_level() {
        let network = NetworkConfig {
            environment: Environment::Local,
            log_level: "DEBUG".to_string(),
            log_format: LogFormat::Plain,
        };
        assert_eq!(default_filter(&network), "debug,relay_intents=debug");
    }

    #[test]
    fn test_second_init_fails() {
        let network = NetworkConfig::default();
        let _ = init_tracing(&network);
        assert!(matches!(
            init_tracing(&network),
            Err(ConfigError::LoggingError(_))
        ));
    }
}
