use tracing_subscriber::EnvFilter;

use crate::config::ConfigError;

/// Installs the global JSON log subscriber filtered by `directive`.
///
/// Lambda stamps every log line with its own receive time, so timestamps are
/// left out.
pub fn init_logging(directive: &str) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_new(directive).map_err(|_| ConfigError::Invalid {
        name: "LOG_LEVEL",
        value: directive.to_string(),
        expected: "a tracing filter directive",
    })?;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|error| ConfigError::Logging(error.to_string()))
}
