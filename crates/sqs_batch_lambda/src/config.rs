use thiserror::Error;

/// How the consumer hands a batch to its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Each message is handled independently; successes are deleted from the
    /// queue and failures are left for redelivery.
    Partial,
    /// The whole batch is resolved and handled in one call; any failure fails
    /// the entire invocation.
    Enriched,
}

impl ProcessingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Partial => "partial",
            Self::Enriched => "enriched",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to install log subscriber: {0}")]
    Logging(String),
}

/// Consumer settings read from the Lambda environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub mode: ProcessingMode,
    pub suppress_batch_errors: bool,
    pub delete_offloaded_payloads: bool,
    pub max_concurrent_handlers: usize,
    pub capture_response: bool,
    pub capture_error: bool,
    pub log_level: String,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Partial,
            suppress_batch_errors: false,
            delete_offloaded_payloads: true,
            max_concurrent_handlers: 1,
            capture_response: true,
            capture_error: true,
            log_level: "info".to_string(),
        }
    }
}

impl ConsumerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from `lookup`, falling back to defaults for unset or
    /// blank variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let mode = match read("BATCH_PROCESSING_MODE") {
            None => defaults.mode,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "partial" => ProcessingMode::Partial,
                "enriched" => ProcessingMode::Enriched,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "BATCH_PROCESSING_MODE",
                        value,
                        expected: "'partial' or 'enriched'",
                    })
                }
            },
        };

        let max_concurrent_handlers = match read("MAX_CONCURRENT_HANDLERS") {
            None => defaults.max_concurrent_handlers,
            Some(value) => match value.parse::<usize>() {
                Ok(workers) if workers >= 1 => workers,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "MAX_CONCURRENT_HANDLERS",
                        value,
                        expected: "a positive integer",
                    })
                }
            },
        };

        Ok(Self {
            mode,
            suppress_batch_errors: parse_flag(
                "SUPPRESS_BATCH_ERRORS",
                read("SUPPRESS_BATCH_ERRORS"),
                defaults.suppress_batch_errors,
            )?,
            delete_offloaded_payloads: parse_flag(
                "DELETE_OFFLOADED_PAYLOADS",
                read("DELETE_OFFLOADED_PAYLOADS"),
                defaults.delete_offloaded_payloads,
            )?,
            max_concurrent_handlers,
            capture_response: parse_flag(
                "TRACER_CAPTURE_RESPONSE",
                read("TRACER_CAPTURE_RESPONSE"),
                defaults.capture_response,
            )?,
            capture_error: parse_flag(
                "TRACER_CAPTURE_ERROR",
                read("TRACER_CAPTURE_ERROR"),
                defaults.capture_error,
            )?,
            log_level: read("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}

fn parse_flag(
    name: &'static str,
    value: Option<String>,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            expected: "'true' or 'false'",
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ConsumerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        ConsumerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]).expect("defaults should load");
        assert_eq!(config, ConsumerConfig::default());
        assert_eq!(config.mode, ProcessingMode::Partial);
        assert!(config.delete_offloaded_payloads);
        assert!(!config.suppress_batch_errors);
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            ("BATCH_PROCESSING_MODE", "Enriched"),
            ("SUPPRESS_BATCH_ERRORS", "TRUE"),
            ("DELETE_OFFLOADED_PAYLOADS", "0"),
            ("MAX_CONCURRENT_HANDLERS", "4"),
            ("TRACER_CAPTURE_RESPONSE", "false"),
            ("TRACER_CAPTURE_ERROR", "1"),
            ("LOG_LEVEL", "sqs_batch_core=debug"),
        ])
        .expect("config should load");

        assert_eq!(
            config,
            ConsumerConfig {
                mode: ProcessingMode::Enriched,
                suppress_batch_errors: true,
                delete_offloaded_payloads: false,
                max_concurrent_handlers: 4,
                capture_response: false,
                capture_error: true,
                log_level: "sqs_batch_core=debug".to_string(),
            }
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("BATCH_PROCESSING_MODE", "  "), ("LOG_LEVEL", "")])
            .expect("blank values should be ignored");
        assert_eq!(config.mode, ProcessingMode::Partial);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn rejects_unknown_mode() {
        let error = config_from(&[("BATCH_PROCESSING_MODE", "fifo")])
            .expect_err("unknown mode should fail");
        assert_eq!(
            error.to_string(),
            "BATCH_PROCESSING_MODE must be 'partial' or 'enriched', got 'fifo'"
        );
    }

    #[test]
    fn rejects_zero_workers() {
        let error = config_from(&[("MAX_CONCURRENT_HANDLERS", "0")])
            .expect_err("zero workers should fail");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                name: "MAX_CONCURRENT_HANDLERS",
                ..
            }
        ));
    }

    #[test]
    fn rejects_ambiguous_flags() {
        let error = config_from(&[("SUPPRESS_BATCH_ERRORS", "yes")])
            .expect_err("non-boolean flag should fail");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                name: "SUPPRESS_BATCH_ERRORS",
                ..
            }
        ));
    }
}
