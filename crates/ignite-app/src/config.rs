//! Bootstrap configuration.

use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the default step timeout in milliseconds.
pub const STEP_TIMEOUT_ENV: &str = "IGNITE_STEP_TIMEOUT_MS";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}' is not a positive number of milliseconds")]
    InvalidTimeout { name: &'static str, value: String },
}

/// Settings applied to the startup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootConfig {
    /// Timeout for every startup step. `None` lets steps run unbounded.
    pub step_timeout: Option<Duration>,
}

impl BootConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through the given variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let step_timeout = match lookup(STEP_TIMEOUT_ENV) {
            None => None,
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => {
                let invalid = || ConfigError::InvalidTimeout {
                    name: STEP_TIMEOUT_ENV,
                    value: raw.clone(),
                };
                match raw.trim().parse::<u64>() {
                    Ok(0) | Err(_) => return Err(invalid()),
                    Ok(millis) => Some(Duration::from_millis(millis)),
                }
            }
        };
        Ok(Self { step_timeout })
    }

    /// Sets the step timeout.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_variables() {
        let config = BootConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, BootConfig::default());

        let config = BootConfig::from_lookup(|_| Some("  ".to_string())).unwrap();
        assert_eq!(config.step_timeout, None);
    }

    #[test]
    fn test_timeout_from_variable() {
        let config = BootConfig::from_lookup(|name| {
            (name == STEP_TIMEOUT_ENV).then(|| "1500".to_string())
        })
        .unwrap();
        assert_eq!(config.step_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = BootConfig::from_lookup(|_| Some("soon".to_string())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for IGNITE_STEP_TIMEOUT_MS: 'soon' is not a positive number of milliseconds"
        );
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let err = BootConfig::from_lookup(|_| Some("0".to_string())).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidTimeout {
                name: STEP_TIMEOUT_ENV,
                value: "0".to_string(),
            }
        );
    }
}
