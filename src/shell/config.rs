// Demo workload configuration, read from the environment.
//
// SAGA_STORE_ORDERS        number of orders to push through the store (default 50)
// SAGA_STORE_WORKERS       concurrent message workers (default 4, at least 1)
// SAGA_STORE_MAX_ATTEMPTS  attempts per message before giving up (default 5)

use saga_store::application::saga_handler::RetryPolicy;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub orders: u32,
    pub workers: usize,
    pub retry: RetryPolicy,
}

impl ShellConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let orders = read(&lookup, "SAGA_STORE_ORDERS", 50)?;
        let workers = read(&lookup, "SAGA_STORE_WORKERS", 4)?;
        let max_attempts = read(
            &lookup,
            "SAGA_STORE_MAX_ATTEMPTS",
            RetryPolicy::DEFAULT_MAX_ATTEMPTS,
        )?;
        Ok(Self {
            orders,
            workers: workers as usize,
            retry: RetryPolicy::new(max_attempts),
        })
    }
}

fn read(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u32,
) -> Result<u32, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}
