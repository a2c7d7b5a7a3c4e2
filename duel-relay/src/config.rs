use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub room_capacity: usize,
    pub connection_timeout_seconds: u64,
    pub rate_limit_burst: u32,
    pub rate_limit_refill_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            room_capacity: 2,
            connection_timeout_seconds: 300,
            rate_limit_burst: 30,
            rate_limit_refill_seconds: 2,
        }
    }
}

fn var_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", name, value)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: var_or("PORT", defaults.port)?,
            room_capacity: var_or("ROOM_CAPACITY", defaults.room_capacity)?,
            connection_timeout_seconds: var_or(
                "CONNECTION_TIMEOUT_SECONDS",
                defaults.connection_timeout_seconds,
            )?,
            rate_limit_burst: var_or("RATE_LIMIT_BURST", defaults.rate_limit_burst)?,
            rate_limit_refill_seconds: var_or(
                "RATE_LIMIT_REFILL_SECONDS",
                defaults.rate_limit_refill_seconds,
            )?,
        })
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }

    pub fn rate_limit_refill(&self) -> Duration {
        Duration::from_secs(self.rate_limit_refill_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.room_capacity, 2);
        assert_eq!(config.connection_timeout(), Duration::from_secs(300));
        assert_eq!(config.rate_limit_refill(), Duration::from_secs(2));
    }

    #[test]
    fn test_var_or_falls_back_when_unset() {
        let value: u16 = var_or("DUEL_RELAY_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
