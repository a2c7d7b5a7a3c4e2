use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Timing for a session. Word length and guess count are fixed by the wire
/// format (`WORD_LENGTH`, `MAX_GUESSES`) and are not configurable.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub round_duration: Duration,
    pub tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            round_duration: Duration::from_secs(3 * 60),
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let round_duration = match env::var("ROUND_DURATION_SECONDS") {
            Ok(value) => Duration::from_secs(
                value
                    .parse()
                    .context("Invalid ROUND_DURATION_SECONDS")?,
            ),
            Err(_) => defaults.round_duration,
        };

        let tick_interval = match env::var("TICK_INTERVAL_MS") {
            Ok(value) => Duration::from_millis(value.parse().context("Invalid TICK_INTERVAL_MS")?),
            Err(_) => defaults.tick_interval,
        };

        Ok(Self {
            round_duration,
            tick_interval,
        })
    }

    pub fn round_duration_ms(&self) -> i64 {
        self.round_duration.as_millis() as i64
    }
}
