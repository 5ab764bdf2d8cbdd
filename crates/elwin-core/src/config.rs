//! Engine configuration.
//!
//! Read from the environment by [`EngineConfig::from_env`]:
//! - `ELWIN_SALT`: global hash salt. Changing it reshuffles every assignment.
//!   Empty or unset means the default, `choices`.
//! - `ELWIN_REFRESH_INTERVAL_MS`: delay between storage refreshes. Unparsable
//!   or zero values fall back to the default of 5000.

use std::time::Duration;

/// Salt used when none is configured.
pub const DEFAULT_SALT: &str = "choices";

/// Refresh interval used when none is configured.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

pub const SALT_ENV: &str = "ELWIN_SALT";
pub const REFRESH_INTERVAL_ENV: &str = "ELWIN_REFRESH_INTERVAL_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    salt: String,
    refresh_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            salt: DEFAULT_SALT.to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(salt) = lookup(SALT_ENV).filter(|s| !s.is_empty()) {
            config.salt = salt;
        }
        if let Some(interval) = lookup(REFRESH_INTERVAL_ENV).and_then(|raw| parse_interval_ms(&raw))
        {
            config.refresh_interval = interval;
        }
        config
    }

    #[must_use]
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = salt.into();
        self
    }

    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    #[must_use]
    pub fn salt(&self) -> &str {
        &self.salt
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }
}

fn parse_interval_ms(raw: &str) -> Option<Duration> {
    match raw.trim().replace('_', "").parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(ms) => Some(Duration::from_millis(ms)),
    }
}
