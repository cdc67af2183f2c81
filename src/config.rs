//! Environment-driven configuration
//!
//! Values come from the process environment, optionally seeded from a
//! `.env` file by the binaries. Every loader also accepts an arbitrary
//! lookup function so tests never touch the real environment.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{RelayError, RelayResult};
use crate::poller::DEFAULT_POLL_INTERVAL;

const DEFAULT_SITE_DOMAIN: &str = "http://localhost";
const DEFAULT_WEB_PORT: &str = ":3000";
const VOTE_COUNT_PATH: &str = "/api/newvotes";
const RESULTS_PATH: &str = "/api/contributors";

/// Settings for the relay server
#[derive(Clone, Debug, PartialEq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Vote-count endpoint polled for changes
    pub poll_url: String,
    pub poll_interval: Duration,
    /// Per-fetch timeout, always shorter than `poll_interval`
    pub poll_timeout: Duration,
    pub allowed_origin: Option<String>,
    /// Publish to this relay instead of broadcasting in-process
    pub upstream_relay_url: Option<String>,
}

impl RelayConfig {
    pub fn load() -> RelayResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> RelayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let port = match ["RELAY_PORT", "PORT"]
            .into_iter()
            .find_map(|key| env.get(key).map(|raw| (key, raw)))
        {
            Some((key, raw)) => parse(key, &raw)?,
            None => 8080,
        };

        let poll_url = env
            .get("POLL_URL")
            .unwrap_or_else(|| format!("{}{}", site_base(&env), VOTE_COUNT_PATH));

        let poll_interval = Duration::from_secs(env.try_load(
            "POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL.as_secs(),
        )?);
        if poll_interval.is_zero() {
            return Err(RelayError::Config(
                "POLL_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        let mut poll_timeout = Duration::from_secs(env.try_load("POLL_TIMEOUT_SECS", 5u64)?);
        if poll_timeout.is_zero() || poll_timeout >= poll_interval {
            let clamped = poll_interval / 2;
            warn!(
                "POLL_TIMEOUT_SECS must be below the poll interval, using {:?}",
                clamped
            );
            poll_timeout = clamped;
        }

        Ok(Self {
            host: env.get("RELAY_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            poll_url,
            poll_interval,
            poll_timeout,
            allowed_origin: env.get("ALLOWED_ORIGIN"),
            upstream_relay_url: env.get("UPSTREAM_RELAY_URL"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Settings for the `results-watch` listener
#[derive(Clone, Debug, PartialEq)]
pub struct WatchConfig {
    pub ws_url: String,
    /// Full results payload fetched after each reload notification
    pub results_url: String,
    pub request_timeout: Duration,
    /// `None` disables reconnection
    pub reconnect_delay: Option<Duration>,
}

impl WatchConfig {
    pub fn load() -> RelayResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> RelayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let reconnect_secs: u64 = env.try_load("RECONNECT_DELAY_SECS", 2)?;

        Ok(Self {
            ws_url: env
                .get("RELAY_WS_URL")
                .unwrap_or_else(|| "ws://localhost:8080/ws".to_string()),
            results_url: env
                .get("RESULTS_URL")
                .unwrap_or_else(|| format!("{}{}", site_base(&env), RESULTS_PATH)),
            request_timeout: Duration::from_secs(env.try_load("REQUEST_TIMEOUT_SECS", 10)?),
            reconnect_delay: (reconnect_secs > 0).then(|| Duration::from_secs(reconnect_secs)),
        })
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn try_load<T>(&self, key: &str, default: T) -> RelayResult<T>
    where
        T: FromStr + Display,
        T::Err: Display,
    {
        match self.get(key) {
            Some(raw) => parse(key, &raw),
            None => {
                info!("{} not set, using default: {}", key, default);
                Ok(default)
            }
        }
    }
}

fn parse<T>(key: &str, raw: &str) -> RelayResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| RelayError::Config(format!("invalid {} value {:?}: {}", key, raw, e)))
}

/// `SITE_DOMAIN` + `WEB_PORT`, e.g. `https://example.org` + `:3000`
fn site_base<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> String {
    let domain = env
        .get("SITE_DOMAIN")
        .unwrap_or_else(|| DEFAULT_SITE_DOMAIN.to_string());
    // An explicitly empty WEB_PORT means "no port suffix"
    let port = (env.0)("WEB_PORT").unwrap_or_else(|| DEFAULT_WEB_PORT.to_string());
    format!("{}{}", domain.trim_end_matches('/'), port.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_relay_defaults() {
        let config = RelayConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.poll_url, "http://localhost:3000/api/newvotes");
        assert_eq!(config.poll_interval, Duration::from_secs(8));
        assert_eq!(config.poll_timeout, Duration::from_secs(5));
        assert!(config.upstream_relay_url.is_none());
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_poll_url_built_from_site() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("SITE_DOMAIN", "https://votes.example.org/"),
            ("WEB_PORT", ""),
            ("PORT", "9001"),
        ]))
        .unwrap();

        assert_eq!(config.poll_url, "https://votes.example.org/api/newvotes");
        assert_eq!(config.port, 9001);
    }

    #[test]
    fn test_timeout_clamped_below_interval() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("POLL_INTERVAL_SECS", "4"),
            ("POLL_TIMEOUT_SECS", "10"),
        ]))
        .unwrap();

        assert_eq!(config.poll_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = RelayConfig::from_lookup(lookup(&[("RELAY_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));

        let err = RelayConfig::from_lookup(lookup(&[("POLL_INTERVAL_SECS", "0")])).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn test_port_error_names_the_variable_read() {
        let err = RelayConfig::from_lookup(lookup(&[("PORT", "abc")])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("invalid PORT value"), "{}", message);
        assert!(!message.contains("RELAY_PORT"), "{}", message);

        // RELAY_PORT wins when both are set
        let err = RelayConfig::from_lookup(lookup(&[("RELAY_PORT", "x"), ("PORT", "9001")]))
            .unwrap_err();
        assert!(err.to_string().contains("invalid RELAY_PORT value"));
    }

    #[test]
    fn test_watch_reconnect_can_be_disabled() {
        let config = WatchConfig::from_lookup(lookup(&[("RECONNECT_DELAY_SECS", "0")])).unwrap();
        assert_eq!(config.reconnect_delay, None);
        assert_eq!(config.results_url, "http://localhost:3000/api/contributors");

        let config = WatchConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.reconnect_delay, Some(Duration::from_secs(2)));
    }
}
