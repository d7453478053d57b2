//! Runtime configuration read from `EXPLORE_*` environment variables.
//!
//! Supported variables (defaults in parentheses):
//! - `EXPLORE_BACKEND`: `http` or `memory` (`http`)
//! - `EXPLORE_API_URL`: base URL of the explore/onboarding API (`http://localhost:3000/api`)
//! - `EXPLORE_DEVICE_CLASS`: `mobile`, `tablet` or `desktop` (`mobile`)
//! - `EXPLORE_PAGE_SIZE`: feed batch size, 4-100 (`10`)
//! - `EXPLORE_CATEGORY_ID`: optional category filter
//! - `EXPLORE_REQUEST_TIMEOUT_MS`: per-request transport timeout (`10000`)
//! - `EXPLORE_ONBOARDING_TTL_SECS`: onboarding cache staleness budget (`300`)
//! - `EXPLORE_ENGAGEMENT_DELIVERY`: `concurrent` or `sequential` (`concurrent`)
//! - `EXPLORE_DEMO_STEPS`: forward swipes performed by the demo binary (`12`)

use std::str::FromStr;
use std::time::Duration;

use explore_domain::{CategoryId, DeviceClass};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// One more than the prefetch window, so a prefetch that returns only
/// buffered items really means the catalog is exhausted.
pub const MIN_PAGE_SIZE: u32 = 4;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_ONBOARDING_TTL_SECS: u64 = 300;
pub const DEFAULT_DEMO_STEPS: usize = 12;

/// Which implementation backs the service ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Http,
    Memory,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "remote" => Ok(BackendKind::Http),
            "memory" | "in_memory" | "inmemory" | "local" => Ok(BackendKind::Memory),
            other => Err(ConfigError::invalid("EXPLORE_BACKEND", other)),
        }
    }
}

/// How engagement events are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// One background task per event; no ordering.
    #[default]
    Concurrent,
    /// Single queue flushed one request at a time, in emission order.
    Sequential,
}

impl FromStr for DeliveryMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concurrent" | "fire_and_forget" | "spawn" => Ok(DeliveryMode::Concurrent),
            "sequential" | "ordered" | "outbox" => Ok(DeliveryMode::Sequential),
            other => Err(ConfigError::invalid("EXPLORE_ENGAGEMENT_DELIVERY", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("{var} out of range [{min}, {max}]: {value}")]
    OutOfRange {
        var: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreConfig {
    pub backend: BackendKind,
    pub api_url: String,
    pub device_class: DeviceClass,
    pub page_size: u32,
    pub category_id: Option<CategoryId>,
    pub request_timeout: Duration,
    pub onboarding_ttl: Duration,
    pub delivery: DeliveryMode,
    pub demo_steps: usize,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            api_url: DEFAULT_API_URL.to_string(),
            device_class: DeviceClass::Mobile,
            page_size: DEFAULT_PAGE_SIZE,
            category_id: None,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            onboarding_ttl: Duration::from_secs(DEFAULT_ONBOARDING_TTL_SECS),
            delivery: DeliveryMode::default(),
            demo_steps: DEFAULT_DEMO_STEPS,
        }
    }
}

impl ExploreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unset or blank values fall back
    /// to defaults; malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(val) = get("EXPLORE_BACKEND") {
            config.backend = val.parse()?;
        }
        if let Some(val) = get("EXPLORE_API_URL") {
            config.api_url = val;
        }
        if let Some(val) = get("EXPLORE_DEVICE_CLASS") {
            config.device_class = val
                .parse()
                .map_err(|_| ConfigError::invalid("EXPLORE_DEVICE_CLASS", val))?;
        }
        if let Some(val) = get("EXPLORE_PAGE_SIZE") {
            let size = parse_u64("EXPLORE_PAGE_SIZE", &val)?;
            config.page_size = ranged(
                "EXPLORE_PAGE_SIZE",
                size,
                u64::from(MIN_PAGE_SIZE),
                u64::from(MAX_PAGE_SIZE),
            )? as u32;
        }
        if let Some(val) = get("EXPLORE_CATEGORY_ID") {
            let raw = val
                .parse::<i64>()
                .map_err(|_| ConfigError::invalid("EXPLORE_CATEGORY_ID", val.as_str()))?;
            config.category_id = Some(
                CategoryId::new(raw)
                    .map_err(|_| ConfigError::invalid("EXPLORE_CATEGORY_ID", val.as_str()))?,
            );
        }
        if let Some(val) = get("EXPLORE_REQUEST_TIMEOUT_MS") {
            let ms = parse_u64("EXPLORE_REQUEST_TIMEOUT_MS", &val)?;
            config.request_timeout =
                Duration::from_millis(ranged("EXPLORE_REQUEST_TIMEOUT_MS", ms, 1, 600_000)?);
        }
        if let Some(val) = get("EXPLORE_ONBOARDING_TTL_SECS") {
            config.onboarding_ttl =
                Duration::from_secs(parse_u64("EXPLORE_ONBOARDING_TTL_SECS", &val)?);
        }
        if let Some(val) = get("EXPLORE_ENGAGEMENT_DELIVERY") {
            config.delivery = val.parse()?;
        }
        if let Some(val) = get("EXPLORE_DEMO_STEPS") {
            config.demo_steps = parse_u64("EXPLORE_DEMO_STEPS", &val)? as usize;
        }

        Ok(config)
    }
}

fn parse_u64(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::invalid(var, value))
}

fn ranged(var: &'static str, value: u64, min: u64, max: u64) -> Result<u64, ConfigError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            var,
            value,
            min,
            max,
        })
    }
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = ExploreConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, ExploreConfig::default());
        assert_eq!(config.page_size, 10);
        assert_eq!(config.onboarding_ttl, Duration::from_secs(300));
        assert_eq!(config.request_timeout, Duration::from_millis(10_000));
    }

    #[test]
    fn reads_every_variable() {
        let config = ExploreConfig::from_lookup(lookup(&[
            ("EXPLORE_BACKEND", "Memory"),
            ("EXPLORE_API_URL", "https://api.example.test/v1"),
            ("EXPLORE_DEVICE_CLASS", "tablet"),
            ("EXPLORE_PAGE_SIZE", "25"),
            ("EXPLORE_CATEGORY_ID", "4"),
            ("EXPLORE_REQUEST_TIMEOUT_MS", "2500"),
            ("EXPLORE_ONBOARDING_TTL_SECS", "60"),
            ("EXPLORE_ENGAGEMENT_DELIVERY", "ordered"),
            ("EXPLORE_DEMO_STEPS", "3"),
        ]))
        .expect("config");

        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.api_url, "https://api.example.test/v1");
        assert_eq!(config.device_class, DeviceClass::Tablet);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.category_id, Some(CategoryId::from_raw(4)));
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.onboarding_ttl, Duration::from_secs(60));
        assert_eq!(config.delivery, DeliveryMode::Sequential);
        assert_eq!(config.demo_steps, 3);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config =
            ExploreConfig::from_lookup(lookup(&[("EXPLORE_PAGE_SIZE", "  ")])).expect("config");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = ExploreConfig::from_lookup(lookup(&[("EXPLORE_BACKEND", "carrier-pigeon")]))
            .expect_err("invalid backend");
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "EXPLORE_BACKEND",
                value: "carrier-pigeon".to_string()
            }
        );

        assert!(ExploreConfig::from_lookup(lookup(&[("EXPLORE_CATEGORY_ID", "-3")])).is_err());
        assert!(ExploreConfig::from_lookup(lookup(&[("EXPLORE_DEVICE_CLASS", "watch")])).is_err());
    }

    #[test]
    fn page_size_is_range_checked() {
        let err = ExploreConfig::from_lookup(lookup(&[("EXPLORE_PAGE_SIZE", "0")]))
            .expect_err("zero page size");
        assert!(matches!(err, ConfigError::OutOfRange { var: "EXPLORE_PAGE_SIZE", .. }));

        let err = ExploreConfig::from_lookup(lookup(&[("EXPLORE_PAGE_SIZE", "3")]))
            .expect_err("page size inside the prefetch window");
        assert_eq!(
            err,
            ConfigError::OutOfRange {
                var: "EXPLORE_PAGE_SIZE",
                value: 3,
                min: 4,
                max: 100
            }
        );
    }
}
