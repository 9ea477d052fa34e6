//! Runtime configuration loaded from the environment (`.env` supported).

use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 10;
const DEFAULT_SERVICE_LATENCY_MS: u64 = 500;
const DEFAULT_HISTORY_DAYS: u32 = 30;
const DEFAULT_RING_CAPACITY: usize = 1024;
const DEFAULT_SCENARIO_CUTOFF_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub refresh_interval: Duration,
    pub service_latency: Duration,
    pub history_days: u32,
    pub ring_capacity: usize,
    pub quote_jitter: bool,
    pub valuation_core: Option<usize>,
    pub database_url: Option<String>,
    /// Projections start this many days before the last historical point
    pub scenario_cutoff_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            service_latency: Duration::from_millis(DEFAULT_SERVICE_LATENCY_MS),
            history_days: DEFAULT_HISTORY_DAYS,
            ring_capacity: DEFAULT_RING_CAPACITY,
            quote_jitter: false,
            valuation_core: None,
            database_url: None,
            scenario_cutoff_days: DEFAULT_SCENARIO_CUTOFF_DAYS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let history_days = parse_or(get("HISTORY_DAYS"), "HISTORY_DAYS", defaults.history_days)?;
        if history_days == 0 {
            anyhow::bail!("HISTORY_DAYS must be at least 1");
        }
        let ring_capacity = parse_or(get("RING_CAPACITY"), "RING_CAPACITY", defaults.ring_capacity)?;
        if ring_capacity == 0 {
            anyhow::bail!("RING_CAPACITY must be at least 1");
        }

        Ok(Self {
            refresh_interval: Duration::from_secs(parse_or(
                get("REFRESH_INTERVAL_SECS"),
                "REFRESH_INTERVAL_SECS",
                DEFAULT_REFRESH_INTERVAL_SECS,
            )?),
            service_latency: Duration::from_millis(parse_or(
                get("SERVICE_LATENCY_MS"),
                "SERVICE_LATENCY_MS",
                DEFAULT_SERVICE_LATENCY_MS,
            )?),
            history_days,
            ring_capacity,
            quote_jitter: parse_or(get("QUOTE_JITTER"), "QUOTE_JITTER", defaults.quote_jitter)?,
            valuation_core: get("VALUATION_CORE")
                .map(|v| v.parse::<usize>().with_context(|| format!("VALUATION_CORE: invalid value '{}'", v)))
                .transpose()?,
            database_url: get("DATABASE_URL"),
            scenario_cutoff_days: parse_or(
                get("SCENARIO_CUTOFF_DAYS"),
                "SCENARIO_CUTOFF_DAYS",
                defaults.scenario_cutoff_days,
            )?,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v.parse::<T>().with_context(|| format!("{}: invalid value '{}'", key, v)),
        None => Ok(default),
    }
}
