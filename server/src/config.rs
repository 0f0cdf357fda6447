//! Server configuration.

use std::str::FromStr;
use std::time::Duration;

use userbalance_common::time::constants;
use userbalance_common::Currency;
use userbalance_ledger::DatabaseConfig;

/// Default endpoint for rate snapshots quoted against RUB.
pub const DEFAULT_RATES_URL: &str = "https://api.exchangeratesapi.io/latest?base=RUB";

/// Exchange rate configuration.
#[derive(Debug, Clone)]
pub struct RatesConfig {
    /// Currency balances are stored in.
    pub base_currency: Currency,
    /// Rate snapshot endpoint.
    pub url: String,
    /// How long a fetched snapshot is served.
    pub refresh_interval: Duration,
    /// Per-request timeout against the rate endpoint.
    pub request_timeout: Duration,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_currency: Currency::rub(),
            url: DEFAULT_RATES_URL.to_string(),
            refresh_interval: constants::rate_refresh_interval(),
            request_timeout: constants::rate_request_timeout(),
        }
    }
}

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Exchange rate configuration.
    pub rates: RatesConfig,
    /// Log level, used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 8000,
            database: DatabaseConfig::default(),
            rates: RatesConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|value| value.trim().parse().ok())
}

fn env_secs(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).map(Duration::from_secs)
}

impl ServerConfig {
    /// Load configuration from environment variables. Unset or unparsable
    /// values keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("SERVER_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = env_parse("SERVER_LISTEN_PORT") {
            config.listen_port = port;
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }

        if let Some(max) = env_parse("DATABASE_MAX_CONNECTIONS") {
            config.database.max_connections = max;
        }

        if let Some(interval) = env_secs("DATABASE_CHECK_INTERVAL_SECS") {
            config.database.check_interval = interval;
        }

        if let Ok(code) = std::env::var("BASE_CURRENCY") {
            config.rates.base_currency = Currency::new(code);
        }

        if let Ok(url) = std::env::var("RATES_URL") {
            config.rates.url = url;
        }

        if let Some(interval) = env_secs("RATES_REFRESH_INTERVAL_SECS") {
            config.rates.refresh_interval = interval;
        }

        if let Some(timeout) = env_secs("RATES_REQUEST_TIMEOUT_SECS") {
            config.rates.request_timeout = timeout;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }

        if self.database.max_connections == 0 {
            return Err("Database pool needs at least one connection".to_string());
        }

        if self.database.check_interval.is_zero() {
            return Err("Database check interval cannot be 0".to_string());
        }

        if self.rates.base_currency.is_empty() {
            return Err("Base currency cannot be empty".to_string());
        }

        if self.rates.url.is_empty() {
            return Err("Rates URL cannot be empty".to_string());
        }

        if self.rates.refresh_interval.is_zero() {
            return Err("Rate refresh interval cannot be 0".to_string());
        }

        if self.rates.request_timeout.is_zero() {
            return Err("Rate request timeout cannot be 0".to_string());
        }

        if self.rates.request_timeout > self.rates.refresh_interval {
            return Err("Rate request timeout cannot exceed refresh interval".to_string());
        }

        Ok(())
    }
}
