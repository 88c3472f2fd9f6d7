use std::time::Duration;

use anyhow::{Context, Result};

use crate::uptime::MonitorSettings;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection string, e.g. "sqlite:./linkwatch.db"
    pub database_url: String,

    /// Host to bind the HTTP server to, e.g. "0.0.0.0"
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Public base URL used when generating short links, e.g. "https://go.example.com"
    /// Must NOT have a trailing slash.
    pub base_url: String,

    /// Timeout for one liveness probe and for recording its result.
    pub probe_timeout: Duration,

    /// Sweep cadence; sweeps land on wall-clock multiples of this interval.
    pub monitor_interval: Duration,

    /// How many links a sweep probes at once.
    pub monitor_concurrency: usize,

    /// Set MONITOR_ENABLED=false to run without the background sweep.
    pub monitor_enabled: bool,
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3001".into())
            .parse::<u16>()
            .context("PORT must be a valid port number (1–65535)")?;

        let base_url = std::env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_owned();

        let probe_timeout_secs = positive_var("PROBE_TIMEOUT_SECS", 5)?;
        let monitor_interval_minutes = positive_var("MONITOR_INTERVAL_MINUTES", 60)?;
        let monitor_concurrency = positive_var("MONITOR_CONCURRENCY", 8)?;

        let monitor_enabled = match std::env::var("MONITOR_ENABLED") {
            Ok(v) => parse_bool(&v).context("MONITOR_ENABLED must be true or false")?,
            Err(_) => true,
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./linkwatch.db".into()),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            base_url,
            probe_timeout: Duration::from_secs(probe_timeout_secs),
            monitor_interval: Duration::from_secs(monitor_interval_minutes * 60),
            monitor_concurrency: monitor_concurrency as usize,
            monitor_enabled,
        })
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            interval: self.monitor_interval,
            concurrency: self.monitor_concurrency,
            write_timeout: self.probe_timeout,
        }
    }
}

/// Read an optional positive integer, falling back to `default` when unset.
fn positive_var(name: &str, default: u64) -> Result<u64> {
    let value = match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{name} must be a positive integer"))?,
        Err(_) => default,
    };

    if value == 0 {
        anyhow::bail!("{name} must be greater than zero");
    }
    Ok(value)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
