use std::{fmt::Display, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

/// Binary outcome of one liveness probe. Also the stored `status` of an
/// uptime check row (`'UP'` / `'DOWN'`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Verdict {
    Up,
    Down,
}

impl Verdict {
    /// Collapse a probe outcome into a verdict.
    ///
    /// Any 2xx status is `Up`. A non-success status, a transport error, a
    /// malformed URL and a timeout are all `Down`.
    pub fn classify<E: Display>(outcome: Result<StatusCode, E>) -> Self {
        match outcome {
            Ok(status) if status.is_success() => Verdict::Up,
            Ok(status) => {
                tracing::debug!("probe answered with non-success status {}", status);
                Verdict::Down
            }
            Err(e) => {
                tracing::debug!("probe failed: {}", e);
                Verdict::Down
            }
        }
    }

    pub fn is_up(self) -> bool {
        self == Verdict::Up
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Up => "UP",
            Verdict::Down => "DOWN",
        }
    }
}

/// A single liveness check against a target URL. Implementations never fail;
/// every failure mode is reported as `Verdict::Down`.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str) -> Verdict;
}

/// Probes with a `HEAD` request through one shared client.
///
/// The client's total timeout covers connect, TLS and response headers, and
/// dropping the in-flight request on expiry closes its connection.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("linkwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build uptime probe HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, url: &str) -> Verdict {
        let outcome = self
            .client
            .head(url)
            .send()
            .await
            .map(|resp| resp.status());

        let verdict = Verdict::classify(outcome);
        tracing::debug!(url, verdict = verdict.as_str(), "probe finished");
        verdict
    }
}
