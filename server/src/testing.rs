use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::{
    config::AppConfig,
    uptime::{Probe, Verdict},
    AppState,
};

/// Always answers with the same verdict and counts how often it was asked.
pub(crate) struct FixedProber {
    verdict: Verdict,
    calls: AtomicUsize,
}

impl FixedProber {
    pub(crate) fn up() -> Arc<Self> {
        Arc::new(Self {
            verdict: Verdict::Up,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for FixedProber {
    async fn probe(&self, _url: &str) -> Verdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
    }
}

pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 3001,
        base_url: "http://localhost:3001".into(),
        probe_timeout: Duration::from_secs(5),
        monitor_interval: Duration::from_secs(3600),
        monitor_concurrency: 8,
        monitor_enabled: false,
    }
}

pub(crate) fn test_state(pool: SqlitePool, prober: Arc<dyn Probe>) -> AppState {
    AppState::new(pool, test_config(), prober)
}
