use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use sqlx::SqlitePool;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use super::{record_verdict, Probe, Verdict};
use crate::{db, models::Link};

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Sweep cadence. Ticks land on wall-clock multiples of this interval.
    pub interval: Duration,
    /// Maximum number of links probed at the same time within one sweep.
    pub concurrency: usize,
    /// Upper bound on a single uptime-check write.
    pub write_timeout: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            concurrency: 8,
            write_timeout: Duration::from_secs(5),
        }
    }
}

/// Tally of one completed sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub links: usize,
    pub up: usize,
    pub down: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed(SweepReport),
    /// Another sweep was still running.
    Skipped,
    /// The link snapshot could not be read; nothing was probed.
    Failed,
}

/// Periodically probes every stored link and records the verdicts.
///
/// One sweep runs right after `start`, then one at every interval boundary
/// until `stop`. Sweeps never overlap: a sweep requested while another is in
/// progress returns `SweepOutcome::Skipped`.
pub struct UptimeMonitor {
    db: SqlitePool,
    prober: Arc<dyn Probe>,
    settings: MonitorSettings,
    sweeping: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl UptimeMonitor {
    pub fn new(db: SqlitePool, prober: Arc<dyn Probe>, settings: MonitorSettings) -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);
        Arc::new(Self {
            db,
            prober,
            settings,
            sweeping: AtomicBool::new(false),
            shutdown_tx,
            handle: Mutex::new(None),
        })
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeping.load(Ordering::Acquire)
    }

    /// Spawn the background schedule. Calling `start` twice is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            warn!("Uptime monitor already running");
            return;
        }

        let monitor = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        *handle = Some(tokio::spawn(async move {
            info!(
                interval_secs = monitor.settings.interval.as_secs(),
                concurrency = monitor.settings.concurrency,
                "Uptime monitor started"
            );

            tokio::select! {
                _ = monitor.run_sweep() => {}
                _ = shutdown_rx.recv() => {
                    info!("Uptime monitor stopped");
                    return;
                }
            }

            loop {
                let next = next_tick_after(Utc::now(), monitor.settings.interval);
                let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                debug!("Next uptime sweep at {}", next);

                tokio::select! {
                    _ = async {
                        tokio::time::sleep(wait).await;
                        monitor.run_sweep().await
                    } => {}
                    _ = shutdown_rx.recv() => {
                        info!("Uptime monitor stopped");
                        break;
                    }
                }
            }
        }));
    }

    /// Stop the schedule, cancelling a sweep that is still in flight.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(());

        if let Some(handle) = self.handle.lock().await.take() {
            let _ = handle.await;
        }
    }

    /// Probe every link once and record each verdict.
    ///
    /// The link list is read once up front; links created during the sweep
    /// wait for the next one. A failure on one link is logged and counted but
    /// never stops the others.
    pub async fn run_sweep(&self) -> SweepOutcome {
        let Some(_guard) = SweepGuard::acquire(&self.sweeping) else {
            warn!("Uptime sweep already in progress, skipping");
            return SweepOutcome::Skipped;
        };

        let links = match db::all_links(&self.db).await {
            Ok(links) => links,
            Err(e) => {
                error!("Uptime sweep could not load links: {:?}", e);
                return SweepOutcome::Failed;
            }
        };

        info!("Starting uptime sweep over {} link(s)", links.len());

        let initial = SweepReport {
            links: links.len(),
            ..SweepReport::default()
        };

        let report = stream::iter(links)
            .map(|link| async move {
                let outcome = self.check_link(&link).await;
                (link, outcome)
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .fold(initial, |mut report, (link, outcome)| async move {
                match outcome {
                    Ok(verdict) => {
                        debug!(code = %link.short_code, verdict = verdict.as_str(), "link checked");
                        match verdict {
                            Verdict::Up => report.up += 1,
                            Verdict::Down => report.down += 1,
                        }
                    }
                    Err(e) => {
                        warn!(code = %link.short_code, "uptime check failed: {:#}", e);
                        report.failed += 1;
                    }
                }
                report
            })
            .await;

        info!(
            links = report.links,
            up = report.up,
            down = report.down,
            failed = report.failed,
            "Uptime sweep completed"
        );

        SweepOutcome::Completed(report)
    }

    async fn check_link(&self, link: &Link) -> anyhow::Result<Verdict> {
        let verdict = self.prober.probe(&link.target_url).await;

        record_verdict(&self.db, &link.id, verdict, self.settings.write_timeout).await?;

        Ok(verdict)
    }
}

/// Marks a sweep as running for as long as it is alive, including when the
/// sweep future is dropped mid-way.
struct SweepGuard<'a>(&'a AtomicBool);

impl<'a> SweepGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The first wall-clock multiple of `interval` strictly after `now`. For a
/// one-hour interval that is the top of the next UTC hour.
pub fn next_tick_after(now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    let step = interval.as_secs().max(1) as i64;
    let next = (now.timestamp().div_euclid(step) + 1) * step;
    DateTime::<Utc>::from_timestamp(next, 0).unwrap_or(now + chrono::Duration::seconds(step))
}
