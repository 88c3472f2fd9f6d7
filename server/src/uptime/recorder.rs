use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;

use super::Verdict;
use crate::{db, error::is_foreign_key_violation, models::UptimeCheck};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("timed out after {0:?} recording uptime check")]
    TimedOut(Duration),
    #[error("link no longer exists")]
    LinkGone,
    #[error("failed to record uptime check: {0}")]
    Database(#[source] sqlx::Error),
}

/// Store one verdict for `link_id`, giving up after `limit`.
///
/// The limit covers waiting for a pool connection as well as the insert. A
/// link deleted after it was probed comes back as `RecordError::LinkGone`.
pub async fn record_verdict(
    pool: &SqlitePool,
    link_id: &str,
    verdict: Verdict,
    limit: Duration,
) -> Result<UptimeCheck, RecordError> {
    let write = db::record_uptime_check(pool, link_id, verdict, Utc::now());

    match tokio::time::timeout(limit, write).await {
        Err(_) => Err(RecordError::TimedOut(limit)),
        Ok(Ok(check)) => Ok(check),
        Ok(Err(e)) if is_foreign_key_violation(&e) => Err(RecordError::LinkGone),
        Ok(Err(e)) => Err(RecordError::Database(e)),
    }
}
