use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::uptime::Verdict;

/// A shortened link record from the `links` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub short_code: String,
    pub target_url: String,
    pub total_clicks: i64,
    pub last_clicked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A single click event from the `clicks` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Click {
    pub id: String,
    pub link_id: String,
    pub created_at: DateTime<Utc>,
}

/// One recorded liveness probe from the `uptime_checks` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UptimeCheck {
    pub id: String,
    pub link_id: String,
    pub status: Verdict,
    pub created_at: DateTime<Utc>,
}

/// One UTC calendar day of the rolling uptime report. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUptimeBucket {
    /// `YYYY-MM-DD`
    pub date: String,
    pub total_checks: u32,
    pub up_checks: u32,
    pub down_checks: u32,
    pub uptime_percentage: u8,
}

/// Everything the stats endpoint returns for one link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    #[serde(flatten)]
    pub link: Link,
    pub clicks: Vec<Click>,
    /// Most recent first, capped for display.
    pub uptime_checks: Vec<UptimeCheck>,
    pub daily_uptime: Vec<DailyUptimeBucket>,
}

/// A freshly created link together with its public short URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLink {
    #[serde(flatten)]
    pub link: Link,
    pub short_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            total,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// One page of the link listing.
#[derive(Debug, Clone, Serialize)]
pub struct LinkPage {
    pub data: Vec<Link>,
    pub pagination: Pagination,
}
