use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use uuid::Uuid;

use crate::{
    cache::{CachedLink, LinkCache},
    models::{Click, Link, UptimeCheck},
    uptime::Verdict,
};

const LINK_COLUMNS: &str = "id, short_code, target_url, total_clicks, last_clicked, created_at";

// ── Setup ──────────────────────────────────────────────────────────────────

/// Open a SQLite pool, creating the database file if it doesn't exist yet.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = database_url
        .parse::<SqliteConnectOptions>()
        .with_context(|| format!("invalid DATABASE_URL '{database_url}'"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .context("failed to open SQLite database")?;

    Ok(pool)
}

/// Apply the embedded migrations in `migrations/`.
pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to apply database migrations")?;
    Ok(())
}

/// Load every link into the in-memory cache at startup.
pub async fn warm_cache(pool: &SqlitePool, cache: &LinkCache) -> anyhow::Result<()> {
    let links = all_links(pool).await?;

    let count = links.len();
    for link in links {
        cache.set(
            link.short_code,
            CachedLink {
                id: link.id,
                target_url: link.target_url,
            },
        );
    }

    tracing::info!("Cache warmed with {} link(s)", count);
    Ok(())
}

/// Round-trip a trivial query and report how long it took.
pub async fn ping(pool: &SqlitePool) -> Result<Duration, sqlx::Error> {
    let started = Instant::now();
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(started.elapsed())
}

// ── Links ──────────────────────────────────────────────────────────────────

/// Insert a new link and return the stored row. A duplicate short code comes
/// back as a unique-constraint violation.
pub async fn create_link(
    pool: &SqlitePool,
    short_code: &str,
    target_url: &str,
) -> Result<Link, sqlx::Error> {
    let id = Uuid::new_v4().to_string();

    sqlx::query("INSERT INTO links (id, short_code, target_url, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(&id)
        .bind(short_code)
        .bind(target_url)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    let link: Link = sqlx::query_as(&format!("SELECT {LINK_COLUMNS} FROM links WHERE id = ?1"))
        .bind(&id)
        .fetch_one(pool)
        .await?;

    Ok(link)
}

/// Fetch a single link by its short code (case-sensitive).
pub async fn get_link_by_code(
    pool: &SqlitePool,
    short_code: &str,
) -> Result<Option<Link>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {LINK_COLUMNS} FROM links WHERE short_code = ?1"
    ))
    .bind(short_code)
    .fetch_optional(pool)
    .await
}

/// Every link, oldest first. Used for cache warm-up and as the sweep snapshot.
pub async fn all_links(pool: &SqlitePool) -> Result<Vec<Link>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {LINK_COLUMNS} FROM links ORDER BY created_at ASC, rowid ASC"
    ))
    .fetch_all(pool)
    .await
}

/// One page of links, newest first, optionally filtered by a substring of the
/// short code or target URL. Returns the page and the total match count.
pub async fn list_links(
    pool: &SqlitePool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Link>, i64), sqlx::Error> {
    let pattern = search.map(like_pattern);

    let links_query = format!(
        "SELECT {LINK_COLUMNS} FROM links
         WHERE ?1 IS NULL OR short_code LIKE ?1 ESCAPE '\\' OR target_url LIKE ?1 ESCAPE '\\'
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2 OFFSET ?3"
    );

    let links = sqlx::query_as::<_, Link>(&links_query)
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool);

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM links
         WHERE ?1 IS NULL OR short_code LIKE ?1 ESCAPE '\\' OR target_url LIKE ?1 ESCAPE '\\'",
    )
    .bind(pattern.as_deref())
    .fetch_one(pool);

    tokio::try_join!(links, total)
}

/// Delete a link together with its clicks and uptime checks in one
/// transaction. Returns the deleted link, or `None` if the code is unknown.
pub async fn delete_link(pool: &SqlitePool, short_code: &str) -> Result<Option<Link>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let link: Option<Link> = sqlx::query_as(&format!(
        "SELECT {LINK_COLUMNS} FROM links WHERE short_code = ?1"
    ))
    .bind(short_code)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(link) = link else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM clicks WHERE link_id = ?1")
        .bind(&link.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM uptime_checks WHERE link_id = ?1")
        .bind(&link.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM links WHERE id = ?1")
        .bind(&link.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(link))
}

// ── Clicks ─────────────────────────────────────────────────────────────────

/// Count one redirect: bump `total_clicks`, stamp `last_clicked` and append a
/// click row, all in one transaction. Returns `None` (and writes nothing) if
/// the link no longer exists.
pub async fn record_click(
    pool: &SqlitePool,
    link_id: &str,
    at: DateTime<Utc>,
) -> Result<Option<Click>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE links SET total_clicks = total_clicks + 1, last_clicked = ?2 WHERE id = ?1",
    )
    .bind(link_id)
    .bind(at)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(None);
    }

    let click = Click {
        id: Uuid::new_v4().to_string(),
        link_id: link_id.to_owned(),
        created_at: at,
    };

    sqlx::query("INSERT INTO clicks (id, link_id, created_at) VALUES (?1, ?2, ?3)")
        .bind(&click.id)
        .bind(&click.link_id)
        .bind(click.created_at)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(click))
}

/// Full click history for a link, oldest first.
pub async fn get_clicks(pool: &SqlitePool, link_id: &str) -> Result<Vec<Click>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, link_id, created_at FROM clicks
         WHERE link_id = ?1
         ORDER BY created_at ASC, rowid ASC",
    )
    .bind(link_id)
    .fetch_all(pool)
    .await
}

// ── Uptime checks ──────────────────────────────────────────────────────────

/// Append one probe result for a link.
pub async fn record_uptime_check(
    pool: &SqlitePool,
    link_id: &str,
    status: Verdict,
    at: DateTime<Utc>,
) -> Result<UptimeCheck, sqlx::Error> {
    let check = UptimeCheck {
        id: Uuid::new_v4().to_string(),
        link_id: link_id.to_owned(),
        status,
        created_at: at,
    };

    sqlx::query("INSERT INTO uptime_checks (id, link_id, status, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(&check.id)
        .bind(&check.link_id)
        .bind(check.status)
        .bind(check.created_at)
        .execute(pool)
        .await?;

    Ok(check)
}

/// Full uptime history for a link, most recent first.
pub async fn get_uptime_checks(
    pool: &SqlitePool,
    link_id: &str,
) -> Result<Vec<UptimeCheck>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, link_id, status, created_at FROM uptime_checks
         WHERE link_id = ?1
         ORDER BY created_at DESC, rowid DESC",
    )
    .bind(link_id)
    .fetch_all(pool)
    .await
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Wrap a search term for `LIKE ... ESCAPE '\'`, treating `%` and `_` literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
