//! Link operations shared by the HTTP handlers: creation, listing, the stats
//! view, deletion and redirect accounting.

use chrono::Utc;

use crate::{
    cache::CachedLink,
    db,
    error::{is_unique_violation, AppError, AppResult},
    models::{CreatedLink, LinkPage, LinkStats, Pagination},
    uptime::{daily_uptime, record_verdict, RecordError},
    AppState,
};

/// Most uptime checks a stats response lists. Aggregation always uses the
/// full history.
pub const UPTIME_HISTORY_LIMIT: usize = 50;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Codes that collide with static routes under `/api`.
const RESERVED_CODES: &[&str] = &["links"];

fn link_not_found() -> AppError {
    AppError::NotFound("Link not found".into())
}

// ── Create ─────────────────────────────────────────────────────────────────

pub async fn create_link(
    state: &AppState,
    target_url: Option<&str>,
    custom_code: Option<&str>,
) -> AppResult<CreatedLink> {
    let url = target_url
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Target URL is required".into()))?;

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(AppError::Validation(
            "Target URL must start with http:// or https://".into(),
        ));
    }

    let short_code = match custom_code.map(str::trim).filter(|s| !s.is_empty()) {
        Some(code) => {
            if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(AppError::Validation(
                    "Custom code may only contain letters, numbers, and hyphens".into(),
                ));
            }
            if RESERVED_CODES.contains(&code) {
                return Err(AppError::Validation(format!(
                    "Custom code '{code}' is reserved"
                )));
            }
            code.to_owned()
        }
        None => generate_unique_code(&state.db).await,
    };

    let link = db::create_link(&state.db, &short_code, url)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Short code already exists".into())
            } else {
                AppError::from(e)
            }
        })?;

    state.cache.set(
        &link.short_code,
        CachedLink {
            id: link.id.clone(),
            target_url: link.target_url.clone(),
        },
    );
    tracing::info!("Created link '{}' -> {}", link.short_code, link.target_url);

    Ok(CreatedLink {
        short_url: format!("{}/api/{}", state.config.base_url, link.short_code),
        link,
    })
}

// ── List ───────────────────────────────────────────────────────────────────

pub async fn list_links(
    state: &AppState,
    page: Option<i64>,
    limit: Option<i64>,
    search: Option<&str>,
) -> AppResult<LinkPage> {
    let page = page.filter(|p| *p > 0).unwrap_or(1);
    let limit = limit
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    let offset = (page - 1).saturating_mul(limit);

    let (data, total) = db::list_links(&state.db, search, limit, offset).await?;

    Ok(LinkPage {
        data,
        pagination: Pagination::new(total, page, limit),
    })
}

// ── Stats ──────────────────────────────────────────────────────────────────

/// Stats view for one short code.
///
/// Takes one fresh probe sample before reading history, so the report always
/// contains at least one check from the time of the request.
pub async fn link_stats(state: &AppState, code: &str) -> AppResult<LinkStats> {
    let link = db::get_link_by_code(&state.db, code)
        .await?
        .ok_or_else(link_not_found)?;

    let verdict = state.prober.probe(&link.target_url).await;
    record_verdict(&state.db, &link.id, verdict, state.config.probe_timeout)
        .await
        .map_err(|e| match e {
            RecordError::LinkGone => link_not_found(),
            RecordError::Database(e) => AppError::Database(e),
            e @ RecordError::TimedOut(_) => AppError::Internal(e.into()),
        })?;

    let link = db::get_link_by_code(&state.db, code)
        .await?
        .ok_or_else(link_not_found)?;

    let (clicks, mut uptime_checks) = tokio::try_join!(
        db::get_clicks(&state.db, &link.id),
        db::get_uptime_checks(&state.db, &link.id),
    )?;

    let daily_uptime = daily_uptime(&uptime_checks, Utc::now().date_naive());
    uptime_checks.truncate(UPTIME_HISTORY_LIMIT);

    Ok(LinkStats {
        link,
        clicks,
        uptime_checks,
        daily_uptime,
    })
}

// ── Delete ─────────────────────────────────────────────────────────────────

pub async fn delete_link(state: &AppState, code: &str) -> AppResult<()> {
    match db::delete_link(&state.db, code).await? {
        Some(link) => {
            state.cache.remove(&link.short_code);
            tracing::info!("Deleted link '{}'", link.short_code);
            Ok(())
        }
        None => Err(AppError::NotFound(
            "Link not found or already deleted".into(),
        )),
    }
}

// ── Redirect ───────────────────────────────────────────────────────────────

/// Resolve a short code and count the click. Returns the URL to redirect to.
///
/// 1. Check the in-memory cache (no DB read on a hit).
/// 2. On a miss, fall back to the database and backfill the cache.
/// 3. Record the click; a link deleted in the meantime is a 404.
pub async fn record_redirect(state: &AppState, code: &str) -> AppResult<String> {
    let target = match state.cache.get(code) {
        Some(cached) => cached,
        None => {
            let link = db::get_link_by_code(&state.db, code)
                .await?
                .ok_or_else(link_not_found)?;
            let cached = CachedLink {
                id: link.id,
                target_url: link.target_url,
            };
            state.cache.set(link.short_code, cached.clone());
            cached
        }
    };

    match db::record_click(&state.db, &target.id, Utc::now()).await? {
        Some(_) => Ok(target.target_url),
        None => {
            state.cache.remove(code);
            Err(link_not_found())
        }
    }
}

// ── Short codes ────────────────────────────────────────────────────────────

/// Generate a random 7-character alphanumeric short code that doesn't already
/// exist in the database. Tries up to 10 times before falling back to a
/// longer code (the UNIQUE constraint in the DB is the real guard).
async fn generate_unique_code(pool: &sqlx::SqlitePool) -> String {
    for _ in 0..10 {
        let code = random_code(7);
        match db::get_link_by_code(pool, &code).await {
            Ok(None) => return code,
            _ => continue,
        }
    }
    random_code(9)
}

fn random_code(len: usize) -> String {
    use rand::Rng;
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
