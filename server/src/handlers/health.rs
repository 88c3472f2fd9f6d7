use crate::{db, AppState};
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /healthz
///
/// Process uptime plus a live database round-trip. Always answers 200; a
/// broken database shows up as `database.connected == false`.
pub async fn healthz(State(state): State<Arc<AppState>>) -> Json<Value> {
    let uptime_secs = state.started.elapsed().as_secs();

    let (connected, response_time) = match db::ping(&state.db).await {
        Ok(elapsed) => (true, format!("{}ms", elapsed.as_millis())),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            (false, "0ms".to_owned())
        }
    };

    Json(json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": {
            "seconds": uptime_secs,
            "formatted": format_uptime(uptime_secs),
            "startTime": state.started_at.to_rfc3339(),
        },
        "database": {
            "connected": connected,
            "responseTime": response_time,
        },
    }))
}

/// Render seconds as e.g. "2d 3h 4m 5s", leaving out leading zero units.
fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if days > 0 || hours > 0 || minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}
