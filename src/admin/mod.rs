//! # Admin Interface
//!
//! HTTP endpoints for cache monitoring and management plus reminder
//! inspection. This surface consumes the statistics contract; it adds no
//! semantics of its own.

use crate::caching::{CacheDetail, CacheStats, ResponseCache};
use crate::core::error::ChatError;
use crate::scheduling::{ReminderRecord, ReminderScheduler};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Admin surface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the admin router at all.
    pub enabled: bool,

    /// Listen address, e.g. `127.0.0.1:8090`.
    pub bind_addr: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: "127.0.0.1:8090".to_string(),
        }
    }
}

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub cache: Arc<ResponseCache>,
    pub scheduler: Arc<ReminderScheduler>,
}

/// Build the admin router.
pub fn admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/admin/cache/stats", get(get_cache_stats))
        .route("/admin/cache/info", get(get_cache_info))
        .route("/admin/cache/clear", post(clear_cache))
        .route("/admin/reminders/:user_id", get(get_user_reminders))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub scheduler_initialized: bool,
    pub armed_reminders: usize,
    pub cache_entries: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub stats: CacheStats,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct CacheInfoResponse {
    #[serde(flatten)]
    pub detail: CacheDetail,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ReminderQueryParams {
    pub include_completed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RemindersResponse {
    pub user_id: String,
    pub reminders: Vec<ReminderRecord>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

async fn get_health(State(state): State<AdminState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        scheduler_initialized: state.scheduler.is_initialized(),
        armed_reminders: state.scheduler.armed_count(),
        cache_entries: state.cache.len(),
        timestamp: chrono::Utc::now(),
    })
}

async fn get_cache_stats(State(state): State<AdminState>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse {
        stats: state.cache.stats(),
        timestamp: chrono::Utc::now(),
    })
}

async fn get_cache_info(State(state): State<AdminState>) -> Json<CacheInfoResponse> {
    Json(CacheInfoResponse {
        detail: state.cache.detailed_info(),
        timestamp: chrono::Utc::now(),
    })
}

async fn clear_cache(State(state): State<AdminState>) -> Json<ClearCacheResponse> {
    let entries = state.cache.len();
    state.cache.clear();
    info!(entries, "cache cleared via admin API");

    Json(ClearCacheResponse {
        success: true,
        message: format!("cleared {} entries", entries),
        timestamp: chrono::Utc::now(),
    })
}

async fn get_user_reminders(
    State(state): State<AdminState>,
    Path(user_id): Path<String>,
    Query(params): Query<ReminderQueryParams>,
) -> Result<Json<RemindersResponse>, ChatError> {
    let reminders = state
        .scheduler
        .reminders_for(&user_id, params.include_completed.unwrap_or(false))
        .await?;

    Ok(Json(RemindersResponse {
        user_id,
        reminders,
        timestamp: chrono::Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caching::CacheConfig;
    use crate::core::clock::SystemClock;
    use crate::scheduling::{MemoryReminderStore, NewReminder, TimerConfig};
    use axum_test::TestServer;

    fn test_state() -> AdminState {
        let clock = Arc::new(SystemClock);
        let cache = Arc::new(ResponseCache::new(CacheConfig::default(), clock.clone()));
        let scheduler = ReminderScheduler::new(
            Arc::new(MemoryReminderStore::new()),
            TimerConfig::default(),
            clock,
        );
        AdminState { cache, scheduler }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = TestServer::new(admin_router(test_state())).unwrap();
        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cache_entries"], 0);
    }

    #[tokio::test]
    async fn test_cache_stats_endpoint_shape() {
        let state = test_state();
        state.cache.set("k", "v").unwrap();
        state.cache.get("k");
        state.cache.get("missing");

        let server = TestServer::new(admin_router(state)).unwrap();
        let response = server.get("/admin/cache/stats").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["stats"]["hits"], 1);
        assert_eq!(body["stats"]["misses"], 1);
        assert_eq!(body["stats"]["hit_rate"], 0.5);
        assert!(body["stats"]["memory_usage_formatted"].is_string());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_clear_endpoint_empties_cache() {
        let state = test_state();
        state.cache.set("k", "v").unwrap();
        let cache = Arc::clone(&state.cache);

        let server = TestServer::new(admin_router(state)).unwrap();
        let response = server.post("/admin/cache/clear").await;

        response.assert_status_ok();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_reminders_endpoint() {
        let state = test_state();
        let scheduler = Arc::clone(&state.scheduler);
        scheduler
            .create(NewReminder::new(
                "u1",
                "stand up",
                chrono::Utc::now() + chrono::Duration::hours(1),
            ))
            .await
            .unwrap();

        let server = TestServer::new(admin_router(state)).unwrap();
        let response = server.get("/admin/reminders/u1").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["reminders"].as_array().unwrap().len(), 1);
        assert_eq!(body["reminders"][0]["message"], "stand up");

        scheduler.shutdown();
    }
}
