//! # Chat Gateway - Main Entry Point
//!
//! Composition root for the gateway core: loads configuration, initializes
//! logging, constructs the response cache and the reminder scheduler,
//! restores persisted state, serves the admin surface, and shuts everything
//! down cleanly on SIGINT.

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use chat_gateway::admin::{admin_router, AdminState};
use chat_gateway::caching::{load_snapshot, restore_snapshot, save_snapshot, ResponseCache};
use chat_gateway::core::clock::SystemClock;
use chat_gateway::observability::init_logging;
use chat_gateway::scheduling::{MemoryReminderStore, ReminderScheduler};
use chat_gateway::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os("CHAT_GATEWAY_CONFIG")
        .map(PathBuf::from)
        .or_else(|| std::env::args_os().nth(1).map(PathBuf::from));

    let config = AppConfig::load_or_default(config_path.as_deref());
    init_logging(&config.logging);

    info!(version = env!("CARGO_PKG_VERSION"), "starting chat gateway");

    let clock = Arc::new(SystemClock);
    let snapshot_path = config.cache.snapshot_path.clone();

    // Response cache, with best-effort restore of the previous snapshot.
    let cache = Arc::new(ResponseCache::new(config.cache, clock.clone()));
    if let Some(path) = &snapshot_path {
        restore_snapshot(&cache, load_snapshot(path));
    }
    let sweeper = cache.spawn_sweeper();

    // Reminder scheduler over the configured store. The embedding
    // application swaps in its SQL-backed store here; the binary runs on
    // the in-memory one.
    let store = Arc::new(MemoryReminderStore::new());
    let scheduler = ReminderScheduler::new(store, config.scheduler, clock);

    scheduler.on_reminder_due(|record| {
        // Delivery to the chat platform is the embedding application's
        // job; the standalone binary just reports the fire.
        info!(
            id = record.id,
            user = %record.user_id,
            message = %record.message,
            "reminder due"
        );
        Ok(())
    });

    let armed = scheduler
        .load_and_arm_all()
        .await
        .context("failed to load reminders")?;
    info!(armed, "reminder scheduler ready");

    // Admin/status surface.
    let admin_task = if config.admin.enabled {
        let router = admin_router(AdminState {
            cache: Arc::clone(&cache),
            scheduler: Arc::clone(&scheduler),
        });
        let listener = tokio::net::TcpListener::bind(&config.admin.bind_addr)
            .await
            .with_context(|| format!("cannot bind admin surface to {}", config.admin.bind_addr))?;
        info!(addr = %config.admin.bind_addr, "admin surface listening");

        Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = %e, "admin surface failed");
            }
        }))
    } else {
        None
    };

    signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    // Disarm timers before persisting so nothing fires mid-shutdown.
    scheduler.shutdown();
    sweeper.abort();
    if let Some(task) = admin_task {
        task.abort();
    }

    if let Some(path) = &snapshot_path {
        if let Err(e) = save_snapshot(&cache, path) {
            warn!(error = %e, "cache snapshot not written");
        }
    }

    info!("chat gateway shutdown complete");
    Ok(())
}
