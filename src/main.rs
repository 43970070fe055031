mod config;
mod db;
mod error;
mod routes;
mod services;
mod state;
mod vk;

use std::sync::Arc;

use config::Config;
use services::{admin, bot};
use vk::VkApiAccessor;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("invalid configuration");

    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("database init failed");
    let state = state::AppState::from_pool(pool, config::env_bool("COOKIE_SECURE").unwrap_or(false));

    if let Some(admin_config) = &config.admin {
        admin::ensure_admin(state.admins.as_ref(), admin_config)
            .await
            .expect("bootstrap admin setup failed");
    }

    // Relay: poller -> bounded channel -> bot worker -> messages.send.
    let (sink, updates_rx) = bot::channel(bot::DEFAULT_UPDATE_QUEUE_CAPACITY);
    let mut accessor = VkApiAccessor::new(config.bot.clone(), config.vk.clone(), Arc::new(sink));
    accessor.connect().await.expect("vk relay connect failed");
    let sender = accessor.sender().expect("connected accessor has a sender");
    let worker = bot::spawn_bot_worker(updates_rx, sender);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, group_id = config.bot.group_id, "quizbot listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");

    tracing::info!(poller = ?accessor.poller_state(), "stopping vk relay");
    accessor.disconnect().await;
    // The accessor held the last sink clone; the worker drains and exits.
    drop(accessor);
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "bot worker terminated abnormally");
    }
    tracing::info!("shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
