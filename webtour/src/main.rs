//! # webtour
//!
//! Incremental web application lessons served over HTTP.
//!
//! Each lesson adds one feature on top of the previous ones: routing, views,
//! layout inheritance, form handling, cookie sessions, flash messages, a SQLite
//! user store, and blueprints. One lesson is served per process (`--lesson`).
//!
//! ## Architecture
//!
//! - **HTTP**: Axum router assembled from an [`http::App`] plus mounted blueprints
//! - **Sessions**: JSON payload in one signed cookie, with optional permanent lifetime
//! - **Flash**: FIFO messages stored in the session, drained by the next page render
//! - **Views**: maud templates looked up by name
//! - **Store**: sea-orm over SQLite, one `users` table

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

mod config;
mod flash;
mod http;
mod lessons;
mod store;
mod views;

use anyhow::Context;
use axum::serve;
use axum_extra::extract::cookie::Key;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, Cli};
use crate::http::AppState;
use crate::store::UserStore;
use crate::views::Views;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging().context("failed to initialize logging")?;

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli).context("failed to load configuration")?;
    info!(
        bind = %config.bind,
        lesson = config.lesson.name(),
        static_folder = %config.static_folder.display(),
        session_lifetime = %humantime::format_duration(config.session.permanent_lifetime),
        secure_cookies = config.session.secure_cookies,
        "configuration loaded"
    );

    let cookie_key = match config.cookie_key().context("invalid secret key")? {
        Some(key) => key,
        None => {
            warn!("no secret key configured; generated a random one, sessions end on restart");
            Key::generate()
        }
    };

    let mut state = AppState::new(cookie_key, config.session.clone(), Views::builtin());
    if config.lesson.uses_store() {
        let users = UserStore::connect(&config.database_url)
            .await
            .context("failed to open user store")?;
        info!(database = %config.database_url, "user store ready");
        state = state.with_users(users);
    }

    let app = config
        .lesson
        .app()
        .context("failed to assemble routes")?
        .static_folder(&config.static_folder)
        .rate_limit(config.rate_limit);
    for (name, prefix) in app.blueprints() {
        info!(blueprint = %name, prefix = %prefix, "blueprint mounted");
    }
    let router = app.into_router(state).context("failed to build router")?;

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    let shutdown = tokio::signal::ctrl_c();
    info!(bind = %config.bind, lesson = config.lesson.name(), "webtour listening");

    serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
            info!("shutting down gracefully");
        })
        .await
        .context("server exited with error")
}

/// Initialize tracing subscriber with `RUST_LOG` env filter (default: `info`).
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}
