//! 🎭 vibecheck — fetch a video's comments, judge them, report the vibes.
//!
//! Requests from any number of callers funnel through one queue into one dispatcher,
//! which is the only thing allowed to touch the scoring resource. Slow, serial, safe.

pub mod api;
pub mod app_config;
pub mod common;
pub mod error;
pub mod queue;
pub mod scoring;
pub mod sources;
pub mod workers;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::info;

use crate::app_config::AppConfig;
use crate::error::Outcome;
use crate::queue::{JobQueue, job_queue};
use crate::scoring::ScoringResource;
use crate::sources::SourceBackend;
use crate::workers::{DispatchSettings, Dispatcher, Worker};

/// 🏗️ Build the source and scorer, then start the dispatcher.
///
/// Both shared resources are constructed exactly once, here. If either can't be built,
/// we fail now instead of on the first request.
pub fn start(app_config: &AppConfig) -> Result<(JobQueue, JoinHandle<Result<()>>)> {
    let source = SourceBackend::from_config(&app_config.source)
        .context("💀 Failed to build the comment source")?;
    let scorer = ScoringResource::from_config(&app_config.scoring)
        .context("💀 Failed to build the scoring resource")?;

    let (queue, jobs) = job_queue();
    let dispatcher = Dispatcher::new(
        jobs,
        Arc::new(source),
        scorer,
        DispatchSettings::from(&app_config.runtime),
    );
    Ok((queue, dispatcher.start()))
}

/// 🚀 Serve HTTP until ctrl-c, then let the dispatcher drain and exit.
pub async fn serve(app_config: AppConfig) -> Result<()> {
    let (queue, dispatcher) = start(&app_config)?;
    let app = api::build_router(api::AppState::new(queue));

    let listener = tokio::net::TcpListener::bind(&app_config.server.bind_addr)
        .await
        .with_context(|| format!("💀 Couldn't bind to '{}'", app_config.server.bind_addr))?;
    info!("📡 Listening on http://{}", app_config.server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("💀 The HTTP server stopped unexpectedly")?;

    // -- the router (and every queue handle it held) is gone, so the dispatcher sees a closed queue
    dispatcher
        .await
        .context("💀 The dispatcher task panicked")?
        .context("💀 The dispatcher failed")?;
    info!("🏁 Shut down cleanly");
    Ok(())
}

/// 🎯 Push a single job through the same queue and dispatcher the server uses.
pub async fn analyze_once(app_config: &AppConfig, video_id: &str) -> Result<Outcome> {
    let (queue, dispatcher) = start(app_config)?;
    let outcome = queue.submit(video_id).await;
    drop(queue);
    dispatcher
        .await
        .context("💀 The dispatcher task panicked")?
        .context("💀 The dispatcher failed")?;
    Ok(outcome)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("💀 Couldn't listen for ctrl-c: {}", err);
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown requested");
}
