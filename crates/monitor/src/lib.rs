//! Drowsiness Monitor
//!
//! Wires settings, logging, and a scripted monitoring session together for
//! the `drowsy-guard` binary.

pub mod scenario;
pub mod settings;

pub use scenario::Scenario;
pub use settings::{LogSettings, RunSettings, Settings};

use alerting::{AlertChannels, AlertOrchestrator};
use anyhow::{anyhow, Context, Result};
use decision_engine::{DrowsinessEngine, MonitoringSession, SessionSummary};
use dms::synthetic::ScriptedLandmarker;
use dms::DmsModule;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let level: Level = settings
        .level
        .parse()
        .map_err(|_| anyhow!("invalid log level: {}", settings.level))?;
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let installed = if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.context("Failed to set tracing subscriber")
}

/// Build a session for the configured scenario
pub fn build_session(settings: &Settings) -> Result<MonitoringSession<ScriptedLandmarker>> {
    settings.run.validate()?;
    let orchestrator = AlertOrchestrator::new(settings.alerts.clone(), AlertChannels::logging())?;
    let engine = DrowsinessEngine::new(
        settings.engine.clone(),
        settings.signals.clone(),
        settings.preferences.clone(),
        Arc::new(orchestrator),
    )?;

    let poll_ms = settings.engine.poll_interval_ms.max(1);
    let frames = (settings.run.duration_secs.saturating_mul(1_000) / poll_ms) as usize + 1;
    let landmarker = ScriptedLandmarker::new(
        settings.dms.landmarks.clone(),
        settings.run.scenario.script(frames),
    );
    let dms = DmsModule::new(landmarker, settings.dms.clone())?;

    Ok(MonitoringSession::new(dms, engine))
}

/// Run the scenario until the duration elapses or `shutdown` turns true
pub async fn run(settings: &Settings, mut shutdown: watch::Receiver<bool>) -> Result<SessionSummary> {
    let mut session = build_session(settings)?;
    info!(
        scenario = ?settings.run.scenario,
        duration_secs = settings.run.duration_secs,
        "Starting monitoring session"
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let duration = Duration::from_secs(settings.run.duration_secs);
    let stopper = tokio::spawn(async move {
        tokio::select! {
            _ = sleep(duration) => info!("Run duration elapsed"),
            _ = wait_for_shutdown(&mut shutdown) => info!("Shutdown requested"),
        }
        stop_tx.send_replace(true);
    });

    let ticks = session.run(|| (), stop_rx).await?;
    stopper.abort();

    let summary = session.stop().await?;
    info!(ticks, incidents = summary.incident_count, "Session complete");
    Ok(summary)
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
