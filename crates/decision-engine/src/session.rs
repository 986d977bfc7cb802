//! Monitoring session: detection loop plus decisions for one drive

use dms::{DmsModule, FaceLandmarker};
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

use crate::engine::{DrowsinessEngine, TickOutcome};
use crate::incident::SessionSummary;
use crate::EngineError;

/// Owns the landmarker and the engine for one session
pub struct MonitoringSession<L: FaceLandmarker> {
    dms: DmsModule<L>,
    engine: DrowsinessEngine,
    ticks: u64,
    stopped: bool,
}

impl<L: FaceLandmarker> MonitoringSession<L> {
    pub fn new(dms: DmsModule<L>, engine: DrowsinessEngine) -> Self {
        info!(session_id = %engine.session_id(), "Monitoring session created");
        Self {
            dms,
            engine,
            ticks: 0,
            stopped: false,
        }
    }

    pub fn engine(&self) -> &DrowsinessEngine {
        &self.engine
    }

    pub fn dms(&self) -> &DmsModule<L> {
        &self.dms
    }

    /// Polling ticks processed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Classify one frame and feed the result to the engine
    pub async fn tick(&mut self, frame: &L::Frame) -> Result<TickOutcome, EngineError> {
        if self.stopped {
            return Err(EngineError::SessionStopped);
        }
        let timestamp_ms = self.engine.now_ms();
        let observation = self.dms.analyze(frame, timestamp_ms).await;
        self.ticks += 1;
        Ok(self.engine.on_observation(observation).await)
    }

    /// Poll frames at the configured cadence until `shutdown` turns true.
    ///
    /// Returns the number of ticks run.
    pub async fn run<F>(
        &mut self,
        mut next_frame: F,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<u64, EngineError>
    where
        F: FnMut() -> L::Frame,
    {
        if self.stopped {
            return Err(EngineError::SessionStopped);
        }
        let period = Duration::from_millis(self.engine.config().poll_interval_ms);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Starting detection loop every {:?}", period);

        let mut ran = 0;
        loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                _ = ticker.tick() => {
                    let frame = next_frame();
                    self.tick(&frame).await?;
                    ran += 1;
                }
            }
        }

        info!(ticks = ran, "Detection loop stopped");
        Ok(ran)
    }

    /// Cancel pending work and clear detection state
    pub async fn reset(&mut self) {
        self.engine.reset().await;
        self.dms.reset_state();
    }

    /// Cancel the pending confirmation, silence alerts, release the
    /// landmarker, and summarize the session.
    pub async fn stop(&mut self) -> Result<SessionSummary, EngineError> {
        if self.stopped {
            return Err(EngineError::SessionStopped);
        }
        self.stopped = true;

        let cancelled = self.engine.cancel_pending().await;
        self.engine.orchestrator().stop_all();
        self.dms.release();

        let summary = self.engine.summary().await;
        info!(
            session_id = %summary.session_id,
            incidents = summary.incident_count,
            cancelled_pending = cancelled,
            duration_secs = summary.duration_secs,
            "Monitoring session stopped"
        );
        Ok(summary)
    }
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            // Sender gone: nobody can ask us to stop any more
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EngineConfig, Preferences};
    use alerting::{AlertChannels, AlertConfig, AlertOrchestrator, Channel, RecordingBackend};
    use dms::synthetic::{FacePose, ScriptStep, ScriptedLandmarker};
    use dms::DmsConfig;
    use feature_engine::SignalConfig;
    use std::sync::Arc;

    fn session(
        script: Vec<ScriptStep>,
    ) -> (MonitoringSession<ScriptedLandmarker>, Arc<RecordingBackend>) {
        let backend = Arc::new(RecordingBackend::new());
        let orchestrator = AlertOrchestrator::new(
            AlertConfig::default(),
            AlertChannels::recording(backend.clone()),
        )
        .unwrap();
        let engine = DrowsinessEngine::new(
            EngineConfig::default(),
            SignalConfig::default(),
            Preferences::default(),
            Arc::new(orchestrator),
        )
        .unwrap();
        let config = DmsConfig::default();
        let landmarker = ScriptedLandmarker::new(config.landmarks.clone(), script);
        let dms = DmsModule::new(landmarker, config).unwrap();
        (MonitoringSession::new(dms, engine), backend)
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_shutdown() {
        let (mut session, backend) = session(vec![ScriptStep::Face(FacePose::eyes_closed())]);
        let (tx, rx) = watch::channel(false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(4_050)).await;
            tx.send_replace(true);
        });
        let ticks = session.run(|| (), rx).await.unwrap();

        // Ticks at 0, 300, ..., 3900
        assert_eq!(ticks, 14);
        assert_eq!(session.engine().incident_count().await, 1);
        assert_eq!(backend.events_on(Channel::Vibration).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_and_releases() {
        let (mut session, backend) = session(vec![ScriptStep::Face(FacePose::eyes_closed())]);

        let mut pending = false;
        for _ in 0..12 {
            let outcome = session.tick(&()).await.unwrap();
            pending |= outcome.scheduled;
            if pending {
                break;
            }
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        assert!(pending);

        let summary = session.stop().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1_000)).await;

        assert_eq!(summary.incident_count, 0);
        assert!(session.dms().landmarker().is_released());
        assert!(!backend
            .events()
            .iter()
            .any(|e| matches!(e.kind, alerting::DeliveryKind::Tone { .. })));
        assert!(matches!(session.tick(&()).await, Err(EngineError::SessionStopped)));
        assert!(matches!(session.stop().await, Err(EngineError::SessionStopped)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_face_absent_never_alerts() {
        let (mut session, backend) = session(vec![ScriptStep::Absent]);

        for _ in 0..20 {
            let outcome = session.tick(&()).await.unwrap();
            assert!(!outcome.observation.face_detected);
            assert!(!outcome.should_alert);
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        let summary = session.stop().await.unwrap();
        assert_eq!(summary.incident_count, 0);
        assert_eq!(summary.average_alertness, 100.0);
        assert!(backend.spoken().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_session_state() {
        let (mut session, _backend) = session(vec![ScriptStep::Face(FacePose::eyes_closed())]);

        for _ in 0..14 {
            session.tick(&()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        assert_eq!(session.engine().incident_count().await, 1);

        session.reset().await;
        assert_eq!(session.engine().incident_count().await, 0);
        assert_eq!(session.engine().last_alert_ms().await, None);
        assert_eq!(session.engine().history_len().await, 0);
    }
}
