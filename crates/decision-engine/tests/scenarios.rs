//! End-to-end decision scenarios on a paused clock

use std::sync::Arc;

use alerting::{AlertChannels, AlertConfig, AlertOrchestrator, Channel, RecordingBackend};
use decision_engine::{DrowsinessEngine, EngineConfig, Preferences, TickOutcome};
use dms::{EyeState, Observation};
use feature_engine::SignalConfig;
use tokio::time::{sleep, Duration, Instant};

const FRAME_MS: u64 = 100;

struct Harness {
    engine: DrowsinessEngine,
    backend: Arc<RecordingBackend>,
    start: Instant,
}

impl Harness {
    fn new() -> Self {
        let backend = Arc::new(RecordingBackend::new());
        let orchestrator = AlertOrchestrator::new(
            AlertConfig::default(),
            AlertChannels::recording(backend.clone()),
        )
        .unwrap();
        let start = Instant::now();
        let engine = DrowsinessEngine::new(
            EngineConfig::default(),
            SignalConfig::default(),
            Preferences::default(),
            Arc::new(orchestrator),
        )
        .unwrap();
        Self {
            engine,
            backend,
            start,
        }
    }

    /// Feed one observation stamped with the engine clock, then wait a frame
    async fn frame(&self, both_closed: bool, is_yawning: bool) -> TickOutcome {
        let observation = Observation {
            face_detected: true,
            eye_state: EyeState {
                left_closed: both_closed,
                right_closed: both_closed,
                both_closed,
                confidence: 0.95,
                is_yawning,
            },
            timestamp_ms: self.engine.now_ms(),
            ratios: None,
        };
        let outcome = self.engine.on_observation(observation).await;
        sleep(Duration::from_millis(FRAME_MS)).await;
        outcome
    }

    /// Session offsets of the fired alerts
    async fn fire_times_ms(&self) -> Vec<u64> {
        self.engine
            .incidents()
            .await
            .iter()
            .map(|record| record.session_offset_ms)
            .collect()
    }

    fn fires(&self) -> usize {
        self.engine.orchestrator().alert_count() as usize
    }
}

#[tokio::test(start_paused = true)]
async fn sustained_closure_fires_once_after_debounce() {
    let h = Harness::new();

    // 10 frames per second for 4 seconds
    for _ in 0..40 {
        h.frame(true, false).await;
    }

    assert_eq!(h.fires(), 1);
    assert_eq!(h.engine.incident_count().await, 1);

    let times = h.fire_times_ms().await;
    assert_eq!(times.len(), 1);
    assert!((3_400..=3_700).contains(&times[0]), "fired at {}ms", times[0]);

    // The vibration pulse goes out at the moment of firing
    let pulse = &h.backend.events_on(Channel::Vibration)[0];
    assert_eq!((pulse.at - h.start).as_millis() as u64, times[0]);
}

#[tokio::test(start_paused = true)]
async fn half_duty_alternation_never_fires() {
    let h = Harness::new();

    // toggle every 100ms for 5 seconds
    let mut closure = Vec::new();
    for i in 0..50 {
        let outcome = h.frame(i % 2 == 0, false).await;
        if i >= 30 {
            closure.push(outcome.signals.eye_closure_pct);
        }
    }
    sleep(Duration::from_millis(1_000)).await;

    assert!(closure.iter().all(|pct| (40.0..=60.0).contains(pct)), "{:?}", closure);
    assert_eq!(h.fires(), 0);
    assert_eq!(h.engine.incident_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn mostly_closed_fires_once_then_respects_cooldown() {
    let h = Harness::new();

    // Two open frames at the start of every second: 80% closure
    let mut scheduled_at = Vec::new();
    for i in 0..68u64 {
        let outcome = h.frame(i % 10 >= 2, false).await;
        if outcome.scheduled {
            scheduled_at.push(outcome.observation.timestamp_ms);
        }
    }

    assert_eq!(scheduled_at, vec![3_200]);
    assert_eq!(h.fires(), 1);
    assert_eq!(h.engine.last_alert_ms().await, Some(3_700));
    // Frames through 6700ms arrived inside the cooldown
    assert!(!h.engine.has_pending().await);
}

#[tokio::test(start_paused = true)]
async fn eyes_opening_inside_debounce_cancels() {
    let h = Harness::new();

    let mut scheduled = false;
    while !scheduled {
        scheduled = h.frame(true, false).await.scheduled;
    }

    // 200ms into the 500ms debounce
    h.frame(true, false).await;
    let outcome = h.frame(false, false).await;
    assert!(outcome.cancelled);

    sleep(Duration::from_millis(1_000)).await;
    assert_eq!(h.fires(), 0);
    assert_eq!(h.engine.incident_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn reset_during_debounce_prevents_firing() {
    let h = Harness::new();

    let mut scheduled = false;
    while !scheduled {
        scheduled = h.frame(true, false).await.scheduled;
    }
    sleep(Duration::from_millis(100)).await;
    h.engine.reset().await;

    sleep(Duration::from_millis(2_000)).await;
    assert_eq!(h.fires(), 0);
    assert_eq!(h.engine.incident_count().await, 0);
    assert_eq!(h.engine.last_alert_ms().await, None);
    assert!(h.backend.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn no_two_fires_within_cooldown() {
    let h = Harness::new();

    for _ in 0..120 {
        h.frame(true, false).await;
    }

    let times = h.fire_times_ms().await;
    assert!(times.len() >= 2);
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] > 3_000, "fires at {:?}", times);
    }
    assert_eq!(h.engine.incident_count().await as usize, h.fires());
}

#[tokio::test(start_paused = true)]
async fn yawning_with_closed_eyes_is_the_reported_reason() {
    let h = Harness::new();

    let mut incidents = h.engine.subscribe_incidents(8).await;
    for _ in 0..40 {
        h.frame(true, true).await;
    }

    let record = incidents.try_recv().unwrap();
    assert_eq!(record.reason, decision_engine::AlertReason::Yawning);
}
