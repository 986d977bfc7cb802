//! Debounced drowsiness decisions

use alerting::AlertOrchestrator;
use chrono::{DateTime, Utc};
use dms::{AlertnessTracker, DetectionHistory, Observation};
use feature_engine::{DrowsinessSignals, SignalConfig, SignalExtractor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::incident::{AlertReason, IncidentRecord, SessionSummary, Severity};
use crate::pending::{cancel_pair, CancelHandle};
use crate::preferences::Preferences;
use crate::EngineError;

/// Decision state between observations
///
/// `Evaluating` is held only while an observation is processed under the
/// state lock, so [`DrowsinessEngine::phase`] and [`TickOutcome::phase`]
/// report `Idle` or `PendingConfirmation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    /// Signals being recomputed for a new observation
    Evaluating,
    /// Alert scheduled, waiting out the debounce
    PendingConfirmation,
}

/// What one observation did to the decision state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub observation: Observation,
    /// False when the observation was older than the history and dropped
    pub accepted: bool,
    pub signals: DrowsinessSignals,
    pub should_alert: bool,
    /// A confirmation was scheduled by this observation
    pub scheduled: bool,
    /// A pending confirmation was cancelled by this observation
    pub cancelled: bool,
    pub phase: Phase,
    /// Smoothed alertness score (0-100)
    pub alertness: f64,
}

/// A scheduled confirmation
#[derive(Debug)]
struct PendingConfirmation {
    ticket: u64,
    scheduled_at_ms: u64,
    handle: CancelHandle,
}

#[derive(Debug, Default)]
struct AlertState {
    last_alert_ms: Option<u64>,
    /// Cooldown origin until the first alert: session start or last reset
    baseline_ms: u64,
    pending: Option<PendingConfirmation>,
    incident_count: u64,
}

struct EngineState {
    history: DetectionHistory,
    current: Option<Observation>,
    signals: DrowsinessSignals,
    alert: AlertState,
    phase: Phase,
    alertness: AlertnessTracker,
    incidents: Vec<IncidentRecord>,
    incident_tx: Option<mpsc::Sender<IncidentRecord>>,
    next_ticket: u64,
}

struct Inner {
    config: EngineConfig,
    /// Eye closure threshold after preference adjustments
    threshold_pct: f64,
    preferences: Preferences,
    extractor: SignalExtractor,
    orchestrator: Arc<AlertOrchestrator>,
    state: Mutex<EngineState>,
    /// Face detected with eyes closed or yawning, as of the last observation
    condition: watch::Sender<bool>,
    epoch: Instant,
    session_id: Uuid,
    started_at: DateTime<Utc>,
}

/// Session-scoped decision engine
///
/// Cloning yields another handle to the same session state. Observation
/// timestamps are expected on the engine clock ([`DrowsinessEngine::now_ms`]).
#[derive(Clone)]
pub struct DrowsinessEngine {
    inner: Arc<Inner>,
}

impl DrowsinessEngine {
    pub fn new(
        config: EngineConfig,
        signals: SignalConfig,
        preferences: Preferences,
        orchestrator: Arc<AlertOrchestrator>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let extractor = SignalExtractor::new(signals)?;
        let threshold_pct = preferences.eye_closure_threshold(config.eye_closure_alert_pct);
        let session_id = Uuid::new_v4();
        info!(
            %session_id,
            threshold_pct,
            debounce_ms = config.debounce_ms,
            cooldown_ms = config.cooldown_ms,
            "Creating drowsiness engine"
        );

        let (condition, _) = watch::channel(false);
        let state = EngineState {
            history: DetectionHistory::new(config.history_capacity),
            current: None,
            signals: DrowsinessSignals::default(),
            alert: AlertState::default(),
            phase: Phase::Idle,
            alertness: AlertnessTracker::default(),
            incidents: Vec::new(),
            incident_tx: None,
            next_ticket: 0,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                threshold_pct,
                preferences,
                extractor,
                orchestrator,
                state: Mutex::new(state),
                condition,
                epoch: Instant::now(),
                session_id,
                started_at: Utc::now(),
            }),
        })
    }

    /// Milliseconds since the engine was created
    pub fn now_ms(&self) -> u64 {
        self.inner.epoch.elapsed().as_millis() as u64
    }

    /// Process one observation.
    ///
    /// Appends it, recomputes the signals, then applies the cancellation
    /// rule before the trigger rule.
    pub async fn on_observation(&self, observation: Observation) -> TickOutcome {
        let mut state = self.inner.state.lock().await;

        if let Err(e) = state.history.push(observation) {
            warn!("Dropping observation: {}", e);
            return TickOutcome {
                observation,
                accepted: false,
                signals: state.signals,
                should_alert: false,
                scheduled: false,
                cancelled: false,
                phase: state.phase,
                alertness: state.alertness.score(),
            };
        }
        state.phase = Phase::Evaluating;

        let now_ms = observation.timestamp_ms;
        let signals = self.inner.extractor.extract(&state.history, now_ms);
        state.signals = signals;
        state.current = Some(observation);
        metrics::gauge!("drowsiness_eye_closure_pct").set(signals.eye_closure_pct);

        let alertness = if observation.face_detected {
            state.alertness.record(signals.eye_closure_pct)
        } else {
            state.alertness.score()
        };

        self.inner.condition.send_replace(
            observation.face_detected
                && (observation.eye_state.both_closed || observation.eye_state.is_yawning),
        );

        let should_alert = signals.should_alert(self.inner.threshold_pct);
        // A sentinel never shows closed eyes, so it also cancels
        let eyes_open = !observation.eye_state.both_closed;

        let mut cancelled = false;
        if eyes_open {
            if let Some(pending) = state.alert.pending.take() {
                cancelled = pending.handle.cancel();
                if cancelled {
                    metrics::counter!("drowsiness_alerts_cancelled_total").increment(1);
                }
                info!(
                    ticket = pending.ticket,
                    after_ms = now_ms.saturating_sub(pending.scheduled_at_ms),
                    face_detected = observation.face_detected,
                    "Alert cancelled, eyes open"
                );
            }
        }

        let mut scheduled = false;
        if should_alert && !eyes_open && state.alert.pending.is_none() {
            let since = state.alert.last_alert_ms.unwrap_or(state.alert.baseline_ms);
            let since_last = now_ms.saturating_sub(since);
            if since_last > self.inner.config.cooldown_ms {
                self.schedule(&mut state, now_ms);
                scheduled = true;
            } else {
                debug!(since_last, "Alert suppressed by cooldown");
            }
        }

        state.phase = if state.alert.pending.is_some() {
            Phase::PendingConfirmation
        } else {
            Phase::Idle
        };

        TickOutcome {
            observation,
            accepted: true,
            signals,
            should_alert,
            scheduled,
            cancelled,
            phase: state.phase,
            alertness,
        }
    }

    fn schedule(&self, state: &mut EngineState, now_ms: u64) {
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        let (handle, mut token) = cancel_pair();
        state.alert.pending = Some(PendingConfirmation {
            ticket,
            scheduled_at_ms: now_ms,
            handle,
        });
        metrics::counter!("drowsiness_alerts_scheduled_total").increment(1);
        info!(
            ticket,
            eye_closure_pct = state.signals.eye_closure_pct,
            yawn_sustained = state.signals.yawn_sustained,
            blink_anomaly = state.signals.blink_anomaly(),
            "Alert scheduled, confirming in {}ms",
            self.inner.config.debounce_ms
        );

        let engine = self.clone();
        let debounce = Duration::from_millis(self.inner.config.debounce_ms);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => debug!(ticket, "Confirmation task cancelled"),
                _ = sleep(debounce) => engine.confirm(ticket).await,
            }
        });
    }

    /// Debounce elapsed: fire if the condition still holds
    async fn confirm(&self, ticket: u64) {
        let mut state = self.inner.state.lock().await;

        let live = matches!(&state.alert.pending, Some(p) if p.ticket == ticket && !p.handle.is_cancelled());
        if !live {
            debug!(ticket, "Stale confirmation ignored");
            return;
        }
        state.alert.pending = None;
        state.phase = Phase::Idle;

        let signals = state.signals;
        let still_drowsy = state.current.is_some_and(|o| o.eye_state.both_closed)
            || signals.yawn_sustained
            || signals.blink_anomaly();
        if !still_drowsy {
            info!(ticket, "Condition cleared before confirmation");
            return;
        }

        self.fire(&mut state, signals);
    }

    fn fire(&self, state: &mut EngineState, signals: DrowsinessSignals) {
        let now_ms = self.now_ms();
        let reason = AlertReason::from_signals(&signals);
        let severity = Severity::classify(&signals, self.inner.threshold_pct);

        state.alert.incident_count += 1;
        state.alert.last_alert_ms = Some(now_ms);

        let alert = self
            .inner
            .orchestrator
            .fire(self.inner.preferences.alert_request(), self.inner.condition.subscribe());
        metrics::counter!("drowsiness_alerts_fired_total").increment(1);
        info!(
            incident = state.alert.incident_count,
            alert,
            %reason,
            ?severity,
            eye_closure_pct = signals.eye_closure_pct,
            "Drowsiness alert fired"
        );

        let record = IncidentRecord {
            sequence: state.alert.incident_count,
            session_id: self.inner.session_id,
            occurred_at: Utc::now(),
            session_offset_ms: now_ms,
            reason,
            severity,
            eye_closure_pct: signals.eye_closure_pct,
            alertness: state.alertness.score(),
        };
        if let Some(tx) = &state.incident_tx {
            if let Err(e) = tx.try_send(record.clone()) {
                warn!("Incident not delivered: {}", e);
            }
        }
        state.incidents.push(record);
    }

    /// Cancel any pending confirmation; returns whether one was live
    pub async fn cancel_pending(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        let cancelled = Self::cancel_locked(&mut state);
        state.phase = Phase::Idle;
        cancelled
    }

    fn cancel_locked(state: &mut EngineState) -> bool {
        match state.alert.pending.take() {
            Some(pending) => {
                let cancelled = pending.handle.cancel();
                if cancelled {
                    metrics::counter!("drowsiness_alerts_cancelled_total").increment(1);
                }
                cancelled
            }
            None => false,
        }
    }

    /// Cancel the pending confirmation and clear all detection state.
    ///
    /// No confirmation fires after this returns, even one whose timer has
    /// already elapsed.
    pub async fn reset(&self) {
        let mut state = self.inner.state.lock().await;
        let cancelled = Self::cancel_locked(&mut state);

        state.history.clear();
        state.current = None;
        state.signals = DrowsinessSignals::default();
        state.alert = AlertState {
            baseline_ms: self.now_ms(),
            ..Default::default()
        };
        state.phase = Phase::Idle;
        state.alertness.reset();
        state.incidents.clear();
        self.inner.condition.send_replace(false);

        info!(cancelled_pending = cancelled, "Detection state reset");
    }

    /// Receive each incident as it fires. Replaces any earlier subscriber.
    pub async fn subscribe_incidents(&self, buffer: usize) -> mpsc::Receiver<IncidentRecord> {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        self.inner.state.lock().await.incident_tx = Some(tx);
        rx
    }

    /// Whether the alert condition is active, updated every observation
    pub fn condition(&self) -> watch::Receiver<bool> {
        self.inner.condition.subscribe()
    }

    pub async fn summary(&self) -> SessionSummary {
        let state = self.inner.state.lock().await;
        SessionSummary {
            session_id: self.inner.session_id,
            started_at: self.inner.started_at,
            ended_at: Utc::now(),
            duration_secs: self.inner.epoch.elapsed().as_secs_f64(),
            incident_count: state.alert.incident_count,
            average_alertness: state.alertness.session_average(),
            max_eye_closure_pct: state.alertness.max_eye_closure_pct(),
            incidents: state.incidents.clone(),
        }
    }

    pub async fn incident_count(&self) -> u64 {
        self.inner.state.lock().await.alert.incident_count
    }

    pub async fn last_alert_ms(&self) -> Option<u64> {
        self.inner.state.lock().await.alert.last_alert_ms
    }

    pub async fn has_pending(&self) -> bool {
        self.inner.state.lock().await.alert.pending.is_some()
    }

    pub async fn phase(&self) -> Phase {
        self.inner.state.lock().await.phase
    }

    pub async fn signals(&self) -> DrowsinessSignals {
        self.inner.state.lock().await.signals
    }

    pub async fn current(&self) -> Option<Observation> {
        self.inner.state.lock().await.current
    }

    pub async fn history_len(&self) -> usize {
        self.inner.state.lock().await.history.len()
    }

    pub async fn incidents(&self) -> Vec<IncidentRecord> {
        self.inner.state.lock().await.incidents.clone()
    }

    pub fn threshold_pct(&self) -> f64 {
        self.inner.threshold_pct
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn preferences(&self) -> &Preferences {
        &self.inner.preferences
    }

    pub fn orchestrator(&self) -> &Arc<AlertOrchestrator> {
        &self.inner.orchestrator
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }
}
