//! Incident records and session summaries

use chrono::{DateTime, Utc};
use feature_engine::DrowsinessSignals;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Dominant cause of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    EyesClosed,
    Yawning,
    AbnormalBlinking,
}

impl AlertReason {
    /// Yawning takes precedence over blinking, blinking over eye closure
    pub fn from_signals(signals: &DrowsinessSignals) -> Self {
        if signals.yawn_sustained {
            AlertReason::Yawning
        } else if signals.blink_anomaly() {
            AlertReason::AbnormalBlinking
        } else {
            AlertReason::EyesClosed
        }
    }
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AlertReason::EyesClosed => "eyes closed",
            AlertReason::Yawning => "yawning",
            AlertReason::AbnormalBlinking => "abnormal blinking",
        };
        f.write_str(text)
    }
}

/// Incident severity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn classify(signals: &DrowsinessSignals, eye_closure_threshold_pct: f64) -> Self {
        if signals.eye_closure_pct >= 90.0 {
            Severity::High
        } else if signals.eye_closure_pct > eye_closure_threshold_pct
            || signals.active_factors(eye_closure_threshold_pct) >= 2
        {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// One fired alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// 1-based within the session
    pub sequence: u64,
    pub session_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    /// Time since session start (ms)
    pub session_offset_ms: u64,
    pub reason: AlertReason,
    pub severity: Severity,
    pub eye_closure_pct: f64,
    /// Smoothed alertness score at the time (0-100)
    pub alertness: f64,
}

/// End-of-session report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub incident_count: u64,
    pub average_alertness: f64,
    pub max_eye_closure_pct: f64,
    pub incidents: Vec<IncidentRecord>,
}
