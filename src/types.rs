//! Core types and structures for handle-sniper

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome category recorded for a probed candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Taken,
    Free,
    Indeterminate,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Taken => write!(f, "taken"),
            Classification::Free => write!(f, "free"),
            Classification::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

/// Why a probe could not be classified as taken or free
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum IndeterminateReason {
    /// The oracle answered with a status outside {200, 404}
    UnexpectedStatus(u16),
    /// The oracle answered 429; kept distinct so operators can widen delays
    RateLimited,
    /// The per-call timeout elapsed
    Timeout,
    /// Connection-level failure
    Transport(String),
}

impl IndeterminateReason {
    /// Raw status code, if the oracle produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            IndeterminateReason::UnexpectedStatus(code) => Some(*code),
            IndeterminateReason::RateLimited => Some(429),
            IndeterminateReason::Timeout | IndeterminateReason::Transport(_) => None,
        }
    }
}

impl std::fmt::Display for IndeterminateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndeterminateReason::UnexpectedStatus(code) => write!(f, "unexpected status {}", code),
            IndeterminateReason::RateLimited => write!(f, "rate limited (429)"),
            IndeterminateReason::Timeout => write!(f, "timeout"),
            IndeterminateReason::Transport(msg) => write!(f, "transport failure: {}", msg),
        }
    }
}

/// Result of probing one candidate against the oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Taken(u16),
    Free(u16),
    Indeterminate(IndeterminateReason),
}

impl ProbeOutcome {
    pub fn classification(&self) -> Classification {
        match self {
            ProbeOutcome::Taken(_) => Classification::Taken,
            ProbeOutcome::Free(_) => Classification::Free,
            ProbeOutcome::Indeterminate(_) => Classification::Indeterminate,
        }
    }

    /// Raw status code returned by the oracle, if any
    pub fn raw_status(&self) -> Option<u16> {
        match self {
            ProbeOutcome::Taken(code) | ProbeOutcome::Free(code) => Some(*code),
            ProbeOutcome::Indeterminate(reason) => reason.status(),
        }
    }
}

/// One durable line of output: a candidate and what the oracle said about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub candidate: String,
    pub classification: Classification,
    pub status: Option<u16>,
    pub reason: Option<String>,
    pub checked_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ProbeRecord {
    pub fn new(candidate: impl Into<String>, outcome: &ProbeOutcome, duration: Duration) -> Self {
        let reason = match outcome {
            ProbeOutcome::Indeterminate(reason) => Some(reason.to_string()),
            _ => None,
        };

        Self {
            candidate: candidate.into(),
            classification: outcome.classification(),
            status: outcome.raw_status(),
            reason,
            checked_at: Utc::now(),
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Status code when present, otherwise the indeterminate reason
    pub fn detail(&self) -> String {
        match (self.status, &self.reason) {
            (Some(code), _) => code.to_string(),
            (None, Some(reason)) => reason.clone(),
            (None, None) => "-".to_string(),
        }
    }
}

/// Point-in-time view of a running scan
#[derive(Debug, Clone, Default)]
pub struct ProgressSnapshot {
    pub issued: u64,
    pub completed: u64,
    pub total: u64,
    pub taken: u64,
    pub free: u64,
    pub indeterminate: u64,
    pub sink_failures: u64,
    pub elapsed: Duration,
    pub probes_per_second: f64,
    pub estimated_remaining: Option<Duration>,
}

impl ProgressSnapshot {
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.completed as f64 / self.total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        assert_eq!(ProbeOutcome::Taken(200).classification(), Classification::Taken);
        assert_eq!(ProbeOutcome::Free(404).classification(), Classification::Free);
        assert_eq!(
            ProbeOutcome::Indeterminate(IndeterminateReason::Timeout).classification(),
            Classification::Indeterminate
        );
    }

    #[test]
    fn test_raw_status_preserved_for_unexpected_response() {
        let outcome = ProbeOutcome::Indeterminate(IndeterminateReason::UnexpectedStatus(503));
        assert_eq!(outcome.raw_status(), Some(503));

        let record = ProbeRecord::new("ab", &outcome, Duration::from_millis(12));
        assert_eq!(record.status, Some(503));
        assert_eq!(record.reason.as_deref(), Some("unexpected status 503"));
        assert_eq!(record.duration_ms, 12);
    }

    #[test]
    fn test_record_detail_falls_back_to_reason() {
        let outcome = ProbeOutcome::Indeterminate(IndeterminateReason::Transport("reset".into()));
        let record = ProbeRecord::new("bb", &outcome, Duration::ZERO);
        assert_eq!(record.detail(), "transport failure: reset");
    }

    #[test]
    fn test_classification_serializes_lowercase() {
        let json = serde_json::to_string(&Classification::Indeterminate).unwrap();
        assert_eq!(json, "\"indeterminate\"");
    }
}
