//! Event log for series execution
//!
//! Provides an audit trail of a run:
//! - Event: envelope with id + timestamp + kind
//! - EventKind: series-level and step-level variants
//! - EventLog: thread-safe, append-only log
//! - EventEmitter: injection point (EventLog in production, NoopEmitter when unobserved)

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single event in the series execution log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence ID (for ordering)
    pub id: u64,
    /// Time since log creation (ms)
    pub timestamp_ms: u64,
    /// Event type and data
    pub kind: EventKind,
}

/// All possible event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // SERIES LEVEL
    // ═══════════════════════════════════════════
    SeriesStarted {
        step_count: usize,
    },
    SeriesCompleted {
        step_count: usize,
        total_duration_ms: u64,
    },
    SeriesFailed {
        failed_index: usize,
        error: String,
    },

    // ═══════════════════════════════════════════
    // STEP LEVEL
    // ═══════════════════════════════════════════
    /// Producer for this position has just been invoked
    StepStarted {
        index: usize,
    },
    StepCompleted {
        index: usize,
        duration_ms: u64,
    },
    StepFailed {
        index: usize,
        error: String,
        duration_ms: u64,
    },
}

impl EventKind {
    /// Extract the step index if event is step-related
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::StepStarted { index }
            | Self::StepCompleted { index, .. }
            | Self::StepFailed { index, .. } => Some(*index),
            Self::SeriesStarted { .. }
            | Self::SeriesCompleted { .. }
            | Self::SeriesFailed { .. } => None,
        }
    }

    /// Check if this is a series-level event
    pub fn is_series_event(&self) -> bool {
        self.step_index().is_none()
    }
}

/// Trait for emitting events during series execution
pub trait EventEmitter: Send + Sync {
    /// Emit an event and return its ID
    fn emit(&self, kind: EventKind) -> u64;
}

/// Thread-safe, append-only event log
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<Vec<Event>>>,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    /// Create a new event log (call at series start)
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event (thread-safe, returns event ID)
    pub fn emit(&self, kind: EventKind) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            kind,
        };

        self.events.write().push(event);
        id
    }

    /// Get all events (cloned)
    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// Events belonging to one step position
    pub fn filter_step(&self, index: usize) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind.step_index() == Some(index))
            .collect()
    }

    /// Filter series-level events only
    pub fn series_events(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind.is_series_event())
            .collect()
    }

    /// Serialize to JSON for persistence/debugging
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.events()).unwrap_or(Value::Null)
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .finish()
    }
}

impl EventEmitter for EventLog {
    fn emit(&self, kind: EventKind) -> u64 {
        EventLog::emit(self, kind)
    }
}

/// No-op emitter (always returns 0)
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl EventEmitter for NoopEmitter {
    fn emit(&self, _kind: EventKind) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ═══════════════════════════════════════════════════════════════
    // EventKind tests
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn eventkind_step_index_extraction() {
        assert_eq!(EventKind::StepStarted { index: 2 }.step_index(), Some(2));
        assert_eq!(
            EventKind::SeriesStarted { step_count: 5 }.step_index(),
            None
        );
    }

    #[test]
    fn eventkind_is_series_event() {
        assert!(EventKind::SeriesStarted { step_count: 3 }.is_series_event());
        assert!(EventKind::SeriesFailed {
            failed_index: 1,
            error: "boom".to_string(),
        }
        .is_series_event());
        assert!(!EventKind::StepCompleted {
            index: 0,
            duration_ms: 4,
        }
        .is_series_event());
    }

    #[test]
    fn eventkind_serializes_with_type_tag() {
        let kind = EventKind::StepFailed {
            index: 1,
            error: "E".to_string(),
            duration_ms: 12,
        };

        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "step_failed");
        assert_eq!(json["index"], 1);
        assert_eq!(json["error"], "E");
    }

    #[test]
    fn eventkind_deserializes_from_tagged_json() {
        let kind: EventKind = serde_json::from_value(json!({
            "type": "series_completed",
            "step_count": 3,
            "total_duration_ms": 40
        }))
        .unwrap();
        assert_eq!(
            kind,
            EventKind::SeriesCompleted {
                step_count: 3,
                total_duration_ms: 40,
            }
        );
    }

    // ═══════════════════════════════════════════════════════════════
    // EventLog tests
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn eventlog_ids_are_monotonic() {
        let log = EventLog::new();
        assert!(log.is_empty());

        let a = log.emit(EventKind::SeriesStarted { step_count: 1 });
        let b = log.emit(EventKind::StepStarted { index: 0 });
        assert_eq!((a, b), (0, 1));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn eventlog_filters_by_step_and_series() {
        let log = EventLog::new();
        log.emit(EventKind::SeriesStarted { step_count: 2 });
        log.emit(EventKind::StepStarted { index: 0 });
        log.emit(EventKind::StepCompleted {
            index: 0,
            duration_ms: 1,
        });
        log.emit(EventKind::StepStarted { index: 1 });

        assert_eq!(log.filter_step(0).len(), 2);
        assert_eq!(log.filter_step(1).len(), 1);
        assert_eq!(log.series_events().len(), 1);
    }

    #[test]
    fn eventlog_clones_share_storage() {
        let log = EventLog::new();
        let clone = log.clone();
        clone.emit(EventKind::StepStarted { index: 0 });
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn eventlog_to_json_is_array() {
        let log = EventLog::new();
        log.emit(EventKind::SeriesStarted { step_count: 0 });
        let json = log.to_json();
        assert_eq!(json[0]["kind"]["type"], "series_started");
    }

    #[test]
    fn emitter_trait_is_object_safe() {
        fn accepts_emitter(_: &dyn EventEmitter) {}

        accepts_emitter(&EventLog::new());
        accepts_emitter(&NoopEmitter::new());
    }

    #[test]
    fn noop_emitter_returns_zero() {
        let noop = NoopEmitter::new();
        assert_eq!(noop.emit(EventKind::StepStarted { index: 7 }), 0);
    }
}
