//! Per-resource event gate.
//!
//! The controller's own status and metadata patches come back as watch
//! events. The gate remembers which generation of each resource has been
//! handled (and when a transient failure may be retried) so those echoes do
//! not re-run reconciliation or cut the retry delay short.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// What to do with an incoming event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Reconcile now
    Run,
    /// Already handled; wait for the next change
    Skip,
    /// Retry pending; check again after the remaining delay
    Wait(Duration),
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    generation: Option<i64>,
    retry_at: Option<Instant>,
}

/// Handled generations, keyed by `namespace/name`
#[derive(Debug, Default)]
pub struct EventGate {
    marks: Mutex<HashMap<String, Mark>>,
}

impl EventGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn marks(&self) -> std::sync::MutexGuard<'_, HashMap<String, Mark>> {
        // A poisoned map only holds plain data; keep using it
        self.marks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn check(&self, key: &str, generation: Option<i64>) -> GateDecision {
        self.check_at(key, generation, Instant::now())
    }

    pub fn check_at(&self, key: &str, generation: Option<i64>, now: Instant) -> GateDecision {
        let Some(mark) = self.marks().get(key).copied() else {
            return GateDecision::Run;
        };
        if mark.generation != generation {
            return GateDecision::Run;
        }
        match mark.retry_at {
            None => GateDecision::Skip,
            Some(at) if now >= at => GateDecision::Run,
            Some(at) => GateDecision::Wait(at - now),
        }
    }

    /// Mark `generation` as handled, optionally with a pending retry
    pub fn record(&self, key: &str, generation: Option<i64>, retry_after: Option<Duration>) {
        self.record_at(key, generation, retry_after, Instant::now());
    }

    pub fn record_at(&self, key: &str, generation: Option<i64>, retry_after: Option<Duration>, now: Instant) {
        let mark = Mark {
            generation,
            retry_at: retry_after.map(|after| now + after),
        };
        self.marks().insert(key.to_string(), mark);
    }

    /// Drop state for a resource that is gone
    pub fn forget(&self, key: &str) {
        self.marks().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_resource_runs() {
        let gate = EventGate::new();
        assert_eq!(gate.check("default/r", Some(1)), GateDecision::Run);
    }

    #[test]
    fn test_same_generation_is_skipped() {
        let gate = EventGate::new();
        gate.record("default/r", Some(1), None);
        assert_eq!(gate.check("default/r", Some(1)), GateDecision::Skip);
        assert_eq!(gate.check("default/r", Some(2)), GateDecision::Run);
        assert_eq!(gate.check("other/r", Some(1)), GateDecision::Run);
    }

    #[test]
    fn test_pending_retry_waits_then_runs() {
        let gate = EventGate::new();
        let start = Instant::now();
        gate.record_at("default/r", Some(3), Some(Duration::from_secs(60)), start);

        assert_eq!(
            gate.check_at("default/r", Some(3), start + Duration::from_secs(20)),
            GateDecision::Wait(Duration::from_secs(40))
        );
        assert_eq!(gate.check_at("default/r", Some(3), start + Duration::from_secs(60)), GateDecision::Run);
        // A spec change does not wait for the retry
        assert_eq!(gate.check_at("default/r", Some(4), start), GateDecision::Run);
    }

    #[test]
    fn test_forget() {
        let gate = EventGate::new();
        gate.record("default/r", Some(1), None);
        gate.forget("default/r");
        assert_eq!(gate.check("default/r", Some(1)), GateDecision::Run);
    }
}
