use crate::domain::model::{Outcome, OutcomeSubject};
use crate::domain::ports::OutcomeLog;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Emits every outcome as a tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOutcomeLog;

impl OutcomeLog for TracingOutcomeLog {
    fn log_success(&self, key: &str, subject: OutcomeSubject) {
        tracing::info!(outcome = "success", key, %subject, "✅ {}", key);
    }

    fn log_failure(&self, key: &str, subject: OutcomeSubject) {
        tracing::warn!(outcome = "failure", key, %subject, "❌ {}", key);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Keeps outcomes in emission order.
#[derive(Debug, Default)]
pub struct MemoryOutcomeLog {
    outcomes: Mutex<Vec<Outcome>>,
}

impl MemoryOutcomeLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Outcome>> {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.entries().clone()
    }

    /// `(key, success)` pairs in emission order.
    pub fn keys(&self) -> Vec<(String, bool)> {
        self.entries()
            .iter()
            .map(|o| (o.key.clone(), o.success))
            .collect()
    }

    pub fn failures(&self) -> Vec<Outcome> {
        self.entries().iter().filter(|o| !o.success).cloned().collect()
    }

    pub fn summary(&self) -> OutcomeSummary {
        let entries = self.entries();
        let succeeded = entries.iter().filter(|o| o.success).count();
        OutcomeSummary {
            succeeded,
            failed: entries.len() - succeeded,
        }
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

impl OutcomeLog for MemoryOutcomeLog {
    fn log_success(&self, key: &str, subject: OutcomeSubject) {
        self.entries().push(Outcome::new(key, subject, true));
    }

    fn log_failure(&self, key: &str, subject: OutcomeSubject) {
        self.entries().push(Outcome::new(key, subject, false));
    }
}

/// Forwards each outcome to several logs.
#[derive(Clone, Default)]
pub struct FanoutOutcomeLog {
    sinks: Vec<Arc<dyn OutcomeLog>>,
}

impl FanoutOutcomeLog {
    pub fn new(sinks: Vec<Arc<dyn OutcomeLog>>) -> Self {
        Self { sinks }
    }
}

impl OutcomeLog for FanoutOutcomeLog {
    fn log_success(&self, key: &str, subject: OutcomeSubject) {
        for sink in &self.sinks {
            sink.log_success(key, subject.clone());
        }
    }

    fn log_failure(&self, key: &str, subject: OutcomeSubject) {
        for sink in &self.sinks {
            sink.log_failure(key, subject.clone());
        }
    }
}
