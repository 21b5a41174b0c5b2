use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Prometheus-style counters for observability.
/// Cloning shares the same counters.
#[derive(Clone, Default, Debug)]
pub struct Metrics {
    /// Lesson stage transitions (navigation, next, reset)
    pub stage_transitions: Arc<AtomicU64>,
    /// Reports produced by finalize
    pub reports_finalized: Arc<AtomicU64>,
    /// Failed calls to external collaborators
    pub collaborator_failures: Arc<AtomicU64>,
    /// Requests sent to the AI tutor
    pub tutor_requests: Arc<AtomicU64>,
    /// Frames advanced by simulation loops
    pub frames_simulated: Arc<AtomicU64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_stage_transition(&self) {
        self.stage_transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report_finalized(&self) {
        self.reports_finalized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_collaborator_failure(&self) {
        self.collaborator_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tutor_request(&self) {
        self.tutor_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame(&self) {
        self.frames_simulated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            stage_transitions: self.stage_transitions.load(Ordering::Relaxed),
            reports_finalized: self.reports_finalized.load(Ordering::Relaxed),
            collaborator_failures: self.collaborator_failures.load(Ordering::Relaxed),
            tutor_requests: self.tutor_requests.load(Ordering::Relaxed),
            frames_simulated: self.frames_simulated.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub stage_transitions: u64,
    pub reports_finalized: u64,
    pub collaborator_failures: u64,
    pub tutor_requests: u64,
    pub frames_simulated: u64,
}
