use std::time::Instant;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use crate::error::PhyemError;
use crate::integrations::http::http_client;
use crate::lesson::report::Report;
use crate::logging::log_collaborator_call;
use crate::metrics::Metrics;

const COLLABORATOR: &str = "cloud_sync";
const SYNC_TIMEOUT_SECS: u64 = 20;

/// Best-effort push of finished reports to a spreadsheet web app
#[derive(Debug, Clone)]
pub struct CloudSync {
    url: Option<String>,
    metrics: Metrics,
}

impl CloudSync {
    pub fn new(url: Option<String>, metrics: Metrics) -> Self {
        CloudSync { url, metrics }
    }

    /// Configured and not the template placeholder
    pub fn endpoint(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && !url.contains("placeholder"))
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint().is_some()
    }

    /// Request body: the report fields plus `"action": "submit_report"`
    pub fn payload(report: &Report) -> Result<Value, PhyemError> {
        let mut body = serde_json::to_value(report)?;
        if let Value::Object(map) = &mut body {
            map.insert("action".to_string(), Value::String("submit_report".to_string()));
        }
        Ok(body)
    }

    /// Returns Ok(false) without touching the network when sync is not configured
    pub async fn submit(&self, report: &Report) -> Result<bool, PhyemError> {
        let Some(url) = self.endpoint() else {
            tracing::warn!("Cloud sync URL is not configured, report saved locally only");
            return Ok(false);
        };

        let body = Self::payload(report)?;
        let start = Instant::now();
        let result = http_client()
            .post(url)
            .timeout(Duration::from_secs(SYNC_TIMEOUT_SECS))
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status());
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => {
                log_collaborator_call(COLLABORATOR, true, Some(latency_ms));
                tracing::info!(user_name = %report.user_name, "Cloud sync completed");
                Ok(true)
            }
            Err(e) => {
                log_collaborator_call(COLLABORATOR, false, Some(latency_ms));
                self.metrics.record_collaborator_failure();
                Err(PhyemError::from(e).with_collaborator(COLLABORATOR))
            }
        }
    }

    /// Fire and forget. Failures are logged and never reach the learner.
    pub fn spawn(&self, report: Report) -> Option<JoinHandle<()>> {
        if !self.is_enabled() {
            tracing::warn!("Cloud sync URL is not configured, report saved locally only");
            return None;
        }
        let sync = self.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = sync.submit(&report).await {
                tracing::error!(error = %e, report_id = %report.id, "Cloud sync failed");
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::session::CerAnswer;

    fn report() -> Report {
        Report {
            id: "abc".into(),
            user_name: "Ann".into(),
            student_id: "S1".into(),
            timestamp: "2026-01-01T00:00:00.000Z".into(),
            cer: CerAnswer::default(),
            observations_count: 0,
            observation_notes: vec![],
            questions_asked: vec![],
            ai_feedback: String::new(),
            lms_status: None,
            score: 100,
            quiz_score: 3,
            total_quiz_questions: 5,
            materials_tested: vec![],
            collaboration_bonus: 0,
            star_rating: 5,
            feedback_comment: String::new(),
        }
    }

    #[test]
    fn placeholder_and_blank_urls_disable_sync() {
        let metrics = Metrics::new();
        assert!(!CloudSync::new(None, metrics.clone()).is_enabled());
        assert!(!CloudSync::new(Some("  ".into()), metrics.clone()).is_enabled());
        assert!(!CloudSync::new(Some("https://script.google.com/placeholder".into()), metrics.clone()).is_enabled());
        assert!(CloudSync::new(Some("https://script.google.com/macros/s/x/exec".into()), metrics).is_enabled());
    }

    #[test]
    fn payload_carries_action_and_camel_case_fields() {
        let body = CloudSync::payload(&report()).unwrap();
        assert_eq!(body["action"], "submit_report");
        assert_eq!(body["userName"], "Ann");
        assert_eq!(body["quizScore"], 3);
    }

    #[tokio::test]
    async fn disabled_sync_is_a_no_op() {
        let sync = CloudSync::new(None, Metrics::new());
        assert!(!sync.submit(&report()).await.unwrap());
        assert!(sync.spawn(report()).is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_counts_a_failure() {
        let metrics = Metrics::new();
        let sync = CloudSync::new(Some("http://127.0.0.1:9/exec".into()), metrics.clone());
        let err = sync.submit(&report()).await.unwrap_err();
        assert_eq!(err.collaborator.as_deref(), Some("cloud_sync"));
        assert_eq!(metrics.snapshot().collaborator_failures, 1);
    }
}
