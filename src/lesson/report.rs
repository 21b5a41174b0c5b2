use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::lesson::session::CerAnswer;

/// Score every completed mission starts from
pub const BASE_MISSION_SCORE: u32 = 100;
/// Questions in the Engagement quiz
pub const TOTAL_QUIZ_QUESTIONS: u32 = 5;
/// Bonus granted for each reply to a peer's question
pub const COLLABORATION_REPLY_BONUS: u32 = 2;

/// Final mission score. Quiz results and observations are reported but do not count.
pub fn final_score(collaboration_bonus: u32) -> u32 {
    BASE_MISSION_SCORE.saturating_add(collaboration_bonus)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LmsStatus {
    Completed,
    Incomplete,
}

/// End-of-session snapshot of one learner. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub user_name: String,
    pub student_id: String,
    /// RFC 3339 when produced here; imported rows may carry other formats
    pub timestamp: String,
    pub cer: CerAnswer,
    pub observations_count: usize,
    #[serde(default)]
    pub observation_notes: Vec<String>,
    #[serde(default)]
    pub questions_asked: Vec<String>,
    #[serde(default)]
    pub ai_feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lms_status: Option<LmsStatus>,
    pub score: u32,
    pub quiz_score: u32,
    pub total_quiz_questions: u32,
    pub materials_tested: Vec<String>,
    pub collaboration_bonus: u32,
    pub star_rating: u8,
    pub feedback_comment: String,
}

impl Report {
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Newest first; unparsable timestamps sink to the end
pub fn sort_newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| b.timestamp_utc().cmp(&a.timestamp_utc()));
}

/// Set semantics with first-seen order
pub fn dedup_materials(materials: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    materials
        .iter()
        .filter(|m| seen.insert(m.as_str()))
        .cloned()
        .collect()
}
