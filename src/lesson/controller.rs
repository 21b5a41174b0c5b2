use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use crate::lesson::report::{dedup_materials, final_score, LmsStatus, Report, TOTAL_QUIZ_QUESTIONS};
use crate::lesson::session::{
    new_short_id, CerAnswer, CerField, CerPatch, LearnerIdentity, Observation, SessionState, StarRating,
};
use crate::lesson::stage::Stage;

/// A stage change, reported back so callers can log and count it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: Stage,
    pub to: Stage,
}

/// Owns the session state and is the only writer to it.
/// Every operation is total: invalid input is rejected when the typed
/// values are built, so nothing here returns an error.
#[derive(Debug, Clone, Default)]
pub struct LessonController {
    state: SessionState,
}

impl LessonController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_stage(&self) -> Stage {
        self.state.current_stage
    }

    pub fn learner(&self) -> Option<&LearnerIdentity> {
        self.state.learner.as_ref()
    }

    fn go(&mut self, to: Stage) -> Transition {
        let from = self.state.current_stage;
        self.state.current_stage = to;
        tracing::debug!(from = %from, to = %to, "[Lesson] Stage change");
        Transition { from, to }
    }

    pub fn login(&mut self, identity: LearnerIdentity) -> Transition {
        if let Some(previous) = &self.state.learner {
            tracing::warn!(
                previous = previous.student_id(),
                next = identity.student_id(),
                "[Lesson] Replacing learner identity"
            );
        }
        tracing::info!(student_id = identity.student_id(), "[Lesson] Learner logged in");
        self.state.learner = Some(identity);
        self.go(Stage::Engagement)
    }

    /// Free navigation: any stage, no preconditions
    pub fn navigate_to(&mut self, stage: Stage) -> Transition {
        self.go(stage)
    }

    /// Follow the forward button of the current stage.
    /// On the thank-you screen that button is Restart, which resets the project.
    pub fn advance(&mut self) -> Option<Transition> {
        if self.state.current_stage == Stage::ThankYou {
            return Some(self.reset_project());
        }
        let next = self.state.current_stage.canonical_next()?;
        Some(self.go(next))
    }

    /// Follow the back button of the current stage, if it has one
    pub fn back(&mut self) -> Option<Transition> {
        let previous = self.state.current_stage.canonical_back()?;
        Some(self.go(previous))
    }

    /// Overwrites any earlier score; repeating the quiz replaces the result
    pub fn record_quiz_score(&mut self, score: u32) {
        self.state.quiz_score = score;
    }

    pub fn add_observation(&mut self, note: &str) -> Option<&Observation> {
        let text = note.trim();
        if text.is_empty() {
            return None;
        }
        self.state.observations.push(Observation {
            id: new_short_id(),
            text: text.to_string(),
            timestamp: Utc::now(),
        });
        self.state.observations.last()
    }

    pub fn add_material_tested(&mut self, material: impl Into<String>) {
        self.state.materials_tested.push(material.into());
    }

    pub fn update_cer(&mut self, patch: CerPatch) -> &CerAnswer {
        self.state.cer.apply(patch);
        &self.state.cer
    }

    pub fn insert_sentence_starter(&mut self, field: CerField, text: &str) -> &CerAnswer {
        self.state.cer.append(field, text);
        &self.state.cer
    }

    /// Returns the new running bonus
    pub fn add_collaboration_bonus(&mut self, amount: u32) -> u32 {
        self.state.collaboration_bonus = self.state.collaboration_bonus.saturating_add(amount);
        self.state.collaboration_bonus
    }

    /// Remember a question sent to the tutor. Blank questions are not kept.
    pub fn log_question(&mut self, question: &str) -> bool {
        let question = question.trim();
        if question.is_empty() {
            return false;
        }
        self.state.questions_asked.push(question.to_string());
        true
    }

    /// Snapshot the session into a report. None until someone has logged in.
    pub fn finalize_report(&self, rating: StarRating, comment: &str) -> Option<Report> {
        let learner = self.state.learner.as_ref()?;
        let report = Report {
            id: new_short_id(),
            user_name: learner.name().to_string(),
            student_id: learner.student_id().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            cer: self.state.cer.clone(),
            observations_count: self.state.observations.len(),
            observation_notes: self.state.observations.iter().map(|o| o.text.clone()).collect(),
            questions_asked: self.state.questions_asked.clone(),
            ai_feedback: String::new(),
            lms_status: Some(LmsStatus::Completed),
            score: final_score(self.state.collaboration_bonus),
            quiz_score: self.state.quiz_score,
            total_quiz_questions: TOTAL_QUIZ_QUESTIONS,
            materials_tested: dedup_materials(&self.state.materials_tested),
            collaboration_bonus: self.state.collaboration_bonus,
            star_rating: rating.value(),
            feedback_comment: comment.to_string(),
        };
        tracing::info!(
            student_id = %report.student_id,
            score = report.score,
            quiz_score = report.quiz_score,
            "[Lesson] Report finalized"
        );
        Some(report)
    }

    /// Start the mission over for the same learner
    pub fn reset_project(&mut self) -> Transition {
        let learner = self.state.learner.take();
        self.state = SessionState {
            learner,
            ..SessionState::default()
        };
        tracing::info!("[Lesson] Project reset");
        self.go(Stage::Challenge)
    }
}
