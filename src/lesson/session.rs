use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::error::ValidationError;
use crate::lesson::stage::Stage;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Nine-character base36 identifier for observations, reports and forum posts
pub fn new_short_id() -> String {
    let mut rng = rand::thread_rng();
    (0..9)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Who is taking the lesson. Both parts are non-empty once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerIdentity {
    name: String,
    student_id: String,
}

impl LearnerIdentity {
    pub fn new(name: impl Into<String>, student_id: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        let student_id = student_id.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if student_id.is_empty() {
            return Err(ValidationError::EmptyStudentId);
        }
        Ok(LearnerIdentity { name, student_id })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }
}

/// A note taken while watching the experiment video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Claim-Evidence-Reasoning answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CerAnswer {
    pub claim: String,
    pub evidence: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CerField {
    Claim,
    Evidence,
    Reasoning,
}

/// Partial CER edit; only the `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CerPatch {
    pub claim: Option<String>,
    pub evidence: Option<String>,
    pub reasoning: Option<String>,
}

impl CerAnswer {
    pub fn apply(&mut self, patch: CerPatch) {
        if let Some(claim) = patch.claim {
            self.claim = claim;
        }
        if let Some(evidence) = patch.evidence {
            self.evidence = evidence;
        }
        if let Some(reasoning) = patch.reasoning {
            self.reasoning = reasoning;
        }
    }

    pub fn field_mut(&mut self, field: CerField) -> &mut String {
        match field {
            CerField::Claim => &mut self.claim,
            CerField::Evidence => &mut self.evidence,
            CerField::Reasoning => &mut self.reasoning,
        }
    }

    /// Insert a sentence starter after whatever the learner already wrote
    pub fn append(&mut self, field: CerField, text: &str) {
        let target = self.field_mut(field);
        if !target.is_empty() {
            target.push(' ');
        }
        target.push_str(text);
    }
}

/// Satisfaction rating given on the final screen, 1 to 5 stars
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct StarRating(u8);

impl StarRating {
    pub fn new(stars: u8) -> Result<Self, ValidationError> {
        if (1..=5).contains(&stars) {
            Ok(StarRating(stars))
        } else {
            Err(ValidationError::RatingOutOfRange(stars))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Everything accumulated during one learner's run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub current_stage: Stage,
    pub learner: Option<LearnerIdentity>,
    pub observations: Vec<Observation>,
    pub cer: CerAnswer,
    pub quiz_score: u32,
    pub materials_tested: Vec<String>,
    pub collaboration_bonus: u32,
    pub questions_asked: Vec<String>,
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        self.learner.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_requires_name_and_id() {
        assert_eq!(LearnerIdentity::new("  ", "S1"), Err(ValidationError::EmptyName));
        assert_eq!(LearnerIdentity::new("Ann", ""), Err(ValidationError::EmptyStudentId));
        let who = LearnerIdentity::new(" Ann ", " S1 ").unwrap();
        assert_eq!(who.name(), "Ann");
        assert_eq!(who.student_id(), "S1");
    }

    #[test]
    fn star_rating_bounds() {
        assert!(StarRating::new(0).is_err());
        assert!(StarRating::new(6).is_err());
        assert_eq!(StarRating::new(5).unwrap().value(), 5);
    }

    #[test]
    fn cer_patch_merges_only_given_fields() {
        let mut cer = CerAnswer {
            claim: "c".into(),
            evidence: "e".into(),
            reasoning: "r".into(),
        };
        cer.apply(CerPatch { evidence: Some("new".into()), ..Default::default() });
        assert_eq!(cer.claim, "c");
        assert_eq!(cer.evidence, "new");
        assert_eq!(cer.reasoning, "r");
    }

    #[test]
    fn sentence_starter_is_appended_with_space() {
        let mut cer = CerAnswer::default();
        cer.append(CerField::Reasoning, "สาเหตุที่ไข่ไม่สุกเนื่องจาก...");
        cer.append(CerField::Reasoning, "eddy current");
        assert_eq!(cer.reasoning, "สาเหตุที่ไข่ไม่สุกเนื่องจาก... eddy current");
    }

    #[test]
    fn short_ids_are_nine_base36_chars() {
        let id = new_short_id();
        assert_eq!(id.len(), 9);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }
}
