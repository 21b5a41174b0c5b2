//! The lesson flow: stages of the 5E mission, the learner's session data,
//! and the controller that is the only thing allowed to mutate them.

pub mod controller;
pub mod quiz;
pub mod report;
pub mod session;
pub mod stage;

pub use controller::{LessonController, Transition};
pub use quiz::{QuizProgress, QuizRun};
pub use report::Report;
pub use session::{CerAnswer, CerField, CerPatch, LearnerIdentity, Observation, SessionState, StarRating};
pub use stage::Stage;
