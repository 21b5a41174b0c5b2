//! Everything outside the lesson itself: durable storage, the LMS, cloud
//! sync, the AI tutor, spreadsheet interchange and the peer forum.
//! Failures here are logged and degrade to fallbacks; they never block the lesson.

pub mod cloud_sync;
pub mod forum;
pub mod http;
pub mod lms;
pub mod report_store;
pub mod spreadsheet;
pub mod tutor;

pub use cloud_sync::CloudSync;
pub use forum::{ForumQuestion, ForumReply, ForumStore};
pub use lms::{AnnouncedHost, ApiHost, LmsBridge, NoLms, ScormApi, ScormBridge, ScormCall, ScormSink, ScormVersion};
pub use report_store::ReportStore;
pub use tutor::GeminiTutor;
