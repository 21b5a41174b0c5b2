use std::path::PathBuf;
use std::sync::Arc;
use tauri::{Emitter, State};
use crate::analytics::AnalyticsPayload;
use crate::integrations::forum::ForumQuestion;
use crate::integrations::lms::{scorm_manifest, AnnouncedHost, ScormCall, ScormSink, ScormVersion};
use crate::integrations::tutor::SpeechClip;
use crate::lesson::quiz::{engagement_questions, QuizProgress, QuizQuestion};
use crate::lesson::report::Report;
use crate::lesson::session::{CerAnswer, CerField, CerPatch, Observation, SessionState};
use crate::lesson::stage::{visible_menu, Stage};
use crate::lesson::Transition;
use crate::metrics::MetricsSnapshot;
use crate::simulation::{FrameSnapshot, Material};
use crate::state::app::{AppState, ReplyOutcome, SubmissionOutcome};

type AppHandle<'a> = State<'a, Arc<AppState>>;

#[tauri::command]
pub fn get_session(state: AppHandle<'_>) -> SessionState {
    state.session()
}

#[tauri::command]
pub fn get_menu(state: AppHandle<'_>) -> Vec<Stage> {
    visible_menu(state.lesson.read().state().is_logged_in())
}

#[tauri::command]
pub fn login(state: AppHandle<'_>, name: String, student_id: String) -> Result<Transition, String> {
    state.login(&name, &student_id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn navigate_to(state: AppHandle<'_>, stage: Stage) -> Transition {
    state.navigate_to(stage)
}

#[tauri::command]
pub fn advance(state: AppHandle<'_>) -> Option<Transition> {
    state.advance()
}

#[tauri::command]
pub fn go_back(state: AppHandle<'_>) -> Option<Transition> {
    state.back()
}

#[tauri::command]
pub fn reset_project(state: AppHandle<'_>) -> Transition {
    state.reset_project()
}

#[tauri::command]
pub fn get_quiz() -> Vec<QuizQuestion> {
    engagement_questions()
}

#[tauri::command]
pub fn quiz_select(state: AppHandle<'_>, option_id: String) {
    state.quiz_select(&option_id)
}

#[tauri::command]
pub fn quiz_reveal(state: AppHandle<'_>) -> Option<bool> {
    state.quiz_reveal()
}

#[tauri::command]
pub fn quiz_next(state: AppHandle<'_>) -> QuizProgress {
    state.quiz_next()
}

#[tauri::command]
pub fn add_observation(state: AppHandle<'_>, note: String) -> Option<Observation> {
    state.add_observation(&note)
}

#[tauri::command]
pub fn update_cer(state: AppHandle<'_>, patch: CerPatch) -> CerAnswer {
    state.update_cer(patch)
}

#[tauri::command]
pub fn insert_sentence_starter(state: AppHandle<'_>, field: CerField, text: String) -> CerAnswer {
    state.insert_sentence_starter(field, &text)
}

// Async so the frame loop is spawned on the runtime
#[tauri::command]
pub async fn start_simulation(state: AppHandle<'_>) -> Result<FrameSnapshot, String> {
    Ok(state.start_simulation())
}

#[tauri::command]
pub fn stop_simulation(state: AppHandle<'_>) {
    state.stop_simulation()
}

#[tauri::command]
pub fn select_material(state: AppHandle<'_>, material: String) -> Result<FrameSnapshot, String> {
    let material: Material = material.parse().map_err(|e: crate::error::ValidationError| e.to_string())?;
    state.select_material(material).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_coil_turns(state: AppHandle<'_>, turns: u32) -> Result<FrameSnapshot, String> {
    state.set_coil_turns(turns).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_coil_current(state: AppHandle<'_>, current: u32) -> Result<FrameSnapshot, String> {
    state.set_coil_current(current).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_simulation_frame(state: AppHandle<'_>) -> Result<FrameSnapshot, String> {
    state.simulation_frame().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn ask_tutor(state: AppHandle<'_>, question: String) -> Result<String, String> {
    Ok(state.ask_tutor(&question).await)
}

#[tauri::command]
pub async fn speak(state: AppHandle<'_>, text: String) -> Result<Option<SpeechClip>, String> {
    Ok(state.speak(&text).await)
}

#[tauri::command]
pub async fn get_sentence_starters(state: AppHandle<'_>) -> Result<Vec<String>, String> {
    Ok(state.sentence_starters().await)
}

#[tauri::command]
pub async fn evaluate_reasoning(state: AppHandle<'_>) -> Result<String, String> {
    Ok(state.evaluate_reasoning().await)
}

#[tauri::command]
pub async fn get_forum(state: AppHandle<'_>) -> Result<Vec<ForumQuestion>, String> {
    state.forum_questions().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn post_forum_question(state: AppHandle<'_>, text: String) -> Result<Option<ForumQuestion>, String> {
    state.post_forum_question(&text).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn reply_to_forum(
    state: AppHandle<'_>,
    question_id: String,
    text: String,
) -> Result<Option<ReplyOutcome>, String> {
    state.reply_to_forum(&question_id, &text).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn submit_final_report(
    state: AppHandle<'_>,
    rating: u8,
    comment: String,
) -> Result<Option<SubmissionOutcome>, String> {
    state.submit_final_report(rating, &comment).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub fn unlock_admin(state: AppHandle<'_>, passcode: String) -> bool {
    state.unlock_admin(&passcode)
}

#[tauri::command]
pub async fn list_reports(state: AppHandle<'_>, search: Option<String>) -> Result<Vec<Report>, String> {
    state
        .list_reports(search.as_deref().unwrap_or_default())
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_analytics(state: AppHandle<'_>) -> Result<AnalyticsPayload, String> {
    state.analytics().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn clear_reports(state: AppHandle<'_>) -> Result<(), String> {
    state.clear_reports().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn import_sheets(state: AppHandle<'_>, paths: Vec<PathBuf>) -> Result<(usize, usize), String> {
    state.import_sheets(&paths).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn export_sheet(state: AppHandle<'_>, dir: PathBuf) -> Result<PathBuf, String> {
    state.export_sheet(dir).await.map_err(|e| e.to_string())
}

pub const SCORM_CALL_EVENT: &str = "scorm-call";

/// Sends adapter calls to the webview, which runs them on the adapter it found
pub struct WebviewScormSink {
    app: tauri::AppHandle,
}

impl WebviewScormSink {
    pub fn new(app: tauri::AppHandle) -> Self {
        WebviewScormSink { app }
    }
}

impl ScormSink for WebviewScormSink {
    fn send(&self, call: ScormCall) -> bool {
        match self.app.emit(SCORM_CALL_EVENT, call) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to forward LMS call to webview");
                false
            }
        }
    }
}

/// Called by the page on mount with the adapter it found, if any
#[tauri::command]
pub fn attach_lms(state: AppHandle<'_>, host: State<'_, Arc<AnnouncedHost>>, version: Option<ScormVersion>) -> bool {
    host.announce(version);
    state.connect_lms()
}

#[tauri::command]
pub fn get_scorm_manifest(title: String) -> String {
    scorm_manifest(&title)
}

#[tauri::command]
pub fn get_metrics(state: AppHandle<'_>) -> MetricsSnapshot {
    state.metrics.snapshot()
}
