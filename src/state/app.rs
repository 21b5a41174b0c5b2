use std::path::PathBuf;
use std::sync::Arc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use crate::analytics::{compute_analytics, filter_reports, AnalyticsPayload};
use crate::config::settings::AppConfig;
use crate::error::PhyemError;
use crate::integrations::forum::{ForumQuestion, ForumReply, ForumStore, LEARNER_AUTHOR};
use crate::integrations::lms::{ApiHost, LmsBridge, NoLms, ScormBridge};
use crate::integrations::spreadsheet;
use crate::integrations::tutor::SpeechClip;
use crate::integrations::{CloudSync, GeminiTutor, ReportStore};
use crate::lesson::quiz::{QuizProgress, QuizRun};
use crate::lesson::report::{Report, COLLABORATION_REPLY_BONUS};
use crate::lesson::session::{CerAnswer, CerField, CerPatch, LearnerIdentity, Observation, SessionState, StarRating};
use crate::lesson::stage::Stage;
use crate::lesson::{LessonController, Transition};
use crate::metrics::Metrics;
use crate::simulation::{FrameSnapshot, Material, SimulationHandle};

/// What the learner sees after submitting the final survey
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub report: Report,
    pub stored: bool,
    pub lms_reported: bool,
    pub cloud_sync_started: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyOutcome {
    pub reply: ForumReply,
    pub collaboration_bonus: u32,
}

/// Application-wide state container.
/// Lesson state sits behind one lock and changes synchronously; only the
/// collaborators below do I/O.
#[derive(Clone)]
pub struct AppState {
    pub lesson: Arc<RwLock<LessonController>>,
    pub quiz: Arc<RwLock<QuizRun>>,
    /// Mounted while the Virtual Lab is on screen
    pub simulation: Arc<Mutex<Option<SimulationHandle>>>,
    pub admin_unlocked: Arc<RwLock<bool>>,
    pub config: Arc<AppConfig>,
    pub metrics: Metrics,
    pub reports: Arc<ReportStore>,
    pub forum: Arc<ForumStore>,
    pub tutor: Arc<GeminiTutor>,
    pub cloud_sync: CloudSync,
    pub lms: Arc<dyn LmsBridge>,
}

impl AppState {
    /// State with stores in the app data directory
    pub fn new(config: AppConfig) -> Self {
        Self::with_paths(config, crate::paths::reports_path(), crate::paths::forum_path())
    }

    pub fn with_paths(config: AppConfig, reports_path: PathBuf, forum_path: PathBuf) -> Self {
        let metrics = Metrics::new();
        AppState {
            lesson: Arc::new(RwLock::new(LessonController::new())),
            quiz: Arc::new(RwLock::new(QuizRun::new())),
            simulation: Arc::new(Mutex::new(None)),
            admin_unlocked: Arc::new(RwLock::new(false)),
            metrics: metrics.clone(),
            reports: Arc::new(ReportStore::new(reports_path)),
            forum: Arc::new(ForumStore::new(forum_path)),
            tutor: Arc::new(GeminiTutor::new(config.tutor.clone(), metrics.clone())),
            cloud_sync: CloudSync::new(config.cloud_sync_url.clone(), metrics),
            lms: Arc::new(NoLms),
            config: Arc::new(config),
        }
    }

    pub fn with_lms(mut self, lms: Arc<dyn LmsBridge>) -> Self {
        self.lms = lms;
        self
    }

    /// Report through a SCORM adapter reachable from `host`, scored out of the configured maximum
    pub fn with_scorm_host(self, host: Arc<dyn ApiHost>) -> Self {
        let bridge = ScormBridge::new(host, self.config.lms.max_score);
        self.with_lms(Arc::new(bridge))
    }

    /// Open the LMS session once the page has found its adapter
    pub fn connect_lms(&self) -> bool {
        let connected = self.lms.initialize();
        if !connected {
            tracing::info!("Running without an LMS");
        }
        connected
    }

    pub fn with_tutor(mut self, tutor: GeminiTutor) -> Self {
        self.tutor = Arc::new(tutor);
        self
    }

    pub fn session(&self) -> SessionState {
        self.lesson.read().state().clone()
    }

    fn transitioned(&self, transition: Transition) -> Transition {
        self.metrics.record_stage_transition();
        tracing::info!(from = ?transition.from, to = ?transition.to, "Stage transition");
        if transition.from == Stage::VirtualLab && transition.to != Stage::VirtualLab {
            self.stop_simulation();
        }
        // The quiz starts over whenever the learner comes back to it
        if transition.to == Stage::Engagement && transition.from != Stage::Engagement {
            *self.quiz.write() = QuizRun::new();
        }
        transition
    }

    // ---- navigation ----

    pub fn login(&self, name: &str, student_id: &str) -> Result<Transition, PhyemError> {
        let identity = LearnerIdentity::new(name, student_id)?;
        let transition = self.lesson.write().login(identity);
        Ok(self.transitioned(transition))
    }

    pub fn navigate_to(&self, stage: Stage) -> Transition {
        let transition = self.lesson.write().navigate_to(stage);
        self.transitioned(transition)
    }

    /// Restart on the thank-you screen also clears the quiz
    pub fn advance(&self) -> Option<Transition> {
        let transition = self.lesson.write().advance()?;
        if transition.from == Stage::ThankYou {
            *self.quiz.write() = QuizRun::new();
        }
        Some(self.transitioned(transition))
    }

    pub fn back(&self) -> Option<Transition> {
        let transition = self.lesson.write().back()?;
        Some(self.transitioned(transition))
    }

    pub fn reset_project(&self) -> Transition {
        *self.quiz.write() = QuizRun::new();
        let transition = self.lesson.write().reset_project();
        self.transitioned(transition)
    }

    // ---- engagement quiz ----

    pub fn quiz_select(&self, option_id: &str) {
        self.quiz.write().select(option_id);
    }

    pub fn quiz_reveal(&self) -> Option<bool> {
        self.quiz.write().reveal()
    }

    /// On the last question this records the score, restarts the quiz and
    /// moves on to the Challenge.
    pub fn quiz_next(&self) -> QuizProgress {
        let progress = self.quiz.write().next();
        if let QuizProgress::Finished(score) = progress {
            self.lesson.write().record_quiz_score(score);
            *self.quiz.write() = QuizRun::new();
            tracing::info!(score = score, "Engagement quiz finished");
            self.navigate_to(Stage::Challenge);
        }
        progress
    }

    // ---- challenge / CER ----

    pub fn add_observation(&self, note: &str) -> Option<Observation> {
        self.lesson.write().add_observation(note).cloned()
    }

    pub fn update_cer(&self, patch: CerPatch) -> CerAnswer {
        self.lesson.write().update_cer(patch).clone()
    }

    pub fn insert_sentence_starter(&self, field: CerField, text: &str) -> CerAnswer {
        self.lesson.write().insert_sentence_starter(field, text).clone()
    }

    // ---- virtual lab ----

    /// Mount the simulation if it is not running. A fresh mount starts at ambient
    /// and counts the default object as tested. Needs a tokio runtime.
    pub fn start_simulation(&self) -> FrameSnapshot {
        let mut slot = self.simulation.lock();
        if let Some(handle) = slot.as_ref().filter(|h| h.is_running()) {
            return handle.latest();
        }
        let sim = &self.config.simulation;
        let handle = SimulationHandle::spawn(sim.heating, sim.frame_rate_hz, self.metrics.clone());
        let frame = handle.latest();
        self.lesson.write().add_material_tested(frame.model.material.id());
        *slot = Some(handle);
        frame
    }

    pub fn stop_simulation(&self) {
        if self.simulation.lock().take().is_some() {
            tracing::info!("Simulation unmounted");
        }
    }

    fn with_simulation<T>(&self, f: impl FnOnce(&SimulationHandle) -> T) -> Result<T, PhyemError> {
        let slot = self.simulation.lock();
        let handle = slot
            .as_ref()
            .ok_or_else(|| PhyemError::new("Simulation is not running", "simulation"))?;
        Ok(f(handle))
    }

    pub fn select_material(&self, material: Material) -> Result<FrameSnapshot, PhyemError> {
        let changed = self.with_simulation(|sim| sim.set_material(material))?;
        if changed {
            self.lesson.write().add_material_tested(material.id());
        }
        self.simulation_frame()
    }

    pub fn set_coil_turns(&self, turns: u32) -> Result<FrameSnapshot, PhyemError> {
        self.with_simulation(|sim| sim.set_turns(turns))?;
        self.simulation_frame()
    }

    pub fn set_coil_current(&self, current: u32) -> Result<FrameSnapshot, PhyemError> {
        self.with_simulation(|sim| sim.set_current(current))?;
        self.simulation_frame()
    }

    pub fn simulation_frame(&self) -> Result<FrameSnapshot, PhyemError> {
        self.with_simulation(|sim| sim.latest())
    }

    // ---- AI tutor ----

    /// Logs the question on the session before asking
    pub async fn ask_tutor(&self, question: &str) -> String {
        self.lesson.write().log_question(question);
        self.tutor.ask(question).await
    }

    pub async fn speak(&self, text: &str) -> Option<SpeechClip> {
        self.tutor.speak(text).await
    }

    pub async fn sentence_starters(&self) -> Vec<String> {
        self.tutor.sentence_starters().await
    }

    pub async fn evaluate_reasoning(&self) -> String {
        let reasoning = self.lesson.read().state().cer.reasoning.clone();
        self.tutor.evaluate_reasoning(&reasoning).await
    }

    // ---- collaboration ----

    pub async fn forum_questions(&self) -> Result<Vec<ForumQuestion>, PhyemError> {
        self.forum.list().await
    }

    pub async fn post_forum_question(&self, text: &str) -> Result<Option<ForumQuestion>, PhyemError> {
        self.forum.post_question(LEARNER_AUTHOR, text).await
    }

    /// A stored reply earns the collaboration bonus
    pub async fn reply_to_forum(&self, question_id: &str, text: &str) -> Result<Option<ReplyOutcome>, PhyemError> {
        let Some(reply) = self.forum.reply(question_id, LEARNER_AUTHOR, text).await? else {
            return Ok(None);
        };
        let collaboration_bonus = self
            .lesson
            .write()
            .add_collaboration_bonus(COLLABORATION_REPLY_BONUS);
        tracing::info!(bonus = collaboration_bonus, "Collaboration bonus granted");
        Ok(Some(ReplyOutcome { reply, collaboration_bonus }))
    }

    // ---- finishing ----

    /// Build the report, persist it, report to the LMS and start cloud sync.
    /// Storage failures are logged; the learner still reaches the thank-you screen.
    pub async fn submit_final_report(&self, stars: u8, comment: &str) -> Result<Option<SubmissionOutcome>, PhyemError> {
        let rating = StarRating::new(stars)?;
        let report = self.lesson.read().finalize_report(rating, comment);
        let Some(report) = report else {
            tracing::warn!("Final report requested before login");
            return Ok(None);
        };
        self.metrics.record_report_finalized();

        let stored = match self.reports.append(&report).await {
            Ok(()) => true,
            Err(e) => {
                self.metrics.record_collaborator_failure();
                tracing::error!(error = %e, "Failed to store report");
                false
            }
        };
        let cloud_sync_started = self.cloud_sync.spawn(report.clone()).is_some();
        let lms_reported = self.lms.report_score(report.score);

        self.navigate_to(Stage::ThankYou);
        Ok(Some(SubmissionOutcome {
            report,
            stored,
            lms_reported,
            cloud_sync_started,
        }))
    }

    // ---- instructor dashboard ----

    pub fn unlock_admin(&self, passcode: &str) -> bool {
        let ok = self.config.admin.accepts(passcode);
        *self.admin_unlocked.write() = ok;
        if !ok {
            tracing::warn!("Admin passcode rejected");
        }
        ok
    }

    fn require_admin(&self) -> Result<(), PhyemError> {
        if *self.admin_unlocked.read() {
            Ok(())
        } else {
            Err(PhyemError::new("Dashboard is locked", "admin"))
        }
    }

    pub async fn list_reports(&self, search: &str) -> Result<Vec<Report>, PhyemError> {
        self.require_admin()?;
        let reports = self.reports.list().await?;
        Ok(filter_reports(&reports, search))
    }

    pub async fn analytics(&self) -> Result<AnalyticsPayload, PhyemError> {
        self.require_admin()?;
        let reports = self.reports.list().await?;
        Ok(compute_analytics(&reports))
    }

    pub async fn clear_reports(&self) -> Result<(), PhyemError> {
        self.require_admin()?;
        self.reports.clear().await
    }

    /// Returns (rows imported, reports now stored)
    pub async fn import_sheets(&self, paths: &[PathBuf]) -> Result<(usize, usize), PhyemError> {
        self.require_admin()?;
        let imported = spreadsheet::import_files(paths, chrono::Utc::now()).await;
        if imported.is_empty() {
            let total = self.reports.list().await?.len();
            return Ok((0, total));
        }
        let count = imported.len();
        let total = self.reports.merge_imported(imported).await?;
        Ok((count, total))
    }

    /// Writes every stored report into `dir` and returns the file path
    pub async fn export_sheet(&self, dir: PathBuf) -> Result<PathBuf, PhyemError> {
        self.require_admin()?;
        let reports = self.reports.list().await?;
        if reports.is_empty() {
            return Err(PhyemError::new("No reports to export", "export"));
        }
        let path = dir.join(spreadsheet::export_file_name(chrono::Utc::now()));
        spreadsheet::write_rows(&path, &spreadsheet::export_rows(&reports)).await?;
        tracing::info!(path = ?path, rows = reports.len(), "Reports exported");
        Ok(path)
    }
}
