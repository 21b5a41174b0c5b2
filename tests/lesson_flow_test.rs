use phyem_lib::config::settings::{AppConfig, TutorConfig};
use phyem_lib::integrations::tutor::CONNECTION_FALLBACK;
use phyem_lib::integrations::{AnnouncedHost, GeminiTutor, ScormCall, ScormSink, ScormVersion};
use phyem_lib::lesson::quiz::QuizProgress;
use phyem_lib::lesson::stage::Stage;
use phyem_lib::lesson::{CerAnswer, CerPatch, LearnerIdentity, LessonController, StarRating};
use phyem_lib::metrics::Metrics;
use phyem_lib::simulation::Material;
use phyem_lib::state::app::AppState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tempfile::TempDir;

fn app(dir: &TempDir) -> AppState {
    let offline = GeminiTutor::new(TutorConfig::default(), Metrics::new())
        .with_base_url("http://127.0.0.1:9");
    AppState::with_paths(
        AppConfig::default(),
        dir.path().join("reports.json"),
        dir.path().join("forum.json"),
    )
    .with_tutor(offline)
}

fn logged_in() -> LessonController {
    let mut lesson = LessonController::new();
    lesson.login(LearnerIdentity::new("Ann", "S1").unwrap());
    lesson
}

#[test]
fn test_navigation_is_total_and_unconditional() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut lesson = logged_in();
    for _ in 0..500 {
        let stage = Stage::ALL[rng.gen_range(0..Stage::ALL.len())];
        let transition = lesson.navigate_to(stage);
        assert_eq!(transition.to, stage);
        assert_eq!(lesson.current_stage(), stage);
    }
}

#[test]
fn test_reset_always_returns_to_a_clean_challenge() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..50 {
        let mut lesson = logged_in();
        for _ in 0..rng.gen_range(0..20) {
            match rng.gen_range(0..6) {
                0 => { lesson.add_observation("seen it"); }
                1 => lesson.add_material_tested("iron"),
                2 => lesson.record_quiz_score(rng.gen_range(0..=5)),
                3 => { lesson.add_collaboration_bonus(2); }
                4 => { lesson.update_cer(CerPatch { reasoning: Some("eddy".into()), ..Default::default() }); }
                _ => { lesson.navigate_to(Stage::ALL[rng.gen_range(0..Stage::ALL.len())]); }
            }
        }
        lesson.reset_project();
        let state = lesson.state();
        assert_eq!(state.current_stage, Stage::Challenge);
        assert!(state.observations.is_empty());
        assert_eq!(state.cer, CerAnswer::default());
        assert_eq!(state.quiz_score, 0);
        assert!(state.materials_tested.is_empty());
        assert_eq!(state.collaboration_bonus, 0);
        assert!(state.learner.is_some());
    }
}

#[test]
fn test_score_is_base_plus_bonus_only() {
    let mut lesson = logged_in();
    lesson.record_quiz_score(1);
    lesson.add_observation("a");
    lesson.add_observation("b");
    lesson.add_collaboration_bonus(2);
    lesson.add_collaboration_bonus(2);
    let report = lesson.finalize_report(StarRating::new(4).unwrap(), "fun").unwrap();
    assert_eq!(report.collaboration_bonus, 4);
    assert_eq!(report.score, 104);
    assert_eq!(report.quiz_score, 1);
    assert_eq!(report.observations_count, 2);
    assert_eq!(report.total_quiz_questions, 5);
}

#[test]
fn test_quiz_retake_overwrites_score() {
    let mut lesson = logged_in();
    lesson.record_quiz_score(5);
    lesson.record_quiz_score(2);
    assert_eq!(lesson.state().quiz_score, 2);
}

#[test]
fn test_report_materials_are_deduplicated() {
    let mut lesson = logged_in();
    for m in ["iron", "glass", "iron", "glass", "stainless"] {
        lesson.add_material_tested(m);
    }
    let report = lesson.finalize_report(StarRating::new(5).unwrap(), "").unwrap();
    assert_eq!(report.materials_tested, vec!["iron", "glass", "stainless"]);
    assert!(report.timestamp_utc().is_some());
}

#[test]
fn test_login_rejects_blank_identity() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let err = app.login("  ", "S1").unwrap_err();
    assert_eq!(err.stage, "validation");
    assert_eq!(app.session().current_stage, Stage::Login);
}

#[tokio::test]
async fn test_full_mission_through_app_state() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    app.login("Ann", "S1").unwrap();
    assert_eq!(app.session().current_stage, Stage::Engagement);

    // Engagement quiz: three right, two wrong
    for answer in ["gas", "infrared", "gas", "induction", "no_diff"] {
        app.quiz_select(answer);
        app.quiz_reveal();
        app.quiz_next();
    }
    let session = app.session();
    assert_eq!(session.quiz_score, 3);
    assert_eq!(session.current_stage, Stage::Challenge);

    assert!(app.add_observation("  ").is_none());
    app.add_observation("ไข่ไม่สุกเมื่อวางบนเตาโดยตรง").unwrap();
    app.update_cer(CerPatch { claim: Some("ไข่ไม่สุก".into()), ..Default::default() });

    app.advance();
    assert_eq!(app.session().current_stage, Stage::VirtualLab);
    app.start_simulation();
    app.select_material(Material::Glass).unwrap();
    app.select_material(Material::Glass).unwrap();
    app.set_coil_turns(500).unwrap();
    let frame = app.set_coil_current(20).unwrap();
    assert_eq!(frame.model.turns, 300);

    // Leaving the lab unmounts the simulation
    app.advance();
    assert!(app.simulation_frame().is_err());

    assert_eq!(app.ask_tutor("ทำไมแก้วไม่ร้อน?").await, CONNECTION_FALLBACK);

    app.navigate_to(Stage::Collaboration);
    assert!(app.reply_to_forum("q-induction-2", "   ").await.unwrap().is_none());
    let first = app.reply_to_forum("q-induction-2", "เพราะสแตนเลสบางชนิดไม่เป็นแม่เหล็ก").await.unwrap().unwrap();
    assert_eq!(first.collaboration_bonus, 2);
    let second = app.reply_to_forum("q-induction-3", "น้อยกว่า").await.unwrap().unwrap();
    assert_eq!(second.collaboration_bonus, 4);

    assert!(app.submit_final_report(0, "").await.is_err());
    let outcome = app.submit_final_report(5, "สนุกมาก").await.unwrap().unwrap();
    assert!(outcome.stored);
    assert!(!outcome.lms_reported);
    assert!(!outcome.cloud_sync_started);

    let report = outcome.report;
    assert_eq!(report.score, 104);
    assert_eq!(report.quiz_score, 3);
    assert_eq!(report.materials_tested, vec!["iron", "glass"]);
    assert_eq!(report.questions_asked, vec!["ทำไมแก้วไม่ร้อน?"]);
    assert_eq!(report.cer.claim, "ไข่ไม่สุก");
    assert_eq!(app.session().current_stage, Stage::ThankYou);

    // Dashboard is locked until the passcode is given
    assert!(app.list_reports("").await.is_err());
    assert!(!app.unlock_admin("000"));
    assert!(app.unlock_admin("123"));
    let stored = app.list_reports("s1").await.unwrap();
    assert!(stored.is_empty(), "student id search is case sensitive");
    let stored = app.list_reports("S1").await.unwrap();
    assert_eq!(stored, vec![report]);
    assert_eq!(app.analytics().await.unwrap().avg_score, 104.0);

    app.reset_project();
    let session = app.session();
    assert_eq!(session.current_stage, Stage::Challenge);
    assert_eq!(session.learner.unwrap().student_id(), "S1");
    assert!(session.questions_asked.is_empty());
}

#[tokio::test]
async fn test_submit_before_login_produces_nothing() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    assert!(app.submit_final_report(5, "").await.unwrap().is_none());
    assert_eq!(app.metrics.snapshot().reports_finalized, 0);
}

#[tokio::test]
async fn test_quiz_finish_moves_to_challenge() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    app.login("Ben", "S2").unwrap();
    let mut last = QuizProgress::Question(0);
    for _ in 0..5 {
        app.quiz_select("induction_diff");
        app.quiz_reveal();
        last = app.quiz_next();
    }
    assert_eq!(last, QuizProgress::Finished(1));
    assert_eq!(app.session().quiz_score, 1);
    assert_eq!(app.session().current_stage, Stage::Challenge);
}

#[tokio::test]
async fn test_restart_button_starts_a_clean_run() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    app.login("Ann", "S1").unwrap();
    app.add_observation("pan heats from the bottom").unwrap();
    app.reply_to_forum("q-induction-2", "เพราะเป็นแม่เหล็ก").await.unwrap().unwrap();
    app.navigate_to(Stage::ThankYou);

    let transition = app.advance().unwrap();
    assert_eq!(transition.from, Stage::ThankYou);
    assert_eq!(transition.to, Stage::Challenge);
    let session = app.session();
    assert!(session.observations.is_empty());
    assert_eq!(session.collaboration_bonus, 0);

    let outcome = app.submit_final_report(4, "").await.unwrap().unwrap();
    assert_eq!(outcome.report.score, 100);
    assert_eq!(outcome.report.observations_count, 0);
}

#[test]
fn test_quiz_restarts_when_engagement_is_reentered() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    app.login("Ann", "S1").unwrap();
    for answer in ["gas", "infrared"] {
        app.quiz_select(answer);
        assert_eq!(app.quiz_reveal(), Some(true));
        app.quiz_next();
    }
    assert_eq!(app.quiz.read().step(), 2);

    app.navigate_to(Stage::Challenge);
    app.navigate_to(Stage::Engagement);
    let quiz = app.quiz.read();
    assert_eq!(quiz.step(), 0);
    assert_eq!(quiz.score(), 0);
    assert!(quiz.selected().is_none());
}

#[test]
fn test_staying_on_engagement_keeps_quiz_progress() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    app.login("Ann", "S1").unwrap();
    app.quiz_select("gas");
    app.quiz_reveal();
    app.quiz_next();

    app.navigate_to(Stage::Engagement);
    assert_eq!(app.quiz.read().step(), 1);
    assert_eq!(app.quiz.read().score(), 1);
}

#[derive(Default)]
struct RecordingSink {
    calls: parking_lot::Mutex<Vec<ScormCall>>,
}

impl ScormSink for RecordingSink {
    fn send(&self, call: ScormCall) -> bool {
        self.calls.lock().push(call);
        true
    }
}

#[tokio::test]
async fn test_submission_reports_score_through_announced_adapter() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::from_toml_str("[lms]\nmax_score = 120\n").unwrap();
    let sink = Arc::new(RecordingSink::default());
    let host = Arc::new(AnnouncedHost::new(sink.clone()));
    let app = AppState::with_paths(config, dir.path().join("reports.json"), dir.path().join("forum.json"))
        .with_scorm_host(host.clone());

    assert!(!app.connect_lms());
    host.announce(Some(ScormVersion::Scorm2004));
    assert!(app.connect_lms());

    app.login("Ann", "S1").unwrap();
    let outcome = app.submit_final_report(5, "").await.unwrap().unwrap();
    assert!(outcome.lms_reported);

    let calls = sink.calls.lock();
    let args: Vec<Vec<String>> = calls.iter().map(|c| c.args.clone()).collect();
    assert_eq!(calls[0].method, "Initialize");
    assert!(args.contains(&vec!["cmi.score.raw".to_string(), "100".to_string()]));
    assert!(args.contains(&vec!["cmi.score.max".to_string(), "120".to_string()]));
    assert_eq!(calls.last().unwrap().method, "Commit");
}
