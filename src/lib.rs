pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod integrations;
pub mod lesson;
pub mod logging;
pub mod metrics;
pub mod paths;
pub mod simulation;
pub mod state;
#[cfg(feature = "desktop")]
mod routes;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize structured logging first
    logging::init_logging();
    tracing::info!("PhyEM application starting");

    let config = config::settings::get_app_config().clone();

    let result = tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(move |app| {
            use std::sync::Arc;
            use tauri::Manager;

            let sink = Arc::new(routes::WebviewScormSink::new(app.handle().clone()));
            let lms_host = Arc::new(integrations::AnnouncedHost::new(sink));
            let app_state = state::app::AppState::new(config).with_scorm_host(lms_host.clone());
            app.manage(Arc::new(app_state));
            app.manage(lms_host);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            routes::get_session,
            routes::get_menu,
            routes::login,
            routes::navigate_to,
            routes::advance,
            routes::go_back,
            routes::reset_project,
            routes::get_quiz,
            routes::quiz_select,
            routes::quiz_reveal,
            routes::quiz_next,
            routes::add_observation,
            routes::update_cer,
            routes::insert_sentence_starter,
            routes::start_simulation,
            routes::stop_simulation,
            routes::select_material,
            routes::set_coil_turns,
            routes::set_coil_current,
            routes::get_simulation_frame,
            routes::ask_tutor,
            routes::speak,
            routes::get_sentence_starters,
            routes::evaluate_reasoning,
            routes::get_forum,
            routes::post_forum_question,
            routes::reply_to_forum,
            routes::submit_final_report,
            routes::unlock_admin,
            routes::list_reports,
            routes::get_analytics,
            routes::clear_reports,
            routes::import_sheets,
            routes::export_sheet,
            routes::attach_lms,
            routes::get_scorm_manifest,
            routes::get_metrics
        ])
        .run(tauri::generate_context!());

    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to run Tauri application");
        std::process::exit(1);
    }
}
