use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize structured logging with tracing.
/// Safe to call more than once; only the first call installs the subscriber.
pub fn init_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::fmt;
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json()
            );

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("[Logging] tracing subscriber already installed: {}", e);
            return;
        }

        tracing::info!("Structured logging initialized");
    });
}

/// Record the outcome of a call to an external collaborator
pub fn log_collaborator_call(collaborator: &str, success: bool, latency_ms: Option<u64>) {
    match (success, latency_ms) {
        (true, Some(latency)) => tracing::info!(
            collaborator = collaborator,
            latency_ms = latency,
            "Collaborator call succeeded"
        ),
        (true, None) => tracing::info!(collaborator = collaborator, "Collaborator call succeeded"),
        (false, Some(latency)) => tracing::warn!(
            collaborator = collaborator,
            latency_ms = latency,
            "Collaborator call failed, using fallback"
        ),
        (false, None) => tracing::warn!(collaborator = collaborator, "Collaborator call failed, using fallback"),
    }
}

pub fn log_cache_hit(key: u64) {
    tracing::debug!(key = key, "Cache hit");
}

pub fn log_cache_miss(key: u64) {
    tracing::debug!(key = key, "Cache miss");
}
