use reqwest::Client;
use std::sync::OnceLock;
use tokio::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Reusable HTTP client singleton (created once, reused for all requests)
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// Per-request timeouts are set by callers; this only bounds connection setup.
pub fn http_client() -> &'static Client {
    HTTP_CLIENT.get_or_init(|| {
        Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            })
    })
}
