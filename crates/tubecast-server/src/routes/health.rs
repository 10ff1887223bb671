//! Health check endpoint.

/// Liveness probe; returns a plain `ok`.
pub async fn health_check() -> &'static str {
    "ok"
}
