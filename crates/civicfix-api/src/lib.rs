pub mod auth;
pub mod complaints;
pub mod middleware;
pub mod pages;
pub mod routes;
pub mod storage;

use axum::http::StatusCode;
use tracing::error;

/// Runs store or hashing work off the async runtime. Any failure is logged
/// and becomes a 500.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, StatusCode>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("Database error: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
