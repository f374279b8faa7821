use axum::{body::Body, http::StatusCode, routing::post, Router};

use crate::api::middleware::session::AppState;

/// Largest log payload read from a device
const MAX_LOG_BYTES: usize = 64 * 1024;

/// Sink for error reports sent by wallet devices. The response is always an
/// empty 200, whatever arrives.
async fn ingest_log(body: Body) -> StatusCode {
    let bytes = match axum::body::to_bytes(body, MAX_LOG_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Device log body could not be read");
            return StatusCode::OK;
        }
    };

    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(entry) => tracing::info!(target: "device_log", %entry, "Device log received"),
        Err(e) => tracing::warn!(
            target: "device_log",
            error = %e,
            bytes = bytes.len(),
            "Unparseable device log"
        ),
    }

    StatusCode::OK
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/log", post(ingest_log))
}
