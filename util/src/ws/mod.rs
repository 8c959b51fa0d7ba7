// util/src/ws/mod.rs
pub mod manager;
pub use manager::WebSocketManager;

use serde::Serialize;

/// Broadcast `payload` as JSON on `topic`.
///
/// Serialization failures are logged and dropped; broadcasting never fails
/// from the caller's point of view.
pub async fn emit<T: Serialize>(ws: &WebSocketManager, topic: &str, payload: &T) {
    match serde_json::to_string(payload) {
        Ok(json) => ws.broadcast(topic, json).await,
        Err(e) => tracing::warn!(topic, error = %e, "failed to serialize ws payload"),
    }
}
