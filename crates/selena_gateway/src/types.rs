use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Reply to `POST /start` and `POST /stop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlResponse {
    /// Whether the loop is running after the request.
    pub running: bool,
    /// False when the request was a no-op (already started / already stopped).
    pub changed: bool,
}
