use serde::Serialize;
use utoipa::ToSchema;

/// Whether the quiz data behind the service is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// A storage backend is installed and answering.
    Ok,
    /// No storage backend, or the current one stopped answering.
    Degraded,
}

/// Payload for the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
}

impl HealthResponse {
    /// Map the shared degraded flag onto the wire status.
    pub fn from_degraded(degraded: bool) -> Self {
        let status = if degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };
        Self { status }
    }
}
