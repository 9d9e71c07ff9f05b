use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the storage backend and report `ok` or `degraded`.
///
/// A failed probe flips the shared degraded flag immediately instead of
/// waiting for the supervisor's next poll, so the first healthcheck that
/// sees the outage already reports it.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.trivia_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage probe failed during healthcheck");
                state.update_degraded(true).await;
            }
        }
        None => warn!("healthcheck ran without a storage backend installed"),
    }

    HealthResponse::from_degraded(state.is_degraded().await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::trivia_store::memory::MemoryTriviaStore, dto::health::HealthStatus,
        state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await.status, HealthStatus::Degraded);

        state
            .set_trivia_store(Arc::new(MemoryTriviaStore::new()))
            .await;
        assert_eq!(health_status(&state).await.status, HealthStatus::Ok);
    }
}
