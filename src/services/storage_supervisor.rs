use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{storage::StorageError, trivia_store::TriviaStore},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Own the storage connection for the lifetime of the process.
///
/// Connects with backoff, installs the store into the shared state, and
/// polls it; when the store stops answering and cannot be revived it is
/// uninstalled and the outer loop starts over. Games in progress survive
/// the gap since play sessions live in process memory.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn TriviaStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_trivia_store(store.clone()).await;
                info!("storage connection established; trivia data available");
                delay = INITIAL_DELAY;

                monitor(&state, store.as_ref()).await;
                state.clear_trivia_store().await;
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// Poll the installed store until it is lost for good.
async fn monitor(state: &SharedState, store: &dyn TriviaStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded().await {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false).await;
                }
            }
            Err(_) => {
                if !revive(state, store).await {
                    warn!("exhausted storage reconnect attempts; dropping the store");
                    return;
                }
                state.update_degraded(false).await;
            }
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

/// Try to bring a failed store back, entering degraded mode on the first
/// miss. Returns whether the store answers again.
async fn revive(state: &SharedState, store: &dyn TriviaStore) -> bool {
    let mut delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!("storage reconnection succeeded after health check failure");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(attempt, error = %err, "storage reconnect failed; entering degraded mode");
                    state.update_degraded(true).await;
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }

    false
}
