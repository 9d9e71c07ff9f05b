//! Shared application state: store slot, degraded flag, play sessions.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{config::AppConfig, dao::trivia_store::TriviaStore, error::ServiceError};

pub type SharedState = Arc<AppState>;

/// What a play token currently references. Both halves are optional; a fresh
/// token starts empty and fills in as the player joins and registers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaySession {
    /// Game the player has joined.
    pub game_id: Option<Uuid>,
    /// Team the player registered or rejoined.
    pub team_id: Option<Uuid>,
}

/// Central application state storing the storage handle and live sessions.
pub struct AppState {
    trivia_store: RwLock<Option<Arc<dyn TriviaStore>>>,
    play_sessions: DashMap<String, PlaySession>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            trivia_store: RwLock::new(None),
            play_sessions: DashMap::new(),
            degraded: degraded_tx,
            config,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn trivia_store(&self) -> Option<Arc<dyn TriviaStore>> {
        let guard = self.trivia_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain a store handle or fail with the degraded-mode error.
    pub async fn require_trivia_store(&self) -> Result<Arc<dyn TriviaStore>, ServiceError> {
        self.trivia_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn set_trivia_store(&self, store: Arc<dyn TriviaStore>) {
        {
            let mut guard = self.trivia_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current storage backend and enter degraded mode.
    pub async fn clear_trivia_store(&self) {
        {
            let mut guard = self.trivia_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        if self.is_degraded().await == value {
            return;
        }
        let _ = self.degraded.send(value);
    }

    /// Session referenced by a play token, empty if the token is new.
    pub fn play_session(&self, token: &str) -> PlaySession {
        self.play_sessions
            .get(token)
            .map(|entry| *entry.value())
            .unwrap_or_default()
    }

    /// Replace the session stored for a play token.
    pub fn store_play_session(&self, token: &str, session: PlaySession) {
        if session.game_id.is_none() && session.team_id.is_none() {
            self.play_sessions.remove(token);
        } else {
            self.play_sessions.insert(token.to_owned(), session);
        }
    }

    /// Forget everything a play token references.
    pub fn clear_play_session(&self, token: &str) {
        self.play_sessions.remove(token);
    }
}
