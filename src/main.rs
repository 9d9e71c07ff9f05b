//! Trivia Night backend binary entrypoint wiring REST, storage, and documentation layers.

use std::{env, net::SocketAddr};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trivia_night_back::{
    config::AppConfig,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    install_storage(app_state.clone()).await;
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick a storage backend. With `MONGO_URI` set the MongoDB supervisor owns
/// the connection and degraded mode; otherwise everything lives in memory
/// and vanishes on restart.
async fn install_storage(state: SharedState) {
    #[cfg(feature = "mongo-store")]
    if env::var("MONGO_URI").is_ok() {
        use std::sync::Arc;

        use trivia_night_back::dao::trivia_store::{
            TriviaStore,
            mongodb::{MongoConfig, MongoTriviaStore},
        };
        use trivia_night_back::services::storage_supervisor;

        tokio::spawn(storage_supervisor::run(state.clone(), || async {
            let config = MongoConfig::from_env().await?;
            let store = MongoTriviaStore::connect(config).await?;
            Ok(Arc::new(store) as Arc<dyn TriviaStore>)
        }));
        return;
    }

    info!("MONGO_URI not set; using the in-memory store");
    state
        .set_trivia_store(std::sync::Arc::new(
            trivia_night_back::dao::trivia_store::memory::MemoryTriviaStore::new(),
        ))
        .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
