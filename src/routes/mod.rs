use axum::{Router, http::HeaderMap};

use crate::state::SharedState;

/// Swagger UI and the generated OpenAPI document.
pub mod docs;
/// Authoring endpoints for games, pages, and questions.
pub mod editor;
/// Health check endpoint.
pub mod health;
/// Host endpoints for running a live game.
pub mod host;
/// Player endpoints keyed by the play token header.
pub mod play;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(play::router())
        .merge(host::router())
        .merge(editor::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

/// Whether the client asked for a fragment refresh via the `HX-Request`
/// header. Fragment requests get only the refreshed list instead of the
/// full view.
pub(crate) fn is_fragment(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}
