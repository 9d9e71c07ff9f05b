use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Swagger UI over the play, host, and editor surfaces. The raw document is
/// served at `/api-doc/openapi.json` and also backs the `openapi-generator`
/// binary.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
