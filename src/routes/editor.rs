use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::editor::{
        CreateGameRequest, CreatePageRequest, CreateQuestionRequest, EditorGameView,
        EditorPageView, GamePasscodeResponse, GrantRequest, GrantView, MoveRequest,
        UpdateGameRequest, UpdatePageRequest, UpdateQuestionRequest,
    },
    error::AppError,
    routes::host::{CurrentUser, require_user_token},
    services::editor_service,
    state::SharedState,
};

/// Editor endpoints for authoring games, pages, and questions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/editor/games", post(create_game))
        .route(
            "/editor/games/{id}",
            get(get_game).put(update_game).delete(delete_game),
        )
        .route("/editor/games/{id}/passcode", post(regenerate_passcode))
        .route(
            "/editor/games/{id}/hosts",
            get(list_grants).post(set_grant),
        )
        .route("/editor/games/{id}/hosts/{user}", delete(remove_grant))
        .route("/editor/games/{id}/pages", post(create_page))
        .route(
            "/editor/pages/{page_id}",
            put(update_page).delete(delete_page),
        )
        .route("/editor/pages/{page_id}/move", post(move_page))
        .route("/editor/pages/{page_id}/questions", post(create_question))
        .route(
            "/editor/questions/{id}",
            put(update_question).delete(delete_question),
        )
        .route("/editor/questions/{id}/move", post(move_question))
        .route_layer(middleware::from_fn(require_user_token))
}

/// Create an empty closed game owned by the caller.
#[utoipa::path(
    post,
    path = "/editor/games",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username")),
    request_body = CreateGameRequest,
    responses((status = 200, description = "Game created", body = EditorGameView))
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<Json<EditorGameView>, AppError> {
    payload.validate()?;
    Ok(Json(
        editor_service::create_game(&state, &user, payload).await?,
    ))
}

/// The full editable game with pages and questions.
#[utoipa::path(
    get,
    path = "/editor/games/{id}",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Editable game", body = EditorGameView))
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditorGameView>, AppError> {
    Ok(Json(editor_service::get_game(&state, &user, id).await?))
}

/// Rename a game.
#[utoipa::path(
    put,
    path = "/editor/games/{id}",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game")),
    request_body = UpdateGameRequest,
    responses(
        (status = 200, description = "Game updated", body = EditorGameView),
        (status = 409, description = "Game must be closed for editing")
    )
)]
pub async fn update_game(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGameRequest>,
) -> Result<Json<EditorGameView>, AppError> {
    payload.validate()?;
    Ok(Json(
        editor_service::update_game(&state, &user, id, payload).await?,
    ))
}

/// Delete a game and everything under it.
#[utoipa::path(
    delete,
    path = "/editor/games/{id}",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game")),
    responses((status = 204, description = "Game deleted"))
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    editor_service::delete_game(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the game's join passcode.
#[utoipa::path(
    post,
    path = "/editor/games/{id}/passcode",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game")),
    responses((status = 200, description = "New passcode", body = GamePasscodeResponse))
)]
pub async fn regenerate_passcode(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<GamePasscodeResponse>, AppError> {
    Ok(Json(
        editor_service::regenerate_passcode(&state, &user, id).await?,
    ))
}

/// Every capability grant on a game.
#[utoipa::path(
    get,
    path = "/editor/games/{id}/hosts",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Grants", body = [GrantView]))
)]
pub async fn list_grants(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GrantView>>, AppError> {
    Ok(Json(editor_service::list_grants(&state, &user, id).await?))
}

/// Insert or replace a user's grant on a game.
#[utoipa::path(
    post,
    path = "/editor/games/{id}/hosts",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game")),
    request_body = GrantRequest,
    responses((status = 200, description = "Grant stored", body = GrantView))
)]
pub async fn set_grant(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GrantRequest>,
) -> Result<Json<GrantView>, AppError> {
    payload.validate()?;
    Ok(Json(
        editor_service::set_grant(&state, &user, id, payload).await?,
    ))
}

/// Remove a user's grant entirely.
#[utoipa::path(
    delete,
    path = "/editor/games/{id}/hosts/{user}",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game"),
    ("user" = String, Path, description = "Username whose grant is removed")),
    responses((status = 204, description = "Grant removed"))
)]
pub async fn remove_grant(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, target)): Path<(Uuid, String)>,
) -> Result<StatusCode, AppError> {
    editor_service::remove_grant(&state, &user, id, &target).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Append a page at the end of the game.
#[utoipa::path(
    post,
    path = "/editor/games/{id}/pages",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game")),
    request_body = CreatePageRequest,
    responses((status = 200, description = "Page created", body = EditorPageView))
)]
pub async fn create_page(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreatePageRequest>,
) -> Result<Json<EditorPageView>, AppError> {
    payload.validate()?;
    Ok(Json(
        editor_service::create_page(&state, &user, id, payload).await?,
    ))
}

/// Edit a page's title, description, or hidden flag.
#[utoipa::path(
    put,
    path = "/editor/pages/{page_id}",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("page_id" = Uuid, Path, description = "Identifier of the page")),
    request_body = UpdatePageRequest,
    responses((status = 200, description = "Page updated", body = EditorPageView))
)]
pub async fn update_page(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(page_id): Path<Uuid>,
    Json(payload): Json<UpdatePageRequest>,
) -> Result<Json<EditorPageView>, AppError> {
    payload.validate()?;
    Ok(Json(
        editor_service::update_page(&state, &user, page_id, payload).await?,
    ))
}

/// Delete a page; later pages close the gap.
#[utoipa::path(
    delete,
    path = "/editor/pages/{page_id}",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("page_id" = Uuid, Path, description = "Identifier of the page")),
    responses((status = 204, description = "Page deleted"))
)]
pub async fn delete_page(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(page_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    editor_service::delete_page(&state, &user, page_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Swap a page with its neighbour. Fragment requests get only the
/// refreshed page list.
#[utoipa::path(
    post,
    path = "/editor/pages/{page_id}/move",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("page_id" = Uuid, Path, description = "Identifier of the page")),
    request_body = MoveRequest,
    responses(
        (status = 200, description = "Pages reordered", body = EditorGameView),
        (status = 400, description = "Already at the edge of the board")
    )
)]
pub async fn move_page(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(page_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<MoveRequest>,
) -> Result<Response, AppError> {
    let view = editor_service::move_page(&state, &user, page_id, payload.direction).await?;
    if super::is_fragment(&headers) {
        return Ok(Json(view.pages).into_response());
    }
    Ok(Json(view).into_response())
}

/// Append a question at the end of a page.
#[utoipa::path(
    post,
    path = "/editor/pages/{page_id}/questions",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("page_id" = Uuid, Path, description = "Identifier of the page")),
    request_body = CreateQuestionRequest,
    responses((status = 200, description = "Question created", body = EditorPageView))
)]
pub async fn create_question(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(page_id): Path<Uuid>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<Json<EditorPageView>, AppError> {
    payload.validate()?;
    Ok(Json(
        editor_service::create_question(&state, &user, page_id, payload).await?,
    ))
}

/// Edit a question in place.
#[utoipa::path(
    put,
    path = "/editor/questions/{id}",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the question")),
    request_body = UpdateQuestionRequest,
    responses((status = 200, description = "Question updated", body = EditorPageView))
)]
pub async fn update_question(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<Json<EditorPageView>, AppError> {
    payload.validate()?;
    Ok(Json(
        editor_service::update_question(&state, &user, id, payload).await?,
    ))
}

/// Delete a question; later questions close the gap.
#[utoipa::path(
    delete,
    path = "/editor/questions/{id}",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the question")),
    responses((status = 204, description = "Question deleted"))
)]
pub async fn delete_question(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    editor_service::delete_question(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Swap a question with its neighbour. Fragment requests get only the
/// refreshed question list.
#[utoipa::path(
    post,
    path = "/editor/questions/{id}/move",
    tag = "editor",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the question")),
    request_body = MoveRequest,
    responses(
        (status = 200, description = "Questions reordered", body = EditorPageView),
        (status = 400, description = "Already at the edge of the page")
    )
)]
pub async fn move_question(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<MoveRequest>,
) -> Result<Response, AppError> {
    let view = editor_service::move_question(&state, &user, id, payload.direction).await?;
    if super::is_fragment(&headers) {
        return Ok(Json(view.questions).into_response());
    }
    Ok(Json(view).into_response())
}
