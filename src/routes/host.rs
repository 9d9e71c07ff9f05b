use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        common::TeamSummary,
        host::{
            HostGameListItem, HostGameView, HostTeamView, PageResponsesView, ScoreRequest,
            ScoreUpdateResponse, SetGameStateRequest, SetPageStateRequest, TeamPasscodeResponse,
            UpdateTeamRequest,
        },
        play::LeaderboardView,
    },
    error::AppError,
    services::host_service,
    state::SharedState,
};

const USER_TOKEN_HEADER: &str = "x-user-token";

/// Authenticated username presented by hosts and editors.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

/// Host endpoints for running a live game.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/host/games", get(list_games))
        .route("/host/games/{id}", get(game_board))
        .route("/host/games/{id}/state", post(set_game_state))
        .route(
            "/host/games/{id}/pages/{page_id}/state",
            post(set_page_state),
        )
        .route(
            "/host/games/{id}/pages/{page_id}/responses",
            get(page_responses),
        )
        .route(
            "/host/games/{id}/responses/{response_id}/score",
            post(assign_score),
        )
        .route("/host/games/{id}/leaderboard", get(leaderboard))
        .route(
            "/host/games/{id}/teams/{team_id}",
            get(get_team).put(update_team).delete(remove_team),
        )
        .route(
            "/host/games/{id}/teams/{team_id}/passcode",
            post(regenerate_team_passcode),
        )
        .route_layer(middleware::from_fn(require_user_token))
}

/// Games the user holds any grant on.
#[utoipa::path(
    get,
    path = "/host/games",
    tag = "host",
    params(("X-User-Token" = String, Header, description = "Authenticated username")),
    responses((status = 200, description = "Games the user can see", body = [HostGameListItem]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<HostGameListItem>>, AppError> {
    Ok(Json(host_service::list_games(&state, &user).await?))
}

/// Full host board for one game.
#[utoipa::path(
    get,
    path = "/host/games/{id}",
    tag = "host",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Host board", body = HostGameView))
)]
pub async fn game_board(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<HostGameView>, AppError> {
    Ok(Json(host_service::game_board(&state, &user, id).await?))
}

/// Move a game through its lifecycle. Fragment requests get only the
/// refreshed page list.
#[utoipa::path(
    post,
    path = "/host/games/{id}/state",
    tag = "host",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game")),
    request_body = SetGameStateRequest,
    responses((status = 200, description = "State changed", body = HostGameView))
)]
pub async fn set_game_state(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<SetGameStateRequest>,
) -> Result<Response, AppError> {
    let board = host_service::set_game_state(&state, &user, id, payload.state).await?;
    if super::is_fragment(&headers) {
        return Ok(Json(board.pages).into_response());
    }
    Ok(Json(board).into_response())
}

/// Toggle a round's visibility state. Fragment requests get only the
/// refreshed page list.
#[utoipa::path(
    post,
    path = "/host/games/{id}/pages/{page_id}/state",
    tag = "host",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game"),
    ("page_id" = Uuid, Path, description = "Identifier of the round")),
    request_body = SetPageStateRequest,
    responses((status = 200, description = "State changed", body = HostGameView))
)]
pub async fn set_page_state(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, page_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    Json(payload): Json<SetPageStateRequest>,
) -> Result<Response, AppError> {
    let board = host_service::set_page_state(&state, &user, id, page_id, payload.state).await?;
    if super::is_fragment(&headers) {
        return Ok(Json(board.pages).into_response());
    }
    Ok(Json(board).into_response())
}

/// Grading view: every question on the round with every team's answer.
#[utoipa::path(
    get,
    path = "/host/games/{id}/pages/{page_id}/responses",
    tag = "host",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game"),
    ("page_id" = Uuid, Path, description = "Identifier of the round")),
    responses((status = 200, description = "Grading view", body = PageResponsesView))
)]
pub async fn page_responses(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, page_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PageResponsesView>, AppError> {
    Ok(Json(
        host_service::page_responses(&state, &user, id, page_id).await?,
    ))
}

/// Grade one response. A negative score retracts the grade.
#[utoipa::path(
    post,
    path = "/host/games/{id}/responses/{response_id}/score",
    tag = "host",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game"),
    ("response_id" = Uuid, Path, description = "Identifier of the response")),
    request_body = ScoreRequest,
    responses(
        (status = 200, description = "Score applied", body = ScoreUpdateResponse),
        (status = 409, description = "Round is not in the scoring state")
    )
)]
pub async fn assign_score(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, response_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ScoreRequest>,
) -> Result<Json<ScoreUpdateResponse>, AppError> {
    Ok(Json(
        host_service::assign_score(&state, &user, id, response_id, payload.score).await?,
    ))
}

/// Standings for a game the user can view.
#[utoipa::path(
    get,
    path = "/host/games/{id}/leaderboard",
    tag = "host",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Standings", body = LeaderboardView))
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaderboardView>, AppError> {
    Ok(Json(host_service::leaderboard(&state, &user, id).await?))
}

/// One team, for the host's team-care panel. Includes the rejoin passcode.
#[utoipa::path(
    get,
    path = "/host/games/{id}/teams/{team_id}",
    tag = "host",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game"),
    ("team_id" = Uuid, Path, description = "Identifier of the team")),
    responses((status = 200, description = "Team", body = HostTeamView))
)]
pub async fn get_team(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, team_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<HostTeamView>, AppError> {
    Ok(Json(
        host_service::get_team(&state, &user, id, team_id).await?,
    ))
}

/// Rename a team or fix up its member list on a player's behalf.
#[utoipa::path(
    put,
    path = "/host/games/{id}/teams/{team_id}",
    tag = "host",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game"),
    ("team_id" = Uuid, Path, description = "Identifier of the team")),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Team updated", body = TeamSummary),
        (status = 409, description = "Team name already taken")
    )
)]
pub async fn update_team(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, team_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateTeamRequest>,
) -> Result<Json<TeamSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        host_service::update_team(&state, &user, id, team_id, payload).await?,
    ))
}

/// Kick a team out of the game, dropping its answers with it.
#[utoipa::path(
    delete,
    path = "/host/games/{id}/teams/{team_id}",
    tag = "host",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game"),
    ("team_id" = Uuid, Path, description = "Identifier of the team")),
    responses((status = 204, description = "Team removed"))
)]
pub async fn remove_team(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, team_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    host_service::remove_team(&state, &user, id, team_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Hand a team a fresh rejoin passcode, voiding the old one.
#[utoipa::path(
    post,
    path = "/host/games/{id}/teams/{team_id}/passcode",
    tag = "host",
    params(("X-User-Token" = String, Header, description = "Authenticated username"),
    ("id" = Uuid, Path, description = "Identifier of the game"),
    ("team_id" = Uuid, Path, description = "Identifier of the team")),
    responses((status = 200, description = "New passcode", body = TeamPasscodeResponse))
)]
pub async fn regenerate_team_passcode(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, team_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TeamPasscodeResponse>, AppError> {
    Ok(Json(
        host_service::regenerate_team_passcode(&state, &user, id, team_id).await?,
    ))
}

pub(crate) async fn require_user_token(
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = req
        .headers()
        .get(USER_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| AppError::Unauthorized("missing user token header `X-User-Token`".into()))?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
