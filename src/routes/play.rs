use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::play::{
        BoardView, CreateTeamRequest, HomeView, JoinGameRequest, LeaderboardView, PageView,
        PlayerTeamView, RejoinRequest, ResponseView, SubmitResponseRequest,
    },
    error::AppError,
    services::play_service,
    state::SharedState,
};

const PLAY_TOKEN_HEADER: &str = "x-play-token";

/// Opaque token a player's device presents on every request.
#[derive(Debug, Clone)]
pub struct PlayToken(pub String);

/// Player-facing endpoints keyed by the play token header.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/play/home", get(home))
        .route("/play/join", post(join))
        .route("/play/team", post(register_team))
        .route("/play/rejoin", post(rejoin))
        .route("/play/session", delete(leave))
        .route("/play/board", get(board))
        .route("/play/pages/{order}", get(page))
        .route(
            "/play/questions/{id}/response",
            put(save_response).delete(retract_response),
        )
        .route("/play/leaderboard", get(leaderboard))
        .route_layer(middleware::from_fn(require_play_token))
}

/// Landing view for whatever the token still references.
#[utoipa::path(
    get,
    path = "/play/home",
    tag = "play",
    params(("X-Play-Token" = String, Header, description = "Opaque token identifying the player's device")),
    responses((status = 200, description = "Current session view", body = HomeView))
)]
pub async fn home(
    State(state): State<SharedState>,
    Extension(PlayToken(token)): Extension<PlayToken>,
) -> Result<Json<HomeView>, AppError> {
    Ok(Json(play_service::home(&state, &token).await?))
}

/// Join a game by id and passcode.
#[utoipa::path(
    post,
    path = "/play/join",
    tag = "play",
    params(("X-Play-Token" = String, Header, description = "Opaque token identifying the player's device")),
    request_body = JoinGameRequest,
    responses(
        (status = 200, description = "Joined the game", body = HomeView),
        (status = 404, description = "No open game with that id and passcode")
    )
)]
pub async fn join(
    State(state): State<SharedState>,
    Extension(PlayToken(token)): Extension<PlayToken>,
    Json(payload): Json<JoinGameRequest>,
) -> Result<Json<HomeView>, AppError> {
    payload.validate()?;
    Ok(Json(play_service::join(&state, &token, payload).await?))
}

/// Register a new team in the joined game.
#[utoipa::path(
    post,
    path = "/play/team",
    tag = "play",
    params(("X-Play-Token" = String, Header, description = "Opaque token identifying the player's device")),
    request_body = CreateTeamRequest,
    responses(
        (status = 200, description = "Team registered", body = PlayerTeamView),
        (status = 409, description = "Name taken or roster frozen")
    )
)]
pub async fn register_team(
    State(state): State<SharedState>,
    Extension(PlayToken(token)): Extension<PlayToken>,
    Json(payload): Json<CreateTeamRequest>,
) -> Result<Json<PlayerTeamView>, AppError> {
    payload.validate()?;
    Ok(Json(
        play_service::register_team(&state, &token, payload).await?,
    ))
}

/// Reattach the token to an existing team using its rejoin passcode.
#[utoipa::path(
    post,
    path = "/play/rejoin",
    tag = "play",
    params(("X-Play-Token" = String, Header, description = "Opaque token identifying the player's device")),
    request_body = RejoinRequest,
    responses(
        (status = 200, description = "Rejoined the team", body = PlayerTeamView),
        (status = 404, description = "No team with that id and passcode")
    )
)]
pub async fn rejoin(
    State(state): State<SharedState>,
    Extension(PlayToken(token)): Extension<PlayToken>,
    Json(payload): Json<RejoinRequest>,
) -> Result<Json<PlayerTeamView>, AppError> {
    payload.validate()?;
    Ok(Json(play_service::rejoin(&state, &token, payload).await?))
}

/// Detach the token from its game and team.
#[utoipa::path(
    delete,
    path = "/play/session",
    tag = "play",
    params(("X-Play-Token" = String, Header, description = "Opaque token identifying the player's device")),
    responses((status = 204, description = "Session cleared"))
)]
pub async fn leave(
    State(state): State<SharedState>,
    Extension(PlayToken(token)): Extension<PlayToken>,
) -> StatusCode {
    play_service::leave(&state, &token);
    StatusCode::NO_CONTENT
}

/// The round board for the joined game.
#[utoipa::path(
    get,
    path = "/play/board",
    tag = "play",
    params(("X-Play-Token" = String, Header, description = "Opaque token identifying the player's device")),
    responses((status = 200, description = "Round board", body = BoardView))
)]
pub async fn board(
    State(state): State<SharedState>,
    Extension(PlayToken(token)): Extension<PlayToken>,
) -> Result<Json<BoardView>, AppError> {
    Ok(Json(play_service::board(&state, &token).await?))
}

/// One unlocked round by its position on the board.
#[utoipa::path(
    get,
    path = "/play/pages/{order}",
    tag = "play",
    params(("X-Play-Token" = String, Header, description = "Opaque token identifying the player's device"),
    ("order" = u32, Path, description = "Position of the round on the board")),
    responses(
        (status = 200, description = "Round with questions", body = PageView),
        (status = 404, description = "No unlocked round at that position")
    )
)]
pub async fn page(
    State(state): State<SharedState>,
    Extension(PlayToken(token)): Extension<PlayToken>,
    Path(order): Path<u32>,
) -> Result<Json<PageView>, AppError> {
    Ok(Json(play_service::page(&state, &token, order).await?))
}

/// Write or rewrite the team's answer to a question.
#[utoipa::path(
    put,
    path = "/play/questions/{id}/response",
    tag = "play",
    params(("X-Play-Token" = String, Header, description = "Opaque token identifying the player's device"),
    ("id" = Uuid, Path, description = "Identifier of the question being answered")),
    request_body = SubmitResponseRequest,
    responses(
        (status = 200, description = "Answer stored", body = ResponseView),
        (status = 409, description = "Answers closed or already graded")
    )
)]
pub async fn save_response(
    State(state): State<SharedState>,
    Extension(PlayToken(token)): Extension<PlayToken>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitResponseRequest>,
) -> Result<Json<ResponseView>, AppError> {
    payload.validate()?;
    Ok(Json(
        play_service::save_response(&state, &token, id, payload).await?,
    ))
}

/// Retract the team's answer to a question.
#[utoipa::path(
    delete,
    path = "/play/questions/{id}/response",
    tag = "play",
    params(("X-Play-Token" = String, Header, description = "Opaque token identifying the player's device"),
    ("id" = Uuid, Path, description = "Identifier of the question")),
    responses(
        (status = 204, description = "Answer retracted"),
        (status = 404, description = "No answer to retract")
    )
)]
pub async fn retract_response(
    State(state): State<SharedState>,
    Extension(PlayToken(token)): Extension<PlayToken>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    play_service::retract_response(&state, &token, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Standings for the joined game.
#[utoipa::path(
    get,
    path = "/play/leaderboard",
    tag = "play",
    params(("X-Play-Token" = String, Header, description = "Opaque token identifying the player's device")),
    responses((status = 200, description = "Standings", body = LeaderboardView))
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Extension(PlayToken(token)): Extension<PlayToken>,
) -> Result<Json<LeaderboardView>, AppError> {
    Ok(Json(play_service::leaderboard_view(&state, &token).await?))
}

async fn require_play_token(mut req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(PLAY_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| AppError::Unauthorized("missing play token header `X-Play-Token`".into()))?;

    req.extensions_mut().insert(PlayToken(token));
    Ok(next.run(req).await)
}
