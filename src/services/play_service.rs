//! Player-facing operations keyed by an opaque play token.
//!
//! Every entry point starts by reconciling whatever the token still
//! references against live data, so a deleted team or game heals silently
//! instead of erroring on the next request.

use std::time::SystemTime;
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, PageEntity, PageState, QuestionEntity, ResponseEntity, TeamEntity},
    dto::{
        play::{
            BoardTile, BoardView, CreateTeamRequest, HomeView, JoinGameRequest, LeaderboardView,
            PageQuestionView, PageView, PlayerTeamView, RejoinRequest, ResponseView,
            SubmitResponseRequest,
        },
        validation::normalize_passcode,
    },
    error::ServiceError,
    leaderboard,
    session,
    state::{PlaySession, SharedState},
};

/// The session's stored references resolved against live data.
struct ResolvedSession {
    game: Option<GameEntity>,
    team: Option<TeamEntity>,
}

/// Load and heal the session behind `token`, persisting any repairs.
async fn resolve_session(
    state: &SharedState,
    token: &str,
) -> Result<ResolvedSession, ServiceError> {
    let store = state.require_trivia_store().await?;
    let stored = state.play_session(token);

    let game = match stored.game_id {
        Some(id) => store.find_game(id).await?,
        None => None,
    };
    let team = match stored.team_id {
        Some(id) => store.find_team(id).await?,
        None => None,
    };

    let healed = session::reconcile(stored.game_id, game.as_ref(), stored.team_id, team.as_ref());
    if healed.game_id != stored.game_id || healed.team_id != stored.team_id {
        state.store_play_session(
            token,
            PlaySession {
                game_id: healed.game_id,
                team_id: healed.team_id,
            },
        );
    }

    // A healed game id can differ from the loaded entity (team adoption), so
    // re-fetch when needed.
    let game = match (healed.game_id, game) {
        (Some(id), Some(game)) if game.id == id => Some(game),
        (Some(id), _) => store.find_game(id).await?,
        (None, _) => None,
    };
    let team = healed.team_id.and_then(|id| team.filter(|team| team.id == id));

    Ok(ResolvedSession { game, team })
}

/// Game from the session, visible to players only while open.
fn require_open_game(resolved: &ResolvedSession) -> Result<&GameEntity, ServiceError> {
    match &resolved.game {
        Some(game) if game.state.is_open() => Ok(game),
        _ => Err(ServiceError::NotFound("join a game first".into())),
    }
}

/// Landing view for whatever the token still references.
pub async fn home(state: &SharedState, token: &str) -> Result<HomeView, ServiceError> {
    let resolved = resolve_session(state, token).await?;
    Ok(HomeView {
        game: resolved
            .game
            .filter(|game| game.state.is_open())
            .map(Into::into),
        team: resolved.team.map(Into::into),
        team_name_idea: state.config().team_name_idea().to_owned(),
    })
}

/// Attach the token to a game by id and passcode.
///
/// A closed game and a wrong passcode are indistinguishable on purpose.
pub async fn join(
    state: &SharedState,
    token: &str,
    payload: JoinGameRequest,
) -> Result<HomeView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let game = store
        .find_game(payload.game_id)
        .await?
        .filter(|game| game.state.is_open())
        .filter(|game| game.passcode == normalize_passcode(&payload.passcode))
        .ok_or_else(|| ServiceError::NotFound("no open game with that id and passcode".into()))?;

    let stored = state.play_session(token);
    // Keep the team only if it already belongs to this game.
    let team_id = match stored.team_id {
        Some(id) => store
            .find_team(id)
            .await?
            .filter(|team| team.game_id == game.id)
            .map(|team| team.id),
        None => None,
    };
    state.store_play_session(
        token,
        PlaySession {
            game_id: Some(game.id),
            team_id,
        },
    );

    home(state, token).await
}

/// Register a new team in the joined game and attach the token to it.
pub async fn register_team(
    state: &SharedState,
    token: &str,
    payload: CreateTeamRequest,
) -> Result<PlayerTeamView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let resolved = resolve_session(state, token).await?;
    let game = require_open_game(&resolved)?;
    if !game.state.accepts_teams() {
        return Err(ServiceError::InvalidState(
            "this game is no longer accepting teams".into(),
        ));
    }

    let team = TeamEntity {
        id: Uuid::new_v4(),
        game_id: game.id,
        name: payload.name.trim().to_owned(),
        members: payload.members.trim().to_owned(),
        passcode: state.config().new_passcode(),
    };
    store.save_team(team.clone()).await.map_err(|err| {
        match ServiceError::from(err) {
            ServiceError::InvalidState(_) => {
                ServiceError::InvalidState("that team name is already taken".into())
            }
            other => other,
        }
    })?;
    touch_game(state, game.clone()).await?;

    state.store_play_session(
        token,
        PlaySession {
            game_id: Some(game.id),
            team_id: Some(team.id),
        },
    );
    Ok(team.into())
}

/// Reattach the token to an existing team using its rejoin passcode.
pub async fn rejoin(
    state: &SharedState,
    token: &str,
    payload: RejoinRequest,
) -> Result<PlayerTeamView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let team = store
        .find_team(payload.team_id)
        .await?
        .filter(|team| team.passcode == normalize_passcode(&payload.passcode))
        .ok_or_else(|| ServiceError::NotFound("no team with that id and passcode".into()))?;
    let game = store
        .find_game(team.game_id)
        .await?
        .filter(|game| game.state.is_open())
        .ok_or_else(|| ServiceError::NotFound("no team with that id and passcode".into()))?;

    state.store_play_session(
        token,
        PlaySession {
            game_id: Some(game.id),
            team_id: Some(team.id),
        },
    );
    Ok(team.into())
}

/// Detach the token from everything.
pub fn leave(state: &SharedState, token: &str) {
    state.clear_play_session(token);
}

/// The round board for the joined game. Hidden pages are absent, locked
/// rounds show a teaser line instead of their title.
pub async fn board(state: &SharedState, token: &str) -> Result<BoardView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let resolved = resolve_session(state, token).await?;
    let game = require_open_game(&resolved)?;

    let pages = store.list_pages(game.id).await?;
    let tiles = pages
        .into_iter()
        .filter(|page| !page.hidden)
        .map(|page| BoardTile {
            order: page.order,
            title: match page.state {
                PageState::Locked => state.config().teaser_for(page.order).to_owned(),
                _ => page.title,
            },
            state: page.state,
        })
        .collect();

    Ok(BoardView {
        game: game.clone().into(),
        team: resolved.team.map(Into::into),
        pages: tiles,
    })
}

/// One unlocked round with its questions and the team's stored answers.
pub async fn page(state: &SharedState, token: &str, order: u32) -> Result<PageView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let resolved = resolve_session(state, token).await?;
    let game = require_open_game(&resolved)?;

    let page = store
        .list_pages(game.id)
        .await?
        .into_iter()
        .find(|page| page.order == order && !page.hidden)
        .filter(|page| page.state != PageState::Locked)
        .ok_or_else(|| ServiceError::NotFound(format!("no open round {order}")))?;

    let questions = store.list_questions(page.id).await?;
    let mut views = Vec::with_capacity(questions.len());
    for question in questions {
        let response = match &resolved.team {
            Some(team) => store.find_response(question.id, team.id).await?,
            None => None,
        };
        views.push(PageQuestionView::new(question, response));
    }

    Ok(PageView {
        order: page.order,
        title: page.title,
        description: page.description,
        answerable: page.state == PageState::Open,
        questions: views,
    })
}

/// Look up a question and check the gates for answering it: joined game,
/// registered team, visible page in the open state.
async fn answerable_question(
    state: &SharedState,
    token: &str,
    question_id: Uuid,
) -> Result<(QuestionEntity, PageEntity, TeamEntity), ServiceError> {
    let store = state.require_trivia_store().await?;
    let resolved = resolve_session(state, token).await?;
    let game = require_open_game(&resolved)?;
    let team = resolved
        .team
        .clone()
        .ok_or_else(|| ServiceError::InvalidState("register a team first".into()))?;

    let question = store
        .find_question(question_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("no such question".into()))?;
    let page = store
        .find_page(question.page_id)
        .await?
        .filter(|page| page.game_id == game.id && !page.hidden)
        .ok_or_else(|| ServiceError::NotFound("no such question".into()))?;
    if page.state != PageState::Open {
        return Err(ServiceError::InvalidState(
            "answers are closed for this round".into(),
        ));
    }

    Ok((question, page, team))
}

/// Write or rewrite the team's answer to a question.
pub async fn save_response(
    state: &SharedState,
    token: &str,
    question_id: Uuid,
    payload: SubmitResponseRequest,
) -> Result<ResponseView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let (question, _page, team) = answerable_question(state, token, question_id).await?;

    if let Some(existing) = store.find_response(question.id, team.id).await? {
        if existing.graded {
            return Err(ServiceError::InvalidState(
                "this answer has already been graded".into(),
            ));
        }
    }

    let stored = store
        .upsert_response(ResponseEntity {
            id: Uuid::new_v4(),
            question_id: question.id,
            team_id: team.id,
            value: payload.value,
            graded: false,
            score: 0,
        })
        .await?;
    Ok(stored.into())
}

/// Retract the team's answer to a question.
pub async fn retract_response(
    state: &SharedState,
    token: &str,
    question_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_trivia_store().await?;
    let (question, _page, team) = answerable_question(state, token, question_id).await?;

    if let Some(existing) = store.find_response(question.id, team.id).await? {
        if existing.graded {
            return Err(ServiceError::InvalidState(
                "this answer has already been graded".into(),
            ));
        }
    }

    if !store.delete_response(question.id, team.id).await? {
        return Err(ServiceError::NotFound("no answer to retract".into()));
    }
    Ok(())
}

/// Standings for the joined game.
pub async fn leaderboard_view(
    state: &SharedState,
    token: &str,
) -> Result<LeaderboardView, ServiceError> {
    let resolved = resolve_session(state, token).await?;
    let game = require_open_game(&resolved)?;
    compute_leaderboard(state, game.id).await
}

/// Aggregate the full leaderboard for a game. Shared with the host surface.
pub(crate) async fn compute_leaderboard(
    state: &SharedState,
    game_id: Uuid,
) -> Result<LeaderboardView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let pages = store.list_pages(game_id).await?;
    let mut questions = Vec::new();
    for page in &pages {
        questions.extend(store.list_questions(page.id).await?);
    }
    let teams = store.list_teams(game_id).await?;
    let responses = store.list_responses_for_game(game_id).await?;

    let board = leaderboard::compute(&pages, &questions, &teams, &responses)
        .map_err(|err| ServiceError::InvalidState(err.to_string()))?;
    Ok(board.into())
}

/// Bump a game's `updated_at` after a child row changed.
pub(crate) async fn touch_game(state: &SharedState, game: GameEntity) -> Result<(), ServiceError> {
    let store = state.require_trivia_store().await?;
    let mut game = game;
    game.updated_at = SystemTime::now();
    store.save_game(game).await?;
    Ok(())
}
