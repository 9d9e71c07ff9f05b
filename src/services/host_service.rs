//! Live-game operations for hosts: lifecycle states, grading, team care.

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    access::{self, Capability},
    dao::{
        models::{GameEntity, GameState, PageEntity, PageState, ResponseEntity},
        trivia_store::TriviaStore,
    },
    dto::{
        common::TeamSummary,
        host::{
            GradingQuestionView, GradingResponseView, HostGameListItem, HostGameView,
            HostTeamView, PageResponsesView, ScoreUpdateResponse, TeamPasscodeResponse,
            UpdateTeamRequest,
        },
        play::LeaderboardView,
    },
    error::ServiceError,
    services::play_service,
    state::SharedState,
};

/// Check `user`'s grant on `game_id` against `capability`.
pub(crate) async fn require_capability(
    store: &Arc<dyn TriviaStore>,
    game_id: Uuid,
    user: &str,
    capability: Capability,
) -> Result<(), ServiceError> {
    let grant = store.find_grant(game_id, user.to_owned()).await?;
    access::require(grant.as_ref(), capability)
}

/// Load a game after the capability check.
pub(crate) async fn authorized_game(
    store: &Arc<dyn TriviaStore>,
    game_id: Uuid,
    user: &str,
    capability: Capability,
) -> Result<GameEntity, ServiceError> {
    require_capability(store, game_id, user, capability).await?;
    store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))
}

/// Games the user holds any grant on.
pub async fn list_games(
    state: &SharedState,
    user: &str,
) -> Result<Vec<HostGameListItem>, ServiceError> {
    let store = state.require_trivia_store().await?;
    let granted: Vec<Uuid> = store
        .list_grants_for_user(user.to_owned())
        .await?
        .into_iter()
        .filter(|grant| access::allows(grant, Capability::View))
        .map(|grant| grant.game_id)
        .collect();

    Ok(store
        .list_games()
        .await?
        .into_iter()
        .filter(|item| granted.contains(&item.id))
        .map(Into::into)
        .collect())
}

/// Full host board for one game.
pub async fn game_board(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
) -> Result<HostGameView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let game = authorized_game(&store, game_id, user, Capability::View).await?;
    let pages = store.list_pages(game_id).await?;
    let teams = store.list_teams(game_id).await?;
    let hosts: Vec<String> = store
        .list_grants_for_game(game_id)
        .await?
        .into_iter()
        .filter(|grant| access::allows(grant, Capability::Host))
        .map(|grant| grant.user)
        .collect();

    let mut max_points = 0;
    let mut hidden_points = 0;
    for page in &pages {
        let total: i32 = store
            .list_questions(page.id)
            .await?
            .iter()
            .map(|question| question.possible_points)
            .sum();
        if page.hidden {
            hidden_points += total;
        } else {
            max_points += total;
        }
    }

    Ok(HostGameView::new(
        game,
        pages,
        teams,
        hosts,
        max_points,
        hidden_points,
    ))
}

/// Move a game through its lifecycle.
pub async fn set_game_state(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
    next: GameState,
) -> Result<HostGameView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let mut game = authorized_game(&store, game_id, user, Capability::Host).await?;
    game.state = next;
    game.updated_at = std::time::SystemTime::now();
    store.save_game(game).await?;
    game_board(state, user, game_id).await
}

/// Toggle a round's visibility state.
pub async fn set_page_state(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
    page_id: Uuid,
    next: PageState,
) -> Result<HostGameView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let game = authorized_game(&store, game_id, user, Capability::Host).await?;
    let mut page = page_of_game(&store, &game, page_id).await?;
    page.state = next;
    store.save_page(page).await?;
    play_service::touch_game(state, game).await?;
    game_board(state, user, game_id).await
}

/// Grading view: every question on the page with every team's answer.
pub async fn page_responses(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
    page_id: Uuid,
) -> Result<PageResponsesView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let game = authorized_game(&store, game_id, user, Capability::Host).await?;
    let page = page_of_game(&store, &game, page_id).await?;

    let team_names: HashMap<Uuid, String> = store
        .list_teams(game_id)
        .await?
        .into_iter()
        .map(|team| (team.id, team.name))
        .collect();
    let responses = store.list_responses_for_game(game_id).await?;

    let questions = store.list_questions(page.id).await?;
    let mut question_views = Vec::with_capacity(questions.len());
    for question in questions {
        let rows = responses
            .iter()
            .filter(|response| response.question_id == question.id)
            .map(|response| {
                let team_name = team_names
                    .get(&response.team_id)
                    .cloned()
                    .unwrap_or_else(|| "unknown team".to_owned());
                GradingResponseView::new(response.clone(), team_name)
            })
            .collect();
        question_views.push(GradingQuestionView::new(question, rows));
    }

    Ok(PageResponsesView {
        page_id: page.id,
        order: page.order,
        title: page.title,
        state: page.state,
        questions: question_views,
    })
}

/// Grade one response. A negative score retracts the grade; anything from
/// zero up to the question's possible points grades it.
pub async fn assign_score(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
    response_id: Uuid,
    score: i32,
) -> Result<ScoreUpdateResponse, ServiceError> {
    let store = state.require_trivia_store().await?;
    let game = authorized_game(&store, game_id, user, Capability::Host).await?;

    let response = store
        .find_response_by_id(response_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("response `{response_id}` not found")))?;
    let question = store
        .find_question(response.question_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("question no longer exists".into()))?;
    let page = store
        .find_page(question.page_id)
        .await?
        .filter(|page| page.game_id == game.id)
        .ok_or_else(|| ServiceError::NotFound("page no longer exists".into()))?;
    if page.state != PageState::Scoring {
        return Err(ServiceError::InvalidState(
            "grading requires the round to be in the scoring state".into(),
        ));
    }

    let graded = if score < 0 {
        ResponseEntity {
            graded: false,
            score: 0,
            ..response
        }
    } else {
        if score > question.possible_points {
            return Err(ServiceError::InvalidInput(format!(
                "score {score} exceeds the {} possible points",
                question.possible_points
            )));
        }
        ResponseEntity {
            graded: true,
            score,
            ..response
        }
    };

    let stored = store.upsert_response(graded).await?;
    Ok(stored.into())
}

/// Standings for a game the user can view.
pub async fn leaderboard(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
) -> Result<LeaderboardView, ServiceError> {
    let store = state.require_trivia_store().await?;
    require_capability(&store, game_id, user, Capability::View).await?;
    play_service::compute_leaderboard(state, game_id).await
}

/// One team, for the host's team-care panel. Unlike the player-facing
/// summaries this includes the rejoin passcode.
pub async fn get_team(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
    team_id: Uuid,
) -> Result<HostTeamView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let game = authorized_game(&store, game_id, user, Capability::Host).await?;
    let team = team_of_game(&store, &game, team_id).await?;
    Ok(team.into())
}

/// Rename a team or fix up its member list on a player's behalf.
pub async fn update_team(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
    team_id: Uuid,
    payload: UpdateTeamRequest,
) -> Result<TeamSummary, ServiceError> {
    let store = state.require_trivia_store().await?;
    let game = authorized_game(&store, game_id, user, Capability::Host).await?;
    let mut team = team_of_game(&store, &game, team_id).await?;
    team.name = payload.name.trim().to_owned();
    team.members = payload.members.trim().to_owned();
    store.save_team(team.clone()).await.map_err(|err| {
        match ServiceError::from(err) {
            ServiceError::InvalidState(_) => {
                ServiceError::InvalidState("that team name is already taken".into())
            }
            other => other,
        }
    })?;
    play_service::touch_game(state, game).await?;
    Ok(team.into())
}

/// Hand a team a fresh rejoin passcode, voiding the old one.
pub async fn regenerate_team_passcode(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
    team_id: Uuid,
) -> Result<TeamPasscodeResponse, ServiceError> {
    let store = state.require_trivia_store().await?;
    let game = authorized_game(&store, game_id, user, Capability::Host).await?;
    let mut team = team_of_game(&store, &game, team_id).await?;
    team.passcode = state.config().new_passcode();
    store.save_team(team.clone()).await?;
    Ok(TeamPasscodeResponse {
        team_id: team.id,
        passcode: team.passcode,
    })
}

/// Kick a team out of the game, dropping its answers with it. Sessions
/// that still point at the team heal themselves on the next request.
pub async fn remove_team(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
    team_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_trivia_store().await?;
    let game = authorized_game(&store, game_id, user, Capability::Host).await?;
    let team = team_of_game(&store, &game, team_id).await?;
    store.delete_team(team.id).await?;
    play_service::touch_game(state, game).await?;
    Ok(())
}

async fn page_of_game(
    store: &Arc<dyn TriviaStore>,
    game: &GameEntity,
    page_id: Uuid,
) -> Result<PageEntity, ServiceError> {
    store
        .find_page(page_id)
        .await?
        .filter(|page| page.game_id == game.id)
        .ok_or_else(|| ServiceError::NotFound(format!("page `{page_id}` not found")))
}

async fn team_of_game(
    store: &Arc<dyn TriviaStore>,
    game: &GameEntity,
    team_id: Uuid,
) -> Result<crate::dao::models::TeamEntity, ServiceError> {
    store
        .find_team(team_id)
        .await?
        .filter(|team| team.game_id == game.id)
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))
}
