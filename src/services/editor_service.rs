//! Game authoring: games, pages, questions, grants.
//!
//! Structural edits are refused while the game is open to players; the one
//! exception is grant management, so a co-host can be added mid-game.

use std::sync::Arc;
use std::time::SystemTime;
use uuid::Uuid;

use crate::{
    access::Capability,
    dao::{
        models::{GameEntity, GameState, HostGrantEntity, PageEntity, PageState, QuestionEntity},
        trivia_store::TriviaStore,
    },
    dto::editor::{
        CreateGameRequest, CreatePageRequest, CreateQuestionRequest, EditorGameView,
        EditorPageView, GamePasscodeResponse, GrantRequest, GrantView, UpdateGameRequest,
        UpdatePageRequest, UpdateQuestionRequest,
    },
    error::ServiceError,
    ordering::{self, MoveDirection, MoveError},
    services::{
        host_service::{authorized_game, require_capability},
        play_service,
    },
    state::SharedState,
};

/// Load a game for a structural edit: requires the edit capability and a
/// closed game.
async fn editable_game(
    store: &Arc<dyn TriviaStore>,
    game_id: Uuid,
    user: &str,
) -> Result<GameEntity, ServiceError> {
    let game = authorized_game(store, game_id, user, Capability::Edit).await?;
    if game.state != GameState::Closed {
        return Err(ServiceError::InvalidState(
            "close the game before editing it".into(),
        ));
    }
    Ok(game)
}

fn move_error(err: MoveError) -> ServiceError {
    ServiceError::InvalidInput(err.to_string())
}

/// Create an empty closed game and grant the creator every capability.
pub async fn create_game(
    state: &SharedState,
    user: &str,
    payload: CreateGameRequest,
) -> Result<EditorGameView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let now = SystemTime::now();
    let game = GameEntity {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_owned(),
        passcode: state.config().new_passcode(),
        state: GameState::Closed,
        created_at: now,
        updated_at: now,
    };
    store.save_game(game.clone()).await?;
    store
        .set_grant(HostGrantEntity::full(game.id, user))
        .await?;
    Ok(EditorGameView::new(game, Vec::new()))
}

/// The full editable game with pages and questions.
pub async fn get_game(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
) -> Result<EditorGameView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let game = authorized_game(&store, game_id, user, Capability::View).await?;
    let pages = store.list_pages(game_id).await?;
    let mut page_views = Vec::with_capacity(pages.len());
    for page in pages {
        let questions = store.list_questions(page.id).await?;
        page_views.push(EditorPageView::new(page, questions));
    }
    Ok(EditorGameView::new(game, page_views))
}

/// Rename a game.
pub async fn update_game(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
    payload: UpdateGameRequest,
) -> Result<EditorGameView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let mut game = editable_game(&store, game_id, user).await?;
    game.name = payload.name.trim().to_owned();
    game.updated_at = SystemTime::now();
    store.save_game(game).await?;
    get_game(state, user, game_id).await
}

/// Delete a game and everything under it.
pub async fn delete_game(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_trivia_store().await?;
    editable_game(&store, game_id, user).await?;
    if !store.delete_game(game_id).await? {
        return Err(ServiceError::NotFound(format!("game `{game_id}` not found")));
    }
    Ok(())
}

/// Replace the join passcode, for when the generator produces something a
/// host would rather not read out loud.
pub async fn regenerate_passcode(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
) -> Result<GamePasscodeResponse, ServiceError> {
    let store = state.require_trivia_store().await?;
    let mut game = editable_game(&store, game_id, user).await?;
    game.passcode = state.config().new_passcode();
    game.updated_at = SystemTime::now();
    store.save_game(game.clone()).await?;
    Ok(GamePasscodeResponse {
        game_id: game.id,
        passcode: game.passcode,
    })
}

/// Every grant on a game.
pub async fn list_grants(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
) -> Result<Vec<GrantView>, ServiceError> {
    let store = state.require_trivia_store().await?;
    require_capability(&store, game_id, user, Capability::Edit).await?;
    Ok(store
        .list_grants_for_game(game_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// Insert or replace a user's grant. Allowed while the game is open so a
/// co-host can join mid-game.
pub async fn set_grant(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
    payload: GrantRequest,
) -> Result<GrantView, ServiceError> {
    let store = state.require_trivia_store().await?;
    authorized_game(&store, game_id, user, Capability::Edit).await?;
    let grant = HostGrantEntity {
        game_id,
        user: payload.user.trim().to_owned(),
        can_view: payload.can_view,
        can_host: payload.can_host,
        can_edit: payload.can_edit,
    };
    store.set_grant(grant.clone()).await?;
    Ok(grant.into())
}

/// Remove a user's grant entirely.
pub async fn remove_grant(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
    target: &str,
) -> Result<(), ServiceError> {
    let store = state.require_trivia_store().await?;
    authorized_game(&store, game_id, user, Capability::Edit).await?;
    if !store.remove_grant(game_id, target.to_owned()).await? {
        return Err(ServiceError::NotFound(format!(
            "no grant for `{target}` on this game"
        )));
    }
    Ok(())
}

/// Append a page at the end of the game.
pub async fn create_page(
    state: &SharedState,
    user: &str,
    game_id: Uuid,
    payload: CreatePageRequest,
) -> Result<EditorPageView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let game = editable_game(&store, game_id, user).await?;
    let siblings = page_orders(&store, game_id).await?;
    let page = PageEntity {
        id: Uuid::new_v4(),
        game_id,
        order: ordering::next_order(&siblings),
        state: PageState::Locked,
        title: payload.title.trim().to_owned(),
        description: payload.description.trim().to_owned(),
        hidden: payload.hidden,
    };
    store.save_page(page.clone()).await?;
    play_service::touch_game(state, game).await?;
    Ok(EditorPageView::new(page, Vec::new()))
}

/// Edit a page's title, description, or hidden flag.
pub async fn update_page(
    state: &SharedState,
    user: &str,
    page_id: Uuid,
    payload: UpdatePageRequest,
) -> Result<EditorPageView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let mut page = find_page(&store, page_id).await?;
    let game = editable_game(&store, page.game_id, user).await?;
    page.title = payload.title.trim().to_owned();
    page.description = payload.description.trim().to_owned();
    page.hidden = payload.hidden;
    store.save_page(page.clone()).await?;
    play_service::touch_game(state, game).await?;
    let questions = store.list_questions(page.id).await?;
    Ok(EditorPageView::new(page, questions))
}

/// Delete a page; later siblings close the gap.
pub async fn delete_page(
    state: &SharedState,
    user: &str,
    page_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_trivia_store().await?;
    let page = find_page(&store, page_id).await?;
    let game = editable_game(&store, page.game_id, user).await?;
    store.delete_page(page_id).await?;
    play_service::touch_game(state, game).await?;
    Ok(())
}

/// Swap a page with its neighbour.
pub async fn move_page(
    state: &SharedState,
    user: &str,
    page_id: Uuid,
    direction: MoveDirection,
) -> Result<EditorGameView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let page = find_page(&store, page_id).await?;
    let game = editable_game(&store, page.game_id, user).await?;
    let siblings = page_orders(&store, game.id).await?;
    let writes = ordering::plan_move(&siblings, page_id, direction).map_err(move_error)?;
    store.apply_page_order(game.id, writes).await?;
    play_service::touch_game(state, game.clone()).await?;
    get_game(state, user, game.id).await
}

/// Append a question at the end of a page.
pub async fn create_question(
    state: &SharedState,
    user: &str,
    page_id: Uuid,
    payload: CreateQuestionRequest,
) -> Result<EditorPageView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let page = find_page(&store, page_id).await?;
    let game = editable_game(&store, page.game_id, user).await?;
    let siblings = question_orders(&store, page_id).await?;
    let question = QuestionEntity {
        id: Uuid::new_v4(),
        page_id,
        order: ordering::next_order(&siblings),
        text: payload.text.trim().to_owned(),
        answer: payload.answer.trim().to_owned(),
        possible_points: payload.possible_points,
    };
    store.save_question(question).await?;
    play_service::touch_game(state, game).await?;
    let questions = store.list_questions(page.id).await?;
    Ok(EditorPageView::new(page, questions))
}

/// Edit a question in place.
pub async fn update_question(
    state: &SharedState,
    user: &str,
    question_id: Uuid,
    payload: UpdateQuestionRequest,
) -> Result<EditorPageView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let mut question = find_question(&store, question_id).await?;
    let page = find_page(&store, question.page_id).await?;
    let game = editable_game(&store, page.game_id, user).await?;
    question.text = payload.text.trim().to_owned();
    question.answer = payload.answer.trim().to_owned();
    question.possible_points = payload.possible_points;
    store.save_question(question).await?;
    play_service::touch_game(state, game).await?;
    let questions = store.list_questions(page.id).await?;
    Ok(EditorPageView::new(page, questions))
}

/// Delete a question; later siblings close the gap.
pub async fn delete_question(
    state: &SharedState,
    user: &str,
    question_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_trivia_store().await?;
    let question = find_question(&store, question_id).await?;
    let page = find_page(&store, question.page_id).await?;
    let game = editable_game(&store, page.game_id, user).await?;
    store.delete_question(question_id).await?;
    play_service::touch_game(state, game).await?;
    Ok(())
}

/// Swap a question with its neighbour.
pub async fn move_question(
    state: &SharedState,
    user: &str,
    question_id: Uuid,
    direction: MoveDirection,
) -> Result<EditorPageView, ServiceError> {
    let store = state.require_trivia_store().await?;
    let question = find_question(&store, question_id).await?;
    let page = find_page(&store, question.page_id).await?;
    let game = editable_game(&store, page.game_id, user).await?;
    let siblings = question_orders(&store, page.id).await?;
    let writes = ordering::plan_move(&siblings, question_id, direction).map_err(move_error)?;
    store.apply_question_order(page.id, writes).await?;
    play_service::touch_game(state, game).await?;
    let questions = store.list_questions(page.id).await?;
    Ok(EditorPageView::new(page, questions))
}

async fn find_page(
    store: &Arc<dyn TriviaStore>,
    page_id: Uuid,
) -> Result<PageEntity, ServiceError> {
    store
        .find_page(page_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("page `{page_id}` not found")))
}

async fn find_question(
    store: &Arc<dyn TriviaStore>,
    question_id: Uuid,
) -> Result<QuestionEntity, ServiceError> {
    store
        .find_question(question_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("question `{question_id}` not found")))
}

async fn page_orders(
    store: &Arc<dyn TriviaStore>,
    game_id: Uuid,
) -> Result<Vec<(Uuid, u32)>, ServiceError> {
    Ok(store
        .list_pages(game_id)
        .await?
        .into_iter()
        .map(|page| (page.id, page.order))
        .collect())
}

async fn question_orders(
    store: &Arc<dyn TriviaStore>,
    page_id: Uuid,
) -> Result<Vec<(Uuid, u32)>, ServiceError> {
    Ok(store
        .list_questions(page_id)
        .await?
        .into_iter()
        .map(|question| (question.id, question.order))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::trivia_store::memory::MemoryTriviaStore,
        dto::play::{CreateTeamRequest, JoinGameRequest, SubmitResponseRequest},
        services::{host_service, play_service},
        state::AppState,
    };

    async fn state_with_store() -> crate::state::SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_trivia_store(Arc::new(MemoryTriviaStore::new()))
            .await;
        state
    }

    async fn seeded_game(state: &crate::state::SharedState) -> EditorGameView {
        create_game(
            state,
            "dana",
            CreateGameRequest {
                name: "Thursday Quiz".into(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn creator_gets_full_capabilities() {
        let state = state_with_store().await;
        let game = seeded_game(&state).await;

        // The creator can immediately edit and host.
        assert!(get_game(&state, "dana", game.id).await.is_ok());
        assert!(
            host_service::game_board(&state, "dana", game.id)
                .await
                .is_ok()
        );
        // A stranger cannot.
        let err = get_game(&state, "mallory", game.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn structural_edits_require_a_closed_game() {
        let state = state_with_store().await;
        let game = seeded_game(&state).await;

        host_service::set_game_state(&state, "dana", game.id, GameState::AcceptingTeams)
            .await
            .unwrap();

        let err = create_page(
            &state,
            "dana",
            game.id,
            CreatePageRequest {
                title: "Round 1".into(),
                description: String::new(),
                hidden: false,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        // Grant management stays available mid-game.
        set_grant(
            &state,
            "dana",
            game.id,
            GrantRequest {
                user: "casey".into(),
                can_view: true,
                can_host: true,
                can_edit: false,
            },
        )
        .await
        .unwrap();
        assert!(
            host_service::game_board(&state, "casey", game.id)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn pages_append_and_swap_with_dense_orders() {
        let state = state_with_store().await;
        let game = seeded_game(&state).await;

        for title in ["Openers", "Music", "Geography"] {
            create_page(
                &state,
                "dana",
                game.id,
                CreatePageRequest {
                    title: title.into(),
                    description: String::new(),
                    hidden: false,
                },
            )
            .await
            .unwrap();
        }

        let view = get_game(&state, "dana", game.id).await.unwrap();
        assert_eq!(
            view.pages.iter().map(|page| page.order).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        let music = view.pages[1].id;
        let after = move_page(&state, "dana", music, MoveDirection::Up)
            .await
            .unwrap();
        assert_eq!(after.pages[0].title, "Music");
        assert_eq!(after.pages[1].title, "Openers");
        assert_eq!(
            after.pages.iter().map(|page| page.order).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn grading_is_gated_on_scoring_state_and_point_bounds() {
        let state = state_with_store().await;
        let game = seeded_game(&state).await;
        let page = create_page(
            &state,
            "dana",
            game.id,
            CreatePageRequest {
                title: "Round 1".into(),
                description: String::new(),
                hidden: false,
            },
        )
        .await
        .unwrap();
        let page_view = create_question(
            &state,
            "dana",
            page.id,
            CreateQuestionRequest {
                text: "Capital of France?".into(),
                answer: "Paris".into(),
                possible_points: 3,
            },
        )
        .await
        .unwrap();
        let question_id = page_view.questions[0].id;

        host_service::set_game_state(&state, "dana", game.id, GameState::AcceptingTeams)
            .await
            .unwrap();
        host_service::set_page_state(&state, "dana", game.id, page.id, PageState::Open)
            .await
            .unwrap();

        // A player joins, registers, and answers.
        let token = "player-token";
        play_service::join(
            &state,
            token,
            JoinGameRequest {
                game_id: game.id,
                passcode: game.passcode.clone(),
            },
        )
        .await
        .unwrap();
        play_service::register_team(
            &state,
            token,
            CreateTeamRequest {
                name: "The Regulars".into(),
                members: String::new(),
            },
        )
        .await
        .unwrap();
        play_service::save_response(
            &state,
            token,
            question_id,
            SubmitResponseRequest {
                value: "Paris".into(),
            },
        )
        .await
        .unwrap();

        let responses =
            host_service::page_responses(&state, "dana", game.id, page.id).await.unwrap();
        let response_id = responses.questions[0].responses[0].response_id;

        // Grading an open page is refused.
        let err = host_service::assign_score(&state, "dana", game.id, response_id, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        host_service::set_page_state(&state, "dana", game.id, page.id, PageState::Scoring)
            .await
            .unwrap();

        // Over the possible points is refused.
        let err = host_service::assign_score(&state, "dana", game.id, response_id, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let graded = host_service::assign_score(&state, "dana", game.id, response_id, 3)
            .await
            .unwrap();
        assert!(graded.graded);
        assert_eq!(graded.score, 3);

        // A negative score retracts the grade.
        let retracted = host_service::assign_score(&state, "dana", game.id, response_id, -1)
            .await
            .unwrap();
        assert!(!retracted.graded);
        assert_eq!(retracted.score, 0);
    }

    #[tokio::test]
    async fn joining_requires_an_open_game_and_the_right_passcode() {
        let state = state_with_store().await;
        let game = seeded_game(&state).await;
        let token = "someone";

        // Closed games are invisible even with the right passcode.
        let err = play_service::join(
            &state,
            token,
            JoinGameRequest {
                game_id: game.id,
                passcode: game.passcode.clone(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        host_service::set_game_state(&state, "dana", game.id, GameState::AcceptingTeams)
            .await
            .unwrap();

        let err = play_service::join(
            &state,
            token,
            JoinGameRequest {
                game_id: game.id,
                passcode: "WWWWWWWWWW".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        // Case and padding are forgiven.
        let typed = format!("  {}  ", game.passcode.to_lowercase());
        let home = play_service::join(
            &state,
            token,
            JoinGameRequest {
                game_id: game.id,
                passcode: typed,
            },
        )
        .await
        .unwrap();
        assert!(home.game.is_some());
    }

    #[tokio::test]
    async fn roster_freezes_in_no_new_teams() {
        let state = state_with_store().await;
        let game = seeded_game(&state).await;
        host_service::set_game_state(&state, "dana", game.id, GameState::NoNewTeams)
            .await
            .unwrap();

        let token = "latecomer";
        play_service::join(
            &state,
            token,
            JoinGameRequest {
                game_id: game.id,
                passcode: game.passcode.clone(),
            },
        )
        .await
        .unwrap();

        let err = play_service::register_team(
            &state,
            token,
            CreateTeamRequest {
                name: "Too Late".into(),
                members: String::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
