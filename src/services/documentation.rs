use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trivia Night Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::play::home,
        crate::routes::play::join,
        crate::routes::play::register_team,
        crate::routes::play::rejoin,
        crate::routes::play::leave,
        crate::routes::play::board,
        crate::routes::play::page,
        crate::routes::play::save_response,
        crate::routes::play::retract_response,
        crate::routes::play::leaderboard,
        crate::routes::host::list_games,
        crate::routes::host::game_board,
        crate::routes::host::set_game_state,
        crate::routes::host::set_page_state,
        crate::routes::host::page_responses,
        crate::routes::host::assign_score,
        crate::routes::host::leaderboard,
        crate::routes::host::get_team,
        crate::routes::host::update_team,
        crate::routes::host::remove_team,
        crate::routes::host::regenerate_team_passcode,
        crate::routes::editor::create_game,
        crate::routes::editor::get_game,
        crate::routes::editor::update_game,
        crate::routes::editor::delete_game,
        crate::routes::editor::regenerate_passcode,
        crate::routes::editor::list_grants,
        crate::routes::editor::set_grant,
        crate::routes::editor::remove_grant,
        crate::routes::editor::create_page,
        crate::routes::editor::update_page,
        crate::routes::editor::delete_page,
        crate::routes::editor::move_page,
        crate::routes::editor::create_question,
        crate::routes::editor::update_question,
        crate::routes::editor::delete_question,
        crate::routes::editor::move_question,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::common::TeamSummary,
            crate::dto::play::JoinGameRequest,
            crate::dto::play::CreateTeamRequest,
            crate::dto::play::RejoinRequest,
            crate::dto::play::SubmitResponseRequest,
            crate::dto::play::PlayerGameView,
            crate::dto::play::PlayerTeamView,
            crate::dto::play::HomeView,
            crate::dto::play::BoardTile,
            crate::dto::play::BoardView,
            crate::dto::play::ResponseView,
            crate::dto::play::PageQuestionView,
            crate::dto::play::PageView,
            crate::dto::play::StandingView,
            crate::dto::play::LeaderboardView,
            crate::dto::host::HostGameListItem,
            crate::dto::host::HostPageView,
            crate::dto::host::HostGameView,
            crate::dto::host::SetGameStateRequest,
            crate::dto::host::SetPageStateRequest,
            crate::dto::host::GradingResponseView,
            crate::dto::host::GradingQuestionView,
            crate::dto::host::PageResponsesView,
            crate::dto::host::ScoreRequest,
            crate::dto::host::ScoreUpdateResponse,
            crate::dto::host::HostTeamView,
            crate::dto::host::UpdateTeamRequest,
            crate::dto::host::TeamPasscodeResponse,
            crate::dto::editor::CreateGameRequest,
            crate::dto::editor::UpdateGameRequest,
            crate::dto::editor::CreatePageRequest,
            crate::dto::editor::UpdatePageRequest,
            crate::dto::editor::MoveRequest,
            crate::dto::editor::CreateQuestionRequest,
            crate::dto::editor::UpdateQuestionRequest,
            crate::dto::editor::GrantRequest,
            crate::dto::editor::GrantView,
            crate::dto::editor::EditorQuestionView,
            crate::dto::editor::EditorPageView,
            crate::dto::editor::EditorGameView,
            crate::dto::editor::GamePasscodeResponse,
            crate::error::FieldError,
            crate::dao::models::GameState,
            crate::dao::models::PageState,
            crate::ordering::MoveDirection,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "play", description = "Player operations keyed by play token"),
        (name = "host", description = "Host operations for running a live game"),
        (name = "editor", description = "Authoring operations for games, pages, and questions"),
    )
)]
pub struct ApiDoc;
