//! Request and response shapes for the editor-facing routes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{GameEntity, GameState, HostGrantEntity, PageEntity, PageState, QuestionEntity},
    dto::format_system_time,
    ordering::MoveDirection,
};

/// Payload creating a new game shell.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    #[validate(length(min = 1, max = 128, message = "Game name must be 1 to 128 characters"))]
    pub name: String,
}

/// Payload renaming a game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateGameRequest {
    #[validate(length(min = 1, max = 128, message = "Game name must be 1 to 128 characters"))]
    pub name: String,
}

/// Payload creating a page at the end of the game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreatePageRequest {
    #[validate(length(min = 1, max = 128, message = "Page title must be 1 to 128 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2048, message = "Description is limited to 2048 characters"))]
    pub description: String,
    /// Hidden pages never appear to players and are not leaderboard rounds.
    #[serde(default)]
    pub hidden: bool,
}

/// Payload editing a page in place.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdatePageRequest {
    #[validate(length(min = 1, max = 128, message = "Page title must be 1 to 128 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2048, message = "Description is limited to 2048 characters"))]
    pub description: String,
    #[serde(default)]
    pub hidden: bool,
}

/// Payload swapping an item with its neighbour.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveRequest {
    pub direction: MoveDirection,
}

/// Payload creating a question at the end of a page.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1024, message = "Question text must be 1 to 1024 characters"))]
    pub text: String,
    #[serde(default)]
    #[validate(length(max = 1024, message = "Answer is limited to 1024 characters"))]
    pub answer: String,
    #[validate(range(min = 1, max = 1000, message = "Possible points must be between 1 and 1000"))]
    pub possible_points: i32,
}

/// Payload editing a question in place.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 1024, message = "Question text must be 1 to 1024 characters"))]
    pub text: String,
    #[serde(default)]
    #[validate(length(max = 1024, message = "Answer is limited to 1024 characters"))]
    pub answer: String,
    #[validate(range(min = 1, max = 1000, message = "Possible points must be between 1 and 1000"))]
    pub possible_points: i32,
}

/// Grant or update another user's capabilities on a game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GrantRequest {
    #[validate(length(min = 1, max = 64, message = "User must be 1 to 64 characters"))]
    pub user: String,
    #[serde(default)]
    pub can_view: bool,
    #[serde(default)]
    pub can_host: bool,
    #[serde(default)]
    pub can_edit: bool,
}

/// One capability grant as shown in the editor.
#[derive(Debug, Serialize, ToSchema)]
pub struct GrantView {
    pub user: String,
    pub can_view: bool,
    pub can_host: bool,
    pub can_edit: bool,
}

impl From<HostGrantEntity> for GrantView {
    fn from(grant: HostGrantEntity) -> Self {
        Self {
            user: grant.user,
            can_view: grant.can_view,
            can_host: grant.can_host,
            can_edit: grant.can_edit,
        }
    }
}

/// One question in the editor view, reference answer included.
#[derive(Debug, Serialize, ToSchema)]
pub struct EditorQuestionView {
    pub id: Uuid,
    pub order: u32,
    pub text: String,
    pub answer: String,
    pub possible_points: i32,
}

impl From<QuestionEntity> for EditorQuestionView {
    fn from(question: QuestionEntity) -> Self {
        Self {
            id: question.id,
            order: question.order,
            text: question.text,
            answer: question.answer,
            possible_points: question.possible_points,
        }
    }
}

/// One page with its questions in the editor view.
#[derive(Debug, Serialize, ToSchema)]
pub struct EditorPageView {
    pub id: Uuid,
    pub order: u32,
    pub title: String,
    pub description: String,
    pub state: PageState,
    pub hidden: bool,
    pub questions: Vec<EditorQuestionView>,
}

impl EditorPageView {
    /// Assemble a page and its questions.
    pub fn new(page: PageEntity, questions: Vec<QuestionEntity>) -> Self {
        Self {
            id: page.id,
            order: page.order,
            title: page.title,
            description: page.description,
            state: page.state,
            hidden: page.hidden,
            questions: questions.into_iter().map(Into::into).collect(),
        }
    }
}

/// The full editable game.
#[derive(Debug, Serialize, ToSchema)]
pub struct EditorGameView {
    pub id: Uuid,
    pub name: String,
    pub state: GameState,
    pub passcode: String,
    pub created_at: String,
    pub updated_at: String,
    pub pages: Vec<EditorPageView>,
}

impl EditorGameView {
    /// Assemble the editable game from its parts.
    pub fn new(game: GameEntity, pages: Vec<EditorPageView>) -> Self {
        Self {
            id: game.id,
            name: game.name,
            state: game.state,
            passcode: game.passcode,
            created_at: format_system_time(game.created_at),
            updated_at: format_system_time(game.updated_at),
            pages,
        }
    }
}

/// A game's join passcode after regeneration.
#[derive(Debug, Serialize, ToSchema)]
pub struct GamePasscodeResponse {
    pub game_id: Uuid,
    pub passcode: String,
}
