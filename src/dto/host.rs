//! Request and response shapes for the host-facing routes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{
        GameEntity, GameListItemEntity, GameState, PageEntity, PageState, QuestionEntity,
        ResponseEntity, TeamEntity,
    },
    dto::{common::TeamSummary, format_system_time, validation::validate_not_blank},
};

/// One game in the host's game list.
#[derive(Debug, Serialize, ToSchema)]
pub struct HostGameListItem {
    pub id: Uuid,
    pub name: String,
    pub state: GameState,
    pub updated_at: String,
    pub team_count: usize,
    pub page_count: usize,
}

impl From<GameListItemEntity> for HostGameListItem {
    fn from(item: GameListItemEntity) -> Self {
        Self {
            id: item.id,
            name: item.name,
            state: item.state,
            updated_at: format_system_time(item.updated_at),
            team_count: item.team_count,
            page_count: item.page_count,
        }
    }
}

/// One round as the host board shows it.
#[derive(Debug, Serialize, ToSchema)]
pub struct HostPageView {
    pub id: Uuid,
    pub order: u32,
    pub title: String,
    pub state: PageState,
    pub hidden: bool,
}

impl From<PageEntity> for HostPageView {
    fn from(page: PageEntity) -> Self {
        Self {
            id: page.id,
            order: page.order,
            title: page.title,
            state: page.state,
            hidden: page.hidden,
        }
    }
}

/// Full host board for one game.
#[derive(Debug, Serialize, ToSchema)]
pub struct HostGameView {
    pub id: Uuid,
    pub name: String,
    pub state: GameState,
    /// Join passcode to read out to the room.
    pub passcode: String,
    pub updated_at: String,
    /// Points available across visible rounds.
    pub max_points: i32,
    /// Points parked on hidden pages, reported separately.
    pub hidden_points: i32,
    pub pages: Vec<HostPageView>,
    pub teams: Vec<TeamSummary>,
    /// Usernames holding the host capability on this game.
    pub hosts: Vec<String>,
}

impl HostGameView {
    /// Assemble the board from the game and its children.
    pub fn new(
        game: GameEntity,
        pages: Vec<PageEntity>,
        teams: Vec<TeamEntity>,
        hosts: Vec<String>,
        max_points: i32,
        hidden_points: i32,
    ) -> Self {
        Self {
            id: game.id,
            name: game.name,
            state: game.state,
            passcode: game.passcode,
            updated_at: format_system_time(game.updated_at),
            max_points,
            hidden_points,
            pages: pages.into_iter().map(Into::into).collect(),
            teams: teams.into_iter().map(Into::into).collect(),
            hosts,
        }
    }
}

/// Request to move a game through its lifecycle.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetGameStateRequest {
    pub state: GameState,
}

/// Request to toggle a round's visibility state.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPageStateRequest {
    pub state: PageState,
}

/// One submitted answer, as seen in the grading view.
#[derive(Debug, Serialize, ToSchema)]
pub struct GradingResponseView {
    pub response_id: Uuid,
    pub team_id: Uuid,
    pub team_name: String,
    pub value: String,
    pub graded: bool,
    pub score: i32,
}

impl GradingResponseView {
    /// Pair a response with the team that submitted it.
    pub fn new(response: ResponseEntity, team_name: String) -> Self {
        Self {
            response_id: response.id,
            team_id: response.team_id,
            team_name,
            value: response.value,
            graded: response.graded,
            score: response.score,
        }
    }
}

/// One question with every team's answer, reference answer included.
#[derive(Debug, Serialize, ToSchema)]
pub struct GradingQuestionView {
    pub question_id: Uuid,
    pub order: u32,
    pub text: String,
    pub answer: String,
    pub possible_points: i32,
    pub responses: Vec<GradingResponseView>,
}

impl GradingQuestionView {
    /// Assemble the grading row for one question.
    pub fn new(question: QuestionEntity, responses: Vec<GradingResponseView>) -> Self {
        Self {
            question_id: question.id,
            order: question.order,
            text: question.text,
            answer: question.answer,
            possible_points: question.possible_points,
            responses,
        }
    }
}

/// The grading view for one page.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageResponsesView {
    pub page_id: Uuid,
    pub order: u32,
    pub title: String,
    pub state: PageState,
    pub questions: Vec<GradingQuestionView>,
}

/// Score to assign to a response. Negative values retract the grade.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScoreRequest {
    pub score: i32,
}

/// Result of a grading action.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreUpdateResponse {
    pub response_id: Uuid,
    pub graded: bool,
    pub score: i32,
}

impl From<ResponseEntity> for ScoreUpdateResponse {
    fn from(response: ResponseEntity) -> Self {
        Self {
            response_id: response.id,
            graded: response.graded,
            score: response.score,
        }
    }
}

/// One team on the host's team-care panel, rejoin passcode included.
#[derive(Debug, Serialize, ToSchema)]
pub struct HostTeamView {
    pub id: Uuid,
    pub name: String,
    pub members: String,
    pub passcode: String,
}

impl From<TeamEntity> for HostTeamView {
    fn from(team: TeamEntity) -> Self {
        Self {
            id: team.id,
            name: team.name,
            members: team.members,
            passcode: team.passcode,
        }
    }
}

/// Host-side edit of a team's name or member list.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateTeamRequest {
    #[validate(
        length(min = 1, max = 64, message = "Team name must be 1 to 64 characters"),
        custom(function = validate_not_blank)
    )]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 256, message = "Member list is limited to 256 characters"))]
    pub members: String,
}

/// A team's rejoin passcode, shown to the host on demand.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamPasscodeResponse {
    pub team_id: Uuid,
    pub passcode: String,
}
