//! Request and response shapes for the player-facing routes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{GameEntity, GameState, PageState, QuestionEntity, ResponseEntity, TeamEntity},
    dto::validation::{validate_not_blank, validate_passcode},
    leaderboard::{Leaderboard, Standing},
};

/// Payload presented by a player joining a game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinGameRequest {
    /// Game to join.
    pub game_id: Uuid,
    /// Join passcode, case-insensitive.
    #[validate(custom(function = validate_passcode))]
    pub passcode: String,
}

/// Payload registering a new team in the joined game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTeamRequest {
    #[validate(
        length(min = 1, max = 64, message = "Team name must be 1 to 64 characters"),
        custom(function = validate_not_blank)
    )]
    pub name: String,
    /// Free-text member list, for display only.
    #[serde(default)]
    #[validate(length(max = 256, message = "Member list is limited to 256 characters"))]
    pub members: String,
}

/// Payload reattaching a token to an existing team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RejoinRequest {
    /// Team to rejoin.
    pub team_id: Uuid,
    /// Team rejoin passcode, case-insensitive.
    #[validate(custom(function = validate_passcode))]
    pub passcode: String,
}

/// Payload carrying a team's answer to one question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitResponseRequest {
    #[validate(
        length(min = 1, max = 1024, message = "Answer must be 1 to 1024 characters"),
        custom(function = validate_not_blank)
    )]
    pub value: String,
}

/// What a player may know about a game.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerGameView {
    pub id: Uuid,
    pub name: String,
    pub state: GameState,
}

impl From<GameEntity> for PlayerGameView {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game.id,
            name: game.name,
            state: game.state,
        }
    }
}

/// A player's own team, rejoin passcode included.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerTeamView {
    pub id: Uuid,
    pub name: String,
    pub members: String,
    /// Share this with teammates so they can rejoin on their own devices.
    pub passcode: String,
}

impl From<TeamEntity> for PlayerTeamView {
    fn from(team: TeamEntity) -> Self {
        Self {
            id: team.id,
            name: team.name,
            members: team.members,
            passcode: team.passcode,
        }
    }
}

/// Landing view: whatever the session still resolves to.
#[derive(Debug, Serialize, ToSchema)]
pub struct HomeView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<PlayerGameView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<PlayerTeamView>,
    /// Suggestion to seed the team registration form.
    pub team_name_idea: String,
}

/// One round tile on the player board. Locked rounds show a teaser line in
/// place of their real title.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardTile {
    pub order: u32,
    pub title: String,
    pub state: PageState,
}

/// The round board for the joined game.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardView {
    pub game: PlayerGameView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<PlayerTeamView>,
    pub pages: Vec<BoardTile>,
}

/// A team's stored answer as shown back to the team.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseView {
    pub question_id: Uuid,
    pub value: String,
    pub graded: bool,
    pub score: i32,
}

impl From<ResponseEntity> for ResponseView {
    fn from(response: ResponseEntity) -> Self {
        Self {
            question_id: response.question_id,
            value: response.value,
            graded: response.graded,
            score: response.score,
        }
    }
}

/// One question on an unlocked page, with the team's answer if any.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageQuestionView {
    pub id: Uuid,
    pub order: u32,
    pub text: String,
    pub possible_points: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseView>,
}

impl PageQuestionView {
    /// Pair a question with the answering team's stored response.
    pub fn new(question: QuestionEntity, response: Option<ResponseEntity>) -> Self {
        Self {
            id: question.id,
            order: question.order,
            text: question.text,
            possible_points: question.possible_points,
            response: response.map(Into::into),
        }
    }
}

/// A full unlocked page as players see it.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageView {
    pub order: u32,
    pub title: String,
    pub description: String,
    /// Whether answers are currently accepted.
    pub answerable: bool,
    pub questions: Vec<PageQuestionView>,
}

/// One row of the standings table.
#[derive(Debug, Serialize, ToSchema)]
pub struct StandingView {
    pub team_id: Uuid,
    pub name: String,
    pub members: String,
    /// Points per round, aligned with the `rounds` list.
    pub by_round: Vec<i32>,
    pub total: i32,
}

impl From<Standing> for StandingView {
    fn from(standing: Standing) -> Self {
        Self {
            team_id: standing.team_id,
            name: standing.name,
            members: standing.members,
            by_round: standing.by_round,
            total: standing.total,
        }
    }
}

/// Standings for all teams in the game.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardView {
    pub rounds: Vec<u32>,
    pub standings: Vec<StandingView>,
    /// Teams sharing the top total; empty until someone scores.
    pub winners: Vec<String>,
}

impl From<Leaderboard> for LeaderboardView {
    fn from(board: Leaderboard) -> Self {
        Self {
            rounds: board.rounds,
            standings: board.standings.into_iter().map(Into::into).collect(),
            winners: board.winners,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_team_name_is_rejected() {
        let request = CreateTeamRequest {
            name: "   ".to_owned(),
            members: String::new(),
        };
        assert!(request.validate().is_err());

        let request = CreateTeamRequest {
            name: " The Quizzard of Oz ".to_owned(),
            members: String::new(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn whitespace_only_answer_is_rejected() {
        let request = SubmitResponseRequest {
            value: " \t ".to_owned(),
        };
        assert!(request.validate().is_err());

        let request = SubmitResponseRequest {
            value: "42".to_owned(),
        };
        assert!(request.validate().is_ok());
    }
}
