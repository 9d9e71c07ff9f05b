//! Entity definitions shared by every storage backend.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle state of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// Players can neither see rounds nor join; editors may work.
    Closed,
    /// Game is live and new teams may register.
    AcceptingTeams,
    /// Game is live but the roster is frozen.
    NoNewTeams,
}

impl GameState {
    /// Whether players can currently see and play the game.
    pub fn is_open(self) -> bool {
        !matches!(self, GameState::Closed)
    }

    /// Whether new teams may still register.
    pub fn accepts_teams(self) -> bool {
        matches!(self, GameState::AcceptingTeams)
    }
}

/// Visibility/answerability state of a single page (round).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    /// Players cannot see the page at all.
    Locked,
    /// Players can see and answer the page.
    Open,
    /// Players can see, but not answer, the page.
    Scoring,
}

/// One trivia session with its own passcode, teams, and rounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name of the game.
    pub name: String,
    /// Join passcode players present together with the game id.
    pub passcode: String,
    /// Lifecycle state.
    pub state: GameState,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the game or its children were edited.
    pub updated_at: SystemTime,
}

/// Subset of [`GameEntity`] returned when listing games for hosts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameListItemEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name of the game.
    pub name: String,
    /// Lifecycle state.
    pub state: GameState,
    /// Last time the game or its children were edited.
    pub updated_at: SystemTime,
    /// Number of registered teams.
    pub team_count: usize,
    /// Number of pages, hidden ones included.
    pub page_count: usize,
}

/// An ordered, independently lockable group of questions within a game.
///
/// `order` values within one game form a dense 1..N sequence; the store
/// backends carry a uniqueness constraint on `(game_id, order)` as an
/// integrity backstop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageEntity {
    /// Primary key of the page.
    pub id: Uuid,
    /// Owning game.
    pub game_id: Uuid,
    /// 1-based position within the game.
    pub order: u32,
    /// Visibility state.
    pub state: PageState,
    /// Round title.
    pub title: String,
    /// Round description shown to players once unlocked.
    pub description: String,
    /// Hidden pages are excluded from the leaderboard rounds.
    pub hidden: bool,
}

/// A single prompt within a page, carrying a point value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Primary key of the question.
    pub id: Uuid,
    /// Owning page.
    pub page_id: Uuid,
    /// 1-based position within the page.
    pub order: u32,
    /// Prompt shown to players.
    pub text: String,
    /// Reference answer shown to graders.
    pub answer: String,
    /// Maximum score a graded response may receive; at least 1.
    pub possible_points: i32,
}

/// A group of players sharing one set of responses within a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Primary key of the team.
    pub id: Uuid,
    /// Owning game.
    pub game_id: Uuid,
    /// Display name, unique within the game.
    pub name: String,
    /// Free-text member list, for display only.
    pub members: String,
    /// Rejoin passcode.
    pub passcode: String,
}

/// One team's answer to one question; at most one row per (question, team).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseEntity {
    /// Primary key of the response.
    pub id: Uuid,
    /// Question being answered.
    pub question_id: Uuid,
    /// Team that answered.
    pub team_id: Uuid,
    /// Free-text answer value.
    pub value: String,
    /// Whether a host has graded this response.
    pub graded: bool,
    /// Points awarded; 0 until graded.
    pub score: i32,
}

/// Capability grant for one (game, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostGrantEntity {
    /// Game the grant applies to.
    pub game_id: Uuid,
    /// Opaque user identifier supplied by the upstream proxy.
    pub user: String,
    /// May see game data.
    pub can_view: bool,
    /// May toggle game/page state and grade.
    pub can_host: bool,
    /// May author games, pages, and questions while the game is closed.
    pub can_edit: bool,
}

impl HostGrantEntity {
    /// Grant every capability to `user` on `game_id`, as game creation does.
    pub fn full(game_id: Uuid, user: impl Into<String>) -> Self {
        Self {
            game_id,
            user: user.into(),
            can_view: true,
            can_host: true,
            can_edit: true,
        }
    }
}
