/// In-process backend backed by plain maps.
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    GameEntity, GameListItemEntity, HostGrantEntity, PageEntity, QuestionEntity, ResponseEntity,
    TeamEntity,
};
use crate::dao::storage::StorageResult;
use crate::ordering::OrderWrite;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for games and everything under
/// them.
///
/// Sibling-order writes (`apply_page_order`, `apply_question_order`) and the
/// renumbering deletes are applied atomically by every backend, so the dense
/// 1..N order invariant never leaks an intermediate state to readers.
pub trait TriviaStore: Send + Sync {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>>;
    /// Delete a game and cascade to its pages, questions, teams, responses,
    /// and grants. Returns whether the game existed.
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn save_page(&self, page: PageEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_page(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PageEntity>>>;
    /// Pages of a game sorted by `order`, hidden ones included.
    fn list_pages(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PageEntity>>>;
    /// Delete a page, cascade to its questions and their responses, and close
    /// the order gap among the remaining siblings. Returns whether the page
    /// existed.
    fn delete_page(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Apply a staged sequence of page order writes as one atomic unit.
    fn apply_page_order(
        &self,
        game_id: Uuid,
        writes: Vec<OrderWrite>,
    ) -> BoxFuture<'static, StorageResult<()>>;

    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    /// Questions of a page sorted by `order`.
    fn list_questions(&self, page_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    /// Delete a question, cascade to its responses, and close the order gap.
    /// Returns whether the question existed.
    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Apply a staged sequence of question order writes as one atomic unit.
    fn apply_question_order(
        &self,
        page_id: Uuid,
        writes: Vec<OrderWrite>,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Insert or update a team. Rejects a name already taken by another team
    /// of the same game with [`StorageError::Conflict`].
    ///
    /// [`StorageError::Conflict`]: crate::dao::storage::StorageError::Conflict
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    fn list_teams(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// Delete a team and cascade to its responses. Returns whether the team
    /// existed.
    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Write a team's answer to a question, keyed by `(question_id, team_id)`.
    /// A second write for the same key updates the existing row in place and
    /// keeps its id.
    fn upsert_response(
        &self,
        response: ResponseEntity,
    ) -> BoxFuture<'static, StorageResult<ResponseEntity>>;
    fn find_response(
        &self,
        question_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ResponseEntity>>>;
    fn find_response_by_id(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ResponseEntity>>>;
    fn list_responses_for_team(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ResponseEntity>>>;
    fn list_responses_for_game(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ResponseEntity>>>;
    /// Retract a team's answer. Returns whether a response existed.
    fn delete_response(
        &self,
        question_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert or replace the grant for `(grant.game_id, grant.user)`.
    fn set_grant(&self, grant: HostGrantEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_grant(
        &self,
        game_id: Uuid,
        user: String,
    ) -> BoxFuture<'static, StorageResult<Option<HostGrantEntity>>>;
    fn list_grants_for_game(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<HostGrantEntity>>>;
    fn list_grants_for_user(
        &self,
        user: String,
    ) -> BoxFuture<'static, StorageResult<Vec<HostGrantEntity>>>;
    /// Returns whether a grant existed.
    fn remove_grant(
        &self,
        game_id: Uuid,
        user: String,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
