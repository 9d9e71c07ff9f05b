//! Map-backed store used in tests and in deployments that can afford to lose
//! state on restart.
//!
//! Every operation takes the single table lock for its whole duration, so the
//! multi-row sequences (order writes, cascading deletes) are atomic by
//! construction.

use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::models::{
    GameEntity, GameListItemEntity, HostGrantEntity, PageEntity, QuestionEntity, ResponseEntity,
    TeamEntity,
};
use crate::dao::storage::{StorageError, StorageResult};
use crate::dao::trivia_store::TriviaStore;
use crate::ordering::{self, OrderWrite};

#[derive(Default)]
struct Tables {
    games: IndexMap<Uuid, GameEntity>,
    pages: IndexMap<Uuid, PageEntity>,
    questions: IndexMap<Uuid, QuestionEntity>,
    teams: IndexMap<Uuid, TeamEntity>,
    responses: IndexMap<Uuid, ResponseEntity>,
    grants: IndexMap<(Uuid, String), HostGrantEntity>,
}

/// Store keeping every table in process memory.
#[derive(Clone, Default)]
pub struct MemoryTriviaStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryTriviaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn cascade_questions(tables: &mut Tables, page_id: Uuid) {
        let question_ids: Vec<Uuid> = tables
            .questions
            .values()
            .filter(|question| question.page_id == page_id)
            .map(|question| question.id)
            .collect();
        for question_id in &question_ids {
            tables.questions.shift_remove(question_id);
        }
        tables
            .responses
            .retain(|_, response| !question_ids.contains(&response.question_id));
    }
}

impl TriviaStore for MemoryTriviaStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            tables.games.insert(game.id, game);
            Ok(())
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            Ok(tables.games.get(&id).cloned())
        })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            Ok(tables
                .games
                .values()
                .map(|game| GameListItemEntity {
                    id: game.id,
                    name: game.name.clone(),
                    state: game.state,
                    updated_at: game.updated_at,
                    team_count: tables
                        .teams
                        .values()
                        .filter(|team| team.game_id == game.id)
                        .count(),
                    page_count: tables
                        .pages
                        .values()
                        .filter(|page| page.game_id == game.id)
                        .count(),
                })
                .collect())
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            if tables.games.shift_remove(&id).is_none() {
                return Ok(false);
            }
            let page_ids: Vec<Uuid> = tables
                .pages
                .values()
                .filter(|page| page.game_id == id)
                .map(|page| page.id)
                .collect();
            for page_id in page_ids {
                tables.pages.shift_remove(&page_id);
                MemoryTriviaStore::cascade_questions(&mut tables, page_id);
            }
            tables.teams.retain(|_, team| team.game_id != id);
            tables.grants.retain(|_, grant| grant.game_id != id);
            Ok(true)
        })
    }

    fn save_page(&self, page: PageEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            let taken = tables.pages.values().any(|other| {
                other.id != page.id && other.game_id == page.game_id && other.order == page.order
            });
            if taken {
                return Err(StorageError::conflict(format!(
                    "page order {} already taken in game `{}`",
                    page.order, page.game_id
                )));
            }
            tables.pages.insert(page.id, page);
            Ok(())
        })
    }

    fn find_page(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PageEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            Ok(tables.pages.get(&id).cloned())
        })
    }

    fn list_pages(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PageEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            let mut pages: Vec<PageEntity> = tables
                .pages
                .values()
                .filter(|page| page.game_id == game_id)
                .cloned()
                .collect();
            pages.sort_by_key(|page| page.order);
            Ok(pages)
        })
    }

    fn delete_page(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            let Some(removed) = tables.pages.shift_remove(&id) else {
                return Ok(false);
            };
            MemoryTriviaStore::cascade_questions(&mut tables, id);

            let siblings: Vec<(Uuid, u32)> = tables
                .pages
                .values()
                .filter(|page| page.game_id == removed.game_id)
                .map(|page| (page.id, page.order))
                .collect();
            for write in ordering::shift_down_after(&siblings, removed.order) {
                if let Some(page) = tables.pages.get_mut(&write.id) {
                    page.order = write.order;
                }
            }
            Ok(true)
        })
    }

    fn apply_page_order(
        &self,
        game_id: Uuid,
        writes: Vec<OrderWrite>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            for write in writes {
                match tables.pages.get_mut(&write.id) {
                    Some(page) if page.game_id == game_id => page.order = write.order,
                    _ => {
                        return Err(StorageError::conflict(format!(
                            "page `{}` is not part of game `{game_id}`",
                            write.id
                        )));
                    }
                }
            }
            Ok(())
        })
    }

    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            let taken = tables.questions.values().any(|other| {
                other.id != question.id
                    && other.page_id == question.page_id
                    && other.order == question.order
            });
            if taken {
                return Err(StorageError::conflict(format!(
                    "question order {} already taken in page `{}`",
                    question.order, question.page_id
                )));
            }
            tables.questions.insert(question.id, question);
            Ok(())
        })
    }

    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            Ok(tables.questions.get(&id).cloned())
        })
    }

    fn list_questions(
        &self,
        page_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            let mut questions: Vec<QuestionEntity> = tables
                .questions
                .values()
                .filter(|question| question.page_id == page_id)
                .cloned()
                .collect();
            questions.sort_by_key(|question| question.order);
            Ok(questions)
        })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            let Some(removed) = tables.questions.shift_remove(&id) else {
                return Ok(false);
            };
            tables
                .responses
                .retain(|_, response| response.question_id != id);

            let siblings: Vec<(Uuid, u32)> = tables
                .questions
                .values()
                .filter(|question| question.page_id == removed.page_id)
                .map(|question| (question.id, question.order))
                .collect();
            for write in ordering::shift_down_after(&siblings, removed.order) {
                if let Some(question) = tables.questions.get_mut(&write.id) {
                    question.order = write.order;
                }
            }
            Ok(true)
        })
    }

    fn apply_question_order(
        &self,
        page_id: Uuid,
        writes: Vec<OrderWrite>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            for write in writes {
                match tables.questions.get_mut(&write.id) {
                    Some(question) if question.page_id == page_id => {
                        question.order = write.order;
                    }
                    _ => {
                        return Err(StorageError::conflict(format!(
                            "question `{}` is not part of page `{page_id}`",
                            write.id
                        )));
                    }
                }
            }
            Ok(())
        })
    }

    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            let taken = tables.teams.values().any(|other| {
                other.id != team.id && other.game_id == team.game_id && other.name == team.name
            });
            if taken {
                return Err(StorageError::conflict(format!(
                    "team name `{}` already taken in game `{}`",
                    team.name, team.game_id
                )));
            }
            tables.teams.insert(team.id, team);
            Ok(())
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            Ok(tables.teams.get(&id).cloned())
        })
    }

    fn list_teams(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            let mut teams: Vec<TeamEntity> = tables
                .teams
                .values()
                .filter(|team| team.game_id == game_id)
                .cloned()
                .collect();
            teams.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(teams)
        })
    }

    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            if tables.teams.shift_remove(&id).is_none() {
                return Ok(false);
            }
            tables.responses.retain(|_, response| response.team_id != id);
            Ok(true)
        })
    }

    fn upsert_response(
        &self,
        response: ResponseEntity,
    ) -> BoxFuture<'static, StorageResult<ResponseEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            let existing = tables
                .responses
                .values()
                .find(|other| {
                    other.question_id == response.question_id && other.team_id == response.team_id
                })
                .map(|other| other.id);
            let stored = match existing {
                Some(id) => {
                    // Keep the original row id across rewrites of the answer.
                    let slot = tables
                        .responses
                        .get_mut(&id)
                        .ok_or_else(|| StorageError::conflict("response row vanished"))?;
                    slot.value = response.value;
                    slot.graded = response.graded;
                    slot.score = response.score;
                    slot.clone()
                }
                None => {
                    tables.responses.insert(response.id, response.clone());
                    response
                }
            };
            Ok(stored)
        })
    }

    fn find_response(
        &self,
        question_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ResponseEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            Ok(tables
                .responses
                .values()
                .find(|response| {
                    response.question_id == question_id && response.team_id == team_id
                })
                .cloned())
        })
    }

    fn find_response_by_id(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ResponseEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            Ok(tables.responses.get(&id).cloned())
        })
    }

    fn list_responses_for_team(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ResponseEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            Ok(tables
                .responses
                .values()
                .filter(|response| response.team_id == team_id)
                .cloned()
                .collect())
        })
    }

    fn list_responses_for_game(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ResponseEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            let team_ids: Vec<Uuid> = tables
                .teams
                .values()
                .filter(|team| team.game_id == game_id)
                .map(|team| team.id)
                .collect();
            Ok(tables
                .responses
                .values()
                .filter(|response| team_ids.contains(&response.team_id))
                .cloned()
                .collect())
        })
    }

    fn delete_response(
        &self,
        question_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            let before = tables.responses.len();
            tables.responses.retain(|_, response| {
                !(response.question_id == question_id && response.team_id == team_id)
            });
            Ok(tables.responses.len() < before)
        })
    }

    fn set_grant(&self, grant: HostGrantEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            tables
                .grants
                .insert((grant.game_id, grant.user.clone()), grant);
            Ok(())
        })
    }

    fn find_grant(
        &self,
        game_id: Uuid,
        user: String,
    ) -> BoxFuture<'static, StorageResult<Option<HostGrantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            Ok(tables.grants.get(&(game_id, user)).cloned())
        })
    }

    fn list_grants_for_game(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<HostGrantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            Ok(tables
                .grants
                .values()
                .filter(|grant| grant.game_id == game_id)
                .cloned()
                .collect())
        })
    }

    fn list_grants_for_user(
        &self,
        user: String,
    ) -> BoxFuture<'static, StorageResult<Vec<HostGrantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            Ok(tables
                .grants
                .values()
                .filter(|grant| grant.user == user)
                .cloned()
                .collect())
        })
    }

    fn remove_grant(
        &self,
        game_id: Uuid,
        user: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            Ok(tables.grants.shift_remove(&(game_id, user)).is_some())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{GameState, PageState};
    use std::time::SystemTime;

    fn game() -> GameEntity {
        GameEntity {
            id: Uuid::new_v4(),
            name: "Pub Quiz".to_owned(),
            passcode: "ABCDEFGH24".to_owned(),
            state: GameState::Closed,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    fn page(game_id: Uuid, order: u32) -> PageEntity {
        PageEntity {
            id: Uuid::new_v4(),
            game_id,
            order,
            state: PageState::Locked,
            title: format!("Round {order}"),
            description: String::new(),
            hidden: false,
        }
    }

    fn question(page_id: Uuid, order: u32) -> QuestionEntity {
        QuestionEntity {
            id: Uuid::new_v4(),
            page_id,
            order,
            text: format!("Question {order}?"),
            answer: "42".to_owned(),
            possible_points: 1,
        }
    }

    fn team(game_id: Uuid, name: &str) -> TeamEntity {
        TeamEntity {
            id: Uuid::new_v4(),
            game_id,
            name: name.to_owned(),
            members: String::new(),
            passcode: "QUUX234679".to_owned(),
        }
    }

    fn response(question_id: Uuid, team_id: Uuid, value: &str) -> ResponseEntity {
        ResponseEntity {
            id: Uuid::new_v4(),
            question_id,
            team_id,
            value: value.to_owned(),
            graded: false,
            score: 0,
        }
    }

    #[tokio::test]
    async fn page_delete_cascades_and_renumbers() {
        // Game with pages [1, 2, 3]; page 2 has a question with a response.
        let store = MemoryTriviaStore::new();
        let game = game();
        store.save_game(game.clone()).await.unwrap();

        let pages: Vec<PageEntity> = (1..=3).map(|order| page(game.id, order)).collect();
        for p in &pages {
            store.save_page(p.clone()).await.unwrap();
        }
        let q = question(pages[1].id, 1);
        store.save_question(q.clone()).await.unwrap();
        let t = team(game.id, "Quizzards");
        store.save_team(t.clone()).await.unwrap();
        store
            .upsert_response(response(q.id, t.id, "an answer"))
            .await
            .unwrap();

        assert!(store.delete_page(pages[1].id).await.unwrap());

        assert!(store.find_question(q.id).await.unwrap().is_none());
        assert!(store.find_response(q.id, t.id).await.unwrap().is_none());

        let remaining = store.list_pages(game.id).await.unwrap();
        let orders: Vec<(Uuid, u32)> = remaining.iter().map(|p| (p.id, p.order)).collect();
        assert_eq!(orders, vec![(pages[0].id, 1), (pages[2].id, 2)]);
    }

    #[tokio::test]
    async fn response_upsert_updates_in_place() {
        let store = MemoryTriviaStore::new();
        let game = game();
        store.save_game(game.clone()).await.unwrap();
        let p = page(game.id, 1);
        store.save_page(p.clone()).await.unwrap();
        let q = question(p.id, 1);
        store.save_question(q.clone()).await.unwrap();
        let t = team(game.id, "Sharp As A Bowling Ball");
        store.save_team(t.clone()).await.unwrap();

        let first = store
            .upsert_response(response(q.id, t.id, "first try"))
            .await
            .unwrap();
        let second = store
            .upsert_response(response(q.id, t.id, "second thoughts"))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.value, "second thoughts");
        assert_eq!(store.list_responses_for_team(t.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_team_name_is_rejected() {
        let store = MemoryTriviaStore::new();
        let first = game();
        store.save_game(first.clone()).await.unwrap();
        store.save_team(team(first.id, "Les Quizerables")).await.unwrap();

        let result = store.save_team(team(first.id, "Les Quizerables")).await;
        assert!(matches!(result, Err(StorageError::Conflict { .. })));

        // Same name in a different game is fine.
        let other = game();
        store.save_game(other.clone()).await.unwrap();
        store
            .save_team(team(other.id, "Les Quizerables"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn game_delete_cascades_everything() {
        let store = MemoryTriviaStore::new();
        let game = game();
        store.save_game(game.clone()).await.unwrap();
        let p = page(game.id, 1);
        store.save_page(p.clone()).await.unwrap();
        let q = question(p.id, 1);
        store.save_question(q.clone()).await.unwrap();
        let t = team(game.id, "The Smartinis");
        store.save_team(t.clone()).await.unwrap();
        store
            .upsert_response(response(q.id, t.id, "yes"))
            .await
            .unwrap();
        store
            .set_grant(HostGrantEntity::full(game.id, "alex"))
            .await
            .unwrap();

        assert!(store.delete_game(game.id).await.unwrap());
        assert!(store.find_page(p.id).await.unwrap().is_none());
        assert!(store.find_question(q.id).await.unwrap().is_none());
        assert!(store.find_team(t.id).await.unwrap().is_none());
        assert!(store.find_response(q.id, t.id).await.unwrap().is_none());
        assert!(
            store
                .find_grant(game.id, "alex".to_owned())
                .await
                .unwrap()
                .is_none()
        );
        assert!(!store.delete_game(game.id).await.unwrap());
    }

    #[tokio::test]
    async fn order_writes_check_parentage() {
        let store = MemoryTriviaStore::new();
        let game = game();
        store.save_game(game.clone()).await.unwrap();
        let p = page(game.id, 1);
        store.save_page(p.clone()).await.unwrap();

        let stranger = Uuid::new_v4();
        let result = store
            .apply_page_order(game.id, vec![OrderWrite { id: stranger, order: 2 }])
            .await;
        assert!(matches!(result, Err(StorageError::Conflict { .. })));
    }
}
