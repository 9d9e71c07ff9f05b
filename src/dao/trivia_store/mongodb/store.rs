use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, ClientSession, Collection, Database,
    bson::{Bson, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        MongoGameDocument, MongoGrantDocument, MongoPageDocument, MongoQuestionDocument,
        MongoResponseDocument, MongoTeamDocument, doc_id, uuid_as_binary,
    },
};
use crate::dao::{
    models::{
        GameEntity, GameListItemEntity, HostGrantEntity, PageEntity, QuestionEntity,
        ResponseEntity, TeamEntity,
    },
    storage::StorageResult,
    trivia_store::TriviaStore,
};
use crate::ordering::{OrderWrite, shift_down_after};

const GAME_COLLECTION: &str = "games";
const PAGE_COLLECTION: &str = "pages";
const QUESTION_COLLECTION: &str = "questions";
const TEAM_COLLECTION: &str = "teams";
const RESPONSE_COLLECTION: &str = "responses";
const GRANT_COLLECTION: &str = "host_grants";

#[derive(Clone)]
pub struct MongoTriviaStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoTriviaStore {
    /// Establish a connection to MongoDB and ensure the uniqueness indexes
    /// backing the order, team name, and response key invariants are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let unique_indexes: [(&'static str, &'static str, mongodb::bson::Document); 5] = [
            (PAGE_COLLECTION, "page_order_idx", doc! {"game_id": 1, "order": 1}),
            (
                QUESTION_COLLECTION,
                "question_order_idx",
                doc! {"page_id": 1, "order": 1},
            ),
            (TEAM_COLLECTION, "team_name_idx", doc! {"game_id": 1, "name": 1}),
            (
                RESPONSE_COLLECTION,
                "response_key_idx",
                doc! {"question_id": 1, "team_id": 1},
            ),
            (GRANT_COLLECTION, "grant_key_idx", doc! {"game_id": 1, "user": 1}),
        ];

        for (collection_name, index_name, keys) in unique_indexes {
            let collection = database.collection::<mongodb::bson::Document>(collection_name);
            let index = mongodb::IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(index_name.to_owned()))
                        .unique(Some(true))
                        .build(),
                )
                .build();

            collection
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: collection_name,
                    index: index_name,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn client(&self) -> Client {
        let guard = self.inner.state.read().await;
        guard.client.clone()
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        self.database().await.collection(GAME_COLLECTION)
    }

    async fn pages(&self) -> Collection<MongoPageDocument> {
        self.database().await.collection(PAGE_COLLECTION)
    }

    async fn questions(&self) -> Collection<MongoQuestionDocument> {
        self.database().await.collection(QUESTION_COLLECTION)
    }

    async fn teams(&self) -> Collection<MongoTeamDocument> {
        self.database().await.collection(TEAM_COLLECTION)
    }

    async fn responses(&self) -> Collection<MongoResponseDocument> {
        self.database().await.collection(RESPONSE_COLLECTION)
    }

    async fn grants(&self) -> Collection<MongoGrantDocument> {
        self.database().await.collection(GRANT_COLLECTION)
    }

    async fn start_transaction(&self, context: &'static str) -> MongoResult<ClientSession> {
        let client = self.client().await;
        let mut session = client
            .start_session()
            .await
            .map_err(|source| MongoDaoError::Transaction { context, source })?;
        session
            .start_transaction()
            .await
            .map_err(|source| MongoDaoError::Transaction { context, source })?;
        Ok(session)
    }

    async fn commit(session: &mut ClientSession, context: &'static str) -> MongoResult<()> {
        session
            .commit_transaction()
            .await
            .map_err(|source| MongoDaoError::Transaction { context, source })
    }

    async fn abort(session: &mut ClientSession) {
        let _ = session.abort_transaction().await;
    }

    async fn save_game(&self, game: GameEntity) -> MongoResult<()> {
        let id = game.id;
        let document: MongoGameDocument = game.into();
        self.games()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Save {
                collection: GAME_COLLECTION,
                id,
                source,
            })?;
        Ok(())
    }

    async fn find_game(&self, id: Uuid) -> MongoResult<Option<GameEntity>> {
        let document = self
            .games()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: GAME_COLLECTION,
                id,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_games(&self) -> MongoResult<Vec<GameListItemEntity>> {
        let documents: Vec<MongoGameDocument> = self
            .games()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: GAME_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: GAME_COLLECTION,
                source,
            })?;

        let pages = self.pages().await;
        let teams = self.teams().await;
        let mut items = Vec::with_capacity(documents.len());
        for document in documents {
            let entity: GameEntity = document.into();
            let filter = doc! {"game_id": uuid_as_binary(entity.id)};
            let page_count = pages
                .count_documents(filter.clone())
                .await
                .map_err(|source| MongoDaoError::Query {
                    collection: PAGE_COLLECTION,
                    source,
                })?;
            let team_count =
                teams
                    .count_documents(filter)
                    .await
                    .map_err(|source| MongoDaoError::Query {
                        collection: TEAM_COLLECTION,
                        source,
                    })?;
            items.push(GameListItemEntity {
                id: entity.id,
                name: entity.name,
                state: entity.state,
                updated_at: entity.updated_at,
                team_count: team_count as usize,
                page_count: page_count as usize,
            });
        }
        Ok(items)
    }

    async fn delete_game(&self, id: Uuid) -> MongoResult<bool> {
        let page_ids = self
            .page_ids_of_game(id)
            .await?
            .into_iter()
            .map(uuid_as_binary)
            .map(Bson::Binary)
            .collect::<Vec<_>>();
        let question_ids = self
            .question_ids_of_pages(&page_ids)
            .await?
            .into_iter()
            .map(uuid_as_binary)
            .map(Bson::Binary)
            .collect::<Vec<_>>();

        let context = "delete game";
        let mut session = self.start_transaction(context).await?;
        let result: MongoResult<bool> = async {
            let deleted = self
                .games()
                .await
                .delete_one(doc_id(id))
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: GAME_COLLECTION,
                    source,
                })?;
            if deleted.deleted_count == 0 {
                return Ok(false);
            }

            let game_filter = doc! {"game_id": uuid_as_binary(id)};
            self.responses()
                .await
                .delete_many(doc! {"question_id": {"$in": question_ids.clone()}})
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: RESPONSE_COLLECTION,
                    source,
                })?;
            self.questions()
                .await
                .delete_many(doc! {"page_id": {"$in": page_ids.clone()}})
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: QUESTION_COLLECTION,
                    source,
                })?;
            self.pages()
                .await
                .delete_many(game_filter.clone())
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: PAGE_COLLECTION,
                    source,
                })?;
            self.teams()
                .await
                .delete_many(game_filter.clone())
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: TEAM_COLLECTION,
                    source,
                })?;
            self.grants()
                .await
                .delete_many(game_filter)
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: GRANT_COLLECTION,
                    source,
                })?;
            Ok(true)
        }
        .await;

        match result {
            Ok(deleted) => {
                Self::commit(&mut session, context).await?;
                Ok(deleted)
            }
            Err(err) => {
                Self::abort(&mut session).await;
                Err(err)
            }
        }
    }

    async fn page_ids_of_game(&self, game_id: Uuid) -> MongoResult<Vec<Uuid>> {
        let documents: Vec<MongoPageDocument> = self
            .pages()
            .await
            .find(doc! {"game_id": uuid_as_binary(game_id)})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: PAGE_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: PAGE_COLLECTION,
                source,
            })?;
        Ok(documents
            .into_iter()
            .map(|document| PageEntity::from(document).id)
            .collect())
    }

    async fn question_ids_of_pages(&self, page_ids: &[Bson]) -> MongoResult<Vec<Uuid>> {
        let documents: Vec<MongoQuestionDocument> = self
            .questions()
            .await
            .find(doc! {"page_id": {"$in": page_ids.to_vec()}})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: QUESTION_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: QUESTION_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(|document| document.id).collect())
    }

    async fn save_page(&self, page: PageEntity) -> MongoResult<()> {
        let id = page.id;
        let document: MongoPageDocument = page.into();
        self.pages()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::DuplicateKey {
                        collection: PAGE_COLLECTION,
                        detail: source.to_string(),
                    }
                } else {
                    MongoDaoError::Save {
                        collection: PAGE_COLLECTION,
                        id,
                        source,
                    }
                }
            })?;
        Ok(())
    }

    async fn find_page(&self, id: Uuid) -> MongoResult<Option<PageEntity>> {
        let document = self
            .pages()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: PAGE_COLLECTION,
                id,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_pages(&self, game_id: Uuid) -> MongoResult<Vec<PageEntity>> {
        let documents: Vec<MongoPageDocument> = self
            .pages()
            .await
            .find(doc! {"game_id": uuid_as_binary(game_id)})
            .sort(doc! {"order": 1})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: PAGE_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: PAGE_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_page(&self, id: Uuid) -> MongoResult<bool> {
        let Some(removed) = self.find_page(id).await? else {
            return Ok(false);
        };
        let question_ids = self
            .question_ids_of_pages(&[Bson::Binary(uuid_as_binary(id))])
            .await?
            .into_iter()
            .map(uuid_as_binary)
            .map(Bson::Binary)
            .collect::<Vec<_>>();

        let context = "delete page";
        let mut session = self.start_transaction(context).await?;
        let result: MongoResult<()> = async {
            self.responses()
                .await
                .delete_many(doc! {"question_id": {"$in": question_ids.clone()}})
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: RESPONSE_COLLECTION,
                    source,
                })?;
            self.questions()
                .await
                .delete_many(doc! {"page_id": uuid_as_binary(id)})
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: QUESTION_COLLECTION,
                    source,
                })?;
            self.pages()
                .await
                .delete_one(doc_id(id))
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: PAGE_COLLECTION,
                    source,
                })?;
            // Close the order gap among the surviving siblings. The unique
            // (game_id, order) index checks every document write on its own,
            // so the decrements must land lowest order first; a bulk $inc
            // visits documents in whatever order the server picks and can
            // collide mid-update.
            let mut cursor = self
                .pages()
                .await
                .find(doc! {
                    "game_id": uuid_as_binary(removed.game_id),
                    "order": {"$gt": removed.order},
                })
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Query {
                    collection: PAGE_COLLECTION,
                    source,
                })?;
            let siblings: Vec<MongoPageDocument> = cursor
                .stream(&mut session)
                .try_collect()
                .await
                .map_err(|source| MongoDaoError::Query {
                    collection: PAGE_COLLECTION,
                    source,
                })?;
            let orders: Vec<(Uuid, u32)> = siblings
                .into_iter()
                .map(PageEntity::from)
                .map(|page| (page.id, page.order))
                .collect();
            for write in shift_down_after(&orders, removed.order) {
                self.pages()
                    .await
                    .update_one(doc_id(write.id), doc! {"$set": {"order": write.order}})
                    .session(&mut session)
                    .await
                    .map_err(|source| MongoDaoError::Query {
                        collection: PAGE_COLLECTION,
                        source,
                    })?;
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                Self::commit(&mut session, context).await?;
                Ok(true)
            }
            Err(err) => {
                Self::abort(&mut session).await;
                Err(err)
            }
        }
    }

    async fn apply_page_order(&self, game_id: Uuid, writes: Vec<OrderWrite>) -> MongoResult<()> {
        let context = "reorder pages";
        let mut session = self.start_transaction(context).await?;
        let result: MongoResult<()> = async {
            let collection = self.pages().await;
            for write in writes {
                let updated = collection
                    .update_one(
                        doc! {
                            "_id": uuid_as_binary(write.id),
                            "game_id": uuid_as_binary(game_id),
                        },
                        doc! {"$set": {"order": write.order}},
                    )
                    .session(&mut session)
                    .await
                    .map_err(|source| MongoDaoError::Query {
                        collection: PAGE_COLLECTION,
                        source,
                    })?;
                if updated.matched_count == 0 {
                    return Err(MongoDaoError::OrderWriteMismatch { id: write.id });
                }
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => Self::commit(&mut session, context).await,
            Err(err) => {
                Self::abort(&mut session).await;
                Err(err)
            }
        }
    }

    async fn save_question(&self, question: QuestionEntity) -> MongoResult<()> {
        let id = question.id;
        let document: MongoQuestionDocument = question.into();
        self.questions()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::DuplicateKey {
                        collection: QUESTION_COLLECTION,
                        detail: source.to_string(),
                    }
                } else {
                    MongoDaoError::Save {
                        collection: QUESTION_COLLECTION,
                        id,
                        source,
                    }
                }
            })?;
        Ok(())
    }

    async fn find_question(&self, id: Uuid) -> MongoResult<Option<QuestionEntity>> {
        let document = self
            .questions()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: QUESTION_COLLECTION,
                id,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_questions(&self, page_id: Uuid) -> MongoResult<Vec<QuestionEntity>> {
        let documents: Vec<MongoQuestionDocument> = self
            .questions()
            .await
            .find(doc! {"page_id": uuid_as_binary(page_id)})
            .sort(doc! {"order": 1})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: QUESTION_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: QUESTION_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_question(&self, id: Uuid) -> MongoResult<bool> {
        let Some(removed) = self.find_question(id).await? else {
            return Ok(false);
        };

        let context = "delete question";
        let mut session = self.start_transaction(context).await?;
        let result: MongoResult<()> = async {
            self.responses()
                .await
                .delete_many(doc! {"question_id": uuid_as_binary(id)})
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: RESPONSE_COLLECTION,
                    source,
                })?;
            self.questions()
                .await
                .delete_one(doc_id(id))
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: QUESTION_COLLECTION,
                    source,
                })?;
            // Lowest order first, same as the page path; the unique
            // (page_id, order) index checks each write separately.
            let mut cursor = self
                .questions()
                .await
                .find(doc! {
                    "page_id": uuid_as_binary(removed.page_id),
                    "order": {"$gt": removed.order},
                })
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Query {
                    collection: QUESTION_COLLECTION,
                    source,
                })?;
            let siblings: Vec<MongoQuestionDocument> = cursor
                .stream(&mut session)
                .try_collect()
                .await
                .map_err(|source| MongoDaoError::Query {
                    collection: QUESTION_COLLECTION,
                    source,
                })?;
            let orders: Vec<(Uuid, u32)> = siblings
                .into_iter()
                .map(QuestionEntity::from)
                .map(|question| (question.id, question.order))
                .collect();
            for write in shift_down_after(&orders, removed.order) {
                self.questions()
                    .await
                    .update_one(doc_id(write.id), doc! {"$set": {"order": write.order}})
                    .session(&mut session)
                    .await
                    .map_err(|source| MongoDaoError::Query {
                        collection: QUESTION_COLLECTION,
                        source,
                    })?;
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                Self::commit(&mut session, context).await?;
                Ok(true)
            }
            Err(err) => {
                Self::abort(&mut session).await;
                Err(err)
            }
        }
    }

    async fn apply_question_order(
        &self,
        page_id: Uuid,
        writes: Vec<OrderWrite>,
    ) -> MongoResult<()> {
        let context = "reorder questions";
        let mut session = self.start_transaction(context).await?;
        let result: MongoResult<()> = async {
            let collection = self.questions().await;
            for write in writes {
                let updated = collection
                    .update_one(
                        doc! {
                            "_id": uuid_as_binary(write.id),
                            "page_id": uuid_as_binary(page_id),
                        },
                        doc! {"$set": {"order": write.order}},
                    )
                    .session(&mut session)
                    .await
                    .map_err(|source| MongoDaoError::Query {
                        collection: QUESTION_COLLECTION,
                        source,
                    })?;
                if updated.matched_count == 0 {
                    return Err(MongoDaoError::OrderWriteMismatch { id: write.id });
                }
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => Self::commit(&mut session, context).await,
            Err(err) => {
                Self::abort(&mut session).await;
                Err(err)
            }
        }
    }

    async fn save_team(&self, team: TeamEntity) -> MongoResult<()> {
        let id = team.id;
        let document: MongoTeamDocument = team.into();
        self.teams()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::DuplicateKey {
                        collection: TEAM_COLLECTION,
                        detail: source.to_string(),
                    }
                } else {
                    MongoDaoError::Save {
                        collection: TEAM_COLLECTION,
                        id,
                        source,
                    }
                }
            })?;
        Ok(())
    }

    async fn find_team(&self, id: Uuid) -> MongoResult<Option<TeamEntity>> {
        let document = self
            .teams()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: TEAM_COLLECTION,
                id,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_teams(&self, game_id: Uuid) -> MongoResult<Vec<TeamEntity>> {
        let documents: Vec<MongoTeamDocument> = self
            .teams()
            .await
            .find(doc! {"game_id": uuid_as_binary(game_id)})
            .sort(doc! {"name": 1})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: TEAM_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: TEAM_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_team(&self, id: Uuid) -> MongoResult<bool> {
        let context = "delete team";
        let mut session = self.start_transaction(context).await?;
        let result: MongoResult<bool> = async {
            let deleted = self
                .teams()
                .await
                .delete_one(doc_id(id))
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: TEAM_COLLECTION,
                    source,
                })?;
            if deleted.deleted_count == 0 {
                return Ok(false);
            }
            self.responses()
                .await
                .delete_many(doc! {"team_id": uuid_as_binary(id)})
                .session(&mut session)
                .await
                .map_err(|source| MongoDaoError::Delete {
                    collection: RESPONSE_COLLECTION,
                    source,
                })?;
            Ok(true)
        }
        .await;

        match result {
            Ok(deleted) => {
                Self::commit(&mut session, context).await?;
                Ok(deleted)
            }
            Err(err) => {
                Self::abort(&mut session).await;
                Err(err)
            }
        }
    }

    async fn upsert_response(&self, response: ResponseEntity) -> MongoResult<ResponseEntity> {
        let collection = self.responses().await;
        let key = doc! {
            "question_id": uuid_as_binary(response.question_id),
            "team_id": uuid_as_binary(response.team_id),
        };

        let existing = collection
            .find_one(key.clone())
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: RESPONSE_COLLECTION,
                source,
            })?;

        if let Some(existing) = existing {
            return self.update_response(existing.into(), response).await;
        }

        let document: MongoResponseDocument = response.clone().into();
        match collection.insert_one(&document).await {
            Ok(_) => Ok(response),
            // Lost an insert race to a concurrent writer for the same key;
            // fall back to updating the row that won.
            Err(err) if is_duplicate_key(&err) => {
                let winner = collection
                    .find_one(key)
                    .await
                    .map_err(|source| MongoDaoError::Query {
                        collection: RESPONSE_COLLECTION,
                        source,
                    })?
                    .ok_or(MongoDaoError::DuplicateKey {
                        collection: RESPONSE_COLLECTION,
                        detail: err.to_string(),
                    })?;
                self.update_response(winner.into(), response).await
            }
            Err(source) => Err(MongoDaoError::Save {
                collection: RESPONSE_COLLECTION,
                id: document.id,
                source,
            }),
        }
    }

    async fn update_response(
        &self,
        existing: ResponseEntity,
        incoming: ResponseEntity,
    ) -> MongoResult<ResponseEntity> {
        let stored = ResponseEntity {
            id: existing.id,
            question_id: existing.question_id,
            team_id: existing.team_id,
            value: incoming.value,
            graded: incoming.graded,
            score: incoming.score,
        };
        self.responses()
            .await
            .update_one(
                doc_id(existing.id),
                doc! {"$set": {
                    "value": stored.value.clone(),
                    "graded": stored.graded,
                    "score": stored.score,
                }},
            )
            .await
            .map_err(|source| MongoDaoError::Save {
                collection: RESPONSE_COLLECTION,
                id: existing.id,
                source,
            })?;
        Ok(stored)
    }

    async fn find_response(
        &self,
        question_id: Uuid,
        team_id: Uuid,
    ) -> MongoResult<Option<ResponseEntity>> {
        let document = self
            .responses()
            .await
            .find_one(doc! {
                "question_id": uuid_as_binary(question_id),
                "team_id": uuid_as_binary(team_id),
            })
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: RESPONSE_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn find_response_by_id(&self, id: Uuid) -> MongoResult<Option<ResponseEntity>> {
        let document = self
            .responses()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: RESPONSE_COLLECTION,
                id,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_responses_for_team(&self, team_id: Uuid) -> MongoResult<Vec<ResponseEntity>> {
        let documents: Vec<MongoResponseDocument> = self
            .responses()
            .await
            .find(doc! {"team_id": uuid_as_binary(team_id)})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: RESPONSE_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: RESPONSE_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_responses_for_game(&self, game_id: Uuid) -> MongoResult<Vec<ResponseEntity>> {
        let team_ids = self
            .list_teams(game_id)
            .await?
            .into_iter()
            .map(|team| Bson::Binary(uuid_as_binary(team.id)))
            .collect::<Vec<_>>();
        let documents: Vec<MongoResponseDocument> = self
            .responses()
            .await
            .find(doc! {"team_id": {"$in": team_ids}})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: RESPONSE_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: RESPONSE_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_response(&self, question_id: Uuid, team_id: Uuid) -> MongoResult<bool> {
        let deleted = self
            .responses()
            .await
            .delete_one(doc! {
                "question_id": uuid_as_binary(question_id),
                "team_id": uuid_as_binary(team_id),
            })
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: RESPONSE_COLLECTION,
                source,
            })?;
        Ok(deleted.deleted_count > 0)
    }

    async fn set_grant(&self, grant: HostGrantEntity) -> MongoResult<()> {
        let key = doc! {
            "game_id": uuid_as_binary(grant.game_id),
            "user": grant.user.clone(),
        };
        let game_id = grant.game_id;
        let document: MongoGrantDocument = grant.into();
        self.grants()
            .await
            .replace_one(key, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Save {
                collection: GRANT_COLLECTION,
                id: game_id,
                source,
            })?;
        Ok(())
    }

    async fn find_grant(&self, game_id: Uuid, user: String) -> MongoResult<Option<HostGrantEntity>> {
        let document = self
            .grants()
            .await
            .find_one(doc! {"game_id": uuid_as_binary(game_id), "user": user})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: GRANT_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_grants_for_game(&self, game_id: Uuid) -> MongoResult<Vec<HostGrantEntity>> {
        let documents: Vec<MongoGrantDocument> = self
            .grants()
            .await
            .find(doc! {"game_id": uuid_as_binary(game_id)})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: GRANT_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: GRANT_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_grants_for_user(&self, user: String) -> MongoResult<Vec<HostGrantEntity>> {
        let documents: Vec<MongoGrantDocument> = self
            .grants()
            .await
            .find(doc! {"user": user})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: GRANT_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: GRANT_COLLECTION,
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn remove_grant(&self, game_id: Uuid, user: String) -> MongoResult<bool> {
        let deleted = self
            .grants()
            .await
            .delete_one(doc! {"game_id": uuid_as_binary(game_id), "user": user})
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: GRANT_COLLECTION,
                source,
            })?;
        Ok(deleted.deleted_count > 0)
    }
}

impl TriviaStore for MongoTriviaStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_games().await.map_err(Into::into) })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game(id).await.map_err(Into::into) })
    }

    fn save_page(&self, page: PageEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_page(page).await.map_err(Into::into) })
    }

    fn find_page(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PageEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_page(id).await.map_err(Into::into) })
    }

    fn list_pages(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PageEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_pages(game_id).await.map_err(Into::into) })
    }

    fn delete_page(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_page(id).await.map_err(Into::into) })
    }

    fn apply_page_order(
        &self,
        game_id: Uuid,
        writes: Vec<OrderWrite>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .apply_page_order(game_id, writes)
                .await
                .map_err(Into::into)
        })
    }

    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_question(question).await.map_err(Into::into) })
    }

    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_question(id).await.map_err(Into::into) })
    }

    fn list_questions(
        &self,
        page_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_questions(page_id).await.map_err(Into::into) })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_question(id).await.map_err(Into::into) })
    }

    fn apply_question_order(
        &self,
        page_id: Uuid,
        writes: Vec<OrderWrite>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .apply_question_order(page_id, writes)
                .await
                .map_err(Into::into)
        })
    }

    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_team(team).await.map_err(Into::into) })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team(id).await.map_err(Into::into) })
    }

    fn list_teams(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_teams(game_id).await.map_err(Into::into) })
    }

    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_team(id).await.map_err(Into::into) })
    }

    fn upsert_response(
        &self,
        response: ResponseEntity,
    ) -> BoxFuture<'static, StorageResult<ResponseEntity>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_response(response).await.map_err(Into::into) })
    }

    fn find_response(
        &self,
        question_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ResponseEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_response(question_id, team_id)
                .await
                .map_err(Into::into)
        })
    }

    fn find_response_by_id(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ResponseEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_response_by_id(id).await.map_err(Into::into) })
    }

    fn list_responses_for_team(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ResponseEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_responses_for_team(team_id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_responses_for_game(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ResponseEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_responses_for_game(game_id)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_response(
        &self,
        question_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_response(question_id, team_id)
                .await
                .map_err(Into::into)
        })
    }

    fn set_grant(&self, grant: HostGrantEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.set_grant(grant).await.map_err(Into::into) })
    }

    fn find_grant(
        &self,
        game_id: Uuid,
        user: String,
    ) -> BoxFuture<'static, StorageResult<Option<HostGrantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_grant(game_id, user).await.map_err(Into::into) })
    }

    fn list_grants_for_game(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<HostGrantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_grants_for_game(game_id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_grants_for_user(
        &self,
        user: String,
    ) -> BoxFuture<'static, StorageResult<Vec<HostGrantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_grants_for_user(user).await.map_err(Into::into) })
    }

    fn remove_grant(
        &self,
        game_id: Uuid,
        user: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.remove_grant(game_id, user).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
