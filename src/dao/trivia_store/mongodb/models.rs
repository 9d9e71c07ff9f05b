use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    GameEntity, GameState, HostGrantEntity, PageEntity, PageState, QuestionEntity, ResponseEntity,
    TeamEntity,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    passcode: String,
    state: GameState,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            passcode: value.passcode,
            state: value.state,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoGameDocument> for GameEntity {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            passcode: value.passcode,
            state: value.state,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPageDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    pub game_id: Uuid,
    pub order: u32,
    state: PageState,
    title: String,
    description: String,
    #[serde(default)]
    hidden: bool,
}

impl From<PageEntity> for MongoPageDocument {
    fn from(value: PageEntity) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            order: value.order,
            state: value.state,
            title: value.title,
            description: value.description,
            hidden: value.hidden,
        }
    }
}

impl From<MongoPageDocument> for PageEntity {
    fn from(value: MongoPageDocument) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            order: value.order,
            state: value.state,
            title: value.title,
            description: value.description,
            hidden: value.hidden,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuestionDocument {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub page_id: Uuid,
    pub order: u32,
    text: String,
    answer: String,
    possible_points: i32,
}

impl From<QuestionEntity> for MongoQuestionDocument {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            page_id: value.page_id,
            order: value.order,
            text: value.text,
            answer: value.answer,
            possible_points: value.possible_points,
        }
    }
}

impl From<MongoQuestionDocument> for QuestionEntity {
    fn from(value: MongoQuestionDocument) -> Self {
        Self {
            id: value.id,
            page_id: value.page_id,
            order: value.order,
            text: value.text,
            answer: value.answer,
            possible_points: value.possible_points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub game_id: Uuid,
    name: String,
    members: String,
    passcode: String,
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            name: value.name,
            members: value.members,
            passcode: value.passcode,
        }
    }
}

impl From<MongoTeamDocument> for TeamEntity {
    fn from(value: MongoTeamDocument) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            name: value.name,
            members: value.members,
            passcode: value.passcode,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoResponseDocument {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub question_id: Uuid,
    pub team_id: Uuid,
    value: String,
    graded: bool,
    score: i32,
}

impl From<ResponseEntity> for MongoResponseDocument {
    fn from(value: ResponseEntity) -> Self {
        Self {
            id: value.id,
            question_id: value.question_id,
            team_id: value.team_id,
            value: value.value,
            graded: value.graded,
            score: value.score,
        }
    }
}

impl From<MongoResponseDocument> for ResponseEntity {
    fn from(value: MongoResponseDocument) -> Self {
        Self {
            id: value.id,
            question_id: value.question_id,
            team_id: value.team_id,
            value: value.value,
            graded: value.graded,
            score: value.score,
        }
    }
}

/// Grants carry no surrogate id; the compound `(game_id, user)` key is the
/// identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGrantDocument {
    pub game_id: Uuid,
    pub user: String,
    can_view: bool,
    can_host: bool,
    can_edit: bool,
}

impl From<HostGrantEntity> for MongoGrantDocument {
    fn from(value: HostGrantEntity) -> Self {
        Self {
            game_id: value.game_id,
            user: value.user,
            can_view: value.can_view,
            can_host: value.can_host,
            can_edit: value.can_edit,
        }
    }
}

impl From<MongoGrantDocument> for HostGrantEntity {
    fn from(value: MongoGrantDocument) -> Self {
        Self {
            game_id: value.game_id,
            user: value.user,
            can_view: value.can_view,
            can_host: value.can_host,
            can_edit: value.can_edit,
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
