use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::TeamEntity;

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Projection of a team exposed to hosts and editors. Does not carry the
/// rejoin passcode; that one is handed out explicitly.
pub struct TeamSummary {
    pub id: Uuid,
    pub name: String,
    pub members: String,
}

impl From<TeamEntity> for TeamSummary {
    fn from(team: TeamEntity) -> Self {
        Self {
            id: team.id,
            name: team.name,
            members: team.members,
        }
    }
}
