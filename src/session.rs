//! Self-healing for stored player sessions.
//!
//! A play token remembers at most a game id and a team id. Either can go
//! stale behind the player's back: the host deletes the team, an editor
//! deletes the whole game, or the player follows a rejoin link into a
//! different game. Reconciliation decides what survives before a view is
//! rendered.

use crate::dao::models::{GameEntity, TeamEntity};
use uuid::Uuid;

/// Session keys that reconciliation decided to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    /// The stored game reference.
    Game,
    /// The stored team reference.
    Team,
}

/// Outcome of reconciling a stored session against live data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Game the session should reference after healing.
    pub game_id: Option<Uuid>,
    /// Team the session should reference after healing.
    pub team_id: Option<Uuid>,
    /// Keys whose stored values were stale and must be cleared.
    pub cleared: Vec<SessionKey>,
}

/// Heal a stored `(game, team)` pair against the entities they resolve to.
///
/// Rules, in order:
/// - a stored id whose entity is gone is cleared;
/// - a team from a different game than the stored game is dropped in favour
///   of the game;
/// - a live team with no stored game adopts the team's game.
pub fn reconcile(
    stored_game: Option<Uuid>,
    game: Option<&GameEntity>,
    stored_team: Option<Uuid>,
    team: Option<&TeamEntity>,
) -> Reconciled {
    let mut cleared = Vec::new();

    let mut game_id = match (stored_game, game) {
        (Some(_), Some(game)) => Some(game.id),
        (Some(_), None) => {
            cleared.push(SessionKey::Game);
            None
        }
        (None, _) => None,
    };

    let team_id = match (stored_team, team) {
        (Some(_), Some(team)) => {
            if let Some(current) = game_id {
                if team.game_id != current {
                    cleared.push(SessionKey::Team);
                    None
                } else {
                    Some(team.id)
                }
            } else {
                // A live team implies its game.
                game_id = Some(team.game_id);
                Some(team.id)
            }
        }
        (Some(_), None) => {
            cleared.push(SessionKey::Team);
            None
        }
        (None, _) => None,
    };

    Reconciled {
        game_id,
        team_id,
        cleared,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::GameState;
    use std::time::SystemTime;

    fn game() -> GameEntity {
        GameEntity {
            id: Uuid::new_v4(),
            name: "Quiz".to_owned(),
            passcode: "ABCDEFGH24".to_owned(),
            state: GameState::AcceptingTeams,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    fn team(game_id: Uuid) -> TeamEntity {
        TeamEntity {
            id: Uuid::new_v4(),
            game_id,
            name: "The Regulars".to_owned(),
            members: String::new(),
            passcode: "QRTUVWXYZ2".to_owned(),
        }
    }

    #[test]
    fn intact_session_passes_through() {
        let g = game();
        let t = team(g.id);
        let healed = reconcile(Some(g.id), Some(&g), Some(t.id), Some(&t));
        assert_eq!(healed.game_id, Some(g.id));
        assert_eq!(healed.team_id, Some(t.id));
        assert!(healed.cleared.is_empty());
    }

    #[test]
    fn deleted_game_clears_both_references() {
        let stale_game = Uuid::new_v4();
        let stale_team = Uuid::new_v4();
        let healed = reconcile(Some(stale_game), None, Some(stale_team), None);
        assert_eq!(healed.game_id, None);
        assert_eq!(healed.team_id, None);
        assert_eq!(healed.cleared, vec![SessionKey::Game, SessionKey::Team]);
    }

    #[test]
    fn deleted_team_keeps_the_game() {
        let g = game();
        let stale_team = Uuid::new_v4();
        let healed = reconcile(Some(g.id), Some(&g), Some(stale_team), None);
        assert_eq!(healed.game_id, Some(g.id));
        assert_eq!(healed.team_id, None);
        assert_eq!(healed.cleared, vec![SessionKey::Team]);
    }

    #[test]
    fn team_from_another_game_is_dropped() {
        let g = game();
        let other = game();
        let t = team(other.id);
        let healed = reconcile(Some(g.id), Some(&g), Some(t.id), Some(&t));
        assert_eq!(healed.game_id, Some(g.id));
        assert_eq!(healed.team_id, None);
        assert_eq!(healed.cleared, vec![SessionKey::Team]);
    }

    #[test]
    fn team_without_game_adopts_its_game() {
        let g = game();
        let t = team(g.id);
        let healed = reconcile(None, None, Some(t.id), Some(&t));
        assert_eq!(healed.game_id, Some(g.id));
        assert_eq!(healed.team_id, Some(t.id));
        assert!(healed.cleared.is_empty());
    }
}
