//! Capability checks for host and editor operations.

use crate::dao::models::HostGrantEntity;
use crate::error::ServiceError;

/// Capability a privileged operation may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Read game data, including reference answers.
    View,
    /// Drive a live game: toggle states, grade, manage teams.
    Host,
    /// Author the game while it is closed.
    Edit,
}

/// Whether a grant satisfies `capability`.
///
/// Hosting or editing implies viewing, so stale grants that predate the
/// explicit view flag keep working.
pub fn allows(grant: &HostGrantEntity, capability: Capability) -> bool {
    match capability {
        Capability::View => grant.can_view || grant.can_host || grant.can_edit,
        Capability::Host => grant.can_host,
        Capability::Edit => grant.can_edit,
    }
}

/// Turn an optional grant into a pass/fail decision for `capability`.
pub fn require(
    grant: Option<&HostGrantEntity>,
    capability: Capability,
) -> Result<(), ServiceError> {
    match grant {
        Some(grant) if allows(grant, capability) => Ok(()),
        _ => Err(ServiceError::Forbidden(format!(
            "missing {} permission",
            match capability {
                Capability::View => "view",
                Capability::Host => "host",
                Capability::Edit => "edit",
            }
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn grant(can_view: bool, can_host: bool, can_edit: bool) -> HostGrantEntity {
        HostGrantEntity {
            game_id: Uuid::new_v4(),
            user: "sam".to_owned(),
            can_view,
            can_host,
            can_edit,
        }
    }

    #[test]
    fn hosting_and_editing_imply_view() {
        assert!(allows(&grant(false, true, false), Capability::View));
        assert!(allows(&grant(false, false, true), Capability::View));
        assert!(!allows(&grant(false, false, false), Capability::View));
    }

    #[test]
    fn capabilities_do_not_cross() {
        let host_only = grant(true, true, false);
        assert!(allows(&host_only, Capability::Host));
        assert!(!allows(&host_only, Capability::Edit));

        let edit_only = grant(true, false, true);
        assert!(allows(&edit_only, Capability::Edit));
        assert!(!allows(&edit_only, Capability::Host));
    }

    #[test]
    fn missing_grant_is_forbidden() {
        assert!(require(None, Capability::View).is_err());
        assert!(require(Some(&grant(true, false, false)), Capability::View).is_ok());
    }
}
