use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Shapes shared across route trees.
pub mod common;
/// Request and response shapes for the editor routes.
pub mod editor;
/// Health check payload.
pub mod health;
/// Request and response shapes for the host routes.
pub mod host;
/// Request and response shapes for the player routes.
pub mod play;
/// Field validators shared by request payloads.
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
