/// OpenAPI documentation generation.
pub mod documentation;
/// Game authoring operations for editors.
pub mod editor_service;
/// Health check service.
pub mod health_service;
/// Live-game operations for hosts: states, grading, teams.
pub mod host_service;
/// Player-facing operations: sessions, boards, answers.
pub mod play_service;
/// Storage connection supervisor.
pub mod storage_supervisor;
