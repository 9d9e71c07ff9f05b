/// Entity definitions shared across layers.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Store trait and its backends.
pub mod trivia_store;
