//! Library crate for trivia-night-back, exposing modules for binaries and integration tests.

pub mod access;
pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod leaderboard;
pub mod ordering;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
