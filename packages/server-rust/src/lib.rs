//! Scoreboard server: ranking engine, score stores, operation pipeline, axum transport.

pub mod app;
pub mod network;
pub mod ranking;
pub mod service;
pub mod storage;

pub use app::build_services;
pub use ranking::{Leaderboard, RankingError};
pub use storage::{ScoreStore, StorageConfig, StoreError};

