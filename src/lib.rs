// src/lib.rs

//! animesync: one-way Annict to AniList library sync

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
