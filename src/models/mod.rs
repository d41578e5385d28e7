// src/models/mod.rs

//! Domain models for the sync application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod arm;
mod config;
mod library;
pub mod status;

// Re-export all public types
pub use arm::ArmEntry;
pub use config::{
    ArmConfig, Config, HttpConfig, LoggingConfig, RateLimitConfig, ServiceConfig, SyncConfig,
};
pub use library::{AniListEntry, AnnictWork, MediaListUpdate, Source, UntetheredEntry};
pub use status::{AniListStatus, AnnictStatus, MediaStatus};
