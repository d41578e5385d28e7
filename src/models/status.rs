//! Watch-state vocabularies of both services and the mapping between them.
//!
//! Annict knows five states, AniList six. The forward map is total over
//! Annict's states; the reverse map is total over AniList's statuses and
//! folds `REPEATING` onto `WATCHING`, so that one does not round-trip.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Annict `StatusState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnictStatus {
    Watching,
    Watched,
    WannaWatch,
    OnHold,
    StopWatching,
}

impl AnnictStatus {
    /// Every state, in fetch partition order.
    pub const ALL: [AnnictStatus; 5] = [
        AnnictStatus::Watching,
        AnnictStatus::Watched,
        AnnictStatus::WannaWatch,
        AnnictStatus::OnHold,
        AnnictStatus::StopWatching,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnictStatus::Watching => "WATCHING",
            AnnictStatus::Watched => "WATCHED",
            AnnictStatus::WannaWatch => "WANNA_WATCH",
            AnnictStatus::OnHold => "ON_HOLD",
            AnnictStatus::StopWatching => "STOP_WATCHING",
        }
    }

    /// Map to the AniList status pushed for this state.
    pub fn to_anilist(self) -> AniListStatus {
        match self {
            AnnictStatus::Watching => AniListStatus::Current,
            AnnictStatus::Watched => AniListStatus::Completed,
            AnnictStatus::WannaWatch => AniListStatus::Planning,
            AnnictStatus::OnHold => AniListStatus::Paused,
            AnnictStatus::StopWatching => AniListStatus::Dropped,
        }
    }
}

impl fmt::Display for AnnictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnictStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnnictStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::unmappable_state("Annict", s))
    }
}

/// AniList `MediaListStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AniListStatus {
    Current,
    Completed,
    Planning,
    Paused,
    Dropped,
    Repeating,
}

impl AniListStatus {
    /// Every status, in fetch partition order.
    pub const ALL: [AniListStatus; 6] = [
        AniListStatus::Current,
        AniListStatus::Completed,
        AniListStatus::Planning,
        AniListStatus::Paused,
        AniListStatus::Dropped,
        AniListStatus::Repeating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AniListStatus::Current => "CURRENT",
            AniListStatus::Completed => "COMPLETED",
            AniListStatus::Planning => "PLANNING",
            AniListStatus::Paused => "PAUSED",
            AniListStatus::Dropped => "DROPPED",
            AniListStatus::Repeating => "REPEATING",
        }
    }

    /// Map back to Annict. Lossy: `Repeating` becomes `Watching`.
    pub fn to_annict(self) -> AnnictStatus {
        match self {
            AniListStatus::Current | AniListStatus::Repeating => AnnictStatus::Watching,
            AniListStatus::Completed => AnnictStatus::Watched,
            AniListStatus::Planning => AnnictStatus::WannaWatch,
            AniListStatus::Paused => AnnictStatus::OnHold,
            AniListStatus::Dropped => AnnictStatus::StopWatching,
        }
    }
}

impl fmt::Display for AniListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AniListStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AniListStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::unmappable_state("AniList", s))
    }
}

/// Whether the two states are each other's image under both maps.
pub fn is_same_status(annict: AnnictStatus, anilist: AniListStatus) -> bool {
    annict.to_anilist() == anilist && anilist.to_annict() == annict
}

/// AniList `MediaStatus` (release lifecycle of the work itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaStatus {
    Finished,
    Releasing,
    NotYetReleased,
    Cancelled,
    Hiatus,
    #[default]
    #[serde(other)]
    Unknown,
}
