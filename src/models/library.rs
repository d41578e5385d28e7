//! Library records of both services, as used by the diff engine.

use serde::{Deserialize, Serialize};

use super::status::{AniListStatus, AnnictStatus, MediaStatus};

/// A work in the viewer's Annict library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnictWork {
    /// Annict work ID
    pub annict_id: u64,

    /// MyAnimeList anime ID as Annict reports it (a string, possibly empty)
    pub mal_anime_id: Option<String>,

    /// Syoboi Calendar title ID (0 when unknown)
    pub syobocal_tid: u64,

    /// Work title
    pub title: String,

    /// Viewer's watch state
    pub status: AnnictStatus,

    /// True for works without an episode breakdown (films, one-shots)
    pub no_episodes: bool,

    /// Viewer-did-track flag of every episode, in episode order
    pub episodes: Vec<bool>,
}

/// An entry in the viewer's AniList anime list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AniListEntry {
    /// Media list entry ID
    pub id: u64,

    /// AniList media ID
    pub media_id: u64,

    /// MyAnimeList ID of the media (0 when unknown)
    pub mal_id: u64,

    /// List status
    pub status: AniListStatus,

    /// Watched episode count
    pub progress: u32,

    /// Native title of the media
    pub title: String,

    /// Release lifecycle of the media
    pub media_status: MediaStatus,
}

/// A create-or-update for one AniList media list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaListUpdate {
    pub media_id: u64,
    pub status: AniListStatus,
    pub progress: u32,
}

/// Service an untethered record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    Annict,
    AniList,
}

/// A library record with no cross-reference counterpart, kept for manual
/// follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UntetheredEntry {
    pub source: Source,
    pub id: u64,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untethered_json_shape() {
        let entry = UntetheredEntry {
            source: Source::AniList,
            id: 42,
            title: "かがみの孤城".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "source": "AniList", "id": 42, "title": "かがみの孤城" })
        );
    }
}
