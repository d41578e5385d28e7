//! Episode progress of an Annict work, in AniList terms.

use crate::models::{AnnictStatus, AnnictWork};

/// Number of watched episodes to report for a work.
///
/// Works without episodes (films, one-shots) count as a single episode once
/// watched.
pub fn progress_for(work: &AnnictWork) -> u32 {
    if work.no_episodes {
        return u32::from(work.status == AnnictStatus::Watched);
    }

    let tracked = work.episodes.iter().filter(|&&tracked| tracked).count();
    u32::try_from(tracked).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(status: AnnictStatus, no_episodes: bool, episodes: Vec<bool>) -> AnnictWork {
        AnnictWork {
            annict_id: 1,
            mal_anime_id: None,
            syobocal_tid: 0,
            title: "Test".into(),
            status,
            no_episodes,
            episodes,
        }
    }

    #[test]
    fn test_counts_tracked_episodes() {
        let w = work(AnnictStatus::Watching, false, vec![true, false, true, true]);
        assert_eq!(progress_for(&w), 3);
    }

    #[test]
    fn test_no_episodes_watched_is_one() {
        assert_eq!(progress_for(&work(AnnictStatus::Watched, true, vec![])), 1);
    }

    #[test]
    fn test_no_episodes_otherwise_zero() {
        for status in [
            AnnictStatus::Watching,
            AnnictStatus::WannaWatch,
            AnnictStatus::OnHold,
            AnnictStatus::StopWatching,
        ] {
            assert_eq!(progress_for(&work(status, true, vec![true])), 0);
        }
    }

    #[test]
    fn test_untracked_series_is_zero() {
        assert_eq!(progress_for(&work(AnnictStatus::Watched, false, vec![])), 0);
        assert_eq!(progress_for(&work(AnnictStatus::Watched, false, vec![false; 12])), 0);
    }
}
