//! Diff calculation between the Annict library and the AniList list.
//!
//! Annict is the source of truth: every mapped work whose AniList entry is
//! missing or disagrees yields one `MediaListUpdate`. Records that cannot be
//! mapped in either direction are collected as untethered for manual review.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{
    AniListEntry, AniListStatus, AnnictStatus, AnnictWork, MediaListUpdate, MediaStatus, Source,
    SyncConfig, UntetheredEntry, status::is_same_status,
};
use crate::pipeline::progress::progress_for;
use crate::services::ArmDatabase;

/// Outcome of one reconciliation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiffResult {
    /// Writes to send to AniList, at most one per media id
    pub updates: Vec<MediaListUpdate>,
    /// Records without a counterpart, Annict ones first
    pub untethered: Vec<UntetheredEntry>,
    /// AniList media ids that are mapped but absent from the Annict library
    pub anilist_only: Vec<u64>,
    /// Works skipped because AniList already has them completed
    pub suppressed: usize,
}

impl DiffResult {
    /// Check if there is anything to write.
    pub fn has_changes(&self) -> bool {
        !self.updates.is_empty()
    }
}

/// Calculator for the Annict to AniList diff.
#[derive(Debug, Clone, Default)]
pub struct DiffCalculator {
    ignored_annict_ids: HashSet<u64>,
    ignored_anilist_ids: HashSet<u64>,
}

impl DiffCalculator {
    /// Create a calculator that ignores nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the given Annict work ids and AniList media ids entirely.
    pub fn with_ignored(
        annict_ids: impl IntoIterator<Item = u64>,
        anilist_ids: impl IntoIterator<Item = u64>,
    ) -> Self {
        Self {
            ignored_annict_ids: annict_ids.into_iter().collect(),
            ignored_anilist_ids: anilist_ids.into_iter().collect(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::with_ignored(
            config.ignored_annict_ids.iter().copied(),
            config.ignored_anilist_ids.iter().copied(),
        )
    }

    /// Calculate the updates that bring AniList in line with Annict.
    pub fn calculate(
        &self,
        works: &[AnnictWork],
        entries: &[AniListEntry],
        arm: &ArmDatabase,
    ) -> DiffResult {
        let mut result = DiffResult::default();

        let mut existing: HashMap<u64, &AniListEntry> = HashMap::with_capacity(entries.len());
        for entry in entries {
            existing.entry(entry.media_id).or_insert(entry);
        }

        // Works sharing one AniList media: the lowest Annict id owns it.
        let mut owners: HashMap<u64, u64> = HashMap::new();
        for work in works {
            if let Some(anilist_id) = self.target_of(work, arm) {
                owners
                    .entry(anilist_id)
                    .and_modify(|owner| *owner = (*owner).min(work.annict_id))
                    .or_insert(work.annict_id);
            }
        }
        let mut claimed: HashSet<u64> = HashSet::new();

        for work in works {
            if self.ignored_annict_ids.contains(&work.annict_id) {
                continue;
            }

            let Some(anilist_id) = resolve_anilist_id(work, arm) else {
                log::debug!("Untethered Annict work {} ({})", work.annict_id, work.title);
                result.untethered.push(UntetheredEntry {
                    source: Source::Annict,
                    id: work.annict_id,
                    title: work.title.clone(),
                });
                continue;
            };

            if self.ignored_anilist_ids.contains(&anilist_id) {
                continue;
            }

            if owners.get(&anilist_id) != Some(&work.annict_id) || !claimed.insert(anilist_id) {
                log::warn!(
                    "Annict work {} maps to AniList media {} which is owned by Annict work {}",
                    work.annict_id,
                    anilist_id,
                    owners.get(&anilist_id).copied().unwrap_or_default()
                );
                continue;
            }

            let progress = progress_for(work);
            let status = work.status.to_anilist();

            let update = match existing.get(&anilist_id) {
                None => Some(MediaListUpdate {
                    media_id: anilist_id,
                    status,
                    progress,
                }),
                Some(entry) if is_already_completed(work, entry) => {
                    log::debug!("Already completed on AniList: {} ({})", entry.media_id, work.title);
                    result.suppressed += 1;
                    None
                }
                Some(entry) if !is_same_status(work.status, entry.status) || entry.progress != progress => {
                    Some(MediaListUpdate {
                        media_id: entry.media_id,
                        status,
                        progress,
                    })
                }
                Some(_) => None,
            };
            result.updates.extend(update);
        }

        let annict_ids: HashSet<u64> = works.iter().map(|w| w.annict_id).collect();

        for entry in entries {
            if self.ignored_anilist_ids.contains(&entry.media_id) {
                continue;
            }

            let annict_id = arm
                .find_for_annict(entry.media_id, entry.mal_id)
                .map(|e| e.annict_id)
                .filter(|&id| id != 0);
            match annict_id {
                None => {
                    log::debug!("Untethered AniList media {} ({})", entry.media_id, entry.title);
                    result.untethered.push(UntetheredEntry {
                        source: Source::AniList,
                        id: entry.media_id,
                        title: entry.title.clone(),
                    });
                }
                Some(annict_id) if !annict_ids.contains(&annict_id) => {
                    log::info!(
                        "AniList only: {} ({}), Annict work {}",
                        entry.media_id,
                        entry.title,
                        annict_id
                    );
                    result.anilist_only.push(entry.media_id);
                }
                Some(_) => {}
            }
        }

        result
    }

    /// AniList media a work would be written to, unless either side is ignored.
    fn target_of(&self, work: &AnnictWork, arm: &ArmDatabase) -> Option<u64> {
        if self.ignored_annict_ids.contains(&work.annict_id) {
            return None;
        }
        resolve_anilist_id(work, arm).filter(|id| !self.ignored_anilist_ids.contains(id))
    }
}

fn resolve_anilist_id(work: &AnnictWork, arm: &ArmDatabase) -> Option<u64> {
    arm.find_for_anilist(work.annict_id, work.mal_anime_id.as_deref(), work.syobocal_tid)
        .map(|e| e.anilist_id)
        .filter(|&id| id != 0)
}

/// A finished show the viewer watched and already completed on AniList.
/// Progress drift is ignored for these.
fn is_already_completed(work: &AnnictWork, entry: &AniListEntry) -> bool {
    entry.media_status == MediaStatus::Finished
        && work.status == AnnictStatus::Watched
        && entry.status == AniListStatus::Completed
}
