//! Cross-reference index over the arm-supplementary database.
//!
//! The database is a flat JSON array; lookups go through id maps built once
//! at construction. Each map points at the first entry (in file order) that
//! carries the id, and zero ids are never indexed.

use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::{ArmConfig, ArmEntry};
use crate::utils::RateLimitedClient;

/// Immutable, read-only cross-reference table for one run.
#[derive(Debug, Clone, Default)]
pub struct ArmDatabase {
    entries: Vec<ArmEntry>,
    by_annict: HashMap<u64, usize>,
    by_anilist: HashMap<u64, usize>,
    by_mal: HashMap<u64, usize>,
    by_syobocal: HashMap<u64, usize>,
}

impl ArmDatabase {
    /// Build the index over entries in their given order.
    pub fn new(entries: Vec<ArmEntry>) -> Self {
        let mut db = Self {
            entries,
            ..Self::default()
        };

        for (i, entry) in db.entries.iter().enumerate() {
            for (map, id) in [
                (&mut db.by_annict, entry.annict_id),
                (&mut db.by_anilist, entry.anilist_id),
                (&mut db.by_mal, entry.mal_id),
                (&mut db.by_syobocal, entry.syobocal_tid),
            ] {
                if id != 0 {
                    map.entry(id).or_insert(i);
                }
            }
        }
        db
    }

    /// Fetch and parse the database from its configured URL.
    pub async fn load(transport: &RateLimitedClient, config: &ArmConfig) -> Result<Self> {
        let request = transport.client().get(&config.url).build()?;
        let response = transport.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::status("arm", status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        let entries: Vec<ArmEntry> = serde_json::from_slice(&bytes)?;
        log::info!("arm-supplementary has {} entries", entries.len());

        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_by_annict_id(&self, id: u64) -> Option<&ArmEntry> {
        self.lookup(&self.by_annict, id)
    }

    pub fn find_by_anilist_id(&self, id: u64) -> Option<&ArmEntry> {
        self.lookup(&self.by_anilist, id)
    }

    pub fn find_by_mal_id(&self, id: u64) -> Option<&ArmEntry> {
        self.lookup(&self.by_mal, id)
    }

    pub fn find_by_syobocal_tid(&self, tid: u64) -> Option<&ArmEntry> {
        self.lookup(&self.by_syobocal, tid)
    }

    /// Resolve an Annict work, trying the Annict id, then the MAL id string
    /// (when it parses as an integer), then the Syoboi Calendar tid.
    pub fn find_for_anilist(
        &self,
        annict_id: u64,
        mal_id: Option<&str>,
        syobocal_tid: u64,
    ) -> Option<&ArmEntry> {
        self.find_by_annict_id(annict_id)
            .or_else(|| {
                mal_id
                    .and_then(|raw| raw.parse::<u64>().ok())
                    .and_then(|id| self.find_by_mal_id(id))
            })
            .or_else(|| self.find_by_syobocal_tid(syobocal_tid))
    }

    /// Resolve an AniList media, trying the AniList id, then the MAL id.
    pub fn find_for_annict(&self, anilist_id: u64, mal_id: u64) -> Option<&ArmEntry> {
        self.find_by_anilist_id(anilist_id)
            .or_else(|| self.find_by_mal_id(mal_id))
    }

    fn lookup(&self, map: &HashMap<u64, usize>, id: u64) -> Option<&ArmEntry> {
        if id == 0 {
            return None;
        }
        map.get(&id).map(|&i| &self.entries[i])
    }
}
