// src/pipeline/sync.rs

//! One Annict to AniList reconciliation pass.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::load_access_token;
use crate::error::Result;
use crate::models::Config;
use crate::pipeline::apply::{ApplyOutcome, apply_updates};
use crate::pipeline::diff::DiffCalculator;
use crate::services::{AniListClient, AnnictClient, ArmDatabase};
use crate::storage::ReportStorage;
use crate::utils::RateLimitedClient;
use crate::utils::http::{create_async_client, create_authorized_client};

/// The three remote collaborators of a pass.
#[derive(Debug, Clone)]
pub struct SyncClients {
    pub annict: AnnictClient,
    pub anilist: AniListClient,
    /// Unauthenticated transport for the arm database
    pub public: RateLimitedClient,
}

impl SyncClients {
    /// Build clients from config, loading both access tokens.
    pub fn from_config(config: &Config) -> Result<Self> {
        let token_dir = &config.sync.token_directory;
        let annict_token = load_access_token(&config.annict, token_dir)?;
        let anilist_token = load_access_token(&config.anilist, token_dir)?;

        let annict = AnnictClient::new(
            RateLimitedClient::new(
                create_authorized_client(&config.http, &annict_token)?,
                &config.rate_limit,
            ),
            &config.annict,
        );
        let anilist = AniListClient::new(
            RateLimitedClient::new(
                create_authorized_client(&config.http, &anilist_token)?,
                &config.rate_limit,
            ),
            &config.anilist,
        );
        let public = RateLimitedClient::new(create_async_client(&config.http)?, &config.rate_limit);

        Ok(Self {
            annict,
            anilist,
            public,
        })
    }
}

/// Statistics of a finished pass.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub annict_works: usize,
    pub anilist_entries: usize,
    pub updates: usize,
    pub applied: usize,
    pub failed: usize,
    pub suppressed: usize,
    pub untethered: usize,
    pub anilist_only: usize,
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} works / {} entries, {} updates ({} applied, {} failed), {} already completed, {} untethered, {} AniList only in {}s",
            self.annict_works,
            self.anilist_entries,
            self.updates,
            self.applied,
            self.failed,
            self.suppressed,
            self.untethered,
            self.anilist_only,
            (self.finished_at - self.started_at).num_seconds()
        )
    }
}

/// Run a full pass: fetch, diff, report and apply.
///
/// In dry-run mode the updates are only logged.
pub async fn run_sync(
    config: &Config,
    clients: &SyncClients,
    storage: &dyn ReportStorage,
) -> Result<SyncSummary> {
    let started_at = Utc::now();
    let dry_run = config.sync.dry_run;
    log::info!("Sync starting{}", if dry_run { " (dry run)" } else { "" });

    let (annict_viewer, viewer) = tokio::try_join!(
        clients.annict.fetch_viewer(),
        clients.anilist.fetch_viewer(),
    )?;
    log::info!("Annict user: {} (@{})", annict_viewer.name, annict_viewer.username);
    log::info!("AniList user: {} ({})", viewer.name, viewer.id);

    let page_delay = config.sync.page_delay();
    let (arm, works, entries) = tokio::try_join!(
        ArmDatabase::load(&clients.public, &config.arm),
        clients.annict.fetch_all_works(page_delay),
        clients.anilist.fetch_all_entries(viewer.id, page_delay),
    )?;

    if arm.is_empty() {
        log::warn!("arm-supplementary database is empty; every work will be untethered");
    } else {
        log::debug!("arm-supplementary index: {} entries", arm.len());
    }

    let diff = DiffCalculator::from_config(&config.sync).calculate(&works, &entries, &arm);
    log::info!(
        "{} updates, {} untethered, {} AniList only",
        diff.updates.len(),
        diff.untethered.len(),
        diff.anilist_only.len()
    );

    storage.write_untethered(&diff.untethered).await?;

    let outcome = if dry_run {
        for update in &diff.updates {
            log::info!(
                "[dry run] would update AniList media {}: {} (progress {})",
                update.media_id,
                update.status,
                update.progress
            );
        }
        ApplyOutcome::default()
    } else {
        apply_updates(&clients.anilist, &diff.updates, config.sync.max_concurrent).await
    };

    let summary = SyncSummary {
        started_at,
        finished_at: Utc::now(),
        dry_run,
        annict_works: works.len(),
        anilist_entries: entries.len(),
        updates: diff.updates.len(),
        applied: outcome.applied,
        failed: outcome.failed,
        suppressed: diff.suppressed,
        untethered: diff.untethered.len(),
        anilist_only: diff.anilist_only.len(),
    };
    log::info!("Sync complete: {}", summary);
    Ok(summary)
}
