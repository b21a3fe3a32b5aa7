use anyhow::Result;
use futures::future::join_all;
use log::{error, info, warn};
use std::sync::mpsc::Sender;

use super::cache::{CachedCover, CoverCache};
use super::covers::{CoverArt, CoverKind, CoverResolver, CoverSource};
use super::steam::{SteamClient, SteamGameInfo};
use crate::catalog::CatalogEntry;
use crate::config::Config;

/// Metadata operation status
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataStatus {
    /// Started fetching a cover
    Started { entry_id: u64, title: String },
    /// Cover found and cached
    Success { entry_id: u64, title: String },
    /// No cover could be found or stored
    Failed { entry_id: u64, title: String, error: String },
    /// Progress update
    Progress { completed: usize, total: usize },
    /// Operation completed
    Completed { successful: usize, failed: usize, total: usize },
}

/// Outcome of a library-wide cover refresh
#[derive(Debug, Clone, Default)]
pub struct RefreshSummary {
    /// Newly resolved covers by entry id
    pub covers: Vec<(u64, CoverArt)>,
    pub successful: usize,
    pub failed: usize,
    /// Entries whose cached cover was still fresh
    pub skipped: usize,
}

/// Metadata handler: Steam lookups and cover art behind a local cache
pub struct MetadataHandler {
    steam: SteamClient,
    resolver: CoverResolver,
    cache: CoverCache,
    progress_tx: Option<Sender<MetadataStatus>>,
    stale_days: u64,
    batch_size: usize,
}

impl MetadataHandler {
    /// Create a new metadata handler
    pub fn new(config: &Config) -> Result<Self> {
        let steam = SteamClient::new(config.steam.clone());
        let resolver = CoverResolver::new(steam.clone(), &config.metadata);
        let cache = CoverCache::new(config.paths.cache_dir.clone())?;

        Ok(Self {
            steam,
            resolver,
            cache,
            progress_tx: None,
            stale_days: config.metadata.stale_days,
            batch_size: config.metadata.batch_size.max(1),
        })
    }

    /// Set progress channel
    pub fn set_progress_channel(&mut self, tx: Sender<MetadataStatus>) {
        self.progress_tx = Some(tx);
    }

    fn send_status(&self, status: MetadataStatus) {
        if let Some(tx) = &self.progress_tx {
            if let Err(e) = tx.send(status) {
                warn!("Failed to send metadata status: {}", e);
            }
        }
    }

    /// Load cached covers
    pub fn initialize(&mut self) -> Result<()> {
        self.cache.load_all()
    }

    pub fn steam(&self) -> &SteamClient {
        &self.steam
    }

    /// Steam details for an entry
    pub async fn game_info(&self, entry: &CatalogEntry) -> SteamGameInfo {
        self.steam.game_info(entry).await
    }

    /// Cover for an entry, from the cache unless missing or stale
    pub async fn cover(&mut self, entry: &CatalogEntry) -> Result<CoverArt> {
        if !self.cache.is_stale(entry.id, self.stale_days) {
            if let Some(cached) = self.cache.load(entry.id)? {
                info!("Using cached cover for {}", entry.id);
                return Ok(cached.cover);
            }
        }

        self.refresh_cover(entry).await
    }

    /// Fetch a cover, ignoring the cache, and store it.
    ///
    /// Default artwork is returned but never cached, so the next lookup retries.
    pub async fn refresh_cover(&mut self, entry: &CatalogEntry) -> Result<CoverArt> {
        info!("Fetching cover for {} ({})", entry.display_title(), entry.id);
        let cover = self.resolver.fetch_cover(entry).await;
        self.store(entry, &cover)?;
        Ok(cover)
    }

    /// One side of an entry's cover, served like [`MetadataHandler::cover`]
    pub async fn single_cover(&mut self, entry: &CatalogEntry, kind: CoverKind) -> Result<String> {
        let cover = self.cover(entry).await?;
        Ok(cover.pick(kind).to_string())
    }

    fn store(&mut self, entry: &CatalogEntry, cover: &CoverArt) -> Result<()> {
        if cover.source == CoverSource::Default {
            return Ok(());
        }

        let app_id = Some(entry.steam_app_id.clone()).filter(|id| !id.is_empty());
        self.cache.save(CachedCover::new(entry.id, app_id, cover.clone()))
    }

    /// Refresh covers for many entries.
    ///
    /// Entries with a fresh cached cover are skipped unless `force` is set.
    /// Lookups run concurrently, `batch_size` at a time.
    pub async fn refresh_library(&mut self, entries: &[CatalogEntry], force: bool) -> Result<RefreshSummary> {
        let pending: Vec<&CatalogEntry> = entries
            .iter()
            .filter(|e| force || self.cache.is_stale(e.id, self.stale_days))
            .collect();
        let total = pending.len();

        let mut summary = RefreshSummary {
            skipped: entries.len() - total,
            ..RefreshSummary::default()
        };

        info!("Refreshing covers for {} entries ({} fresh)", total, summary.skipped);
        self.send_status(MetadataStatus::Progress { completed: 0, total });

        let mut completed = 0;
        for batch in pending.chunks(self.batch_size) {
            for entry in batch {
                self.send_status(MetadataStatus::Started {
                    entry_id: entry.id,
                    title: entry.display_title().to_string(),
                });
            }

            let resolver = &self.resolver;
            let covers = join_all(batch.iter().map(|entry| resolver.fetch_cover(entry))).await;

            for (entry, cover) in batch.iter().zip(covers) {
                let title = entry.display_title().to_string();
                let outcome = if cover.source == CoverSource::Default {
                    Err("no cover art found".to_string())
                } else {
                    self.store(entry, &cover).map_err(|e| e.to_string())
                };

                match outcome {
                    Ok(()) => {
                        summary.successful += 1;
                        summary.covers.push((entry.id, cover));
                        self.send_status(MetadataStatus::Success { entry_id: entry.id, title });
                    }
                    Err(error) => {
                        error!("Cover refresh failed for {}: {}", title, error);
                        summary.failed += 1;
                        self.send_status(MetadataStatus::Failed { entry_id: entry.id, title, error });
                    }
                }

                completed += 1;
                self.send_status(MetadataStatus::Progress { completed, total });
            }
        }

        self.send_status(MetadataStatus::Completed {
            successful: summary.successful,
            failed: summary.failed,
            total,
        });

        info!(
            "Refreshed covers for {}/{} entries ({} failed)",
            summary.successful, total, summary.failed
        );
        Ok(summary)
    }
}
