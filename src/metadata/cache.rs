use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::covers::CoverArt;

const SECONDS_PER_DAY: u64 = 86_400;

/// Cache of resolved cover art, one JSON file per catalog entry
#[derive(Debug, Clone)]
pub struct CoverCache {
    /// Base directory for cache
    cache_dir: PathBuf,
    /// Loaded covers by entry id
    covers: HashMap<u64, CachedCover>,
}

/// Cached cover lookup
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CachedCover {
    /// Catalog entry id
    pub entry_id: u64,
    /// Steam app id, if the lookup resolved one
    pub app_id: Option<String>,
    /// Resolved artwork
    pub cover: CoverArt,
    /// Last update timestamp (unix seconds)
    pub last_updated: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl CachedCover {
    /// A fresh record stamped now
    pub fn new(entry_id: u64, app_id: Option<String>, cover: CoverArt) -> Self {
        Self {
            entry_id,
            app_id,
            cover,
            last_updated: now_secs(),
        }
    }
}

impl CoverCache {
    /// Create a new cover cache under `cache_dir`
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        let covers_dir = cache_dir.join("covers");
        if !covers_dir.exists() {
            fs::create_dir_all(&covers_dir)
                .with_context(|| format!("Failed to create cover cache: {}", covers_dir.display()))?;
        }

        Ok(Self {
            cache_dir,
            covers: HashMap::new(),
        })
    }

    /// Get covers directory
    pub fn covers_dir(&self) -> PathBuf {
        self.cache_dir.join("covers")
    }

    fn cover_path(&self, entry_id: u64) -> PathBuf {
        self.covers_dir().join(format!("{}.json", entry_id))
    }

    /// Load every cached cover; unreadable files are skipped
    pub fn load_all(&mut self) -> Result<()> {
        let covers_dir = self.covers_dir();
        if !covers_dir.exists() {
            fs::create_dir_all(&covers_dir)?;
            return Ok(());
        }

        let entries = fs::read_dir(&covers_dir)
            .with_context(|| format!("Failed to read cover cache: {}", covers_dir.display()))?;

        let mut loaded = 0;
        for entry in entries {
            let path = entry?.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }

            match read_cover_file(&path) {
                Ok(cover) => {
                    self.covers.insert(cover.entry_id, cover);
                    loaded += 1;
                }
                Err(e) => warn!("Skipping cached cover {}: {}", path.display(), e),
            }
        }

        info!("Loaded {} cached covers", loaded);
        Ok(())
    }

    /// Cached cover for an entry, reading it from disk if needed
    pub fn load(&mut self, entry_id: u64) -> Result<Option<CachedCover>> {
        if let Some(cover) = self.covers.get(&entry_id) {
            return Ok(Some(cover.clone()));
        }

        let path = self.cover_path(entry_id);
        if !path.exists() {
            return Ok(None);
        }

        let cover = read_cover_file(&path)?;
        self.covers.insert(entry_id, cover.clone());
        Ok(Some(cover))
    }

    /// Store a cover in memory and on disk
    pub fn save(&mut self, cover: CachedCover) -> Result<()> {
        let path = self.cover_path(cover.entry_id);
        let json = serde_json::to_string_pretty(&cover).context("Failed to serialize cover")?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

        self.covers.insert(cover.entry_id, cover);
        Ok(())
    }

    /// Forget an entry's cover
    pub fn remove(&mut self, entry_id: u64) -> Result<()> {
        self.covers.remove(&entry_id);
        let path = self.cover_path(entry_id);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }

    /// In-memory cover for an entry
    pub fn get(&self, entry_id: u64) -> Option<&CachedCover> {
        self.covers.get(&entry_id)
    }

    /// True when the entry has no cover or it is older than `days`
    pub fn is_stale(&self, entry_id: u64, days: u64) -> bool {
        match self.get(entry_id) {
            Some(cover) => {
                let age_days = now_secs().saturating_sub(cover.last_updated) / SECONDS_PER_DAY;
                age_days > days
            }
            None => true,
        }
    }
}

fn read_cover_file(path: &Path) -> Result<CachedCover> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
}
