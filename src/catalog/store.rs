use log::{info, warn};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::entry::{CatalogEntry, RawCatalogEntry};
use crate::error::CatalogError;

/// File name of the catalog inside the data directory
pub const CATALOG_FILE: &str = "games.json";
/// Where an unparseable catalog is moved before it can be overwritten
pub const CATALOG_BACKUP_FILE: &str = "games.json.bak";

/// Key-value persistence for catalog entries, keyed by entry id.
///
/// Order is significant: it is the order the library is presented in.
pub trait CatalogStore {
    /// All entries in library order
    fn list(&self) -> &[CatalogEntry];

    /// Insert a new entry at the end, or replace the entry with the same id in place
    fn upsert(&mut self, entry: CatalogEntry) -> Result<(), CatalogError>;

    /// Remove an entry; returns whether anything was removed
    fn remove(&mut self, id: u64) -> Result<bool, CatalogError>;

    /// Replace the whole catalog
    fn replace_all(&mut self, entries: Vec<CatalogEntry>) -> Result<(), CatalogError>;

    /// Look up one entry
    fn get(&self, id: u64) -> Option<&CatalogEntry> {
        self.list().iter().find(|entry| entry.id == id)
    }
}

/// Catalog persisted as a pretty-printed JSON array
pub struct JsonCatalogStore {
    /// Path of `games.json`
    path: PathBuf,
    /// Loaded entries
    entries: Vec<CatalogEntry>,
}

impl JsonCatalogStore {
    /// Open the catalog in `data_dir`, creating the directory if needed
    pub fn open(data_dir: &Path) -> Result<Self, CatalogError> {
        if !data_dir.exists() {
            fs::create_dir_all(data_dir).map_err(|source| CatalogError::Io {
                path: data_dir.to_path_buf(),
                source,
            })?;
        }

        let path = data_dir.join(CATALOG_FILE);
        let entries = load_entries(&path);

        Ok(Self { path, entries })
    }

    /// Location of the catalog file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the catalog atomically
    fn save(&self) -> Result<(), CatalogError> {
        let io_err = |source: std::io::Error| CatalogError::Io {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_string_pretty(&self.entries)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));

        let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.persist(&self.path).map_err(|e| io_err(e.error))?;

        Ok(())
    }
}

impl CatalogStore for JsonCatalogStore {
    fn list(&self) -> &[CatalogEntry] {
        &self.entries
    }

    fn upsert(&mut self, entry: CatalogEntry) -> Result<(), CatalogError> {
        match self.entries.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self.save()
    }

    fn remove(&mut self, id: u64) -> Result<bool, CatalogError> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);

        if self.entries.len() == before {
            return Ok(false);
        }

        self.save()?;
        Ok(true)
    }

    fn replace_all(&mut self, entries: Vec<CatalogEntry>) -> Result<(), CatalogError> {
        self.entries = entries;
        self.save()
    }
}

/// Read and coerce every record. Unreadable files and records are skipped, not fatal.
fn load_entries(path: &Path) -> Vec<CatalogEntry> {
    if !path.exists() {
        info!("Catalog file not found at {}, starting empty", path.display());
        return Vec::new();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read catalog {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let records = match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(records)) => records,
        Ok(_) => {
            warn!("Catalog {} is not a JSON array, ignoring it", path.display());
            back_up_unreadable(path);
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to parse catalog {}: {}", path.display(), e);
            back_up_unreadable(path);
            return Vec::new();
        }
    };

    let mut entries = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<RawCatalogEntry>(record) {
            Ok(raw) => entries.push(raw.into_entry()),
            Err(e) => warn!("Skipping catalog record {}: {}", index, e),
        }
    }

    info!("Loaded {} catalog entries from {}", entries.len(), path.display());
    entries
}

/// Move an unusable catalog out of the way so the next save cannot clobber it
fn back_up_unreadable(path: &Path) {
    let backup = path.with_file_name(CATALOG_BACKUP_FILE);
    match fs::rename(path, &backup) {
        Ok(()) => warn!("Moved unreadable catalog to {}", backup.display()),
        Err(e) => warn!("Failed to back up {}: {}", path.display(), e),
    }
}
