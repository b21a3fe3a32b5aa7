use chrono::Utc;
use log::{info, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

use super::entry::{CatalogEntry, RawCatalogEntry};
use super::store::CatalogStore;
use crate::error::{CatalogError, LaunchError};
use crate::launch::{
    is_uri_launch_path, normalize_working_dir, resolve_launch_command, LaunchPlan, LaunchStrategy,
    Platform, ProcessLauncher,
};
use crate::scan::ScannedGame;

/// Result of adding an entry
#[derive(Debug, Clone)]
pub struct AddOutcome {
    /// The stored entry (the pre-existing one for duplicates)
    pub entry: CatalogEntry,
    /// True if an entry with the same launch target already existed
    pub duplicate: bool,
}

/// Result of importing scanned games
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanImportSummary {
    pub added: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

/// The game library: catalog editing plus launching.
///
/// The store and the launcher are injected so the library never touches the
/// disk format or the OS process table directly.
pub struct Library<S, L> {
    store: S,
    launcher: L,
    platform: Platform,
}

impl<S: CatalogStore, L: ProcessLauncher> Library<S, L> {
    /// Create a library for the current platform
    pub fn new(store: S, launcher: L) -> Self {
        Self {
            store,
            launcher,
            platform: Platform::current(),
        }
    }

    /// Override the platform used for launch decisions
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// All entries in library order
    pub fn entries(&self) -> &[CatalogEntry] {
        self.store.list()
    }

    /// Look up one entry
    pub fn get(&self, id: u64) -> Option<&CatalogEntry> {
        self.store.get(id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Add a new entry.
    ///
    /// An entry whose launch target matches an existing one (ignoring case)
    /// is not inserted; the existing entry is returned flagged as duplicate.
    pub fn add(&mut self, raw: RawCatalogEntry) -> Result<AddOutcome, CatalogError> {
        let mut entry = raw.into_entry();

        if entry.title.is_empty() && entry.title_en.is_empty() {
            return Err(CatalogError::MissingTitle);
        }
        if entry.exec_path.is_empty() {
            return Err(CatalogError::MissingExecPath);
        }

        let exec_key = entry.exec_path.to_lowercase();
        if let Some(existing) = self
            .store
            .list()
            .iter()
            .find(|e| e.exec_path.to_lowercase() == exec_key)
        {
            info!("{} is already in the library as {}", entry.exec_path, existing.id);
            return Ok(AddOutcome {
                entry: existing.clone(),
                duplicate: true,
            });
        }

        // Timestamp ids can collide when adding in bulk
        while self.store.get(entry.id).is_some() {
            entry.id += 1;
        }

        info!("Adding {} ({})", entry.display_title(), entry.id);
        self.store.upsert(entry.clone())?;

        Ok(AddOutcome {
            entry,
            duplicate: false,
        })
    }

    /// Apply a loosely-typed patch to an entry
    pub fn update(&mut self, id: u64, patch: &Map<String, Value>) -> Result<CatalogEntry, CatalogError> {
        let existing = self.store.get(id).ok_or(CatalogError::NotFound(id))?;

        let mut updated = existing.apply_patch(patch)?;
        updated.id = id;

        self.store.upsert(updated.clone())?;
        Ok(updated)
    }

    /// Remove an entry; returns whether it existed
    pub fn remove(&mut self, id: u64) -> Result<bool, CatalogError> {
        let removed = self.store.remove(id)?;
        if removed {
            info!("Removed entry {}", id);
        }
        Ok(removed)
    }

    /// Reorder the library.
    ///
    /// Listed ids come first in the given order; unknown ids are ignored and
    /// unlisted entries keep their relative order at the end.
    pub fn reorder(&mut self, ordered_ids: &[u64]) -> Result<(), CatalogError> {
        let mut remaining: Vec<Option<CatalogEntry>> =
            self.store.list().iter().cloned().map(Some).collect();
        let positions: HashMap<u64, usize> = remaining
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (e.id, i)))
            .collect();

        let mut reordered = Vec::with_capacity(remaining.len());
        for id in ordered_ids {
            if let Some(entry) = positions.get(id).and_then(|&i| remaining[i].take()) {
                reordered.push(entry);
            }
        }
        reordered.extend(remaining.into_iter().flatten());

        self.store.replace_all(reordered)
    }

    /// Work out how an entry would be launched, without launching it
    pub fn resolve(&self, id: u64) -> Result<LaunchPlan, LaunchError> {
        let entry = self.store.get(id).ok_or(LaunchError::NotFound(id))?;
        Ok(self.plan_for(entry))
    }

    /// Launch an entry and record the launch.
    ///
    /// Local targets are validated before anything is started. The entry is
    /// stamped only once the launcher has accepted the plan.
    pub fn launch(&mut self, id: u64) -> Result<LaunchPlan, LaunchError> {
        let entry = self.store.get(id).ok_or(LaunchError::NotFound(id))?;
        let plan = self.plan_for(entry);

        validate(&plan)?;
        self.launcher.launch(&plan)?;

        let mut launched = entry.clone();
        launched.mark_launched(Utc::now());
        self.store.upsert(launched)?;

        info!("Launched {} via {:?}", plan.command.exec_path, plan.strategy);
        Ok(plan)
    }

    /// Add scanned games, skipping ones already present
    pub fn import_scanned(&mut self, games: &[ScannedGame]) -> Result<ScanImportSummary, CatalogError> {
        let mut summary = ScanImportSummary::default();

        for game in games {
            match self.add(game.to_raw()) {
                Ok(outcome) if outcome.duplicate => summary.duplicates += 1,
                Ok(_) => summary.added += 1,
                Err(CatalogError::MissingTitle) | Err(CatalogError::MissingExecPath) => {
                    warn!("Skipping scanned game without title or path: {:?}", game);
                    summary.rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Imported scanned games: {} added, {} duplicates, {} rejected",
            summary.added, summary.duplicates, summary.rejected
        );
        Ok(summary)
    }

    fn plan_for(&self, entry: &CatalogEntry) -> LaunchPlan {
        let command = resolve_launch_command(entry);
        let working_dir = normalize_working_dir(&entry.working_dir, &command.exec_path);
        let strategy = LaunchStrategy::decide(self.platform, &command.exec_path);

        LaunchPlan {
            command,
            working_dir,
            strategy,
        }
    }
}

/// Pre-launch checks on local targets
fn validate(plan: &LaunchPlan) -> Result<(), LaunchError> {
    let exec_path = &plan.command.exec_path;
    if is_uri_launch_path(exec_path) {
        return Ok(());
    }

    if exec_path.is_empty() {
        return Err(LaunchError::EmptyExecPath);
    }
    if !Path::new(exec_path).exists() {
        return Err(LaunchError::ExecutableNotFound(exec_path.clone()));
    }
    if !plan.working_dir.is_empty() && !Path::new(&plan.working_dir).is_dir() {
        return Err(LaunchError::WorkingDirNotFound(plan.working_dir.clone()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::JsonCatalogStore;
    use crate::scan::GameSource;
    use serde_json::json;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingLauncher {
        plans: RefCell<Vec<LaunchPlan>>,
    }

    impl ProcessLauncher for RecordingLauncher {
        fn launch(&self, plan: &LaunchPlan) -> Result<(), LaunchError> {
            self.plans.borrow_mut().push(plan.clone());
            Ok(())
        }
    }

    fn library(dir: &TempDir) -> Library<JsonCatalogStore, RecordingLauncher> {
        let store = JsonCatalogStore::open(dir.path()).unwrap();
        Library::new(store, RecordingLauncher::default()).with_platform(Platform::Linux)
    }

    fn raw(value: Value) -> RawCatalogEntry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn add_requires_title_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut lib = library(&dir);

        assert!(matches!(
            lib.add(raw(json!({ "execPath": "/x" }))),
            Err(CatalogError::MissingTitle)
        ));
        assert!(matches!(
            lib.add(raw(json!({ "titleEn": "X", "execPath": "  " }))),
            Err(CatalogError::MissingExecPath)
        ));
        assert!(lib.entries().is_empty());
    }

    #[test]
    fn duplicate_paths_are_detected_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let mut lib = library(&dir);

        let first = lib.add(raw(json!({ "title": "Game", "execPath": "C:\\Games\\Game.exe" }))).unwrap();
        assert!(!first.duplicate);

        let second = lib.add(raw(json!({ "title": "Other", "execPath": "c:\\games\\game.EXE" }))).unwrap();
        assert!(second.duplicate);
        assert_eq!(second.entry.id, first.entry.id);
        assert_eq!(lib.entries().len(), 1);
    }

    #[test]
    fn colliding_ids_are_bumped() {
        let dir = tempfile::tempdir().unwrap();
        let mut lib = library(&dir);

        lib.add(raw(json!({ "id": 10, "title": "A", "execPath": "/a" }))).unwrap();
        let b = lib.add(raw(json!({ "id": 10, "title": "B", "execPath": "/b" }))).unwrap();
        assert_eq!(b.entry.id, 11);
    }

    #[test]
    fn update_merges_patch() {
        let dir = tempfile::tempdir().unwrap();
        let mut lib = library(&dir);
        let id = lib
            .add(raw(json!({ "id": 3, "title": "A", "execPath": "/a", "args": ["-x"] })))
            .unwrap()
            .entry
            .id;

        let patch = json!({ "title": "Renamed", "isFav": true });
        let updated = lib.update(id, patch.as_object().unwrap()).unwrap();
        assert_eq!(updated.title, "Renamed");
        assert!(updated.is_fav);
        assert_eq!(updated.args, vec!["-x"]);
        assert_eq!(lib.get(id).unwrap().title, "Renamed");

        let missing = lib.update(999, patch.as_object().unwrap());
        assert!(matches!(missing, Err(CatalogError::NotFound(999))));
    }

    #[test]
    fn reorder_puts_listed_ids_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut lib = library(&dir);
        for (id, path) in [(1, "/1"), (2, "/2"), (3, "/3"), (4, "/4")] {
            lib.add(raw(json!({ "id": id, "title": path, "execPath": path }))).unwrap();
        }

        lib.reorder(&[3, 99, 1]).unwrap();
        let ids: Vec<u64> = lib.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 1, 2, 4]);
    }

    #[test]
    fn launch_steam_uri_skips_file_checks() {
        let dir = tempfile::tempdir().unwrap();
        let mut lib = library(&dir);
        let id = lib.add(raw(json!({ "title": "CS2", "execPath": "730" }))).unwrap().entry.id;

        let plan = lib.launch(id).unwrap();
        assert_eq!(plan.command.exec_path, "steam://rungameid/730");
        assert!(plan.command.args.is_empty());
        assert_eq!(plan.working_dir, "");
        assert_eq!(plan.strategy, LaunchStrategy::UriOpen);

        let stamped = lib.get(id).unwrap();
        assert!(stamped.is_recent);
        assert!(stamped.last_played.is_some());
        assert_eq!(lib.launcher().plans.borrow().len(), 1);
    }

    #[test]
    fn launch_local_binary_uses_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let game_dir = dir.path().join("My Game");
        fs::create_dir_all(&game_dir).unwrap();
        let exe = game_dir.join("game.bin");
        fs::write(&exe, b"bin").unwrap();

        let mut lib = library(&dir);
        let id = lib
            .add(raw(json!({ "title": "Mine", "execPath": exe.to_string_lossy() })))
            .unwrap()
            .entry
            .id;

        let plan = lib.launch(id).unwrap();
        assert_eq!(plan.command.exec_path, exe.to_string_lossy());
        assert!(plan.command.args.is_empty());
        assert_eq!(plan.working_dir, game_dir.to_string_lossy());
        assert_eq!(plan.strategy, LaunchStrategy::DirectSpawn);
    }

    #[test]
    fn launch_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("run.sh");
        fs::write(&exe, b"#!/bin/sh").unwrap();

        let mut lib = library(&dir);
        let missing = lib
            .add(raw(json!({ "id": 1, "title": "Gone", "execPath": "/no/such/game --flag" })))
            .unwrap()
            .entry
            .id;
        let bad_cwd = lib
            .add(raw(json!({
                "id": 2,
                "title": "Cwd",
                "execPath": exe.to_string_lossy(),
                "workingDir": dir.path().join("nope").to_string_lossy()
            })))
            .unwrap()
            .entry
            .id;

        match lib.launch(missing) {
            Err(LaunchError::ExecutableNotFound(path)) => assert_eq!(path, "/no/such/game"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(lib.launch(bad_cwd), Err(LaunchError::WorkingDirNotFound(_))));
        assert!(matches!(lib.launch(404), Err(LaunchError::NotFound(404))));

        assert!(lib.launcher().plans.borrow().is_empty());
        assert!(lib.entries().iter().all(|e| e.last_played.is_none()));
    }

    #[test]
    fn import_scanned_counts_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let mut lib = library(&dir);
        let games = vec![
            ScannedGame {
                title: "Alpha".into(),
                title_en: "Alpha".into(),
                exec_path: "/games/alpha/alpha.exe".into(),
                source: GameSource::Steam,
            },
            ScannedGame {
                title: "Alpha again".into(),
                title_en: String::new(),
                exec_path: "/GAMES/alpha/alpha.exe".into(),
                source: GameSource::Epic,
            },
            ScannedGame {
                title: String::new(),
                title_en: String::new(),
                exec_path: "/games/nameless.exe".into(),
                source: GameSource::InstalledProgram,
            },
        ];

        let summary = lib.import_scanned(&games).unwrap();
        assert_eq!(
            summary,
            ScanImportSummary {
                added: 1,
                duplicates: 1,
                rejected: 1
            }
        );
    }
}
