use serde_json::{json, Value};
use std::cell::RefCell;
use std::fs;

use game_library::catalog::{JsonCatalogStore, Library, RawCatalogEntry, CATALOG_FILE};
use game_library::error::LaunchError;
use game_library::launch::{LaunchPlan, LaunchStrategy, Platform, ProcessLauncher};

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

fn open(dir: &tempfile::TempDir, platform: Platform) -> Library<JsonCatalogStore, RecordingLauncher> {
    let store = JsonCatalogStore::open(dir.path()).unwrap();
    Library::new(store, RecordingLauncher::default()).with_platform(platform)
}

fn raw(value: Value) -> RawCatalogEntry {
    serde_json::from_value(value).unwrap()
}

#[test]
fn catalog_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut lib = open(&dir, Platform::Linux);
        lib.add(raw(json!({ "id": 1, "title": "Portal 2", "execPath": "https://store.steampowered.com/app/620/Portal_2/" })))
            .unwrap();
        lib.add(raw(json!({ "id": 2, "title": "Local", "execPath": "/opt/local/run", "args": "-w \"big screen\"" })))
            .unwrap();
        lib.reorder(&[2]).unwrap();
    }

    let stored: Value = serde_json::from_str(&fs::read_to_string(dir.path().join(CATALOG_FILE)).unwrap()).unwrap();
    assert_eq!(stored[0]["id"], 2);
    assert_eq!(stored[1]["execPath"], "steam://rungameid/620");

    let lib = open(&dir, Platform::Linux);
    let ids: Vec<u64> = lib.entries().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![2, 1]);

    let local = lib.get(2).unwrap();
    assert_eq!(local.args, vec!["-w", "big screen"]);
    assert_eq!(lib.get(1).unwrap().steam_app_id, "620");
}

#[test]
fn resolve_splits_command_lines_that_are_not_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut lib = open(&dir, Platform::Linux);
    lib.add(raw(json!({ "id": 5, "title": "Emu", "execPath": "\"/emu/run emu\" --rom game.bin" })))
        .unwrap();

    let plan = lib.resolve(5).unwrap();
    assert_eq!(plan.command.exec_path, "/emu/run emu");
    assert_eq!(plan.command.args, vec!["--rom", "game.bin"]);
    assert_eq!(plan.working_dir, "/emu");
    assert_eq!(plan.strategy, LaunchStrategy::DirectSpawn);

    assert!(lib.launcher().plans.borrow().is_empty());
    assert!(matches!(lib.resolve(6), Err(LaunchError::NotFound(6))));
}

#[test]
fn launch_stamps_entry_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let game_dir = dir.path().join("Game Dir");
    fs::create_dir_all(&game_dir).unwrap();
    let exe = game_dir.join("start.sh");
    fs::write(&exe, b"#!/bin/sh").unwrap();

    let id = {
        let mut lib = open(&dir, Platform::Linux);
        let id = lib
            .add(raw(json!({ "title": "Mine", "execPath": exe.to_string_lossy(), "args": ["--fast"] })))
            .unwrap()
            .entry
            .id;

        let plan = lib.launch(id).unwrap();
        assert_eq!(plan.command.args, vec!["--fast"]);
        assert_eq!(plan.working_dir, game_dir.to_string_lossy());
        assert_eq!(lib.launcher().plans.borrow().as_slice(), &[plan]);
        id
    };

    let lib = open(&dir, Platform::Linux);
    let entry = lib.get(id).unwrap();
    assert!(entry.is_recent);
    assert!(entry.last_played.is_some());
}

#[test]
fn windows_shortcuts_and_scripts_pick_a_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let mut lib = open(&dir, Platform::Windows);
    lib.add(raw(json!({ "id": 1, "title": "Link", "execPath": "C:\\Games\\Game.lnk" })))
        .unwrap();
    lib.add(raw(json!({ "id": 2, "title": "Script", "execPath": "C:\\Games\\start.bat" })))
        .unwrap();
    lib.add(raw(json!({ "id": 3, "title": "Steam", "steamAppId": "730", "execPath": "C:\\Games\\cs2.exe" })))
        .unwrap();

    assert_eq!(lib.resolve(1).unwrap().strategy, LaunchStrategy::UriOpen);
    assert_eq!(lib.resolve(2).unwrap().strategy, LaunchStrategy::ShellSpawn);

    let steam = lib.resolve(3).unwrap();
    assert_eq!(steam.command.exec_path, "steam://rungameid/730");
    assert_eq!(steam.strategy, LaunchStrategy::UriOpen);
}
