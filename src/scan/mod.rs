//! Discovery of games and programs already installed on this machine.

pub mod epic;
pub mod executables;
pub mod launchers;
pub mod programs;
pub mod shortcut;
pub mod steam;

use log::info;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::catalog::RawCatalogEntry;
use crate::config::Config;

pub use executables::{scan_directory_for_executables, FoundExecutable};
pub use programs::{default_program_dirs, scan_programs};
pub use shortcut::shortcut_target;

/// Where a scanned game was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameSource {
    Steam,
    Epic,
    MiHoYo,
    WeGame,
    InstalledProgram,
}

impl fmt::Display for GameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameSource::Steam => "Steam",
            GameSource::Epic => "Epic Games",
            GameSource::MiHoYo => "miHoYo",
            GameSource::WeGame => "WeGame",
            GameSource::InstalledProgram => "Installed Program",
        };
        f.write_str(name)
    }
}

/// A game found by a scanner, ready to be added to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedGame {
    pub title: String,
    pub title_en: String,
    pub exec_path: String,
    pub source: GameSource,
}

impl ScannedGame {
    /// Catalog record for this game
    pub fn to_raw(&self) -> RawCatalogEntry {
        RawCatalogEntry {
            title: Value::String(self.title.clone()),
            title_en: Value::String(self.title_en.clone()),
            exec_path: Value::String(self.exec_path.clone()),
            ..RawCatalogEntry::default()
        }
    }
}

pub(crate) fn program_files() -> PathBuf {
    env::var_os("ProgramFiles")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Program Files"))
}

pub(crate) fn program_files_x86() -> PathBuf {
    env::var_os("ProgramFiles(x86)")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Program Files (x86)"))
}

/// Keep the first game for each launch path, ignoring case
pub fn dedupe(games: Vec<ScannedGame>) -> Vec<ScannedGame> {
    let mut seen = HashSet::new();
    games
        .into_iter()
        .filter(|g| seen.insert(g.exec_path.to_lowercase()))
        .collect()
}

/// Run every launcher scanner: Steam, miHoYo, Epic, then WeGame
pub fn scan_installed_games(config: &Config) -> Vec<ScannedGame> {
    let mut games = steam::scan_steam_games(config.steam.install_dir.as_deref());
    games.extend(launchers::scan_mihoyo_games(&launchers::default_mihoyo_roots()));

    let manifest_dir = config
        .scan
        .epic_manifest_dir
        .clone()
        .unwrap_or_else(epic::default_manifest_dir);
    games.extend(epic::scan_epic_games(&manifest_dir));
    games.extend(launchers::scan_wegame_games(&launchers::default_wegame_roots()));

    let games = dedupe(games);
    info!("Scan found {} installed games", games.len());
    games
}
