//! Scanners for third-party launchers that keep their games under one root.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::executables::{largest, scan_directory_for_executables};
use super::{program_files, program_files_x86, GameSource, ScannedGame};

/// Directory-name keywords mapped to canonical titles
const MIHOYO_TITLES: &[(&str, &[&str])] = &[
    ("Star Rail", &["starrail", "honkai", "star"]),
    ("Genshin Impact", &["genshin", "yuanshen"]),
    ("Honkai Impact 3rd", &["honkai3", "bh3"]),
    ("Zenless Zone Zero", &["zenless", "zzz"]),
];

const MIHOYO_EXE_KEYWORDS: &[&str] = &["launcher", "game", "starrail", "genshin", "honkai", "zenless"];

pub fn default_mihoyo_roots() -> Vec<PathBuf> {
    vec![
        program_files().join("miHoYo Launcher"),
        program_files_x86().join("miHoYo Launcher"),
        PathBuf::from(r"D:\miHoYo Launcher"),
        PathBuf::from(r"C:\miHoYo Launcher"),
        PathBuf::from(r"D:\mihoyo\miHoYo Launcher"),
        PathBuf::from(r"C:\mihoyo\miHoYo Launcher"),
    ]
}

pub fn default_wegame_roots() -> Vec<PathBuf> {
    vec![
        program_files().join("WeGame"),
        program_files_x86().join("WeGame"),
        PathBuf::from(r"D:\WeGame"),
    ]
}

/// Canonical title for a miHoYo game directory; first keyword hit wins
pub fn mihoyo_title(dir_name: &str) -> String {
    let lower = dir_name.to_lowercase();
    MIHOYO_TITLES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(title, _)| title.to_string())
        .unwrap_or_else(|| dir_name.to_string())
}

/// Sorted subdirectories of `dir`, with their names
fn game_dirs(dir: &Path) -> Vec<(String, PathBuf)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut dirs: Vec<(String, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter_map(|p| Some((p.file_name()?.to_string_lossy().into_owned(), p)))
        .collect();
    dirs.sort();
    dirs
}

/// Scan miHoYo launcher roots; the first root that yields games wins
pub fn scan_mihoyo_games(roots: &[PathBuf]) -> Vec<ScannedGame> {
    for root in roots {
        let games_dir = root.join("games");
        if !games_dir.is_dir() {
            continue;
        }

        let mut games = Vec::new();
        for (dir_name, path) in game_dirs(&games_dir) {
            let execs = scan_directory_for_executables(&path, 3);
            let main = execs
                .iter()
                .find(|e| {
                    let name = e.name_lower();
                    MIHOYO_EXE_KEYWORDS.iter().any(|k| name.contains(k))
                })
                .or_else(|| largest(&execs));

            if let Some(main) = main {
                games.push(ScannedGame {
                    title: mihoyo_title(&dir_name),
                    title_en: dir_name,
                    exec_path: main.path.to_string_lossy().into_owned(),
                    source: GameSource::MiHoYo,
                });
            }
        }

        if !games.is_empty() {
            info!("Found {} miHoYo games under {}", games.len(), root.display());
            return games;
        }
    }

    debug!("No miHoYo games found");
    Vec::new()
}

/// Scan WeGame roots; the first root that yields games wins
pub fn scan_wegame_games(roots: &[PathBuf]) -> Vec<ScannedGame> {
    for root in roots {
        let apps_dir = root.join("apps");
        if !apps_dir.is_dir() {
            continue;
        }

        let mut games = Vec::new();
        for (dir_name, path) in game_dirs(&apps_dir) {
            let execs = scan_directory_for_executables(&path, 2);
            let prefix: String = dir_name.to_lowercase().chars().take(4).collect();
            let main = execs
                .iter()
                .find(|e| {
                    let name = e.name_lower();
                    name.contains(&prefix) || name.contains("game")
                })
                .or_else(|| execs.first());

            if let Some(main) = main {
                games.push(ScannedGame {
                    title: dir_name.clone(),
                    title_en: dir_name,
                    exec_path: main.path.to_string_lossy().into_owned(),
                    source: GameSource::WeGame,
                });
            }
        }

        if !games.is_empty() {
            info!("Found {} WeGame games under {}", games.len(), root.display());
            return games;
        }
    }

    debug!("No WeGame games found");
    Vec::new()
}
