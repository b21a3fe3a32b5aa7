use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use super::executables::{scan_directory_for_executables, FoundExecutable};
use super::{program_files, program_files_x86, GameSource, ScannedGame};

static LIBRARY_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"path"\s+"([^"]+)""#).expect("library path pattern"));

/// Well-known Steam install locations
pub fn default_install_candidates() -> Vec<PathBuf> {
    vec![
        program_files().join("Steam"),
        program_files_x86().join("Steam"),
        PathBuf::from(r"C:\Steam"),
        PathBuf::from(r"D:\Steam"),
        PathBuf::from(r"D:\Games\Steam"),
    ]
}

/// Locate the Steam install directory.
///
/// A configured directory is trusted if it exists. Otherwise the first
/// well-known location containing `steam.exe` wins.
pub fn find_install_dir(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = configured {
        if dir.is_dir() {
            return Some(dir.to_path_buf());
        }
        warn!("Configured Steam directory {} does not exist", dir.display());
    }

    default_install_candidates()
        .into_iter()
        .find(|p| p.join("steam.exe").is_file())
}

/// Extract library folder paths from `libraryfolders.vdf` content
pub fn parse_library_folders(content: &str) -> Vec<String> {
    LIBRARY_PATH
        .captures_iter(content)
        .map(|caps| caps[1].replace(r"\\", r"\"))
        .collect()
}

/// The install directory plus every extra library that exists
pub fn library_paths(steam_path: &Path) -> Vec<PathBuf> {
    let mut libraries = vec![steam_path.to_path_buf()];
    let vdf = steam_path.join("steamapps").join("libraryfolders.vdf");

    match fs::read_to_string(&vdf) {
        Ok(content) => {
            for lib in parse_library_folders(&content) {
                let lib = PathBuf::from(lib);
                if lib != steam_path && lib.is_dir() && !libraries.contains(&lib) {
                    libraries.push(lib);
                }
            }
        }
        Err(e) => debug!("No library folders at {}: {}", vdf.display(), e),
    }

    libraries
}

/// Pick the executable most likely to be the game itself
pub fn pick_main_executable<'a>(dir_name: &str, execs: &'a [FoundExecutable]) -> Option<&'a FoundExecutable> {
    let dir_lower = dir_name.to_lowercase();
    let prefix: String = dir_lower
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect();

    execs
        .iter()
        .find(|e| {
            let name = e.name_lower();
            name.contains(&prefix) || name == dir_lower || name == "game" || name.contains("launcher")
        })
        .or_else(|| execs.first())
}

/// Scan every Steam library under `steam_path`
pub fn scan_steam_library(steam_path: &Path) -> Vec<ScannedGame> {
    let mut games = Vec::new();

    for lib in library_paths(steam_path) {
        let common = lib.join("steamapps").join("common");
        let dirs = match fs::read_dir(&common) {
            Ok(dirs) => dirs,
            Err(_) => continue,
        };

        let mut game_dirs: Vec<PathBuf> = dirs
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        game_dirs.sort();

        for game_dir in game_dirs {
            let dir_name = match game_dir.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };

            let execs = scan_directory_for_executables(&game_dir, 1);
            if let Some(main) = pick_main_executable(&dir_name, &execs) {
                games.push(ScannedGame {
                    title: dir_name.clone(),
                    title_en: dir_name,
                    exec_path: main.path.to_string_lossy().into_owned(),
                    source: GameSource::Steam,
                });
            }
        }
    }

    info!("Found {} Steam games under {}", games.len(), steam_path.display());
    games
}

/// Scan Steam games, locating the install directory first
pub fn scan_steam_games(configured: Option<&Path>) -> Vec<ScannedGame> {
    match find_install_dir(configured) {
        Some(path) => scan_steam_library(&path),
        None => {
            debug!("Steam installation not found");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::executables::fixtures::{sized_file, BIG};
    use super::*;

    #[test]
    fn parses_library_folders_vdf() {
        let vdf = r#"
"libraryfolders"
{
	"0"
	{
		"path"		"C:\\Program Files (x86)\\Steam"
		"label"		""
	}
	"1"
	{
		"PATH"		"D:\\SteamLibrary"
	}
}
"#;
        assert_eq!(
            parse_library_folders(vdf),
            vec![r"C:\Program Files (x86)\Steam", r"D:\SteamLibrary"]
        );
        assert!(parse_library_folders("garbage").is_empty());
    }

    #[test]
    fn main_executable_heuristics() {
        let exe = |name: &str| FoundExecutable {
            name: name.to_string(),
            path: PathBuf::from(format!("{}.exe", name)),
            size: BIG,
        };

        let execs = vec![exe("UnityCrashHandler64"), exe("HollowKnight")];
        assert_eq!(pick_main_executable("Hollow Knight", &execs).unwrap().name, "HollowKnight");

        let execs = vec![exe("tool"), exe("Launcher")];
        assert_eq!(pick_main_executable("Whatever", &execs).unwrap().name, "Launcher");

        let execs = vec![exe("alpha"), exe("beta")];
        assert_eq!(pick_main_executable("Zzz", &execs).unwrap().name, "alpha");

        assert!(pick_main_executable("Empty", &[]).is_none());
    }

    #[test]
    fn scans_common_directory_and_extra_libraries() {
        let dir = tempfile::tempdir().unwrap();
        let steam = dir.path().join("Steam");
        let extra = dir.path().join("Library2");

        sized_file(&steam.join("steamapps/common/Portal 2/portal2.exe"), BIG);
        sized_file(&steam.join("steamapps/common/Tools Only/readme.txt"), BIG);
        sized_file(&extra.join("steamapps/common/Celeste/Celeste.exe"), BIG);

        let vdf = format!(
            "\"libraryfolders\" {{ \"1\" {{ \"path\" \"{}\" }} \"2\" {{ \"path\" \"{}\" }} }}",
            extra.to_string_lossy().replace('\\', r"\\"),
            dir.path().join("missing").to_string_lossy().replace('\\', r"\\"),
        );
        fs::write(steam.join("steamapps/libraryfolders.vdf"), vdf).unwrap();

        let libs = library_paths(&steam);
        assert_eq!(libs, vec![steam.clone(), extra.clone()]);

        let games = scan_steam_library(&steam);
        let titles: Vec<&str> = games.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["Portal 2", "Celeste"]);
        assert!(games.iter().all(|g| g.source == GameSource::Steam));
        assert!(games[0].exec_path.ends_with("portal2.exe"));
    }

    #[test]
    fn configured_dir_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_install_dir(Some(dir.path())), Some(dir.path().to_path_buf()));
    }
}
