use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::executables::{largest, scan_directory_for_executables, FoundExecutable};
use super::{GameSource, ScannedGame};

static DISPLAY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""DisplayName"\s*"([^"]+)""#).expect("display name pattern"));
static INSTALL_LOCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""InstallLocation"\s*"([^"]+)""#).expect("install location pattern"));

/// The fields of an Epic `.item` manifest we care about
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct EpicManifest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub install_location: Option<String>,
}

/// `%ProgramData%\Epic\EpicGamesLauncher\Data\Manifests`
pub fn default_manifest_dir() -> PathBuf {
    env::var_os("ProgramData")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"))
        .join("Epic")
        .join("EpicGamesLauncher")
        .join("Data")
        .join("Manifests")
}

/// Parse a manifest. Well-formed JSON is read directly; anything else falls
/// back to pattern matching, which needs both a display name and a location.
pub fn parse_manifest(content: &str) -> Option<EpicManifest> {
    if let Ok(manifest) = serde_json::from_str::<EpicManifest>(content) {
        return Some(manifest);
    }

    let display_name = DISPLAY_NAME.captures(content)?[1].to_string();
    let install_location = INSTALL_LOCATION.captures(content)?[1].replace(r"\\", r"\");

    Some(EpicManifest {
        display_name: Some(display_name),
        install_location: Some(install_location),
    })
}

fn pick_main_executable<'a>(title: &str, execs: &'a [FoundExecutable]) -> Option<&'a FoundExecutable> {
    let title_prefix: String = title.to_lowercase().chars().take(5).collect();

    execs
        .iter()
        .find(|e| {
            let name = e.name_lower();
            name.contains(&title_prefix)
                || ["game", "launcher", "win64", "win32"]
                    .iter()
                    .any(|k| name.contains(k))
        })
        .or_else(|| largest(execs))
}

/// Scan every `*.item` manifest in `manifest_dir`
pub fn scan_epic_games(manifest_dir: &Path) -> Vec<ScannedGame> {
    let entries = match fs::read_dir(manifest_dir) {
        Ok(entries) => entries,
        Err(_) => {
            debug!("No Epic manifests at {}", manifest_dir.display());
            return Vec::new();
        }
    };

    let mut manifests: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "item"))
        .collect();
    manifests.sort();

    let mut games = Vec::new();
    for path in manifests {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read Epic manifest {}: {}", path.display(), e);
                continue;
            }
        };

        let manifest = match parse_manifest(&content) {
            Some(m) => m,
            None => continue,
        };
        let location = match manifest.install_location.as_deref().filter(|l| !l.is_empty()) {
            Some(l) => PathBuf::from(l),
            None => continue,
        };
        if !location.is_dir() {
            continue;
        }

        let execs = scan_directory_for_executables(&location, 3);
        let title = manifest
            .display_name
            .filter(|n| !n.is_empty())
            .or_else(|| location.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_default();

        if let Some(main) = pick_main_executable(&title, &execs) {
            games.push(ScannedGame {
                title: title.clone(),
                title_en: title,
                exec_path: main.path.to_string_lossy().into_owned(),
                source: GameSource::Epic,
            });
        }
    }

    info!("Found {} Epic games", games.len());
    games
}
