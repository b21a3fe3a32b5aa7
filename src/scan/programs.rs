use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::executables::has_extension;
use super::shortcut::shortcut_target;
use super::{GameSource, ScannedGame};

/// Deepest directory level read below each program directory
const MAX_PROGRAM_DEPTH: usize = 4;

/// Uninstallers, redistributables, docs and other things that are not programs to launch
static EXCLUDE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"unins",
        r"setup\.exe$",
        r"install\.exe$",
        r"update\.exe$",
        r"helper\.exe$",
        r"crash",
        r"report",
        r"config\.exe$",
        r"settings\.exe$",
        r"options\.exe$",
        r"readme",
        r"license",
        r"eula",
        r"manual",
        r"documentation",
        r"\.chm$",
        r"\.hlp$",
        r"\.dll$",
        r"\.sys$",
        r"uninstall",
        r"remove",
        r"repair",
        r"modify\.exe$",
        r"vc_redist",
        r"vcredist",
        r"dotnet",
        r"directx",
        r"windows\s*installer",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}", p)).expect("exclude pattern"))
    .collect()
});

static TITLE_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[:\-_()\[\]]").expect("title punctuation pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// The per-machine and per-user Start Menu program folders
pub fn default_program_dirs() -> Vec<PathBuf> {
    let mut program_dirs = vec![PathBuf::from(
        r"C:\ProgramData\Microsoft\Windows\Start Menu\Programs",
    )];
    if let Some(home) = dirs::home_dir() {
        program_dirs.push(
            home.join("AppData")
                .join("Roaming")
                .join("Microsoft")
                .join("Windows")
                .join("Start Menu")
                .join("Programs"),
        );
    }
    program_dirs
}

/// True if the path or its file name matches an exclude pattern
pub fn is_excluded(path: &str) -> bool {
    let lower = path.to_lowercase();
    let name = Path::new(&lower)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    EXCLUDE_PATTERNS
        .iter()
        .any(|p| p.is_match(&lower) || p.is_match(&name))
}

/// Lower-case, punctuation to spaces, collapsed whitespace
pub fn normalize_title(title: &str) -> String {
    let lower = title.to_lowercase();
    let spaced = TITLE_PUNCTUATION.replace_all(&lower, " ");
    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

/// Launch target for a file found in a program directory.
///
/// `.exe` files stand for themselves. `.lnk` shortcuts count only when they
/// point at an existing `.exe`.
fn program_target(path: &Path) -> Option<PathBuf> {
    if has_extension(path, "exe") {
        return Some(path.to_path_buf());
    }
    if !has_extension(path, "lnk") {
        return None;
    }

    let target = shortcut_target(path)?;
    if has_extension(&target, "exe") && target.is_file() {
        Some(target)
    } else {
        debug!("Shortcut {} does not point at a program", path.display());
        None
    }
}

/// Find launchable programs under `dirs`, following shortcuts to their `.exe`.
///
/// Titles come from the file name found in the directory, so a shortcut keeps
/// its own name. Results are deduplicated by target path and by normalized
/// title, first hit wins.
pub fn scan_programs(dirs: &[PathBuf]) -> Vec<ScannedGame> {
    let mut programs = Vec::new();
    let mut seen_paths = HashSet::new();
    let mut seen_titles = HashSet::new();

    for dir in dirs {
        if !dir.is_dir() {
            debug!("Skipping missing program directory {}", dir.display());
            continue;
        }

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(MAX_PROGRAM_DEPTH + 1)
            .sort_by_file_name()
            .into_iter();

        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let target = match program_target(path) {
                Some(target) => target,
                None => continue,
            };

            let exec_path = target.to_string_lossy().into_owned();
            if is_excluded(&exec_path) {
                continue;
            }

            let title = match path.file_stem() {
                Some(stem) => stem.to_string_lossy().into_owned(),
                None => continue,
            };

            if !seen_paths.insert(exec_path.to_lowercase()) {
                continue;
            }
            if !seen_titles.insert(normalize_title(&title)) {
                continue;
            }

            programs.push(ScannedGame {
                title: title.clone(),
                title_en: title,
                exec_path,
                source: GameSource::InstalledProgram,
            });
        }
    }

    info!("Found {} installed programs", programs.len());
    programs
}
