use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Executables at or below this size are treated as tools, not games
pub const MIN_GAME_EXECUTABLE_SIZE: u64 = 1024 * 1024;

/// An executable found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundExecutable {
    /// File name without extension
    pub name: String,
    /// Full path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

impl FoundExecutable {
    /// Lower-cased name for keyword matching
    pub fn name_lower(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Find `.exe` files larger than 1 MiB, descending `depth` directory levels
/// below `dir`. Unreadable entries are skipped; results are in file-name order
/// per directory.
pub fn scan_directory_for_executables(dir: &Path, depth: usize) -> Vec<FoundExecutable> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(depth + 1)
        .sort_by_file_name()
        .into_iter();

    walker
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file() && has_extension(entry.path(), "exe"))
        .filter_map(|entry| {
            let size = entry.metadata().ok()?.len();
            if size <= MIN_GAME_EXECUTABLE_SIZE {
                return None;
            }

            let name = entry.path().file_stem()?.to_string_lossy().into_owned();
            Some(FoundExecutable {
                name,
                path: entry.into_path(),
                size,
            })
        })
        .collect()
}

/// The largest executable, first one on ties
pub fn largest(execs: &[FoundExecutable]) -> Option<&FoundExecutable> {
    execs
        .iter()
        .fold(None, |best: Option<&FoundExecutable>, exe| match best {
            Some(b) if b.size >= exe.size => Some(b),
            _ => Some(exe),
        })
}

/// Case-insensitive extension check
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(ext))
}
