use serde::Serialize;

use super::resolve::is_uri_launch_path;

/// Windows shortcut files are opened through the shell, never executed.
const WIN_SHORTCUT_EXTENSIONS: &[&str] = &["lnk", "url"];
/// Batch scripts, run by `cmd.exe`.
const WIN_SHELL_EXTENSIONS: &[&str] = &["bat", "cmd"];

/// Host platform, as far as launching is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }
}

/// How a resolved target gets started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LaunchStrategy {
    /// Spawn the program directly with its argument vector
    DirectSpawn,
    /// Batch script; std hands it to the command interpreter with escaped arguments
    ShellSpawn,
    /// Hand the target to the OS URI / file opener
    UriOpen,
}

impl LaunchStrategy {
    /// Decide the strategy from the platform and the canonical target alone.
    pub fn decide(platform: Platform, exec_path: &str) -> Self {
        if is_uri_launch_path(exec_path) {
            return LaunchStrategy::UriOpen;
        }

        if platform != Platform::Windows {
            return LaunchStrategy::DirectSpawn;
        }

        match extension_of(exec_path) {
            Some(ext) if WIN_SHORTCUT_EXTENSIONS.contains(&ext.as_str()) => LaunchStrategy::UriOpen,
            Some(ext) if WIN_SHELL_EXTENSIONS.contains(&ext.as_str()) => LaunchStrategy::ShellSpawn,
            _ => LaunchStrategy::DirectSpawn,
        }
    }
}

/// Lower-cased extension of the last path component.
///
/// Both separators are honoured so Windows paths classify the same way
/// regardless of the host.
fn extension_of(exec_path: &str) -> Option<String> {
    let file_name = exec_path
        .trim()
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()?;
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
