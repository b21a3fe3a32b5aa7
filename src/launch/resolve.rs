use serde::Serialize;
use std::path::Path;

use super::steam_id::{extract_app_id, steam_run_uri};
use super::tokenizer::tokenize;
use crate::catalog::CatalogEntry;

/// A canonical, ready-to-run launch target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchCommand {
    pub exec_path: String,
    pub args: Vec<String>,
}

/// True if the target must be handed to the OS URI opener rather than spawned.
pub fn is_uri_launch_path(exec_path: &str) -> bool {
    ["steam://", "http://", "https://"]
        .iter()
        .any(|scheme| starts_with_ignore_case(exec_path, scheme))
}

/// Canonicalise an executable-path field.
///
/// An app id found in `steam_app_id` (checked first) or in `exec_path` itself
/// replaces the whole path with `steam://rungameid/<id>`. Otherwise the
/// trimmed path is returned as is.
pub fn normalize_exec_path(exec_path: &str, steam_app_id: &str) -> String {
    let trimmed = exec_path.trim();
    let mut app_id = extract_app_id(steam_app_id);
    if app_id.is_empty() {
        app_id = extract_app_id(trimmed);
    }

    if app_id.is_empty() {
        trimmed.to_string()
    } else {
        steam_run_uri(&app_id)
    }
}

/// Resolve an entry into the command to execute, checking the real file system.
pub fn resolve_launch_command(entry: &CatalogEntry) -> LaunchCommand {
    resolve_launch_command_with(entry, |path| path.exists())
}

/// Resolve an entry into the command to execute.
///
/// Precedence, first hit wins:
/// 1. URI targets launch with no arguments.
/// 2. An explicit argument list is used verbatim.
/// 3. A path that `exists` reports as present is never re-split.
/// 4. Otherwise the path is tokenized as a command line; with more than one
///    token the first is the program and the rest are its arguments.
pub fn resolve_launch_command_with<F>(entry: &CatalogEntry, exists: F) -> LaunchCommand
where
    F: Fn(&Path) -> bool,
{
    let exec_path = normalize_exec_path(&entry.exec_path, &entry.steam_app_id);
    if is_uri_launch_path(&exec_path) {
        return LaunchCommand {
            exec_path,
            args: Vec::new(),
        };
    }

    if !entry.args.is_empty() {
        return LaunchCommand {
            exec_path,
            args: entry.args.clone(),
        };
    }

    if !exec_path.is_empty() && exists(Path::new(&exec_path)) {
        return LaunchCommand {
            exec_path,
            args: Vec::new(),
        };
    }

    let mut parts = tokenize(&exec_path);
    if parts.len() <= 1 {
        return LaunchCommand {
            exec_path,
            args: Vec::new(),
        };
    }

    let program = parts.remove(0);
    LaunchCommand {
        exec_path: program,
        args: parts,
    }
}

/// Pick the directory a launched process should start in.
///
/// An explicit `working_dir` always wins. URI targets get none. Anything else
/// falls back to the parent directory of `exec_path`, or empty when there is
/// no usable parent.
pub fn normalize_working_dir(working_dir: &str, exec_path: &str) -> String {
    let preferred = working_dir.trim();
    if !preferred.is_empty() {
        return preferred.to_string();
    }

    let exec_path = exec_path.trim();
    if exec_path.is_empty() || is_uri_launch_path(exec_path) {
        return String::new();
    }

    Path::new(exec_path)
        .parent()
        .map(|parent| parent.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .map_or(false, |head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn entry(exec_path: &str, steam_app_id: &str, args: &[&str]) -> CatalogEntry {
        CatalogEntry {
            exec_path: exec_path.to_string(),
            steam_app_id: steam_app_id.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            ..CatalogEntry::default()
        }
    }

    fn never(_: &Path) -> bool {
        false
    }

    #[test]
    fn uri_classification() {
        assert!(is_uri_launch_path("HTTPS://x"));
        assert!(is_uri_launch_path("http://example.com"));
        assert!(is_uri_launch_path("Steam://rungameid/730"));
        assert!(!is_uri_launch_path(r"C:\a.exe"));
        assert!(!is_uri_launch_path("/usr/bin/steam"));
        assert!(!is_uri_launch_path("ht"));
        assert!(!is_uri_launch_path("ftp://host/file"));
    }

    #[test]
    fn explicit_app_id_beats_any_path() {
        for path in [r"C:\Games\thing.exe", "", "https://example.com", "steam://rungameid/1"] {
            assert_eq!(normalize_exec_path(path, "730"), "steam://rungameid/730");
        }
    }

    #[test]
    fn app_id_recovered_from_path() {
        assert_eq!(normalize_exec_path(" 570 ", ""), "steam://rungameid/570");
        assert_eq!(
            normalize_exec_path("https://store.steampowered.com/app/620/Portal_2/", ""),
            "steam://rungameid/620"
        );
        assert_eq!(normalize_exec_path("  /opt/game/run.sh  ", ""), "/opt/game/run.sh");
    }

    #[test]
    fn normalization_is_idempotent() {
        let cases = [
            ("steam://RUNGAMEID/440", ""),
            ("https://store.steampowered.com/app/10", ""),
            (r#""C:\Games\x.exe" -a"#, ""),
            ("game.exe", "12345"),
            ("", ""),
        ];
        for (path, id) in cases {
            let once = normalize_exec_path(path, id);
            assert_eq!(normalize_exec_path(&once, ""), once);
        }
    }

    #[test]
    fn steam_uri_launches_without_args() {
        let cmd = resolve_launch_command_with(&entry("steam://rungameid/730", "", &[]), never);
        assert_eq!(cmd.exec_path, "steam://rungameid/730");
        assert!(cmd.args.is_empty());

        let cmd = resolve_launch_command_with(&entry("game.exe", "730", &["-novid"]), never);
        assert_eq!(cmd.exec_path, "steam://rungameid/730");
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn explicit_args_win_over_embedded_ones() {
        let cmd = resolve_launch_command_with(
            &entry(r"C:\tools\launcher.exe --windowed", "", &["--foo"]),
            never,
        );
        assert_eq!(cmd.exec_path, r"C:\tools\launcher.exe --windowed");
        assert_eq!(cmd.args, vec!["--foo"]);
    }

    #[test]
    fn missing_path_is_split_into_args() {
        let cmd = resolve_launch_command_with(&entry(r"C:\tools\launcher.exe --windowed", "", &[]), never);
        assert_eq!(cmd.exec_path, r"C:\tools\launcher.exe");
        assert_eq!(cmd.args, vec!["--windowed"]);
    }

    #[test]
    fn single_token_is_left_alone() {
        let cmd = resolve_launch_command_with(&entry(r"C:\tools\launcher.exe", "", &[]), never);
        assert_eq!(cmd.exec_path, r"C:\tools\launcher.exe");
        assert!(cmd.args.is_empty());

        let cmd = resolve_launch_command_with(&entry("", "", &[]), never);
        assert_eq!(cmd.exec_path, "");
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn existing_path_with_spaces_is_not_split() {
        let cmd = resolve_launch_command_with(
            &entry(r"C:\Program Files\Game\game.exe", "", &[]),
            |path| path == Path::new(r"C:\Program Files\Game\game.exe"),
        );
        assert_eq!(cmd.exec_path, r"C:\Program Files\Game\game.exe");
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn existing_file_on_disk_is_not_split() {
        let dir = tempfile::tempdir().unwrap();
        let game_dir = dir.path().join("Program Files").join("Game");
        fs::create_dir_all(&game_dir).unwrap();
        let exe = game_dir.join("game.exe");
        fs::write(&exe, b"MZ").unwrap();
        let exe = exe.to_string_lossy().into_owned();

        let cmd = resolve_launch_command(&entry(&exe, "", &[]));
        assert_eq!(cmd.exec_path, exe);
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn working_dir_prefers_explicit_value() {
        assert_eq!(normalize_working_dir("  /srv/games  ", "/opt/x/run"), "/srv/games");
    }

    #[test]
    fn working_dir_empty_for_uris() {
        assert_eq!(normalize_working_dir("", "steam://rungameid/730"), "");
        assert_eq!(normalize_working_dir(" ", "https://example.com/play"), "");
    }

    #[test]
    fn working_dir_falls_back_to_parent() {
        let parent = Path::new("/opt/games/quake").join("quake.bin");
        assert_eq!(
            normalize_working_dir("", &parent.to_string_lossy()),
            Path::new("/opt/games/quake").to_string_lossy()
        );
        assert_eq!(normalize_working_dir("", ""), "");
        assert_eq!(normalize_working_dir("", "quake"), "");
    }
}
