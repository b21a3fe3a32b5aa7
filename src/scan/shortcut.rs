use lnk::ShellLink;
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Size of the fixed ShellLinkHeader, also its first field
const HEADER_SIZE: usize = 0x4C;
/// LinkCLSID 00021401-0000-0000-C000-000000000046 in on-disk byte order
const LINK_CLSID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

/// True if the file starts with a shell link header
pub fn has_shell_link_header(path: &Path) -> bool {
    let mut header = [0u8; HEADER_SIZE];
    let read = File::open(path).and_then(|mut file| file.read_exact(&mut header));

    read.is_ok() && header[..4] == [HEADER_SIZE as u8, 0, 0, 0] && header[4..20] == LINK_CLSID
}

/// Places a shortcut may point at, most authoritative first.
///
/// The LinkInfo local base path is absolute and wins outright. Otherwise the
/// relative path is tried against the shortcut's working directory, then
/// against the folder holding the shortcut.
pub fn target_candidates(
    local_base_path: Option<&str>,
    working_dir: Option<&str>,
    relative_path: Option<&str>,
    link_dir: &Path,
) -> Vec<PathBuf> {
    if let Some(base) = local_base_path.map(str::trim).filter(|b| !b.is_empty()) {
        return vec![PathBuf::from(base)];
    }

    let relative = match relative_path.map(str::trim).filter(|r| !r.is_empty()) {
        Some(relative) => relative,
        None => return Vec::new(),
    };

    working_dir
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(PathBuf::from)
        .into_iter()
        .chain(std::iter::once(link_dir.to_path_buf()))
        .map(|dir| dir.join(relative).components().collect::<PathBuf>())
        .collect()
}

/// Resolve a Windows `.lnk` file to the existing file it points at
pub fn shortcut_target(path: &Path) -> Option<PathBuf> {
    if !has_shell_link_header(path) {
        debug!("{} is not a shell link", path.display());
        return None;
    }

    let link = match ShellLink::open(path) {
        Ok(link) => link,
        Err(e) => {
            debug!("Unreadable shortcut {}: {:?}", path.display(), e);
            return None;
        }
    };

    let local_base_path = link
        .link_info()
        .as_ref()
        .and_then(|info| info.local_base_path().clone());
    let working_dir = link.working_dir().clone();
    let relative_path = link.relative_path().clone();
    let link_dir = path.parent().unwrap_or_else(|| Path::new("."));

    target_candidates(
        local_base_path.as_deref(),
        working_dir.as_deref(),
        relative_path.as_deref(),
        link_dir,
    )
    .into_iter()
    .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn local_base_path_wins() {
        let candidates = target_candidates(
            Some(r"C:\Games\Game\game.exe"),
            Some(r"C:\Elsewhere"),
            Some(r".\other.exe"),
            Path::new("/menu"),
        );
        assert_eq!(candidates, vec![PathBuf::from(r"C:\Games\Game\game.exe")]);
    }

    #[test]
    fn relative_path_tries_working_dir_then_link_dir() {
        let candidates = target_candidates(None, Some("/games/alpha"), Some("./alpha.exe"), Path::new("/menu"));
        assert_eq!(
            candidates,
            vec![PathBuf::from("/games/alpha/alpha.exe"), PathBuf::from("/menu/alpha.exe")]
        );

        let candidates = target_candidates(Some(""), None, Some("bin/run.exe"), Path::new("/menu"));
        assert_eq!(candidates, vec![PathBuf::from("/menu/bin/run.exe")]);

        assert!(target_candidates(None, Some("/games"), None, Path::new("/menu")).is_empty());
    }

    #[test]
    fn saved_shortcut_resolves_to_its_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("Game").join("game.exe");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"MZ").unwrap();

        let link_path = dir.path().join("Game.lnk");
        ShellLink::new_simple(&target).unwrap().save(&link_path).unwrap();

        assert!(has_shell_link_header(&link_path));
        assert_eq!(shortcut_target(&link_path), Some(fs::canonicalize(&target).unwrap()));
    }

    #[test]
    fn garbage_is_not_a_shortcut() {
        let dir = tempfile::tempdir().unwrap();
        let link_path = dir.path().join("broken.lnk");
        fs::write(&link_path, b"not a shell link").unwrap();
        assert!(!has_shell_link_header(&link_path));
        assert!(shortcut_target(&link_path).is_none());

        let mut header = vec![0u8; HEADER_SIZE];
        header[0] = 0x4C;
        fs::write(&link_path, &header).unwrap();
        assert!(!has_shell_link_header(&link_path));
        assert!(!has_shell_link_header(&dir.path().join("missing.lnk")));
    }
}
