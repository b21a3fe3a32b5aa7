use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by catalog persistence and editing.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to access catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode catalog entry: {0}")]
    Json(#[from] serde_json::Error),

    #[error("a title or English title is required")]
    MissingTitle,

    #[error("an executable path is required")]
    MissingExecPath,

    #[error("no catalog entry with id {0}")]
    NotFound(u64),
}

/// Errors raised while validating or starting a launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no catalog entry with id {0}")]
    NotFound(u64),

    #[error("execution path is empty")]
    EmptyExecPath,

    #[error("executable file does not exist: {0}")]
    ExecutableNotFound(String),

    #[error("working directory does not exist: {0}")]
    WorkingDirNotFound(String),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to open {target}: {source}")]
    Open {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] CatalogError),
}

/// Errors raised by Steam account operations.
#[derive(Debug, Error)]
pub enum SteamError {
    #[error("a Steam API key and SteamID64 are required")]
    MissingCredentials,

    #[error("Steam returned no owned games")]
    NoOwnedGames,
}
