use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::steam::{landscape_cover_url, portrait_cover_url, OwnedGame, SteamClient};
use crate::catalog::{new_entry_id, CatalogEntry, CatalogStore};
use crate::error::SteamError;
use crate::launch::steam_run_uri;

/// Result of a Steam library import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
    /// Catalog size after the import
    pub total: usize,
}

/// Playtime in hours, rounded to one decimal
fn hours_from_minutes(minutes: u64) -> f64 {
    (minutes as f64 / 60.0 * 10.0).round() / 10.0
}

/// Catalog entry for an owned game
pub fn owned_game_entry(game: &OwnedGame, id: u64) -> CatalogEntry {
    let app_id = game.appid.to_string();
    let last_played = game.last_played();

    CatalogEntry {
        id,
        title: if game.name.is_empty() {
            format!("Steam App {}", app_id)
        } else {
            game.name.clone()
        },
        title_en: game.name.clone(),
        exec_path: steam_run_uri(&app_id),
        cover_url: portrait_cover_url(&app_id),
        landscape_cover_url: landscape_cover_url(&app_id),
        hours: hours_from_minutes(game.playtime_forever),
        is_recent: last_played.is_some(),
        last_played,
        steam_app_id: app_id,
        ..CatalogEntry::default()
    }
}

fn keep_or(existing: &str, incoming: &str) -> String {
    if existing.is_empty() {
        incoming.to_string()
    } else {
        existing.to_string()
    }
}

/// Fold an owned game into an existing entry with the same app id.
///
/// Fields the user already filled in win; playtime and recency only grow.
fn merge_into(existing: &CatalogEntry, incoming: &CatalogEntry) -> CatalogEntry {
    let last_played = match (existing.last_played, incoming.last_played) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => b.or(a),
    };

    CatalogEntry {
        title: keep_or(&existing.title, &incoming.title),
        title_en: keep_or(&existing.title_en, &incoming.title_en),
        steam_app_id: incoming.steam_app_id.clone(),
        exec_path: incoming.exec_path.clone(),
        cover_url: keep_or(&existing.cover_url, &incoming.cover_url),
        landscape_cover_url: keep_or(&existing.landscape_cover_url, &incoming.landscape_cover_url),
        hours: existing.hours.max(incoming.hours),
        last_played,
        is_recent: existing.is_recent || incoming.is_recent,
        ..existing.clone()
    }
}

/// Merge owned games into a catalog.
///
/// Games already present (matched by Steam app id) are updated in place; the
/// rest are appended with ids derived from `base_id`.
pub fn merge_owned_games(
    mut entries: Vec<CatalogEntry>,
    owned: &[OwnedGame],
    base_id: u64,
) -> (Vec<CatalogEntry>, ImportSummary) {
    let mut by_app_id: HashMap<String, usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.steam_app_id.is_empty())
        .map(|(i, e)| (e.steam_app_id.clone(), i))
        .collect();
    let mut used_ids: HashSet<u64> = entries.iter().map(|e| e.id).collect();
    let mut summary = ImportSummary::default();

    for game in owned.iter().filter(|g| g.appid > 0) {
        let mut id = base_id.saturating_add(game.appid);
        while !used_ids.insert(id) {
            id += 1;
        }
        let incoming = owned_game_entry(game, id);

        match by_app_id.get(&incoming.steam_app_id).copied() {
            Some(index) => {
                used_ids.remove(&id);
                entries[index] = merge_into(&entries[index], &incoming);
                summary.updated += 1;
            }
            None => {
                by_app_id.insert(incoming.steam_app_id.clone(), entries.len());
                entries.push(incoming);
                summary.added += 1;
            }
        }
    }

    summary.total = entries.len();
    (entries, summary)
}

/// Import the configured user's Steam library into `store`
pub async fn import_steam_owned_games<S: CatalogStore>(
    store: &mut S,
    client: &SteamClient,
) -> Result<ImportSummary> {
    if !client.has_credentials() {
        return Err(SteamError::MissingCredentials.into());
    }

    let owned = client.owned_games().await?;
    if owned.is_empty() {
        return Err(SteamError::NoOwnedGames.into());
    }

    let (entries, summary) = merge_owned_games(store.list().to_vec(), &owned, new_entry_id());
    store
        .replace_all(entries)
        .context("Failed to save imported Steam games")?;

    info!(
        "Imported Steam library: {} added, {} updated, {} total",
        summary.added, summary.updated, summary.total
    );
    Ok(summary)
}
