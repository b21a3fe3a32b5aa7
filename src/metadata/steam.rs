use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

use super::achievements::{achievement_view, AchievementItem, AchievementProgress};
use crate::catalog::CatalogEntry;
use crate::config::SteamConfig;
use crate::error::SteamError;
use crate::launch::extract_app_id;

const STORE_BASE_URL: &str = "https://store.steampowered.com";
const API_BASE_URL: &str = "https://api.steampowered.com";
const CDN_BASE_URL: &str = "https://cdn.cloudflare.steamstatic.com/steam/apps";

/// Store languages tried, in order, when searching by title
const SEARCH_LANGUAGES: [&str; 2] = ["english", "schinese"];

/// Portrait library artwork on the Steam CDN
pub fn portrait_cover_url(app_id: &str) -> String {
    format!("{}/{}/library_600x900.jpg", CDN_BASE_URL, app_id)
}

/// Landscape header artwork on the Steam CDN
pub fn landscape_cover_url(app_id: &str) -> String {
    format!("{}/{}/header.jpg", CDN_BASE_URL, app_id)
}

pub fn store_url(app_id: &str) -> String {
    format!("{}/app/{}/", STORE_BASE_URL, app_id)
}

pub fn steamdb_url(app_id: &str) -> String {
    format!("https://steamdb.info/app/{}/", app_id)
}

pub fn steamdb_search_url(title: &str) -> String {
    match Url::parse_with_params("https://steamdb.info/search/", &[("a", "app"), ("q", title)]) {
        Ok(url) => url.to_string(),
        Err(_) => "https://steamdb.info/search/".to_string(),
    }
}

/// App id carried by the entry itself, without any network lookup
pub fn app_id_from_entry(entry: &CatalogEntry) -> Option<String> {
    let source = if entry.steam_app_id.is_empty() {
        &entry.exec_path
    } else {
        &entry.steam_app_id
    };
    Some(extract_app_id(source)).filter(|id| !id.is_empty())
}

#[derive(Debug, Deserialize)]
struct StoreSearchResponse {
    #[serde(default)]
    items: Vec<StoreSearchItem>,
}

#[derive(Debug, Deserialize)]
struct StoreSearchItem {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct AppDetailsResult {
    #[serde(default)]
    success: bool,
    data: Option<AppDetails>,
}

/// Store details for one app
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppDetails {
    #[serde(default)]
    pub name: String,
    pub header_image: Option<String>,
    pub short_description: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub price_overview: Option<PriceOverview>,
    pub achievements: Option<AchievementSummary>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Genre {
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceOverview {
    pub final_formatted: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AchievementSummary {
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Deserialize)]
struct PlayerCountResponse {
    response: PlayerCount,
}

#[derive(Debug, Deserialize)]
struct PlayerCount {
    player_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    appnews: Option<AppNews>,
}

#[derive(Debug, Deserialize)]
struct AppNews {
    #[serde(default)]
    newsitems: Vec<NewsItem>,
}

/// One news post for an app
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewsItem {
    #[serde(default)]
    pub gid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub contents: String,
    #[serde(default)]
    pub feedlabel: String,
    /// Unix seconds
    #[serde(default)]
    pub date: i64,
}

#[derive(Debug, Deserialize)]
struct OwnedGamesResponse {
    response: OwnedGamesBody,
}

#[derive(Debug, Default, Deserialize)]
struct OwnedGamesBody {
    #[serde(default)]
    games: Vec<OwnedGame>,
}

/// A game in the user's Steam library
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct OwnedGame {
    pub appid: u64,
    #[serde(default)]
    pub name: String,
    /// Minutes
    #[serde(default)]
    pub playtime_forever: u64,
    /// Unix seconds, 0 if never played
    #[serde(default)]
    pub rtime_last_played: i64,
}

impl OwnedGame {
    pub fn last_played(&self) -> Option<DateTime<Utc>> {
        if self.rtime_last_played <= 0 {
            return None;
        }
        Utc.timestamp_opt(self.rtime_last_played, 0).single()
    }
}

/// Everything we know about an entry on Steam
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SteamGameInfo {
    pub found: bool,
    pub app_id: Option<String>,
    pub title: String,
    pub header_image: Option<String>,
    pub short_description: Option<String>,
    pub genres: Vec<String>,
    pub price: Option<String>,
    pub current_players: Option<u64>,
    pub achievement_total: Option<u32>,
    /// Present when the configured user's achievements could be read
    pub player_achievement: Option<AchievementProgress>,
    pub achievements: Vec<AchievementItem>,
    pub playtime_minutes: Option<u64>,
    pub last_played: Option<DateTime<Utc>>,
    pub news: Vec<NewsItem>,
    pub store_url: Option<String>,
    pub steamdb_url: String,
}

impl SteamGameInfo {
    /// Result for an entry with no resolvable app id
    pub fn not_found(title: &str) -> Self {
        Self {
            found: false,
            title: title.to_string(),
            steamdb_url: steamdb_search_url(title),
            ..Self::default()
        }
    }
}

/// Steam store and Web API client
#[derive(Clone)]
pub struct SteamClient {
    config: SteamConfig,
    client: Client,
    store_base_url: String,
    api_base_url: String,
}

impl SteamClient {
    /// Create a new Steam client
    pub fn new(config: SteamConfig) -> Self {
        Self {
            config,
            client: Client::new(),
            store_base_url: STORE_BASE_URL.to_string(),
            api_base_url: API_BASE_URL.to_string(),
        }
    }

    /// Check if API key and SteamID64 are configured
    pub fn has_credentials(&self) -> bool {
        self.config.credentials().is_some()
    }

    pub(super) fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    fn url(&self, base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        Url::parse_with_params(&format!("{}{}", base, path), params)
            .with_context(|| format!("Invalid Steam URL for {}", path))
    }

    /// Web API URL for `path`
    pub(super) fn api_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        self.url(&self.api_base_url, path, params)
    }

    /// API key and SteamID64, or `MissingCredentials`
    pub(super) fn require_credentials(&self) -> Result<(&str, &str), SteamError> {
        self.config.credentials().ok_or(SteamError::MissingCredentials)
    }

    pub(super) fn language(&self) -> &str {
        &self.config.language
    }

    pub(super) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let endpoint = url.path().to_string();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", endpoint))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Steam API error: {} - {}", status, text));
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", endpoint))
    }

    /// First store search hit for `term` in store language `lang`
    pub async fn search_app_id(&self, term: &str, lang: &str) -> Result<Option<String>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(None);
        }

        let url = self.url(
            &self.store_base_url,
            "/api/storesearch",
            &[("term", term), ("l", lang), ("cc", "US")],
        )?;
        let result: StoreSearchResponse = self.get_json(url).await?;

        Ok(result.items.first().map(|item| item.id.to_string()))
    }

    /// Find the app id for an entry: from the entry itself, else by searching
    /// the English title then the display title, each in English then
    /// Simplified Chinese. Search failures are logged and skipped.
    pub async fn resolve_app_id(&self, entry: &CatalogEntry) -> Option<String> {
        if let Some(app_id) = app_id_from_entry(entry) {
            return Some(app_id);
        }

        for title in [entry.title_en.as_str(), entry.title.as_str()] {
            if title.trim().is_empty() {
                continue;
            }

            for lang in SEARCH_LANGUAGES {
                match self.search_app_id(title, lang).await {
                    Ok(Some(app_id)) => {
                        debug!("Resolved '{}' to Steam app {} ({})", title, app_id, lang);
                        return Some(app_id);
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Steam search for '{}' failed: {}", title, e),
                }
            }
        }

        None
    }

    /// Store details, `None` if Steam has none for this app
    pub async fn app_details(&self, app_id: &str) -> Result<Option<AppDetails>> {
        let url = self.url(
            &self.store_base_url,
            "/api/appdetails",
            &[
                ("appids", app_id),
                ("l", self.config.language.as_str()),
                ("cc", self.config.country.as_str()),
            ],
        )?;
        let mut result: HashMap<String, AppDetailsResult> = self.get_json(url).await?;

        Ok(result
            .remove(app_id)
            .filter(|r| r.success)
            .and_then(|r| r.data))
    }

    /// Players in game right now; `None` without an API key
    pub async fn current_players(&self, app_id: &str) -> Result<Option<u64>> {
        let key = match self.api_key() {
            Some(key) => key,
            None => return Ok(None),
        };

        let url = self.url(
            &self.api_base_url,
            "/ISteamUserStats/GetNumberOfCurrentPlayers/v1/",
            &[("key", key), ("appid", app_id)],
        )?;
        let result: PlayerCountResponse = self.get_json(url).await?;

        Ok(result.response.player_count)
    }

    /// Latest news posts
    pub async fn news(&self, app_id: &str, count: usize) -> Result<Vec<NewsItem>> {
        self.news_excerpts(app_id, count, 220).await
    }

    /// Latest news posts, contents cut to `max_length` characters
    pub async fn news_excerpts(&self, app_id: &str, count: usize, max_length: usize) -> Result<Vec<NewsItem>> {
        let count = count.to_string();
        let max_length = max_length.to_string();
        let url = self.url(
            &self.api_base_url,
            "/ISteamNews/GetNewsForApp/v2/",
            &[
                ("appid", app_id),
                ("count", count.as_str()),
                ("maxlength", max_length.as_str()),
                ("format", "json"),
            ],
        )?;
        let result: NewsResponse = self.get_json(url).await?;

        Ok(result.appnews.map(|n| n.newsitems).unwrap_or_default())
    }

    /// Every game in the configured user's library
    pub async fn owned_games(&self) -> Result<Vec<OwnedGame>> {
        let (key, steam_id) = self.require_credentials()?;

        let url = self.url(
            &self.api_base_url,
            "/IPlayerService/GetOwnedGames/v1/",
            &[
                ("key", key),
                ("steamid", steam_id),
                ("include_appinfo", "1"),
                ("include_played_free_games", "1"),
                ("format", "json"),
            ],
        )?;
        let result: OwnedGamesResponse = self.get_json(url).await?;

        info!("Steam reports {} owned games", result.response.games.len());
        Ok(result.response.games)
    }

    /// Aggregate store, player and library data for an entry.
    ///
    /// Only app-id resolution decides `found`; every other lookup that fails
    /// is logged and left empty.
    pub async fn game_info(&self, entry: &CatalogEntry) -> SteamGameInfo {
        let title = entry.display_title().to_string();
        let app_id = match self.resolve_app_id(entry).await {
            Some(app_id) => app_id,
            None => return SteamGameInfo::not_found(&title),
        };

        let details = self.app_details(&app_id).await.unwrap_or_else(|e| {
            warn!("Failed to fetch app details for {}: {}", app_id, e);
            None
        });
        let current_players = self.current_players(&app_id).await.unwrap_or_else(|e| {
            warn!("Failed to fetch player count for {}: {}", app_id, e);
            None
        });
        let news = self.news(&app_id, 3).await.unwrap_or_else(|e| {
            warn!("Failed to fetch news for {}: {}", app_id, e);
            Vec::new()
        });

        let owned = if self.has_credentials() {
            match self.owned_games().await {
                Ok(games) => games.into_iter().find(|g| g.appid.to_string() == app_id),
                Err(e) => {
                    warn!("Failed to fetch owned games: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let schema = self.achievement_schema(&app_id).await.unwrap_or_else(|e| {
            warn!("Failed to fetch achievement schema for {}: {}", app_id, e);
            Vec::new()
        });
        let player_states = match self.config.credentials() {
            Some((_, steam_id)) => match self.player_achievements(&app_id, steam_id).await {
                Ok(states) => Some(states),
                Err(e) => {
                    warn!("Failed to fetch achievements for {}: {}", app_id, e);
                    None
                }
            },
            None => None,
        };
        let (achievements, player_achievement) = achievement_view(&schema, player_states.as_deref());

        let details = details.unwrap_or_default();
        SteamGameInfo {
            found: true,
            title: if details.name.is_empty() { title } else { details.name },
            header_image: Some(details.header_image.unwrap_or_else(|| landscape_cover_url(&app_id))),
            short_description: details.short_description,
            genres: details.genres.into_iter().map(|g| g.description).take(4).collect(),
            price: details.price_overview.map(|p| p.final_formatted),
            current_players,
            achievement_total: details.achievements.map(|a| a.total),
            player_achievement,
            achievements,
            playtime_minutes: owned.as_ref().map(|g| g.playtime_forever),
            last_played: owned.as_ref().and_then(OwnedGame::last_played),
            news,
            store_url: Some(store_url(&app_id)),
            steamdb_url: steamdb_url(&app_id),
            app_id: Some(app_id),
        }
    }
}
