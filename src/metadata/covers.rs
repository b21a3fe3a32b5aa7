use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::steam::{landscape_cover_url, portrait_cover_url, SteamClient};
use crate::catalog::CatalogEntry;
use crate::config::MetadataConfig;

const THEGAMESDB_LIST_URL: &str = "https://legacy.thegamesdb.net/api/GetGamesList.php";
const CORS_PROXY_URL: &str = "https://api.allorigins.win/raw";
const ITUNES_SEARCH_URL: &str = "https://itunes.apple.com/search";

static BASE_IMG_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<baseImgUrl>([^<]+)</baseImgUrl>").expect("baseImgUrl pattern"));
static GAME_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<Game>(.*?)</Game>").expect("game block pattern"));
static GAME_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<GameTitle>(.*?)</GameTitle>").expect("game title pattern"));
static THUMB: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<thumb>([^<]+)</thumb>").expect("thumb pattern"));
static FANART: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<fanart>([^<]+)</fanart>").expect("fanart pattern"));
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("html tag pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Which side of the artwork to pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverKind {
    Portrait,
    Landscape,
}

/// Where a cover came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverSource {
    SteamCdn,
    TheGamesDb,
    ITunes,
    Default,
}

/// A pair of cover images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverArt {
    pub portrait: String,
    pub landscape: String,
    pub source: CoverSource,
}

impl CoverArt {
    /// Build from two optional sides, each filling in for the other
    pub fn from_sides(portrait: &str, landscape: &str, source: CoverSource) -> Option<Self> {
        match (portrait.is_empty(), landscape.is_empty()) {
            (true, true) => None,
            (true, false) => Some(Self::same(landscape, source)),
            (false, true) => Some(Self::same(portrait, source)),
            (false, false) => Some(Self {
                portrait: portrait.to_string(),
                landscape: landscape.to_string(),
                source,
            }),
        }
    }

    fn same(url: &str, source: CoverSource) -> Self {
        Self {
            portrait: url.to_string(),
            landscape: url.to_string(),
            source,
        }
    }

    /// Steam CDN artwork for an app
    pub fn steam(app_id: &str) -> Self {
        Self {
            portrait: portrait_cover_url(app_id),
            landscape: landscape_cover_url(app_id),
            source: CoverSource::SteamCdn,
        }
    }

    /// One side of the art
    pub fn pick(&self, kind: CoverKind) -> &str {
        match kind {
            CoverKind::Portrait => &self.portrait,
            CoverKind::Landscape => &self.landscape,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ITunesResponse {
    #[serde(default)]
    pub results: Vec<Option<ITunesItem>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ITunesItem {
    pub artwork_url512: Option<String>,
    pub artwork_url100: Option<String>,
}

fn strip_html(input: &str) -> String {
    let text = HTML_TAG.replace_all(input, " ");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

fn capture(pattern: &Regex, text: &str) -> String {
    pattern
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default()
}

/// Pick artwork for `title` out of a TheGamesDB `GetGamesList` XML reply.
///
/// An exact (case-insensitive) title match wins outright; otherwise the last
/// game whose title contains the query, otherwise the first game.
pub fn parse_thegamesdb_list(xml: &str, title: &str) -> Option<CoverArt> {
    let base = capture(&BASE_IMG_URL, xml);
    if base.is_empty() {
        return None;
    }
    let base = base.trim_end_matches('/');

    let blocks: Vec<&str> = GAME_BLOCK
        .captures_iter(xml)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let target = title.trim().to_lowercase();

    let mut best = *blocks.first()?;
    for &block in &blocks {
        let name = strip_html(&capture(&GAME_TITLE, block)).to_lowercase();
        if name == target {
            best = block;
            break;
        }
        if name.contains(&target) {
            best = block;
        }
    }

    let join = |path: String| {
        if path.is_empty() {
            path
        } else {
            format!("{}/{}", base, path.trim_start_matches('/'))
        }
    };
    let portrait = join(capture(&THUMB, best));
    let landscape = join(capture(&FANART, best));

    CoverArt::from_sides(&portrait, &landscape, CoverSource::TheGamesDb)
}

/// Artwork URL from the first iTunes result, upscaling the 100px variant
pub fn itunes_artwork(response: &ITunesResponse) -> Option<String> {
    let item = response.results.iter().flatten().next()?;

    if let Some(url) = item.artwork_url512.as_deref().filter(|u| !u.is_empty()) {
        return Some(url.to_string());
    }
    item.artwork_url100
        .as_deref()
        .filter(|u| !u.is_empty())
        .map(|u| u.replace("100x100bb", "512x512bb"))
}

/// Resolves cover art for catalog entries from several sources in turn
#[derive(Clone)]
pub struct CoverResolver {
    client: Client,
    steam: SteamClient,
    default_portrait: String,
    default_landscape: String,
}

impl CoverResolver {
    pub fn new(steam: SteamClient, config: &MetadataConfig) -> Self {
        Self {
            client: Client::new(),
            steam,
            default_portrait: config.default_portrait_cover.clone(),
            default_landscape: config.default_landscape_cover.clone(),
        }
    }

    /// The configured fallback artwork
    pub fn default_cover(&self) -> CoverArt {
        CoverArt {
            portrait: self.default_portrait.clone(),
            landscape: self.default_landscape.clone(),
            source: CoverSource::Default,
        }
    }

    /// Find cover art: Steam CDN, TheGamesDB, iTunes, then the defaults.
    /// Never fails; source errors are logged and the next source is tried.
    pub async fn fetch_cover(&self, entry: &CatalogEntry) -> CoverArt {
        if let Some(app_id) = self.steam.resolve_app_id(entry).await {
            return CoverArt::steam(&app_id);
        }

        let title = entry.lookup_title().trim();
        if title.is_empty() {
            return self.default_cover();
        }

        match self.from_thegamesdb(title).await {
            Ok(Some(cover)) => return cover,
            Ok(None) => debug!("TheGamesDB has no artwork for '{}'", title),
            Err(e) => warn!("TheGamesDB lookup for '{}' failed: {}", title, e),
        }

        match self.from_itunes(title).await {
            Ok(Some(url)) => return CoverArt::same(&url, CoverSource::ITunes),
            Ok(None) => debug!("iTunes has no artwork for '{}'", title),
            Err(e) => warn!("iTunes lookup for '{}' failed: {}", title, e),
        }

        info!("No cover art found for '{}', using defaults", title);
        self.default_cover()
    }

    /// One side of the cover, falling back to the other side, then the default
    pub async fn fetch_single_cover(&self, entry: &CatalogEntry, kind: CoverKind) -> String {
        let cover = self.fetch_cover(entry).await;
        let (wanted, other, default) = match kind {
            CoverKind::Portrait => (&cover.portrait, &cover.landscape, &self.default_portrait),
            CoverKind::Landscape => (&cover.landscape, &cover.portrait, &self.default_landscape),
        };

        let picked = [wanted, other, default]
            .into_iter()
            .find(|url| !url.is_empty())
            .cloned()
            .unwrap_or_default();
        picked
    }

    async fn from_thegamesdb(&self, title: &str) -> Result<Option<CoverArt>> {
        let list_url = Url::parse_with_params(THEGAMESDB_LIST_URL, &[("name", title)])
            .context("Invalid TheGamesDB URL")?;
        let proxy_url = Url::parse_with_params(CORS_PROXY_URL, &[("url", list_url.as_str())])
            .context("Invalid proxy URL")?;

        let response = self
            .client
            .get(proxy_url)
            .send()
            .await
            .context("Failed to send TheGamesDB request")?;
        if !response.status().is_success() {
            return Err(anyhow!("TheGamesDB error: {}", response.status()));
        }

        let xml = response.text().await.context("Failed to read TheGamesDB response")?;
        Ok(parse_thegamesdb_list(&xml, title))
    }

    async fn from_itunes(&self, title: &str) -> Result<Option<String>> {
        let url = Url::parse_with_params(
            ITUNES_SEARCH_URL,
            &[("term", title), ("entity", "software"), ("limit", "5")],
        )
        .context("Invalid iTunes URL")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send iTunes request")?;
        if !response.status().is_success() {
            return Err(anyhow!("iTunes error: {}", response.status()));
        }

        let body: ITunesResponse = response.json().await.context("Failed to parse iTunes response")?;
        Ok(itunes_artwork(&body))
    }
}
