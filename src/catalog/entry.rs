use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::launch::{extract_app_id, normalize_exec_path, tokenize};

/// Default card gradient for new entries
pub const DEFAULT_COLOR: &str = "from-slate-700 via-slate-600 to-slate-900";
/// Default card icon for new entries
pub const DEFAULT_ICON: &str = "gamepad-2";

/// A game in the library, in its strict persisted form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Stable id, milliseconds since the epoch at creation
    pub id: u64,
    /// Display title
    pub title: String,
    /// English title, preferred for metadata lookups
    pub title_en: String,
    /// Extracted Steam app id, empty if none
    pub steam_app_id: String,
    /// Canonical launch target
    pub exec_path: String,
    /// Extra launch arguments
    pub args: Vec<String>,
    /// User-chosen working directory, empty if unset
    pub working_dir: String,
    /// Portrait cover image URL
    pub cover_url: String,
    /// Landscape cover image URL
    pub landscape_cover_url: String,
    /// Card gradient
    pub color: String,
    /// Card icon name
    pub icon: String,
    /// Hours played
    pub hours: f64,
    /// Most recent launch
    pub last_played: Option<DateTime<Utc>>,
    /// Shown in the "recent" shelf
    pub is_recent: bool,
    /// Marked as favourite
    pub is_fav: bool,
}

impl Default for CatalogEntry {
    fn default() -> Self {
        Self {
            id: 0,
            title: String::new(),
            title_en: String::new(),
            steam_app_id: String::new(),
            exec_path: String::new(),
            args: Vec::new(),
            working_dir: String::new(),
            cover_url: String::new(),
            landscape_cover_url: String::new(),
            color: DEFAULT_COLOR.to_string(),
            icon: DEFAULT_ICON.to_string(),
            hours: 0.0,
            last_played: None,
            is_recent: false,
            is_fav: false,
        }
    }
}

impl CatalogEntry {
    /// Title used for metadata lookups: English first, then the display title
    pub fn lookup_title(&self) -> &str {
        if self.title_en.is_empty() {
            &self.title
        } else {
            &self.title_en
        }
    }

    /// Title used for display: display title first, then English
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.title_en
        } else {
            &self.title
        }
    }

    /// Record a launch that reached the point of invocation
    pub fn mark_launched(&mut self, at: DateTime<Utc>) {
        self.last_played = Some(at);
        self.is_recent = true;
    }

    /// Apply a loosely-typed patch on top of this entry and re-coerce.
    ///
    /// Keys present in `patch` replace the stored values wholesale, then the
    /// result goes through the same normalisation as a fresh record.
    pub fn apply_patch(&self, patch: &Map<String, Value>) -> Result<CatalogEntry, serde_json::Error> {
        let mut merged = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }

        let raw: RawCatalogEntry = serde_json::from_value(Value::Object(merged))?;
        Ok(raw.into_entry())
    }
}

/// A catalog record as it arrives from disk, the CLI or an importer.
///
/// Every field is an untyped JSON value so that numbers-as-strings,
/// space-joined argument strings and other loose shapes survive
/// deserialization. [`RawCatalogEntry::into_entry`] is the only way to turn
/// one into a [`CatalogEntry`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCatalogEntry {
    pub id: Value,
    pub title: Value,
    pub title_en: Value,
    pub steam_app_id: Value,
    pub exec_path: Value,
    pub args: Value,
    pub working_dir: Value,
    pub cover_url: Value,
    pub landscape_cover_url: Value,
    pub color: Value,
    pub icon: Value,
    pub hours: Value,
    pub last_played: Value,
    pub is_recent: Value,
    pub is_fav: Value,
}

impl RawCatalogEntry {
    /// Coerce into the strict shape.
    ///
    /// The Steam app id comes from the explicit field, or failing that from
    /// the exec path; the exec path is then canonicalised against it.
    pub fn into_entry(self) -> CatalogEntry {
        let raw_exec_path = text(&self.exec_path);
        let mut steam_app_id = extract_app_id(&text(&self.steam_app_id));
        if steam_app_id.is_empty() {
            steam_app_id = extract_app_id(&raw_exec_path);
        }
        let exec_path = normalize_exec_path(&raw_exec_path, &steam_app_id);

        CatalogEntry {
            id: id(&self.id).unwrap_or_else(new_entry_id),
            title: text(&self.title),
            title_en: text(&self.title_en),
            steam_app_id,
            exec_path,
            args: args(&self.args),
            working_dir: text(&self.working_dir),
            cover_url: text(&self.cover_url),
            landscape_cover_url: text(&self.landscape_cover_url),
            color: non_empty_or(text(&self.color), DEFAULT_COLOR),
            icon: non_empty_or(text(&self.icon), DEFAULT_ICON),
            hours: number(&self.hours),
            last_played: timestamp(&self.last_played),
            is_recent: flag(&self.is_recent),
            is_fav: flag(&self.is_fav),
        }
    }
}

/// Fresh timestamp-based id
pub fn new_entry_id() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

fn flag(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn id(value: &Value) -> Option<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 1.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|id| *id > 0)
}

/// Arrays keep their elements; a single string is tokenized like a command line
fn args(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(text(other)),
            })
            .filter(|arg| !arg.is_empty())
            .collect(),
        Value::String(s) => tokenize(s),
        _ => Vec::new(),
    }
}

/// RFC 3339 strings or unix seconds; anything else (e.g. `"???"`) is unset
fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .filter(|secs| *secs > 0)
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}
