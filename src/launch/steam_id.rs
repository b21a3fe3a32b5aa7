use once_cell::sync::Lazy;
use regex::Regex;

static STEAM_RUN_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^steam://rungameid/([0-9]+)").expect("steam run uri pattern")
});

static STORE_APP_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)store\.steampowered\.com/app/([0-9]+)").expect("steam store url pattern")
});

/// Pull a Steam app id out of a raw string.
///
/// Recognised encodings, first match wins:
/// 1. the whole (trimmed) value is decimal digits, e.g. `730`
/// 2. `steam://rungameid/<digits>` with any casing of the scheme
/// 3. anything containing `store.steampowered.com/app/<digits>`
///
/// Returns an empty string when no id is present.
pub fn extract_app_id(value: &str) -> String {
    let raw = value.trim();
    if raw.is_empty() {
        return String::new();
    }

    if raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.to_string();
    }

    if let Some(caps) = STEAM_RUN_URI.captures(raw) {
        return caps[1].to_string();
    }

    if let Some(caps) = STORE_APP_URL.captures(raw) {
        return caps[1].to_string();
    }

    String::new()
}

/// Canonical launch URI for an app id.
pub fn steam_run_uri(app_id: &str) -> String {
    format!("steam://rungameid/{}", app_id)
}
