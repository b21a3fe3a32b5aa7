use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::steam::SteamClient;

/// Most recent unlocks kept on a progress summary
const RECENT_UNLOCKS: usize = 8;

#[derive(Debug, Deserialize)]
struct SchemaResponse {
    #[serde(default)]
    game: SchemaGame,
}

#[derive(Debug, Default, Deserialize)]
struct SchemaGame {
    #[serde(default, rename = "availableGameStats")]
    available_game_stats: Option<GameStats>,
}

#[derive(Debug, Default, Deserialize)]
struct GameStats {
    #[serde(default)]
    achievements: Vec<SchemaAchievement>,
}

/// An achievement as the game defines it
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SchemaAchievement {
    pub name: String,
    #[serde(default, rename = "displayName")]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub icongray: String,
    #[serde(default)]
    pub hidden: u8,
}

#[derive(Debug, Deserialize)]
struct PlayerStatsResponse {
    playerstats: PlayerStats,
}

#[derive(Debug, Deserialize)]
struct PlayerStats {
    #[serde(default)]
    achievements: Vec<PlayerAchievement>,
}

/// One achievement's state for a player
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PlayerAchievement {
    pub apiname: String,
    #[serde(default)]
    pub achieved: u8,
    /// Unix seconds, 0 while locked
    #[serde(default)]
    pub unlocktime: i64,
}

impl PlayerAchievement {
    pub fn is_achieved(&self) -> bool {
        self.achieved == 1
    }
}

/// An achievement ready for display
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AchievementItem {
    pub key: String,
    pub achieved: bool,
    /// Unix seconds, 0 while locked
    pub unlock_time: i64,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub icon_gray: String,
    pub hidden: bool,
}

impl AchievementItem {
    fn from_schema(schema: &SchemaAchievement) -> Self {
        Self {
            key: schema.name.clone(),
            title: non_empty_or(&schema.display_name, &schema.name),
            description: schema.description.clone(),
            icon: schema.icon.clone(),
            icon_gray: non_empty_or(&schema.icongray, &schema.icon),
            hidden: schema.hidden != 0,
            ..Self::default()
        }
    }
}

/// How far the player is through a game's achievements
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    pub total: usize,
    pub unlocked: usize,
    /// Whole percent
    pub rate: u32,
    /// Latest unlocks, newest first
    pub recent: Vec<AchievementItem>,
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let chosen = if value.is_empty() { fallback } else { value };
    chosen.to_string()
}

/// Join a player's achievement states with the game's definitions
pub fn merge_achievements(schema: &[SchemaAchievement], player: &[PlayerAchievement]) -> Vec<AchievementItem> {
    player
        .iter()
        .map(|state| {
            let base = schema
                .iter()
                .find(|s| s.name == state.apiname)
                .map(AchievementItem::from_schema)
                .unwrap_or_else(|| AchievementItem {
                    key: state.apiname.clone(),
                    title: state.apiname.clone(),
                    ..AchievementItem::default()
                });

            AchievementItem {
                achieved: state.is_achieved(),
                unlock_time: state.unlocktime,
                ..base
            }
        })
        .collect()
}

/// Totals, completion rate and latest unlocks
pub fn achievement_progress(items: &[AchievementItem]) -> AchievementProgress {
    let mut recent: Vec<AchievementItem> = items
        .iter()
        .filter(|item| item.achieved && item.unlock_time > 0)
        .cloned()
        .collect();
    recent.sort_by(|a, b| b.unlock_time.cmp(&a.unlock_time));
    recent.truncate(RECENT_UNLOCKS);

    let total = items.len();
    let unlocked = items.iter().filter(|item| item.achieved).count();
    let rate = if total == 0 {
        0
    } else {
        (unlocked as f64 / total as f64 * 100.0).round() as u32
    };

    AchievementProgress {
        total,
        unlocked,
        rate,
        recent,
    }
}

/// Achievement list and progress for a game page.
///
/// Without player data the schema is listed with everything locked and there
/// is no progress.
pub fn achievement_view(
    schema: &[SchemaAchievement],
    player: Option<&[PlayerAchievement]>,
) -> (Vec<AchievementItem>, Option<AchievementProgress>) {
    let merged = player.map(|states| merge_achievements(schema, states));
    let progress = merged.as_deref().map(achievement_progress);

    let items = match merged {
        Some(items) if !items.is_empty() => items,
        _ => schema.iter().map(AchievementItem::from_schema).collect(),
    };
    (items, progress)
}

impl SteamClient {
    /// Achievement definitions for an app; empty without an API key
    pub async fn achievement_schema(&self, app_id: &str) -> Result<Vec<SchemaAchievement>> {
        let key = match self.api_key() {
            Some(key) => key,
            None => return Ok(Vec::new()),
        };

        let url = self.api_url(
            "/ISteamUserStats/GetSchemaForGame/v2/",
            &[("key", key), ("appid", app_id), ("l", self.language())],
        )?;
        let result: SchemaResponse = self.get_json(url).await?;

        Ok(result
            .game
            .available_game_stats
            .map(|stats| stats.achievements)
            .unwrap_or_default())
    }

    /// Achievement states of `steam_id` in an app
    pub async fn player_achievements(&self, app_id: &str, steam_id: &str) -> Result<Vec<PlayerAchievement>> {
        let (key, _) = self.require_credentials()?;

        let url = self.api_url(
            "/ISteamUserStats/GetPlayerAchievements/v1/",
            &[("key", key), ("steamid", steam_id), ("appid", app_id)],
        )?;
        let result: PlayerStatsResponse = self.get_json(url).await?;

        Ok(result.playerstats.achievements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SteamConfig;
    use crate::error::SteamError;
    use serde_json::json;

    fn schema() -> Vec<SchemaAchievement> {
        let response: SchemaResponse = serde_json::from_value(json!({
            "game": {
                "gameName": "Portal 2",
                "availableGameStats": {
                    "achievements": [
                        { "name": "ACH_WAKE", "defaultvalue": 0, "displayName": "Wake Up Call", "hidden": 0,
                          "description": "Survive", "icon": "https://x/w.jpg", "icongray": "https://x/wg.jpg" },
                        { "name": "ACH_SECRET", "displayName": "", "hidden": 1, "icon": "https://x/s.jpg" }
                    ]
                }
            }
        }))
        .unwrap();
        response.game.available_game_stats.unwrap().achievements
    }

    fn player() -> Vec<PlayerAchievement> {
        let response: PlayerStatsResponse = serde_json::from_value(json!({
            "playerstats": {
                "steamID": "76561198000000000",
                "gameName": "Portal 2",
                "achievements": [
                    { "apiname": "ACH_WAKE", "achieved": 1, "unlocktime": 1700000000 },
                    { "apiname": "ACH_SECRET", "achieved": 0, "unlocktime": 0 },
                    { "apiname": "ACH_REMOVED", "achieved": 1, "unlocktime": 1600000000 }
                ],
                "success": true
            }
        }))
        .unwrap();
        response.playerstats.achievements
    }

    #[test]
    fn merges_player_states_with_definitions() {
        let items = merge_achievements(&schema(), &player());

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Wake Up Call");
        assert!(items[0].achieved);
        assert_eq!(items[0].icon_gray, "https://x/wg.jpg");

        assert_eq!(items[1].title, "ACH_SECRET");
        assert_eq!(items[1].icon_gray, "https://x/s.jpg");
        assert!(items[1].hidden);
        assert!(!items[1].achieved);

        assert_eq!(items[2].title, "ACH_REMOVED");
        assert_eq!(items[2].unlock_time, 1_600_000_000);
    }

    #[test]
    fn progress_counts_and_orders_unlocks() {
        let progress = achievement_progress(&merge_achievements(&schema(), &player()));

        assert_eq!(progress.total, 3);
        assert_eq!(progress.unlocked, 2);
        assert_eq!(progress.rate, 67);
        let keys: Vec<&str> = progress.recent.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, ["ACH_WAKE", "ACH_REMOVED"]);

        assert_eq!(achievement_progress(&[]).rate, 0);
    }

    #[test]
    fn recent_unlocks_are_capped() {
        let states: Vec<PlayerAchievement> = (1..=12)
            .map(|n| PlayerAchievement {
                apiname: format!("A{}", n),
                achieved: 1,
                unlocktime: n,
            })
            .collect();
        let progress = achievement_progress(&merge_achievements(&[], &states));

        assert_eq!(progress.rate, 100);
        assert_eq!(progress.recent.len(), 8);
        assert_eq!(progress.recent[0].key, "A12");
    }

    #[test]
    fn schema_is_listed_locked_without_player_data() {
        let (items, progress) = achievement_view(&schema(), None);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| !i.achieved));
        assert!(progress.is_none());

        let (items, progress) = achievement_view(&schema(), Some(&[][..]));
        assert_eq!(items.len(), 2);
        assert_eq!(progress.unwrap().total, 0);

        let (items, progress) = achievement_view(&schema(), Some(player().as_slice()));
        assert_eq!(items.len(), 3);
        assert_eq!(progress.unwrap().unlocked, 2);
    }

    #[test]
    fn games_without_stats_have_no_schema() {
        let response: SchemaResponse = serde_json::from_value(json!({ "game": {} })).unwrap();
        assert!(response.game.available_game_stats.is_none());
        let response: SchemaResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.game.available_game_stats.is_none());
    }

    #[tokio::test]
    async fn lookups_without_credentials_stay_offline() {
        let client = SteamClient::new(SteamConfig::default());
        assert!(client.achievement_schema("620").await.unwrap().is_empty());

        let err = client.player_achievements("620", "1").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<SteamError>(), Some(SteamError::MissingCredentials)));
    }
}
