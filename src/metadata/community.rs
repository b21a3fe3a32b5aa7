use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::future::join_all;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::achievements::PlayerAchievement;
use super::steam::{store_url, NewsItem, SteamClient};
use crate::catalog::CatalogEntry;

/// Friends listed at most
const FRIENDS_LIMIT: usize = 100;
/// Friends whose history is read for the activity feed
const ACTIVITY_FRIENDS_LIMIT: usize = 30;
const ACTIVITY_LIMIT: usize = 50;
/// Recent games read per friend
const ACTIVITY_RECENT_GAMES: usize = 5;
/// Latest unlocks reported per friend and game
const ACHIEVEMENTS_PER_GAME: usize = 2;
const ACHIEVEMENT_WINDOW_DAYS: i64 = 14;
/// Total minutes under which a recent game counts as just started
const NEW_GAME_MINUTES: u64 = 60;

const FEED_GAMES_LIMIT: usize = 6;
const FEED_NEWS_COUNT: usize = 2;
const FEED_EXCERPT_LENGTH: usize = 240;
const FEED_RECENT_LIMIT: usize = 3;
const RECENT_PLAYTIME_LABEL: &str = "recent_playtime";

#[derive(Debug, Deserialize)]
struct FriendListResponse {
    friendslist: FriendList,
}

#[derive(Debug, Deserialize)]
struct FriendList {
    #[serde(default)]
    friends: Vec<FriendLink>,
}

/// An entry of a user's friend list
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FriendLink {
    pub steamid: String,
    /// Unix seconds
    #[serde(default)]
    pub friend_since: i64,
}

#[derive(Debug, Deserialize)]
struct PlayerSummariesResponse {
    response: PlayerSummaries,
}

#[derive(Debug, Deserialize)]
struct PlayerSummaries {
    #[serde(default)]
    players: Vec<PlayerSummary>,
}

/// Public profile of a Steam user
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlayerSummary {
    pub steamid: String,
    pub personaname: String,
    pub realname: String,
    /// 0 is offline, anything else some form of online
    pub personastate: u8,
    /// Name of the game being played
    pub gameextrainfo: Option<String>,
    pub gameid: Option<String>,
    pub avatarmedium: String,
    pub avatarfull: String,
    /// Unix seconds
    pub lastlogoff: i64,
}

impl PlayerSummary {
    fn status(&self) -> PresenceStatus {
        if self.personastate > 0 {
            PresenceStatus::Online
        } else {
            PresenceStatus::Offline
        }
    }

    fn current_game(&self) -> Option<&str> {
        self.gameextrainfo.as_deref().filter(|g| !g.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct RecentGamesResponse {
    #[serde(default)]
    response: RecentGames,
}

#[derive(Debug, Default, Deserialize)]
struct RecentGames {
    #[serde(default)]
    games: Vec<RecentGame>,
}

/// A game played in the last two weeks
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecentGame {
    pub appid: u64,
    pub name: String,
    /// Minutes
    pub playtime_2weeks: u64,
    /// Minutes
    pub playtime_forever: u64,
    /// Unix seconds, 0 if unknown
    pub rtime_last_played: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// A friend of the configured user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub id: String,
    pub name: String,
    pub real_name: String,
    pub status: PresenceStatus,
    pub is_playing: bool,
    pub game: Option<String>,
    pub game_app_id: Option<String>,
    pub avatar: String,
    pub friend_since: Option<DateTime<Utc>>,
    pub last_online: Option<DateTime<Utc>>,
}

/// The configured user's own profile
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SteamUser {
    pub id: String,
    pub name: String,
    pub real_name: String,
    pub avatar: String,
    pub status: PresenceStatus,
    pub game: Option<String>,
}

impl From<PlayerSummary> for SteamUser {
    fn from(player: PlayerSummary) -> Self {
        Self {
            status: player.status(),
            game: player.current_game().map(str::to_string),
            avatar: first_non_empty(&player.avatarfull, &player.avatarmedium),
            id: player.steamid,
            name: player.personaname,
            real_name: player.realname,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// In game right now
    Playing,
    /// Started a game recently
    FirstPlay,
    /// Unlocked an achievement recently
    Achievement,
}

/// Something a friend did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendActivity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub friend_id: String,
    pub friend_name: String,
    pub friend_real_name: String,
    pub friend_avatar: String,
    pub game: String,
    pub game_app_id: Option<String>,
    /// Achievement API name
    pub achievement: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A news post on the community feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedNews {
    pub gid: String,
    pub title: String,
    pub url: String,
    pub author: String,
    /// Unix seconds
    pub date: i64,
    pub feedlabel: String,
    pub excerpt: String,
}

impl From<NewsItem> for FeedNews {
    fn from(item: NewsItem) -> Self {
        Self {
            gid: item.gid,
            title: item.title,
            url: item.url,
            author: item.author,
            date: item.date,
            feedlabel: item.feedlabel,
            excerpt: item.contents,
        }
    }
}

/// One game's block on the community feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub app_id: String,
    pub title: String,
    pub current_players: Option<u64>,
    pub news: Vec<FeedNews>,
}

fn first_non_empty(first: &str, second: &str) -> String {
    let chosen = if first.is_empty() { second } else { first };
    chosen.to_string()
}

fn unix_time(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    Utc.timestamp_opt(secs, 0).single()
}

fn hours(minutes: u64) -> u64 {
    (minutes as f64 / 60.0).round() as u64
}

/// Pair profiles with the friend list entries they came from
pub fn friends_from_summaries(links: &[FriendLink], players: Vec<PlayerSummary>) -> Vec<Friend> {
    players
        .into_iter()
        .map(|player| {
            let since = links
                .iter()
                .find(|link| link.steamid == player.steamid)
                .and_then(|link| unix_time(link.friend_since));
            let game = player.current_game().map(str::to_string);

            Friend {
                status: player.status(),
                is_playing: game.is_some(),
                game,
                game_app_id: player.gameid.clone().filter(|id| !id.is_empty()),
                avatar: first_non_empty(&player.avatarmedium, &player.avatarfull),
                friend_since: since,
                last_online: unix_time(player.lastlogoff),
                id: player.steamid,
                name: player.personaname,
                real_name: player.realname,
            }
        })
        .collect()
}

/// Activities for one friend from their profile and recent games with the
/// achievement states of each
pub fn activities_for_friend(
    player: &PlayerSummary,
    history: &[(RecentGame, Vec<PlayerAchievement>)],
    now: DateTime<Utc>,
) -> Vec<FriendActivity> {
    let activity = |kind, game: &str, game_app_id: Option<String>, timestamp| FriendActivity {
        kind,
        friend_id: player.steamid.clone(),
        friend_name: player.personaname.clone(),
        friend_real_name: player.realname.clone(),
        friend_avatar: first_non_empty(&player.avatarmedium, &player.avatarfull),
        game: game.to_string(),
        game_app_id,
        achievement: None,
        timestamp,
    };

    let mut activities = Vec::new();
    if let Some(game) = player.current_game() {
        let app_id = player.gameid.clone().filter(|id| !id.is_empty());
        activities.push(activity(ActivityKind::Playing, game, app_id, now));
    }

    let window = Duration::days(ACHIEVEMENT_WINDOW_DAYS);
    for (game, achievements) in history {
        let app_id = Some(game.appid.to_string());

        if game.playtime_forever < NEW_GAME_MINUTES {
            let started = unix_time(game.rtime_last_played).unwrap_or(now);
            activities.push(activity(ActivityKind::FirstPlay, &game.name, app_id.clone(), started));
        }

        let mut unlocked: Vec<&PlayerAchievement> = achievements
            .iter()
            .filter(|a| a.is_achieved() && a.unlocktime > 0)
            .collect();
        unlocked.sort_by(|a, b| b.unlocktime.cmp(&a.unlocktime));

        for achievement in unlocked.into_iter().take(ACHIEVEMENTS_PER_GAME) {
            let unlocked_at = match unix_time(achievement.unlocktime) {
                Some(at) if now - at < window => at,
                _ => continue,
            };
            activities.push(FriendActivity {
                achievement: Some(first_non_empty(&achievement.apiname, "Achievement")),
                ..activity(ActivityKind::Achievement, &game.name, app_id.clone(), unlocked_at)
            });
        }
    }

    activities
}

/// Newest first, capped
pub fn latest_activities(mut activities: Vec<FriendActivity>) -> Vec<FriendActivity> {
    activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    activities.truncate(ACTIVITY_LIMIT);
    activities
}

/// Feed block summarizing the user's own recent playtime in a game
pub fn recent_playtime_entry(game: &RecentGame, now: DateTime<Utc>) -> FeedEntry {
    let app_id = game.appid.to_string();
    let recent = hours(game.playtime_2weeks);

    FeedEntry {
        title: game.name.clone(),
        current_players: None,
        news: vec![FeedNews {
            gid: format!("recent-{}", app_id),
            title: format!("Played {} h in the last two weeks", recent),
            url: store_url(&app_id),
            author: "Steam".to_string(),
            date: now.timestamp(),
            feedlabel: RECENT_PLAYTIME_LABEL.to_string(),
            excerpt: format!(
                "Played {} h in the last two weeks, {} h in total",
                recent,
                hours(game.playtime_forever)
            ),
        }],
        app_id,
    }
}

impl SteamClient {
    /// Friend list of `steam_id`; fails for private profiles
    pub async fn friend_list(&self, steam_id: &str) -> Result<Vec<FriendLink>> {
        let (key, _) = self.require_credentials()?;

        let url = self.api_url(
            "/ISteamUser/GetFriendList/v1/",
            &[("key", key), ("steamid", steam_id), ("relationship", "friend")],
        )?;
        let result: FriendListResponse = self.get_json(url).await?;

        Ok(result.friendslist.friends)
    }

    /// Profiles for up to 100 users
    pub async fn player_summaries(&self, steam_ids: &[&str]) -> Result<Vec<PlayerSummary>> {
        if steam_ids.is_empty() {
            return Ok(Vec::new());
        }
        let (key, _) = self.require_credentials()?;

        let ids = steam_ids.join(",");
        let url = self.api_url(
            "/ISteamUser/GetPlayerSummaries/v2/",
            &[("key", key), ("steamids", ids.as_str())],
        )?;
        let result: PlayerSummariesResponse = self.get_json(url).await?;

        Ok(result.response.players)
    }

    /// Games `steam_id` played in the last two weeks
    pub async fn recently_played(&self, steam_id: &str, count: Option<usize>) -> Result<Vec<RecentGame>> {
        let (key, _) = self.require_credentials()?;

        let count = count.map(|c| c.to_string());
        let mut params = vec![("key", key), ("steamid", steam_id)];
        if let Some(count) = count.as_deref() {
            params.push(("count", count));
        }
        let url = self.api_url("/IPlayerService/GetRecentlyPlayedGames/v1/", &params)?;
        let result: RecentGamesResponse = self.get_json(url).await?;

        Ok(result.response.games)
    }

    /// The configured user's friends with their current status
    pub async fn friends(&self) -> Result<Vec<Friend>> {
        let (_, steam_id) = self.require_credentials()?;

        let links = self.friend_list(steam_id).await?;
        let ids: Vec<&str> = links
            .iter()
            .take(FRIENDS_LIMIT)
            .map(|link| link.steamid.as_str())
            .collect();
        let players = self.player_summaries(&ids).await?;

        info!("Steam reports {} friends", players.len());
        Ok(friends_from_summaries(&links, players))
    }

    /// The configured user's profile, `None` if Steam does not know the id
    pub async fn user_info(&self) -> Result<Option<SteamUser>> {
        let (_, steam_id) = self.require_credentials()?;

        let players = self.player_summaries(&[steam_id]).await?;
        Ok(players.into_iter().next().map(SteamUser::from))
    }

    async fn friend_history(&self, player: &PlayerSummary) -> Vec<(RecentGame, Vec<PlayerAchievement>)> {
        let games = self
            .recently_played(&player.steamid, Some(ACTIVITY_RECENT_GAMES))
            .await
            .unwrap_or_else(|e| {
                debug!("No recent games for {}: {}", player.steamid, e);
                Vec::new()
            });

        let lookups = games.iter().map(|game| async move {
            self.player_achievements(&game.appid.to_string(), &player.steamid)
                .await
                .unwrap_or_else(|e| {
                    debug!("No achievements for {} in {}: {}", player.steamid, game.appid, e);
                    Vec::new()
                })
        });
        let achievements = join_all(lookups).await;

        games.into_iter().zip(achievements).collect()
    }

    /// What the configured user's friends have been doing, newest first.
    ///
    /// Reading the friend list is the only failure; per-friend lookups that
    /// fail contribute nothing.
    pub async fn friend_activities(&self) -> Result<Vec<FriendActivity>> {
        let (_, steam_id) = self.require_credentials()?;

        let links = self.friend_list(steam_id).await?;
        let ids: Vec<&str> = links
            .iter()
            .take(ACTIVITY_FRIENDS_LIMIT)
            .map(|link| link.steamid.as_str())
            .collect();
        let players = self.player_summaries(&ids).await?;

        let histories = join_all(players.iter().map(|player| self.friend_history(player))).await;
        let now = Utc::now();
        let activities = players
            .iter()
            .zip(&histories)
            .flat_map(|(player, history)| activities_for_friend(player, history, now))
            .collect();

        Ok(latest_activities(activities))
    }

    async fn feed_entry(&self, entry: &CatalogEntry) -> Option<FeedEntry> {
        let app_id = self.resolve_app_id(entry).await?;
        let title = match entry.display_title().trim() {
            "" => format!("App {}", app_id),
            title => title.to_string(),
        };

        let news = self
            .news_excerpts(&app_id, FEED_NEWS_COUNT, FEED_EXCERPT_LENGTH)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to fetch news for {}: {}", app_id, e);
                Vec::new()
            });
        let current_players = self.current_players(&app_id).await.unwrap_or_else(|e| {
            warn!("Failed to fetch player count for {}: {}", app_id, e);
            None
        });

        Some(FeedEntry {
            app_id,
            title,
            current_players,
            news: news.into_iter().map(FeedNews::from).collect(),
        })
    }

    /// News and player counts for the first library entries, followed by the
    /// configured user's recent playtime when credentials are set
    pub async fn community_feed(&self, entries: &[CatalogEntry]) -> Vec<FeedEntry> {
        let blocks = join_all(entries.iter().take(FEED_GAMES_LIMIT).map(|e| self.feed_entry(e))).await;
        let mut feed: Vec<FeedEntry> = blocks.into_iter().flatten().collect();

        if let Ok((_, steam_id)) = self.require_credentials() {
            match self.recently_played(steam_id, None).await {
                Ok(games) => {
                    let now = Utc::now();
                    feed.extend(
                        games
                            .iter()
                            .take(FEED_RECENT_LIMIT)
                            .map(|game| recent_playtime_entry(game, now)),
                    );
                }
                Err(e) => warn!("Failed to fetch recently played games: {}", e),
            }
        }

        feed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SteamConfig;
    use crate::error::SteamError;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn players() -> Vec<PlayerSummary> {
        let response: PlayerSummariesResponse = serde_json::from_value(json!({
            "response": {
                "players": [
                    {
                        "steamid": "1", "personaname": "Ann", "realname": "Ann A", "personastate": 1,
                        "gameextrainfo": "Portal 2", "gameid": "620",
                        "avatarmedium": "https://x/a_m.jpg", "avatarfull": "https://x/a_f.jpg",
                        "lastlogoff": 1699990000
                    },
                    { "steamid": "2", "personaname": "Bo", "personastate": 0, "avatarfull": "https://x/b_f.jpg" }
                ]
            }
        }))
        .unwrap();
        response.response.players
    }

    fn recent(appid: u64, name: &str, forever: u64, last_played: i64) -> RecentGame {
        RecentGame {
            appid,
            name: name.to_string(),
            playtime_2weeks: forever.min(600),
            playtime_forever: forever,
            rtime_last_played: last_played,
        }
    }

    fn unlock(name: &str, at: i64) -> PlayerAchievement {
        PlayerAchievement {
            apiname: name.to_string(),
            achieved: 1,
            unlocktime: at,
        }
    }

    #[test]
    fn parses_social_payloads() {
        let list: FriendListResponse = serde_json::from_value(json!({
            "friendslist": { "friends": [
                { "steamid": "1", "relationship": "friend", "friend_since": 1600000000 },
                { "steamid": "2", "relationship": "friend" }
            ] }
        }))
        .unwrap();
        assert_eq!(list.friendslist.friends[1].friend_since, 0);

        let games: RecentGamesResponse = serde_json::from_value(json!({
            "response": { "total_count": 1, "games": [
                { "appid": 620, "name": "Portal 2", "playtime_2weeks": 90, "playtime_forever": 1200 }
            ] }
        }))
        .unwrap();
        assert_eq!(games.response.games[0].playtime_2weeks, 90);

        let empty: RecentGamesResponse = serde_json::from_value(json!({ "response": {} })).unwrap();
        assert!(empty.response.games.is_empty());
    }

    #[test]
    fn friends_carry_status_and_friendship_date() {
        let links = vec![FriendLink {
            steamid: "1".to_string(),
            friend_since: 1_600_000_000,
        }];
        let friends = friends_from_summaries(&links, players());

        let ann = &friends[0];
        assert_eq!(ann.status, PresenceStatus::Online);
        assert!(ann.is_playing);
        assert_eq!(ann.game.as_deref(), Some("Portal 2"));
        assert_eq!(ann.game_app_id.as_deref(), Some("620"));
        assert_eq!(ann.avatar, "https://x/a_m.jpg");
        assert_eq!(ann.friend_since.unwrap().timestamp(), 1_600_000_000);

        let bo = &friends[1];
        assert_eq!(bo.status, PresenceStatus::Offline);
        assert!(!bo.is_playing);
        assert_eq!(bo.avatar, "https://x/b_f.jpg");
        assert!(bo.friend_since.is_none());
        assert!(bo.last_online.is_none());

        let value = serde_json::to_value(ann).unwrap();
        assert_eq!(value["status"], "online");
        assert_eq!(value["realName"], "Ann A");
    }

    #[test]
    fn own_profile_prefers_full_avatar() {
        let user = SteamUser::from(players().remove(0));
        assert_eq!(user.avatar, "https://x/a_f.jpg");
        assert_eq!(user.game.as_deref(), Some("Portal 2"));
        assert_eq!(user.status, PresenceStatus::Online);
    }

    #[test]
    fn activities_cover_playing_new_games_and_recent_unlocks() {
        let ann = players().remove(0);
        let day = 86_400;
        let history = vec![
            (
                recent(10, "New Game", 30, 1_699_000_000),
                vec![
                    unlock("OLD", 1_700_000_000 - 20 * day),
                    unlock("FIRST", 1_700_000_000 - day),
                    unlock("SECOND", 1_700_000_000 - 2 * day),
                    unlock("THIRD", 1_700_000_000 - 3 * day),
                ],
            ),
            (recent(20, "Old Favourite", 5000, 0), vec![unlock("STALE", 1_700_000_000 - 15 * day)]),
            (recent(30, "Fresh Start", 10, 0), Vec::new()),
        ];

        let activities = activities_for_friend(&ann, &history, now());
        let summary: Vec<(ActivityKind, &str, Option<&str>)> = activities
            .iter()
            .map(|a| (a.kind, a.game.as_str(), a.achievement.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ActivityKind::Playing, "Portal 2", None),
                (ActivityKind::FirstPlay, "New Game", None),
                (ActivityKind::Achievement, "New Game", Some("FIRST")),
                (ActivityKind::Achievement, "New Game", Some("SECOND")),
                (ActivityKind::FirstPlay, "Fresh Start", None),
            ]
        );
        assert_eq!(activities[0].game_app_id.as_deref(), Some("620"));
        assert_eq!(activities[1].timestamp.timestamp(), 1_699_000_000);
        assert_eq!(activities[4].timestamp, now());
        assert_eq!(activities[2].friend_avatar, "https://x/a_m.jpg");

        let value = serde_json::to_value(&activities[1]).unwrap();
        assert_eq!(value["type"], "first_play");
        assert_eq!(value["friendName"], "Ann");
    }

    #[test]
    fn latest_activities_are_sorted_and_capped() {
        let ann = players().remove(0);
        let history: Vec<(RecentGame, Vec<PlayerAchievement>)> = (0..60)
            .map(|n| (recent(n, "Game", 0, 1_600_000_000 + n as i64), Vec::new()))
            .collect();

        let activities = latest_activities(activities_for_friend(&ann, &history, now()));
        assert_eq!(activities.len(), 50);
        assert_eq!(activities[0].kind, ActivityKind::Playing);
        assert_eq!(activities[1].timestamp.timestamp(), 1_600_000_059);
        assert!(activities.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn recent_playtime_becomes_a_feed_block() {
        let game = RecentGame {
            appid: 620,
            name: "Portal 2".to_string(),
            playtime_2weeks: 95,
            playtime_forever: 1234,
            rtime_last_played: 0,
        };
        let entry = recent_playtime_entry(&game, now());

        assert_eq!(entry.app_id, "620");
        assert!(entry.current_players.is_none());
        let news = &entry.news[0];
        assert_eq!(news.gid, "recent-620");
        assert_eq!(news.feedlabel, "recent_playtime");
        assert_eq!(news.title, "Played 2 h in the last two weeks");
        assert_eq!(news.excerpt, "Played 2 h in the last two weeks, 21 h in total");
        assert_eq!(news.url, "https://store.steampowered.com/app/620/");
        assert_eq!(news.date, 1_700_000_000);
    }

    #[test]
    fn news_posts_become_excerpts() {
        let item: NewsItem = serde_json::from_value(json!({
            "gid": "5001", "title": "Patch", "url": "https://x/n", "author": "Valve",
            "contents": "Fixed things", "feedlabel": "Community Announcements", "date": 1700000000
        }))
        .unwrap();
        let news = FeedNews::from(item);
        assert_eq!(news.excerpt, "Fixed things");
        assert_eq!(news.feedlabel, "Community Announcements");
        assert_eq!(news.gid, "5001");
    }

    #[tokio::test]
    async fn social_lookups_require_credentials() {
        let client = SteamClient::new(SteamConfig::default());

        for err in [
            client.friends().await.unwrap_err(),
            client.friend_activities().await.unwrap_err(),
            client.user_info().await.unwrap_err(),
        ] {
            assert!(matches!(err.downcast_ref::<SteamError>(), Some(SteamError::MissingCredentials)));
        }
        assert!(client.player_summaries(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn feed_skips_entries_without_app_id() {
        let client = SteamClient::new(SteamConfig::default());
        let untitled = CatalogEntry {
            exec_path: "/opt/game/run".to_string(),
            ..CatalogEntry::default()
        };
        assert!(client.community_feed(&[untitled]).await.is_empty());
    }
}
