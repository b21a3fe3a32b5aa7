//! Cover art and Steam metadata: remote lookups, a local cache, imports and
//! the Steam community views.

pub mod achievements;
pub mod cache;
pub mod community;
pub mod covers;
pub mod handler;
pub mod import;
pub mod steam;

pub use achievements::{AchievementItem, AchievementProgress};
pub use cache::{CachedCover, CoverCache};
pub use community::{ActivityKind, FeedEntry, Friend, FriendActivity, PresenceStatus, SteamUser};
pub use covers::{CoverArt, CoverKind, CoverResolver, CoverSource};
pub use handler::{MetadataHandler, MetadataStatus, RefreshSummary};
pub use import::{import_steam_owned_games, merge_owned_games, ImportSummary};
pub use steam::{OwnedGame, SteamClient, SteamGameInfo};
