use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use game_library::catalog::{CatalogEntry, JsonCatalogStore, Library, RawCatalogEntry};
use game_library::config::Config;
use game_library::launch::SystemLauncher;
use game_library::metadata::{
    import_steam_owned_games, ActivityKind, CoverArt, CoverKind, MetadataHandler, PresenceStatus,
};
use game_library::scan::{self, ScannedGame};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List library entries
    List {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an entry
    Add {
        /// Display title
        #[arg(short, long, default_value = "")]
        title: String,
        /// English title, used for metadata lookups
        #[arg(long, default_value = "")]
        title_en: String,
        /// Executable path, command line, Steam URI, store URL or app id
        exec_path: String,
        /// Extra launch arguments, tokenized like a command line
        #[arg(short, long)]
        args: Option<String>,
        /// Working directory
        #[arg(short, long)]
        working_dir: Option<String>,
        /// Explicit Steam app id
        #[arg(long)]
        steam_app_id: Option<String>,
    },
    /// Apply a JSON object patch to an entry
    Update { id: u64, patch: String },
    /// Remove an entry
    Remove { id: u64 },
    /// Put the given ids first, in order
    Reorder {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Show how an entry would be launched
    Resolve { id: u64 },
    /// Launch an entry
    Launch { id: u64 },
    /// Look for games installed through known launchers
    Scan {
        /// Add what was found to the library
        #[arg(long)]
        import: bool,
    },
    /// Look for installed programs
    ScanPrograms {
        /// Directories to search; configured or Start Menu folders otherwise
        dirs: Vec<PathBuf>,
        /// Add what was found to the library
        #[arg(long)]
        import: bool,
    },
    /// Import the configured user's Steam library
    ImportSteam,
    /// Find cover art for an entry and store it on the entry
    Cover {
        id: u64,
        /// Ignore the cache
        #[arg(long)]
        refresh: bool,
        /// Print only one side
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Fill in cover art across the library
    Covers {
        /// Refetch every cover, overwriting stored ones
        #[arg(long)]
        force: bool,
    },
    /// Show Steam details for an entry
    Info { id: u64 },
    /// List the configured user's Steam friends
    Friends {
        /// Print friends as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what Steam friends have been playing
    Activity {
        /// Print activities as JSON
        #[arg(long)]
        json: bool,
    },
    /// News and player counts for the first library entries
    Feed,
    /// Show the configured user's Steam profile
    Profile,
    /// Print the effective configuration
    Config {
        /// Write it to the configuration file
        #[arg(long)]
        save: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Portrait,
    Landscape,
}

impl From<KindArg> for CoverKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Portrait => CoverKind::Portrait,
            KindArg::Landscape => CoverKind::Landscape,
        }
    }
}

type AppLibrary = Library<JsonCatalogStore, SystemLauncher>;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    config.ensure_directories()?;

    run(cli.command, &config, cli.config.as_deref())
}

fn open_library(config: &Config) -> Result<AppLibrary> {
    let store = JsonCatalogStore::open(&config.paths.data_dir).context("Failed to open the catalog")?;
    Ok(Library::new(store, SystemLauncher))
}

fn runtime() -> Result<Runtime> {
    Runtime::new().context("Failed to start async runtime")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn find_entry(library: &AppLibrary, id: u64) -> Result<CatalogEntry> {
    library
        .get(id)
        .cloned()
        .ok_or_else(|| anyhow!("no catalog entry with id {}", id))
}

fn cover_patch(cover: &CoverArt) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert("coverUrl".to_string(), Value::String(cover.portrait.clone()));
    patch.insert("landscapeCoverUrl".to_string(), Value::String(cover.landscape.clone()));
    patch
}

fn print_scanned(games: &[ScannedGame]) {
    for game in games {
        println!("[{}] {}  {}", game.source, game.title, game.exec_path);
    }
    println!("{} found", games.len());
}

fn import_scanned(library: &mut AppLibrary, games: &[ScannedGame]) -> Result<()> {
    let summary = library.import_scanned(games)?;
    println!(
        "{} added, {} already in library, {} skipped",
        summary.added, summary.duplicates, summary.rejected
    );
    Ok(())
}

fn run(command: Command, config: &Config, config_path: Option<&Path>) -> Result<()> {
    match command {
        Command::List { json } => {
            let library = open_library(config)?;
            if json {
                return print_json(&library.entries());
            }
            for entry in library.entries() {
                let fav = if entry.is_fav { "*" } else { " " };
                println!("{}{:>15}  {}  {}", fav, entry.id, entry.display_title(), entry.exec_path);
            }
        }

        Command::Add {
            title,
            title_en,
            exec_path,
            args,
            working_dir,
            steam_app_id,
        } => {
            let mut library = open_library(config)?;
            let raw: RawCatalogEntry = serde_json::from_value(json!({
                "title": title,
                "titleEn": title_en,
                "execPath": exec_path,
                "args": args,
                "workingDir": working_dir,
                "steamAppId": steam_app_id,
            }))?;

            let outcome = library.add(raw)?;
            if outcome.duplicate {
                println!("Already in library as {}", outcome.entry.id);
            } else {
                println!("Added {} ({})", outcome.entry.display_title(), outcome.entry.id);
            }
        }

        Command::Update { id, patch } => {
            let mut library = open_library(config)?;
            let patch: Value = serde_json::from_str(&patch).context("Patch is not valid JSON")?;
            let patch = patch
                .as_object()
                .ok_or_else(|| anyhow!("Patch must be a JSON object"))?;

            let updated = library.update(id, patch)?;
            print_json(&updated)?;
        }

        Command::Remove { id } => {
            let mut library = open_library(config)?;
            if library.remove(id)? {
                println!("Removed {}", id);
            } else {
                println!("No entry with id {}", id);
            }
        }

        Command::Reorder { ids } => {
            let mut library = open_library(config)?;
            library.reorder(&ids)?;
            let order: Vec<u64> = library.entries().iter().map(|e| e.id).collect();
            println!("{:?}", order);
        }

        Command::Resolve { id } => {
            let library = open_library(config)?;
            print_json(&library.resolve(id)?)?;
        }

        Command::Launch { id } => {
            let mut library = open_library(config)?;
            let plan = library.launch(id)?;
            println!("Launched {}", plan.command.exec_path);
        }

        Command::Scan { import } => {
            let games = scan::scan_installed_games(config);
            print_scanned(&games);
            if import {
                import_scanned(&mut open_library(config)?, &games)?;
            }
        }

        Command::ScanPrograms { dirs, import } => {
            let dirs = if !dirs.is_empty() {
                dirs
            } else if !config.scan.program_dirs.is_empty() {
                config.scan.program_dirs.clone()
            } else {
                scan::default_program_dirs()
            };

            let programs = scan::scan_programs(&dirs);
            print_scanned(&programs);
            if import {
                import_scanned(&mut open_library(config)?, &programs)?;
            }
        }

        Command::ImportSteam => {
            let mut library = open_library(config)?;
            let handler = MetadataHandler::new(config)?;
            let summary = runtime()?
                .block_on(import_steam_owned_games(library.store_mut(), handler.steam()))?;
            println!(
                "{} added, {} updated, {} in library",
                summary.added, summary.updated, summary.total
            );
        }

        Command::Cover { id, refresh, kind } => {
            let mut library = open_library(config)?;
            let entry = find_entry(&library, id)?;
            let mut handler = MetadataHandler::new(config)?;
            handler.initialize()?;

            let rt = runtime()?;
            let cover = if refresh {
                rt.block_on(handler.refresh_cover(&entry))?
            } else {
                rt.block_on(handler.cover(&entry))?
            };
            library.update(id, &cover_patch(&cover))?;

            match kind {
                Some(kind) => println!("{}", rt.block_on(handler.single_cover(&entry, kind.into()))?),
                None => print_json(&cover)?,
            }
        }

        Command::Covers { force } => {
            let mut library = open_library(config)?;
            let mut handler = MetadataHandler::new(config)?;
            handler.initialize()?;

            let targets: Vec<CatalogEntry> = library
                .entries()
                .iter()
                .filter(|e| force || e.cover_url.is_empty() || e.landscape_cover_url.is_empty())
                .cloned()
                .collect();

            let summary = runtime()?.block_on(handler.refresh_library(&targets, force))?;
            for (id, cover) in &summary.covers {
                library.update(*id, &cover_patch(cover))?;
            }
            println!(
                "{} covers updated, {} not found, {} cached",
                summary.successful, summary.failed, summary.skipped
            );
        }

        Command::Info { id } => {
            let library = open_library(config)?;
            let entry = find_entry(&library, id)?;
            let handler = MetadataHandler::new(config)?;
            let info = runtime()?.block_on(handler.game_info(&entry));
            print_json(&info)?;
        }

        Command::Friends { json } => {
            let handler = MetadataHandler::new(config)?;
            let friends = runtime()?.block_on(handler.steam().friends())?;
            if json {
                return print_json(&friends);
            }
            for friend in &friends {
                let online = if friend.status == PresenceStatus::Online { "+" } else { " " };
                match &friend.game {
                    Some(game) => println!("{}{:<24}  playing {}", online, friend.name, game),
                    None => println!("{}{}", online, friend.name),
                }
            }
            println!("{} friends", friends.len());
        }

        Command::Activity { json } => {
            let handler = MetadataHandler::new(config)?;
            let activities = runtime()?.block_on(handler.steam().friend_activities())?;
            if json {
                return print_json(&activities);
            }
            for activity in &activities {
                let what = match (activity.kind, &activity.achievement) {
                    (ActivityKind::Playing, _) => format!("is playing {}", activity.game),
                    (ActivityKind::FirstPlay, _) => format!("started {}", activity.game),
                    (ActivityKind::Achievement, Some(name)) => format!("unlocked {} in {}", name, activity.game),
                    (ActivityKind::Achievement, None) => format!("unlocked an achievement in {}", activity.game),
                };
                println!("{}  {} {}", activity.timestamp.format("%Y-%m-%d %H:%M"), activity.friend_name, what);
            }
        }

        Command::Feed => {
            let library = open_library(config)?;
            let handler = MetadataHandler::new(config)?;
            let feed = runtime()?.block_on(handler.steam().community_feed(library.entries()));
            print_json(&feed)?;
        }

        Command::Profile => {
            let handler = MetadataHandler::new(config)?;
            match runtime()?.block_on(handler.steam().user_info())? {
                Some(user) => print_json(&user)?,
                None => println!("Steam has no profile for the configured SteamID64"),
            }
        }

        Command::Config { save } => {
            print!("{}", toml::to_string_pretty(config)?);
            if save {
                config.save(config_path)?;
                info!("Configuration written");
            }
        }
    }

    Ok(())
}
