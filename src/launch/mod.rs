//! Launch-target resolution.
//!
//! Everything in here except [`launcher`] is pure: a catalog entry goes in,
//! a canonical [`LaunchCommand`] / [`LaunchPlan`] comes out.

pub mod launcher;
pub mod resolve;
pub mod steam_id;
pub mod strategy;
pub mod tokenizer;

pub use launcher::{LaunchPlan, ProcessLauncher, SystemLauncher};
pub use resolve::{
    is_uri_launch_path, normalize_exec_path, normalize_working_dir, resolve_launch_command,
    resolve_launch_command_with, LaunchCommand,
};
pub use steam_id::{extract_app_id, steam_run_uri};
pub use strategy::{LaunchStrategy, Platform};
pub use tokenizer::tokenize;
