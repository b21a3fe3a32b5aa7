pub mod catalog;
pub mod config;
pub mod error;
pub mod launch;
pub mod metadata;
pub mod scan;
