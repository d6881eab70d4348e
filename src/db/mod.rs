//! Database module
//!
//! SQLite storage for saved recipes.

pub mod connection;
pub mod migrations;

use std::path::{Path, PathBuf};

pub use connection::{Database, DbError, DbResult};

/// Environment variable that overrides the database location
pub const DATABASE_PATH_ENV: &str = "BREWLAB_DATABASE_PATH";

/// Database path from the environment, else `<project>/data/brewlab.db`
pub fn database_path() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf));
    resolve_database_path(std::env::var(DATABASE_PATH_ENV).ok(), exe_dir)
}

fn resolve_database_path(configured: Option<String>, exe_dir: Option<PathBuf>) -> PathBuf {
    if let Some(path) = configured.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(path);
    }

    let mut root = exe_dir.unwrap_or_else(|| PathBuf::from("."));
    // Binaries run from target/{debug,release}; data lives at the project root
    if root.ends_with("release") || root.ends_with("debug") {
        if let Some(project) = root.parent().and_then(Path::parent) {
            root = project.to_path_buf();
        }
    }
    root.join("data").join("brewlab.db")
}
