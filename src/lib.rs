//! Brewlab Library
//!
//! Homebrew recipe design: brewing statistics, batch scaling and water planning.

pub mod brewing;
pub mod build_info;
pub mod db;
pub mod mcp;
pub mod models;
pub mod tools;
