//! Data models
//!
//! Rust structs representing database entities.

mod addition;
mod recipe;

pub use recipe::Recipe;
