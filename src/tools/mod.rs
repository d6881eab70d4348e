//! Brewlab Tools module
//!
//! MCP tool implementations for recipe design and brewing calculations.

pub mod calculators;
pub mod export;
pub mod recipes;
pub mod status;
