//! MCP server module
//!
//! Exposes the brewing tools over the Model Context Protocol.

mod server;

pub use server::BrewlabService;
