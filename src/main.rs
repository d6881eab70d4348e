//! Brewlab
//!
//! An MCP server for homebrew recipe design and brewing calculations.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use brewlab::build_info;
use brewlab::db::{self, migrations, Database};
use brewlab::mcp::BrewlabService;
use brewlab::models::Recipe;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the MCP transport, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("brewlab=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();

    let db_path = db::database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!(path = %db_path.display(), "Opening recipe database");

    let database = Database::new(&db_path)?;
    let (version, recipe_count) = database.with_conn(|conn| {
        migrations::run_migrations(conn)?;
        Ok((migrations::get_schema_version(conn)?, Recipe::count(conn)?))
    })?;
    tracing::info!(schema = version, recipes = recipe_count, "Recipe collection loaded");

    eprintln!("Serving MCP on stdio...");
    let server = BrewlabService::new(db_path, database)
        .serve((stdin(), stdout()))
        .await?;
    server.waiting().await?;

    Ok(())
}
