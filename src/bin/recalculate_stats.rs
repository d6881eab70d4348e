//! Recompute cached statistics for saved recipes
//! Usage: cargo run --bin recalculate_stats -- [--dry-run] [recipe_id]

use brewlab::db::{self, migrations, Database};
use brewlab::models::Recipe;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let dry_run = args.iter().any(|a| a == "--dry-run");
    let only_id: Option<i64> = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(|s| s.parse())
        .transpose()?;

    let db_path = db::database_path();
    println!("{}", brewlab::build_info::BuildInfo::current());
    println!("Database: {}", db_path.display());

    let database = Database::new(&db_path)?;
    database.with_conn(|conn| migrations::run_migrations(conn))?;

    let mut updated = 0;
    database.with_conn(|conn| {
        let recipes = Recipe::list(conn, None)?;
        println!("Found {} recipes", recipes.len());

        for (position, recipe) in recipes.iter().enumerate() {
            if only_id.is_some_and(|id| id != recipe.id) {
                continue;
            }

            println!("\n[{}] {} (id {})", position, recipe.draft.name, recipe.id);
            let fresh = match recipe.draft.clone().finalize() {
                Ok(f) => f,
                Err(e) => {
                    println!("  Skipped: {}", e);
                    continue;
                }
            };

            let old = &recipe.statistics;
            let new = &fresh.statistics;
            println!("  OG:  {:.3} -> {:.3}", old.og, new.og);
            println!("  IBU: {:.1} -> {:.1}", old.ibu, new.ibu);
            println!("  SRM: {:.1} -> {:.1}", old.srm, new.srm);
            println!("  ABV: {:.2} -> {:.2}", old.abv, new.abv);
            for warning in &new.warnings {
                println!("  Warning: {}", warning.message());
            }

            let unchanged = old.og == new.og
                && old.ibu == new.ibu
                && old.srm == new.srm
                && old.abv == new.abv
                && old.attenuation_percent == new.attenuation_percent
                && old.calories == new.calories
                && recipe.water == fresh.water;
            if unchanged {
                println!("  Unchanged");
                continue;
            }

            if !dry_run {
                Recipe::update_cached_statistics(conn, recipe.id, new, &fresh.water)?;
            }
            updated += 1;
        }
        Ok(())
    })?;

    if dry_run {
        println!("\n{} recipe(s) would change (dry run, nothing written)", updated);
    } else {
        println!("\nUpdated {} recipe(s)", updated);
    }

    Ok(())
}
