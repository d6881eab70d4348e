//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied schema migration v1");
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- RECIPES
        -- Ordered collection; position is insertion order
        -- ============================================
        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            style TEXT,
            brewer TEXT,
            batch_size_liters REAL NOT NULL CHECK(batch_size_liters > 0),
            efficiency_percent REAL NOT NULL DEFAULT 75.0,
            final_gravity REAL NOT NULL DEFAULT 1.010,
            water_to_grist_ratio REAL NOT NULL DEFAULT 2.5,

            yeast TEXT,
            fermentation_temp_c REAL,
            fermentation_days REAL,
            mash_temp_c REAL,
            mash_minutes REAL,
            boil_minutes REAL,

            -- Cached statistics - recalculated when quantities change
            cached_og REAL NOT NULL DEFAULT 1.0,
            cached_fg REAL NOT NULL DEFAULT 1.0,
            cached_abv REAL NOT NULL DEFAULT 0,
            cached_ibu REAL NOT NULL DEFAULT 0,
            cached_srm REAL NOT NULL DEFAULT 0,
            cached_attenuation REAL,             -- NULL when og is 1.000
            cached_calories INTEGER,             -- per 12 oz serving

            -- Cached water volumes (liters)
            mash_volume REAL NOT NULL DEFAULT 0,
            sparge_volume REAL NOT NULL DEFAULT 0,
            pre_boil_volume REAL NOT NULL DEFAULT 0,
            grain_absorption REAL NOT NULL DEFAULT 0,
            boil_off_volume REAL NOT NULL DEFAULT 0,
            expected_loss REAL NOT NULL DEFAULT 0,

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipes_name ON recipes(name);
        CREATE INDEX idx_recipes_style ON recipes(style);

        -- ============================================
        -- GRAIN BILL
        -- ============================================
        CREATE TABLE grain_additions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            weight_kg REAL NOT NULL,
            ppg REAL NOT NULL,
            color_lovibond REAL NOT NULL DEFAULT 0
        );

        CREATE INDEX idx_grain_additions_recipe ON grain_additions(recipe_id);

        -- ============================================
        -- HOP SCHEDULE
        -- ============================================
        CREATE TABLE hop_additions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            variety TEXT NOT NULL,
            weight_grams REAL NOT NULL,
            boil_time_minutes REAL NOT NULL CHECK(boil_time_minutes BETWEEN 0 AND 120),
            alpha_acid_percent REAL NOT NULL
        );

        CREATE INDEX idx_hop_additions_recipe ON hop_additions(recipe_id);

        -- ============================================
        -- OTHER INGREDIENTS
        -- Finings, nutrients, salts, spices
        -- ============================================
        CREATE TABLE other_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            amount REAL NOT NULL,
            unit TEXT NOT NULL CHECK(unit IN ('g', 'kg', 'ml', 'L', 'tsp', 'tbsp', 'packet')),
            scale_eligible INTEGER NOT NULL DEFAULT 0  -- boolean
        );

        CREATE INDEX idx_other_ingredients_recipe ON other_ingredients(recipe_id);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_migrates() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);

        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let applied: i32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, 1);
    }

    #[test]
    fn test_unit_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO recipes (name, batch_size_liters) VALUES ('Test', 20)",
            [],
        )
        .unwrap();
        let result = conn.execute(
            "INSERT INTO other_ingredients (recipe_id, position, name, amount, unit)
             VALUES (1, 0, 'Salt', 1, 'pinch')",
            [],
        );
        assert!(result.is_err());
    }
}
