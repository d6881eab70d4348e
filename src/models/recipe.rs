//! Recipe model
//!
//! A saved beer recipe with cached statistics and water volumes. The collection is
//! ordered by insertion; positions are zero-based indexes into that order.

use rusqlite::{params, Connection, Row};
use serde::Serialize;

use crate::brewing::{FinalizedRecipe, RecipeDraft, RecipeStatistics, WaterVolumes};
use crate::db::{DbError, DbResult};

use super::addition;

/// A saved recipe
#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: i64,
    #[serde(flatten)]
    pub draft: RecipeDraft,
    pub statistics: RecipeStatistics,
    pub water: WaterVolumes,
    pub created_at: String,
    pub updated_at: String,
}

impl Recipe {
    /// Create a Recipe from a database row; additions are loaded separately
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let mut draft = RecipeDraft::new(
            row.get::<_, String>("name")?,
            row.get("batch_size_liters")?,
        );
        draft.style = row.get("style")?;
        draft.brewer = row.get("brewer")?;
        draft.efficiency_percent = row.get("efficiency_percent")?;
        draft.final_gravity = row.get("final_gravity")?;
        draft.water_to_grist_ratio = row.get("water_to_grist_ratio")?;
        draft.yeast = row.get("yeast")?;
        draft.fermentation_temp_c = row.get("fermentation_temp_c")?;
        draft.fermentation_days = row.get("fermentation_days")?;
        draft.mash_temp_c = row.get("mash_temp_c")?;
        draft.mash_minutes = row.get("mash_minutes")?;
        draft.boil_minutes = row.get("boil_minutes")?;
        draft.notes = row.get("notes")?;

        Ok(Self {
            id: row.get("id")?,
            draft,
            statistics: RecipeStatistics {
                og: row.get("cached_og")?,
                fg: row.get("cached_fg")?,
                abv: row.get("cached_abv")?,
                ibu: row.get("cached_ibu")?,
                srm: row.get("cached_srm")?,
                attenuation_percent: row.get("cached_attenuation")?,
                calories: row.get("cached_calories")?,
                warnings: Vec::new(),
            },
            water: WaterVolumes {
                mash_volume: row.get("mash_volume")?,
                sparge_volume: row.get("sparge_volume")?,
                pre_boil_volume: row.get("pre_boil_volume")?,
                grain_absorption: row.get("grain_absorption")?,
                boil_off_volume: row.get("boil_off_volume")?,
                expected_loss: row.get("expected_loss")?,
                insufficient_input: false,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn load_additions(mut self, conn: &Connection) -> DbResult<Self> {
        self.draft.grains = addition::load_grains(conn, self.id)?;
        self.draft.hops = addition::load_hops(conn, self.id)?;
        self.draft.other_ingredients = addition::load_others(conn, self.id)?;
        self.water.insufficient_input = self.draft.grains.is_empty();
        Ok(self)
    }

    /// Insert the recipe row and its additions; the caller owns the transaction
    fn insert(conn: &Connection, data: &FinalizedRecipe) -> DbResult<i64> {
        let draft = &data.draft;
        let stats = &data.statistics;
        let water = &data.water;

        conn.execute(
            r#"
            INSERT INTO recipes (
                name, style, brewer, batch_size_liters, efficiency_percent,
                final_gravity, water_to_grist_ratio, yeast, fermentation_temp_c,
                fermentation_days, mash_temp_c, mash_minutes, boil_minutes,
                cached_og, cached_fg, cached_abv, cached_ibu, cached_srm,
                cached_attenuation, cached_calories,
                mash_volume, sparge_volume, pre_boil_volume, grain_absorption,
                boil_off_volume, expected_loss, notes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                    ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27)
            "#,
            params![
                draft.name.trim(),
                draft.style,
                draft.brewer,
                draft.batch_size_liters,
                draft.efficiency_percent,
                draft.final_gravity,
                draft.water_to_grist_ratio,
                draft.yeast,
                draft.fermentation_temp_c,
                draft.fermentation_days,
                draft.mash_temp_c,
                draft.mash_minutes,
                draft.boil_minutes,
                stats.og,
                stats.fg,
                stats.abv,
                stats.ibu,
                stats.srm,
                stats.attenuation_percent,
                stats.calories,
                water.mash_volume,
                water.sparge_volume,
                water.pre_boil_volume,
                water.grain_absorption,
                water.boil_off_volume,
                water.expected_loss,
                draft.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        addition::save_grains(conn, id, &draft.grains)?;
        addition::save_hops(conn, id, &draft.hops)?;
        addition::save_others(conn, id, &draft.other_ingredients)?;

        tracing::info!(id, name = %draft.name, "Saved recipe");
        Ok(id)
    }

    /// Append a finalized recipe to the collection
    pub fn create(conn: &mut Connection, data: &FinalizedRecipe) -> DbResult<Self> {
        let tx = conn.transaction()?;
        let id = Self::insert(&tx, data)?;
        tx.commit()?;

        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Append several recipes in one transaction; either all are saved or none
    pub fn create_all(conn: &mut Connection, data: &[FinalizedRecipe]) -> DbResult<Vec<Self>> {
        let tx = conn.transaction()?;
        let ids = data
            .iter()
            .map(|recipe| Self::insert(&tx, recipe))
            .collect::<DbResult<Vec<_>>>()?;
        tx.commit()?;

        ids.into_iter()
            .map(|id| {
                Self::get_by_id(conn, id)?
                    .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
            })
            .collect()
    }

    /// Get a recipe by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(recipe) => Ok(Some(recipe.load_additions(conn)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// ID of the recipe at a zero-based position in the collection
    fn id_at(conn: &Connection, position: usize) -> DbResult<Option<i64>> {
        let result = conn.query_row(
            "SELECT id FROM recipes ORDER BY id LIMIT 1 OFFSET ?1",
            [position as i64],
            |row| row.get(0),
        );
        match result {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the recipe at a zero-based position
    pub fn get_at(conn: &Connection, position: usize) -> DbResult<Option<Self>> {
        match Self::id_at(conn, position)? {
            Some(id) => Self::get_by_id(conn, id),
            None => Ok(None),
        }
    }

    /// List recipes in collection order, optionally filtered by name or style
    pub fn list(conn: &Connection, query: Option<&str>) -> DbResult<Vec<Self>> {
        let recipes = match query {
            Some(q) => {
                let mut stmt = conn.prepare(
                    r"SELECT * FROM recipes
                      WHERE name LIKE ?1 ESCAPE '\' OR style LIKE ?1 ESCAPE '\'
                      ORDER BY id",
                )?;
                let escaped = q
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                let pattern = format!("%{}%", escaped);
                let rows = stmt
                    .query_map([pattern], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare("SELECT * FROM recipes ORDER BY id")?;
                let rows = stmt
                    .query_map([], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        recipes
            .into_iter()
            .map(|recipe| recipe.load_additions(conn))
            .collect()
    }

    /// Zero-based position of a recipe in the full collection
    pub fn position_of(conn: &Connection, id: i64) -> DbResult<i64> {
        let position: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipes WHERE id < ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(position)
    }

    /// Update cached statistics and water volumes for a recipe
    pub fn update_cached_statistics(
        conn: &Connection,
        id: i64,
        stats: &RecipeStatistics,
        water: &WaterVolumes,
    ) -> DbResult<()> {
        conn.execute(
            r#"
            UPDATE recipes SET
                cached_og = ?1,
                cached_fg = ?2,
                cached_abv = ?3,
                cached_ibu = ?4,
                cached_srm = ?5,
                cached_attenuation = ?6,
                cached_calories = ?7,
                mash_volume = ?8,
                sparge_volume = ?9,
                pre_boil_volume = ?10,
                grain_absorption = ?11,
                boil_off_volume = ?12,
                expected_loss = ?13,
                updated_at = datetime('now')
            WHERE id = ?14
            "#,
            params![
                stats.og,
                stats.fg,
                stats.abv,
                stats.ibu,
                stats.srm,
                stats.attenuation_percent,
                stats.calories,
                water.mash_volume,
                water.sparge_volume,
                water.pre_boil_volume,
                water.grain_absorption,
                water.boil_off_volume,
                water.expected_loss,
                id,
            ],
        )?;
        Ok(())
    }

    /// Count recipes
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete a recipe by ID; additions cascade
    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Delete the recipe at a zero-based position, returning it
    pub fn delete_at(conn: &Connection, position: usize) -> DbResult<Option<Self>> {
        let Some(recipe) = Self::get_at(conn, position)? else {
            return Ok(None);
        };
        Self::delete(conn, recipe.id)?;
        tracing::info!(id = recipe.id, position, name = %recipe.draft.name, "Deleted recipe");
        Ok(Some(recipe))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brewing::{GrainAddition, HopAddition, OtherIngredient, OtherUnit};
    use crate::db::{migrations, Database};

    fn setup() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| migrations::run_migrations(conn)).unwrap();
        db
    }

    fn finalized(name: &str) -> FinalizedRecipe {
        let mut draft = RecipeDraft::new(name, 19.0);
        draft.efficiency_percent = 70.0;
        draft.style = Some("American Pale Ale".to_string());
        draft.yeast = Some("US-05".to_string());
        draft.grains = vec![
            GrainAddition::new("2-Row Pale Malt", 5.0, 37.0, 2.0),
            GrainAddition::new("Crystal 40L", 0.3, 34.0, 40.0),
        ];
        draft.hops = vec![HopAddition::new("Cascade", 28.0, 60.0, 5.5)];
        draft.other_ingredients = vec![OtherIngredient {
            name: "Whirlfloc".to_string(),
            amount: 1.0,
            unit: OtherUnit::Packet,
            scale_eligible: false,
        }];
        draft.finalize().unwrap()
    }

    fn save(db: &Database, name: &str) -> Recipe {
        let data = finalized(name);
        db.with_conn_mut(|conn| Recipe::create(conn, &data)).unwrap()
    }

    #[test]
    fn test_create_round_trips() {
        let db = setup();
        let data = finalized("Pale Ale");
        let saved = db.with_conn_mut(|conn| Recipe::create(conn, &data)).unwrap();

        assert_eq!(saved.draft, data.draft);
        assert_eq!(saved.statistics.og, data.statistics.og);
        assert_eq!(saved.statistics.calories, data.statistics.calories);
        assert_eq!(saved.water, data.water);
        assert_eq!(saved.draft.grains[1].name, "Crystal 40L");
        assert_eq!(saved.draft.other_ingredients[0].unit, OtherUnit::Packet);
    }

    #[test]
    fn test_positions_follow_insertion_order() {
        let db = setup();
        save(&db, "First");
        save(&db, "Second");
        save(&db, "Third");

        db.with_conn(|conn| {
            let names: Vec<String> = Recipe::list(conn, None)?
                .into_iter()
                .map(|r| r.draft.name)
                .collect();
            assert_eq!(names, vec!["First", "Second", "Third"]);

            let second = Recipe::get_at(conn, 1)?.unwrap();
            assert_eq!(second.draft.name, "Second");
            assert_eq!(Recipe::position_of(conn, second.id)?, 1);
            assert!(Recipe::get_at(conn, 3)?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_delete_at_shifts_positions() {
        let db = setup();
        save(&db, "First");
        save(&db, "Second");
        save(&db, "Third");

        db.with_conn(|conn| {
            let deleted = Recipe::delete_at(conn, 1)?.unwrap();
            assert_eq!(deleted.draft.name, "Second");
            assert_eq!(Recipe::count(conn)?, 2);
            assert_eq!(Recipe::get_at(conn, 1)?.unwrap().draft.name, "Third");
            assert!(Recipe::delete_at(conn, 5)?.is_none());

            let orphans: i64 = conn.query_row(
                "SELECT COUNT(*) FROM grain_additions WHERE recipe_id = ?1",
                [deleted.id],
                |row| row.get(0),
            )?;
            assert_eq!(orphans, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_list_filters_by_name_or_style() {
        let db = setup();
        save(&db, "Citra Pale");
        save(&db, "Dry Stout");

        db.with_conn(|conn| {
            assert_eq!(Recipe::list(conn, Some("stout"))?.len(), 1);
            // Both share the style
            assert_eq!(Recipe::list(conn, Some("Pale Ale"))?.len(), 2);
            // Wildcards in the query match literally
            assert!(Recipe::list(conn, Some("%"))?.is_empty());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_create_all_rolls_back_on_failure() {
        let db = setup();
        let good = finalized("Good");
        let mut bad = finalized("Bad");
        // Rejected by the batch size CHECK constraint after "Good" is inserted
        bad.draft.batch_size_liters = -1.0;

        let result = db.with_conn_mut(|conn| Recipe::create_all(conn, &[good, bad]));
        assert!(result.is_err());
        assert_eq!(db.with_conn(|conn| Recipe::count(conn)).unwrap(), 0);
    }

    #[test]
    fn test_create_all_saves_in_order() {
        let db = setup();
        let saved = db
            .with_conn_mut(|conn| Recipe::create_all(conn, &[finalized("A"), finalized("B")]))
            .unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].draft.name, "B");
        assert!(saved[0].id < saved[1].id);
    }

    #[test]
    fn test_update_cached_statistics() {
        let db = setup();
        let saved = save(&db, "Pale Ale");

        let mut stats = saved.statistics.clone();
        stats.ibu = 42.0;
        db.with_conn(|conn| {
            Recipe::update_cached_statistics(conn, saved.id, &stats, &saved.water)?;
            let reloaded = Recipe::get_by_id(conn, saved.id)?.unwrap();
            assert_eq!(reloaded.statistics.ibu, 42.0);
            Ok(())
        })
        .unwrap();
    }
}
