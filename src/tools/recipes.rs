//! Recipe MCP Tools
//!
//! Tools for saving, browsing, importing and rescaling recipes.

use serde::Serialize;
use serde_json::Value;

use crate::brewing::{self, RecipeDraft, RecipeStatistics, ScaledRecipe, WaterVolumes};
use crate::db::{Database, DbResult};
use crate::models::Recipe;

/// Response for create_recipe and import_recipe
#[derive(Debug, Serialize)]
pub struct CreateRecipeResponse {
    pub id: i64,
    pub position: i64,
    pub name: String,
    pub statistics: RecipeStatistics,
    pub water: WaterVolumes,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<&'static str>,
    pub created_at: String,
}

/// Response for import_recipe
#[derive(Debug, Serialize)]
pub struct ImportRecipesResponse {
    pub imported: Vec<CreateRecipeResponse>,
    pub count: usize,
}

/// Recipe summary for listing
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub position: i64,
    pub id: i64,
    pub name: String,
    pub style: Option<String>,
    pub batch_size_liters: f64,
    pub og: f64,
    pub abv: f64,
    pub ibu: f64,
    pub srm: f64,
    pub grain_count: usize,
    pub hop_count: usize,
    pub created_at: String,
}

impl RecipeSummary {
    fn new(position: i64, recipe: Recipe) -> Self {
        Self {
            position,
            id: recipe.id,
            grain_count: recipe.draft.grains.len(),
            hop_count: recipe.draft.hops.len(),
            name: recipe.draft.name,
            style: recipe.draft.style,
            batch_size_liters: recipe.draft.batch_size_liters,
            og: recipe.statistics.og,
            abv: recipe.statistics.abv,
            ibu: recipe.statistics.ibu,
            srm: recipe.statistics.srm,
            created_at: recipe.created_at,
        }
    }
}

/// Response for list_recipes
#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub total: i64,
}

/// Response for delete_recipe_at
#[derive(Debug, Serialize)]
pub struct DeleteRecipeResponse {
    pub success: bool,
    pub deleted_id: i64,
    pub deleted_name: String,
    pub remaining: i64,
}

/// Response for scale_recipe
#[derive(Debug, Serialize)]
pub struct ScaleRecipeResponse {
    #[serde(flatten)]
    pub scaled: ScaledRecipe,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_as: Option<CreateRecipeResponse>,
}

/// Response for recalculate_recipe_stats
#[derive(Debug, Serialize)]
pub struct RecalculateResponse {
    pub updated_ids: Vec<i64>,
    pub count: usize,
}

// ============================================================================
// Recipe Tools
// ============================================================================

fn warning_messages(statistics: &RecipeStatistics) -> Vec<&'static str> {
    statistics.warnings.iter().map(|w| w.message()).collect()
}

fn created_response(recipe: Recipe, position: i64, warnings: Vec<&'static str>) -> CreateRecipeResponse {
    CreateRecipeResponse {
        id: recipe.id,
        position,
        name: recipe.draft.name,
        statistics: recipe.statistics,
        water: recipe.water,
        warnings,
        created_at: recipe.created_at,
    }
}

/// Validate, compute statistics and append a recipe to the collection
pub fn create_recipe(db: &Database, draft: RecipeDraft) -> Result<CreateRecipeResponse, String> {
    let finalized = draft.finalize().map_err(|e| e.to_string())?;
    let warnings = warning_messages(&finalized.statistics);

    let (recipe, position) = db
        .with_conn_mut(|conn| {
            let recipe = Recipe::create(conn, &finalized)?;
            let position = Recipe::position_of(conn, recipe.id)?;
            Ok((recipe, position))
        })
        .map_err(|e| format!("Failed to create recipe: {}", e))?;

    Ok(created_response(recipe, position, warnings))
}

/// Normalize one or more source recipes and save them in a single transaction
pub fn import_recipe(db: &Database, source: &Value) -> Result<ImportRecipesResponse, String> {
    let drafts = brewing::normalize_recipes(source)
        .map_err(|e| format!("Failed to normalize recipe: {}", e))?;

    let finalized = drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| {
            let name = draft.name.clone();
            draft
                .finalize()
                .map_err(|e| format!("Recipe {} ('{}'): {}", i, name, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let saved = db
        .with_conn_mut(|conn| {
            let recipes = Recipe::create_all(conn, &finalized)?;
            recipes
                .into_iter()
                .map(|recipe| {
                    let position = Recipe::position_of(conn, recipe.id)?;
                    Ok((recipe, position))
                })
                .collect::<DbResult<Vec<_>>>()
        })
        .map_err(|e| format!("Failed to import recipes: {}", e))?;

    let imported: Vec<CreateRecipeResponse> = saved
        .into_iter()
        .zip(&finalized)
        .map(|((recipe, position), data)| {
            created_response(recipe, position, warning_messages(&data.statistics))
        })
        .collect();

    tracing::info!(count = imported.len(), "Imported recipes");

    Ok(ImportRecipesResponse {
        count: imported.len(),
        imported,
    })
}

/// Get a recipe by ID
pub fn get_recipe(db: &Database, id: i64) -> Result<Option<Recipe>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Recipe::get_by_id(&conn, id).map_err(|e| format!("Failed to get recipe: {}", e))
}

/// Get the recipe at a zero-based position in the collection
pub fn get_recipe_at(db: &Database, position: usize) -> Result<Option<Recipe>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Recipe::get_at(&conn, position).map_err(|e| format!("Failed to get recipe: {}", e))
}

/// List recipes in collection order, optionally matching name or style
pub fn list_recipes(db: &Database, query: Option<&str>) -> Result<ListRecipesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipes = Recipe::list(&conn, query)
        .map_err(|e| format!("Failed to list recipes: {}", e))?;

    let total = Recipe::count(&conn)
        .map_err(|e| format!("Failed to count recipes: {}", e))?;

    let mut summaries = Vec::with_capacity(recipes.len());
    for (index, recipe) in recipes.into_iter().enumerate() {
        // Filtered results still report their position in the full collection
        let position = match query {
            Some(_) => Recipe::position_of(&conn, recipe.id)
                .map_err(|e| format!("Failed to locate recipe: {}", e))?,
            None => index as i64,
        };
        summaries.push(RecipeSummary::new(position, recipe));
    }

    Ok(ListRecipesResponse {
        recipes: summaries,
        total,
    })
}

/// Delete the recipe at a zero-based position
pub fn delete_recipe_at(db: &Database, position: usize) -> Result<DeleteRecipeResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Recipe::delete_at(&conn, position)
        .map_err(|e| format!("Failed to delete recipe: {}", e))?
        .ok_or_else(|| format!("No recipe at position {}", position))?;

    let remaining = Recipe::count(&conn)
        .map_err(|e| format!("Failed to count recipes: {}", e))?;

    Ok(DeleteRecipeResponse {
        success: true,
        deleted_id: deleted.id,
        deleted_name: deleted.draft.name,
        remaining,
    })
}

/// Rescale a saved recipe, optionally saving the result as a new recipe
pub fn scale_recipe(
    db: &Database,
    id: i64,
    target_batch_size_liters: f64,
    save: bool,
) -> Result<ScaleRecipeResponse, String> {
    let recipe = get_recipe(db, id)?.ok_or_else(|| format!("Recipe not found with id: {}", id))?;

    let scaled = brewing::scale_recipe(&recipe.draft, target_batch_size_liters)
        .map_err(|e| format!("Failed to scale recipe: {}", e))?;

    let saved_as = if save {
        let mut draft = scaled.draft.clone();
        draft.name = format!("{} ({} L)", recipe.draft.name, target_batch_size_liters);
        Some(create_recipe(db, draft).map_err(|e| format!("Failed to save scaled recipe: {}", e))?)
    } else {
        None
    };

    Ok(ScaleRecipeResponse { scaled, saved_as })
}

/// Recompute cached statistics for every saved recipe, reporting the ones that changed
pub fn recalculate_all(db: &Database) -> Result<RecalculateResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipes = Recipe::list(&conn, None)
        .map_err(|e| format!("Failed to list recipes: {}", e))?;

    let mut changed = Vec::new();
    for recipe in recipes {
        let finalized = match recipe.draft.clone().finalize() {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(id = recipe.id, error = %e, "Skipping recipe that no longer validates");
                continue;
            }
        };
        // Warnings are not stored, so they take no part in the comparison
        let fresh = RecipeStatistics {
            warnings: Vec::new(),
            ..finalized.statistics.clone()
        };
        if fresh == recipe.statistics && finalized.water == recipe.water {
            continue;
        }
        Recipe::update_cached_statistics(&conn, recipe.id, &finalized.statistics, &finalized.water)
            .map_err(|e| format!("Failed to update recipe {}: {}", recipe.id, e))?;
        changed.push(recipe.id);
    }

    if !changed.is_empty() {
        tracing::info!(count = changed.len(), "Recalculated stale recipe statistics");
    }

    Ok(RecalculateResponse {
        count: changed.len(),
        updated_ids: changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brewing::{GrainAddition, HopAddition};
    use crate::db::migrations;
    use serde_json::json;

    fn setup() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| migrations::run_migrations(conn)).unwrap();
        db
    }

    fn pale_ale(name: &str) -> RecipeDraft {
        let mut draft = RecipeDraft::new(name, 19.0);
        draft.efficiency_percent = 70.0;
        draft.grains.push(GrainAddition::new("2-Row Pale Malt", 5.0, 37.0, 2.0));
        draft.hops.push(HopAddition::new("Cascade", 28.0, 60.0, 5.5));
        draft
    }

    #[test]
    fn test_create_and_list() {
        let db = setup();
        let created = create_recipe(&db, pale_ale("Pale Ale")).unwrap();
        assert_eq!(created.position, 0);
        assert_eq!(created.statistics.og, 1.057);

        create_recipe(&db, pale_ale("Session Ale")).unwrap();
        let list = list_recipes(&db, None).unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.recipes[1].name, "Session Ale");
        assert_eq!(list.recipes[1].position, 1);
    }

    #[test]
    fn test_create_rejects_missing_grain() {
        let db = setup();
        let err = create_recipe(&db, RecipeDraft::new("Water", 19.0)).unwrap_err();
        assert!(err.contains("grains"), "{}", err);
    }

    #[test]
    fn test_filtered_list_keeps_positions() {
        let db = setup();
        create_recipe(&db, pale_ale("Pale Ale")).unwrap();
        create_recipe(&db, pale_ale("Dry Stout")).unwrap();

        let list = list_recipes(&db, Some("stout")).unwrap();
        assert_eq!(list.recipes.len(), 1);
        assert_eq!(list.recipes[0].position, 1);
    }

    #[test]
    fn test_delete_recipe_at() {
        let db = setup();
        create_recipe(&db, pale_ale("First")).unwrap();
        create_recipe(&db, pale_ale("Second")).unwrap();

        let deleted = delete_recipe_at(&db, 0).unwrap();
        assert_eq!(deleted.deleted_name, "First");
        assert_eq!(deleted.remaining, 1);
        assert!(delete_recipe_at(&db, 4).is_err());
        assert_eq!(get_recipe_at(&db, 0).unwrap().unwrap().draft.name, "Second");
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let db = setup();
        let source = json!([
            {"name": "Good", "grain_bill": [[5, "Pale", 37, 2]]},
            {"name": "No Grain"}
        ]);
        assert!(import_recipe(&db, &source).is_err());
        assert_eq!(list_recipes(&db, None).unwrap().total, 0);
    }

    #[test]
    fn test_import_array_saves_each_with_position() {
        let db = setup();
        create_recipe(&db, pale_ale("Existing")).unwrap();
        let source = json!([
            {"name": "Mild", "grain_bill": [[3, "Mild Malt", 37, 4]]},
            {"name": "Bitter", "grain_bill": [[4, "Pale", 37, 3]]}
        ]);
        let response = import_recipe(&db, &source).unwrap();
        assert_eq!(response.count, 2);
        assert_eq!(response.imported[0].position, 1);
        assert_eq!(response.imported[1].name, "Bitter");
        assert_eq!(response.imported[1].position, 2);
        assert_eq!(list_recipes(&db, None).unwrap().total, 3);
    }

    #[test]
    fn test_import_single_recipe() {
        let db = setup();
        let source = json!({
            "name": "Imported",
            "batch_size": 19,
            "efficiency": 70,
            "malts": [{"name": "2-Row", "amount": 5, "potential": 37, "color": 2}]
        });
        let response = import_recipe(&db, &source).unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(response.imported[0].statistics.og, 1.057);
    }

    #[test]
    fn test_scale_and_save() {
        let db = setup();
        let created = create_recipe(&db, pale_ale("Pale Ale")).unwrap();

        let response = scale_recipe(&db, created.id, 38.0, true).unwrap();
        assert_eq!(response.scaled.scale_factor, 2.0);
        assert_eq!(response.scaled.statistics.og, 1.057);
        let saved = response.saved_as.unwrap();
        assert_eq!(saved.name, "Pale Ale (38 L)");
        assert_eq!(saved.position, 1);
    }

    #[test]
    fn test_scale_down_to_tasting_batch() {
        let db = setup();
        let mut draft = pale_ale("Porter");
        draft.grains.push(GrainAddition::new("Black Patent", 0.05, 25.0, 500.0));
        let created = create_recipe(&db, draft).unwrap();

        let response = scale_recipe(&db, created.id, 1.0, false).unwrap();
        assert_eq!(response.scaled.draft.grains[1].weight_kg, 0.0);
        assert_eq!(response.scaled.statistics.og, created.statistics.og);

        // A zero-weight addition is not a valid saved recipe
        let err = scale_recipe(&db, created.id, 1.0, true).unwrap_err();
        assert!(err.contains("Failed to save scaled recipe"), "{}", err);
    }

    #[test]
    fn test_scale_unknown_recipe() {
        let db = setup();
        assert!(scale_recipe(&db, 99, 20.0, false).is_err());
    }

    #[test]
    fn test_recalculate_all_fixes_stale_cache() {
        let db = setup();
        let created = create_recipe(&db, pale_ale("Pale Ale")).unwrap();

        let mut stale = created.statistics.clone();
        stale.og = 1.100;
        db.with_conn(|conn| Recipe::update_cached_statistics(conn, created.id, &stale, &created.water))
            .unwrap();

        assert_eq!(recalculate_all(&db).unwrap().updated_ids, vec![created.id]);
        assert_eq!(recalculate_all(&db).unwrap().count, 0);
    }
}
