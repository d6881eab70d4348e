//! Brewlab MCP Server Implementation
//!
//! Implements the MCP server with all Brewlab tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::brewing::{GrainAddition, HopAddition, OtherIngredient, OtherUnit, RecipeDraft};
use crate::db::Database;
use crate::models::Recipe;
use crate::tools::calculators;
use crate::tools::export;
use crate::tools::recipes;
use crate::tools::status::StatusTracker;

/// Brewlab MCP Service
#[derive(Clone)]
pub struct BrewlabService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<BrewlabService>,
}

impl BrewlabService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

/// Serialize a tool response as pretty JSON text content
fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn tool_error(e: String) -> McpError {
    McpError::internal_error(e, None)
}

// ============================================================================
// Ingredient Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GrainParam {
    /// Grain name, e.g. "2-Row Pale Malt"
    pub name: String,
    /// Weight in kilograms
    pub weight_kg: f64,
    /// Extract potential in points per pound per gallon (e.g. 37)
    pub ppg: f64,
    /// Color in degrees Lovibond
    pub color_lovibond: f64,
}

impl From<GrainParam> for GrainAddition {
    fn from(p: GrainParam) -> Self {
        GrainAddition::new(p.name, p.weight_kg, p.ppg, p.color_lovibond)
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct HopParam {
    pub variety: String,
    /// Weight in grams
    pub weight_grams: f64,
    /// Minutes before end of boil (0-120)
    pub boil_time_minutes: f64,
    /// Alpha acid in percent, e.g. 5.5
    pub alpha_acid_percent: f64,
}

impl From<HopParam> for HopAddition {
    fn from(p: HopParam) -> Self {
        HopAddition::new(p.variety, p.weight_grams, p.boil_time_minutes, p.alpha_acid_percent)
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OtherIngredientParam {
    pub name: String,
    pub amount: f64,
    /// One of: g, kg, ml, L, tsp, tbsp, packet
    pub unit: String,
    /// Scale with batch size (only honored for g, kg, ml, L)
    #[serde(default)]
    pub scale_eligible: bool,
}

impl OtherIngredientParam {
    fn into_ingredient(self) -> Result<OtherIngredient, McpError> {
        let unit = OtherUnit::from_str(&self.unit).ok_or_else(|| {
            McpError::invalid_params(
                format!(
                    "Unknown unit '{}' for '{}' (expected g, kg, ml, L, tsp, tbsp or packet)",
                    self.unit, self.name
                ),
                None,
            )
        })?;
        Ok(OtherIngredient {
            name: self.name,
            amount: self.amount,
            unit,
            scale_eligible: self.scale_eligible,
        })
    }
}

fn grains_from(params: Vec<GrainParam>) -> Vec<GrainAddition> {
    params.into_iter().map(GrainAddition::from).collect()
}

fn hops_from(params: Vec<HopParam>) -> Vec<HopAddition> {
    params.into_iter().map(HopAddition::from).collect()
}

fn others_from(params: Vec<OtherIngredientParam>) -> Result<Vec<OtherIngredient>, McpError> {
    params.into_iter().map(OtherIngredientParam::into_ingredient).collect()
}

// ============================================================================
// Calculator Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateOgParams {
    pub grains: Vec<GrainParam>,
    pub batch_size_liters: f64,
    /// Brewhouse efficiency in percent (default 75)
    pub efficiency_percent: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateIbuParams {
    pub hops: Vec<HopParam>,
    /// Original gravity of the wort, e.g. 1.050
    pub og: f64,
    pub batch_size_liters: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateSrmParams {
    pub grains: Vec<GrainParam>,
    pub batch_size_liters: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GravityPairParams {
    /// Original gravity, e.g. 1.050
    pub og: f64,
    /// Final gravity, e.g. 1.010
    pub fg: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CaloriesParams {
    pub og: f64,
    pub fg: f64,
    /// Serving size in US fluid ounces (default 12)
    pub serving_ounces: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PrimingSugarParams {
    pub volume_liters: f64,
    /// Target CO2 volumes (default 2.5)
    pub co2_volumes: Option<f64>,
    /// corn (default), table or dme
    pub sugar: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PrimingSugarForTemperatureParams {
    pub volume_liters: f64,
    /// Target CO2 volumes (default 2.5)
    pub co2_volumes: Option<f64>,
    /// Highest temperature the beer reached after fermentation, °C
    pub beer_temp_c: f64,
    /// corn (default) or table
    pub sugar: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StrikeWaterParams {
    pub grain_weight_kg: f64,
    pub target_mash_temp_c: f64,
    /// Grain temperature, °C (default 20)
    pub grain_temp_c: Option<f64>,
    /// Liters of water per kg of grain (default 3.0)
    pub water_ratio_l_per_kg: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct HydrometerParams {
    pub measured_gravity: f64,
    pub measured_temp_c: f64,
    /// Hydrometer calibration temperature, °C (default 20)
    pub calibration_temp_c: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SgParams {
    pub sg: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PlatoParams {
    pub plato: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WaterVolumesParams {
    pub total_grain_weight_kg: f64,
    pub final_volume_liters: f64,
    /// Mash thickness in L/kg (default 2.5)
    pub water_to_grist_ratio: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ScaleIngredientsParams {
    #[serde(default)]
    pub grains: Vec<GrainParam>,
    #[serde(default)]
    pub hops: Vec<HopParam>,
    #[serde(default)]
    pub other_ingredients: Vec<OtherIngredientParam>,
    pub original_batch_size_liters: f64,
    pub target_batch_size_liters: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SourceRecipeParams {
    /// A recipe object, or an array of them, in any supported source shape
    pub recipe: serde_json::Value,
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    /// Name of the recipe
    pub name: String,
    pub style: Option<String>,
    pub brewer: Option<String>,
    /// Final batch volume in liters
    pub batch_size_liters: f64,
    /// Brewhouse efficiency in percent (default 75)
    pub efficiency_percent: Option<f64>,
    pub grains: Vec<GrainParam>,
    #[serde(default)]
    pub hops: Vec<HopParam>,
    #[serde(default)]
    pub other_ingredients: Vec<OtherIngredientParam>,
    pub yeast: Option<String>,
    pub fermentation_temp_c: Option<f64>,
    pub fermentation_days: Option<f64>,
    pub mash_temp_c: Option<f64>,
    pub mash_minutes: Option<f64>,
    pub boil_minutes: Option<f64>,
    /// Expected final gravity (default 1.010)
    pub final_gravity: Option<f64>,
    /// Mash thickness in L/kg (default 2.5)
    pub water_to_grist_ratio: Option<f64>,
    pub notes: Option<String>,
}

impl CreateRecipeParams {
    fn into_draft(self) -> Result<RecipeDraft, McpError> {
        let mut draft = RecipeDraft::new(self.name, self.batch_size_liters);
        draft.style = self.style;
        draft.brewer = self.brewer;
        if let Some(efficiency) = self.efficiency_percent {
            draft.efficiency_percent = efficiency;
        }
        draft.grains = grains_from(self.grains);
        draft.hops = hops_from(self.hops);
        draft.other_ingredients = others_from(self.other_ingredients)?;
        draft.yeast = self.yeast;
        draft.fermentation_temp_c = self.fermentation_temp_c;
        draft.fermentation_days = self.fermentation_days;
        draft.mash_temp_c = self.mash_temp_c;
        draft.mash_minutes = self.mash_minutes;
        draft.boil_minutes = self.boil_minutes;
        if let Some(fg) = self.final_gravity {
            draft.final_gravity = fg;
        }
        if let Some(ratio) = self.water_to_grist_ratio {
            draft.water_to_grist_ratio = ratio;
        }
        draft.notes = self.notes;
        Ok(draft)
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetRecipeParams {
    /// Recipe ID
    pub id: Option<i64>,
    /// Zero-based position in the collection (used when id is absent)
    pub position: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecipesParams {
    /// Case-insensitive match on name or style
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteRecipeAtParams {
    /// Zero-based position from list_recipes
    pub position: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ScaleRecipeParams {
    /// Recipe ID
    pub id: i64,
    pub target_batch_size_liters: f64,
    /// Save the scaled recipe as a new recipe (default false)
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExportRecipeCsvParams {
    /// Recipe ID
    pub id: i64,
    /// Rescale to this batch size before exporting
    pub target_batch_size_liters: Option<f64>,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl BrewlabService {
    // --- Status ---

    #[tool(description = "Get the current status of the Brewlab service including build info, database status, and process information")]
    async fn brewlab_status(&self) -> Result<CallToolResult, McpError> {
        let recipe_count = self.database.with_conn(|conn| Recipe::count(conn)).ok();
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(recipe_count);
        json_result(&status)
    }

    #[tool(description = "Get step-by-step instructions for designing, importing and scaling recipes. Call this when starting a brewing session or when unsure which units a tool expects.")]
    fn brewing_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::BREWING_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(BREWING_INSTRUCTIONS)]))
    }

    // --- Statistics ---

    #[tool(description = "Calculate original gravity from a grain bill, batch size and brewhouse efficiency")]
    fn calculate_og(&self, Parameters(p): Parameters<CalculateOgParams>) -> Result<CallToolResult, McpError> {
        let grains = grains_from(p.grains);
        let result = calculators::calculate_og(&grains, p.batch_size_liters, p.efficiency_percent).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Calculate bitterness (IBU) of a hop schedule using the Tinseth formula")]
    fn calculate_ibu(&self, Parameters(p): Parameters<CalculateIbuParams>) -> Result<CallToolResult, McpError> {
        let hops = hops_from(p.hops);
        let result = calculators::calculate_ibu(&hops, p.og, p.batch_size_liters).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Calculate beer color (SRM) of a grain bill using the Morey equation")]
    fn calculate_srm(&self, Parameters(p): Parameters<CalculateSrmParams>) -> Result<CallToolResult, McpError> {
        let grains = grains_from(p.grains);
        let result = calculators::calculate_srm(&grains, p.batch_size_liters).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Calculate alcohol by volume from original and final gravity")]
    fn calculate_abv(&self, Parameters(p): Parameters<GravityPairParams>) -> Result<CallToolResult, McpError> {
        let result = calculators::calculate_abv(p.og, p.fg).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Calculate apparent attenuation in percent from original and final gravity")]
    fn calculate_attenuation(&self, Parameters(p): Parameters<GravityPairParams>) -> Result<CallToolResult, McpError> {
        let result = calculators::calculate_attenuation(p.og, p.fg).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Estimate calories per serving from original and final gravity")]
    fn calculate_calories(&self, Parameters(p): Parameters<CaloriesParams>) -> Result<CallToolResult, McpError> {
        let result = calculators::calculate_calories(p.og, p.fg, p.serving_ounces).map_err(tool_error)?;
        json_result(&result)
    }

    // --- Brew Day ---

    #[tool(description = "Calculate priming sugar in grams for bottling (simple proportional model)")]
    fn calculate_priming_sugar(&self, Parameters(p): Parameters<PrimingSugarParams>) -> Result<CallToolResult, McpError> {
        let result = calculators::calculate_priming_sugar(p.volume_liters, p.co2_volumes, p.sugar.as_deref())
            .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Calculate priming sugar in grams, accounting for CO2 already dissolved at the beer temperature (corn or table sugar only)")]
    fn calculate_priming_sugar_for_temperature(&self, Parameters(p): Parameters<PrimingSugarForTemperatureParams>) -> Result<CallToolResult, McpError> {
        let result = calculators::calculate_priming_sugar_for_temperature(
            p.volume_liters, p.co2_volumes, p.beer_temp_c, p.sugar.as_deref(),
        )
        .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Calculate strike water temperature and volume for a single infusion mash")]
    fn calculate_strike_water(&self, Parameters(p): Parameters<StrikeWaterParams>) -> Result<CallToolResult, McpError> {
        let result = calculators::calculate_strike_water(
            p.grain_weight_kg, p.target_mash_temp_c, p.grain_temp_c, p.water_ratio_l_per_kg,
        )
        .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Correct a hydrometer reading taken away from the calibration temperature")]
    fn correct_hydrometer_reading(&self, Parameters(p): Parameters<HydrometerParams>) -> Result<CallToolResult, McpError> {
        let result = calculators::correct_hydrometer_reading(p.measured_gravity, p.measured_temp_c, p.calibration_temp_c)
            .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Convert specific gravity to degrees Plato")]
    fn convert_sg_to_plato(&self, Parameters(p): Parameters<SgParams>) -> Result<CallToolResult, McpError> {
        let result = calculators::convert_sg_to_plato(p.sg).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Convert degrees Plato to specific gravity")]
    fn convert_plato_to_sg(&self, Parameters(p): Parameters<PlatoParams>) -> Result<CallToolResult, McpError> {
        let result = calculators::convert_plato_to_sg(p.plato).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Estimate mash, sparge and pre-boil water volumes from grain weight and final batch volume")]
    fn estimate_water_volumes(&self, Parameters(p): Parameters<WaterVolumesParams>) -> Result<CallToolResult, McpError> {
        let result = calculators::estimate_water_volumes(p.total_grain_weight_kg, p.final_volume_liters, p.water_to_grist_ratio);
        json_result(&result)
    }

    // --- Scaling and Import ---

    #[tool(description = "Scale ad-hoc grain, hop and other-ingredient lists from one batch size to another")]
    fn scale_ingredients(&self, Parameters(p): Parameters<ScaleIngredientsParams>) -> Result<CallToolResult, McpError> {
        let grains = grains_from(p.grains);
        let hops = hops_from(p.hops);
        let others = others_from(p.other_ingredients)?;
        let result = calculators::scale_ingredients(
            &grains, &hops, &others, p.original_batch_size_liters, p.target_batch_size_liters,
        )
        .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Preview how source recipe JSON (saved recipes, datasets, positional rows) maps onto the canonical recipe shape, without saving")]
    fn normalize_recipe(&self, Parameters(p): Parameters<SourceRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = calculators::normalize_recipe(&p.recipe).map_err(tool_error)?;
        json_result(&result)
    }

    // --- Recipes ---

    #[tool(description = "Create and save a recipe. Requires a name and at least one grain; statistics and water volumes are computed automatically.")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let draft = p.into_draft()?;
        let result = recipes::create_recipe(&self.database, draft).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Import one recipe or an array of recipes from source JSON. All-or-nothing: nothing is saved if any record fails.")]
    fn import_recipe(&self, Parameters(p): Parameters<SourceRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::import_recipe(&self.database, &p.recipe).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Get a full recipe by id, or by zero-based position when no id is given")]
    fn get_recipe(&self, Parameters(p): Parameters<GetRecipeParams>) -> Result<CallToolResult, McpError> {
        let (result, lookup) = match (p.id, p.position) {
            (Some(id), _) => (recipes::get_recipe(&self.database, id), format!(r#""id": {}"#, id)),
            (None, Some(position)) => (
                recipes::get_recipe_at(&self.database, position),
                format!(r#""position": {}"#, position),
            ),
            (None, None) => {
                return Err(McpError::invalid_params("Provide either id or position", None));
            }
        };
        match result.map_err(tool_error)? {
            Some(recipe) => json_result(&recipe),
            None => Ok(CallToolResult::success(vec![Content::text(format!(
                r#"{{"error": "Recipe not found", {}}}"#,
                lookup
            ))])),
        }
    }

    #[tool(description = "List saved recipes in collection order with their positions and headline statistics")]
    fn list_recipes(&self, Parameters(p): Parameters<ListRecipesParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::list_recipes(&self.database, p.query.as_deref()).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Delete the recipe at a zero-based position. Later recipes shift down by one; call list_recipes first.")]
    fn delete_recipe_at(&self, Parameters(p): Parameters<DeleteRecipeAtParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::delete_recipe_at(&self.database, p.position).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Rescale a saved recipe to a new batch size and recompute its statistics. Set save=true to store the result as a new recipe.")]
    fn scale_recipe(&self, Parameters(p): Parameters<ScaleRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::scale_recipe(&self.database, p.id, p.target_batch_size_liters, p.save)
            .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Recompute cached statistics and water volumes for every saved recipe, returning the ids that changed")]
    fn recalculate_recipe_stats(&self) -> Result<CallToolResult, McpError> {
        let result = recipes::recalculate_all(&self.database).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Export a saved recipe as CSV text, optionally rescaled to a new batch size first")]
    fn export_recipe_csv(&self, Parameters(p): Parameters<ExportRecipeCsvParams>) -> Result<CallToolResult, McpError> {
        let result = export::export_recipe_csv(&self.database, p.id, p.target_batch_size_liters).map_err(tool_error)?;
        json_result(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for BrewlabService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "brewlab".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Brewlab".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Brewlab - Homebrew recipe design, scaling and brewing statistics. \
                 IMPORTANT: Call brewing_instructions before creating or importing recipes. \
                 Grain weights are kg, hop weights g, volumes L, temperatures °C, alpha acid in percent. \
                 Statistics: calculate_og/ibu/srm/abv/attenuation/calories. \
                 Brew day: calculate_priming_sugar, calculate_priming_sugar_for_temperature, \
                 calculate_strike_water, correct_hydrometer_reading, convert_sg_to_plato, \
                 convert_plato_to_sg, estimate_water_volumes. \
                 Scaling: scale_ingredients (ad-hoc), scale_recipe (saved). \
                 Recipes: create_recipe, import_recipe, normalize_recipe (preview), get_recipe, \
                 list_recipes, delete_recipe_at (by position), export_recipe_csv, recalculate_recipe_stats."
                    .into(),
            ),
        }
    }
}
