//! Brewing calculation module
//!
//! Statistics, scaling, water volumes and source-recipe normalization.

pub mod calculator;
pub mod error;
pub mod normalize;
pub mod scaler;
pub mod types;
pub mod units;
pub mod water;

pub use calculator::{
    abv, attenuation, calories, correct_hydrometer_reading, ibu_tinseth, original_gravity,
    plato_to_sg, priming_sugar, priming_sugar_for_temperature, recipe_statistics, sg_to_plato,
    srm_morey, strike_water, StrikeWater, SugarType,
};
pub use error::{CalcError, CalcResult, Degenerate, Estimate};
pub use normalize::{normalize_recipe, normalize_recipes};
pub use scaler::{
    compute_scale_factor, scale_grain_bill, scale_hop_schedule, scale_other_ingredient,
    scale_recipe, ScaledRecipe, ScalingContext,
};
pub use types::{
    FinalizedRecipe, GrainAddition, HopAddition, OtherIngredient, RecipeDraft, RecipeStatistics,
};
pub use units::{OtherUnit, UnitClass};
pub use water::{estimate_volumes, WaterVolumes};
