//! Recipe scaling
//!
//! Rescales ingredient quantities by a single factor. Statistics for the scaled
//! recipe are recomputed from the scaled quantities, never scaled themselves.

use serde::{Deserialize, Serialize};

use super::calculator::recipe_statistics;
use super::error::{require_positive, CalcResult};
use super::types::{GrainAddition, HopAddition, OtherIngredient, RecipeDraft, RecipeStatistics};
use super::units::round_to;
use super::water::{estimate_volumes, WaterVolumes};

/// Original and target batch sizes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingContext {
    pub original_batch_size_liters: f64,
    pub target_batch_size_liters: f64,
}

impl ScalingContext {
    pub fn new(original_batch_size_liters: f64, target_batch_size_liters: f64) -> Self {
        Self {
            original_batch_size_liters,
            target_batch_size_liters,
        }
    }

    pub fn scale_factor(&self) -> f64 {
        compute_scale_factor(self.original_batch_size_liters, self.target_batch_size_liters)
    }
}

/// Factor = target / original, or 1.0 when there is no usable original size
pub fn compute_scale_factor(original_batch_size_liters: f64, target_batch_size_liters: f64) -> f64 {
    if original_batch_size_liters > 0.0 && target_batch_size_liters.is_finite() {
        target_batch_size_liters / original_batch_size_liters
    } else {
        1.0
    }
}

fn scale_grains_exact(grains: &[GrainAddition], factor: f64) -> Vec<GrainAddition> {
    grains
        .iter()
        .map(|g| GrainAddition {
            weight_kg: g.weight_kg * factor,
            ..g.clone()
        })
        .collect()
}

fn scale_hops_exact(hops: &[HopAddition], factor: f64) -> Vec<HopAddition> {
    hops.iter()
        .map(|h| HopAddition {
            weight_grams: h.weight_grams * factor,
            ..h.clone()
        })
        .collect()
}

/// Scale grain weights; ppg, color and name are untouched
pub fn scale_grain_bill(grains: &[GrainAddition], factor: f64) -> Vec<GrainAddition> {
    let mut scaled = scale_grains_exact(grains, factor);
    for grain in &mut scaled {
        grain.weight_kg = round_to(grain.weight_kg, 2);
    }
    scaled
}

/// Scale hop weights; variety, boil time and alpha acid are untouched
pub fn scale_hop_schedule(hops: &[HopAddition], factor: f64) -> Vec<HopAddition> {
    let mut scaled = scale_hops_exact(hops, factor);
    for hop in &mut scaled {
        hop.weight_grams = round_to(hop.weight_grams, 1);
    }
    scaled
}

/// Scale an ingredient only when its unit and opt-in flag both allow it
pub fn scale_other_ingredient(ingredient: &OtherIngredient, factor: f64) -> OtherIngredient {
    let amount = if ingredient.scales_with_batch() {
        ingredient.amount * factor
    } else {
        ingredient.amount
    };
    OtherIngredient {
        amount: round_to(amount, 3),
        ..ingredient.clone()
    }
}

/// A rescaled recipe with statistics recomputed at the target size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledRecipe {
    pub context: ScalingContext,
    pub scale_factor: f64,
    pub draft: RecipeDraft,
    pub statistics: RecipeStatistics,
    pub water: WaterVolumes,
}

/// Rescale a recipe to a new batch size and recompute everything derived from it
///
/// Statistics and water come from the exact scaled quantities. The returned draft
/// carries display-rounded weights, so a tiny addition may show as 0.
pub fn scale_recipe(draft: &RecipeDraft, target_batch_size_liters: f64) -> CalcResult<ScaledRecipe> {
    draft.validate()?;
    let target = require_positive("target_batch_size_liters", target_batch_size_liters)?;
    let context = ScalingContext::new(draft.batch_size_liters, target);
    let factor = context.scale_factor();

    let exact_grains = scale_grains_exact(&draft.grains, factor);
    let statistics = recipe_statistics(
        &exact_grains,
        &scale_hops_exact(&draft.hops, factor),
        target,
        draft.efficiency_percent,
        draft.final_gravity,
    )?;
    let water = estimate_volumes(
        exact_grains.iter().map(|g| g.weight_kg).sum(),
        target,
        draft.water_to_grist_ratio,
    );

    let scaled = RecipeDraft {
        batch_size_liters: target,
        grains: scale_grain_bill(&draft.grains, factor),
        hops: scale_hop_schedule(&draft.hops, factor),
        other_ingredients: draft
            .other_ingredients
            .iter()
            .map(|i| scale_other_ingredient(i, factor))
            .collect(),
        ..draft.clone()
    };

    tracing::debug!(
        recipe = %draft.name,
        factor,
        og = statistics.og,
        "Scaled recipe"
    );

    Ok(ScaledRecipe {
        context,
        scale_factor: factor,
        draft: scaled,
        statistics,
        water,
    })
}
