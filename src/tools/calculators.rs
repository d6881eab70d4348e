//! Calculator MCP Tools
//!
//! Stateless wrappers around the brewing calculators. Each tool returns a small
//! response struct; degenerate results carry a human-readable warning.

use serde::Serialize;
use serde_json::Value;

use crate::brewing::{
    self, CalcError, Estimate, GrainAddition, HopAddition, OtherIngredient, RecipeDraft,
    StrikeWater, SugarType, WaterVolumes,
};

fn message(e: CalcError) -> String {
    e.to_string()
}

/// A single computed value with an optional warning
#[derive(Debug, Serialize)]
pub struct ValueResponse {
    pub value: f64,
    pub unit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

impl ValueResponse {
    fn plain(value: f64, unit: &'static str) -> Self {
        Self {
            value,
            unit,
            warning: None,
        }
    }

    fn from_estimate(estimate: Estimate, unit: &'static str) -> Self {
        Self {
            value: estimate.value,
            unit,
            warning: estimate.degenerate.map(|d| d.message()),
        }
    }
}

/// Response for calculate_og
#[derive(Debug, Serialize)]
pub struct GravityResponse {
    pub og: f64,
    pub gravity_points: f64,
    pub plato: f64,
}

/// Response for calculate_calories
#[derive(Debug, Serialize)]
pub struct CaloriesResponse {
    pub calories: i64,
    pub serving_ounces: f64,
}

/// Response for calculate_priming_sugar and its temperature-aware variant
#[derive(Debug, Serialize)]
pub struct PrimingResponse {
    pub grams: f64,
    pub sugar: SugarType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dissolved_co2_volumes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

/// Response for estimate_water_volumes
#[derive(Debug, Serialize)]
pub struct WaterResponse {
    #[serde(flatten)]
    pub volumes: WaterVolumes,
    pub total_water: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

/// Response for scale_ingredients
#[derive(Debug, Serialize)]
pub struct ScaleIngredientsResponse {
    pub scale_factor: f64,
    pub grains: Vec<GrainAddition>,
    pub hops: Vec<HopAddition>,
    pub other_ingredients: Vec<OtherIngredient>,
}

/// Response for normalize_recipe
#[derive(Debug, Serialize)]
pub struct NormalizeResponse {
    pub recipes: Vec<RecipeDraft>,
    pub count: usize,
}

fn parse_sugar(sugar: Option<&str>) -> Result<SugarType, String> {
    match sugar {
        None => Ok(SugarType::default()),
        Some(s) => SugarType::from_str(s)
            .ok_or_else(|| format!("Unknown sugar type '{}' (expected corn, table or dme)", s)),
    }
}

// ============================================================================
// Statistics
// ============================================================================

pub fn calculate_og(
    grains: &[GrainAddition],
    batch_size_liters: f64,
    efficiency_percent: Option<f64>,
) -> Result<GravityResponse, String> {
    let efficiency = efficiency_percent.unwrap_or(brewing::types::DEFAULT_EFFICIENCY_PERCENT);
    let og = brewing::original_gravity(grains, batch_size_liters, efficiency).map_err(message)?;
    Ok(GravityResponse {
        og,
        gravity_points: brewing::units::round_to(brewing::units::gravity_points(og), 1),
        plato: brewing::sg_to_plato(og).map_err(message)?,
    })
}

pub fn calculate_ibu(
    hops: &[HopAddition],
    og: f64,
    batch_size_liters: f64,
) -> Result<ValueResponse, String> {
    let ibu = brewing::ibu_tinseth(hops, og, batch_size_liters).map_err(message)?;
    Ok(ValueResponse::plain(ibu, "IBU"))
}

pub fn calculate_srm(
    grains: &[GrainAddition],
    batch_size_liters: f64,
) -> Result<ValueResponse, String> {
    let srm = brewing::srm_morey(grains, batch_size_liters).map_err(message)?;
    Ok(ValueResponse::from_estimate(srm, "SRM"))
}

pub fn calculate_abv(og: f64, fg: f64) -> Result<ValueResponse, String> {
    let abv = brewing::abv(og, fg).map_err(message)?;
    Ok(ValueResponse::from_estimate(abv, "%"))
}

pub fn calculate_attenuation(og: f64, fg: f64) -> Result<ValueResponse, String> {
    let attenuation = brewing::attenuation(og, fg).map_err(message)?;
    Ok(ValueResponse::plain(attenuation, "%"))
}

pub fn calculate_calories(
    og: f64,
    fg: f64,
    serving_ounces: Option<f64>,
) -> Result<CaloriesResponse, String> {
    let serving = serving_ounces.unwrap_or(brewing::calculator::DEFAULT_SERVING_OUNCES);
    let calories = brewing::calories(og, fg, serving).map_err(message)?;
    Ok(CaloriesResponse {
        calories,
        serving_ounces: serving,
    })
}

// ============================================================================
// Brew Day
// ============================================================================

pub fn calculate_priming_sugar(
    volume_liters: f64,
    co2_volumes: Option<f64>,
    sugar: Option<&str>,
) -> Result<PrimingResponse, String> {
    let sugar = parse_sugar(sugar)?;
    let co2 = co2_volumes.unwrap_or(brewing::calculator::DEFAULT_CO2_VOLUMES);
    let grams = brewing::priming_sugar(volume_liters, co2, sugar).map_err(message)?;
    Ok(PrimingResponse {
        grams,
        sugar,
        dissolved_co2_volumes: None,
        warning: None,
    })
}

pub fn calculate_priming_sugar_for_temperature(
    volume_liters: f64,
    co2_volumes: Option<f64>,
    beer_temp_c: f64,
    sugar: Option<&str>,
) -> Result<PrimingResponse, String> {
    let sugar = parse_sugar(sugar)?;
    let co2 = co2_volumes.unwrap_or(brewing::calculator::DEFAULT_CO2_VOLUMES);
    let estimate = brewing::priming_sugar_for_temperature(volume_liters, co2, beer_temp_c, sugar)
        .map_err(message)?;
    let dissolved = brewing::units::dissolved_co2_volumes(beer_temp_c);
    Ok(PrimingResponse {
        grams: estimate.value,
        sugar,
        dissolved_co2_volumes: Some(brewing::units::round_to(dissolved, 2)),
        warning: estimate.degenerate.map(|d| d.message()),
    })
}

pub fn calculate_strike_water(
    grain_weight_kg: f64,
    target_mash_temp_c: f64,
    grain_temp_c: Option<f64>,
    water_ratio_l_per_kg: Option<f64>,
) -> Result<StrikeWater, String> {
    brewing::strike_water(
        grain_weight_kg,
        target_mash_temp_c,
        grain_temp_c.unwrap_or(brewing::calculator::DEFAULT_GRAIN_TEMP_C),
        water_ratio_l_per_kg.unwrap_or(brewing::calculator::DEFAULT_STRIKE_RATIO),
    )
    .map_err(message)
}

pub fn correct_hydrometer_reading(
    measured_gravity: f64,
    measured_temp_c: f64,
    calibration_temp_c: Option<f64>,
) -> Result<ValueResponse, String> {
    let corrected = brewing::correct_hydrometer_reading(
        measured_gravity,
        measured_temp_c,
        calibration_temp_c.unwrap_or(brewing::calculator::DEFAULT_CALIBRATION_TEMP_C),
    )
    .map_err(message)?;
    Ok(ValueResponse::plain(corrected, "SG"))
}

pub fn convert_sg_to_plato(sg: f64) -> Result<ValueResponse, String> {
    let plato = brewing::sg_to_plato(sg).map_err(message)?;
    Ok(ValueResponse::plain(plato, "°P"))
}

pub fn convert_plato_to_sg(plato: f64) -> Result<ValueResponse, String> {
    let sg = brewing::plato_to_sg(plato).map_err(message)?;
    Ok(ValueResponse::plain(sg, "SG"))
}

pub fn estimate_water_volumes(
    total_grain_weight_kg: f64,
    final_volume_liters: f64,
    water_to_grist_ratio: Option<f64>,
) -> WaterResponse {
    let volumes = brewing::estimate_volumes(
        total_grain_weight_kg,
        final_volume_liters,
        water_to_grist_ratio.unwrap_or(brewing::water::DEFAULT_WATER_TO_GRIST_RATIO),
    );
    WaterResponse {
        total_water: volumes.total_water(),
        warning: volumes
            .insufficient_input
            .then_some("grain weight and final volume must both be greater than 0"),
        volumes,
    }
}

// ============================================================================
// Scaling and Normalization
// ============================================================================

pub fn scale_ingredients(
    grains: &[GrainAddition],
    hops: &[HopAddition],
    other_ingredients: &[OtherIngredient],
    original_batch_size_liters: f64,
    target_batch_size_liters: f64,
) -> Result<ScaleIngredientsResponse, String> {
    if !(target_batch_size_liters.is_finite() && target_batch_size_liters > 0.0) {
        return Err("target_batch_size_liters must be greater than 0".to_string());
    }
    let factor =
        brewing::compute_scale_factor(original_batch_size_liters, target_batch_size_liters);
    Ok(ScaleIngredientsResponse {
        scale_factor: factor,
        grains: brewing::scale_grain_bill(grains, factor),
        hops: brewing::scale_hop_schedule(hops, factor),
        other_ingredients: other_ingredients
            .iter()
            .map(|o| brewing::scale_other_ingredient(o, factor))
            .collect(),
    })
}

pub fn normalize_recipe(source: &Value) -> Result<NormalizeResponse, String> {
    let recipes = brewing::normalize_recipes(source).map_err(message)?;
    Ok(NormalizeResponse {
        count: recipes.len(),
        recipes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_og_response() {
        let grains = [GrainAddition::new("2-Row Pale Malt", 5.0, 37.0, 2.0)];
        let response = calculate_og(&grains, 19.0, Some(70.0)).unwrap();
        assert_eq!(response.og, 1.057);
        assert_eq!(response.gravity_points, 57.0);
    }

    #[test]
    fn test_abv_warning_surfaces() {
        let response = calculate_abv(1.010, 1.020).unwrap();
        assert!(response.warning.is_some());
        assert!(calculate_abv(1.050, 1.010).unwrap().warning.is_none());
    }

    #[test]
    fn test_unknown_sugar() {
        assert!(calculate_priming_sugar(19.0, None, Some("honey")).is_err());
        let response = calculate_priming_sugar(19.0, None, None).unwrap();
        assert_eq!(response.sugar, SugarType::Corn);
        assert_eq!(response.grams, 62.7);
    }

    #[test]
    fn test_strike_water_defaults() {
        let result = calculate_strike_water(4.5, 67.0, None, None).unwrap();
        assert_eq!(result.strike_temp_c, 76.4);
        assert_eq!(result.water_volume_l, 13.5);
    }

    #[test]
    fn test_water_warning() {
        let response = estimate_water_volumes(0.0, 20.0, None);
        assert!(response.volumes.insufficient_input);
        assert!(response.warning.is_some());
    }

    #[test]
    fn test_scale_ingredients() {
        let grains = [GrainAddition::new("2-Row Pale Malt", 5.0, 37.0, 2.0)];
        let response = scale_ingredients(&grains, &[], &[], 19.0, 38.0).unwrap();
        assert_eq!(response.scale_factor, 2.0);
        assert_eq!(response.grains[0].weight_kg, 10.0);
        assert!(scale_ingredients(&grains, &[], &[], 19.0, 0.0).is_err());
    }

    #[test]
    fn test_calculator_errors_name_field() {
        let err = calculate_attenuation(1.0, 1.0).unwrap_err();
        assert!(err.starts_with("Division by zero"), "{}", err);
    }
}
