//! Brewing statistics calculator
//!
//! Pure functions over canonical quantities. Intermediate values are never rounded;
//! only the published result is.

use serde::{Deserialize, Serialize};

use super::error::{
    require_batch_size, require_finite, require_non_negative, require_positive, CalcError,
    CalcResult, Degenerate, Estimate,
};
use super::types::{GrainAddition, HopAddition, RecipeStatistics};
use super::units::{
    dissolved_co2_volumes, round_to, sg_from_points, temperature_correction, GAL_PER_LITER,
    LB_PER_KG, PPG_TO_METRIC,
};

/// Default CO2 volumes for priming
pub const DEFAULT_CO2_VOLUMES: f64 = 2.5;
/// Default serving size for calorie estimates, in US fluid ounces
pub const DEFAULT_SERVING_OUNCES: f64 = 12.0;
/// Default grain temperature before mashing, °C
pub const DEFAULT_GRAIN_TEMP_C: f64 = 20.0;
/// Default strike water ratio, liters per kilogram of grain
pub const DEFAULT_STRIKE_RATIO: f64 = 3.0;
/// Default hydrometer calibration temperature, °C
pub const DEFAULT_CALIBRATION_TEMP_C: f64 = 20.0;

/// IBU normalizing constant: alpha in percent, hops in grams, volume in liters (mg/L)
const IBU_METRIC_FACTOR: f64 = 10.0;
/// Calorie formula denominator collapses at this gravity
const CALORIE_POLE_OG: f64 = 1.775;

/// Priming sugar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SugarType {
    /// Dextrose
    #[default]
    Corn,
    /// Sucrose
    Table,
    /// Dry malt extract
    Dme,
}

impl SugarType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "corn" | "dextrose" | "corn sugar" => Some(SugarType::Corn),
            "table" | "sucrose" | "table sugar" => Some(SugarType::Table),
            "dme" | "dry malt extract" => Some(SugarType::Dme),
            _ => None,
        }
    }

    /// Grams per liter per CO2 volume for the simple model
    fn simple_factor(&self) -> f64 {
        match self {
            SugarType::Corn => 1.32,
            SugarType::Table => 1.19,
            SugarType::Dme => 1.58,
        }
    }

    /// Grams per liter per CO2 volume for the temperature-aware model
    fn residual_factor(&self) -> Option<f64> {
        match self {
            SugarType::Corn => Some(4.39),
            SugarType::Table => Some(4.0),
            SugarType::Dme => None,
        }
    }
}

/// Strike water temperature and volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrikeWater {
    pub strike_temp_c: f64,
    pub water_volume_l: f64,
}

fn require_gravity(field: &str, sg: f64) -> CalcResult<f64> {
    require_finite(field, sg)?;
    if sg < 1.0 {
        return Err(CalcError::invalid(field, format!("must be at least 1.000 (got {})", sg)));
    }
    Ok(sg)
}

/// Unrounded original gravity, for chaining into other statistics
fn exact_original_gravity(
    grains: &[GrainAddition],
    batch_size_liters: f64,
    efficiency_percent: f64,
) -> CalcResult<f64> {
    let batch = require_batch_size(batch_size_liters)?;
    let efficiency = require_positive("efficiency_percent", efficiency_percent)? / 100.0;

    let mut total_points = 0.0;
    for grain in grains {
        grain.validate()?;
        total_points += grain.weight_kg * grain.ppg * PPG_TO_METRIC * efficiency;
    }

    Ok(sg_from_points(total_points / batch))
}

/// Original gravity from the grain bill
pub fn original_gravity(
    grains: &[GrainAddition],
    batch_size_liters: f64,
    efficiency_percent: f64,
) -> CalcResult<f64> {
    let og = exact_original_gravity(grains, batch_size_liters, efficiency_percent)?;
    Ok(round_to(og, 3))
}

/// IBU contribution of a single hop addition (unrounded)
fn hop_ibu(hop: &HopAddition, og: f64, batch: f64) -> f64 {
    let bigness_factor = 1.65 * 0.000125f64.powf(og - 1.0);
    let boil_time_factor = (1.0 - (-0.04 * hop.boil_time_minutes).exp()) / 4.15;
    let utilization = bigness_factor * boil_time_factor;
    hop.alpha_acid_percent * hop.weight_grams * utilization * IBU_METRIC_FACTOR / batch
}

/// Bitterness using the Tinseth utilization model
pub fn ibu_tinseth(hops: &[HopAddition], og: f64, batch_size_liters: f64) -> CalcResult<f64> {
    let og = require_gravity("og", og)?;
    let batch = require_batch_size(batch_size_liters)?;

    let mut total = 0.0;
    for hop in hops {
        hop.validate()?;
        total += hop_ibu(hop, og, batch);
    }
    Ok(round_to(total, 1))
}

/// Beer color (SRM) using the Morey equation
///
/// MCU is computed in the imperial units the equation was fitted on.
pub fn srm_morey(grains: &[GrainAddition], batch_size_liters: f64) -> CalcResult<Estimate> {
    let batch = require_batch_size(batch_size_liters)?;

    let mut color_pounds = 0.0;
    for grain in grains {
        grain.validate()?;
        color_pounds += grain.weight_kg * LB_PER_KG * grain.color_lovibond;
    }
    let mcu = color_pounds / (batch * GAL_PER_LITER);

    if mcu == 0.0 {
        return Ok(Estimate::flagged(0.0, Degenerate::ZeroColor));
    }
    let srm = 1.4922 * mcu.powf(0.6859);
    Ok(Estimate::ok(round_to(srm, 1)))
}

/// Alcohol by volume; negative when fg > og, which is flagged
pub fn abv(og: f64, fg: f64) -> CalcResult<Estimate> {
    let og = require_finite("og", og)?;
    let fg = require_finite("fg", fg)?;
    let value = round_to((og - fg) * 131.25, 2);
    if fg > og {
        Ok(Estimate::flagged(value, Degenerate::NegativeAbv))
    } else {
        Ok(Estimate::ok(value))
    }
}

/// Apparent attenuation in percent
pub fn attenuation(og: f64, fg: f64) -> CalcResult<f64> {
    let og = require_finite("og", og)?;
    let fg = require_finite("fg", fg)?;
    let available = og - 1.0;
    if available == 0.0 {
        return Err(CalcError::DivideByZero("og is 1.000"));
    }
    Ok(round_to((og - fg) / available * 100.0, 1))
}

/// Calories per serving, truncated to a whole number
pub fn calories(og: f64, fg: f64, serving_ounces: f64) -> CalcResult<i64> {
    let og = require_finite("og", og)?;
    let fg = require_finite("fg", fg)?;
    let serving = require_non_negative("serving_ounces", serving_ounces)?;

    let denominator = CALORIE_POLE_OG - og;
    if denominator == 0.0 {
        return Err(CalcError::DivideByZero("og is 1.775"));
    }

    let alcohol_calories = 1881.22 * fg * (og - fg) / denominator;
    let carb_calories = 3550.0 * fg * (0.1808 * og + 0.8192 * fg - 1.0004);
    let total = (alcohol_calories + carb_calories) * (serving / 12.0);
    Ok(total.trunc() as i64)
}

/// Priming sugar in grams, simple proportional model
pub fn priming_sugar(volume_liters: f64, co2_volumes: f64, sugar: SugarType) -> CalcResult<f64> {
    let volume = require_non_negative("volume_liters", volume_liters)?;
    let co2 = require_non_negative("co2_volumes", co2_volumes)?;
    Ok(round_to(volume * co2 * sugar.simple_factor(), 1))
}

/// Priming sugar in grams, accounting for CO2 already dissolved at the beer temperature
pub fn priming_sugar_for_temperature(
    volume_liters: f64,
    co2_volumes: f64,
    beer_temp_c: f64,
    sugar: SugarType,
) -> CalcResult<Estimate> {
    let volume = require_non_negative("volume_liters", volume_liters)?;
    let desired = require_non_negative("co2_volumes", co2_volumes)?;
    let temp = require_finite("beer_temp_c", beer_temp_c)?;
    let factor = sugar.residual_factor().ok_or_else(|| {
        CalcError::invalid("sugar", "temperature-aware priming supports corn or table sugar")
    })?;

    let needed = desired - dissolved_co2_volumes(temp);
    if needed <= 0.0 {
        return Ok(Estimate::flagged(0.0, Degenerate::AlreadyCarbonated));
    }
    Ok(Estimate::ok(round_to(volume * needed * factor, 1)))
}

/// Strike water temperature and volume for a single infusion mash
pub fn strike_water(
    grain_weight_kg: f64,
    target_mash_temp_c: f64,
    grain_temp_c: f64,
    water_ratio_l_per_kg: f64,
) -> CalcResult<StrikeWater> {
    let grain = require_non_negative("grain_weight_kg", grain_weight_kg)?;
    let target = require_finite("target_mash_temp_c", target_mash_temp_c)?;
    let grain_temp = require_finite("grain_temp_c", grain_temp_c)?;
    let ratio = require_positive("water_ratio_l_per_kg", water_ratio_l_per_kg)?;

    let strike_temp = target + 0.2 * (target - grain_temp);
    Ok(StrikeWater {
        strike_temp_c: round_to(strike_temp, 1),
        water_volume_l: round_to(grain * ratio, 1),
    })
}

/// Hydrometer reading corrected to the calibration temperature
pub fn correct_hydrometer_reading(
    measured_gravity: f64,
    measured_temp_c: f64,
    calibration_temp_c: f64,
) -> CalcResult<f64> {
    let measured = require_finite("measured_gravity", measured_gravity)?;
    let temp = require_finite("measured_temp_c", measured_temp_c)?;
    let calibration = require_finite("calibration_temp_c", calibration_temp_c)?;
    Ok(round_to(measured + temperature_correction(temp, calibration), 3))
}

/// Specific gravity to degrees Plato
pub fn sg_to_plato(sg: f64) -> CalcResult<f64> {
    let sg = require_finite("sg", sg)?;
    let plato = -616.868 + 1111.14 * sg - 630.272 * sg.powi(2) + 135.997 * sg.powi(3);
    Ok(round_to(plato, 2))
}

/// Degrees Plato to specific gravity
pub fn plato_to_sg(plato: f64) -> CalcResult<f64> {
    let plato = require_finite("plato", plato)?;
    let denominator = 258.6 - (plato / 258.2) * 227.1;
    if denominator == 0.0 {
        return Err(CalcError::DivideByZero("plato conversion denominator"));
    }
    Ok(round_to(1.0 + plato / denominator, 3))
}

/// Full statistics for a set of quantities at a batch size
pub fn recipe_statistics(
    grains: &[GrainAddition],
    hops: &[HopAddition],
    batch_size_liters: f64,
    efficiency_percent: f64,
    final_gravity: f64,
) -> CalcResult<RecipeStatistics> {
    // Every published field is rounded once, from the unrounded gravity
    let og = exact_original_gravity(grains, batch_size_liters, efficiency_percent)?;
    let fg = require_gravity("final_gravity", final_gravity)?;
    let ibu = ibu_tinseth(hops, og, batch_size_liters)?;
    let srm = srm_morey(grains, batch_size_liters)?;
    let abv = abv(og, fg)?;

    let mut warnings = Vec::new();
    warnings.extend(abv.degenerate);
    warnings.extend(srm.degenerate);

    let attenuation_percent = match attenuation(og, fg) {
        Ok(value) => Some(value),
        Err(CalcError::DivideByZero(_)) => None,
        Err(e) => return Err(e),
    };
    let calories = match calories(og, fg, DEFAULT_SERVING_OUNCES) {
        Ok(value) => Some(value),
        Err(CalcError::DivideByZero(_)) => None,
        Err(e) => return Err(e),
    };

    Ok(RecipeStatistics {
        og: round_to(og, 3),
        fg,
        abv: abv.value,
        ibu,
        srm: srm.value,
        attenuation_percent,
        calories,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_malt(weight_kg: f64) -> GrainAddition {
        GrainAddition::new("2-Row Pale Malt", weight_kg, 37.0, 2.0)
    }

    #[test]
    fn test_og_reference_value() {
        // 5 x 37 x 8.3454 x 0.70 = 1080.73 points over 19 L
        let og = original_gravity(&[base_malt(5.0)], 19.0, 70.0).unwrap();
        assert_eq!(og, 1.057);
    }

    #[test]
    fn test_og_default_efficiency() {
        let og = original_gravity(&[base_malt(5.0)], 19.0, 75.0).unwrap();
        assert_eq!(og, 1.061);
    }

    #[test]
    fn test_og_zero_batch() {
        let err = original_gravity(&[base_malt(5.0)], 0.0, 75.0).unwrap_err();
        assert!(matches!(err, CalcError::DivideByZero(_)));
    }

    #[test]
    fn test_og_rejects_bad_grain() {
        let grain = GrainAddition::new("Mystery", 5.0, f64::NAN, 2.0);
        assert!(matches!(
            original_gravity(&[grain], 19.0, 75.0),
            Err(CalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_og_empty_bill_is_water() {
        assert_eq!(original_gravity(&[], 19.0, 75.0).unwrap(), 1.0);
    }

    #[test]
    fn test_ibu_single_addition() {
        // bigness 1.0528, boil factor 0.2191, utilization 0.2307
        let hops = [HopAddition::new("Cascade", 28.0, 60.0, 5.5)];
        let ibu = ibu_tinseth(&hops, 1.050, 19.0).unwrap();
        assert!((ibu - 18.7).abs() < 1e-9, "got {}", ibu);
    }

    #[test]
    fn test_ibu_monotonic_in_boil_time() {
        let mut last = -1.0;
        for minutes in [0.0, 5.0, 15.0, 30.0, 60.0, 90.0, 120.0] {
            let hops = [HopAddition::new("Magnum", 30.0, minutes, 12.0)];
            let ibu = ibu_tinseth(&hops, 1.055, 20.0).unwrap();
            assert!(ibu > last, "{} min gave {} after {}", minutes, ibu, last);
            last = ibu;
        }
    }

    #[test]
    fn test_ibu_approaches_ceiling() {
        let og = 1.055;
        let hop = HopAddition::new("Magnum", 30.0, 120.0, 12.0);
        let ceiling = 12.0 * 30.0 * 1.65 * 0.000125f64.powf(og - 1.0) / 4.15 * 10.0 / 20.0;
        let at_120 = hop_ibu(&hop, og, 20.0);
        assert!(at_120 < ceiling);
        assert!(ceiling - at_120 < 0.01 * ceiling);
    }

    #[test]
    fn test_ibu_zero_minutes_adds_nothing() {
        let hops = [HopAddition::new("Citra", 50.0, 0.0, 12.0)];
        assert_eq!(ibu_tinseth(&hops, 1.050, 19.0).unwrap(), 0.0);
    }

    #[test]
    fn test_ibu_rejects_low_og() {
        let hops = [HopAddition::new("Cascade", 28.0, 60.0, 5.5)];
        assert!(matches!(
            ibu_tinseth(&hops, 0.998, 19.0),
            Err(CalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_srm_pale() {
        let srm = srm_morey(&[base_malt(5.0)], 19.0).unwrap();
        assert!(!srm.is_degenerate());
        assert!((srm.value - 4.1).abs() < 1e-9, "got {}", srm.value);
    }

    #[test]
    fn test_srm_zero_color_is_zero_not_nan() {
        let grains = [GrainAddition::new("Rice Hulls", 0.3, 1.0, 0.0)];
        let srm = srm_morey(&grains, 19.0).unwrap();
        assert_eq!(srm.value, 0.0);
        assert_eq!(srm.degenerate, Some(Degenerate::ZeroColor));
    }

    #[test]
    fn test_srm_darker_grain_is_darker() {
        let pale = srm_morey(&[base_malt(5.0)], 19.0).unwrap().value;
        let stout = srm_morey(
            &[base_malt(5.0), GrainAddition::new("Roasted Barley", 0.5, 28.0, 500.0)],
            19.0,
        )
        .unwrap()
        .value;
        assert!(stout > pale * 5.0);
    }

    #[test]
    fn test_abv_reference_value() {
        let result = abv(1.050, 1.010).unwrap();
        assert_eq!(result.value, 5.25);
        assert!(!result.is_degenerate());
    }

    #[test]
    fn test_abv_negative_is_flagged() {
        let result = abv(1.010, 1.020).unwrap();
        assert!(result.value < 0.0);
        assert_eq!(result.degenerate, Some(Degenerate::NegativeAbv));
    }

    #[test]
    fn test_attenuation() {
        assert_eq!(attenuation(1.050, 1.010).unwrap(), 80.0);
        assert!(matches!(attenuation(1.0, 1.0), Err(CalcError::DivideByZero(_))));
    }

    #[test]
    fn test_calories() {
        assert_eq!(calories(1.050, 1.010, 12.0).unwrap(), 165);
        // Half a serving is roughly half the calories
        assert_eq!(calories(1.050, 1.010, 6.0).unwrap(), 82);
        assert!(matches!(calories(1.775, 1.010, 12.0), Err(CalcError::DivideByZero(_))));
    }

    #[test]
    fn test_priming_sugar_simple() {
        assert_eq!(priming_sugar(19.0, 2.5, SugarType::Corn).unwrap(), 62.7);
        assert_eq!(priming_sugar(20.0, 2.5, SugarType::Table).unwrap(), 59.5);
        assert_eq!(priming_sugar(20.0, 2.5, SugarType::Dme).unwrap(), 79.0);
    }

    #[test]
    fn test_priming_sugar_for_temperature() {
        // 2.5 - 0.8536 = 1.6464 volumes needed at 20 °C
        let result = priming_sugar_for_temperature(19.0, 2.5, 20.0, SugarType::Corn).unwrap();
        assert!((result.value - 137.3).abs() < 1e-9, "got {}", result.value);
        assert!(!result.is_degenerate());
    }

    #[test]
    fn test_priming_sugar_for_temperature_already_carbonated() {
        let result = priming_sugar_for_temperature(19.0, 0.5, 4.0, SugarType::Table).unwrap();
        assert_eq!(result.value, 0.0);
        assert_eq!(result.degenerate, Some(Degenerate::AlreadyCarbonated));
    }

    #[test]
    fn test_priming_sugar_for_temperature_rejects_dme() {
        assert!(priming_sugar_for_temperature(19.0, 2.5, 20.0, SugarType::Dme).is_err());
    }

    #[test]
    fn test_strike_water() {
        let result = strike_water(4.5, 67.0, 20.0, 3.0).unwrap();
        assert_eq!(result.strike_temp_c, 76.4);
        assert_eq!(result.water_volume_l, 13.5);
    }

    #[test]
    fn test_hydrometer_correction() {
        assert_eq!(correct_hydrometer_reading(1.050, 30.0, 20.0).unwrap(), 1.053);
        assert_eq!(correct_hydrometer_reading(1.050, 20.0, 20.0).unwrap(), 1.050);
    }

    #[test]
    fn test_plato_conversions() {
        assert_eq!(sg_to_plato(1.050).unwrap(), 12.39);
        assert_eq!(plato_to_sg(12.39).unwrap(), 1.050);
    }

    #[test]
    fn test_sg_plato_round_trip() {
        for sg in [1.030, 1.040, 1.050, 1.065, 1.080] {
            let back = plato_to_sg(sg_to_plato(sg).unwrap()).unwrap();
            assert!((back - sg).abs() <= 0.001 + 1e-9, "{} -> {}", sg, back);
        }
    }

    #[test]
    fn test_recipe_statistics() {
        let stats = recipe_statistics(
            &[base_malt(5.0)],
            &[HopAddition::new("Cascade", 28.0, 60.0, 5.5)],
            19.0,
            70.0,
            1.010,
        )
        .unwrap();
        assert_eq!(stats.og, 1.057);
        assert_eq!(stats.abv, 6.15);
        assert_eq!(stats.ibu, 17.6);
        assert_eq!(stats.attenuation_percent, Some(82.4));
        assert!(stats.calories.is_some());
        assert!(stats.warnings.is_empty());
    }

    #[test]
    fn test_recipe_statistics_water_only() {
        let stats = recipe_statistics(&[], &[], 20.0, 75.0, 1.000).unwrap();
        assert_eq!(stats.og, 1.0);
        assert_eq!(stats.attenuation_percent, None);
        assert!(stats.warnings.contains(&Degenerate::ZeroColor));
    }

    #[test]
    fn test_recipe_statistics_chain_uses_unrounded_og() {
        // 1.00188 publishes as 1.002 but must not divide as one
        let grains = [GrainAddition::new("Rice Hulls", 0.3, 1.0, 0.0)];
        let stats = recipe_statistics(&grains, &[], 1.0, 75.0, 1.000).unwrap();
        assert_eq!(stats.og, 1.002);
        assert_eq!(stats.attenuation_percent, Some(100.0));
        assert_eq!(stats.abv, 0.25);
    }
}
