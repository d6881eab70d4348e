//! Water volume estimation
//!
//! Mash, sparge and pre-boil volumes from the grain weight and target batch volume,
//! assuming 1 L absorbed per kg of grain and 20% boil-off.

use serde::{Deserialize, Serialize};

use super::units::round_to;

/// Default mash thickness, liters per kilogram of grain
pub const DEFAULT_WATER_TO_GRIST_RATIO: f64 = 2.5;
/// Liters of water retained per kilogram of grain
pub const GRAIN_ABSORPTION_L_PER_KG: f64 = 1.0;
/// Fraction of the final volume lost to evaporation
pub const BOIL_OFF_FRACTION: f64 = 0.2;

/// Estimated brew-day water volumes, all in liters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WaterVolumes {
    pub mash_volume: f64,
    pub sparge_volume: f64,
    pub pre_boil_volume: f64,
    pub grain_absorption: f64,
    pub boil_off_volume: f64,
    /// Grain absorption plus boil-off
    pub expected_loss: f64,
    /// Set when grain weight or final volume gave nothing to work with
    #[serde(default)]
    pub insufficient_input: bool,
}

impl WaterVolumes {
    /// All-zero volumes carrying the insufficient-input signal
    pub fn insufficient() -> Self {
        Self {
            insufficient_input: true,
            ..Self::default()
        }
    }

    /// Total water to heat for the brew day
    pub fn total_water(&self) -> f64 {
        round_to(self.mash_volume + self.sparge_volume, 1)
    }
}

/// Estimate mash, sparge and boil volumes
pub fn estimate_volumes(
    total_grain_weight_kg: f64,
    final_volume_liters: f64,
    water_to_grist_ratio: f64,
) -> WaterVolumes {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !usable(total_grain_weight_kg)
        || !usable(final_volume_liters)
        || !water_to_grist_ratio.is_finite()
        || water_to_grist_ratio < 0.0
    {
        tracing::debug!(
            grain_kg = total_grain_weight_kg,
            final_l = final_volume_liters,
            "Insufficient input for water volume estimate"
        );
        return WaterVolumes::insufficient();
    }

    let mash_volume = total_grain_weight_kg * water_to_grist_ratio;
    let grain_absorption = total_grain_weight_kg * GRAIN_ABSORPTION_L_PER_KG;
    let boil_off_volume = final_volume_liters * BOIL_OFF_FRACTION;
    let pre_boil_volume = final_volume_liters + boil_off_volume;
    let mash_runoff = mash_volume - grain_absorption;
    let sparge_volume = (pre_boil_volume - mash_runoff).max(0.0);

    WaterVolumes {
        mash_volume: round_to(mash_volume, 1),
        sparge_volume: round_to(sparge_volume, 1),
        pre_boil_volume: round_to(pre_boil_volume, 1),
        grain_absorption: round_to(grain_absorption, 1),
        boil_off_volume: round_to(boil_off_volume, 1),
        expected_loss: round_to(grain_absorption + boil_off_volume, 1),
        insufficient_input: false,
    }
}
