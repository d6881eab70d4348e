//! Unit types and brewing conversion constants
//!
//! Gravity-point arithmetic, imperial/metric factors, the CO2 solubility curve and
//! the unit classes used to decide whether an ingredient scales with batch size.

use serde::{Deserialize, Serialize};

// ============================================================================
// Conversion Constants
// ============================================================================

/// Converts a points-per-pound-per-gallon potential to a per-kilogram-per-liter basis
pub const PPG_TO_METRIC: f64 = 8.3454;
/// Pounds per kilogram
pub const LB_PER_KG: f64 = 2.20462;
/// US gallons per liter
pub const GAL_PER_LITER: f64 = 0.264172;
/// Gravity change per degree Celsius away from the hydrometer calibration temperature
pub const HYDROMETER_CORRECTION_PER_C: f64 = 0.000325;
/// Kilograms per gram
pub const KG_PER_G: f64 = 0.001;
/// Kilograms per pound
pub const KG_PER_LB: f64 = 0.453592;
/// Kilograms per ounce
pub const KG_PER_OZ: f64 = 0.0283495;

// ============================================================================
// Gravity Points
// ============================================================================

/// Gravity points of a specific gravity reading (1.050 -> 50.0)
pub fn gravity_points(sg: f64) -> f64 {
    (sg - 1.0) * 1000.0
}

/// Specific gravity from gravity points (50.0 -> 1.050)
pub fn sg_from_points(points: f64) -> f64 {
    1.0 + points / 1000.0
}

/// CO2 volumes still dissolved in beer at the given temperature (°C)
pub fn dissolved_co2_volumes(temp_c: f64) -> f64 {
    -0.000316 * temp_c * temp_c + 0.0052 * temp_c + 0.876
}

/// Gravity offset for a reading taken away from the calibration temperature
pub fn temperature_correction(measured_temp_c: f64, calibration_temp_c: f64) -> f64 {
    (measured_temp_c - calibration_temp_c) * HYDROMETER_CORRECTION_PER_C
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ============================================================================
// Other-Ingredient Units
// ============================================================================

/// Measurement class of an ingredient unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitClass {
    /// g, kg
    Mass,
    /// ml, L
    Volume,
    /// tsp, tbsp, packet - counted, never scaled
    Count,
}

/// Units accepted for "other" ingredients (finings, nutrients, salts, spices)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OtherUnit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "ml")]
    Milliliter,
    #[serde(rename = "L", alias = "l")]
    Liter,
    #[serde(rename = "tsp")]
    Teaspoon,
    #[serde(rename = "tbsp")]
    Tablespoon,
    #[serde(rename = "packet")]
    Packet,
}

impl OtherUnit {
    /// Parse a unit string, accepting common spellings
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "g" | "gram" | "grams" => Some(OtherUnit::Gram),
            "kg" | "kilogram" | "kilograms" => Some(OtherUnit::Kilogram),
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
                Some(OtherUnit::Milliliter)
            }
            "l" | "liter" | "liters" | "litre" | "litres" => Some(OtherUnit::Liter),
            "tsp" | "teaspoon" | "teaspoons" => Some(OtherUnit::Teaspoon),
            "tbsp" | "tablespoon" | "tablespoons" => Some(OtherUnit::Tablespoon),
            "packet" | "packets" | "pack" | "sachet" => Some(OtherUnit::Packet),
            _ => None,
        }
    }

    /// Canonical unit string, also used as the database value
    pub fn as_str(&self) -> &'static str {
        match self {
            OtherUnit::Gram => "g",
            OtherUnit::Kilogram => "kg",
            OtherUnit::Milliliter => "ml",
            OtherUnit::Liter => "L",
            OtherUnit::Teaspoon => "tsp",
            OtherUnit::Tablespoon => "tbsp",
            OtherUnit::Packet => "packet",
        }
    }

    pub fn class(&self) -> UnitClass {
        match self {
            OtherUnit::Gram | OtherUnit::Kilogram => UnitClass::Mass,
            OtherUnit::Milliliter | OtherUnit::Liter => UnitClass::Volume,
            OtherUnit::Teaspoon | OtherUnit::Tablespoon | OtherUnit::Packet => UnitClass::Count,
        }
    }

    /// Whether the unit class allows proportional scaling at all
    pub fn is_scalable(&self) -> bool {
        matches!(self.class(), UnitClass::Mass | UnitClass::Volume)
    }
}

/// Conversion factor to kilograms for a grain weight unit
pub fn kg_per_unit(unit: &str) -> Option<f64> {
    match unit.trim().to_lowercase().as_str() {
        "kg" | "kilogram" | "kilograms" => Some(1.0),
        "g" | "gram" | "grams" => Some(KG_PER_G),
        "lb" | "lbs" | "pound" | "pounds" => Some(KG_PER_LB),
        "oz" | "ounce" | "ounces" => Some(KG_PER_OZ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_points_round_trip() {
        assert!((gravity_points(1.050) - 50.0).abs() < 1e-9);
        assert!((sg_from_points(50.0) - 1.050).abs() < 1e-12);
    }

    #[test]
    fn test_dissolved_co2_at_20c() {
        // -0.1264 + 0.104 + 0.876
        assert!((dissolved_co2_volumes(20.0) - 0.8536).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_correction() {
        assert!((temperature_correction(30.0, 20.0) - 0.00325).abs() < 1e-12);
        assert_eq!(temperature_correction(20.0, 20.0), 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.05688, 3), 1.057);
        assert_eq!(round_to(18.6966, 1), 18.7);
        assert_eq!(round_to(5.2500001, 2), 5.25);
    }

    #[test]
    fn test_unit_classes() {
        assert_eq!(OtherUnit::Gram.class(), UnitClass::Mass);
        assert_eq!(OtherUnit::Kilogram.class(), UnitClass::Mass);
        assert_eq!(OtherUnit::Milliliter.class(), UnitClass::Volume);
        assert_eq!(OtherUnit::Liter.class(), UnitClass::Volume);
        assert_eq!(OtherUnit::Teaspoon.class(), UnitClass::Count);
        assert_eq!(OtherUnit::Packet.class(), UnitClass::Count);
    }

    #[test]
    fn test_scalable_units() {
        assert!(OtherUnit::Gram.is_scalable());
        assert!(OtherUnit::Liter.is_scalable());
        assert!(!OtherUnit::Tablespoon.is_scalable());
        assert!(!OtherUnit::Packet.is_scalable());
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(OtherUnit::from_str("Grams"), Some(OtherUnit::Gram));
        assert_eq!(OtherUnit::from_str("l"), Some(OtherUnit::Liter));
        assert_eq!(OtherUnit::from_str(" tsp "), Some(OtherUnit::Teaspoon));
        assert_eq!(OtherUnit::from_str("handful"), None);
    }

    #[test]
    fn test_unit_serde_names() {
        let json = serde_json::to_string(&OtherUnit::Liter).unwrap();
        assert_eq!(json, "\"L\"");
        let parsed: OtherUnit = serde_json::from_str("\"packet\"").unwrap();
        assert_eq!(parsed, OtherUnit::Packet);
    }

    #[test]
    fn test_kg_per_unit() {
        assert_eq!(kg_per_unit("kg"), Some(1.0));
        assert_eq!(kg_per_unit("g"), Some(KG_PER_G));
        assert_eq!(kg_per_unit("lb"), Some(KG_PER_LB));
        assert_eq!(kg_per_unit("cup"), None);
    }
}
