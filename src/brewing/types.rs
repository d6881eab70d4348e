//! Canonical brewing records
//!
//! Every calculator works on these shapes. Source data with other field names goes
//! through [`super::normalize`] first.

use serde::{Deserialize, Serialize};

use super::calculator::recipe_statistics;
use super::error::{
    require_finite, require_non_negative, require_positive, CalcError, CalcResult, Degenerate,
};
use super::units::OtherUnit;
use super::water::{estimate_volumes, WaterVolumes, DEFAULT_WATER_TO_GRIST_RATIO};

/// Default brewhouse efficiency in percent
pub const DEFAULT_EFFICIENCY_PERCENT: f64 = 75.0;
/// Default expected final gravity for a new recipe
pub const DEFAULT_FINAL_GRAVITY: f64 = 1.010;
/// Longest boil addition accepted, in minutes
pub const MAX_BOIL_MINUTES: f64 = 120.0;

/// A fermentable in the grain bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrainAddition {
    pub name: String,
    pub weight_kg: f64,
    /// Extract potential in points per pound per gallon
    pub ppg: f64,
    pub color_lovibond: f64,
}

impl GrainAddition {
    pub fn new(name: impl Into<String>, weight_kg: f64, ppg: f64, color_lovibond: f64) -> Self {
        Self {
            name: name.into(),
            weight_kg,
            ppg,
            color_lovibond,
        }
    }

    pub fn validate(&self) -> CalcResult<()> {
        require_positive("grain.weight_kg", self.weight_kg)?;
        require_positive("grain.ppg", self.ppg)?;
        require_non_negative("grain.color_lovibond", self.color_lovibond)?;
        Ok(())
    }
}

/// A hop addition in the boil schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HopAddition {
    pub variety: String,
    pub weight_grams: f64,
    pub boil_time_minutes: f64,
    pub alpha_acid_percent: f64,
}

impl HopAddition {
    pub fn new(
        variety: impl Into<String>,
        weight_grams: f64,
        boil_time_minutes: f64,
        alpha_acid_percent: f64,
    ) -> Self {
        Self {
            variety: variety.into(),
            weight_grams,
            boil_time_minutes,
            alpha_acid_percent,
        }
    }

    pub fn validate(&self) -> CalcResult<()> {
        require_positive("hop.weight_grams", self.weight_grams)?;
        require_positive("hop.alpha_acid_percent", self.alpha_acid_percent)?;
        let time = require_non_negative("hop.boil_time_minutes", self.boil_time_minutes)?;
        if time > MAX_BOIL_MINUTES {
            return Err(CalcError::invalid(
                "hop.boil_time_minutes",
                format!("must be between 0 and {} (got {})", MAX_BOIL_MINUTES, time),
            ));
        }
        Ok(())
    }
}

/// A non-grain, non-hop ingredient (finings, nutrient, salts, spices)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherIngredient {
    pub name: String,
    pub amount: f64,
    pub unit: OtherUnit,
    /// User opt-in for proportional scaling
    #[serde(default)]
    pub scale_eligible: bool,
}

impl OtherIngredient {
    /// Scales only when the unit is mass/volume AND the user opted in
    pub fn scales_with_batch(&self) -> bool {
        self.unit.is_scalable() && self.scale_eligible
    }

    pub fn validate(&self) -> CalcResult<()> {
        require_non_negative("other.amount", self.amount)?;
        Ok(())
    }
}

/// Derived statistics, always recomputed from quantities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStatistics {
    pub og: f64,
    pub fg: f64,
    pub abv: f64,
    pub ibu: f64,
    pub srm: f64,
    /// None when og is exactly 1.000
    pub attenuation_percent: Option<f64>,
    /// None when the calorie formula degenerates
    pub calories: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", skip_deserializing)]
    pub warnings: Vec<Degenerate>,
}

/// A recipe being composed; passed explicitly between builder, scaler and storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    pub style: Option<String>,
    pub brewer: Option<String>,
    pub batch_size_liters: f64,
    #[serde(default = "default_efficiency")]
    pub efficiency_percent: f64,
    #[serde(default)]
    pub grains: Vec<GrainAddition>,
    #[serde(default)]
    pub hops: Vec<HopAddition>,
    #[serde(default)]
    pub other_ingredients: Vec<OtherIngredient>,
    pub yeast: Option<String>,
    pub fermentation_temp_c: Option<f64>,
    pub fermentation_days: Option<f64>,
    pub mash_temp_c: Option<f64>,
    pub mash_minutes: Option<f64>,
    pub boil_minutes: Option<f64>,
    #[serde(default = "default_final_gravity")]
    pub final_gravity: f64,
    #[serde(default = "default_ratio")]
    pub water_to_grist_ratio: f64,
    pub notes: Option<String>,
}

fn default_efficiency() -> f64 {
    DEFAULT_EFFICIENCY_PERCENT
}

fn default_final_gravity() -> f64 {
    DEFAULT_FINAL_GRAVITY
}

fn default_ratio() -> f64 {
    DEFAULT_WATER_TO_GRIST_RATIO
}

/// A validated draft together with everything derived from it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizedRecipe {
    pub draft: RecipeDraft,
    pub statistics: RecipeStatistics,
    pub water: WaterVolumes,
}

impl RecipeDraft {
    /// Start an empty draft for the given batch size
    pub fn new(name: impl Into<String>, batch_size_liters: f64) -> Self {
        Self {
            name: name.into(),
            style: None,
            brewer: None,
            batch_size_liters,
            efficiency_percent: DEFAULT_EFFICIENCY_PERCENT,
            grains: Vec::new(),
            hops: Vec::new(),
            other_ingredients: Vec::new(),
            yeast: None,
            fermentation_temp_c: None,
            fermentation_days: None,
            mash_temp_c: None,
            mash_minutes: None,
            boil_minutes: None,
            final_gravity: DEFAULT_FINAL_GRAVITY,
            water_to_grist_ratio: DEFAULT_WATER_TO_GRIST_RATIO,
            notes: None,
        }
    }

    pub fn total_grain_kg(&self) -> f64 {
        self.grains.iter().map(|g| g.weight_kg).sum()
    }

    /// Check every field the calculators rely on
    pub fn validate(&self) -> CalcResult<()> {
        if self.name.trim().is_empty() {
            return Err(CalcError::invalid("name", "recipe name cannot be empty"));
        }
        if self.grains.is_empty() {
            return Err(CalcError::invalid("grains", "at least one grain addition is required"));
        }
        require_positive("batch_size_liters", self.batch_size_liters)?;
        require_positive("efficiency_percent", self.efficiency_percent)?;
        let fg = require_finite("final_gravity", self.final_gravity)?;
        if fg < 1.0 {
            return Err(CalcError::invalid("final_gravity", "must be at least 1.000"));
        }
        self.grains.iter().try_for_each(GrainAddition::validate)?;
        self.hops.iter().try_for_each(HopAddition::validate)?;
        self.other_ingredients.iter().try_for_each(OtherIngredient::validate)?;
        Ok(())
    }

    /// Validate, then compute statistics and water volumes for saving
    pub fn finalize(self) -> CalcResult<FinalizedRecipe> {
        self.validate()?;

        let statistics = recipe_statistics(
            &self.grains,
            &self.hops,
            self.batch_size_liters,
            self.efficiency_percent,
            self.final_gravity,
        )?;
        let water = estimate_volumes(
            self.total_grain_kg(),
            self.batch_size_liters,
            self.water_to_grist_ratio,
        );

        Ok(FinalizedRecipe {
            draft: self,
            statistics,
            water,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pale_ale() -> RecipeDraft {
        let mut draft = RecipeDraft::new("Pale Ale", 19.0);
        draft.efficiency_percent = 70.0;
        draft.grains.push(GrainAddition::new("2-Row Pale Malt", 5.0, 37.0, 2.0));
        draft.hops.push(HopAddition::new("Cascade", 28.0, 60.0, 5.5));
        draft
    }

    #[test]
    fn test_finalize_computes_statistics() {
        let finalized = pale_ale().finalize().unwrap();
        assert_eq!(finalized.statistics.og, 1.057);
        assert_eq!(finalized.statistics.fg, 1.010);
        assert!(finalized.statistics.ibu > 0.0);
        assert!(!finalized.water.insufficient_input);
    }

    #[test]
    fn test_finalize_requires_name() {
        let mut draft = pale_ale();
        draft.name = "   ".to_string();
        let err = draft.finalize().unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { ref field, .. } if field == "name"));
    }

    #[test]
    fn test_finalize_requires_grain() {
        let mut draft = pale_ale();
        draft.grains.clear();
        assert!(draft.finalize().is_err());
    }

    #[test]
    fn test_negative_grain_weight_rejected() {
        let grain = GrainAddition::new("Munich", -1.0, 35.0, 9.0);
        assert!(grain.validate().is_err());
    }

    #[test]
    fn test_hop_time_range() {
        assert!(HopAddition::new("Saaz", 20.0, 0.0, 3.5).validate().is_ok());
        assert!(HopAddition::new("Saaz", 20.0, 120.0, 3.5).validate().is_ok());
        assert!(HopAddition::new("Saaz", 20.0, 121.0, 3.5).validate().is_err());
        assert!(HopAddition::new("Saaz", 20.0, -5.0, 3.5).validate().is_err());
    }

    #[test]
    fn test_other_ingredient_policy() {
        let mut whirlfloc = OtherIngredient {
            name: "Whirlfloc".to_string(),
            amount: 1.0,
            unit: OtherUnit::Packet,
            scale_eligible: true,
        };
        assert!(!whirlfloc.scales_with_batch());

        whirlfloc.unit = OtherUnit::Gram;
        whirlfloc.scale_eligible = false;
        assert!(!whirlfloc.scales_with_batch());

        whirlfloc.scale_eligible = true;
        assert!(whirlfloc.scales_with_batch());
    }

    #[test]
    fn test_draft_deserializes_with_defaults() {
        let json = r#"{
            "name": "Stout",
            "batch_size_liters": 20.0,
            "grains": [{"name": "Roasted Barley", "weight_kg": 0.5, "ppg": 28, "color_lovibond": 500}]
        }"#;
        let draft: RecipeDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.efficiency_percent, DEFAULT_EFFICIENCY_PERCENT);
        assert_eq!(draft.final_gravity, DEFAULT_FINAL_GRAVITY);
        assert!(draft.hops.is_empty());
    }
}
