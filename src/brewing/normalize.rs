//! Recipe normalization
//!
//! Maps the many shapes recipe JSON arrives in (saved recipes, scraped datasets,
//! hand-written imports) onto [`RecipeDraft`] in one pass. Each canonical field has an
//! ordered list of source keys and the first one present wins, so a record carrying
//! both `type` and `name` is read, not rejected. Numbers may be JSON numbers or numeric
//! strings. Grain weights are kilograms unless an explicit `weight_unit` says otherwise.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::{CalcError, CalcResult};
use super::types::{GrainAddition, HopAddition, OtherIngredient, RecipeDraft};
use super::units::{kg_per_unit, OtherUnit};

/// Batch size assumed when a source recipe does not state one
pub const DEFAULT_SOURCE_BATCH_LITERS: f64 = 20.0;

// ============================================================================
// Source Keys (first present wins)
// ============================================================================

const RECIPE_NAME: &[&str] = &["name", "title", "recipe_name"];
const BATCH_SIZE: &[&str] = &["batch_size_liters", "batch_size", "batch_size_l", "volume"];
const EFFICIENCY: &[&str] = &["efficiency_percent", "efficiency"];
const GRAIN_LIST: &[&str] = &["grain_bill", "malts", "grains", "fermentables"];
const HOP_LIST: &[&str] = &["hop_schedule", "hops", "hop_additions"];
const OTHER_LIST: &[&str] = &["other_ingredients", "additions", "misc"];
const YEAST: &[&str] = &["yeast", "yeast_strain"];
const FERMENTATION_TEMP: &[&str] = &["fermentation_temp_c", "fermentation_temp"];
const FINAL_GRAVITY: &[&str] = &["final_gravity", "fg", "expected_fg"];
const MASH_TEMP: &[&str] = &["mash_temp_c", "mash_temp"];
const MASH_MINUTES: &[&str] = &["mash_minutes", "mash_time"];
const BOIL_MINUTES: &[&str] = &["boil_minutes", "boil_time"];

const GRAIN_NAME: &[&str] = &["type", "name", "grain_type"];
const GRAIN_WEIGHT: &[&str] = &["weight", "amount", "weight_kg"];
const GRAIN_PPG: &[&str] = &["ppg", "potential"];
const GRAIN_COLOR: &[&str] = &["lovibond", "color", "color_lovibond"];

const HOP_VARIETY: &[&str] = &["variety", "name"];
const HOP_WEIGHT: &[&str] = &["weight", "amount", "weight_grams"];
const HOP_TIME: &[&str] = &["time", "addition_time", "boil_time_minutes"];
const HOP_ALPHA: &[&str] = &["alpha_acid", "aa", "alpha_acid_percent"];

const FERMENTATION_YEAST: &[&str] = &["yeast"];
const FERMENTATION_BLOCK_TEMP: &[&str] = &["temperature_c", "temp", "temperature"];
const FERMENTATION_DAYS: &[&str] = &["duration_days", "days", "duration"];

// ============================================================================
// Source Shapes
// ============================================================================

/// One grain, hop or other-ingredient entry
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceAddition {
    /// [weight, name, ppg, lovibond] or [weight, variety, time, alpha]
    Positional(Vec<Value>),
    Keyed(Map<String, Value>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceYeast {
    Text(String),
    List(Vec<Value>),
    Named {
        name: Option<String>,
        code: Option<String>,
    },
}

/// A JSON object read through ordered key lists, with errors named by path
struct Record<'a> {
    map: &'a Map<String, Value>,
    path: String,
}

impl<'a> Record<'a> {
    fn new(map: &'a Map<String, Value>, path: impl Into<String>) -> Self {
        Self {
            map,
            path: path.into(),
        }
    }

    fn field(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.path, name)
        }
    }

    /// First key holding a non-null value
    fn value(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|key| self.map.get(*key))
            .find(|value| !value.is_null())
    }

    /// First key holding non-empty text
    fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().filter_map(|key| self.map.get(*key)).find_map(text)
    }

    fn required_text(&self, name: &str, keys: &[&str]) -> CalcResult<String> {
        self.text(keys)
            .ok_or_else(|| CalcError::invalid(self.field(name), "missing required value"))
    }

    fn required_number(&self, name: &str, keys: &[&str]) -> CalcResult<f64> {
        match self.value(keys) {
            Some(value) => number(&self.field(name), value),
            None => Err(CalcError::invalid(self.field(name), "missing required value")),
        }
    }

    fn optional_number(&self, name: &str, keys: &[&str]) -> CalcResult<Option<f64>> {
        self.value(keys)
            .map(|value| number(&self.field(name), value))
            .transpose()
    }

    fn flag(&self, name: &str, keys: &[&str]) -> CalcResult<bool> {
        match self.value(keys) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(CalcError::invalid(
                self.field(name),
                format!("expected true or false, got {}", other),
            )),
        }
    }

    /// Entries of the first list present; absent means empty
    fn additions(&self, name: &str, keys: &[&str]) -> CalcResult<Vec<SourceAddition>> {
        let Some(value) = self.value(keys) else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = value else {
            return Err(CalcError::invalid(self.field(name), "expected a list"));
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                SourceAddition::deserialize(item).map_err(|_| {
                    CalcError::invalid(
                        format!("{}[{}]", self.field(name), i),
                        "expected an object or a positional list",
                    )
                })
            })
            .collect()
    }

    fn yeast(&self, keys: &[&str]) -> CalcResult<Option<SourceYeast>> {
        self.value(keys)
            .map(|value| {
                SourceYeast::deserialize(value).map_err(|_| {
                    CalcError::invalid(self.field("yeast"), "expected text, a list or {name, code}")
                })
            })
            .transpose()
    }
}

// ============================================================================
// Value Coercion
// ============================================================================

/// Read a number that may arrive as a JSON number or a numeric string
fn number(field: &str, value: &Value) -> CalcResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(CalcError::invalid(field, format!("expected a number, got {}", value))),
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn positional_text(field: String, value: &Value) -> CalcResult<String> {
    text(value).ok_or_else(|| CalcError::invalid(field, "missing required value"))
}

// ============================================================================
// Mapping
// ============================================================================

fn normalize_grain(index: usize, source: SourceAddition) -> CalcResult<GrainAddition> {
    let path = format!("grain_bill[{}]", index);
    match source {
        SourceAddition::Positional(values) => {
            if values.len() < 4 {
                return Err(CalcError::invalid(
                    path,
                    "positional grain needs [weight, name, ppg, lovibond]",
                ));
            }
            Ok(GrainAddition {
                weight_kg: number(&format!("{}.weight", path), &values[0])?,
                name: positional_text(format!("{}.name", path), &values[1])?,
                ppg: number(&format!("{}.ppg", path), &values[2])?,
                color_lovibond: number(&format!("{}.lovibond", path), &values[3])?,
            })
        }
        SourceAddition::Keyed(map) => {
            let grain = Record::new(&map, path);
            let weight = grain.required_number("weight", GRAIN_WEIGHT)?;
            let factor = match grain.text(&["weight_unit"]) {
                None => 1.0,
                Some(unit) => kg_per_unit(&unit).ok_or_else(|| {
                    CalcError::invalid(
                        grain.field("weight_unit"),
                        format!("unknown unit '{}' (expected kg, g, lb or oz)", unit),
                    )
                })?,
            };
            Ok(GrainAddition {
                name: grain.required_text("name", GRAIN_NAME)?,
                weight_kg: weight * factor,
                ppg: grain.required_number("ppg", GRAIN_PPG)?,
                color_lovibond: grain.required_number("lovibond", GRAIN_COLOR)?,
            })
        }
    }
}

fn normalize_hop(index: usize, source: SourceAddition) -> CalcResult<HopAddition> {
    let path = format!("hop_schedule[{}]", index);
    match source {
        SourceAddition::Positional(values) => {
            if values.len() < 4 {
                return Err(CalcError::invalid(
                    path,
                    "positional hop needs [weight, variety, time, alpha]",
                ));
            }
            Ok(HopAddition {
                weight_grams: number(&format!("{}.weight", path), &values[0])?,
                variety: positional_text(format!("{}.variety", path), &values[1])?,
                boil_time_minutes: number(&format!("{}.time", path), &values[2])?,
                alpha_acid_percent: number(&format!("{}.alpha_acid", path), &values[3])?,
            })
        }
        SourceAddition::Keyed(map) => {
            let hop = Record::new(&map, path);
            Ok(HopAddition {
                variety: hop.required_text("variety", HOP_VARIETY)?,
                weight_grams: hop.required_number("weight", HOP_WEIGHT)?,
                boil_time_minutes: hop.required_number("time", HOP_TIME)?,
                alpha_acid_percent: hop.required_number("alpha_acid", HOP_ALPHA)?,
            })
        }
    }
}

fn normalize_other(index: usize, source: SourceAddition) -> CalcResult<OtherIngredient> {
    let path = format!("other_ingredients[{}]", index);
    let SourceAddition::Keyed(map) = source else {
        return Err(CalcError::invalid(path, "expected an object with name, amount and unit"));
    };
    let other = Record::new(&map, path);
    let unit_text = other.required_text("unit", &["unit"])?;
    let unit = OtherUnit::from_str(&unit_text).ok_or_else(|| {
        CalcError::invalid(other.field("unit"), format!("unknown unit '{}'", unit_text))
    })?;
    Ok(OtherIngredient {
        name: other.required_text("name", &["name"])?,
        amount: other.required_number("amount", &["amount"])?,
        unit,
        scale_eligible: other.flag("scale_eligible", &["scale_eligible", "scale"])?,
    })
}

fn yeast_name(source: SourceYeast) -> Option<String> {
    match source {
        SourceYeast::Text(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        SourceYeast::List(items) => {
            let names: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(map) => map.get("name").and_then(text),
                    other => text(other),
                })
                .collect();
            if names.is_empty() {
                None
            } else {
                Some(names.join(", "))
            }
        }
        SourceYeast::Named { name, code } => match (name, code) {
            (Some(name), Some(code)) => Some(format!("{} ({})", name.trim(), code.trim())),
            (Some(name), None) => Some(name.trim().to_string()),
            (None, Some(code)) => Some(code.trim().to_string()),
            (None, None) => None,
        },
    }
}

/// Normalize one source recipe into a draft
pub fn normalize_recipe(source: &Value) -> CalcResult<RecipeDraft> {
    let Value::Object(map) = source else {
        return Err(CalcError::invalid("recipe", "expected a JSON object"));
    };
    let recipe = Record::new(map, "");

    let batch_size = recipe
        .optional_number("batch_size_liters", BATCH_SIZE)?
        .unwrap_or(DEFAULT_SOURCE_BATCH_LITERS);
    let mut draft = RecipeDraft::new(recipe.required_text("name", RECIPE_NAME)?, batch_size);
    draft.style = recipe.text(&["style"]);
    draft.brewer = recipe.text(&["brewer"]);
    draft.notes = recipe.text(&["notes"]);

    if let Some(efficiency) = recipe.optional_number("efficiency_percent", EFFICIENCY)? {
        draft.efficiency_percent = efficiency;
    }
    if let Some(fg) = recipe.optional_number("final_gravity", FINAL_GRAVITY)? {
        draft.final_gravity = fg;
    }

    draft.grains = recipe
        .additions("grain_bill", GRAIN_LIST)?
        .into_iter()
        .enumerate()
        .map(|(i, g)| normalize_grain(i, g))
        .collect::<CalcResult<_>>()?;
    draft.hops = recipe
        .additions("hop_schedule", HOP_LIST)?
        .into_iter()
        .enumerate()
        .map(|(i, h)| normalize_hop(i, h))
        .collect::<CalcResult<_>>()?;
    draft.other_ingredients = recipe
        .additions("other_ingredients", OTHER_LIST)?
        .into_iter()
        .enumerate()
        .map(|(i, o)| normalize_other(i, o))
        .collect::<CalcResult<_>>()?;

    let fermentation = match recipe.value(&["fermentation"]) {
        None => None,
        Some(Value::Object(block)) => Some(Record::new(block, "fermentation")),
        Some(_) => return Err(CalcError::invalid("fermentation", "expected an object")),
    };

    let yeast = match recipe.yeast(YEAST)? {
        Some(yeast) => Some(yeast),
        None => match &fermentation {
            Some(block) => block.yeast(FERMENTATION_YEAST)?,
            None => None,
        },
    };
    draft.yeast = yeast.and_then(yeast_name);

    draft.fermentation_temp_c = match recipe.optional_number("fermentation_temp_c", FERMENTATION_TEMP)? {
        Some(temp) => Some(temp),
        None => match &fermentation {
            Some(block) => block.optional_number("temperature_c", FERMENTATION_BLOCK_TEMP)?,
            None => None,
        },
    };
    draft.fermentation_days = match &fermentation {
        Some(block) => block.optional_number("duration_days", FERMENTATION_DAYS)?,
        None => None,
    };
    draft.mash_temp_c = recipe.optional_number("mash_temp_c", MASH_TEMP)?;
    draft.mash_minutes = recipe.optional_number("mash_minutes", MASH_MINUTES)?;
    draft.boil_minutes = recipe.optional_number("boil_minutes", BOIL_MINUTES)?;

    tracing::debug!(
        recipe = %draft.name,
        grains = draft.grains.len(),
        hops = draft.hops.len(),
        "Normalized source recipe"
    );
    Ok(draft)
}

/// Normalize a single recipe object or an array of them
pub fn normalize_recipes(source: &Value) -> CalcResult<Vec<RecipeDraft>> {
    match source {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                normalize_recipe(item).map_err(|e| match e {
                    CalcError::InvalidInput { field, reason } => {
                        CalcError::invalid(format!("[{}].{}", i, field), reason)
                    }
                    other => other,
                })
            })
            .collect(),
        other => normalize_recipe(other).map(|draft| vec![draft]),
    }
}
