//! Brewlab Status Tool
//!
//! Provides runtime status information about the Brewlab service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Recipe design instructions for AI assistants
pub const BREWING_INSTRUCTIONS: &str = r#"
# Brewlab Recipe Instructions

This guide explains how to design, save and rescale beer recipes with the Brewlab tools.

## Overview

A recipe needs:
1. **A name** - non-empty
2. **A grain bill** - at least one grain with weight (kg), ppg and color (°Lovibond)
3. **A batch size** - final volume in liters

Hops, other ingredients, yeast and process details are optional. Statistics (OG, FG,
ABV, IBU, SRM, attenuation, calories) and water volumes are always computed by the
server. Never pass them in; they are recomputed from quantities every time.

---

## Units

| Quantity | Unit |
|----------|------|
| Grain weight | kilograms |
| Hop weight | grams |
| Volumes | liters |
| Temperatures | °C |
| Boil time | minutes (0-120) |
| Alpha acid | percent (e.g. 5.5, not 0.055) |
| Efficiency | percent (default 75) |

When a source gives grain weights in grams, pounds or ounces, use `import_recipe` with
an explicit `weight_unit` on each grain rather than converting by hand. A bare number
is always read as kilograms.

---

## Creating a Recipe

**Tool:** `create_recipe`

```json
{
  "name": "Citra Pale Ale",
  "style": "American Pale Ale",
  "batch_size_liters": 19,
  "efficiency_percent": 70,
  "grains": [
    {"name": "2-Row Pale Malt", "weight_kg": 5.0, "ppg": 37, "color_lovibond": 2}
  ],
  "hops": [
    {"variety": "Citra", "weight_grams": 28, "boil_time_minutes": 60, "alpha_acid_percent": 12}
  ],
  "yeast": "US-05"
}
```

The response includes the recipe's `position` in the collection and its statistics.

---

## Importing Recipes From Other Formats

**Tool:** `import_recipe` (or `normalize_recipe` to preview without saving)

Accepts recipe JSON in common shapes:
- Grain lists named `grain_bill`, `malts`, `grains` or `fermentables`
- Grain fields `name`/`type`, `weight`/`amount`, `ppg`/`potential`, `lovibond`/`color`
- Hop lists named `hop_schedule`, `hops` or `hop_additions`
- Hop fields `variety`/`name`, `weight`/`amount`, `time`/`addition_time`, `alpha_acid`/`aa`
- Positional rows: grains `[weight, name, ppg, lovibond]`, hops `[weight, variety, time, alpha]`
- Numbers as JSON numbers or numeric strings

An array of recipes is imported all-or-nothing: if any record fails validation, nothing
is saved and the error names the record and field.

---

## Browsing and Deleting

- `list_recipes` returns summaries in collection order with their `position`
- `get_recipe` returns the full recipe by `id`, or by `position`
- `delete_recipe_at` removes the recipe at a position; later recipes shift down by one

Always call `list_recipes` right before `delete_recipe_at` so the position is current.

---

## Scaling

**Tool:** `scale_recipe` (saved recipe) or `scale_ingredients` (ad-hoc lists)

All grain and hop weights are multiplied by `target / original`. OG and IBU stay the
same within rounding because they are recomputed at the new batch size.

Other ingredients only scale when BOTH:
- their unit is g, kg, ml or L, AND
- `scale_eligible` is true

Teaspoons, tablespoons and packets never scale. Set `save: true` to store the result
as a new recipe named "<name> (<target> L)".

---

## Exporting and Maintenance

- `export_recipe_csv` returns a file name and CSV text for a saved recipe; pass
  `target_batch_size_liters` to export a rescaled copy without saving it
- `recalculate_recipe_stats` recomputes stored statistics for every recipe and reports
  which ones changed

---

## Warnings

Some results are valid numbers that deserve a second look. They come back with a
`warning` field instead of an error:
- ABV below zero (final gravity above original gravity)
- SRM of 0 (no color in the grain bill)
- 0 g priming sugar (the beer already holds the requested CO2)
- Water volumes of 0 (no grain or no batch volume)

Relay these to the user rather than silently dropping them.
"#;

/// Runtime status of the Brewlab service
#[derive(Debug, Clone, Serialize)]
pub struct BrewlabStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub recipe_count: Option<i64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, recipe_count: Option<i64>) -> BrewlabStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        BrewlabStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            recipe_count,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_missing_database() {
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/brewlab.db"));
        let status = tracker.get_status(Some(3));
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.recipe_count, Some(3));
        assert_eq!(status.process_id, std::process::id());
    }

    #[test]
    fn test_instructions_cover_every_recipe_tool() {
        for tool in [
            "create_recipe",
            "import_recipe",
            "list_recipes",
            "delete_recipe_at",
            "scale_recipe",
            "export_recipe_csv",
            "recalculate_recipe_stats",
        ] {
            assert!(BREWING_INSTRUCTIONS.contains(tool), "missing {}", tool);
        }
    }
}
