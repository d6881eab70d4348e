//! Recipe export
//!
//! Renders a recipe as a sectioned CSV sheet for printing or spreadsheet import.

use serde::Serialize;

use crate::brewing::{self, RecipeDraft, RecipeStatistics, ScalingContext};
use crate::db::Database;

use super::recipes::get_recipe;

/// Response for export_recipe_csv
#[derive(Debug, Serialize)]
pub struct ExportCsvResponse {
    pub file_name: String,
    pub csv: String,
    pub exported_at: String,
}

/// Quote a cell when it holds a delimiter, quote or line break
fn cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn push_row(out: &mut String, cells: &[String]) {
    let row: Vec<String> = cells.iter().map(|c| cell(c)).collect();
    out.push_str(&row.join(","));
    out.push('\n');
}

macro_rules! row {
    ($out:expr) => {
        $out.push('\n')
    };
    ($out:expr, $($cell:expr),+ $(,)?) => {
        push_row($out, &[$($cell.to_string()),+])
    };
}

fn temperature_and_time(temp_c: Option<f64>, duration: Option<f64>, unit: &str) -> Option<String> {
    match (temp_c, duration) {
        (Some(t), Some(d)) => Some(format!("{} °C for {} {}", t, d, unit)),
        (Some(t), None) => Some(format!("{} °C", t)),
        (None, Some(d)) => Some(format!("{} {}", d, unit)),
        (None, None) => None,
    }
}

/// Render a recipe and its statistics as CSV text
pub fn render_recipe_csv(
    draft: &RecipeDraft,
    stats: &RecipeStatistics,
    scaling: Option<&ScalingContext>,
) -> String {
    let mut out = String::new();

    row!(&mut out, "Recipe Name", draft.name);
    if let Some(style) = &draft.style {
        row!(&mut out, "Style", style);
    }
    if let Some(brewer) = &draft.brewer {
        row!(&mut out, "Brewer", brewer);
    }
    row!(&mut out, "Batch Size (L)", draft.batch_size_liters);
    if let Some(ctx) = scaling {
        row!(&mut out, "Scaled From (L)", ctx.original_batch_size_liters);
        row!(&mut out, "Scale Factor", format!("{:.2}x", ctx.scale_factor()));
    }
    row!(&mut out, "Efficiency (%)", draft.efficiency_percent);
    row!(&mut out);

    if !draft.grains.is_empty() {
        row!(&mut out, "GRAIN BILL");
        row!(&mut out, "Ingredient", "Amount", "Unit", "PPG", "Lovibond");
        for grain in &draft.grains {
            row!(&mut out, grain.name, grain.weight_kg, "kg", grain.ppg, grain.color_lovibond);
        }
        let total = brewing::units::round_to(draft.total_grain_kg(), 2);
        row!(&mut out, "Total Grain", total, "kg");
        row!(&mut out);
    }

    if !draft.hops.is_empty() {
        row!(&mut out, "HOP SCHEDULE");
        row!(&mut out, "Variety", "Amount", "Unit", "Time (min)", "Alpha Acid (%)");
        for hop in &draft.hops {
            row!(
                &mut out,
                hop.variety,
                hop.weight_grams,
                "g",
                hop.boil_time_minutes,
                hop.alpha_acid_percent
            );
        }
        row!(&mut out);
    }

    if !draft.other_ingredients.is_empty() {
        row!(&mut out, "OTHER INGREDIENTS");
        row!(&mut out, "Ingredient", "Amount", "Unit");
        for other in &draft.other_ingredients {
            row!(&mut out, other.name, other.amount, other.unit.as_str());
        }
        row!(&mut out);
    }

    row!(&mut out, "STATISTICS");
    row!(&mut out, "OG", format!("{:.3}", stats.og));
    row!(&mut out, "FG", format!("{:.3}", stats.fg));
    row!(&mut out, "ABV (%)", stats.abv);
    row!(&mut out, "IBU", stats.ibu);
    row!(&mut out, "SRM", stats.srm);
    if let Some(attenuation) = stats.attenuation_percent {
        row!(&mut out, "Attenuation (%)", attenuation);
    }
    if let Some(calories) = stats.calories {
        row!(&mut out, "Calories (12 oz)", calories);
    }
    row!(&mut out);

    row!(&mut out, "BREWING INFORMATION");
    if let Some(yeast) = &draft.yeast {
        row!(&mut out, "Yeast", yeast);
    }
    if let Some(mash) = temperature_and_time(draft.mash_temp_c, draft.mash_minutes, "min") {
        row!(&mut out, "Mash", mash);
    }
    if let Some(boil) = draft.boil_minutes {
        row!(&mut out, "Boil", format!("{} min", boil));
    }
    if let Some(fermentation) =
        temperature_and_time(draft.fermentation_temp_c, draft.fermentation_days, "days")
    {
        row!(&mut out, "Fermentation", fermentation);
    }

    if let Some(notes) = draft.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        row!(&mut out);
        row!(&mut out, "NOTES");
        row!(&mut out, notes);
    }

    out
}

/// File name for an exported recipe
pub fn export_file_name(name: &str, scaled: bool) -> String {
    let stem: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if scaled {
        format!("{}_scaled.csv", stem)
    } else {
        format!("{}.csv", stem)
    }
}

/// Export a saved recipe as CSV, optionally rescaled to a new batch size first
pub fn export_recipe_csv(
    db: &Database,
    id: i64,
    target_batch_size_liters: Option<f64>,
) -> Result<ExportCsvResponse, String> {
    let recipe = get_recipe(db, id)?.ok_or_else(|| format!("Recipe not found with id: {}", id))?;

    let csv = match target_batch_size_liters {
        Some(target) => {
            let scaled = brewing::scale_recipe(&recipe.draft, target)
                .map_err(|e| format!("Failed to scale recipe: {}", e))?;
            render_recipe_csv(&scaled.draft, &scaled.statistics, Some(&scaled.context))
        }
        None => render_recipe_csv(&recipe.draft, &recipe.statistics, None),
    };

    Ok(ExportCsvResponse {
        file_name: export_file_name(&recipe.draft.name, target_batch_size_liters.is_some()),
        csv,
        exported_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brewing::{GrainAddition, HopAddition, OtherIngredient, OtherUnit};

    fn stout() -> RecipeDraft {
        let mut draft = RecipeDraft::new("Dry Stout", 20.0);
        draft.style = Some("Irish Stout".to_string());
        draft.grains = vec![
            GrainAddition::new("Maris Otter", 3.5, 38.0, 3.0),
            GrainAddition::new("Roasted Barley", 0.45, 28.0, 500.0),
        ];
        draft.hops = vec![HopAddition::new("East Kent Goldings", 40.0, 60.0, 5.0)];
        draft.other_ingredients = vec![OtherIngredient {
            name: "Whirlfloc".to_string(),
            amount: 1.0,
            unit: OtherUnit::Packet,
            scale_eligible: false,
        }];
        draft.yeast = Some("Irish Ale".to_string());
        draft.mash_temp_c = Some(67.0);
        draft.mash_minutes = Some(60.0);
        draft
    }

    #[test]
    fn test_csv_sections_in_order() {
        let draft = stout();
        let finalized = draft.clone().finalize().unwrap();
        let csv = render_recipe_csv(&draft, &finalized.statistics, None);

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Recipe Name,Dry Stout");
        assert_eq!(lines[1], "Style,Irish Stout");
        assert_eq!(lines[2], "Batch Size (L),20");

        let grain = csv.find("GRAIN BILL").unwrap();
        let hops = csv.find("HOP SCHEDULE").unwrap();
        let other = csv.find("OTHER INGREDIENTS").unwrap();
        let stats = csv.find("STATISTICS").unwrap();
        let info = csv.find("BREWING INFORMATION").unwrap();
        assert!(grain < hops && hops < other && other < stats && stats < info);

        assert!(csv.contains("Maris Otter,3.5,kg,38,3\n"));
        assert!(csv.contains("Total Grain,3.95,kg\n"));
        assert!(csv.contains("Whirlfloc,1,packet\n"));
        assert!(csv.contains("Mash,67 °C for 60 min\n"));
        assert!(!csv.contains("Scale Factor"));
        assert!(!csv.contains("NOTES"));
    }

    #[test]
    fn test_csv_scaled_header() {
        let scaled = brewing::scale_recipe(&stout(), 40.0).unwrap();
        let csv = render_recipe_csv(&scaled.draft, &scaled.statistics, Some(&scaled.context));
        assert!(csv.contains("Batch Size (L),40\n"));
        assert!(csv.contains("Scaled From (L),20\n"));
        assert!(csv.contains("Scale Factor,2.00x\n"));
        assert!(csv.contains("Maris Otter,7,kg"));
    }

    #[test]
    fn test_csv_quotes_cells() {
        let mut draft = stout();
        draft.notes = Some("Mash thick, \"really\" thick".to_string());
        let finalized = draft.clone().finalize().unwrap();
        let csv = render_recipe_csv(&draft, &finalized.statistics, None);
        assert!(csv.ends_with("NOTES\n\"Mash thick, \"\"really\"\" thick\"\n"));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Dry Stout", false), "dry_stout.csv");
        assert_eq!(export_file_name("Dry Stout", true), "dry_stout_scaled.csv");
    }
}
