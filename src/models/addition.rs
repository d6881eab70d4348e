//! Recipe additions
//!
//! Grain, hop and other-ingredient rows belonging to a recipe. Rows keep the
//! position they had in the draft so a recipe loads back in the order it was written.

use rusqlite::{params, Connection, Row};

use crate::brewing::{GrainAddition, HopAddition, OtherIngredient, OtherUnit};
use crate::db::{DbError, DbResult};

fn grain_from_row(row: &Row) -> rusqlite::Result<GrainAddition> {
    Ok(GrainAddition {
        name: row.get("name")?,
        weight_kg: row.get("weight_kg")?,
        ppg: row.get("ppg")?,
        color_lovibond: row.get("color_lovibond")?,
    })
}

fn hop_from_row(row: &Row) -> rusqlite::Result<HopAddition> {
    Ok(HopAddition {
        variety: row.get("variety")?,
        weight_grams: row.get("weight_grams")?,
        boil_time_minutes: row.get("boil_time_minutes")?,
        alpha_acid_percent: row.get("alpha_acid_percent")?,
    })
}

/// Replace the grain bill of a recipe
pub fn save_grains(conn: &Connection, recipe_id: i64, grains: &[GrainAddition]) -> DbResult<()> {
    conn.execute("DELETE FROM grain_additions WHERE recipe_id = ?1", [recipe_id])?;
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO grain_additions (recipe_id, position, name, weight_kg, ppg, color_lovibond)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )?;
    for (position, grain) in grains.iter().enumerate() {
        stmt.execute(params![
            recipe_id,
            position as i64,
            grain.name,
            grain.weight_kg,
            grain.ppg,
            grain.color_lovibond,
        ])?;
    }
    Ok(())
}

/// Replace the hop schedule of a recipe
pub fn save_hops(conn: &Connection, recipe_id: i64, hops: &[HopAddition]) -> DbResult<()> {
    conn.execute("DELETE FROM hop_additions WHERE recipe_id = ?1", [recipe_id])?;
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO hop_additions
            (recipe_id, position, variety, weight_grams, boil_time_minutes, alpha_acid_percent)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )?;
    for (position, hop) in hops.iter().enumerate() {
        stmt.execute(params![
            recipe_id,
            position as i64,
            hop.variety,
            hop.weight_grams,
            hop.boil_time_minutes,
            hop.alpha_acid_percent,
        ])?;
    }
    Ok(())
}

/// Replace the other ingredients of a recipe
pub fn save_others(conn: &Connection, recipe_id: i64, others: &[OtherIngredient]) -> DbResult<()> {
    conn.execute("DELETE FROM other_ingredients WHERE recipe_id = ?1", [recipe_id])?;
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO other_ingredients (recipe_id, position, name, amount, unit, scale_eligible)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )?;
    for (position, other) in others.iter().enumerate() {
        stmt.execute(params![
            recipe_id,
            position as i64,
            other.name,
            other.amount,
            other.unit.as_str(),
            other.scale_eligible as i32,
        ])?;
    }
    Ok(())
}

pub fn load_grains(conn: &Connection, recipe_id: i64) -> DbResult<Vec<GrainAddition>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM grain_additions WHERE recipe_id = ?1 ORDER BY position",
    )?;
    let grains = stmt
        .query_map([recipe_id], grain_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(grains)
}

pub fn load_hops(conn: &Connection, recipe_id: i64) -> DbResult<Vec<HopAddition>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM hop_additions WHERE recipe_id = ?1 ORDER BY position",
    )?;
    let hops = stmt
        .query_map([recipe_id], hop_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(hops)
}

pub fn load_others(conn: &Connection, recipe_id: i64) -> DbResult<Vec<OtherIngredient>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT name, amount, unit, scale_eligible FROM other_ingredients
        WHERE recipe_id = ?1 ORDER BY position
        "#,
    )?;
    let rows = stmt
        .query_map([recipe_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i32>(3)? != 0,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(name, amount, unit, scale_eligible)| {
            let unit = OtherUnit::from_str(&unit).ok_or_else(|| {
                DbError::InvalidData(format!("unknown unit '{}' on ingredient '{}'", unit, name))
            })?;
            Ok(OtherIngredient {
                name,
                amount,
                unit,
                scale_eligible,
            })
        })
        .collect()
}
