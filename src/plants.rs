use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::models::PlantMeta;

/// HES (hydro) and RES (wind) plants are only compared within their own
/// type; anything else is grouped as OTHER.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantType {
    Hes,
    Res,
    Other,
}

pub fn plant_type(name: &str) -> PlantType {
    let upper = name.to_uppercase();
    if upper.contains("HES") {
        PlantType::Hes
    } else if upper.contains("RES") {
        PlantType::Res
    } else {
        PlantType::Other
    }
}

/// Filesystem-safe plant name for the output filename.
pub fn slugify(value: &str) -> String {
    value
        .trim()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Load the plant list from the first existing candidate path. The
/// source file has drifted between two key spellings over time, so both
/// are accepted.
pub fn load_plants(candidates: &[PathBuf]) -> Result<Vec<PlantMeta>> {
    let path = candidates
        .iter()
        .find(|p| p.exists())
        .context("plant list JSON not found in any candidate location")?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_plants(&text).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn parse_plants(text: &str) -> Result<Vec<PlantMeta>> {
    let raw: Value = serde_json::from_str(text)?;
    let items = raw.as_array().context("plant list must be a JSON array")?;
    items.iter().map(parse_plant).collect()
}

fn parse_plant(v: &Value) -> Result<PlantMeta> {
    let name = str_field(v, &["powerPlantName", "powerplantName"])
        .context("plant entry missing powerPlantName")?;
    Ok(PlantMeta {
        power_plant_name: name.to_string(),
        organization_id: int_field(v, &["organizationId"])
            .context("plant entry missing organizationId")?,
        power_plant_id: int_field(v, &["powerPlantId", "powerplantId"])
            .context("plant entry missing powerPlantId")?,
        uevcb_id: int_field(v, &["uevcbId"]).context("plant entry missing uevcbId")?,
    })
}

fn str_field<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| v.get(*k)).and_then(Value::as_str)
}

fn int_field(v: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .find_map(|k| v.get(*k))
        .and_then(|x| x.as_i64().or_else(|| x.as_str()?.trim().parse().ok()))
}
