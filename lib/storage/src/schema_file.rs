use anyhow::{Context, Result};
use segserve_core::FeatureSchema;
use std::fs;
use std::path::Path;

/// Read a feature schema from a JSON file
pub fn load_schema(path: &Path) -> Result<FeatureSchema> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file {}", path.display()))?;
    FeatureSchema::from_json(&json)
        .with_context(|| format!("Invalid schema file {}", path.display()))
}
