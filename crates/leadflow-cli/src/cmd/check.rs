use std::path::Path;

use leadflow_core::lead::NewLead;
use leadflow_core::stage::FunnelStage;
use leadflow_core::validation::missing_required_fields;
use serde::Deserialize;
use uuid::Uuid;

use super::read_json;
use crate::output::print_json;

#[derive(Deserialize)]
struct StageFile {
    name: String,
    #[serde(default)]
    required_fields: Vec<String>,
}

/// Fails (exit 1) when the lead is missing any of the stage's required fields.
pub fn run(lead_path: &Path, stage_path: &Path, json: bool) -> anyhow::Result<()> {
    let input: NewLead = read_json(lead_path)?;
    let file: StageFile = read_json(stage_path)?;

    let mut stage = FunnelStage::new(Uuid::nil(), file.name, 0);
    stage.required_fields = file.required_fields;
    let lead = input.into_lead(Uuid::nil(), stage.id);
    let missing = missing_required_fields(&lead, &stage);

    if json {
        print_json(&serde_json::json!({
            "stage": stage.name,
            "allowed": missing.is_empty(),
            "missing_fields": missing,
        }))?;
    } else if missing.is_empty() {
        println!("'{}' can move to '{}'.", lead.name, stage.name);
    } else {
        println!("Missing for '{}': {}", stage.name, missing.join(", "));
    }

    if !missing.is_empty() {
        anyhow::bail!("{} required field(s) missing", missing.len());
    }
    Ok(())
}
