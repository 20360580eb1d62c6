use std::path::Path;
use std::sync::Arc;

use leadflow_core::generation::{Generator, TriggerReport};
use uuid::Uuid;

use super::{completion_client, connect_store, load_config};
use crate::output::{print_json, print_table, print_variants};

async fn generator(config_path: &Path) -> anyhow::Result<Generator> {
    let config = load_config(config_path)?;
    let backend = completion_client(&config)?;
    let store = connect_store(&config).await?;
    Ok(Generator::new(
        Arc::new(store),
        backend,
        config.completion.generation_settings(),
    ))
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

pub fn run(config_path: &Path, lead: Uuid, campaign: Uuid, json: bool) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(async {
        let generator = generator(config_path).await?;
        anyhow::Ok(generator.generate(lead, campaign, None).await?)
    })?;

    if json {
        print_json(&outcome)?;
    } else {
        print_variants(&outcome.messages);
        if outcome.message_id.is_none() {
            eprintln!("warning: messages were not saved");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// trigger
// ---------------------------------------------------------------------------

pub fn run_trigger(config_path: &Path, lead: Uuid, stage: Uuid, json: bool) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async {
        let generator = generator(config_path).await?;
        anyhow::Ok(generator.auto_trigger(lead, stage).await?)
    })?;

    match (&report, json) {
        (TriggerReport::NoMatchingCampaigns, true) => print_json(&serde_json::json!({
            "campaignsProcessed": 0,
            "results": [],
        }))?,
        (TriggerReport::NoMatchingCampaigns, false) => {
            println!("No active campaign triggers on this stage.")
        }
        (TriggerReport::Processed(results), true) => print_json(&serde_json::json!({
            "campaignsProcessed": results.len(),
            "results": results,
        }))?,
        (TriggerReport::Processed(results), false) => {
            let rows = results
                .iter()
                .map(|r| {
                    vec![
                        r.campaign_id.to_string(),
                        if r.success { "ok" } else { "failed" }.to_string(),
                    ]
                })
                .collect();
            print_table(&["CAMPAIGN", "RESULT"], rows);
        }
    }
    Ok(())
}
