use std::path::Path;

use leadflow_core::campaign::NewCampaign;
use leadflow_core::lead::NewLead;
use leadflow_core::prompt::{build_prompt, lead_data, SYSTEM_PROMPT};
use uuid::Uuid;

use super::read_json;
use crate::output::print_json;

pub fn run(
    lead_path: &Path,
    campaign_path: &Path,
    stage_name: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let lead: NewLead = read_json(lead_path)?;
    let campaign: NewCampaign = read_json(campaign_path)?;
    campaign.validate()?;

    let lead = lead.into_lead(Uuid::nil(), Uuid::nil());
    let campaign = campaign.into_campaign(Uuid::nil());
    let prompt = build_prompt(&lead_data(&lead, stage_name), &campaign);

    if json {
        print_json(&serde_json::json!({
            "system": SYSTEM_PROMPT,
            "user": prompt,
        }))?;
    } else {
        println!("{prompt}");
    }
    Ok(())
}
