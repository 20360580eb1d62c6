//! Stage-move validation and lead form checks.
//!
//! A stage lists the fields a lead must carry before it may sit in that
//! stage. The check runs against the lead as it will be persisted, so a
//! rejected move leaves nothing half-applied.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{LeadflowError, Result};
use crate::lead::{Lead, LeadPatch, NewLead};
use crate::stage::FunnelStage;
use crate::types::field_label;

/// Display labels of every required field of `stage` that `lead` leaves
/// empty, in `required_fields` order.
pub fn missing_required_fields(lead: &Lead, stage: &FunnelStage) -> Vec<String> {
    stage
        .required_fields
        .iter()
        .filter(|name| !lead.is_field_filled(name))
        .map(|name| field_label(name))
        .collect()
}

/// Reject placing `lead` in `stage` when any required field is empty.
pub fn validate_stage_move(lead: &Lead, stage: &FunnelStage) -> Result<()> {
    let fields = missing_required_fields(lead, stage);
    if fields.is_empty() {
        Ok(())
    } else {
        Err(LeadflowError::MissingRequiredFields {
            stage: stage.name.clone(),
            fields,
        })
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

fn check_email(email: Option<&str>) -> Result<()> {
    match email.map(str::trim) {
        Some(e) if !e.is_empty() && !is_valid_email(e) => {
            Err(LeadflowError::InvalidLead("Email inválido".into()))
        }
        _ => Ok(()),
    }
}

/// Form-level checks for a new lead: a name, a well-formed email when one is
/// given, and a stage.
pub fn validate_new_lead(input: &NewLead) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(LeadflowError::InvalidLead("Nome é obrigatório".into()));
    }
    check_email(input.email.as_deref())?;
    if input.stage_id.is_none() {
        return Err(LeadflowError::InvalidLead("Etapa é obrigatória".into()));
    }
    Ok(())
}

pub fn validate_lead_patch(patch: &LeadPatch) -> Result<()> {
    if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(LeadflowError::InvalidLead("Nome é obrigatório".into()));
    }
    check_email(patch.email.as_deref())
}
