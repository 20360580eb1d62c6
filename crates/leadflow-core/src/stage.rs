use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LeadflowError, Result};
use crate::types::{CustomFieldType, StandardField};

// ---------------------------------------------------------------------------
// FunnelStage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub order: i32,
    /// Field names (standard keys or custom field names) that must be filled
    /// on a lead before it may occupy this stage.
    #[serde(default)]
    pub required_fields: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl FunnelStage {
    pub fn new(workspace_id: Uuid, name: impl Into<String>, order: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            name: name.into(),
            order,
            required_fields: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_required(mut self, fields: &[&str]) -> Self {
        self.required_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }
}

// ---------------------------------------------------------------------------
// CustomField
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub field_type: CustomFieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

impl CustomField {
    pub fn new(workspace_id: Uuid, name: impl Into<String>, field_type: CustomFieldType) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            name: name.into(),
            field_type,
            options: None,
            created_at: Utc::now(),
        }
    }

    pub fn select(workspace_id: Uuid, name: impl Into<String>, options: Vec<String>) -> Self {
        let mut field = Self::new(workspace_id, name, CustomFieldType::Select);
        field.options = Some(options);
        field
    }
}

/// Normalise a requested `required_fields` list: trim, drop blanks and
/// duplicates, and reject names that are neither standard fields nor custom
/// fields of the workspace.
pub fn normalize_required_fields(
    requested: &[String],
    custom_fields: &[CustomField],
) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(requested.len());
    for raw in requested {
        let name = raw.trim();
        if name.is_empty() || out.iter().any(|f| f == name) {
            continue;
        }
        let known = StandardField::from_key(name).is_some()
            || custom_fields.iter().any(|c| c.name == name);
        if !known {
            return Err(LeadflowError::UnknownField(name.to_string()));
        }
        out.push(name.to_string());
    }
    Ok(out)
}

/// Sort stages into board order: `order`, then creation time.
pub fn sort_stages(stages: &mut [FunnelStage]) {
    stages.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_accepts_standard_and_custom() {
        let ws = Uuid::new_v4();
        let custom = vec![CustomField::new(ws, "Orçamento", CustomFieldType::Number)];
        let fields = normalize_required_fields(
            &[
                " email ".to_string(),
                "Orçamento".to_string(),
                "email".to_string(),
                "".to_string(),
            ],
            &custom,
        )
        .unwrap();
        assert_eq!(fields, vec!["email", "Orçamento"]);
    }

    #[test]
    fn normalize_rejects_unknown_names() {
        let err = normalize_required_fields(&["cpf".to_string()], &[]).unwrap_err();
        assert!(matches!(err, LeadflowError::UnknownField(ref f) if f == "cpf"));
    }

    #[test]
    fn stages_sort_by_order() {
        let ws = Uuid::new_v4();
        let mut stages = vec![
            FunnelStage::new(ws, "Fechado", 3),
            FunnelStage::new(ws, "Novo", 1),
            FunnelStage::new(ws, "Proposta", 2),
        ];
        sort_stages(&mut stages);
        let names: Vec<_> = stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Novo", "Proposta", "Fechado"]);
    }
}
