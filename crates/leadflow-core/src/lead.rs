use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::StandardField;

// ---------------------------------------------------------------------------
// Lead
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub stage_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
    /// Values of workspace custom fields, keyed by custom field name.
    #[serde(default)]
    pub custom_data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(workspace_id: Uuid, stage_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            stage_id,
            name: name.into(),
            email: None,
            phone: None,
            company: None,
            position: None,
            source: None,
            notes: None,
            assigned_to: None,
            custom_data: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn standard_value(&self, field: StandardField) -> Option<&str> {
        match field {
            StandardField::Name => Some(self.name.as_str()),
            StandardField::Email => self.email.as_deref(),
            StandardField::Phone => self.phone.as_deref(),
            StandardField::Company => self.company.as_deref(),
            StandardField::Position => self.position.as_deref(),
            StandardField::Source => self.source.as_deref(),
            StandardField::Notes => self.notes.as_deref(),
        }
    }

    fn standard_slot(&mut self, field: StandardField) -> Option<&mut Option<String>> {
        match field {
            StandardField::Name => None,
            StandardField::Email => Some(&mut self.email),
            StandardField::Phone => Some(&mut self.phone),
            StandardField::Company => Some(&mut self.company),
            StandardField::Position => Some(&mut self.position),
            StandardField::Source => Some(&mut self.source),
            StandardField::Notes => Some(&mut self.notes),
        }
    }

    /// Whether the field called `name` holds a value. Standard field names
    /// resolve against the lead's columns, anything else against
    /// `custom_data`.
    pub fn is_field_filled(&self, name: &str) -> bool {
        match StandardField::from_key(name) {
            Some(field) => self.standard_value(field).is_some_and(|v| !v.trim().is_empty()),
            None => self.custom_data.get(name).is_some_and(is_value_filled),
        }
    }

    /// Apply a partial update. Returns the names of the fields that changed.
    pub fn apply(&mut self, patch: LeadPatch) -> Vec<String> {
        let mut changed = Vec::new();

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name != self.name {
                self.name = name;
                changed.push(StandardField::Name.key().to_string());
            }
        }

        let optional = [
            (StandardField::Email, patch.email),
            (StandardField::Phone, patch.phone),
            (StandardField::Company, patch.company),
            (StandardField::Position, patch.position),
            (StandardField::Source, patch.source),
            (StandardField::Notes, patch.notes),
        ];
        for (field, value) in optional {
            let Some(value) = value else { continue };
            let value = normalize_text(Some(value));
            if let Some(slot) = self.standard_slot(field) {
                if *slot != value {
                    *slot = value;
                    changed.push(field.key().to_string());
                }
            }
        }

        if let Some(assigned_to) = patch.assigned_to {
            if self.assigned_to != Some(assigned_to) {
                self.assigned_to = Some(assigned_to);
                changed.push("assigned_to".to_string());
            }
        }

        if let Some(custom) = patch.custom_data {
            for (key, value) in custom {
                if value.is_null() {
                    if self.custom_data.remove(&key).is_some() {
                        changed.push(key);
                    }
                } else if self.custom_data.get(&key) != Some(&value) {
                    self.custom_data.insert(key.clone(), value);
                    changed.push(key);
                }
            }
        }

        if !changed.is_empty() {
            self.updated_at = Utc::now();
        }
        changed
    }
}

/// Empty means null or a string that is blank after trimming. Numbers,
/// booleans, arrays and objects always count as filled.
pub fn is_value_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Trim a text input and collapse blanks to `None`.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Payload for creating a lead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLead {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub stage_id: Option<Uuid>,
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
    #[serde(default)]
    pub custom_data: Map<String, Value>,
}

impl NewLead {
    pub fn into_lead(self, workspace_id: Uuid, stage_id: Uuid) -> Lead {
        let mut lead = Lead::new(workspace_id, stage_id, self.name.trim());
        lead.email = normalize_text(self.email);
        lead.phone = normalize_text(self.phone);
        lead.company = normalize_text(self.company);
        lead.position = normalize_text(self.position);
        lead.source = normalize_text(self.source);
        lead.notes = normalize_text(self.notes);
        lead.assigned_to = self.assigned_to;
        lead.custom_data = self
            .custom_data
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .collect();
        lead
    }
}

/// Partial update. `None` leaves a field untouched; an empty string clears an
/// optional text field; a JSON null in `custom_data` removes that key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
    #[serde(default)]
    pub custom_data: Option<Map<String, Value>>,
}
