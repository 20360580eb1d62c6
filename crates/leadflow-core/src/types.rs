use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LeadflowError;

// ---------------------------------------------------------------------------
// MemberRole
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemberRole {
    type Err = LeadflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(MemberRole::Admin),
            "member" => Ok(MemberRole::Member),
            _ => Err(LeadflowError::InvalidEnum {
                kind: "papel de membro",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// CustomFieldType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomFieldType {
    Text,
    Number,
    Date,
    Select,
}

impl CustomFieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomFieldType::Text => "text",
            CustomFieldType::Number => "number",
            CustomFieldType::Date => "date",
            CustomFieldType::Select => "select",
        }
    }
}

impl fmt::Display for CustomFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CustomFieldType {
    type Err = LeadflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(CustomFieldType::Text),
            "number" => Ok(CustomFieldType::Number),
            "date" => Ok(CustomFieldType::Date),
            "select" => Ok(CustomFieldType::Select),
            _ => Err(LeadflowError::InvalidEnum {
                kind: "tipo de campo personalizado",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionType
// ---------------------------------------------------------------------------

/// Kind of entry in a lead's activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    LeadCreated,
    LeadUpdated,
    StageChanged,
    MessageGenerated,
    MessageSent,
}

impl ActionType {
    pub fn all() -> &'static [ActionType] {
        &[
            ActionType::LeadCreated,
            ActionType::LeadUpdated,
            ActionType::StageChanged,
            ActionType::MessageGenerated,
            ActionType::MessageSent,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::LeadCreated => "lead_created",
            ActionType::LeadUpdated => "lead_updated",
            ActionType::StageChanged => "stage_changed",
            ActionType::MessageGenerated => "message_generated",
            ActionType::MessageSent => "message_sent",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionType {
    type Err = LeadflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::all()
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| LeadflowError::InvalidEnum {
                kind: "tipo de ação",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// StandardField
// ---------------------------------------------------------------------------

/// Built-in lead columns that a stage may list in `required_fields`.
/// Any other name refers to a key of `Lead::custom_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardField {
    Name,
    Email,
    Phone,
    Company,
    Position,
    Source,
    Notes,
}

impl StandardField {
    pub fn all() -> &'static [StandardField] {
        &[
            StandardField::Name,
            StandardField::Email,
            StandardField::Phone,
            StandardField::Company,
            StandardField::Position,
            StandardField::Source,
            StandardField::Notes,
        ]
    }

    pub fn key(self) -> &'static str {
        match self {
            StandardField::Name => "name",
            StandardField::Email => "email",
            StandardField::Phone => "phone",
            StandardField::Company => "company",
            StandardField::Position => "position",
            StandardField::Source => "source",
            StandardField::Notes => "notes",
        }
    }

    /// Label shown to users when the field is missing.
    pub fn label(self) -> &'static str {
        match self {
            StandardField::Name => "Nome",
            StandardField::Email => "Email",
            StandardField::Phone => "Telefone",
            StandardField::Company => "Empresa",
            StandardField::Position => "Cargo",
            StandardField::Source => "Origem",
            StandardField::Notes => "Observações",
        }
    }

    pub fn from_key(key: &str) -> Option<StandardField> {
        StandardField::all().iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for StandardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Display label for a required-field name: the standard label when the name
/// is a built-in column, the name itself for custom fields.
pub fn field_label(name: &str) -> String {
    StandardField::from_key(name)
        .map(|f| f.label().to_string())
        .unwrap_or_else(|| name.to_string())
}
