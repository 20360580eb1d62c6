//! Prompt construction for message generation.
//!
//! Manual generation and the stage auto-trigger both go through
//! [`build_prompt`], so a campaign produces the same prompt for the same lead
//! regardless of how generation was started.

use serde_json::{Map, Value};

use crate::campaign::Campaign;
use crate::lead::{is_value_filled, Lead};
use crate::types::StandardField;

/// Placeholder for standard lead values that are empty.
pub const NOT_INFORMED: &str = "Não informado";

pub const SYSTEM_PROMPT: &str = "Você é um assistente especializado em criar mensagens de vendas personalizadas. Sempre retorne apenas JSON válido.";

/// Prompt-facing keys of the standard lead fields, in the order they appear
/// in the lead data block.
const LEAD_DATA_KEYS: &[(&str, StandardField)] = &[
    ("email", StandardField::Email),
    ("telefone", StandardField::Phone),
    ("empresa", StandardField::Company),
    ("cargo", StandardField::Position),
    ("origem", StandardField::Source),
];

/// Flat lead description handed to the model.
///
/// Standard values fall back to [`NOT_INFORMED`]. Non-empty `custom_data`
/// entries are appended afterwards in their stored order and may overwrite a
/// standard key of the same name.
pub fn lead_data(lead: &Lead, stage_name: Option<&str>) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("nome".into(), Value::String(lead.name.clone()));
    for (key, field) in LEAD_DATA_KEYS {
        data.insert((*key).into(), Value::String(or_not_informed(lead.standard_value(*field))));
    }
    data.insert("etapa".into(), Value::String(or_not_informed(stage_name)));

    for (key, value) in &lead.custom_data {
        if is_value_filled(value) {
            data.insert(key.clone(), value.clone());
        }
    }
    data
}

fn or_not_informed(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_INFORMED.to_string(),
    }
}

/// Fill the generation template with the campaign's context and writing
/// instructions and the pretty-printed lead data.
pub fn build_prompt(lead_data: &Map<String, Value>, campaign: &Campaign) -> String {
    let data = serde_json::to_string_pretty(lead_data).unwrap_or_else(|_| "{}".to_string());
    format!(
        r#"
Você é um assistente de vendas especializado em criar mensagens personalizadas.

CONTEXTO DA CAMPANHA:
{context}

INSTRUÇÕES DE ESCRITA:
{instructions}

DADOS DO LEAD:
{data}

TAREFA:
Gere 3 variações de mensagem personalizada para este lead, considerando:
- O contexto da campanha
- As instruções de escrita fornecidas
- Os dados específicos do lead

FORMATO DE RESPOSTA:
Retorne um JSON com um array chamado "messages" contendo as 3 variações:
{{
  "messages": [
    "Primeira variação da mensagem...",
    "Segunda variação da mensagem...",
    "Terceira variação da mensagem..."
  ]
}}
"#,
        context = campaign.context,
        instructions = campaign.prompt,
    )
}
