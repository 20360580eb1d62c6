//! Lenient interpretation of model output.
//!
//! Models asked for `{"messages": [...]}` do not always comply. The parser
//! accepts the structured shape when present, falls back to taking lines of
//! free text, and otherwise yields a placeholder that callers can tell apart
//! from real content.

use serde_json::Value;

/// Shown to the user when the model produced nothing usable.
pub const PLACEHOLDER_MESSAGE: &str = "Erro ao gerar mensagem. Tente novamente.";

/// Number of variants requested from the model.
pub const VARIANT_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedMessages {
    /// The output was a JSON object with a `messages` array.
    Structured(Vec<String>),
    /// The output was free text; these are its first non-blank lines.
    FallbackLines(Vec<String>),
    /// Nothing usable.
    Placeholder,
}

impl ParsedMessages {
    pub fn is_usable(&self) -> bool {
        !matches!(self, ParsedMessages::Placeholder)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ParsedMessages::Structured(_) => "structured",
            ParsedMessages::FallbackLines(_) => "fallback_lines",
            ParsedMessages::Placeholder => "placeholder",
        }
    }

    /// The messages to store and return. A placeholder becomes the single
    /// [`PLACEHOLDER_MESSAGE`].
    pub fn into_messages(self) -> Vec<String> {
        match self {
            ParsedMessages::Structured(m) | ParsedMessages::FallbackLines(m) => m,
            ParsedMessages::Placeholder => vec![PLACEHOLDER_MESSAGE.to_string()],
        }
    }
}

pub fn parse_completion(content: &str) -> ParsedMessages {
    if let Ok(value) = serde_json::from_str::<Value>(content) {
        return from_json(&value);
    }

    let lines: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(VARIANT_COUNT)
        .map(str::to_string)
        .collect();

    if lines.is_empty() {
        ParsedMessages::Placeholder
    } else {
        ParsedMessages::FallbackLines(lines)
    }
}

/// Valid JSON never falls back to lines: without a usable `messages` array
/// it is a placeholder.
fn from_json(value: &Value) -> ParsedMessages {
    let messages: Vec<String> = value
        .get("messages")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .take(VARIANT_COUNT)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if messages.is_empty() {
        ParsedMessages::Placeholder
    } else {
        ParsedMessages::Structured(messages)
    }
}
