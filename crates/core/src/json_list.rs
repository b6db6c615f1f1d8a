//! Lenient parsing of JSON arrays stored in TEXT columns.
//!
//! Stored lists (schedule preferences, pay-on-session numbers) are parsed
//! entry by entry: entries that fail validation are dropped and counted, so
//! a caller can tell "legitimately empty" from "corrupted".

use serde::Serialize;
use serde_json::Value;

/// Why a stored list could not be read at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonListError {
    #[error("Malformed JSON: {0}")]
    Syntax(String),

    #[error("Expected a JSON array, found {0}")]
    NotAnArray(&'static str),
}

/// Outcome of a lenient parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedList<T> {
    /// Entries that passed validation, in input order.
    pub items: Vec<T>,
    /// Number of entries discarded as malformed.
    pub dropped: usize,
}

impl<T> ParsedList<T> {
    /// `true` when every entry survived validation.
    pub fn is_clean(&self) -> bool {
        self.dropped == 0
    }
}

/// Parse `json` as an array and keep the entries `accept` maps to `Some`.
pub fn parse_json_list<T>(
    json: &str,
    accept: impl Fn(&Value) -> Option<T>,
) -> Result<ParsedList<T>, JsonListError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| JsonListError::Syntax(e.to_string()))?;

    let Value::Array(entries) = value else {
        return Err(JsonListError::NotAnArray(kind_of(&value)));
    };

    let total = entries.len();
    let items: Vec<T> = entries.iter().filter_map(accept).collect();
    Ok(ParsedList {
        dropped: total - items.len(),
        items,
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
