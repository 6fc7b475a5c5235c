//! Intermediate structures for the source automaton document.
//!
//! Exported automaton documents are loosely typed: coordinates sometimes
//! arrive as quoted strings, and the `initial`/`final` markers range from
//! missing to bare booleans to arbitrary non-empty payloads. These structs
//! absorb that looseness at the deserialization boundary so the builder and
//! dialect strategies work with plain fields and explicit `Option`s.

use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;

/// A parsed automaton document: states first, then transitions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutomatonDoc {
    /// State records, in document order.
    #[serde(default)]
    pub states: Vec<StateRecord>,
    /// Transition records, in document order.
    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
}

/// One state record from the source document.
#[derive(Debug, Clone, Deserialize)]
pub struct StateRecord {
    /// Document-scoped identifier, referenced by transitions.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Canvas x coordinate. Accepts numbers or numeric strings.
    #[serde(deserialize_with = "coordinate")]
    pub x: f64,
    /// Canvas y coordinate. Accepts numbers or numeric strings.
    #[serde(deserialize_with = "coordinate")]
    pub y: f64,
    /// Start-state marker; absent or falsy means not a start state.
    #[serde(default)]
    pub initial: Option<Json>,
    /// Accept-state marker; absent or falsy means not accepting.
    #[serde(default)]
    pub r#final: Option<Json>,
}

/// One transition record from the source document.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRecord {
    /// Source state id.
    pub from: String,
    /// Destination state id.
    pub to: String,
    /// Symbol read by the transition. Empty means epsilon (or blank, for
    /// Turing tapes).
    #[serde(default)]
    pub read: String,
    /// Symbol written to the tape. Turing dialect only.
    #[serde(default)]
    pub write: Option<String>,
    /// Head move code. Turing dialect only.
    #[serde(default)]
    pub r#move: Option<String>,
}

impl StateRecord {
    /// Whether the record marks a start state.
    pub fn is_initial(&self) -> bool {
        truthy(self.initial.as_ref())
    }

    /// Whether the record marks an accept state.
    pub fn is_final(&self) -> bool {
        truthy(self.r#final.as_ref())
    }
}

/// Boolean coercion for optional marker fields: absent, null, `false`, zero,
/// and the empty string are falsy; everything else present is truthy.
pub fn truthy(flag: Option<&Json>) -> bool {
    match flag {
        None | Some(Json::Null) => false,
        Some(Json::Bool(value)) => *value,
        Some(Json::Number(value)) => value.as_f64().is_some_and(|num| num != 0.0),
        Some(Json::String(text)) => !text.is_empty(),
        Some(Json::Array(_)) | Some(Json::Object(_)) => true,
    }
}

fn coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(num) => Ok(num),
        Raw::Text(text) => text.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}
