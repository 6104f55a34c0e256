// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The flat wire format.
//!
//! A [`WireGraph`] lists root serials and one [`WireNode`] record per model.
//! Attribute values are JSON with a structurally unambiguous encoding:
//!
//! | [`Value`]   | JSON                      |
//! |-------------|---------------------------|
//! | `Null`      | `null`                    |
//! | `Bool`      | `true` / `false`          |
//! | `Int`       | integer number            |
//! | `Float`     | number with a fraction    |
//! | `String`    | string                    |
//! | `Ref(id)`   | `{"ref": serial}`         |
//! | `Seq`       | array                     |
//! | `Map`       | `{"map": {key: value}}`   |
//!
//! No other object shapes are valid, so a decoder never has to guess whether
//! an object is a reference or a mapping.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number};

use crate::error::{Error, Result};
use crate::id::ModelId;
use crate::value::Value;

const REF_KEY: &str = "ref";
const MAP_KEY: &str = "map";

/// A serialized document graph.
///
/// # Example
///
/// ```rust
/// use understory_model::WireGraph;
///
/// let graph = WireGraph::from_json(
///     r#"{"roots":[1],"nodes":[{"id":1,"type":"Title","attributes":{"text":"Rates"}}]}"#,
/// )
/// .unwrap();
/// assert_eq!(graph.roots, [1]);
/// assert_eq!(graph.node(1).unwrap().type_name, "Title");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WireGraph {
    /// Root serials, in root order.
    pub roots: Vec<u64>,
    /// One record per node, in discovery order.
    pub nodes: Vec<WireNode>,
}

impl WireGraph {
    /// Returns the record with the given serial.
    #[must_use]
    pub fn node(&self, id: u64) -> Option<&WireNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Encodes the graph as compact JSON text.
    ///
    /// # Errors
    ///
    /// [`Error::Malformed`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(malformed)
    }

    /// Decodes a graph from JSON text.
    ///
    /// Only the envelope is checked here; attribute values are decoded by
    /// [`GraphDeserializer`](crate::GraphDeserializer).
    ///
    /// # Errors
    ///
    /// [`Error::Malformed`] if the text is not a wire graph.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(malformed)
    }
}

/// One model record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    /// The model's serial.
    pub id: u64,
    /// The registered type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Encoded attribute values, by property name.
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

pub(crate) fn malformed(err: serde_json::Error) -> Error {
    Error::Malformed(err.to_string())
}

/// Encodes a value.
///
/// Non-finite floats, which no float constraint admits, encode as `null`.
#[must_use]
pub fn encode_value(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::Number((*i).into()),
        Value::Float(x) => Number::from_f64(*x).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.clone()),
        Value::Ref(id) => {
            let mut object = Map::new();
            object.insert(REF_KEY.into(), Json::Number(id.serial().into()));
            Json::Object(object)
        }
        Value::Seq(items) => Json::Array(items.iter().map(encode_value).collect()),
        Value::Map(entries) => {
            let inner = entries
                .iter()
                .map(|(key, item)| (key.clone(), encode_value(item)))
                .collect();
            let mut object = Map::new();
            object.insert(MAP_KEY.into(), Json::Object(inner));
            Json::Object(object)
        }
    }
}

/// Why an attribute failed to decode.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DecodeError {
    Malformed(String),
    Dangling(u64),
}

impl DecodeError {
    /// Attaches the record and attribute the error was found in.
    pub(crate) fn at(self, node: u64, property: &str) -> Error {
        match self {
            Self::Malformed(reason) => {
                Error::Malformed(format!("node {node} attribute `{property}`: {reason}"))
            }
            Self::Dangling(target) => Error::DanglingReference {
                from: format!("node {node} (`{property}`)"),
                target,
            },
        }
    }
}

/// Decodes a value, resolving reference serials through `resolve`.
pub(crate) fn decode_value(
    json: &serde_json::Value,
    resolve: &mut dyn FnMut(u64) -> Option<ModelId>,
) -> Result<Value, DecodeError> {
    use serde_json::Value as Json;
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if n.is_f64() {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            } else {
                return Err(DecodeError::Malformed(format!("integer {n} out of range")));
            }
        }
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Seq(
            items
                .iter()
                .map(|item| decode_value(item, resolve))
                .collect::<Result<_, DecodeError>>()?,
        ),
        Json::Object(object) => match single_entry(object) {
            Some((REF_KEY, target)) => {
                let serial = target.as_u64().ok_or_else(|| {
                    DecodeError::Malformed(format!("reference target {target} is not a serial"))
                })?;
                Value::Ref(resolve(serial).ok_or(DecodeError::Dangling(serial))?)
            }
            Some((MAP_KEY, Json::Object(entries))) => Value::Map(
                entries
                    .iter()
                    .map(|(key, item)| Ok((key.clone(), decode_value(item, resolve)?)))
                    .collect::<Result<_, DecodeError>>()?,
            ),
            _ => {
                return Err(DecodeError::Malformed(format!(
                    "expected {{\"ref\": id}} or {{\"map\": {{..}}}}, found {json}"
                )));
            }
        },
    })
}

fn single_entry(object: &Map<String, serde_json::Value>) -> Option<(&str, &serde_json::Value)> {
    let mut entries = object.iter();
    match (entries.next(), entries.next()) {
        (Some((key, value)), None) => Some((key.as_str(), value)),
        _ => None,
    }
}

/// Returns `true` if an encoded value holds a reference wrapper.
pub(crate) fn has_refs(json: &serde_json::Value) -> bool {
    use serde_json::Value as Json;
    match json {
        Json::Array(items) => items.iter().any(has_refs),
        Json::Object(object) => {
            object.contains_key(REF_KEY) || object.values().any(has_refs)
        }
        _ => false,
    }
}
