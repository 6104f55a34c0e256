// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property values.
//!
//! This module provides [`Value`], the closed set of shapes a property can
//! hold: primitives, references to other models, and containers of either.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::id::ModelId;

/// A property value.
///
/// References are stored as [`ModelId`]s, never as owned nodes; resolving a
/// reference is always a lookup in the owning [`Document`](crate::Document).
/// Mapping keys are kept sorted so that equal maps iterate (and serialize) in
/// the same order.
///
/// # Example
///
/// ```rust
/// use understory_model::Value;
///
/// let alpha = Value::from(0.7);
/// assert_eq!(alpha.as_f64(), Some(0.7));
///
/// let xs = Value::from(vec![Value::from(1), Value::from(2)]);
/// assert_eq!(xs.as_seq().map(<[Value]>::len), Some(2));
/// assert!(!xs.contains_refs());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// The absence of a value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A finite float.
    Float(f64),
    /// A string.
    String(String),
    /// A reference to another model in the same document.
    Ref(ModelId),
    /// An ordered sequence.
    Seq(Vec<Value>),
    /// A string-keyed mapping.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the boolean, if this is a [`Value::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, if this is a [`Value::Int`].
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns a numeric value as `f64`, accepting both floats and integers.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the string, if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the referenced model, if this is a [`Value::Ref`].
    #[must_use]
    pub fn as_model(&self) -> Option<ModelId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the items, if this is a [`Value::Seq`].
    #[must_use]
    pub fn as_seq(&self) -> Option<&[Self]> {
        match self {
            Self::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries, if this is a [`Value::Map`].
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// A short name for the variant, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Ref(_) => "reference",
            Self::Seq(_) => "sequence",
            Self::Map(_) => "map",
        }
    }

    /// Calls `f` for every reference in this value, depth-first, in sequence
    /// order and then sorted key order.
    pub fn for_each_ref(&self, f: &mut impl FnMut(ModelId)) {
        match self {
            Self::Ref(id) => f(*id),
            Self::Seq(items) => items.iter().for_each(|item| item.for_each_ref(f)),
            Self::Map(entries) => entries.values().for_each(|item| item.for_each_ref(f)),
            _ => {}
        }
    }

    /// Like [`for_each_ref`](Self::for_each_ref), stopping at the first error.
    pub fn try_for_each_ref<E>(
        &self,
        f: &mut impl FnMut(ModelId) -> Result<(), E>,
    ) -> Result<(), E> {
        match self {
            Self::Ref(id) => f(*id),
            Self::Seq(items) => items.iter().try_for_each(|item| item.try_for_each_ref(f)),
            Self::Map(entries) => entries
                .values()
                .try_for_each(|item| item.try_for_each_ref(f)),
            _ => Ok(()),
        }
    }

    /// Returns `true` if this value holds at least one reference.
    #[must_use]
    pub fn contains_refs(&self) -> bool {
        match self {
            Self::Ref(_) => true,
            Self::Seq(items) => items.iter().any(Self::contains_refs),
            Self::Map(entries) => entries.values().any(Self::contains_refs),
            _ => false,
        }
    }

    /// Collects every reference in this value.
    #[must_use]
    pub fn refs(&self) -> Vec<ModelId> {
        let mut out = Vec::new();
        self.for_each_ref(&mut |id| out.push(id));
        out
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Ref(id) => write!(f, "ref({id})"),
            Self::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<ModelId> for Value {
    fn from(value: ModelId) -> Self {
        Self::Ref(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::Seq(value)
    }
}

impl From<BTreeMap<String, Self>> for Value {
    fn from(value: BTreeMap<String, Self>) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::Seq(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::DocumentId;
    use alloc::{format, vec};

    #[test]
    fn conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(3_i32), Value::Int(3));
        assert_eq!(Value::from("x"), Value::String("x".into()));
        assert_eq!(Value::from(None::<f64>), Value::Null);
        assert_eq!(Value::from(Some(1.5)), Value::Float(1.5));
        assert_eq!(
            [1_i64, 2].into_iter().collect::<Value>(),
            Value::Seq(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn numeric_reads_widen_ints() {
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
        assert_eq!(Value::Float(2.5).as_i64(), None);
        assert_eq!(Value::String("2".into()).as_f64(), None);
    }

    #[test]
    fn refs_are_found_in_nested_containers() {
        let doc = DocumentId::next();
        let a = ModelId::new(doc, 1);
        let b = ModelId::new(doc, 2);

        let mut map = BTreeMap::new();
        map.insert("transform".into(), Value::Ref(b));
        map.insert("field".into(), Value::from("rate"));
        let value = Value::Seq(vec![Value::Ref(a), Value::Map(map), Value::Int(4)]);

        assert!(value.contains_refs());
        assert_eq!(value.refs(), vec![a, b]);
        assert!(!Value::from(vec![Value::Null]).contains_refs());
    }

    #[test]
    fn try_for_each_ref_stops_early() {
        let doc = DocumentId::next();
        let value: Value = [ModelId::new(doc, 1), ModelId::new(doc, 2)]
            .into_iter()
            .collect();

        let mut seen = 0;
        let result = value.try_for_each_ref(&mut |_| {
            seen += 1;
            Err(())
        });
        assert_eq!(result, Err(()));
        assert_eq!(seen, 1);
    }

    #[test]
    fn display() {
        let doc = DocumentId::next();
        let mut map = BTreeMap::new();
        map.insert("k".into(), Value::Ref(ModelId::new(doc, 9)));
        let value = Value::Seq(vec![Value::Float(1.7), Value::from("a"), Value::Map(map)]);
        assert_eq!(format!("{value}"), r#"[1.7, "a", {"k": ref(m9)}]"#);
    }
}
