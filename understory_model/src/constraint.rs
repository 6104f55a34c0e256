// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value constraints.
//!
//! This module provides [`Constraint`], the closed set of checks a property
//! applies to every value written to it.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::id::{ModelId, TypeKey};
use crate::registry::TypeRegistry;
use crate::value::Value;

/// Resolves the type of a referenced model while checking a value.
pub(crate) trait ModelLookup {
    /// Returns the type of `id`, or `None` if it does not resolve.
    fn type_of(&self, id: ModelId) -> Option<TypeKey>;
}

/// A lookup in which no model resolves; used for defaults.
pub(crate) struct NoModels;

impl ModelLookup for NoModels {
    fn type_of(&self, _id: ModelId) -> Option<TypeKey> {
        None
    }
}

/// The allowed values of a property.
///
/// Constraints are resolved when a type is registered and checked on every
/// write, so a property can never hold a value its constraint rejects.
///
/// Numeric bounds are inclusive. Floats must be finite. Integers written to a
/// float property are widened on the way in (see [`coerce`](Self::coerce)).
///
/// # Example
///
/// ```rust
/// use understory_model::Constraint;
///
/// let alpha = Constraint::float_range(0.0, 1.0);
/// assert_eq!(alpha.to_string(), "float in [0, 1]");
///
/// let side = Constraint::enumeration(["left", "right", "above", "below"]);
/// assert_eq!(side.to_string(), r#"one of ["left", "right", "above", "below"]"#);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    /// Any value, including references.
    Any,
    /// A boolean.
    Bool,
    /// An integer within optional inclusive bounds.
    Int {
        /// Lower bound.
        min: Option<i64>,
        /// Upper bound.
        max: Option<i64>,
    },
    /// A finite float within optional inclusive bounds.
    Float {
        /// Lower bound.
        min: Option<f64>,
        /// Upper bound.
        max: Option<f64>,
    },
    /// A string.
    String,
    /// One of a fixed set of strings.
    Enum(Vec<String>),
    /// A reference to a model whose type is the named type or one of its
    /// subtypes. `None` accepts any model.
    Ref(Option<String>),
    /// A sequence whose items satisfy the inner constraint.
    Seq(Box<Self>),
    /// A string-keyed map whose values satisfy the inner constraint.
    Map(Box<Self>),
    /// `null`, or a value satisfying the inner constraint.
    Nullable(Box<Self>),
    /// A value satisfying at least one alternative.
    Union(Vec<Self>),
}

impl Constraint {
    /// Any integer.
    #[must_use]
    pub const fn int() -> Self {
        Self::Int {
            min: None,
            max: None,
        }
    }

    /// An integer in `[min, max]`.
    #[must_use]
    pub const fn int_range(min: i64, max: i64) -> Self {
        Self::Int {
            min: Some(min),
            max: Some(max),
        }
    }

    /// An integer no smaller than `min`.
    #[must_use]
    pub const fn int_at_least(min: i64) -> Self {
        Self::Int {
            min: Some(min),
            max: None,
        }
    }

    /// Any finite float.
    #[must_use]
    pub const fn float() -> Self {
        Self::Float {
            min: None,
            max: None,
        }
    }

    /// A finite float in `[min, max]`.
    #[must_use]
    pub const fn float_range(min: f64, max: f64) -> Self {
        Self::Float {
            min: Some(min),
            max: Some(max),
        }
    }

    /// A finite float no smaller than `min`.
    #[must_use]
    pub const fn float_at_least(min: f64) -> Self {
        Self::Float {
            min: Some(min),
            max: None,
        }
    }

    /// One of the given strings.
    #[must_use]
    pub fn enumeration<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(variants.into_iter().map(Into::into).collect())
    }

    /// A reference to an instance of `base` or one of its subtypes.
    #[must_use]
    pub fn instance(base: impl Into<String>) -> Self {
        Self::Ref(Some(base.into()))
    }

    /// A reference to any model.
    #[must_use]
    pub const fn any_instance() -> Self {
        Self::Ref(None)
    }

    /// A sequence of `item`.
    #[must_use]
    pub fn seq_of(item: Self) -> Self {
        Self::Seq(Box::new(item))
    }

    /// A string-keyed map of `value`.
    #[must_use]
    pub fn map_of(value: Self) -> Self {
        Self::Map(Box::new(value))
    }

    /// `null` or `inner`.
    #[must_use]
    pub fn nullable(inner: Self) -> Self {
        Self::Nullable(Box::new(inner))
    }

    /// Any of `alternatives`.
    #[must_use]
    pub fn union(alternatives: impl IntoIterator<Item = Self>) -> Self {
        Self::Union(alternatives.into_iter().collect())
    }

    /// Returns `true` if `null` satisfies this constraint.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Any | Self::Nullable(_) => true,
            Self::Union(alternatives) => alternatives.iter().any(Self::is_nullable),
            _ => false,
        }
    }

    /// The value a property gets when its spec names no default.
    ///
    /// Returns `None` for non-nullable references, which have no sensible
    /// default and must be set explicitly.
    #[must_use]
    pub fn natural_default(&self) -> Option<Value> {
        match self {
            Self::Any | Self::Nullable(_) => Some(Value::Null),
            Self::Bool => Some(Value::Bool(false)),
            Self::Int { min, max } => {
                let zero = min.map_or(0, |min| min.max(0));
                Some(Value::Int(max.map_or(zero, |max| zero.min(max))))
            }
            Self::Float { min, max } => {
                let zero = min.map_or(0.0, |min| min.max(0.0));
                Some(Value::Float(max.map_or(zero, |max| zero.min(max))))
            }
            Self::String => Some(Value::String(String::new())),
            Self::Enum(variants) => variants.first().cloned().map(Value::String),
            Self::Ref(_) => None,
            Self::Seq(_) => Some(Value::Seq(Vec::new())),
            Self::Map(_) => Some(Value::Map(BTreeMap::new())),
            Self::Union(alternatives) => alternatives.iter().find_map(Self::natural_default),
        }
    }

    /// Normalizes a value before it is checked.
    ///
    /// Integers become floats where a float is expected, recursively through
    /// sequences, maps, nullable wrappers and unions. A union keeps an integer
    /// that one of its alternatives takes as is; otherwise the first
    /// alternative that changes the value decides. Everything else is
    /// returned unchanged.
    #[must_use]
    pub fn coerce(&self, value: Value) -> Value {
        match (self, value) {
            (Self::Float { .. }, Value::Int(i)) => Value::Float(i as f64),
            (Self::Nullable(inner), value) if !value.is_null() => inner.coerce(value),
            (Self::Seq(item), Value::Seq(items)) => {
                Value::Seq(items.into_iter().map(|v| item.coerce(v)).collect())
            }
            (Self::Map(item), Value::Map(entries)) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, item.coerce(v)))
                    .collect(),
            ),
            (Self::Union(alternatives), Value::Int(i))
                if alternatives.iter().any(|alt| alt.admits_int(i)) =>
            {
                Value::Int(i)
            }
            (Self::Union(alternatives), value) => {
                let widened = alternatives
                    .iter()
                    .map(|alt| alt.coerce(value.clone()))
                    .find(|coerced| *coerced != value);
                widened.unwrap_or(value)
            }
            (_, value) => value,
        }
    }

    fn admits_int(&self, i: i64) -> bool {
        match self {
            Self::Any => true,
            Self::Int { min, max } => {
                min.is_none_or(|min| i >= min) && max.is_none_or(|max| i <= max)
            }
            Self::Nullable(inner) => inner.admits_int(i),
            Self::Union(alternatives) => alternatives.iter().any(|alt| alt.admits_int(i)),
            _ => false,
        }
    }

    /// Checks `value`, resolving references through `models`.
    pub(crate) fn check(
        &self,
        value: &Value,
        registry: &TypeRegistry,
        models: &dyn ModelLookup,
    ) -> bool {
        match (self, value) {
            (Self::Any, _) => true,
            (Self::Bool, Value::Bool(_)) => true,
            (Self::Int { min, max }, Value::Int(i)) => {
                min.is_none_or(|min| *i >= min) && max.is_none_or(|max| *i <= max)
            }
            (Self::Float { min, max }, Value::Float(x)) => {
                x.is_finite()
                    && min.is_none_or(|min| *x >= min)
                    && max.is_none_or(|max| *x <= max)
            }
            (Self::String, Value::String(_)) => true,
            (Self::Enum(variants), Value::String(s)) => variants.iter().any(|v| v == s),
            (Self::Ref(base), Value::Ref(id)) => {
                let Some(ty) = models.type_of(*id) else {
                    return false;
                };
                match base {
                    None => true,
                    Some(base) => registry
                        .by_name(base)
                        .is_some_and(|base| registry.is_subtype(ty, base)),
                }
            }
            (Self::Seq(item), Value::Seq(items)) => {
                items.iter().all(|v| item.check(v, registry, models))
            }
            (Self::Map(item), Value::Map(entries)) => {
                entries.values().all(|v| item.check(v, registry, models))
            }
            (Self::Nullable(_), Value::Null) => true,
            (Self::Nullable(inner), value) => inner.check(value, registry, models),
            (Self::Union(alternatives), value) => {
                alternatives.iter().any(|c| c.check(value, registry, models))
            }
            _ => false,
        }
    }
}

fn write_bounds<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    min: Option<&T>,
    max: Option<&T>,
) -> fmt::Result {
    match (min, max) {
        (Some(min), Some(max)) => write!(f, "{kind} in [{min}, {max}]"),
        (Some(min), None) => write!(f, "{kind} >= {min}"),
        (None, Some(max)) => write!(f, "{kind} <= {max}"),
        (None, None) => f.write_str(kind),
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any value"),
            Self::Bool => f.write_str("bool"),
            Self::Int { min, max } => write_bounds(f, "int", min.as_ref(), max.as_ref()),
            Self::Float { min, max } => write_bounds(f, "float", min.as_ref(), max.as_ref()),
            Self::String => f.write_str("string"),
            Self::Enum(variants) => write!(f, "one of {variants:?}"),
            Self::Ref(Some(base)) => write!(f, "instance of {base}"),
            Self::Ref(None) => f.write_str("instance of any model"),
            Self::Seq(item) => write!(f, "sequence of {item}"),
            Self::Map(item) => write!(f, "map of string to {item}"),
            Self::Nullable(inner) => write!(f, "{inner} or null"),
            Self::Union(alternatives) => {
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{alternative}")?;
                }
                Ok(())
            }
        }
    }
}
