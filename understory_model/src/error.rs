// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::constraint::Constraint;
use crate::id::{DocumentId, ModelId};
use crate::value::Value;

/// Convenience alias for results in this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised by registration, mutation, (de)serialization and patching.
///
/// Every operation that fails leaves the registry or document as it was.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// A type with this name is already registered.
    #[error("type `{0}` is already registered")]
    DuplicateType(String),

    /// No type with this name is registered.
    #[error("unknown model type `{0}`")]
    UnknownType(String),

    /// The type is abstract and cannot be instantiated.
    #[error("cannot instantiate abstract type `{0}`")]
    AbstractType(String),

    /// A property name appears twice in one type's flattened property list.
    #[error("property `{property}` is declared more than once on `{type_name}`")]
    DuplicateProperty {
        /// The type being registered.
        type_name: String,
        /// The repeated property.
        property: String,
    },

    /// The model's type has no property with this name.
    #[error("`{type_name}` has no property `{property}`")]
    UnknownProperty {
        /// The model's type.
        type_name: String,
        /// The requested property.
        property: String,
    },

    /// A value was rejected by a property's constraint.
    #[error(transparent)]
    InvalidValue(#[from] InvalidValueError),

    /// The model belongs to a different document.
    #[error("model {model:?} belongs to {owner}, not this document")]
    AlreadyAttached {
        /// The foreign model.
        model: ModelId,
        /// The document that owns it.
        owner: DocumentId,
    },

    /// The model does not exist in this document.
    #[error("no model {0} in this document")]
    UnknownModel(ModelId),

    /// `remove_root` was called on a model that is not a root.
    #[error("model {0} is not a root")]
    NotARoot(ModelId),

    /// [`Document::validate`](crate::Document::validate) found violations.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A wire record or patch references an id that is neither in the
    /// payload nor in the document.
    #[error("{from} references unknown node {target}")]
    DanglingReference {
        /// Where the reference was found, e.g. ``node 3 (`renderers`)``.
        from: String,
        /// The missing serial.
        target: u64,
    },

    /// Two wire records share an id.
    #[error("duplicate node id {0} in wire graph")]
    DuplicateNode(u64),

    /// The wire payload does not have the expected shape.
    #[error("malformed wire data: {0}")]
    Malformed(String),
}

/// A value rejected by a property's constraint.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("invalid value {value} for property `{property}`: expected {constraint}")]
pub struct InvalidValueError {
    property: String,
    value: Value,
    constraint: String,
}

impl InvalidValueError {
    pub(crate) fn new(property: &str, value: Value, constraint: &Constraint) -> Self {
        use alloc::string::ToString;
        Self {
            property: property.into(),
            value,
            constraint: constraint.to_string(),
        }
    }

    /// Returns the property that rejected the value.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Returns the rejected value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the rendered constraint, e.g. `float in [0, 1]`.
    #[must_use]
    pub fn constraint(&self) -> &str {
        &self.constraint
    }
}

/// One problem found by [`Document::validate`](crate::Document::validate).
#[derive(Clone, Debug, PartialEq)]
pub enum Violation {
    /// A stored or default value no longer satisfies its constraint.
    InvalidValue {
        /// The offending model.
        model: ModelId,
        /// The constraint failure.
        error: InvalidValueError,
    },
    /// A required property was never set.
    RequiredUnset {
        /// The offending model.
        model: ModelId,
        /// The unset property.
        property: String,
    },
    /// A reference points into another document.
    ForeignReference {
        /// The offending model.
        model: ModelId,
        /// The property holding the reference.
        property: String,
        /// The foreign target.
        target: ModelId,
    },
    /// A reference points at a model this document no longer holds.
    DanglingReference {
        /// The offending model.
        model: ModelId,
        /// The property holding the reference.
        property: String,
        /// The missing target.
        target: ModelId,
    },
}

impl Violation {
    /// Returns the model the violation was found on.
    #[must_use]
    pub fn model(&self) -> ModelId {
        match self {
            Self::InvalidValue { model, .. }
            | Self::RequiredUnset { model, .. }
            | Self::ForeignReference { model, .. }
            | Self::DanglingReference { model, .. } => *model,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { model, error } => write!(f, "{model}: {error}"),
            Self::RequiredUnset { model, property } => {
                write!(f, "{model}: required property `{property}` is unset")
            }
            Self::ForeignReference {
                model,
                property,
                target,
            } => write!(
                f,
                "{model}: `{property}` references {target:?} from another document"
            ),
            Self::DanglingReference {
                model,
                property,
                target,
            } => write!(f, "{model}: `{property}` references missing model {target}"),
        }
    }
}

/// Every violation found by one validation pass.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error(
    "document failed validation with {} violation(s): {}",
    .violations.len(),
    Summary(.violations)
)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    pub(crate) fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Returns every violation, in node discovery order.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

struct Summary<'a>(&'a [Violation]);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}
