// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Model nodes and their sparse value storage.
//!
//! Values are kept in a sorted `SmallVec` keyed by [`PropertyId`], searched
//! with binary search. Only explicitly written properties are stored; every
//! other property reads as its spec default. Most models set only a handful
//! of properties, so the inline capacity covers the common case without a
//! heap allocation.

use smallvec::SmallVec;

use crate::id::{ModelId, PropertyId, TypeKey};
use crate::value::Value;

/// Inline capacity for written values.
const INLINE_CAPACITY: usize = 8;

/// A typed model living in a [`Document`](crate::Document).
///
/// Nodes are created and mutated through the document, which owns them and
/// checks every write; this type only exposes reads.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelNode {
    id: ModelId,
    type_key: TypeKey,
    /// Written values, sorted by [`PropertyId`].
    values: SmallVec<[(PropertyId, Value); INLINE_CAPACITY]>,
}

impl ModelNode {
    pub(crate) fn new(id: ModelId, type_key: TypeKey) -> Self {
        Self {
            id,
            type_key,
            values: SmallVec::new(),
        }
    }

    /// Returns this node's identity.
    #[must_use]
    #[inline]
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// Returns this node's type.
    #[must_use]
    #[inline]
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    #[inline]
    fn find(&self, property: PropertyId) -> Result<usize, usize> {
        self.values.binary_search_by_key(&property, |(id, _)| *id)
    }

    /// Returns the written value of a property, if any.
    #[must_use]
    pub fn get_local(&self, property: PropertyId) -> Option<&Value> {
        self.find(property).ok().map(|idx| &self.values[idx].1)
    }

    /// Returns `true` if the property has been written.
    #[must_use]
    pub fn has_local(&self, property: PropertyId) -> bool {
        self.find(property).is_ok()
    }

    /// Stores a value, returning the previously written one.
    pub(crate) fn set_local(&mut self, property: PropertyId, value: Value) -> Option<Value> {
        match self.find(property) {
            Ok(idx) => Some(core::mem::replace(&mut self.values[idx].1, value)),
            Err(idx) => {
                self.values.insert(idx, (property, value));
                None
            }
        }
    }

    /// Returns every written value, in property order.
    pub fn locals(&self) -> impl Iterator<Item = (PropertyId, &Value)> + '_ {
        self.values.iter().map(|(id, value)| (*id, value))
    }

    /// Returns the number of written values.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no property has been written.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Calls `f` for every reference held in written values, in property
    /// order, then sequence order, then sorted key order.
    ///
    /// Defaults never hold references, so this covers every edge leaving the
    /// node.
    pub fn for_each_ref(&self, mut f: impl FnMut(PropertyId, ModelId)) {
        for (property, value) in &self.values {
            value.for_each_ref(&mut |target| f(*property, target));
        }
    }
}
