// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document to wire graph.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::document::Document;
use crate::id::ModelId;
use crate::wire::{WireGraph, WireNode, encode_value};

/// Options for [`GraphSerializer`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    include_defaults: bool,
}

impl SerializeOptions {
    /// Default options: only explicitly written values are emitted.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            include_defaults: false,
        }
    }

    /// Emits every property with a value, defaults included.
    ///
    /// Required properties that were never set are still omitted.
    #[must_use]
    pub const fn include_defaults(mut self, include: bool) -> Self {
        self.include_defaults = include;
        self
    }

    /// Returns `true` if defaults are emitted.
    #[must_use]
    pub const fn includes_defaults(&self) -> bool {
        self.include_defaults
    }
}

/// Encodes a [`Document`] as a [`WireGraph`].
///
/// Records are emitted in breadth-first discovery order from the roots, in
/// root order, following references in property order, then sequence order,
/// then sorted map-key order. Every node appears once, so cycles cost nothing
/// extra. Attributes are keyed by name in sorted order, making the output a
/// pure function of the document's content.
///
/// The closure is walked afresh, so the output reflects reference writes
/// made since the last reachability recompute.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use understory_model::{
///     Constraint, Document, GraphSerializer, PropertySpec, SerializeOptions, TypeBuilder,
///     TypeRegistry,
/// };
///
/// let mut registry = TypeRegistry::new();
/// registry
///     .register(
///         TypeBuilder::new("Title")
///             .property(PropertySpec::new("text", Constraint::String))
///             .property(PropertySpec::new("visible", Constraint::Bool).with_default(true)),
///     )
///     .unwrap();
///
/// let mut doc = Document::new(Arc::new(registry));
/// let title = doc.create_with("Title", [("text", "Rates")]).unwrap();
/// doc.add_root(title).unwrap();
///
/// let graph = GraphSerializer::new(&doc).serialize();
/// assert_eq!(graph.nodes[0].attributes.len(), 1);
///
/// let full = GraphSerializer::new(&doc)
///     .with_options(SerializeOptions::new().include_defaults(true))
///     .serialize();
/// assert_eq!(full.nodes[0].attributes.len(), 2);
/// ```
#[derive(Debug)]
pub struct GraphSerializer<'a> {
    document: &'a Document,
    options: SerializeOptions,
}

impl<'a> GraphSerializer<'a> {
    /// Creates a serializer with default options.
    #[must_use]
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            options: SerializeOptions::default(),
        }
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: SerializeOptions) -> Self {
        self.options = options;
        self
    }

    /// Serializes the roots and everything they reach.
    #[must_use]
    pub fn serialize(&self) -> WireGraph {
        let document = self.document;
        let order = document.walk(document.roots(), |_| false);
        let graph = WireGraph {
            roots: document.roots().iter().map(|id| id.serial()).collect(),
            nodes: self.records(&order),
        };
        tracing::debug!(
            document = %document.id(),
            roots = graph.roots.len(),
            nodes = graph.nodes.len(),
            "serialized document"
        );
        graph
    }

    /// Encodes the given nodes, skipping ids the document does not hold.
    #[must_use]
    pub fn records(&self, ids: &[ModelId]) -> Vec<WireNode> {
        ids.iter().filter_map(|id| self.record(*id)).collect()
    }

    /// Encodes one node.
    #[must_use]
    pub fn record(&self, id: ModelId) -> Option<WireNode> {
        let document = self.document;
        let node = document.node(id)?;
        let ty = document.registry().descriptor(node.type_key());

        let attributes: BTreeMap<String, serde_json::Value> = if self.options.include_defaults {
            ty.iter()
                .filter(|(property, spec)| node.has_local(*property) || !spec.is_required())
                .map(|(property, spec)| {
                    let value = document.read(node, ty, property);
                    (spec.name().into(), encode_value(value))
                })
                .collect()
        } else {
            node.locals()
                .map(|(property, value)| (ty.spec(property).name().into(), encode_value(value)))
                .collect()
        };

        Some(WireNode {
            id: id.serial(),
            type_name: ty.name().into(),
            attributes,
        })
    }
}

/// Serializes a document with default options.
#[must_use]
pub fn serialize(document: &Document) -> WireGraph {
    GraphSerializer::new(document).serialize()
}
