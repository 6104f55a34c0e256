// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wire graph to document.

use alloc::sync::Arc;
use alloc::vec::Vec;
use hashbrown::HashMap;

use crate::constraint::{ModelLookup, NoModels};
use crate::document::Document;
use crate::error::{Error, InvalidValueError, Result};
use crate::id::{ModelId, PropertyId, TypeKey};
use crate::node::ModelNode;
use crate::registry::{PropertySpec, TypeRegistry};
use crate::value::Value;
use crate::wire::{WireGraph, WireNode, decode_value, has_refs};

/// Rebuilds a [`Document`] from a [`WireGraph`].
///
/// Decoding runs in two passes so that references may point forward, backward
/// or around a cycle. The first pass resolves every record's type and decodes
/// the attributes that hold no references; the second resolves references
/// against the complete id table. Roots are attached last. Any error aborts
/// the whole graph and no document is returned.
///
/// The new document has its own [`DocumentId`](crate::DocumentId) but keeps
/// the wire serials, and its serial counter resumes after the largest one.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use understory_model::{
///     Constraint, Error, GraphDeserializer, PropertySpec, TypeBuilder, TypeRegistry, WireGraph,
/// };
///
/// let mut registry = TypeRegistry::new();
/// registry
///     .register(TypeBuilder::new("Title").property(PropertySpec::new("text", Constraint::String)))
///     .unwrap();
/// let deserializer = GraphDeserializer::new(Arc::new(registry));
///
/// let doc = deserializer
///     .from_json(r#"{"roots":[4],"nodes":[{"id":4,"type":"Title","attributes":{"text":"Rates"}}]}"#)
///     .unwrap();
/// let title = doc.roots()[0];
/// assert_eq!(title.serial(), 4);
/// assert_eq!(doc.get(title, "text").unwrap().as_str(), Some("Rates"));
///
/// let err = deserializer
///     .from_json(r#"{"roots":[1],"nodes":[{"id":1,"type":"Frobnicator"}]}"#)
///     .unwrap_err();
/// assert_eq!(err, Error::UnknownType("Frobnicator".into()));
/// ```
#[derive(Clone, Debug)]
pub struct GraphDeserializer {
    registry: Arc<TypeRegistry>,
}

impl GraphDeserializer {
    /// Creates a deserializer resolving types against `registry`.
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    /// Rebuilds a document.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownType`] or [`Error::AbstractType`] for a record's type.
    /// - [`Error::DuplicateNode`] if two records share an id.
    /// - [`Error::UnknownProperty`] for an attribute the type lacks.
    /// - [`Error::Malformed`] for an attribute that is not a valid encoding.
    /// - [`Error::InvalidValue`] for a value its constraint rejects.
    /// - [`Error::DanglingReference`] for a reference, or root, with no record.
    pub fn deserialize(&self, graph: &WireGraph) -> Result<Document> {
        let mut document = Document::new(Arc::clone(&self.registry));
        insert_records(&mut document, &graph.nodes, false)?;
        for &serial in &graph.roots {
            if document.node_by_serial(serial).is_none() {
                return Err(Error::DanglingReference {
                    from: "roots".into(),
                    target: serial,
                });
            }
            document.add_root(ModelId::new(document.id(), serial))?;
        }
        tracing::debug!(
            document = %document.id(),
            roots = graph.roots.len(),
            nodes = graph.nodes.len(),
            attached = document.all_nodes().len(),
            "deserialized document"
        );
        Ok(document)
    }

    /// Parses JSON text and rebuilds a document.
    ///
    /// # Errors
    ///
    /// [`Error::Malformed`] if the text is not a wire graph, otherwise as
    /// [`deserialize`](Self::deserialize).
    pub fn from_json(&self, text: &str) -> Result<Document> {
        self.deserialize(&WireGraph::from_json(text)?)
    }
}

/// Resolves reference types against records being inserted, falling back to
/// the document's existing nodes.
struct Staged<'a> {
    document: &'a Document,
    table: &'a HashMap<u64, TypeKey>,
}

impl ModelLookup for Staged<'_> {
    fn type_of(&self, id: ModelId) -> Option<TypeKey> {
        if id.document() != self.document.id() {
            return None;
        }
        self.table
            .get(&id.serial())
            .copied()
            .or_else(|| self.document.type_of(id))
    }
}

/// Decodes `records` and inserts them into `document` as detached nodes.
///
/// With `replace_existing`, a record whose id the document already holds
/// replaces that node; otherwise it is a [`Error::DuplicateNode`]. Nothing is
/// inserted unless every record decodes.
pub(crate) fn insert_records(
    document: &mut Document,
    records: &[WireNode],
    replace_existing: bool,
) -> Result<Vec<ModelId>> {
    let registry = Arc::clone(document.registry());
    let doc_id = document.id();
    let mut table: HashMap<u64, TypeKey> = HashMap::with_capacity(records.len());
    let mut staged: Vec<ModelNode> = Vec::with_capacity(records.len());
    let mut deferred: Vec<(usize, PropertyId, &serde_json::Value)> = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let ty = registry.resolve(&record.type_name)?;
        if ty.is_abstract() {
            return Err(Error::AbstractType(record.type_name.clone()));
        }
        let exists = document.node_by_serial(record.id).is_some();
        if table.insert(record.id, ty.key()).is_some() || (exists && !replace_existing) {
            return Err(Error::DuplicateNode(record.id));
        }

        let mut node = ModelNode::new(ModelId::new(doc_id, record.id), ty.key());
        for (name, json) in &record.attributes {
            let property = ty.property_id(name).ok_or_else(|| Error::UnknownProperty {
                type_name: ty.name().into(),
                property: name.clone(),
            })?;
            if has_refs(json) {
                deferred.push((index, property, json));
                continue;
            }
            let value = decode_value(json, &mut |_| None).map_err(|e| e.at(record.id, name))?;
            let value = checked(ty.spec(property), value, &registry, &NoModels)?;
            node.set_local(property, value);
        }
        staged.push(node);
    }

    {
        let lookup = Staged {
            document,
            table: &table,
        };
        for (index, property, json) in deferred {
            let record = &records[index];
            let mut resolve = |serial: u64| {
                let id = ModelId::new(doc_id, serial);
                lookup.type_of(id).map(|_| id)
            };
            let spec = registry.descriptor(staged[index].type_key()).spec(property);
            let value =
                decode_value(json, &mut resolve).map_err(|e| e.at(record.id, spec.name()))?;
            let value = checked(spec, value, &registry, &lookup)?;
            staged[index].set_local(property, value);
        }
    }

    let ids = staged.iter().map(ModelNode::id).collect();
    for node in staged {
        document.insert_node(node);
    }
    Ok(ids)
}

fn checked(
    spec: &PropertySpec,
    value: Value,
    registry: &TypeRegistry,
    models: &dyn ModelLookup,
) -> Result<Value> {
    let value = spec.constraint().coerce(value);
    if spec.constraint().check(&value, registry, models) {
        Ok(value)
    } else {
        Err(InvalidValueError::new(spec.name(), value, spec.constraint()).into())
    }
}
