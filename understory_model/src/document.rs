// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The model document: node arena, roots and reachability.

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use hashbrown::{HashMap, HashSet};

use crate::change::{Change, ChangeCallback, ChangeLog, ObserverId, Observers, PropertyChange};
use crate::constraint::ModelLookup;
use crate::error::{Error, InvalidValueError, Result, ValidationError, Violation};
use crate::id::{DocumentId, ModelId, PropertyId, TypeKey};
use crate::node::ModelNode;
use crate::registry::{PropertySpec, TypeDescriptor, TypeRegistry};
use crate::value::Value;

/// Read by properties that have neither a written value nor a default.
static NULL: Value = Value::Null;

/// Nodes that entered or left the reachable closure during one
/// [`Document::recompute_reachability`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReachabilityDelta {
    /// Newly reachable nodes, in discovery order.
    pub attached: Vec<ModelId>,
    /// Nodes no longer reachable, in their previous discovery order.
    pub detached: Vec<ModelId>,
}

impl ReachabilityDelta {
    /// Returns `true` if the closure did not change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty() && self.detached.is_empty()
    }
}

/// An arena of model nodes with an ordered list of roots.
///
/// A document owns every node created in it. Nodes start out *detached*,
/// become *attached* once reachable from a root by following references, and
/// fall back to detached (still owned, free to be re-attached) when the last
/// path from a root goes away. References are [`ModelId`]s, so cycles are
/// ordinary data.
///
/// Every write is checked against the property's [`Constraint`], and
/// references must resolve to nodes of this same document; handles minted by
/// another document are rejected with [`Error::AlreadyAttached`].
///
/// Reference writes only mark reachability stale. [`add_root`],
/// [`remove_root`], [`drain_patches`] and [`recompute_reachability`] settle
/// it, so [`all_nodes`] is exactly the closure of the roots after any of them.
///
/// All mutation takes `&mut self`; a document has a single writer.
///
/// [`Constraint`]: crate::Constraint
/// [`add_root`]: Self::add_root
/// [`remove_root`]: Self::remove_root
/// [`drain_patches`]: Self::drain_patches
/// [`recompute_reachability`]: Self::recompute_reachability
/// [`all_nodes`]: Self::all_nodes
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use understory_model::{Constraint, Document, PropertySpec, TypeBuilder, TypeRegistry, Value};
///
/// let mut registry = TypeRegistry::new();
/// registry
///     .register(
///         TypeBuilder::new("Node")
///             .property(PropertySpec::new("label", Constraint::String))
///             .property(PropertySpec::new(
///                 "next",
///                 Constraint::nullable(Constraint::instance("Node")),
///             )),
///     )
///     .unwrap();
///
/// let mut doc = Document::new(Arc::new(registry));
/// let a = doc.create("Node").unwrap();
/// let b = doc.create("Node").unwrap();
/// doc.set(a, "next", b).unwrap();
/// doc.set(b, "next", a).unwrap();
///
/// doc.add_root(a).unwrap();
/// assert_eq!(doc.all_nodes(), &[a, b]);
///
/// doc.set(a, "next", Value::Null).unwrap();
/// let delta = doc.recompute_reachability();
/// assert_eq!(delta.detached, [b]);
/// assert!(doc.contains(b));
/// ```
pub struct Document {
    id: DocumentId,
    title: String,
    registry: Arc<TypeRegistry>,
    nodes: HashMap<u64, ModelNode>,
    roots: Vec<ModelId>,
    /// The reachable closure, in discovery order.
    attached: Vec<ModelId>,
    attached_set: HashSet<u64>,
    next_serial: u64,
    stale: bool,
    pub(crate) log: ChangeLog,
    observers: Observers,
}

impl Document {
    /// Title used until [`set_title`](Self::set_title) is called.
    pub const DEFAULT_TITLE: &'static str = "Untitled";

    /// Creates an empty document over `registry`.
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            id: DocumentId::next(),
            title: Self::DEFAULT_TITLE.into(),
            registry,
            nodes: HashMap::new(),
            roots: Vec::new(),
            attached: Vec::new(),
            attached_set: HashSet::new(),
            next_serial: 1,
            stale: false,
            log: ChangeLog::default(),
            observers: Observers::default(),
        }
    }

    /// Returns this document's identity.
    #[must_use]
    #[inline]
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Returns the document title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Sets the document title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Returns the registry this document's types come from.
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates a detached model of the named type with every property at its
    /// default.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownType`] or [`Error::AbstractType`].
    pub fn create(&mut self, type_name: &str) -> Result<ModelId> {
        self.create_with(type_name, core::iter::empty::<(&str, Value)>())
    }

    /// Creates a detached model with initial values.
    ///
    /// Nothing is created unless every value passes the same checks as
    /// [`set`](Self::set). Observers are not notified for initial values.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownType`], [`Error::AbstractType`], or any error
    /// [`set`](Self::set) reports for one of the values.
    pub fn create_with<I, K, V>(&mut self, type_name: &str, values: I) -> Result<ModelId>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let registry = Arc::clone(&self.registry);
        let ty = registry.resolve(type_name)?;
        if ty.is_abstract() {
            return Err(Error::AbstractType(type_name.into()));
        }

        let id = ModelId::new(self.id, self.next_serial);
        let mut node = ModelNode::new(id, ty.key());
        for (name, value) in values {
            let property = property_id(ty, name.as_ref())?;
            let value = self.prepare(&registry, ty.spec(property), value.into())?;
            node.set_local(property, value);
        }

        self.next_serial += 1;
        self.nodes.insert(id.serial(), node);
        tracing::trace!(model = %id, type_name, "created model");
        Ok(id)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Reads a property: the written value, else the default, else `null`.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyAttached`] for a foreign id, [`Error::UnknownModel`],
    /// or [`Error::UnknownProperty`].
    pub fn get(&self, id: ModelId, name: &str) -> Result<&Value> {
        let node = self.node_checked(id)?;
        let ty = self.registry.descriptor(node.type_key());
        let property = property_id(ty, name)?;
        Ok(self.read(node, ty, property))
    }

    pub(crate) fn read<'a>(
        &'a self,
        node: &'a ModelNode,
        ty: &'a TypeDescriptor,
        property: PropertyId,
    ) -> &'a Value {
        node.get_local(property)
            .or_else(|| ty.spec(property).default())
            .unwrap_or(&NULL)
    }

    /// Writes a property, returning the value it replaces.
    ///
    /// The value is coerced (integers widen to floats where a float is
    /// expected), its references are resolved, and the constraint is checked,
    /// all before anything changes. Writing the value the property already
    /// reads is a no-op. Otherwise observers are notified and, while syncing,
    /// the write is recorded for the next [`drain_patches`](Self::drain_patches).
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyAttached`] if `id`, or a reference in `value`, belongs
    ///   to another document.
    /// - [`Error::UnknownModel`] if `id`, or a reference in `value`, does not
    ///   exist here.
    /// - [`Error::UnknownProperty`] if the type has no such property.
    /// - [`Error::InvalidValue`] if the constraint rejects the value.
    pub fn set(&mut self, id: ModelId, name: &str, value: impl Into<Value>) -> Result<Value> {
        let registry = Arc::clone(&self.registry);
        let ty = registry.descriptor(self.node_checked(id)?.type_key());
        let property = property_id(ty, name)?;
        let value = self.prepare(&registry, ty.spec(property), value.into())?;
        self.write(id, ty, property, value)
    }

    /// Appends `item` to a sequence property.
    ///
    /// The whole new sequence is checked and written as by
    /// [`set`](Self::set); observers see the old and new sequences.
    ///
    /// # Errors
    ///
    /// As [`set`](Self::set). A property whose current value is neither a
    /// sequence nor `null` rejects the item with [`Error::InvalidValue`].
    pub fn push(&mut self, id: ModelId, name: &str, item: impl Into<Value>) -> Result<()> {
        let item = item.into();
        let mut items = match self.get(id, name)? {
            Value::Seq(items) => items.clone(),
            Value::Null => Vec::new(),
            _ => {
                let ty = self.registry.descriptor(self.node_checked(id)?.type_key());
                let spec = ty.spec(property_id(ty, name)?);
                return Err(InvalidValueError::new(name, item, spec.constraint()).into());
            }
        };
        items.push(item);
        self.set(id, name, Value::Seq(items))?;
        Ok(())
    }

    /// Writes several properties at once.
    ///
    /// Every pair is checked before any is written; on error nothing changes.
    ///
    /// # Errors
    ///
    /// As [`set`](Self::set), for the first rejected pair.
    pub fn set_many<I, K, V>(&mut self, id: ModelId, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let registry = Arc::clone(&self.registry);
        let ty = registry.descriptor(self.node_checked(id)?.type_key());
        let prepared = values
            .into_iter()
            .map(|(name, value)| {
                let property = property_id(ty, name.as_ref())?;
                let value = self.prepare(&registry, ty.spec(property), value.into())?;
                Ok((property, value))
            })
            .collect::<Result<Vec<_>>>()?;
        for (property, value) in prepared {
            self.write(id, ty, property, value)?;
        }
        Ok(())
    }

    /// Coerces and checks a value for `spec`.
    fn prepare(&self, registry: &TypeRegistry, spec: &PropertySpec, value: Value) -> Result<Value> {
        let value = spec.constraint().coerce(value);
        value.try_for_each_ref(&mut |target| self.node_checked(target).map(|_| ()))?;
        if spec.constraint().check(&value, registry, self) {
            Ok(value)
        } else {
            Err(InvalidValueError::new(spec.name(), value, spec.constraint()).into())
        }
    }

    /// Stores an already prepared value.
    pub(crate) fn write(
        &mut self,
        id: ModelId,
        ty: &TypeDescriptor,
        property: PropertyId,
        value: Value,
    ) -> Result<Value> {
        let spec = ty.spec(property);
        let node = self
            .nodes
            .get_mut(&id.serial())
            .ok_or(Error::UnknownModel(id))?;
        let current = node.get_local(property).or(spec.default());
        if current == Some(&value) {
            return Ok(value);
        }
        if value.contains_refs() || current.is_some_and(Value::contains_refs) {
            self.stale = true;
        }

        let recorded = self.log.is_recording().then(|| value.clone());
        let new = (!self.observers.is_empty()).then(|| value.clone());
        let old = node
            .set_local(property, value)
            .or_else(|| spec.default().cloned())
            .unwrap_or_default();

        if let Some(value) = recorded {
            self.log.record(Change::Set {
                model: id,
                property,
                value,
            });
        }
        if let Some(new) = new {
            self.observers.notify(&PropertyChange {
                model: id,
                property: spec.name().into(),
                old: old.clone(),
                new,
            });
        }
        Ok(old)
    }

    /// Registers a callback for every successful property write.
    pub fn on_change(
        &mut self,
        callback: impl Fn(&PropertyChange) + Send + Sync + 'static,
    ) -> ObserverId {
        let callback: ChangeCallback = alloc::boxed::Box::new(callback);
        self.observers.add(callback)
    }

    /// Removes an observer. Returns `false` if it was already removed.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    // =========================================================================
    // Roots and reachability
    // =========================================================================

    /// Adds a root and attaches everything it reaches.
    ///
    /// Adding an existing root does nothing.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyAttached`] if `id` belongs to another document, or
    /// [`Error::UnknownModel`] if it does not exist here.
    pub fn add_root(&mut self, id: ModelId) -> Result<()> {
        self.node_checked(id)?;
        if self.is_root(id) {
            return Ok(());
        }
        self.roots.push(id);
        self.stale = true;
        let delta = self.recompute_reachability();
        self.log.record(Change::AddRoot(id));
        tracing::debug!(
            root = %id,
            attached = delta.attached.len(),
            roots = self.roots.len(),
            "added root"
        );
        Ok(())
    }

    /// Removes a root. Nodes no longer reachable become detached.
    ///
    /// # Errors
    ///
    /// [`Error::NotARoot`] if `id` is not a root.
    pub fn remove_root(&mut self, id: ModelId) -> Result<()> {
        let index = self
            .roots
            .iter()
            .position(|root| *root == id)
            .ok_or(Error::NotARoot(id))?;
        self.roots.remove(index);
        self.stale = true;
        let delta = self.recompute_reachability();
        self.log.record(Change::RemoveRoot(id));
        tracing::debug!(
            root = %id,
            detached = delta.detached.len(),
            roots = self.roots.len(),
            "removed root"
        );
        Ok(())
    }

    /// Returns the roots, in insertion order.
    #[must_use]
    pub fn roots(&self) -> &[ModelId] {
        &self.roots
    }

    /// Returns `true` if `id` is a root.
    #[must_use]
    pub fn is_root(&self, id: ModelId) -> bool {
        self.roots.contains(&id)
    }

    /// Recomputes the reachable closure if a reference write made it stale.
    ///
    /// The traversal is breadth-first from the roots in root order, following
    /// references in property order, then sequence order, then map-key order.
    /// Calling this again without intervening reference writes returns an
    /// empty delta.
    pub fn recompute_reachability(&mut self) -> ReachabilityDelta {
        if !self.stale {
            return ReachabilityDelta::default();
        }
        self.stale = false;

        let closure = self.walk(&self.roots, |_| false);
        let closure_set: HashSet<u64> = closure.iter().map(|id| id.serial()).collect();
        let delta = ReachabilityDelta {
            attached: closure
                .iter()
                .filter(|id| !self.attached_set.contains(&id.serial()))
                .copied()
                .collect(),
            detached: self
                .attached
                .iter()
                .filter(|id| !closure_set.contains(&id.serial()))
                .copied()
                .collect(),
        };
        self.attached = closure;
        self.attached_set = closure_set;

        if !delta.is_empty() {
            tracing::debug!(
                attached = delta.attached.len(),
                detached = delta.detached.len(),
                reachable = self.attached.len(),
                "recomputed reachability"
            );
        }
        delta
    }

    /// Breadth-first traversal from `starts`, not entering serials for which
    /// `skip` returns `true`.
    pub(crate) fn walk(&self, starts: &[ModelId], skip: impl Fn(u64) -> bool) -> Vec<ModelId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        let mut order = Vec::new();
        let mut visit = |id: ModelId, queue: &mut VecDeque<ModelId>| {
            if id.document() == self.id && !skip(id.serial()) && seen.insert(id.serial()) {
                queue.push_back(id);
            }
        };
        for &id in starts {
            visit(id, &mut queue);
        }
        while let Some(id) = queue.pop_front() {
            let Some(node) = self.nodes.get(&id.serial()) else {
                continue;
            };
            order.push(id);
            node.for_each_ref(|_, target| visit(target, &mut queue));
        }
        order
    }

    /// Returns the reachable closure, in discovery order.
    #[must_use]
    pub fn all_nodes(&self) -> &[ModelId] {
        &self.attached
    }

    /// Returns `true` if `id` is reachable from a root.
    #[must_use]
    pub fn is_attached(&self, id: ModelId) -> bool {
        id.document() == self.id && self.attached_set.contains(&id.serial())
    }

    /// Returns `true` if this document holds `id`, attached or not.
    #[must_use]
    pub fn contains(&self, id: ModelId) -> bool {
        id.document() == self.id && self.nodes.contains_key(&id.serial())
    }

    /// Returns the number of nodes held, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the document holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns a node.
    #[must_use]
    pub fn node(&self, id: ModelId) -> Option<&ModelNode> {
        self.node_checked(id).ok()
    }

    pub(crate) fn node_by_serial(&self, serial: u64) -> Option<&ModelNode> {
        self.nodes.get(&serial)
    }

    pub(crate) fn node_checked(&self, id: ModelId) -> Result<&ModelNode> {
        if id.document() != self.id {
            return Err(Error::AlreadyAttached {
                model: id,
                owner: id.document(),
            });
        }
        self.nodes.get(&id.serial()).ok_or(Error::UnknownModel(id))
    }

    /// Returns a node's type descriptor.
    #[must_use]
    pub fn descriptor(&self, id: ModelId) -> Option<&TypeDescriptor> {
        self.node(id)
            .map(|node| self.registry.descriptor(node.type_key()))
    }

    /// Returns a node's type name.
    #[must_use]
    pub fn type_name(&self, id: ModelId) -> Option<&str> {
        self.descriptor(id).map(TypeDescriptor::name)
    }

    /// Returns the models `id` references directly, in traversal order and
    /// without duplicates.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyAttached`] or [`Error::UnknownModel`].
    pub fn references(&self, id: ModelId) -> Result<Vec<ModelId>> {
        let node = self.node_checked(id)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        node.for_each_ref(|_, target| {
            if seen.insert(target) {
                out.push(target);
            }
        });
        Ok(out)
    }

    /// Returns every attached model whose type is `type_name` or a subtype,
    /// in discovery order.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownType`].
    pub fn find_by_type(&self, type_name: &str) -> Result<Vec<ModelId>> {
        let base = self.registry.resolve(type_name)?.key();
        Ok(self
            .attached
            .iter()
            .copied()
            .filter(|id| {
                self.nodes
                    .get(&id.serial())
                    .is_some_and(|node| self.registry.is_subtype(node.type_key(), base))
            })
            .collect())
    }

    /// Drops every detached node, returning how many were dropped.
    ///
    /// Nodes mentioned by changes not yet drained are kept, along with
    /// everything they reach.
    pub fn collect_garbage(&mut self) -> usize {
        self.recompute_reachability();
        let mut starts = self.roots.clone();
        for change in self.log.pending() {
            match change {
                Change::Set { model, value, .. } => {
                    starts.push(*model);
                    value.for_each_ref(&mut |target| starts.push(target));
                }
                Change::AddRoot(id) | Change::RemoveRoot(id) => starts.push(*id),
            }
        }
        let keep: HashSet<u64> = self
            .walk(&starts, |_| false)
            .iter()
            .map(|id| id.serial())
            .collect();

        let before = self.nodes.len();
        self.nodes.retain(|serial, _| keep.contains(serial));
        let dropped = before - self.nodes.len();
        tracing::debug!(dropped, remaining = self.nodes.len(), "collected garbage");
        dropped
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Re-checks every attached node.
    ///
    /// Each property's stored or default value must satisfy its constraint,
    /// every reference must resolve to a node of this document, and required
    /// properties must be set. The closure is computed afresh, so a stale
    /// reachability state does not hide anything.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] listing every violation found.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();
        for id in self.walk(&self.roots, |_| false) {
            let Some(node) = self.nodes.get(&id.serial()) else {
                continue;
            };
            let ty = self.registry.descriptor(node.type_key());
            for (property, spec) in ty.iter() {
                let Some(value) = node.get_local(property).or(spec.default()) else {
                    violations.push(Violation::RequiredUnset {
                        model: id,
                        property: spec.name().into(),
                    });
                    continue;
                };
                let before = violations.len();
                value.for_each_ref(&mut |target| {
                    if target.document() != self.id {
                        violations.push(Violation::ForeignReference {
                            model: id,
                            property: spec.name().into(),
                            target,
                        });
                    } else if !self.nodes.contains_key(&target.serial()) {
                        violations.push(Violation::DanglingReference {
                            model: id,
                            property: spec.name().into(),
                            target,
                        });
                    }
                });
                if violations.len() == before
                    && !spec.constraint().check(value, &self.registry, self)
                {
                    violations.push(Violation::InvalidValue {
                        model: id,
                        error: InvalidValueError::new(spec.name(), value.clone(), spec.constraint()),
                    });
                }
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations).into())
        }
    }

    // =========================================================================
    // Bulk insertion
    // =========================================================================

    /// Inserts a node built elsewhere (deserialization, patches), keeping the
    /// serial counter ahead of every serial in use.
    pub(crate) fn insert_node(&mut self, node: ModelNode) {
        let serial = node.id().serial();
        self.next_serial = self.next_serial.max(serial + 1);
        self.nodes.insert(serial, node);
        self.stale = true;
    }
}

impl ModelLookup for Document {
    fn type_of(&self, id: ModelId) -> Option<TypeKey> {
        if id.document() != self.id {
            return None;
        }
        self.nodes.get(&id.serial()).map(ModelNode::type_key)
    }
}

fn property_id(ty: &TypeDescriptor, name: &str) -> Result<PropertyId> {
    ty.property_id(name).ok_or_else(|| Error::UnknownProperty {
        type_name: ty.name().into(),
        property: name.into(),
    })
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("nodes", &self.nodes.len())
            .field("roots", &self.roots)
            .field("attached", &self.attached.len())
            .field("syncing", &self.log.is_recording())
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}
