// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Model type registry.
//!
//! This module provides [`TypeRegistry`] for registering model types and
//! looking up their [`TypeDescriptor`]s, plus the [`TypeBuilder`] and
//! [`PropertySpec`] used to declare them.

use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::constraint::{Constraint, NoModels};
use crate::error::{Error, InvalidValueError, Result};
use crate::id::{PropertyId, TypeKey};
use crate::value::Value;

/// A declared property: its name, constraint and default.
///
/// # Example
///
/// ```rust
/// use understory_model::{Constraint, PropertySpec, Value};
///
/// let alpha = PropertySpec::new("fill_alpha", Constraint::float_range(0.0, 1.0))
///     .with_default(1.0);
/// assert_eq!(alpha.default(), Some(&Value::Float(1.0)));
///
/// let source = PropertySpec::new("data_source", Constraint::instance("DataSource"));
/// assert!(source.is_required());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PropertySpec {
    name: String,
    constraint: Constraint,
    default: Option<Value>,
}

impl PropertySpec {
    /// Creates a spec whose default is the constraint's
    /// [natural default](Constraint::natural_default).
    #[must_use]
    pub fn new(name: impl Into<String>, constraint: Constraint) -> Self {
        let default = constraint.natural_default();
        Self {
            name: name.into(),
            constraint,
            default,
        }
    }

    /// Sets the default value.
    ///
    /// The default is coerced and checked when the owning type is registered.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Removes the default, making the property required.
    ///
    /// A required property reads as `null` until it is set, and
    /// [`Document::validate`](crate::Document::validate) reports it.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.default = None;
        self
    }

    /// Returns the property name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value constraint.
    #[must_use]
    #[inline]
    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// Returns the default value, if the property has one.
    #[must_use]
    #[inline]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns `true` if the property has no default.
    #[must_use]
    #[inline]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Builder for a model type, consumed by [`TypeRegistry::register`].
///
/// # Example
///
/// ```rust
/// use understory_model::{Constraint, PropertySpec, TypeBuilder, TypeRegistry};
///
/// let mut registry = TypeRegistry::new();
/// registry
///     .register(
///         TypeBuilder::new("Glyph")
///             .abstract_type()
///             .property(PropertySpec::new("visible", Constraint::Bool).with_default(true)),
///     )
///     .unwrap();
/// registry
///     .register(
///         TypeBuilder::new("Patches")
///             .parent("Glyph")
///             .property(PropertySpec::new("fill_alpha", Constraint::float_range(0.0, 1.0))),
///     )
///     .unwrap();
///
/// let patches = registry.resolve("Patches").unwrap();
/// let names: Vec<_> = patches.properties().iter().map(|p| p.name()).collect();
/// assert_eq!(names, ["visible", "fill_alpha"]);
/// ```
#[derive(Clone, Debug)]
pub struct TypeBuilder {
    name: String,
    parent: Option<String>,
    is_abstract: bool,
    properties: Vec<PropertySpec>,
}

impl TypeBuilder {
    /// Starts a concrete type with no parent and no properties.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            is_abstract: false,
            properties: Vec::new(),
        }
    }

    /// Inherits every property of `parent`, which must already be registered.
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Marks the type abstract: it can be a reference target through its
    /// subtypes but cannot be instantiated.
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Declares a property.
    #[must_use]
    pub fn property(mut self, spec: PropertySpec) -> Self {
        self.properties.push(spec);
        self
    }

    /// Declares several properties.
    #[must_use]
    pub fn properties(mut self, specs: impl IntoIterator<Item = PropertySpec>) -> Self {
        self.properties.extend(specs);
        self
    }
}

/// A registered model type.
///
/// The property list is flattened: inherited properties come first, in
/// their ancestors' order, followed by the type's own. Descriptors are
/// immutable once registered.
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    key: TypeKey,
    name: String,
    parent: Option<TypeKey>,
    is_abstract: bool,
    properties: Vec<PropertySpec>,
    own_start: usize,
    by_name: HashMap<String, PropertyId>,
    /// This type followed by its ancestors, nearest first.
    lineage: SmallVec<[TypeKey; 4]>,
}

impl TypeDescriptor {
    /// Returns this type's key.
    #[must_use]
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Returns the type name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent type, if any.
    #[must_use]
    #[inline]
    pub fn parent(&self) -> Option<TypeKey> {
        self.parent
    }

    /// Returns `true` if the type cannot be instantiated.
    #[must_use]
    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Returns every property, inherited ones first.
    #[must_use]
    #[inline]
    pub fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }

    /// Returns the properties declared by this type itself.
    #[must_use]
    pub fn own_properties(&self) -> &[PropertySpec] {
        &self.properties[self.own_start..]
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn property_id(&self, name: &str) -> Option<PropertyId> {
        self.by_name.get(name).copied()
    }

    /// Returns the spec for a property slot.
    #[must_use]
    pub fn property(&self, id: PropertyId) -> Option<&PropertySpec> {
        self.properties.get(usize::from(id.index()))
    }

    /// Returns the ids and specs of every property, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &PropertySpec)> {
        self.properties.iter().enumerate().map(|(i, spec)| {
            #[expect(clippy::cast_possible_truncation, reason = "index < len <= u16::MAX")]
            (PropertyId::new(i as u16), spec)
        })
    }

    /// Returns the spec for a property id taken from this descriptor.
    pub(crate) fn spec(&self, id: PropertyId) -> &PropertySpec {
        &self.properties[usize::from(id.index())]
    }

    /// Returns this type followed by its ancestors, nearest first.
    #[must_use]
    pub fn lineage(&self) -> &[TypeKey] {
        &self.lineage
    }
}

/// A registry of model types.
///
/// Types are registered once at startup, in dependency order (a parent
/// before its children), and the registry is then shared read-only, usually
/// as an `Arc<TypeRegistry>`, by every [`Document`](crate::Document) and
/// deserializer. There is no unregistration. Tests can build as many fresh
/// registries as they like.
///
/// # Example
///
/// ```rust
/// use understory_model::{Constraint, Error, PropertySpec, TypeBuilder, TypeRegistry};
///
/// let mut registry = TypeRegistry::new();
/// let title = registry
///     .register(TypeBuilder::new("Title").property(PropertySpec::new("text", Constraint::String)))
///     .unwrap();
///
/// assert_eq!(registry.by_name("Title"), Some(title));
/// assert!(matches!(
///     registry.register(TypeBuilder::new("Title")),
///     Err(Error::DuplicateType(_))
/// ));
/// assert!(matches!(registry.resolve("Frobnicator"), Err(Error::UnknownType(_))));
/// ```
#[derive(Default)]
pub struct TypeRegistry {
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, TypeKey>,
}

impl TypeRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model type.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateType`] if the name is taken.
    /// - [`Error::UnknownType`] if the parent is not registered.
    /// - [`Error::DuplicateProperty`] if a property name repeats, either within
    ///   the builder or against an inherited property.
    /// - [`Error::InvalidValue`] if a default violates its constraint or holds
    ///   a reference.
    ///
    /// # Panics
    ///
    /// Panics if more than 65,535 types, or more than 65,535 properties on one
    /// type, are registered.
    pub fn register(&mut self, builder: TypeBuilder) -> Result<TypeKey> {
        let TypeBuilder {
            name,
            parent,
            is_abstract,
            properties: own,
        } = builder;

        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateType(name));
        }
        let parent = parent.map(|p| self.resolve(&p)).transpose()?;

        let (mut properties, mut by_name, mut lineage) = match parent {
            Some(parent) => (
                parent.properties.clone(),
                parent.by_name.clone(),
                parent.lineage.clone(),
            ),
            None => (Vec::new(), HashMap::new(), SmallVec::new()),
        };
        let parent = parent.map(TypeDescriptor::key);
        let own_start = properties.len();

        for mut spec in own {
            if by_name.contains_key(spec.name()) {
                return Err(Error::DuplicateProperty {
                    type_name: name,
                    property: spec.name,
                });
            }
            if let Some(default) = spec.default.take() {
                let default = spec.constraint.coerce(default);
                if default.contains_refs() || !spec.constraint.check(&default, self, &NoModels) {
                    return Err(InvalidValueError::new(&spec.name, default, &spec.constraint).into());
                }
                spec.default = Some(default);
            }
            assert!(
                properties.len() < usize::from(u16::MAX),
                "Too many properties on type '{name}' (max {})",
                u16::MAX
            );
            #[expect(clippy::cast_possible_truncation, reason = "checked above")]
            let id = PropertyId::new(properties.len() as u16);
            by_name.insert(spec.name.clone(), id);
            properties.push(spec);
        }

        assert!(
            self.types.len() < usize::from(u16::MAX),
            "Too many types registered (max {})",
            u16::MAX
        );
        #[expect(clippy::cast_possible_truncation, reason = "checked above")]
        let key = TypeKey::new(self.types.len() as u16);
        lineage.insert(0, key);

        tracing::debug!(
            type_name = %name,
            properties = properties.len(),
            inherited = own_start,
            is_abstract,
            "registered model type"
        );

        self.by_name.insert(name.clone(), key);
        self.types.push(TypeDescriptor {
            key,
            name,
            parent,
            is_abstract,
            properties,
            own_start,
            by_name,
            lineage,
        });
        Ok(key)
    }

    /// Looks up a type by name.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownType`] if no such type is registered.
    pub fn resolve(&self, name: &str) -> Result<&TypeDescriptor> {
        self.by_name
            .get(name)
            .map(|key| &self.types[usize::from(key.index())])
            .ok_or_else(|| Error::UnknownType(name.into()))
    }

    /// Returns the key of a type by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<TypeKey> {
        self.by_name.get(name).copied()
    }

    /// Returns the descriptor for a key.
    #[must_use]
    pub fn get(&self, key: TypeKey) -> Option<&TypeDescriptor> {
        self.types.get(usize::from(key.index()))
    }

    /// Returns the descriptor for a key minted by this registry.
    pub(crate) fn descriptor(&self, key: TypeKey) -> &TypeDescriptor {
        &self.types[usize::from(key.index())]
    }

    /// Returns `true` if `ty` is `base` or inherits from it.
    #[must_use]
    pub fn is_subtype(&self, ty: TypeKey, base: TypeKey) -> bool {
        self.get(ty).is_some_and(|d| d.lineage.contains(&base))
    }

    /// Returns the number of registered types.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns every registered type, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }
}

impl core::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("count", &self.types.len())
            .field(
                "types",
                &self.types.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
