// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity types.
//!
//! This module provides [`DocumentId`] and [`ModelId`] for model identity, and
//! the compact registry handles [`TypeKey`] and [`PropertyId`].

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

/// Identifies a [`Document`](crate::Document) for the lifetime of the process.
///
/// Every document draws a fresh id on construction, so two documents never
/// share one, even when one is deserialized from the other.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u32);

impl DocumentId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying index of this document ID.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DocumentId").field(&self.0).finish()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

/// The identity of a model node.
///
/// A `ModelId` pairs the minting document with a per-document serial number.
/// The serial is what travels over the wire; the document half lets a
/// [`Document`](crate::Document) reject handles that belong to another
/// document instead of silently resolving them against its own nodes.
///
/// Serials are assigned from a monotonically increasing counter and never
/// reused within a document, so a `ModelId` stays valid and unique for as
/// long as its node lives.
///
/// # Ordering
///
/// Ids order by document, then by serial. Within one document this is
/// creation order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId {
    document: DocumentId,
    serial: u64,
}

impl ModelId {
    pub(crate) const fn new(document: DocumentId, serial: u64) -> Self {
        Self { document, serial }
    }

    /// Returns the document that owns this model.
    #[must_use]
    #[inline]
    pub const fn document(self) -> DocumentId {
        self.document
    }

    /// Returns the wire identity of this model.
    #[must_use]
    #[inline]
    pub const fn serial(self) -> u64 {
        self.serial
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelId({}, m{})", self.document, self.serial)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.serial)
    }
}

/// A registered model type.
///
/// This is a lightweight handle (u16) into a
/// [`TypeRegistry`](crate::TypeRegistry). It is only meaningful for the
/// registry that produced it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeKey(u16);

impl TypeKey {
    pub(crate) const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the underlying index of this type key.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.0).finish()
    }
}

/// A property slot within a [`TypeDescriptor`](crate::TypeDescriptor).
///
/// Inherited properties keep their parent's ids, and a type's own properties
/// follow them, so a `PropertyId` is valid on every subtype of the type that
/// declared it. Ids sort in declaration order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyId(u16);

impl PropertyId {
    /// Creates a property ID from the given slot index.
    #[must_use]
    #[inline]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the underlying slot index of this property ID.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropertyId").field(&self.0).finish()
    }
}
