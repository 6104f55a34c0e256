// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Model: typed model graphs with a reference-based wire format.
//!
//! A chart, dashboard or scene is described as a graph of typed, mutable,
//! cross-referencing models. This crate holds that graph and turns it into a
//! flat wire format a separate runtime can rebuild, then keeps the runtime in
//! sync with incremental patches.
//!
//! ## Core Concepts
//!
//! ### Types and Properties
//!
//! A [`TypeRegistry`] maps type names to [`TypeDescriptor`]s. Each type lists
//! [`PropertySpec`]s, inherits its parent's, and may be abstract. Every
//! property carries a [`Constraint`] that is checked on every write, so a
//! document never holds a value its type rejects.
//!
//! ### Documents
//!
//! A [`Document`] owns its nodes in an arena. References between models are
//! [`ModelId`]s, which makes cycles ordinary data. Nodes reachable from the
//! document's roots are *attached*; the rest are *detached* but still owned.
//!
//! ### Wire Format and Sync
//!
//! - [`GraphSerializer`] / [`GraphDeserializer`] convert between documents and
//!   [`WireGraph`]s, one record per node, references as `{"ref": id}`.
//! - [`Document::snapshot`] starts a sync session and
//!   [`Document::drain_patches`] turns later mutations into [`PatchOp`]s.
//! - [`Document::apply_patches`] replays those patches on a mirror.
//! - [`embed::standalone`] packages a validated document for a page.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use understory_model::{
//!     Constraint, Document, GraphDeserializer, PropertySpec, TypeBuilder, TypeRegistry,
//! };
//!
//! let mut registry = TypeRegistry::new();
//! registry
//!     .register(
//!         TypeBuilder::new("Glyph")
//!             .property(PropertySpec::new("fill_alpha", Constraint::float_range(0.0, 1.0))
//!                 .with_default(1.0)),
//!     )
//!     .unwrap();
//! registry
//!     .register(TypeBuilder::new("Plot").property(PropertySpec::new(
//!         "renderers",
//!         Constraint::seq_of(Constraint::instance("Glyph")),
//!     )))
//!     .unwrap();
//! let registry = Arc::new(registry);
//!
//! let mut doc = Document::new(Arc::clone(&registry));
//! let plot = doc.create("Plot").unwrap();
//! let glyph = doc.create("Glyph").unwrap();
//! doc.set(glyph, "fill_alpha", 0.7).unwrap();
//! doc.push(plot, "renderers", glyph).unwrap();
//! doc.add_root(plot).unwrap();
//!
//! // Out-of-range writes are rejected and leave the old value in place.
//! assert!(doc.set(glyph, "fill_alpha", 1.7).is_err());
//!
//! // Keep a mirror in sync.
//! let mut mirror = GraphDeserializer::new(registry).deserialize(&doc.snapshot()).unwrap();
//! doc.set(glyph, "fill_alpha", 0.3).unwrap();
//! mirror.apply_patches(&doc.drain_patches()).unwrap();
//!
//! let mirrored = mirror.roots()[0];
//! assert_eq!(mirrored.serial(), plot.serial());
//! ```
//!
//! ## Logging
//!
//! Registration, root changes, reachability, (de)serialization and patch
//! traffic emit `tracing` events at `debug` level. Skipped writes during a
//! drain are logged at `trace`.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod change;
mod constraint;
mod deserialize;
mod document;
pub mod embed;
mod error;
mod id;
mod node;
mod patch;
mod registry;
mod serialize;
mod value;
mod wire;

pub use change::{ChangeCallback, ObserverId, PropertyChange};
pub use constraint::Constraint;
pub use deserialize::GraphDeserializer;
pub use document::{Document, ReachabilityDelta};
pub use error::{Error, InvalidValueError, Result, ValidationError, Violation};
pub use id::{DocumentId, ModelId, PropertyId, TypeKey};
pub use node::ModelNode;
pub use patch::{PatchOp, patches_from_json, patches_to_json};
pub use registry::{PropertySpec, TypeBuilder, TypeDescriptor, TypeRegistry};
pub use serialize::{GraphSerializer, SerializeOptions, serialize};
pub use value::Value;
pub use wire::{WireGraph, WireNode, encode_value};
