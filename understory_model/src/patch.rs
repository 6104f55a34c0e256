// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental sync: snapshots, patch draining and patch application.
//!
//! A producer document calls [`Document::snapshot`] once to send its full
//! graph, then [`Document::drain_patches`] after each batch of mutations. A
//! mirror built from the snapshot stays equal to the producer by applying
//! every drained batch, in order, with [`Document::apply_patches`].
//!
//! The producer tracks which nodes the mirror has a record of. A node first
//! reaches the mirror whole, as an entry in some patch's `references`, and
//! only later writes to it travel as `set` operations.

use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::change::Change;
use crate::deserialize::insert_records;
use crate::document::Document;
use crate::error::Result;
use crate::id::ModelId;
use crate::serialize::GraphSerializer;
use crate::wire::{WireGraph, WireNode, decode_value, encode_value, malformed};

/// One change to apply to a mirror, in wire form.
///
/// Encoded as JSON objects tagged by `op`:
///
/// ```json
/// {"op": "set", "id": 3, "property": "fill_alpha", "value": 0.5}
/// {"op": "add_root", "id": 9, "references": [{"id": 9, "type": "Plot", "attributes": {}}]}
/// {"op": "remove_root", "id": 9}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchOp {
    /// A property write on a node the mirror already has.
    Set {
        /// The written model's serial.
        id: u64,
        /// The property name.
        property: String,
        /// The encoded new value.
        value: serde_json::Value,
        /// Records for nodes the value references that the mirror lacks.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        references: Vec<WireNode>,
    },
    /// A new root.
    AddRoot {
        /// The root's serial.
        id: u64,
        /// Records for the root and everything it reaches that the mirror
        /// lacks.
        #[serde(default)]
        references: Vec<WireNode>,
    },
    /// A removed root.
    RemoveRoot {
        /// The root's serial.
        id: u64,
    },
}

impl PatchOp {
    /// Returns the serial of the model this operation targets.
    #[must_use]
    pub fn id(&self) -> u64 {
        match self {
            Self::Set { id, .. } | Self::AddRoot { id, .. } | Self::RemoveRoot { id } => *id,
        }
    }

    /// Returns the records carried along with this operation.
    #[must_use]
    pub fn references(&self) -> &[WireNode] {
        match self {
            Self::Set { references, .. } | Self::AddRoot { references, .. } => references,
            Self::RemoveRoot { .. } => &[],
        }
    }
}

/// Encodes a batch of patches as a JSON array.
///
/// # Errors
///
/// [`Error::Malformed`](crate::Error::Malformed) if encoding fails.
pub fn patches_to_json(patches: &[PatchOp]) -> Result<String> {
    serde_json::to_string(patches).map_err(malformed)
}

/// Decodes a batch of patches from a JSON array.
///
/// # Errors
///
/// [`Error::Malformed`](crate::Error::Malformed) if the text is not a patch array.
pub fn patches_from_json(text: &str) -> Result<Vec<PatchOp>> {
    serde_json::from_str(text).map_err(malformed)
}

impl Document {
    /// Serializes the document and starts recording changes.
    ///
    /// The returned graph is the mirror's starting point; every node in it is
    /// considered known to the mirror. Pending changes from before the
    /// snapshot are discarded.
    pub fn snapshot(&mut self) -> WireGraph {
        self.recompute_reachability();
        let graph = GraphSerializer::new(self).serialize();
        self.log.start(graph.nodes.iter().map(|node| node.id));
        tracing::debug!(
            document = %self.id(),
            nodes = graph.nodes.len(),
            "took snapshot"
        );
        graph
    }

    /// Returns `true` once [`snapshot`](Self::snapshot) has been taken.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.log.is_recording()
    }

    /// Returns the number of changes recorded since the last drain.
    #[must_use]
    pub fn pending_changes(&self) -> usize {
        self.log.pending().len()
    }

    /// Turns the pending changes into patches, in the order they were made.
    ///
    /// Reachability is settled first and nodes that left the closure are
    /// dropped from the sync state, so they are re-sent whole if they come
    /// back. Writes to nodes the mirror has no record of are skipped; their
    /// current state travels with the record. Every operation carries the
    /// records of whatever it newly makes reachable for the mirror, in
    /// discovery order.
    ///
    /// A second call with no changes in between returns an empty batch.
    pub fn drain_patches(&mut self) -> Vec<PatchOp> {
        self.recompute_reachability();
        let gone: Vec<u64> = self
            .log
            .synced()
            .filter(|serial| !self.is_attached(ModelId::new(self.id(), *serial)))
            .collect();
        self.log.forget(gone);

        let changes = self.log.take();
        let mut patches = Vec::with_capacity(changes.len());
        let mut dropped = 0_usize;
        for change in changes {
            match change {
                Change::Set {
                    model,
                    property,
                    value,
                } => {
                    if !self.log.is_synced(model.serial()) {
                        tracing::trace!(model = %model, "dropped write to unsynced model");
                        dropped += 1;
                        continue;
                    }
                    let Some(name) = self
                        .descriptor(model)
                        .map(|ty| String::from(ty.spec(property).name()))
                    else {
                        dropped += 1;
                        continue;
                    };
                    let references = self.unsynced_records(&value.refs());
                    patches.push(PatchOp::Set {
                        id: model.serial(),
                        property: name,
                        value: encode_value(&value),
                        references,
                    });
                }
                Change::AddRoot(root) => {
                    let references = self.unsynced_records(&[root]);
                    patches.push(PatchOp::AddRoot {
                        id: root.serial(),
                        references,
                    });
                }
                Change::RemoveRoot(root) => {
                    patches.push(PatchOp::RemoveRoot { id: root.serial() });
                }
            }
        }
        tracing::debug!(
            document = %self.id(),
            patches = patches.len(),
            dropped,
            "drained patches"
        );
        patches
    }

    /// Encodes the closure of `starts` that the mirror lacks and marks it
    /// synced.
    fn unsynced_records(&mut self, starts: &[ModelId]) -> Vec<WireNode> {
        let ids = self.walk(starts, |serial| self.log.is_synced(serial));
        if ids.is_empty() {
            return Vec::new();
        }
        let records = GraphSerializer::new(self).records(&ids);
        for id in &ids {
            self.log.mark_synced(id.serial());
        }
        records
    }

    /// Applies patches drained from another document.
    ///
    /// Each operation first inserts the records it carries, then takes
    /// effect exactly as the matching local call would: observers are
    /// notified and reachability is settled. Applied operations are not
    /// recorded as local changes.
    ///
    /// Operations apply in order. If one fails, the ones before it stay
    /// applied and the rest are skipped.
    ///
    /// # Errors
    ///
    /// Any error decoding a record or value, as for
    /// [`GraphDeserializer`](crate::GraphDeserializer), or any error the
    /// matching [`set`](Self::set), [`add_root`](Self::add_root) or
    /// [`remove_root`](Self::remove_root) reports.
    pub fn apply_patches(&mut self, patches: &[PatchOp]) -> Result<()> {
        let was_recording = self.log.set_recording(false);
        let result = patches.iter().try_for_each(|patch| self.apply_patch(patch));
        self.log.set_recording(was_recording);
        tracing::debug!(
            document = %self.id(),
            patches = patches.len(),
            ok = result.is_ok(),
            "applied patches"
        );
        result
    }

    fn apply_patch(&mut self, patch: &PatchOp) -> Result<()> {
        for id in insert_records(self, patch.references(), true)? {
            self.log.mark_synced(id.serial());
        }
        let target = ModelId::new(self.id(), patch.id());
        match patch {
            PatchOp::Set {
                id,
                property,
                value,
                ..
            } => {
                let doc_id = self.id();
                let value = decode_value(value, &mut |serial| {
                    let id = ModelId::new(doc_id, serial);
                    self.contains(id).then_some(id)
                })
                .map_err(|e| e.at(*id, property))?;
                self.set(target, property, value)?;
                self.recompute_reachability();
            }
            PatchOp::AddRoot { .. } => self.add_root(target)?,
            PatchOp::RemoveRoot { .. } => self.remove_root(target)?,
        }
        Ok(())
    }
}

