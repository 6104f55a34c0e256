// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Standalone embedding payloads.
//!
//! [`standalone`] packages a validated document as the data a page needs to
//! boot a rendering runtime: the serialized graph keyed by document id, plus
//! one [`RenderItem`] telling the runtime which roots go into which page
//! elements. Producing the page itself is left to the caller.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Result;
use crate::serialize::GraphSerializer;
use crate::wire::{WireGraph, malformed};

/// Version string stamped into every payload.
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One serialized document inside [`EmbedPayload::docs_json`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocJson {
    /// The document title.
    pub title: String,
    /// The producing library version.
    pub version: String,
    /// The serialized graph.
    pub graph: WireGraph,
}

/// Which roots of which document render into which page elements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderItem {
    /// Key into [`EmbedPayload::docs_json`].
    pub doc_id: String,
    /// Root serials, in root order.
    pub root_ids: Vec<u64>,
    /// Page element ids, one per root.
    pub element_ids: Vec<String>,
}

/// Everything a page needs to render a document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbedPayload {
    /// The page title.
    pub title: String,
    /// The producing library version.
    pub version: String,
    /// Serialized documents by id.
    pub docs_json: BTreeMap<String, DocJson>,
    /// Render targets.
    pub render_items: Vec<RenderItem>,
}

impl EmbedPayload {
    /// Encodes [`docs_json`](Self::docs_json) as JSON text, for inlining into
    /// a page.
    ///
    /// # Errors
    ///
    /// [`Error::Malformed`](crate::Error::Malformed) if encoding fails.
    pub fn docs_json_text(&self) -> Result<String> {
        serde_json::to_string(&self.docs_json).map_err(malformed)
    }

    /// Encodes [`render_items`](Self::render_items) as JSON text.
    ///
    /// # Errors
    ///
    /// [`Error::Malformed`](crate::Error::Malformed) if encoding fails.
    pub fn render_items_text(&self) -> Result<String> {
        serde_json::to_string(&self.render_items).map_err(malformed)
    }
}

/// Builds the payload for one document.
///
/// The document is validated first; an invalid document never reaches a page.
///
/// # Errors
///
/// [`Error::Validation`](crate::Error::Validation) listing every violation.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use understory_model::{Constraint, Document, PropertySpec, TypeBuilder, TypeRegistry, embed};
///
/// let mut registry = TypeRegistry::new();
/// registry
///     .register(TypeBuilder::new("Title").property(PropertySpec::new("text", Constraint::String)))
///     .unwrap();
///
/// let mut doc = Document::new(Arc::new(registry));
/// doc.set_title("Rates");
/// let title = doc.create_with("Title", [("text", "Rates")]).unwrap();
/// doc.add_root(title).unwrap();
///
/// let payload = embed::standalone(&doc).unwrap();
/// let item = &payload.render_items[0];
/// assert_eq!(item.root_ids, [title.serial()]);
/// assert_eq!(payload.docs_json[&item.doc_id].graph.nodes.len(), 1);
/// assert_eq!(payload.title, "Rates");
/// ```
pub fn standalone(document: &Document) -> Result<EmbedPayload> {
    document.validate()?;

    let doc_id = document.id().to_string();
    let graph = GraphSerializer::new(document).serialize();
    let item = RenderItem {
        doc_id: doc_id.clone(),
        root_ids: graph.roots.clone(),
        element_ids: graph
            .roots
            .iter()
            .map(|serial| format!("{doc_id}-root-{serial}"))
            .collect(),
    };
    tracing::debug!(
        document = %doc_id,
        roots = item.root_ids.len(),
        nodes = graph.nodes.len(),
        "built standalone payload"
    );

    let mut docs_json = BTreeMap::new();
    docs_json.insert(
        doc_id,
        DocJson {
            title: document.title().into(),
            version: RUNTIME_VERSION.into(),
            graph,
        },
    );
    Ok(EmbedPayload {
        title: document.title().into(),
        version: RUNTIME_VERSION.into(),
        docs_json,
        render_items: alloc::vec![item],
    })
}
