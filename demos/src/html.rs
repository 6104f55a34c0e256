// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A minimal standalone page around an [`EmbedPayload`].
//!
//! The page carries one element per render target and the serialized
//! documents as inert JSON script blocks. Loading the rendering runtime is
//! left to whoever serves the page; its expected version is stamped into a
//! `meta` tag.

use core::fmt::Write as _;

use askama_escape::{Html, escape};
use understory_model::Result;
use understory_model::embed::EmbedPayload;

/// Element id of the script block holding the serialized documents.
pub const DOCS_JSON_ID: &str = "understory-docs-json";
/// Element id of the script block holding the render items.
pub const RENDER_ITEMS_ID: &str = "understory-render-items";

/// Renders `payload` as a standalone HTML page.
///
/// # Errors
///
/// Fails only if the payload cannot be encoded as JSON.
pub fn file_html(payload: &EmbedPayload) -> Result<String> {
    let docs = script_safe(&payload.docs_json_text()?);
    let items = script_safe(&payload.render_items_text()?);

    let mut page = String::new();
    let _ = write!(
        page,
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"understory-runtime\" content=\"{version}\">\n\
         <title>{title}</title>\n\
         </head>\n\
         <body>\n",
        version = escape(&payload.version, Html),
        title = escape(&payload.title, Html),
    );
    for item in &payload.render_items {
        for element in &item.element_ids {
            let _ = writeln!(
                page,
                "<div id=\"{}\" data-doc-id=\"{}\"></div>",
                escape(element, Html),
                escape(&item.doc_id, Html)
            );
        }
    }
    let _ = write!(
        page,
        "<script type=\"application/json\" id=\"{DOCS_JSON_ID}\">{docs}</script>\n\
         <script type=\"application/json\" id=\"{RENDER_ITEMS_ID}\">{items}</script>\n\
         </body>\n\
         </html>\n"
    );
    Ok(page)
}

/// Keeps JSON from closing its script block early. `<\/` is still valid
/// JSON for `</` inside strings.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}
