// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Demo catalog and chart builders for Understory Model.
//!
//! - [`catalog`] registers a handful of plotting model types.
//! - [`plotting`] adds glyphs, side panels and titles to a plot.
//! - [`data`] generates synthetic county polygons and rates.
//! - [`choropleth`] assembles them into a validated document.
//! - [`html`] wraps an embed payload in a standalone page.
//!
//! The `choropleth` binary ties these together:
//!
//! ```text
//! cargo run -p understory_model_demos --bin choropleth -- --output map.html
//! ```

pub mod catalog;
pub mod choropleth;
pub mod data;
pub mod html;
pub mod plotting;
