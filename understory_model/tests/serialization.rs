// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for serializing and rebuilding whole documents.
//!
//! These use a small plotting catalog to check the wire format, round trips,
//! determinism, cycles and the error paths of the deserializer.

mod common;

use serde_json::json;
use understory_model::{
    Document, Error, GraphDeserializer, GraphSerializer, SerializeOptions, Value, serialize,
};

use common::{catalog, chart};

#[test]
fn chart_round_trips() {
    let registry = catalog();
    let mut doc = Document::new(registry.clone());
    let chart = chart(&mut doc);
    doc.add_root(chart.plot).unwrap();

    let graph = serialize(&doc);
    let text = graph.to_json().unwrap();
    let rebuilt = GraphDeserializer::new(registry).from_json(&text).unwrap();

    assert_eq!(serialize(&rebuilt), graph);
    assert_eq!(rebuilt.all_nodes().len(), doc.all_nodes().len());
    assert_ne!(rebuilt.id(), doc.id());
}

#[test]
fn records_follow_discovery_order() {
    let mut doc = Document::new(catalog());
    let chart = chart(&mut doc);
    doc.add_root(chart.plot).unwrap();

    let graph = serialize(&doc);
    let order: Vec<_> = graph.nodes.iter().map(|node| node.id).collect();
    assert_eq!(
        order,
        [
            chart.plot.serial(),
            chart.renderer.serial(),
            chart.source.serial(),
            chart.glyph.serial(),
            chart.mapper.serial(),
        ]
    );
    assert_eq!(graph.roots, [chart.plot.serial()]);
}

#[test]
fn mapped_fill_color_encodes_reference_in_map() {
    let mut doc = Document::new(catalog());
    let chart = chart(&mut doc);
    doc.add_root(chart.plot).unwrap();

    let graph = serialize(&doc);
    let glyph = graph.node(chart.glyph.serial()).unwrap();
    assert_eq!(
        glyph.attributes["fill_color"],
        json!({"map": {"field": "rate", "transform": {"ref": chart.mapper.serial()}}})
    );
}

#[test]
fn equal_documents_serialize_identically() {
    let build = || {
        let mut doc = Document::new(catalog());
        let chart = chart(&mut doc);
        doc.set(chart.glyph, "line_width", 0.5).unwrap();
        doc.add_root(chart.plot).unwrap();
        serialize(&doc).to_json().unwrap()
    };
    assert_eq!(build(), build());
}

#[test]
fn shared_targets_serialize_once() {
    let mut doc = Document::new(catalog());
    let chart = chart(&mut doc);
    let bar = doc
        .create_with("ColorBar", [("color_mapper", chart.mapper)])
        .unwrap();
    doc.push(chart.plot, "right", bar).unwrap();
    // The mapper is reachable from the glyph and from the color bar.
    doc.add_root(chart.plot).unwrap();
    doc.add_root(bar).unwrap();

    let graph = serialize(&doc);
    assert_eq!(graph.nodes.len(), 6);
    assert_eq!(
        graph
            .nodes
            .iter()
            .filter(|node| node.id == chart.mapper.serial())
            .count(),
        1
    );
}

#[test]
fn layout_list_holds_reference_wrappers() {
    let mut doc = Document::new(catalog());
    let chart = chart(&mut doc);
    let bar = doc
        .create_with(
            "ColorBar",
            [
                ("color_mapper", Value::Ref(chart.mapper)),
                ("orientation", Value::from("vertical")),
            ],
        )
        .unwrap();
    doc.push(chart.plot, "right", bar).unwrap();
    doc.add_root(chart.plot).unwrap();

    let graph = serialize(&doc);
    let plot = graph.node(chart.plot.serial()).unwrap();
    assert_eq!(plot.attributes["right"], json!([{"ref": bar.serial()}]));
    assert!(graph.node(bar.serial()).is_some());
}

#[test]
fn out_of_range_alpha_is_rejected() {
    let mut doc = Document::new(catalog());
    let chart = chart(&mut doc);
    doc.set(chart.glyph, "fill_alpha", 0.7).unwrap();

    let err = doc.set(chart.glyph, "fill_alpha", 1.7).unwrap_err();
    assert!(err.to_string().contains("[0, 1]"), "{err}");
    assert!(err.to_string().contains("fill_alpha"), "{err}");
    assert_eq!(doc.get(chart.glyph, "fill_alpha").unwrap(), &Value::Float(0.7));
}

#[test]
fn unknown_type_produces_no_document() {
    let text = r#"{"roots":[1],"nodes":[{"id":1,"type":"Frobnicator","attributes":{}}]}"#;
    let result = GraphDeserializer::new(catalog()).from_json(text);
    assert_eq!(
        result.unwrap_err(),
        Error::UnknownType("Frobnicator".into())
    );
}

#[test]
fn include_defaults_emits_every_set_or_defaulted_property() {
    let mut doc = Document::new(catalog());
    let chart = chart(&mut doc);
    doc.add_root(chart.plot).unwrap();

    let full = GraphSerializer::new(&doc)
        .with_options(SerializeOptions::new().include_defaults(true))
        .serialize();
    let plot = full.node(chart.plot.serial()).unwrap();
    assert_eq!(plot.attributes["width"], json!(600));
    assert_eq!(plot.attributes["name"], json!(null));

    let rebuilt = GraphDeserializer::new(catalog()).deserialize(&full).unwrap();
    let again = GraphSerializer::new(&rebuilt)
        .with_options(SerializeOptions::new().include_defaults(true))
        .serialize();
    assert_eq!(again, full);
}
