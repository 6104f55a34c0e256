// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small plotting catalog shared by the integration tests.

#![allow(
    missing_docs,
    reason = "Integration-test helper module; not part of the public API."
)]

use std::sync::Arc;

use understory_model::{
    Constraint, Document, ModelId, PropertySpec, TypeBuilder, TypeRegistry, Value,
};

pub(crate) fn catalog() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::new();
    let types = [
        TypeBuilder::new("Model")
            .abstract_type()
            .property(PropertySpec::new("name", Constraint::nullable(Constraint::String))),
        TypeBuilder::new("DataSource").parent("Model").abstract_type(),
        TypeBuilder::new("ColumnDataSource").parent("DataSource").property(PropertySpec::new(
            "data",
            Constraint::map_of(Constraint::seq_of(Constraint::Any)),
        )),
        TypeBuilder::new("ColorMapper")
            .parent("Model")
            .abstract_type()
            .property(PropertySpec::new("palette", Constraint::seq_of(Constraint::String))),
        TypeBuilder::new("LinearColorMapper")
            .parent("ColorMapper")
            .property(PropertySpec::new("low", Constraint::nullable(Constraint::float())))
            .property(PropertySpec::new("high", Constraint::nullable(Constraint::float()))),
        TypeBuilder::new("Glyph").parent("Model").abstract_type(),
        TypeBuilder::new("Patches")
            .parent("Glyph")
            .property(PropertySpec::new(
                "fill_color",
                Constraint::union([Constraint::String, Constraint::map_of(Constraint::Any)]),
            )
            .with_default("gray"))
            .property(
                PropertySpec::new("fill_alpha", Constraint::float_range(0.0, 1.0))
                    .with_default(1.0),
            )
            .property(
                PropertySpec::new("line_width", Constraint::float_at_least(0.0)).with_default(1.0),
            ),
        TypeBuilder::new("Renderer").parent("Model").abstract_type(),
        TypeBuilder::new("GlyphRenderer")
            .parent("Renderer")
            .property(PropertySpec::new("data_source", Constraint::instance("DataSource")))
            .property(PropertySpec::new("glyph", Constraint::instance("Glyph"))),
        TypeBuilder::new("ColorBar")
            .parent("Renderer")
            .property(PropertySpec::new("color_mapper", Constraint::instance("ColorMapper")))
            .property(PropertySpec::new(
                "orientation",
                Constraint::enumeration(["auto", "vertical", "horizontal"]),
            )),
        TypeBuilder::new("Plot")
            .parent("Model")
            .property(PropertySpec::new("width", Constraint::int_at_least(0)).with_default(600))
            .property(PropertySpec::new(
                "renderers",
                Constraint::seq_of(Constraint::instance("Renderer")),
            ))
            .property(PropertySpec::new(
                "right",
                Constraint::seq_of(Constraint::instance("Renderer")),
            )),
    ];
    for ty in types {
        registry.register(ty).unwrap();
    }
    Arc::new(registry)
}

#[allow(dead_code, reason = "Not every test binary reads every handle.")]
pub(crate) struct Chart {
    pub(crate) plot: ModelId,
    pub(crate) source: ModelId,
    pub(crate) glyph: ModelId,
    pub(crate) renderer: ModelId,
    pub(crate) mapper: ModelId,
}

/// Builds a plot with one patches renderer whose fill color is mapped
/// through a color mapper, without adding a root.
pub(crate) fn chart(doc: &mut Document) -> Chart {
    let source = doc
        .create_with(
            "ColumnDataSource",
            [(
                "data",
                Value::Map(
                    [
                        ("xs".to_owned(), Value::from(vec![[0.0, 1.0, 1.0].into_iter().collect::<Value>()])),
                        ("rate".to_owned(), Value::from(vec![Value::from(4.5)])),
                    ]
                    .into_iter()
                    .collect(),
                ),
            )],
        )
        .unwrap();
    let mapper = doc
        .create_with(
            "LinearColorMapper",
            [("palette", Value::from(vec![Value::from("#fff"), Value::from("#000")]))],
        )
        .unwrap();
    let fill: Value = Value::Map(
        [
            ("field".to_owned(), Value::from("rate")),
            ("transform".to_owned(), Value::Ref(mapper)),
        ]
        .into_iter()
        .collect(),
    );
    let glyph = doc.create_with("Patches", [("fill_color", fill)]).unwrap();
    let renderer = doc
        .create_with(
            "GlyphRenderer",
            [("data_source", Value::Ref(source)), ("glyph", Value::Ref(glyph))],
        )
        .unwrap();
    let plot = doc.create("Plot").unwrap();
    doc.push(plot, "renderers", renderer).unwrap();
    Chart {
        plot,
        source,
        glyph,
        renderer,
        mapper,
    }
}
