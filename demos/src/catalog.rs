// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small plotting catalog.
//!
//! Enough model types to describe a choropleth: column data, a linear color
//! mapper, patches, glyph renderers, a color bar, a title and a plot with the
//! usual side panels.
//!
//! | Type                | Parent        | Abstract |
//! |---------------------|---------------|----------|
//! | `Model`             |               | yes      |
//! | `DataSource`        | `Model`       | yes      |
//! | `ColumnDataSource`  | `DataSource`  |          |
//! | `ColorMapper`       | `Model`       | yes      |
//! | `LinearColorMapper` | `ColorMapper` |          |
//! | `Glyph`             | `Model`       | yes      |
//! | `Patches`           | `Glyph`       |          |
//! | `Renderer`          | `Model`       | yes      |
//! | `GlyphRenderer`     | `Renderer`    |          |
//! | `Annotation`        | `Renderer`    | yes      |
//! | `ColorBar`          | `Annotation`  |          |
//! | `Title`             | `Annotation`  |          |
//! | `Plot`              | `Model`       |          |

use std::sync::Arc;

use understory_model::{Constraint, PropertySpec, Result, TypeBuilder, TypeRegistry};

/// Where a legend, axis or annotation can be placed on a plot.
pub const LOCATIONS: [&str; 4] = ["above", "below", "left", "right"];

/// Registers every catalog type into `registry`.
///
/// # Errors
///
/// Fails if any catalog type name is already registered.
pub fn register(registry: &mut TypeRegistry) -> Result<()> {
    for ty in types() {
        registry.register(ty)?;
    }
    Ok(())
}

/// Builds a fresh registry holding only the catalog.
///
/// # Errors
///
/// Never fails on an empty registry; the `Result` mirrors [`register`].
pub fn registry() -> Result<Arc<TypeRegistry>> {
    let mut registry = TypeRegistry::new();
    register(&mut registry)?;
    Ok(Arc::new(registry))
}

fn renderers() -> Constraint {
    Constraint::seq_of(Constraint::instance("Renderer"))
}

fn color() -> Constraint {
    Constraint::String
}

fn types() -> Vec<TypeBuilder> {
    vec![
        TypeBuilder::new("Model")
            .abstract_type()
            .property(PropertySpec::new(
                "name",
                Constraint::nullable(Constraint::String),
            ))
            .property(PropertySpec::new("tags", Constraint::seq_of(Constraint::Any))),
        TypeBuilder::new("DataSource").parent("Model").abstract_type(),
        TypeBuilder::new("ColumnDataSource")
            .parent("DataSource")
            .property(PropertySpec::new(
                "data",
                Constraint::map_of(Constraint::seq_of(Constraint::Any)),
            )),
        TypeBuilder::new("ColorMapper")
            .parent("Model")
            .abstract_type()
            .property(PropertySpec::new("palette", Constraint::seq_of(color())))
            .property(PropertySpec::new("nan_color", color()).with_default("gray")),
        TypeBuilder::new("LinearColorMapper")
            .parent("ColorMapper")
            .properties([
                PropertySpec::new("low", Constraint::nullable(Constraint::float())),
                PropertySpec::new("high", Constraint::nullable(Constraint::float())),
            ]),
        TypeBuilder::new("Glyph").parent("Model").abstract_type(),
        TypeBuilder::new("Patches").parent("Glyph").properties([
            PropertySpec::new("xs", Constraint::String).with_default("xs"),
            PropertySpec::new("ys", Constraint::String).with_default("ys"),
            // A literal color, or a field mapped through a transform.
            PropertySpec::new(
                "fill_color",
                Constraint::union([color(), Constraint::map_of(Constraint::Any)]),
            )
            .with_default("gray"),
            PropertySpec::new("fill_alpha", Constraint::float_range(0.0, 1.0)).with_default(1.0),
            PropertySpec::new("line_color", Constraint::nullable(color())).with_default("black"),
            PropertySpec::new("line_width", Constraint::float_at_least(0.0)).with_default(1.0),
        ]),
        TypeBuilder::new("Renderer")
            .parent("Model")
            .abstract_type()
            .property(PropertySpec::new("visible", Constraint::Bool).with_default(true)),
        TypeBuilder::new("GlyphRenderer").parent("Renderer").properties([
            PropertySpec::new("data_source", Constraint::instance("DataSource")),
            PropertySpec::new("glyph", Constraint::instance("Glyph")),
        ]),
        TypeBuilder::new("Annotation").parent("Renderer").abstract_type(),
        TypeBuilder::new("ColorBar").parent("Annotation").properties([
            PropertySpec::new("color_mapper", Constraint::instance("ColorMapper")),
            PropertySpec::new(
                "orientation",
                Constraint::enumeration(["auto", "vertical", "horizontal"]),
            ),
            PropertySpec::new("title", Constraint::nullable(Constraint::String)),
        ]),
        TypeBuilder::new("Title").parent("Annotation").properties([
            PropertySpec::new("text", Constraint::String),
            PropertySpec::new("align", Constraint::enumeration(["left", "center", "right"])),
        ]),
        TypeBuilder::new("Plot").parent("Model").properties([
            PropertySpec::new("width", Constraint::int_at_least(0)).with_default(600),
            PropertySpec::new("height", Constraint::int_at_least(0)).with_default(600),
            PropertySpec::new("title", Constraint::nullable(Constraint::instance("Title"))),
            PropertySpec::new(
                "toolbar_location",
                Constraint::nullable(Constraint::enumeration(LOCATIONS)),
            )
            .with_default("right"),
            PropertySpec::new("min_border", Constraint::nullable(Constraint::int_at_least(0)))
                .with_default(5),
            PropertySpec::new("border_fill_color", color()).with_default("#ffffff"),
            PropertySpec::new("renderers", renderers()),
            PropertySpec::new("left", renderers()),
            PropertySpec::new("right", renderers()),
            PropertySpec::new("above", renderers()),
            PropertySpec::new("below", renderers()),
            PropertySpec::new("center", renderers()),
        ]),
    ]
}
