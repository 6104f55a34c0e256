// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plot conveniences over [`Document::push`].

use core::fmt;
use core::str::FromStr;

use understory_model::{Document, ModelId, Result, Value};

/// A side panel of a plot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// The `left` panel.
    Left,
    /// The `right` panel.
    Right,
    /// The `above` panel.
    Above,
    /// The `below` panel.
    Below,
    /// The central plot area.
    Center,
}

impl Side {
    /// Every side, in panel order.
    pub const ALL: [Self; 5] = [Self::Left, Self::Right, Self::Above, Self::Below, Self::Center];

    /// The plot property holding this side's renderers.
    #[must_use]
    pub const fn property(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Above => "above",
            Self::Below => "below",
            Self::Center => "center",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.property())
    }
}

/// Error returned when parsing an unknown [`Side`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown side `{0}`")]
pub struct UnknownSide(pub String);

impl FromStr for Side {
    type Err = UnknownSide;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|side| side.property() == s)
            .ok_or_else(|| UnknownSide(s.into()))
    }
}

/// Creates a `GlyphRenderer` drawing `glyph` from `source` and appends it to
/// the plot's renderers.
///
/// The renderer is created first; if appending fails it stays in the
/// document, detached.
///
/// # Errors
///
/// Whatever [`Document::create_with`] or [`Document::push`] report, for
/// instance when `source` is not a data source.
pub fn add_glyph(
    doc: &mut Document,
    plot: ModelId,
    source: ModelId,
    glyph: ModelId,
) -> Result<ModelId> {
    let renderer = doc.create_with(
        "GlyphRenderer",
        [("data_source", source), ("glyph", glyph)],
    )?;
    doc.push(plot, "renderers", renderer)?;
    Ok(renderer)
}

/// Appends `obj` to the plot's `side` panel.
///
/// # Errors
///
/// Whatever [`Document::push`] reports.
pub fn add_layout(doc: &mut Document, plot: ModelId, obj: ModelId, side: Side) -> Result<()> {
    doc.push(plot, side.property(), obj)
}

/// Creates a `Title` with `text` and sets it as the plot's title.
///
/// # Errors
///
/// Whatever [`Document::create_with`] or [`Document::set`] report.
pub fn set_title(doc: &mut Document, plot: ModelId, text: &str) -> Result<ModelId> {
    let title = doc.create_with("Title", [("text", text)])?;
    doc.set(plot, "title", title)?;
    Ok(title)
}

/// A column mapped through a transform model, as accepted by properties like
/// `fill_color`.
#[must_use]
pub fn transform(field: &str, transform: ModelId) -> Value {
    Value::Map(
        [
            ("field".to_owned(), Value::from(field)),
            ("transform".to_owned(), Value::Ref(transform)),
        ]
        .into_iter()
        .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn sides_parse_and_print() {
        for side in Side::ALL {
            assert_eq!(side.to_string().parse::<Side>(), Ok(side));
        }
        assert_eq!(
            "middle".parse::<Side>(),
            Err(UnknownSide("middle".into()))
        );
        let err = "middle".parse::<Side>().unwrap_err();
        assert_eq!(err.to_string(), "unknown side `middle`");
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn add_glyph_links_source_and_glyph() {
        let mut doc = Document::new(catalog::registry().unwrap());
        let plot = doc.create("Plot").unwrap();
        let source = doc.create("ColumnDataSource").unwrap();
        let glyph = doc.create("Patches").unwrap();

        let renderer = add_glyph(&mut doc, plot, source, glyph).unwrap();
        assert_eq!(doc.get(renderer, "data_source").unwrap(), &Value::Ref(source));
        assert_eq!(doc.get(renderer, "glyph").unwrap(), &Value::Ref(glyph));
        assert_eq!(
            doc.get(plot, "renderers").unwrap(),
            &Value::Seq(vec![Value::Ref(renderer)])
        );

        doc.add_root(plot).unwrap();
        assert_eq!(doc.all_nodes(), [plot, renderer, source, glyph]);
    }

    #[test]
    fn add_glyph_rejects_swapped_arguments() {
        let mut doc = Document::new(catalog::registry().unwrap());
        let plot = doc.create("Plot").unwrap();
        let source = doc.create("ColumnDataSource").unwrap();
        let glyph = doc.create("Patches").unwrap();

        assert!(add_glyph(&mut doc, plot, glyph, source).is_err());
        assert_eq!(doc.get(plot, "renderers").unwrap(), &Value::Seq(Vec::new()));
    }

    #[test]
    fn add_layout_appends_to_the_side() {
        let mut doc = Document::new(catalog::registry().unwrap());
        let plot = doc.create("Plot").unwrap();
        let mapper = doc.create("LinearColorMapper").unwrap();
        let bar = doc
            .create_with("ColorBar", [("color_mapper", mapper)])
            .unwrap();

        add_layout(&mut doc, plot, bar, Side::Left).unwrap();
        assert_eq!(
            doc.get(plot, "left").unwrap(),
            &Value::Seq(vec![Value::Ref(bar)])
        );
        assert_eq!(doc.get(plot, "right").unwrap(), &Value::Seq(Vec::new()));

        // Only renderers fit in a panel.
        assert!(add_layout(&mut doc, plot, mapper, Side::Right).is_err());
    }

    #[test]
    fn title_is_a_reference() {
        let mut doc = Document::new(catalog::registry().unwrap());
        let plot = doc.create("Plot").unwrap();
        let title = set_title(&mut doc, plot, "Rates").unwrap();
        assert_eq!(doc.get(plot, "title").unwrap(), &Value::Ref(title));
        assert_eq!(doc.get(title, "text").unwrap(), &Value::from("Rates"));
    }
}
