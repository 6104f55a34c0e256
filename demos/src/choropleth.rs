// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An unemployment choropleth: counties filled through a linear color
//! mapper, state outlines on top and a color bar on the left.

use understory_model::{Document, ModelId, Result, Value};

use crate::catalog;
use crate::data::{CountyMap, Region};
use crate::plotting::{Side, add_glyph, add_layout, set_title, transform};

/// The eleven-step Viridis palette.
pub const VIRIDIS_11: [&str; 11] = [
    "#440154", "#482475", "#414487", "#355F8D", "#2A788E", "#21908D", "#22A784", "#42BE71",
    "#7AD151", "#BBDF27", "#FDE725",
];

/// Handles to the interesting models of a built choropleth.
#[derive(Debug)]
pub struct Choropleth {
    /// The document holding the chart; the plot is its only root.
    pub document: Document,
    /// The plot.
    pub plot: ModelId,
    /// The color mapper shared by the county glyph and the color bar.
    pub mapper: ModelId,
    /// The county patches glyph.
    pub counties: ModelId,
    /// The state outline glyph.
    pub states: ModelId,
    /// The color bar.
    pub color_bar: ModelId,
}

/// Builds the chart for `map` in a fresh document titled `title`.
///
/// # Errors
///
/// Any model error; with the bundled catalog none are expected.
pub fn build(map: &CountyMap, title: &str) -> Result<Choropleth> {
    let mut doc = Document::new(catalog::registry()?);
    doc.set_title(title);

    let state_source = doc.create_with(
        "ColumnDataSource",
        [(
            "data",
            columns([
                ("state_xs", coordinates(&map.states, |r| &r.xs)),
                ("state_ys", coordinates(&map.states, |r| &r.ys)),
            ]),
        )],
    )?;

    let (low, high) = map
        .rate_bounds()
        .map_or((Value::Null, Value::Null), |(lo, hi)| (lo.into(), hi.into()));
    let mapper = doc.create_with(
        "LinearColorMapper",
        [
            ("palette", VIRIDIS_11.into_iter().collect::<Value>()),
            ("low", low),
            ("high", high),
        ],
    )?;

    let county_source = doc.create_with(
        "ColumnDataSource",
        [(
            "data",
            columns([
                ("county_xs", coordinates(&map.counties, |r| &r.xs)),
                ("county_ys", coordinates(&map.counties, |r| &r.ys)),
                ("rate", map.rates.iter().copied().collect()),
            ]),
        )],
    )?;

    let plot = doc.create_with(
        "Plot",
        [
            ("min_border", Value::from(0)),
            ("border_fill_color", Value::from("white")),
            ("width", Value::from(1300)),
            ("height", Value::from(700)),
            ("toolbar_location", Value::Null),
        ],
    )?;
    set_title(&mut doc, plot, "2009 Unemployment Data")?;

    let counties = doc.create_with(
        "Patches",
        [
            ("xs", Value::from("county_xs")),
            ("ys", Value::from("county_ys")),
            ("fill_color", transform("rate", mapper)),
            ("fill_alpha", Value::from(0.7)),
            ("line_color", Value::from("white")),
            ("line_width", Value::from(0.5)),
        ],
    )?;
    add_glyph(&mut doc, plot, county_source, counties)?;

    let states = doc.create_with(
        "Patches",
        [
            ("xs", Value::from("state_xs")),
            ("ys", Value::from("state_ys")),
            ("fill_alpha", Value::from(0.0)),
            ("line_color", Value::from("#884444")),
            ("line_width", Value::from(2)),
        ],
    )?;
    add_glyph(&mut doc, plot, state_source, states)?;

    let color_bar = doc.create_with("ColorBar", [("color_mapper", mapper)])?;
    add_layout(&mut doc, plot, color_bar, Side::Left)?;

    doc.add_root(plot)?;
    tracing::info!(
        counties = map.counties.len(),
        states = map.states.len(),
        models = doc.all_nodes().len(),
        "built choropleth"
    );

    Ok(Choropleth {
        document: doc,
        plot,
        mapper,
        counties,
        states,
        color_bar,
    })
}

fn columns<const N: usize>(columns: [(&str, Value); N]) -> Value {
    Value::Map(
        columns
            .into_iter()
            .map(|(name, column)| (name.to_owned(), column))
            .collect(),
    )
}

fn coordinates(regions: &[Region], axis: impl Fn(&Region) -> &Vec<f64>) -> Value {
    regions
        .iter()
        .map(|region| axis(region).iter().copied().collect::<Value>())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic;

    #[test]
    fn chart_is_valid_and_fully_attached() {
        let chart = build(&synthetic(4, 3, 2), "Rates").unwrap();
        let doc = &chart.document;
        doc.validate().unwrap();

        assert_eq!(doc.roots(), [chart.plot]);
        // Plot, title, two renderers, two sources, two glyphs, mapper, bar.
        assert_eq!(doc.all_nodes().len(), 10);
        assert_eq!(doc.len(), 10);
        assert_eq!(doc.find_by_type("Annotation").unwrap().len(), 2);
        assert_eq!(
            doc.get(chart.plot, "left").unwrap(),
            &Value::Seq(vec![Value::Ref(chart.color_bar)])
        );
        assert_eq!(
            doc.get(chart.plot, "toolbar_location").unwrap(),
            &Value::Null
        );
    }

    #[test]
    fn mapper_spans_the_rates() {
        let map = synthetic(4, 3, 2);
        let chart = build(&map, "Rates").unwrap();
        let (lo, hi) = map.rate_bounds().unwrap();
        let doc = &chart.document;
        assert_eq!(doc.get(chart.mapper, "low").unwrap(), &Value::Float(lo));
        assert_eq!(doc.get(chart.mapper, "high").unwrap(), &Value::Float(hi));
        assert_eq!(
            doc.get(chart.mapper, "palette").unwrap().as_seq().unwrap().len(),
            11
        );
    }

    #[test]
    fn county_fill_is_mapped_and_state_fill_is_clear() {
        let chart = build(&synthetic(2, 2, 2), "Rates").unwrap();
        let doc = &chart.document;
        assert_eq!(
            doc.get(chart.counties, "fill_color").unwrap(),
            &transform("rate", chart.mapper)
        );
        assert_eq!(doc.get(chart.states, "fill_alpha").unwrap(), &Value::Float(0.0));
        // Integer line widths are stored as floats.
        assert_eq!(doc.get(chart.states, "line_width").unwrap(), &Value::Float(2.0));
    }

    #[test]
    fn empty_map_leaves_mapper_open() {
        let chart = build(&synthetic(0, 0, 0), "Empty").unwrap();
        assert!(chart.document.get(chart.mapper, "low").unwrap().is_null());
        chart.document.validate().unwrap();
    }
}
