// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end: build the choropleth, embed it, and rebuild it from the page.

use serde_json::json;
use understory_model::embed::{self, DocJson};
use understory_model::{GraphDeserializer, serialize};
use understory_model_demos::{catalog, choropleth, data, html};

fn embedded_docs(page: &str) -> std::collections::BTreeMap<String, DocJson> {
    let start = page.find(html::DOCS_JSON_ID).unwrap();
    let rest = &page[start..];
    let json = &rest[rest.find('>').unwrap() + 1..rest.find("</script>").unwrap()];
    serde_json::from_str(json).unwrap()
}

#[test]
fn page_rebuilds_the_document() {
    let chart = choropleth::build(&data::synthetic(5, 3, 3), "Unemployment").unwrap();
    let payload = embed::standalone(&chart.document).unwrap();
    let page = html::file_html(&payload).unwrap();

    let docs = embedded_docs(&page);
    assert_eq!(docs.len(), 1);
    let (doc_id, doc_json) = docs.iter().next().unwrap();
    assert_eq!(doc_json.title, "Unemployment");
    assert_eq!(payload.render_items[0].doc_id, *doc_id);

    let rebuilt = GraphDeserializer::new(catalog::registry().unwrap())
        .deserialize(&doc_json.graph)
        .unwrap();
    assert_eq!(serialize(&rebuilt), serialize(&chart.document));
    rebuilt.validate().unwrap();
}

#[test]
fn color_bar_sits_in_the_left_panel() {
    let chart = choropleth::build(&data::synthetic(2, 2, 2), "Unemployment").unwrap();
    let graph = serialize(&chart.document);

    let plot = graph.node(chart.plot.serial()).unwrap();
    assert_eq!(plot.type_name, "Plot");
    assert_eq!(
        plot.attributes["left"],
        json!([{"ref": chart.color_bar.serial()}])
    );
    assert_eq!(plot.attributes["toolbar_location"], json!(null));

    let bar = graph.node(chart.color_bar.serial()).unwrap();
    assert_eq!(
        bar.attributes["color_mapper"],
        json!({"ref": chart.mapper.serial()})
    );
    // The mapper is shared but serialized once.
    assert_eq!(
        graph
            .nodes
            .iter()
            .filter(|node| node.type_name == "LinearColorMapper")
            .count(),
        1
    );
}

#[test]
fn county_glyph_maps_rates_through_the_mapper() {
    let chart = choropleth::build(&data::synthetic(2, 2, 2), "Unemployment").unwrap();
    let graph = serialize(&chart.document);
    let counties = graph.node(chart.counties.serial()).unwrap();
    assert_eq!(
        counties.attributes["fill_color"],
        json!({"map": {"field": "rate", "transform": {"ref": chart.mapper.serial()}}})
    );
    assert_eq!(counties.attributes["fill_alpha"], json!(0.7));
}
