// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Writes a standalone choropleth page of synthetic county unemployment.
//!
//! Set `RUST_LOG=debug` to see model and serialization events.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use understory_model::embed;
use understory_model_demos::{choropleth, data, html};

#[derive(Debug, Parser)]
#[command(about = "Write a choropleth of synthetic county unemployment as HTML")]
struct Args {
    /// Where to write the page.
    #[arg(short, long, default_value = "choropleth.html")]
    output: PathBuf,
    /// Page title.
    #[arg(long, default_value = "Choropleth of all US counties, Unemployment 2009")]
    title: String,
    /// State grid columns.
    #[arg(long, default_value_t = 12)]
    columns: u32,
    /// State grid rows.
    #[arg(long, default_value_t = 4)]
    rows: u32,
    /// Counties per state along each axis.
    #[arg(long, default_value_t = 6)]
    split: u32,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let map = data::synthetic(args.columns, args.rows, args.split);
    let chart = choropleth::build(&map, &args.title).context("building the chart")?;
    let payload = embed::standalone(&chart.document).context("validating the document")?;
    let page = html::file_html(&payload)?;

    std::fs::write(&args.output, page)
        .with_context(|| format!("writing {}", args.output.display()))?;
    tracing::info!(path = %args.output.display(), "wrote page");
    println!("Wrote {}", args.output.display());
    Ok(())
}
