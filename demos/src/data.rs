// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synthetic map data for the choropleth demo.
//!
//! The lower 48 bounding box is cut into a grid of "states", each cut again
//! into square "counties" with a smooth, deterministic rate field.

/// Longitude span of the map.
pub const LON: (f64, f64) = (-125.0, -67.0);
/// Latitude span of the map.
pub const LAT: (f64, f64) = (25.0, 49.0);

/// A closed polygon, as parallel coordinate lists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    /// Longitudes.
    pub xs: Vec<f64>,
    /// Latitudes.
    pub ys: Vec<f64>,
}

impl Region {
    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            xs: vec![x0, x1, x1, x0],
            ys: vec![y0, y0, y1, y1],
        }
    }
}

/// States, counties and one rate per county.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CountyMap {
    /// State outlines.
    pub states: Vec<Region>,
    /// County shapes.
    pub counties: Vec<Region>,
    /// Unemployment rate per county, in percent.
    pub rates: Vec<f64>,
}

impl CountyMap {
    /// The smallest and largest rate, or `None` without counties.
    #[must_use]
    pub fn rate_bounds(&self) -> Option<(f64, f64)> {
        let mut rates = self.rates.iter().copied();
        let first = rates.next()?;
        Some(rates.fold((first, first), |(lo, hi), r| (lo.min(r), hi.max(r))))
    }
}

/// Builds a `columns` by `rows` grid of states, each split into
/// `split` by `split` counties.
#[must_use]
pub fn synthetic(columns: u32, rows: u32, split: u32) -> CountyMap {
    let mut map = CountyMap::default();
    if columns == 0 || rows == 0 || split == 0 {
        return map;
    }
    let state_w = (LON.1 - LON.0) / f64::from(columns);
    let state_h = (LAT.1 - LAT.0) / f64::from(rows);
    let county_w = state_w / f64::from(split);
    let county_h = state_h / f64::from(split);

    for row in 0..rows {
        for column in 0..columns {
            let x0 = LON.0 + f64::from(column) * state_w;
            let y0 = LAT.0 + f64::from(row) * state_h;
            map.states
                .push(Region::rect(x0, y0, x0 + state_w, y0 + state_h));
            for j in 0..split {
                for i in 0..split {
                    let cx = x0 + f64::from(i) * county_w;
                    let cy = y0 + f64::from(j) * county_h;
                    map.counties
                        .push(Region::rect(cx, cy, cx + county_w, cy + county_h));
                    map.rates
                        .push(rate(cx + county_w / 2.0, cy + county_h / 2.0));
                }
            }
        }
    }
    map
}

/// A smooth field between 2% and 14%, rounded to one decimal.
fn rate(lon: f64, lat: f64) -> f64 {
    let wave = (lon * 0.21).sin() * (lat * 0.37).cos();
    let drift = (lon - LON.0) / (LON.1 - LON.0);
    let raw = 2.0 + 5.0 * (wave + 1.0) + 2.0 * drift;
    (raw * 10.0).round() / 10.0
}
