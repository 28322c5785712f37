//! Datasets handed to the rendering side.
//!
//! The engine never draws anything. A trend computation returns a
//! [`TrendDataset`]: either per-build category values (stacked-area views)
//! or ranked XY polylines (flaky-test view), each with the tool-tip detail
//! the renderer shows on hover.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::flaky::FlakyTrend;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrendDataset {
    Category(CategoryTrend),
    Xy(FlakyTrend),
}

impl TrendDataset {
    pub fn as_category(&self) -> Option<&CategoryTrend> {
        match self {
            Self::Category(c) => Some(c),
            Self::Xy(_) => None,
        }
    }

    pub fn as_xy(&self) -> Option<&FlakyTrend> {
        match self {
            Self::Xy(x) => Some(x),
            Self::Category(_) => None,
        }
    }
}

/// Category values plus per-series, per-build tool-tip text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryTrend {
    pub dataset: CategoryDataset,
    #[serde(skip_serializing_if = "ToolTips::is_empty")]
    pub tooltips: ToolTips,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySeries {
    pub name: String,
    /// Aligned with [`CategoryDataset::builds`].
    pub values: Vec<Option<f64>>,
}

/// One value per named series per build; builds ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryDataset {
    pub builds: Vec<u32>,
    pub series: Vec<CategorySeries>,
}

impl CategoryDataset {
    pub fn series_names(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.name.as_str())
    }

    pub fn value(&self, series: &str, build: u32) -> Option<f64> {
        let col = self.builds.binary_search(&build).ok()?;
        self.series
            .iter()
            .find(|s| s.name == series)
            .and_then(|s| s.values.get(col).copied().flatten())
    }

    /// Values of `series` in build order, missing cells as zero.
    pub fn column(&self, series: &str) -> Vec<f64> {
        self.series
            .iter()
            .find(|s| s.name == series)
            .map(|s| s.values.iter().map(|v| v.unwrap_or(0.0)).collect())
            .unwrap_or_default()
    }
}

/// Accumulates `(value, series, build)` cells in any build order.
#[derive(Debug, Default)]
pub struct CategoryDatasetBuilder {
    series: Vec<String>,
    cells: BTreeMap<u32, BTreeMap<usize, f64>>,
}

impl CategoryDatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64, series: &str, build: u32) {
        let idx = match self.series.iter().position(|s| s == series) {
            Some(idx) => idx,
            None => {
                self.series.push(series.to_string());
                self.series.len() - 1
            }
        };
        self.cells.entry(build).or_default().insert(idx, value);
    }

    pub fn build(self) -> CategoryDataset {
        let builds: Vec<u32> = self.cells.keys().copied().collect();
        let series = self
            .series
            .into_iter()
            .enumerate()
            .map(|(idx, name)| CategorySeries {
                name,
                values: self
                    .cells
                    .values()
                    .map(|row| row.get(&idx).copied())
                    .collect(),
            })
            .collect();
        CategoryDataset { builds, series }
    }
}

/// Tool-tip text keyed by series, then build number.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolTips(BTreeMap<String, BTreeMap<u32, String>>);

impl ToolTips {
    pub fn insert(&mut self, series: &str, build: u32, text: String) {
        self.0.entry(series.to_string()).or_default().insert(build, text);
    }

    pub fn get(&self, series: &str, build: u32) -> Option<&str> {
        self.0.get(series)?.get(&build).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XyPoint {
    pub x: f64,
    /// `None` breaks the polyline.
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XySeries {
    pub key: usize,
    pub points: Vec<XyPoint>,
}

impl XySeries {
    pub fn new(key: usize) -> Self {
        Self {
            key,
            points: Vec::new(),
        }
    }

    pub fn add(&mut self, x: f64, y: Option<f64>) {
        self.points.push(XyPoint { x, y });
    }

    /// Order points by x, keeping insertion order among equal x.
    pub fn sort(&mut self) {
        self.points.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XyDataset {
    pub series: Vec<XySeries>,
}
