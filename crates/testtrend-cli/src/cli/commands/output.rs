//! Text rendering and output sinks.

use std::fmt::Write as _;

use anyhow::Context;
use serde::Serialize;
use testtrend_core::{CategoryTrend, FlakyTrend, TrendDataset};

use super::super::args::{OutputArgs, OutputFormat};

/// Emit `report` as JSON, or `text` for the text format.
pub(crate) fn emit<T: Serialize>(args: &OutputArgs, report: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
    let body = match args.format {
        OutputFormat::Json => {
            let mut s = serde_json::to_string_pretty(report)?;
            s.push('\n');
            s
        }
        OutputFormat::Text => text(),
    };
    match &args.out {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("failed to write output: {}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{body}"),
    }
    Ok(())
}

pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub(crate) fn render_dataset(dataset: &TrendDataset) -> String {
    match dataset {
        TrendDataset::Category(trend) => render_category(trend),
        TrendDataset::Xy(trend) => render_flaky(trend),
    }
}

fn render_category(trend: &CategoryTrend) -> String {
    let ds = &trend.dataset;
    let mut out = String::from("build");
    for name in ds.series_names() {
        let _ = write!(out, "\t{name}");
    }
    out.push('\n');
    for (col, build) in ds.builds.iter().enumerate() {
        let _ = write!(out, "#{build}");
        for series in &ds.series {
            match series.values.get(col).copied().flatten() {
                Some(v) => {
                    let _ = write!(out, "\t{v}");
                }
                None => out.push_str("\t-"),
            }
        }
        out.push('\n');
    }
    out
}

fn render_flaky(trend: &FlakyTrend) -> String {
    let mut out = String::from("row\tfails\tflaps\ttest\n");
    for row in &trend.rows {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}",
            row.row, row.fail_count, row.flap_count, row.name
        );
    }
    let flapping: Vec<String> = trend
        .flapping
        .iter()
        .filter(|(_, n)| **n > 0)
        .map(|(b, n)| format!("#{b}={n}"))
        .collect();
    if !flapping.is_empty() {
        let _ = writeln!(out, "flapping: {}", flapping.join(" "));
    }
    out
}
