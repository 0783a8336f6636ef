use anyhow::{Context, Result};
use ddreport_core::{cumulative, Field, PlayerReport, Series};
use serde::Serialize;
use std::fmt::Display;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ExportRow<'a> {
    bucket: String,
    category: &'a str,
    count: u64,
    points: u64,
    cumulative_count: u64,
    cumulative_points: u64,
}

/// Write one CSV row per bucket and category to `output`, or stdout.
pub fn run(report: &PlayerReport, monthly: bool, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_rows(report, monthly, file)?;
            eprintln!("  CSV written to {}", path.display());
        }
        None => write_rows(report, monthly, std::io::stdout().lock())?,
    }
    Ok(())
}

fn write_rows<W: Write>(report: &PlayerReport, monthly: bool, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    let records = if monthly {
        rows(&report.monthly)
    } else {
        rows(&report.daily)
    };
    for row in records {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn rows<K: Ord + Display>(series: &Series<K>) -> Vec<ExportRow<'_>> {
    let running_count = cumulative(series, Field::Count);
    let running_points = cumulative(series, Field::Points);

    series
        .iter()
        .zip(running_count.into_iter().zip(running_points))
        .flat_map(|((key, bucket), (cumulative_count, cumulative_points))| {
            let bucket_name = key.to_string();
            bucket.iter().map(move |(category, totals)| ExportRow {
                bucket: bucket_name.clone(),
                category: category.as_str(),
                count: totals.count,
                points: totals.points,
                cumulative_count,
                cumulative_points,
            })
        })
        .collect()
}
