use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use ddreport_core::{BucketTotals, PlayerReport};

pub fn run(report: &PlayerReport, json: bool, daily: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let rows: Vec<(String, &BucketTotals)> = if daily {
        report
            .daily
            .iter()
            .map(|(day, bucket)| (day.to_string(), bucket))
            .collect()
    } else {
        report
            .monthly
            .iter()
            .map(|(month, bucket)| (month.to_string(), bucket))
            .collect()
    };

    println!("{}", build_table(&rows, daily));
    println!(
        "\n  {} {}",
        "Player:".bright_black(),
        report.player.bold()
    );
    println!(
        "  Finished: {} | Points: {} | Unfinished: {}",
        report.total_finished.to_string().green(),
        report.total_points.to_string().cyan(),
        report.unfinished_maps
    );
    if let Some(reported) = report.reported_points {
        if reported != report.total_points {
            println!(
                "{}",
                format!("  Server-reported points: {reported}").bright_black()
            );
        }
    }
    println!(
        "{}",
        format!(
            "  {} to {} ({}ms)",
            report.first_day, report.last_day, report.processing_time_ms
        )
        .bright_black()
    );

    Ok(())
}

fn build_table(rows: &[(String, &BucketTotals)], daily: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        if daily { "Day" } else { "Month" },
        "Finished",
        "Points",
        "Top category",
    ]);

    for (bucket, totals) in rows {
        let count: u64 = totals.values().map(|t| t.count).sum();
        let points: u64 = totals.values().map(|t| t.points).sum();
        // Quiet days add nothing to the daily table.
        if daily && count == 0 {
            continue;
        }
        table.add_row(vec![
            Cell::new(bucket),
            Cell::new(count).set_alignment(CellAlignment::Right),
            Cell::new(points).set_alignment(CellAlignment::Right),
            Cell::new(top_category(totals).unwrap_or("-")),
        ]);
    }

    table
}

/// Category with the most points in the bucket; ties go to the first name.
fn top_category(totals: &BucketTotals) -> Option<&str> {
    let mut best: Option<(&str, u64)> = None;
    for (name, t) in totals.iter().filter(|(_, t)| t.count > 0) {
        if best.map_or(true, |(_, points)| t.points > points) {
            best = Some((name.as_str(), t.points));
        }
    }
    best.map(|(name, _)| name)
}
