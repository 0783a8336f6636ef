use crate::palette::Palette;
use crate::render::chart::{
    draw_line_chart, draw_stacked_bars, smooth, Bounds, Line, Segment, COLOR_BACKGROUND,
    COLOR_MUTED, COLOR_TEXT,
};
use crate::render::{draw_text, fill_rect, load_fonts, Align, FontSet};
use anyhow::{Context, Result};
use ddreport_core::{
    category_values, cumulative, DailySeries, Field, MonthlySeries, PlayerReport, Series,
};
use image::{Rgba, RgbaImage};
use std::path::PathBuf;
use tokio::runtime::Runtime;

const CANVAS_WIDTH: u32 = 2400;
const MARGIN: i32 = 60;
const GAP: i32 = 40;
const HEADER_HEIGHT: i32 = 260;
const PANEL_HEIGHT: i32 = 560;
const FOOTER_HEIGHT: i32 = 80;
const PANEL_ROWS: i32 = 6;
const CURVE_SAMPLES: usize = 300;
const LEGEND_COLUMNS: usize = 3;
const COLOR_CUMULATIVE: Rgba<u8> = Rgba([0x2E, 0x6F, 0xD8, 0xFF]);

#[derive(Debug, Clone)]
pub struct ReportImageOptions {
    pub output: Option<PathBuf>,
    pub font: Option<PathBuf>,
    pub palette: Palette,
}

/// Render `report` to a PNG and return its absolute path.
pub fn run(report: &PlayerReport, options: ReportImageOptions) -> Result<String> {
    let rt = Runtime::new()?;
    let fonts = rt.block_on(async {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        load_fonts(&client, options.font.as_deref()).await
    })?;

    let image = render_report(report, &options.palette, &fonts);

    let output_path = options
        .output
        .unwrap_or_else(|| PathBuf::from(default_output_name(&report.player)));
    let absolute = if output_path.is_absolute() {
        output_path
    } else {
        std::env::current_dir()?.join(output_path)
    };

    image
        .save_with_format(&absolute, image::ImageFormat::Png)
        .with_context(|| format!("Failed to save report image to {}", absolute.display()))?;
    tracing::debug!(path = %absolute.display(), "saved report image");

    Ok(absolute.to_string_lossy().to_string())
}

/// `report_<player>.png`, with path separators in the name replaced.
pub fn default_output_name(player: &str) -> String {
    let safe: String = player
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    format!("report_{safe}.png")
}

pub fn render_report(report: &PlayerReport, palette: &Palette, fonts: &FontSet) -> RgbaImage {
    let height = MARGIN * 2 + HEADER_HEIGHT + GAP + PANEL_ROWS * (PANEL_HEIGHT + GAP) + FOOTER_HEIGHT;
    let mut canvas = RgbaImage::from_pixel(CANVAS_WIDTH, height as u32, COLOR_BACKGROUND);

    let content_width = CANVAS_WIDTH as i32 - MARGIN * 2;
    let half_width = (content_width - GAP) / 2;
    let order = palette.ordered(&report.categories);
    // Bars are filled bottom-up, so the first display category ends on top.
    let stack_order: Vec<&str> = order.iter().rev().copied().collect();

    draw_header(&mut canvas, report, palette, &order, fonts, content_width);

    let month_labels = month_labels(&report.monthly);
    let day_labels = day_labels(&report.daily);
    let mut y = MARGIN + HEADER_HEIGHT + GAP;

    let left = Bounds::new(MARGIN, y, half_width, PANEL_HEIGHT);
    let right = Bounds::new(MARGIN + half_width + GAP, y, half_width, PANEL_HEIGHT);
    draw_stacked_bars(
        &mut canvas,
        fonts,
        left,
        "Monthly Finished Maps",
        &month_labels,
        &stacked(&report.monthly, &stack_order, Field::Count, palette),
    );
    draw_stacked_bars(
        &mut canvas,
        fonts,
        right,
        "Monthly Points",
        &month_labels,
        &stacked(&report.monthly, &stack_order, Field::Points, palette),
    );
    y += PANEL_HEIGHT + GAP;

    let left = Bounds::new(MARGIN, y, half_width, PANEL_HEIGHT);
    let right = Bounds::new(MARGIN + half_width + GAP, y, half_width, PANEL_HEIGHT);
    draw_line_chart(
        &mut canvas,
        fonts,
        left,
        "Monthly Finished Maps by Category",
        &month_labels,
        &trend_lines(&report.monthly, &order, Field::Count, palette),
    );
    draw_line_chart(
        &mut canvas,
        fonts,
        right,
        "Monthly Points by Category",
        &month_labels,
        &trend_lines(&report.monthly, &order, Field::Points, palette),
    );
    y += PANEL_HEIGHT + GAP;

    for (title, field) in [
        ("Daily Finished Maps", Field::Count),
        ("Daily Points", Field::Points),
    ] {
        let bounds = Bounds::new(MARGIN, y, content_width, PANEL_HEIGHT);
        draw_stacked_bars(
            &mut canvas,
            fonts,
            bounds,
            title,
            &day_labels,
            &stacked(&report.daily, &stack_order, field, palette),
        );
        y += PANEL_HEIGHT + GAP;
    }

    for (title, field) in [
        ("Cumulative Finished Maps", Field::Count),
        ("Cumulative Points", Field::Points),
    ] {
        let bounds = Bounds::new(MARGIN, y, content_width, PANEL_HEIGHT);
        let line = Line {
            points: cumulative(&report.daily, field)
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i as f64, v as f64))
                .collect(),
            color: COLOR_CUMULATIVE,
        };
        draw_line_chart(&mut canvas, fonts, bounds, title, &day_labels, &[line]);
        y += PANEL_HEIGHT + GAP;
    }

    draw_text(
        &mut canvas,
        &fonts.regular,
        24.0,
        COLOR_MUTED,
        CANVAS_WIDTH as i32 / 2,
        y + FOOTER_HEIGHT / 2,
        Align::Center,
        &format!(
            "Generated by ddreport v{} · data from ddnet.org",
            ddreport_core::version()
        ),
    );

    canvas
}

fn draw_header(
    canvas: &mut RgbaImage,
    report: &PlayerReport,
    palette: &Palette,
    order: &[&str],
    fonts: &FontSet,
    content_width: i32,
) {
    let x = MARGIN;
    let top = MARGIN;
    let regular = &fonts.regular;
    let bold = &fonts.bold;

    draw_text(canvas, regular, 30.0, COLOR_MUTED, x, top + 30, Align::Left, "Analysis Report for");
    draw_text(canvas, bold, 64.0, COLOR_TEXT, x, top + 100, Align::Left, &report.player);

    let total_points = report.reported_points.unwrap_or(report.total_points);
    let lines = [
        format!("Total Points: {total_points}"),
        format!("Finished Maps Count: {}", report.total_finished),
        format!(
            "Generated: {}",
            report.generated_at.format("%Y-%m-%d %H:%M UTC")
        ),
    ];
    for (i, line) in lines.iter().enumerate() {
        draw_text(
            canvas,
            regular,
            28.0,
            COLOR_TEXT,
            x,
            top + 150 + i as i32 * 38,
            Align::Left,
            line,
        );
    }

    let legend_x = MARGIN + content_width / 2;
    let column_width = content_width / 2 / LEGEND_COLUMNS as i32;
    draw_text(canvas, bold, 28.0, COLOR_TEXT, legend_x, top + 30, Align::Left, "Categories");
    for (i, category) in order.iter().enumerate() {
        let cx = legend_x + (i % LEGEND_COLUMNS) as i32 * column_width;
        let cy = top + 60 + (i / LEGEND_COLUMNS) as i32 * 40;
        fill_rect(canvas, cx, cy, 26, 26, palette.color(category));
        draw_text(canvas, regular, 24.0, COLOR_TEXT, cx + 38, cy + 22, Align::Left, category);
    }
}

fn month_labels(series: &MonthlySeries) -> Vec<String> {
    series
        .keys()
        .map(|month| format!("{:02}/{:02}", month.year.rem_euclid(100), month.month))
        .collect()
}

fn day_labels(series: &DailySeries) -> Vec<String> {
    series
        .keys()
        .map(|day| day.format("%y/%m/%d").to_string())
        .collect()
}

/// One bar per bucket, segments in `stack_order` bottom first.
fn stacked<K: Ord>(
    series: &Series<K>,
    stack_order: &[&str],
    field: Field,
    palette: &Palette,
) -> Vec<Vec<Segment>> {
    series
        .iter()
        .map(|(_, bucket)| {
            stack_order
                .iter()
                .map(|category| Segment {
                    value: bucket.get(*category).map_or(0, |t| t.value(field)),
                    color: palette.color(category),
                })
                .collect()
        })
        .collect()
}

/// Smoothed per-category curves; categories with no activity are skipped.
fn trend_lines<K: Ord>(
    series: &Series<K>,
    order: &[&str],
    field: Field,
    palette: &Palette,
) -> Vec<Line> {
    order
        .iter()
        .filter_map(|category| {
            let values = category_values(series, category, field);
            if values.iter().all(|v| *v == 0) {
                return None;
            }
            let values: Vec<f64> = values.into_iter().map(|v| v as f64).collect();
            Some(Line {
                points: smooth(&values, CURVE_SAMPLES),
                color: palette.color(category),
            })
        })
        .collect()
}
