//! Bar and line chart panels drawn onto an [`RgbaImage`].

use super::{draw_text, fill_rect, stroke_polyline, Align, FontSet};
use image::{Rgba, RgbaImage};

pub const COLOR_BACKGROUND: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
pub const COLOR_TEXT: Rgba<u8> = Rgba([0x1A, 0x1A, 0x1A, 0xFF]);
pub const COLOR_MUTED: Rgba<u8> = Rgba([0x6B, 0x6B, 0x6B, 0xFF]);
const COLOR_GRID: Rgba<u8> = Rgba([0xE4, 0xE4, 0xE4, 0xFF]);
const COLOR_AXIS: Rgba<u8> = Rgba([0x40, 0x40, 0x40, 0xFF]);

const TITLE_SIZE: f32 = 34.0;
const TICK_SIZE: f32 = 18.0;
const TITLE_SPACE: i32 = 64;
const Y_LABEL_SPACE: i32 = 84;
const X_LABEL_SPACE: i32 = 44;
const Y_DIVISIONS: u64 = 4;
const MAX_X_LABELS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub value: u64,
    pub color: Rgba<u8>,
}

/// A curve in bucket-index space: `x` is a (fractional) bucket index.
#[derive(Debug, Clone)]
pub struct Line {
    pub points: Vec<(f64, f64)>,
    pub color: Rgba<u8>,
}

/// Every `label_step`-th bucket gets an x-axis label.
pub fn label_step(count: usize) -> usize {
    count / MAX_X_LABELS + 1
}

/// Round `max` up so the y axis splits into four whole-number ticks.
pub fn axis_max(max: u64) -> u64 {
    if max <= Y_DIVISIONS {
        return Y_DIVISIONS;
    }
    let mut step = 1u64;
    while step.saturating_mul(10) <= max / Y_DIVISIONS {
        step *= 10;
    }
    let unit = step * Y_DIVISIONS;
    max.div_ceil(unit).saturating_mul(unit)
}

/// Catmull-Rom curve through every value, sampled at `samples` points and
/// clamped at zero. One value yields a single point, two a straight line.
pub fn smooth(values: &[f64], samples: usize) -> Vec<(f64, f64)> {
    match values.len() {
        0 => return Vec::new(),
        1 => return vec![(0.0, values[0].max(0.0))],
        2 => return vec![(0.0, values[0].max(0.0)), (1.0, values[1].max(0.0))],
        _ => {}
    }

    let last = values.len() - 1;
    let samples = samples.max(values.len());
    let at = |i: isize| values[i.clamp(0, last as isize) as usize];

    (0..samples)
        .map(|n| {
            let x = n as f64 * last as f64 / (samples - 1) as f64;
            let segment = (x.floor() as usize).min(last - 1);
            let t = x - segment as f64;
            let i = segment as isize;
            let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));
            let y = 0.5
                * (2.0 * p1
                    + (p2 - p0) * t
                    + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t * t
                    + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t * t * t);
            (x, y.max(0.0))
        })
        .collect()
}

/// Pixel extents `(from, to)` above the baseline for each stacked segment.
pub fn stack_extents(values: &[u64], axis_max: u64, height: i32) -> Vec<(i32, i32)> {
    let scale = |v: u64| ((v as f64 / axis_max.max(1) as f64) * height as f64).round() as i32;
    let mut running = 0u64;
    values
        .iter()
        .map(|value| {
            let from = scale(running);
            running = running.saturating_add(*value);
            (from, scale(running))
        })
        .collect()
}

fn plot_area(bounds: Bounds) -> Bounds {
    Bounds::new(
        bounds.x + Y_LABEL_SPACE,
        bounds.y + TITLE_SPACE,
        (bounds.width - Y_LABEL_SPACE - 16).max(1),
        (bounds.height - TITLE_SPACE - X_LABEL_SPACE).max(1),
    )
}

fn slot_center(plot: Bounds, count: usize, index: f64) -> f32 {
    let slot = plot.width as f64 / count.max(1) as f64;
    (plot.x as f64 + slot * (index + 0.5)) as f32
}

fn value_y(plot: Bounds, value: f64, axis_max: u64) -> f32 {
    let ratio = value / axis_max.max(1) as f64;
    (plot.bottom() as f64 - ratio * plot.height as f64) as f32
}

fn draw_frame(
    canvas: &mut RgbaImage,
    fonts: &FontSet,
    bounds: Bounds,
    plot: Bounds,
    title: &str,
    labels: &[String],
    axis_max: u64,
) {
    draw_text(
        canvas,
        &fonts.bold,
        TITLE_SIZE,
        COLOR_TEXT,
        bounds.x + bounds.width / 2,
        bounds.y + (TITLE_SIZE as i32) + 8,
        Align::Center,
        title,
    );

    for tick in 0..=Y_DIVISIONS {
        let value = axis_max * tick / Y_DIVISIONS;
        let y = value_y(plot, value as f64, axis_max).round() as i32;
        fill_rect(canvas, plot.x, y, plot.width, 1, COLOR_GRID);
        draw_text(
            canvas,
            &fonts.regular,
            TICK_SIZE,
            COLOR_MUTED,
            plot.x - 10,
            y + (TICK_SIZE as i32) / 3,
            Align::Right,
            &value.to_string(),
        );
    }

    fill_rect(canvas, plot.x, plot.y, 2, plot.height + 1, COLOR_AXIS);
    fill_rect(canvas, plot.x, plot.bottom(), plot.width, 2, COLOR_AXIS);

    let step = label_step(labels.len());
    for (index, label) in labels.iter().enumerate().step_by(step) {
        let x = slot_center(plot, labels.len(), index as f64).round() as i32;
        fill_rect(canvas, x, plot.bottom(), 1, 8, COLOR_AXIS);
        draw_text(
            canvas,
            &fonts.regular,
            TICK_SIZE,
            COLOR_MUTED,
            x,
            plot.bottom() + 14 + TICK_SIZE as i32,
            Align::Center,
            label,
        );
    }
}

/// One stacked bar per label; segments are listed bottom first.
pub fn draw_stacked_bars(
    canvas: &mut RgbaImage,
    fonts: &FontSet,
    bounds: Bounds,
    title: &str,
    labels: &[String],
    bars: &[Vec<Segment>],
) {
    let plot = plot_area(bounds);
    let tallest = bars
        .iter()
        .map(|bar| bar.iter().map(|s| s.value).sum::<u64>())
        .max()
        .unwrap_or(0);
    let axis = axis_max(tallest);

    draw_frame(canvas, fonts, bounds, plot, title, labels, axis);

    let slot = plot.width as f64 / bars.len().max(1) as f64;
    let bar_width = ((slot * 0.8).floor() as i32).max(1);
    for (index, bar) in bars.iter().enumerate() {
        let center = slot_center(plot, bars.len(), index as f64);
        let left = (center - bar_width as f32 / 2.0).round() as i32;
        let values: Vec<u64> = bar.iter().map(|s| s.value).collect();
        for (segment, (from, to)) in bar.iter().zip(stack_extents(&values, axis, plot.height)) {
            fill_rect(
                canvas,
                left,
                plot.bottom() - to,
                bar_width,
                to - from,
                segment.color,
            );
        }
    }
}

pub fn draw_line_chart(
    canvas: &mut RgbaImage,
    fonts: &FontSet,
    bounds: Bounds,
    title: &str,
    labels: &[String],
    lines: &[Line],
) {
    let plot = plot_area(bounds);
    let highest = lines
        .iter()
        .flat_map(|line| line.points.iter().map(|(_, y)| *y))
        .fold(0.0f64, f64::max);
    let axis = axis_max(highest.ceil() as u64);

    draw_frame(canvas, fonts, bounds, plot, title, labels, axis);

    for line in lines {
        let points: Vec<(f32, f32)> = line
            .points
            .iter()
            .map(|(x, y)| {
                (
                    slot_center(plot, labels.len(), *x),
                    value_y(plot, *y, axis),
                )
            })
            .collect();
        stroke_polyline(canvas, &points, 3, line.color);
    }
}
