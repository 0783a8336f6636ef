//! Raster drawing primitives shared by the report panels.

pub mod chart;

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use std::fs;
use std::path::{Path, PathBuf};

const FIGTREE_REGULAR_FILE: &str = "Figtree-Regular.ttf";
const FIGTREE_REGULAR_URL: &str =
    "https://fonts.gstatic.com/s/figtree/v9/_Xmz-HUzqDCFdgfMsYiV_F7wfS-Bs_d_QF5e.ttf";
const FIGTREE_BOLD_FILE: &str = "Figtree-Bold.ttf";
const FIGTREE_BOLD_URL: &str =
    "https://fonts.gstatic.com/s/figtree/v9/_Xmz-HUzqDCFdgfMsYiV_F7wfS-Bs_eYR15e.ttf";

#[derive(Debug, Clone)]
pub struct FontSet {
    pub regular: FontArc,
    pub bold: FontArc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Draw `text` with its baseline at `baseline_y`, anchored at `x` per `align`.
#[allow(clippy::too_many_arguments)]
pub fn draw_text(
    canvas: &mut RgbaImage,
    font: &FontArc,
    size: f32,
    color: Rgba<u8>,
    x: i32,
    baseline_y: i32,
    align: Align,
    text: &str,
) {
    let scale = PxScale::from(size);
    let scaled = font.as_scaled(scale);

    let start_x = match align {
        Align::Left => x as f32,
        Align::Center => x as f32 - text_width(font, size, text) / 2.0,
        Align::Right => x as f32 - text_width(font, size, text),
    };

    let mut caret = start_x;
    let mut previous: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, baseline_y as f32));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                blend_coverage(canvas, px, py, color, coverage);
            });
        }
        caret += scaled.h_advance(id);
        previous = Some(id);
    }
}

pub fn text_width(font: &FontArc, size: f32, text: &str) -> f32 {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut width = 0.0f32;
    let mut previous: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        previous = Some(id);
    }
    width
}

/// Filled rectangle; empty or negative sizes draw nothing.
pub fn fill_rect(canvas: &mut RgbaImage, x: i32, y: i32, width: i32, height: i32, color: Rgba<u8>) {
    if width <= 0 || height <= 0 {
        return;
    }
    draw_filled_rect_mut(
        canvas,
        Rect::at(x, y).of_size(width as u32, height as u32),
        color,
    );
}

/// Polyline of the given stroke width, with round joins.
pub fn stroke_polyline(canvas: &mut RgbaImage, points: &[(f32, f32)], width: i32, color: Rgba<u8>) {
    let radius = (width / 2).max(0);
    if let [(x, y)] = points {
        draw_filled_circle_mut(canvas, (x.round() as i32, y.round() as i32), radius.max(1), color);
        return;
    }
    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let steps = ((x1 - x0).abs().max((y1 - y0).abs()).ceil() as i32).max(1);
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = (x0 + (x1 - x0) * t).round() as i32;
            let y = (y0 + (y1 - y0) * t).round() as i32;
            if radius == 0 {
                blend_pixel(canvas, x, y, color);
            } else {
                draw_filled_circle_mut(canvas, (x, y), radius, color);
            }
        }
    }
}

fn blend_coverage(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    let mut src = color;
    src.0[3] = ((src.0[3] as f32) * coverage.clamp(0.0, 1.0)).round() as u8;
    blend_pixel(canvas, x, y, src);
}

/// Source-over blend of `src` onto the pixel at (`x`, `y`), clipped to the canvas.
pub fn blend_pixel(canvas: &mut RgbaImage, x: i32, y: i32, src: Rgba<u8>) {
    if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
        return;
    }

    let src_alpha = src.0[3] as f32 / 255.0;
    if src_alpha <= 0.0 {
        return;
    }

    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let dst_alpha = dst.0[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }

    for channel in 0..3 {
        let s = src.0[channel] as f32 / 255.0;
        let d = dst.0[channel] as f32 / 255.0;
        let out = (s * src_alpha + d * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        dst.0[channel] = (out * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Load the configured font, or download and cache the Figtree pair.
pub async fn load_fonts(client: &reqwest::Client, custom: Option<&Path>) -> Result<FontSet> {
    if let Some(path) = custom {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read font {}", path.display()))?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|_| anyhow::anyhow!("{} is not a usable font", path.display()))?;
        return Ok(FontSet {
            regular: font.clone(),
            bold: font,
        });
    }

    let cache_dir = font_cache_dir()?;
    ensure_cache_dir(&cache_dir)?;

    let regular = cached_font(client, &cache_dir.join(FIGTREE_REGULAR_FILE), FIGTREE_REGULAR_URL).await;
    let bold = cached_font(client, &cache_dir.join(FIGTREE_BOLD_FILE), FIGTREE_BOLD_URL).await;

    match (regular, bold) {
        (Some(regular), Some(bold)) => Ok(FontSet { regular, bold }),
        (Some(regular), None) => Ok(FontSet {
            bold: regular.clone(),
            regular,
        }),
        (None, Some(bold)) => Ok(FontSet {
            regular: bold.clone(),
            bold,
        }),
        (None, None) => anyhow::bail!(
            "Failed to load Figtree fonts. Could not download or parse cached font files; set `font` in ~/.ddreport to use a local font."
        ),
    }
}

async fn cached_font(client: &reqwest::Client, path: &Path, url: &str) -> Option<FontArc> {
    if !path.exists() {
        if let Err(err) = fetch_to_file(client, url, path).await {
            tracing::debug!(%err, url, "font download failed");
        }
    }
    fs::read(path)
        .ok()
        .and_then(|bytes| FontArc::try_from_vec(bytes).ok())
}

async fn fetch_to_file(client: &reqwest::Client, url: &str, path: &Path) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;
    if !response.status().is_success() {
        anyhow::bail!("Failed to fetch {} (status {})", url, response.status());
    }
    let bytes = response.bytes().await?;
    fs::write(path, &bytes)?;
    Ok(())
}

fn ensure_cache_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
        }
    }
    Ok(())
}

fn font_cache_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".cache").join("ddreport").join("fonts"))
}
