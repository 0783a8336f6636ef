//! Category display order and colors for the rendered report.

use image::Rgba;
use std::collections::HashMap;

/// Canonical categories, top of a stacked bar first.
const CANONICAL: &[(&str, [u8; 3])] = &[
    ("Insane", [0x00, 0x00, 0x00]),
    ("Brutal", [0xd4, 0x24, 0x47]),
    ("Oldschool", [0xff, 0x26, 0x89]),
    ("Moderate", [0xff, 0xae, 0x25]),
    ("DDmaX.Easy", [0xbc, 0xd4, 0xe6]),
    ("DDmaX.Next", [0x03, 0xc8, 0x83]),
    ("DDmaX.Pro", [0x09, 0x0d, 0xa7]),
    ("DDmaX.Nut", [0xff, 0x00, 0x00]),
    ("Novice", [0x59, 0x82, 0x21]),
    ("Dummy", [0x5b, 0x92, 0xe5]),
    ("Solo", [0x4f, 0x42, 0xb5]),
    ("Race", [0xb7, 0x84, 0xa7]),
    ("Fun", [0xa8, 0xc3, 0xbc]),
];

const FALLBACK: Rgba<u8> = Rgba([0x9e, 0x9e, 0x9e, 0xFF]);

/// Immutable category → color table handed to the renderer.
#[derive(Debug, Clone)]
pub struct Palette {
    order: Vec<String>,
    colors: HashMap<String, Rgba<u8>>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            order: CANONICAL.iter().map(|(name, _)| name.to_string()).collect(),
            colors: CANONICAL
                .iter()
                .map(|(name, [r, g, b])| (name.to_string(), Rgba([*r, *g, *b, 0xFF])))
                .collect(),
        }
    }
}

impl Palette {
    /// Apply `category = "#rrggbb"` overrides; unparsable colors are ignored.
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Self {
        for (category, hex) in overrides {
            match parse_hex_color(hex) {
                Some(color) => {
                    self.colors.insert(category.clone(), color);
                }
                None => tracing::warn!(%category, %hex, "ignoring invalid color override"),
            }
        }
        self
    }

    pub fn color(&self, category: &str) -> Rgba<u8> {
        self.colors.get(category).copied().unwrap_or(FALLBACK)
    }

    /// `categories` in display order: canonical ones first, the rest alphabetically.
    pub fn ordered<'a>(&self, categories: &'a [String]) -> Vec<&'a str> {
        let mut known: Vec<(usize, &'a str)> = Vec::with_capacity(categories.len());
        let mut unknown: Vec<&'a str> = Vec::new();
        for category in categories {
            match self.order.iter().position(|name| name == category) {
                Some(rank) => known.push((rank, category.as_str())),
                None => unknown.push(category.as_str()),
            }
        }
        known.sort_by_key(|(rank, _)| *rank);
        unknown.sort_unstable();
        known
            .into_iter()
            .map(|(_, name)| name)
            .chain(unknown)
            .collect()
    }
}

pub fn parse_hex_color(hex: &str) -> Option<Rgba<u8>> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Rgba([r, g, b, 0xFF]))
}
