//! Palette container and palette sources
//!
//! A palette is always 16 entries long (the MSX palette register file);
//! index 0 is the transparent/background sentinel and never participates in
//! OR-color combination. Palettes come from a text file or are derived from
//! the distinct colors of an image.

use std::collections::HashMap;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::{parse_color, ColorError, Rgb};

/// Number of palette entries on the hardware.
pub const MAX_COLORS: usize = 16;

/// Error type for palette construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// More than 16 distinct colors were supplied or found in an image
    #[error("palette too big (maximum of {MAX_COLORS} colors expected, got {0})")]
    Overflow(usize),
    /// No colors at all
    #[error("empty palette")]
    Empty,
    /// A palette file line failed to parse
    #[error("palette line {line}: {source}")]
    Syntax { line: usize, source: ColorError },
}

/// An ordered 16-entry color palette, index 0 transparent.
///
/// Construction pads short inputs to 16 entries with black, matching the
/// hardware register file; lookups are first-occurrence-wins so filler
/// duplicates never shadow a real entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Create a palette from up to 16 colors, index 0 transparent.
    pub fn new(colors: Vec<Rgb>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        if colors.len() > MAX_COLORS {
            return Err(PaletteError::Overflow(colors.len()));
        }
        let mut colors = colors;
        colors.resize(MAX_COLORS, Rgb::new(0, 0, 0));
        Ok(Self { colors })
    }

    /// Parse a palette from text: one color per line, `#RRGGBB`/`#RGB` hex
    /// or `R,G,B` decimal. Blank lines and `;` comments are ignored. The
    /// first color is index 0 (transparent).
    pub fn from_text(text: &str) -> Result<Self, PaletteError> {
        let mut colors = Vec::new();
        for (n, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            let color =
                parse_color(line).map_err(|source| PaletteError::Syntax { line: n + 1, source })?;
            colors.push(color);
        }
        Self::new(colors)
    }

    /// Derive a palette from the distinct colors of an RGB image.
    ///
    /// Pixels equal to `transparent` map to index 0; the remaining distinct
    /// colors follow in ascending (r, g, b) order, as png-derived palettes
    /// have no inherent ordering of their own.
    pub fn from_image(image: &RgbImage, transparent: Rgb) -> Result<Self, PaletteError> {
        let mut seen: Vec<Rgb> = image
            .pixels()
            .map(|p| Rgb::from(p.0))
            .filter(|&c| c != transparent)
            .collect();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() + 1 > MAX_COLORS {
            return Err(PaletteError::Overflow(seen.len() + 1));
        }
        let mut colors = vec![transparent];
        colors.extend(seen);
        Self::new(colors)
    }

    /// The transparent/background color (index 0).
    pub fn transparent(&self) -> Rgb {
        self.colors[0]
    }

    pub fn get(&self, index: u8) -> Option<Rgb> {
        self.colors.get(index as usize).copied()
    }

    /// Always [`MAX_COLORS`] after construction.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.colors.iter().copied()
    }

    /// Map where key is a color and value is its palette index.
    ///
    /// First occurrence wins, so duplicate filler entries never shadow a
    /// real one.
    pub fn lookup(&self) -> HashMap<Rgb, u8> {
        let mut map = HashMap::new();
        for (i, &c) in self.colors.iter().enumerate() {
            map.entry(c).or_insert(i as u8);
        }
        map
    }

    /// Apply an index permutation: `map[old] = new`, with `map[0] == 0`.
    ///
    /// The result holds the same multiset of colors under the new
    /// index-to-color mapping.
    pub fn permuted(&self, map: &[u8; MAX_COLORS]) -> Palette {
        debug_assert_eq!(map[0], 0);
        let mut colors = vec![Rgb::new(0, 0, 0); MAX_COLORS];
        for (old, &new) in map.iter().enumerate() {
            colors[new as usize] = self.colors[old];
        }
        Palette { colors }
    }
}
