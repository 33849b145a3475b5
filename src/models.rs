//! Data models for the conversion pipeline

use serde::{Deserialize, Serialize};

/// A width x height grid of palette indices, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl IndexedImage {
    /// Create an indexed image. `pixels` must hold exactly
    /// `width * height` entries.
    ///
    /// # Panics
    ///
    /// Panics if the pixel buffer length does not match the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(
            pixels.len(),
            (width * height) as usize,
            "pixel buffer does not match {width}x{height}"
        );
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// One scanline of one sprite plane: a pixel-select bitmask plus the
/// palette index this plane contributes on that line.
///
/// Bit `cell_width - 1 - x` of `mask` selects pixel `x`, so the leftmost
/// pixel is the most significant bit. `combined` marks rows whose color is
/// OR-combined with a plane in front of it (the hardware CC bit).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaneRow {
    pub mask: u16,
    pub color: u8,
    pub combined: bool,
}

/// One hardware sprite's worth of data for one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpritePlane {
    pub rows: Vec<PlaneRow>,
}

impl SpritePlane {
    pub fn empty(height: u32) -> Self {
        Self { rows: vec![PlaneRow::default(); height as usize] }
    }
}

/// The planes reproducing one cell of the source image.
///
/// `col`/`row` are cell coordinates (in cells, not pixels). An empty plane
/// list means the cell held only transparent pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteCell {
    pub col: u32,
    pub row: u32,
    pub planes: Vec<SpritePlane>,
}

/// Result of packing a whole image: the per-cell plane lists and the total
/// plane count across all cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackingResult {
    pub cell_width: u32,
    pub cell_height: u32,
    pub total_planes: usize,
    pub cells: Vec<SpriteCell>,
}

/// Recognized conversion options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Sprite tile width in pixels (hardware native: 16)
    pub cell_width: u32,
    /// Sprite tile height in pixels (hardware native: 16)
    pub cell_height: u32,
    /// Maximum number of sprite planes that may overlap on one scanline
    pub max_planes: u8,
    /// Palette index treated as transparent
    pub transparent_index: u8,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self { cell_width: 16, cell_height: 16, max_planes: 2, transparent_index: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_image_access() {
        let image = IndexedImage::new(2, 2, vec![0, 1, 2, 3]);
        assert_eq!(image.get(0, 0), 0);
        assert_eq!(image.get(1, 0), 1);
        assert_eq!(image.get(0, 1), 2);
        assert_eq!(image.get(1, 1), 3);
    }

    #[test]
    #[should_panic(expected = "pixel buffer")]
    fn test_indexed_image_bad_length() {
        IndexedImage::new(2, 2, vec![0, 1, 2]);
    }

    #[test]
    fn test_packing_result_roundtrip() {
        let result = PackingResult {
            cell_width: 16,
            cell_height: 16,
            total_planes: 1,
            cells: vec![SpriteCell {
                col: 0,
                row: 0,
                planes: vec![SpritePlane {
                    rows: vec![PlaneRow { mask: 0x8000, color: 1, combined: false }],
                }],
            }],
        };
        let json = serde_json::to_string(&result).unwrap();
        let parsed: PackingResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, parsed);
    }

    #[test]
    fn test_default_options_match_hardware() {
        let opts = ConvertOptions::default();
        assert_eq!((opts.cell_width, opts.cell_height), (16, 16));
        assert_eq!(opts.max_planes, 2);
        assert_eq!(opts.transparent_index, 0);
    }
}
