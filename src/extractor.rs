//! Sprite tile extraction
//!
//! Slices an indexed image into fixed-size sprite cells and derives, per
//! cell and per scanline, the set of distinct non-transparent color indices
//! present. Pure functions of the image region; the packer consumes the
//! result.

use thiserror::Error;

use crate::models::IndexedImage;
use crate::palette::{Palette, MAX_COLORS};

/// Error type for extraction failures. Both variants are fatal for a
/// conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// Image dimensions are not an exact multiple of the cell size
    #[error(
        "image size {width}x{height} is not a multiple of sprite size {cell_width}x{cell_height}"
    )]
    DimensionMismatch { width: u32, height: u32, cell_width: u32, cell_height: u32 },
    /// A pixel holds an index outside the palette's valid range
    #[error("pixel ({x},{y}) has color index {index}, outside the {palette_len}-entry palette")]
    InvalidIndex { x: u32, y: u32, index: u8, palette_len: usize },
}

/// One sprite-sized tile of the source image.
///
/// `lines[j]` is the scanline color set of row `j`: distinct
/// non-transparent indices in left-to-right first-appearance order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub col: u32,
    pub row: u32,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub lines: Vec<Vec<u8>>,
}

impl Cell {
    /// True when the cell holds only transparent pixels.
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.is_empty())
    }

    /// Apply an index permutation (`map[old] = new`) to the cell.
    ///
    /// Scanline sets keep their left-to-right order; only the index values
    /// change. The minimizer uses this to evaluate candidate arrangements
    /// without re-slicing the image.
    pub fn remap(&self, map: &[u8; MAX_COLORS]) -> Cell {
        Cell {
            col: self.col,
            row: self.row,
            width: self.width,
            height: self.height,
            pixels: self.pixels.iter().map(|&p| map[p as usize]).collect(),
            lines: self
                .lines
                .iter()
                .map(|line| line.iter().map(|&c| map[c as usize]).collect())
                .collect(),
        }
    }
}

/// Partition an image into non-overlapping sprite cells.
///
/// Cells are returned in row-major order, blank cells included, so cell
/// coordinates stay aligned with the source grid. Image dimensions that are
/// not exact multiples of the cell size are a hard input error, as is any
/// pixel index outside the palette.
pub fn extract_cells(
    image: &IndexedImage,
    palette: &Palette,
    cell_width: u32,
    cell_height: u32,
    transparent: u8,
) -> Result<Vec<Cell>, ExtractError> {
    let (width, height) = (image.width(), image.height());
    if cell_width == 0
        || cell_height == 0
        || width % cell_width != 0
        || height % cell_height != 0
    {
        return Err(ExtractError::DimensionMismatch { width, height, cell_width, cell_height });
    }

    let mut cells = Vec::with_capacity(((width / cell_width) * (height / cell_height)) as usize);
    for row in 0..height / cell_height {
        for col in 0..width / cell_width {
            let mut pixels = Vec::with_capacity((cell_width * cell_height) as usize);
            let mut lines = Vec::with_capacity(cell_height as usize);
            for j in 0..cell_height {
                let y = row * cell_height + j;
                let mut line: Vec<u8> = Vec::new();
                for i in 0..cell_width {
                    let x = col * cell_width + i;
                    let index = image.get(x, y);
                    if index as usize >= palette.len() {
                        return Err(ExtractError::InvalidIndex {
                            x,
                            y,
                            index,
                            palette_len: palette.len(),
                        });
                    }
                    pixels.push(index);
                    if index != transparent && !line.contains(&index) {
                        line.push(index);
                    }
                }
                lines.push(line);
            }
            cells.push(Cell { col, row, width: cell_width, height: cell_height, pixels, lines });
        }
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    fn test_palette() -> Palette {
        Palette::new(vec![Rgb::new(255, 0, 255), Rgb::new(1, 1, 1), Rgb::new(2, 2, 2)]).unwrap()
    }

    #[test]
    fn test_dimension_mismatch() {
        let image = IndexedImage::new(10, 16, vec![0; 160]);
        let err = extract_cells(&image, &test_palette(), 16, 16, 0).unwrap_err();
        assert_eq!(
            err,
            ExtractError::DimensionMismatch {
                width: 10,
                height: 16,
                cell_width: 16,
                cell_height: 16
            }
        );
    }

    #[test]
    fn test_line_sets_keep_first_appearance_order() {
        // One 4x2 cell: line 0 shows 2 before 1, line 1 is blank.
        let image = IndexedImage::new(4, 2, vec![2, 1, 2, 1, 0, 0, 0, 0]);
        let cells = extract_cells(&image, &test_palette(), 4, 2, 0).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].lines[0], vec![2, 1]);
        assert!(cells[0].lines[1].is_empty());
    }

    #[test]
    fn test_cells_row_major_with_blanks() {
        let mut pixels = vec![0; 8 * 4];
        pixels[4] = 1; // cell (1,0)
        pixels[2 * 8] = 2; // cell (0,1)
        let image = IndexedImage::new(8, 4, pixels);
        let cells = extract_cells(&image, &test_palette(), 4, 2, 0).unwrap();
        assert_eq!(cells.len(), 4);
        assert!(cells[0].is_blank());
        assert_eq!((cells[1].col, cells[1].row), (1, 0));
        assert_eq!(cells[1].lines[0], vec![1]);
        assert_eq!(cells[2].lines[0], vec![2]);
        assert!(cells[3].is_blank());
    }

    #[test]
    fn test_invalid_index_located() {
        let image = IndexedImage::new(2, 2, vec![0, 0, 0, 99]);
        let err = extract_cells(&image, &test_palette(), 2, 2, 0).unwrap_err();
        assert_eq!(
            err,
            ExtractError::InvalidIndex { x: 1, y: 1, index: 99, palette_len: MAX_COLORS }
        );
    }

    #[test]
    fn test_remap_applies_to_pixels_and_lines() {
        let image = IndexedImage::new(2, 1, vec![1, 2]);
        let cells = extract_cells(&image, &test_palette(), 2, 1, 0).unwrap();
        let mut map: [u8; MAX_COLORS] = std::array::from_fn(|i| i as u8);
        map[1] = 2;
        map[2] = 1;
        let remapped = cells[0].remap(&map);
        assert_eq!(remapped.pixels, vec![2, 1]);
        assert_eq!(remapped.lines[0], vec![2, 1]);
    }
}
