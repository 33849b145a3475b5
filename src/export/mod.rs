//! Sprite data emitters
//!
//! Serializes a [`PackingResult`] into source text an MSX toolchain can
//! consume: a C header, assembly `db` tables, a self-contained BASIC
//! program, or JSON for machine consumers.

pub mod asm;
pub mod basic;
pub mod c;
pub mod json;

use crate::models::{PackingResult, SpriteCell, SpritePlane};

/// Options shared by the emitters.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Variable/label base name
    pub id: String,
    /// Embed the palette in C and assembly output
    pub include_palette: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self { id: "sprites".to_string(), include_palette: false }
    }
}

/// Per-line sprite color table bytes for one plane.
///
/// Inactive rows emit 0; combined rows carry the CC bit (0x40) so the VDP
/// ORs the plane with the one in front of it.
pub fn color_bytes(plane: &SpritePlane) -> Vec<u8> {
    plane
        .rows
        .iter()
        .map(|row| {
            if row.mask == 0 {
                0
            } else if row.combined {
                row.color | 0x40
            } else {
                row.color
            }
        })
        .collect()
}

/// Sprite pattern bytes for one plane: one byte per row per 8-pixel
/// column, whole columns in order (the VDP's 16x16 sprite layout stores
/// the left half's 16 bytes, then the right half's).
pub fn pattern_bytes(plane: &SpritePlane, cell_width: u32) -> Vec<u8> {
    let columns = cell_width.div_ceil(8);
    let mut out = Vec::with_capacity((columns as usize) * plane.rows.len());
    for column in 0..columns {
        let shift = cell_width.saturating_sub(8 * (column + 1));
        for row in &plane.rows {
            out.push((row.mask >> shift) as u8);
        }
    }
    out
}

/// Bytes of VRAM one plane occupies (color table + pattern).
pub fn plane_bytes(result: &PackingResult) -> usize {
    let columns = result.cell_width.div_ceil(8) as usize;
    let height = result.cell_height as usize;
    height + columns * height
}

/// Total VRAM bytes for the whole sheet.
pub fn total_bytes(result: &PackingResult) -> usize {
    result.total_planes * plane_bytes(result)
}

/// All planes of the sheet in cell order, paired with their cell.
pub fn flat_planes(result: &PackingResult) -> impl Iterator<Item = (&SpriteCell, &SpritePlane)> {
    result.cells.iter().flat_map(|cell| cell.planes.iter().map(move |plane| (cell, plane)))
}
