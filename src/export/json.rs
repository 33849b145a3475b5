//! JSON output for machine consumers

use serde::Serialize;

use super::{color_bytes, flat_planes, pattern_bytes, total_bytes, EmitOptions};
use crate::models::PackingResult;
use crate::palette::Palette;

#[derive(Serialize)]
struct Sheet<'a> {
    id: &'a str,
    cell_width: u32,
    cell_height: u32,
    total_planes: usize,
    total_bytes: usize,
    palette: Vec<String>,
    sprites: Vec<Entry>,
}

#[derive(Serialize)]
struct Entry {
    col: u32,
    row: u32,
    colors: Vec<u8>,
    patterns: Vec<u8>,
}

/// Emit the packed sheet as pretty-printed JSON. The palette is always
/// included here; hex strings keep it readable in diffs.
pub fn emit(
    result: &PackingResult,
    palette: &Palette,
    opts: &EmitOptions,
) -> Result<String, serde_json::Error> {
    let sheet = Sheet {
        id: &opts.id,
        cell_width: result.cell_width,
        cell_height: result.cell_height,
        total_planes: result.total_planes,
        total_bytes: total_bytes(result),
        palette: palette.iter().map(|c| c.to_string()).collect(),
        sprites: flat_planes(result)
            .map(|(cell, plane)| Entry {
                col: cell.col,
                row: cell.row,
                colors: color_bytes(plane),
                patterns: pattern_bytes(plane, result.cell_width),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&sheet)
}
