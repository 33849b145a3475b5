//! Assembly output

use super::{color_bytes, flat_planes, pattern_bytes, total_bytes, EmitOptions};
use crate::models::PackingResult;
use crate::palette::Palette;

/// Write bytes as assembly `db` lines, eight per line.
fn db_block(bytes: &[u8]) -> String {
    let mut out = String::new();
    for chunk in bytes.chunks(8) {
        let row: Vec<String> = chunk.iter().map(|b| format!("#{:02x}", b)).collect();
        out.push_str("\tdb ");
        out.push_str(&row.join(", "));
        out.push('\n');
    }
    out
}

/// Emit assembly color/pattern tables, one pair of labels per plane.
pub fn emit(result: &PackingResult, palette: &Palette, opts: &EmitOptions) -> String {
    let id = &opts.id;
    let mut out = String::new();
    out.push_str(&format!("{}_TOTAL = {}\n\n", id.to_uppercase(), total_bytes(result)));
    out.push_str(&format!("{id}:\n\n"));

    for (n, (_, plane)) in flat_planes(result).enumerate() {
        out.push_str(&format!("{id}_color{n}:\n"));
        out.push_str(&db_block(&color_bytes(plane)));
        out.push('\n');
        out.push_str(&format!("{id}_pattern{n}:\n"));
        out.push_str(&db_block(&pattern_bytes(plane, result.cell_width)));
        out.push('\n');
    }

    if opts.include_palette {
        out.push_str(&format!("{id}_palette:\t; r, g, b of 0-7 per entry\n"));
        for color in palette.iter() {
            let (r, g, b) = color.to_msx();
            out.push_str(&format!("\tdb #{r:02x}, #{g:02x}, #{b:02x}\t; {color}\n"));
        }
    }
    out
}
