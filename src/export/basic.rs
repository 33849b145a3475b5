//! BASIC program output
//!
//! Emits a self-contained program: palette setup, sprite data loading from
//! DATA statements, and a PUT SPRITE demo mirroring the sheet layout.

use super::{color_bytes, flat_planes, pattern_bytes, plane_bytes, total_bytes, EmitOptions};
use crate::models::PackingResult;
use crate::palette::Palette;

/// Sequential BASIC line numbering, ten apart.
struct Listing {
    number: u32,
    out: String,
}

impl Listing {
    fn new(start: u32) -> Self {
        Self { number: start, out: String::new() }
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(&format!("{} {}\n", self.number, text));
        self.number += 10;
    }

    /// Jump to the next power of ten, where the DATA section starts.
    fn jump(&mut self) {
        let mut next = 10;
        while next <= self.number {
            next *= 10;
        }
        self.number = next;
    }
}

/// Write bytes as one BASIC DATA statement.
fn data_line(bytes: &[u8]) -> String {
    let row: Vec<String> = bytes.iter().map(|b| format!("&H{:02X}", b)).collect();
    format!("DATA {}", row.join(", "))
}

/// Emit a runnable BASIC program for the packed sheet.
pub fn emit(result: &PackingResult, palette: &Palette, opts: &EmitOptions) -> String {
    let id = opts.id.to_uppercase();
    let color_len = result.cell_height as usize;
    let pattern_len = plane_bytes(result) - color_len;
    let planes: Vec<_> = flat_planes(result).collect();

    let mut listing = Listing::new(100);
    listing.push("SCREEN 5,2");
    // Enlarged sprites off, same background color as the original image.
    listing.push("VDP(9)=VDP(9) OR &H20: COLOR 15,0,0");
    listing.push("REM PALETTE");
    for (i, color) in palette.iter().enumerate() {
        let (r, g, b) = color.to_msx();
        listing.push(&format!("COLOR=({i},{r},{g},{b}): REM RGB={color}"));
    }
    for n in 0..planes.len() {
        listing.push(&format!("REM READ {id}_COLORS({n})"));
        listing.push(&format!(
            "A$=\"\":FOR I = 1 TO {color_len}:READ A%:A$=A$+CHR$(A%):NEXT:COLOR SPRITE$({n})=A$"
        ));
        listing.push(&format!("REM READ {id}_PATTERN({n})"));
        listing.push(&format!(
            "A$=\"\":FOR I = 1 TO {pattern_len}:READ A%:A$=A$+CHR$(A%):NEXT:SPRITE$({n})=A$"
        ));
    }
    listing.push(&format!("REM PUT {id} SPRITE ON SCREEN"));
    for (n, (cell, _)) in planes.iter().enumerate() {
        let x = 100 + cell.col * result.cell_width;
        let y = 100 + cell.row * result.cell_height;
        listing.push(&format!("PUT SPRITE {n},({x},{y}),,{n}"));
    }
    listing.push(&format!("IF INKEY$ = \"\" GOTO {}", listing.number));
    listing.push("END");

    listing.jump();
    listing.push(&format!("REM {id}_TOTAL = {}", total_bytes(result)));
    for (n, (_, plane)) in planes.iter().enumerate() {
        listing.push(&format!("REM {id}_COLORS({n})"));
        listing.push(&data_line(&color_bytes(plane)));
        listing.push(&format!("REM {id}_PATTERN({n})"));
        listing.push(&data_line(&pattern_bytes(plane, result.cell_width)));
    }
    listing.out
}
