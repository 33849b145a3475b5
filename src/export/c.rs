//! C header output

use super::{color_bytes, flat_planes, pattern_bytes, plane_bytes, total_bytes, EmitOptions};
use crate::models::PackingResult;
use crate::palette::Palette;

/// Write bytes as C-style hexadecimal data, eight per line.
fn hex_block(bytes: &[u8]) -> String {
    let mut out = String::new();
    for chunk in bytes.chunks(8) {
        let row: Vec<String> = chunk.iter().map(|b| format!("0x{:02x}", b)).collect();
        out.push_str(&row.join(", "));
        out.push_str(",\n");
    }
    out
}

/// Emit a C header: `{id}_TOTAL` byte count plus color/pattern arrays,
/// definitions guarded by `LOCAL` and declarations otherwise.
pub fn emit(result: &PackingResult, palette: &Palette, opts: &EmitOptions) -> String {
    let id = &opts.id;
    let guard = id.to_uppercase();
    let planes: Vec<_> = flat_planes(result).collect();
    let color_len = result.cell_height as usize;
    let pattern_len = plane_bytes(result) - color_len;

    let mut out = String::new();
    out.push_str(&format!("#ifndef _{guard}_H\n"));
    out.push_str(&format!("#define _{guard}_H\n\n"));
    out.push_str(&format!("#define {guard}_TOTAL {}\n\n", total_bytes(result)));

    if planes.is_empty() {
        out.push_str(&format!("#endif // _{guard}_H\n"));
        return out;
    }

    let mut colors = String::new();
    let mut patterns = String::new();
    for (_, plane) in &planes {
        colors.push_str(&format!("{{\n{}}},\n", hex_block(&color_bytes(plane))));
        patterns.push_str(&format!("{{\n{}}},\n", hex_block(&pattern_bytes(plane, result.cell_width))));
    }

    out.push_str("#ifdef LOCAL\n\n");
    out.push_str(&format!(
        "const unsigned char {id}_colors[{}][{}] = {{\n{}}};\n\n",
        planes.len(),
        color_len,
        colors
    ));
    out.push_str(&format!(
        "const unsigned char {id}_patterns[{}][{}] = {{\n{}}};\n\n",
        planes.len(),
        pattern_len,
        patterns
    ));
    if opts.include_palette {
        let mut entries = String::new();
        for color in palette.iter() {
            let (r, g, b) = color.to_msx();
            entries.push_str(&format!("{{{r}, {g}, {b}}}, // {color}\n"));
        }
        out.push_str(&format!(
            "const unsigned char {id}_palette[{}][3] = {{\n{}}};\n\n",
            palette.len(),
            entries
        ));
    }
    out.push_str("#else\n\n");
    out.push_str(&format!(
        "extern const unsigned char {id}_colors[{}][{}];\n",
        planes.len(),
        color_len
    ));
    out.push_str(&format!(
        "extern const unsigned char {id}_patterns[{}][{}];\n",
        planes.len(),
        pattern_len
    ));
    if opts.include_palette {
        out.push_str(&format!("extern const unsigned char {id}_palette[{}][3];\n", palette.len()));
    }
    out.push_str("\n#endif // LOCAL\n");
    out.push_str(&format!("#endif // _{guard}_H\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::super::tests::sample_result;
    use super::*;
    use crate::color::Rgb;

    fn palette() -> Palette {
        Palette::new(vec![Rgb::new(255, 0, 255), Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)])
            .unwrap()
    }

    #[test]
    fn test_header_structure() {
        let out = emit(&sample_result(), &palette(), &EmitOptions::default());
        assert!(out.starts_with("#ifndef _SPRITES_H\n#define _SPRITES_H\n"));
        assert!(out.contains("#define SPRITES_TOTAL 96\n"));
        assert!(out.contains("const unsigned char sprites_colors[2][16] = {"));
        assert!(out.contains("const unsigned char sprites_patterns[2][32] = {"));
        assert!(out.contains("extern const unsigned char sprites_colors[2][16];"));
        assert!(out.contains("0x42")); // CC-flagged color entry
        assert!(out.ends_with("#endif // _SPRITES_H\n"));
    }

    #[test]
    fn test_palette_included_on_request() {
        let opts = EmitOptions { id: "hero".to_string(), include_palette: true };
        let out = emit(&sample_result(), &palette(), &opts);
        assert!(out.contains("const unsigned char hero_palette[16][3] = {"));
        assert!(out.contains("{7, 0, 7}, // #FF00FF"));
    }

    #[test]
    fn test_empty_sheet_still_compiles() {
        let mut result = sample_result();
        result.cells.clear();
        result.total_planes = 0;
        let out = emit(&result, &palette(), &EmitOptions::default());
        assert!(out.contains("#define SPRITES_TOTAL 0\n"));
        assert!(!out.contains("const unsigned char"));
    }
}
