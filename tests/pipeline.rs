//! End-to-end pipeline tests
//!
//! Exercise the full flow the CLI drives: write a PNG to disk, load it,
//! resolve a palette, index the pixels, pack (or check) the sheet, and
//! emit code from the result.

use std::path::PathBuf;

use image::RgbImage;
use tempfile::TempDir;

use orsprites::export::{c, EmitOptions};
use orsprites::input::{index_image, load_rgb};
use orsprites::minimizer::{minimise, SearchOptions};
use orsprites::models::ConvertOptions;
use orsprites::packer::{pack_image, PackError};
use orsprites::palette::Palette;
use orsprites::validator::check_sheet;

const PALETTE_TEXT: &str = "\
; test palette, first entry transparent
#FF00FF
#111111
#222222
#333333
";

/// 16x16 sheet: top row shows colors 1, 2 and 3 together (3 = 1 | 2),
/// second row only color 1.
fn write_sheet(dir: &TempDir) -> PathBuf {
    let mut image = RgbImage::from_pixel(16, 16, image::Rgb([255, 0, 255]));
    for x in 0..5 {
        image.put_pixel(x, 0, image::Rgb([0x11, 0x11, 0x11]));
        image.put_pixel(x + 5, 0, image::Rgb([0x22, 0x22, 0x22]));
        image.put_pixel(x + 10, 0, image::Rgb([0x33, 0x33, 0x33]));
        image.put_pixel(x, 1, image::Rgb([0x11, 0x11, 0x11]));
    }
    let path = dir.path().join("sheet.png");
    image.save(&path).unwrap();
    path
}

#[test]
fn test_convert_pipeline_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = write_sheet(&dir);

    let rgb = load_rgb(&path).unwrap();
    let palette = Palette::from_text(PALETTE_TEXT).unwrap();
    let indexed = index_image(&rgb, &palette).unwrap();
    let opts = ConvertOptions::default();

    let result = pack_image(&indexed, &palette, &opts).unwrap();
    assert_eq!(result.cells.len(), 1);
    // Colors 1 and 2 carry the row, 3 rides on their overlap.
    assert_eq!(result.total_planes, 2);

    // Reconstruct the raster by OR-ing plane colors per pixel.
    let mut raster = vec![0u8; 16 * 16];
    for plane in &result.cells[0].planes {
        for (j, row) in plane.rows.iter().enumerate() {
            for i in 0..16u32 {
                if row.mask & (1 << (15 - i)) != 0 {
                    raster[j * 16 + i as usize] |= row.color;
                }
            }
        }
    }
    assert_eq!(&raster[..], indexed.pixels());

    // The same sheet passes validation with the same parameters.
    let report = check_sheet(&indexed, &palette, 16, 16, 2, 0).unwrap();
    assert!(report.is_empty());

    // And the emitted header carries both planes.
    let header = c::emit(&result, &palette, &EmitOptions::default());
    assert!(header.contains("sprites_colors[2][16]"));
    assert!(header.contains("sprites_patterns[2][32]"));
}

#[test]
fn test_minimise_never_worse_than_given_order() {
    let dir = TempDir::new().unwrap();
    let path = write_sheet(&dir);

    let rgb = load_rgb(&path).unwrap();
    let palette = Palette::from_text(PALETTE_TEXT).unwrap();
    let indexed = index_image(&rgb, &palette).unwrap();
    let opts = ConvertOptions::default();

    let identity = pack_image(&indexed, &palette, &opts).unwrap();
    let minimized = minimise(&indexed, &palette, &opts, &SearchOptions::default()).unwrap();
    assert!(minimized.result.total_planes <= identity.total_planes);
}

#[test]
fn test_check_reports_bad_scanline() {
    let dir = TempDir::new().unwrap();
    // The palette file pins #444444 to index 4, so one line carries the
    // index set {1, 2, 4} where no pair ORs to the third member.
    let palette_text = "#FF00FF\n#111111\n#222222\n#333333\n#444444\n";
    let mut image = RgbImage::from_pixel(16, 16, image::Rgb([255, 0, 255]));
    image.put_pixel(0, 3, image::Rgb([0x11, 0x11, 0x11]));
    image.put_pixel(1, 3, image::Rgb([0x22, 0x22, 0x22]));
    image.put_pixel(2, 3, image::Rgb([0x44, 0x44, 0x44]));
    let path = dir.path().join("bad.png");
    image.save(&path).unwrap();

    let rgb = load_rgb(&path).unwrap();
    let palette = Palette::from_text(palette_text).unwrap();
    let indexed = index_image(&rgb, &palette).unwrap();

    let report = check_sheet(&indexed, &palette, 16, 16, 2, 0).unwrap();
    assert_eq!(report.len(), 1);
    let violation = &report.violations[0];
    assert_eq!((violation.col, violation.row, violation.line), (0, 0, 3));
    assert_eq!(violation.colors, vec![1, 2, 4]);

    // The packer treats the same condition as a hard conversion failure.
    let err = pack_image(&indexed, &palette, &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, PackError::UnpackableCell { .. }));

    // Relabeling the third color onto index 3 makes the line combine, so
    // the minimizer converts the sheet after all.
    let minimized =
        minimise(&indexed, &palette, &ConvertOptions::default(), &SearchOptions::default())
            .unwrap();
    assert_eq!(minimized.result.total_planes, 2);
}

#[test]
fn test_dimension_mismatch_is_fatal() {
    let dir = TempDir::new().unwrap();
    let image = RgbImage::from_pixel(20, 16, image::Rgb([255, 0, 255]));
    let path = dir.path().join("odd.png");
    image.save(&path).unwrap();

    let rgb = load_rgb(&path).unwrap();
    let palette = Palette::from_image(&rgb, orsprites::color::Rgb::new(255, 0, 255)).unwrap();
    let indexed = index_image(&rgb, &palette).unwrap();

    let err = pack_image(&indexed, &palette, &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, PackError::Extract(_)));
    assert!(err.to_string().contains("not a multiple of sprite size"));
}
