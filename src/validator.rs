//! Sprite sheet validation
//!
//! The inverse check of the packer: given an already-indexed sheet, verify
//! that every scanline's color set is realizable under the OR-color rule
//! with at most M planes, and report every violation rather than stopping
//! at the first.

use crate::extractor::{extract_cells, ExtractError};
use crate::models::IndexedImage;
use crate::packer::{capacity, decompose_line};
use crate::palette::Palette;

/// Why a scanline cannot be shown by the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationReason {
    /// More distinct colors than M planes can ever show
    TooManyColors,
    /// Within the color budget, but no OR factorization exists
    NoDecomposition,
}

/// One hardware-invalid scanline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Cell coordinates, in cells
    pub col: u32,
    pub row: u32,
    /// Scanline within the cell
    pub line: u32,
    /// The offending color set, ascending
    pub colors: Vec<u8>,
    pub reason: ViolationReason,
    /// Plane limit the check ran with
    pub max_planes: u8,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sprite ({},{}) at line {}: colors {:?} ",
            self.col, self.row, self.line, self.colors
        )?;
        match self.reason {
            ViolationReason::TooManyColors => write!(
                f,
                "- {} distinct colors exceed the {} reachable with {} planes",
                self.colors.len(),
                capacity(self.max_planes),
                self.max_planes
            ),
            ViolationReason::NoDecomposition => write!(
                f,
                "- no valid OR decomposition with {} planes",
                self.max_planes
            ),
        }
    }
}

/// Every violation found in one validation run. Empty means the sheet is
/// hardware-valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }
}

/// Check every scanline of an indexed sprite sheet against the OR-color
/// combination rule.
///
/// A scanline with k <= `max_planes` colors is trivially valid; otherwise
/// it must decompose into at most `max_planes` base colors whose ORs
/// produce the rest (the same predicate the packer uses). The input is
/// never mutated; running twice yields identical reports.
pub fn check_sheet(
    image: &IndexedImage,
    palette: &Palette,
    cell_width: u32,
    cell_height: u32,
    max_planes: u8,
    transparent: u8,
) -> Result<ValidationReport, ExtractError> {
    let cells = extract_cells(image, palette, cell_width, cell_height, transparent)?;

    let mut report = ValidationReport::default();
    for cell in &cells {
        for (j, set) in cell.lines.iter().enumerate() {
            if set.len() <= max_planes as usize {
                continue;
            }
            let reason = if set.len() > capacity(max_planes) {
                ViolationReason::TooManyColors
            } else if decompose_line(set, max_planes).is_none() {
                ViolationReason::NoDecomposition
            } else {
                continue;
            };
            let mut colors = set.clone();
            colors.sort_unstable();
            report.violations.push(Violation {
                col: cell.col,
                row: cell.row,
                line: j as u32,
                colors,
                reason,
                max_planes,
            });
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    fn palette_of(n: u8) -> Palette {
        Palette::new((0..=n).map(|i| Rgb::new(i * 10, i, 255 - i)).collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn test_few_colors_always_valid() {
        let image = IndexedImage::new(4, 2, vec![1, 2, 0, 0, 5, 9, 0, 0]);
        let report = check_sheet(&image, &palette_of(15), 4, 2, 2, 0).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_scenario_c_or_combination_valid() {
        // Third color 3 is exactly 1 | 2: realizable with two planes.
        let image = IndexedImage::new(4, 1, vec![1, 2, 3, 0]);
        let report = check_sheet(&image, &palette_of(15), 4, 1, 2, 0).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_scenario_d_no_pair_ors_to_third() {
        // 1 | 2 == 3, never 5: exactly one violation for that line.
        let image = IndexedImage::new(4, 1, vec![1, 2, 5, 0]);
        let report = check_sheet(&image, &palette_of(15), 4, 1, 2, 0).unwrap();
        assert_eq!(report.len(), 1);
        let violation = &report.violations[0];
        assert_eq!((violation.col, violation.row, violation.line), (0, 0, 0));
        assert_eq!(violation.colors, vec![1, 2, 5]);
        assert_eq!(violation.reason, ViolationReason::NoDecomposition);
    }

    #[test]
    fn test_too_many_colors_reason() {
        let image = IndexedImage::new(4, 1, vec![1, 2, 4, 8]);
        let report = check_sheet(&image, &palette_of(15), 4, 1, 2, 0).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.violations[0].reason, ViolationReason::TooManyColors);
        let text = report.violations[0].to_string();
        assert!(text.contains("4 distinct colors exceed the 3 reachable with 2 planes"));
    }

    #[test]
    fn test_every_violation_reported() {
        // Two bad lines in different cells: both must appear.
        let image = IndexedImage::new(4, 2, vec![1, 2, 5, 0, 0, 1, 2, 4]);
        let report = check_sheet(&image, &palette_of(15), 4, 1, 2, 0).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report.violations[0].row, 0);
        assert_eq!(report.violations[1].row, 1);
    }

    #[test]
    fn test_validator_idempotent() {
        let image = IndexedImage::new(4, 2, vec![1, 2, 5, 0, 1, 2, 3, 0]);
        let first = check_sheet(&image, &palette_of(15), 4, 2, 2, 0).unwrap();
        let second = check_sheet(&image, &palette_of(15), 4, 2, 2, 0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_three_planes_widen_capacity() {
        let image = IndexedImage::new(4, 1, vec![1, 2, 4, 7]);
        // 7 = 1 | 2 | 4 needs all three planes; M=2 cannot show it.
        assert_eq!(check_sheet(&image, &palette_of(15), 4, 1, 2, 0).unwrap().len(), 1);
        assert!(check_sheet(&image, &palette_of(15), 4, 1, 3, 0).unwrap().is_empty());
    }
}
