//! OR-color sprite packing
//!
//! Assigns the colors of each cell to overlapping sprite planes so that the
//! hardware's pairwise-OR combination rule reproduces the original pixels
//! with as few planes as possible. Per scanline, at most `max_planes` planes
//! may be active; where planes overlap the displayed color index is the
//! bitwise OR of their color indices.

use std::collections::HashMap;

use itertools::Itertools;
use log::debug;
use thiserror::Error;

use crate::extractor::{extract_cells, Cell, ExtractError};
use crate::models::{ConvertOptions, IndexedImage, PackingResult, SpriteCell, SpritePlane};
use crate::palette::{Palette, MAX_COLORS};

/// Error type for packing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    /// The cell's colors cannot be realized under the OR-combination rule
    #[error("cell ({col},{row}) cannot be packed: {reason}")]
    UnpackableCell { col: u32, row: u32, reason: UnpackableReason },
}

/// Why a cell could not be packed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnpackableReason {
    /// A scanline demands more simultaneous colors than M planes can show
    #[error("line {line}: {count} distinct colors exceed the {capacity} reachable with {max_planes} planes")]
    LineCapacity { line: u32, count: usize, capacity: usize, max_planes: u8 },
    /// The scanline fits the color budget but no OR factorization exists
    #[error("line {line}: colors {colors:?} have no valid OR decomposition")]
    NoDecomposition { line: u32, colors: Vec<u8> },
    /// Scanline sets are individually fine but conflict across the cell
    #[error("colors {colors:?} conflict across scanlines and need more than {max_planes} planes")]
    ConflictGraph { colors: Vec<u8>, max_planes: u8 },
}

/// Base colors and OR factorizations for one scanline color set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct LineBases {
    /// Colors that get a plane on this line, ascending
    pub bases: Vec<u8>,
    /// Combined color -> the bases (ascending) whose OR produces it
    pub factors: HashMap<u8, Vec<u8>>,
}

/// Number of distinct colors `max_planes` overlapping planes can show.
pub(crate) fn capacity(max_planes: u8) -> usize {
    (1usize << max_planes.min(15)) - 1
}

/// Decompose a scanline color set into at most `max_planes` base colors
/// such that every other color in the set is the OR of two or more bases.
///
/// Deterministic: the smallest workable base count wins, ties resolved by
/// scanning subsets of the ascending-sorted set in lexicographic order.
/// Returns `None` when no base set of size <= `max_planes` covers the set.
pub(crate) fn decompose_line(colors: &[u8], max_planes: u8) -> Option<LineBases> {
    let mut sorted: Vec<u8> = colors.to_vec();
    sorted.sort_unstable();
    if sorted.is_empty() {
        return Some(LineBases::default());
    }

    let max = (max_planes as usize).min(sorted.len());
    for b in 1..=max {
        'candidate: for bases in sorted.iter().copied().combinations(b) {
            let mut factors = HashMap::new();
            for &c in sorted.iter().filter(|c| !bases.contains(*c)) {
                match factorize(c, &bases) {
                    Some(f) => {
                        factors.insert(c, f);
                    }
                    None => continue 'candidate,
                }
            }
            return Some(LineBases { bases, factors });
        }
    }
    None
}

/// Smallest subset of `bases` (two or more entries, lexicographically first)
/// whose OR equals `color`.
fn factorize(color: u8, bases: &[u8]) -> Option<Vec<u8>> {
    for size in 2..=bases.len() {
        for subset in bases.iter().copied().combinations(size) {
            if subset.iter().fold(0u8, |acc, &c| acc | c) == color {
                return Some(subset);
            }
        }
    }
    None
}

/// Proper coloring of the cell's conflict graph with the fewest classes,
/// bounded by `max_planes`. Returns `class_of[color]` or `None` when more
/// than `max_planes` classes would be needed.
fn color_conflict_graph(lines: &[LineBases], max_planes: u8) -> Option<HashMap<u8, usize>> {
    let mut vertices: Vec<u8> = lines.iter().flat_map(|l| l.bases.iter().copied()).collect();
    vertices.sort_unstable();
    vertices.dedup();
    if vertices.is_empty() {
        return Some(HashMap::new());
    }

    let mut adjacent = [[false; MAX_COLORS]; MAX_COLORS];
    let mut clique = 1;
    for line in lines {
        clique = clique.max(line.bases.len());
        for pair in line.bases.iter().combinations(2) {
            adjacent[*pair[0] as usize][*pair[1] as usize] = true;
            adjacent[*pair[1] as usize][*pair[0] as usize] = true;
        }
    }

    let mut classes = vec![usize::MAX; vertices.len()];
    for target in clique..=max_planes as usize {
        if assign_classes(&vertices, &adjacent, &mut classes, 0, target) {
            let map = vertices.iter().zip(&classes).map(|(&v, &c)| (v, c)).collect();
            return Some(map);
        }
    }
    None
}

/// Backtracking assignment: vertices in ascending index order, lowest class
/// first. Small inputs (<= 15 vertices) keep this trivial.
fn assign_classes(
    vertices: &[u8],
    adjacent: &[[bool; MAX_COLORS]; MAX_COLORS],
    classes: &mut [usize],
    position: usize,
    target: usize,
) -> bool {
    if position == vertices.len() {
        return true;
    }
    let v = vertices[position] as usize;
    for class in 0..target {
        let conflict = vertices[..position]
            .iter()
            .zip(classes.iter())
            .any(|(&u, &c)| c == class && adjacent[v][u as usize]);
        if conflict {
            continue;
        }
        classes[position] = class;
        if assign_classes(vertices, adjacent, classes, position + 1, target) {
            return true;
        }
        classes[position] = usize::MAX;
    }
    false
}

/// Pack one cell into the minimal set of sprite planes.
///
/// Blank cells pack to an empty plane list. Errors identify the offending
/// scanline and color set.
pub fn pack_cell(cell: &Cell, max_planes: u8, transparent: u8) -> Result<Vec<SpritePlane>, PackError> {
    debug_assert!(cell.width <= 16, "plane masks are 16 bits wide");

    let unpackable = |reason| PackError::UnpackableCell { col: cell.col, row: cell.row, reason };

    let mut lines = Vec::with_capacity(cell.lines.len());
    for (j, set) in cell.lines.iter().enumerate() {
        if set.len() > capacity(max_planes) {
            return Err(unpackable(UnpackableReason::LineCapacity {
                line: j as u32,
                count: set.len(),
                capacity: capacity(max_planes),
                max_planes,
            }));
        }
        let bases = decompose_line(set, max_planes).ok_or_else(|| {
            let mut colors = set.clone();
            colors.sort_unstable();
            unpackable(UnpackableReason::NoDecomposition { line: j as u32, colors })
        })?;
        lines.push(bases);
    }

    let class_of = color_conflict_graph(&lines, max_planes).ok_or_else(|| {
        let mut colors: Vec<u8> = lines.iter().flat_map(|l| l.bases.iter().copied()).collect();
        colors.sort_unstable();
        colors.dedup();
        unpackable(UnpackableReason::ConflictGraph { colors, max_planes })
    })?;

    let plane_count = class_of.values().max().map_or(0, |&c| c + 1);
    let mut planes = vec![SpritePlane::empty(cell.height); plane_count];

    for (j, line) in lines.iter().enumerate() {
        for &base in &line.bases {
            planes[class_of[&base]].rows[j].color = base;
        }
        for i in 0..cell.width {
            let index = cell.pixels[(j as u32 * cell.width + i) as usize];
            if index == transparent {
                continue;
            }
            let bit = 1u16 << (cell.width - 1 - i);
            if let Some(factors) = line.factors.get(&index) {
                for (n, &factor) in factors.iter().enumerate() {
                    let row = &mut planes[class_of[&factor]].rows[j];
                    row.mask |= bit;
                    if n > 0 {
                        row.combined = true;
                    }
                }
            } else {
                planes[class_of[&index]].rows[j].mask |= bit;
            }
        }
    }

    debug!(
        "cell ({},{}) packed into {} planes",
        cell.col,
        cell.row,
        planes.len()
    );
    Ok(planes)
}

/// Pack a list of cells, abandoning as soon as the running plane total
/// reaches `budget` (the minimizer's pruning hook). Returns `None` when the
/// budget was exceeded.
pub fn pack_cells(
    cells: &[Cell],
    opts: &ConvertOptions,
    budget: usize,
) -> Result<Option<PackingResult>, PackError> {
    let mut result = PackingResult {
        cell_width: opts.cell_width,
        cell_height: opts.cell_height,
        total_planes: 0,
        cells: Vec::with_capacity(cells.len()),
    };
    for cell in cells {
        let planes = pack_cell(cell, opts.max_planes, opts.transparent_index)?;
        result.total_planes += planes.len();
        if result.total_planes >= budget {
            return Ok(None);
        }
        result.cells.push(SpriteCell { col: cell.col, row: cell.row, planes });
    }
    Ok(Some(result))
}

/// Pack a whole image with the given palette order.
pub fn pack_image(
    image: &IndexedImage,
    palette: &Palette,
    opts: &ConvertOptions,
) -> Result<PackingResult, PackError> {
    let cells = extract_cells(
        image,
        palette,
        opts.cell_width,
        opts.cell_height,
        opts.transparent_index,
    )?;
    match pack_cells(&cells, opts, usize::MAX)? {
        Some(result) => Ok(result),
        None => unreachable!("packing cannot exceed an unbounded budget"),
    }
}

/// Permutation-invariant floor on the plane count of one cell: a line with
/// k colors needs at least ceil(log2(k + 1)) planes however indices are
/// arranged.
pub(crate) fn cell_lower_bound(cell: &Cell) -> usize {
    cell.lines
        .iter()
        .map(|line| usize::BITS as usize - line.len().leading_zeros() as usize)
        .max()
        .unwrap_or(0)
}
