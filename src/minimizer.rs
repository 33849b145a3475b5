//! Palette permutation minimization
//!
//! Brute-force search over palette index arrangements (index 0 fixed) for
//! the one that packs the whole image into the fewest sprite planes. The
//! search is exhaustive and can take seconds to minutes on busy palettes;
//! it prunes with the best total found so far and stops early when the
//! permutation-invariant lower bound is reached, on deadline, or on an
//! external abort, returning the best result found up to that point.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use itertools::Itertools;
use log::{debug, info};
use rayon::prelude::*;

use crate::extractor::{extract_cells, Cell};
use crate::models::{ConvertOptions, IndexedImage, PackingResult};
use crate::packer::{cell_lower_bound, pack_cells, PackError};
use crate::palette::{Palette, MAX_COLORS};

/// Bounds on the minimizer's search, all optional.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Give up after this long and keep the best result so far
    pub timeout: Option<Duration>,
    /// Cooperative abort flag checked between candidate arrangements
    pub abort: Option<Arc<AtomicBool>>,
}

/// Outcome of a minimization run.
#[derive(Debug, Clone)]
pub struct Minimized {
    /// The winning index arrangement, `map[old] = new`
    pub permutation: [u8; MAX_COLORS],
    /// The input palette under that arrangement
    pub palette: Palette,
    pub result: PackingResult,
}

/// Shared search state: an opportunistically-read plane-count bound and the
/// lock-protected best result / best-attempted failure.
struct Search {
    best_count: AtomicUsize,
    best: Mutex<Option<([u8; MAX_COLORS], PackingResult)>>,
    failure: Mutex<Option<(usize, PackError)>>,
    stop: AtomicBool,
    lower_bound: usize,
}

impl Search {
    fn record(&self, map: [u8; MAX_COLORS], result: PackingResult) {
        let mut best = self.best.lock().expect("search lock poisoned");
        if best.as_ref().map_or(true, |(_, prev)| result.total_planes < prev.total_planes) {
            debug!("new best arrangement: {} planes", result.total_planes);
            self.best_count.store(result.total_planes, Ordering::Relaxed);
            if result.total_planes <= self.lower_bound {
                self.stop.store(true, Ordering::Relaxed);
            }
            *best = Some((map, result));
        }
    }

    fn record_failure(&self, progress: usize, error: PackError) {
        let mut failure = self.failure.lock().expect("search lock poisoned");
        if failure.as_ref().map_or(true, |(prev, _)| progress > *prev) {
            *failure = Some((progress, error));
        }
    }
}

/// How many cells a failed packing got through before the unpackable cell.
fn failure_progress(error: &PackError, cells_per_row: u32) -> usize {
    match error {
        PackError::UnpackableCell { col, row, .. } => (row * cells_per_row + col) as usize,
        PackError::Extract(_) => 0,
    }
}

/// Evaluate one arrangement against the shared best.
fn try_arrangement(
    search: &Search,
    cells: &[Cell],
    map: [u8; MAX_COLORS],
    opts: &ConvertOptions,
    cells_per_row: u32,
) {
    let remapped: Vec<Cell> = cells.iter().map(|c| c.remap(&map)).collect();
    let budget = search.best_count.load(Ordering::Relaxed);
    match pack_cells(&remapped, opts, budget) {
        Ok(Some(result)) => search.record(map, result),
        Ok(None) => {} // pruned by the running bound
        Err(error) => search.record_failure(failure_progress(&error, cells_per_row), error),
    }
}

/// Build a full index permutation from an arrangement of the used colors.
///
/// `used[i]` moves to `slots[i]`; every other index fills the remaining
/// slots in ascending order, so the map stays a bijection with 0 fixed.
fn arrangement_map(used: &[u8], slots: &[u8]) -> [u8; MAX_COLORS] {
    let mut map = [u8::MAX; MAX_COLORS];
    map[0] = 0;
    for (&color, &slot) in used.iter().zip(slots) {
        map[color as usize] = slot;
    }
    let mut free = (1..MAX_COLORS as u8).filter(|s| !slots.contains(s));
    // Two passes share `free`: indices not yet mapped take the leftover
    // slots in order.
    for slot in map.iter_mut() {
        if *slot == u8::MAX {
            *slot = free.next().expect("slot fill exhausted");
        }
    }
    map
}

/// Search arrangements of palette indices 1..=15 for the one minimizing the
/// total plane count, starting from (and never doing worse than) the given
/// palette order.
///
/// When the search space is exhausted the result is globally optimal for
/// the chosen cell size and plane limit. If no arrangement is packable the
/// error of the best-attempted arrangement is returned.
pub fn minimise(
    image: &IndexedImage,
    palette: &Palette,
    opts: &ConvertOptions,
    search_opts: &SearchOptions,
) -> Result<Minimized, PackError> {
    let cells = extract_cells(
        image,
        palette,
        opts.cell_width,
        opts.cell_height,
        opts.transparent_index,
    )?;
    let cells_per_row = image.width() / opts.cell_width;

    let mut used: Vec<u8> = cells
        .iter()
        .flat_map(|c| c.lines.iter().flatten().copied())
        .collect();
    used.sort_unstable();
    used.dedup();

    let search = Search {
        best_count: AtomicUsize::new(usize::MAX),
        best: Mutex::new(None),
        failure: Mutex::new(None),
        stop: AtomicBool::new(false),
        lower_bound: cells.iter().map(cell_lower_bound).sum(),
    };
    let deadline = search_opts.timeout.map(|t| Instant::now() + t);
    let aborted = || {
        search_opts.abort.as_ref().is_some_and(|a| a.load(Ordering::Relaxed))
            || deadline.is_some_and(|d| Instant::now() >= d)
    };

    // The identity arrangement goes first: it seeds the pruning bound and
    // pins the guarantee that minimizing never loses to the input order.
    let identity: [u8; MAX_COLORS] = std::array::from_fn(|i| i as u8);
    try_arrangement(&search, &cells, identity, opts, cells_per_row);

    if !used.is_empty() && !search.stop.load(Ordering::Relaxed) && !aborted() {
        let candidates = AtomicUsize::new(1);
        let slots: Vec<u8> = (1..MAX_COLORS as u8).collect();
        slots.par_iter().for_each(|&first| {
            let rest: Vec<u8> = slots.iter().copied().filter(|&s| s != first).collect();
            for tail in rest.iter().copied().permutations(used.len() - 1) {
                if search.stop.load(Ordering::Relaxed) || aborted() {
                    return;
                }
                let mut arrangement = Vec::with_capacity(used.len());
                arrangement.push(first);
                arrangement.extend(tail);
                let map = arrangement_map(&used, &arrangement);
                if map != identity {
                    try_arrangement(&search, &cells, map, opts, cells_per_row);
                    candidates.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
        info!(
            "examined {} arrangements of {} colors",
            candidates.load(Ordering::Relaxed),
            used.len()
        );
    }

    let best = search.best.lock().expect("search lock poisoned").take();
    match best {
        Some((permutation, result)) => {
            info!("minimised to {} planes (floor {})", result.total_planes, search.lower_bound);
            Ok(Minimized { permutation, palette: palette.permuted(&permutation), result })
        }
        None => {
            let failure = search.failure.lock().expect("search lock poisoned").take();
            match failure {
                Some((_, error)) => Err(error),
                // No colors, no failures: an all-transparent image packs to
                // nothing under the identity.
                None => unreachable!("identity arrangement was evaluated"),
            }
        }
    }
}
