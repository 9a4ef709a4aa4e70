//! Region labeling -- flood-fill extraction of same-code regions.
//!
//! A [`LabelPass`] scans one captured layer row-major; each unvisited
//! nonzero cell seeds a breadth-first flood fill (4-neighbors, equal code)
//! that collects a maximal region. One label is emitted per region,
//! centered at the region's centroid and sized to its column span, with the
//! code resolved to a display name through the layer's name table (falling
//! back to the code's decimal form).
//!
//! The scan is cooperative: [`step`](LabelPass::step) yields after a fixed
//! number of rows and resumes from where it left off, using the same
//! visited set across yields. A pass works on a [`LayerSnapshot`], so a
//! rebuild happening between yields cannot corrupt the scan; the driver
//! compares the snapshot's stamp against the live store and discards the
//! pass when it went stale. Only one pass runs at a time per renderer.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::warn;

use strata_grid::interner::BlockNameTable;

use super::{LabelGeometry, PresentationBackend};
use crate::schedule::PassStatus;
use crate::snapshot::LayerSnapshot;

// ---------------------------------------------------------------------------
// RegionLabel
// ---------------------------------------------------------------------------

/// One label for a maximal 4-connected region of equal nonzero code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionLabel {
    /// The region's layer code.
    pub code: u32,
    /// Display text: the block name, or the code's decimal form when the
    /// name table has no entry.
    pub text: String,
    /// Display-space placement.
    pub geometry: LabelGeometry,
    /// Number of cells in the region.
    pub cell_count: u32,
}

// ---------------------------------------------------------------------------
// LabelPass
// ---------------------------------------------------------------------------

/// A resumable labeling pass over one layer snapshot.
#[derive(Debug)]
pub struct LabelPass {
    snapshot: LayerSnapshot,
    names: HashMap<u32, String>,
    cell_size: f32,
    visited: Vec<bool>,
    next_row: u32,
    emitted: Vec<RegionLabel>,
}

impl LabelPass {
    /// Start a pass over a captured layer.
    ///
    /// The name table is copied at construction so the pass stays
    /// consistent with its snapshot even if the live store's tables are
    /// rebuilt while the pass is suspended.
    pub fn new(snapshot: LayerSnapshot, names: Option<&BlockNameTable>, cell_size: f32) -> Self {
        let names = names
            .map(|table| {
                table
                    .entries()
                    .map(|(code, name)| (code, name.to_owned()))
                    .collect()
            })
            .unwrap_or_default();
        let cell_count = snapshot.cells.len();
        Self {
            snapshot,
            names,
            cell_size,
            visited: vec![false; cell_count],
            next_row: 0,
            emitted: Vec::new(),
        }
    }

    /// The rebuild stamp of the snapshot this pass scans.
    pub fn stamp(&self) -> u64 {
        self.snapshot.stamp
    }

    /// Whether the scan has covered every row.
    pub fn is_complete(&self) -> bool {
        self.next_row >= self.snapshot.height
    }

    /// Labels emitted so far.
    pub fn labels(&self) -> &[RegionLabel] {
        &self.emitted
    }

    /// Scan up to `max_rows` rows, emitting labels for regions seeded in
    /// them, then yield.
    ///
    /// A flood fill seeded in the current band may wander into rows not yet
    /// scanned; those cells are marked visited and will not seed again.
    pub fn step(&mut self, max_rows: u32, backend: &mut dyn PresentationBackend) -> PassStatus {
        let end_row = (self.next_row + max_rows.max(1)).min(self.snapshot.height);
        while self.next_row < end_row {
            let y = self.next_row;
            for x in 0..self.snapshot.width {
                let index = self.snapshot.index(x, y);
                if self.visited[index] {
                    continue;
                }
                let code = self.snapshot.cells[index];
                if code == 0 {
                    continue;
                }
                if let Some(label) = self.fill_region(x, y, code) {
                    backend.place_label(&label);
                    self.emitted.push(label);
                }
            }
            self.next_row += 1;
        }

        if self.is_complete() {
            PassStatus::Complete
        } else {
            PassStatus::InProgress
        }
    }

    /// Flood-fill the region containing `(seed_x, seed_y)` and build its
    /// label. Returns `None` for an empty region (guarded; cannot occur
    /// from the scan).
    fn fill_region(&mut self, seed_x: u32, seed_y: u32, code: u32) -> Option<RegionLabel> {
        let snapshot = &self.snapshot;
        let mut queue = VecDeque::new();
        self.visited[snapshot.index(seed_x, seed_y)] = true;
        queue.push_back((seed_x, seed_y));

        let mut cell_count = 0u32;
        // Centroid over cell centers: cell (x, y) contributes (x + 0.5, y + 0.5).
        let mut center_sum_x = 0.0f64;
        let mut center_sum_y = 0.0f64;
        let mut min_col = seed_x;
        let mut max_col = seed_x;

        while let Some((x, y)) = queue.pop_front() {
            cell_count += 1;
            center_sum_x += x as f64 + 0.5;
            center_sum_y += y as f64 + 0.5;
            min_col = min_col.min(x);
            max_col = max_col.max(x);

            let neighbors = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbors {
                if nx >= snapshot.width || ny >= snapshot.height {
                    continue;
                }
                let n_index = snapshot.index(nx, ny);
                if self.visited[n_index] || snapshot.cells[n_index] != code {
                    continue;
                }
                self.visited[n_index] = true;
                queue.push_back((nx, ny));
            }
        }

        if cell_count == 0 {
            warn!(code, "empty region during labeling, skipped");
            return None;
        }

        let text = self
            .names
            .get(&code)
            .cloned()
            .unwrap_or_else(|| code.to_string());
        let geometry = LabelGeometry {
            center_x: (center_sum_x / cell_count as f64) as f32 * self.cell_size,
            center_y: (center_sum_y / cell_count as f64) as f32 * self.cell_size,
            width: (max_col - min_col + 1) as f32 * self.cell_size,
            height: self.cell_size,
        };
        Some(RegionLabel {
            code,
            text,
            geometry,
            cell_count,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
