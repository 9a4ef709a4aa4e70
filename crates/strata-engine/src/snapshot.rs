//! Layer snapshots with BLAKE3 hashing.
//!
//! A [`LayerSnapshot`] is an owned copy of one layer grid taken at a known
//! rebuild stamp, with a BLAKE3 content digest over its cells. Snapshots
//! serve two purposes:
//!
//! - The region labeler suspends mid-scan; scanning a snapshot (rather than
//!   the live store) makes a concurrent rebuild harmless, and the recorded
//!   stamp lets the driver discard a pass whose source store was replaced.
//! - Save/export flows can verify that two stores derived from the same
//!   inputs produced identical cells by comparing digests.

use serde::{Deserialize, Serialize};

use strata_grid::layer::{LayerKind, LayerStore};

// ---------------------------------------------------------------------------
// LayerSnapshot
// ---------------------------------------------------------------------------

/// An immutable copy of one layer at a known rebuild stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    /// Which layer was captured.
    pub kind: LayerKind,
    /// Cell counts, matching the map geometry.
    pub width: u32,
    pub height: u32,
    /// The rebuild stamp of the store this was captured from.
    pub stamp: u64,
    /// Row-major cell values.
    pub cells: Vec<u32>,
    /// BLAKE3 hex digest (64 lowercase hex chars) over the captured cells.
    /// The hash field itself is not part of the digest (it is derived).
    pub hash: String,
}

impl LayerSnapshot {
    /// Capture one layer from a store.
    pub fn capture(store: &LayerStore, kind: LayerKind) -> Self {
        let grid = store.layer(kind);
        let cells = grid.as_slice().to_vec();
        let hash = compute_hash(kind, grid.width(), grid.height(), &cells);
        Self {
            kind,
            width: grid.width(),
            height: grid.height(),
            stamp: store.rebuild_stamp(),
            cells,
            hash,
        }
    }

    /// The captured value at in-bounds coordinates.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        debug_assert!(x < self.width && y < self.height);
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Flat index of an in-bounds cell.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

/// Compute the BLAKE3 hex digest of a captured layer.
///
/// Covers the layer kind, dimensions, and cells via a canonical JSON byte
/// stream so the digest is stable across platforms.
fn compute_hash(kind: LayerKind, width: u32, height: u32, cells: &[u32]) -> String {
    #[derive(Serialize)]
    struct HashableLayer<'a> {
        kind: &'a str,
        width: u32,
        height: u32,
        cells: &'a [u32],
    }

    let hashable = HashableLayer {
        kind: kind.name(),
        width,
        height,
        cells,
    };
    let bytes = serde_json::to_vec(&hashable).expect("layer snapshot serialization cannot fail");
    blake3::hash(&bytes).to_hex().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
