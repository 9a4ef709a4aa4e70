//! Incremental diff rendering against one selected layer.
//!
//! The [`DiffRenderer`] keeps the visual cell pool synchronized with the
//! active layer while touching the minimum number of cells. It caches the
//! effective value last applied per cell; on each refresh it compares the
//! layer against the cache and requests backend mutations only where the
//! value changed. Switching the active mode or completing a rebuild
//! invalidates the whole cache -- the meaning of "value" changed even if
//! the numbers happen to coincide -- after which the pool's own
//! visible/color state still suppresses requests that would not alter the
//! rendered result (colors are a pure function of the code).

use serde::{Deserialize, Serialize};
use tracing::trace;

use strata_grid::layer::{LayerGrid, LayerKind};

use super::color::color_for_code;
use super::pool::CellPool;
use super::PresentationBackend;
use crate::EngineError;

// ---------------------------------------------------------------------------
// ViewMode
// ---------------------------------------------------------------------------

/// Which layer the renderer displays, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    /// No layer active: every cell's effective value is 0.
    #[default]
    None,
    /// Display the given layer.
    Layer(LayerKind),
}

impl ViewMode {
    /// The active layer kind, if any.
    pub fn layer(&self) -> Option<LayerKind> {
        match self {
            ViewMode::None => None,
            ViewMode::Layer(kind) => Some(*kind),
        }
    }
}

// ---------------------------------------------------------------------------
// DeltaStats
// ---------------------------------------------------------------------------

/// What one [`DiffRenderer::apply_delta`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaStats {
    /// Cells newly shown.
    pub shown: u32,
    /// Cells hidden.
    pub hidden: u32,
    /// Cells already visible that changed color.
    pub recolored: u32,
    /// Cells requiring no visual mutation.
    pub unchanged: u32,
}

impl DeltaStats {
    /// Total backend mutations requested.
    pub fn mutations(&self) -> u32 {
        self.shown + self.hidden + self.recolored
    }
}

// ---------------------------------------------------------------------------
// DiffRenderer
// ---------------------------------------------------------------------------

/// Persistent cell pool plus the cached last-applied values.
#[derive(Debug)]
pub struct DiffRenderer {
    pool: CellPool,
    last_applied: Vec<u32>,
    cache_valid: bool,
}

impl DiffRenderer {
    pub fn new() -> Self {
        Self {
            pool: CellPool::new(),
            last_applied: Vec::new(),
            cache_valid: false,
        }
    }

    /// Create/recreate the pool if dimensions changed; invalidates the
    /// cache when it does.
    pub fn ensure_pool(
        &mut self,
        width: u32,
        height: u32,
        backend: &mut dyn PresentationBackend,
    ) -> bool {
        let recreated = self.pool.ensure(width, height, backend);
        if recreated {
            self.last_applied = vec![0; self.pool.len()];
            self.cache_valid = false;
        }
        recreated
    }

    /// Force every cell to be treated as changed on the next delta.
    ///
    /// Called on mode switches and completed rebuilds.
    pub fn invalidate(&mut self) {
        self.cache_valid = false;
    }

    /// The pool's logical state (for diagnostics and tests).
    pub fn pool(&self) -> &CellPool {
        &self.pool
    }

    /// Synchronize the pool with the active layer.
    ///
    /// Every cell's *effective* value is 0 when `mode` is
    /// [`ViewMode::None`] or the layer is absent, else the layer's value.
    /// Unchanged cells are skipped; a changed cell is hidden when the new
    /// value is 0, otherwise shown and colored by the deterministic code
    /// hash.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PoolSizeMismatch`] when the layer's
    /// dimensions disagree with the pool; the refresh is aborted and no
    /// cell is touched (the next [`ensure_pool`](Self::ensure_pool) call
    /// repairs the disagreement).
    pub fn apply_delta(
        &mut self,
        layer: Option<&LayerGrid>,
        mode: ViewMode,
        backend: &mut dyn PresentationBackend,
    ) -> Result<DeltaStats, EngineError> {
        let active = mode.layer().and_then(|_| layer);
        if let Some(grid) = active {
            if grid.width() != self.pool.width() || grid.height() != self.pool.height() {
                return Err(EngineError::PoolSizeMismatch {
                    pool: (self.pool.width(), self.pool.height()),
                    layer: (grid.width(), grid.height()),
                });
            }
        }

        let mut stats = DeltaStats::default();
        let width = self.pool.width();
        for y in 0..self.pool.height() {
            for x in 0..width {
                let index = (y * width + x) as usize;
                let effective = active.map_or(0, |grid| grid.get(x, y));

                if self.cache_valid && self.last_applied[index] == effective {
                    stats.unchanged += 1;
                    continue;
                }

                if effective == 0 {
                    if self.pool.hide(x, y, backend) {
                        stats.hidden += 1;
                    } else {
                        stats.unchanged += 1;
                    }
                } else {
                    let color = color_for_code(effective);
                    if self.pool.is_visible(index) {
                        if self.pool.color(index) == color {
                            stats.unchanged += 1;
                        } else {
                            self.pool.show(x, y, color, backend);
                            stats.recolored += 1;
                        }
                    } else {
                        self.pool.show(x, y, color, backend);
                        stats.shown += 1;
                    }
                }
                self.last_applied[index] = effective;
            }
        }
        self.cache_valid = true;

        trace!(
            shown = stats.shown,
            hidden = stats.hidden,
            recolored = stats.recolored,
            "delta applied"
        );
        Ok(stats)
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingBackend;
    use strata_grid::layer::LayerStore;
    use strata_grid::map::MapGeometry;

    fn store_4x4() -> LayerStore {
        let mut store = LayerStore::new(MapGeometry::new(4, 4, 1.0));
        store.layer_mut(LayerKind::Sector).set(1, 1, 3);
        store.layer_mut(LayerKind::Sector).set(2, 1, 3);
        store
    }

    fn renderer_4x4(backend: &mut RecordingBackend) -> DiffRenderer {
        let mut r = DiffRenderer::new();
        r.ensure_pool(4, 4, backend);
        r
    }

    #[test]
    fn first_apply_shows_only_nonzero_cells() {
        let store = store_4x4();
        let mut backend = RecordingBackend::new();
        let mut r = renderer_4x4(&mut backend);

        let stats = r
            .apply_delta(
                Some(store.layer(LayerKind::Sector)),
                ViewMode::Layer(LayerKind::Sector),
                &mut backend,
            )
            .unwrap();
        assert_eq!(stats.shown, 2);
        assert_eq!(stats.hidden, 0);
        assert_eq!(backend.shown.len(), 2);
        // Empty cells never got a visual, so no hide requests either.
        assert!(backend.hidden.is_empty());
    }

    #[test]
    fn second_apply_performs_zero_mutations() {
        let store = store_4x4();
        let mut backend = RecordingBackend::new();
        let mut r = renderer_4x4(&mut backend);

        r.apply_delta(
            Some(store.layer(LayerKind::Sector)),
            ViewMode::Layer(LayerKind::Sector),
            &mut backend,
        )
        .unwrap();
        backend.reset_cells();

        let stats = r
            .apply_delta(
                Some(store.layer(LayerKind::Sector)),
                ViewMode::Layer(LayerKind::Sector),
                &mut backend,
            )
            .unwrap();
        assert_eq!(stats.mutations(), 0);
        assert_eq!(backend.mutation_count(), 0);
        assert_eq!(stats.unchanged, 16);
    }

    #[test]
    fn value_change_touches_only_that_cell() {
        let mut store = store_4x4();
        let mut backend = RecordingBackend::new();
        let mut r = renderer_4x4(&mut backend);
        r.apply_delta(
            Some(store.layer(LayerKind::Sector)),
            ViewMode::Layer(LayerKind::Sector),
            &mut backend,
        )
        .unwrap();
        backend.reset_cells();

        store.layer_mut(LayerKind::Sector).set(1, 1, 0);
        let stats = r
            .apply_delta(
                Some(store.layer(LayerKind::Sector)),
                ViewMode::Layer(LayerKind::Sector),
                &mut backend,
            )
            .unwrap();
        assert_eq!(stats.hidden, 1);
        assert_eq!(stats.shown, 0);
        assert_eq!(backend.hidden, vec![(1, 1)]);
    }

    #[test]
    fn mode_none_treats_all_cells_as_zero() {
        let store = store_4x4();
        let mut backend = RecordingBackend::new();
        let mut r = renderer_4x4(&mut backend);
        r.apply_delta(
            Some(store.layer(LayerKind::Sector)),
            ViewMode::Layer(LayerKind::Sector),
            &mut backend,
        )
        .unwrap();

        r.invalidate();
        let stats = r
            .apply_delta(
                Some(store.layer(LayerKind::Sector)),
                ViewMode::None,
                &mut backend,
            )
            .unwrap();
        assert_eq!(stats.hidden, 2);
        assert_eq!(r.pool().visible_count(), 0);
    }

    #[test]
    fn absent_layer_is_all_zeros() {
        let mut backend = RecordingBackend::new();
        let mut r = renderer_4x4(&mut backend);
        let stats = r
            .apply_delta(None, ViewMode::Layer(LayerKind::Sector), &mut backend)
            .unwrap();
        assert_eq!(stats.mutations(), 0);
    }

    #[test]
    fn mismatched_layer_size_is_rejected_without_touching_cells() {
        let store = LayerStore::new(MapGeometry::new(8, 8, 1.0));
        let mut backend = RecordingBackend::new();
        let mut r = renderer_4x4(&mut backend);
        let err = r
            .apply_delta(
                Some(store.layer(LayerKind::Sector)),
                ViewMode::Layer(LayerKind::Sector),
                &mut backend,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::PoolSizeMismatch { .. }));
        assert_eq!(backend.mutation_count(), 0);
    }

    #[test]
    fn invalidate_with_identical_values_requests_nothing_new() {
        // After invalidation every cell is re-examined, but identical codes
        // produce identical colors, so no backend traffic results.
        let store = store_4x4();
        let mut backend = RecordingBackend::new();
        let mut r = renderer_4x4(&mut backend);
        r.apply_delta(
            Some(store.layer(LayerKind::Sector)),
            ViewMode::Layer(LayerKind::Sector),
            &mut backend,
        )
        .unwrap();
        backend.reset_cells();

        r.invalidate();
        let stats = r
            .apply_delta(
                Some(store.layer(LayerKind::Sector)),
                ViewMode::Layer(LayerKind::Sector),
                &mut backend,
            )
            .unwrap();
        assert_eq!(stats.mutations(), 0);
        assert_eq!(backend.mutation_count(), 0);
    }
}
