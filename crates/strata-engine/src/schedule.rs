//! Cooperative pass scheduling and the map engine driver.
//!
//! Grid rebuilds and label scans are long-running; both are expressed as
//! resumable passes that do a budgeted slice of work per call and yield, so
//! a large map never blocks the host. Everything runs on the single
//! scheduling thread: the driver is pumped once per frame and advances at
//! most one slice of whatever work is outstanding, in the fixed order
//! rebuild -> delta refresh -> labeling.
//!
//! Passes are non-reentrant. A placement trigger arriving while a rebuild
//! is suspended sets a restart flag that is checked at the next suspension
//! point; rapid repeated triggers collapse into one fresh pass over the
//! then-current entity list. An abandoned pass installs nothing -- the
//! layer store only swaps (and its stamp only advances) when a rebuild
//! completes uninterrupted.

use tracing::{debug, info, warn};

use strata_grid::compose::{Composer, RebuildReport};
use strata_grid::entity::PlacedEntity;
use strata_grid::layer::LayerStore;
use strata_grid::map::{CellRect, MapGeometry};
use strata_grid::template::TemplateStore;

use crate::render::{DeltaStats, DiffRenderer, LabelPass, PresentationBackend, RegionLabel, ViewMode};
use crate::snapshot::LayerSnapshot;
use crate::EngineError;

// ---------------------------------------------------------------------------
// SliceBudget
// ---------------------------------------------------------------------------

/// How much work one pump may do before yielding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceBudget {
    /// Entities rasterized per rebuild slice.
    pub entities_per_slice: u32,
    /// Rows scanned per labeling slice.
    pub rows_per_slice: u32,
}

impl Default for SliceBudget {
    fn default() -> Self {
        Self {
            entities_per_slice: 64,
            rows_per_slice: 32,
        }
    }
}

// ---------------------------------------------------------------------------
// PassStatus
// ---------------------------------------------------------------------------

/// Whether a resumable pass has more work to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    InProgress,
    Complete,
}

// ---------------------------------------------------------------------------
// RebuildPass
// ---------------------------------------------------------------------------

/// A resumable rebuild over a fixed entity list.
///
/// The pass owns its composer and a copy of the entity list taken at
/// trigger time, so placements mutating mid-pass cannot skew the walk; a
/// mutation instead requests a restart and the driver abandons this pass
/// at the next suspension point.
#[derive(Debug)]
pub struct RebuildPass {
    composer: Composer,
    entities: Vec<PlacedEntity>,
    cursor: usize,
    restart_requested: bool,
}

impl RebuildPass {
    /// Start a pass over a snapshot of the current placements.
    pub fn new(geometry: MapGeometry, entities: Vec<PlacedEntity>) -> Self {
        Self {
            composer: Composer::new(geometry),
            entities,
            cursor: 0,
            restart_requested: false,
        }
    }

    /// Rasterize up to `max_entities` entities, then yield.
    pub fn step(&mut self, max_entities: u32, templates: &dyn TemplateStore) -> PassStatus {
        let end = (self.cursor + max_entities.max(1) as usize).min(self.entities.len());
        for i in self.cursor..end {
            self.composer.rasterize_entity(&self.entities[i], templates);
        }
        self.cursor = end;
        if self.cursor >= self.entities.len() {
            PassStatus::Complete
        } else {
            PassStatus::InProgress
        }
    }

    /// Flag this pass for abandonment at the next suspension point.
    pub fn request_restart(&mut self) {
        self.restart_requested = true;
    }

    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    /// `(processed, total)` entity counts.
    pub fn progress(&self) -> (usize, usize) {
        (self.cursor, self.entities.len())
    }

    /// Hand over the composed store and report.
    ///
    /// Only meaningful once [`step`](Self::step) returned
    /// [`PassStatus::Complete`]; a store taken early is partially written
    /// and must not be installed.
    pub fn finish(self) -> (LayerStore, RebuildReport) {
        self.composer.finish()
    }
}

// ---------------------------------------------------------------------------
// PumpProgress
// ---------------------------------------------------------------------------

/// What one [`MapEngine::pump`] call worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpProgress {
    /// Nothing outstanding.
    Idle,
    /// A rebuild slice ran (or a stale pass was abandoned).
    Rebuilding,
    /// The diff renderer refreshed the cell pool.
    Refreshing,
    /// A labeling slice ran.
    Labeling,
}

// ---------------------------------------------------------------------------
// MapEngine
// ---------------------------------------------------------------------------

/// The single-threaded cooperative driver.
///
/// Owns the derived layer store, the diff renderer, and any in-flight
/// passes. The placement collaborator owns the entity list and calls
/// [`mark_dirty`](Self::mark_dirty) on every mutation; the host pumps the
/// engine once per frame with the live list, the template store, and the
/// presentation backend.
pub struct MapEngine {
    geometry: MapGeometry,
    budget: SliceBudget,
    layers: LayerStore,
    renderer: DiffRenderer,
    mode: ViewMode,
    rebuild_pass: Option<RebuildPass>,
    label_pass: Option<LabelPass>,
    dirty: bool,
    dirty_bounds: CellRect,
    rebuild_counter: u64,
    needs_delta: bool,
    needs_labels: bool,
    last_report: Option<RebuildReport>,
    last_delta: Option<DeltaStats>,
    labels: Vec<RegionLabel>,
}

impl MapEngine {
    pub fn new(geometry: MapGeometry, budget: SliceBudget) -> Self {
        Self {
            geometry,
            budget,
            layers: LayerStore::new(geometry),
            renderer: DiffRenderer::new(),
            mode: ViewMode::None,
            rebuild_pass: None,
            label_pass: None,
            dirty: false,
            dirty_bounds: CellRect::EMPTY,
            rebuild_counter: 0,
            needs_delta: false,
            needs_labels: false,
            last_report: None,
            last_delta: None,
            labels: Vec::new(),
        }
    }

    // -- triggers -----------------------------------------------------------

    /// Mark the derived layers stale after a placement mutation.
    ///
    /// `bounds` is the mutation's footprint rectangle when known; `None`
    /// marks the whole map. If a rebuild is suspended mid-pass, it is
    /// flagged for restart instead of being allowed to install stale data.
    pub fn mark_dirty(&mut self, bounds: Option<CellRect>) {
        self.dirty = true;
        let rect = bounds.unwrap_or_else(|| {
            CellRect::from_origin_size(0, 0, self.geometry.width, self.geometry.height)
        });
        self.dirty_bounds = self.dirty_bounds.union(rect);
        if let Some(pass) = self.rebuild_pass.as_mut() {
            debug!("placement changed mid-rebuild, restart requested");
            pass.request_restart();
        }
    }

    /// Switch the displayed layer.
    ///
    /// A mode change invalidates the whole render cache and discards any
    /// labeling in flight, because the meaning of every cell value changed.
    pub fn set_mode(&mut self, mode: ViewMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.renderer.invalidate();
        self.needs_delta = true;
        self.needs_labels = true;
        self.label_pass = None;
    }

    /// Explicitly request a fresh labeling pass.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LabelPassInFlight`] while a pass is mid-scan;
    /// only one labeling pass may run at a time.
    pub fn begin_labels(&mut self) -> Result<(), EngineError> {
        if self.label_pass.is_some() {
            return Err(EngineError::LabelPassInFlight);
        }
        self.needs_labels = true;
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    pub fn geometry(&self) -> &MapGeometry {
        &self.geometry
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// The current derived layers. Consistent only between rebuilds; the
    /// stamp identifies the pass that produced them.
    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    /// Accumulated bounds of mutations not yet rebuilt.
    pub fn dirty_bounds(&self) -> CellRect {
        self.dirty_bounds
    }

    /// The report of the last completed rebuild.
    pub fn last_report(&self) -> Option<&RebuildReport> {
        self.last_report.as_ref()
    }

    /// Stats from the last delta refresh.
    pub fn last_delta(&self) -> Option<DeltaStats> {
        self.last_delta
    }

    /// Labels from the last completed labeling pass.
    pub fn labels(&self) -> &[RegionLabel] {
        &self.labels
    }

    /// Whether no work is outstanding.
    pub fn is_idle(&self) -> bool {
        !self.dirty
            && self.rebuild_pass.is_none()
            && self.label_pass.is_none()
            && !self.needs_delta
            && !self.needs_labels
    }

    // -- the cooperative loop ----------------------------------------------

    /// Advance at most one slice of outstanding work.
    ///
    /// Work order matches the derivation chain: rebuild slices first, then
    /// one delta refresh, then labeling slices. `entities` is the live
    /// placement list (read-only); a rebuild pass copies it at start so
    /// mid-pass mutations cannot skew the walk.
    pub fn pump(
        &mut self,
        entities: &[PlacedEntity],
        templates: &dyn TemplateStore,
        backend: &mut dyn PresentationBackend,
    ) -> PumpProgress {
        // Abandon a pass whose inputs went stale; `dirty` is still set, so
        // a fresh pass starts below. Partially written state is dropped on
        // the floor, never installed.
        if self
            .rebuild_pass
            .as_ref()
            .is_some_and(|p| p.restart_requested())
        {
            debug!("abandoning stale rebuild pass");
            self.rebuild_pass = None;
            return PumpProgress::Rebuilding;
        }

        if self.dirty && self.rebuild_pass.is_none() {
            self.rebuild_pass = Some(RebuildPass::new(self.geometry, entities.to_vec()));
            self.dirty = false;
            self.dirty_bounds = CellRect::EMPTY;
        }

        if let Some(pass) = self.rebuild_pass.as_mut() {
            if pass.step(self.budget.entities_per_slice, templates) == PassStatus::Complete {
                let pass = self.rebuild_pass.take().expect("pass is in flight");
                let (mut store, report) = pass.finish();
                self.rebuild_counter += 1;
                store.mark_rebuilt(self.rebuild_counter);
                info!(
                    stamp = self.rebuild_counter,
                    entities = report.entities_seen,
                    cells = report.cells_written,
                    "rebuild complete"
                );
                self.layers = store;
                self.last_report = Some(report);
                // Codes were reassigned from scratch: every cached value is
                // meaningless even where the numbers coincide.
                self.renderer.invalidate();
                self.needs_delta = true;
                self.needs_labels = true;
                self.label_pass = None;
            }
            return PumpProgress::Rebuilding;
        }

        if self.needs_delta {
            self.renderer
                .ensure_pool(self.geometry.width, self.geometry.height, backend);
            let layer = self.mode.layer().map(|kind| self.layers.layer(kind));
            match self.renderer.apply_delta(layer, self.mode, backend) {
                Ok(stats) => self.last_delta = Some(stats),
                Err(err) => warn!(%err, "delta refresh aborted"),
            }
            self.needs_delta = false;
            return PumpProgress::Refreshing;
        }

        if self.needs_labels {
            return self.pump_labels(backend);
        }

        PumpProgress::Idle
    }

    fn pump_labels(&mut self, backend: &mut dyn PresentationBackend) -> PumpProgress {
        let Some(kind) = self.mode.layer() else {
            // No active layer: nothing to label, just drop stale labels.
            backend.clear_labels();
            self.labels.clear();
            self.needs_labels = false;
            return PumpProgress::Labeling;
        };

        // A pass outliving the store it was captured from is discarded.
        // Rebuild completion already drops the pass; this guard is for a
        // pass resumed across an externally installed store.
        if self
            .label_pass
            .as_ref()
            .is_some_and(|p| p.stamp() != self.layers.rebuild_stamp())
        {
            debug!("label pass stale, restarting");
            self.label_pass = None;
        }

        let pass = self.label_pass.get_or_insert_with(|| {
            backend.clear_labels();
            LabelPass::new(
                LayerSnapshot::capture(&self.layers, kind),
                self.layers.names(kind),
                self.geometry.cell_size,
            )
        });

        if pass.step(self.budget.rows_per_slice, backend) == PassStatus::Complete {
            let pass = self.label_pass.take().expect("pass is in flight");
            self.labels = pass.labels().to_vec();
            self.needs_labels = false;
            debug!(labels = self.labels.len(), "labeling complete");
        }
        PumpProgress::Labeling
    }

    /// Pump until idle. Test/export convenience; hosts pump once per frame.
    pub fn pump_to_idle(
        &mut self,
        entities: &[PlacedEntity],
        templates: &dyn TemplateStore,
        backend: &mut dyn PresentationBackend,
    ) {
        while !self.is_idle() {
            self.pump(entities, templates, backend);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use strata_grid::entity::{EntityId, EntityKind};
    use strata_grid::layer::LayerKind;
    use strata_grid::template::{LocalGrid, MemoryTemplateStore, TemplateId, TemplateSheet};

    fn store() -> MemoryTemplateStore {
        let mut store = MemoryTemplateStore::new();
        store
            .insert(
                TemplateId(1),
                TemplateSheet::new()
                    .with_layer(LayerKind::Sector, LocalGrid::filled(1, 1, 5))
                    .with_names(LayerKind::Sector, [(5u32, "Kitchen")]),
            )
            .unwrap();
        store
    }

    fn entity(id: u32, origin: (i32, i32)) -> PlacedEntity {
        PlacedEntity {
            id: EntityId(id),
            kind: EntityKind::Structure,
            origin: Some(origin),
            footprint_width: 1,
            footprint_height: 1,
            template: TemplateId(1),
        }
    }

    #[test]
    fn rebuild_pass_slices_by_budget() {
        let templates = store();
        let entities: Vec<_> = (0..5).map(|i| entity(i, (i as i32, 0))).collect();
        let mut pass = RebuildPass::new(MapGeometry::new(8, 8, 1.0), entities);

        assert_eq!(pass.step(2, &templates), PassStatus::InProgress);
        assert_eq!(pass.progress(), (2, 5));
        assert_eq!(pass.step(2, &templates), PassStatus::InProgress);
        assert_eq!(pass.step(2, &templates), PassStatus::Complete);

        let (layers, report) = pass.finish();
        assert_eq!(report.entities_seen, 5);
        assert!(layers.layer(LayerKind::Sector).any_nonzero());
    }

    #[test]
    fn zero_budget_still_makes_progress() {
        let templates = store();
        let mut pass = RebuildPass::new(MapGeometry::new(4, 4, 1.0), vec![entity(0, (0, 0))]);
        assert_eq!(pass.step(0, &templates), PassStatus::Complete);
    }

    #[test]
    fn budget_default_values() {
        let budget = SliceBudget::default();
        assert_eq!(budget.entities_per_slice, 64);
        assert_eq!(budget.rows_per_slice, 32);
    }

    #[test]
    fn dirty_bounds_accumulate_and_clear_on_rebuild_start() {
        let templates = store();
        let mut backend = crate::render::RecordingBackend::new();
        let mut engine = MapEngine::new(MapGeometry::new(8, 8, 1.0), SliceBudget::default());

        engine.mark_dirty(Some(CellRect::from_origin_size(1, 1, 2, 2)));
        engine.mark_dirty(Some(CellRect::from_origin_size(5, 5, 1, 1)));
        let bounds = engine.dirty_bounds();
        assert_eq!((bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y), (1, 1, 5, 5));

        engine.pump(&[entity(0, (0, 0))], &templates, &mut backend);
        assert!(engine.dirty_bounds().is_empty());
    }

    #[test]
    fn mark_dirty_without_bounds_marks_whole_map() {
        let mut engine = MapEngine::new(MapGeometry::new(8, 8, 1.0), SliceBudget::default());
        engine.mark_dirty(None);
        assert_eq!(engine.dirty_bounds().width(), 8);
        assert_eq!(engine.dirty_bounds().height(), 8);
    }

    #[test]
    fn begin_labels_rejects_reentry() {
        let templates = store();
        let mut backend = crate::render::RecordingBackend::new();
        let mut engine = MapEngine::new(
            MapGeometry::new(8, 8, 1.0),
            SliceBudget {
                entities_per_slice: 64,
                rows_per_slice: 1,
            },
        );
        engine.set_mode(ViewMode::Layer(LayerKind::Sector));
        let entities = [entity(0, (0, 0))];
        engine.mark_dirty(None);

        // Pump through rebuild and refresh, then exactly one labeling slice
        // so a pass is left in flight.
        while engine.pump(&entities, &templates, &mut backend) != PumpProgress::Labeling {}
        assert!(matches!(
            engine.begin_labels(),
            Err(EngineError::LabelPassInFlight)
        ));

        engine.pump_to_idle(&entities, &templates, &mut backend);
        assert!(engine.begin_labels().is_ok());
    }
}
