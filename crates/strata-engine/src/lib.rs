//! Strata Engine -- cooperative driver, diff renderer, and region labeler.
//!
//! This crate builds on [`strata_grid`] to provide everything between the
//! derived layer grids and the host's presentation layer: a [`MapEngine`]
//! that slices rebuilds and label scans across frames, a [`DiffRenderer`]
//! that keeps a persistent cell pool synchronized with the active layer
//! while touching only changed cells, and a flood-fill [`LabelPass`] that
//! places one label per contiguous same-code region.
//!
//! [`MapEngine`]: schedule::MapEngine
//! [`DiffRenderer`]: render::DiffRenderer
//! [`LabelPass`]: render::LabelPass
//!
//! # Quick Start
//!
//! ```
//! use strata_engine::prelude::*;
//!
//! let mut templates = MemoryTemplateStore::new();
//! templates.insert(
//!     TemplateId(1),
//!     TemplateSheet::new()
//!         .with_layer(LayerKind::Sector, LocalGrid::filled(2, 2, 5))
//!         .with_names(LayerKind::Sector, [(5u32, "Kitchen")]),
//! ).unwrap();
//!
//! let entities = [PlacedEntity {
//!     id: EntityId(1),
//!     kind: EntityKind::Structure,
//!     origin: Some((3, 3)),
//!     footprint_width: 2,
//!     footprint_height: 2,
//!     template: TemplateId(1),
//! }];
//!
//! let mut engine = MapEngine::new(MapGeometry::new(10, 10, 16.0), SliceBudget::default());
//! let mut backend = RecordingBackend::new();
//!
//! engine.set_mode(ViewMode::Layer(LayerKind::Sector));
//! engine.mark_dirty(None);
//! engine.pump_to_idle(&entities, &templates, &mut backend);
//!
//! assert_eq!(engine.labels().len(), 1);
//! assert_eq!(engine.labels()[0].text, "Kitchen");
//! ```

#![deny(unsafe_code)]

pub mod render;
pub mod schedule;
pub mod snapshot;

/// Re-export the grid crate for convenience.
pub use strata_grid;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the engine driver and renderer.
///
/// These cover defensive invariant guards. A guarded failure aborts the
/// single operation that tripped it, never the whole pass.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The active layer's dimensions disagree with the cell pool.
    #[error("cell pool is {pool:?} but layer is {layer:?}")]
    PoolSizeMismatch { pool: (u32, u32), layer: (u32, u32) },

    /// A labeling pass is already mid-scan for this renderer.
    #[error("a labeling pass is already in flight")]
    LabelPassInFlight,
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the grid prelude.
    pub use strata_grid::prelude::*;

    // Engine-specific exports.
    pub use crate::render::{
        color_for_code, CellPool, DeltaStats, DiffRenderer, LabelGeometry, LabelPass,
        PresentationBackend, RecordingBackend, RegionLabel, Rgba, ViewMode,
    };
    pub use crate::schedule::{
        MapEngine, PassStatus, PumpProgress, RebuildPass, SliceBudget,
    };
    pub use crate::snapshot::LayerSnapshot;
    pub use crate::EngineError;
}
