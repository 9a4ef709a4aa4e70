//! Strata Grid -- layered spatial occupancy grids derived from placed entities.
//!
//! This crate is the data core of the Strata engine: it turns a collection
//! of placed, footprint-occupying entities into four parallel integer layer
//! grids (sector, arena, game-object, collision) covering a rectangular
//! map. Cell values come from externally authored per-entity-type templates;
//! block-name strings are interned into dense per-pass codes so grids store
//! small integers only.
//!
//! # Quick Start
//!
//! ```
//! use strata_grid::prelude::*;
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
//! let geometry = MapGeometry::new(10, 10, 16.0);
//! let (layers, report) = rebuild(&entities, &templates, geometry);
//!
//! let code = layers.names(LayerKind::Sector).unwrap().code_for("Kitchen").unwrap();
//! assert_eq!(layers.layer(LayerKind::Sector).get(3, 3), code);
//! assert_eq!(report.entities_seen, 1);
//! ```

#![deny(unsafe_code)]

pub mod compose;
pub mod entity;
pub mod interner;
pub mod layer;
pub mod map;
pub mod template;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by grid operations.
///
/// Per-cell and per-entity problems during a rebuild are not errors -- they
/// are skipped, logged, and counted in the
/// [`RebuildReport`](compose::RebuildReport). These variants cover the API
/// seams where a caller's input is rejected outright.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// A template sheet text contained no cell data.
    #[error("template sheet contains no cell data")]
    EmptySheet,

    /// A template id was registered twice.
    #[error("template {id:?} is already registered")]
    DuplicateTemplate { id: template::TemplateId },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::compose::{rebuild, Composer, RebuildReport};
    pub use crate::entity::{EntityId, EntityKind, PlacedEntity};
    pub use crate::interner::BlockNameTable;
    pub use crate::layer::{
        export_layer, export_name_table, LayerGrid, LayerKind, LayerStore,
    };
    pub use crate::map::{CellRect, MapGeometry};
    pub use crate::template::{
        parse_cell_rows, parse_name_table, LocalGrid, MemoryTemplateStore, TemplateId,
        TemplateSheet, TemplateStore, NO_DATA,
    };
    pub use crate::GridError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
