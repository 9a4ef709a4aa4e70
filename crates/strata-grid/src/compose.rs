//! Grid composition -- rasterizing placed entities into the global layers.
//!
//! The [`Composer`] walks placed entities in placement order and writes each
//! entity's footprint into its target layers, resolving local template codes
//! through the entity's own name table and interning the resulting block
//! names into the layer's global table. It is deliberately incremental --
//! one entity per call -- so the driver can slice a rebuild across frames.
//!
//! Rebuilds never fail. Missing sheets, unknown local codes, and malformed
//! cells skip that contribution with a diagnostic; footprints extending past
//! the map edges are clipped (in-bounds cells are still written) and logged
//! once per entity. Every skip is counted in the [`RebuildReport`].
//!
//! # Write rules, per local cell value
//!
//! - `-1` ([`NO_DATA`]): skip -- later entities may still overwrite a zero
//!   with a real value, but "no opinion" never overwrites anything.
//! - `0`: explicit clear on the interned layers. On the collision layer a
//!   zero contribution is a no-op: a cell's collision value is nonzero iff
//!   *some* entity contributed nonzero there, regardless of order.
//! - `> 0`: on interned layers, resolve to a block name and write the
//!   interned global code (last writer wins). On the collision layer, write
//!   the raw value only if the cell is still 0 (first nonzero kept; ties
//!   resolve by processing order, which equals placement order).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::PlacedEntity;
use crate::layer::{LayerKind, LayerStore};
use crate::map::MapGeometry;
use crate::template::{TemplateStore, NO_DATA};

// ---------------------------------------------------------------------------
// RebuildReport
// ---------------------------------------------------------------------------

/// Structured per-pass diagnostics, accumulated while composing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
    /// Entities handed to the composer.
    pub entities_seen: u32,
    /// Entities skipped for having no placement.
    pub entities_unplaced: u32,
    /// Entities whose footprint was clipped to map bounds.
    pub entities_clipped: u32,
    /// `(entity, layer)` contributions skipped for missing sheet data.
    pub sheets_missing: u32,
    /// Positive local codes with no entry in the template's name table.
    pub names_missing: u32,
    /// Cells written into any layer.
    pub cells_written: u64,
    /// Footprint cells dropped by bounds clipping.
    pub cells_clipped: u64,
}

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

/// Incremental rasterizer for one rebuild pass.
///
/// Owns the layer store being populated; [`finish`](Self::finish) hands it
/// over together with the report. Entities must be fed in placement order
/// so that collision ties resolve deterministically.
#[derive(Debug)]
pub struct Composer {
    store: LayerStore,
    report: RebuildReport,
}

impl Composer {
    /// Start a pass over an all-empty store.
    pub fn new(geometry: MapGeometry) -> Self {
        Self {
            store: LayerStore::new(geometry),
            report: RebuildReport::default(),
        }
    }

    /// The report accumulated so far.
    pub fn report(&self) -> &RebuildReport {
        &self.report
    }

    /// Rasterize one entity's footprint into all of its target layers.
    pub fn rasterize_entity(&mut self, entity: &PlacedEntity, templates: &dyn TemplateStore) {
        self.report.entities_seen += 1;

        let Some((origin_x, origin_y)) = entity.origin else {
            self.report.entities_unplaced += 1;
            debug!(entity = %entity.id, "unplaced entity skipped");
            return;
        };

        let mut clipped_this_entity = false;

        for &layer in LayerKind::targets_for(entity.kind) {
            let Some(cells) = templates.sheet_cells(entity.template, layer) else {
                self.report.sheets_missing += 1;
                debug!(
                    entity = %entity.id,
                    template = ?entity.template,
                    layer = layer.name(),
                    "no template data for layer, contribution skipped"
                );
                continue;
            };

            for row in 0..entity.footprint_height {
                for column in 0..entity.footprint_width {
                    // Out-of-sheet reads mean the authored data is smaller
                    // than the footprint: no opinion there.
                    let local = match cells.get(column, row) {
                        Some(v) => v,
                        None => NO_DATA,
                    };
                    if local == NO_DATA || local < 0 {
                        continue;
                    }

                    let global_x = origin_x + column as i32;
                    let global_y = origin_y + row as i32;
                    if !self.store.geometry().contains(global_x, global_y) {
                        self.report.cells_clipped += 1;
                        clipped_this_entity = true;
                        continue;
                    }
                    let (gx, gy) = (global_x as u32, global_y as u32);

                    if layer.is_interned() {
                        let code = if local == 0 {
                            0
                        } else {
                            let Some(name) =
                                templates.block_name(entity.template, layer, local as u32)
                            else {
                                self.report.names_missing += 1;
                                debug!(
                                    entity = %entity.id,
                                    layer = layer.name(),
                                    local,
                                    "local code has no block name, cell skipped"
                                );
                                continue;
                            };
                            self.store
                                .names_mut(layer)
                                .expect("interned layer has a name table")
                                .get_or_assign(name)
                        };
                        self.store.layer_mut(layer).set(gx, gy, code);
                        self.report.cells_written += 1;
                    } else {
                        // Collision: first nonzero kept, zero never clears.
                        if local > 0 && self.store.layer(layer).get(gx, gy) == 0 {
                            self.store.layer_mut(layer).set(gx, gy, local as u32);
                            self.report.cells_written += 1;
                        }
                    }
                }
            }
        }

        if clipped_this_entity {
            self.report.entities_clipped += 1;
            warn!(
                entity = %entity.id,
                origin = ?(origin_x, origin_y),
                footprint = ?(entity.footprint_width, entity.footprint_height),
                "footprint clipped to map bounds"
            );
        }
    }

    /// Finish the pass, yielding the populated store and the report.
    ///
    /// The store's rebuild stamp is still 0; the driver stamps it when it
    /// installs the store after an uninterrupted completion.
    pub fn finish(self) -> (LayerStore, RebuildReport) {
        (self.store, self.report)
    }
}

/// Run a full rebuild in one call.
///
/// The non-cooperative path used by tests and exports; the driver slices
/// the same work across frames by feeding the [`Composer`] directly.
pub fn rebuild(
    entities: &[PlacedEntity],
    templates: &dyn TemplateStore,
    geometry: MapGeometry,
) -> (LayerStore, RebuildReport) {
    let mut composer = Composer::new(geometry);
    for entity in entities {
        composer.rasterize_entity(entity, templates);
    }
    composer.finish()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
