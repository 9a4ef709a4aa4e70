//! Placed entities -- the footprint-occupying records the composer reads.
//!
//! The entity collection itself is owned by the placement collaborator (the
//! editing UI); this crate only reads entity geometry and type references,
//! and never mutates placement records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::map::CellRect;
use crate::template::TemplateId;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// Opaque, lightweight identifier for a placed entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// What kind of footprint an entity contributes.
///
/// Structures populate the Sector and Arena layers; point objects populate
/// the GameObject layer. Both contribute to the shared Collision layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Structure,
    PointObject,
}

// ---------------------------------------------------------------------------
// PlacedEntity
// ---------------------------------------------------------------------------

/// A placed, footprint-occupying entity.
///
/// `origin` is the top-left cell of the footprint in map space; `None` means
/// the entity is not (yet) placed and must contribute nothing to any layer.
/// Origins may be negative and footprints may extend past the map edges --
/// rasterization clips to map bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Top-left cell in map space, or `None` for an unplaced entity.
    pub origin: Option<(i32, i32)>,
    /// Footprint width in cells.
    pub footprint_width: u32,
    /// Footprint height in cells.
    pub footprint_height: u32,
    /// The per-type template supplying this entity's cell values.
    pub template: TemplateId,
}

impl PlacedEntity {
    /// Whether the entity has a valid placement.
    #[inline]
    pub fn is_placed(&self) -> bool {
        self.origin.is_some()
    }

    /// The footprint rectangle in map space, or `None` when unplaced.
    pub fn footprint_rect(&self) -> Option<CellRect> {
        let (x, y) = self.origin?;
        Some(CellRect::from_origin_size(
            x,
            y,
            self.footprint_width,
            self.footprint_height,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(origin: Option<(i32, i32)>) -> PlacedEntity {
        PlacedEntity {
            id: EntityId(7),
            kind: EntityKind::Structure,
            origin,
            footprint_width: 2,
            footprint_height: 3,
            template: TemplateId(1),
        }
    }

    #[test]
    fn unplaced_entity_has_no_footprint() {
        let e = entity(None);
        assert!(!e.is_placed());
        assert_eq!(e.footprint_rect(), None);
    }

    #[test]
    fn footprint_rect_matches_origin_and_size() {
        let e = entity(Some((4, 5)));
        let r = e.footprint_rect().unwrap();
        assert_eq!((r.min_x, r.min_y, r.max_x, r.max_y), (4, 5, 5, 7));
    }

    #[test]
    fn id_formatting() {
        assert_eq!(format!("{:?}", EntityId(3)), "EntityId(3)");
        assert_eq!(format!("{}", EntityId(3)), "e3");
    }
}
