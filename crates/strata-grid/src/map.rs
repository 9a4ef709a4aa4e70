//! Map geometry and cell rectangles.
//!
//! A [`MapGeometry`] describes the fixed dimensions of a loaded map: cell
//! counts on each axis plus the display-space size of one cell. It is
//! immutable once loaded -- rebuilding the derived layers never changes it.
//!
//! [`CellRect`] is an inclusive rectangle of cells, used for dirty-region
//! bookkeeping: each placement mutation contributes its footprint rectangle,
//! and the accumulated union tells the driver which part of the map went
//! stale since the last rebuild.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MapGeometry
// ---------------------------------------------------------------------------

/// Fixed dimensions of a loaded map.
///
/// `width` and `height` are cell counts; `cell_size` is the side length of
/// one cell in display-space units (pixels). Every derived layer grid has
/// exactly `width * height` cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapGeometry {
    /// Horizontal cell count.
    pub width: u32,
    /// Vertical cell count.
    pub height: u32,
    /// Display-space side length of one cell.
    pub cell_size: f32,
}

impl MapGeometry {
    /// Create a map geometry.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero or `cell_size` is not positive
    /// and finite.
    pub fn new(width: u32, height: u32, cell_size: f32) -> Self {
        assert!(
            width > 0 && height > 0,
            "map dimensions must be nonzero, got {width}x{height}"
        );
        assert!(
            cell_size > 0.0 && cell_size.is_finite(),
            "cell_size must be positive and finite, got {cell_size}"
        );
        Self {
            width,
            height,
            cell_size,
        }
    }

    /// Total number of cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether the (possibly negative) map-space coordinate is in bounds.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Flat index of an in-bounds cell.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }

    /// Display-space center of a cell.
    #[inline]
    pub fn cell_center_px(&self, x: u32, y: u32) -> (f32, f32) {
        (
            (x as f32 + 0.5) * self.cell_size,
            (y as f32 + 0.5) * self.cell_size,
        )
    }
}

// ---------------------------------------------------------------------------
// CellRect
// ---------------------------------------------------------------------------

/// An inclusive rectangle of cells in map space.
///
/// Coordinates are signed so that footprints hanging off the map edge (or
/// entirely outside it) can still be represented before clipping. The empty
/// rectangle is canonical: `max < min` on either axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl CellRect {
    /// The canonical empty rectangle.
    pub const EMPTY: CellRect = CellRect {
        min_x: 0,
        min_y: 0,
        max_x: -1,
        max_y: -1,
    };

    /// Rectangle covering `width x height` cells with its top-left at
    /// `(x, y)`. Zero-sized footprints yield the empty rectangle.
    pub fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return Self::EMPTY;
        }
        Self {
            min_x: x,
            min_y: y,
            max_x: x + width as i32 - 1,
            max_y: y + height as i32 - 1,
        }
    }

    /// Whether the rectangle covers no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    /// Cell count on the horizontal axis (0 when empty).
    #[inline]
    pub fn width(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.max_x - self.min_x + 1) as u32
        }
    }

    /// Cell count on the vertical axis (0 when empty).
    #[inline]
    pub fn height(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.max_y - self.min_y + 1) as u32
        }
    }

    /// Smallest rectangle covering both inputs.
    pub fn union(self, other: CellRect) -> CellRect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        CellRect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Clip to the map bounds. Returns the empty rectangle when nothing
    /// overlaps the map.
    pub fn clipped_to(&self, geometry: &MapGeometry) -> CellRect {
        if self.is_empty() {
            return CellRect::EMPTY;
        }
        let clipped = CellRect {
            min_x: self.min_x.max(0),
            min_y: self.min_y.max(0),
            max_x: self.max_x.min(geometry.width as i32 - 1),
            max_y: self.max_y.min(geometry.height as i32 - 1),
        };
        if clipped.is_empty() {
            CellRect::EMPTY
        } else {
            clipped
        }
    }

    /// Whether the rectangle contains the cell.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
