//! Global layer grids and the layer store.
//!
//! A [`LayerGrid`] is one `height x width` grid of non-negative integer
//! codes, default 0 ("empty"). The [`LayerStore`] bundles the four semantic
//! layers derived from the placed-entity set -- two structure-only layers,
//! one point-object layer, and the shared collision layer -- together with
//! the three block-name tables and the rebuild stamp that marks a store as
//! the product of an uninterrupted rebuild.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::interner::BlockNameTable;
use crate::map::MapGeometry;

// ---------------------------------------------------------------------------
// LayerKind
// ---------------------------------------------------------------------------

/// The four semantic layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LayerKind {
    Sector,
    Arena,
    GameObject,
    Collision,
}

impl LayerKind {
    /// All layers, in rebuild order.
    pub const ALL: [LayerKind; 4] = [
        LayerKind::Sector,
        LayerKind::Arena,
        LayerKind::GameObject,
        LayerKind::Collision,
    ];

    /// The layer's authored name, as used in template sheets and exports.
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Sector => "sector",
            LayerKind::Arena => "arena",
            LayerKind::GameObject => "gameobject",
            LayerKind::Collision => "collision",
        }
    }

    /// The layers an entity of the given kind contributes to.
    pub fn targets_for(kind: EntityKind) -> &'static [LayerKind] {
        match kind {
            EntityKind::Structure => &[LayerKind::Sector, LayerKind::Arena, LayerKind::Collision],
            EntityKind::PointObject => &[LayerKind::GameObject, LayerKind::Collision],
        }
    }

    /// Whether cell values in this layer are interned block-name codes.
    ///
    /// The collision layer carries raw contribution values combined across
    /// entities and has no name table.
    pub fn is_interned(&self) -> bool {
        !matches!(self, LayerKind::Collision)
    }
}

// ---------------------------------------------------------------------------
// LayerGrid
// ---------------------------------------------------------------------------

/// One global grid of integer codes, default 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerGrid {
    width: u32,
    height: u32,
    cells: Vec<u32>,
}

impl LayerGrid {
    /// Create a grid of zeros sized to the map.
    pub fn new(geometry: &MapGeometry) -> Self {
        Self {
            width: geometry.width,
            height: geometry.height,
            cells: vec![0; geometry.cell_count()],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The cell value at in-bounds coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds. Rasterization clips
    /// before writing; use [`value_at`](Self::value_at) for unclipped
    /// map-space coordinates.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        assert!(x < self.width && y < self.height, "cell ({x},{y}) out of bounds");
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Write an in-bounds cell.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: u32) {
        assert!(x < self.width && y < self.height, "cell ({x},{y}) out of bounds");
        self.cells[y as usize * self.width as usize + x as usize] = value;
    }

    /// The cell value at a possibly out-of-bounds map-space coordinate.
    #[inline]
    pub fn value_at(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(self.get(x as u32, y as u32))
    }

    /// Reset every cell to 0.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Flat row-major view of all cells.
    pub fn as_slice(&self) -> &[u32] {
        &self.cells
    }

    /// Whether any cell is nonzero.
    pub fn any_nonzero(&self) -> bool {
        self.cells.iter().any(|&c| c != 0)
    }
}

// ---------------------------------------------------------------------------
// LayerStore
// ---------------------------------------------------------------------------

/// The four derived layer grids, their name tables, and the rebuild stamp.
///
/// A store is only consistent once a rebuild completed uninterrupted; the
/// driver marks that by installing the store and bumping the stamp via
/// [`mark_rebuilt`](Self::mark_rebuilt). Consumers that suspend mid-read
/// (the region labeler) record the stamp they started from and discard
/// their work when it no longer matches.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStore {
    geometry: MapGeometry,
    sector: LayerGrid,
    arena: LayerGrid,
    game_object: LayerGrid,
    collision: LayerGrid,
    sector_names: BlockNameTable,
    arena_names: BlockNameTable,
    game_object_names: BlockNameTable,
    rebuild_stamp: u64,
}

impl LayerStore {
    /// Create an all-empty store sized to the map, with stamp 0.
    pub fn new(geometry: MapGeometry) -> Self {
        Self {
            geometry,
            sector: LayerGrid::new(&geometry),
            arena: LayerGrid::new(&geometry),
            game_object: LayerGrid::new(&geometry),
            collision: LayerGrid::new(&geometry),
            sector_names: BlockNameTable::new(),
            arena_names: BlockNameTable::new(),
            game_object_names: BlockNameTable::new(),
            rebuild_stamp: 0,
        }
    }

    #[inline]
    pub fn geometry(&self) -> &MapGeometry {
        &self.geometry
    }

    /// The grid for one layer.
    pub fn layer(&self, kind: LayerKind) -> &LayerGrid {
        match kind {
            LayerKind::Sector => &self.sector,
            LayerKind::Arena => &self.arena,
            LayerKind::GameObject => &self.game_object,
            LayerKind::Collision => &self.collision,
        }
    }

    /// Mutable access to one layer's grid.
    pub fn layer_mut(&mut self, kind: LayerKind) -> &mut LayerGrid {
        match kind {
            LayerKind::Sector => &mut self.sector,
            LayerKind::Arena => &mut self.arena,
            LayerKind::GameObject => &mut self.game_object,
            LayerKind::Collision => &mut self.collision,
        }
    }

    /// The name table for an interned layer; `None` for collision.
    pub fn names(&self, kind: LayerKind) -> Option<&BlockNameTable> {
        match kind {
            LayerKind::Sector => Some(&self.sector_names),
            LayerKind::Arena => Some(&self.arena_names),
            LayerKind::GameObject => Some(&self.game_object_names),
            LayerKind::Collision => None,
        }
    }

    /// Mutable access to an interned layer's name table; `None` for
    /// collision.
    pub fn names_mut(&mut self, kind: LayerKind) -> Option<&mut BlockNameTable> {
        match kind {
            LayerKind::Sector => Some(&mut self.sector_names),
            LayerKind::Arena => Some(&mut self.arena_names),
            LayerKind::GameObject => Some(&mut self.game_object_names),
            LayerKind::Collision => None,
        }
    }

    /// The stamp of the last uninterrupted rebuild that produced this store.
    #[inline]
    pub fn rebuild_stamp(&self) -> u64 {
        self.rebuild_stamp
    }

    /// Driver API: mark this store as the product of a completed rebuild.
    pub fn mark_rebuilt(&mut self, stamp: u64) {
        self.rebuild_stamp = stamp;
    }
}

// ---------------------------------------------------------------------------
// Export writers
// ---------------------------------------------------------------------------

/// Serialize a layer as `height` rows of `width` comma-separated integers.
pub fn export_layer(grid: &LayerGrid) -> String {
    let mut out = String::with_capacity(grid.as_slice().len() * 2);
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if x > 0 {
                out.push(',');
            }
            let _ = write!(out, "{}", grid.get(x, y));
        }
        out.push('\n');
    }
    out
}

/// Serialize a name table as `code,name` lines sorted by code.
pub fn export_name_table(table: &BlockNameTable) -> String {
    let mut out = String::new();
    for (code, name) in table.entries() {
        let _ = writeln!(out, "{code},{name}");
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
