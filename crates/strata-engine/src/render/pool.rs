//! The persistent visual cell pool.
//!
//! One logical visual cell exists per grid cell. The pool tracks which
//! cells are currently shown (and with what color) so the diff renderer can
//! skip redundant backend requests; the concrete visuals live behind the
//! [`PresentationBackend`](super::PresentationBackend).

use tracing::debug;

use super::{PresentationBackend, Rgba};

// ---------------------------------------------------------------------------
// CellPool
// ---------------------------------------------------------------------------

/// Logical state of the per-cell visual pool.
#[derive(Debug, Clone)]
pub struct CellPool {
    width: u32,
    height: u32,
    visible: Vec<bool>,
    colors: Vec<Rgba>,
}

impl CellPool {
    /// An empty pool; call [`ensure`](Self::ensure) before use.
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            visible: Vec::new(),
            colors: Vec::new(),
        }
    }

    /// Create or recreate the pool only if dimensions changed.
    ///
    /// Recreation destroys the old pool first: every currently shown cell is
    /// hidden through the backend before the new pool is allocated. Returns
    /// `true` when the pool was recreated.
    pub fn ensure(&mut self, width: u32, height: u32, backend: &mut dyn PresentationBackend) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        debug!(
            old = ?(self.width, self.height),
            new = ?(width, height),
            "recreating cell pool"
        );
        self.hide_all(backend);
        self.width = width;
        self.height = height;
        let count = width as usize * height as usize;
        self.visible = vec![false; count];
        self.colors = vec![[0.0; 4]; count];
        true
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pooled cells.
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Whether the cell at the flat index is currently shown.
    #[inline]
    pub fn is_visible(&self, index: usize) -> bool {
        self.visible[index]
    }

    /// The color last applied to the cell at the flat index.
    #[inline]
    pub fn color(&self, index: usize) -> Rgba {
        self.colors[index]
    }

    /// Show the cell (or recolor it if already shown).
    pub fn show(&mut self, x: u32, y: u32, color: Rgba, backend: &mut dyn PresentationBackend) {
        let index = (y * self.width + x) as usize;
        self.visible[index] = true;
        self.colors[index] = color;
        backend.show_cell(x, y, color);
    }

    /// Hide the cell. A hidden cell stays hidden without a backend request.
    pub fn hide(&mut self, x: u32, y: u32, backend: &mut dyn PresentationBackend) -> bool {
        let index = (y * self.width + x) as usize;
        if !self.visible[index] {
            return false;
        }
        self.visible[index] = false;
        backend.hide_cell(x, y);
        true
    }

    /// Hide every visible cell (pool destruction).
    pub fn hide_all(&mut self, backend: &mut dyn PresentationBackend) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.hide(x, y, backend);
            }
        }
    }

    /// Count of currently visible cells.
    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }
}

impl Default for CellPool {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
