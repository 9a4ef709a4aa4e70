//! Rendering seam: the presentation boundary, the persistent cell pool,
//! the diff renderer, deterministic colors, and the region labeler.
//!
//! The engine never touches concrete rendering primitives. Everything
//! visual goes through [`PresentationBackend`], which the host implements
//! over whatever it draws with; the engine only asks it to show/hide/color
//! cells and to place region labels.

pub mod color;
pub mod diff;
pub mod labels;
pub mod pool;

pub use color::color_for_code;
pub use diff::{DeltaStats, DiffRenderer, ViewMode};
pub use labels::{LabelPass, RegionLabel};
pub use pool::CellPool;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Rgba
// ---------------------------------------------------------------------------

/// RGBA color, each channel in `0.0..=1.0`.
pub type Rgba = [f32; 4];

// ---------------------------------------------------------------------------
// LabelGeometry (shared by labels.rs and backends)
// ---------------------------------------------------------------------------

/// Display-space placement of one region label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelGeometry {
    /// Pixel position of the label center.
    pub center_x: f32,
    pub center_y: f32,
    /// Pixel extents: the region's column span wide, one cell tall.
    pub width: f32,
    pub height: f32,
}

// ---------------------------------------------------------------------------
// PresentationBackend
// ---------------------------------------------------------------------------

/// The external presentation collaborator.
///
/// Implementations own the concrete visual primitives; the engine requests
/// only these operations, always from the single scheduling thread.
pub trait PresentationBackend {
    /// Show (or re-show) the visual cell at grid coordinates with a color.
    fn show_cell(&mut self, x: u32, y: u32, color: Rgba);

    /// Hide the visual cell at grid coordinates.
    fn hide_cell(&mut self, x: u32, y: u32);

    /// Place one region label.
    fn place_label(&mut self, label: &RegionLabel);

    /// Remove all placed labels (called when a labeling pass starts over).
    fn clear_labels(&mut self);
}

// ---------------------------------------------------------------------------
// RecordingBackend (test double)
// ---------------------------------------------------------------------------

/// A backend that records every request, for tests and headless runs.
#[derive(Debug, Default, Clone)]
pub struct RecordingBackend {
    pub shown: Vec<(u32, u32, Rgba)>,
    pub hidden: Vec<(u32, u32)>,
    pub labels: Vec<RegionLabel>,
    pub label_clears: u32,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total visual mutations recorded (shows + hides).
    pub fn mutation_count(&self) -> usize {
        self.shown.len() + self.hidden.len()
    }

    /// Forget recorded cell mutations (keeps labels).
    pub fn reset_cells(&mut self) {
        self.shown.clear();
        self.hidden.clear();
    }
}

impl PresentationBackend for RecordingBackend {
    fn show_cell(&mut self, x: u32, y: u32, color: Rgba) {
        self.shown.push((x, y, color));
    }

    fn hide_cell(&mut self, x: u32, y: u32) {
        self.hidden.push((x, y));
    }

    fn place_label(&mut self, label: &RegionLabel) {
        self.labels.push(label.clone());
    }

    fn clear_labels(&mut self) {
        self.labels.clear();
        self.label_clears += 1;
    }
}
