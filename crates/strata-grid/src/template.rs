//! Per-entity-type templates and the template store boundary.
//!
//! A template supplies, per layer, a footprint-sized grid of *local* cell
//! values plus a local-code -> block-name table. Local values are signed:
//! [`NO_DATA`] (`-1`) means "this layer has no opinion here" and must never
//! overwrite existing global data, `0` means "explicitly empty", and any
//! positive value is a local block code resolved through the template's own
//! name table.
//!
//! Templates are authored externally as plain text -- rows of
//! comma-separated integers for cell values, `index,name` lines for name
//! tables. The parsers here are deliberately lenient: a malformed cell
//! value is treated exactly like missing data (skip and log, never fatal),
//! and ragged rows are padded/truncated with a single diagnostic per sheet.

use std::collections::HashMap;

use tracing::warn;

use crate::layer::LayerKind;
use crate::GridError;

/// Local cell value meaning "no opinion here"; never overwrites global data.
pub const NO_DATA: i32 = -1;

// ---------------------------------------------------------------------------
// TemplateId
// ---------------------------------------------------------------------------

/// Opaque identifier for an entity type's template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct TemplateId(pub u32);

// ---------------------------------------------------------------------------
// LocalGrid
// ---------------------------------------------------------------------------

/// A footprint-local grid of signed cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalGrid {
    width: u32,
    height: u32,
    cells: Vec<i32>,
}

impl LocalGrid {
    /// Build a grid from row-major cell values.
    ///
    /// # Panics
    ///
    /// Panics if `cells.len() != width * height`.
    pub fn from_cells(width: u32, height: u32, cells: Vec<i32>) -> Self {
        assert_eq!(
            cells.len(),
            width as usize * height as usize,
            "cell count must match dimensions"
        );
        Self {
            width,
            height,
            cells,
        }
    }

    /// A grid filled with one value.
    pub fn filled(width: u32, height: u32, value: i32) -> Self {
        Self::from_cells(width, height, vec![value; width as usize * height as usize])
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The local value at `(column, row)`, or `None` outside the grid.
    ///
    /// The composer treats out-of-grid reads as missing data: an entity
    /// whose footprint is larger than its authored sheet simply has no
    /// opinion in the uncovered cells.
    #[inline]
    pub fn get(&self, column: u32, row: u32) -> Option<i32> {
        if column >= self.width || row >= self.height {
            return None;
        }
        Some(self.cells[row as usize * self.width as usize + column as usize])
    }
}

// ---------------------------------------------------------------------------
// Text parsers for the authored formats
// ---------------------------------------------------------------------------

/// Parse rows of comma-separated integers into a [`LocalGrid`].
///
/// Dimensions are inferred from the content: height is the number of
/// non-empty lines, width the length of the first row. Malformed cell
/// values become [`NO_DATA`]; short rows are padded with [`NO_DATA`] and
/// long rows truncated, with one diagnostic per sheet.
///
/// # Errors
///
/// Returns [`GridError::EmptySheet`] when the text contains no cell data.
pub fn parse_cell_rows(text: &str) -> Result<LocalGrid, GridError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(GridError::EmptySheet);
    }

    let width = lines[0].split(',').count() as u32;
    let height = lines.len() as u32;
    let mut cells = Vec::with_capacity(width as usize * height as usize);
    let mut ragged = false;
    let mut malformed = false;

    for line in &lines {
        let mut row_len = 0u32;
        for field in line.split(',').take(width as usize) {
            let value = match field.trim().parse::<i32>() {
                Ok(v) => v,
                Err(_) => {
                    malformed = true;
                    NO_DATA
                }
            };
            cells.push(value);
            row_len += 1;
        }
        if line.split(',').count() as u32 != width {
            ragged = true;
        }
        // Pad short rows.
        for _ in row_len..width {
            cells.push(NO_DATA);
        }
    }

    if ragged {
        warn!(width, height, "ragged rows in template sheet, padded/truncated");
    }
    if malformed {
        warn!(width, height, "malformed cell values in template sheet, treated as no data");
    }

    Ok(LocalGrid::from_cells(width, height, cells))
}

/// Parse `index,name` lines into a local-code -> block-name table.
///
/// Lines with a malformed index, a missing name, or an index of 0 are
/// skipped with a diagnostic (code 0 is always "empty" and never named).
pub fn parse_name_table(text: &str) -> HashMap<u32, String> {
    let mut out = HashMap::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((index, name)) = line.split_once(',') else {
            warn!(line, "name table line without separator, skipped");
            continue;
        };
        let name = name.trim();
        match index.trim().parse::<u32>() {
            Ok(0) => warn!(line, "name table entry for code 0 ignored"),
            Ok(code) if !name.is_empty() => {
                out.insert(code, name.to_owned());
            }
            Ok(_) => warn!(line, "name table entry with empty name, skipped"),
            Err(_) => warn!(line, "malformed name table index, skipped"),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// TemplateSheet
// ---------------------------------------------------------------------------

/// One entity type's authored data: per-layer cell grids and name tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSheet {
    cells: HashMap<LayerKind, LocalGrid>,
    names: HashMap<LayerKind, HashMap<u32, String>>,
}

impl TemplateSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a cell grid for one layer (builder style).
    pub fn with_layer(mut self, layer: LayerKind, grid: LocalGrid) -> Self {
        self.cells.insert(layer, grid);
        self
    }

    /// Attach name-table entries for one layer (builder style).
    pub fn with_names<I, S>(mut self, layer: LayerKind, entries: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        self.names.insert(
            layer,
            entries.into_iter().map(|(c, n)| (c, n.into())).collect(),
        );
        self
    }

    pub fn cells(&self, layer: LayerKind) -> Option<&LocalGrid> {
        self.cells.get(&layer)
    }

    pub fn name(&self, layer: LayerKind, local_code: u32) -> Option<&str> {
        self.names
            .get(&layer)?
            .get(&local_code)
            .map(|s| s.as_str())
    }
}

// ---------------------------------------------------------------------------
// TemplateStore
// ---------------------------------------------------------------------------

/// The external template-store boundary.
///
/// Given an entity type and a layer, a store exposes that type's
/// footprint-local cell grid ("not found" is an ordinary outcome: the type
/// has no data for that layer) and resolves local block codes to names.
pub trait TemplateStore {
    /// The footprint-local cell grid for `(template, layer)`, if authored.
    fn sheet_cells(&self, template: TemplateId, layer: LayerKind) -> Option<&LocalGrid>;

    /// The block name for a local code, if present in the type's table.
    fn block_name(&self, template: TemplateId, layer: LayerKind, local_code: u32) -> Option<&str>;
}

// ---------------------------------------------------------------------------
// MemoryTemplateStore
// ---------------------------------------------------------------------------

/// An in-memory [`TemplateStore`], loaded from authored text or built
/// programmatically.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    sheets: HashMap<TemplateId, TemplateSheet>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sheet for an entity type.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DuplicateTemplate`] if the id is already
    /// registered.
    pub fn insert(&mut self, id: TemplateId, sheet: TemplateSheet) -> Result<(), GridError> {
        if self.sheets.contains_key(&id) {
            return Err(GridError::DuplicateTemplate { id });
        }
        self.sheets.insert(id, sheet);
        Ok(())
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn sheet_cells(&self, template: TemplateId, layer: LayerKind) -> Option<&LocalGrid> {
        self.sheets.get(&template)?.cells(layer)
    }

    fn block_name(&self, template: TemplateId, layer: LayerKind, local_code: u32) -> Option<&str> {
        self.sheets.get(&template)?.name(layer, local_code)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
