//! Block-name interning -- dense per-pass integer codes for block names.
//!
//! Layer grids store small integers, not strings. A [`BlockNameTable`] maps
//! block-name strings to codes assigned densely from 1 in first-seen order;
//! code 0 is reserved for "empty" and no name ever maps to it.
//!
//! Tables are scoped to one rebuild pass and one layer: every rebuild starts
//! from fresh tables, so codes are session-local identifiers and are NOT
//! stable across rebuilds. Consumers that persist layers must always carry
//! the table alongside the grid (see the export writers in
//! [`layer`](crate::layer)) and resolve names, never raw codes.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// BlockNameTable
// ---------------------------------------------------------------------------

/// Insertion-ordered mapping from block-name strings to dense codes.
///
/// Code `n` corresponds to the `n`-th distinct name interned (1-based).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockNameTable {
    /// Name -> code for dedup and lookup.
    by_name: HashMap<String, u32>,
    /// Indexed by `code - 1`, in first-seen order.
    names: Vec<String>,
}

impl BlockNameTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning its code.
    ///
    /// An empty name returns 0. The first occurrence of an unseen name gets
    /// `len() + 1`; repeated lookups of the same name return the same code
    /// within the pass.
    pub fn get_or_assign(&mut self, name: &str) -> u32 {
        if name.is_empty() {
            return 0;
        }
        if let Some(&code) = self.by_name.get(name) {
            return code;
        }
        let code = self.names.len() as u32 + 1;
        self.names.push(name.to_owned());
        self.by_name.insert(name.to_owned(), code);
        code
    }

    /// Look up a name's code without interning it.
    pub fn code_for(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Reverse lookup: the name for a code. Code 0 and unassigned codes
    /// return `None`.
    pub fn name_for(&self, code: u32) -> Option<&str> {
        if code == 0 {
            return None;
        }
        self.names.get(code as usize - 1).map(|s| s.as_str())
    }

    /// Number of interned names (the highest assigned code).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no names have been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate `(code, name)` pairs in code order (which equals first-seen
    /// order).
    pub fn entries(&self) -> impl Iterator<Item = (u32, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (i as u32 + 1, name.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
