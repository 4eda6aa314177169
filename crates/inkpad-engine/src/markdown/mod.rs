//! # Markdown Codec
//!
//! Converts between markdown text and [`Document`] trees.
//!
//! - **`parse`**: pulldown-cmark events folded into schema-valid nodes
//! - **`serialize`**: the tree written back with normalized syntax
//! - **`kinds`**: one unit struct per syntax construct, owning its delimiters
//! - **`escape`**: backslash escaping for text that would otherwise read as syntax
//! - **`cursor`**: byte scanner used by the `kinds` helpers
//!
//! Footnote references are recognized whether or not their definition exists,
//! so a document can be inspected for dangling references with [`footnotes`].

pub mod cursor;
pub mod escape;
pub mod kinds;
mod parse;
mod serialize;

pub use parse::parse;
pub use serialize::serialize;

use serde::Serialize;

use crate::model::{Document, NodeKind};

/// A footnote reference or definition and the position before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FootnoteEntry {
    pub id: String,
    pub pos: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FootnoteInventory {
    pub references: Vec<FootnoteEntry>,
    pub definitions: Vec<FootnoteEntry>,
}

impl FootnoteInventory {
    /// References whose id has no definition.
    pub fn undefined(&self) -> Vec<&FootnoteEntry> {
        self.references
            .iter()
            .filter(|r| !self.definitions.iter().any(|d| d.id == r.id))
            .collect()
    }

    /// Definitions nothing refers to.
    pub fn unreferenced(&self) -> Vec<&FootnoteEntry> {
        self.definitions
            .iter()
            .filter(|d| !self.references.iter().any(|r| r.id == d.id))
            .collect()
    }
}

/// Collects footnote references and definitions in document order.
pub fn footnotes(doc: &Document) -> FootnoteInventory {
    let mut inventory = FootnoteInventory::default();
    doc.root().descendants(0, &mut |node, pos| {
        match node.kind() {
            Some(NodeKind::FootnoteRef { id }) => inventory.references.push(FootnoteEntry {
                id: id.clone(),
                pos,
            }),
            Some(NodeKind::FootnoteDef { id }) => inventory.definitions.push(FootnoteEntry {
                id: id.clone(),
                pos,
            }),
            _ => {}
        }
        !node.is_text()
    });
    inventory
}
