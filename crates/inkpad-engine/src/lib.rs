//! # Inkpad Engine
//!
//! Rich-text editing core: a schema-checked document tree, transactional
//! edits with position mapping, a markdown codec and the plugins that layer
//! links, footnotes and task lists on top of free-form text.
//!
//! - **`model`**: nodes, marks, schema and position resolution
//! - **`editing`**: steps, transactions, commands and the [`Editor`] session
//! - **`markdown`**: parse and serialize
//! - **`plugins`**: link, footnote and task behaviour
//! - **`io`**: reading and writing notes under a notes root

pub mod config;
pub mod editing;
pub mod error;
pub mod io;
pub mod markdown;
pub mod model;
pub mod plugins;

// Re-export key types for easier usage
pub use config::EditorConfig;
pub use editing::{ChangeEvent, Editor, Patch, Selection, StampedPos, Transaction};
pub use error::{EditError, EditResult};
pub use io::{IoError, read_note, write_note};
pub use model::{Document, Mark, MarkType, Node, NodeKind};
