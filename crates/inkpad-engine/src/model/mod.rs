//! # Document Model
//!
//! The tree of typed nodes the editor works on.
//!
//! - **`node`**: `Node`, `NodeKind` (closed set of element kinds with their attributes), `NodeType`
//! - **`mark`**: `Mark`, `MarkType`, `MarkSet` (at most one mark per type on a run)
//! - **`schema`**: content and attribute rules, checked on every construction and step
//! - **`document`**: `Document`, an immutable schema-valid snapshot
//! - **`resolve`**: `ResolvedPos`, the position query surface used by plugins

pub mod document;
pub mod mark;
pub mod node;
pub mod resolve;
pub mod schema;

pub use document::Document;
pub use mark::{Mark, MarkSet, MarkType};
pub use node::{Element, Node, NodeKind, NodeType, TextNode};
pub use resolve::ResolvedPos;
