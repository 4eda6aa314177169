use serde::Serialize;

use super::node::{Node, NodeKind, NodeType};
use super::resolve::ResolvedPos;
use super::schema;
use crate::error::{EditError, EditResult};

/// An immutable, schema-valid document snapshot.
///
/// Positions are offsets into the flattened content of the root: every
/// character and every atom takes one unit, every other element takes one
/// unit for its opening and one for its closing token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Wraps and validates a `doc` root node.
    pub fn new(root: Node) -> EditResult<Self> {
        if root.kind() != Some(&NodeKind::Doc) {
            return Err(EditError::schema("document root must be a doc node"));
        }
        schema::check_tree(&root)?;
        Ok(Self { root })
    }

    /// A document holding one empty paragraph.
    pub fn empty() -> Self {
        Self {
            root: Node::element(
                NodeKind::Doc,
                vec![Node::element(NodeKind::Paragraph, vec![])],
            ),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn content_size(&self) -> usize {
        self.root.content_size()
    }

    pub fn resolve(&self, pos: usize) -> EditResult<ResolvedPos<'_>> {
        self.check_pos(pos)?;
        Ok(ResolvedPos::resolve(&self.root, pos))
    }

    pub fn check_pos(&self, pos: usize) -> EditResult<()> {
        let size = self.content_size();
        if pos > size {
            return Err(EditError::OutOfRange { pos, size });
        }
        Ok(())
    }

    pub fn check_range(&self, from: usize, to: usize) -> EditResult<()> {
        self.check_pos(from)?;
        self.check_pos(to)?;
        if from > to {
            return Err(EditError::OutOfRange {
                pos: from,
                size: to,
            });
        }
        Ok(())
    }

    /// The node that starts exactly at `pos`.
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let rp = self.resolve(pos).ok()?;
        if rp.text_offset() > 0 {
            return None;
        }
        rp.node_after()
    }

    /// All textblocks with the position where their content starts.
    pub fn textblocks(&self) -> Vec<(usize, &Node)> {
        let mut out = Vec::new();
        self.root.descendants(0, &mut |node, pos| {
            if node.is_textblock() {
                out.push((pos + 1, node));
                false
            } else {
                true
            }
        });
        out
    }

    /// Calls `f` for every node overlapping `[from, to)` with its start position.
    pub fn nodes_between<F>(&self, from: usize, to: usize, mut f: F)
    where
        F: FnMut(&Node, usize),
    {
        self.root.descendants(0, &mut |node, pos| {
            let end = pos + node.size();
            if end <= from || pos >= to {
                return false;
            }
            f(node, pos);
            true
        });
    }

    /// Text between two positions; atoms render as `leaf_text`, block
    /// boundaries as `block_separator`.
    pub fn text_between(
        &self,
        from: usize,
        to: usize,
        block_separator: &str,
        leaf_text: &str,
    ) -> String {
        let mut out = String::new();
        let mut first_block = true;
        self.nodes_between(from, to, |node, pos| match node {
            Node::Text(t) => {
                let start = from.saturating_sub(pos);
                let end = (to - pos).min(node.size());
                out.push_str(super::node::slice_chars(&t.text, start, end));
            }
            Node::Element(_) if node.is_textblock() => {
                if !first_block {
                    out.push_str(block_separator);
                }
                first_block = false;
            }
            Node::Element(_) if node.is_leaf() => {
                if node.node_type() == NodeType::HorizontalRule {
                    out.push_str(block_separator);
                } else {
                    out.push_str(leaf_text);
                }
            }
            Node::Element(_) => {}
        });
        out
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}
