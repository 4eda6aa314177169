use serde::{Deserialize, Serialize};

use super::mark::MarkSet;
use super::schema;
use crate::error::EditResult;

/// Element node kinds, each carrying its own attributes.
///
/// Text is not a kind: text runs are [`Node::Text`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading {
        level: u8,
    },
    Blockquote,
    CodeBlock {
        #[serde(default)]
        info: String,
    },
    BulletList,
    OrderedList {
        start: u64,
    },
    /// `checked: None` is a plain list item, `Some(_)` a task item.
    ListItem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
    },
    FootnoteDef {
        id: String,
    },
    HorizontalRule,
    FootnoteRef {
        id: String,
    },
    HardBreak,
}

/// Node types without attributes; the unit the schema reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Doc,
    Paragraph,
    Heading,
    Blockquote,
    CodeBlock,
    BulletList,
    OrderedList,
    ListItem,
    FootnoteDef,
    HorizontalRule,
    Text,
    FootnoteRef,
    HardBreak,
}

impl NodeType {
    pub fn is_block(self) -> bool {
        matches!(
            self,
            NodeType::Paragraph
                | NodeType::Heading
                | NodeType::Blockquote
                | NodeType::CodeBlock
                | NodeType::BulletList
                | NodeType::OrderedList
                | NodeType::FootnoteDef
                | NodeType::HorizontalRule
        )
    }

    pub fn is_inline(self) -> bool {
        matches!(
            self,
            NodeType::Text | NodeType::FootnoteRef | NodeType::HardBreak
        )
    }

    /// Blocks whose content is inline.
    pub fn is_textblock(self) -> bool {
        matches!(
            self,
            NodeType::Paragraph | NodeType::Heading | NodeType::CodeBlock
        )
    }

    /// Atomic nodes: no content, one position unit.
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            NodeType::HorizontalRule | NodeType::FootnoteRef | NodeType::HardBreak
        )
    }
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Doc => NodeType::Doc,
            NodeKind::Paragraph => NodeType::Paragraph,
            NodeKind::Heading { .. } => NodeType::Heading,
            NodeKind::Blockquote => NodeType::Blockquote,
            NodeKind::CodeBlock { .. } => NodeType::CodeBlock,
            NodeKind::BulletList => NodeType::BulletList,
            NodeKind::OrderedList { .. } => NodeType::OrderedList,
            NodeKind::ListItem { .. } => NodeType::ListItem,
            NodeKind::FootnoteDef { .. } => NodeType::FootnoteDef,
            NodeKind::HorizontalRule => NodeType::HorizontalRule,
            NodeKind::FootnoteRef { .. } => NodeType::FootnoteRef,
            NodeKind::HardBreak => NodeType::HardBreak,
        }
    }
}

/// A run of text sharing one mark set. Never empty inside a valid document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
    pub marks: MarkSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Text(TextNode),
    Element(Element),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks: MarkSet::empty(),
        })
    }

    pub fn marked_text(text: impl Into<String>, marks: MarkSet) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks,
        })
    }

    /// Builds an element without validating it. Inline content is normalized.
    ///
    /// Validation happens when the node enters a document or a transaction.
    pub fn element(kind: NodeKind, content: Vec<Node>) -> Self {
        Node::Element(Element {
            kind,
            content: normalize_inline(content),
        })
    }

    /// Builds and validates an element against the schema.
    pub fn create(kind: NodeKind, content: Vec<Node>) -> EditResult<Self> {
        let node = Node::element(kind, content);
        schema::check_node(&node)?;
        Ok(node)
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Text(_) => NodeType::Text,
            Node::Element(el) => el.kind.node_type(),
        }
    }

    pub fn kind(&self) -> Option<&NodeKind> {
        match self {
            Node::Text(_) => None,
            Node::Element(el) => Some(&el.kind),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_leaf(&self) -> bool {
        self.node_type().is_leaf()
    }

    pub fn is_textblock(&self) -> bool {
        self.node_type().is_textblock()
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Text(_) => &[],
            Node::Element(el) => &el.content,
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children().get(index)
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    /// Marks of a text run; elements carry none.
    pub fn marks(&self) -> &MarkSet {
        static EMPTY: MarkSet = MarkSet::empty();
        match self {
            Node::Text(t) => &t.marks,
            Node::Element(_) => &EMPTY,
        }
    }

    /// Size in the flattened position space.
    pub fn size(&self) -> usize {
        match self {
            Node::Text(t) => t.text.chars().count(),
            Node::Element(el) if el.kind.node_type().is_leaf() => 1,
            Node::Element(el) => content_size(&el.content) + 2,
        }
    }

    /// Size of the node's content, excluding its own open/close tokens.
    pub fn content_size(&self) -> usize {
        content_size(self.children())
    }

    /// Concatenated text of all descendant text runs.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(&t.text),
            Node::Element(el) => el.content.iter().for_each(|c| c.collect_text(out)),
        }
    }

    /// Visits every descendant with its absolute start position, given the
    /// position where this node's content starts. Returning `false` from `f`
    /// skips the node's children.
    pub fn descendants<'a, F>(&'a self, content_start: usize, f: &mut F)
    where
        F: FnMut(&'a Node, usize) -> bool,
    {
        let mut pos = content_start;
        for child in self.children() {
            if f(child, pos) && !child.is_text() && !child.is_leaf() {
                child.descendants(pos + 1, f);
            }
            pos += child.size();
        }
    }

    pub(crate) fn with_content(&self, content: Vec<Node>) -> Node {
        match self {
            Node::Text(_) => self.clone(),
            Node::Element(el) => Node::element(el.kind.clone(), content),
        }
    }

    pub(crate) fn with_kind(&self, kind: NodeKind) -> Node {
        match self {
            Node::Text(_) => self.clone(),
            Node::Element(el) => Node::Element(Element {
                kind,
                content: el.content.clone(),
            }),
        }
    }
}

pub(crate) fn content_size(content: &[Node]) -> usize {
    content.iter().map(Node::size).sum()
}

/// Drops empty text runs and merges neighbours with equal marks.
pub(crate) fn normalize_inline(content: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(content.len());
    for node in content {
        match node {
            Node::Text(t) if t.text.is_empty() => {}
            Node::Text(t) => {
                if let Some(Node::Text(prev)) = out.last_mut()
                    && prev.marks == t.marks
                {
                    prev.text.push_str(&t.text);
                    continue;
                }
                out.push(Node::Text(t));
            }
            other => out.push(other),
        }
    }
    out
}

/// Byte index of the `idx`-th char, or `s.len()` past the end.
pub(crate) fn char_to_byte(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map_or(s.len(), |(b, _)| b)
}

/// Slices `s` by char offsets `[from, to)`.
pub(crate) fn slice_chars(s: &str, from: usize, to: usize) -> &str {
    let start = char_to_byte(s, from);
    let end = char_to_byte(s, to);
    &s[start..end.max(start)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mark::Mark;

    fn para(content: Vec<Node>) -> Node {
        Node::element(NodeKind::Paragraph, content)
    }

    #[test]
    fn sizes_follow_the_flattened_scheme() {
        let p = para(vec![
            Node::text("héllo"),
            Node::element(NodeKind::FootnoteRef { id: "1".into() }, vec![]),
        ]);
        // 5 chars + 1 atom + open/close tokens
        assert_eq!(p.size(), 8);
        assert_eq!(p.content_size(), 6);
    }

    #[test]
    fn adjacent_text_with_equal_marks_is_merged() {
        let p = para(vec![
            Node::text("ab"),
            Node::text(""),
            Node::text("cd"),
            Node::marked_text("ef", vec![Mark::Em].into()),
        ]);
        assert_eq!(p.child_count(), 2);
        assert_eq!(p.child(0), Some(&Node::text("abcd")));
    }

    #[test]
    fn create_rejects_illegal_children() {
        let err = Node::create(NodeKind::BulletList, vec![Node::text("nope")]).unwrap_err();
        assert!(matches!(err, crate::EditError::SchemaViolation(_)));
    }

    #[test]
    fn slice_chars_handles_multibyte_text() {
        assert_eq!(slice_chars("a🦀bc", 1, 3), "🦀b");
        assert_eq!(slice_chars("abc", 2, 10), "c");
    }

    #[test]
    fn descendants_reports_absolute_positions() {
        let doc = Node::element(
            NodeKind::Doc,
            vec![para(vec![Node::text("ab")]), para(vec![Node::text("cd")])],
        );
        let mut seen = Vec::new();
        doc.descendants(0, &mut |node, pos| {
            seen.push((node.node_type(), pos));
            true
        });
        assert_eq!(
            seen,
            vec![
                (NodeType::Paragraph, 0),
                (NodeType::Text, 1),
                (NodeType::Paragraph, 4),
                (NodeType::Text, 5),
            ]
        );
    }
}
