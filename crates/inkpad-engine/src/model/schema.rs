//! Content and attribute rules for every node type.
//!
//! The rules are expressed as exhaustive matches over [`NodeType`], so adding a
//! node type without deciding its rules does not compile.

use super::mark::{Mark, MarkSet};
use super::node::{Node, NodeKind, NodeType};
use crate::error::{EditError, EditResult};

/// What a node type may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRule {
    /// One or more block nodes.
    Blocks,
    /// One or more list items.
    ListItems,
    /// A paragraph followed by any blocks.
    ParagraphThenBlocks,
    /// Any inline nodes.
    Inline,
    /// Unmarked text only.
    PlainText,
    /// Nothing at all (atoms and text).
    Empty,
}

pub fn content_rule(ty: NodeType) -> ContentRule {
    match ty {
        NodeType::Doc | NodeType::Blockquote | NodeType::FootnoteDef => ContentRule::Blocks,
        NodeType::BulletList | NodeType::OrderedList => ContentRule::ListItems,
        NodeType::ListItem => ContentRule::ParagraphThenBlocks,
        NodeType::Paragraph | NodeType::Heading => ContentRule::Inline,
        NodeType::CodeBlock => ContentRule::PlainText,
        NodeType::HorizontalRule
        | NodeType::FootnoteRef
        | NodeType::HardBreak
        | NodeType::Text => ContentRule::Empty,
    }
}

/// Whether `child` may appear at index `index` of a `parent` node.
pub fn allows_child(parent: NodeType, index: usize, child: &Node) -> bool {
    let ty = child.node_type();
    match content_rule(parent) {
        ContentRule::Blocks => ty.is_block(),
        ContentRule::ListItems => ty == NodeType::ListItem,
        ContentRule::ParagraphThenBlocks if index == 0 => ty == NodeType::Paragraph,
        ContentRule::ParagraphThenBlocks => ty.is_block(),
        // Line breaks in running text are hard_break atoms, never raw newlines.
        ContentRule::Inline => {
            ty.is_inline() && !child.as_text().is_some_and(|t| t.text.contains('\n'))
        }
        ContentRule::PlainText => ty == NodeType::Text && child.marks().is_empty(),
        ContentRule::Empty => false,
    }
}

/// Whether the rule accepts an empty content sequence.
pub fn allows_empty(rule: ContentRule) -> bool {
    matches!(
        rule,
        ContentRule::Inline | ContentRule::PlainText | ContentRule::Empty
    )
}

/// Validates one node: its attributes, its marks and its direct children.
pub fn check_node(node: &Node) -> EditResult<()> {
    match node {
        Node::Text(t) => {
            if t.text.is_empty() {
                return Err(EditError::schema("text nodes must not be empty"));
            }
            check_marks(&t.marks)
        }
        Node::Element(el) => {
            check_attrs(&el.kind)?;
            let ty = el.kind.node_type();
            let rule = content_rule(ty);
            if el.content.is_empty() && !allows_empty(rule) {
                return Err(EditError::schema(format!("{ty:?} requires content")));
            }
            for (index, child) in el.content.iter().enumerate() {
                if !allows_child(ty, index, child) {
                    return Err(EditError::schema(format!(
                        "{:?} is not allowed at index {index} of {ty:?}",
                        child.node_type()
                    )));
                }
            }
            Ok(())
        }
    }
}

/// Validates a node and all of its descendants.
pub fn check_tree(node: &Node) -> EditResult<()> {
    check_node(node)?;
    node.children().iter().try_for_each(check_tree)
}

pub fn check_attrs(kind: &NodeKind) -> EditResult<()> {
    match kind {
        NodeKind::Heading { level } if !(1..=6).contains(level) => Err(EditError::schema(
            format!("heading level {level} is outside 1..=6"),
        )),
        NodeKind::CodeBlock { info } if info.contains('\n') => {
            Err(EditError::schema("code block info must be a single line"))
        }
        NodeKind::FootnoteDef { id } | NodeKind::FootnoteRef { id } if !is_footnote_id(id) => {
            Err(EditError::schema(format!("invalid footnote id {id:?}")))
        }
        _ => Ok(()),
    }
}

pub fn check_marks(marks: &MarkSet) -> EditResult<()> {
    for mark in marks {
        if let Mark::Link { href, title } = mark {
            if href.is_empty() || href.contains('\n') {
                return Err(EditError::schema("link href must be a non-empty single line"));
            }
            if title.as_deref().is_some_and(|t| t.contains('\n')) {
                return Err(EditError::schema("link title must be a single line"));
            }
        }
    }
    Ok(())
}

/// Footnote labels: non-empty, no whitespace and no brackets.
pub fn is_footnote_id(id: &str) -> bool {
    !id.is_empty() && !id.chars().any(|c| c.is_whitespace() || c == '[' || c == ']')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn para(text: &str) -> Node {
        Node::element(NodeKind::Paragraph, vec![Node::text(text)])
    }

    #[rstest]
    #[case("1", true)]
    #[case("note-a", true)]
    #[case("", false)]
    #[case("two words", false)]
    #[case("x]", false)]
    fn footnote_ids(#[case] id: &str, #[case] valid: bool) {
        assert_eq!(is_footnote_id(id), valid);
    }

    #[test]
    fn list_item_must_start_with_a_paragraph() {
        let bad = Node::element(
            NodeKind::ListItem { checked: None },
            vec![Node::element(NodeKind::BulletList, vec![])],
        );
        assert!(check_node(&bad).is_err());

        let good = Node::element(NodeKind::ListItem { checked: Some(false) }, vec![para("a")]);
        assert!(check_node(&good).is_ok());
    }

    #[test]
    fn empty_containers_are_rejected() {
        let doc = Node::element(NodeKind::Doc, vec![]);
        assert!(check_node(&doc).is_err());
        let p = Node::element(NodeKind::Paragraph, vec![]);
        assert!(check_node(&p).is_ok());
    }

    #[test]
    fn code_blocks_reject_marked_text() {
        let code = Node::element(
            NodeKind::CodeBlock { info: "rust".into() },
            vec![Node::marked_text("fn", vec![Mark::Strong].into())],
        );
        assert!(check_node(&code).is_err());
    }

    #[test]
    fn paragraph_text_is_single_line() {
        let p = Node::element(NodeKind::Paragraph, vec![Node::text("a\nb")]);
        assert!(check_node(&p).is_err());
        let code = Node::element(NodeKind::CodeBlock { info: String::new() }, vec![Node::text("a\nb")]);
        assert!(check_node(&code).is_ok());
    }

    #[test]
    fn links_need_an_href() {
        let p = Node::element(
            NodeKind::Paragraph,
            vec![Node::marked_text("x", vec![Mark::link("")].into())],
        );
        assert!(check_tree(&p).is_err());
    }

    #[test]
    fn heading_levels_are_bounded() {
        assert!(check_attrs(&NodeKind::Heading { level: 7 }).is_err());
        assert!(check_attrs(&NodeKind::Heading { level: 2 }).is_ok());
    }
}
