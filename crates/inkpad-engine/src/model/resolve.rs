use super::mark::{MarkSet, MarkType};
use super::node::{Node, NodeType};

#[derive(Debug, Clone, Copy)]
struct Level<'a> {
    node: &'a Node,
    /// Absolute position where the node's content starts.
    start: usize,
    /// Index of the child that contains (or follows) the position.
    index: usize,
}

/// A position resolved against one document snapshot.
///
/// This is the single query surface plugins use instead of walking the tree:
/// ancestor chain, nodes on either side, and the marks in effect.
#[derive(Debug, Clone)]
pub struct ResolvedPos<'a> {
    pos: usize,
    levels: Vec<Level<'a>>,
    text_offset: usize,
}

impl<'a> ResolvedPos<'a> {
    /// Resolves `pos` inside `root`. Caller guarantees `pos <= root.content_size()`.
    pub(crate) fn resolve(root: &'a Node, pos: usize) -> Self {
        let mut levels = Vec::new();
        let mut node = root;
        let mut start = 0;

        loop {
            let mut child_pos = start;
            let mut index = node.child_count();
            let mut text_offset = 0;
            let mut descend = None;

            for (i, child) in node.children().iter().enumerate() {
                let end = child_pos + child.size();
                if pos == child_pos {
                    index = i;
                    break;
                }
                if pos < end {
                    index = i;
                    if child.is_text() {
                        text_offset = pos - child_pos;
                    } else {
                        descend = Some((child, child_pos + 1));
                    }
                    break;
                }
                child_pos = end;
            }

            levels.push(Level { node, start, index });
            match descend {
                Some((child, child_start)) => {
                    node = child;
                    start = child_start;
                }
                None => {
                    return Self {
                        pos,
                        levels,
                        text_offset,
                    };
                }
            }
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Depth of the innermost parent; the document root is depth 0.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn node(&self, depth: usize) -> &'a Node {
        self.levels[depth].node
    }

    pub fn parent(&self) -> &'a Node {
        self.node(self.depth())
    }

    pub fn index(&self, depth: usize) -> usize {
        self.levels[depth].index
    }

    /// Position where the content of the ancestor at `depth` starts.
    pub fn start(&self, depth: usize) -> usize {
        self.levels[depth].start
    }

    /// Position where the content of the ancestor at `depth` ends.
    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position directly before the ancestor at `depth` (not defined for the root).
    pub fn before(&self, depth: usize) -> Option<usize> {
        (depth > 0).then(|| self.start(depth) - 1)
    }

    /// Position directly after the ancestor at `depth` (not defined for the root).
    pub fn after(&self, depth: usize) -> Option<usize> {
        (depth > 0).then(|| self.end(depth) + 1)
    }

    pub fn parent_offset(&self) -> usize {
        self.pos - self.start(self.depth())
    }

    /// Offset into the text node at `index`, zero at node boundaries.
    pub fn text_offset(&self) -> usize {
        self.text_offset
    }

    /// The node directly after the position. Inside a text run this is the run itself.
    pub fn node_after(&self) -> Option<&'a Node> {
        self.parent().child(self.index(self.depth()))
    }

    /// The node directly before the position. Inside a text run this is the run itself.
    pub fn node_before(&self) -> Option<&'a Node> {
        let index = self.index(self.depth());
        if self.text_offset > 0 {
            return self.parent().child(index);
        }
        index.checked_sub(1).and_then(|i| self.parent().child(i))
    }

    /// Marks applying to the character at this position.
    ///
    /// The node after the position wins; at the end of a parent the node
    /// before is used. A mark over `[a, b)` is therefore reported at `a` and
    /// `b - 1` but not at `b` when more text follows.
    pub fn marks(&self) -> MarkSet {
        if !self.parent().is_textblock() {
            return MarkSet::empty();
        }
        self.node_after()
            .or_else(|| self.node_before())
            .map(|n| n.marks().clone())
            .unwrap_or_default()
    }

    /// Marks that text inserted here inherits.
    pub fn marks_for_insertion(&self) -> MarkSet {
        if self.text_offset > 0 {
            return self.node_after().map(|n| n.marks().clone()).unwrap_or_default();
        }
        let after = self.node_after().map(Node::marks);
        match self.node_before() {
            Some(before) => before
                .marks()
                .iter()
                .filter(|m| {
                    m.mark_type().inclusive() || after.is_some_and(|a| a.contains(m))
                })
                .cloned()
                .collect(),
            None => after.map(MarkSet::inclusive).unwrap_or_default(),
        }
    }

    pub fn has_mark(&self, mark_type: MarkType) -> bool {
        self.marks().has(mark_type)
    }

    /// Ancestors from the innermost parent up to the root, with their depth.
    pub fn ancestors(&self) -> impl Iterator<Item = (usize, &'a Node)> + '_ {
        (0..=self.depth()).rev().map(|d| (d, self.node(d)))
    }

    /// Nearest ancestor of the given type.
    pub fn find_ancestor(&self, ty: NodeType) -> Option<(usize, &'a Node)> {
        self.ancestors().find(|(_, n)| n.node_type() == ty)
    }

    /// Deepest depth whose content range contains `other`.
    pub fn shared_depth(&self, other: usize) -> usize {
        (0..=self.depth())
            .rev()
            .find(|&d| self.start(d) <= other && other <= self.end(d))
            .unwrap_or(0)
    }

    /// Whether the position starts a line: the start of a textblock or
    /// directly after a hard break.
    pub fn at_line_start(&self) -> bool {
        self.parent().is_textblock()
            && (self.parent_offset() == 0
                || self
                    .node_before()
                    .is_some_and(|n| n.node_type() == NodeType::HardBreak))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mark::Mark;
    use crate::model::node::NodeKind;

    fn doc() -> Node {
        // <ul><li><p>ab</p></li></ul><p>c<em>de</em>f[^1]</p>
        Node::element(
            NodeKind::Doc,
            vec![
                Node::element(
                    NodeKind::BulletList,
                    vec![Node::element(
                        NodeKind::ListItem { checked: Some(false) },
                        vec![Node::element(NodeKind::Paragraph, vec![Node::text("ab")])],
                    )],
                ),
                Node::element(
                    NodeKind::Paragraph,
                    vec![
                        Node::text("c"),
                        Node::marked_text("de", vec![Mark::Em].into()),
                        Node::text("f"),
                        Node::element(NodeKind::FootnoteRef { id: "1".into() }, vec![]),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn resolves_into_nested_text() {
        let root = doc();
        let rp = ResolvedPos::resolve(&root, 4);
        assert_eq!(rp.depth(), 3);
        assert_eq!(rp.parent().node_type(), NodeType::Paragraph);
        assert_eq!(rp.parent_offset(), 1);
        assert_eq!(rp.text_offset(), 1);
        let (depth, li) = rp.find_ancestor(NodeType::ListItem).unwrap();
        assert_eq!(depth, 2);
        assert_eq!(li.kind(), Some(&NodeKind::ListItem { checked: Some(false) }));
        assert_eq!(rp.before(2), Some(1));
        assert_eq!(rp.after(2), Some(7));
    }

    #[test]
    fn boundary_prefers_node_after_at_start_and_node_before_at_end() {
        let root = doc();
        // the second paragraph opens at 8, content starts at 9
        let start = ResolvedPos::resolve(&root, 10);
        assert!(start.marks().has(MarkType::Em));
        let last_em = ResolvedPos::resolve(&root, 11);
        assert!(last_em.marks().has(MarkType::Em));
        let after_em = ResolvedPos::resolve(&root, 12);
        assert!(!after_em.marks().has(MarkType::Em));

        let end = ResolvedPos::resolve(&root, 14);
        assert_eq!(end.node_after(), None);
        assert_eq!(end.node_before().map(Node::node_type), Some(NodeType::FootnoteRef));
    }

    #[test]
    fn inclusive_marks_extend_while_links_do_not() {
        let root = Node::element(
            NodeKind::Doc,
            vec![Node::element(
                NodeKind::Paragraph,
                vec![
                    Node::marked_text("ab", vec![Mark::Strong, Mark::link("u")].into()),
                    Node::text("c"),
                ],
            )],
        );
        let rp = ResolvedPos::resolve(&root, 3);
        assert_eq!(rp.marks_for_insertion(), MarkSet::from(vec![Mark::Strong]));
        let inside = ResolvedPos::resolve(&root, 2);
        assert!(inside.marks_for_insertion().has(MarkType::Link));
    }

    #[test]
    fn line_start_detection() {
        let root = Node::element(
            NodeKind::Doc,
            vec![Node::element(
                NodeKind::Paragraph,
                vec![
                    Node::text("a"),
                    Node::element(NodeKind::HardBreak, vec![]),
                    Node::text("b"),
                ],
            )],
        );
        assert!(ResolvedPos::resolve(&root, 1).at_line_start());
        assert!(!ResolvedPos::resolve(&root, 2).at_line_start());
        assert!(ResolvedPos::resolve(&root, 3).at_line_start());
    }
}
