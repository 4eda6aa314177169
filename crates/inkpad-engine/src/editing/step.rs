//! Atomic document edits.
//!
//! A [`Step`] applied to a [`Document`] yields a new document plus a
//! [`StepMap`] describing how positions moved. Steps never mutate their input
//! and either succeed completely or fail with an [`EditError`].

use serde::Serialize;

use super::mapping::{ChangedRange, StepMap};
use crate::error::{EditError, EditResult};
use crate::model::node::{normalize_inline, slice_chars};
use crate::model::schema;
use crate::model::{Document, Mark, MarkSet, MarkType, Node, NodeKind, NodeType, ResolvedPos};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Insert text at `pos`, which must lie inside a textblock.
    InsertText {
        pos: usize,
        text: String,
        marks: MarkSet,
    },
    /// Insert a node at `pos`. Inline nodes go inside textblocks, blocks between blocks.
    InsertNode { pos: usize, node: Node },
    /// Remove `[from, to)`. When the ends sit in different textblocks, the
    /// text after `to` joins the textblock holding `from`.
    Delete { from: usize, to: usize },
    AddMark {
        from: usize,
        to: usize,
        mark: Mark,
    },
    RemoveMark {
        from: usize,
        to: usize,
        mark_type: MarkType,
    },
    /// Replace the attributes of the element starting at `pos`. The node type
    /// cannot change.
    SetNodeAttrs { pos: usize, kind: NodeKind },
    /// Split the textblock around `pos`, and `depth - 1` of its ancestors with it.
    Split { pos: usize, depth: usize },
}

impl Step {
    pub fn apply(&self, doc: &Document) -> EditResult<(Document, StepMap)> {
        match self {
            Step::InsertText { pos, text, marks } => insert_text(doc, *pos, text, marks),
            Step::InsertNode { pos, node } => insert_node(doc, *pos, node),
            Step::Delete { from, to } => delete(doc, *from, *to),
            Step::AddMark { from, to, mark } => {
                schema::check_marks(&MarkSet::empty().with(mark.clone()))?;
                let mark = mark.clone();
                update_marks(doc, *from, *to, move |marks| marks.add(mark.clone()))
            }
            Step::RemoveMark {
                from,
                to,
                mark_type,
            } => update_marks(doc, *from, *to, |marks| {
                marks.remove(*mark_type);
            }),
            Step::SetNodeAttrs { pos, kind } => set_node_attrs(doc, *pos, kind),
            Step::Split { pos, depth } => split(doc, *pos, *depth),
        }
    }
}

/// Rebuilds the path from the root down to `depth` with `node` replacing the
/// ancestor at that depth.
fn replace_ancestor(rp: &ResolvedPos<'_>, depth: usize, node: Node) -> Node {
    let mut node = node;
    for d in (0..depth).rev() {
        let parent = rp.node(d);
        let mut content = parent.children().to_vec();
        content[rp.index(d)] = node;
        node = parent.with_content(content);
    }
    node
}

/// Splits inline content at a content offset, cutting a text run if needed.
fn split_inline(content: &[Node], offset: usize) -> (Vec<Node>, Vec<Node>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut pos = 0;
    for child in content {
        let size = child.size();
        if pos + size <= offset {
            left.push(child.clone());
        } else if pos >= offset {
            right.push(child.clone());
        } else if let Node::Text(t) = child {
            let cut = offset - pos;
            left.push(Node::marked_text(slice_chars(&t.text, 0, cut), t.marks.clone()));
            right.push(Node::marked_text(slice_chars(&t.text, cut, size), t.marks.clone()));
        }
        pos += size;
    }
    (left, right)
}

fn finish(root: Node, map: StepMap) -> EditResult<(Document, StepMap)> {
    Ok((Document::new(root)?, map))
}

fn insert_text(
    doc: &Document,
    pos: usize,
    text: &str,
    marks: &MarkSet,
) -> EditResult<(Document, StepMap)> {
    let rp = doc.resolve(pos)?;
    if text.is_empty() {
        return Ok((doc.clone(), StepMap::identity()));
    }
    let parent = rp.parent();
    if !parent.is_textblock() {
        return Err(EditError::schema(format!(
            "text cannot be inserted into {:?}",
            parent.node_type()
        )));
    }
    let (mut left, right) = split_inline(parent.children(), rp.parent_offset());
    left.push(Node::marked_text(text, marks.clone()));
    left.extend(right);
    let new_parent = parent.with_content(left);
    schema::check_node(&new_parent)?;
    let root = replace_ancestor(&rp, rp.depth(), new_parent);
    finish(root, StepMap::insertion(pos, text.chars().count()))
}

fn insert_node(doc: &Document, pos: usize, node: &Node) -> EditResult<(Document, StepMap)> {
    schema::check_tree(node)?;
    let rp = doc.resolve(pos)?;
    let parent = rp.parent();
    let (mut left, right) = split_inline(parent.children(), rp.parent_offset());
    left.push(node.clone());
    left.extend(right);
    let new_parent = parent.with_content(left);
    schema::check_node(&new_parent)?;
    let root = replace_ancestor(&rp, rp.depth(), new_parent);
    finish(root, StepMap::insertion(pos, node.size()))
}

/// Drops everything inside `[from, to)` below `node`, whose content starts at
/// `content_start`. Elements that only partly overlap are kept and recursed into.
fn cut(node: &Node, content_start: usize, from: usize, to: usize) -> Node {
    let mut out = Vec::with_capacity(node.child_count());
    let mut pos = content_start;
    for child in node.children() {
        let size = child.size();
        let end = pos + size;
        if end <= from || pos >= to {
            out.push(child.clone());
        } else if pos >= from && end <= to {
            // fully covered
        } else if let Node::Text(t) = child {
            let keep_to = from.saturating_sub(pos);
            let keep_from = (to - pos).min(size);
            let mut text = slice_chars(&t.text, 0, keep_to).to_string();
            text.push_str(slice_chars(&t.text, keep_from, size));
            out.push(Node::marked_text(text, t.marks.clone()));
        } else {
            out.push(cut(child, pos + 1, from, to));
        }
        pos = end;
    }
    node.with_content(out)
}

fn delete(doc: &Document, from: usize, to: usize) -> EditResult<(Document, StepMap)> {
    doc.check_range(from, to)?;
    if from == to {
        return Ok((doc.clone(), StepMap::identity()));
    }
    let rf = doc.resolve(from)?;
    let rt = doc.resolve(to)?;
    let old_size = doc.content_size();
    let same_parent = rf.start(rf.depth()) == rt.start(rt.depth());
    let join = rf.parent().is_textblock() && rt.parent().is_textblock() && !same_parent;

    if join {
        return delete_joining(doc, &rf, &rt);
    }

    // A range covering all of a container that cannot be empty takes the
    // container with it.
    let (mut a, mut b) = (from, to);
    let mut depth = rf.shared_depth(to);
    while depth > 0
        && a == rf.start(depth)
        && b == rf.end(depth)
        && !schema::allows_empty(schema::content_rule(rf.node(depth).node_type()))
    {
        a = rf.start(depth) - 1;
        b = rf.end(depth) + 1;
        depth -= 1;
    }

    let root = cut(doc.root(), 0, a, b);
    if root.content_size() + (b - a) != old_size {
        return Err(EditError::schema(format!(
            "deleting {from}..{to} would leave unbalanced blocks"
        )));
    }
    finish(root, StepMap::deletion(a, b))
}

fn delete_joining(
    doc: &Document,
    rf: &ResolvedPos<'_>,
    rt: &ResolvedPos<'_>,
) -> EditResult<(Document, StepMap)> {
    let (from, to) = (rf.pos(), rt.pos());
    let shared = rf.shared_depth(to);
    let end_block = rt.depth();
    let end_block_end = rt.end(end_block);
    let tail = split_inline(rt.parent().children(), rt.parent_offset()).1;

    // The end textblock is consumed, and every ancestor between it and the
    // shared ancestor must be consumed too.
    let mut to_eff = rt.end(end_block) + 1;
    for d in (shared + 1..end_block).rev() {
        if rt.end(d) != to_eff {
            return Err(EditError::schema(
                "cannot join into a container that keeps other content",
            ));
        }
        to_eff = rt.end(d) + 1;
    }

    let root = cut(doc.root(), 0, from, to_eff);
    let rp = ResolvedPos::resolve(&root, from);
    let block = rp.parent();
    if !block.is_textblock() || rp.parent_offset() != block.content_size() {
        return Err(EditError::schema("join target is not the end of a textblock"));
    }
    let mut content = block.children().to_vec();
    content.extend(tail);
    let joined = block.with_content(content);
    let root = replace_ancestor(&rp, rp.depth(), joined);

    // Closing tokens of the start side re-emerge after the moved tail.
    let closers = rf.depth() - shared;
    let map = StepMap::new(vec![
        ChangedRange {
            start: from,
            old_size: to - from,
            new_size: 0,
        },
        ChangedRange {
            start: end_block_end,
            old_size: to_eff - end_block_end,
            new_size: closers,
        },
    ]);
    let expected = doc.content_size() - (to - from) - (to_eff - end_block_end) + closers;
    if root.content_size() != expected {
        return Err(EditError::schema(format!(
            "deleting {from}..{to} would leave unbalanced blocks"
        )));
    }
    finish(root, map)
}

/// Rewrites the marks of every text run inside `[from, to)` outside code blocks.
fn update_marks<F>(doc: &Document, from: usize, to: usize, f: F) -> EditResult<(Document, StepMap)>
where
    F: Fn(&mut MarkSet),
{
    doc.check_range(from, to)?;
    if from == to {
        return Ok((doc.clone(), StepMap::identity()));
    }
    let root = remark(doc.root(), 0, from, to, &f);
    finish(root, StepMap::identity())
}

fn remark<F>(node: &Node, content_start: usize, from: usize, to: usize, f: &F) -> Node
where
    F: Fn(&mut MarkSet),
{
    if node.node_type() == NodeType::CodeBlock {
        return node.clone();
    }
    let mut out = Vec::with_capacity(node.child_count());
    let mut pos = content_start;
    for child in node.children() {
        let size = child.size();
        let end = pos + size;
        match child {
            _ if end <= from || pos >= to => out.push(child.clone()),
            Node::Text(t) => {
                let a = from.saturating_sub(pos);
                let b = (to - pos).min(size);
                let mut marks = t.marks.clone();
                f(&mut marks);
                out.push(Node::marked_text(slice_chars(&t.text, 0, a), t.marks.clone()));
                out.push(Node::marked_text(slice_chars(&t.text, a, b), marks));
                out.push(Node::marked_text(slice_chars(&t.text, b, size), t.marks.clone()));
            }
            _ if child.is_leaf() => out.push(child.clone()),
            _ => out.push(remark(child, pos + 1, from, to, f)),
        }
        pos = end;
    }
    node.with_content(normalize_inline(out))
}

fn set_node_attrs(doc: &Document, pos: usize, kind: &NodeKind) -> EditResult<(Document, StepMap)> {
    let rp = doc.resolve(pos)?;
    let target = match rp.node_after() {
        Some(node) if rp.text_offset() == 0 && !node.is_text() => node,
        _ => {
            return Err(EditError::schema(format!("no element starts at {pos}")));
        }
    };
    if target.node_type() != kind.node_type() {
        return Err(EditError::schema(format!(
            "cannot turn {:?} into {:?}",
            target.node_type(),
            kind.node_type()
        )));
    }
    schema::check_attrs(kind)?;
    let parent = rp.parent();
    let mut content = parent.children().to_vec();
    content[rp.index(rp.depth())] = target.with_kind(kind.clone());
    let root = replace_ancestor(&rp, rp.depth(), parent.with_content(content));
    finish(root, StepMap::identity())
}

/// Kind of the node created to the right of a split.
fn continuation_kind(kind: &NodeKind, right_is_empty: bool) -> NodeKind {
    match kind {
        NodeKind::Heading { .. } if right_is_empty => NodeKind::Paragraph,
        NodeKind::ListItem { checked: Some(_) } => NodeKind::ListItem {
            checked: Some(false),
        },
        other => other.clone(),
    }
}

fn split(doc: &Document, pos: usize, depth: usize) -> EditResult<(Document, StepMap)> {
    let rp = doc.resolve(pos)?;
    let block_depth = rp.depth();
    let block = rp.parent();
    if !block.is_textblock() || block.node_type() == NodeType::CodeBlock {
        return Err(EditError::schema(format!(
            "cannot split {:?}",
            block.node_type()
        )));
    }
    if depth == 0 || depth > block_depth {
        return Err(EditError::schema(format!("cannot split {depth} levels at {pos}")));
    }

    let (left, right) = split_inline(block.children(), rp.parent_offset());
    let Some(kind) = block.kind() else {
        return Err(EditError::schema("textblock without a kind"));
    };
    let right_kind = continuation_kind(kind, right.is_empty());
    let mut left_node = block.with_content(left);
    let mut right_node = Node::element(right_kind, right);

    for d in (block_depth - depth + 1..block_depth).rev() {
        let node = rp.node(d);
        let index = rp.index(d);
        let Some(kind) = node.kind() else {
            return Err(EditError::schema("text cannot contain blocks"));
        };
        let mut l = node.children()[..index].to_vec();
        l.push(left_node);
        let mut r = vec![right_node];
        r.extend_from_slice(&node.children()[index + 1..]);
        left_node = node.with_content(l);
        right_node = Node::element(continuation_kind(kind, false), r);
    }

    let base = block_depth - depth;
    let parent = rp.node(base);
    let index = rp.index(base);
    let mut content = parent.children()[..index].to_vec();
    content.push(left_node);
    content.push(right_node);
    content.extend_from_slice(&parent.children()[index + 1..]);
    let root = replace_ancestor(&rp, base, parent.with_content(content));
    finish(root, StepMap::insertion(pos, 2 * depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(content: Vec<Node>) -> Node {
        Node::element(NodeKind::Paragraph, content)
    }

    fn doc(blocks: Vec<Node>) -> Document {
        Document::new(Node::element(NodeKind::Doc, blocks)).unwrap()
    }

    fn task(checked: bool, text: &str) -> Node {
        Node::element(
            NodeKind::ListItem {
                checked: Some(checked),
            },
            vec![p(vec![Node::text(text)])],
        )
    }

    #[test]
    fn insert_text_splits_runs_and_reports_the_insertion() {
        let d = doc(vec![p(vec![Node::text("held")])]);
        let step = Step::InsertText {
            pos: 3,
            text: "l".into(),
            marks: MarkSet::empty(),
        };
        let (d2, map) = step.apply(&d).unwrap();
        assert_eq!(d2.root().text_content(), "helld");
        assert_eq!(map, StepMap::insertion(3, 1));
    }

    #[test]
    fn insert_text_between_blocks_is_a_schema_violation() {
        let d = doc(vec![p(vec![Node::text("a")]), p(vec![Node::text("b")])]);
        let step = Step::InsertText {
            pos: 3,
            text: "x".into(),
            marks: MarkSet::empty(),
        };
        assert!(matches!(step.apply(&d), Err(EditError::SchemaViolation(_))));
    }

    #[test]
    fn delete_within_a_block() {
        let d = doc(vec![p(vec![Node::text("hello")])]);
        let (d2, map) = Step::Delete { from: 2, to: 4 }.apply(&d).unwrap();
        assert_eq!(d2.root().text_content(), "hlo");
        assert_eq!(map, StepMap::deletion(2, 4));
    }

    #[test]
    fn delete_across_blocks_joins_them() {
        // <p>ab</p><p>cd</p>: delete from after "a" to after "c"
        let d = doc(vec![p(vec![Node::text("ab")]), p(vec![Node::text("cd")])]);
        let (d2, map) = Step::Delete { from: 2, to: 6 }.apply(&d).unwrap();
        assert_eq!(d2.root().child_count(), 1);
        assert_eq!(d2.root().text_content(), "ad");
        // "d" was at 6, now at 2
        let mut mapping = crate::editing::mapping::Mapping::new();
        mapping.push(map);
        assert_eq!(mapping.map(6), 2);
        assert_eq!(mapping.map(8), 4);
    }

    #[test]
    fn backspace_at_list_item_start_merges_items() {
        // <ul><li><p>a</p></li><li><p>b</p></li></ul>
        let d = doc(vec![Node::element(
            NodeKind::BulletList,
            vec![task(true, "a"), task(false, "b")],
        )]);
        // end of "a" is 4, start of "b" is 8
        let (d2, _) = Step::Delete { from: 4, to: 8 }.apply(&d).unwrap();
        let list = d2.root().child(0).unwrap();
        assert_eq!(list.child_count(), 1);
        assert_eq!(list.text_content(), "ab");
    }

    #[test]
    fn deleting_the_only_item_removes_the_list() {
        let d = doc(vec![
            p(vec![Node::text("x")]),
            Node::element(NodeKind::BulletList, vec![task(false, "a")]),
        ]);
        // the list item spans 4..9
        let (d2, map) = Step::Delete { from: 4, to: 9 }.apply(&d).unwrap();
        assert_eq!(d2.root().child_count(), 1);
        assert_eq!(map, StepMap::deletion(3, 10));
    }

    #[test]
    fn deleting_everything_is_rejected() {
        let d = doc(vec![p(vec![Node::text("x")])]);
        assert!(Step::Delete { from: 0, to: 3 }.apply(&d).is_err());
    }

    #[test]
    fn unbalanced_delete_is_rejected() {
        let d = doc(vec![p(vec![Node::text("ab")]), p(vec![Node::text("cd")])]);
        assert!(Step::Delete { from: 0, to: 2 }.apply(&d).is_err());
    }

    #[test]
    fn add_mark_replaces_same_type() {
        let d = doc(vec![p(vec![Node::marked_text(
            "abc",
            MarkSet::from(vec![Mark::link("old")]),
        )])]);
        let step = Step::AddMark {
            from: 2,
            to: 3,
            mark: Mark::link("new"),
        };
        let (d2, map) = step.apply(&d).unwrap();
        assert!(map.is_identity());
        let para = d2.root().child(0).unwrap();
        assert_eq!(para.child_count(), 3);
        assert_eq!(para.child(1).unwrap().marks().link_href(), Some("new"));
    }

    #[test]
    fn marks_skip_code_blocks() {
        let d = doc(vec![Node::element(
            NodeKind::CodeBlock { info: String::new() },
            vec![Node::text("x")],
        )]);
        let step = Step::AddMark {
            from: 1,
            to: 2,
            mark: Mark::Strong,
        };
        let (d2, _) = step.apply(&d).unwrap();
        assert_eq!(d2, d);
    }

    #[test]
    fn set_node_attrs_toggles_a_task() {
        let d = doc(vec![Node::element(
            NodeKind::BulletList,
            vec![task(false, "a")],
        )]);
        let step = Step::SetNodeAttrs {
            pos: 1,
            kind: NodeKind::ListItem {
                checked: Some(true),
            },
        };
        let (d2, _) = step.apply(&d).unwrap();
        assert_eq!(
            d2.node_at(1).and_then(Node::kind),
            Some(&NodeKind::ListItem {
                checked: Some(true)
            })
        );
        let wrong = Step::SetNodeAttrs {
            pos: 1,
            kind: NodeKind::Paragraph,
        };
        assert!(wrong.apply(&d).is_err());
    }

    #[test]
    fn split_list_item_creates_an_unchecked_task() {
        let d = doc(vec![Node::element(
            NodeKind::BulletList,
            vec![task(true, "ab")],
        )]);
        // inside "ab" after "a"
        let (d2, map) = Step::Split { pos: 4, depth: 2 }.apply(&d).unwrap();
        let list = d2.root().child(0).unwrap();
        assert_eq!(list.child_count(), 2);
        assert_eq!(
            list.child(1).and_then(Node::kind),
            Some(&NodeKind::ListItem {
                checked: Some(false)
            })
        );
        assert_eq!(list.child(1).unwrap().text_content(), "b");
        assert_eq!(map, StepMap::insertion(4, 4));
    }

    #[test]
    fn split_at_heading_end_continues_with_a_paragraph() {
        let d = doc(vec![Node::element(
            NodeKind::Heading { level: 1 },
            vec![Node::text("T")],
        )]);
        let (d2, _) = Step::Split { pos: 2, depth: 1 }.apply(&d).unwrap();
        assert_eq!(
            d2.root().child(1).map(Node::node_type),
            Some(NodeType::Paragraph)
        );
    }

    #[test]
    fn insert_footnote_ref_inline() {
        let d = doc(vec![p(vec![Node::text("ab")])]);
        let step = Step::InsertNode {
            pos: 2,
            node: Node::element(NodeKind::FootnoteRef { id: "1".into() }, vec![]),
        };
        let (d2, map) = step.apply(&d).unwrap();
        assert_eq!(d2.root().child(0).unwrap().child_count(), 3);
        assert_eq!(map, StepMap::insertion(2, 1));
    }
}
