//! Editing commands: the transactions behind keyboard and toolbar gestures.
//!
//! Each command adds steps to a [`Transaction`] and leaves its selection
//! where the caret should end up. Commands never dispatch.

use std::collections::BTreeSet;

use super::selection::Selection;
use super::transaction::Transaction;
use crate::error::EditResult;
use crate::model::{Document, Mark, MarkSet, Node, NodeKind, NodeType};

/// Replaces the selection with `text`. Newlines outside code blocks split
/// the current block.
pub fn insert_text(tr: &mut Transaction, text: &str) -> EditResult<()> {
    let sel = tr.selection();
    let marks = tr.doc().resolve(sel.from())?.marks_for_insertion();
    if !sel.is_empty() {
        tr.delete(sel.from(), sel.to())?;
    }
    let end = insert_lines(tr, sel.from(), text, &marks)?;
    tr.set_selection(Selection::cursor(end))?;
    Ok(())
}

/// Inserts possibly multi-line text at `pos` and returns the position after it.
pub fn insert_lines(
    tr: &mut Transaction,
    pos: usize,
    text: &str,
    marks: &MarkSet,
) -> EditResult<usize> {
    let in_code = tr.doc().resolve(pos)?.parent().node_type() == NodeType::CodeBlock;
    if in_code {
        tr.insert_text(pos, text, Some(MarkSet::empty()))?;
        return Ok(pos + text.chars().count());
    }
    let mut pos = pos;
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            pos = split_at(tr, pos)?;
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if !line.is_empty() {
            tr.insert_text(pos, line, Some(marks.clone()))?;
            pos += line.chars().count();
        }
    }
    Ok(pos)
}

/// Splits the textblock at `pos`, together with its list item when the
/// textblock opens the item. Returns the start of the new block's content.
pub fn split_at(tr: &mut Transaction, pos: usize) -> EditResult<usize> {
    let depth = {
        let rp = tr.doc().resolve(pos)?;
        let d = rp.depth();
        if d >= 2 && rp.node(d - 1).node_type() == NodeType::ListItem && rp.index(d - 1) == 0 {
            2
        } else {
            1
        }
    };
    tr.split(pos, depth)?;
    Ok(pos + 2 * depth)
}

/// Enter: replace the selection with a block split.
pub fn split_block(tr: &mut Transaction) -> EditResult<()> {
    let sel = tr.selection();
    if !sel.is_empty() {
        tr.delete(sel.from(), sel.to())?;
    }
    let pos = split_at(tr, sel.from())?;
    tr.set_selection(Selection::cursor(pos))?;
    Ok(())
}

/// Backspace. Returns `false` when there is nothing before the caret.
pub fn delete_backward(tr: &mut Transaction) -> EditResult<bool> {
    let sel = tr.selection();
    if !sel.is_empty() {
        tr.delete(sel.from(), sel.to())?;
        tr.set_selection(Selection::cursor(sel.from()))?;
        return Ok(true);
    }
    let pos = sel.head;
    let (offset, previous_end) = {
        let rp = tr.doc().resolve(pos)?;
        let previous_end = tr
            .doc()
            .textblocks()
            .into_iter()
            .filter(|(start, _)| *start < pos)
            .filter(|(start, node)| start + node.content_size() < pos)
            .last()
            .map(|(start, node)| start + node.content_size());
        (rp.parent_offset(), previous_end)
    };
    if offset > 0 {
        tr.delete(pos - 1, pos)?;
        tr.set_selection(Selection::cursor(pos - 1))?;
        return Ok(true);
    }
    match previous_end {
        Some(end) => {
            tr.delete(end, pos)?;
            tr.set_selection(Selection::cursor(end))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Adds `mark` to the selection, or removes its type when every selected
/// text run already carries it. Returns `false` for an empty selection.
pub fn toggle_mark(tr: &mut Transaction, mark: Mark) -> EditResult<bool> {
    let sel = tr.selection();
    if sel.is_empty() {
        return Ok(false);
    }
    let mark_type = mark.mark_type();
    let mut all_marked = true;
    let mut any_text = false;
    tr.doc().nodes_between(sel.from(), sel.to(), |node, _| {
        if node.is_text() {
            any_text = true;
            all_marked &= node.marks().has(mark_type);
        }
    });
    if any_text && all_marked {
        tr.remove_mark(sel.from(), sel.to(), mark_type)?;
    } else {
        tr.add_mark(sel.from(), sel.to(), mark)?;
    }
    Ok(true)
}

/// Flips the `checked` attribute of the task item around `pos`.
///
/// Returns `false`, without adding a step, when the nearest list item is a
/// plain item or there is none.
pub fn toggle_task(tr: &mut Transaction, pos: usize) -> EditResult<bool> {
    let target = {
        let rp = tr.doc().resolve(pos)?;
        match rp.find_ancestor(NodeType::ListItem) {
            Some((depth, node)) => match (node.kind(), rp.before(depth)) {
                (Some(NodeKind::ListItem { checked: Some(c) }), Some(at)) => Some((at, *c)),
                _ => None,
            },
            None => None,
        }
    };
    let Some((at, checked)) = target else {
        return Ok(false);
    };
    tr.set_node_attrs(
        at,
        NodeKind::ListItem {
            checked: Some(!checked),
        },
    )?;
    Ok(true)
}

/// Inserts a footnote reference at the selection, appending an empty
/// definition when none exists for the id. Returns the id used.
pub fn insert_footnote(tr: &mut Transaction, id: Option<&str>) -> EditResult<String> {
    let id = match id {
        Some(id) => id.to_string(),
        None => next_footnote_id(tr.doc()),
    };
    let sel = tr.selection();
    if !sel.is_empty() {
        tr.delete(sel.from(), sel.to())?;
    }
    tr.insert_node(
        sel.from(),
        Node::element(NodeKind::FootnoteRef { id: id.clone() }, vec![]),
    )?;
    let defined = footnote_ids(tr.doc(), NodeType::FootnoteDef).contains(&id);
    if !defined {
        let end = tr.doc().content_size();
        tr.insert_node(
            end,
            Node::element(
                NodeKind::FootnoteDef { id: id.clone() },
                vec![Node::element(NodeKind::Paragraph, vec![])],
            ),
        )?;
    }
    tr.set_selection(Selection::cursor(sel.from() + 1))?;
    Ok(id)
}

fn footnote_ids(doc: &Document, ty: NodeType) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    doc.root().descendants(0, &mut |node, _| {
        if node.node_type() == ty
            && let Some(NodeKind::FootnoteRef { id } | NodeKind::FootnoteDef { id }) = node.kind()
        {
            ids.insert(id.clone());
        }
        true
    });
    ids
}

/// Smallest positive number not yet used as a footnote id.
pub fn next_footnote_id(doc: &Document) -> String {
    let mut used = footnote_ids(doc, NodeType::FootnoteRef);
    used.extend(footnote_ids(doc, NodeType::FootnoteDef));
    (1..)
        .map(|n: u64| n.to_string())
        .find(|id| !used.contains(id))
        .unwrap_or_default()
}
