use log::debug;

use super::{Plugin, contain};
use crate::editing::{EditorState, Selection, Transaction, commands};
use crate::error::EditResult;
use crate::markdown::kinds::Footnote;
use crate::model::schema::is_footnote_id;
use crate::model::{MarkType, Node, NodeKind, NodeType};

/// Input rule turning a typed `[^id]` into a footnote reference.
///
/// At the start of a line the text stays as typed: there it reads as the
/// opening of a definition, which only the block parser recognizes.
#[derive(Debug, Default)]
pub struct FootnotePlugin;

impl Plugin for FootnotePlugin {
    fn name(&self) -> &'static str {
        "footnotes"
    }

    fn handle_text_input(&mut self, state: &EditorState<'_>, text: &str) -> Option<Transaction> {
        if !text.ends_with(char::from(Footnote::CLOSE)) {
            return None;
        }
        let mut tr = state.transaction();
        tr.set_origin(self.name());
        contain(self.name(), commands::insert_text(&mut tr, text))?;
        let converted = contain(self.name(), convert_reference(&mut tr))?;
        converted.then_some(tr)
    }
}

/// Replaces a `[^id]` ending at the cursor with a reference node.
fn convert_reference(tr: &mut Transaction) -> EditResult<bool> {
    let cursor = tr.selection().head;
    let (from, id) = {
        let rp = tr.doc().resolve(cursor)?;
        let parent = rp.parent();
        if !parent.is_textblock() || parent.node_type() == NodeType::CodeBlock {
            return Ok(false);
        }
        let before = plain_text_before(parent.children(), rp.parent_offset());
        let Some(open) = before.rfind("[^") else {
            return Ok(false);
        };
        let candidate = &before[open..];
        let Some(id) = candidate
            .strip_prefix("[^")
            .and_then(|rest| rest.strip_suffix(char::from(Footnote::CLOSE)))
        else {
            return Ok(false);
        };
        if !is_footnote_id(id) {
            return Ok(false);
        }
        (cursor - candidate.chars().count(), id.to_string())
    };
    if tr.doc().resolve(from)?.at_line_start() {
        debug!("footnotes: [^{id}] at line start left as text");
        return Ok(false);
    }
    tr.delete(from, cursor)?;
    tr.insert_node(from, Node::element(NodeKind::FootnoteRef { id }, vec![]))?;
    tr.set_selection(Selection::cursor(from + 1))?;
    Ok(true)
}

/// Unmarked-by-code text directly before `offset`, back to the nearest atom.
fn plain_text_before(content: &[Node], offset: usize) -> String {
    let mut out = String::new();
    let mut pos = 0;
    for child in content {
        if pos >= offset {
            break;
        }
        let size = child.size();
        match child.as_text() {
            Some(t) if !child.marks().has(MarkType::Code) => {
                out.extend(t.text.chars().take(offset - pos));
            }
            _ => out.clear(),
        }
        pos += size;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editing::RenderIndex;
    use crate::markdown;
    use crate::model::Document;
    use pretty_assertions::assert_eq;

    fn type_at(doc: &Document, cursor: usize, text: &str) -> Option<Transaction> {
        let render = RenderIndex::build(doc);
        let config = EditorConfig::default();
        let state = EditorState {
            doc,
            selection: Selection::cursor(cursor),
            version: 0,
            render: &render,
            config: &config,
        };
        FootnotePlugin.handle_text_input(&state, text)
    }

    #[test]
    fn closing_bracket_mid_paragraph_creates_a_reference() {
        // "see [^1" occupies 1..8
        let doc = markdown::parse("see \\[^1");
        let tr = type_at(&doc, 8, "]").unwrap();
        let para = tr.doc().root().child(0).unwrap();
        assert_eq!(
            para.child(1).and_then(Node::kind),
            Some(&NodeKind::FootnoteRef { id: "1".into() })
        );
        assert_eq!(tr.selection(), Selection::cursor(6));
    }

    #[test]
    fn line_start_is_left_alone() {
        let doc = markdown::parse("\\[^1");
        assert!(type_at(&doc, 4, "]").is_none());
    }

    #[test]
    fn code_and_other_input_is_ignored() {
        let doc = markdown::parse("x `[^1`");
        assert!(type_at(&doc, 6, "]").is_none());
        let doc = markdown::parse("see");
        assert!(type_at(&doc, 4, "x").is_none());
    }

    #[test]
    fn invalid_ids_are_ignored() {
        let doc = markdown::parse("a \\[^");
        assert!(type_at(&doc, 5, "]").is_none());
    }
}
