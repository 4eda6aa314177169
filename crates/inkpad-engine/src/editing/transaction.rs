use log::debug;

use super::mapping::Mapping;
use super::selection::Selection;
use super::step::Step;
use crate::error::{EditError, EditResult};
use crate::model::{Document, Mark, MarkSet, MarkType, Node, NodeKind};

/// An ordered batch of steps applied to a working copy of the document.
///
/// Every step is applied as soon as it is added, so later steps see the
/// result of earlier ones. The first failing step poisons the transaction:
/// further steps are refused and dispatching it is a no-op that reports the
/// original error.
#[derive(Debug, Clone)]
pub struct Transaction {
    doc: Document,
    steps: Vec<Step>,
    mapping: Mapping,
    selection: Selection,
    selection_set: bool,
    started_at: u64,
    origin: &'static str,
    error: Option<EditError>,
}

impl Transaction {
    /// Starts an empty transaction against `doc` at `version`.
    pub fn new(doc: &Document, selection: Selection, version: u64) -> Self {
        Self {
            doc: doc.clone(),
            steps: Vec::new(),
            mapping: Mapping::new(),
            selection,
            selection_set: false,
            started_at: version,
            origin: "user",
            error: None,
        }
    }

    /// Working document after all steps so far.
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Maps positions of the starting document onto [`Transaction::doc`].
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selection_set(&self) -> bool {
        self.selection_set
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    pub fn error(&self) -> Option<&EditError> {
        self.error.as_ref()
    }

    pub fn origin(&self) -> &'static str {
        self.origin
    }

    /// Labels the transaction for logs and change events.
    pub fn set_origin(&mut self, origin: &'static str) -> &mut Self {
        self.origin = origin;
        self
    }

    /// Applies `step` to the working document.
    pub fn step(&mut self, step: Step) -> EditResult<&mut Self> {
        if let Some(err) = &self.error {
            return Err(EditError::TransactionFailed(Box::new(err.clone())));
        }
        match step.apply(&self.doc) {
            Ok((doc, map)) => {
                let mut single = Mapping::new();
                single.push(map.clone());
                self.selection = self.selection.map(&single).clamp(doc.content_size());
                self.mapping.push(map);
                self.doc = doc;
                self.steps.push(step);
                Ok(self)
            }
            Err(err) => {
                debug!("{} transaction: {step:?} failed: {err}", self.origin);
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Inserts text. Without explicit marks the text inherits the marks in
    /// effect at `pos`.
    pub fn insert_text(
        &mut self,
        pos: usize,
        text: &str,
        marks: Option<MarkSet>,
    ) -> EditResult<&mut Self> {
        let marks = match marks {
            Some(marks) => marks,
            None => match self.doc.resolve(pos).map(|rp| rp.marks_for_insertion()) {
                Ok(marks) => marks,
                Err(err) => return self.fail(err),
            },
        };
        self.step(Step::InsertText {
            pos,
            text: text.to_string(),
            marks,
        })
    }

    pub fn delete(&mut self, from: usize, to: usize) -> EditResult<&mut Self> {
        self.step(Step::Delete { from, to })
    }

    /// Replaces `[from, to)` with text carrying `marks`.
    pub fn replace_text(
        &mut self,
        from: usize,
        to: usize,
        text: &str,
        marks: Option<MarkSet>,
    ) -> EditResult<&mut Self> {
        let marks = match marks {
            Some(marks) => marks,
            None => match self.doc.resolve(from).map(|rp| rp.marks_for_insertion()) {
                Ok(marks) => marks,
                Err(err) => return self.fail(err),
            },
        };
        self.delete(from, to)?;
        self.insert_text(from, text, Some(marks))
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> EditResult<&mut Self> {
        self.step(Step::AddMark { from, to, mark })
    }

    pub fn remove_mark(
        &mut self,
        from: usize,
        to: usize,
        mark_type: MarkType,
    ) -> EditResult<&mut Self> {
        self.step(Step::RemoveMark {
            from,
            to,
            mark_type,
        })
    }

    pub fn set_node_attrs(&mut self, pos: usize, kind: NodeKind) -> EditResult<&mut Self> {
        self.step(Step::SetNodeAttrs { pos, kind })
    }

    pub fn insert_node(&mut self, pos: usize, node: Node) -> EditResult<&mut Self> {
        self.step(Step::InsertNode { pos, node })
    }

    pub fn split(&mut self, pos: usize, depth: usize) -> EditResult<&mut Self> {
        self.step(Step::Split { pos, depth })
    }

    /// Sets the selection in the coordinates of the current working document.
    pub fn set_selection(&mut self, selection: Selection) -> EditResult<&mut Self> {
        if let Some(err) = &self.error {
            return Err(EditError::TransactionFailed(Box::new(err.clone())));
        }
        if let Err(err) = self.doc.check_pos(selection.anchor.max(selection.head)) {
            return self.fail(err);
        }
        self.selection = selection;
        self.selection_set = true;
        Ok(self)
    }

    fn fail(&mut self, err: EditError) -> EditResult<&mut Self> {
        if self.error.is_none() {
            self.error = Some(err.clone());
        }
        Err(err)
    }

    pub(crate) fn into_parts(self) -> (Document, Mapping, Selection, bool) {
        (self.doc, self.mapping, self.selection, self.selection_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(text: &str) -> Document {
        Document::new(Node::element(
            NodeKind::Doc,
            vec![Node::element(NodeKind::Paragraph, vec![Node::text(text)])],
        ))
        .unwrap()
    }

    #[test]
    fn later_steps_see_earlier_ones() {
        let d = doc("ac");
        let mut tr = Transaction::new(&d, Selection::cursor(1), 0);
        tr.insert_text(2, "b", None).unwrap();
        tr.insert_text(4, "d", None).unwrap();
        assert_eq!(tr.doc().root().text_content(), "abcd");
        assert_eq!(tr.steps().len(), 2);
    }

    #[test]
    fn mapping_rebases_start_positions() {
        let d = doc("hello world");
        let mut tr = Transaction::new(&d, Selection::cursor(1), 0);
        tr.insert_text(1, ">> ", None).unwrap();
        tr.delete(9, 12).unwrap();
        // "r" was at 9 and ends up there again
        assert_eq!(tr.mapping().map(9), 9);
        assert_eq!(tr.mapping().map(1), 4);
        assert_eq!(tr.doc().root().text_content(), ">> hellorld");
    }

    #[test]
    fn first_failure_poisons_the_transaction() {
        let d = doc("abc");
        let mut tr = Transaction::new(&d, Selection::cursor(1), 0);
        tr.insert_text(1, "x", None).unwrap();
        let err = tr.delete(2, 99).unwrap_err();
        assert!(matches!(err, EditError::OutOfRange { .. }));
        let again = tr.insert_text(1, "y", None).unwrap_err();
        assert!(matches!(again, EditError::TransactionFailed(_)));
        assert_eq!(tr.error().map(EditError::root_cause), Some(&err));
    }

    #[test]
    fn selection_follows_the_steps() {
        let d = doc("abc");
        let mut tr = Transaction::new(&d, Selection::cursor(2), 0);
        tr.insert_text(1, "xy", None).unwrap();
        assert_eq!(tr.selection(), Selection::cursor(4));
        assert!(!tr.selection_set());
    }

    #[test]
    fn inserted_text_inherits_inclusive_marks() {
        let d = Document::new(Node::element(
            NodeKind::Doc,
            vec![Node::element(
                NodeKind::Paragraph,
                vec![Node::marked_text("ab", vec![Mark::Strong].into())],
            )],
        ))
        .unwrap();
        let mut tr = Transaction::new(&d, Selection::cursor(3), 0);
        tr.insert_text(3, "c", None).unwrap();
        let para = tr.doc().root().child(0).unwrap();
        assert_eq!(para.child_count(), 1);
        assert!(para.child(0).unwrap().marks().has(MarkType::Strong));
    }
}
