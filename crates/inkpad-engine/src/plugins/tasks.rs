use log::debug;
use serde::Serialize;

use super::{Plugin, contain};
use crate::editing::{EditorState, PointerTarget, Transaction, commands};
use crate::model::{Document, NodeKind};

/// A task item and where its text starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskEntry {
    /// First position inside the item's leading paragraph.
    pub pos: usize,
    pub checked: bool,
    pub text: String,
}

/// Every task item in document order, nested items after their parent.
pub fn task_items(doc: &Document) -> Vec<TaskEntry> {
    let mut found = Vec::new();
    doc.root().descendants(0, &mut |node, pos| {
        if let Some(NodeKind::ListItem { checked: Some(checked) }) = node.kind() {
            found.push(TaskEntry {
                pos: pos + 2,
                checked: *checked,
                text: node.child(0).map(|p| p.text_content()).unwrap_or_default(),
            });
        }
        !node.is_textblock()
    });
    found
}

/// Flips task items when the pointer goes down in the checkbox band.
///
/// No checkbox widget is rendered: the band is the first
/// `checkbox_hit_width` pixels of the item's first textblock.
#[derive(Debug, Default)]
pub struct TaskPlugin;

impl Plugin for TaskPlugin {
    fn name(&self) -> &'static str {
        "tasks"
    }

    fn handle_pointer_down(
        &mut self,
        state: &EditorState<'_>,
        target: &PointerTarget,
    ) -> Option<Transaction> {
        if target.x >= state.config.checkbox_hit_width {
            return None;
        }
        let pos = state.render.target_position(target)?;
        let mut tr = state.transaction();
        tr.set_origin(self.name());
        let toggled = contain(self.name(), commands::toggle_task(&mut tr, pos))?;
        if !toggled {
            debug!("tasks: pointer down at {pos} is not on a task item");
            return None;
        }
        Some(tr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editing::{RegionId, RenderIndex, Selection};
    use crate::markdown;
    use crate::model::NodeType;
    use pretty_assertions::assert_eq;

    fn click(md: &str, x: f32) -> Option<String> {
        let doc = markdown::parse(md);
        let render = RenderIndex::build(&doc);
        let config = EditorConfig::default();
        let state = EditorState {
            doc: &doc,
            selection: Selection::cursor(0),
            version: 0,
            render: &render,
            config: &config,
        };
        let region = render
            .regions()
            .iter()
            .find(|r| r.node_type == NodeType::Paragraph)?
            .id;
        let target = PointerTarget {
            region,
            offset: 0,
            x,
        };
        TaskPlugin
            .handle_pointer_down(&state, &target)
            .map(|tr| markdown::serialize(tr.doc()))
    }

    #[test]
    fn click_in_checkbox_band_toggles() {
        assert_eq!(click("- [ ] task", 4.0).as_deref(), Some("- [x] task"));
        assert_eq!(click("- [x] task", 4.0).as_deref(), Some("- [ ] task"));
    }

    #[test]
    fn click_on_text_or_plain_item_is_unhandled() {
        assert_eq!(click("- [ ] task", 80.0), None);
        assert_eq!(click("- plain", 4.0), None);
        assert_eq!(click("paragraph", 4.0), None);
    }

    #[test]
    fn task_items_are_listed_in_document_order() {
        let doc = markdown::parse("- [ ] one\n  - [x] two\n- plain\n\n1. [x] three");
        let found: Vec<_> = task_items(&doc)
            .into_iter()
            .map(|t| (t.checked, t.text))
            .collect();
        assert_eq!(
            found,
            vec![
                (false, "one".to_string()),
                (true, "two".to_string()),
                (true, "three".to_string()),
            ]
        );
        assert_eq!(task_items(&doc)[0].pos, 3);
    }

    #[test]
    fn unknown_region_is_unhandled() {
        let doc = markdown::parse("- [ ] task");
        let render = RenderIndex::build(&doc);
        let config = EditorConfig::default();
        let state = EditorState {
            doc: &doc,
            selection: Selection::cursor(0),
            version: 0,
            render: &render,
            config: &config,
        };
        let target = PointerTarget {
            region: RegionId(99),
            offset: 0,
            x: 1.0,
        };
        assert!(TaskPlugin.handle_pointer_down(&state, &target).is_none());
    }
}
