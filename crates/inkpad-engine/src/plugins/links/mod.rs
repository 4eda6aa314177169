//! # Links
//!
//! - **`recognize`**: finds `[text](url)` and bare URLs in textblock content
//! - **`tooltip`**: the hover-intent state machine behind the link tooltip
//!
//! Raw link syntax is normalized into link marks at three moments: when a
//! boundary character completes it while typing, when it arrives in a paste,
//! and when the selection moves away from it.

pub mod recognize;
pub mod tooltip;

use std::time::Instant;

use log::debug;
use serde::Serialize;

use super::{Plugin, contain};
use crate::editing::{
    ChangeEvent, EditorState, HostEvent, HostEventKind, Key, PointerTarget, Selection, StampedPos,
    Transaction, commands,
};
use crate::error::EditResult;
use crate::model::{Document, Mark, MarkType};
use crate::plugins::Timer;
use recognize::LinkMatch;
pub use tooltip::{LinkForm, LinkTooltip, TooltipState};

/// The full contiguous run carrying one link mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkSpan {
    pub from: usize,
    pub to: usize,
    pub text: String,
    pub href: String,
    pub title: Option<String>,
}

/// Finds the link at `pos`, looking at the character after the position
/// first and the one before it second.
///
/// The span is grown backwards and forwards over sibling runs carrying the
/// same link mark, so the cost is linear in the size of the textblock.
pub fn link_span(doc: &Document, pos: usize) -> Option<LinkSpan> {
    let rp = doc.resolve(pos).ok()?;
    let parent = rp.parent();
    if !parent.is_textblock() {
        return None;
    }
    let children = parent.children();
    let mut starts = Vec::with_capacity(children.len());
    let mut at = rp.start(rp.depth());
    for child in children {
        starts.push(at);
        at += child.size();
    }
    let has_link = |i: usize| children[i].marks().has(MarkType::Link);
    let index = (0..children.len())
        .find(|&i| starts[i] <= pos && pos < starts[i] + children[i].size() && has_link(i))
        .or_else(|| {
            (0..children.len()).find(|&i| {
                starts[i] < pos && pos == starts[i] + children[i].size() && has_link(i)
            })
        })?;

    let mark = children[index].marks().get(MarkType::Link)?.clone();
    let mut first = index;
    while first > 0 && children[first - 1].marks().contains(&mark) {
        first -= 1;
    }
    let mut last = index;
    while last + 1 < children.len() && children[last + 1].marks().contains(&mark) {
        last += 1;
    }
    let text: String = children[first..=last]
        .iter()
        .filter_map(|c| c.as_text().map(|t| t.text.as_str()))
        .collect();
    let Mark::Link { href, title } = mark else {
        return None;
    };
    Some(LinkSpan {
        from: starts[first],
        to: starts[last] + children[last].size(),
        text,
        href,
        title,
    })
}

/// Every link in the document, in document order.
pub fn links(doc: &Document) -> Vec<LinkSpan> {
    let mut found: Vec<LinkSpan> = Vec::new();
    for (start, block) in doc.textblocks() {
        let mut pos = start;
        for child in block.children() {
            let seen = found.last().is_some_and(|last| pos < last.to);
            if !seen
                && child.marks().has(MarkType::Link)
                && let Some(span) = link_span(doc, pos)
            {
                found.push(span);
            }
            pos += child.size();
        }
    }
    found
}

/// Link recognition and the link tooltip.
#[derive(Debug, Default)]
pub struct LinkPlugin {
    state: TooltipState,
}

impl LinkPlugin {
    pub fn state(&self) -> &TooltipState {
        &self.state
    }

    /// What the host should render, resolved against the current document.
    pub fn tooltip(&self, doc: &Document) -> LinkTooltip {
        let link = self.state.anchor().and_then(|a| link_span(doc, a.pos));
        match (&self.state, link) {
            (TooltipState::Shown { .. }, Some(link)) => LinkTooltip::Shown { link },
            (TooltipState::Editing { form, .. }, Some(link)) => LinkTooltip::Editing {
                link,
                form: form.clone(),
            },
            _ => LinkTooltip::Hidden,
        }
    }

    /// Shown → Editing, with the form pre-filled from the link.
    pub fn edit(&mut self, doc: &Document) -> bool {
        let TooltipState::Shown { anchor, .. } = self.state else {
            return false;
        };
        let Some(link) = link_span(doc, anchor.pos) else {
            self.state.reset();
            return false;
        };
        self.state = TooltipState::Editing {
            anchor,
            form: LinkForm {
                text: link.text,
                href: link.href,
            },
        };
        true
    }

    pub fn set_form(&mut self, text: &str, href: &str) -> bool {
        match &mut self.state {
            TooltipState::Editing { form, .. } => {
                form.text = text.to_string();
                form.href = href.to_string();
                true
            }
            _ => false,
        }
    }

    /// Editing → Shown, committing the form.
    ///
    /// The old mark is removed from the whole span, the text replaced when it
    /// changed and the mark re-applied with the new href. An empty href leaves
    /// the text unlinked. The cursor ends up after the edited text.
    pub fn save(&mut self, state: &EditorState<'_>) -> Option<Transaction> {
        let TooltipState::Editing { anchor, form } = &self.state else {
            return None;
        };
        let (anchor, form) = (*anchor, form.clone());
        let Some(link) = link_span(state.doc, anchor.pos) else {
            self.state.reset();
            return None;
        };
        let mut tr = state.transaction();
        tr.set_origin(self.name());
        let saved = contain(self.name(), save_link(&mut tr, &link, &form));
        // Re-keyed on the span start so the save's own mapping carries it along.
        self.state = TooltipState::Shown {
            anchor: StampedPos {
                pos: link.from,
                version: anchor.version,
            },
            hide_timer: Timer::default(),
        };
        saved.map(|()| tr)
    }

    /// Closes the tooltip. An open form is saved first.
    pub fn close(&mut self, state: &EditorState<'_>) -> Option<Transaction> {
        let tr = match self.state {
            TooltipState::Editing { .. } => self.save(state),
            _ => None,
        };
        self.state.reset();
        tr
    }

    /// Removes the link mark, keeping the text.
    pub fn unlink(&mut self, state: &EditorState<'_>) -> Option<Transaction> {
        let link = self.state.anchor().and_then(|a| link_span(state.doc, a.pos))?;
        self.state.reset();
        let mut tr = state.transaction();
        tr.set_origin(self.name());
        contain(
            self.name(),
            tr.remove_mark(link.from, link.to, MarkType::Link).map(|_| ()),
        )?;
        Some(tr)
    }

    /// Deletes the linked text altogether.
    pub fn remove(&mut self, state: &EditorState<'_>) -> Option<Transaction> {
        let link = self.state.anchor().and_then(|a| link_span(state.doc, a.pos))?;
        self.state.reset();
        let mut tr = state.transaction();
        tr.set_origin(self.name());
        contain(self.name(), remove_link(&mut tr, &link))?;
        Some(tr)
    }

    fn pointer_moved(
        &mut self,
        state: &EditorState<'_>,
        target: Option<&PointerTarget>,
        now: Instant,
    ) {
        let over = target
            .and_then(|t| state.render.target_position(t))
            .and_then(|pos| link_span(state.doc, pos).map(|link| (pos, link)));
        if matches!(self.state, TooltipState::Editing { .. }) {
            return;
        }
        let Some((pos, link)) = over else {
            match &mut self.state {
                TooltipState::Hovering { .. } => self.state.reset(),
                TooltipState::Shown { hide_timer, .. } => {
                    if !hide_timer.is_running() {
                        hide_timer.start(now + state.config.hover_hide_delay());
                    }
                }
                TooltipState::Idle | TooltipState::Editing { .. } => {}
            }
            return;
        };
        let same_link = self.state.anchor().is_some_and(|anchor| {
            link_span(state.doc, anchor.pos).is_some_and(|a| a.from == link.from && a.to == link.to)
        });
        match &mut self.state {
            TooltipState::Shown { hide_timer, .. } if same_link => hide_timer.cancel(),
            TooltipState::Hovering { .. } if same_link => {}
            _ => {
                self.state = TooltipState::Hovering {
                    anchor: state.stamp(pos),
                    show_timer: Timer::started(now + state.config.hover_show_delay()),
                };
            }
        }
    }

    /// Moves the anchor onto the new document, dropping to `Idle` when the
    /// link it pointed at is gone.
    fn rebase_anchor(&mut self, state: &EditorState<'_>, event: &ChangeEvent) {
        let Some(anchor) = self.state.anchor_mut() else {
            return;
        };
        if anchor.version == event.previous_version {
            anchor.pos = event.mapping.map(anchor.pos);
            anchor.version = event.version;
        }
        let anchor = *anchor;
        if anchor.version != state.version || link_span(state.doc, anchor.pos).is_none() {
            debug!("links: tooltip anchor {anchor:?} no longer on a link");
            self.state.reset();
        }
    }

    fn collapse(&self, state: &EditorState<'_>) -> Option<Transaction> {
        let sel = state.selection;
        let matches = recognize::collapsible(state.doc, sel.from(), sel.to());
        if matches.is_empty() {
            return None;
        }
        debug!("links: collapsing {} raw link(s)", matches.len());
        let mut tr = state.transaction();
        tr.set_origin(self.name());
        contain(self.name(), apply_all(&mut tr, &matches))?;
        Some(tr)
    }
}

fn save_link(tr: &mut Transaction, link: &LinkSpan, form: &LinkForm) -> EditResult<()> {
    let marks = tr
        .doc()
        .resolve(link.from)?
        .marks()
        .without(MarkType::Link);
    tr.remove_mark(link.from, link.to, MarkType::Link)?;
    let mut end = link.to;
    if form.text != link.text {
        tr.replace_text(link.from, link.to, &form.text, Some(marks))?;
        end = link.from + form.text.chars().count();
    }
    let href = form.href.trim();
    if !href.is_empty() && end > link.from {
        tr.add_mark(
            link.from,
            end,
            Mark::Link {
                href: href.to_string(),
                title: link.title.clone(),
            },
        )?;
    }
    tr.set_selection(Selection::cursor(end))?;
    Ok(())
}

fn remove_link(tr: &mut Transaction, link: &LinkSpan) -> EditResult<()> {
    tr.delete(link.from, link.to)?;
    tr.set_selection(Selection::cursor(link.from))?;
    Ok(())
}

/// Applies matches from last to first so earlier positions stay valid.
fn apply_all(tr: &mut Transaction, matches: &[LinkMatch]) -> EditResult<()> {
    matches
        .iter()
        .rev()
        .try_for_each(|m| recognize::apply(tr, m))
}

impl Plugin for LinkPlugin {
    fn name(&self) -> &'static str {
        "links"
    }

    fn attach(&mut self, _state: &EditorState<'_>) -> Vec<HostEventKind> {
        self.state = TooltipState::Idle;
        vec![
            HostEventKind::Scroll,
            HostEventKind::KeyDown,
            HostEventKind::PointerDownOutside,
            HostEventKind::PointerMove,
            HostEventKind::Tick,
        ]
    }

    fn detach(&mut self) {
        self.state.reset();
    }

    fn handle_text_input(&mut self, state: &EditorState<'_>, text: &str) -> Option<Transaction> {
        if !state.config.autolink || !text.chars().last().is_some_and(recognize::is_trigger) {
            return None;
        }
        let mut tr = state.transaction();
        tr.set_origin(self.name());
        contain(self.name(), commands::insert_text(&mut tr, text))?;
        let found = recognize::completed_by_trigger(tr.doc(), tr.selection().head)?;
        debug!("links: converting {:?} on input", found.pattern);
        contain(self.name(), recognize::apply(&mut tr, &found))?;
        Some(tr)
    }

    fn handle_paste(&mut self, state: &EditorState<'_>, text: &str) -> Option<Transaction> {
        if !state.config.autolink {
            return None;
        }
        let start = state.selection.from();
        let mut tr = state.transaction();
        tr.set_origin(self.name());
        contain(self.name(), commands::insert_text(&mut tr, text))?;
        let matches = recognize::find_in_range(tr.doc(), start, tr.selection().head);
        if matches.is_empty() {
            return None;
        }
        contain(self.name(), apply_all(&mut tr, &matches))?;
        Some(tr)
    }

    fn handle_host_event(&mut self, state: &EditorState<'_>, event: &HostEvent) -> Option<Transaction> {
        match event {
            HostEvent::Scroll | HostEvent::PointerDownOutside | HostEvent::KeyDown(Key::Escape) => {
                self.close(state)
            }
            HostEvent::KeyDown(Key::Enter) => self.save(state),
            HostEvent::KeyDown(_) => None,
            HostEvent::PointerMove(target, now) => {
                self.pointer_moved(state, target.as_ref(), *now);
                None
            }
            HostEvent::Tick(now) => {
                self.state.tick(*now);
                None
            }
        }
    }

    fn append_transaction(&mut self, state: &EditorState<'_>, event: &ChangeEvent) -> Option<Transaction> {
        self.rebase_anchor(state, event);
        if !state.config.autolink || !(event.doc_changed || event.selection_changed) {
            return None;
        }
        self.collapse(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editing::RenderIndex;
    use crate::markdown;
    use pretty_assertions::assert_eq;

    fn with_state<R>(doc: &Document, selection: Selection, f: impl FnOnce(&EditorState<'_>) -> R) -> R {
        let render = RenderIndex::build(doc);
        let config = EditorConfig::default();
        let state = EditorState {
            doc,
            selection,
            version: 0,
            render: &render,
            config: &config,
        };
        f(&state)
    }

    #[test]
    fn span_covers_runs_with_other_marks() {
        // "a" then the link "bc**d**" over 2..5
        let doc = markdown::parse("a[bc**d**](u)e");
        let span = link_span(&doc, 3).unwrap();
        assert_eq!((span.from, span.to), (2, 5));
        assert_eq!(span.text, "bcd");
        assert_eq!(span.href, "u");
        assert_eq!(link_span(&doc, 5).map(|s| s.from), Some(2));
        assert_eq!(link_span(&doc, 1), None);
    }

    #[test]
    fn links_lists_each_span_once() {
        let doc = markdown::parse("[a**b**](u) and [c](v)\n\n- <https://x.com>");
        let found: Vec<_> = links(&doc)
            .into_iter()
            .map(|l| (l.text, l.href))
            .collect();
        assert_eq!(
            found,
            vec![
                ("ab".to_string(), "u".to_string()),
                ("c".to_string(), "v".to_string()),
                ("https://x.com".to_string(), "https://x.com".to_string()),
            ]
        );
    }

    #[test]
    fn typing_space_after_markdown_link_converts_it() {
        let doc = markdown::parse("see \\[a\\](http://x.com)");
        let tr = with_state(&doc, Selection::cursor(22), |state| {
            LinkPlugin::default().handle_text_input(state, " ")
        })
        .unwrap();
        assert_eq!(markdown::serialize(tr.doc()), "see [a](http://x.com) ");
        assert_eq!(tr.selection(), Selection::cursor(7));
    }

    #[test]
    fn typing_space_after_url_marks_it() {
        let doc = markdown::parse("go http://x.com");
        let tr = with_state(&doc, Selection::cursor(16), |state| {
            LinkPlugin::default().handle_text_input(state, " ")
        })
        .unwrap();
        assert_eq!(markdown::serialize(tr.doc()), "go <http://x.com> ");
    }

    #[test]
    fn ordinary_typing_is_left_to_the_editor() {
        let doc = markdown::parse("plain");
        let tr = with_state(&doc, Selection::cursor(6), |state| {
            LinkPlugin::default().handle_text_input(state, " ")
        });
        assert!(tr.is_none());
    }

    #[test]
    fn save_with_empty_href_unlinks() {
        let doc = markdown::parse("[old](u)");
        let mut plugin = LinkPlugin {
            state: TooltipState::Editing {
                anchor: StampedPos { pos: 2, version: 0 },
                form: LinkForm {
                    text: "new text".into(),
                    href: " ".into(),
                },
            },
        };
        let tr = with_state(&doc, Selection::cursor(1), |state| plugin.save(state)).unwrap();
        assert_eq!(markdown::serialize(tr.doc()), "new text");
        assert_eq!(tr.selection(), Selection::cursor(9));
    }
}
