use std::collections::VecDeque;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::commands;
use super::events::{ChangeEvent, HostEvent, HostEventKind, SubscriptionId};
use super::mapping::Mapping;
use super::patch::Patch;
use super::render::{PointerTarget, RenderIndex};
use super::selection::Selection;
use super::transaction::Transaction;
use crate::config::EditorConfig;
use crate::error::{EditError, EditResult};
use crate::markdown;
use crate::model::{Document, Mark};
use crate::plugins::{FootnotePlugin, LinkPlugin, LinkTooltip, Plugin, TaskPlugin, TooltipState};

/// Follow-up rounds plugins get per dispatch before the rest is dropped.
const MAX_APPEND_ROUNDS: usize = 8;

/// A position together with the document version it was taken at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StampedPos {
    pub pos: usize,
    pub version: u64,
}

/// Read-only view of the session handed to plugins.
#[derive(Debug, Clone, Copy)]
pub struct EditorState<'a> {
    pub doc: &'a Document,
    pub selection: Selection,
    pub version: u64,
    pub render: &'a RenderIndex,
    pub config: &'a EditorConfig,
}

impl EditorState<'_> {
    /// An empty transaction against this state.
    pub fn transaction(&self) -> Transaction {
        Transaction::new(self.doc, self.selection, self.version)
    }

    pub fn stamp(&self, pos: usize) -> StampedPos {
        StampedPos {
            pos,
            version: self.version,
        }
    }
}

/// The plugins of a session, in the order their hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PluginId {
    Links,
    Footnotes,
    Tasks,
}

impl PluginId {
    pub const ALL: [PluginId; 3] = [PluginId::Links, PluginId::Footnotes, PluginId::Tasks];
}

#[derive(Debug, Default)]
struct Plugins {
    links: LinkPlugin,
    footnotes: FootnotePlugin,
    tasks: TaskPlugin,
}

impl Plugins {
    fn get_mut(&mut self, id: PluginId) -> &mut dyn Plugin {
        match id {
            PluginId::Links => &mut self.links,
            PluginId::Footnotes => &mut self.footnotes,
            PluginId::Tasks => &mut self.tasks,
        }
    }
}

/// The document-owning half of the editor, kept apart from the plugins so
/// both can be borrowed at once.
#[derive(Debug)]
struct Session {
    doc: Document,
    selection: Selection,
    version: u64,
    render: RenderIndex,
    config: EditorConfig,
}

impl Session {
    fn state(&self) -> EditorState<'_> {
        EditorState {
            doc: &self.doc,
            selection: self.selection,
            version: self.version,
            render: &self.render,
            config: &self.config,
        }
    }
}

type Observer = Box<dyn FnMut(&ChangeEvent, &Document)>;

/// One editing session: the only owner of the document.
///
/// Every change goes through [`Editor::dispatch`]:
///
/// 1. the transaction is committed atomically, or rejected with the document untouched
/// 2. observers and plugins are notified synchronously, in subscription order
/// 3. plugins may append follow-up transactions, which go through the same steps
///
/// ## Usage
///
/// ```rust
/// use inkpad_engine::editing::{Editor, Selection};
/// use inkpad_engine::config::EditorConfig;
///
/// let mut editor = Editor::from_markdown("- [ ] write docs", EditorConfig::default());
/// editor.set_selection(Selection::cursor(13)).unwrap();
/// editor.type_text(" today").unwrap();
/// editor.toggle_task(3).unwrap();
/// assert_eq!(editor.to_markdown(), "- [x] write docs today");
/// ```
pub struct Editor {
    session: Session,
    plugins: Plugins,
    /// Mappings of recent dispatches, keyed by the version they start from.
    history: VecDeque<(u64, Mapping)>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
    /// Host events each plugin registered for on attach.
    listeners: Vec<(PluginId, HostEventKind)>,
    attached: bool,
}

impl Editor {
    /// Starts a session and attaches the plugins.
    pub fn new(doc: Document, config: EditorConfig) -> Self {
        let render = RenderIndex::build(&doc);
        let selection = Selection::cursor(doc.textblocks().first().map_or(0, |(start, _)| *start));
        let mut editor = Self {
            session: Session {
                doc,
                selection,
                version: 0,
                render,
                config,
            },
            plugins: Plugins::default(),
            history: VecDeque::new(),
            observers: Vec::new(),
            next_subscription: 0,
            listeners: Vec::new(),
            attached: false,
        };
        editor.attach();
        editor
    }

    pub fn from_markdown(markdown: &str, config: EditorConfig) -> Self {
        Self::new(markdown::parse(markdown), config)
    }

    pub fn to_markdown(&self) -> String {
        markdown::serialize(&self.session.doc)
    }

    pub fn doc(&self) -> &Document {
        &self.session.doc
    }

    pub fn selection(&self) -> Selection {
        self.session.selection
    }

    pub fn version(&self) -> u64 {
        self.session.version
    }

    pub fn render_index(&self) -> &RenderIndex {
        &self.session.render
    }

    pub fn config(&self) -> &EditorConfig {
        &self.session.config
    }

    pub fn state(&self) -> EditorState<'_> {
        self.session.state()
    }

    /// An empty transaction against the current document.
    pub fn transaction(&self) -> Transaction {
        self.session.state().transaction()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn listeners(&self) -> &[(PluginId, HostEventKind)] {
        &self.listeners
    }

    fn attach(&mut self) {
        let state = self.session.state();
        for id in PluginId::ALL {
            let kinds = self.plugins.get_mut(id).attach(&state);
            self.listeners.extend(kinds.into_iter().map(|kind| (id, kind)));
        }
        self.attached = true;
        debug!("editor attached with {} host listeners", self.listeners.len());
    }

    /// Detaches every plugin, cancelling their timers and dropping their
    /// host listeners. Runs at most once; dropping the editor calls it too.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        for id in PluginId::ALL {
            self.plugins.get_mut(id).detach();
        }
        self.listeners.clear();
        self.attached = false;
        debug!("editor detached");
    }

    /// Registers an observer called after every successful dispatch.
    pub fn subscribe(&mut self, observer: impl FnMut(&ChangeEvent, &Document) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    pub fn stamp(&self, pos: usize) -> EditResult<StampedPos> {
        self.session.doc.check_pos(pos)?;
        Ok(self.session.state().stamp(pos))
    }

    /// Returns the position if it was stamped at the current version.
    pub fn check(&self, stamped: StampedPos) -> EditResult<usize> {
        if stamped.version != self.session.version {
            return Err(EditError::StalePosition {
                stamped: stamped.version,
                current: self.session.version,
            });
        }
        self.session.doc.check_pos(stamped.pos)?;
        Ok(stamped.pos)
    }

    /// Maps a stamped position onto the current document through the
    /// mapping history.
    pub fn rebase(&self, stamped: StampedPos) -> EditResult<usize> {
        let current = self.session.version;
        let stale = EditError::StalePosition {
            stamped: stamped.version,
            current,
        };
        if stamped.version > current {
            return Err(stale);
        }
        let oldest = self.history.front().map_or(current, |(version, _)| *version);
        if stamped.version < oldest {
            return Err(stale);
        }
        let pos = self
            .history
            .iter()
            .filter(|(version, _)| *version >= stamped.version)
            .fold(stamped.pos, |pos, (_, mapping)| mapping.map(pos));
        self.session.doc.check_pos(pos)?;
        Ok(pos)
    }

    /// Applies a transaction and lets plugins respond to it.
    ///
    /// A failed or stale transaction leaves the document exactly as it was.
    /// Follow-up transactions from plugins that fail are logged and dropped.
    pub fn dispatch(&mut self, tr: Transaction) -> EditResult<Patch> {
        let mut combined = Mapping::new();
        let mut queue = VecDeque::new();
        if let Some(event) = self.commit(tr)? {
            combined.extend(&event.mapping);
            queue.push_back(event);
        }

        let mut rounds = 0;
        while let Some(event) = queue.pop_front() {
            if rounds == MAX_APPEND_ROUNDS {
                warn!("plugins kept appending transactions, stopped after {rounds} rounds");
                break;
            }
            rounds += 1;
            for id in PluginId::ALL {
                let state = self.session.state();
                let Some(tr) = self.plugins.get_mut(id).append_transaction(&state, &event) else {
                    continue;
                };
                match self.commit(tr) {
                    Ok(Some(next)) => {
                        combined.extend(&next.mapping);
                        queue.push_back(next);
                    }
                    Ok(None) => {}
                    Err(err) => warn!("{id:?}: appended transaction dropped: {err}"),
                }
            }
        }

        Ok(Patch {
            changed: combined.changed_ranges(),
            new_selection: self.session.selection,
            version: self.session.version,
        })
    }

    fn commit(&mut self, tr: Transaction) -> EditResult<Option<ChangeEvent>> {
        if let Some(err) = tr.error() {
            return Err(EditError::TransactionFailed(Box::new(err.clone())));
        }
        let current = self.session.version;
        if tr.started_at() != current {
            return Err(EditError::StaleTransaction {
                started: tr.started_at(),
                current,
            });
        }
        let origin = tr.origin();
        let doc_changed = tr.doc_changed();
        let (doc, mapping, selection, _) = tr.into_parts();
        let selection_changed = selection != self.session.selection;
        if !doc_changed && !selection_changed {
            return Ok(None);
        }

        if doc_changed {
            self.session.doc = doc;
            self.session.render = RenderIndex::build(&self.session.doc);
        }
        self.session.selection = selection;
        self.session.version += 1;
        self.history.push_back((current, mapping.clone()));
        while self.history.len() > self.session.config.mapping_history {
            self.history.pop_front();
        }
        debug!(
            "{origin} transaction committed: version {} -> {}, doc changed: {doc_changed}",
            current, self.session.version
        );

        let event = ChangeEvent {
            previous_version: current,
            version: self.session.version,
            doc_changed,
            selection_changed,
            selection,
            mapping,
            origin,
        };
        for (_, observer) in &mut self.observers {
            observer(&event, &self.session.doc);
        }
        Ok(Some(event))
    }

    /// First transaction a plugin offers for an input, in plugin order.
    fn from_plugins(
        &mut self,
        mut hook: impl FnMut(&mut dyn Plugin, &EditorState<'_>) -> Option<Transaction>,
    ) -> Option<Transaction> {
        let state = self.session.state();
        PluginId::ALL
            .into_iter()
            .find_map(|id| hook(self.plugins.get_mut(id), &state))
    }

    /// Typed text. Plugins get the first chance to turn it into structure.
    pub fn type_text(&mut self, text: &str) -> EditResult<Patch> {
        let tr = match self.from_plugins(|plugin, state| plugin.handle_text_input(state, text)) {
            Some(tr) => tr,
            None => {
                let mut tr = self.transaction();
                commands::insert_text(&mut tr, text)?;
                tr
            }
        };
        self.dispatch(tr)
    }

    pub fn paste(&mut self, text: &str) -> EditResult<Patch> {
        let tr = match self.from_plugins(|plugin, state| plugin.handle_paste(state, text)) {
            Some(tr) => tr,
            None => {
                let mut tr = self.transaction();
                tr.set_origin("paste");
                commands::insert_text(&mut tr, text)?;
                tr
            }
        };
        self.dispatch(tr)
    }

    pub fn press_enter(&mut self) -> EditResult<Patch> {
        let mut tr = self.transaction();
        commands::split_block(&mut tr)?;
        self.dispatch(tr)
    }

    pub fn delete_backward(&mut self) -> EditResult<Patch> {
        let mut tr = self.transaction();
        commands::delete_backward(&mut tr)?;
        self.dispatch(tr)
    }

    pub fn toggle_mark(&mut self, mark: Mark) -> EditResult<Patch> {
        let mut tr = self.transaction();
        commands::toggle_mark(&mut tr, mark)?;
        self.dispatch(tr)
    }

    /// Flips the task item around `pos`; a no-op for anything else.
    pub fn toggle_task(&mut self, pos: usize) -> EditResult<Patch> {
        let mut tr = self.transaction();
        tr.set_origin("tasks");
        commands::toggle_task(&mut tr, pos)?;
        self.dispatch(tr)
    }

    /// Inserts a footnote reference at the selection. Returns the id used.
    pub fn insert_footnote(&mut self, id: Option<&str>) -> EditResult<(String, Patch)> {
        let mut tr = self.transaction();
        tr.set_origin("footnotes");
        let id = commands::insert_footnote(&mut tr, id)?;
        Ok((id, self.dispatch(tr)?))
    }

    pub fn set_selection(&mut self, selection: Selection) -> EditResult<Patch> {
        let mut tr = self.transaction();
        tr.set_origin("selection");
        tr.set_selection(selection)?;
        self.dispatch(tr)
    }

    /// A pointer press inside the document. Returns whether a plugin handled it.
    pub fn pointer_down(&mut self, target: PointerTarget) -> EditResult<bool> {
        match self.from_plugins(|plugin, state| plugin.handle_pointer_down(state, &target)) {
            Some(tr) => {
                self.dispatch(tr)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Forwards a host event to the plugins that registered for its kind.
    pub fn handle_host_event(&mut self, event: HostEvent) -> EditResult<Option<Patch>> {
        let kind = event.kind();
        let ids: Vec<PluginId> = self
            .listeners
            .iter()
            .filter(|(_, k)| *k == kind)
            .map(|(id, _)| *id)
            .collect();
        let mut patch = None;
        for id in ids {
            let state = self.session.state();
            if let Some(tr) = self.plugins.get_mut(id).handle_host_event(&state, &event) {
                patch = Some(self.dispatch(tr)?);
            }
        }
        Ok(patch)
    }

    pub fn link_state(&self) -> &TooltipState {
        self.plugins.links.state()
    }

    /// What the host should render for the link tooltip.
    pub fn link_tooltip(&self) -> LinkTooltip {
        self.plugins.links.tooltip(&self.session.doc)
    }

    /// Opens the edit form of the shown link tooltip.
    pub fn edit_link(&mut self) -> bool {
        self.plugins.links.edit(&self.session.doc)
    }

    pub fn set_link_form(&mut self, text: &str, href: &str) -> bool {
        self.plugins.links.set_form(text, href)
    }

    pub fn save_link(&mut self) -> EditResult<Option<Patch>> {
        let tr = self.plugins.links.save(&self.session.state());
        tr.map(|tr| self.dispatch(tr)).transpose()
    }

    /// Closes the link tooltip, saving an open form.
    pub fn close_link(&mut self) -> EditResult<Option<Patch>> {
        let tr = self.plugins.links.close(&self.session.state());
        tr.map(|tr| self.dispatch(tr)).transpose()
    }

    pub fn unlink(&mut self) -> EditResult<Option<Patch>> {
        let tr = self.plugins.links.unlink(&self.session.state());
        tr.map(|tr| self.dispatch(tr)).transpose()
    }

    pub fn remove_link(&mut self) -> EditResult<Option<Patch>> {
        let tr = self.plugins.links.remove(&self.session.state());
        tr.map(|tr| self.dispatch(tr)).transpose()
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("session", &self.session)
            .field("observers", &self.observers.len())
            .field("listeners", &self.listeners)
            .field("attached", &self.attached)
            .finish()
    }
}
