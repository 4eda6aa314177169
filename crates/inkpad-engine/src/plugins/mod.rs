//! # Plugins
//!
//! Structured behaviour layered on top of free-form text. A plugin never
//! mutates the document: each hook may return a [`Transaction`] built
//! against the state it was given, and the editor dispatches it.
//!
//! - **`links`**: link recognition while typing and pasting, auto-collapse of
//!   raw `[text](url)`, and the hover/edit tooltip state machine
//! - **`footnotes`**: `[^id]` typed inline becomes a footnote reference
//! - **`tasks`**: pointer-down on a task item's checkbox band flips it

pub mod footnotes;
pub mod links;
pub mod tasks;

use std::time::Instant;

use log::warn;

use crate::editing::{ChangeEvent, EditorState, HostEvent, HostEventKind, PointerTarget, Transaction};
use crate::error::EditResult;

pub use footnotes::FootnotePlugin;
pub use links::{LinkPlugin, LinkTooltip, TooltipState};
pub use tasks::{TaskEntry, TaskPlugin, task_items};

/// Hooks the editor calls on a plugin. Every hook defaults to doing nothing.
///
/// Errors never leave a plugin: hooks that build transactions run them
/// through [`contain`] and report "unhandled" instead.
pub trait Plugin {
    fn name(&self) -> &'static str;

    /// Called once when the editor session starts. Returns the host events
    /// the plugin listens to for as long as it stays attached.
    fn attach(&mut self, _state: &EditorState<'_>) -> Vec<HostEventKind> {
        Vec::new()
    }

    /// Called exactly once when the session ends. Must cancel owned timers.
    fn detach(&mut self) {}

    fn handle_text_input(&mut self, _state: &EditorState<'_>, _text: &str) -> Option<Transaction> {
        None
    }

    fn handle_paste(&mut self, _state: &EditorState<'_>, _text: &str) -> Option<Transaction> {
        None
    }

    fn handle_pointer_down(
        &mut self,
        _state: &EditorState<'_>,
        _target: &PointerTarget,
    ) -> Option<Transaction> {
        None
    }

    /// Only called for event kinds returned from [`Plugin::attach`].
    fn handle_host_event(
        &mut self,
        _state: &EditorState<'_>,
        _event: &HostEvent,
    ) -> Option<Transaction> {
        None
    }

    /// Observes every dispatched change and may respond with a follow-up transaction.
    fn append_transaction(
        &mut self,
        _state: &EditorState<'_>,
        _event: &ChangeEvent,
    ) -> Option<Transaction> {
        None
    }
}

/// Turns a failed plugin edit into "unhandled", logging the cause.
pub(crate) fn contain<T>(plugin: &str, result: EditResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("{plugin}: edit skipped: {err}");
            None
        }
    }
}

/// A cancellable deadline. Fires at most once per start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub fn started(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn start(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` once when `now` has reached the deadline, clearing it.
    pub fn fired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
