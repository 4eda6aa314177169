use std::time::Instant;

use serde::Serialize;

use super::mapping::Mapping;
use super::render::PointerTarget;
use super::selection::Selection;

/// Delivered synchronously to observers and plugins after every dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    /// Version before the transaction.
    pub previous_version: u64,
    pub version: u64,
    pub doc_changed: bool,
    pub selection_changed: bool,
    pub selection: Selection,
    /// Rebases positions of the previous version onto this one.
    pub mapping: Mapping,
    pub origin: &'static str,
}

/// Identifies an observer registered with [`crate::editing::Editor::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Key {
    Escape,
    Enter,
    Backspace,
    Other,
}

/// Events the host forwards from outside the document surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    Scroll,
    KeyDown(Key),
    /// A pointer press anywhere outside the editor's own widgets.
    PointerDownOutside,
    /// The pointer moved over the document; `None` when it left it.
    PointerMove(Option<PointerTarget>, Instant),
    /// Time passed; due timers fire.
    Tick(Instant),
}

/// The listener categories a plugin can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum HostEventKind {
    Scroll,
    KeyDown,
    PointerDownOutside,
    PointerMove,
    Tick,
}

impl HostEvent {
    pub fn kind(&self) -> HostEventKind {
        match self {
            HostEvent::Scroll => HostEventKind::Scroll,
            HostEvent::KeyDown(_) => HostEventKind::KeyDown,
            HostEvent::PointerDownOutside => HostEventKind::PointerDownOutside,
            HostEvent::PointerMove(..) => HostEventKind::PointerMove,
            HostEvent::Tick(_) => HostEventKind::Tick,
        }
    }
}
