//! Hover-intent state machine for the link tooltip.
//!
//! ```text
//! Idle --pointer over link--> Hovering --show delay--> Shown --edit--> Editing
//!   ^                            |                       |                |
//!   +------- pointer leaves -----+     hide delay / close / scroll       save
//!   +--------------------------------------------+       ^----------------+
//! ```
//!
//! Every state past `Idle` is keyed by a stamped position inside the link.
//! The editor rebases that position after each change; when it no longer
//! lands on a link the machine falls back to `Idle`.

use std::time::Instant;

use serde::Serialize;

use super::LinkSpan;
use crate::editing::StampedPos;
use crate::plugins::Timer;

/// Contents of the link edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkForm {
    pub text: String,
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TooltipState {
    #[default]
    Idle,
    Hovering {
        anchor: StampedPos,
        show_timer: Timer,
    },
    Shown {
        anchor: StampedPos,
        hide_timer: Timer,
    },
    Editing {
        anchor: StampedPos,
        form: LinkForm,
    },
}

impl TooltipState {
    pub fn anchor(&self) -> Option<StampedPos> {
        match self {
            TooltipState::Idle => None,
            TooltipState::Hovering { anchor, .. }
            | TooltipState::Shown { anchor, .. }
            | TooltipState::Editing { anchor, .. } => Some(*anchor),
        }
    }

    pub fn anchor_mut(&mut self) -> Option<&mut StampedPos> {
        match self {
            TooltipState::Idle => None,
            TooltipState::Hovering { anchor, .. }
            | TooltipState::Shown { anchor, .. }
            | TooltipState::Editing { anchor, .. } => Some(anchor),
        }
    }

    /// Fires due timers: a hover becomes a shown tooltip, a pending hide closes it.
    pub fn tick(&mut self, now: Instant) {
        let next = match self {
            TooltipState::Hovering { anchor, show_timer } => {
                let anchor = *anchor;
                show_timer.fired(now).then_some(TooltipState::Shown {
                    anchor,
                    hide_timer: Timer::default(),
                })
            }
            TooltipState::Shown { hide_timer, .. } => {
                hide_timer.fired(now).then_some(TooltipState::Idle)
            }
            TooltipState::Idle | TooltipState::Editing { .. } => None,
        };
        if let Some(next) = next {
            *self = next;
        }
    }

    /// Drops to `Idle`, cancelling whatever timer was pending.
    pub fn reset(&mut self) {
        match self {
            TooltipState::Hovering { show_timer, .. } => show_timer.cancel(),
            TooltipState::Shown { hide_timer, .. } => hide_timer.cancel(),
            TooltipState::Idle | TooltipState::Editing { .. } => {}
        }
        *self = TooltipState::Idle;
    }
}

/// What the host should render for the tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkTooltip {
    Hidden,
    Shown { link: LinkSpan },
    Editing { link: LinkSpan, form: LinkForm },
}
