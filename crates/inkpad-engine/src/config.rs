use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning knobs for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Hover-intent delay before a link tooltip is shown.
    pub hover_show_delay_ms: u64,
    /// Grace period before a shown tooltip hides after the pointer leaves.
    pub hover_hide_delay_ms: u64,
    /// Width in pixels of the checkbox band left of a task item's text.
    pub checkbox_hit_width: f32,
    /// Convert typed and pasted link syntax into link marks.
    pub autolink: bool,
    /// How many dispatched transactions stamped positions can be rebased across.
    pub mapping_history: usize,
}

impl EditorConfig {
    pub fn hover_show_delay(&self) -> Duration {
        Duration::from_millis(self.hover_show_delay_ms)
    }

    pub fn hover_hide_delay(&self) -> Duration {
        Duration::from_millis(self.hover_hide_delay_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            hover_show_delay_ms: 500,
            hover_hide_delay_ms: 300,
            checkbox_hit_width: 24.0,
            autolink: true,
            mapping_history: 64,
        }
    }
}
