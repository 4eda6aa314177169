/*!
 * # Editing Core
 *
 * The transactional half of the engine: everything that changes a
 * [`Document`](crate::model::Document) goes through here.
 *
 * ## Architecture Overview
 *
 * ### 1. Immutable documents, one owner
 * - A document value never changes; a change produces a new document
 * - The [`Editor`] session is the only owner of the current document and its version
 *
 * ### 2. Steps and transactions
 * - A **`Step`** is a primitive change (insert text, delete, add/remove mark, set node
 *   attrs, insert node, split) that reports a **`StepMap`**
 * - A **`Transaction`** applies steps one after another to a working copy and composes
 *   their maps into a **`Mapping`**; the first failing step poisons it
 * - Dispatch is atomic: either every step lands or the document is untouched
 *
 * ### 3. Plugins and follow-ups
 * - Input, paste and pointer events are offered to plugins first
 * - After every dispatch, plugins may append follow-up transactions
 *   (link auto-collapse, tooltip anchor rebasing)
 *
 * ### 4. Positions across time
 * - **`StampedPos`** remembers the version a position was taken at; the editor
 *   rebases it through its bounded mapping history or reports it stale
 *
 * ### 5. Rendering
 * - **`RenderIndex`** maps block nodes to host regions and back, so pointer events
 *   arrive as `(RegionId, x)` and leave as document positions
 *
 * ## Module Structure
 *
 * - **`mapping`**: `StepMap`, `Mapping` and position association
 * - **`step`**: primitive steps and their application
 * - **`transaction`**: step batching, selection tracking, poisoning
 * - **`selection`**: anchor/head selections that map through changes
 * - **`commands`**: user-level edits built from steps
 * - **`render`**: position to region index
 * - **`events`**: change notifications and host events
 * - **`patch`**: what a dispatch reports back to the host
 * - **`editor`**: the session tying it all together
 *
 * ## Usage Pattern
 *
 * ```rust
 * use inkpad_engine::config::EditorConfig;
 * use inkpad_engine::editing::*;
 *
 * // 1. Open a session over markdown
 * let mut editor = Editor::from_markdown("Hello", EditorConfig::default());
 *
 * // 2. Build a transaction and dispatch it
 * let mut tr = editor.transaction();
 * tr.insert_text(6, " world", None).unwrap();
 * let patch = editor.dispatch(tr).unwrap();
 * assert_eq!(patch.version, 1);
 *
 * // 3. Serialize back to markdown
 * assert_eq!(editor.to_markdown(), "Hello world");
 * ```
 */

pub mod commands;
pub mod editor;
pub mod events;
pub mod mapping;
pub mod patch;
pub mod render;
pub mod selection;
pub mod step;
pub mod transaction;

pub use editor::{Editor, EditorState, PluginId, StampedPos};
pub use events::{ChangeEvent, HostEvent, HostEventKind, Key, SubscriptionId};
pub use mapping::{Assoc, ChangedRange, MapResult, Mapping, StepMap};
pub use patch::Patch;
pub use render::{PointerTarget, Region, RegionId, RenderIndex};
pub use selection::Selection;
pub use step::Step;
pub use transaction::Transaction;
