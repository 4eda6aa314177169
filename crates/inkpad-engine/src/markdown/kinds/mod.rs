//! # Markdown Kinds
//!
//! Types that own the markdown syntax of one construct, used by both the
//! parser and the serializer.
//!
//! ## Types
//!
//! - **`Footnote`**: `OPEN = b"[^"`, `CLOSE = b']'`, `DEF_SUFFIX = ": "`
//! - **`TaskItem`**: `UNCHECKED = "[ ] "`, `CHECKED = "[x] "`
//! - **`LinkSyntax`**: `[text](href "title")` and `<href>` autolinks
//! - **`CodeSpan`**: `TICK = b'\`'`, fence sizing for inline code and code blocks
//! - **`Emphasis`**: delimiters for strong, em and strike marks
//!
//! The parser and serializer call these constants; they never hardcode `[^`
//! or `- [x]`.

pub mod code_span;
pub mod emphasis;
pub mod footnote;
pub mod link;
pub mod task_item;

pub use code_span::CodeSpan;
pub use emphasis::Emphasis;
pub use footnote::{Footnote, FootnoteSegment};
pub use link::LinkSyntax;
pub use task_item::TaskItem;
