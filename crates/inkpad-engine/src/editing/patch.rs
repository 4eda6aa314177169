use super::selection::Selection;

/// Result of dispatching a transaction, including any transactions plugins
/// appended in response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Ranges of the new document touched by the dispatch.
    pub changed: Vec<std::ops::Range<usize>>,
    pub new_selection: Selection,
    pub version: u64,
}
