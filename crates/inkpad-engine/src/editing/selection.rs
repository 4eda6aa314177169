use serde::{Deserialize, Serialize};

use super::mapping::{Assoc, Mapping};

/// A text selection. `anchor` stays put while `head` follows the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.from()..self.to()
    }

    /// Whether `pos` lies inside the selection, ends included.
    pub fn touches(&self, pos: usize) -> bool {
        self.from() <= pos && pos <= self.to()
    }

    pub fn map(&self, mapping: &Mapping) -> Self {
        if self.is_empty() {
            return Self::cursor(mapping.map(self.head));
        }
        let (from_assoc, to_assoc) = (Assoc::After, Assoc::Before);
        let map_end = |pos: usize| {
            if pos == self.from() {
                mapping.map_assoc(pos, from_assoc)
            } else {
                mapping.map_assoc(pos, to_assoc)
            }
        };
        let anchor = map_end(self.anchor);
        let head = map_end(self.head);
        Self { anchor, head }
    }

    /// Clamps both ends into a document of `size`.
    pub fn clamp(&self, size: usize) -> Self {
        Self::new(self.anchor.min(size), self.head.min(size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::mapping::StepMap;

    #[test]
    fn cursor_moves_past_text_typed_at_it() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::insertion(3, 2));
        assert_eq!(Selection::cursor(3).map(&mapping), Selection::cursor(5));
    }

    #[test]
    fn range_does_not_grow_from_inserts_at_its_edges() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::insertion(2, 1));
        mapping.push(StepMap::insertion(6, 1));
        // [2, 5) -> start pushed by the first insert, end untouched by the second
        assert_eq!(Selection::new(2, 5).map(&mapping), Selection::new(3, 6));
    }

    #[test]
    fn from_and_to_are_ordered() {
        let sel = Selection::new(9, 4);
        assert_eq!(sel.range(), 4..9);
        assert!(sel.touches(9));
        assert!(!sel.touches(10));
    }
}
