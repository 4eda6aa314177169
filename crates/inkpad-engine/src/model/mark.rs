use serde::{Deserialize, Serialize};

/// An inline overlay on a run of text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mark {
    Link {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Strong,
    Em,
    Strike,
    Code,
}

/// Mark kinds without their attributes.
///
/// Declaration order is the nesting order used by the serializer: links are
/// opened outermost, code innermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkType {
    Link,
    Strong,
    Em,
    Strike,
    Code,
}

impl MarkType {
    /// Whether text typed directly after a run carrying this mark inherits it.
    pub fn inclusive(self) -> bool {
        !matches!(self, MarkType::Link | MarkType::Code)
    }
}

impl Mark {
    pub fn link(href: impl Into<String>) -> Self {
        Mark::Link {
            href: href.into(),
            title: None,
        }
    }

    pub fn mark_type(&self) -> MarkType {
        match self {
            Mark::Link { .. } => MarkType::Link,
            Mark::Strong => MarkType::Strong,
            Mark::Em => MarkType::Em,
            Mark::Strike => MarkType::Strike,
            Mark::Code => MarkType::Code,
        }
    }

    pub fn href(&self) -> Option<&str> {
        match self {
            Mark::Link { href, .. } => Some(href),
            _ => None,
        }
    }
}

/// The set of marks on one text run.
///
/// Holds at most one mark per [`MarkType`], sorted by type. Adding a mark of a
/// type that is already present replaces it, so two links with different
/// hrefs can never coexist on the same characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.0.iter()
    }

    pub fn get(&self, mark_type: MarkType) -> Option<&Mark> {
        self.0.iter().find(|m| m.mark_type() == mark_type)
    }

    pub fn has(&self, mark_type: MarkType) -> bool {
        self.get(mark_type).is_some()
    }

    pub fn contains(&self, mark: &Mark) -> bool {
        self.0.iter().any(|m| m == mark)
    }

    pub fn link_href(&self) -> Option<&str> {
        self.get(MarkType::Link).and_then(Mark::href)
    }

    /// Adds `mark`, replacing any existing mark of the same type.
    pub fn add(&mut self, mark: Mark) {
        let ty = mark.mark_type();
        match self.0.binary_search_by_key(&ty, Mark::mark_type) {
            Ok(idx) => self.0[idx] = mark,
            Err(idx) => self.0.insert(idx, mark),
        }
    }

    pub fn remove(&mut self, mark_type: MarkType) -> Option<Mark> {
        let idx = self.0.iter().position(|m| m.mark_type() == mark_type)?;
        Some(self.0.remove(idx))
    }

    pub fn with(mut self, mark: Mark) -> Self {
        self.add(mark);
        self
    }

    pub fn without(mut self, mark_type: MarkType) -> Self {
        self.remove(mark_type);
        self
    }

    /// The subset of marks that typed text inherits.
    pub fn inclusive(&self) -> MarkSet {
        Self(
            self.0
                .iter()
                .filter(|m| m.mark_type().inclusive())
                .cloned()
                .collect(),
        )
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        marks.into_iter().collect()
    }
}

impl From<MarkSet> for Vec<Mark> {
    fn from(set: MarkSet) -> Self {
        set.0
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        let mut set = MarkSet::empty();
        for mark in iter {
            set.add(mark);
        }
        set
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
