use serde::Serialize;

/// Which side a position sticks to when content is inserted exactly at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    /// Stay before the inserted content.
    Before,
    /// Move past the inserted content.
    #[default]
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// The position sat strictly inside a range that was removed.
    pub deleted: bool,
}

/// `old_size` units at `start` (old coordinates) were replaced by `new_size` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangedRange {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

/// The position changes made by one step.
///
/// Ranges are sorted and expressed in the coordinates of the document the
/// step was applied to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepMap {
    ranges: Vec<ChangedRange>,
}

impl StepMap {
    /// A map for steps that do not move positions (mark and attribute changes).
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn new(ranges: Vec<ChangedRange>) -> Self {
        let ranges = ranges
            .into_iter()
            .filter(|r| r.old_size != 0 || r.new_size != 0)
            .collect();
        Self { ranges }
    }

    pub fn insertion(at: usize, size: usize) -> Self {
        Self::new(vec![ChangedRange {
            start: at,
            old_size: 0,
            new_size: size,
        }])
    }

    pub fn deletion(from: usize, to: usize) -> Self {
        Self::new(vec![ChangedRange {
            start: from,
            old_size: to - from,
            new_size: 0,
        }])
    }

    pub fn ranges(&self) -> &[ChangedRange] {
        &self.ranges
    }

    pub fn is_identity(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut diff: isize = 0;
        for range in &self.ranges {
            if range.start > pos {
                break;
            }
            let end = range.start + range.old_size;
            if pos <= end {
                let side = if range.old_size == 0 {
                    assoc
                } else if pos == range.start {
                    Assoc::Before
                } else if pos == end {
                    Assoc::After
                } else {
                    assoc
                };
                let base = offset(range.start, diff);
                let mapped = match side {
                    Assoc::Before => base,
                    Assoc::After if range.new_size == 0 => base,
                    Assoc::After => base + range.new_size,
                };
                let deleted = range.old_size > 0 && pos > range.start && pos < end;
                return MapResult {
                    pos: mapped,
                    deleted,
                };
            }
            diff += range.new_size as isize - range.old_size as isize;
        }
        MapResult {
            pos: offset(pos, diff),
            deleted: false,
        }
    }
}

fn offset(pos: usize, diff: isize) -> usize {
    pos.saturating_add_signed(diff)
}

/// The composed step maps of one transaction (or of several, in order).
///
/// Positions recorded against the document a transaction started from are
/// mapped through every step to find their place in the resulting document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn extend(&mut self, other: &Mapping) {
        self.maps.extend(other.maps.iter().cloned());
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn is_identity(&self) -> bool {
        self.maps.iter().all(StepMap::is_identity)
    }

    /// Maps with [`Assoc::After`]: content inserted at a position pushes it forward.
    pub fn map(&self, pos: usize) -> usize {
        self.map_assoc(pos, Assoc::After)
    }

    pub fn map_assoc(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut deleted = false;
        let mut pos = pos;
        for map in &self.maps {
            let result = map.map_result(pos, assoc);
            deleted |= result.deleted;
            pos = result.pos;
        }
        MapResult { pos, deleted }
    }

    /// Ranges of the final document touched by any step.
    pub fn changed_ranges(&self) -> Vec<std::ops::Range<usize>> {
        let mut out: Vec<std::ops::Range<usize>> = Vec::new();
        for (i, map) in self.maps.iter().enumerate() {
            let rest = Mapping {
                maps: self.maps[i + 1..].to_vec(),
            };
            let mut diff: isize = 0;
            for range in map.ranges() {
                let start = offset(range.start, diff);
                let end = start + range.new_size;
                out.push(rest.map_assoc(start, Assoc::Before)..rest.map(end));
                diff += range.new_size as isize - range.old_size as isize;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(4, 4)]
    #[case(5, 8)]
    #[case(9, 12)]
    fn insertion_shifts_positions_at_or_after_the_insert(#[case] pos: usize, #[case] expected: usize) {
        let map = StepMap::insertion(5, 3);
        assert_eq!(map.map_result(pos, Assoc::After).pos, expected);
    }

    #[test]
    fn insertion_with_before_assoc_stays_put() {
        let map = StepMap::insertion(5, 3);
        assert_eq!(map.map_result(5, Assoc::Before).pos, 5);
    }

    #[rstest]
    #[case(1, 1, false)]
    #[case(2, 2, false)]
    #[case(4, 2, true)]
    #[case(6, 2, false)]
    #[case(9, 5, false)]
    fn deletion_collapses_to_its_start(
        #[case] pos: usize,
        #[case] expected: usize,
        #[case] deleted: bool,
    ) {
        let map = StepMap::deletion(2, 6);
        assert_eq!(
            map.map_result(pos, Assoc::After),
            MapResult {
                pos: expected,
                deleted
            }
        );
    }

    #[test]
    fn mapping_composes_steps_in_order() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::insertion(0, 2));
        mapping.push(StepMap::deletion(4, 6));
        // 3 -> 5 (insert) -> 4 (deleted range collapses to its start)
        assert_eq!(mapping.map(3), 4);
        // 10 -> 12 -> 10
        assert_eq!(mapping.map(10), 10);
        assert!(mapping.map_result(3, Assoc::After).deleted);
    }

    #[test]
    fn identity_maps_leave_positions_alone() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::identity());
        assert!(mapping.is_identity());
        assert_eq!(mapping.map(7), 7);
    }

    #[test]
    fn changed_ranges_are_reported_in_final_coordinates() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::insertion(3, 2));
        mapping.push(StepMap::insertion(0, 1));
        assert_eq!(mapping.changed_ranges(), vec![4..6, 0..1]);
    }
}
