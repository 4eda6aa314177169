//! Position ↔ rendered-region index.
//!
//! The render layer draws one region per block node. Hosts report pointer
//! events as a region plus offsets; plugins turn those back into document
//! positions here instead of inspecting any live UI tree.

use serde::{Deserialize, Serialize};

use crate::model::{Document, NodeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub id: RegionId,
    pub node_type: NodeType,
    /// Position directly before the block.
    pub pos: usize,
    /// Position where the block's content starts.
    pub content_start: usize,
    pub content_size: usize,
    /// Nesting depth below the document root (top-level blocks are 1).
    pub depth: usize,
}

impl Region {
    pub fn content_end(&self) -> usize {
        self.content_start + self.content_size
    }
}

/// Where a pointer event landed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerTarget {
    pub region: RegionId,
    /// Character offset into the region's content under the pointer.
    pub offset: usize,
    /// Horizontal distance in pixels from the region's left edge.
    pub x: f32,
}

/// Block regions of one document snapshot, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderIndex {
    regions: Vec<Region>,
}

impl RenderIndex {
    pub fn build(doc: &Document) -> Self {
        let mut regions = Vec::new();
        let mut depths: Vec<usize> = Vec::new();
        doc.root().descendants(0, &mut |node, pos| {
            if node.node_type().is_inline() {
                return false;
            }
            // Ancestors still open at `pos` are the ones whose content reaches past it.
            while let Some(&end) = depths.last() {
                if pos >= end {
                    depths.pop();
                } else {
                    break;
                }
            }
            let content_start = if node.is_leaf() { pos } else { pos + 1 };
            regions.push(Region {
                id: RegionId(regions.len() as u32),
                node_type: node.node_type(),
                pos,
                content_start,
                content_size: node.content_size(),
                depth: depths.len() + 1,
            });
            depths.push(pos + node.size());
            !node.is_textblock()
        });
        Self { regions }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0 as usize)
    }

    /// Document position for an offset into a region's content, clamped to it.
    pub fn position(&self, id: RegionId, offset: usize) -> Option<usize> {
        let region = self.region(id)?;
        Some(region.content_start + offset.min(region.content_size))
    }

    pub fn target_position(&self, target: &PointerTarget) -> Option<usize> {
        self.position(target.region, target.offset)
    }

    /// Innermost region whose content contains `pos`.
    pub fn region_at(&self, pos: usize) -> Option<RegionId> {
        self.regions
            .iter()
            .filter(|r| r.content_start <= pos && pos <= r.content_end())
            .max_by_key(|r| r.depth)
            .map(|r| r.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeKind};
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        Document::new(Node::element(
            NodeKind::Doc,
            vec![
                Node::element(NodeKind::Paragraph, vec![Node::text("ab")]),
                Node::element(
                    NodeKind::BulletList,
                    vec![Node::element(
                        NodeKind::ListItem {
                            checked: Some(false),
                        },
                        vec![Node::element(NodeKind::Paragraph, vec![Node::text("c")])],
                    )],
                ),
            ],
        ))
        .unwrap()
    }

    #[test]
    fn every_block_gets_a_region_in_document_order() {
        let index = RenderIndex::build(&doc());
        let kinds: Vec<_> = index
            .regions()
            .iter()
            .map(|r| (r.node_type, r.pos, r.depth))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (NodeType::Paragraph, 0, 1),
                (NodeType::BulletList, 4, 1),
                (NodeType::ListItem, 5, 2),
                (NodeType::Paragraph, 6, 3),
            ]
        );
    }

    #[test]
    fn positions_round_trip_through_regions() {
        let index = RenderIndex::build(&doc());
        assert_eq!(index.position(RegionId(3), 0), Some(7));
        assert_eq!(index.position(RegionId(3), 99), Some(8));
        assert_eq!(index.region_at(7), Some(RegionId(3)));
        assert_eq!(index.region_at(2), Some(RegionId(0)));
        assert_eq!(index.position(RegionId(9), 0), None);
    }
}
