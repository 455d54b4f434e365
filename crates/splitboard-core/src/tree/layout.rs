//! Rank-based top-to-bottom auto-layout.
//!
//! Computes a position for every node, then applies it only where the
//! stored position is absent or the `(0,0)` sentinel. User-dragged
//! positions always win.

use std::collections::HashMap;

use crate::models::{ChatNode, Position};

const NODE_SPACING_X: f64 = 180.0;
const RANK_SPACING_Y: f64 = 120.0;

fn rank_of(structure: &[ChatNode], node: &ChatNode) -> usize {
    // Walk to the root; bounded by node count to survive a cyclic parent
    // link in corrupted data.
    let mut rank = 0;
    let mut current = node;
    while let Some(parent_id) = current.parent_id.as_deref() {
        match structure.iter().find(|n| n.id == parent_id) {
            Some(parent) if rank < structure.len() => {
                rank += 1;
                current = parent;
            }
            _ => break,
        }
    }
    rank
}

/// Assign layered positions to nodes that have never been placed.
pub fn assign_positions(structure: &mut [ChatNode]) {
    let ranks: Vec<usize> = structure.iter().map(|n| rank_of(structure, n)).collect();

    let mut rank_counts: HashMap<usize, usize> = HashMap::new();
    for &rank in &ranks {
        *rank_counts.entry(rank).or_default() += 1;
    }

    let mut rank_cursor: HashMap<usize, usize> = HashMap::new();
    for (idx, node) in structure.iter_mut().enumerate() {
        let rank = ranks[idx];
        let slot = {
            let cursor = rank_cursor.entry(rank).or_default();
            let slot = *cursor;
            *cursor += 1;
            slot
        };

        let placed = node.position.map(|p| !p.is_unset()).unwrap_or(false);
        if placed {
            continue;
        }

        let count = rank_counts[&rank] as f64;
        node.position = Some(Position {
            x: (slot as f64 - (count - 1.0) / 2.0) * NODE_SPACING_X,
            y: rank as f64 * RANK_SPACING_Y,
        });
    }
}
