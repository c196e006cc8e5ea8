//! Canvas auto-layout: connect nodes top to bottom.

use crate::models::{CanvasNode, Edge};

pub const EDGE_TYPE: &str = "smoothstep";

/// Chain every node to the one below it.
///
/// Nodes are ordered by `position.y`; nodes at the same height keep their
/// input order. The result replaces any previous edge set.
pub fn auto_connect(nodes: &[CanvasNode]) -> Vec<Edge> {
    if nodes.len() < 2 {
        return Vec::new();
    }

    let mut ordered: Vec<&CanvasNode> = nodes.iter().collect();
    ordered.sort_by(|a, b| a.position.y.total_cmp(&b.position.y));

    ordered
        .windows(2)
        .map(|pair| Edge {
            id: format!("{}-{}", pair[0].id, pair[1].id),
            source: pair[0].id.clone(),
            target: pair[1].id.clone(),
            edge_type: EDGE_TYPE.to_string(),
            animated: true,
        })
        .collect()
}
