use std::collections::BTreeMap;

use super::graph::{GraphEdge, GraphNode, GraphSnapshot, NodeKind};

/// Five-node demonstration graph shown when no snapshot file is given.
pub fn sample_graph() -> GraphSnapshot {
    let node = |id: &str, label: &str, kind: NodeKind| GraphNode {
        id: id.to_owned(),
        label: label.to_owned(),
        kind,
        properties: BTreeMap::new(),
    };
    let edge = |id: &str, source: &str, target: &str, label: &str, weight: f32| GraphEdge {
        id: id.to_owned(),
        source: source.to_owned(),
        target: target.to_owned(),
        label: label.to_owned(),
        weight,
    };

    GraphSnapshot {
        nodes: vec![
            node("1", "User Preferences", NodeKind::Entity),
            node("2", "Dark Mode", NodeKind::Context),
            node("3", "Ingested: User likes dark mode", NodeKind::Experience),
            node("4", "UI Experience", NodeKind::Entity),
            node("5", "Agent Smith", NodeKind::Entity),
        ],
        edges: vec![
            edge("e1", "1", "2", "has_context", 0.8),
            edge("e2", "3", "1", "about_entity", 0.9),
            edge("e3", "3", "2", "contained_context", 0.7),
            edge("e4", "3", "5", "recorded_by", 1.0),
            edge("e5", "4", "1", "related_to", 0.5),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_valid_and_connected() {
        let sample = sample_graph();
        let resolved = sample.resolve().unwrap();
        assert_eq!(sample.node_count(), 5);
        assert_eq!(resolved.edges.len(), 5);

        let mut touched = vec![false; sample.node_count()];
        for edge in &resolved.edges {
            touched[edge.source] = true;
            touched[edge.target] = true;
        }
        assert!(touched.into_iter().all(|seen| seen));
    }
}
