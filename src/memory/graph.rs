use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{Endpoint, GraphError};

/// Memory category of a node. Governs rendering only, never physics.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Entity,
    Experience,
    Context,
    Other(String),
}

impl NodeKind {
    pub fn label(&self) -> &str {
        match self {
            Self::Entity => "Entity",
            Self::Experience => "Experience",
            Self::Context => "Context",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl From<String> for NodeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Entity" => Self::Entity,
            "Experience" => Self::Experience,
            "Context" => Self::Context,
            _ => Self::Other(value),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Other(name) => name,
            known => known.label().to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

fn default_weight() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

/// A caller-assembled graph, handed to the layout engine as a whole.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

/// Edge with both endpoints resolved to node indices of the owning snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f32,
}

#[derive(Clone, Debug)]
pub struct ResolvedGraph {
    pub index_by_id: HashMap<String, usize>,
    pub edges: Vec<ResolvedEdge>,
}

impl GraphSnapshot {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Checks ids, weights and edge references and maps every edge onto node indices.
    pub fn resolve(&self) -> Result<ResolvedGraph, GraphError> {
        let mut index_by_id = HashMap::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            if index_by_id.insert(node.id.clone(), index).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut edges = Vec::with_capacity(self.edges.len());
        for edge in &self.edges {
            if !edge.weight.is_finite() || edge.weight < 0.0 {
                return Err(GraphError::InvalidWeight {
                    edge_id: edge.id.clone(),
                    weight: edge.weight,
                });
            }

            let lookup = |node_id: &str, endpoint: Endpoint| {
                index_by_id
                    .get(node_id)
                    .copied()
                    .ok_or_else(|| GraphError::DanglingEdge {
                        edge_id: edge.id.clone(),
                        endpoint,
                        node_id: node_id.to_owned(),
                    })
            };

            edges.push(ResolvedEdge {
                source: lookup(&edge.source, Endpoint::Source)?,
                target: lookup(&edge.target, Endpoint::Target)?,
                weight: edge.weight,
            });
        }

        Ok(ResolvedGraph { index_by_id, edges })
    }

    /// Copy of the snapshot without edges lighter than `min_weight`. Nodes are kept.
    pub fn with_min_edge_weight(&self, min_weight: f32) -> Self {
        Self {
            nodes: self.nodes.clone(),
            edges: self
                .edges
                .iter()
                .filter(|edge| edge.weight >= min_weight)
                .cloned()
                .collect(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Edges that touch `id`, in snapshot order.
    pub fn incident_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.source == id || edge.target == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> GraphNode {
        GraphNode {
            id: id.to_owned(),
            label: id.to_owned(),
            kind: NodeKind::Entity,
            properties: BTreeMap::new(),
        }
    }

    fn edge(id: &str, source: &str, target: &str, weight: f32) -> GraphEdge {
        GraphEdge {
            id: id.to_owned(),
            source: source.to_owned(),
            target: target.to_owned(),
            label: String::new(),
            weight,
        }
    }

    #[test]
    fn resolve_maps_edges_to_indices() {
        let snapshot = GraphSnapshot {
            nodes: vec![node("a"), node("b"), node("c")],
            edges: vec![edge("e1", "c", "a", 0.5)],
        };

        let resolved = snapshot.resolve().unwrap();
        assert_eq!(resolved.index_by_id["b"], 1);
        assert_eq!(
            resolved.edges,
            vec![ResolvedEdge {
                source: 2,
                target: 0,
                weight: 0.5
            }]
        );
    }

    #[test]
    fn dangling_target_names_the_edge() {
        let snapshot = GraphSnapshot {
            nodes: vec![node("a")],
            edges: vec![edge("e9", "a", "ghost", 1.0)],
        };

        let error = snapshot.resolve().unwrap_err();
        assert_eq!(
            error,
            GraphError::DanglingEdge {
                edge_id: "e9".to_owned(),
                endpoint: Endpoint::Target,
                node_id: "ghost".to_owned(),
            }
        );
        assert!(error.to_string().contains("e9"));
    }

    #[test]
    fn duplicate_ids_and_bad_weights_are_rejected() {
        let duplicated = GraphSnapshot {
            nodes: vec![node("a"), node("a")],
            edges: Vec::new(),
        };
        assert_eq!(
            duplicated.resolve().unwrap_err(),
            GraphError::DuplicateNode("a".to_owned())
        );

        let negative = GraphSnapshot {
            nodes: vec![node("a"), node("b")],
            edges: vec![edge("e1", "a", "b", -0.1)],
        };
        assert!(matches!(
            negative.resolve(),
            Err(GraphError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn unknown_kind_survives_round_trip_as_other() {
        let raw = r#"{"id":"x","label":"X","type":"Procedure","properties":{"k":1}}"#;
        let parsed: GraphNode = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.kind, NodeKind::Other("Procedure".to_owned()));
        assert_eq!(parsed.properties["k"], Value::from(1));

        let encoded = serde_json::to_string(&parsed).unwrap();
        assert!(encoded.contains(r#""type":"Procedure""#));
    }

    #[test]
    fn weight_filter_keeps_all_nodes() {
        let snapshot = GraphSnapshot {
            nodes: vec![node("a"), node("b")],
            edges: vec![edge("light", "a", "b", 0.1), edge("heavy", "b", "a", 0.9)],
        };

        let filtered = snapshot.with_min_edge_weight(0.5);
        assert_eq!(filtered.node_count(), 2);
        assert_eq!(filtered.edges.len(), 1);
        assert_eq!(filtered.edges[0].id, "heavy");
        assert_eq!(snapshot.incident_edges("a").count(), 2);
    }
}
