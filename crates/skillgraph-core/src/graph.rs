//! EffectGraph: the authored dataflow graph an effect compiles from.
//!
//! The container is deliberately plain data. Nodes and edges keep authoring
//! order, duplicate ids and dangling edge endpoints are representable, and
//! nothing here enforces graph invariants -- that is the validator's job,
//! and it needs to see the broken state to report it. Canonical ordering
//! (for hashing and instruction emission) is applied by the compiler, never
//! stored.

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::node::Node;

/// A designer-authored effect graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectGraph {
    /// Stable graph identity (asset GUID or similar).
    pub id: String,
    /// Monotone authoring version.
    pub version: u32,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Id of the entry-marker node this graph hangs off.
    pub entry_node_id: String,
}

impl EffectGraph {
    pub fn new(id: impl Into<String>, version: u32, entry_node_id: impl Into<String>) -> Self {
        EffectGraph {
            id: id.into(),
            version,
            nodes: Vec::new(),
            edges: Vec::new(),
            entry_node_id: entry_node_id.into(),
        }
    }

    /// Builder-style node append.
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Builder-style edge append.
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn push_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Looks up a node by id. First match wins when ids are duplicated.
    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::port::{PortDirection, ValueKind};

    fn sample_graph() -> EffectGraph {
        EffectGraph::new("graph-1", 3, "entry")
            .with_node(Node::new("entry", NodeKind::OnHitEntry))
            .with_node(
                Node::new("const", NodeKind::ConstNumber { value: 100.0 })
                    .with_port("out", ValueKind::Number, PortDirection::Out),
            )
            .with_node(
                Node::new("target", NodeKind::GetTarget)
                    .with_port("unit", ValueKind::EntityRef, PortDirection::Out),
            )
            .with_edge(Edge::new("const", "out", "target", "unused"))
    }

    #[test]
    fn builder_appends_in_authoring_order() {
        let graph = sample_graph();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.nodes[0].id, "entry");
        assert_eq!(graph.nodes[2].id, "target");
    }

    #[test]
    fn find_node_by_id() {
        let graph = sample_graph();
        assert!(graph.find_node("const").is_some());
        assert!(graph.find_node("missing").is_none());
    }

    #[test]
    fn duplicate_ids_are_representable() {
        let graph = EffectGraph::new("g", 1, "a")
            .with_node(Node::new("a", NodeKind::OnCastEntry))
            .with_node(Node::new("a", NodeKind::Add));
        assert_eq!(graph.node_count(), 2);
        // First match wins for lookups; the validator reports the duplicate.
        assert!(graph.find_node("a").unwrap().kind.is_entry());
    }

    #[test]
    fn serde_roundtrip_preserves_structure() {
        let graph = sample_graph();
        let json = serde_json::to_string(&graph).unwrap();
        let back: EffectGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(graph, back);
    }
}
