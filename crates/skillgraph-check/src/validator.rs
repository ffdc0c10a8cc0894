//! Accumulating structural validator.
//!
//! Checks, in order: node identity (empty/duplicate ids), entry resolution,
//! per-edge endpoint/port/direction/value-kind agreement, single-writer
//! inputs, and acyclicity via Kahn's algorithm. Every failure class is
//! independent and cumulative.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use skillgraph_core::graph::EffectGraph;
use skillgraph_core::node::Node;
use skillgraph_core::port::PortDirection;

/// Pseudo node id for problems not attributable to a single node.
const GRAPH_NODE_ID: &str = "<graph>";

/// One structural problem, attributed to the node an author should look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{node_id}: {message}")]
pub struct ValidationError {
    pub node_id: String,
    pub message: String,
}

/// Accumulated validation outcome. Empty error list means the graph is
/// structurally sound and safe to compile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    fn add_error(&mut self, node_id: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            node_id: node_id.into(),
            message: message.into(),
        });
    }
}

/// Validates an effect graph, accumulating every detectable problem.
pub fn validate(graph: &EffectGraph) -> ValidationResult {
    let mut result = ValidationResult::default();

    // Node identity. Later duplicates are reported and excluded from the
    // id table so downstream checks run against the first declaration.
    let mut node_by_id: HashMap<&str, &Node> = HashMap::with_capacity(graph.nodes.len());
    let mut id_order: Vec<&str> = Vec::with_capacity(graph.nodes.len());
    for (index, node) in graph.nodes.iter().enumerate() {
        if node.id.is_empty() {
            result.add_error(GRAPH_NODE_ID, format!("node has empty id at index {index}"));
            continue;
        }
        if node_by_id.contains_key(node.id.as_str()) {
            result.add_error(node.id.clone(), "duplicate node id");
            continue;
        }
        node_by_id.insert(node.id.as_str(), node);
        id_order.push(node.id.as_str());
    }

    // Entry resolution.
    if graph.entry_node_id.is_empty() {
        result.add_error(GRAPH_NODE_ID, "entry_node_id is empty");
    } else if !node_by_id.contains_key(graph.entry_node_id.as_str()) {
        result.add_error(
            graph.entry_node_id.clone(),
            "entry node does not exist in the node set",
        );
    }

    validate_edges(graph, &node_by_id, &mut result);
    validate_single_writer_inputs(graph, &node_by_id, &mut result);
    validate_dag(graph, &id_order, &mut result);

    result
}

/// Per-edge checks: endpoints exist, named ports exist, directions agree
/// (from = Out, to = In), value kinds match exactly. Kind mismatches are
/// reported at the destination node.
fn validate_edges(
    graph: &EffectGraph,
    node_by_id: &HashMap<&str, &Node>,
    result: &mut ValidationResult,
) {
    for edge in &graph.edges {
        if edge.from_node.is_empty() || edge.to_node.is_empty() {
            result.add_error(GRAPH_NODE_ID, format!("{edge} has an empty node id"));
            continue;
        }

        let from_node = match node_by_id.get(edge.from_node.as_str()) {
            Some(node) => *node,
            None => {
                result.add_error(edge.from_node.clone(), format!("{edge} from-node does not exist"));
                continue;
            }
        };
        let to_node = match node_by_id.get(edge.to_node.as_str()) {
            Some(node) => *node,
            None => {
                result.add_error(edge.to_node.clone(), format!("{edge} to-node does not exist"));
                continue;
            }
        };

        if edge.from_port.is_empty() {
            result.add_error(from_node.id.clone(), format!("{edge} from-port name is empty"));
            continue;
        }
        if edge.to_port.is_empty() {
            result.add_error(to_node.id.clone(), format!("{edge} to-port name is empty"));
            continue;
        }

        let from_port = match from_node.ports.get(edge.from_port.as_str()) {
            Some(port) => port,
            None => {
                result.add_error(from_node.id.clone(), format!("{edge} from-port does not exist"));
                continue;
            }
        };
        let to_port = match to_node.ports.get(edge.to_port.as_str()) {
            Some(port) => port,
            None => {
                result.add_error(to_node.id.clone(), format!("{edge} to-port does not exist"));
                continue;
            }
        };

        if from_port.direction != PortDirection::Out {
            result.add_error(from_node.id.clone(), format!("{edge} from-port must be an Out port"));
        }
        if to_port.direction != PortDirection::In {
            result.add_error(to_node.id.clone(), format!("{edge} to-port must be an In port"));
        }
        if from_port.kind != to_port.kind {
            result.add_error(
                to_node.id.clone(),
                format!(
                    "{edge} value kind mismatch ({:?} -> {:?})",
                    from_port.kind, to_port.kind
                ),
            );
        }
    }
}

/// Every input port may receive at most one edge.
fn validate_single_writer_inputs(
    graph: &EffectGraph,
    node_by_id: &HashMap<&str, &Node>,
    result: &mut ValidationResult,
) {
    let mut edge_counts: HashMap<(&str, &str), usize> = HashMap::new();
    for edge in &graph.edges {
        let Some(to_node) = node_by_id.get(edge.to_node.as_str()) else {
            continue;
        };
        let Some(to_port) = to_node.ports.get(edge.to_port.as_str()) else {
            continue;
        };
        if to_port.direction != PortDirection::In {
            continue;
        }
        *edge_counts
            .entry((edge.to_node.as_str(), edge.to_port.as_str()))
            .or_insert(0) += 1;
    }

    // Deterministic report order: walk the authored edge list and report
    // each offending port once.
    let mut reported: Vec<(&str, &str)> = Vec::new();
    for edge in &graph.edges {
        let key = (edge.to_node.as_str(), edge.to_port.as_str());
        if edge_counts.get(&key).copied().unwrap_or(0) > 1 && !reported.contains(&key) {
            reported.push(key);
            result.add_error(
                edge.to_node.clone(),
                format!("multiple edges connected to input port '{}'", edge.to_port),
            );
        }
    }
}

/// Kahn's algorithm over the full (deduplicated) node set. If indegree-zero
/// processing cannot visit every node, a cycle exists; one node with
/// residual positive indegree is reported.
fn validate_dag(graph: &EffectGraph, id_order: &[&str], result: &mut ValidationResult) {
    if id_order.len() <= 1 {
        return;
    }

    let mut dag: DiGraph<(), ()> = DiGraph::with_capacity(id_order.len(), graph.edges.len());
    let mut index_by_id: HashMap<&str, NodeIndex> = HashMap::with_capacity(id_order.len());
    for &id in id_order {
        index_by_id.insert(id, dag.add_node(()));
    }

    for edge in &graph.edges {
        // Only resolvable endpoints participate; dangling edges were
        // already reported above.
        let (Some(&from), Some(&to)) = (
            index_by_id.get(edge.from_node.as_str()),
            index_by_id.get(edge.to_node.as_str()),
        ) else {
            continue;
        };
        dag.add_edge(from, to, ());
    }

    // Positional: petgraph indices coincide with id_order positions.
    let mut indegree: Vec<usize> = dag
        .node_indices()
        .map(|idx| dag.neighbors_directed(idx, Direction::Incoming).count())
        .collect();

    let mut ready: Vec<NodeIndex> = dag
        .node_indices()
        .filter(|idx| indegree[idx.index()] == 0)
        .collect();

    let mut visited = 0usize;
    while let Some(current) = ready.pop() {
        visited += 1;
        for next in dag.neighbors_directed(current, Direction::Outgoing) {
            indegree[next.index()] -= 1;
            if indegree[next.index()] == 0 {
                ready.push(next);
            }
        }
    }

    if visited == id_order.len() {
        return;
    }

    // Report the first authored node still blocked by a residual indegree.
    let cycle_id = id_order
        .iter()
        .enumerate()
        .find(|(index, _)| indegree[*index] > 0)
        .map(|(_, id)| *id)
        .unwrap_or(id_order[0]);
    result.add_error(cycle_id, "graph contains a cycle; effect graphs must be acyclic");
}
