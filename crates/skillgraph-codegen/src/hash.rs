//! Canonical 64-bit content hashing for effect graphs.
//!
//! FNV-1a accumulation over a canonicalized view of the graph: nodes sorted
//! by id, ports sorted by name, parameters in a fixed per-kind key order,
//! edges sorted by their full endpoint tuple. Authoring order never reaches
//! the hasher, so structurally identical graphs hash identically and the
//! hash works as an external cache key.

use skillgraph_core::graph::EffectGraph;
use skillgraph_core::node::Node;

pub const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME: u64 = 0x0000_0100_0000_01b3;

pub fn add_byte(hash: u64, value: u8) -> u64 {
    (hash ^ u64::from(value)).wrapping_mul(PRIME)
}

pub fn add_u32(hash: u64, value: u32) -> u64 {
    let mut hash = hash;
    for byte in value.to_le_bytes() {
        hash = add_byte(hash, byte);
    }
    hash
}

/// Length-prefixed so `("ab", "c")` and `("a", "bc")` cannot collide.
pub fn add_str(hash: u64, value: &str) -> u64 {
    let mut hash = add_u32(hash, value.len() as u32);
    for byte in value.as_bytes() {
        hash = add_byte(hash, *byte);
    }
    hash
}

/// Computes the canonical plan hash for a graph.
pub fn plan_hash(graph: &EffectGraph) -> u64 {
    let mut hash = OFFSET_BASIS;
    hash = add_str(hash, &graph.id);
    hash = add_u32(hash, graph.version);
    hash = add_str(hash, &graph.entry_node_id);

    let mut nodes: Vec<&Node> = graph.nodes.iter().collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    hash = add_u32(hash, nodes.len() as u32);
    for node in nodes {
        hash = add_str(hash, &node.id);
        hash = add_byte(hash, node.kind.kind_code());

        let mut port_names: Vec<&str> = node.ports.keys().map(String::as_str).collect();
        port_names.sort_unstable();
        hash = add_u32(hash, port_names.len() as u32);
        for name in port_names {
            let port = &node.ports[name];
            hash = add_str(hash, name);
            hash = add_byte(hash, port.kind.code());
            hash = add_byte(hash, port.direction.code());
        }

        let params = node.kind.canonical_params();
        hash = add_u32(hash, params.len() as u32);
        for (key, value) in params {
            hash = add_str(hash, key);
            hash = add_u32(hash, value);
        }
    }

    let mut edges: Vec<_> = graph.edges.iter().collect();
    edges.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    hash = add_u32(hash, edges.len() as u32);
    for edge in edges {
        hash = add_str(hash, &edge.from_node);
        hash = add_str(hash, &edge.from_port);
        hash = add_str(hash, &edge.to_node);
        hash = add_str(hash, &edge.to_port);
    }

    hash
}
