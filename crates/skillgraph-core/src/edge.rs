//! Effect-graph edges.
//!
//! An edge connects one declared `Out` port to one declared `In` port, both
//! named by node id + port name. Edges are plain data; all referential and
//! type checks live in the validator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A directed data edge `(from_node, from_port) -> (to_node, to_port)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from_node: String,
    pub from_port: String,
    pub to_node: String,
    pub to_port: String,
}

impl Edge {
    pub fn new(
        from_node: impl Into<String>,
        from_port: impl Into<String>,
        to_node: impl Into<String>,
        to_port: impl Into<String>,
    ) -> Self {
        Edge {
            from_node: from_node.into(),
            from_port: from_port.into(),
            to_node: to_node.into(),
            to_port: to_port.into(),
        }
    }

    /// Canonical sort key used by the plan hash.
    pub fn sort_key(&self) -> (&str, &str, &str, &str) {
        (
            self.from_node.as_str(),
            self.from_port.as_str(),
            self.to_node.as_str(),
            self.to_port.as_str(),
        )
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Edge({}.{} -> {}.{})",
            self.from_node, self.from_port, self.to_node, self.to_port
        )
    }
}
