//! Port declarations on effect-graph nodes.
//!
//! A port is a typed inlet or outlet. Edges connect one `Out` port to one
//! `In` port of the same value kind; the validator enforces both rules.

use serde::{Deserialize, Serialize};

/// The kind of value flowing through a port.
///
/// `code()` values are stable wire bytes used by the canonical plan hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Scalar number (f32 at execution time).
    Number,
    /// Boolean.
    Bool,
    /// Single entity reference.
    EntityRef,
    /// List of entity references (spatial query results).
    EntityList,
    /// Structured damage specification.
    DamageSpec,
}

impl ValueKind {
    /// Stable hash/wire byte.
    pub fn code(self) -> u8 {
        match self {
            ValueKind::Number => 0,
            ValueKind::Bool => 1,
            ValueKind::EntityRef => 2,
            ValueKind::EntityList => 3,
            ValueKind::DamageSpec => 4,
        }
    }
}

/// Direction of a port relative to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    In,
    Out,
}

impl PortDirection {
    /// Stable hash/wire byte.
    pub fn code(self) -> u8 {
        match self {
            PortDirection::In => 0,
            PortDirection::Out => 1,
        }
    }
}

/// A declared port. The port's name is the key of the owning node's port
/// table, which makes names unique per node by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub kind: ValueKind,
    pub direction: PortDirection,
}

impl Port {
    pub fn new(kind: ValueKind, direction: PortDirection) -> Self {
        Port { kind, direction }
    }

    /// Shorthand for an input port.
    pub fn input(kind: ValueKind) -> Self {
        Port::new(kind, PortDirection::In)
    }

    /// Shorthand for an output port.
    pub fn output(kind: ValueKind) -> Self {
        Port::new(kind, PortDirection::Out)
    }
}
