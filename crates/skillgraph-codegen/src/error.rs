//! Compile-time error types.
//!
//! Validation problems arrive as the full accumulated list; everything else
//! indicates a malformed or unsupported program and aborts on first
//! occurrence.

use skillgraph_check::ValidationError;
use skillgraph_core::port::{PortDirection, ValueKind};
use thiserror::Error;

/// Errors produced by [`compile`](crate::compile).
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    /// The defensive re-validation failed; carries every accumulated error.
    #[error("graph validation failed with {} error(s); first: {}", .0.len(), first_error(.0))]
    ValidationFailed(Vec<ValidationError>),

    /// The node kind is authorable but has no emitter.
    #[error("unsupported node kind '{kind}' at node '{node_id}'")]
    UnsupportedNodeKind { node_id: String, kind: &'static str },

    /// A declared out-port has a kind with no backing slot array.
    #[error("unsupported {kind:?} out-port '{port}' at node '{node_id}'")]
    UnsupportedPortKind {
        node_id: String,
        port: String,
        kind: ValueKind,
    },

    /// The emitter needed a single port of this kind/direction and found none.
    #[error("missing {direction:?} port of kind {kind:?} at node '{node_id}'")]
    MissingPort {
        node_id: String,
        direction: PortDirection,
        kind: ValueKind,
    },

    /// The emitter needed a single port of this kind/direction and found several.
    #[error("expected a single {direction:?} port of kind {kind:?} at node '{node_id}'")]
    AmbiguousPort {
        node_id: String,
        direction: PortDirection,
        kind: ValueKind,
    },

    /// A binary emitter needs exactly two inputs of the kind.
    #[error("expected exactly two {kind:?} in-ports at node '{node_id}', found {found}")]
    ExpectedTwoInputs {
        node_id: String,
        kind: ValueKind,
        found: usize,
    },

    /// Two or more edges feed the same input port.
    #[error("multiple edges connected to input port '{node_id}.{port}'")]
    MultipleEdgesIntoInput { node_id: String, port: String },

    /// An input port has no incoming edge to bind a slot from.
    #[error("missing edge binding for input port '{node_id}.{port}'")]
    UnboundInputPort { node_id: String, port: String },

    /// An out-port was referenced before slot allocation assigned it one.
    #[error("missing slot for out-port '{node_id}.{port}'")]
    MissingOutputSlot { node_id: String, port: String },

    /// An edge connects ports of different value kinds.
    #[error("value kind mismatch at {edge}")]
    EdgeKindMismatch { edge: String },

    /// Topological ordering could not visit every node.
    #[error("graph contains a cycle; cannot compile")]
    CycleDetected,
}

fn first_error(errors: &[ValidationError]) -> String {
    errors
        .first()
        .map(|error| error.to_string())
        .unwrap_or_default()
}
