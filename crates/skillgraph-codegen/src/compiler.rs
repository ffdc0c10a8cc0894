//! Graph-to-plan compilation pipeline.
//!
//! Stages: defensive re-validation, deterministic topological ordering,
//! output-slot allocation, input-slot binding, then instruction emission via
//! an exhaustive match over the node kind. Determinism rules:
//!
//! - Among zero-indegree nodes, the lexicographically smallest id is always
//!   scheduled next, so the instruction sequence is canonical regardless of
//!   authoring order.
//! - Per node, out-ports are allocated in sorted name order.
//! - Binary emitters sort their two in-port names; the first becomes
//!   operand `a`.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use smallvec::SmallVec;

use skillgraph_check::validate;
use skillgraph_core::combat::{DamageKind, StatKind};
use skillgraph_core::edge::Edge;
use skillgraph_core::graph::EffectGraph;
use skillgraph_core::node::{Node, NodeKind};
use skillgraph_core::port::{PortDirection, ValueKind};

use crate::error::CompileError;
use crate::hash::plan_hash;
use crate::plan::{ExecPlan, Op, OpCode, SlotLayout};

/// `(node id, port name)` slot-table key.
type PortKey = (String, String);

/// Slot assignments built up during compilation: one monotone counter per
/// value kind, out-port assignments, and in-port bindings resolved from
/// edges. Entity-reference and entity-list ports share the entity arrays.
#[derive(Default)]
struct SlotTable {
    number_out: HashMap<PortKey, u32>,
    entity_out: HashMap<PortKey, u32>,
    damage_out: HashMap<PortKey, u32>,
    number_in: HashMap<PortKey, u32>,
    entity_in: HashMap<PortKey, u32>,
    damage_in: HashMap<PortKey, u32>,
    numbers: u32,
    entities: u32,
    damage_specs: u32,
}

/// Compiles a graph into an execution plan.
///
/// Also returns the op-index -> node-id mapping, which exists solely so
/// external debug tooling can correlate executed instructions with authored
/// nodes; nothing in the runtime interprets it.
pub fn compile(graph: &EffectGraph) -> Result<(ExecPlan, Vec<String>), CompileError> {
    let validation = validate(graph);
    if !validation.is_valid() {
        return Err(CompileError::ValidationFailed(validation.into_errors()));
    }

    let hash = plan_hash(graph);
    let order = topological_order(graph)?;

    let mut slots = SlotTable::default();
    allocate_out_slots(graph, &order, &mut slots)?;
    bind_in_ports(graph, &mut slots)?;

    let mut ops = Vec::with_capacity(graph.nodes.len());
    let mut node_map = Vec::with_capacity(graph.nodes.len());

    for &index in &order {
        let node = &graph.nodes[index];
        let op = match &node.kind {
            NodeKind::OnCastEntry | NodeKind::OnHitEntry => continue,
            NodeKind::ConstNumber { value } => emit_const_number(node, *value, &slots)?,
            NodeKind::GetStat { stat } => emit_get_stat(node, *stat, &slots)?,
            NodeKind::Add => emit_binary_number(OpCode::Add, node, &slots)?,
            NodeKind::Mul => emit_binary_number(OpCode::Mul, node, &slots)?,
            NodeKind::GetCaster => emit_context_entity(OpCode::GetCaster, node, &slots)?,
            NodeKind::GetTarget => emit_context_entity(OpCode::GetTarget, node, &slots)?,
            NodeKind::MakeDamageSpec { damage } => emit_make_damage(node, *damage, &slots)?,
            NodeKind::EmitApplyDamageCommand => emit_apply_damage(node, &slots)?,
            unsupported => {
                return Err(CompileError::UnsupportedNodeKind {
                    node_id: node.id.clone(),
                    kind: unsupported.name(),
                })
            }
        };
        ops.push(op);
        node_map.push(node.id.clone());
    }

    let layout = SlotLayout::new(slots.numbers, slots.entities, slots.damage_specs);
    Ok((ExecPlan::new(hash, ops, layout), node_map))
}

/// Kahn's algorithm with deterministic tie-breaking: among nodes with zero
/// remaining indegree, always pick the lexicographically smallest id.
fn topological_order(graph: &EffectGraph) -> Result<Vec<usize>, CompileError> {
    let node_count = graph.nodes.len();
    let mut index_by_id: HashMap<&str, usize> = HashMap::with_capacity(node_count);
    for (index, node) in graph.nodes.iter().enumerate() {
        index_by_id.insert(node.id.as_str(), index);
    }

    // petgraph indices coincide with node positions because nodes are added
    // in authored order.
    let mut dag: DiGraph<(), ()> = DiGraph::with_capacity(node_count, graph.edges.len());
    for _ in 0..node_count {
        dag.add_node(());
    }
    for edge in &graph.edges {
        let from = NodeIndex::new(index_by_id[edge.from_node.as_str()]);
        let to = NodeIndex::new(index_by_id[edge.to_node.as_str()]);
        dag.add_edge(from, to, ());
    }

    let mut indegree: Vec<usize> = (0..node_count)
        .map(|i| {
            dag.neighbors_directed(NodeIndex::new(i), Direction::Incoming)
                .count()
        })
        .collect();
    let mut used = vec![false; node_count];
    let mut order = Vec::with_capacity(node_count);

    for _ in 0..node_count {
        let mut best: Option<usize> = None;
        for (i, node) in graph.nodes.iter().enumerate() {
            if used[i] || indegree[i] != 0 {
                continue;
            }
            match best {
                Some(b) if graph.nodes[b].id <= node.id => {}
                _ => best = Some(i),
            }
        }
        let Some(best) = best else {
            return Err(CompileError::CycleDetected);
        };
        used[best] = true;
        order.push(best);
        for neighbor in dag.neighbors_directed(NodeIndex::new(best), Direction::Outgoing) {
            indegree[neighbor.index()] -= 1;
        }
    }

    Ok(order)
}

/// Walks nodes in topological order and assigns every out-port the next
/// free index of its kind's flat array, out-ports sorted by name per node.
fn allocate_out_slots(
    graph: &EffectGraph,
    order: &[usize],
    slots: &mut SlotTable,
) -> Result<(), CompileError> {
    for &index in order {
        let node = &graph.nodes[index];
        let mut out_ports: SmallVec<[(&str, ValueKind); 4]> = node
            .ports_with_direction(PortDirection::Out)
            .map(|(name, port)| (name, port.kind))
            .collect();
        out_ports.sort_unstable_by(|a, b| a.0.cmp(b.0));

        for (name, kind) in out_ports {
            let key = (node.id.clone(), name.to_string());
            match kind {
                ValueKind::Number => {
                    slots.number_out.insert(key, slots.numbers);
                    slots.numbers += 1;
                }
                ValueKind::EntityRef | ValueKind::EntityList => {
                    slots.entity_out.insert(key, slots.entities);
                    slots.entities += 1;
                }
                ValueKind::DamageSpec => {
                    slots.damage_out.insert(key, slots.damage_specs);
                    slots.damage_specs += 1;
                }
                ValueKind::Bool => {
                    return Err(CompileError::UnsupportedPortKind {
                        node_id: node.id.clone(),
                        port: name.to_string(),
                        kind,
                    })
                }
            }
        }
    }
    Ok(())
}

/// Resolves every edge's destination input port to the slot already
/// allocated to its source output port.
fn bind_in_ports(graph: &EffectGraph, slots: &mut SlotTable) -> Result<(), CompileError> {
    let mut node_by_id: HashMap<&str, &Node> = HashMap::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        node_by_id.insert(node.id.as_str(), node);
    }

    for edge in &graph.edges {
        // Endpoints and ports resolve after validation.
        let (Some(from_node), Some(to_node)) = (
            node_by_id.get(edge.from_node.as_str()),
            node_by_id.get(edge.to_node.as_str()),
        ) else {
            continue;
        };
        let (Some(from_port), Some(to_port)) = (
            from_node.ports.get(edge.from_port.as_str()),
            to_node.ports.get(edge.to_port.as_str()),
        ) else {
            continue;
        };

        if from_port.kind != to_port.kind {
            return Err(CompileError::EdgeKindMismatch {
                edge: edge.to_string(),
            });
        }

        match from_port.kind {
            ValueKind::Number => bind_edge(&slots.number_out, &mut slots.number_in, edge)?,
            ValueKind::EntityRef | ValueKind::EntityList => {
                bind_edge(&slots.entity_out, &mut slots.entity_in, edge)?
            }
            ValueKind::DamageSpec => bind_edge(&slots.damage_out, &mut slots.damage_in, edge)?,
            ValueKind::Bool => {
                return Err(CompileError::UnsupportedPortKind {
                    node_id: edge.from_node.clone(),
                    port: edge.from_port.clone(),
                    kind: ValueKind::Bool,
                })
            }
        }
    }
    Ok(())
}

fn bind_edge(
    out_map: &HashMap<PortKey, u32>,
    in_map: &mut HashMap<PortKey, u32>,
    edge: &Edge,
) -> Result<(), CompileError> {
    let to_key = (edge.to_node.clone(), edge.to_port.clone());
    if in_map.contains_key(&to_key) {
        return Err(CompileError::MultipleEdgesIntoInput {
            node_id: edge.to_node.clone(),
            port: edge.to_port.clone(),
        });
    }

    let from_key = (edge.from_node.clone(), edge.from_port.clone());
    let slot = out_map
        .get(&from_key)
        .copied()
        .ok_or_else(|| CompileError::MissingOutputSlot {
            node_id: edge.from_node.clone(),
            port: edge.from_port.clone(),
        })?;

    in_map.insert(to_key, slot);
    Ok(())
}

// ---------------------------------------------------------------------------
// Per-kind emitters. Each emits exactly one instruction.
// ---------------------------------------------------------------------------

fn emit_const_number(node: &Node, value: f32, slots: &SlotTable) -> Result<Op, CompileError> {
    let out = out_slot(slots, node, ValueKind::Number)?;
    Ok(Op::new(OpCode::ConstNumber, value.to_bits(), 0, out))
}

fn emit_get_stat(node: &Node, stat: StatKind, slots: &SlotTable) -> Result<Op, CompileError> {
    let entity = in_slot(slots, node, ValueKind::EntityRef)?;
    let out = out_slot(slots, node, ValueKind::Number)?;
    Ok(Op::new(OpCode::GetStat, stat.index(), entity, out))
}

fn emit_binary_number(code: OpCode, node: &Node, slots: &SlotTable) -> Result<Op, CompileError> {
    let out = out_slot(slots, node, ValueKind::Number)?;
    let (first, second) = two_number_in_ports(node)?;
    let a = bound_in_slot(&slots.number_in, node, first)?;
    let b = bound_in_slot(&slots.number_in, node, second)?;
    Ok(Op::new(code, a, b, out))
}

fn emit_context_entity(code: OpCode, node: &Node, slots: &SlotTable) -> Result<Op, CompileError> {
    let out = out_slot(slots, node, ValueKind::EntityRef)?;
    Ok(Op::new(code, 0, 0, out))
}

fn emit_make_damage(
    node: &Node,
    damage: DamageKind,
    slots: &SlotTable,
) -> Result<Op, CompileError> {
    let amount = in_slot(slots, node, ValueKind::Number)?;
    let target = in_slot(slots, node, ValueKind::EntityRef)?;
    let out = out_slot(slots, node, ValueKind::DamageSpec)?;
    Ok(Op {
        code: OpCode::MakeDamage,
        a: amount,
        b: target,
        c: damage.index(),
        out,
    })
}

fn emit_apply_damage(node: &Node, slots: &SlotTable) -> Result<Op, CompileError> {
    let spec = in_slot(slots, node, ValueKind::DamageSpec)?;
    Ok(Op::new(OpCode::EmitApplyDamage, spec, 0, 0))
}

// ---------------------------------------------------------------------------
// Port/slot resolution helpers.
// ---------------------------------------------------------------------------

/// Finds the single port with the given kind and direction.
fn single_port_name<'a>(
    node: &'a Node,
    kind: ValueKind,
    direction: PortDirection,
) -> Result<&'a str, CompileError> {
    let mut found: Option<&str> = None;
    for (name, port) in &node.ports {
        if port.direction != direction || port.kind != kind {
            continue;
        }
        if found.is_some() {
            return Err(CompileError::AmbiguousPort {
                node_id: node.id.clone(),
                direction,
                kind,
            });
        }
        found = Some(name);
    }
    found.ok_or_else(|| CompileError::MissingPort {
        node_id: node.id.clone(),
        direction,
        kind,
    })
}

/// Exactly two Number in-ports, names sorted ordinally.
fn two_number_in_ports(node: &Node) -> Result<(&str, &str), CompileError> {
    let mut names: SmallVec<[&str; 4]> = node
        .ports
        .iter()
        .filter(|(_, port)| port.direction == PortDirection::In && port.kind == ValueKind::Number)
        .map(|(name, _)| name.as_str())
        .collect();
    if names.len() != 2 {
        return Err(CompileError::ExpectedTwoInputs {
            node_id: node.id.clone(),
            kind: ValueKind::Number,
            found: names.len(),
        });
    }
    names.sort_unstable();
    Ok((names[0], names[1]))
}

fn out_slot(slots: &SlotTable, node: &Node, kind: ValueKind) -> Result<u32, CompileError> {
    let name = single_port_name(node, kind, PortDirection::Out)?;
    let map = match kind {
        ValueKind::Number => &slots.number_out,
        ValueKind::EntityRef | ValueKind::EntityList => &slots.entity_out,
        ValueKind::DamageSpec => &slots.damage_out,
        ValueKind::Bool => {
            return Err(CompileError::UnsupportedPortKind {
                node_id: node.id.clone(),
                port: name.to_string(),
                kind,
            })
        }
    };
    map.get(&(node.id.clone(), name.to_string()))
        .copied()
        .ok_or_else(|| CompileError::MissingOutputSlot {
            node_id: node.id.clone(),
            port: name.to_string(),
        })
}

fn in_slot(slots: &SlotTable, node: &Node, kind: ValueKind) -> Result<u32, CompileError> {
    let name = single_port_name(node, kind, PortDirection::In)?;
    let map = match kind {
        ValueKind::Number => &slots.number_in,
        ValueKind::EntityRef | ValueKind::EntityList => &slots.entity_in,
        ValueKind::DamageSpec => &slots.damage_in,
        ValueKind::Bool => {
            return Err(CompileError::UnsupportedPortKind {
                node_id: node.id.clone(),
                port: name.to_string(),
                kind: ValueKind::Bool,
            })
        }
    };
    bound_in_slot(map, node, name)
}

fn bound_in_slot(
    in_map: &HashMap<PortKey, u32>,
    node: &Node,
    name: &str,
) -> Result<u32, CompileError> {
    in_map
        .get(&(node.id.clone(), name.to_string()))
        .copied()
        .ok_or_else(|| CompileError::UnboundInputPort {
            node_id: node.id.clone(),
            port: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// entry -> { amount: Const(100), target: GetTarget } -> spec -> emit
    fn strike_graph() -> EffectGraph {
        EffectGraph::new("strike", 1, "entry")
            .with_node(Node::new("entry", NodeKind::OnHitEntry))
            .with_node(
                Node::new("amount", NodeKind::ConstNumber { value: 100.0 })
                    .with_port("out", ValueKind::Number, PortDirection::Out),
            )
            .with_node(
                Node::new("target", NodeKind::GetTarget)
                    .with_port("unit", ValueKind::EntityRef, PortDirection::Out),
            )
            .with_node(
                Node::new("spec", NodeKind::MakeDamageSpec { damage: DamageKind::Fire })
                    .with_port("amount", ValueKind::Number, PortDirection::In)
                    .with_port("target", ValueKind::EntityRef, PortDirection::In)
                    .with_port("out", ValueKind::DamageSpec, PortDirection::Out),
            )
            .with_node(
                Node::new("emit", NodeKind::EmitApplyDamageCommand)
                    .with_port("spec", ValueKind::DamageSpec, PortDirection::In),
            )
            .with_edge(Edge::new("amount", "out", "spec", "amount"))
            .with_edge(Edge::new("target", "unit", "spec", "target"))
            .with_edge(Edge::new("spec", "out", "emit", "spec"))
    }

    #[test]
    fn compiles_strike_graph_into_expected_sequence() {
        let (plan, node_map) = compile(&strike_graph()).unwrap();

        assert_eq!(node_map, vec!["amount", "target", "spec", "emit"]);
        assert_eq!(plan.layout(), SlotLayout::new(1, 1, 1));
        assert_eq!(
            plan.ops(),
            &[
                Op::new(OpCode::ConstNumber, 100.0f32.to_bits(), 0, 0),
                Op::new(OpCode::GetTarget, 0, 0, 0),
                Op {
                    code: OpCode::MakeDamage,
                    a: 0,
                    b: 0,
                    c: DamageKind::Fire.index(),
                    out: 0
                },
                Op::new(OpCode::EmitApplyDamage, 0, 0, 0),
            ]
        );
        assert_eq!(plan.hash(), plan_hash(&strike_graph()));
    }

    #[test]
    fn entry_markers_emit_no_instructions() {
        let (plan, node_map) = compile(&strike_graph()).unwrap();
        assert_eq!(plan.ops().len(), 4);
        assert!(!node_map.contains(&"entry".to_string()));
    }

    #[test]
    fn zero_indegree_ties_break_lexicographically() {
        // Authored in reverse order; compilation order must not care.
        let mut graph = strike_graph();
        graph.nodes.reverse();
        graph.edges.reverse();
        let (_, node_map) = compile(&graph).unwrap();
        assert_eq!(node_map, vec!["amount", "target", "spec", "emit"]);
    }

    #[test]
    fn binary_inputs_sort_by_port_name() {
        let graph = EffectGraph::new("sum", 1, "entry")
            .with_node(Node::new("entry", NodeKind::OnCastEntry))
            .with_node(
                Node::new("x", NodeKind::ConstNumber { value: 1.0 })
                    .with_port("out", ValueKind::Number, PortDirection::Out),
            )
            .with_node(
                Node::new("y", NodeKind::ConstNumber { value: 2.0 })
                    .with_port("out", ValueKind::Number, PortDirection::Out),
            )
            .with_node(
                Node::new("z_add", NodeKind::Add)
                    // Declared out of order on purpose.
                    .with_port("rhs", ValueKind::Number, PortDirection::In)
                    .with_port("lhs", ValueKind::Number, PortDirection::In)
                    .with_port("sum", ValueKind::Number, PortDirection::Out),
            )
            .with_edge(Edge::new("y", "out", "z_add", "rhs"))
            .with_edge(Edge::new("x", "out", "z_add", "lhs"));

        let (plan, _) = compile(&graph).unwrap();
        let add = plan.ops()[2];
        assert_eq!(add.code, OpCode::Add);
        // "lhs" < "rhs", so operand a is x's slot and operand b is y's.
        assert_eq!(add.a, 0);
        assert_eq!(add.b, 1);
    }

    #[test]
    fn validation_failure_aborts_with_full_error_list() {
        let graph = EffectGraph::new("bad", 1, "ghost")
            .with_node(Node::new("dup", NodeKind::Add))
            .with_node(Node::new("dup", NodeKind::Add));
        match compile(&graph) {
            Err(CompileError::ValidationFailed(errors)) => assert!(errors.len() >= 2),
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_node_kind_is_fatal() {
        let graph = strike_graph()
            .with_node(Node::new("roll", NodeKind::RollChance { chance: 0.5 }));
        match compile(&graph) {
            Err(CompileError::UnsupportedNodeKind { node_id, kind }) => {
                assert_eq!(node_id, "roll");
                assert_eq!(kind, "RollChance");
            }
            other => panic!("expected UnsupportedNodeKind, got {other:?}"),
        }
    }

    #[test]
    fn missing_out_port_is_fatal() {
        let graph = EffectGraph::new("g", 1, "entry")
            .with_node(Node::new("entry", NodeKind::OnCastEntry))
            .with_node(Node::new("amount", NodeKind::ConstNumber { value: 1.0 }));
        match compile(&graph) {
            Err(CompileError::MissingPort { node_id, direction, kind }) => {
                assert_eq!(node_id, "amount");
                assert_eq!(direction, PortDirection::Out);
                assert_eq!(kind, ValueKind::Number);
            }
            other => panic!("expected MissingPort, got {other:?}"),
        }
    }

    #[test]
    fn unbound_input_port_is_fatal() {
        // MakeDamageSpec with declared inputs but no incoming edges.
        let graph = EffectGraph::new("g", 1, "entry")
            .with_node(Node::new("entry", NodeKind::OnCastEntry))
            .with_node(
                Node::new("spec", NodeKind::MakeDamageSpec { damage: DamageKind::Physical })
                    .with_port("amount", ValueKind::Number, PortDirection::In)
                    .with_port("target", ValueKind::EntityRef, PortDirection::In)
                    .with_port("out", ValueKind::DamageSpec, PortDirection::Out),
            );
        match compile(&graph) {
            Err(CompileError::UnboundInputPort { node_id, port }) => {
                assert_eq!(node_id, "spec");
                assert_eq!(port, "amount");
            }
            other => panic!("expected UnboundInputPort, got {other:?}"),
        }
    }

    #[test]
    fn wrong_binary_cardinality_is_fatal() {
        let graph = EffectGraph::new("g", 1, "entry")
            .with_node(Node::new("entry", NodeKind::OnCastEntry))
            .with_node(
                Node::new("x", NodeKind::ConstNumber { value: 1.0 })
                    .with_port("out", ValueKind::Number, PortDirection::Out),
            )
            .with_node(
                Node::new("z_add", NodeKind::Add)
                    .with_port("only", ValueKind::Number, PortDirection::In)
                    .with_port("sum", ValueKind::Number, PortDirection::Out),
            )
            .with_edge(Edge::new("x", "out", "z_add", "only"));
        match compile(&graph) {
            Err(CompileError::ExpectedTwoInputs { node_id, found, .. }) => {
                assert_eq!(node_id, "z_add");
                assert_eq!(found, 1);
            }
            other => panic!("expected ExpectedTwoInputs, got {other:?}"),
        }
    }

    #[test]
    fn bool_out_port_has_no_slot_array() {
        let graph = EffectGraph::new("g", 1, "entry")
            .with_node(Node::new("entry", NodeKind::OnCastEntry))
            .with_node(
                Node::new("flag", NodeKind::ConstNumber { value: 1.0 })
                    .with_port("out", ValueKind::Bool, PortDirection::Out),
            );
        assert!(matches!(
            compile(&graph),
            Err(CompileError::UnsupportedPortKind { kind: ValueKind::Bool, .. })
        ));
    }
}
