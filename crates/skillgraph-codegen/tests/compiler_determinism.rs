//! Determinism and soundness tests over whole compilations: identical
//! plans regardless of authoring order, hash sensitivity to parameters,
//! and read-after-write soundness of emitted instruction sequences.

use proptest::prelude::*;

use skillgraph_codegen::{compile, ExecPlan, OpCode};
use skillgraph_core::edge::Edge;
use skillgraph_core::graph::EffectGraph;
use skillgraph_core::node::{Node, NodeKind};
use skillgraph_core::port::{PortDirection, ValueKind};

/// Builds an add-tree graph: `values.len()` constants, then one Add node per
/// `(x, y)` pair referencing any two earlier producers.
fn build_sum_graph(values: &[f32], adds: &[(usize, usize)]) -> EffectGraph {
    let mut graph = EffectGraph::new("sum-tree", 1, "entry")
        .with_node(Node::new("entry", NodeKind::OnCastEntry));

    // (node id, out-port name) per producer, in creation order.
    let mut producers: Vec<(String, &'static str)> = Vec::new();

    for (i, value) in values.iter().enumerate() {
        let id = format!("c{i:02}");
        graph.push_node(
            Node::new(&id, NodeKind::ConstNumber { value: *value })
                .with_port("out", ValueKind::Number, PortDirection::Out),
        );
        producers.push((id, "out"));
    }

    for (j, (x, y)) in adds.iter().enumerate() {
        let id = format!("s{j:02}");
        graph.push_node(
            Node::new(&id, NodeKind::Add)
                .with_port("a", ValueKind::Number, PortDirection::In)
                .with_port("b", ValueKind::Number, PortDirection::In)
                .with_port("sum", ValueKind::Number, PortDirection::Out),
        );
        let (from_a, port_a) = &producers[*x];
        let (from_b, port_b) = &producers[*y];
        graph.push_edge(Edge::new(from_a.clone(), *port_a, &id, "a"));
        graph.push_edge(Edge::new(from_b.clone(), *port_b, &id, "b"));
        producers.push((id, "sum"));
    }

    graph
}

fn reorder(graph: &EffectGraph, node_perm: &[usize], edge_perm: &[usize]) -> EffectGraph {
    let mut shuffled = EffectGraph::new(graph.id.clone(), graph.version, graph.entry_node_id.clone());
    for &i in node_perm {
        shuffled.push_node(graph.nodes[i].clone());
    }
    for &i in edge_perm {
        shuffled.push_edge(graph.edges[i].clone());
    }
    shuffled
}

/// Every instruction may only read slots written by a strictly earlier
/// instruction.
fn assert_reads_follow_writes(plan: &ExecPlan) {
    let layout = plan.layout();
    let mut numbers = vec![false; layout.numbers as usize];
    let mut entities = vec![false; layout.entities as usize];
    let mut damage = vec![false; layout.damage_specs as usize];

    for op in plan.ops() {
        match op.code {
            OpCode::ConstNumber => numbers[op.out as usize] = true,
            OpCode::GetStat => {
                assert!(entities[op.b as usize], "GetStat reads unwritten entity slot");
                numbers[op.out as usize] = true;
            }
            OpCode::Add | OpCode::Mul => {
                assert!(numbers[op.a as usize], "binary op reads unwritten slot a");
                assert!(numbers[op.b as usize], "binary op reads unwritten slot b");
                numbers[op.out as usize] = true;
            }
            OpCode::GetCaster | OpCode::GetTarget => entities[op.out as usize] = true,
            OpCode::MakeDamage => {
                assert!(numbers[op.a as usize], "MakeDamage reads unwritten amount");
                assert!(entities[op.b as usize], "MakeDamage reads unwritten target");
                damage[op.out as usize] = true;
            }
            OpCode::EmitApplyDamage => {
                assert!(damage[op.a as usize], "EmitApplyDamage reads unwritten spec");
            }
        }
    }
}

type GraphPair = (EffectGraph, EffectGraph);

/// An add-tree graph plus an authoring-order-shuffled twin.
fn arb_graph_pair() -> impl Strategy<Value = GraphPair> {
    let params = (
        prop::collection::vec(-1000.0f32..1000.0, 1..6),
        prop::collection::vec(
            (any::<prop::sample::Index>(), any::<prop::sample::Index>()),
            0..8,
        ),
    );
    params.prop_flat_map(|(values, raw_adds)| {
        let adds: Vec<(usize, usize)> = raw_adds
            .iter()
            .enumerate()
            .map(|(j, (x, y))| {
                let available = values.len() + j;
                (x.index(available), y.index(available))
            })
            .collect();
        let graph = build_sum_graph(&values, &adds);
        let node_count = graph.nodes.len();
        let edge_count = graph.edges.len();
        (
            Just(graph),
            Just((0..node_count).collect::<Vec<_>>()).prop_shuffle(),
            Just((0..edge_count).collect::<Vec<_>>()).prop_shuffle(),
        )
            .prop_map(|(graph, node_perm, edge_perm)| {
                let shuffled = reorder(&graph, &node_perm, &edge_perm);
                (graph, shuffled)
            })
    })
}

proptest! {
    #[test]
    fn authoring_order_never_reaches_the_plan((graph, shuffled) in arb_graph_pair()) {
        let (plan_a, map_a) = compile(&graph).unwrap();
        let (plan_b, map_b) = compile(&shuffled).unwrap();

        prop_assert_eq!(plan_a.hash(), plan_b.hash());
        prop_assert_eq!(plan_a.ops(), plan_b.ops());
        prop_assert_eq!(plan_a.layout(), plan_b.layout());
        prop_assert_eq!(map_a, map_b);
    }

    #[test]
    fn emitted_sequences_are_topologically_sound((graph, _) in arb_graph_pair()) {
        let (plan, _) = compile(&graph).unwrap();
        assert_reads_follow_writes(&plan);
    }

    #[test]
    fn any_constant_change_changes_the_hash(
        (graph, _) in arb_graph_pair(),
        pick in any::<prop::sample::Index>(),
    ) {
        let const_positions: Vec<usize> = graph
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node.kind, NodeKind::ConstNumber { .. }))
            .map(|(i, _)| i)
            .collect();
        let position = const_positions[pick.index(const_positions.len())];

        let mut changed = graph.clone();
        if let NodeKind::ConstNumber { value } = changed.nodes[position].kind {
            changed.nodes[position].kind = NodeKind::ConstNumber { value: value + 1.0 };
        }

        let (plan_a, _) = compile(&graph).unwrap();
        let (plan_b, _) = compile(&changed).unwrap();
        prop_assert_ne!(plan_a.hash(), plan_b.hash());
    }
}

/// The hand-written version of the ordering property: two structurally
/// identical graphs authored in different node/edge order compile to equal
/// hashes and equal instruction arrays.
#[test]
fn structurally_equal_graphs_compile_identically() {
    let values = [10.0, 20.0, 30.0];
    let adds = [(0, 1), (3, 2)];
    let graph = build_sum_graph(&values, &adds);

    let node_perm = [5, 3, 0, 4, 2, 1];
    let edge_perm = [2, 0, 3, 1];
    let shuffled = reorder(&graph, &node_perm, &edge_perm);

    let (plan_a, map_a) = compile(&graph).unwrap();
    let (plan_b, map_b) = compile(&shuffled).unwrap();

    assert_eq!(plan_a.hash(), plan_b.hash());
    assert_eq!(plan_a.ops(), plan_b.ops());
    assert_eq!(plan_a.layout(), plan_b.layout());
    assert_eq!(map_a, map_b);
}

#[test]
fn compiled_plan_survives_json_roundtrip() {
    let graph = build_sum_graph(&[1.5, 2.5], &[(0, 1)]);
    let (plan, _) = compile(&graph).unwrap();

    let json = serde_json::to_string(&plan).unwrap();
    let back: ExecPlan = serde_json::from_str(&json).unwrap();

    assert_eq!(plan, back);
    assert_eq!(plan.hash(), back.hash());
}
