//! Effect-graph nodes and the closed node-kind union.
//!
//! [`NodeKind`] is a tagged union over every authorable operation, with
//! typed parameter records on the variants that carry parameters. Dispatch
//! in the compiler is an exhaustive match over this enum, so a new kind
//! cannot be added without every emitter site being revisited.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::combat::{DamageKind, StatKind};
use crate::port::{Port, PortDirection, ValueKind};

/// The closed set of node kinds.
///
/// `kind_code()` values are stable wire bytes: they feed the canonical plan
/// hash and must never be renumbered. Gaps in the numbering group related
/// kinds (entry markers, scalar ops, probability/control, entity access,
/// spec construction, command emission).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Entry marker for cast-triggered graphs. Emits no instructions.
    OnCastEntry,
    /// Entry marker for hit-triggered graphs. Emits no instructions.
    OnHitEntry,
    /// Constant scalar.
    ConstNumber { value: f32 },
    /// Read a unit stat into a number.
    GetStat { stat: StatKind },
    Add,
    Mul,
    /// Probability roll against the event's deterministic seed.
    RollChance { chance: f32 },
    Branch,
    GetCaster,
    GetTarget,
    /// Spatial query around the caster.
    FindTargetsInRadius { radius: f32 },
    /// Build a damage specification of the declared kind.
    MakeDamageSpec { damage: DamageKind },
    EmitApplyDamageCommand,
    EmitApplyModifierCommand { stat: StatKind, delta: i32 },
}

impl NodeKind {
    /// Stable hash/wire byte for this kind.
    pub fn kind_code(&self) -> u8 {
        match self {
            NodeKind::OnCastEntry => 1,
            NodeKind::OnHitEntry => 2,
            NodeKind::ConstNumber { .. } => 10,
            NodeKind::GetStat { .. } => 11,
            NodeKind::Add => 12,
            NodeKind::Mul => 13,
            NodeKind::RollChance { .. } => 20,
            NodeKind::Branch => 21,
            NodeKind::GetCaster => 30,
            NodeKind::GetTarget => 31,
            NodeKind::FindTargetsInRadius { .. } => 32,
            NodeKind::MakeDamageSpec { .. } => 40,
            NodeKind::EmitApplyDamageCommand => 50,
            NodeKind::EmitApplyModifierCommand { .. } => 51,
        }
    }

    /// Human-oriented kind name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::OnCastEntry => "OnCastEntry",
            NodeKind::OnHitEntry => "OnHitEntry",
            NodeKind::ConstNumber { .. } => "ConstNumber",
            NodeKind::GetStat { .. } => "GetStat",
            NodeKind::Add => "Add",
            NodeKind::Mul => "Mul",
            NodeKind::RollChance { .. } => "RollChance",
            NodeKind::Branch => "Branch",
            NodeKind::GetCaster => "GetCaster",
            NodeKind::GetTarget => "GetTarget",
            NodeKind::FindTargetsInRadius { .. } => "FindTargetsInRadius",
            NodeKind::MakeDamageSpec { .. } => "MakeDamageSpec",
            NodeKind::EmitApplyDamageCommand => "EmitApplyDamageCommand",
            NodeKind::EmitApplyModifierCommand { .. } => "EmitApplyModifierCommand",
        }
    }

    /// Returns `true` for entry markers, which compile to zero instructions.
    pub fn is_entry(&self) -> bool {
        matches!(self, NodeKind::OnCastEntry | NodeKind::OnHitEntry)
    }

    /// Canonical `(key, value-bits)` parameter pairs for hashing.
    ///
    /// Keys are listed in a fixed order per variant (alphabetical), so the
    /// accumulation is canonical without sorting at hash time. Float
    /// parameters contribute their raw bit patterns.
    pub fn canonical_params(&self) -> SmallVec<[(&'static str, u32); 2]> {
        match self {
            NodeKind::ConstNumber { value } => smallvec::smallvec![("value", value.to_bits())],
            NodeKind::GetStat { stat } => smallvec::smallvec![("statType", stat.index())],
            NodeKind::RollChance { chance } => smallvec::smallvec![("chance", chance.to_bits())],
            NodeKind::FindTargetsInRadius { radius } => {
                smallvec::smallvec![("radius", radius.to_bits())]
            }
            NodeKind::MakeDamageSpec { damage } => {
                smallvec::smallvec![("damageType", damage.index())]
            }
            NodeKind::EmitApplyModifierCommand { stat, delta } => {
                smallvec::smallvec![("delta", *delta as u32), ("statType", stat.index())]
            }
            _ => SmallVec::new(),
        }
    }
}

/// A node in an effect graph: identity, operation, declared ports, and
/// free-form tags consumed by upstream rewrite passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// Declared ports keyed by name. Insertion-ordered for stable
    /// serialization; the compiler sorts by name where ordering matters.
    #[serde(default)]
    pub ports: IndexMap<String, Port>,
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub tags: SmallVec<[String; 2]>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Node {
            id: id.into(),
            kind,
            ports: IndexMap::new(),
            tags: SmallVec::new(),
        }
    }

    /// Builder-style port declaration.
    pub fn with_port(
        mut self,
        name: impl Into<String>,
        kind: ValueKind,
        direction: PortDirection,
    ) -> Self {
        self.ports.insert(name.into(), Port::new(kind, direction));
        self
    }

    /// Builder-style tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Iterates `(name, port)` pairs with the given direction.
    pub fn ports_with_direction(
        &self,
        direction: PortDirection,
    ) -> impl Iterator<Item = (&str, &Port)> {
        self.ports
            .iter()
            .filter(move |(_, port)| port.direction == direction)
            .map(|(name, port)| (name.as_str(), port))
    }
}
