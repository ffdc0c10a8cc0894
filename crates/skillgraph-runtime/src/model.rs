//! Combat data model: units, stats, damage specifications and packets.

use serde::{Deserialize, Serialize};

use skillgraph_core::combat::{DamageKind, StatKind, UnitId};

use crate::rng::CombatRng;

/// A combat unit: identity plus a flat stat block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub stats: StatCollection,
}

impl Unit {
    pub fn new(id: UnitId, stats: StatCollection) -> Self {
        Unit { id, stats }
    }

    pub fn is_alive(&self) -> bool {
        self.stats.get(StatKind::Health) > 0
    }
}

/// Flat integer stat block indexed by [`StatKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCollection {
    values: [i32; StatKind::COUNT],
}

impl StatCollection {
    pub fn new() -> Self {
        StatCollection::default()
    }

    pub fn get(&self, stat: StatKind) -> i32 {
        self.values[stat.index() as usize]
    }

    pub fn set(&mut self, stat: StatKind, value: i32) {
        self.values[stat.index() as usize] = value;
    }

    pub fn apply_modifier(&mut self, modifier: StatModifier) {
        self.values[modifier.stat.index() as usize] += modifier.delta;
    }

    /// Builder-style stat assignment for setup code.
    pub fn with(mut self, stat: StatKind, value: i32) -> Self {
        self.set(stat, value);
        self
    }
}

/// A signed delta applied to one stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: StatKind,
    pub delta: i32,
}

impl StatModifier {
    pub fn new(stat: StatKind, delta: i32) -> Self {
        StatModifier { stat, delta }
    }
}

/// A fully-resolved request to damage one unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageSpec {
    pub source: UnitId,
    pub target: UnitId,
    pub base_value: i32,
    pub kind: DamageKind,
}

impl DamageSpec {
    pub fn new(source: UnitId, target: UnitId, base_value: i32, kind: DamageKind) -> Self {
        DamageSpec { source, target, base_value, kind }
    }
}

/// Multi-component damage: one independent value per [`DamageKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamagePacket {
    pub physical: f32,
    pub fire: f32,
    pub cold: f32,
    pub lightning: f32,
    pub chaos: f32,
}

impl DamagePacket {
    /// A packet carrying a single component.
    pub fn of(kind: DamageKind, value: f32) -> Self {
        let mut packet = DamagePacket::default();
        packet.set_value(kind, value);
        packet
    }

    pub fn value(&self, kind: DamageKind) -> f32 {
        match kind {
            DamageKind::Physical => self.physical,
            DamageKind::Fire => self.fire,
            DamageKind::Cold => self.cold,
            DamageKind::Lightning => self.lightning,
            DamageKind::Chaos => self.chaos,
        }
    }

    pub fn set_value(&mut self, kind: DamageKind, value: f32) {
        match kind {
            DamageKind::Physical => self.physical = value,
            DamageKind::Fire => self.fire = value,
            DamageKind::Cold => self.cold = value,
            DamageKind::Lightning => self.lightning = value,
            DamageKind::Chaos => self.chaos = value,
        }
    }

    pub fn total(&self) -> f32 {
        self.physical + self.fire + self.cold + self.lightning + self.chaos
    }

    /// All components scaled by one factor.
    pub fn scale(&self, factor: f32) -> Self {
        DamagePacket {
            physical: self.physical * factor,
            fire: self.fire * factor,
            cold: self.cold * factor,
            lightning: self.lightning * factor,
            chaos: self.chaos * factor,
        }
    }
}

/// Target defenses captured at resolution time, as fractions (0.25 = 25%
/// reduction; negative values amplify).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DefenseSnapshot {
    resists: [f32; 5],
}

impl DefenseSnapshot {
    pub fn new(resists: [f32; 5]) -> Self {
        DefenseSnapshot { resists }
    }

    /// Reads resist percentages out of a live stat block.
    pub fn from_stats(stats: &StatCollection) -> Self {
        DefenseSnapshot {
            resists: [
                stats.get(StatKind::PhysicalResist) as f32 / 100.0,
                stats.get(StatKind::FireResist) as f32 / 100.0,
                stats.get(StatKind::ColdResist) as f32 / 100.0,
                stats.get(StatKind::LightningResist) as f32 / 100.0,
                stats.get(StatKind::ChaosResist) as f32 / 100.0,
            ],
        }
    }

    pub fn resist(&self, kind: DamageKind) -> f32 {
        self.resists[kind.index() as usize]
    }

    /// An all-zero snapshot means "not captured"; resolution falls back to
    /// the target's live stats.
    pub fn is_unset(&self) -> bool {
        self.resists.iter().all(|resist| *resist == 0.0)
    }
}

/// One hit being resolved: endpoints, seeded randomness, initial damage,
/// and captured defenses.
#[derive(Debug, Clone)]
pub struct HitInstance {
    pub source: UnitId,
    pub target: UnitId,
    pub rng: CombatRng,
    pub base_damage: DamagePacket,
    pub defense: DefenseSnapshot,
}

impl HitInstance {
    pub fn new(source: UnitId, target: UnitId, seed: u32) -> Self {
        HitInstance {
            source,
            target,
            rng: CombatRng::from_seed(seed),
            base_damage: DamagePacket::default(),
            defense: DefenseSnapshot::default(),
        }
    }

    pub fn with_base_damage(mut self, base_damage: DamagePacket) -> Self {
        self.base_damage = base_damage;
        self
    }
}

/// Final outcome of a resolved hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DamageResult {
    pub final_damage: DamagePacket,
    pub is_crit: bool,
    pub is_hit: bool,
    pub is_blocked: bool,
}

impl DamageResult {
    pub fn total(&self) -> f32 {
        self.final_damage.total()
    }
}
