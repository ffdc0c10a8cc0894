//! Shared combat vocabulary: unit identity, stat kinds, damage kinds.
//!
//! These types are referenced from all layers -- graph parameters name stat
//! and damage kinds, the compiler encodes them into instruction operands,
//! and the runtime reads them back when executing against world state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable unit identifier.
///
/// A plain handle into the battle's unit registry. Slot storage defaults
/// entity slots to [`UnitId::NONE`]; reads through a `NONE` or vanished id
/// degrade to zero values rather than failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Sentinel for "no unit". Never registered in a battle.
    pub const NONE: UnitId = UnitId(0);
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of unit stats.
///
/// Indices are stable wire values: they appear in instruction operands and
/// in the canonical plan hash, so variants must never be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StatKind {
    Health = 0,
    MaxHealth = 1,
    /// Crit chance in percent, 0..=100.
    CritChance = 2,
    /// Crit multiplier in percent; 150 means 1.5x.
    CritMultiplier = 3,
    /// Elemental resists in percent, may be negative.
    PhysicalResist = 4,
    FireResist = 5,
    ColdResist = 6,
    LightningResist = 7,
    ChaosResist = 8,
    Armor = 9,
    Evasion = 10,
}

impl StatKind {
    /// Number of stat kinds; sizes the flat stat array per unit.
    pub const COUNT: usize = 11;

    /// Stable operand/wire index.
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Inverse of [`index`](Self::index). Out-of-range values return `None`.
    pub fn from_index(index: u32) -> Option<StatKind> {
        match index {
            0 => Some(StatKind::Health),
            1 => Some(StatKind::MaxHealth),
            2 => Some(StatKind::CritChance),
            3 => Some(StatKind::CritMultiplier),
            4 => Some(StatKind::PhysicalResist),
            5 => Some(StatKind::FireResist),
            6 => Some(StatKind::ColdResist),
            7 => Some(StatKind::LightningResist),
            8 => Some(StatKind::ChaosResist),
            9 => Some(StatKind::Armor),
            10 => Some(StatKind::Evasion),
            _ => None,
        }
    }
}

/// The closed set of damage kinds.
///
/// Indices are stable wire values (instruction operand `c` of `MakeDamage`
/// and the canonical plan hash).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DamageKind {
    #[default]
    Physical = 0,
    Fire = 1,
    Cold = 2,
    Lightning = 3,
    Chaos = 4,
}

impl DamageKind {
    /// All kinds, in wire-index order.
    pub const ALL: [DamageKind; 5] = [
        DamageKind::Physical,
        DamageKind::Fire,
        DamageKind::Cold,
        DamageKind::Lightning,
        DamageKind::Chaos,
    ];

    /// Stable operand/wire index.
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Inverse of [`index`](Self::index). Out-of-range values return `None`.
    pub fn from_index(index: u32) -> Option<DamageKind> {
        match index {
            0 => Some(DamageKind::Physical),
            1 => Some(DamageKind::Fire),
            2 => Some(DamageKind::Cold),
            3 => Some(DamageKind::Lightning),
            4 => Some(DamageKind::Chaos),
            _ => None,
        }
    }
}
