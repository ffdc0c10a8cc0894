//! Bytecode plan types: opcodes, instructions, slot layout.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed instruction set. `u8` wire values are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    ConstNumber = 0,
    GetStat = 1,
    Add = 2,
    Mul = 3,
    MakeDamage = 4,
    EmitApplyDamage = 5,
    GetCaster = 6,
    GetTarget = 7,
}

/// One instruction. Operand meaning is opcode-specific:
///
/// | code | a | b | c | out |
/// |---|---|---|---|---|
/// | ConstNumber | f32 bits | - | - | number slot |
/// | GetStat | stat kind index | entity slot | - | number slot |
/// | Add / Mul | number slot | number slot | - | number slot |
/// | GetCaster / GetTarget | - | - | - | entity slot |
/// | MakeDamage | number slot (amount) | entity slot (target) | damage kind index | damage slot |
/// | EmitApplyDamage | damage slot | - | - | - |
///
/// Unused operands are zero. `c` exists to carry the declared damage kind
/// through `MakeDamage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Op {
    pub code: OpCode,
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub out: u32,
}

impl Op {
    /// Two-operand instruction, `c = 0`.
    pub fn new(code: OpCode, a: u32, b: u32, out: u32) -> Self {
        Op { code, a, b, c: 0, out }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.c != 0 {
            write!(f, "{:?}({}, {}, {}) -> {}", self.code, self.a, self.b, self.c, self.out)
        } else {
            write!(f, "{:?}({}, {}) -> {}", self.code, self.a, self.b, self.out)
        }
    }
}

/// Flat slot counts per value kind. Entity-reference and entity-list ports
/// share the entity array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotLayout {
    pub numbers: u32,
    pub entities: u32,
    pub damage_specs: u32,
}

impl SlotLayout {
    pub fn new(numbers: u32, entities: u32, damage_specs: u32) -> Self {
        SlotLayout { numbers, entities, damage_specs }
    }
}

/// A compiled, immutable execution plan.
///
/// Read-only after construction and therefore safely shareable across any
/// number of executions (and threads). External persistence round-trips the
/// instruction array, the three layout counts, and the hash losslessly via
/// serde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecPlan {
    hash: u64,
    ops: Vec<Op>,
    layout: SlotLayout,
}

impl ExecPlan {
    pub fn new(hash: u64, ops: Vec<Op>, layout: SlotLayout) -> Self {
        ExecPlan { hash, ops, layout }
    }

    /// Canonical 64-bit content hash of the source graph.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn layout(&self) -> SlotLayout {
        self.layout
    }
}
