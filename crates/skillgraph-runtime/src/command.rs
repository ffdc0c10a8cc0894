//! Deferred world-state mutations.
//!
//! The VM never touches world state directly; it pushes commands into a
//! [`CommandBuffer`], and the orchestrator applies the whole buffer in one
//! bulk pass after the VM returns. Two phases, never interleaved.

use std::fmt;

use serde::{Deserialize, Serialize};

use skillgraph_core::combat::UnitId;

use crate::model::{DamageSpec, StatModifier};
use crate::world::BattleContext;

/// The closed set of deferred mutations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    ApplyDamage(DamageSpec),
    ApplyModifier { target: UnitId, modifier: StatModifier },
}

impl Command {
    /// Applies this command to world state.
    pub fn apply(&self, context: &mut BattleContext) {
        match self {
            Command::ApplyDamage(spec) => {
                if spec.base_value <= 0 {
                    return;
                }
                context.apply_damage(spec.target, spec.base_value);
            }
            Command::ApplyModifier { target, modifier } => {
                context.apply_modifier(*target, *modifier);
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::ApplyDamage(spec) => write!(
                f,
                "ApplyDamage({} -> {}, {} {:?})",
                spec.source, spec.target, spec.base_value, spec.kind
            ),
            Command::ApplyModifier { target, modifier } => write!(
                f,
                "ApplyModifier({} {:?} {:+})",
                target, modifier.stat, modifier.delta
            ),
        }
    }
}

/// Growable buffer of deferred commands with bulk application.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        CommandBuffer::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Applies every queued command in emission order, then empties the
    /// buffer.
    pub fn apply_all(&mut self, context: &mut BattleContext) {
        for command in self.commands.drain(..) {
            command.apply(context);
        }
    }
}
