//! The bytecode virtual machine.
//!
//! Instructions run strictly in array order -- the compiler already
//! guaranteed every read is preceded by its write, so the VM never
//! reorders or schedules. The runner holds no state of its own across
//! calls; everything mutable lives in the caller-owned context, budget,
//! and command buffer, which is what lets one runner execute many plans
//! back to back.

use std::time::Instant;

use thiserror::Error;

use skillgraph_codegen::{ExecPlan, Op, OpCode, SlotLayout};
use skillgraph_core::combat::{DamageKind, StatKind, UnitId};

use crate::budget::ExecutionBudget;
use crate::command::{Command, CommandBuffer};
use crate::event::EventEnvelope;
use crate::model::DamageSpec;
use crate::slots::SlotStorage;
use crate::trace::TraceSink;
use crate::world::BattleContext;

/// Per-event execution state: trigger metadata, bound caster/target, and
/// the rented slot storage. Freshly built for every dequeued event and
/// never shared across events.
#[derive(Debug)]
pub struct ExecutionContext {
    pub root_event_id: u32,
    pub trigger_depth: u32,
    pub random_seed: u32,
    pub event_label: &'static str,
    pub caster: UnitId,
    /// `UnitId::NONE` for event kinds without a target.
    pub target: UnitId,
    pub slots: SlotStorage,
}

impl ExecutionContext {
    /// Builds the context for one event against a plan's slot layout.
    pub fn for_event(envelope: &EventEnvelope, layout: SlotLayout) -> Self {
        ExecutionContext {
            root_event_id: envelope.root_event_id,
            trigger_depth: envelope.trigger_depth,
            random_seed: envelope.random_seed,
            event_label: envelope.payload.label(),
            caster: envelope.payload.caster(),
            target: envelope.payload.target().unwrap_or(UnitId::NONE),
            slots: SlotStorage::rent(layout),
        }
    }
}

/// Execution failures. All are recoverable at the orchestrator level: the
/// event is reported and the simulation continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// The op budget ran out before instruction `index`; that instruction
    /// and everything after it did not execute.
    #[error("op budget exhausted at op {index}/{total}")]
    OpBudgetExhausted { index: usize, total: usize },

    /// The command budget ran out at instruction `index`; the command was
    /// not enqueued.
    #[error("command budget exhausted at op {index}")]
    CommandBudgetExhausted { index: usize },
}

/// Interprets compiled plans against battle state.
pub struct PlanRunner<'w> {
    context: &'w BattleContext,
}

impl<'w> PlanRunner<'w> {
    pub fn new(context: &'w BattleContext) -> Self {
        PlanRunner { context }
    }

    /// Executes a plan to completion or to its first budget failure.
    ///
    /// Commands pushed before a failure stay in the buffer; partial,
    /// bounded application is intentional and the caller decides when to
    /// commit.
    pub fn execute(
        &self,
        plan: &ExecPlan,
        ctx: &mut ExecutionContext,
        budget: &mut ExecutionBudget,
        commands: &mut CommandBuffer,
        tracer: &mut dyn TraceSink,
    ) -> Result<(), VmError> {
        let started = Instant::now();
        tracer.begin_trace(ctx, plan.hash());

        let total = plan.ops().len();
        for (index, op) in plan.ops().iter().enumerate() {
            if !budget.try_charge_op() {
                return Err(VmError::OpBudgetExhausted { index, total });
            }

            let op_started = Instant::now();
            tracer.record_op_begin(index, op);

            match op.code {
                OpCode::ConstNumber => {
                    ctx.slots.numbers[op.out as usize] = f32::from_bits(op.a);
                }
                OpCode::GetStat => self.exec_get_stat(op, ctx),
                OpCode::Add => {
                    ctx.slots.numbers[op.out as usize] =
                        ctx.slots.numbers[op.a as usize] + ctx.slots.numbers[op.b as usize];
                }
                OpCode::Mul => {
                    ctx.slots.numbers[op.out as usize] =
                        ctx.slots.numbers[op.a as usize] * ctx.slots.numbers[op.b as usize];
                }
                OpCode::GetCaster => {
                    ctx.slots.entities[op.out as usize] = ctx.caster;
                }
                OpCode::GetTarget => {
                    ctx.slots.entities[op.out as usize] = ctx.target;
                }
                OpCode::MakeDamage => exec_make_damage(op, ctx),
                OpCode::EmitApplyDamage => {
                    if !budget.try_charge_command() {
                        return Err(VmError::CommandBudgetExhausted { index });
                    }
                    let spec = ctx.slots.damage_specs[op.a as usize];
                    let command = Command::ApplyDamage(spec);
                    tracer.record_command(&command, index);
                    commands.push(command);
                }
            }

            tracer.record_op_end(index, op_started.elapsed().as_micros() as u64);
        }

        tracer.end_trace(started.elapsed().as_micros() as u64);
        Ok(())
    }

    /// Stat read. An unknown unit degrades to 0 -- entity-lifetime races
    /// between enqueue and execution are expected, not faults.
    fn exec_get_stat(&self, op: &Op, ctx: &mut ExecutionContext) {
        let unit_id = ctx.slots.entities[op.b as usize];
        let value = match (StatKind::from_index(op.a), self.context.unit(unit_id)) {
            (Some(stat), Some(unit)) => unit.stats.get(stat) as f32,
            _ => {
                tracing::debug!(unit = %unit_id, stat = op.a, "stat read missed; defaulting to 0");
                0.0
            }
        };
        ctx.slots.numbers[op.out as usize] = value;
    }
}

/// Builds a damage spec from the caster, the target slot, and the
/// truncated amount, carrying the declared damage kind from operand `c`.
fn exec_make_damage(op: &Op, ctx: &mut ExecutionContext) {
    let amount = ctx.slots.numbers[op.a as usize] as i32;
    let target = ctx.slots.entities[op.b as usize];
    let kind = DamageKind::from_index(op.c).unwrap_or_default();
    ctx.slots.damage_specs[op.out as usize] = DamageSpec::new(ctx.caster, target, amount, kind);
}
