//! Scripted damage resolution: crit roll, resist scaling, finalization.
//!
//! This is the simpler, step-based path some event types take instead of a
//! compiled plan -- just another consumer of the same world state. Steps
//! run in order over a mutable context; each step owns one concern.

use tracing::debug;

use skillgraph_core::combat::{DamageKind, StatKind};

use crate::model::{DamagePacket, DamageResult, DefenseSnapshot, HitInstance};
use crate::world::BattleContext;

/// Mutable state threaded through the steps of one resolution.
#[derive(Debug)]
pub struct PipelineContext {
    pub hit: HitInstance,
    pub current_damage: DamagePacket,
    pub is_crit: bool,
    pub is_hit: bool,
    pub is_blocked: bool,
}

impl PipelineContext {
    fn new(hit: HitInstance) -> Self {
        let current_damage = hit.base_damage;
        PipelineContext {
            hit,
            current_damage,
            is_crit: false,
            is_hit: true,
            is_blocked: false,
        }
    }
}

/// One resolution step.
pub trait DamageStep {
    fn name(&self) -> &'static str;
    fn execute(&self, world: &BattleContext, ctx: &mut PipelineContext);
}

/// An ordered list of steps resolving a hit into a [`DamageResult`].
#[derive(Default)]
pub struct DamagePipeline {
    steps: Vec<Box<dyn DamageStep>>,
}

impl DamagePipeline {
    pub fn new() -> Self {
        DamagePipeline::default()
    }

    pub fn push_step(&mut self, step: Box<dyn DamageStep>) {
        self.steps.push(step);
    }

    pub fn resolve(&self, world: &BattleContext, hit: HitInstance) -> DamageResult {
        let mut ctx = PipelineContext::new(hit);
        for step in &self.steps {
            step.execute(world, &mut ctx);
            debug!(
                step = step.name(),
                damage = ctx.current_damage.total(),
                crit = ctx.is_crit,
                "pipeline step complete"
            );
        }
        DamageResult {
            final_damage: ctx.current_damage,
            is_crit: ctx.is_crit,
            is_hit: ctx.is_hit,
            is_blocked: ctx.is_blocked,
        }
    }
}

/// The standard resolution order: crit roll, resist scaling, finalize.
pub fn standard_pipeline() -> DamagePipeline {
    let mut pipeline = DamagePipeline::new();
    pipeline.push_step(Box::new(RollCritStep));
    pipeline.push_step(Box::new(ApplyResistStep));
    pipeline.push_step(Box::new(FinalizeStep));
    pipeline
}

/// Rolls the caster's crit chance against the hit's deterministic RNG and
/// scales all damage by the crit multiplier on success.
struct RollCritStep;

impl DamageStep for RollCritStep {
    fn name(&self) -> &'static str {
        "RollCrit"
    }

    fn execute(&self, world: &BattleContext, ctx: &mut PipelineContext) {
        let Some(caster) = world.unit(ctx.hit.source) else {
            ctx.is_crit = false;
            return;
        };

        let crit_chance = caster.stats.get(StatKind::CritChance) as f32 / 100.0;
        if !ctx.hit.rng.roll(crit_chance) {
            return;
        }
        ctx.is_crit = true;

        let mut crit_multiplier = caster.stats.get(StatKind::CritMultiplier) as f32;
        if crit_multiplier == 0.0 {
            crit_multiplier = 150.0;
        }
        ctx.current_damage = ctx.current_damage.scale(crit_multiplier / 100.0);
    }
}

/// Scales each damage component by `1 - resist`, reading the hit's captured
/// snapshot or, when unset, the target's live stats. Negative resists
/// amplify.
struct ApplyResistStep;

impl DamageStep for ApplyResistStep {
    fn name(&self) -> &'static str {
        "ApplyResist"
    }

    fn execute(&self, world: &BattleContext, ctx: &mut PipelineContext) {
        let Some(target) = world.unit(ctx.hit.target) else {
            return;
        };

        let defense = if ctx.hit.defense.is_unset() {
            DefenseSnapshot::from_stats(&target.stats)
        } else {
            ctx.hit.defense
        };

        for kind in DamageKind::ALL {
            let value = ctx.current_damage.value(kind);
            ctx.current_damage.set_value(kind, value * (1.0 - defense.resist(kind)));
        }
    }
}

/// Clamps every component at zero.
struct FinalizeStep;

impl DamageStep for FinalizeStep {
    fn name(&self) -> &'static str {
        "Finalize"
    }

    fn execute(&self, _world: &BattleContext, ctx: &mut PipelineContext) {
        for kind in DamageKind::ALL {
            let value = ctx.current_damage.value(kind);
            if value < 0.0 {
                ctx.current_damage.set_value(kind, 0.0);
            }
        }
    }
}
