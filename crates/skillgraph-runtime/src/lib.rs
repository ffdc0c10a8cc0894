//! Execution runtime for compiled effect plans.
//!
//! The virtual machine ([`vm::PlanRunner`]) interprets a compiled plan
//! against flat slot storage under strict op/command budgets, emitting
//! deferred commands. The orchestrator ([`simulator::BattleSimulator`])
//! drains a ring-buffer event queue, binds events to registered plans,
//! runs the VM, and commits the command buffer to world state in one bulk
//! pass -- single-threaded, run-to-completion, with structural cost bounds
//! instead of wall-clock timeouts.

pub mod budget;
pub mod command;
pub mod event;
pub mod model;
pub mod pipeline;
pub mod rng;
pub mod simulator;
pub mod slots;
pub mod trace;
pub mod vm;
pub mod world;

pub use budget::ExecutionBudget;
pub use command::{Command, CommandBuffer};
pub use event::{EventEnvelope, EventKey, EventKind, EventQueue};
pub use model::{
    DamagePacket, DamageResult, DamageSpec, DefenseSnapshot, HitInstance, StatCollection,
    StatModifier, Unit,
};
pub use pipeline::{standard_pipeline, DamagePipeline, DamageStep, PipelineContext};
pub use rng::CombatRng;
pub use simulator::{BattleSimulator, SimulatorConfig};
pub use slots::SlotStorage;
pub use trace::{ExecutionTrace, NoopTrace, TraceRecorder, TraceSink};
pub use vm::{ExecutionContext, PlanRunner, VmError};
pub use world::BattleContext;
