//! The event-driven simulation orchestrator.
//!
//! Run-to-completion model: one event is fully executed and committed
//! before the next is dequeued. Cost is bounded structurally -- op count,
//! command count, per-tick drain count, and trigger depth -- never by
//! wall clock.

use std::collections::HashMap;
use std::sync::Arc;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use skillgraph_codegen::ExecPlan;

use crate::budget::ExecutionBudget;
use crate::command::CommandBuffer;
use crate::event::{EventEnvelope, EventKey, EventKind, EventQueue};
use crate::trace::{NoopTrace, TraceSink};
use crate::vm::{ExecutionContext, PlanRunner};
use crate::world::BattleContext;

/// Safety limits and the master seed for one simulation instance.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Trigger chains are cut off at this depth.
    pub max_trigger_depth: u32,
    /// Instruction ceiling per event.
    pub max_ops_per_event: u32,
    /// Command ceiling per event.
    pub max_commands_per_event: u32,
    /// Events drained per tick; the rest roll over.
    pub max_events_per_tick: usize,
    /// Seeds the per-chain random-seed minting.
    pub master_seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            max_trigger_depth: 10,
            max_ops_per_event: 1000,
            max_commands_per_event: 100,
            max_events_per_tick: 100,
            master_seed: 0x5eed_0001,
        }
    }
}

/// Owns the world state, the event queue, the plan registry, and the
/// per-event budget; drives the VM over dequeued events.
pub struct BattleSimulator {
    context: BattleContext,
    queue: EventQueue,
    commands: CommandBuffer,
    budget: ExecutionBudget,
    plans: HashMap<EventKey, Arc<ExecPlan>>,
    config: SimulatorConfig,
    next_root_event_id: u32,
    seed_rng: ChaCha8Rng,
}

impl BattleSimulator {
    pub fn new(context: BattleContext) -> Self {
        Self::with_config(context, SimulatorConfig::default())
    }

    pub fn with_config(context: BattleContext, config: SimulatorConfig) -> Self {
        BattleSimulator {
            context,
            queue: EventQueue::new(128),
            commands: CommandBuffer::new(),
            budget: ExecutionBudget::new(config.max_ops_per_event, config.max_commands_per_event),
            plans: HashMap::new(),
            seed_rng: ChaCha8Rng::seed_from_u64(config.master_seed),
            next_root_event_id: 1,
            config,
        }
    }

    pub fn context(&self) -> &BattleContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut BattleContext {
        &mut self.context
    }

    /// Registers the plan executed for one event kind. Compiled plans are
    /// immutable, so registrations can share them freely.
    pub fn register_plan(&mut self, key: EventKey, plan: ExecPlan) {
        self.plans.insert(key, Arc::new(plan));
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Starts a new trigger chain: mints a fresh root-event id and a
    /// deterministic random seed, then enqueues at depth zero.
    pub fn enqueue(&mut self, event: EventKind) {
        let root_event_id = self.next_root_event_id;
        self.next_root_event_id += 1;
        let random_seed = self.seed_rng.next_u32();
        self.queue.enqueue(EventEnvelope {
            root_event_id,
            trigger_depth: 0,
            random_seed,
            payload: event,
        });
    }

    /// Enqueues an event caused by another event, inheriting the chain's
    /// root id and seed. Returns `false` when the depth limit rejects it --
    /// a deliberate policy drop, not an error.
    pub fn enqueue_triggered(
        &mut self,
        event: EventKind,
        root_event_id: u32,
        trigger_depth: u32,
        random_seed: u32,
    ) -> bool {
        if trigger_depth >= self.config.max_trigger_depth {
            warn!(
                trigger_depth,
                limit = self.config.max_trigger_depth,
                root_event_id,
                "trigger depth limit reached; event rejected"
            );
            return false;
        }
        self.queue.enqueue(EventEnvelope {
            root_event_id,
            trigger_depth,
            random_seed,
            payload: event,
        });
        true
    }

    /// Drains up to the per-tick cap, strictly FIFO. Call once per tick.
    /// Returns the number of events processed; the remainder rolls over.
    pub fn process_events(&mut self) -> usize {
        let mut tracer = NoopTrace;
        self.process_events_with(&mut tracer)
    }

    /// Like [`process_events`](Self::process_events) with an injected trace
    /// sink. Behavior is identical minus the recorded data.
    pub fn process_events_with(&mut self, tracer: &mut dyn TraceSink) -> usize {
        let mut processed = 0;
        while processed < self.config.max_events_per_tick {
            let Some(envelope) = self.queue.try_dequeue() else {
                break;
            };
            self.process_single_event(envelope, tracer);
            processed += 1;
        }

        if !self.queue.is_empty() {
            debug!(
                pending = self.queue.len(),
                processed, "per-tick cap reached; events roll over"
            );
        }
        processed
    }

    /// Plan lookup, context build, budget reset, VM run, bulk commit.
    fn process_single_event(&mut self, envelope: EventEnvelope, tracer: &mut dyn TraceSink) {
        let Some(plan) = self.plans.get(&envelope.payload.key()).map(Arc::clone) else {
            warn!(event = envelope.payload.label(), "no plan registered for event kind; skipping");
            return;
        };

        let mut ctx = ExecutionContext::for_event(&envelope, plan.layout());
        self.budget.reset();

        let runner = PlanRunner::new(&self.context);
        if let Err(error) = runner.execute(
            &plan,
            &mut ctx,
            &mut self.budget,
            &mut self.commands,
            tracer,
        ) {
            warn!(
                %error,
                event = envelope.payload.label(),
                root_event_id = envelope.root_event_id,
                trigger_depth = envelope.trigger_depth,
                "plan execution aborted"
            );
        }

        // Commands emitted before an abort still commit; there is no
        // rollback.
        self.commands.apply_all(&mut self.context);
        ctx.slots.clear();
    }
}
