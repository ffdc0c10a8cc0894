//! Optional execution tracing.
//!
//! The VM calls a [`TraceSink`] at fixed points. The trait methods default
//! to no-ops and [`NoopTrace`] is the standard "tracing off" sink, so the
//! hot path never branches on whether tracing is enabled -- and running
//! without a recorder behaves identically minus the recorded data.

use serde::Serialize;

use skillgraph_codegen::Op;
use skillgraph_core::combat::UnitId;

use crate::command::Command;
use crate::vm::ExecutionContext;

/// Hook invoked by the VM at fixed points during plan execution.
pub trait TraceSink {
    fn begin_trace(&mut self, _ctx: &ExecutionContext, _plan_hash: u64) {}
    fn record_op_begin(&mut self, _op_index: usize, _op: &Op) {}
    fn record_op_end(&mut self, _op_index: usize, _micros: u64) {}
    fn record_command(&mut self, _command: &Command, _op_index: usize) {}
    fn end_trace(&mut self, _total_micros: u64) {}
}

/// The "tracing off" sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrace;

impl TraceSink for NoopTrace {}

/// Record of one executed instruction.
#[derive(Debug, Clone, Serialize)]
pub struct OpRecord {
    pub index: usize,
    pub op: String,
    pub micros: u64,
}

/// Record of one emitted command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRecord {
    pub command: String,
    pub emitted_at_op: usize,
}

/// Complete trace of one event's plan execution, serializable for export.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionTrace {
    pub event_label: String,
    pub root_event_id: u32,
    pub trigger_depth: u32,
    pub random_seed: u32,
    pub plan_hash: u64,
    pub caster: UnitId,
    pub target: UnitId,
    pub ops: Vec<OpRecord>,
    pub commands: Vec<CommandRecord>,
    pub total_micros: u64,
}

/// The standard recording sink.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    trace: ExecutionTrace,
    pending_op: Option<(usize, String)>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        TraceRecorder::default()
    }

    pub fn trace(&self) -> &ExecutionTrace {
        &self.trace
    }

    pub fn into_trace(self) -> ExecutionTrace {
        self.trace
    }
}

impl TraceSink for TraceRecorder {
    fn begin_trace(&mut self, ctx: &ExecutionContext, plan_hash: u64) {
        self.trace = ExecutionTrace {
            event_label: ctx.event_label.to_string(),
            root_event_id: ctx.root_event_id,
            trigger_depth: ctx.trigger_depth,
            random_seed: ctx.random_seed,
            plan_hash,
            caster: ctx.caster,
            target: ctx.target,
            ..ExecutionTrace::default()
        };
        self.pending_op = None;
    }

    fn record_op_begin(&mut self, op_index: usize, op: &Op) {
        self.pending_op = Some((op_index, op.to_string()));
    }

    fn record_op_end(&mut self, op_index: usize, micros: u64) {
        let op = match self.pending_op.take() {
            Some((begun_index, op)) if begun_index == op_index => op,
            _ => String::new(),
        };
        self.trace.ops.push(OpRecord { index: op_index, op, micros });
    }

    fn record_command(&mut self, command: &Command, op_index: usize) {
        self.trace.commands.push(CommandRecord {
            command: command.to_string(),
            emitted_at_op: op_index,
        });
    }

    fn end_trace(&mut self, total_micros: u64) {
        self.trace.total_micros = total_micros;
    }
}
