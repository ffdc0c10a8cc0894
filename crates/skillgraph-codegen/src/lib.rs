//! Effect-graph to bytecode compilation.
//!
//! [`compile`] turns a validated [`EffectGraph`] into an immutable
//! [`ExecPlan`]: a linear, dependency-ordered instruction array addressed
//! entirely through flat per-kind value slots, plus a canonical 64-bit
//! content hash usable as an external cache key.
//!
//! The instruction sequence is canonical: graphs that differ only in
//! node/edge authoring order compile to identical plans and identical
//! hashes, which is what lets incremental builds skip recompilation when
//! nothing semantically changed.
//!
//! [`EffectGraph`]: skillgraph_core::EffectGraph

pub mod compiler;
pub mod error;
pub mod hash;
pub mod plan;

pub use compiler::compile;
pub use error::CompileError;
pub use hash::plan_hash;
pub use plan::{ExecPlan, Op, OpCode, SlotLayout};
