//! Property expressions: the compiler contract the emitter relies on, the instruction
//! encoding, and the reference compiler.
//!
//! The emitter only needs two things from a compiler: a self-terminated instruction stream
//! written straight into the blob, and constant evaluation for variable defaults. Anything
//! implementing [`ExpressionCompiler`] can be plugged into the emitter builder.

use crate::error::ExpressionError;
use crate::project::{ComponentDefinition, FlowDefinition, ProjectDefinition, PropertyKind};
use crate::registry::AssetIndexRegistry;
use crate::writer::AssetWriter;

mod compiler;
pub mod disassembler;
pub mod instruction;
pub mod operations;
pub mod parser;

pub use compiler::StandardExpressionCompiler;
pub use disassembler::disassemble;
pub use instruction::{END_INSTRUCTION, Instruction, MAX_INSTRUCTION_PARAM, decode_stream};

/// What an expression can see while it is compiled for one component property.
pub struct ExpressionContext<'a> {
    /// Used to resolve identifiers and to register constants and value types.
    pub registry: &'a mut AssetIndexRegistry,
    pub project: &'a ProjectDefinition,
    pub flow: &'a FlowDefinition,
    pub flow_index: usize,
    pub component: &'a ComponentDefinition,
    pub component_index: usize,
}

/// Turns property expressions into VM instruction streams.
///
/// Implementations must be shareable across builds; all per-build state lives in the
/// [`ExpressionContext`].
pub trait ExpressionCompiler: Send + Sync {
    /// Writes the instruction stream for `expression`, terminated by `End`.
    ///
    /// On error the writer may hold a partial stream; the emitter rolls it back and writes
    /// the `End` placeholder instead.
    fn compile(
        &self,
        ctx: &mut ExpressionContext<'_>,
        writer: &mut AssetWriter,
        expression: &str,
        kind: PropertyKind,
    ) -> Result<(), ExpressionError>;

    /// Evaluates an expression that must not depend on runtime state (variable defaults).
    fn evaluate_constant(&self, expression: &str) -> Result<serde_json::Value, ExpressionError>;

    /// Operation names and their indices, for the generated defs.
    fn operations(&self) -> Vec<(String, u16)>;
}
