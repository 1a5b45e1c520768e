//! # Intermediate Representation (IR) Model
//!
//! Read-only program model consumed by the analysis: modules own a type
//! arena and functions; functions own basic blocks in layout order; blocks
//! own SSA instructions.
//!
//! ## Module Structure
//!
//! ```text
//! ir/
//! ├── mod.rs          # This file - module definition and re-exports
//! ├── types.rs        # TypeId, Type, TypeTable (arena, widths, rendering)
//! ├── instruction.rs  # InstId, BlockId, FuncId, Value, InstKind, Instruction
//! ├── program.rs      # BasicBlock, Param, Function, Module
//! └── builder.rs      # FunctionBuilder for assembling bodies
//! ```
//!
//! ## Key Types
//!
//! - [`TypeTable`] - Arena of [`Type`]s; struct fields refer to other ids so
//!   recursive records are representable
//! - [`Instruction`] - One SSA instruction with its [`InstKind`] payload
//! - [`Function`] - Parameters, metadata and blocks; no blocks = declaration
//! - [`Module`] - Functions plus the shared type arena

mod builder;
mod instruction;
mod program;
mod types;

pub use builder::FunctionBuilder;
pub use instruction::{
    BinaryOp, BlockId, Callee, FuncId, InstId, InstKind, Instruction, Value,
};
pub use program::{BasicBlock, Function, Module, Param, SourceLocation};
pub use types::{Type, TypeId, TypeTable};
