//! # fnsig - Function Signature Analysis
//!
//! A static analysis engine that walks a compiled program's intermediate
//! representation and emits a structured **signature** per function: its
//! instruction count and call frequency, the loop nest with depth, trip
//! count, stride and loop-carried dependencies, the indexed memory reads and
//! writes, call sites, array allocations, and the bit footprint of every
//! parameter type. The signatures are meant as cost-model input for
//! offload and co-design tooling.
//!
//! ## Features
//!
//! - **Loop-nest walker** - every loop is bracketed exactly once, nested
//!   loops inside their parents, every instruction classified exactly once
//! - **Dependency classifier** - counts merge values carried around a loop,
//!   exempting the first unit-step induction variable
//! - **Type-size resolver** - recursive bit footprint with a trace, cycle
//!   guard and depth cap
//! - **Run-scoped function registry** - call sites show the instruction
//!   count of callees analyzed earlier in the run
//! - **Text and JSON reports**
//! - **Parallel module analysis** on a rayon pool with deterministic output
//!
//! ## Quick Start
//!
//! ```rust
//! use fnsig::ir::{BinaryOp, FunctionBuilder, Module, Param, Value};
//! use fnsig::oracle::{TripEstimate, TripTable};
//! use fnsig::Analyzer;
//!
//! # fn main() -> fnsig::Result<()> {
//! let mut module = Module::new("demo");
//! let void = module.types.void();
//! let i32t = module.types.scalar(32);
//! let p32 = module.types.pointer(i32t);
//! let f = module.declare_function("scale", vec![Param::new("v", p32)]);
//!
//! let mut b = FunctionBuilder::new(void);
//! let entry = b.add_block("entry");
//! let body = b.add_block("for.body");
//! let exit = b.add_block("for.end");
//! b.switch_to(entry);
//! b.br(body);
//!
//! b.switch_to(body);
//! let i = b.phi("i", vec![(Value::ConstInt(0), entry)], i32t);
//! let idx = b.element_ptr("arrayidx", Value::Arg(0), vec![i.clone()], p32);
//! let x = b.load("x", idx.clone(), i32t);
//! let y = b.binary("y", BinaryOp::Mul, x, Value::ConstInt(3), i32t);
//! b.store(y, idx);
//! let next = b.binary("i.next", BinaryOp::Add, i.clone(), Value::ConstInt(1), i32t);
//! b.add_incoming(&i, next.clone(), body);
//! b.cond_br(next, body, exit);
//!
//! b.switch_to(exit);
//! b.ret(None);
//! module.define_function(f, b.finish())?;
//!
//! let trips = TripTable::new().with(
//!     f,
//!     body,
//!     TripEstimate { trip_count: Some(16), range: Some((0, 15)) },
//! );
//! let report = Analyzer::default().analyze_module(&module, &trips)?;
//!
//! assert_eq!(
//!     report.to_string(),
//!     "\
//! F[name:scale;call_freq:0;n_of_instructions:9;]{
//!   P[addr:%a0;name:v;type:*i32;n_bit:32;size:;]
//!   L[name:for.body;depth:1;iterations:16;stride:0;lcds:0;]{
//!     R[addr:%i3;name:arrayidx;offset:NA;]
//!     W[addr:%i5;name:arrayidx;offset:NA;]
//!   }
//! }
//! "
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ir (program model) ──► oracle (loops, trip counts, profile, debug)
//!         │                      │
//!         ▼                      ▼
//!     analysis::Analyzer ── FunctionRegistry (run scope)
//!         │
//!         ├── TypeSizeResolver     → P records
//!         ├── LoopNestWalker       → L blocks (Visitation per activation)
//!         │     ├── loop_carried_dependencies
//!         │     └── InstructionClassifier → R / W / C / A records
//!         ▼
//!     report (tree) ──► text / JSON
//! ```
//!
//! ### Main Components
//!
//! - [`ir`] - read-only program model and [`ir::FunctionBuilder`]
//! - [`oracle`] - loop, range, profile and debug oracles with default
//!   implementations ([`oracle::LoopForest`], [`oracle::TripTable`])
//! - [`analysis`] - the analyzer session and its components
//! - [`report`] - signature tree, text and JSON rendering
//! - [`error`] - error types and severity classification
//!
//! ## Error Handling
//!
//! Only structural problems with the input surface as [`Error`]s. Problems
//! confined to one record degrade that record and log a `tracing` warning:
//!
//! - call without a resolvable target → `C[name:NA;n_of_instructions:;]`
//! - recursive or too deeply nested type → `n_bit:unknown`, trace `?`
//! - loop nesting beyond the cap → records land in the enclosing loop
//! - loop oracle naming a block the function lacks → that block is skipped
//!
//! Module-level analysis skips functions failing with a recoverable error
//! and lists them in [`Report::skipped`].

/// Version of the fnsig crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod analysis;
pub mod error;
pub mod ir;
pub mod oracle;
pub mod report;

// Re-export main types
pub use analysis::{AnalysisOptions, Analyzer, FunctionRegistry, TypeSize, TypeSizeResolver};
pub use error::{Error, ErrorSeverity, Result};
pub use ir::{FunctionBuilder, Module};
pub use oracle::{LoopForest, NoTripInfo, TripEstimate, TripTable};
pub use report::{Entry, FunctionSignature, Record, Report};
