//! # Signature Reports
//!
//! The analyzer produces a tree of records per function which is rendered
//! afterwards, so every opened `F`/`L` block is closed by construction.
//!
//! ```text
//! report/
//! ├── mod.rs     # Record, Entry, FunctionSignature, Report
//! └── render.rs  # Text rendering (one tag per line, indented by depth)
//! ```
//!
//! ## Text format
//!
//! ```text
//! F[name:sum;call_freq:0;n_of_instructions:9;]{
//!   P[addr:%a0;name:v;type:*i32;n_bit:32;size:sum.c:3;]
//!   L[name:for.body;depth:1;iterations:16;stride:0;lcds:1;]{
//!     R[addr:%i3;name:arrayidx;offset:NA;]
//!   }
//! }
//! ```
//!
//! Every type also derives `Serialize`; [`Report::to_json`] emits the same
//! tree as JSON.

mod render;

use crate::analysis::TypeSize;
use crate::Result;
use serde::Serialize;

/// `P` record: one formal parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamRecord {
    /// Argument identity (`%a<N>`)
    pub addr: String,
    /// Parameter name
    pub name: String,
    /// Type trace produced by the size resolver
    pub trace: String,
    /// Resolved width
    pub n_bit: TypeSize,
    /// Source location of the function, when known
    pub size: Option<String>,
}

/// `L` record: one loop, opened before its body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopRecord {
    /// Name of the block the loop was discovered from
    pub name: String,
    /// Nesting depth, 1 for outermost loops
    pub depth: u32,
    /// Small constant trip count, 0 when unknown
    pub iterations: u64,
    /// Estimated stride, 0 without a trip count
    pub stride: i64,
    /// Loop-carried dependencies at the discovering block
    pub lcds: u32,
}

/// `R`/`W` record: indexed memory access
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessRecord {
    /// Access identity (`%i<N>`), blank for memory-set intrinsics
    pub addr: Option<String>,
    /// Name of the address operand
    pub name: Option<String>,
}

/// `C` record: call site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    /// Callee name, `None` for indirect or unresolvable targets
    pub name: Option<String>,
    /// Cached instruction count of an already analyzed callee
    pub n_of_instructions: Option<u64>,
}

/// `A` record: array allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocRecord {
    /// Allocation name
    pub name: String,
    /// Declared type text
    #[serde(rename = "type")]
    pub ty: String,
    /// Element width in bits
    pub n_bit: u64,
    /// Element count, `None` when not a constant
    pub size: Option<u64>,
}

/// `BB` record: block summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockRecord {
    /// Block label
    pub name: String,
    /// Instruction count
    pub n_of_instructions: usize,
    /// Successor labels in branch order
    pub succ: Vec<String>,
}

/// Leaf record of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tag")]
pub enum Record {
    /// Indexed load
    #[serde(rename = "R")]
    Read(AccessRecord),
    /// Indexed store or memory set
    #[serde(rename = "W")]
    Write(AccessRecord),
    /// Call site
    #[serde(rename = "C")]
    Call(CallRecord),
    /// Array allocation
    #[serde(rename = "A")]
    Alloc(AllocRecord),
    /// Block summary
    #[serde(rename = "BB")]
    Block(BlockRecord),
}

/// Node of a function body: a record or a loop with its own body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    /// Plain record
    Record(Record),
    /// Loop block
    Loop {
        /// The `L` header
        #[serde(rename = "L")]
        record: LoopRecord,
        /// Nested entries
        body: Vec<Entry>,
    },
}

impl Entry {
    /// Number of loop blocks in this entry, nested ones included
    pub fn loop_count(&self) -> usize {
        match self {
            Entry::Record(_) => 0,
            Entry::Loop { body, .. } => 1 + body.iter().map(Entry::loop_count).sum::<usize>(),
        }
    }

    /// Visit this entry and everything below it, depth first
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Entry)) {
        visit(self);
        if let Entry::Loop { body, .. } = self {
            for child in body {
                child.walk(visit);
            }
        }
    }
}

/// Signature of one function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,
    /// Profile entry count, 0 without metadata
    pub call_freq: i64,
    /// Total instruction count
    pub n_of_instructions: u64,
    /// Resolved parameter footprint in bytes
    pub input_bytes: u64,
    /// `P` records in parameter order
    pub params: Vec<ParamRecord>,
    /// Loop blocks and classified records in walk order
    pub body: Vec<Entry>,
}

impl FunctionSignature {
    /// Number of loop blocks in the body
    pub fn loop_count(&self) -> usize {
        self.body.iter().map(Entry::loop_count).sum()
    }

    /// All leaf records of the body, depth first
    pub fn records(&self) -> Vec<&Record> {
        let mut records = Vec::new();
        for entry in &self.body {
            entry.walk(&mut |e| {
                if let Entry::Record(r) = e {
                    records.push(r);
                }
            });
        }
        records
    }
}

/// Function left out of a module report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFunction {
    /// Function name
    pub name: String,
    /// Why analysis failed
    pub reason: String,
}

/// Signatures of a whole module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Signatures in module order
    pub functions: Vec<FunctionSignature>,
    /// Functions whose analysis failed with a recoverable error
    pub skipped: Vec<SkippedFunction>,
}

impl Report {
    /// Find a signature by function name
    pub fn function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Pretty JSON rendering of the whole report
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
