//! IR instruction definitions

use super::types::TypeId;
use serde::Serialize;
use std::fmt;

/// Instruction identity, unique within a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InstId(pub u32);

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%i{}", self.0)
    }
}

/// Basic block identity, unique within a function (its layout index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BlockId(pub u32);

impl BlockId {
    /// Returns the layout index of this block
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Function identity, unique within a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FuncId(pub u32);

impl FuncId {
    /// Returns the module index of this function
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Operand of an instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Result of another instruction in the same function
    Inst(InstId),
    /// Function parameter by position
    Arg(u32),
    /// Integer constant
    ConstInt(i64),
    /// Module-level global by name
    Global(String),
    /// Function address
    Function(FuncId),
    /// Undefined value
    Undef,
}

impl Value {
    /// Constant payload, if this is an integer constant
    pub fn as_const(&self) -> Option<i64> {
        match self {
            Value::ConstInt(v) => Some(*v),
            _ => None,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Integer/float addition
    Add,
    /// Integer/float subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
    /// Remainder
    Rem,
    /// Bitwise and
    And,
    /// Bitwise or
    Or,
    /// Bitwise xor
    Xor,
    /// Shift left
    Shl,
    /// Shift right
    Shr,
}

/// Call target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    /// Statically known function in the module (defined or declared)
    Direct(FuncId),
    /// Call through a computed function pointer
    Indirect(Value),
}

/// Instruction payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstKind {
    /// Load from `addr`
    Load {
        /// Address operand
        addr: Value,
    },
    /// Store `value` to `addr`
    Store {
        /// Stored value
        value: Value,
        /// Destination address
        addr: Value,
    },
    /// Function call
    Call {
        /// Call target
        callee: Callee,
        /// Arguments
        args: Vec<Value>,
    },
    /// Stack allocation of `allocated`, optionally `count` times
    Alloc {
        /// Declared element type
        allocated: TypeId,
        /// Element count for array allocations
        count: Option<Value>,
    },
    /// SSA merge: one incoming value per predecessor
    Phi {
        /// (value, predecessor) pairs
        incoming: Vec<(Value, BlockId)>,
    },
    /// Terminator: conditional when `cond` is present
    Branch {
        /// Branch condition
        cond: Option<Value>,
        /// Successor blocks in order
        targets: Vec<BlockId>,
    },
    /// Two-operand arithmetic
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Value,
        /// Right operand
        rhs: Value,
    },
    /// Computed address: base plus indices
    ElementPtr {
        /// Base pointer
        base: Value,
        /// Index operands
        indices: Vec<Value>,
    },
    /// Anything else (casts, compares, returns, ...)
    Other {
        /// Opcode mnemonic
        opcode: String,
        /// Operands
        operands: Vec<Value>,
    },
}

/// Single IR instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Identity within the function
    pub id: InstId,
    /// Optional value name (`arrayidx`, `i.next`, ...)
    pub name: Option<String>,
    /// Payload
    pub kind: InstKind,
    /// Result type
    pub ty: TypeId,
}

impl Instruction {
    /// All value operands in order
    pub fn operands(&self) -> Vec<&Value> {
        match &self.kind {
            InstKind::Load { addr } => vec![addr],
            InstKind::Store { value, addr } => vec![value, addr],
            InstKind::Call { callee, args } => {
                let mut ops: Vec<&Value> = args.iter().collect();
                if let Callee::Indirect(target) = callee {
                    ops.push(target);
                }
                ops
            }
            InstKind::Alloc { count, .. } => count.iter().collect(),
            InstKind::Phi { incoming } => incoming.iter().map(|(v, _)| v).collect(),
            InstKind::Branch { cond, .. } => cond.iter().collect(),
            InstKind::Binary { lhs, rhs, .. } => vec![lhs, rhs],
            InstKind::ElementPtr { base, indices } => {
                let mut ops = vec![base];
                ops.extend(indices.iter());
                ops
            }
            InstKind::Other { operands, .. } => operands.iter().collect(),
        }
    }
}
