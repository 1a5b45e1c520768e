//! Incremental construction of function bodies
//!
//! ```rust
//! use fnsig::ir::{BinaryOp, FunctionBuilder, Module, Param, Value};
//!
//! let mut module = Module::new("demo");
//! let void = module.types.void();
//! let i32t = module.types.scalar(32);
//! let f = module.declare_function("count", vec![Param::new("n", i32t)]);
//!
//! let mut b = FunctionBuilder::new(void);
//! let entry = b.add_block("entry");
//! let header = b.add_block("loop");
//! let exit = b.add_block("exit");
//!
//! b.switch_to(entry);
//! b.br(header);
//!
//! b.switch_to(header);
//! let i = b.phi("i", vec![(Value::ConstInt(0), entry)], i32t);
//! let next = b.binary("i.next", BinaryOp::Add, i.clone(), Value::ConstInt(1), i32t);
//! b.add_incoming(&i, next, header);
//! b.cond_br(Value::Arg(0), header, exit);
//!
//! b.switch_to(exit);
//! b.ret(None);
//!
//! module.define_function(f, b.finish()).unwrap();
//! assert_eq!(module.function(f).unwrap().instruction_count(), 5);
//! ```

use super::instruction::{BinaryOp, BlockId, Callee, FuncId, InstId, InstKind, Instruction, Value};
use super::program::BasicBlock;
use super::types::TypeId;

/// Builder appending instructions to the current block
#[derive(Debug)]
pub struct FunctionBuilder {
    blocks: Vec<BasicBlock>,
    current: Option<BlockId>,
    next_inst: u32,
    void: TypeId,
}

impl FunctionBuilder {
    /// Create a builder; `void` types stores, branches and returns
    pub fn new(void: TypeId) -> Self {
        Self {
            blocks: Vec::new(),
            current: None,
            next_inst: 0,
            void,
        }
    }

    /// Append a new empty block and return its id
    pub fn add_block(&mut self, name: &str) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(id, name));
        id
    }

    /// Direct subsequent instructions into `block`
    pub fn switch_to(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    fn push(&mut self, name: Option<&str>, kind: InstKind, ty: TypeId) -> InstId {
        let block = match self.current {
            Some(block) if block.index() < self.blocks.len() => block,
            _ => {
                let entry = self.add_block("entry");
                self.current = Some(entry);
                entry
            }
        };
        let id = InstId(self.next_inst);
        self.next_inst += 1;
        self.blocks[block.index()].instructions.push(Instruction {
            id,
            name: name.map(str::to_string),
            kind,
            ty,
        });
        id
    }

    /// `name = load addr`
    pub fn load(&mut self, name: &str, addr: Value, ty: TypeId) -> Value {
        Value::Inst(self.push(Some(name), InstKind::Load { addr }, ty))
    }

    /// `store value, addr`
    pub fn store(&mut self, value: Value, addr: Value) -> InstId {
        let void = self.void;
        self.push(None, InstKind::Store { value, addr }, void)
    }

    /// Direct call; `ty` is the return type
    pub fn call(
        &mut self,
        name: Option<&str>,
        callee: FuncId,
        args: Vec<Value>,
        ty: TypeId,
    ) -> Value {
        let kind = InstKind::Call {
            callee: Callee::Direct(callee),
            args,
        };
        Value::Inst(self.push(name, kind, ty))
    }

    /// Call through a function pointer
    pub fn call_indirect(&mut self, target: Value, args: Vec<Value>, ty: TypeId) -> Value {
        let kind = InstKind::Call {
            callee: Callee::Indirect(target),
            args,
        };
        Value::Inst(self.push(None, kind, ty))
    }

    /// Stack allocation of `allocated`; `count` makes it an array allocation
    pub fn alloc(
        &mut self,
        name: &str,
        allocated: TypeId,
        count: Option<Value>,
        ptr_ty: TypeId,
    ) -> Value {
        let kind = InstKind::Alloc { allocated, count };
        Value::Inst(self.push(Some(name), kind, ptr_ty))
    }

    /// SSA merge with the incoming values known so far
    pub fn phi(&mut self, name: &str, incoming: Vec<(Value, BlockId)>, ty: TypeId) -> Value {
        Value::Inst(self.push(Some(name), InstKind::Phi { incoming }, ty))
    }

    /// Add an incoming edge to an existing merge (back edges are only
    /// known after the loop body is built). Returns false if `phi` is not a merge.
    pub fn add_incoming(&mut self, phi: &Value, value: Value, from: BlockId) -> bool {
        let Value::Inst(id) = phi else {
            return false;
        };
        for block in &mut self.blocks {
            for inst in &mut block.instructions {
                if inst.id == *id {
                    if let InstKind::Phi { incoming } = &mut inst.kind {
                        incoming.push((value, from));
                        return true;
                    }
                    return false;
                }
            }
        }
        false
    }

    /// `name = lhs op rhs`
    pub fn binary(
        &mut self,
        name: &str,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        ty: TypeId,
    ) -> Value {
        Value::Inst(self.push(Some(name), InstKind::Binary { op, lhs, rhs }, ty))
    }

    /// Computed address `base[indices...]`
    pub fn element_ptr(
        &mut self,
        name: &str,
        base: Value,
        indices: Vec<Value>,
        ty: TypeId,
    ) -> Value {
        Value::Inst(self.push(Some(name), InstKind::ElementPtr { base, indices }, ty))
    }

    /// Any other instruction
    pub fn other(
        &mut self,
        name: Option<&str>,
        opcode: &str,
        operands: Vec<Value>,
        ty: TypeId,
    ) -> Value {
        let kind = InstKind::Other {
            opcode: opcode.to_string(),
            operands,
        };
        Value::Inst(self.push(name, kind, ty))
    }

    /// Unconditional branch
    pub fn br(&mut self, target: BlockId) -> InstId {
        let void = self.void;
        let kind = InstKind::Branch {
            cond: None,
            targets: vec![target],
        };
        self.push(None, kind, void)
    }

    /// Two-way conditional branch
    pub fn cond_br(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) -> InstId {
        let void = self.void;
        let kind = InstKind::Branch {
            cond: Some(cond),
            targets: vec![then_block, else_block],
        };
        self.push(None, kind, void)
    }

    /// Return, optionally with a value
    pub fn ret(&mut self, value: Option<Value>) -> InstId {
        let void = self.void;
        let kind = InstKind::Other {
            opcode: "ret".to_string(),
            operands: value.into_iter().collect(),
        };
        self.push(None, kind, void)
    }

    /// Hand over the built blocks
    pub fn finish(self) -> Vec<BasicBlock> {
        self.blocks
    }
}
