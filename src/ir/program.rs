//! Functions, basic blocks and modules

use super::instruction::{BlockId, FuncId, InstId, InstKind, Instruction, Value};
use super::types::{TypeId, TypeTable};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Basic block: straight-line instructions ending in a terminator
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Layout position inside the function
    pub id: BlockId,
    /// Block label
    pub name: String,
    /// Instructions in order
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    /// Create an empty block
    pub fn new(id: BlockId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            instructions: Vec::new(),
        }
    }

    /// Successor blocks named by the terminating branch
    pub fn successors(&self) -> &[BlockId] {
        match self.instructions.last().map(|i| &i.kind) {
            Some(InstKind::Branch { targets, .. }) => targets,
            _ => &[],
        }
    }

    /// Number of instructions in the block
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True for a block without instructions
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Formal parameter of a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name (may be empty)
    pub name: String,
    /// Declared type
    pub ty: TypeId,
}

impl Param {
    /// Create a parameter
    pub fn new(name: &str, ty: TypeId) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }
}

/// Source position attached as debug metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// File path (directory joined with file name)
    pub path: String,
    /// Line of the function definition
    pub line: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line)
    }
}

/// Function definition or declaration
#[derive(Debug, Clone)]
pub struct Function {
    /// Identity inside the module
    pub id: FuncId,
    /// Symbol name
    pub name: String,
    /// Formal parameters in order
    pub params: Vec<Param>,
    /// Profile entry count (`function_entry_count` metadata)
    pub entry_count: Option<i64>,
    /// Debug location of the definition
    pub debug_loc: Option<SourceLocation>,
    blocks: Vec<BasicBlock>,
    index: HashMap<InstId, (BlockId, usize)>,
}

impl Function {
    /// Create a declaration (no body)
    pub fn declaration(id: FuncId, name: &str, params: Vec<Param>) -> Self {
        Self {
            id,
            name: name.to_string(),
            params,
            entry_count: None,
            debug_loc: None,
            blocks: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// True when the function has no body
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks in layout order
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Block by id
    pub fn block(&self, id: BlockId) -> Result<&BasicBlock> {
        self.blocks.get(id.index()).ok_or_else(|| Error::UnknownBlock {
            function: self.name.clone(),
            block: id.0,
        })
    }

    /// Instruction by id
    pub fn instruction(&self, id: InstId) -> Option<&Instruction> {
        let (block, pos) = self.index.get(&id)?;
        self.blocks.get(block.index())?.instructions.get(*pos)
    }

    /// Total number of instructions over all blocks
    pub fn instruction_count(&self) -> u64 {
        self.blocks.iter().map(|b| b.len() as u64).sum()
    }

    /// Predecessor lists indexed by block layout position
    pub fn predecessors(&self) -> Vec<Vec<BlockId>> {
        let mut preds = vec![Vec::new(); self.blocks.len()];
        for block in &self.blocks {
            for succ in block.successors() {
                if let Some(list) = preds.get_mut(succ.index()) {
                    if !list.contains(&block.id) {
                        list.push(block.id);
                    }
                }
            }
        }
        preds
    }

    /// Install a body. Block ids must match layout positions, instruction
    /// ids must be unique and every operand must name an instruction of
    /// this body.
    pub fn set_body(&mut self, blocks: Vec<BasicBlock>) -> Result<()> {
        let mut index = HashMap::new();
        for (pos, block) in blocks.iter().enumerate() {
            if block.id.index() != pos {
                return Err(Error::InvalidModule(format!(
                    "function {}: block '{}' has id {} at layout position {}",
                    self.name, block.name, block.id.0, pos
                )));
            }
            for (i, inst) in block.instructions.iter().enumerate() {
                if index.insert(inst.id, (block.id, i)).is_some() {
                    return Err(Error::InvalidModule(format!(
                        "function {}: duplicate instruction id {}",
                        self.name, inst.id
                    )));
                }
            }
            for succ in block.successors() {
                if succ.index() >= blocks.len() {
                    return Err(Error::UnknownBlock {
                        function: self.name.clone(),
                        block: succ.0,
                    });
                }
            }
        }
        for inst in blocks.iter().flat_map(|b| b.instructions.iter()) {
            for operand in inst.operands() {
                if let Value::Inst(used) = operand {
                    if !index.contains_key(used) {
                        return Err(Error::UnknownInstruction {
                            function: self.name.clone(),
                            inst: used.0,
                        });
                    }
                }
            }
            if let InstKind::Phi { incoming } = &inst.kind {
                if let Some((_, from)) = incoming.iter().find(|(_, b)| b.index() >= blocks.len()) {
                    return Err(Error::UnknownBlock {
                        function: self.name.clone(),
                        block: from.0,
                    });
                }
            }
        }
        self.blocks = blocks;
        self.index = index;
        Ok(())
    }
}

/// Whole program: a type arena and its functions
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// Module name
    pub name: String,
    /// Types referenced by the functions
    pub types: TypeTable,
    functions: Vec<Function>,
}

impl Module {
    /// Create an empty module
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            types: TypeTable::new(),
            functions: Vec::new(),
        }
    }

    /// Declare a function; give it a body later with [`Module::define_function`]
    pub fn declare_function(&mut self, name: &str, params: Vec<Param>) -> FuncId {
        let id = FuncId(self.functions.len() as u32);
        self.functions.push(Function::declaration(id, name, params));
        id
    }

    /// Attach a body to a declared function
    pub fn define_function(&mut self, id: FuncId, blocks: Vec<BasicBlock>) -> Result<()> {
        for inst in blocks.iter().flat_map(|b| b.instructions.iter()) {
            self.check_type(inst.ty)?;
            if let InstKind::Alloc { allocated, .. } = &inst.kind {
                self.check_type(*allocated)?;
            }
        }
        self.function_mut(id)?.set_body(blocks)
    }

    fn check_type(&self, ty: TypeId) -> Result<()> {
        match self.types.get(ty) {
            Some(_) => Ok(()),
            None => Err(Error::UnknownType { id: ty.0 }),
        }
    }

    /// Function by id
    pub fn function(&self, id: FuncId) -> Result<&Function> {
        self.functions
            .get(id.index())
            .ok_or(Error::UnknownFunction { id: id.0 })
    }

    /// Mutable function by id (metadata updates)
    pub fn function_mut(&mut self, id: FuncId) -> Result<&mut Function> {
        self.functions
            .get_mut(id.index())
            .ok_or(Error::UnknownFunction { id: id.0 })
    }

    /// Function by symbol name
    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// All functions in module order
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Functions that have a body, in module order
    pub fn defined_functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter().filter(|f| !f.is_declaration())
    }
}
