//! Run-scoped function catalog and per-activation visitation sets

use crate::ir::{BlockId, FuncId, Function, InstId};
use crate::oracle::LoopId;
use dashmap::DashMap;
use std::collections::HashSet;

/// Append-only catalog of analyzed functions, shared across a whole run
///
/// Backed by a concurrent map so parallel workers can register and look up
/// functions without extra locking. Each entry caches the instruction
/// count at registration time.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    entries: DashMap<FuncId, u64>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func` and return its cached instruction count.
    /// Registering twice keeps the first entry.
    pub fn register(&self, func: &Function) -> u64 {
        *self
            .entries
            .entry(func.id)
            .or_insert_with(|| func.instruction_count())
    }

    /// Cached instruction count, `None` for functions not analyzed yet
    pub fn instruction_count(&self, id: FuncId) -> Option<u64> {
        self.entries.get(&id).map(|count| *count)
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry (start of a new run)
    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// What one function activation has already reported
#[derive(Debug, Default)]
pub struct Visitation {
    loops: HashSet<LoopId>,
    instructions: HashSet<InstId>,
    blocks: HashSet<BlockId>,
}

impl Visitation {
    /// Fresh sets for a new activation
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `l` as reported; true the first time
    pub fn mark_loop(&mut self, l: LoopId) -> bool {
        self.loops.insert(l)
    }

    /// Mark `inst` as classified; true the first time
    pub fn mark_instruction(&mut self, inst: InstId) -> bool {
        self.instructions.insert(inst)
    }

    /// Mark `block` as summarized; true the first time
    pub fn mark_block(&mut self, block: BlockId) -> bool {
        self.blocks.insert(block)
    }

    /// True if `l` was already reported
    pub fn has_loop(&self, l: LoopId) -> bool {
        self.loops.contains(&l)
    }

    /// Number of loops reported so far
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FunctionBuilder, Module};

    #[test]
    fn test_register_is_idempotent() {
        let mut module = Module::new("m");
        let void = module.types.void();
        let f = module.declare_function("f", vec![]);
        let mut b = FunctionBuilder::new(void);
        b.ret(None);
        module.define_function(f, b.finish()).unwrap();

        let registry = FunctionRegistry::new();
        assert_eq!(registry.instruction_count(f), None);
        assert_eq!(registry.register(module.function(f).unwrap()), 1);
        assert_eq!(registry.register(module.function(f).unwrap()), 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.instruction_count(f), Some(1));

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_visitation_marks_once() {
        let mut visited = Visitation::new();
        assert!(visited.mark_loop(LoopId(0)));
        assert!(!visited.mark_loop(LoopId(0)));
        assert!(visited.has_loop(LoopId(0)));
        assert!(!visited.has_loop(LoopId(1)));
        assert!(visited.mark_instruction(InstId(3)));
        assert!(!visited.mark_instruction(InstId(3)));
        assert!(visited.mark_block(BlockId(1)));
        assert!(!visited.mark_block(BlockId(1)));
        assert_eq!(visited.loop_count(), 1);
    }
}
