//! Per-instruction record classification

use super::options::AnalysisOptions;
use super::registry::FunctionRegistry;
use crate::ir::{Callee, FuncId, Function, InstKind, Instruction, Module, Type, TypeId, Value};
use crate::report::{AccessRecord, AllocRecord, CallRecord, Record};

/// Turns individual instructions into `R`/`W`/`C`/`A` records
pub struct InstructionClassifier<'a> {
    module: &'a Module,
    func: &'a Function,
    registry: &'a FunctionRegistry,
    options: &'a AnalysisOptions,
}

impl<'a> InstructionClassifier<'a> {
    /// Classifier for instructions of `func`
    pub fn new(
        module: &'a Module,
        func: &'a Function,
        registry: &'a FunctionRegistry,
        options: &'a AnalysisOptions,
    ) -> Self {
        Self {
            module,
            func,
            registry,
            options,
        }
    }

    /// Record for `inst`, or `None` when it is not reported
    pub fn classify(&self, inst: &Instruction) -> Option<Record> {
        match &inst.kind {
            InstKind::Load { addr } => self.indexed_access(inst, addr).map(Record::Read),
            InstKind::Store { addr, .. } => self.indexed_access(inst, addr).map(Record::Write),
            InstKind::Call { callee, .. } => self.call(inst, callee),
            InstKind::Alloc { allocated, count } => self
                .alloc(inst, *allocated, count.as_ref())
                .map(Record::Alloc),
            _ => None,
        }
    }

    /// Access through a computed address. Direct stack slots, globals and
    /// raw arguments are scalar traffic and stay unreported.
    fn indexed_access(&self, inst: &Instruction, addr: &Value) -> Option<AccessRecord> {
        let Value::Inst(id) = addr else {
            return None;
        };
        let source = self.func.instruction(*id)?;
        if !matches!(source.kind, InstKind::ElementPtr { .. }) {
            return None;
        }
        tracing::trace!("{}: indexed access {} via {}", self.func.name, inst.id, id);
        Some(AccessRecord {
            addr: Some(inst.id.to_string()),
            name: source.name.clone(),
        })
    }

    fn call(&self, inst: &Instruction, callee: &Callee) -> Option<Record> {
        let target = match callee {
            Callee::Direct(id) => Some(*id),
            Callee::Indirect(Value::Function(id)) => Some(*id),
            Callee::Indirect(_) => None,
        };
        let Some(callee) = target.and_then(|id| self.callee(id)) else {
            tracing::warn!(
                "{}: call {} has no resolvable target, emitting placeholder",
                self.func.name,
                inst.id
            );
            return Some(Record::Call(CallRecord {
                name: None,
                n_of_instructions: None,
            }));
        };

        if self.options.is_ignored_call(&callee.name) {
            return None;
        }
        if self.options.is_memset(&callee.name) {
            return Some(Record::Write(AccessRecord {
                addr: None,
                name: None,
            }));
        }
        Some(Record::Call(CallRecord {
            name: Some(callee.name.clone()),
            n_of_instructions: self.registry.instruction_count(callee.id),
        }))
    }

    fn callee(&self, id: FuncId) -> Option<&'a Function> {
        match self.module.function(id) {
            Ok(func) => Some(func),
            Err(err) => {
                tracing::warn!("{}: {}", self.func.name, err);
                None
            }
        }
    }

    /// Array allocations: an explicit element count other than one, or a
    /// single allocation of an array type.
    fn alloc(
        &self,
        inst: &Instruction,
        allocated: TypeId,
        count: Option<&Value>,
    ) -> Option<AllocRecord> {
        let types = &self.module.types;
        let (n_bit, size) = match count {
            Some(count) if count.as_const() != Some(1) => (
                types.primitive_bits(allocated),
                count.as_const().and_then(|c| u64::try_from(c).ok()),
            ),
            _ => match types.get(allocated)? {
                Type::Array { elem, count } => (types.primitive_bits(*elem), Some(*count)),
                _ => return None,
            },
        };
        Some(AllocRecord {
            name: inst.name.clone().unwrap_or_default(),
            ty: types.display(allocated),
            n_bit,
            size,
        })
    }
}
