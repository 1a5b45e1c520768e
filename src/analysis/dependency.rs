//! Loop-carried dependency count of a loop header
//!
//! Every merge edge arriving at the header from the header itself counts as
//! one loop-carried dependency. The first such edge whose incoming value is
//! a unit increment or decrement is taken to be the loop's induction
//! variable and is not counted; later matches in the same block are.

use crate::ir::{BasicBlock, BinaryOp, Function, InstKind, Value};

/// Count the loop-carried dependencies of `block`
pub fn loop_carried_dependencies(func: &Function, block: &BasicBlock) -> u32 {
    let mut count: u32 = 0;
    let mut found_induction = false;

    for inst in &block.instructions {
        let InstKind::Phi { incoming } = &inst.kind else {
            continue;
        };
        for (value, from) in incoming {
            if *from != block.id {
                continue;
            }
            count += 1;
            if !found_induction && is_induction_update(func, value) {
                count -= 1;
                found_induction = true;
                tracing::trace!("{}: induction variable {} exempted", block.name, inst.id);
            }
        }
    }
    count
}

/// True if `value` is `x + 1`, `x - 1`, `1 + x` or `x + -1`
///
/// A subtraction only counts with the unit constant on the right;
/// `1 - x` is not a step.
pub fn is_induction_update(func: &Function, value: &Value) -> bool {
    let Value::Inst(id) = value else {
        return false;
    };
    let Some(inst) = func.instruction(*id) else {
        return false;
    };
    let InstKind::Binary { op, lhs, rhs } = &inst.kind else {
        return false;
    };
    let unit = |v: &Value| matches!(v.as_const(), Some(1) | Some(-1));
    match op {
        BinaryOp::Add => unit(lhs) || unit(rhs),
        BinaryOp::Sub => unit(rhs),
        _ => false,
    }
}
