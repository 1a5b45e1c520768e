//! Natural-loop forest computed from a function's CFG
//!
//! Dominators come from the iterative reverse-postorder algorithm; every
//! edge `n -> h` where `h` dominates `n` is a back edge, and the loop body is
//! everything that reaches the latch without passing through the header.

use super::{LoopId, LoopOracle};
use crate::ir::{BlockId, Function};
use std::collections::{BTreeMap, BTreeSet};

/// One natural loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop {
    /// Loop header (target of every back edge)
    pub header: BlockId,
    /// Member blocks in layout order, nested loops included
    pub blocks: Vec<BlockId>,
    /// Smallest enclosing loop
    pub parent: Option<LoopId>,
    /// 1 for outermost loops
    pub depth: u32,
}

impl Loop {
    /// True if `block` belongs to this loop (nested loops included)
    pub fn contains(&self, block: BlockId) -> bool {
        self.blocks.binary_search(&block).is_ok()
    }
}

/// All loops of one function plus the innermost-loop map
#[derive(Debug, Clone, Default)]
pub struct LoopForest {
    loops: Vec<Loop>,
    owner: Vec<Option<LoopId>>,
}

impl LoopForest {
    /// Detect the natural loops of `func`
    pub fn compute(func: &Function) -> Self {
        let n = func.blocks().len();
        if n == 0 {
            return Self::default();
        }
        let preds = func.predecessors();
        let rpo = reverse_postorder(func);
        let mut rpo_index = vec![None; n];
        for (i, block) in rpo.iter().enumerate() {
            rpo_index[block.index()] = Some(i);
        }
        let idom = immediate_dominators(&rpo, &rpo_index, &preds);

        let dominates = |h: usize, node: usize| -> bool {
            let (Some(h), Some(mut x)) = (rpo_index[h], rpo_index[node]) else {
                return false;
            };
            loop {
                if x == h {
                    return true;
                }
                if x == 0 {
                    return false;
                }
                x = idom[x];
            }
        };

        let mut bodies: BTreeMap<BlockId, BTreeSet<BlockId>> = BTreeMap::new();
        for block in func.blocks() {
            if rpo_index[block.id.index()].is_none() {
                continue;
            }
            for &succ in block.successors() {
                if !dominates(succ.index(), block.id.index()) {
                    continue;
                }
                let body = bodies.entry(succ).or_insert_with(|| BTreeSet::from([succ]));
                let mut worklist = vec![block.id];
                while let Some(node) = worklist.pop() {
                    if !body.insert(node) {
                        continue;
                    }
                    for &pred in &preds[node.index()] {
                        if rpo_index[pred.index()].is_some() && !body.contains(&pred) {
                            worklist.push(pred);
                        }
                    }
                }
            }
        }

        let mut loops: Vec<Loop> = bodies
            .into_iter()
            .map(|(header, body)| Loop {
                header,
                blocks: body.into_iter().collect(),
                parent: None,
                depth: 1,
            })
            .collect();

        // Parent is the smallest other loop containing our header.
        for i in 0..loops.len() {
            let header = loops[i].header;
            let parent = (0..loops.len())
                .filter(|&j| j != i && loops[j].contains(header))
                .filter(|&j| loops[j].blocks.len() > loops[i].blocks.len())
                .min_by_key(|&j| loops[j].blocks.len());
            loops[i].parent = parent.map(|j| LoopId(j as u32));
        }
        for i in 0..loops.len() {
            let mut depth = 1;
            let mut current = loops[i].parent;
            while let Some(parent) = current {
                depth += 1;
                current = loops[parent.index()].parent;
            }
            loops[i].depth = depth;
        }

        let mut owner: Vec<Option<LoopId>> = vec![None; n];
        for (i, l) in loops.iter().enumerate() {
            for block in &l.blocks {
                let slot = &mut owner[block.index()];
                let deeper = match slot {
                    Some(existing) => loops[existing.index()].depth < l.depth,
                    None => true,
                };
                if deeper {
                    *slot = Some(LoopId(i as u32));
                }
            }
        }

        Self { loops, owner }
    }

    /// Loops ordered by header layout position
    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    /// Loop by id
    pub fn get(&self, id: LoopId) -> Option<&Loop> {
        self.loops.get(id.index())
    }

    /// Number of loops
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    /// True when the function has no loops
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

impl LoopOracle for LoopForest {
    fn owner_loop(&self, block: BlockId) -> Option<LoopId> {
        self.owner.get(block.index()).copied().flatten()
    }

    fn member_blocks(&self, l: LoopId) -> &[BlockId] {
        self.get(l).map(|l| l.blocks.as_slice()).unwrap_or(&[])
    }

    fn depth(&self, l: LoopId) -> u32 {
        self.get(l).map(|l| l.depth).unwrap_or(0)
    }

    fn header(&self, l: LoopId) -> Option<BlockId> {
        self.get(l).map(|l| l.header)
    }

    fn parent(&self, l: LoopId) -> Option<LoopId> {
        self.get(l).and_then(|l| l.parent)
    }
}

fn reverse_postorder(func: &Function) -> Vec<BlockId> {
    let n = func.blocks().len();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut stack: Vec<(BlockId, usize)> = vec![(BlockId(0), 0)];
    visited[0] = true;

    while let Some((block, next)) = stack.pop() {
        let succs = func.blocks()[block.index()].successors();
        if let Some(&succ) = succs.get(next) {
            stack.push((block, next + 1));
            if succ.index() < n && !visited[succ.index()] {
                visited[succ.index()] = true;
                stack.push((succ, 0));
            }
        } else {
            order.push(block);
        }
    }
    order.reverse();
    order
}

/// Immediate dominators indexed by reverse-postorder position
fn immediate_dominators(
    rpo: &[BlockId],
    rpo_index: &[Option<usize>],
    preds: &[Vec<BlockId>],
) -> Vec<usize> {
    const UNSET: usize = usize::MAX;
    let mut idom = vec![UNSET; rpo.len()];
    if rpo.is_empty() {
        return idom;
    }
    idom[0] = 0;

    let intersect = |idom: &[usize], mut a: usize, mut b: usize| -> usize {
        while a != b {
            while a > b {
                a = idom[a];
            }
            while b > a {
                b = idom[b];
            }
        }
        a
    };

    let mut changed = true;
    while changed {
        changed = false;
        for i in 1..rpo.len() {
            let mut new_idom = UNSET;
            for pred in &preds[rpo[i].index()] {
                let Some(p) = rpo_index[pred.index()] else {
                    continue;
                };
                if idom[p] == UNSET {
                    continue;
                }
                new_idom = if new_idom == UNSET {
                    p
                } else {
                    intersect(&idom, p, new_idom)
                };
            }
            if new_idom != UNSET && idom[i] != new_idom {
                idom[i] = new_idom;
                changed = true;
            }
        }
    }
    idom
}
