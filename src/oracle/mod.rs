//! # Analysis Oracles
//!
//! Facts the signature analysis consumes but does not compute itself:
//! loop structure, iteration ranges, profile counts and debug locations.
//!
//! ```text
//! oracle/
//! ├── mod.rs     # Oracle traits
//! ├── loops.rs   # LoopForest: natural loops from dominators (LoopOracle)
//! └── ranges.rs  # TripEstimate, TripTable, NoTripInfo (RangeOracle)
//! ```
//!
//! [`Module`] answers the profile and debug queries from the metadata
//! attached to each [`Function`].

mod loops;
mod ranges;

pub use loops::{Loop, LoopForest};
pub use ranges::{NoTripInfo, TripEstimate, TripTable};

use crate::ir::{BlockId, Function, Module, SourceLocation};
use serde::Serialize;

/// Loop identity within one function's loop oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LoopId(pub u32);

impl LoopId {
    /// Returns the oracle index of this loop
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Loop structure of one function
pub trait LoopOracle {
    /// Innermost loop containing `block`
    fn owner_loop(&self, block: BlockId) -> Option<LoopId>;

    /// Blocks of `l` (nested loops included) in the order they are walked
    fn member_blocks(&self, l: LoopId) -> &[BlockId];

    /// Nesting depth, 1 for outermost loops
    fn depth(&self, l: LoopId) -> u32;

    /// Header block of `l`
    fn header(&self, l: LoopId) -> Option<BlockId>;

    /// Enclosing loop
    fn parent(&self, l: LoopId) -> Option<LoopId>;
}

/// Iteration estimates, keyed by loop header
pub trait RangeOracle {
    /// Exact trip count when it is a small compile-time constant
    fn small_constant_trip_count(&self, func: &Function, header: BlockId) -> Option<u64>;

    /// Signed (lower, upper) range of the backedge-taken count
    fn signed_range(&self, func: &Function, header: BlockId) -> Option<(i64, i64)>;
}

/// Profile counts
pub trait ProfileOracle {
    /// Entry count of `func`, `None` without profile metadata
    fn entry_frequency(&self, func: &Function) -> Option<i64>;
}

/// Debug information
pub trait DebugOracle {
    /// Definition site of `func`
    fn source_location(&self, func: &Function) -> Option<SourceLocation>;
}

impl ProfileOracle for Module {
    fn entry_frequency(&self, func: &Function) -> Option<i64> {
        func.entry_count
    }
}

impl DebugOracle for Module {
    fn source_location(&self, func: &Function) -> Option<SourceLocation> {
        func.debug_loc.clone()
    }
}
