//! Trip-count and backedge-range estimates

use super::RangeOracle;
use crate::ir::{BlockId, FuncId, Function};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Iteration estimate of one loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripEstimate {
    /// Exact iteration count when it is a small constant
    pub trip_count: Option<u64>,
    /// Signed (lower, upper) range of the backedge-taken count
    pub range: Option<(i64, i64)>,
}

impl TripEstimate {
    /// Query both estimates for the loop headed by `header`
    pub fn query<R: RangeOracle + ?Sized>(oracle: &R, func: &Function, header: BlockId) -> Self {
        Self {
            trip_count: oracle.small_constant_trip_count(func, header),
            range: oracle.signed_range(func, header),
        }
    }

    /// Iteration count, 0 when unknown
    pub fn iterations(&self) -> u64 {
        self.trip_count.unwrap_or(0)
    }

    /// `floor(upper / trip_count)`; 0 without a constant trip count.
    /// A negative or missing upper bound counts as 0.
    pub fn stride(&self) -> i64 {
        match self.trip_count {
            Some(trip) if trip > 0 => {
                let upper = self.range.map(|(_, upper)| upper.max(0)).unwrap_or(0) as u64;
                (upper / trip) as i64
            }
            _ => 0,
        }
    }
}

/// Explicit table of estimates keyed by (function, loop header)
#[derive(Debug, Clone, Default)]
pub struct TripTable {
    entries: HashMap<(FuncId, BlockId), TripEstimate>,
}

impl TripTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the estimate for the loop headed by `header` in `func`
    pub fn insert(&mut self, func: FuncId, header: BlockId, estimate: TripEstimate) {
        self.entries.insert((func, header), estimate);
    }

    /// Builder-style [`TripTable::insert`]
    pub fn with(mut self, func: FuncId, header: BlockId, estimate: TripEstimate) -> Self {
        self.insert(func, header, estimate);
        self
    }

    fn lookup(&self, func: &Function, header: BlockId) -> Option<&TripEstimate> {
        self.entries.get(&(func.id, header))
    }
}

impl RangeOracle for TripTable {
    fn small_constant_trip_count(&self, func: &Function, header: BlockId) -> Option<u64> {
        self.lookup(func, header).and_then(|e| e.trip_count)
    }

    fn signed_range(&self, func: &Function, header: BlockId) -> Option<(i64, i64)> {
        self.lookup(func, header).and_then(|e| e.range)
    }
}

/// Range oracle that knows nothing about any loop
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTripInfo;

impl RangeOracle for NoTripInfo {
    fn small_constant_trip_count(&self, _func: &Function, _header: BlockId) -> Option<u64> {
        None
    }

    fn signed_range(&self, _func: &Function, _header: BlockId) -> Option<(i64, i64)> {
        None
    }
}
