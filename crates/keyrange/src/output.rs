//! Module: output
//! Responsibility: the immutable scan ranges handed to storage.
//! Does not own: range arithmetic.
//! Boundary: everything here is plain data; ordering guarantees come from
//! the merge pass.

use crate::value::KeyValue;

///
/// ScanRange
///
/// One finalized multi-column key range. Keys are complete over the scanned
/// column span; emptiness is encoded as `Max..Min` exclusive-both rather
/// than by omission, so callers can distinguish "provably empty" from
/// "no constraint".
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanRange {
    pub table_id: u64,
    pub start_key: Vec<KeyValue>,
    pub end_key: Vec<KeyValue>,
    pub include_start: bool,
    pub include_end: bool,
    pub is_phy_rowid: bool,
}

impl ScanRange {
    /// Point lookup: both bounds inclusive on identical keys.
    #[must_use]
    pub fn is_single_point(&self) -> bool {
        self.include_start && self.include_end && self.start_key == self.end_key
    }

    /// Whole-index range `(Min..Max)`, used when nothing can be constrained.
    #[must_use]
    pub(crate) fn universal(table_id: u64, column_cnt: usize) -> Self {
        Self {
            table_id,
            start_key: vec![KeyValue::Min; column_cnt],
            end_key: vec![KeyValue::Max; column_cnt],
            include_start: false,
            include_end: false,
            is_phy_rowid: false,
        }
    }
}

///
/// GeneratedRanges
///

#[derive(Clone, Debug)]
pub struct GeneratedRanges {
    pub ranges: Vec<ScanRange>,
    /// True when every produced range is a single-point lookup, which lets
    /// the executor batch them as a multi-get.
    pub all_single_values: bool,
}
