//! Module: working
//! Responsibility: the mutable per-generation interval and its arithmetic.
//! Does not own: graph traversal order or output construction.
//! Boundary: instances live in the generation arena and never escape it.

#[cfg(test)]
mod tests;

use crate::{
    error::GenError,
    value::{key_cmp, KeyValue, NullOrder},
};
use smallvec::{smallvec, SmallVec};
use std::cmp::Ordering;

///
/// WorkingRange
///
/// One in-flight multi-column interval. Column slots outside
/// `min_offset..=max_offset` hold `Nop` until finalization fills them.
/// `always_true` / `always_false` short-circuit all arithmetic; a range with
/// either flag set carries no meaningful keys.
///

#[derive(Clone, Debug)]
pub struct WorkingRange {
    pub(crate) start: SmallVec<[KeyValue; 4]>,
    pub(crate) end: SmallVec<[KeyValue; 4]>,
    pub(crate) include_start: bool,
    pub(crate) include_end: bool,
    pub(crate) min_offset: usize,
    pub(crate) max_offset: usize,
    pub(crate) always_true: bool,
    pub(crate) always_false: bool,
    pub(crate) is_phy_rowid: bool,
    pub(crate) column_cnt: usize,
    pub(crate) null_order: NullOrder,
}

impl WorkingRange {
    #[must_use]
    pub(crate) fn new(column_cnt: usize, null_order: NullOrder) -> Self {
        Self {
            start: smallvec![KeyValue::Nop; column_cnt],
            end: smallvec![KeyValue::Nop; column_cnt],
            include_start: false,
            include_end: false,
            min_offset: 0,
            max_offset: 0,
            always_true: false,
            always_false: false,
            is_phy_rowid: false,
            column_cnt,
            null_order,
        }
    }

    pub(crate) fn set_always_true(&mut self) {
        for i in 0..self.column_cnt {
            self.start[i] = KeyValue::Min;
            self.end[i] = KeyValue::Max;
        }
        self.include_start = false;
        self.include_end = false;
        self.is_phy_rowid = false;
        self.min_offset = 0;
        self.max_offset = 0;
        self.always_true = true;
        self.always_false = false;
    }

    /// Empty interval: start above end so any scan over it yields nothing.
    pub(crate) fn set_always_false(&mut self) {
        for i in 0..self.column_cnt {
            self.start[i] = KeyValue::Max;
            self.end[i] = KeyValue::Min;
        }
        self.include_start = false;
        self.include_end = false;
        self.is_phy_rowid = false;
        self.min_offset = 0;
        self.max_offset = 0;
        self.always_true = false;
        self.always_false = true;
    }

    pub(crate) fn copy_from(&mut self, other: &Self) {
        self.start.clone_from(&other.start);
        self.end.clone_from(&other.end);
        self.include_start = other.include_start;
        self.include_end = other.include_end;
        self.min_offset = other.min_offset;
        self.max_offset = other.max_offset;
        self.always_true = other.always_true;
        self.always_false = other.always_false;
        self.is_phy_rowid = other.is_phy_rowid;
        self.column_cnt = other.column_cnt;
        self.null_order = other.null_order;
    }

    /// Intersect `other` into `self`.
    ///
    /// Requires `self.min_offset <= other.min_offset`: intersections always
    /// flow from shallower to deeper columns. Returns `Ok(true)` when the
    /// two constraints leave an unconstrained column gap between them and
    /// cannot be combined into one contiguous interval.
    pub(crate) fn intersect(&mut self, other: &Self) -> Result<bool, GenError> {
        if other.always_false {
            self.set_always_false();
            return Ok(false);
        }
        if other.always_true || self.always_false {
            return Ok(false);
        }
        if self.always_true {
            self.copy_from(other);
            return Ok(false);
        }
        if self.min_offset > other.min_offset {
            return Err(GenError::contract(
                "intersect requires the accumulated range to start no deeper",
            ));
        }
        if self.max_offset + 1 < other.min_offset {
            // unconstrained column between the two: not one interval
            return Ok(true);
        }

        let last = self.column_cnt - 1;
        self.max_offset = self.max_offset.max(other.max_offset);

        let mut merge_start = false;
        for i in other.min_offset..=last {
            match key_cmp(&self.start[i], &other.start[i], self.null_order)? {
                Ordering::Greater => break,
                Ordering::Less => {
                    for j in i..=last {
                        self.start[j] = other.start[j].clone();
                    }
                    self.include_start = other.include_start;
                    merge_start = true;
                    break;
                }
                Ordering::Equal => {
                    if i == last && self.include_start && !other.include_start {
                        self.include_start = false;
                        merge_start = true;
                    }
                }
            }
        }

        let mut merge_end = false;
        for i in other.min_offset..=last {
            match key_cmp(&self.end[i], &other.end[i], self.null_order)? {
                Ordering::Less => break,
                Ordering::Greater => {
                    for j in i..=last {
                        self.end[j] = other.end[j].clone();
                    }
                    self.include_end = other.include_end;
                    merge_end = true;
                    break;
                }
                Ordering::Equal => {
                    if i == last && self.include_end && !other.include_end {
                        self.include_end = false;
                        merge_end = true;
                    }
                }
            }
        }

        // Bounds taken from different sources may have crossed.
        if merge_start != merge_end {
            for i in self.min_offset..=last {
                match key_cmp(&self.start[i], &self.end[i], self.null_order)? {
                    Ordering::Less => break,
                    Ordering::Greater => {
                        self.set_always_false();
                        break;
                    }
                    Ordering::Equal => {
                        if i == last && !(self.include_start && self.include_end) {
                            self.set_always_false();
                            break;
                        }
                    }
                }
            }
        }

        Ok(false)
    }

    /// Detect degenerate intervals after bound edits: a full-span
    /// `Min..Max` prefix collapses to always-true, a start above the end
    /// (or an equal single point with an open side) to always-false.
    pub(crate) fn formalize(&mut self) -> Result<(), GenError> {
        if self.always_true || self.always_false {
            return Ok(());
        }

        let last = self.column_cnt - 1;
        let mut always_true = true;
        for i in self.min_offset..=last {
            if self.start[i].is_min() && self.end[i].is_max() {
                continue;
            }
            always_true = false;
            match key_cmp(&self.start[i], &self.end[i], self.null_order)? {
                Ordering::Less => break,
                Ordering::Greater => {
                    self.set_always_false();
                    return Ok(());
                }
                Ordering::Equal => {
                    if i == last && !(self.include_start && self.include_end) {
                        self.set_always_false();
                        return Ok(());
                    }
                }
            }
        }

        if always_true {
            self.set_always_true();
        }

        Ok(())
    }

    /// Finalize bounds for output: fill every remaining slot so the keys
    /// read as a complete interval over all columns.
    ///
    /// A range whose first constrained column is not column 0 cannot seed an
    /// index scan and degrades to the universal range.
    pub(crate) fn refine_final_range(&mut self) -> Result<(), GenError> {
        if self.always_true || self.always_false {
            return Ok(());
        }
        if self.min_offset != 0 {
            self.set_always_true();
            return Ok(());
        }

        // Everything after an open bound is meaningless: (1, MIN, 3) reads
        // as (1, MIN, MIN).
        let mut start_open = false;
        let mut end_open = false;
        for i in 0..self.column_cnt {
            if start_open {
                self.start[i] = KeyValue::Min;
                self.include_start = false;
            } else if self.start[i].is_min() {
                start_open = true;
                self.include_start = false;
            } else if self.start[i].is_nop() {
                return Err(GenError::contract("nop start bound in a finalized range"));
            }

            if end_open {
                self.end[i] = KeyValue::Max;
                self.include_end = false;
            } else if self.end[i].is_max() {
                end_open = true;
                self.include_end = false;
            } else if self.end[i].is_nop() {
                return Err(GenError::contract("nop end bound in a finalized range"));
            }
        }

        Ok(())
    }

    /// Drop the leading `offset` columns so the remaining suffix forms a
    /// range over the postfix columns of a skip scan.
    pub(crate) fn shift_for_skip_scan(&mut self, offset: usize) {
        if offset == 0 || offset >= self.column_cnt {
            return;
        }
        self.start.drain(..offset);
        self.end.drain(..offset);
        self.min_offset = self.min_offset.saturating_sub(offset);
        self.max_offset = self.max_offset.saturating_sub(offset);
        self.column_cnt -= offset;
    }
}
