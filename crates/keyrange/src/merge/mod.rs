//! Module: merge
//! Responsibility: dedup, sort and coalesce the emitted scan ranges.
//! Does not own: range construction.
//! Boundary: pure pass over finalized ranges; graph and arena never reach
//! this layer.

#[cfg(test)]
mod tests;

use crate::{
    error::GenError,
    output::ScanRange,
    value::{key_seq_cmp_total, KeyValue, NullOrder},
};
use ahash::AHashSet;
use std::cmp::Ordering;

const RANGE_BUCKET_SIZE: usize = 16;

///
/// RangeKey
///
/// Hashable identity of a range for the equality-regime dedup set.
///

#[derive(Eq, Hash, PartialEq)]
struct RangeKey {
    start: Vec<KeyValue>,
    end: Vec<KeyValue>,
    include_start: bool,
    include_end: bool,
}

impl RangeKey {
    fn of(range: &ScanRange) -> Self {
        Self {
            start: range.start_key.clone(),
            end: range.end_key.clone(),
            include_start: range.include_start,
            include_end: range.include_end,
        }
    }
}

/// Reduce emitted ranges to a minimal set.
///
/// An always-true range subsumes everything. An empty set must carry the
/// always-false sentinel so the caller still receives one provably-empty
/// range. Equality graphs only ever produce point ranges, so duplicates are
/// removed by hashing in insertion order; everything else is sorted and
/// coalesced. Returns the ranges plus whether the single-point guarantee
/// was broken by this pass.
pub(crate) fn merge_and_remove(
    ranges: Vec<ScanRange>,
    always_true: Option<ScanRange>,
    always_false: Option<ScanRange>,
    is_equal_range: bool,
    range_size_hint: usize,
    null_order: NullOrder,
) -> Result<(Vec<ScanRange>, bool), GenError> {
    if let Some(range) = always_true {
        return Ok((vec![range], false));
    }
    if ranges.is_empty() {
        let range = always_false
            .ok_or_else(|| GenError::contract("no ranges and no always-false sentinel"))?;
        return Ok((vec![range], true));
    }
    if ranges.len() == 1 {
        return Ok((ranges, false));
    }

    if is_equal_range {
        let mut seen =
            AHashSet::with_capacity(range_size_hint.max(RANGE_BUCKET_SIZE));
        let mut out = Vec::with_capacity(ranges.len());
        for range in ranges {
            if seen.insert(RangeKey::of(&range)) {
                out.push(range);
            }
        }
        return Ok((out, false));
    }

    let mut ranges = ranges;
    ranges.sort_by(|a, b| start_cmp(a, b, null_order));

    let mut out = Vec::with_capacity(ranges.len());
    let mut iter = ranges.into_iter();
    let mut cur = match iter.next() {
        Some(first) => first,
        None => return Ok((out, false)),
    };
    for range in iter {
        match end_start_cmp(&cur, &range, null_order) {
            Ordering::Less => {
                out.push(std::mem::replace(&mut cur, range));
            }
            Ordering::Equal => {
                // touching: extend with the next range's end
                cur.end_key = range.end_key;
                cur.include_end = range.include_end;
            }
            Ordering::Greater => {
                // overlapping: keep the farther end
                let end_cmp = key_seq_cmp_total(&cur.end_key, &range.end_key, null_order);
                if end_cmp == Ordering::Less
                    || (end_cmp == Ordering::Equal && !cur.include_end && range.include_end)
                {
                    cur.end_key = range.end_key;
                    cur.include_end = range.include_end;
                }
            }
        }
    }
    out.push(cur);

    Ok((out, false))
}

// Sort by start key; on ties an inclusive start comes first.
fn start_cmp(left: &ScanRange, right: &ScanRange, null_order: NullOrder) -> Ordering {
    key_seq_cmp_total(&left.start_key, &right.start_key, null_order)
        .then_with(|| right.include_start.cmp(&left.include_start))
}

/// Compare `cur`'s end against `next`'s start. Equal raw keys count as
/// touching only when at least one side is inclusive; two exclusive bounds
/// on the same key leave that key out of both ranges and must stay disjoint.
fn end_start_cmp(cur: &ScanRange, next: &ScanRange, null_order: NullOrder) -> Ordering {
    let cmp = key_seq_cmp_total(&cur.end_key, &next.start_key, null_order);
    if cmp == Ordering::Equal && !(cur.include_end || next.include_start) {
        return Ordering::Less;
    }

    cmp
}
