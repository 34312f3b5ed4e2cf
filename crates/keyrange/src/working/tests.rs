use crate::{
    value::{KeyValue, NullOrder, ScalarValue},
    working::WorkingRange,
};
use proptest::prelude::*;

// ---- helpers -----------------------------------------------------------

fn k_i(x: i64) -> KeyValue {
    KeyValue::Val(ScalarValue::Int(x))
}

/// Single-column constraint on `offset` of a `column_cnt`-wide key, padded
/// the way finalized nodes are: nop before the span, and trailing columns
/// encoding the border (closed start pads min, open start pads max;
/// mirrored for the end).
fn col_range_wide(
    column_cnt: usize,
    offset: usize,
    start: KeyValue,
    end: KeyValue,
    include_start: bool,
    include_end: bool,
) -> WorkingRange {
    let mut range = WorkingRange::new(column_cnt, NullOrder::NullsFirst);
    for i in 0..offset {
        range.start[i] = KeyValue::Nop;
        range.end[i] = KeyValue::Nop;
    }
    range.start[offset] = start;
    range.end[offset] = end;
    let start_open = range.start[offset].is_min();
    let end_open = range.end[offset].is_max();
    for i in (offset + 1)..column_cnt {
        range.start[i] = if include_start || start_open { KeyValue::Min } else { KeyValue::Max };
        range.end[i] = if include_end || end_open { KeyValue::Max } else { KeyValue::Min };
    }
    range.include_start = include_start;
    range.include_end = include_end;
    range.min_offset = offset;
    range.max_offset = offset;
    range
}

fn col_range(
    offset: usize,
    start: KeyValue,
    end: KeyValue,
    include_start: bool,
    include_end: bool,
) -> WorkingRange {
    col_range_wide(2, offset, start, end, include_start, include_end)
}

// ---- intersect ---------------------------------------------------------

#[test]
fn intersect_with_always_false_empties() {
    let mut a = col_range(0, k_i(1), k_i(5), true, true);
    let mut b = WorkingRange::new(2, NullOrder::NullsFirst);
    b.set_always_false();
    assert!(!a.intersect(&b).unwrap());
    assert!(a.always_false);
}

#[test]
fn intersect_with_always_true_is_identity() {
    let mut a = col_range(0, k_i(1), k_i(5), true, true);
    let mut b = WorkingRange::new(2, NullOrder::NullsFirst);
    b.set_always_true();
    assert!(!a.intersect(&b).unwrap());
    assert_eq!(a.start[0], k_i(1));
    assert_eq!(a.end[0], k_i(5));
}

#[test]
fn intersect_into_always_true_copies_the_other() {
    let mut a = WorkingRange::new(2, NullOrder::NullsFirst);
    a.set_always_true();
    let b = col_range(0, k_i(1), k_i(5), true, false);
    assert!(!a.intersect(&b).unwrap());
    assert_eq!(a.start[0], k_i(1));
    assert!(a.include_start);
    assert!(!a.include_end);
}

#[test]
fn intersect_rejects_a_shallower_other() {
    let mut a = col_range(1, k_i(1), k_i(5), true, true);
    let b = col_range(0, k_i(1), k_i(5), true, true);
    assert!(a.intersect(&b).is_err());
}

#[test]
fn intersect_reports_a_column_gap() {
    // column 1 is unconstrained between the two spans
    let mut a = col_range_wide(3, 0, k_i(1), k_i(5), true, true);
    let b = col_range_wide(3, 2, k_i(1), k_i(5), true, true);
    assert!(a.intersect(&b).unwrap());
}

#[test]
fn intersect_tightens_both_bounds() {
    // [1, 10] /\ [3, 12) => [3, 10]
    let mut a = col_range(0, k_i(1), k_i(10), true, true);
    let b = col_range(0, k_i(3), k_i(12), true, false);
    assert!(!a.intersect(&b).unwrap());
    assert_eq!(a.start[0], k_i(3));
    assert_eq!(a.end[0], k_i(10));
    assert!(a.include_start);
    assert!(a.include_end);
}

#[test]
fn intersect_extends_into_deeper_columns() {
    // c1 = 2 /\ c2 = 3 => (2, 3) point
    let mut a = col_range(0, k_i(2), k_i(2), true, true);
    let b = col_range(1, k_i(3), k_i(3), true, true);
    assert!(!a.intersect(&b).unwrap());
    assert_eq!(a.start[1], k_i(3));
    assert_eq!(a.end[1], k_i(3));
    assert_eq!(a.max_offset, 1);
    assert!(a.include_start && a.include_end);
}

#[test]
fn intersect_partial_merge_detects_crossed_bounds() {
    // [2, 5] /\ [1, 2) tightens only the end, leaving start 2 above the
    // open end at 2
    let mut a = col_range(0, k_i(2), k_i(5), true, true);
    let b = col_range(0, k_i(1), k_i(2), true, false);
    assert!(!a.intersect(&b).unwrap());
    assert!(a.always_false);
}

#[test]
fn intersect_equal_bounds_keep_the_tighter_flags() {
    // [1, 5] /\ (1, 5] => (1, 5]
    let mut a = col_range(0, k_i(1), k_i(5), true, true);
    let b = col_range(0, k_i(1), k_i(5), false, true);
    assert!(!a.intersect(&b).unwrap());
    assert!(!a.include_start);
    assert!(a.include_end);
}

// ---- formalize ---------------------------------------------------------

#[test]
fn formalize_detects_always_true() {
    let mut range = col_range(0, KeyValue::Min, KeyValue::Max, false, false);
    range.formalize().unwrap();
    assert!(range.always_true);
}

#[test]
fn formalize_detects_inverted_bounds() {
    let mut range = col_range(0, k_i(9), k_i(1), true, true);
    range.formalize().unwrap();
    assert!(range.always_false);
}

#[test]
fn formalize_empties_an_open_point() {
    let mut range = col_range(0, k_i(3), k_i(3), true, false);
    // equal through the last column with one open side matches nothing
    range.start[1] = k_i(7);
    range.end[1] = k_i(7);
    range.max_offset = 1;
    range.formalize().unwrap();
    assert!(range.always_false);
}

#[test]
fn formalize_keeps_a_closed_point() {
    let mut range = col_range(0, k_i(3), k_i(3), true, true);
    range.start[1] = k_i(7);
    range.end[1] = k_i(7);
    range.max_offset = 1;
    range.formalize().unwrap();
    assert!(!range.always_false);
    assert!(!range.always_true);
}

// ---- refine_final_range ------------------------------------------------

#[test]
fn refine_degrades_a_suffix_only_range() {
    let mut range = col_range(1, k_i(3), k_i(3), true, true);
    range.refine_final_range().unwrap();
    assert!(range.always_true);
    assert_eq!(range.start[0], KeyValue::Min);
    assert_eq!(range.end[1], KeyValue::Max);
}

#[test]
fn refine_propagates_open_bounds() {
    // (1, min, 3; ...) reads as (1, min, min)
    let mut range = WorkingRange::new(3, NullOrder::NullsFirst);
    range.start[0] = k_i(1);
    range.start[1] = KeyValue::Min;
    range.start[2] = k_i(3);
    range.end[0] = k_i(1);
    range.end[1] = KeyValue::Max;
    range.end[2] = k_i(3);
    range.include_start = true;
    range.include_end = true;
    range.min_offset = 0;
    range.max_offset = 2;
    range.refine_final_range().unwrap();
    assert_eq!(range.start[2], KeyValue::Min);
    assert_eq!(range.end[2], KeyValue::Max);
    assert!(!range.include_start);
    assert!(!range.include_end);
}

#[test]
fn refine_rejects_leftover_nop() {
    let mut range = col_range(0, k_i(1), k_i(1), true, true);
    range.start[1] = KeyValue::Nop;
    range.end[1] = KeyValue::Nop;
    assert!(range.refine_final_range().is_err());
}

// ---- skip scan ---------------------------------------------------------

#[test]
fn shift_drops_leading_columns() {
    let mut range = WorkingRange::new(3, NullOrder::NullsFirst);
    range.start[0] = KeyValue::Nop;
    range.end[0] = KeyValue::Nop;
    range.start[1] = k_i(4);
    range.end[1] = k_i(9);
    range.start[2] = KeyValue::Min;
    range.end[2] = KeyValue::Max;
    range.min_offset = 1;
    range.max_offset = 1;
    range.shift_for_skip_scan(1);
    assert_eq!(range.column_cnt, 2);
    assert_eq!(range.min_offset, 0);
    assert_eq!(range.start[0], k_i(4));
    assert_eq!(range.end[0], k_i(9));
}

// ---- properties --------------------------------------------------------

/// Membership of a two-int key in a working range over int columns.
fn contains(range: &WorkingRange, key: [i64; 2]) -> bool {
    if range.always_false {
        return false;
    }
    if range.always_true {
        return true;
    }
    let key = [k_i(key[0]), k_i(key[1])];
    let no = range.null_order;
    let start = crate::value::key_seq_cmp_total(&range.start[..], &key, no);
    let end = crate::value::key_seq_cmp_total(&key, &range.end[..], no);
    let above = start == std::cmp::Ordering::Less
        || (start == std::cmp::Ordering::Equal && range.include_start);
    let below = end == std::cmp::Ordering::Less
        || (end == std::cmp::Ordering::Equal && range.include_end);
    above && below
}

fn arb_full_range() -> impl Strategy<Value = WorkingRange> {
    (
        -5i64..5,
        -5i64..5,
        -5i64..5,
        -5i64..5,
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(s0, s1, e0, e1, inc_s, inc_e)| {
            let mut range = WorkingRange::new(2, NullOrder::NullsFirst);
            range.start[0] = k_i(s0);
            range.start[1] = k_i(s1);
            range.end[0] = k_i(e0);
            range.end[1] = k_i(e1);
            range.include_start = inc_s;
            range.include_end = inc_e;
            range.min_offset = 0;
            range.max_offset = 1;
            range.formalize().expect("int bounds are comparable");
            range
        })
}

proptest! {
    #[test]
    fn formalize_is_idempotent(mut range in arb_full_range()) {
        let snapshot = (
            range.start.clone(),
            range.end.clone(),
            range.always_true,
            range.always_false,
        );
        range.formalize().unwrap();
        prop_assert_eq!(snapshot.0, range.start.clone());
        prop_assert_eq!(snapshot.1, range.end.clone());
        prop_assert_eq!(snapshot.2, range.always_true);
        prop_assert_eq!(snapshot.3, range.always_false);
    }

    #[test]
    fn intersect_never_admits_new_keys(
        a in arb_full_range(),
        b in arb_full_range(),
        k0 in -6i64..6,
        k1 in -6i64..6,
    ) {
        let mut merged = a.clone();
        let not_consistent = merged.intersect(&b).unwrap();
        prop_assume!(!not_consistent);
        if contains(&merged, [k0, k1]) {
            prop_assert!(contains(&a, [k0, k1]));
            prop_assert!(contains(&b, [k0, k1]));
        }
    }
}
