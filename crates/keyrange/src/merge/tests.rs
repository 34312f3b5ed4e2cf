use crate::{
    merge::merge_and_remove,
    output::ScanRange,
    value::{KeyValue, NullOrder, ScalarValue},
};
use proptest::prelude::*;

// ---- helpers -----------------------------------------------------------

fn k_i(x: i64) -> KeyValue {
    KeyValue::Val(ScalarValue::Int(x))
}

fn range(start: i64, end: i64, include_start: bool, include_end: bool) -> ScanRange {
    ScanRange {
        table_id: 1,
        start_key: vec![k_i(start)],
        end_key: vec![k_i(end)],
        include_start,
        include_end,
        is_phy_rowid: false,
    }
}

fn point(v: i64) -> ScanRange {
    range(v, v, true, true)
}

fn universal() -> ScanRange {
    ScanRange::universal(1, 1)
}

fn empty_sentinel() -> ScanRange {
    ScanRange {
        table_id: 1,
        start_key: vec![KeyValue::Max],
        end_key: vec![KeyValue::Min],
        include_start: false,
        include_end: false,
        is_phy_rowid: false,
    }
}

fn merge(
    ranges: Vec<ScanRange>,
    always_true: Option<ScanRange>,
    always_false: Option<ScanRange>,
    is_equal_range: bool,
) -> (Vec<ScanRange>, bool) {
    merge_and_remove(
        ranges,
        always_true,
        always_false,
        is_equal_range,
        0,
        NullOrder::NullsFirst,
    )
    .unwrap()
}

// ---- regimes -----------------------------------------------------------

#[test]
fn always_true_subsumes_everything() {
    let (out, cleared) = merge(vec![point(1), point(2)], Some(universal()), None, false);
    assert_eq!(out, vec![universal()]);
    assert!(!cleared);
}

#[test]
fn empty_set_requires_the_sentinel() {
    let (out, cleared) = merge(Vec::new(), None, Some(empty_sentinel()), false);
    assert_eq!(out, vec![empty_sentinel()]);
    assert!(cleared);

    let err = merge_and_remove(Vec::new(), None, None, false, 0, NullOrder::NullsFirst);
    assert!(err.is_err());
}

#[test]
fn single_range_passes_through() {
    let (out, cleared) = merge(vec![range(1, 5, true, false)], None, None, false);
    assert_eq!(out, vec![range(1, 5, true, false)]);
    assert!(!cleared);
}

#[test]
fn equal_regime_dedups_in_insertion_order() {
    let (out, _) = merge(
        vec![point(5), point(1), point(5), point(3), point(1)],
        None,
        None,
        true,
    );
    assert_eq!(out, vec![point(5), point(1), point(3)]);
}

#[test]
fn equal_regime_keeps_flag_distinct_ranges() {
    let (out, _) = merge(
        vec![range(1, 5, true, true), range(1, 5, true, false)],
        None,
        None,
        true,
    );
    assert_eq!(out.len(), 2);
}

// ---- general coalescing ------------------------------------------------

#[test]
fn disjoint_ranges_are_sorted() {
    let (out, _) = merge(
        vec![range(7, 9, true, true), range(1, 3, true, true)],
        None,
        None,
        false,
    );
    assert_eq!(out, vec![range(1, 3, true, true), range(7, 9, true, true)]);
}

#[test]
fn overlapping_ranges_coalesce() {
    let (out, _) = merge(
        vec![range(1, 5, true, true), range(3, 9, true, false)],
        None,
        None,
        false,
    );
    assert_eq!(out, vec![range(1, 9, true, false)]);
}

#[test]
fn nested_range_is_absorbed() {
    let (out, _) = merge(
        vec![range(1, 9, true, true), range(3, 4, true, true)],
        None,
        None,
        false,
    );
    assert_eq!(out, vec![range(1, 9, true, true)]);
}

#[test]
fn touching_ranges_merge_when_one_side_is_closed() {
    let (out, _) = merge(
        vec![range(1, 5, true, true), range(5, 9, false, true)],
        None,
        None,
        false,
    );
    assert_eq!(out, vec![range(1, 9, true, true)]);
}

#[test]
fn double_exclusive_boundary_stays_disjoint() {
    // (1, 5) and (5, 9) both leave 5 out; merging would admit it
    let (out, _) = merge(
        vec![range(1, 5, false, false), range(5, 9, false, false)],
        None,
        None,
        false,
    );
    assert_eq!(
        out,
        vec![range(1, 5, false, false), range(5, 9, false, false)]
    );
}

#[test]
fn equal_ends_prefer_the_inclusive_flag() {
    let (out, _) = merge(
        vec![range(1, 5, true, false), range(2, 5, true, true)],
        None,
        None,
        false,
    );
    assert_eq!(out, vec![range(1, 5, true, true)]);
}

// ---- properties --------------------------------------------------------

fn contains(range: &ScanRange, key: i64) -> bool {
    use std::cmp::Ordering;
    let no = NullOrder::NullsFirst;
    let key = [k_i(key)];
    let start = crate::value::key_seq_cmp_total(&range.start_key, &key, no);
    let end = crate::value::key_seq_cmp_total(&key, &range.end_key, no);
    (start == Ordering::Less || (start == Ordering::Equal && range.include_start))
        && (end == Ordering::Less || (end == Ordering::Equal && range.include_end))
}

fn arb_range() -> impl Strategy<Value = ScanRange> {
    (0i64..20, 0i64..20, any::<bool>(), any::<bool>()).prop_filter_map(
        "non-empty",
        |(a, b, inc_s, inc_e)| {
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            if start == end && !(inc_s && inc_e) {
                return None;
            }
            Some(range(start, end, inc_s, inc_e))
        },
    )
}

proptest! {
    #[test]
    fn coalescing_preserves_the_union(ranges in prop::collection::vec(arb_range(), 1..12)) {
        let (out, _) = merge(ranges.clone(), None, None, false);
        for key in -1i64..22 {
            let before = ranges.iter().any(|r| contains(r, key));
            let after = out.iter().any(|r| contains(r, key));
            prop_assert_eq!(before, after, "key {}", key);
        }
    }

    #[test]
    fn coalesced_ranges_are_sorted_and_disjoint(ranges in prop::collection::vec(arb_range(), 1..12)) {
        let (out, _) = merge(ranges, None, None, false);
        for pair in out.windows(2) {
            let left_end = match &pair[0].end_key[0] {
                KeyValue::Val(ScalarValue::Int(v)) => *v,
                other => panic!("unexpected key {other:?}"),
            };
            let right_start = match &pair[1].start_key[0] {
                KeyValue::Val(ScalarValue::Int(v)) => *v,
                other => panic!("unexpected key {other:?}"),
            };
            prop_assert!(left_end <= right_start);
            if left_end == right_start {
                prop_assert!(!pair[0].include_end && !pair[1].include_start);
            }
        }
    }
}
