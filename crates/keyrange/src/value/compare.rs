use crate::{
    error::GenError,
    value::{KeyValue, NullOrder, ScalarValue},
};
use std::cmp::Ordering;

/// Relational comparator over concrete values.
///
/// Same-variant comparisons are native; numeric variants compare numerically
/// across `Int`/`Float` without precision loss; text compared against a
/// numeric value is parsed as its leading numeric prefix. Returns `None` for
/// genuinely incomparable pairs (mixed row locators, unmaterialized lobs).
#[must_use]
pub fn semantic_cmp(left: &ScalarValue, right: &ScalarValue) -> Option<Ordering> {
    match (left, right) {
        (ScalarValue::Int(a), ScalarValue::Int(b)) => Some(a.cmp(b)),
        (ScalarValue::Float(a), ScalarValue::Float(b)) => Some(a.cmp(b)),
        (ScalarValue::Text(a), ScalarValue::Text(b)) => Some(a.cmp(b)),
        (ScalarValue::Bytes(a), ScalarValue::Bytes(b)) => Some(a.cmp(b)),
        (ScalarValue::Int(a), ScalarValue::Float(b)) => Some(cmp_i64_f64(*a, b.get())),
        (ScalarValue::Float(a), ScalarValue::Int(b)) => {
            Some(cmp_i64_f64(*b, a.get()).reverse())
        }
        (ScalarValue::Text(a), ScalarValue::Int(_) | ScalarValue::Float(_)) => {
            Some(text_numeric_value(a).total_cmp(&numeric_value(right)?))
        }
        (ScalarValue::Int(_) | ScalarValue::Float(_), ScalarValue::Text(b)) => {
            Some(numeric_value(left)?.total_cmp(&text_numeric_value(b)))
        }
        (ScalarValue::Text(a), ScalarValue::Bytes(b)) => Some(a.as_bytes().cmp(b.as_slice())),
        (ScalarValue::Bytes(a), ScalarValue::Text(b)) => Some(a.as_slice().cmp(b.as_bytes())),
        (ScalarValue::RowId(a), ScalarValue::RowId(b)) if a.kind == b.kind => {
            semantic_seq_cmp(&a.pk, &b.pk)
        }
        _ => None,
    }
}

// Lexicographic comparison of decomposed primary-key components.
fn semantic_seq_cmp(left: &[ScalarValue], right: &[ScalarValue]) -> Option<Ordering> {
    for (left, right) in left.iter().zip(right.iter()) {
        let cmp = semantic_cmp(left, right)?;
        if cmp != Ordering::Equal {
            return Some(cmp);
        }
    }

    Some(left.len().cmp(&right.len()))
}

/// Exact integer/float comparison. `int as f64` is lossy above 2^53, so the
/// magnitudes are compared through the float's integer part instead; NaN
/// placement follows `total_cmp` (positive NaN above every number, negative
/// below).
fn cmp_i64_f64(int: i64, float: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if float.is_nan() {
        return if float.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    // covers the infinities too
    if float >= TWO_POW_63 {
        return Ordering::Less;
    }
    if float < -TWO_POW_63 {
        return Ordering::Greater;
    }

    // float is in [-2^63, 2^63): its integer part converts exactly
    let trunc = float.trunc();
    match int.cmp(&(trunc as i64)) {
        Ordering::Equal if float > trunc => Ordering::Less,
        Ordering::Equal if float < trunc => Ordering::Greater,
        other => other,
    }
}

fn numeric_value(value: &ScalarValue) -> Option<f64> {
    match value {
        ScalarValue::Int(v) => Some(*v as f64),
        ScalarValue::Float(v) => Some(v.get()),
        _ => None,
    }
}

/// Numeric value of the longest leading numeric prefix of a string, or 0.0
/// when no prefix parses. Matches permissive string-to-number coercion.
#[must_use]
pub(crate) fn text_numeric_value(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let mut end = 0;
    let bytes = trimmed.as_bytes();
    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        let b = bytes[end];
        if b.is_ascii_digit() {
            seen_digit = true;
        } else if (b == b'+' || b == b'-') && end == 0 {
            // sign only at the front
        } else if b == b'.' && !seen_dot {
            seen_dot = true;
        } else {
            break;
        }
        end += 1;
    }

    if !seen_digit {
        return 0.0;
    }

    trimmed[..end].parse::<f64>().unwrap_or(0.0)
}

/// Total comparator over tagged bound slots.
///
/// `Min` sorts below everything and `Max` above; `Null` placement follows
/// the dialect convention. `Nop` slots and incomparable concrete pairs are
/// contract violations: they indicate a malformed graph or a missed cast.
pub fn key_cmp(left: &KeyValue, right: &KeyValue, null_order: NullOrder) -> Result<Ordering, GenError> {
    match (left, right) {
        (KeyValue::Nop, _) | (_, KeyValue::Nop) => {
            Err(GenError::contract("unexpected nop bound in key comparison"))
        }
        (KeyValue::Val(a), KeyValue::Val(b)) => semantic_cmp(a, b)
            .ok_or_else(|| GenError::contract("bound values are not mutually comparable")),
        _ => Ok(key_cmp_total(left, right, null_order)),
    }
}

/// Infallible variant used where totality is already guaranteed (finalized
/// output keys never contain `Nop` or cross-type bounds).
#[must_use]
pub(crate) fn key_cmp_total(left: &KeyValue, right: &KeyValue, null_order: NullOrder) -> Ordering {
    match (left, right) {
        (KeyValue::Min, KeyValue::Min) | (KeyValue::Max, KeyValue::Max) => Ordering::Equal,
        (KeyValue::Min, _) => Ordering::Less,
        (_, KeyValue::Min) => Ordering::Greater,
        (KeyValue::Max, _) => Ordering::Greater,
        (_, KeyValue::Max) => Ordering::Less,
        (KeyValue::Null, KeyValue::Null) => Ordering::Equal,
        (KeyValue::Null, KeyValue::Val(_)) => match null_order {
            NullOrder::NullsFirst => Ordering::Less,
            NullOrder::NullsLast => Ordering::Greater,
        },
        (KeyValue::Val(_), KeyValue::Null) => match null_order {
            NullOrder::NullsFirst => Ordering::Greater,
            NullOrder::NullsLast => Ordering::Less,
        },
        (KeyValue::Val(a), KeyValue::Val(b)) => {
            let cmp = semantic_cmp(a, b);
            debug_assert!(cmp.is_some(), "finalized key values must be mutually comparable");
            cmp.unwrap_or(Ordering::Equal)
        }
        (KeyValue::Nop, _) | (_, KeyValue::Nop) => Ordering::Equal,
    }
}

/// Lexicographic comparison of two composite keys, first differing column
/// wins.
#[must_use]
pub(crate) fn key_seq_cmp_total(
    left: &[KeyValue],
    right: &[KeyValue],
    null_order: NullOrder,
) -> Ordering {
    for (left, right) in left.iter().zip(right.iter()) {
        let cmp = key_cmp_total(left, right, null_order);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    left.len().cmp(&right.len())
}
