use crate::{
    error::GenError,
    value::{
        compare::{semantic_cmp, text_numeric_value},
        ColumnMeta, ColumnType, KeyValue, ScalarValue,
    },
    working::WorkingRange,
};
use num_traits::cast::cast;
use std::cmp::Ordering;

/// Coerce a resolved value to a column's comparison type.
///
/// Returns the cast value together with the direction the original value
/// sits relative to it (`Less` when the cast rounded up, `Greater` when it
/// rounded down, `Equal` for a lossless cast). Row locators and lob
/// references are never re-typed here.
pub fn try_cast(
    meta: &ColumnMeta,
    value: ScalarValue,
) -> Result<(ScalarValue, Ordering), GenError> {
    if matches!(value, ScalarValue::RowId(_) | ScalarValue::Lob(_)) || matches_type(meta, &value) {
        return Ok((value, Ordering::Equal));
    }

    let cast_value = cast_scalar(meta.column_type, &value)?;
    let delta = semantic_cmp(&value, &cast_value).unwrap_or(Ordering::Equal);

    Ok((cast_value, delta))
}

fn matches_type(meta: &ColumnMeta, value: &ScalarValue) -> bool {
    matches!(
        (meta.column_type, value),
        (ColumnType::Int, ScalarValue::Int(_))
            | (ColumnType::Float, ScalarValue::Float(_))
            | (ColumnType::Text, ScalarValue::Text(_))
            | (ColumnType::Bytes, ScalarValue::Bytes(_))
    )
}

fn cast_scalar(target: ColumnType, value: &ScalarValue) -> Result<ScalarValue, GenError> {
    let cast_value = match (target, value) {
        (ColumnType::Int, ScalarValue::Float(f)) => ScalarValue::Int(round_to_i64(f.get())),
        (ColumnType::Int, ScalarValue::Text(s)) => {
            ScalarValue::Int(round_to_i64(text_numeric_value(s)))
        }
        (ColumnType::Int, ScalarValue::Bytes(b)) => {
            ScalarValue::Int(round_to_i64(text_numeric_value(&String::from_utf8_lossy(b))))
        }
        (ColumnType::Float, ScalarValue::Int(i)) => ScalarValue::float(*i as f64),
        (ColumnType::Float, ScalarValue::Text(s)) => ScalarValue::float(text_numeric_value(s)),
        (ColumnType::Float, ScalarValue::Bytes(b)) => {
            ScalarValue::float(text_numeric_value(&String::from_utf8_lossy(b)))
        }
        (ColumnType::Text, ScalarValue::Int(i)) => ScalarValue::Text(i.to_string()),
        (ColumnType::Text, ScalarValue::Float(f)) => ScalarValue::Text(f.get().to_string()),
        (ColumnType::Text, ScalarValue::Bytes(b)) => {
            ScalarValue::Text(String::from_utf8_lossy(b).into_owned())
        }
        (ColumnType::Bytes, ScalarValue::Text(s)) => ScalarValue::Bytes(s.clone().into_bytes()),
        (ColumnType::Bytes, ScalarValue::Int(i)) => ScalarValue::Bytes(i.to_string().into_bytes()),
        (ColumnType::Bytes, ScalarValue::Float(f)) => {
            ScalarValue::Bytes(f.get().to_string().into_bytes())
        }
        _ => {
            return Err(GenError::contract("no cast path for bound value"));
        }
    };

    Ok(cast_value)
}

// Round-half-away-from-zero, saturating at the i64 edges.
fn round_to_i64(value: f64) -> i64 {
    cast::<f64, i64>(value.round()).unwrap_or(if value.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Repair a working range after casting its bound values to column types.
///
/// A cast that moved a bound value must widen the range so no originally
/// matching key is lost: a start that rounded up becomes inclusive (or, on a
/// non-final column, the trailing slots drop to `Min` and the start opens);
/// a start that rounded down opens (trailing slots rise to `Max`). Ends are
/// mirrored. Finishes with a formalize pass.
pub(crate) fn cast_bounds(
    range: &mut WorkingRange,
    metas: &[ColumnMeta],
) -> Result<(), GenError> {
    if range.always_true || range.always_false {
        return Ok(());
    }
    if range.column_cnt > metas.len() {
        return Err(GenError::contract("range spans more columns than metadata"));
    }

    let last = range.column_cnt - 1;
    for i in range.min_offset..=last {
        let KeyValue::Val(value) = &range.start[i] else {
            continue;
        };
        let (cast_value, delta) = try_cast(&metas[i], value.clone())?;
        range.start[i] = KeyValue::Val(cast_value);
        match delta {
            Ordering::Equal => {}
            Ordering::Less => {
                // original < cast: cast rounded the start up
                if i == last {
                    range.include_start = true;
                } else {
                    fill_tail(&mut range.start, i + 1, last, KeyValue::Min);
                    range.include_start = false;
                }
                break;
            }
            Ordering::Greater => {
                if i == last {
                    range.include_start = false;
                } else {
                    fill_tail(&mut range.start, i + 1, last, KeyValue::Max);
                    range.include_start = false;
                }
                break;
            }
        }
    }

    for i in range.min_offset..=last {
        let KeyValue::Val(value) = &range.end[i] else {
            continue;
        };
        let (cast_value, delta) = try_cast(&metas[i], value.clone())?;
        range.end[i] = KeyValue::Val(cast_value);
        match delta {
            Ordering::Equal => {}
            Ordering::Less => {
                if i == last {
                    range.include_end = false;
                } else {
                    fill_tail(&mut range.end, i + 1, last, KeyValue::Min);
                    range.include_end = false;
                }
                break;
            }
            Ordering::Greater => {
                // original > cast: cast rounded the end down
                if i == last {
                    range.include_end = true;
                } else {
                    fill_tail(&mut range.end, i + 1, last, KeyValue::Max);
                    range.include_end = false;
                }
                break;
            }
        }
    }

    range.formalize()
}

fn fill_tail(
    keys: &mut smallvec::SmallVec<[KeyValue; 4]>,
    from: usize,
    last: usize,
    fill: KeyValue,
) {
    for slot in &mut keys[from..=last] {
        *slot = fill.clone();
    }
}
