//! Module: resolve
//! Responsibility: turn symbolic value references into concrete scalars.
//! Does not own: type coercion or range arithmetic.
//! Boundary: the only place that touches execution parameters, expression
//! evaluation, and lob materialization.

use crate::{
    error::GenError,
    graph::{RangeGraph, RowIdExpect, ValueRefKind},
    value::{RowIdKind, ScalarValue},
};

///
/// ScalarEvaluator
///
/// Caller-supplied evaluation of deferred expressions referenced by the
/// graph. `Ok(None)` means the expression evaluated to SQL NULL.
///

pub trait ScalarEvaluator {
    fn eval(&self, expr_id: usize) -> Result<Option<ScalarValue>, GenError>;
}

///
/// LobStore
///
/// Materializes out-of-line large values into comparable scalars before any
/// bound comparison sees them.
///

pub trait LobStore {
    fn materialize(&self, lob_id: u64) -> Result<ScalarValue, GenError>;
}

///
/// ExecContext
///
/// Per-execution inputs for one generation run. `exec_param_readable` is
/// false during plan-time pre-extraction, where parameter slots exist but
/// hold no values yet.
///

pub struct ExecContext<'a> {
    pub params: &'a [Option<ScalarValue>],
    pub exec_param_readable: bool,
    pub evaluator: Option<&'a dyn ScalarEvaluator>,
    pub lobs: Option<&'a dyn LobStore>,
}

impl<'a> ExecContext<'a> {
    #[must_use]
    pub const fn new(params: &'a [Option<ScalarValue>]) -> Self {
        Self {
            params,
            exec_param_readable: true,
            evaluator: None,
            lobs: None,
        }
    }

    #[must_use]
    pub const fn with_evaluator(mut self, evaluator: &'a dyn ScalarEvaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    #[must_use]
    pub const fn with_lobs(mut self, lobs: &'a dyn LobStore) -> Self {
        self.lobs = Some(lobs);
        self
    }

    #[must_use]
    pub const fn plan_time(mut self) -> Self {
        self.exec_param_readable = false;
        self
    }
}

///
/// ResolvedValue
///
/// `Null` is a comparable null bound (null-safe references only); `Invalid`
/// means the predicate can never match through this bound.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum ResolvedValue {
    Value(ScalarValue),
    Null,
    Invalid,
}

/// Resolve one value reference against the execution context.
pub(crate) fn resolve_value(
    graph: &RangeGraph,
    ctx: &ExecContext<'_>,
    ref_idx: usize,
) -> Result<ResolvedValue, GenError> {
    let vref = graph.value_ref(ref_idx)?;

    let raw = match &vref.kind {
        ValueRefKind::Param(slot) => {
            if !ctx.exec_param_readable {
                return Err(GenError::contract(
                    "execution parameter read before parameters are bound",
                ));
            }
            ctx.params
                .get(*slot)
                .ok_or_else(|| GenError::contract(format!("parameter slot {slot} out of bounds")))?
                .clone()
        }
        ValueRefKind::Const(value) => value.clone(),
        ValueRefKind::Expr(expr_id) => {
            let evaluator = ctx
                .evaluator
                .ok_or_else(|| GenError::contract("expression reference without an evaluator"))?;
            evaluator.eval(*expr_id)?
        }
    };

    let raw = match raw {
        Some(ScalarValue::Lob(lob_id)) => {
            let lobs = ctx
                .lobs
                .ok_or_else(|| GenError::contract("lob reference without a lob store"))?;
            Some(lobs.materialize(lob_id)?)
        }
        other => other,
    };

    let raw = match (vref.rowid, raw) {
        (RowIdExpect::None, raw) => raw,
        (_, None) => None,
        (RowIdExpect::Physical, Some(ScalarValue::RowId(rowid))) => {
            if rowid.kind != RowIdKind::Physical {
                return Err(GenError::invalid_rowid(
                    "logical row identifier where a physical one is required",
                ));
            }
            Some(ScalarValue::RowId(rowid))
        }
        (RowIdExpect::PkComponent(component), Some(ScalarValue::RowId(rowid))) => {
            if rowid.kind != RowIdKind::Logical {
                return Err(GenError::invalid_rowid(
                    "physical row identifier where a logical one is required",
                ));
            }
            let idx = component.checked_sub(1).ok_or_else(|| {
                GenError::invalid_rowid("row identifier component index is 1-based")
            })?;
            let value = rowid.pk.get(idx).cloned().ok_or_else(|| {
                GenError::invalid_rowid("row identifier has too few key components")
            })?;
            Some(value)
        }
        // a plain scalar under a rowid column compares as-is
        (_, raw) => raw,
    };

    let resolved = match raw {
        Some(value) => ResolvedValue::Value(value),
        None if vref.null_safe => ResolvedValue::Null,
        None => ResolvedValue::Invalid,
    };

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ValueRef;
    use crate::value::{ColumnMeta, ColumnType, RowId};

    fn graph_with_refs(value_refs: Vec<ValueRef>) -> RangeGraph {
        RangeGraph {
            table_id: 1,
            column_metas: vec![ColumnMeta::new(ColumnType::Int)],
            nodes: Vec::new(),
            range_head: 0,
            value_refs,
            in_params: Vec::new(),
            has_exec_param: false,
            is_precise_get: false,
            is_standard_range: false,
            is_equal_range: false,
            skip_scan_offset: None,
            range_size: 1,
        }
    }

    #[test]
    fn null_param_is_invalid_unless_null_safe() {
        let graph = graph_with_refs(vec![
            ValueRef {
                kind: ValueRefKind::Param(0),
                null_safe: false,
                rowid: RowIdExpect::None,
            },
            ValueRef {
                kind: ValueRefKind::Param(0),
                null_safe: true,
                rowid: RowIdExpect::None,
            },
        ]);
        let params = vec![None];
        let ctx = ExecContext::new(&params);

        assert_eq!(resolve_value(&graph, &ctx, 0).unwrap(), ResolvedValue::Invalid);
        assert_eq!(resolve_value(&graph, &ctx, 1).unwrap(), ResolvedValue::Null);
    }

    #[test]
    fn param_read_at_plan_time_is_a_contract_violation() {
        let graph = graph_with_refs(vec![ValueRef {
            kind: ValueRefKind::Param(0),
            null_safe: false,
            rowid: RowIdExpect::None,
        }]);
        let params = vec![Some(ScalarValue::Int(3))];
        let ctx = ExecContext::new(&params).plan_time();

        assert!(resolve_value(&graph, &ctx, 0).is_err());
    }

    #[test]
    fn logical_rowid_decomposes_into_pk_components() {
        let graph = graph_with_refs(vec![ValueRef {
            kind: ValueRefKind::Const(Some(ScalarValue::RowId(RowId {
                kind: RowIdKind::Logical,
                pk: vec![ScalarValue::Int(7), ScalarValue::Text("x".into())],
            }))),
            null_safe: false,
            rowid: RowIdExpect::PkComponent(2),
        }]);
        let ctx = ExecContext::new(&[]);

        assert_eq!(
            resolve_value(&graph, &ctx, 0).unwrap(),
            ResolvedValue::Value(ScalarValue::Text("x".into()))
        );
    }

    #[test]
    fn pk_component_zero_is_invalid_rowid() {
        // component indices are 1-based; zero must surface as an error
        let graph = graph_with_refs(vec![ValueRef {
            kind: ValueRefKind::Const(Some(ScalarValue::RowId(RowId {
                kind: RowIdKind::Logical,
                pk: vec![ScalarValue::Int(1)],
            }))),
            null_safe: false,
            rowid: RowIdExpect::PkComponent(0),
        }]);
        let ctx = ExecContext::new(&[]);

        let err = resolve_value(&graph, &ctx, 0).unwrap_err();
        assert_eq!(err.class, crate::error::GenErrorClass::InvalidRowId);
    }

    #[test]
    fn physical_rowid_kind_mismatch_is_invalid_rowid() {
        let graph = graph_with_refs(vec![ValueRef {
            kind: ValueRefKind::Const(Some(ScalarValue::RowId(RowId {
                kind: RowIdKind::Logical,
                pk: vec![ScalarValue::Int(1)],
            }))),
            null_safe: false,
            rowid: RowIdExpect::Physical,
        }]);
        let ctx = ExecContext::new(&[]);

        let err = resolve_value(&graph, &ctx, 0).unwrap_err();
        assert_eq!(err.class, crate::error::GenErrorClass::InvalidRowId);
    }
}
