//! Module: graph
//! Responsibility: the read-only predicate range graph handed to generation.
//! Does not own: value resolution or range construction.
//! Boundary: built by the planning layer, consumed immutably per execution.

use crate::{
    error::GenError,
    value::{ColumnMeta, ScalarValue},
};

pub type NodeId = usize;

///
/// KeyRef
///
/// Symbolic bound of one column in a graph node. `Value` and `InList` point
/// into the graph's value-reference and in-list tables. `Empty` appears only
/// on columns before a node's `min_offset`; from `min_offset` to the last
/// key column every slot carries a concrete ref (`Min`/`Max` padding past
/// `max_offset`).
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyRef {
    Min,
    Max,
    Null,
    Empty,
    Value(usize),
    InList(usize),
}

///
/// RangeNode
///
/// One conjunct of the normalized predicate graph. `and_next` chains tighter
/// constraints on deeper columns; `or_next` chains disjunctive siblings at
/// the same position. A node with `min_offset: None` constrains no column
/// and stands for a constant truth value.
///

#[derive(Clone, Debug)]
pub struct RangeNode {
    pub node_id: NodeId,
    pub start_keys: Vec<KeyRef>,
    pub end_keys: Vec<KeyRef>,
    pub include_start: bool,
    pub include_end: bool,
    pub min_offset: Option<usize>,
    pub max_offset: usize,
    pub is_phy_rowid: bool,
    pub contain_in: bool,
    pub is_not_in: bool,
    pub in_param_count: usize,
    pub and_next: Option<NodeId>,
    pub or_next: Option<NodeId>,
}

impl RangeNode {
    /// First constrained column, treating constant nodes as column 0.
    #[must_use]
    pub fn effective_min_offset(&self) -> usize {
        self.min_offset.unwrap_or(0)
    }
}

///
/// ValueRefKind
///

#[derive(Clone, Debug)]
pub enum ValueRefKind {
    /// Positional execution parameter.
    Param(usize),
    /// Pre-folded constant, `None` for a literal NULL.
    Const(Option<ScalarValue>),
    /// Expression evaluated through the caller's evaluator.
    Expr(usize),
}

///
/// RowIdExpect
///
/// What a value reference must decompose to when the indexed column is a
/// row-locator column.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RowIdExpect {
    None,
    Physical,
    /// 1-based component of a logical locator's embedded primary key.
    PkComponent(usize),
}

///
/// ValueRef
///

#[derive(Clone, Debug)]
pub struct ValueRef {
    pub kind: ValueRefKind,
    /// NULL resolves to a comparable `Null` bound instead of no-match.
    pub null_safe: bool,
    pub rowid: RowIdExpect,
}

///
/// RangeGraph
///
/// Normalized AND/OR graph over one index's key columns, plus the shared
/// tables its nodes reference. Planning classifies the graph once
/// (`is_precise_get` / `is_standard_range` / `is_equal_range`) so execution
/// can pick the cheapest walk without re-inspecting the nodes.
///

#[derive(Clone, Debug)]
pub struct RangeGraph {
    pub table_id: u64,
    pub column_metas: Vec<ColumnMeta>,
    pub nodes: Vec<RangeNode>,
    pub range_head: NodeId,
    pub value_refs: Vec<ValueRef>,
    pub in_params: Vec<Vec<usize>>,
    pub has_exec_param: bool,
    pub is_precise_get: bool,
    pub is_standard_range: bool,
    pub is_equal_range: bool,
    pub skip_scan_offset: Option<usize>,
    /// Planner's estimate of the output range count, used to size buffers.
    pub range_size: usize,
}

impl RangeGraph {
    pub fn node(&self, id: NodeId) -> Result<&RangeNode, GenError> {
        self.nodes
            .get(id)
            .ok_or_else(|| GenError::contract(format!("node id {id} out of bounds")))
    }

    pub fn column_meta(&self, offset: usize) -> Result<&ColumnMeta, GenError> {
        self.column_metas
            .get(offset)
            .ok_or_else(|| GenError::contract(format!("column offset {offset} out of bounds")))
    }

    pub fn value_ref(&self, idx: usize) -> Result<&ValueRef, GenError> {
        self.value_refs
            .get(idx)
            .ok_or_else(|| GenError::contract(format!("value ref {idx} out of bounds")))
    }

    pub fn in_param(&self, idx: usize) -> Result<&Vec<usize>, GenError> {
        self.in_params
            .get(idx)
            .ok_or_else(|| GenError::contract(format!("in-list param {idx} out of bounds")))
    }

    #[must_use]
    pub fn column_cnt(&self) -> usize {
        self.column_metas.len()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
