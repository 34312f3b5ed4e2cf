//! Multi-column key range generation for index scans.
//!
//! Takes a normalized AND/OR predicate graph over an index's key columns
//! and produces the minimal set of sorted, non-overlapping scan ranges:
//! point lookups for precise gets, one folded range per pure AND chain,
//! and a backtracking walk with IN/NOT-IN expansion for everything else.

pub mod arena;
pub mod error;
pub mod generate;
pub mod graph;
pub mod output;
pub mod resolve;
pub mod value;

mod merge;
mod working;

pub mod prelude {
    pub use crate::{
        arena::GenArena,
        error::{GenError, GenErrorClass},
        generate::{GeneratorConfig, RangeGenerator},
        graph::{KeyRef, NodeId, RangeGraph, RangeNode, RowIdExpect, ValueRef, ValueRefKind},
        output::{GeneratedRanges, ScanRange},
        resolve::{ExecContext, LobStore, ScalarEvaluator},
        value::{
            ColumnMeta, ColumnType, KeyValue, NullOrder, RowId, RowIdKind, ScalarValue, F64,
        },
    };
}
