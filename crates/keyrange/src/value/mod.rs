//! Module: value
//! Responsibility: scalar values, tagged key-bound slots, and column metadata.
//! Does not own: value-reference resolution or range construction.
//! Boundary: consumed by the working-range, coercion, and generator layers.

mod coerce;
mod compare;


use std::hash::{Hash, Hasher};

// re-exports
pub use coerce::try_cast;
pub use compare::{key_cmp, semantic_cmp};
pub(crate) use coerce::cast_bounds;
pub(crate) use compare::{key_cmp_total, key_seq_cmp_total};

///
/// F64
///
/// Totally ordered float wrapper so composite keys stay `Eq`/`Ord`/`Hash`.
/// Ordering follows IEEE `total_cmp`; hashing follows the bit pattern.
///

#[derive(Clone, Copy, Debug)]
pub struct F64(f64);

impl F64 {
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl From<f64> for F64 {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl PartialEq for F64 {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == std::cmp::Ordering::Equal
    }
}

impl Eq for F64 {}

impl PartialOrd for F64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for F64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for F64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

///
/// RowIdKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RowIdKind {
    Physical,
    Logical,
}

///
/// RowId
///
/// Opaque row locator. Physical locators pass through range generation
/// untouched; logical ones decompose into primary-key components.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RowId {
    pub kind: RowIdKind,
    pub pk: Vec<ScalarValue>,
}

///
/// ScalarValue
///
/// Concrete comparable value produced by the resolver. `Lob` references are
/// materialized by the resolver before any comparison sees them.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ScalarValue {
    Int(i64),
    Float(F64),
    Text(String),
    Bytes(Vec<u8>),
    RowId(RowId),
    Lob(u64),
}

impl ScalarValue {
    #[must_use]
    pub const fn float(value: f64) -> Self {
        Self::Float(F64::new(value))
    }
}

///
/// KeyValue
///
/// One tagged bound slot of a composite key. `Nop` marks a column position
/// that carries no constraint yet; it must never reach a comparison.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum KeyValue {
    Min,
    Max,
    Null,
    Nop,
    Val(ScalarValue),
}

impl KeyValue {
    #[must_use]
    pub const fn is_min(&self) -> bool {
        matches!(self, Self::Min)
    }

    #[must_use]
    pub const fn is_max(&self) -> bool {
        matches!(self, Self::Max)
    }

    #[must_use]
    pub const fn is_nop(&self) -> bool {
        matches!(self, Self::Nop)
    }
}

///
/// ColumnType
///
/// Comparison-compatible type class of an indexed column.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnType {
    Int,
    Float,
    Text,
    Bytes,
}

///
/// ColumnMeta
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ColumnMeta {
    pub column_type: ColumnType,
}

impl ColumnMeta {
    #[must_use]
    pub const fn new(column_type: ColumnType) -> Self {
        Self { column_type }
    }
}

///
/// NullOrder
///
/// Dialect NULL-ordering convention. Drives both key comparison of `Null`
/// bounds and the first/last gap boundaries of NOT-IN expansion.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NullOrder {
    #[default]
    NullsFirst,
    NullsLast,
}
