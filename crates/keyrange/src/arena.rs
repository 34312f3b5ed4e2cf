//! Module: arena
//! Responsibility: generation-scoped storage for working ranges and
//! resolved not-in parameters.
//! Does not own: range arithmetic or graph traversal.
//! Boundary: handles never outlive a reset; everything is released en masse.

use crate::{error::GenError, generate::NotInParam, value::NullOrder, working::WorkingRange};

///
/// TmpRangeId
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TmpRangeId(u32);

///
/// NotInParamId
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NotInParamId(u32);

///
/// GenArena
///
/// Slot arena for one generation run. Allocation is append-only and charged
/// against a budget counting key slots, so a hostile predicate cannot grow
/// memory without bound. `reset` keeps capacity for reuse across runs.
///

pub struct GenArena {
    ranges: Vec<WorkingRange>,
    not_in_params: Vec<NotInParam>,
    budget: usize,
    used: usize,
}

impl GenArena {
    #[must_use]
    pub fn with_budget(budget: usize) -> Self {
        Self {
            ranges: Vec::new(),
            not_in_params: Vec::new(),
            budget,
            used: 0,
        }
    }

    pub fn reset(&mut self) {
        self.ranges.clear();
        self.not_in_params.clear();
        self.used = 0;
    }

    pub(crate) fn alloc_range(
        &mut self,
        column_cnt: usize,
        null_order: NullOrder,
    ) -> Result<TmpRangeId, GenError> {
        self.charge(column_cnt * 2)?;
        let id = u32::try_from(self.ranges.len())
            .map_err(|_| GenError::allocation("working range count overflow"))?;
        self.ranges.push(WorkingRange::new(column_cnt, null_order));

        Ok(TmpRangeId(id))
    }

    pub(crate) fn range(&self, id: TmpRangeId) -> &WorkingRange {
        &self.ranges[id.0 as usize]
    }

    pub(crate) fn range_mut(&mut self, id: TmpRangeId) -> &mut WorkingRange {
        &mut self.ranges[id.0 as usize]
    }

    /// Mutable/shared pair for in-place intersection of two distinct slots.
    pub(crate) fn range_pair_mut(
        &mut self,
        dst: TmpRangeId,
        src: TmpRangeId,
    ) -> Result<(&mut WorkingRange, &WorkingRange), GenError> {
        let dst = dst.0 as usize;
        let src = src.0 as usize;
        if dst == src {
            return Err(GenError::contract("cannot intersect a range with itself"));
        }

        if dst < src {
            let (head, tail) = self.ranges.split_at_mut(src);
            Ok((&mut head[dst], &tail[0]))
        } else {
            let (head, tail) = self.ranges.split_at_mut(dst);
            Ok((&mut tail[0], &head[src]))
        }
    }

    pub(crate) fn alloc_not_in_param(
        &mut self,
        param: NotInParam,
    ) -> Result<NotInParamId, GenError> {
        self.charge(param.values.len().max(1))?;
        let id = u32::try_from(self.not_in_params.len())
            .map_err(|_| GenError::allocation("not-in param count overflow"))?;
        self.not_in_params.push(param);

        Ok(NotInParamId(id))
    }

    pub(crate) fn not_in_param(&self, id: NotInParamId) -> &NotInParam {
        &self.not_in_params[id.0 as usize]
    }

    fn charge(&mut self, slots: usize) -> Result<(), GenError> {
        self.used = self.used.saturating_add(slots);
        if self.used > self.budget {
            return Err(GenError::allocation(format!(
                "generation arena budget of {} key slots exceeded",
                self.budget
            )));
        }

        Ok(())
    }
}
