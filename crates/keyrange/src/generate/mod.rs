//! Module: generate
//! Responsibility: turn a predicate range graph into finalized scan ranges.
//! Does not own: graph construction or bound arithmetic.
//! Boundary: one generator per execution; all scratch state lives in the
//! caller's arena.


use crate::{
    arena::{GenArena, NotInParamId, TmpRangeId},
    error::GenError,
    graph::{KeyRef, NodeId, RangeGraph, RangeNode},
    merge,
    output::{GeneratedRanges, ScanRange},
    resolve::{resolve_value, ExecContext, ResolvedValue},
    value::{semantic_cmp, try_cast, KeyValue, NullOrder, ScalarValue},
};
use std::cmp::Ordering;

///
/// GeneratorConfig
///

#[derive(Clone, Copy, Debug)]
pub struct GeneratorConfig {
    /// Recursion budget for graph walks. Exhaustion surfaces as
    /// `GenError::stack_exhausted`, which callers may degrade to a full scan.
    pub max_depth: usize,
    pub null_order: NullOrder,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_depth: 512,
            null_order: NullOrder::default(),
        }
    }
}

///
/// NotInParam
///
/// Resolved, sorted and deduplicated element set of one NOT-IN node.
/// `always_false` records a NULL element, which empties the whole predicate.
///

#[derive(Clone, Debug)]
pub(crate) struct NotInParam {
    pub(crate) values: Vec<ScalarValue>,
    pub(crate) always_false: bool,
}

///
/// RangeGenerator
///
/// Single-use walker over one graph. `generate_ranges` consumes the
/// generator; scratch allocations stay in the arena so a caller can reset
/// and reuse it across executions.
///

pub struct RangeGenerator<'a> {
    graph: &'a RangeGraph,
    ctx: &'a ExecContext<'a>,
    config: GeneratorConfig,
    arena: &'a mut GenArena,
    ranges: Vec<ScanRange>,
    always_true_range: Option<ScanRange>,
    always_false_range: Option<ScanRange>,
    all_single_values: bool,
    node_ranges: Vec<Option<TmpRangeId>>,
    node_not_in: Vec<Option<NotInParamId>>,
    pending: Vec<Vec<TmpRangeId>>,
    always_false_tmp: Option<TmpRangeId>,
    skip_scan_mode: bool,
    depth: usize,
}

impl<'a> RangeGenerator<'a> {
    #[must_use]
    pub fn new(
        graph: &'a RangeGraph,
        ctx: &'a ExecContext<'a>,
        arena: &'a mut GenArena,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            graph,
            ctx,
            config,
            arena,
            ranges: Vec::new(),
            always_true_range: None,
            always_false_range: None,
            all_single_values: true,
            node_ranges: Vec::new(),
            node_not_in: Vec::new(),
            pending: Vec::new(),
            always_false_tmp: None,
            skip_scan_mode: false,
            depth: 0,
        }
    }

    /// Generate the final sorted range set for the graph's key columns.
    pub fn generate_ranges(mut self) -> Result<GeneratedRanges, GenError> {
        let graph = self.graph;
        if graph.column_cnt() == 0 {
            return Err(GenError::contract("range graph has no key columns"));
        }
        let head = graph.node(graph.range_head)?;
        log::debug!(
            "generating ranges: table={} nodes={} precise_get={} standard={}",
            graph.table_id,
            graph.node_count(),
            graph.is_precise_get,
            graph.is_standard_range
        );

        if graph.has_exec_param && !self.ctx.exec_param_readable {
            // parameters are not bound yet, nothing can be constrained
            self.push_universal_range(graph.column_cnt());
        } else if graph.is_precise_get {
            self.generate_precise_get(head)?;
        } else if graph.is_standard_range {
            self.generate_standard_ranges(graph.range_head)?;
        } else {
            self.generate_complex_ranges(graph.range_head)?;
        }

        Ok(self.finish())
    }

    /// Generate the postfix range set for a skip scan, spanning the columns
    /// from `skip_scan_offset` onward. An empty result means no node
    /// constrains the postfix span and skip scan cannot help.
    pub fn generate_skip_scan_ranges(mut self) -> Result<GeneratedRanges, GenError> {
        let graph = self.graph;
        let offset = graph
            .skip_scan_offset
            .ok_or_else(|| GenError::contract("graph carries no skip scan offset"))?;
        if offset >= graph.column_cnt() {
            return Err(GenError::contract(format!(
                "skip scan offset {offset} out of bounds for {} columns",
                graph.column_cnt()
            )));
        }

        let mut ss_head = None;
        let mut cur = Some(graph.range_head);
        while let Some(id) = cur {
            let node = graph.node(id)?;
            if node.min_offset.is_none_or(|m| m < offset) {
                cur = node.and_next;
            } else {
                if node.min_offset == Some(offset) {
                    ss_head = Some(id);
                }
                break;
            }
        }

        if let Some(head) = ss_head {
            if graph.has_exec_param && !self.ctx.exec_param_readable {
                self.push_universal_range(graph.column_cnt() - offset);
            } else {
                self.skip_scan_mode = true;
                self.generate_standard_ranges(head)?;
            }
        }

        Ok(self.finish())
    }

    fn finish(self) -> GeneratedRanges {
        GeneratedRanges {
            ranges: self.ranges,
            all_single_values: self.all_single_values,
        }
    }

    fn push_universal_range(&mut self, column_cnt: usize) {
        self.ranges
            .push(ScanRange::universal(self.graph.table_id, column_cnt));
        self.all_single_values = false;
    }

    // ------------------------------------------------------------------
    // precise get
    // ------------------------------------------------------------------

    /// Single-node equality over every key column: build the point range
    /// directly, bypassing the working-range machinery.
    fn generate_precise_get(&mut self, node: &RangeNode) -> Result<(), GenError> {
        let graph = self.graph;
        if node.and_next.is_some() || node.or_next.is_some() {
            return Err(GenError::contract("precise get node has continuations"));
        }
        self.check_node_width(node)?;

        let cc = graph.column_cnt();
        let mut key = Vec::with_capacity(cc);
        let mut always_false = false;
        for i in 0..cc {
            let sref = node.start_keys[i];
            let eref = node.end_keys[i];
            if sref != eref {
                return Err(GenError::contract("precise get bounds differ"));
            }
            match sref {
                KeyRef::Null => key.push(KeyValue::Null),
                KeyRef::Value(idx) => match resolve_value(graph, self.ctx, idx)? {
                    ResolvedValue::Invalid => {
                        always_false = true;
                        break;
                    }
                    ResolvedValue::Null => key.push(KeyValue::Null),
                    ResolvedValue::Value(value) => {
                        if node.is_phy_rowid {
                            key.push(KeyValue::Val(value));
                        } else {
                            let meta = graph.column_meta(i)?;
                            let (cast_value, delta) = try_cast(meta, value)?;
                            if delta != Ordering::Equal {
                                // equality against a value the column cannot hold
                                always_false = true;
                                break;
                            }
                            key.push(KeyValue::Val(cast_value));
                        }
                    }
                },
                _ => {
                    return Err(GenError::contract("precise get bound is not a point value"));
                }
            }
        }

        let range = if always_false {
            self.all_single_values = false;
            ScanRange {
                table_id: graph.table_id,
                start_key: vec![KeyValue::Max; cc],
                end_key: vec![KeyValue::Min; cc],
                include_start: false,
                include_end: false,
                is_phy_rowid: node.is_phy_rowid,
            }
        } else {
            ScanRange {
                table_id: graph.table_id,
                start_key: key.clone(),
                end_key: key,
                include_start: true,
                include_end: true,
                is_phy_rowid: node.is_phy_rowid,
            }
        };
        log::trace!("precise get range: {range:?}");
        self.ranges.push(range);

        Ok(())
    }

    // ------------------------------------------------------------------
    // standard walk
    // ------------------------------------------------------------------

    /// Pure AND chain: fold every node into one accumulated range.
    fn generate_standard_ranges(&mut self, head: NodeId) -> Result<(), GenError> {
        let column_cnt = self.graph.column_cnt();
        let acc = self.arena.alloc_range(column_cnt, self.config.null_order)?;
        self.arena.range_mut(acc).set_always_true();
        self.formalize_standard_range(head, acc)?;
        self.merge_and_remove()
    }

    fn formalize_standard_range(&mut self, node_id: NodeId, acc: TmpRangeId) -> Result<(), GenError> {
        self.enter_recursion()?;
        let graph = self.graph;
        let node = graph.node(node_id)?;
        if node.contain_in || node.is_not_in || node.or_next.is_some() {
            return Err(GenError::contract("in/or node inside a standard range"));
        }

        let rid = self.final_range_node(node, false)?;
        let (dst, src) = self.arena.range_pair_mut(acc, rid)?;
        let not_consistent = dst.intersect(src)?;
        if !not_consistent && node.and_next.is_some() {
            if let Some(next) = node.and_next {
                self.formalize_standard_range(next, acc)?;
            }
        } else {
            self.emit_range(acc)?;
        }
        self.leave_recursion();

        Ok(())
    }

    // ------------------------------------------------------------------
    // complex walk
    // ------------------------------------------------------------------

    /// General AND/OR walk with backtracking. Node offsets are not
    /// consistent along `and_next` here, so finalized per-node ranges are
    /// collected per column and intersected at each leaf.
    fn generate_complex_ranges(&mut self, head: NodeId) -> Result<(), GenError> {
        let graph = self.graph;
        self.pending = vec![Vec::new(); graph.column_cnt()];
        self.node_ranges = vec![None; graph.node_count()];
        self.node_not_in = vec![None; graph.node_count()];
        let af = self
            .arena
            .alloc_range(graph.column_cnt(), self.config.null_order)?;
        self.arena.range_mut(af).set_always_false();
        self.always_false_tmp = Some(af);

        self.formalize_complex_range(head)?;
        self.merge_and_remove()
    }

    fn formalize_complex_range(&mut self, head: NodeId) -> Result<(), GenError> {
        self.enter_recursion()?;
        let graph = self.graph;
        let mut pre_offset = None;
        let mut add_last = false;
        let mut cur = Some(head);
        while let Some(id) = cur {
            let node = graph.node(id)?;
            self.check_node_width(node)?;
            self.pop_pending(pre_offset, &mut add_last);
            let offset = node.effective_min_offset();
            if offset >= graph.column_cnt() {
                return Err(GenError::contract("node offset beyond the key width"));
            }
            pre_offset = Some(offset);

            if !node.contain_in && !node.is_not_in {
                let rid = self.final_range_node(node, true)?;
                if self.arena.range(rid).always_false {
                    self.emit_range(rid)?;
                } else {
                    if !self.arena.range(rid).always_true {
                        self.pending[offset].push(rid);
                        add_last = true;
                    }
                    self.descend(node.and_next)?;
                }
            } else if node.contain_in {
                for elem in 0..node.in_param_count {
                    self.pop_pending(pre_offset, &mut add_last);
                    let rid = self.final_in_range_node(node, elem)?;
                    if self.arena.range(rid).always_false {
                        self.emit_range(rid)?;
                    } else {
                        if !self.arena.range(rid).always_true {
                            self.pending[offset].push(rid);
                            add_last = true;
                        }
                        self.descend(node.and_next)?;
                    }
                }
            } else {
                let pid = self.generate_tmp_not_in_param(node)?;
                let param = self.arena.not_in_param(pid);
                if param.always_false {
                    let af = self.always_false_tmp.ok_or_else(|| {
                        GenError::contract("complex walk missing its empty-range slot")
                    })?;
                    self.emit_range(af)?;
                } else if param.values.is_empty() {
                    // every element was uncastable, nothing is excluded
                    self.descend(node.and_next)?;
                } else {
                    let gaps = param.values.len() + 1;
                    for gap in 0..gaps {
                        self.pop_pending(pre_offset, &mut add_last);
                        let rid = self.final_not_in_range_node(node, gap, pid)?;
                        self.pending[offset].push(rid);
                        add_last = true;
                        self.descend(node.and_next)?;
                    }
                }
            }

            cur = node.or_next;
        }
        self.pop_pending(pre_offset, &mut add_last);
        self.leave_recursion();

        Ok(())
    }

    fn descend(&mut self, and_next: Option<NodeId>) -> Result<(), GenError> {
        match and_next {
            Some(next) => self.formalize_complex_range(next),
            None => self.emit_complex_leaf(),
        }
    }

    fn pop_pending(&mut self, pre_offset: Option<usize>, add_last: &mut bool) {
        if *add_last {
            if let Some(offset) = pre_offset {
                self.pending[offset].pop();
            }
            *add_last = false;
        }
    }

    /// One full AND path has been collected: intersect everything pending,
    /// shallow columns first, and emit the result.
    fn emit_complex_leaf(&mut self) -> Result<(), GenError> {
        let graph = self.graph;
        let acc = self
            .arena
            .alloc_range(graph.column_cnt(), self.config.null_order)?;
        self.arena.range_mut(acc).set_always_true();

        'outer: for col in 0..graph.column_cnt() {
            for idx in 0..self.pending[col].len() {
                let src = self.pending[col][idx];
                let (dst, other) = self.arena.range_pair_mut(acc, src)?;
                if dst.intersect(other)? {
                    break 'outer;
                }
            }
        }

        self.emit_range(acc)
    }

    // ------------------------------------------------------------------
    // node finalization
    // ------------------------------------------------------------------

    fn check_node_width(&self, node: &RangeNode) -> Result<(), GenError> {
        let cc = self.graph.column_cnt();
        if node.start_keys.len() != cc || node.end_keys.len() != cc {
            return Err(GenError::contract("node key width differs from index width"));
        }

        Ok(())
    }

    /// Resolve one symbolic bound. `Ok(None)` marks an unmatchable bound
    /// (non-null-safe NULL), which empties the node's range.
    fn bound_from_key_ref(
        &self,
        kref: KeyRef,
        in_elem: Option<usize>,
    ) -> Result<Option<KeyValue>, GenError> {
        let resolved_ref = match kref {
            KeyRef::Min => return Ok(Some(KeyValue::Min)),
            KeyRef::Max => return Ok(Some(KeyValue::Max)),
            KeyRef::Null => return Ok(Some(KeyValue::Null)),
            KeyRef::Empty => {
                return Err(GenError::contract("empty bound where a value is required"));
            }
            KeyRef::Value(idx) => idx,
            KeyRef::InList(param) => {
                let elem = in_elem
                    .ok_or_else(|| GenError::contract("in-list bound outside an in node"))?;
                *self
                    .graph
                    .in_param(param)?
                    .get(elem)
                    .ok_or_else(|| GenError::contract("in-list element out of bounds"))?
            }
        };

        let bound = match resolve_value(self.graph, self.ctx, resolved_ref)? {
            ResolvedValue::Value(value) => Some(KeyValue::Val(value)),
            ResolvedValue::Null => Some(KeyValue::Null),
            ResolvedValue::Invalid => None,
        };

        Ok(bound)
    }

    fn fill_node_range(
        &mut self,
        rid: TmpRangeId,
        node: &RangeNode,
        in_elem: Option<usize>,
    ) -> Result<(), GenError> {
        self.check_node_width(node)?;
        let graph = self.graph;
        let cc = graph.column_cnt();

        let mut start = Vec::with_capacity(cc);
        let mut end = Vec::with_capacity(cc);
        let mut always_false = false;
        for i in 0..cc {
            let sref = node.start_keys[i];
            let eref = node.end_keys[i];
            match (sref, eref) {
                (KeyRef::Empty, KeyRef::Empty) => {
                    start.push(KeyValue::Nop);
                    end.push(KeyValue::Nop);
                }
                (KeyRef::Empty, _) | (_, KeyRef::Empty) => {
                    return Err(GenError::contract("one-sided empty bound in range node"));
                }
                _ => {
                    match self.bound_from_key_ref(sref, in_elem)? {
                        Some(value) => start.push(value),
                        None => {
                            always_false = true;
                            break;
                        }
                    }
                    match self.bound_from_key_ref(eref, in_elem)? {
                        Some(value) => end.push(value),
                        None => {
                            always_false = true;
                            break;
                        }
                    }
                }
            }
        }

        let range = self.arena.range_mut(rid);
        if always_false {
            range.set_always_false();
            return Ok(());
        }

        range.always_true = false;
        range.always_false = false;
        for (i, value) in start.into_iter().enumerate() {
            range.start[i] = value;
        }
        for (i, value) in end.into_iter().enumerate() {
            range.end[i] = value;
        }
        range.include_start = node.include_start;
        range.include_end = node.include_end;
        range.is_phy_rowid = node.is_phy_rowid;
        range.min_offset = node.effective_min_offset();
        range.max_offset = node.max_offset;

        if !node.is_phy_rowid {
            crate::value::cast_bounds(self.arena.range_mut(rid), &graph.column_metas)?;
        }

        Ok(())
    }

    fn final_range_node(
        &mut self,
        node: &RangeNode,
        need_cache: bool,
    ) -> Result<TmpRangeId, GenError> {
        if need_cache {
            if let Some(Some(rid)) = self.node_ranges.get(node.node_id).copied() {
                return Ok(rid);
            }
        }

        let rid = self
            .arena
            .alloc_range(self.graph.column_cnt(), self.config.null_order)?;
        self.fill_node_range(rid, node, None)?;
        // empty ranges are never cached: a later element may resolve
        if need_cache && !self.arena.range(rid).always_false {
            self.node_ranges[node.node_id] = Some(rid);
        }

        Ok(rid)
    }

    /// Equality range for one element of an IN node. The cached slot is
    /// reused across elements, refilled each time.
    fn final_in_range_node(
        &mut self,
        node: &RangeNode,
        in_elem: usize,
    ) -> Result<TmpRangeId, GenError> {
        let rid = match self.node_ranges.get(node.node_id).copied().flatten() {
            Some(rid) => rid,
            None => self
                .arena
                .alloc_range(self.graph.column_cnt(), self.config.null_order)?,
        };

        self.fill_node_range(rid, node, Some(in_elem))?;
        if !self.arena.range(rid).always_false {
            self.node_ranges[node.node_id] = Some(rid);
        }

        Ok(rid)
    }

    /// Resolve, cast, sort and dedup the element set of a NOT-IN node.
    fn generate_tmp_not_in_param(&mut self, node: &RangeNode) -> Result<NotInParamId, GenError> {
        if let Some(Some(pid)) = self.node_not_in.get(node.node_id).copied() {
            return Ok(pid);
        }

        let graph = self.graph;
        let offset = node
            .min_offset
            .ok_or_else(|| GenError::contract("not-in node without a column offset"))?;
        let KeyRef::InList(param) = *node
            .start_keys
            .get(offset)
            .ok_or_else(|| GenError::contract("not-in offset out of bounds"))?
        else {
            return Err(GenError::contract("not-in node without an in-list bound"));
        };
        let meta = *graph.column_meta(offset)?;

        let mut values = Vec::with_capacity(graph.in_param(param)?.len());
        let mut always_false = false;
        for elem in 0..graph.in_param(param)?.len() {
            let ref_idx = graph.in_param(param)?[elem];
            match resolve_value(graph, self.ctx, ref_idx)? {
                // NULL inside NOT IN filters out every row
                ResolvedValue::Invalid | ResolvedValue::Null => {
                    always_false = true;
                    break;
                }
                ResolvedValue::Value(value) => {
                    if node.is_phy_rowid {
                        values.push(value);
                    } else {
                        let (cast_value, delta) = try_cast(&meta, value)?;
                        if delta == Ordering::Equal {
                            values.push(cast_value);
                        }
                        // an element the column cannot hold excludes nothing
                    }
                }
            }
        }

        if always_false {
            values.clear();
        } else {
            values.sort_by(|a, b| semantic_cmp(a, b).unwrap_or(Ordering::Equal));
            values.dedup();
        }

        let pid = self.arena.alloc_not_in_param(NotInParam {
            values,
            always_false,
        })?;
        self.node_not_in[node.node_id] = Some(pid);

        Ok(pid)
    }

    /// Build gap `gap_idx` of a NOT-IN expansion: `n` sorted elements leave
    /// `n + 1` open intervals between them, with the outermost boundaries
    /// set by the NULL-ordering convention.
    fn final_not_in_range_node(
        &mut self,
        node: &RangeNode,
        gap_idx: usize,
        pid: NotInParamId,
    ) -> Result<TmpRangeId, GenError> {
        let graph = self.graph;
        let null_order = self.config.null_order;
        let offset = node
            .min_offset
            .ok_or_else(|| GenError::contract("not-in node without a column offset"))?;

        let param = self.arena.not_in_param(pid);
        let count = param.values.len();
        if gap_idx > count {
            return Err(GenError::contract("not-in gap index out of bounds"));
        }
        let lower = (gap_idx > 0).then(|| param.values[gap_idx - 1].clone());
        let upper = (gap_idx < count).then(|| param.values[gap_idx].clone());

        let rid = match self.node_ranges.get(node.node_id).copied().flatten() {
            Some(rid) => rid,
            None => self
                .arena
                .alloc_range(graph.column_cnt(), self.config.null_order)?,
        };

        let (start_bound, start_padding) = match lower {
            Some(value) => (KeyValue::Val(value), KeyValue::Max),
            None => match null_order {
                // below the first element, but above the null region
                NullOrder::NullsFirst => (KeyValue::Null, KeyValue::Max),
                NullOrder::NullsLast => (KeyValue::Min, KeyValue::Min),
            },
        };
        let (end_bound, end_padding) = match upper {
            Some(value) => (KeyValue::Val(value), KeyValue::Min),
            None => match null_order {
                NullOrder::NullsFirst => (KeyValue::Max, KeyValue::Max),
                // above the last element, but below the null region
                NullOrder::NullsLast => (KeyValue::Null, KeyValue::Min),
            },
        };

        let cc = graph.column_cnt();
        let range = self.arena.range_mut(rid);
        range.always_true = false;
        range.always_false = false;
        for i in 0..offset {
            range.start[i] = KeyValue::Nop;
            range.end[i] = KeyValue::Nop;
        }
        range.start[offset] = start_bound;
        range.end[offset] = end_bound;
        for i in (offset + 1)..cc {
            range.start[i] = start_padding.clone();
            range.end[i] = end_padding.clone();
        }
        range.include_start = false;
        range.include_end = false;
        range.is_phy_rowid = node.is_phy_rowid;
        range.min_offset = offset;
        range.max_offset = node.max_offset;

        if !node.is_phy_rowid {
            crate::value::cast_bounds(self.arena.range_mut(rid), &graph.column_metas)?;
        }
        self.node_ranges[node.node_id] = Some(rid);

        Ok(rid)
    }

    // ------------------------------------------------------------------
    // emission
    // ------------------------------------------------------------------

    fn emit_range(&mut self, rid: TmpRangeId) -> Result<(), GenError> {
        let graph = self.graph;
        if self.skip_scan_mode {
            if let Some(offset) = graph.skip_scan_offset {
                self.arena.range_mut(rid).shift_for_skip_scan(offset);
            }
        }
        self.arena.range_mut(rid).refine_final_range()?;

        let range = self.arena.range(rid);
        let mut scan = ScanRange {
            table_id: graph.table_id,
            start_key: range.start.to_vec(),
            end_key: range.end.to_vec(),
            include_start: range.include_start,
            include_end: range.include_end,
            is_phy_rowid: range.is_phy_rowid,
        };
        if range.is_phy_rowid && range.column_cnt > 1 {
            // physical locator ranges address a single column; the rest of
            // the key only encodes the border
            scan.include_start = scan.start_key[1].is_min();
            scan.include_end = scan.end_key[1].is_max();
            scan.start_key.truncate(1);
            scan.end_key.truncate(1);
        }
        log::trace!("emit range: {scan:?}");

        if range.always_false {
            self.always_false_range = Some(scan);
        } else if range.always_true {
            self.always_true_range = Some(scan);
            self.all_single_values = false;
        } else {
            if !scan.is_single_point() {
                self.all_single_values = false;
            }
            self.ranges.push(scan);
        }

        Ok(())
    }

    fn merge_and_remove(&mut self) -> Result<(), GenError> {
        let graph = self.graph;
        let taken = std::mem::take(&mut self.ranges);
        let (merged, cleared) = merge::merge_and_remove(
            taken,
            self.always_true_range.take(),
            self.always_false_range.take(),
            graph.is_equal_range,
            graph.range_size,
            self.config.null_order,
        )?;
        self.ranges = merged;
        if cleared {
            self.all_single_values = false;
        }

        Ok(())
    }

    fn enter_recursion(&mut self) -> Result<(), GenError> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(GenError::stack_exhausted(format!(
                "graph walk exceeded {} levels",
                self.config.max_depth
            )));
        }

        Ok(())
    }

    fn leave_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
