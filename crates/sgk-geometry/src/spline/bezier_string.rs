//! Bezier string: a chain of cubic segments with per-node handles and
//! continuity tags.

use std::collections::{HashSet, VecDeque};

use log::debug;
use serde::{Deserialize, Serialize};
use sgk_core::{is_nearly_zero, BoundingBox, Result, SgkError, Tolerance, Validate};
use sgk_math::{Bounds, Point};

use super::list::{NodeId, NodeList};
use super::{ControlHandle, SplineEnd};
use crate::curve::{CubicBezier, ParamCurve};

/// Smoothness enforced at a node when one of its handles moves.
///
/// Ordered from weakest to strongest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Continuity {
    /// Handles move independently.
    C0,
    /// Handles stay collinear; a moved handle is mirrored through the position.
    G1,
    /// Handles mirror each other through the position.
    C1,
    /// Equal first and second derivative on both sides. Handles are solved
    /// from the positions whenever the node set changes.
    #[default]
    C2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierStringPoint<P> {
    pub pos: P,
    pub prev: P,
    pub next: P,
    pub param: f64,
    pub continuity: Continuity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Prev,
    Next,
}

impl Side {
    fn opposite(self) -> Self {
        match self {
            Side::Prev => Side::Next,
            Side::Next => Side::Prev,
        }
    }
}

impl<P: Point> BezierStringPoint<P> {
    /// A node whose handles sit on the position.
    pub fn new(pos: P, param: f64, continuity: Continuity) -> Self {
        Self {
            pos,
            prev: pos,
            next: pos,
            param,
            continuity,
        }
    }

    pub fn handle(&self, handle: ControlHandle) -> P {
        match handle {
            ControlHandle::Position => self.pos,
            ControlHandle::Prev => self.prev,
            ControlHandle::Next => self.next,
        }
    }

    fn side(&self, side: Side) -> P {
        match side {
            Side::Prev => self.prev,
            Side::Next => self.next,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut P {
        match side {
            Side::Prev => &mut self.prev,
            Side::Next => &mut self.next,
        }
    }

    fn has_degenerate_handles(&self) -> bool {
        self.prev.distance_squared(self.pos) <= Tolerance::SMALL_NUMBER
            && self.next.distance_squared(self.pos) <= Tolerance::SMALL_NUMBER
    }
}

fn mirror<P: Point>(pos: P, handle: P) -> P {
    pos * 2.0 - handle
}

fn handle_changed<P: Point>(a: P, b: P) -> bool {
    a.distance_squared(b) > Tolerance::SMALL_NUMBER * Tolerance::SMALL_NUMBER
}

/// Thomas algorithm for `lower[i] x[i-1] + diag[i] x[i] + upper[i] x[i+1] = rhs[i]`.
///
/// The system must be diagonally dominant; no pivoting is done.
fn solve_tridiagonal<P: Point>(
    lower: &[f64],
    diag: &[f64],
    upper: &[f64],
    mut rhs: Vec<P>,
) -> Vec<P> {
    let n = rhs.len();
    let mut c = vec![0.0; n];
    for i in 0..n {
        let (a, prev_c, prev_d) = match i {
            0 => (0.0, 0.0, P::ZERO),
            _ => (lower[i], c[i - 1], rhs[i - 1]),
        };
        let denom = diag[i] - a * prev_c;
        c[i] = upper[i] / denom;
        rhs[i] = (rhs[i] - prev_d * a) / denom;
    }
    for i in (0..n.saturating_sub(1)).rev() {
        let next = rhs[i + 1];
        rhs[i] -= next * c[i];
    }
    rhs
}

/// A piecewise cubic curve defined by nodes with explicit handles.
///
/// Segment `i` runs over `[param_i, param_{i+1}]` with control points
/// `(pos_i, next_i, prev_{i+1}, pos_{i+1})`. The handles of the first and last
/// node that point away from the curve do not shape it; they mirror the inner
/// handle so the end can be continued smoothly.
#[derive(Debug, Clone, Default)]
pub struct BezierString<P: Point> {
    points: NodeList<BezierStringPoint<P>>,
}

impl<P: Point> BezierString<P> {
    pub fn new() -> Self {
        Self {
            points: NodeList::new(),
        }
    }

    /// Interpolate `points` with unit parameter steps and the default continuity.
    pub fn from_points(points: &[P]) -> Self {
        let mut string = Self::new();
        for &p in points {
            string.add_point_at_last(p);
        }
        string
    }

    /// Build from per-node arrays. Parameters must be strictly increasing.
    pub fn from_parts(
        positions: &[P],
        prev_handles: &[P],
        next_handles: &[P],
        params: &[f64],
        continuity: &[Continuity],
    ) -> Result<Self> {
        let n = positions.len();
        if [prev_handles.len(), next_handles.len(), params.len(), continuity.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err(SgkError::InvalidOperation(
                "Bezier string arrays differ in length".into(),
            ));
        }
        let points = (0..n)
            .map(|i| BezierStringPoint {
                pos: positions[i],
                prev: prev_handles[i],
                next: next_handles[i],
                param: params[i],
                continuity: continuity[i],
            })
            .collect();
        let string = Self { points };
        string.validate()?;
        Ok(string)
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.points.ids().collect()
    }

    pub fn point(&self, index: usize) -> Option<&BezierStringPoint<P>> {
        self.points.get(self.points.nth_id(index)?)
    }

    pub fn point_by_id(&self, id: NodeId) -> Option<&BezierStringPoint<P>> {
        self.points.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &BezierStringPoint<P>> + '_ {
        self.points.values()
    }

    pub fn ctrl_points(&self) -> Vec<P> {
        self.nodes().map(|n| n.pos).collect()
    }

    pub fn ctrl_points_prev(&self) -> Vec<P> {
        self.nodes().map(|n| n.prev).collect()
    }

    pub fn ctrl_points_next(&self) -> Vec<P> {
        self.nodes().map(|n| n.next).collect()
    }

    pub fn params(&self) -> Vec<f64> {
        self.nodes().map(|n| n.param).collect()
    }

    pub fn continuities(&self) -> Vec<Continuity> {
        self.nodes().map(|n| n.continuity).collect()
    }

    /// Handle pointing away from the curve at `end`, and the one pointing into it.
    pub fn end_handles(&self, end: SplineEnd) -> Option<(P, P)> {
        match end {
            SplineEnd::Start => {
                let head = self.points.get(self.points.head()?)?;
                Some((head.prev, head.next))
            }
            SplineEnd::End => {
                let tail = self.points.get(self.points.tail()?)?;
                Some((tail.next, tail.prev))
            }
        }
    }

    fn node_id(&self, index: usize) -> Result<NodeId> {
        self.points.nth_id(index).ok_or_else(|| {
            SgkError::NotFound(format!("node {} of {}", index, self.points.len()))
        })
    }

    fn param_of(&self, id: Option<NodeId>) -> Option<f64> {
        Some(self.points.get(id?)?.param)
    }

    /// Recompute the handles that depend on the `fixed` handle of `id`.
    ///
    /// G1 and C1 mirror the moved handle through the position. C2 mirrors it
    /// scaled by the ratio of the neighbouring intervals and, when `spread` is
    /// set, rewrites the far handle of one neighbouring segment so the second
    /// derivative matches too. Returns the handles that actually moved.
    fn enforce(&mut self, id: NodeId, fixed: Side, spread: bool) -> Vec<(NodeId, Side)> {
        let mut changed = Vec::new();
        let Some(&node) = self.points.get(id) else {
            return changed;
        };
        if node.continuity == Continuity::C0 {
            return changed;
        }

        let prev_id = self.points.prev(id);
        let next_id = self.points.next(id);
        let h_prev = self.param_of(prev_id).map(|p| node.param - p);
        let h_next = self.param_of(next_id).map(|p| p - node.param);
        let (h_fixed, h_other) = match fixed {
            Side::Next => (h_next, h_prev),
            Side::Prev => (h_prev, h_next),
        };
        let ratio = match (h_fixed, h_other) {
            (Some(a), Some(b)) if !is_nearly_zero(a) => b / a,
            _ => 1.0,
        };

        let other = fixed.opposite();
        let moved = node.side(fixed);
        let old = node.side(other);
        let new_other = match node.continuity {
            Continuity::C0 => old,
            Continuity::G1 | Continuity::C1 => mirror(node.pos, moved),
            Continuity::C2 => node.pos + (node.pos - moved) * ratio,
        };
        if handle_changed(old, new_other) {
            if let Some(n) = self.points.get_mut(id) {
                *n.side_mut(other) = new_other;
            }
            changed.push((id, other));
        }

        if !spread || node.continuity != Continuity::C2 {
            return changed;
        }
        let (Some(pid), Some(nid), Some(hp), Some(hn)) = (prev_id, next_id, h_prev, h_next) else {
            return changed;
        };
        if is_nearly_zero(hp) || is_nearly_zero(hn) {
            return changed;
        }
        let Some(&node) = self.points.get(id) else {
            return changed;
        };
        // Match second derivatives: (a1 - 2 a2 + a3) / hp^2 == (b0 - 2 b1 + b2) / hn^2
        let (far_id, far_side, far) = match fixed {
            Side::Next => {
                let Some(b2) = self.points.get(nid).map(|n| n.prev) else {
                    return changed;
                };
                let s = (hp / hn) * (hp / hn);
                let a1 = node.prev * 2.0 - node.pos + (node.pos - node.next * 2.0 + b2) * s;
                (pid, Side::Next, a1)
            }
            Side::Prev => {
                let Some(a1) = self.points.get(pid).map(|n| n.next) else {
                    return changed;
                };
                let s = (hn / hp) * (hn / hp);
                let b2 = node.next * 2.0 - node.pos + (a1 - node.prev * 2.0 + node.pos) * s;
                (nid, Side::Prev, b2)
            }
        };
        if let Some(n) = self.points.get_mut(far_id) {
            let slot = n.side_mut(far_side);
            if handle_changed(*slot, far) {
                *slot = far;
                changed.push((far_id, far_side));
            }
        }
        changed
    }

    /// Breadth-first continuity propagation after a handle edit.
    ///
    /// Seeds may spread to a neighbour by rewriting one of its handles; that
    /// neighbour only restores its own constraint. The walk stops at nodes
    /// whose handles did not move, so it never reaches past the nodes
    /// adjacent to a seed.
    fn propagate(&mut self, seeds: impl IntoIterator<Item = (Option<NodeId>, Side)>) {
        let mut queue: VecDeque<(NodeId, Side, bool)> = seeds
            .into_iter()
            .filter_map(|(id, side)| Some((id?, side, true)))
            .collect();
        let mut visited = HashSet::new();
        while let Some((id, fixed, spread)) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            for (moved, side) in self.enforce(id, fixed, spread) {
                if moved != id && !visited.contains(&moved) {
                    queue.push_back((moved, side, false));
                }
            }
        }
    }

    /// Restore continuity after positions or the node set changed. Nodes
    /// other than C2 mirror locally from the seed side; C2 runs are refitted.
    fn restore(&mut self, seeds: impl IntoIterator<Item = (Option<NodeId>, Side)>) {
        for (id, side) in seeds.into_iter().filter_map(|(id, side)| Some((id?, side))) {
            if self
                .points
                .get(id)
                .is_some_and(|n| n.continuity != Continuity::C2)
            {
                self.enforce(id, side, false);
            }
        }
        self.fit_c2_handles();
    }

    /// Solve the handles of every run of consecutive C2 nodes so the string is
    /// twice differentiable across the run, keeping positions and parameters.
    ///
    /// Handles of the nodes bounding a run stay fixed; a run reaching an end
    /// of the string gets a zero second derivative there. The unknowns are
    /// the node velocities, which form a diagonally dominant tridiagonal
    /// system per run.
    fn fit_c2_handles(&mut self) {
        let ids = self.node_ids();
        let nodes: Vec<BezierStringPoint<P>> = ids.iter().map(|&id| self.points[id]).collect();
        let n = nodes.len();
        if n < 2 {
            return;
        }
        let interval = |i: usize| {
            let h = nodes[i + 1].param - nodes[i].param;
            (!is_nearly_zero(h)).then_some(h)
        };

        let mut start = 0;
        while start < n {
            if nodes[start].continuity != Continuity::C2 {
                start += 1;
                continue;
            }
            let mut end = start;
            while end + 1 < n && nodes[end + 1].continuity == Continuity::C2 {
                end += 1;
            }

            let mut lower = Vec::with_capacity(end - start + 1);
            let mut diag = Vec::with_capacity(end - start + 1);
            let mut upper = Vec::with_capacity(end - start + 1);
            let mut rhs = Vec::with_capacity(end - start + 1);
            for j in start..=end {
                let pos = nodes[j].pos;
                let (mut a, mut b, mut c, mut d) = (0.0, 0.0, 0.0, P::ZERO);
                if let Some(h) = (j > 0).then(|| interval(j - 1)).flatten() {
                    b += 2.0 / (3.0 * h);
                    if j > start {
                        a = 1.0 / (3.0 * h);
                        d += (pos - nodes[j - 1].pos) / (h * h);
                    } else {
                        d -= (nodes[j - 1].next - pos) / (h * h);
                    }
                }
                if let Some(h) = (j + 1 < n).then(|| interval(j)).flatten() {
                    b += 2.0 / (3.0 * h);
                    if j < end {
                        c = 1.0 / (3.0 * h);
                        d += (nodes[j + 1].pos - pos) / (h * h);
                    } else {
                        d += (nodes[j + 1].prev - pos) / (h * h);
                    }
                }
                if is_nearly_zero(b) {
                    (a, b, c, d) = (0.0, 1.0, 0.0, P::ZERO);
                }
                lower.push(a);
                diag.push(b);
                upper.push(c);
                rhs.push(d);
            }

            let velocities = solve_tridiagonal(&lower, &diag, &upper, rhs);
            for (j, v) in (start..=end).zip(velocities) {
                let hp = (j > 0).then(|| interval(j - 1)).flatten();
                let hn = (j + 1 < n).then(|| interval(j)).flatten();
                let (hp, hn) = match (hp, hn) {
                    (Some(p), Some(q)) => (p, q),
                    (Some(p), None) => (p, p),
                    (None, Some(q)) => (q, q),
                    (None, None) => continue,
                };
                if let Some(node) = self.points.get_mut(ids[j]) {
                    node.prev = node.pos - v * (hp / 3.0);
                    node.next = node.pos + v * (hn / 3.0);
                }
            }
            start = end + 1;
        }
    }

    pub fn add_point_at_last(&mut self, p: P) -> NodeId {
        let Some(tail_id) = self.points.tail() else {
            return self
                .points
                .push_back(BezierStringPoint::new(p, 0.0, Continuity::default()));
        };
        let tail = self.points[tail_id];
        if tail.has_degenerate_handles() {
            let next = tail.pos.lerp(p, 1.0 / 3.0);
            if let Some(t) = self.points.get_mut(tail_id) {
                t.next = next;
                t.prev = mirror(t.pos, next);
            }
        }
        let prev = p.lerp(tail.pos, 1.0 / 3.0);
        let id = self.points.push_back(BezierStringPoint {
            pos: p,
            prev,
            next: mirror(p, prev),
            param: tail.param + 1.0,
            continuity: Continuity::default(),
        });
        self.restore([(Some(tail_id), Side::Prev)]);
        id
    }

    pub fn add_point_at_first(&mut self, p: P) -> NodeId {
        let Some(head_id) = self.points.head() else {
            return self
                .points
                .push_front(BezierStringPoint::new(p, 0.0, Continuity::default()));
        };
        let head = self.points[head_id];
        if head.has_degenerate_handles() {
            let prev = head.pos.lerp(p, 1.0 / 3.0);
            if let Some(h) = self.points.get_mut(head_id) {
                h.prev = prev;
                h.next = mirror(h.pos, prev);
            }
        }
        let next = p.lerp(head.pos, 1.0 / 3.0);
        let id = self.points.push_front(BezierStringPoint {
            pos: p,
            prev: mirror(p, next),
            next,
            param: head.param - 1.0,
            continuity: Continuity::default(),
        });
        self.restore([(Some(head_id), Side::Next)]);
        id
    }

    /// Insert a node before `index`, halfway in parameter between its
    /// neighbours. Its continuity is the weaker of the neighbours'.
    pub fn add_point_at(&mut self, index: usize, p: P) -> Result<NodeId> {
        let n = self.points.len();
        if index == 0 {
            return Ok(self.add_point_at_first(p));
        }
        if index == n {
            return Ok(self.add_point_at_last(p));
        }
        let b_id = self.points.nth_id(index).ok_or_else(|| {
            SgkError::InvalidOperation(format!("insert index {} beyond {} points", index, n))
        })?;
        let a_id = self
            .points
            .prev(b_id)
            .ok_or_else(|| SgkError::NotFound("left neighbour".into()))?;
        let (a, b) = (self.points[a_id], self.points[b_id]);

        let param = 0.5 * (a.param + b.param);
        let span = b.param - a.param;
        let velocity = if is_nearly_zero(span) {
            P::ZERO
        } else {
            (b.pos - a.pos) / span
        };
        let h_left = param - a.param;
        let h_right = b.param - param;
        let id = self
            .points
            .insert_before(
                b_id,
                BezierStringPoint {
                    pos: p,
                    prev: p - velocity * (h_left / 3.0),
                    next: p + velocity * (h_right / 3.0),
                    param,
                    continuity: a.continuity.min(b.continuity),
                },
            )
            .ok_or_else(|| SgkError::NotFound("insertion node".into()))?;
        self.restore([
            (Some(id), Side::Next),
            (Some(b_id), Side::Prev),
            (Some(a_id), Side::Next),
        ]);
        Ok(id)
    }

    /// Remove the node at `index`. At least two nodes must remain.
    pub fn remove_point_at(&mut self, index: usize) -> Result<P> {
        let n = self.points.len();
        if n <= 2 {
            debug!("rejected removal from a Bezier string with {} nodes", n);
            return Err(SgkError::InvalidOperation(
                "a spline keeps at least two control points".into(),
            ));
        }
        let id = self.node_id(index)?;
        let left = self.points.prev(id);
        let right = self.points.next(id);
        let removed = self
            .points
            .remove(id)
            .ok_or_else(|| SgkError::NotFound("node".into()))?;

        match (left, right) {
            (Some(l), _) if self.points.prev(l).is_some() => {
                self.restore([(Some(l), Side::Prev)])
            }
            (_, Some(r)) => self.restore([(Some(r), Side::Next)]),
            (Some(l), None) => self.restore([(Some(l), Side::Prev)]),
            (None, None) => {}
        }
        Ok(removed.pos)
    }

    /// Index of the `nth` node whose `handle` lies within `tol_sqr` of `pos`.
    pub fn find_ctrl_point(
        &self,
        pos: P,
        handle: ControlHandle,
        nth: usize,
        tol_sqr: f64,
    ) -> Option<usize> {
        self.nodes()
            .enumerate()
            .filter(|(_, n)| n.handle(handle).distance_squared(pos) <= tol_sqr)
            .map(|(i, _)| i)
            .nth(nth)
    }

    pub fn remove_point(&mut self, pos: P, nth: usize, tol_sqr: f64) -> Result<P> {
        let index = self
            .find_ctrl_point(pos, ControlHandle::Position, nth, tol_sqr)
            .ok_or_else(|| SgkError::NotFound(format!("node near {:?}", pos)))?;
        self.remove_point_at(index)
    }

    /// Move a position or handle of the node at `index` and restore the
    /// continuity of the nodes around it.
    ///
    /// Moving a position translates both handles with it and refits the C2
    /// runs. Moving a handle mirrors the opposite one and, at a C2 node,
    /// adjusts one neighbouring handle so the second derivative matches.
    pub fn move_ctrl_point(&mut self, index: usize, handle: ControlHandle, to: P) -> Result<()> {
        let id = self.node_id(index)?;
        let Some(node) = self.points.get_mut(id) else {
            return Err(SgkError::NotFound(format!("node {}", index)));
        };
        match handle {
            ControlHandle::Position => {
                let delta = to - node.pos;
                node.pos = to;
                node.prev += delta;
                node.next += delta;
                self.restore([(Some(id), Side::Next)]);
            }
            ControlHandle::Next => {
                node.next = to;
                self.propagate([(Some(id), Side::Next)]);
            }
            ControlHandle::Prev => {
                node.prev = to;
                self.propagate([(Some(id), Side::Prev)]);
            }
        }
        Ok(())
    }

    /// Move the `nth` position or handle matching `from` to `to`. Returns the
    /// index of the node that moved.
    pub fn adjust_ctrl_point_pos(
        &mut self,
        from: P,
        to: P,
        handle: ControlHandle,
        nth: usize,
        tol_sqr: f64,
    ) -> Result<usize> {
        let index = self
            .find_ctrl_point(from, handle, nth, tol_sqr)
            .ok_or_else(|| SgkError::NotFound(format!("{:?} near {:?}", handle, from)))?;
        self.move_ctrl_point(index, handle, to)?;
        Ok(index)
    }

    /// Change the continuity tag of a node and enforce it.
    pub fn set_continuity(&mut self, index: usize, continuity: Continuity) -> Result<()> {
        let id = self.node_id(index)?;
        if let Some(node) = self.points.get_mut(id) {
            node.continuity = continuity;
        }
        self.restore([(Some(id), Side::Next)]);
        Ok(())
    }

    /// Split the segment containing `t` with de Casteljau and insert the
    /// resulting node. The curve is unchanged.
    pub fn add_point_with_param_without_changing_shape(&mut self, t: f64) -> Result<NodeId> {
        let (t0, t1) = self.param_range();
        if self.points.len() < 2
            || t <= t0 + Tolerance::DEFAULT_PARAM
            || t >= t1 - Tolerance::DEFAULT_PARAM
        {
            return Err(SgkError::InvalidOperation(format!(
                "parameter {} not inside ({}, {})",
                t, t0, t1
            )));
        }
        if self
            .nodes()
            .any(|n| (n.param - t).abs() <= Tolerance::DEFAULT_PARAM)
        {
            return Err(SgkError::InvalidOperation(format!(
                "a node already sits at parameter {}",
                t
            )));
        }

        let a_id = self
            .points
            .ids()
            .take_while(|&id| self.points[id].param < t)
            .last()
            .ok_or_else(|| SgkError::NotFound(format!("segment containing {}", t)))?;
        let b_id = self
            .points
            .next(a_id)
            .ok_or_else(|| SgkError::NotFound(format!("segment containing {}", t)))?;
        let (a, b) = (self.points[a_id], self.points[b_id]);
        let u = (t - a.param) / (b.param - a.param);
        let (left, right) = CubicBezier::new([a.pos, a.next, b.prev, b.pos]).split(u);

        if let Some(n) = self.points.get_mut(a_id) {
            n.next = left.ctrl_point(1);
        }
        if let Some(n) = self.points.get_mut(b_id) {
            n.prev = right.ctrl_point(2);
        }
        self.points
            .insert_after(
                a_id,
                BezierStringPoint {
                    pos: left.end(),
                    prev: left.ctrl_point(2),
                    next: right.ctrl_point(1),
                    param: t,
                    continuity: a.continuity.min(b.continuity),
                },
            )
            .ok_or_else(|| SgkError::NotFound("insertion node".into()))
    }

    /// Split at the node nearest to `t`, inserting one first if `t` falls
    /// inside a segment. Both halves keep the shared node.
    pub fn split(&self, t: f64) -> Result<(Self, Self)> {
        let mut work = self.clone();
        if work.add_point_with_param_without_changing_shape(t).is_err() {
            debug!("splitting at the node nearest to {}", t);
        }
        let nodes: Vec<BezierStringPoint<P>> = work.nodes().copied().collect();
        let k = nodes
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (a.param - t).abs().total_cmp(&(b.param - t).abs()))
            .map(|(i, _)| i)
            .ok_or_else(|| SgkError::InvalidOperation("split of an empty string".into()))?;
        if k == 0 || k + 1 == nodes.len() {
            return Err(SgkError::InvalidOperation(format!(
                "cannot split at an end (t = {})",
                t
            )));
        }
        let first = Self {
            points: nodes[..=k].iter().copied().collect(),
        };
        let second = Self {
            points: nodes[k..].iter().copied().collect(),
        };
        Ok((first, second))
    }

    /// Reverse the direction: node order flips, handles swap and parameters
    /// are negated, so the range `[t0, t1]` becomes `[-t1, -t0]`. Negation is
    /// exact, so reversing twice restores every parameter bit for bit.
    pub fn reverse(&mut self) {
        self.points.reverse();
        for id in self.node_ids() {
            if let Some(n) = self.points.get_mut(id) {
                std::mem::swap(&mut n.prev, &mut n.next);
                n.param = -n.param;
            }
        }
    }

    /// One cubic per segment, `(pos_i, next_i, prev_{i+1}, pos_{i+1})`.
    pub fn to_bezier_curves(&self) -> Vec<CubicBezier<P>> {
        let nodes: Vec<&BezierStringPoint<P>> = self.nodes().collect();
        nodes
            .windows(2)
            .map(|w| CubicBezier::new([w[0].pos, w[0].next, w[1].prev, w[1].pos]))
            .collect()
    }

    /// Chain cubic segments into a string with unit parameter steps. The
    /// continuity of each interior node is read off the geometry within `tol`.
    pub fn from_bezier_curves(curves: &[CubicBezier<P>], tol: f64) -> Result<Self> {
        let params: Vec<f64> = (0..=curves.len()).map(|i| i as f64).collect();
        Self::from_bezier_curves_with_params(curves, &params, tol)
    }

    /// Like [`BezierString::from_bezier_curves`], with segment `i` spanning
    /// `[params[i], params[i + 1]]`.
    pub fn from_bezier_curves_with_params(
        curves: &[CubicBezier<P>],
        params: &[f64],
        tol: f64,
    ) -> Result<Self> {
        let (Some(first), Some(last)) = (curves.first(), curves.last()) else {
            return Err(SgkError::InvalidOperation(
                "need at least one Bezier segment".into(),
            ));
        };
        if params.len() != curves.len() + 1 {
            return Err(SgkError::InvalidOperation(format!(
                "{} segments need {} parameters, got {}",
                curves.len(),
                curves.len() + 1,
                params.len()
            )));
        }
        let mut points = NodeList::new();
        let head_next = first.ctrl_point(1);
        points.push_back(BezierStringPoint {
            pos: first.start(),
            prev: mirror(first.start(), head_next),
            next: head_next,
            param: params[0],
            continuity: Continuity::default(),
        });
        for (i, w) in curves.windows(2).enumerate() {
            let (a, b) = (&w[0], &w[1]);
            let hl = params[i + 1] - params[i];
            let hr = params[i + 2] - params[i + 1];
            points.push_back(BezierStringPoint {
                pos: b.start(),
                prev: a.ctrl_point(2),
                next: b.ctrl_point(1),
                param: params[i + 1],
                continuity: detect_continuity(a, b, hl, hr, tol),
            });
        }
        let tail_prev = last.ctrl_point(2);
        points.push_back(BezierStringPoint {
            pos: last.end(),
            prev: tail_prev,
            next: mirror(last.end(), tail_prev),
            param: params[curves.len()],
            continuity: Continuity::default(),
        });
        let string = Self { points };
        string.validate()?;
        Ok(string)
    }

    fn segment_at(&self, t: f64) -> Option<(CubicBezier<P>, f64, f64)> {
        let nodes: Vec<&BezierStringPoint<P>> = self.nodes().collect();
        if nodes.len() < 2 {
            return None;
        }
        let (t0, t1) = (nodes[0].param, nodes[nodes.len() - 1].param);
        let t = t.clamp(t0, t1);
        let i = nodes.partition_point(|n| n.param <= t).clamp(1, nodes.len() - 1) - 1;
        let (a, b) = (nodes[i], nodes[i + 1]);
        let h = b.param - a.param;
        let u = if is_nearly_zero(h) { 0.0 } else { (t - a.param) / h };
        Some((CubicBezier::new([a.pos, a.next, b.prev, b.pos]), u, h))
    }
}

/// Classify the joint between two consecutive cubics spanning parameter
/// intervals `hl` and `hr`.
fn detect_continuity<P: Point>(
    a: &CubicBezier<P>,
    b: &CubicBezier<P>,
    hl: f64,
    hr: f64,
    tol: f64,
) -> Continuity {
    let [_, a1, a2, a3] = a.ctrl_points();
    let [b0, b1, b2, _] = b.ctrl_points();
    if is_nearly_zero(hl) || is_nearly_zero(hr) {
        return Continuity::C0;
    }
    let tol_sqr = tol * tol;
    let incoming = (a3 - a2) / hl;
    let outgoing = (b1 - b0) / hr;
    let curvature_in = (a1 - a2 * 2.0 + a3) / (hl * hl);
    let curvature_out = (b0 - b1 * 2.0 + b2) / (hr * hr);
    let c1 = incoming.distance_squared(outgoing) <= tol_sqr;
    if c1 && curvature_in.distance_squared(curvature_out) <= tol_sqr {
        Continuity::C2
    } else if c1 || (a3 - a2).distance_squared(b1 - b0) <= tol_sqr {
        Continuity::C1
    } else {
        let (din, dout) = (incoming.normalize_or_zero(), outgoing.normalize_or_zero());
        if din != P::ZERO && dout != P::ZERO && din.distance_squared(dout) <= tol_sqr {
            Continuity::G1
        } else {
            Continuity::C0
        }
    }
}

impl<P: Point> ParamCurve<P> for BezierString<P> {
    fn position(&self, t: f64) -> P {
        match self.segment_at(t) {
            Some((c, u, _)) => c.position(u),
            None => self.nodes().next().map_or(P::ZERO, |n| n.pos),
        }
    }

    fn tangent(&self, t: f64) -> P {
        match self.segment_at(t) {
            Some((c, u, h)) if !is_nearly_zero(h) => c.tangent(u) / h,
            _ => P::ZERO,
        }
    }

    fn second_derivative(&self, t: f64) -> P {
        match self.segment_at(t) {
            Some((c, u, h)) if !is_nearly_zero(h) => c.second_derivative(u) / (h * h),
            _ => P::ZERO,
        }
    }

    fn param_range(&self) -> (f64, f64) {
        match (self.points.head(), self.points.tail()) {
            (Some(a), Some(b)) => (self.points[a].param, self.points[b].param),
            _ => (0.0, 0.0),
        }
    }

    fn breakpoints(&self) -> Vec<f64> {
        let params = self.params();
        match params.len() {
            0..=2 => Vec::new(),
            n => params[1..n - 1].to_vec(),
        }
    }
}

impl<P: Point> BoundingBox for BezierString<P> {
    type Point = P;

    /// Bounds of positions and the handles that shape the curve.
    fn bounding_box(&self) -> (P, P) {
        let pts: Vec<P> = self
            .to_bezier_curves()
            .iter()
            .flat_map(|c| c.ctrl_points())
            .chain(self.nodes().next().map(|n| n.pos))
            .collect();
        match Bounds::from_points(&pts) {
            Some(b) => (b.min, b.max),
            None => (P::ZERO, P::ZERO),
        }
    }
}

impl<P: Point> Validate for BezierString<P> {
    fn validate(&self) -> Result<()> {
        for (i, n) in self.nodes().enumerate() {
            let finite = (0..P::DIM).all(|d| {
                n.pos[d].is_finite() && n.prev[d].is_finite() && n.next[d].is_finite()
            });
            if !finite || !n.param.is_finite() {
                return Err(SgkError::Geometry(format!("node {} is not finite", i)));
            }
        }
        let params = self.params();
        if let Some(i) = params.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SgkError::Geometry(format!(
                "parameters must increase: node {} has {}, node {} has {}",
                i,
                params[i],
                i + 1,
                params[i + 1]
            )));
        }
        Ok(())
    }
}
