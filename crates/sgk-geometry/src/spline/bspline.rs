//! Clamped B-spline over a linked list of homogeneous control points.

use log::debug;
use sgk_core::{BoundingBox, Result, SgkError, Tolerance, Validate};
use sgk_math::{rational_derivatives, Bounds, Point};

use super::list::{NodeId, NodeList};
use super::SplineEnd;
use crate::curve::{BezierCurve, ParamCurve};
use crate::nurbs::{clamped_knot_vector, deboor, multiplicity};

pub const DEFAULT_DEGREE: usize = 3;

/// Parameter length given to each knot interval created by end insertions.
pub const DEFAULT_KNOT_INTERVAL: f64 = 1.0;

/// A clamped B-spline of runtime degree.
///
/// `knots` holds only the breakpoints of the clamped knot vector: the first and
/// last value implicitly carry multiplicity `degree + 1`. Its length is
/// `num_points - degree + 1` once the curve is evaluable, 1 while it has
/// between 1 and `degree` points, and 0 when empty.
#[derive(Debug, Clone)]
pub struct ClampedBSpline<P: Point> {
    degree: usize,
    points: NodeList<P::Hom>,
    knots: Vec<f64>,
}

impl<P: Point> Default for ClampedBSpline<P> {
    fn default() -> Self {
        Self::new(DEFAULT_DEGREE)
    }
}

fn expected_knot_count(num_points: usize, degree: usize) -> usize {
    match num_points {
        0 => 0,
        n if n <= degree => 1,
        n => n - degree + 1,
    }
}

impl<P: Point> ClampedBSpline<P> {
    pub fn new(degree: usize) -> Self {
        Self {
            degree: degree.max(1),
            points: NodeList::new(),
            knots: Vec::new(),
        }
    }

    /// Build from unit-weight points with uniform knot intervals.
    pub fn from_points(degree: usize, points: &[P]) -> Self {
        let mut spline = Self::new(degree);
        for &p in points {
            spline.add_point_at_last(p);
        }
        spline
    }

    /// Build from homogeneous control points and a breakpoint array.
    pub fn from_homogeneous(degree: usize, points: Vec<P::Hom>, knots: Vec<f64>) -> Result<Self> {
        let spline = Self {
            degree: degree.max(1),
            points: points.into_iter().collect(),
            knots,
        };
        spline.validate()?;
        Ok(spline)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `true` once there are at least `degree + 1` control points.
    pub fn is_evaluable(&self) -> bool {
        self.points.len() > self.degree
    }

    /// Breakpoints of the clamped knot vector.
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// The full knot vector with clamped ends expanded.
    pub fn full_knots(&self) -> Vec<f64> {
        clamped_knot_vector(self.degree, &self.knots)
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.points.ids().collect()
    }

    pub fn homogeneous_points(&self) -> Vec<P::Hom> {
        self.points.values().copied().collect()
    }

    pub fn ctrl_points(&self) -> Vec<P> {
        self.points.values().map(|&h| P::projection(h)).collect()
    }

    pub fn ctrl_point(&self, index: usize) -> Option<P> {
        let id = self.points.nth_id(index)?;
        self.ctrl_point_by_id(id)
    }

    pub fn ctrl_point_by_id(&self, id: NodeId) -> Option<P> {
        self.points.get(id).map(|&h| P::projection(h))
    }

    /// Move the control point at `index`, keeping its weight.
    pub fn set_ctrl_point(&mut self, index: usize, p: P) -> Result<()> {
        let id = self.points.nth_id(index).ok_or_else(|| {
            SgkError::NotFound(format!("control point {} of {}", index, self.points.len()))
        })?;
        if let Some(h) = self.points.get_mut(id) {
            *h = p.homogeneous(P::weight(*h));
        }
        Ok(())
    }

    fn write_points(&mut self, values: &[P::Hom]) {
        for (id, &v) in self.node_ids().into_iter().zip(values) {
            if let Some(h) = self.points.get_mut(id) {
                *h = v;
            }
        }
    }

    /// Grow the breakpoint array at `end` until it matches the point count.
    pub fn add_new_knot_interval_if_necessary(&mut self, end: SplineEnd) {
        while self.knots.len() < expected_knot_count(self.points.len(), self.degree) {
            match (end, self.knots.first(), self.knots.last()) {
                (_, None, _) | (_, _, None) => self.knots.push(0.0),
                (SplineEnd::End, _, Some(&last)) => self.knots.push(last + DEFAULT_KNOT_INTERVAL),
                (SplineEnd::Start, Some(&first), _) => {
                    self.knots.insert(0, first - DEFAULT_KNOT_INTERVAL)
                }
            }
        }
    }

    /// Shrink the breakpoint array at `end` until it matches the point count.
    pub fn remove_knot_interval_if_necessary(&mut self, end: SplineEnd) {
        while self.knots.len() > expected_knot_count(self.points.len(), self.degree) {
            match end {
                SplineEnd::End => {
                    self.knots.pop();
                }
                SplineEnd::Start => {
                    self.knots.remove(0);
                }
            }
        }
    }

    pub fn add_point_at_last(&mut self, p: P) -> NodeId {
        let id = self.points.push_back(p.lift());
        self.add_new_knot_interval_if_necessary(SplineEnd::End);
        id
    }

    pub fn add_point_at_first(&mut self, p: P) -> NodeId {
        let id = self.points.push_front(p.lift());
        self.add_new_knot_interval_if_necessary(SplineEnd::Start);
        id
    }

    /// Insert a control point before `index`. A new breakpoint, when needed,
    /// halves the knot interval around the insertion.
    pub fn add_point_at(&mut self, index: usize, p: P) -> Result<NodeId> {
        let n = self.points.len();
        if index == 0 {
            return Ok(self.add_point_at_first(p));
        }
        if index == n {
            return Ok(self.add_point_at_last(p));
        }
        let at = self.points.nth_id(index).ok_or_else(|| {
            SgkError::InvalidOperation(format!("insert index {} beyond {} points", index, n))
        })?;
        let id = self
            .points
            .insert_before(at, p.lift())
            .ok_or_else(|| SgkError::NotFound("insertion node".into()))?;

        if self.knots.len() < 2 {
            self.add_new_knot_interval_if_necessary(SplineEnd::End);
        } else if self.knots.len() < expected_knot_count(self.points.len(), self.degree) {
            let intervals = self.knots.len() - 1;
            let mut j = (index * intervals / n).min(intervals - 1);
            if is_degenerate_interval(&self.knots, j) {
                j = widest_interval(&self.knots);
            }
            let mid = 0.5 * (self.knots[j] + self.knots[j + 1]);
            self.knots.insert(j + 1, mid);
        }
        Ok(id)
    }

    /// Remove the control point at `index`. At least two points must remain.
    pub fn remove_point_at(&mut self, index: usize) -> Result<P> {
        let n = self.points.len();
        if n <= 2 {
            debug!("rejected removal from a B-spline with {} points", n);
            return Err(SgkError::InvalidOperation(
                "a spline keeps at least two control points".into(),
            ));
        }
        let id = self.points.nth_id(index).ok_or_else(|| {
            SgkError::NotFound(format!("control point {} of {}", index, n))
        })?;
        let removed = self
            .points
            .remove(id)
            .ok_or_else(|| SgkError::NotFound("control point node".into()))?;

        if index == 0 {
            self.remove_knot_interval_if_necessary(SplineEnd::Start);
        } else if index == n - 1 || self.knots.len() <= 2 {
            self.remove_knot_interval_if_necessary(SplineEnd::End);
        } else if self.knots.len() > expected_knot_count(self.points.len(), self.degree) {
            let intervals = self.knots.len() - 1;
            let j = (index * intervals / n).clamp(1, self.knots.len() - 2);
            self.knots.remove(j);
        }
        Ok(P::projection(removed))
    }

    /// Index of the `nth` control point within `tol_sqr` of `pos`.
    pub fn find_ctrl_point(&self, pos: P, nth: usize, tol_sqr: f64) -> Option<usize> {
        self.points
            .values()
            .enumerate()
            .filter(|(_, &h)| P::projection(h).distance_squared(pos) <= tol_sqr)
            .map(|(i, _)| i)
            .nth(nth)
    }

    pub fn remove_point(&mut self, pos: P, nth: usize, tol_sqr: f64) -> Result<P> {
        let index = self
            .find_ctrl_point(pos, nth, tol_sqr)
            .ok_or_else(|| SgkError::NotFound(format!("control point near {:?}", pos)))?;
        self.remove_point_at(index)
    }

    /// Move the `nth` control point matching `from` to `to`. Returns its index.
    pub fn adjust_ctrl_point_pos(&mut self, from: P, to: P, nth: usize, tol_sqr: f64) -> Result<usize> {
        let index = self
            .find_ctrl_point(from, nth, tol_sqr)
            .ok_or_else(|| SgkError::NotFound(format!("control point near {:?}", from)))?;
        self.set_ctrl_point(index, to)?;
        Ok(index)
    }

    fn snap_interior_param(&self, t: f64) -> Result<f64> {
        if !self.is_evaluable() {
            return Err(SgkError::InvalidOperation(format!(
                "B-spline of degree {} needs {} points, has {}",
                self.degree,
                self.degree + 1,
                self.points.len()
            )));
        }
        let (t0, t1) = self.param_range();
        if t <= t0 + Tolerance::DEFAULT_PARAM || t >= t1 - Tolerance::DEFAULT_PARAM {
            return Err(SgkError::InvalidOperation(format!(
                "parameter {} not inside ({}, {})",
                t, t0, t1
            )));
        }
        Ok(self
            .knots
            .iter()
            .copied()
            .find(|&b| (b - t).abs() <= Tolerance::DEFAULT_PARAM)
            .unwrap_or(t))
    }

    /// Boehm knot insertion at `t`. The curve is unchanged; affected control
    /// points are updated in place and one new node is returned.
    pub fn add_point_with_param_without_changing_shape(&mut self, t: f64) -> Result<NodeId> {
        let t = self.snap_interior_param(t)?;
        let p = self.degree;
        let full = self.full_knots();
        if multiplicity(&full, t, Tolerance::DEFAULT_PARAM) >= p {
            return Err(SgkError::InvalidOperation(format!(
                "knot {} already has multiplicity {}",
                t, p
            )));
        }

        let (k, inserted) = deboor::insert_knot(p, &full, &self.homogeneous_points(), t);
        let ids = self.node_ids();
        for i in (k + 1 - p)..k {
            if let Some(h) = self.points.get_mut(ids[i]) {
                *h = inserted[i];
            }
        }
        let id = self
            .points
            .insert_before(ids[k], inserted[k])
            .ok_or_else(|| SgkError::NotFound("knot insertion node".into()))?;
        let at = self.knots.partition_point(|&b| b <= t);
        self.knots.insert(at, t);
        Ok(id)
    }

    /// Remove one occurrence of the interior knot `t` if the curve moves by at
    /// most `tol`. Returns whether a knot was removed.
    pub fn remove_knot(&mut self, t: f64, tol: f64) -> bool {
        let p = self.degree;
        let full = self.full_knots();
        let Some(r) = full
            .iter()
            .rposition(|&k| (k - t).abs() <= Tolerance::DEFAULT_PARAM)
        else {
            return false;
        };
        let s = multiplicity(&full, full[r], Tolerance::DEFAULT_PARAM);
        let Some((fout, reduced)) =
            deboor::remove_knot(p, &full, &self.homogeneous_points(), r, s, tol)
        else {
            return false;
        };

        let ids = self.node_ids();
        self.points.remove(ids[fout]);
        self.write_points(&reduced);
        if let Some(j) = self.knots.iter().rposition(|&b| (b - t).abs() <= Tolerance::DEFAULT_PARAM) {
            self.knots.remove(j);
        }
        debug!("removed knot {} (multiplicity {} -> {})", t, s, s - 1);
        true
    }

    /// Split at interior parameter `t` into two clamped B-splines sharing the
    /// point at `t`.
    pub fn split(&self, t: f64) -> Result<(Self, Self)> {
        let t = self.snap_interior_param(t)?;
        let p = self.degree;
        let full = self.full_knots();
        let s = multiplicity(&full, t, Tolerance::DEFAULT_PARAM);
        let (first_pts, second_pts) =
            deboor::split_points(p, &full, &self.homogeneous_points(), t, s);

        let mut first_knots: Vec<f64> = self.knots.iter().copied().filter(|&b| b < t).collect();
        first_knots.push(t);
        let mut second_knots = vec![t];
        second_knots.extend(self.knots.iter().copied().filter(|&b| b > t));

        let first = Self::from_homogeneous(p, first_pts, first_knots)?;
        let second = Self::from_homogeneous(p, second_pts, second_knots)?;
        Ok((first, second))
    }

    /// Reverse the traversal direction. Knots are negated in reverse order,
    /// so `[t0, t1]` becomes `[-t1, -t0]` and reversing twice is exact.
    pub fn reverse(&mut self) {
        self.points.reverse();
        self.knots = self.knots.iter().rev().map(|&b| -b).collect();
    }

    /// Decompose into Bezier segments, one per non-empty knot interval.
    ///
    /// Returns `None` when `N` is not `degree + 1` or the curve is not yet
    /// evaluable.
    pub fn to_bezier_curves<const N: usize>(&self) -> Option<Vec<BezierCurve<P, N>>> {
        let p = self.degree;
        if N != p + 1 || !self.is_evaluable() {
            return None;
        }
        let mut full = self.full_knots();
        let mut pts = self.homogeneous_points();
        let mut interior: Vec<f64> = self.breakpoints();
        interior.dedup();
        for b in interior {
            let m = multiplicity(&full, b, Tolerance::DEFAULT_PARAM);
            for _ in m..p {
                let (_, next) = deboor::insert_knot(p, &full, &pts, b);
                pts = next;
                let at = full.partition_point(|&k| k <= b);
                full.insert(at, b);
            }
        }
        let segments = (pts.len() - 1) / p;
        Some(
            (0..segments)
                .map(|j| BezierCurve::from_homogeneous(std::array::from_fn(|i| pts[j * p + i])))
                .collect(),
        )
    }

    /// Join Bezier segments into one spline with unit knot intervals, then
    /// remove every interior knot the shape does not need (within `tol`).
    pub fn from_bezier_curves<const N: usize>(curves: &[BezierCurve<P, N>], tol: f64) -> Result<Self> {
        let params: Vec<f64> = (0..=curves.len()).map(|i| i as f64).collect();
        Self::from_bezier_curves_with_params(curves, &params, tol)
    }

    /// Like [`ClampedBSpline::from_bezier_curves`], with segment `i` spanning
    /// `[params[i], params[i + 1]]`.
    pub fn from_bezier_curves_with_params<const N: usize>(
        curves: &[BezierCurve<P, N>],
        params: &[f64],
        tol: f64,
    ) -> Result<Self> {
        if N < 2 || curves.is_empty() {
            return Err(SgkError::InvalidOperation(
                "need at least one Bezier segment of degree >= 1".into(),
            ));
        }
        if params.len() != curves.len() + 1 {
            return Err(SgkError::InvalidOperation(format!(
                "{} segments need {} parameters, got {}",
                curves.len(),
                curves.len() + 1,
                params.len()
            )));
        }
        let p = N - 1;
        let mut points: Vec<P::Hom> = curves[0].points().to_vec();
        let mut knots = vec![params[0]];
        for (i, curve) in curves.iter().enumerate().skip(1) {
            if curve.start().distance_squared(curves[i - 1].end()) > tol * tol {
                debug!("segment {} does not start where segment {} ends", i, i - 1);
            }
            points.extend_from_slice(&curve.points()[1..]);
            knots.extend(std::iter::repeat(params[i]).take(p));
        }
        knots.push(params[curves.len()]);

        let mut spline = Self::from_homogeneous(p, points, knots)?;
        for &b in &params[1..curves.len()] {
            while spline.remove_knot(b, tol) {}
        }
        Ok(spline)
    }

    fn homogeneous_derivatives(&self, t: f64) -> [P::Hom; 3] {
        let (t0, t1) = self.param_range();
        deboor::curve_derivatives(
            self.degree,
            &self.full_knots(),
            &self.homogeneous_points(),
            t.clamp(t0, t1),
        )
    }
}

fn is_degenerate_interval(knots: &[f64], j: usize) -> bool {
    knots[j + 1] - knots[j] <= Tolerance::DEFAULT_PARAM
}

fn widest_interval(knots: &[f64]) -> usize {
    (0..knots.len() - 1)
        .max_by(|&a, &b| {
            (knots[a + 1] - knots[a]).total_cmp(&(knots[b + 1] - knots[b]))
        })
        .unwrap_or(0)
}

impl<P: Point> ParamCurve<P> for ClampedBSpline<P> {
    fn position(&self, t: f64) -> P {
        let [h, d1, d2] = self.homogeneous_derivatives(t);
        rational_derivatives::<P>(h, d1, d2).0
    }

    fn tangent(&self, t: f64) -> P {
        let [h, d1, d2] = self.homogeneous_derivatives(t);
        rational_derivatives::<P>(h, d1, d2).1
    }

    fn second_derivative(&self, t: f64) -> P {
        let [h, d1, d2] = self.homogeneous_derivatives(t);
        rational_derivatives::<P>(h, d1, d2).2
    }

    fn param_range(&self) -> (f64, f64) {
        match (self.knots.first(), self.knots.last()) {
            (Some(&a), Some(&b)) => (a, b),
            _ => (0.0, 0.0),
        }
    }

    fn breakpoints(&self) -> Vec<f64> {
        let (t0, t1) = self.param_range();
        self.knots
            .iter()
            .copied()
            .filter(|&b| b > t0 && b < t1)
            .collect()
    }
}

impl<P: Point> BoundingBox for ClampedBSpline<P> {
    type Point = P;

    /// Bounds of the control polygon.
    fn bounding_box(&self) -> (P, P) {
        match Bounds::from_points(&self.ctrl_points()) {
            Some(b) => (b.min, b.max),
            None => (P::ZERO, P::ZERO),
        }
    }
}

impl<P: Point> Validate for ClampedBSpline<P> {
    fn validate(&self) -> Result<()> {
        let expected = expected_knot_count(self.points.len(), self.degree);
        if self.knots.len() != expected {
            return Err(SgkError::Geometry(format!(
                "{} control points of degree {} need {} breakpoints, found {}",
                self.points.len(),
                self.degree,
                expected,
                self.knots.len()
            )));
        }
        if self.knots.iter().any(|b| !b.is_finite()) {
            return Err(SgkError::Geometry("non-finite knot".into()));
        }
        if self.knots.windows(2).any(|w| w[1] < w[0]) {
            return Err(SgkError::Geometry("knots must be non-decreasing".into()));
        }
        if let &[first, .., last] = self.knots.as_slice() {
            if last - first <= Tolerance::DEFAULT_PARAM {
                return Err(SgkError::Geometry("empty parameter range".into()));
            }
            let interior = &self.knots[1..self.knots.len() - 1];
            for &b in interior {
                let m = multiplicity(&self.knots, b, Tolerance::DEFAULT_PARAM);
                if m > self.degree || (b - first).abs() <= Tolerance::DEFAULT_PARAM
                    || (b - last).abs() <= Tolerance::DEFAULT_PARAM
                {
                    return Err(SgkError::Geometry(format!(
                        "interior knot {} exceeds multiplicity {}",
                        b, self.degree
                    )));
                }
            }
        }
        for (i, h) in self.points.values().enumerate() {
            let w = P::weight(*h);
            if !w.is_finite() || w < 0.0 {
                return Err(SgkError::Geometry(format!(
                    "control point {} has invalid weight {}",
                    i, w
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sgk_math::{dvec2, dvec3, DVec2, DVec3};

    fn sample() -> ClampedBSpline<DVec2> {
        ClampedBSpline::from_points(
            3,
            &[
                dvec2(0.0, 0.0),
                dvec2(1.0, 2.0),
                dvec2(2.0, -1.0),
                dvec2(3.5, 0.5),
                dvec2(4.0, 3.0),
                dvec2(5.0, 1.0),
            ],
        )
    }

    fn assert_same_shape(a: &ClampedBSpline<DVec2>, b: &ClampedBSpline<DVec2>) {
        let (t0, t1) = a.param_range();
        for i in 0..=40 {
            let t = t0 + (t1 - t0) * i as f64 / 40.0;
            assert!((a.position(t) - b.position(t)).length() < 1e-9, "t={}", t);
        }
    }

    #[test]
    fn test_knot_count_follows_point_count() {
        let mut spline = ClampedBSpline::<DVec2>::new(3);
        assert!(spline.knots().is_empty());
        let counts: Vec<usize> = (0..6)
            .map(|i| {
                spline.add_point_at_last(dvec2(i as f64, 0.0));
                spline.knots().len()
            })
            .collect();
        assert_eq!(counts, vec![1, 1, 1, 2, 3, 4]);
        assert_eq!(spline.knots(), &[0.0, 1.0, 2.0, 3.0]);

        spline.add_point_at_first(dvec2(-1.0, 0.0));
        assert_eq!(spline.knots(), &[-1.0, 0.0, 1.0, 2.0, 3.0]);
        assert!(spline.validate().is_ok());

        spline.remove_point_at(0).unwrap();
        spline.remove_point_at(spline.num_points() - 1).unwrap();
        assert_eq!(spline.knots(), &[0.0, 1.0, 2.0]);
        assert!(spline.validate().is_ok());
    }

    #[test]
    fn test_middle_insertion_and_removal_keep_knots_consistent() {
        let mut spline = sample();
        spline.add_point_at(2, dvec2(1.5, 1.0)).unwrap();
        assert_eq!(spline.num_points(), 7);
        assert!(spline.validate().is_ok());
        spline.remove_point_at(3).unwrap();
        assert!(spline.validate().is_ok());
    }

    #[test]
    fn test_cannot_remove_below_two_points() {
        let mut spline = ClampedBSpline::from_points(3, &[dvec2(0.0, 0.0), dvec2(1.0, 0.0)]);
        assert!(matches!(
            spline.remove_point_at(0),
            Err(SgkError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_clamped_ends_interpolate() {
        let spline = sample();
        assert_eq!(spline.position(0.0), dvec2(0.0, 0.0));
        assert_relative_eq!(spline.position(3.0).x, 5.0, epsilon = 1e-12);
        assert_relative_eq!(spline.position(3.0).y, 1.0, epsilon = 1e-12);
        // End tangent is p * (P[n] - P[n-1]) / last interval
        let d = spline.tangent(3.0);
        assert_relative_eq!(d.x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(d.y, -6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_knot_insertion_preserves_shape_and_ids() {
        let original = sample();
        let mut spline = original.clone();
        let ids = spline.node_ids();
        let new_id = spline.add_point_with_param_without_changing_shape(1.3).unwrap();

        assert_eq!(spline.num_points(), 7);
        assert_eq!(spline.knots(), &[0.0, 1.0, 1.3, 2.0, 3.0]);
        assert_same_shape(&original, &spline);

        let after = spline.node_ids();
        assert!(after.contains(&new_id));
        assert!(ids.iter().all(|id| after.contains(id)));
        assert!(spline.validate().is_ok());
    }

    #[test]
    fn test_insertion_outside_range_is_rejected() {
        let mut spline = sample();
        assert!(spline.add_point_with_param_without_changing_shape(0.0).is_err());
        assert!(spline.add_point_with_param_without_changing_shape(4.0).is_err());
    }

    #[test]
    fn test_remove_knot_undoes_insertion() {
        let original = sample();
        let mut spline = original.clone();
        spline.add_point_with_param_without_changing_shape(2.4).unwrap();
        assert!(spline.remove_knot(2.4, 1e-9));
        assert_eq!(spline.knots(), original.knots());
        for (a, b) in spline.ctrl_points().iter().zip(original.ctrl_points()) {
            assert!((*a - b).length() < 1e-9);
        }
        // Original knots shape the curve
        assert!(!spline.remove_knot(1.0, 1e-9));
    }

    #[test]
    fn test_split_is_continuous() {
        let spline = sample();
        for &t in &[0.4, 1.0, 2.2] {
            let (first, second) = spline.split(t).unwrap();
            assert!(first.validate().is_ok());
            assert!(second.validate().is_ok());
            assert_eq!(first.param_range(), (0.0, t));
            assert_eq!(second.param_range(), (t, 3.0));
            for i in 0..=10 {
                let u = t * i as f64 / 10.0;
                assert!((first.position(u) - spline.position(u)).length() < 1e-9);
                let v = t + (3.0 - t) * i as f64 / 10.0;
                assert!((second.position(v) - spline.position(v)).length() < 1e-9);
            }
        }
        assert!(spline.split(0.0).is_err());
    }

    #[test]
    fn test_reverse_twice_is_identity() {
        let original = sample();
        let mut spline = original.clone();
        spline.add_point_with_param_without_changing_shape(0.3).unwrap();
        let inserted = spline.clone();
        spline.reverse();
        let (t0, t1) = spline.param_range();
        assert_eq!((t0, t1), (-3.0, 0.0));
        assert!((spline.position(t0 + 0.3) - inserted.position(2.7)).length() < 1e-9);
        assert!((spline.position(-0.3) - inserted.position(0.3)).length() < 1e-9);
        spline.reverse();
        assert_eq!(spline.knots(), inserted.knots());
        assert_eq!(spline.ctrl_points(), inserted.ctrl_points());
    }

    #[test]
    fn test_reverse_twice_restores_inexact_knots_bit_for_bit() {
        let mut spline = sample();
        spline.add_point_with_param_without_changing_shape(0.1).unwrap();
        spline.add_point_with_param_without_changing_shape(2.7).unwrap();
        let original = spline.clone();
        spline.reverse();
        spline.reverse();
        assert_eq!(spline.knots(), original.knots());
        assert_eq!(spline.homogeneous_points(), original.homogeneous_points());
    }

    #[test]
    fn test_bezier_decomposition_round_trip() {
        let spline = sample();
        let curves = spline.to_bezier_curves::<4>().unwrap();
        assert_eq!(curves.len(), 3);
        for (j, c) in curves.iter().enumerate() {
            for i in 0..=8 {
                let u = i as f64 / 8.0;
                let t = j as f64 + u;
                assert!((c.position(u) - spline.position(t)).length() < 1e-9);
            }
        }
        assert!(spline.to_bezier_curves::<3>().is_none());

        let rebuilt = ClampedBSpline::from_bezier_curves(&curves, 1e-7).unwrap();
        assert_eq!(rebuilt.knots(), spline.knots());
        assert_same_shape(&spline, &rebuilt);
    }

    #[test]
    fn test_find_param_by_position() {
        let spline = ClampedBSpline::<DVec3>::from_points(
            2,
            &[
                dvec3(0.0, 0.0, 0.0),
                dvec3(1.0, 1.0, 0.0),
                dvec3(2.0, 0.0, 1.0),
                dvec3(3.0, 1.0, 1.0),
            ],
        );
        let target = spline.position(1.37);
        let t = spline.find_param_by_position(target, 1e-12).unwrap();
        assert_relative_eq!(t, 1.37, epsilon = 1e-6);
        assert!(spline
            .find_param_by_position(dvec3(10.0, 10.0, 10.0), 1e-6)
            .is_none());
    }

    #[test]
    fn test_adjust_and_remove_by_position() {
        let mut spline = sample();
        let index = spline
            .adjust_ctrl_point_pos(dvec2(2.0, -1.0), dvec2(2.0, -2.0), 0, 1e-12)
            .unwrap();
        assert_eq!(index, 2);
        assert_eq!(spline.ctrl_point(2), Some(dvec2(2.0, -2.0)));
        spline.remove_point(dvec2(2.0, -2.0), 0, 1e-12).unwrap();
        assert_eq!(spline.num_points(), 5);
        assert!(matches!(
            spline.remove_point(dvec2(9.0, 9.0), 0, 1e-12),
            Err(SgkError::NotFound(_))
        ));
    }
}
