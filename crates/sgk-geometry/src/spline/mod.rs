//! Editable splines: clamped B-splines and Bezier strings behind one
//! [`SplineCurve`] interface.

mod bezier_string;
mod bspline;
pub mod list;
mod record;

use serde::{Deserialize, Serialize};
use sgk_core::{BoundingBox, Result, SgkError, Validate};
use sgk_math::Point;

use crate::curve::{BezierCurve, CubicBezier, ParamCurve, QuadraticBezier};

pub use bezier_string::{BezierString, BezierStringPoint, Continuity};
pub use bspline::{ClampedBSpline, DEFAULT_DEGREE, DEFAULT_KNOT_INTERVAL};
pub use list::{NodeId, NodeList};
pub use record::{
    SplinePayload, SplineRecord, SPLINE_RECORD_MAJOR_VERSION, SPLINE_RECORD_MINOR_VERSION,
};

/// One end of a spline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplineEnd {
    Start,
    End,
}

impl SplineEnd {
    pub fn opposite(self) -> Self {
        match self {
            SplineEnd::Start => SplineEnd::End,
            SplineEnd::End => SplineEnd::Start,
        }
    }
}

/// Which part of a control point an edit addresses.
///
/// B-splines only have positions; Bezier strings also have the handle before
/// and after each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlHandle {
    Position,
    Prev,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplineType {
    ClampedBSpline,
    BezierString,
}

/// Editing interface shared by every spline representation.
pub trait SplineCurve<P: Point>: ParamCurve<P> + Validate + BoundingBox<Point = P> {
    fn spline_type(&self) -> SplineType;

    fn num_points(&self) -> usize;

    /// Control point positions in order.
    fn ctrl_points(&self) -> Vec<P>;

    /// First or last control point.
    fn endpoint(&self, end: SplineEnd) -> Option<P> {
        let points = self.ctrl_points();
        match end {
            SplineEnd::Start => points.first().copied(),
            SplineEnd::End => points.last().copied(),
        }
    }

    fn add_point_at_last(&mut self, p: P) -> NodeId;

    fn add_point_at_first(&mut self, p: P) -> NodeId;

    fn add_point_at_end(&mut self, end: SplineEnd, p: P) -> NodeId {
        match end {
            SplineEnd::Start => self.add_point_at_first(p),
            SplineEnd::End => self.add_point_at_last(p),
        }
    }

    /// Insert before `index`; `index == num_points()` appends.
    fn add_point_at(&mut self, index: usize, p: P) -> Result<NodeId>;

    fn remove_point_at(&mut self, index: usize) -> Result<P>;

    /// Remove the `nth` control point within `tol_sqr` of `pos`.
    fn remove_point(&mut self, pos: P, nth: usize, tol_sqr: f64) -> Result<P> {
        let index = self
            .find_ctrl_point(pos, ControlHandle::Position, nth, tol_sqr)
            .ok_or_else(|| SgkError::NotFound(format!("control point near {:?}", pos)))?;
        self.remove_point_at(index)
    }

    /// Index of the `nth` control point whose `handle` lies within `tol_sqr`
    /// of `pos`.
    fn find_ctrl_point(&self, pos: P, handle: ControlHandle, nth: usize, tol_sqr: f64)
        -> Option<usize>;

    fn move_ctrl_point(&mut self, index: usize, handle: ControlHandle, to: P) -> Result<()>;

    /// Move the `nth` match of `from` to `to`. Returns the index that moved.
    fn adjust_ctrl_point_pos(
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

    fn add_point_with_param_without_changing_shape(&mut self, t: f64) -> Result<NodeId>;

    fn reverse(&mut self);
}

impl<P: Point> SplineCurve<P> for ClampedBSpline<P> {
    fn spline_type(&self) -> SplineType {
        SplineType::ClampedBSpline
    }

    fn num_points(&self) -> usize {
        ClampedBSpline::num_points(self)
    }

    fn ctrl_points(&self) -> Vec<P> {
        ClampedBSpline::ctrl_points(self)
    }

    fn add_point_at_last(&mut self, p: P) -> NodeId {
        ClampedBSpline::add_point_at_last(self, p)
    }

    fn add_point_at_first(&mut self, p: P) -> NodeId {
        ClampedBSpline::add_point_at_first(self, p)
    }

    fn add_point_at(&mut self, index: usize, p: P) -> Result<NodeId> {
        ClampedBSpline::add_point_at(self, index, p)
    }

    fn remove_point_at(&mut self, index: usize) -> Result<P> {
        ClampedBSpline::remove_point_at(self, index)
    }

    fn find_ctrl_point(
        &self,
        pos: P,
        handle: ControlHandle,
        nth: usize,
        tol_sqr: f64,
    ) -> Option<usize> {
        match handle {
            ControlHandle::Position => ClampedBSpline::find_ctrl_point(self, pos, nth, tol_sqr),
            _ => None,
        }
    }

    fn move_ctrl_point(&mut self, index: usize, handle: ControlHandle, to: P) -> Result<()> {
        match handle {
            ControlHandle::Position => self.set_ctrl_point(index, to),
            _ => Err(SgkError::InvalidOperation(
                "B-spline control points have no handles".into(),
            )),
        }
    }

    fn add_point_with_param_without_changing_shape(&mut self, t: f64) -> Result<NodeId> {
        ClampedBSpline::add_point_with_param_without_changing_shape(self, t)
    }

    fn reverse(&mut self) {
        ClampedBSpline::reverse(self)
    }
}

impl<P: Point> SplineCurve<P> for BezierString<P> {
    fn spline_type(&self) -> SplineType {
        SplineType::BezierString
    }

    fn num_points(&self) -> usize {
        BezierString::num_points(self)
    }

    fn ctrl_points(&self) -> Vec<P> {
        BezierString::ctrl_points(self)
    }

    fn add_point_at_last(&mut self, p: P) -> NodeId {
        BezierString::add_point_at_last(self, p)
    }

    fn add_point_at_first(&mut self, p: P) -> NodeId {
        BezierString::add_point_at_first(self, p)
    }

    fn add_point_at(&mut self, index: usize, p: P) -> Result<NodeId> {
        BezierString::add_point_at(self, index, p)
    }

    fn remove_point_at(&mut self, index: usize) -> Result<P> {
        BezierString::remove_point_at(self, index)
    }

    fn find_ctrl_point(
        &self,
        pos: P,
        handle: ControlHandle,
        nth: usize,
        tol_sqr: f64,
    ) -> Option<usize> {
        BezierString::find_ctrl_point(self, pos, handle, nth, tol_sqr)
    }

    fn move_ctrl_point(&mut self, index: usize, handle: ControlHandle, to: P) -> Result<()> {
        BezierString::move_ctrl_point(self, index, handle, to)
    }

    fn add_point_with_param_without_changing_shape(&mut self, t: f64) -> Result<NodeId> {
        BezierString::add_point_with_param_without_changing_shape(self, t)
    }

    fn reverse(&mut self) {
        BezierString::reverse(self)
    }
}

/// A spline of either representation.
#[derive(Debug, Clone)]
pub enum Spline<P: Point> {
    ClampedBSpline(ClampedBSpline<P>),
    BezierString(BezierString<P>),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Spline::ClampedBSpline($s) => $body,
            Spline::BezierString($s) => $body,
        }
    };
}

impl<P: Point> From<ClampedBSpline<P>> for Spline<P> {
    fn from(s: ClampedBSpline<P>) -> Self {
        Spline::ClampedBSpline(s)
    }
}

impl<P: Point> From<BezierString<P>> for Spline<P> {
    fn from(s: BezierString<P>) -> Self {
        Spline::BezierString(s)
    }
}

fn elevate_to_cubic<P: Point, const N: usize>(
    curves: Vec<BezierCurve<P, N>>,
    elevate: impl Fn(&BezierCurve<P, N>) -> CubicBezier<P>,
) -> Vec<CubicBezier<P>> {
    curves.iter().map(elevate).collect()
}

impl<P: Point> Spline<P> {
    /// An empty spline of the given type.
    pub fn defaulted(spline_type: SplineType) -> Self {
        match spline_type {
            SplineType::ClampedBSpline => Spline::ClampedBSpline(ClampedBSpline::default()),
            SplineType::BezierString => Spline::BezierString(BezierString::default()),
        }
    }

    /// A spline of the given type through `points`.
    pub fn from_points(spline_type: SplineType, points: &[P]) -> Self {
        let mut spline = Self::defaulted(spline_type);
        for &p in points {
            spline.add_point_at_last(p);
        }
        spline
    }

    pub fn as_bspline(&self) -> Option<&ClampedBSpline<P>> {
        match self {
            Spline::ClampedBSpline(s) => Some(s),
            Spline::BezierString(_) => None,
        }
    }

    pub fn as_bspline_mut(&mut self) -> Option<&mut ClampedBSpline<P>> {
        match self {
            Spline::ClampedBSpline(s) => Some(s),
            Spline::BezierString(_) => None,
        }
    }

    pub fn as_bezier_string(&self) -> Option<&BezierString<P>> {
        match self {
            Spline::BezierString(s) => Some(s),
            Spline::ClampedBSpline(_) => None,
        }
    }

    pub fn as_bezier_string_mut(&mut self) -> Option<&mut BezierString<P>> {
        match self {
            Spline::BezierString(s) => Some(s),
            Spline::ClampedBSpline(_) => None,
        }
    }

    pub fn split(&self, t: f64) -> Result<(Self, Self)> {
        match self {
            Spline::ClampedBSpline(s) => s.split(t).map(|(a, b)| (a.into(), b.into())),
            Spline::BezierString(s) => s.split(t).map(|(a, b)| (a.into(), b.into())),
        }
    }

    /// Bezier segments of degree `N - 1`, or `None` if the spline cannot be
    /// expressed with that degree.
    pub fn to_bezier_curves<const N: usize>(&self) -> Option<Vec<BezierCurve<P, N>>> {
        match self {
            Spline::ClampedBSpline(s) => s.to_bezier_curves::<N>(),
            Spline::BezierString(s) if N == 4 => Some(
                s.to_bezier_curves()
                    .iter()
                    .map(|c| BezierCurve::from_homogeneous(std::array::from_fn(|i| c.points()[i])))
                    .collect(),
            ),
            Spline::BezierString(_) => None,
        }
    }

    /// Cubic segments with their parameter breakpoints. B-splines below degree
    /// three are degree-elevated.
    fn to_cubic_segments(&self) -> Result<(Vec<CubicBezier<P>>, Vec<f64>)> {
        match self {
            Spline::BezierString(s) => Ok((s.to_bezier_curves(), s.params())),
            Spline::ClampedBSpline(s) => {
                let cubics = match s.degree() {
                    1 => s.to_bezier_curves::<2>().map(|c| {
                        elevate_to_cubic(c, |l| {
                            CubicBezier::elevate_from(&QuadraticBezier::elevate_from(l))
                        })
                    }),
                    2 => s
                        .to_bezier_curves::<3>()
                        .map(|c| elevate_to_cubic(c, CubicBezier::elevate_from)),
                    3 => s.to_bezier_curves::<4>(),
                    d => {
                        return Err(SgkError::InvalidOperation(format!(
                            "degree {} B-spline has no cubic Bezier form",
                            d
                        )))
                    }
                }
                .ok_or_else(|| {
                    SgkError::InvalidOperation("B-spline has too few control points".into())
                })?;
                let mut params = s.knots().to_vec();
                params.dedup();
                Ok((cubics, params))
            }
        }
    }

    /// The same curve in another representation.
    ///
    /// B-spline to Bezier string extracts one segment per knot interval and
    /// tags each joint with the continuity found within `tol`. Bezier string
    /// to B-spline joins the segments as a cubic and removes every interior
    /// knot the shape does not need. Rational weights are projected away.
    pub fn converted(&self, target: SplineType, tol: f64) -> Result<Self> {
        if self.spline_type() == target {
            return Ok(self.clone());
        }
        if self.num_points() < 2 {
            return Ok(Self::from_points(target, &self.ctrl_points()));
        }
        let (cubics, params) = self.to_cubic_segments()?;
        Ok(match target {
            SplineType::BezierString => {
                BezierString::from_bezier_curves_with_params(&cubics, &params, tol)?.into()
            }
            SplineType::ClampedBSpline => {
                ClampedBSpline::from_bezier_curves_with_params(&cubics, &params, tol)?.into()
            }
        })
    }
}

impl<P: Point> ParamCurve<P> for Spline<P> {
    fn position(&self, t: f64) -> P {
        dispatch!(self, s => ParamCurve::position(s, t))
    }

    fn tangent(&self, t: f64) -> P {
        dispatch!(self, s => ParamCurve::tangent(s, t))
    }

    fn second_derivative(&self, t: f64) -> P {
        dispatch!(self, s => ParamCurve::second_derivative(s, t))
    }

    fn param_range(&self) -> (f64, f64) {
        dispatch!(self, s => s.param_range())
    }

    fn breakpoints(&self) -> Vec<f64> {
        dispatch!(self, s => s.breakpoints())
    }
}

impl<P: Point> Validate for Spline<P> {
    fn validate(&self) -> Result<()> {
        dispatch!(self, s => s.validate())
    }
}

impl<P: Point> BoundingBox for Spline<P> {
    type Point = P;

    fn bounding_box(&self) -> (P, P) {
        dispatch!(self, s => s.bounding_box())
    }
}

impl<P: Point> SplineCurve<P> for Spline<P> {
    fn spline_type(&self) -> SplineType {
        dispatch!(self, s => SplineCurve::spline_type(s))
    }

    fn num_points(&self) -> usize {
        dispatch!(self, s => s.num_points())
    }

    fn ctrl_points(&self) -> Vec<P> {
        dispatch!(self, s => s.ctrl_points())
    }

    fn add_point_at_last(&mut self, p: P) -> NodeId {
        dispatch!(self, s => s.add_point_at_last(p))
    }

    fn add_point_at_first(&mut self, p: P) -> NodeId {
        dispatch!(self, s => s.add_point_at_first(p))
    }

    fn add_point_at(&mut self, index: usize, p: P) -> Result<NodeId> {
        dispatch!(self, s => s.add_point_at(index, p))
    }

    fn remove_point_at(&mut self, index: usize) -> Result<P> {
        dispatch!(self, s => s.remove_point_at(index))
    }

    fn find_ctrl_point(
        &self,
        pos: P,
        handle: ControlHandle,
        nth: usize,
        tol_sqr: f64,
    ) -> Option<usize> {
        dispatch!(self, s => SplineCurve::find_ctrl_point(s, pos, handle, nth, tol_sqr))
    }

    fn move_ctrl_point(&mut self, index: usize, handle: ControlHandle, to: P) -> Result<()> {
        dispatch!(self, s => SplineCurve::move_ctrl_point(s, index, handle, to))
    }

    fn add_point_with_param_without_changing_shape(&mut self, t: f64) -> Result<NodeId> {
        dispatch!(self, s => s.add_point_with_param_without_changing_shape(t))
    }

    fn reverse(&mut self) {
        dispatch!(self, s => s.reverse())
    }
}
