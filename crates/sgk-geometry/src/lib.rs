//! SGK geometry: Bezier curves, clamped B-splines and Bezier strings.

pub mod curve;
pub mod nurbs;
pub mod spline;
pub mod tessellate;

pub use curve::{
    BezierCurve, CubicBezier, ParamCurve, QuadraticBezier, RationalBezierCurve,
};
pub use spline::{
    BezierString, BezierStringPoint, ClampedBSpline, Continuity, ControlHandle, NodeId, Spline,
    SplineCurve, SplineEnd, SplinePayload, SplineRecord, SplineType,
};
