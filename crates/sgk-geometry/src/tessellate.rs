//! Discretization of parametric curves for rendering and collision
//! collaborators.

use sgk_math::Point;

use crate::curve::ParamCurve;

/// Maximum recursion depth for adaptive subdivision.
const MAX_DEPTH: u32 = 12;

/// Depth down to which pieces are always split, so inflections symmetric
/// about a chord midpoint are not missed.
const MIN_DEPTH: u32 = 2;

/// Convert a curve to a polyline using adaptive subdivision.
///
/// Each smooth piece between breakpoints is subdivided recursively while the
/// curve midpoint deviates from the chord midpoint by more than `tolerance`.
/// Breakpoints always appear in the output.
pub fn curve_to_polyline<P, C>(curve: &C, tolerance: f64) -> Vec<P>
where
    P: Point,
    C: ParamCurve<P> + ?Sized,
{
    let (t_min, t_max) = curve.param_range();
    let mut knots = vec![t_min];
    knots.extend(
        curve
            .breakpoints()
            .into_iter()
            .filter(|&t| t > t_min && t < t_max),
    );
    knots.push(t_max);
    knots.dedup();

    let mut points = vec![curve.position(t_min)];
    for w in knots.windows(2) {
        subdivide_curve(curve, w[0], w[1], tolerance, &mut points, 0);
    }
    points
}

fn subdivide_curve<P, C>(curve: &C, t0: f64, t1: f64, tolerance: f64, points: &mut Vec<P>, depth: u32)
where
    P: Point,
    C: ParamCurve<P> + ?Sized,
{
    if depth >= MAX_DEPTH {
        points.push(curve.position(t1));
        return;
    }

    let t_mid = (t0 + t1) * 0.5;
    let p0 = curve.position(t0);
    let p1 = curve.position(t1);
    let p_mid = curve.position(t_mid);

    // Chord midpoint
    let chord_mid = (p0 + p1) * 0.5;
    let deviation = (p_mid - chord_mid).length();

    if depth < MIN_DEPTH || deviation > tolerance {
        subdivide_curve(curve, t0, t_mid, tolerance, points, depth + 1);
        subdivide_curve(curve, t_mid, t1, tolerance, points, depth + 1);
    } else {
        points.push(p1);
    }
}

/// `count` samples `(parameter, position)` evenly spaced by arc length,
/// including both ends.
pub fn sample_by_arc_length<P, C>(curve: &C, count: usize) -> Vec<(f64, P)>
where
    P: Point,
    C: ParamCurve<P> + ?Sized,
{
    let (t_min, t_max) = curve.param_range();
    match count {
        0 => Vec::new(),
        1 => vec![(t_min, curve.position(t_min))],
        _ => {
            let total = curve.total_length();
            (0..count)
                .map(|i| {
                    let t = match i {
                        0 => t_min,
                        i if i + 1 == count => t_max,
                        i => curve.parameter_at_length(total * i as f64 / (count - 1) as f64),
                    };
                    (t, curve.position(t))
                })
                .collect()
        }
    }
}

/// Samples spaced `spacing` apart along the curve, starting at its start.
/// The end point is appended when the last sample falls short of it.
pub fn sample_by_distance<P, C>(curve: &C, spacing: f64) -> Vec<(f64, P)>
where
    P: Point,
    C: ParamCurve<P> + ?Sized,
{
    let (t_min, t_max) = curve.param_range();
    let total = curve.total_length();
    if spacing <= 0.0 || total <= spacing {
        return vec![(t_min, curve.position(t_min)), (t_max, curve.position(t_max))];
    }
    let steps = (total / spacing).floor() as usize;
    let mut samples: Vec<(f64, P)> = (0..=steps)
        .map(|i| {
            let t = if i == 0 {
                t_min
            } else {
                curve.parameter_at_length(spacing * i as f64)
            };
            (t, curve.position(t))
        })
        .collect();
    if total - spacing * steps as f64 > 1e-9 {
        samples.push((t_max, curve.position(t_max)));
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{CubicBezier, RationalBezierCurve};
    use crate::spline::ClampedBSpline;
    use sgk_math::{dvec2, DVec2, DVec3};

    #[test]
    fn test_curve_to_polyline_line() {
        let line = CubicBezier::new([
            DVec2::ZERO,
            dvec2(10.0 / 3.0, 0.0),
            dvec2(20.0 / 3.0, 0.0),
            dvec2(10.0, 0.0),
        ]);
        let points = curve_to_polyline(&line, 0.01);
        // Only the forced levels subdivide a straight line
        assert_eq!(points.len(), 5);
        assert!((points[0] - DVec2::ZERO).length() < 1e-10);
        assert!((points[4] - dvec2(10.0, 0.0)).length() < 1e-10);
    }

    #[test]
    fn test_curve_to_polyline_circle() {
        let arc = RationalBezierCurve::quarter_circle(DVec3::ZERO, DVec3::X, DVec3::Y, 1.0);
        let points = curve_to_polyline(&arc, 0.001);
        assert!(points.len() > 8, "got {} points", points.len());

        // All points should be on the circle
        for p in &points {
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!((r - 1.0).abs() < 1e-9, "Point not on circle: r={}", r);
        }
    }

    #[test]
    fn test_polyline_hits_knots() {
        let spline = ClampedBSpline::from_points(
            1,
            &[dvec2(0.0, 0.0), dvec2(1.0, 1.0), dvec2(2.0, 0.0)],
        );
        let points = curve_to_polyline(&spline, 0.01);
        assert!(points.iter().any(|p| (*p - dvec2(1.0, 1.0)).length() < 1e-12));
    }

    #[test]
    fn test_sample_by_arc_length_is_even() {
        let spline = ClampedBSpline::from_points(
            1,
            &[dvec2(0.0, 0.0), dvec2(3.0, 0.0), dvec2(3.0, 1.0)],
        );
        let samples = sample_by_arc_length(&spline, 5);
        assert_eq!(samples.len(), 5);
        let expected = [
            dvec2(0.0, 0.0),
            dvec2(1.0, 0.0),
            dvec2(2.0, 0.0),
            dvec2(3.0, 0.0),
            dvec2(3.0, 1.0),
        ];
        for ((_, p), e) in samples.iter().zip(expected) {
            assert!((*p - e).length() < 1e-6, "{:?} != {:?}", p, e);
        }
    }

    #[test]
    fn test_sample_by_distance_appends_end() {
        let line = CubicBezier::new([
            DVec2::ZERO,
            dvec2(1.0, 0.0),
            dvec2(2.0, 0.0),
            dvec2(3.0, 0.0),
        ]);
        let samples = sample_by_distance(&line, 1.2);
        assert_eq!(samples.len(), 4);
        assert!((samples[1].1 - dvec2(1.2, 0.0)).length() < 1e-6);
        assert_eq!(samples[3].0, 1.0);
    }
}
