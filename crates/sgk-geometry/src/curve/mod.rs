//! Parametric curve trait and single-segment Bezier implementations.

mod bezier;
pub mod operations;
mod rational;

use sgk_core::is_nearly_zero;
use sgk_math::{curvature, principal_curvature, GaussLegendre, Point, DEFAULT_NEWTON_ITERATIONS};

pub use bezier::{BezierCurve, CubicBezier, QuadraticBezier};
pub use rational::RationalBezierCurve;

/// Samples per smooth piece used to seed the closest-point search.
const SEARCH_SAMPLES_PER_PIECE: usize = 16;

/// Trait for parametric curves in `Dim`-dimensional space.
///
/// Parameters outside [`ParamCurve::param_range`] are not rejected; callers
/// clamp to the range.
pub trait ParamCurve<P: Point>: Send + Sync {
    /// Evaluate the curve at parameter `t`.
    fn position(&self, t: f64) -> P;

    /// First derivative with respect to the parameter.
    fn tangent(&self, t: f64) -> P;

    /// Second derivative with respect to the parameter.
    fn second_derivative(&self, t: f64) -> P;

    /// Return the parameter domain `(t_min, t_max)`.
    fn param_range(&self) -> (f64, f64);

    /// Interior parameters where the curve is only piecewise smooth.
    fn breakpoints(&self) -> Vec<f64> {
        Vec::new()
    }

    fn curvature(&self, t: f64) -> f64 {
        curvature(self.tangent(t), self.second_derivative(t))
    }

    /// Signed curvature in the coordinate plane orthogonal to `axis`.
    fn principal_curvature(&self, t: f64, axis: usize) -> f64 {
        principal_curvature(self.tangent(t), self.second_derivative(t), axis)
    }

    /// Arc length from the start of the range to `t`.
    fn length(&self, t: f64) -> f64 {
        speed_integrator(self).integrate(t)
    }

    fn total_length(&self) -> f64 {
        speed_integrator(self).total()
    }

    /// Parameter at which the arc length from the start equals `s`.
    fn parameter_at_length(&self, s: f64) -> f64 {
        speed_integrator(self).solve_from_integration(s, DEFAULT_NEWTON_ITERATIONS)
    }

    /// Parameter of the curve point closest to `pos`, if that point lies within
    /// `tol_sqr` (squared distance) of it.
    fn find_param_by_position(&self, pos: P, tol_sqr: f64) -> Option<f64> {
        let (t0, t1) = self.param_range();
        let mut pieces = vec![t0];
        pieces.extend(self.breakpoints().into_iter().filter(|&t| t > t0 && t < t1));
        pieces.push(t1);

        let mut best_t = t0;
        let mut best_dist = f64::INFINITY;
        for w in pieces.windows(2) {
            for i in 0..=SEARCH_SAMPLES_PER_PIECE {
                let t = w[0] + (w[1] - w[0]) * i as f64 / SEARCH_SAMPLES_PER_PIECE as f64;
                let dist = self.position(t).distance_squared(pos);
                if dist < best_dist {
                    best_t = t;
                    best_dist = dist;
                }
            }
        }

        // Newton on d/dt |C(t) - pos|^2 / 2
        for _ in 0..DEFAULT_NEWTON_ITERATIONS {
            let diff = self.position(best_t) - pos;
            let d1 = self.tangent(best_t);
            let d2 = self.second_derivative(best_t);
            let denom = d1.dot(d1) + diff.dot(d2);
            if is_nearly_zero(denom) {
                break;
            }
            let next = (best_t - diff.dot(d1) / denom).clamp(t0, t1);
            let next_dist = self.position(next).distance_squared(pos);
            if next_dist >= best_dist {
                break;
            }
            best_t = next;
            best_dist = next_dist;
        }

        (best_dist <= tol_sqr).then_some(best_t)
    }
}

/// Gauss-Legendre integrator of the curve speed over its parameter range.
fn speed_integrator<P, C>(curve: &C) -> GaussLegendre<impl Fn(f64) -> f64 + '_>
where
    P: Point,
    C: ParamCurve<P> + ?Sized,
{
    let (t0, t1) = curve.param_range();
    GaussLegendre::new(move |t| curve.tangent(t).length(), t0, t1)
        .with_breakpoints(curve.breakpoints())
}
