//! Rational Bezier curves with explicit per-point weights.

use sgk_math::{rational_derivatives, Point, Vector};

use super::bezier::{binomial, BezierCurve};
use super::ParamCurve;

/// A rational Bezier curve: `N` points with one weight each.
///
/// Weights other than one pull the curve toward (w > 1) or push it away from
/// (w < 1) their control point; the endpoints stay fixed. Evaluation works on
/// `(x * w, w)` tuples and divides the weight out once at the end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RationalBezierCurve<P: Point, const N: usize> {
    pub points: [P; N],
    pub weights: [f64; N],
}

impl<P: Point, const N: usize> RationalBezierCurve<P, N> {
    pub fn new(points: [P; N], weights: [f64; N]) -> Self {
        Self { points, weights }
    }

    pub fn from_bezier(curve: &BezierCurve<P, N>) -> Self {
        let h = *curve.points();
        Self {
            points: h.map(P::projection),
            weights: h.map(P::weight),
        }
    }

    /// Control points premultiplied by their weights.
    pub fn weighted_points(&self) -> [P::Hom; N] {
        std::array::from_fn(|i| self.points[i].homogeneous(self.weights[i]))
    }

    pub fn to_bezier(&self) -> BezierCurve<P, N> {
        BezierCurve::from_homogeneous(self.weighted_points())
    }

    /// Evaluate with the Horner scheme on the Bernstein form.
    pub fn horner(&self, t: f64) -> P {
        let h = self.weighted_points();
        let n = N - 1;
        if n == 0 {
            return P::projection(h[0]);
        }
        let s = 1.0 - t;
        let mut t_pow = 1.0;
        let mut coeff = 1.0;
        let mut acc = h[0] * s;
        for (i, &p) in h.iter().enumerate().take(n).skip(1) {
            t_pow *= t;
            coeff = coeff * (n - i + 1) as f64 / i as f64;
            acc = (acc + p * (t_pow * coeff)) * s;
        }
        P::projection(acc + h[n] * (t_pow * t))
    }

    /// Evaluate with weighted de Casteljau.
    pub fn de_casteljau(&self, t: f64) -> P {
        P::projection(self.to_bezier().de_casteljau(t))
    }

    /// Power-basis coefficients `a_j` of the homogeneous numerator and weight,
    /// so that the homogeneous curve equals `sum a_j t^j`.
    pub fn to_polynomial_form(&self) -> [P::Hom; N] {
        let h = self.weighted_points();
        let n = N - 1;
        std::array::from_fn(|j| {
            let mut a = P::Hom::ZERO;
            for (i, &p) in h.iter().enumerate().take(j + 1) {
                let sign = if (j - i) % 2 == 0 { 1.0 } else { -1.0 };
                a += p * (sign * binomial(j, i));
            }
            a * binomial(n, j)
        })
    }

    pub fn split(&self, t: f64) -> (Self, Self) {
        let (a, b) = self.to_bezier().split(t);
        (Self::from_bezier(&a), Self::from_bezier(&b))
    }
}

impl<P: Point> RationalBezierCurve<P, 3> {
    /// Quadratic conic arc; `weight` < 1 gives an ellipse, 1 a parabola,
    /// > 1 a hyperbola.
    pub fn conic(start: P, control: P, end: P, weight: f64) -> Self {
        Self::new([start, control, end], [1.0, weight, 1.0])
    }

    /// Exact quarter circle around `center` from direction `u` to direction `v`.
    /// `u` and `v` must be orthonormal.
    pub fn quarter_circle(center: P, u: P, v: P, radius: f64) -> Self {
        Self::conic(
            center + u * radius,
            center + (u + v) * radius,
            center + v * radius,
            std::f64::consts::FRAC_1_SQRT_2,
        )
    }
}

impl<P: Point, const N: usize> ParamCurve<P> for RationalBezierCurve<P, N> {
    fn position(&self, t: f64) -> P {
        self.de_casteljau(t)
    }

    fn tangent(&self, t: f64) -> P {
        let [h, d1, d2] = self.to_bezier().homogeneous_derivatives(t);
        rational_derivatives::<P>(h, d1, d2).1
    }

    fn second_derivative(&self, t: f64) -> P {
        let [h, d1, d2] = self.to_bezier().homogeneous_derivatives(t);
        rational_derivatives::<P>(h, d1, d2).2
    }

    fn param_range(&self) -> (f64, f64) {
        (0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sgk_math::{dvec2, dvec3, DVec2, DVec3};

    fn unit_quarter() -> RationalBezierCurve<DVec2, 3> {
        RationalBezierCurve::quarter_circle(DVec2::ZERO, dvec2(1.0, 0.0), dvec2(0.0, 1.0), 1.0)
    }

    #[test]
    fn test_quarter_circle_is_exact() {
        let arc = unit_quarter();
        for i in 0..=20 {
            let t = i as f64 / 20.0;
            assert_relative_eq!(arc.position(t).length(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(arc.curvature(t), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_horner_matches_de_casteljau() {
        let c = RationalBezierCurve::<DVec3, 4>::new(
            [
                dvec3(0.0, 0.0, 0.0),
                dvec3(1.0, 2.0, 0.0),
                dvec3(3.0, 2.0, 1.0),
                dvec3(4.0, 0.0, 2.0),
            ],
            [1.0, 0.5, 2.0, 1.0],
        );
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            assert!((c.horner(t) - c.de_casteljau(t)).length() < 1e-12);
        }
    }

    #[test]
    fn test_weight_pulls_toward_control_point() {
        let base = RationalBezierCurve::conic(dvec2(0.0, 0.0), dvec2(1.0, 1.0), dvec2(2.0, 0.0), 1.0);
        let heavy = RationalBezierCurve::conic(dvec2(0.0, 0.0), dvec2(1.0, 1.0), dvec2(2.0, 0.0), 4.0);
        assert!(heavy.position(0.5).y > base.position(0.5).y);
        assert_eq!(heavy.position(0.0), dvec2(0.0, 0.0));
        assert!((heavy.position(1.0) - dvec2(2.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_polynomial_form_evaluates_to_curve() {
        let arc = unit_quarter();
        let coeffs = arc.to_polynomial_form();
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let h = coeffs[0] + coeffs[1] * t + coeffs[2] * (t * t);
            let p = DVec2::projection(h);
            assert!((p - arc.position(t)).length() < 1e-12);
        }
    }

    #[test]
    fn test_split_preserves_weights_shape() {
        let arc = unit_quarter();
        let (a, b) = arc.split(0.5);
        assert_relative_eq!(a.position(0.3).length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(b.position(0.7).length(), 1.0, epsilon = 1e-12);
    }
}
