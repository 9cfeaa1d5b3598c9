//! Bezier curves over homogeneous control points.

use sgk_core::BoundingBox;
use sgk_math::{rational_derivatives, Bounds, Point, Vector};

use super::ParamCurve;

/// A Bezier curve with `N` homogeneous control points (degree `N - 1`).
///
/// Control points are stored in homogeneous form; with unit weights the curve
/// is an ordinary polynomial Bezier. The curve starts at `points[0]` for
/// `t = 0` and ends at `points[N - 1]` for `t = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierCurve<P: Point, const N: usize> {
    points: [P::Hom; N],
}

pub type QuadraticBezier<P> = BezierCurve<P, 3>;
pub type CubicBezier<P> = BezierCurve<P, 4>;

impl<P: Point, const N: usize> BezierCurve<P, N> {
    pub const DEGREE: usize = N - 1;

    /// Build from non-homogeneous points with unit weights.
    pub fn new(points: [P; N]) -> Self {
        Self {
            points: points.map(P::lift),
        }
    }

    pub fn from_homogeneous(points: [P::Hom; N]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[P::Hom; N] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [P::Hom; N] {
        &mut self.points
    }

    /// Control points projected to `Dim` space.
    pub fn ctrl_points(&self) -> [P; N] {
        self.points.map(P::projection)
    }

    pub fn ctrl_point(&self, i: usize) -> P {
        P::projection(self.points[i])
    }

    /// Replace a control point, keeping its weight.
    pub fn set_ctrl_point(&mut self, i: usize, p: P) {
        let w = P::weight(self.points[i]);
        self.points[i] = p.homogeneous(w);
    }

    pub fn start(&self) -> P {
        P::projection(self.points[0])
    }

    pub fn end(&self) -> P {
        P::projection(self.points[N - 1])
    }

    /// Homogeneous de Casteljau reduction at `t`.
    pub fn de_casteljau(&self, t: f64) -> P::Hom {
        let mut tmp = self.points;
        for r in 1..N {
            for i in 0..N - r {
                tmp[i] = tmp[i].lerp(tmp[i + 1], t);
            }
        }
        tmp[0]
    }

    /// Evaluate by the triangular de Casteljau reduction.
    pub fn position_iteratively(&self, t: f64) -> P {
        P::projection(self.de_casteljau(t))
    }

    /// Evaluate by the explicit Bernstein polynomial sum.
    pub fn position_directly(&self, t: f64) -> P {
        let n = Self::DEGREE;
        let s = 1.0 - t;
        let mut sum = P::Hom::ZERO;
        for (i, &p) in self.points.iter().enumerate() {
            let basis = binomial(n, i) * s.powi((n - i) as i32) * t.powi(i as i32);
            sum += p * basis;
        }
        P::projection(sum)
    }

    /// Homogeneous value and first two derivatives, read off the de Casteljau
    /// triangle.
    pub fn homogeneous_derivatives(&self, t: f64) -> [P::Hom; 3] {
        let n = Self::DEGREE as f64;
        let mut tmp = self.points;
        let mut d1 = P::Hom::ZERO;
        let mut d2 = P::Hom::ZERO;
        for r in 1..N {
            match N - r + 1 {
                3 => d2 = (tmp[2] - tmp[1] * 2.0 + tmp[0]) * (n * (n - 1.0)),
                2 => d1 = (tmp[1] - tmp[0]) * n,
                _ => {}
            }
            for i in 0..N - r {
                tmp[i] = tmp[i].lerp(tmp[i + 1], t);
            }
        }
        [tmp[0], d1, d2]
    }

    /// Subdivide at `t`: the first curve covers `[0, t]`, the second `[t, 1]`,
    /// each reparametrized to `[0, 1]`.
    pub fn split(&self, t: f64) -> (Self, Self) {
        let mut tmp = self.points;
        let mut left = self.points;
        let mut right = self.points;
        for r in 1..N {
            for i in 0..N - r {
                tmp[i] = tmp[i].lerp(tmp[i + 1], t);
            }
            left[r] = tmp[0];
            right[N - 1 - r] = tmp[N - 1 - r];
        }
        (Self { points: left }, Self { points: right })
    }

    /// Derivative curve, one degree lower.
    ///
    /// Points are `Degree * (P[i+1] - P[i])` in homogeneous form. For unit
    /// weights the resulting weights are zero and the hodograph evaluates
    /// directly to the tangent vector.
    pub fn create_hodograph<const M: usize>(&self) -> BezierCurve<P, M> {
        const { assert!(M + 1 == N, "hodograph must have one control point fewer") };
        let n = Self::DEGREE as f64;
        BezierCurve {
            points: std::array::from_fn(|i| (self.points[i + 1] - self.points[i]) * n),
        }
    }

    /// Degree elevation: the same curve expressed with one more control point.
    pub fn elevate_from<const M: usize>(lower: &BezierCurve<P, M>) -> Self {
        const { assert!(M + 1 == N, "elevation adds exactly one control point") };
        let m = M as f64;
        let points = std::array::from_fn(|i| {
            let a = i as f64 / m;
            let mut p = P::Hom::ZERO;
            if i > 0 {
                p += lower.points[i - 1] * a;
            }
            if i < M {
                p += lower.points[i] * (1.0 - a);
            }
            p
        });
        Self { points }
    }

    /// Same curve traversed from end to start.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    pub fn reversed(&self) -> Self {
        let mut c = *self;
        c.reverse();
        c
    }
}

impl<P: Point, const N: usize> ParamCurve<P> for BezierCurve<P, N> {
    fn position(&self, t: f64) -> P {
        self.position_iteratively(t)
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
        (0.0, 1.0)
    }
}

impl<P: Point, const N: usize> BoundingBox for BezierCurve<P, N> {
    type Point = P;

    /// Bounds of the control polygon, which contain the curve.
    fn bounding_box(&self) -> (P, P) {
        match Bounds::from_points(&self.ctrl_points()) {
            Some(b) => (b.min, b.max),
            None => (P::ZERO, P::ZERO),
        }
    }
}

pub(crate) fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sgk_math::{dvec2, dvec3, DVec2, DVec3};

    fn arch() -> CubicBezier<DVec2> {
        CubicBezier::new([
            dvec2(0.0, 0.0),
            dvec2(1.0, 1.0),
            dvec2(2.0, 1.0),
            dvec2(3.0, 0.0),
        ])
    }

    fn close2(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < 1e-10
    }

    #[test]
    fn test_endpoints_interpolate() {
        let c = arch();
        assert!(close2(c.position(0.0), dvec2(0.0, 0.0)));
        assert!(close2(c.position(1.0), dvec2(3.0, 0.0)));
        assert!(close2(c.position(0.5), dvec2(1.5, 0.75)));
    }

    #[test]
    fn test_casteljau_matches_bernstein_2d() {
        let c = arch();
        for i in 0..=20 {
            let t = i as f64 / 20.0;
            assert!(close2(c.position_directly(t), c.position_iteratively(t)));
        }
    }

    #[test]
    fn test_casteljau_matches_bernstein_3d_weighted() {
        let mut c = CubicBezier::<DVec3>::new([
            dvec3(0.0, 0.0, 0.0),
            dvec3(1.0, 2.0, -1.0),
            dvec3(2.0, -1.0, 3.0),
            dvec3(4.0, 0.5, 1.0),
        ]);
        c.points_mut()[1] = dvec3(1.0, 2.0, -1.0).homogeneous(2.5);
        for i in 0..=20 {
            let t = i as f64 / 20.0;
            let a = c.position_directly(t);
            let b = c.position_iteratively(t);
            assert!((a - b).length() < 1e-10, "mismatch at t={}: {:?} vs {:?}", t, a, b);
        }
    }

    #[test]
    fn test_split_reproduces_curve() {
        let c = arch();
        let t = 0.3;
        let (first, second) = c.split(t);
        assert!(close2(first.end(), c.position(t)));
        assert!(close2(second.start(), c.position(t)));
        for i in 0..=10 {
            let u = i as f64 / 10.0;
            assert!(close2(first.position(u), c.position(u * t)));
            assert!(close2(second.position(u), c.position(t + u * (1.0 - t))));
        }
    }

    #[test]
    fn test_hodograph_is_tangent() {
        let c = arch();
        let h: QuadraticBezier<DVec2> = c.create_hodograph();
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            assert!(close2(h.position(t), c.tangent(t)));
        }
        assert!(close2(c.tangent(0.0), dvec2(3.0, 3.0)));
    }

    #[test]
    fn test_elevation_keeps_shape() {
        let q = QuadraticBezier::new([dvec2(0.0, 0.0), dvec2(1.0, 2.0), dvec2(2.0, 0.0)]);
        let c = CubicBezier::elevate_from(&q);
        assert!(close2(c.ctrl_point(1), dvec2(2.0 / 3.0, 4.0 / 3.0)));
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            assert!(close2(c.position(t), q.position(t)));
        }
    }

    #[test]
    fn test_curvature_of_parabola_apex() {
        // y = x^2 traced as a quadratic Bezier; curvature at the apex is 2.
        let q = QuadraticBezier::new([dvec2(-1.0, 1.0), dvec2(0.0, -1.0), dvec2(1.0, 1.0)]);
        assert_relative_eq!(q.curvature(0.5), 2.0, epsilon = 1e-10);
        assert_relative_eq!(q.principal_curvature(0.5, 2), 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_straight_line_length_and_inverse() {
        let c = CubicBezier::new([
            dvec2(0.0, 0.0),
            dvec2(0.5, 0.0),
            dvec2(2.0, 0.0),
            dvec2(4.0, 0.0),
        ]);
        assert_relative_eq!(c.total_length(), 4.0, epsilon = 1e-9);
        let t = c.parameter_at_length(1.0);
        assert_relative_eq!(c.position(t).x, 1.0, epsilon = 1e-7);
    }

    #[test]
    fn test_arc_length_inverse_round_trip() {
        let c = arch();
        let total = c.total_length();
        for i in 0..=10 {
            let s = total * i as f64 / 10.0;
            let t = c.parameter_at_length(s);
            assert_relative_eq!(c.length(t), s, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_find_param_by_position() {
        let c = arch();
        let target = c.position(0.37);
        let t = c.find_param_by_position(target, 1e-12).unwrap();
        assert_relative_eq!(t, 0.37, epsilon = 1e-6);
        assert!(c.find_param_by_position(dvec2(10.0, 10.0), 1e-4).is_none());
    }

    #[test]
    fn test_bounding_box_of_control_polygon() {
        let (min, max) = arch().bounding_box();
        assert_eq!(min, dvec2(0.0, 0.0));
        assert_eq!(max, dvec2(3.0, 1.0));
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(3, 0), 1.0);
        assert_eq!(binomial(3, 1), 3.0);
        assert_eq!(binomial(5, 2), 10.0);
    }
}
