//! Arc-length integration: 5-point Gauss-Legendre quadrature and Newton
//! inversion of the integral.

use sgk_core::is_nearly_zero;

/// `(weight, abscissa)` pairs of the 5-point Gauss-Legendre rule on `[-1, 1]`.
const GAUSS_LEGENDRE_5: [(f64, f64); 5] = [
    (0.568_888_888_888_888_9, 0.0),
    (0.478_628_670_499_366_5, -0.538_469_310_105_683_1),
    (0.478_628_670_499_366_5, 0.538_469_310_105_683_1),
    (0.236_926_885_056_189_1, -0.906_179_845_938_664_0),
    (0.236_926_885_056_189_1, 0.906_179_845_938_664_0),
];

/// Newton iteration budget used by arc-length queries.
pub const DEFAULT_NEWTON_ITERATIONS: usize = 10;

/// Integrates a scalar function (typically curve speed) over `[a, t]`.
///
/// Interior breakpoints split the interval into pieces on which the integrand
/// is smooth; the 5-point rule is applied to each piece.
pub struct GaussLegendre<F> {
    func: F,
    a: f64,
    b: f64,
    breaks: Vec<f64>,
}

impl<F: Fn(f64) -> f64> GaussLegendre<F> {
    pub fn new(func: F, a: f64, b: f64) -> Self {
        Self {
            func,
            a,
            b,
            breaks: Vec::new(),
        }
    }

    /// Add interior breakpoints. Values outside `(a, b)` are ignored.
    pub fn with_breakpoints(mut self, breaks: impl IntoIterator<Item = f64>) -> Self {
        let (a, b) = (self.a, self.b);
        self.breaks
            .extend(breaks.into_iter().filter(|&t| t > a && t < b));
        self.breaks.sort_by(|x, y| x.total_cmp(y));
        self.breaks.dedup();
        self
    }

    pub fn range(&self) -> (f64, f64) {
        (self.a, self.b)
    }

    /// Integral of the function over `[a, t]`, with `t` clamped to `[a, b]`.
    pub fn integrate(&self, t: f64) -> f64 {
        let t = t.clamp(self.a, self.b);
        let mut sum = 0.0;
        let mut lo = self.a;
        for &brk in &self.breaks {
            if brk >= t {
                break;
            }
            sum += self.integrate_piece(lo, brk);
            lo = brk;
        }
        sum + self.integrate_piece(lo, t)
    }

    pub fn total(&self) -> f64 {
        self.integrate(self.b)
    }

    /// Find `t` with `integrate(t) == s` by Newton's method.
    ///
    /// Seeded by linear interpolation of `s` over the total. The root stays
    /// bracketed; a Newton step that leaves the bracket, or a vanishing
    /// integrand, falls back to bisection.
    pub fn solve_from_integration(&self, s: f64, iterations: usize) -> f64 {
        let total = self.total();
        if is_nearly_zero(total) {
            return self.a;
        }
        let s = s.clamp(0.0, total);
        let (mut lo, mut hi) = (self.a, self.b);
        let mut t = self.a + (self.b - self.a) * s / total;
        for _ in 0..iterations {
            let err = self.integrate(t) - s;
            if err.abs() <= f64::EPSILON * total {
                break;
            }
            if err < 0.0 {
                lo = t;
            } else {
                hi = t;
            }
            let d = (self.func)(t);
            let step = if is_nearly_zero(d) { f64::NAN } else { t - err / d };
            t = if step > lo && step < hi {
                step
            } else {
                0.5 * (lo + hi)
            };
        }
        t
    }

    fn integrate_piece(&self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return 0.0;
        }
        let half = 0.5 * (hi - lo);
        let mid = 0.5 * (hi + lo);
        GAUSS_LEGENDRE_5
            .iter()
            .map(|&(w, x)| w * (self.func)(mid + half * x))
            .sum::<f64>()
            * half
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_for_degree_nine_polynomials() {
        let gl = GaussLegendre::new(|t: f64| t.powi(9) + 3.0 * t * t, 0.0, 2.0);
        let expected = 2.0_f64.powi(10) / 10.0 + 8.0;
        assert_relative_eq!(gl.total(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_breakpoints_handle_kinks() {
        let gl = GaussLegendre::new(|t: f64| (t - 1.0).abs(), 0.0, 3.0).with_breakpoints([1.0]);
        assert_relative_eq!(gl.total(), 0.5 + 2.0, epsilon = 1e-12);
        assert_relative_eq!(gl.integrate(2.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_inverts_integral() {
        let gl = GaussLegendre::new(|t: f64| 1.0 + t, 0.0, 2.0);
        for i in 0..=8 {
            let s = gl.total() * i as f64 / 8.0;
            let t = gl.solve_from_integration(s, DEFAULT_NEWTON_ITERATIONS);
            assert_relative_eq!(gl.integrate(t), s, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_solve_survives_overshooting_newton_steps() {
        // Speed nearly vanishes at the start, so the first Newton step from a
        // linear seed jumps far past the interval.
        let gl = GaussLegendre::new(|t: f64| 1e-3 + 40.0 * t * t * t, 0.0, 1.0);
        for i in 1..=9 {
            let s = gl.total() * i as f64 / 10.0;
            let t = gl.solve_from_integration(s, 40);
            assert!((0.0..=1.0).contains(&t));
            assert_relative_eq!(gl.integrate(t), s, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zero_integrand_returns_start() {
        let gl = GaussLegendre::new(|_t: f64| 0.0, 1.0, 2.0);
        assert_eq!(gl.solve_from_integration(0.5, 10), 1.0);
    }
}
