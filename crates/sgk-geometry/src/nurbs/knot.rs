//! Knot vector utilities for clamped B-splines.

/// Expand clamped breakpoints into a full knot vector.
///
/// The first and last breakpoint are repeated `degree` more times so that both
/// ends carry multiplicity `degree + 1`.
pub fn clamped_knot_vector(degree: usize, breakpoints: &[f64]) -> Vec<f64> {
    let (Some(&first), Some(&last)) = (breakpoints.first(), breakpoints.last()) else {
        return Vec::new();
    };
    let mut knots = Vec::with_capacity(breakpoints.len() + 2 * degree);
    knots.extend(std::iter::repeat(first).take(degree));
    knots.extend_from_slice(breakpoints);
    knots.extend(std::iter::repeat(last).take(degree));
    knots
}

/// Number of knots equal to `t` within `tol`.
pub fn multiplicity(knots: &[f64], t: f64, tol: f64) -> usize {
    knots.iter().filter(|&&k| (k - t).abs() <= tol).count()
}

/// Index `k` in `degree..=n` with `knots[k] <= t < knots[k + 1]`, where `n`
/// is the last control point index. Parameters outside the range clamp to
/// the first or last span.
pub fn find_span(degree: usize, knots: &[f64], n: usize, t: f64) -> usize {
    let upper = knots[..=n + 1].partition_point(|&k| k <= t);
    upper.saturating_sub(1).clamp(degree, n)
}

/// The `degree + 1` blending functions that are non-zero on `span`, in
/// control point order. Used as an independent check of de Boor evaluation.
pub fn basis_functions(degree: usize, knots: &[f64], span: usize, t: f64) -> Vec<f64> {
    let mut basis = vec![0.0; degree + 1];
    basis[0] = 1.0;
    for j in 1..=degree {
        let mut carry = 0.0;
        for r in 0..j {
            let right = knots[span + r + 1] - t;
            let left = t - knots[span + 1 + r - j];
            let denom = right + left;
            let share = if denom.abs() <= f64::EPSILON {
                0.0
            } else {
                basis[r] / denom
            };
            basis[r] = carry + right * share;
            carry = left * share;
        }
        basis[j] = carry;
    }
    basis
}
