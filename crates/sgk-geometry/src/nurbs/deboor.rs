//! De Boor evaluation, Boehm knot insertion, knot removal and subdivision.
//!
//! All routines work on a full (clamped) knot vector `knots` of length
//! `points.len() + degree + 1` and on any vector type, so homogeneous control
//! points are handled by the caller projecting the result.

use sgk_core::is_nearly_zero;
use sgk_math::Vector;

use super::knot::find_span;

fn ratio(num: f64, denom: f64) -> f64 {
    if is_nearly_zero(denom) {
        0.0
    } else {
        num / denom
    }
}

/// Triangular de Boor recurrence over the `degree + 1` points active in `span`.
pub fn de_boor_local<V: Vector>(degree: usize, knots: &[f64], window: &[V], span: usize, t: f64) -> V {
    let p = degree;
    let mut d = window.to_vec();
    for r in 1..=p {
        for j in (r..=p).rev() {
            let lo = knots[j + span - p];
            let hi = knots[j + 1 + span - r];
            let alpha = ratio(t - lo, hi - lo);
            d[j] = d[j - 1] * (1.0 - alpha) + d[j] * alpha;
        }
    }
    d[p]
}

/// Evaluate a B-spline point at `t`.
pub fn curve_point<V: Vector>(degree: usize, knots: &[f64], points: &[V], t: f64) -> V {
    curve_derivatives(degree, knots, points, t)[0]
}

/// Value, first and second derivative at `t`.
///
/// Derivatives run the same recurrence one degree lower over the scaled
/// differences `p (P[i+1] - P[i]) / (u[i+p+1] - u[i+1])` of the local window.
pub fn curve_derivatives<V: Vector>(degree: usize, knots: &[f64], points: &[V], t: f64) -> [V; 3] {
    let mut out = [V::ZERO; 3];
    let Some(n) = points.len().checked_sub(1) else {
        return out;
    };
    if n < degree {
        out[0] = points[0];
        return out;
    }

    let k = find_span(degree, knots, n, t);
    let mut window: Vec<V> = points[k - degree..=k].to_vec();
    let mut p = degree;
    let mut u = knots;
    let mut span = k;
    for slot in out.iter_mut() {
        *slot = de_boor_local(p, u, &window, span, t);
        if p == 0 {
            break;
        }
        window = (0..p)
            .map(|j| {
                let denom = u[span + j + 1] - u[span + j + 1 - p];
                (window[j + 1] - window[j]) * ratio(p as f64, denom)
            })
            .collect();
        p -= 1;
        u = &u[1..];
        span -= 1;
    }
    out
}

/// Boehm insertion of a single knot `t`.
///
/// Returns the span `k` that contained `t` and the new control points: points
/// `k - degree + 1 ..= k` are convex combinations of their old neighbours, the
/// rest shift unchanged. The curve is geometrically identical afterwards.
pub fn insert_knot<V: Vector>(degree: usize, knots: &[f64], points: &[V], t: f64) -> (usize, Vec<V>) {
    let p = degree;
    let n = points.len() - 1;
    let k = find_span(p, knots, n, t);
    let mut out = Vec::with_capacity(points.len() + 1);
    out.extend_from_slice(&points[..=k - p]);
    for i in (k - p + 1)..=k {
        let alpha = ratio(t - knots[i], knots[i + p] - knots[i]);
        out.push(points[i - 1] * (1.0 - alpha) + points[i] * alpha);
    }
    out.extend_from_slice(&points[k..]);
    (k, out)
}

/// Remove one occurrence of the interior knot at `knots[r]` (the last index
/// holding that value, multiplicity `s`) if the curve stays within `tol`.
///
/// Returns the index of the dropped control point together with the reduced
/// control points, or `None` if the knot is not removable.
pub fn remove_knot<V: Vector>(
    degree: usize,
    knots: &[f64],
    points: &[V],
    r: usize,
    s: usize,
    tol: f64,
) -> Option<(usize, Vec<V>)> {
    let p = degree;
    if r <= p || s == 0 || s > p || r + 1 >= knots.len() - p {
        return None;
    }
    let u = knots[r];
    let first = r - p;
    let last = r - s;
    let off = first - 1;
    let fout = (2 * r - s - p) / 2;

    let mut temp = vec![V::ZERO; 2 * p + 3];
    temp[0] = points[off];
    temp[last + 1 - off] = points[last + 1];

    let (mut i, mut j) = (first, last);
    let (mut ii, mut jj) = (1, last - off);
    while j > i {
        let alfi = ratio(u - knots[i], knots[i + p + 1] - knots[i]);
        let alfj = ratio(u - knots[j], knots[j + p + 1] - knots[j]);
        if is_nearly_zero(alfi) || is_nearly_zero(1.0 - alfj) {
            return None;
        }
        temp[ii] = (points[i] - temp[ii - 1] * (1.0 - alfi)) / alfi;
        temp[jj] = (points[j] - temp[jj + 1] * alfj) / (1.0 - alfj);
        i += 1;
        ii += 1;
        j -= 1;
        jj -= 1;
    }

    let removable = if j < i {
        temp[ii - 1].distance_squared(temp[jj + 1]) <= tol * tol
    } else {
        let alfi = ratio(u - knots[i], knots[i + p + 1] - knots[i]);
        let blended = temp[ii + 1] * alfi + temp[ii - 1] * (1.0 - alfi);
        points[i].distance_squared(blended) <= tol * tol
    };
    if !removable {
        return None;
    }

    let mut out = points.to_vec();
    let (mut i, mut j) = (first, last);
    while j > i {
        out[i] = temp[i - off];
        out[j] = temp[j - off];
        i += 1;
        j -= 1;
    }
    out.remove(fout);
    Some((fout, out))
}

/// Subdivide at interior parameter `t` by capturing the edges of the de Boor
/// triangle.
///
/// `s` is the multiplicity `t` already has in the knot vector. The first list
/// holds the control points of the part before `t`, the second those after;
/// both contain the curve point at `t`.
pub fn split_points<V: Vector>(
    degree: usize,
    knots: &[f64],
    points: &[V],
    t: f64,
    s: usize,
) -> (Vec<V>, Vec<V>) {
    let p = degree;
    let n = points.len() - 1;
    let k = find_span(p, knots, n, t);
    let s = s.min(p);
    let h = p - s;

    let mut d: Vec<V> = points[k - p..=k - s].to_vec();
    let mut left_edges = Vec::with_capacity(h);
    let mut right_edges = Vec::with_capacity(h);
    for r in 1..=h {
        for m in (r..=h).rev() {
            let lo = knots[k - p + m];
            let hi = knots[k + m + 1 - r];
            let alpha = ratio(t - lo, hi - lo);
            d[m] = d[m - 1] * (1.0 - alpha) + d[m] * alpha;
        }
        left_edges.push(d[r]);
        right_edges.push(d[h]);
    }

    let mut first = points[..=k - p].to_vec();
    first.extend(left_edges);
    let mut second: Vec<V> = right_edges.into_iter().rev().collect();
    second.extend_from_slice(&points[k - s..]);
    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nurbs::knot::{basis_functions, clamped_knot_vector};
    use sgk_math::{dvec3, DVec3};

    fn sample() -> (Vec<f64>, Vec<DVec3>) {
        let knots = clamped_knot_vector(3, &[0.0, 1.0, 2.5, 3.0, 4.5]);
        let points = vec![
            dvec3(0.0, 0.0, 1.0),
            dvec3(1.0, 2.0, 1.0),
            dvec3(2.0, -1.0, 1.0),
            dvec3(3.5, 0.5, 1.0),
            dvec3(4.0, 3.0, 1.0),
            dvec3(5.0, 1.0, 1.0),
            dvec3(6.5, -2.0, 1.0),
        ];
        (knots, points)
    }

    fn params() -> impl Iterator<Item = f64> {
        (0..=45).map(|i| i as f64 * 0.1)
    }

    #[test]
    fn test_curve_point_linear() {
        let degree = 1;
        let knots = vec![0.0, 0.0, 1.0, 2.0, 2.0];
        let cps = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
        ];

        let p = curve_point(degree, &knots, &cps, 0.5);
        assert!((p.x - 0.5).abs() < 1e-10);
        assert!(p.y.abs() < 1e-10);

        let p = curve_point(degree, &knots, &cps, 1.5);
        assert!((p.x - 1.0).abs() < 1e-10);
        assert!((p.y - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_de_boor_matches_basis_functions() {
        let (knots, points) = sample();
        let n = points.len() - 1;
        for t in params() {
            let span = find_span(3, &knots, n, t);
            let basis = basis_functions(3, &knots, span, t);
            let mut expected = DVec3::ZERO;
            for (i, b) in basis.iter().enumerate() {
                expected += points[span - 3 + i] * *b;
            }
            let got = curve_point(3, &knots, &points, t);
            assert!((got - expected).length() < 1e-10, "t={}", t);
        }
    }

    #[test]
    fn test_derivatives_match_finite_differences() {
        let (knots, points) = sample();
        let e = 1e-6;
        for &t in &[0.2, 1.7, 2.7, 3.9] {
            let [_, d1, d2] = curve_derivatives(3, &knots, &points, t);
            let fd1 = (curve_point(3, &knots, &points, t + e) - curve_point(3, &knots, &points, t - e))
                / (2.0 * e);
            let fd2 = (curve_derivatives(3, &knots, &points, t + e)[1]
                - curve_derivatives(3, &knots, &points, t - e)[1])
                / (2.0 * e);
            assert!((d1 - fd1).length() < 1e-6);
            assert!((d2 - fd2).length() < 1e-5);
        }
    }

    #[test]
    fn test_insert_then_remove_restores_points() {
        let (knots, points) = sample();
        let (_, inserted) = insert_knot(3, &knots, &points, 2.7);
        let mut new_knots = knots.clone();
        let pos = new_knots.iter().position(|&k| k > 2.7).unwrap();
        new_knots.insert(pos, 2.7);
        for t in params() {
            let a = curve_point(3, &knots, &points, t);
            let b = curve_point(3, &new_knots, &inserted, t);
            assert!((a - b).length() < 1e-12);
        }

        let (_, removed) = remove_knot(3, &new_knots, &inserted, pos, 1, 1e-9).unwrap();
        assert_eq!(removed.len(), points.len());
        for (a, b) in removed.iter().zip(&points) {
            assert!((*a - *b).length() < 1e-9);
        }
    }

    #[test]
    fn test_essential_knot_is_not_removable() {
        let (knots, points) = sample();
        let r = knots.iter().rposition(|&k| k == 2.5).unwrap();
        assert!(remove_knot(3, &knots, &points, r, 1, 1e-9).is_none());
    }

    #[test]
    fn test_split_points_at_new_and_existing_knot() {
        let (knots, points) = sample();
        for &(t, s) in &[(0.5, 0), (2.5, 1), (3.7, 0)] {
            let (first, second) = split_points(3, &knots, &points, t, s);
            assert_eq!(first.last(), second.first());
            let at = curve_point(3, &knots, &points, t);
            assert!((*first.last().unwrap() - at).length() < 1e-12);
            assert_eq!(first.len() + second.len(), points.len() + 3 - s + 1);
        }
    }
}
