//! Fixed-size vectors and the homogeneous `Dim -> Dim+1` lift used by every
//! curve type.
//!
//! A point of dimension `Dim` is lifted to `Dim+1` coordinates whose last
//! component is a weight. Dividing the first `Dim` coordinates by the weight
//! projects back. A weight of (nearly) zero marks a point at infinity: the
//! coordinates pass through unscaled in both directions, which is what makes
//! the hodograph of a polynomial curve evaluate to a plain direction vector.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub, SubAssign};

use glam::{DVec2, DVec3, DVec4};
use sgk_core::is_nearly_zero;

/// Common operations over glam's double-precision vectors.
pub trait Vector:
    Copy
    + Debug
    + PartialEq
    + Default
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + Index<usize, Output = f64>
    + IndexMut<usize>
{
    const DIM: usize;
    const ZERO: Self;

    fn splat(v: f64) -> Self;
    fn dot(self, rhs: Self) -> f64;
    fn min(self, rhs: Self) -> Self;
    fn max(self, rhs: Self) -> Self;

    fn length_squared(self) -> f64 {
        self.dot(self)
    }

    fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    fn distance_squared(self, rhs: Self) -> f64 {
        (self - rhs).length_squared()
    }

    fn lerp(self, rhs: Self, t: f64) -> Self {
        self + (rhs - self) * t
    }

    /// Normalized copy, or zero if the length is nearly zero.
    fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if is_nearly_zero(len) {
            Self::ZERO
        } else {
            self / len
        }
    }
}

macro_rules! impl_vector {
    ($ty:ty, $dim:expr) => {
        impl Vector for $ty {
            const DIM: usize = $dim;
            const ZERO: Self = <$ty>::ZERO;

            fn splat(v: f64) -> Self {
                <$ty>::splat(v)
            }

            fn dot(self, rhs: Self) -> f64 {
                <$ty>::dot(self, rhs)
            }

            fn min(self, rhs: Self) -> Self {
                <$ty>::min(self, rhs)
            }

            fn max(self, rhs: Self) -> Self {
                <$ty>::max(self, rhs)
            }
        }
    };
}

impl_vector!(DVec2, 2);
impl_vector!(DVec3, 3);
impl_vector!(DVec4, 4);

/// A `Dim`-dimensional point with a `Dim+1` homogeneous form.
pub trait Point: Vector {
    type Hom: Vector;

    /// Append `weight` without scaling the coordinates.
    fn extend(self, weight: f64) -> Self::Hom;

    /// Split a homogeneous vector into its first `Dim` coordinates and weight.
    fn truncate(h: Self::Hom) -> (Self, f64);

    /// Lift to `Dim+1`, scaling coordinates by `weight` unless it is nearly zero.
    fn homogeneous(self, weight: f64) -> Self::Hom {
        if is_nearly_zero(weight) {
            self.extend(weight)
        } else {
            (self * weight).extend(weight)
        }
    }

    /// Lift with unit weight.
    fn lift(self) -> Self::Hom {
        self.extend(1.0)
    }

    /// Project to `Dim`, dividing by the weight unless it is nearly zero.
    fn projection(h: Self::Hom) -> Self {
        let (p, w) = Self::truncate(h);
        if is_nearly_zero(w) {
            p
        } else {
            p / w
        }
    }

    fn weight(h: Self::Hom) -> f64 {
        h[Self::DIM]
    }
}

impl Point for DVec2 {
    type Hom = DVec3;

    fn extend(self, weight: f64) -> DVec3 {
        DVec2::extend(self, weight)
    }

    fn truncate(h: DVec3) -> (Self, f64) {
        (h.truncate(), h.z)
    }
}

impl Point for DVec3 {
    type Hom = DVec4;

    fn extend(self, weight: f64) -> DVec4 {
        DVec3::extend(self, weight)
    }

    fn truncate(h: DVec4) -> (Self, f64) {
        (h.truncate(), h.w)
    }
}

/// Renormalize a homogeneous vector in place so its weight becomes one.
/// Points at infinity are left untouched.
pub fn weight_to_one<P: Point>(h: &mut P::Hom) {
    let w = P::weight(*h);
    if !is_nearly_zero(w) {
        *h = *h / w;
    }
}

/// Project a homogeneous value and its first two derivatives.
///
/// Applies the quotient rule to `C = N / w`. When the weight is nearly zero
/// the inputs are treated as directions and passed through unscaled.
pub fn rational_derivatives<P: Point>(value: P::Hom, d1: P::Hom, d2: P::Hom) -> (P, P, P) {
    let (n0, w0) = P::truncate(value);
    let (n1, w1) = P::truncate(d1);
    let (n2, w2) = P::truncate(d2);
    if is_nearly_zero(w0) {
        return (n0, n1, n2);
    }
    let c0 = n0 / w0;
    let c1 = (n1 - c0 * w1) / w0;
    let c2 = (n2 - c1 * (2.0 * w1) - c0 * w2) / w0;
    (c0, c1, c2)
}

/// Generalized curvature `|dp x ddp| / |dp|^3`.
///
/// The cross product magnitude is generalized to any dimension by summing the
/// squared determinants of every axis pair. Returns 0 when `|dp|` is nearly zero.
pub fn curvature<V: Vector>(dp: V, ddp: V) -> f64 {
    let speed = dp.length();
    if is_nearly_zero(speed) {
        return 0.0;
    }
    let mut cross_sqr = 0.0;
    for i in 0..V::DIM {
        for j in (i + 1)..V::DIM {
            let det = dp[i] * ddp[j] - dp[j] * ddp[i];
            cross_sqr += det * det;
        }
    }
    cross_sqr.sqrt() / (speed * speed * speed)
}

/// Signed curvature restricted to the coordinate plane orthogonal to `axis`.
///
/// In 2D the only plane is `(x, y)` and `axis` is ignored.
pub fn principal_curvature<V: Vector>(dp: V, ddp: V, axis: usize) -> f64 {
    let speed = dp.length();
    if is_nearly_zero(speed) {
        return 0.0;
    }
    let (i, j) = if V::DIM < 3 {
        (0, 1)
    } else {
        ((axis + 1) % V::DIM, (axis + 2) % V::DIM)
    };
    (dp[i] * ddp[j] - dp[j] * ddp[i]) / (speed * speed * speed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::{dvec2, dvec3};

    #[test]
    fn test_homogeneous_projection_roundtrip() {
        let p = dvec3(1.0, -2.0, 3.5);
        let h = p.homogeneous(2.0);
        assert_eq!(h, DVec4::new(2.0, -4.0, 7.0, 2.0));
        assert_eq!(DVec3::projection(h), p);
    }

    #[test]
    fn test_zero_weight_passes_through() {
        let p = dvec2(3.0, 4.0);
        let h = p.homogeneous(0.0);
        assert_eq!(h, DVec3::new(3.0, 4.0, 0.0));
        assert_eq!(DVec2::projection(h), p);
    }

    #[test]
    fn test_weight_to_one() {
        let mut h = DVec3::new(2.0, 4.0, 2.0);
        weight_to_one::<DVec2>(&mut h);
        assert_eq!(h, DVec3::new(1.0, 2.0, 1.0));
    }

    #[test]
    fn test_rational_derivatives_unit_weight() {
        let (c0, c1, c2) = rational_derivatives::<DVec2>(
            DVec3::new(1.0, 2.0, 1.0),
            DVec3::new(3.0, 0.0, 0.0),
            DVec3::new(0.0, -1.0, 0.0),
        );
        assert_eq!(c0, dvec2(1.0, 2.0));
        assert_eq!(c1, dvec2(3.0, 0.0));
        assert_eq!(c2, dvec2(0.0, -1.0));
    }

    #[test]
    fn test_circle_curvature() {
        // Unit-speed parametrization of a circle of radius 2 at t = 0.
        let dp = dvec2(0.0, 1.0);
        let ddp = dvec2(-0.5, 0.0);
        assert_relative_eq!(curvature(dp, ddp), 0.5, epsilon = 1e-12);
        assert_relative_eq!(principal_curvature(dp, ddp, 2), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_curvature_3d_matches_cross_product() {
        let dp = dvec3(1.0, 2.0, 0.5);
        let ddp = dvec3(-0.3, 0.1, 2.0);
        let expected = dp.cross(ddp).length() / dp.length().powi(3);
        assert_relative_eq!(curvature(dp, ddp), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_principal_curvature_sign() {
        let dp = dvec3(1.0, 0.0, 0.0);
        let ddp = dvec3(0.0, -1.0, 0.0);
        assert!(principal_curvature(dp, ddp, 2) < 0.0);
        assert_eq!(principal_curvature(dp, ddp, 1), 0.0);
    }

    #[test]
    fn test_degenerate_tangent_has_zero_curvature() {
        assert_eq!(curvature(DVec3::ZERO, dvec3(1.0, 0.0, 0.0)), 0.0);
    }
}
