//! Connecting cubic Bezier curves with prescribed continuity.
//!
//! Each operation assembles a dense `4N x 4N` system over the control points
//! of `N` new cubics (one right-hand-side column per coordinate), solves it by
//! LU decomposition and repacks the solution into curves with unit weights.
//! Derivatives are matched in each curve's own `[0, 1]` parameter.

use std::marker::PhantomData;

use sgk_core::{Result, SgkError};
use sgk_math::{DenseSystem, Point};

use super::{CubicBezier, ParamCurve};

/// Row builder for a chain of `curves` cubic Beziers.
struct ChainSystem<P> {
    curves: usize,
    system: DenseSystem,
    row: usize,
    _point: PhantomData<P>,
}

impl<P: Point> ChainSystem<P> {
    fn new(curves: usize) -> Self {
        Self {
            curves,
            system: DenseSystem::new(4 * curves, P::DIM),
            row: 0,
            _point: PhantomData,
        }
    }

    fn last(&self) -> usize {
        4 * self.curves - 1
    }

    fn push_row(&mut self, coeffs: &[(usize, f64)], rhs: P) {
        for &(col, value) in coeffs {
            self.system.set(self.row, col, value);
        }
        for d in 0..P::DIM {
            self.system.set_rhs(self.row, d, rhs[d]);
        }
        self.row += 1;
    }

    /// The chain starts at the end of `curve` with matching derivatives up to
    /// `order`.
    fn match_start(&mut self, curve: &CubicBezier<P>, order: usize) {
        self.push_row(&[(0, 1.0)], curve.position(1.0));
        if order >= 1 {
            self.push_row(&[(1, 1.0), (0, -1.0)], curve.tangent(1.0) / 3.0);
        }
        if order >= 2 {
            self.push_row(
                &[(2, 1.0), (1, -2.0), (0, 1.0)],
                curve.second_derivative(1.0) / 6.0,
            );
        }
    }

    /// The chain ends at the start of `curve` with matching derivatives up to
    /// `order`.
    fn match_end(&mut self, curve: &CubicBezier<P>, order: usize) {
        let n = self.last();
        self.push_row(&[(n, 1.0)], curve.position(0.0));
        if order >= 1 {
            self.push_row(&[(n, 1.0), (n - 1, -1.0)], curve.tangent(0.0) / 3.0);
        }
        if order >= 2 {
            self.push_row(
                &[(n, 1.0), (n - 1, -2.0), (n - 2, 1.0)],
                curve.second_derivative(0.0) / 6.0,
            );
        }
    }

    fn end_at(&mut self, target: P) {
        let n = self.last();
        self.push_row(&[(n, 1.0)], target);
    }

    /// Continuity up to `order` at every junction inside the chain.
    fn interior_joints(&mut self, order: usize) {
        for k in 0..self.curves.saturating_sub(1) {
            let b = 4 * k;
            self.push_row(&[(b + 3, 1.0), (b + 4, -1.0)], P::ZERO);
            if order >= 1 {
                self.push_row(
                    &[(b + 3, 1.0), (b + 2, -1.0), (b + 5, -1.0), (b + 4, 1.0)],
                    P::ZERO,
                );
            }
            if order >= 2 {
                self.push_row(
                    &[
                        (b + 3, 1.0),
                        (b + 2, -2.0),
                        (b + 1, 1.0),
                        (b + 6, -1.0),
                        (b + 5, 2.0),
                        (b + 4, -1.0),
                    ],
                    P::ZERO,
                );
            }
        }
    }

    fn solve(self) -> Result<Vec<CubicBezier<P>>> {
        if self.row != self.system.size() {
            return Err(SgkError::InvalidOperation(format!(
                "connection system has {} rows for {} unknowns",
                self.row,
                self.system.size()
            )));
        }
        let x = self.system.solve()?;
        let curves = (0..self.curves)
            .map(|k| {
                CubicBezier::new(std::array::from_fn(|j| {
                    let mut p = P::ZERO;
                    for d in 0..P::DIM {
                        p[d] = x[(4 * k + j, d)];
                    }
                    p
                }))
            })
            .collect();
        Ok(curves)
    }
}

/// A cubic continuing `curve` with C2 continuity and ending at `target`.
pub fn connect_from_curve_to_point_c2<P: Point>(
    curve: &CubicBezier<P>,
    target: P,
) -> Result<CubicBezier<P>> {
    let mut sys = ChainSystem::new(1);
    sys.match_start(curve, 2);
    sys.end_at(target);
    let mut curves = sys.solve()?;
    curves
        .pop()
        .ok_or_else(|| SgkError::Geometry("connection produced no curve".into()))
}

/// Three cubics bridging the end of `first` to the start of `second`, C2 at
/// every junction.
pub fn connect_from_curve_to_curve_c2<P: Point>(
    first: &CubicBezier<P>,
    second: &CubicBezier<P>,
) -> Result<[CubicBezier<P>; 3]> {
    let mut sys = ChainSystem::new(3);
    sys.match_start(first, 2);
    sys.match_end(second, 2);
    sys.interior_joints(2);
    let curves = sys.solve()?;
    <[CubicBezier<P>; 3]>::try_from(curves)
        .map_err(|_| SgkError::Geometry("connection produced the wrong number of curves".into()))
}

/// One cubic bridging the end of `first` to the start of `second`, C1 at both
/// junctions.
pub fn connect_from_curve_to_curve_c1<P: Point>(
    first: &CubicBezier<P>,
    second: &CubicBezier<P>,
) -> Result<CubicBezier<P>> {
    let mut sys = ChainSystem::new(1);
    sys.match_start(first, 1);
    sys.match_end(second, 1);
    let mut curves = sys.solve()?;
    curves
        .pop()
        .ok_or_else(|| SgkError::Geometry("connection produced no curve".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sgk_math::{dvec2, dvec3, DVec2, DVec3};

    fn close<P: Point>(a: P, b: P) -> bool {
        (a - b).length() < 1e-9
    }

    fn arch() -> CubicBezier<DVec2> {
        CubicBezier::new([
            dvec2(0.0, 0.0),
            dvec2(1.0, 1.0),
            dvec2(2.0, 1.0),
            dvec2(3.0, 0.0),
        ])
    }

    #[test]
    fn test_curve_to_point_c2() {
        let curve = arch();
        let next = connect_from_curve_to_point_c2(&curve, dvec2(5.0, 0.0)).unwrap();
        assert!(close(next.ctrl_point(0), dvec2(3.0, 0.0)));
        assert!(close(next.ctrl_point(3), dvec2(5.0, 0.0)));
        assert!(close(next.tangent(0.0), curve.tangent(1.0)));
        assert!(close(next.second_derivative(0.0), curve.second_derivative(1.0)));
        // P1 = P0 + (A3 - A2), P2 = 2 P1 - P0 + (A3 - 2 A2 + A1)
        assert!(close(next.ctrl_point(1), dvec2(4.0, -1.0)));
        assert!(close(next.ctrl_point(2), dvec2(5.0, -3.0)));
    }

    #[test]
    fn test_curve_to_curve_c2_chain() {
        let first = arch();
        let second = CubicBezier::new([
            dvec2(8.0, 2.0),
            dvec2(9.0, 3.0),
            dvec2(10.0, 1.0),
            dvec2(12.0, 0.0),
        ]);
        let chain = connect_from_curve_to_curve_c2(&first, &second).unwrap();

        let mut all = vec![first];
        all.extend_from_slice(&chain);
        all.push(second);
        for pair in all.windows(2) {
            assert!(close(pair[0].position(1.0), pair[1].position(0.0)));
            assert!(close(pair[0].tangent(1.0), pair[1].tangent(0.0)));
            assert!(close(pair[0].second_derivative(1.0), pair[1].second_derivative(0.0)));
        }
    }

    #[test]
    fn test_curve_to_curve_c1_3d() {
        let first = CubicBezier::<DVec3>::new([
            dvec3(0.0, 0.0, 0.0),
            dvec3(1.0, 0.0, 1.0),
            dvec3(2.0, 1.0, 1.0),
            dvec3(3.0, 1.0, 0.0),
        ]);
        let second = CubicBezier::<DVec3>::new([
            dvec3(6.0, 0.0, 0.0),
            dvec3(7.0, -1.0, 0.0),
            dvec3(8.0, 0.0, 2.0),
            dvec3(9.0, 0.0, 0.0),
        ]);
        let bridge = connect_from_curve_to_curve_c1(&first, &second).unwrap();
        assert!(close(bridge.start(), first.end()));
        assert!(close(bridge.end(), second.start()));
        assert!(close(bridge.tangent(0.0), first.tangent(1.0)));
        assert!(close(bridge.tangent(1.0), second.tangent(0.0)));
    }
}
