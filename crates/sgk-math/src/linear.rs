//! Small dense linear systems solved by LU decomposition.

use nalgebra::DMatrix;
use sgk_core::{Result, SgkError};

/// A square system `A X = B` with one right-hand-side column per coordinate.
///
/// Built row by row and solved once; no state survives the solve.
#[derive(Debug, Clone)]
pub struct DenseSystem {
    matrix: DMatrix<f64>,
    rhs: DMatrix<f64>,
}

impl DenseSystem {
    pub fn new(size: usize, rhs_columns: usize) -> Self {
        Self {
            matrix: DMatrix::zeros(size, size),
            rhs: DMatrix::zeros(size, rhs_columns),
        }
    }

    pub fn size(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.matrix[(row, col)] = value;
    }

    pub fn set_rhs(&mut self, row: usize, col: usize, value: f64) {
        self.rhs[(row, col)] = value;
    }

    /// Solve with LU decomposition (partial pivoting).
    ///
    /// Returns an error if the matrix is singular or the solution is not finite.
    pub fn solve(self) -> Result<DMatrix<f64>> {
        let solution = self
            .matrix
            .lu()
            .solve(&self.rhs)
            .ok_or_else(|| SgkError::Geometry("singular linear system".into()))?;
        if solution.iter().all(|v| v.is_finite()) {
            Ok(solution)
        } else {
            Err(SgkError::Geometry("linear system has no finite solution".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_two_columns() {
        let mut sys = DenseSystem::new(2, 2);
        sys.set(0, 0, 2.0);
        sys.set(0, 1, 1.0);
        sys.set(1, 0, 1.0);
        sys.set(1, 1, 3.0);
        sys.set_rhs(0, 0, 3.0);
        sys.set_rhs(1, 0, 5.0);
        sys.set_rhs(0, 1, 1.0);
        sys.set_rhs(1, 1, -2.0);
        let x = sys.solve().unwrap();
        assert_relative_eq!(x[(0, 0)], 0.8, epsilon = 1e-12);
        assert_relative_eq!(x[(1, 0)], 1.4, epsilon = 1e-12);
        assert_relative_eq!(x[(0, 1)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[(1, 1)], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_system_is_reported() {
        let mut sys = DenseSystem::new(2, 1);
        sys.set(0, 0, 1.0);
        sys.set(0, 1, 2.0);
        sys.set(1, 0, 2.0);
        sys.set(1, 1, 4.0);
        sys.set_rhs(0, 0, 1.0);
        assert!(sys.solve().is_err());
    }
}
