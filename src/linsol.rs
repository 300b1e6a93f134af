use nalgebra::{DMatrix, DVector};

use crate::LinearSolver;

/// Dense Cholesky factorization `A = L L'`.
pub struct CholeskySolver {
    /// Pivots `L[j,j]^2` smaller than this fraction of the largest
    /// diagonal entry are treated as zero.
    pub pivot_tol: f64,
}

impl LinearSolver for CholeskySolver {
    fn solve(&self, a: &DMatrix<f64>, b: &mut DVector<f64>) -> Result<(), String> {
        if !a.is_square() || a.nrows() != b.len() {
            return Err(format!(
                "expected {0}x{0} system, got {1}x{2}",
                b.len(),
                a.nrows(),
                a.ncols()
            ));
        }
        let tol = self.pivot_tol * a.diagonal().amax().max(1.0);

        let chol = a
            .clone()
            .cholesky()
            .ok_or_else(|| "matrix is not positive definite".to_string())?;
        for (j, &d) in chol.l_dirty().diagonal().iter().enumerate() {
            if d.is_nan() || d * d <= tol {
                return Err(format!("matrix is singular at pivot {} ({:e})", j, d * d));
            }
        }
        chol.solve_mut(b);
        Ok(())
    }
}

impl Default for CholeskySolver {
    fn default() -> Self {
        Self { pivot_tol: 1e-10 }
    }
}
