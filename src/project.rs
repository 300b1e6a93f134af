use nalgebra::{DMatrix, DVector};

use crate::active::ActiveSet;
use crate::constraint::ConstraintSet;
use crate::error::{Error, Result};
use crate::traits::LinearSolver;

/// Orthogonal projection onto the null space of the active normals.
pub struct Projector<'a> {
    constraints: &'a ConstraintSet,
    solver: &'a dyn LinearSolver,
}

impl<'a> Projector<'a> {
    pub fn new(constraints: &'a ConstraintSet, solver: &'a dyn LinearSolver) -> Self {
        Self {
            constraints,
            solver,
        }
    }

    /// Returns `p = v - A'λ` and `λ`, where `A` stacks the active normals
    /// and `(A A') λ = A v`. Every active normal is orthogonal to `p`.
    ///
    /// For a gradient `v`, `λ` are the least-squares Lagrange multipliers,
    /// aligned with `active.rows()`.
    pub fn project(&self, v: &[f64], active: &ActiveSet) -> Result<(Vec<f64>, Vec<f64>)> {
        let rows = active.rows();
        if rows.is_empty() {
            return Ok((v.to_vec(), Vec::new()));
        }
        let a = DMatrix::from_fn(rows.len(), self.constraints.dim(), |r, c| {
            self.constraints.row(rows[r])[c]
        });
        let v = DVector::from_column_slice(v);

        let gram = &a * a.transpose();
        let mut lam = &a * &v;

        let degenerate = || Error::DegenerateActiveSet { rows: rows.clone() };
        self.solver.solve(&gram, &mut lam).map_err(|_| degenerate())?;
        if lam.iter().any(|l| !l.is_finite()) {
            return Err(degenerate());
        }

        let p = &v - a.tr_mul(&lam);

        // A dependent row that slipped past the solver leaves a residual.
        if (&a * &p).amax() > 1e-8 * (1.0 + v.amax()) {
            return Err(degenerate());
        }
        Ok((p.as_slice().to_vec(), lam.as_slice().to_vec()))
    }
}
