use nalgebra::{DMatrix, DVector};

use crate::common::Iteration;

/// Objective function oracle. Returns the value and gradient at `x`.
pub trait ObjectiveFunction {
    fn f(&self, x: &[f64]) -> (f64, Vec<f64>);
}

impl<F> ObjectiveFunction for F
where
    F: Fn(&[f64]) -> (f64, Vec<f64>),
{
    fn f(&self, x: &[f64]) -> (f64, Vec<f64>) {
        self(x)
    }
}

/// Solves the dense symmetric positive definite system `A x = b`.
///
/// The solution overwrites `b`. Implementations must return an error
/// if the matrix is singular to working precision.
pub trait LinearSolver {
    fn solve(&self, a: &DMatrix<f64>, b: &mut DVector<f64>) -> Result<(), String>;
}

/// Called on each iteration of the solver, after the step has been
/// taken and the active set updated.
pub trait ProgressMonitor {
    fn update(&self, it: &Iteration);
}
