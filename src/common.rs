use crate::error::{Error, Result};

/// Formula for the conjugate-direction coefficient `beta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConjugateUpdate {
    /// `beta = (g·g) / (g_prev·g_prev)`
    FletcherReeves,
    /// `beta = max(0, g·(g - g_prev) / (g_prev·g_prev))`
    PolakRibiere,
}

/// When active inequalities are tested for release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Only once the projected gradient vanishes on the current face.
    Stationary,
    /// Also after every line search, using the multipliers at the new
    /// iterate. The boundary reached by that step is kept.
    EveryStep,
}

pub struct Options {
    /// Termination tolerance on the 2-norm of the projected gradient.
    pub grad_tol: f64,
    /// Termination tolerance on the relative objective improvement.
    pub cost_tol: f64,
    /// Number of consecutive iterations the improvement must stay
    /// below `cost_tol` before terminating.
    pub stall_window: usize,

    /// Maximum violation accepted at the starting point.
    pub feas_tol: f64,
    /// Inequalities with a residual below this value at the starting
    /// point are initially active.
    pub active_tol: f64,
    /// Active inequalities with a multiplier below `-drop_tol` are released.
    pub drop_tol: f64,
    pub release: Release,

    /// Maximum number of iterations.
    pub max_it: usize,

    pub update: ConjugateUpdate,
    /// Restart with steepest descent every `restart_interval` steps.
    /// Zero means the problem dimension.
    pub restart_interval: usize,

    /// First trial step of the line search.
    pub initial_step: f64,
    /// Steps longer than this along an unblocked direction with
    /// decreasing objective report the problem as unbounded.
    pub max_step_size: f64,
    /// Line search terminates when `|φ'(t)| <= ls_tol * |φ'(0)|`.
    pub ls_tol: f64,
    /// Maximum number of objective evaluations per line search.
    pub max_ls_evals: usize,
}

impl Options {
    pub(crate) fn validate(&self) -> Result<()> {
        let positive = [
            ("grad_tol", self.grad_tol),
            ("feas_tol", self.feas_tol),
            ("initial_step", self.initial_step),
            ("max_step_size", self.max_step_size),
            ("ls_tol", self.ls_tol),
        ];
        for (name, v) in positive {
            if v.is_nan() || v <= 0.0 {
                return Err(Error::InvalidInput(format!("{} ({}) must be positive", name, v)));
            }
        }
        if self.cost_tol < 0.0 || self.active_tol < 0.0 || self.drop_tol < 0.0 {
            return Err(Error::InvalidInput(
                "cost_tol, active_tol and drop_tol must not be negative".to_string(),
            ));
        }
        if self.max_ls_evals == 0 {
            return Err(Error::InvalidInput("max_ls_evals must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            grad_tol: 1e-6,
            cost_tol: 1e-12,
            stall_window: 5,

            feas_tol: 1e-8,
            active_tol: 1e-9,
            drop_tol: 1e-9,
            release: Release::Stationary,

            max_it: 500,

            update: ConjugateUpdate::PolakRibiere,
            restart_interval: 0,

            initial_step: 1.0,
            max_step_size: 1e10,
            ls_tol: 1e-10,
            max_ls_evals: 100,
        }
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Converged,
    /// The objective decreases without bound along `direction`, which
    /// no inactive constraint blocks.
    Unbounded { direction: Vec<f64> },
    /// The iteration cap was reached. The solution holds the last
    /// feasible iterate.
    MaxIterationsExceeded,
    Cancelled,
}

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: Status,
    pub x: Vec<f64>,
    /// Objective function value at `x`.
    pub f: f64,
    pub iterations: usize,
    /// Constraint rows active at `x`: equalities first.
    pub active: Vec<usize>,
    /// Lagrange multipliers aligned with `active`.
    pub multipliers: Vec<f64>,
}

impl Solution {
    pub fn converged(&self) -> bool {
        self.status == Status::Converged
    }
}

/// Snapshot of one iteration, passed to a `ProgressMonitor`.
pub struct Iteration<'a> {
    pub i: usize,
    /// Iterate before the step.
    pub x: &'a [f64],
    pub f: f64,
    pub gradient: &'a [f64],
    pub projected_gradient: &'a [f64],
    pub direction: &'a [f64],
    pub beta: f64,
    /// The direction is the projected steepest descent direction.
    pub restarted: bool,
    pub alpha: f64,
    pub alpha_max: f64,
    /// Iterate after the step.
    pub x_new: &'a [f64],
    /// Rows the direction was projected against.
    pub active: &'a [usize],
    /// Rows active after the update.
    pub active_new: &'a [usize],
    pub added: Option<usize>,
    pub dropped: Option<usize>,
}
