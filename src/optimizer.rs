use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, trace, warn};

use crate::active::ActiveSet;
use crate::cg::ConjugateGradient;
use crate::common::*;
use crate::constraint::ConstraintSet;
use crate::error::{Error, Result};
use crate::linesearch::{line_search, ratio_test, LineSearch};
use crate::linsol::CholeskySolver;
use crate::math::{dot, norm};
use crate::project::Projector;
use crate::traits::*;

/// Projected conjugate-gradient method for linearly constrained NLP
/// (nonlinear programming). Minimize a function F(x) beginning from a
/// feasible starting point x0, subject to linear constraints.
///
/// ```txt
///       min F(x)
///        x
/// ```
///
/// subject to
///
/// ```txt
///       N_e * x  = b_e      (equality rows)
///       N_i * x >= b_i      (inequality rows)
/// ```
///
/// Each iteration projects the gradient onto the null space of the
/// active constraint normals, forms a conjugate direction in that
/// subspace, caps the step by a ratio test against the inactive
/// inequalities and line searches up to the cap. Boundaries that are
/// reached become active. Active inequalities whose Lagrange multiplier
/// turns negative are released, at most one per iteration, either once
/// the current face is minimized or after every step (`opt.release`).
/// Any change of the active set restarts the conjugate recursion with
/// the projected steepest descent direction.
///
/// `solver` solves the Gram systems of the projection and defaults to
/// [`CholeskySolver`]. `cancel` is polled at the top of every iteration.
///
/// Returns an error if `x0` is infeasible or the active normals become
/// linearly dependent. Non-convergence within `opt.max_it` iterations,
/// unboundedness and cancellation are reported through
/// [`Solution::status`].
pub fn optimize(
    objective: &dyn ObjectiveFunction,
    constraints: &ConstraintSet,
    x0: &[f64],
    solver: Option<&dyn LinearSolver>,
    opt: &Options,
    progress: Option<&dyn ProgressMonitor>,
    cancel: Option<&AtomicBool>,
) -> Result<Solution> {
    opt.validate()?;
    let nx = constraints.dim();
    if x0.len() != nx {
        return Err(Error::InvalidInput(format!(
            "x0 has {} elements, constraints have dimension {}",
            x0.len(),
            nx
        )));
    }
    if x0.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidInput("x0 must be finite".to_string()));
    }
    if let Some((row, violation)) = constraints.violation(x0, opt.feas_tol) {
        return Err(Error::InfeasibleStart { row, violation });
    }

    let default_solver = CholeskySolver::default();
    let projector = Projector::new(constraints, solver.unwrap_or(&default_solver));

    let mut active = ActiveSet::initial(constraints, x0, opt.active_tol);
    let interval = if opt.restart_interval == 0 {
        nx
    } else {
        opt.restart_interval
    };
    let mut cg = ConjugateGradient::new(opt.update, interval);

    let mut x = x0.to_vec();
    let (mut f, mut g) = objective.f(&x);
    if !f.is_finite() || g.len() != nx {
        return Err(Error::InvalidInput(
            "objective must be finite with a gradient of the problem dimension at x0".to_string(),
        ));
    }

    info!("----- Started");
    debug!(
        "{} variables, {} constraints ({} equality), {} initially active",
        nx,
        constraints.len(),
        constraints.num_equality(),
        active.len()
    );

    let mut iterations = 0;
    let mut stalled = 0;
    let status = loop {
        if cancel.map_or(false, |c| c.load(Ordering::Relaxed)) {
            break Status::Cancelled;
        }

        let (pg, lam) = projector.project(&g, &active)?;
        let pg_norm = norm(&pg);
        if pg_norm <= opt.grad_tol {
            // Stationary on the current face: release a constraint
            // pulling the wrong way, or stop.
            let change = active.update(None, &lam, opt.drop_tol);
            if change.any() {
                cg.restart();
                continue;
            }
            break Status::Converged;
        }
        if iterations >= opt.max_it {
            break Status::MaxIterationsExceeded;
        }
        iterations += 1;

        let mut dir = cg.next_direction(&pg);
        if !dir.restarted {
            dir.d = projector.project(&dir.d, &active)?.0;
            if dot(&g, &dir.d) >= 0.0 {
                trace!("{}: conjugate direction is not descending, restart", iterations);
                dir = ConjugateGradient::steepest(&pg);
            }
        }
        cg.accept(&pg, &dir);

        let ratio = ratio_test(constraints, &active, &x, &dir.d);
        let step = match line_search(objective, &x, &dir.d, f, &g, ratio.alpha_max, opt) {
            LineSearch::Step(step) => step,
            LineSearch::Unbounded => break Status::Unbounded { direction: dir.d },
        };

        let active_rows = active.rows();
        let touched = if step.hit_boundary {
            ratio.blocking
        } else {
            None
        };
        let lam = match opt.release {
            Release::Stationary => Vec::new(),
            Release::EveryStep => projector.project(&step.gradient, &active)?.1,
        };
        let change = active.update(touched, &lam, opt.drop_tol);
        if change.any() {
            cg.restart();
        }

        let f_prev = f;
        let x_prev = std::mem::replace(&mut x, step.x);
        let g_prev = std::mem::replace(&mut g, step.gradient);
        f = step.f;

        debug!(
            "{}: f {:.6e} |pg| {:.2e} beta {:.2e} alpha {:.2e}/{:.2e} active {}",
            iterations,
            f,
            pg_norm,
            dir.beta,
            step.alpha,
            ratio.alpha_max,
            active.len()
        );
        trace!("{}: x {:?}", iterations, x);

        if let Some(progress) = progress {
            progress.update(&Iteration {
                i: iterations,
                x: &x_prev,
                f: f_prev,
                gradient: &g_prev,
                projected_gradient: &pg,
                direction: &dir.d,
                beta: dir.beta,
                restarted: dir.restarted,
                alpha: step.alpha,
                alpha_max: ratio.alpha_max,
                x_new: &x,
                active: &active_rows,
                active_new: &active.rows(),
                added: change.added,
                dropped: change.dropped,
            });
        }

        if !change.any() && (f_prev - f).abs() <= opt.cost_tol * (1.0 + f_prev.abs()) {
            stalled += 1;
        } else {
            stalled = 0;
        }
        if opt.stall_window > 0 && stalled >= opt.stall_window {
            debug!("objective stalled for {} iterations", stalled);
            break Status::Converged;
        }
    };

    match &status {
        Status::Converged => info!("----- Converged"),
        Status::Unbounded { .. } => warn!("----- Unbounded"),
        Status::MaxIterationsExceeded => warn!("----- ExcessIter"),
        Status::Cancelled => info!("----- Cancelled"),
    }
    info!("{} iterations, f = {:.6e}", iterations, f);

    let multipliers = match (&status, projector.project(&g, &active)) {
        (_, Ok((_, lam))) => lam,
        (Status::Cancelled, Err(err)) => {
            debug!("no multipliers for cancelled run: {}", err);
            Vec::new()
        }
        (_, Err(err)) => return Err(err),
    };
    Ok(Solution {
        status,
        x,
        f,
        iterations,
        active: active.rows(),
        multipliers,
    })
}
