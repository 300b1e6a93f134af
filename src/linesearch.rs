use log::trace;

use crate::active::ActiveSet;
use crate::common::Options;
use crate::constraint::ConstraintSet;
use crate::math::{axpy, dot};
use crate::traits::ObjectiveFunction;

/// Longest step along a direction before an inactive inequality
/// boundary is crossed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioTest {
    pub alpha_max: f64,
    /// Row whose boundary is reached at `alpha_max`.
    pub blocking: Option<usize>,
}

/// Computes the maximum feasible step from `x` along `d`.
///
/// Only inactive inequality rows moving towards their boundary
/// (`n·d < 0`) are candidates. Ties go to the lowest row index.
pub fn ratio_test(
    constraints: &ConstraintSet,
    active: &ActiveSet,
    x: &[f64],
    d: &[f64],
) -> RatioTest {
    let dnorm = d.iter().map(|v| v.abs()).fold(0.0, f64::max);
    let eps = f64::EPSILON * dnorm.max(1.0);

    let mut test = RatioTest {
        alpha_max: f64::INFINITY,
        blocking: None,
    };
    for (i, n, b) in constraints.inequality_rows() {
        if active.contains(i) {
            continue;
        }
        let nd = dot(n, d);
        if nd >= -eps {
            continue;
        }
        let slack = (dot(n, x) - b).max(0.0);
        let t = slack / -nd;
        if t < test.alpha_max {
            test = RatioTest {
                alpha_max: t,
                blocking: Some(i),
            };
        }
    }
    test
}

/// Outcome of a line search.
#[derive(Debug, Clone)]
pub enum LineSearch {
    Step(Step),
    /// The objective kept decreasing up to `max_step_size` with no
    /// constraint in the way.
    Unbounded,
}

#[derive(Debug, Clone)]
pub struct Step {
    pub alpha: f64,
    pub x: Vec<f64>,
    pub f: f64,
    pub gradient: Vec<f64>,
    /// The step stopped on the blocking boundary at `alpha_max`.
    pub hit_boundary: bool,
}

struct Trial {
    t: f64,
    x: Vec<f64>,
    f: f64,
    gradient: Vec<f64>,
    /// Directional derivative `φ'(t)`.
    slope: f64,
}

fn trial(objective: &dyn ObjectiveFunction, x: &[f64], d: &[f64], t: f64) -> Trial {
    let xt = axpy(t, d, x);
    let (f, gradient) = objective.f(&xt);
    let slope = dot(&gradient, d);
    Trial {
        t,
        x: xt,
        f,
        gradient,
        slope,
    }
}

fn into_step(tr: Trial, hit_boundary: bool) -> Step {
    Step {
        alpha: tr.t,
        x: tr.x,
        f: tr.f,
        gradient: tr.gradient,
        hit_boundary,
    }
}

/// Minimizes `φ(t) = f(x + t d)` over `[0, alpha_max]`.
///
/// `f0` and `g0` are the value and gradient at `x`, with `g0·d < 0`. The
/// interval is bracketed by expanding trial steps, then refined by
/// safeguarded secant steps on `φ'`, i.e. minimizing the quadratic
/// interpolant of `φ`. If `φ` still decreases at `alpha_max`, the
/// step ends exactly on the boundary.
pub fn line_search(
    objective: &dyn ObjectiveFunction,
    x: &[f64],
    d: &[f64],
    f0: f64,
    g0: &[f64],
    alpha_max: f64,
    opt: &Options,
) -> LineSearch {
    let slope0 = dot(g0, d);
    let mut lo = Trial {
        t: 0.0,
        x: x.to_vec(),
        f: f0,
        gradient: g0.to_vec(),
        slope: slope0,
    };
    if alpha_max <= 0.0 {
        // Already on the blocking boundary.
        return LineSearch::Step(into_step(lo, true));
    }

    // Bracket a sign change of φ'.
    let mut evals = 0;
    let mut t = opt.initial_step.min(alpha_max);
    let hi = loop {
        let tr = trial(objective, x, d, t);
        evals += 1;
        if !tr.f.is_finite() {
            // Stepped outside the domain of f; shrink towards lo.
            if evals >= opt.max_ls_evals {
                return LineSearch::Step(into_step(lo, false));
            }
            t = lo.t + 0.5 * (t - lo.t);
            continue;
        }
        if tr.slope >= 0.0 || tr.f > lo.f {
            break tr;
        }
        if t >= alpha_max {
            trace!("line search reached boundary at {:e}", t);
            return LineSearch::Step(into_step(tr, true));
        }
        if alpha_max.is_infinite() && t >= opt.max_step_size {
            return LineSearch::Unbounded;
        }
        if evals >= opt.max_ls_evals {
            return LineSearch::Step(into_step(tr, false));
        }
        lo = tr;
        t = (4.0 * t).min(alpha_max);
    };

    // Refine inside [lo, hi].
    let mut hi = hi;
    let target = opt.ls_tol * slope0.abs();
    while evals < opt.max_ls_evals {
        let width = hi.t - lo.t;
        if width <= f64::EPSILON * (1.0 + hi.t) {
            break;
        }
        let mut t = if hi.slope > lo.slope {
            lo.t - lo.slope * width / (hi.slope - lo.slope)
        } else {
            lo.t + 0.5 * width
        };
        let guard = 0.01 * width;
        if !(t > lo.t + guard && t < hi.t - guard) {
            t = lo.t + 0.5 * width;
        }

        let tr = trial(objective, x, d, t);
        evals += 1;
        if tr.slope.abs() <= target && tr.f <= lo.f {
            return LineSearch::Step(into_step(tr, false));
        }
        if tr.slope >= 0.0 || tr.f > lo.f || !tr.f.is_finite() {
            hi = tr;
        } else {
            lo = tr;
        }
    }
    trace!("line search stopped after {} evaluations", evals);
    LineSearch::Step(into_step(lo, false))
}
