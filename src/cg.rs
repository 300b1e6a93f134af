use crate::common::ConjugateUpdate;
use crate::math::{axpy, dot};

/// A search direction and how it was formed.
#[derive(Debug, Clone)]
pub struct Direction {
    pub d: Vec<f64>,
    pub beta: f64,
    pub restarted: bool,
}

/// Conjugate direction recursion over projected gradients.
///
/// The recursion restarts with steepest descent on the first step,
/// after `restart()` and every `interval` steps.
pub struct ConjugateGradient {
    update: ConjugateUpdate,
    interval: usize,
    prev: Option<(Vec<f64>, Vec<f64>)>,
    since_restart: usize,
}

impl ConjugateGradient {
    pub fn new(update: ConjugateUpdate, interval: usize) -> Self {
        Self {
            update,
            interval: interval.max(1),
            prev: None,
            since_restart: 0,
        }
    }

    /// Forgets the previous direction. Called whenever the active set
    /// changes since the feasible subspace is no longer the same.
    pub fn restart(&mut self) {
        self.prev = None;
    }

    /// Returns the next direction for the projected gradient `pg`.
    pub fn next_direction(&self, pg: &[f64]) -> Direction {
        let beta = match self.prev.as_ref() {
            Some((pg_prev, d_prev)) if self.since_restart < self.interval => {
                let denom = dot(pg_prev, pg_prev);
                if denom > 0.0 {
                    let beta = match self.update {
                        ConjugateUpdate::FletcherReeves => dot(pg, pg) / denom,
                        ConjugateUpdate::PolakRibiere => (dot(pg, pg) - dot(pg, pg_prev)) / denom,
                    };
                    Some((beta.max(0.0), d_prev))
                } else {
                    None
                }
            }
            _ => None,
        };

        match beta {
            Some((beta, d_prev)) => Direction {
                d: axpy(beta, d_prev, &Self::steepest(pg).d),
                beta,
                restarted: false,
            },
            None => Self::steepest(pg),
        }
    }

    /// Records the direction taken for the projected gradient `pg`.
    pub fn accept(&mut self, pg: &[f64], direction: &Direction) {
        if direction.restarted {
            self.since_restart = 1;
        } else {
            self.since_restart += 1;
        }
        self.prev = Some((pg.to_vec(), direction.d.clone()));
    }

    /// Steepest descent `-pg`.
    pub fn steepest(pg: &[f64]) -> Direction {
        Direction {
            d: pg.iter().map(|g| -g).collect(),
            beta: 0.0,
            restarted: true,
        }
    }
}
