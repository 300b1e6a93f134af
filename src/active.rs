use log::debug;

use crate::constraint::ConstraintSet;

/// Inequality constraints binding at the current iterate.
///
/// Holds absolute row indices into the constraint set. Equality rows
/// are always active and never stored.
#[derive(Debug, Clone)]
pub struct ActiveSet {
    num_equality: usize,
    inequality: Vec<usize>,
}

/// What an update changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Change {
    pub added: Option<usize>,
    pub dropped: Option<usize>,
}

impl Change {
    pub fn any(&self) -> bool {
        self.added.is_some() || self.dropped.is_some()
    }
}

impl ActiveSet {
    pub fn new(constraints: &ConstraintSet) -> Self {
        Self {
            num_equality: constraints.num_equality(),
            inequality: Vec::new(),
        }
    }

    /// Activates every inequality with `|n·x - b| <= tol`.
    pub fn initial(constraints: &ConstraintSet, x: &[f64], tol: f64) -> Self {
        let mut active = Self::new(constraints);
        for (i, _, _) in constraints.inequality_rows() {
            if constraints.residual(i, x).abs() <= tol {
                active.add(i);
            }
        }
        active
    }

    pub fn add(&mut self, i: usize) -> bool {
        if i < self.num_equality || self.inequality.contains(&i) {
            return false;
        }
        self.inequality.push(i);
        true
    }

    pub fn remove(&mut self, i: usize) -> bool {
        match self.inequality.iter().position(|&k| k == i) {
            Some(k) => {
                self.inequality.remove(k);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, i: usize) -> bool {
        i < self.num_equality || self.inequality.contains(&i)
    }

    /// Active inequality rows, in activation order.
    pub fn inequalities(&self) -> &[usize] {
        &self.inequality
    }

    /// All active rows: equalities followed by active inequalities.
    pub fn rows(&self) -> Vec<usize> {
        (0..self.num_equality).chain(self.inequality.iter().copied()).collect()
    }

    pub fn len(&self) -> usize {
        self.num_equality + self.inequality.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds `touched` and releases at most one other inequality whose
    /// multiplier is below `-drop_tol`.
    ///
    /// `multipliers` are aligned with `rows()` as it was before the
    /// call, so `touched` itself is never released.
    pub fn update(&mut self, touched: Option<usize>, multipliers: &[f64], drop_tol: f64) -> Change {
        let candidate = self
            .inequality
            .iter()
            .zip(multipliers.iter().skip(self.num_equality))
            .filter(|&(_, &lam)| lam < -drop_tol)
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(&i, &lam)| (i, lam));

        let mut change = Change::default();
        if let Some(i) = touched {
            if self.add(i) {
                debug!("activate constraint {}", i);
                change.added = Some(i);
            }
        }
        if let Some((i, lam)) = candidate {
            debug!("release constraint {} (multiplier {:.3e})", i, lam);
            self.remove(i);
            change.dropped = Some(i);
        }
        change
    }
}
