use crate::error::{Error, Result};
use crate::math::{dot, norm};

/// Linear equality and inequality constraints over `dim` variables.
///
/// Rows are stored contiguously in row-major order. The first
/// `num_equality` rows are equalities `n·x = b`, the remaining rows
/// are inequalities `n·x >= b`. Every normal has unit 2-norm and its
/// right-hand side is divided by the same factor.
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    dim: usize,
    num_equality: usize,
    normals: Vec<f64>,
    rhs: Vec<f64>,
}

impl ConstraintSet {
    /// Creates a constraint set from a flat row-major block of normals.
    /// Each row is normalized to unit length.
    pub fn new(dim: usize, num_equality: usize, normals: Vec<f64>, rhs: Vec<f64>) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidInput("dimension must be positive".to_string()));
        }
        if normals.len() != rhs.len() * dim {
            return Err(Error::InvalidInput(format!(
                "{} normal components do not match {} rows of dimension {}",
                normals.len(),
                rhs.len(),
                dim
            )));
        }
        if num_equality > rhs.len() {
            return Err(Error::InvalidInput(format!(
                "{} equality constraints exceed {} total",
                num_equality,
                rhs.len()
            )));
        }

        let mut normals = normals;
        let mut rhs = rhs;
        for (i, (row, b)) in normals.chunks_mut(dim).zip(rhs.iter_mut()).enumerate() {
            let scale = norm(row);
            if !scale.is_finite() || scale <= f64::EPSILON || !b.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "constraint {} has a zero or non-finite normal",
                    i
                )));
            }
            row.iter_mut().for_each(|v| *v /= scale);
            *b /= scale;
        }

        Ok(Self {
            dim,
            num_equality,
            normals,
            rhs,
        })
    }

    /// A problem without constraints.
    pub fn unconstrained(dim: usize) -> Self {
        Self {
            dim,
            num_equality: 0,
            normals: Vec::new(),
            rhs: Vec::new(),
        }
    }

    pub fn builder(dim: usize) -> ConstraintSetBuilder {
        ConstraintSetBuilder {
            dim,
            equality: Vec::new(),
            inequality: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Total number of constraints.
    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    pub fn num_equality(&self) -> usize {
        self.num_equality
    }

    pub fn num_inequality(&self) -> usize {
        self.rhs.len() - self.num_equality
    }

    pub fn is_equality(&self, i: usize) -> bool {
        i < self.num_equality
    }

    /// Normal vector of constraint `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.normals[i * self.dim..(i + 1) * self.dim]
    }

    pub fn rhs(&self, i: usize) -> f64 {
        self.rhs[i]
    }

    pub fn equality_rows(&self) -> impl Iterator<Item = (&[f64], f64)> + '_ {
        (0..self.num_equality).map(move |i| (self.row(i), self.rhs[i]))
    }

    /// Inequality rows with their absolute row index.
    pub fn inequality_rows(&self) -> impl Iterator<Item = (usize, &[f64], f64)> + '_ {
        (self.num_equality..self.len()).map(move |i| (i, self.row(i), self.rhs[i]))
    }

    /// Returns `n_i·x - b_i`. Non-negative for a satisfied inequality.
    pub fn residual(&self, i: usize, x: &[f64]) -> f64 {
        dot(self.row(i), x) - self.rhs[i]
    }

    /// Returns the most violated constraint at `x` and the size of its
    /// violation, if any constraint is violated by more than `tol`.
    pub fn violation(&self, x: &[f64], tol: f64) -> Option<(usize, f64)> {
        (0..self.len())
            .map(|i| {
                let r = self.residual(i, x);
                let v = if self.is_equality(i) { r.abs() } else { -r };
                (i, v)
            })
            .filter(|&(_, v)| v > tol)
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Collects constraint rows in any order; equalities are placed first.
pub struct ConstraintSetBuilder {
    dim: usize,
    equality: Vec<(Vec<f64>, f64)>,
    inequality: Vec<(Vec<f64>, f64)>,
}

impl ConstraintSetBuilder {
    /// Adds `n·x = b`.
    pub fn equal(mut self, n: &[f64], b: f64) -> Self {
        self.equality.push((n.to_vec(), b));
        self
    }

    /// Adds `n·x >= b`.
    pub fn at_least(mut self, n: &[f64], b: f64) -> Self {
        self.inequality.push((n.to_vec(), b));
        self
    }

    /// Adds `n·x <= b`, stored as `-n·x >= -b`.
    pub fn at_most(mut self, n: &[f64], b: f64) -> Self {
        self.inequality.push((n.iter().map(|v| -v).collect(), -b));
        self
    }

    pub fn build(self) -> Result<ConstraintSet> {
        let num_equality = self.equality.len();
        let mut normals = Vec::new();
        let mut rhs = Vec::new();
        for (n, b) in self.equality.into_iter().chain(self.inequality) {
            if n.len() != self.dim {
                return Err(Error::InvalidInput(format!(
                    "constraint normal has {} components, expected {}",
                    n.len(),
                    self.dim
                )));
            }
            normals.extend(n);
            rhs.push(b);
        }
        ConstraintSet::new(self.dim, num_equality, normals, rhs)
    }
}
