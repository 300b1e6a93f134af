use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad selector, unreadable resource or malformed record.
    #[error("load error: {0}")]
    Load(String),
    /// The starting point violates a constraint beyond `feas_tol`.
    #[error("infeasible start: constraint {row} violated by {violation:e}")]
    InfeasibleStart { row: usize, violation: f64 },
    /// The normals of the active rows are not linearly independent.
    #[error("degenerate active set: rows {rows:?} are linearly dependent")]
    DegenerateActiveSet { rows: Vec<usize> },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
