mod active;
mod cg;
mod common;
mod constraint;
mod error;
mod linesearch;
mod linsol;
mod loader;
mod math;
mod optimizer;
mod project;
#[cfg(test)]
mod tests;
mod traits;

pub use active::{ActiveSet, Change};
pub use cg::{ConjugateGradient, Direction};
pub use common::*;
pub use constraint::{ConstraintSet, ConstraintSetBuilder};
pub use error::{Error, Result};
pub use linesearch::{line_search, ratio_test, LineSearch, RatioTest, Step};
pub use linsol::CholeskySolver;
pub use loader::{
    load, parse_constraints, ConstraintKind, ConstraintSource, DirectorySource, EnvSource,
};
pub use math::{dot, norm, norm_inf};
pub use optimizer::optimize;
pub use project::Projector;
pub use traits::*;
