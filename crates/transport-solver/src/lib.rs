mod backend;
#[cfg(feature = "highs")]
mod highs;
mod problem;
mod simplex;
mod solution;

pub use backend::{Interrupt, LpBackend, SolveControl};
#[cfg(feature = "highs")]
pub use highs::HighsBackend;
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, ProblemError};
pub use simplex::SimplexBackend;
pub use solution::{RawSolution, RawStatus};
