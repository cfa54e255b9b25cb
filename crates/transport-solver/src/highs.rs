//! HiGHS backend via good_lp.
//!
//! HiGHS runs to completion once started, so the deadline and cancel flag are
//! only consulted before the call and again before the answer is returned.

use good_lp::solvers::highs::highs;
use good_lp::{Expression, ResolutionError, Solution, SolverModel, Variable, constraint, variable, variables};
use tracing::debug;

use crate::backend::{LpBackend, SolveControl};
use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::RawSolution;

#[derive(Debug, Default, Clone)]
pub struct HighsBackend;

impl HighsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl LpBackend for HighsBackend {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&self, problem: &LpProblem, control: &SolveControl) -> RawSolution {
        if let Err(e) = problem.validate() {
            return RawSolution::error(e.to_string());
        }
        if let Some(interrupt) = control.check() {
            return interrupt.into_solution();
        }
        if problem.num_variables() == 0 {
            return RawSolution::optimal(Vec::new(), 0.0);
        }

        let mut vars = variables!();
        let xs: Vec<Variable> = (0..problem.num_variables())
            .map(|_| vars.add(variable().min(0.0)))
            .collect();

        let objective: Expression = xs
            .iter()
            .zip(&problem.objective.coefficients)
            .map(|(v, c)| *c * *v)
            .sum();

        let unsolved = if problem.objective.minimize {
            vars.minimise(&objective)
        } else {
            vars.maximise(&objective)
        };
        let mut model = unsolved.using(highs);

        for c in &problem.constraints {
            let lhs: Expression = xs.iter().zip(&c.coefficients).map(|(v, k)| *k * *v).sum();
            let rhs = c.rhs;
            model = match c.op {
                ConstraintOp::Le => model.with(constraint!(lhs <= rhs)),
                ConstraintOp::Ge => model.with(constraint!(lhs >= rhs)),
                ConstraintOp::Eq => model.with(constraint!(lhs == rhs)),
            };
        }

        debug!(vars = xs.len(), rows = problem.num_constraints(), "handing model to HiGHS");
        let outcome = model.solve();

        if let Some(interrupt) = control.check() {
            return interrupt.into_solution();
        }

        match outcome {
            Ok(solution) => {
                let values = xs.iter().map(|v| solution.value(*v)).collect();
                let objective_value = solution.eval(&objective);
                RawSolution::optimal(values, objective_value)
            }
            Err(ResolutionError::Infeasible) => RawSolution::infeasible(),
            Err(ResolutionError::Unbounded) => RawSolution::unbounded(),
            Err(other) => RawSolution::error(other.to_string()),
        }
    }
}
