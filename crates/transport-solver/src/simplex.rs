use tracing::{debug, trace};

use crate::backend::{Interrupt, LpBackend, SolveControl};
use crate::problem::{ConstraintOp, LpProblem, ProblemError};
use crate::solution::RawSolution;

/// Dense two-phase simplex for small linear programs.
///
/// Pivots follow Bland's rule, which guarantees termination on the heavily
/// degenerate bases transportation problems produce.
#[derive(Debug, Clone)]
pub struct SimplexBackend {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for SimplexBackend {
    fn default() -> Self {
        Self {
            max_iterations: 50_000,
            tolerance: 1e-9,
        }
    }
}

impl LpBackend for SimplexBackend {
    fn name(&self) -> &'static str {
        "simplex"
    }

    fn solve(&self, problem: &LpProblem, control: &SolveControl) -> RawSolution {
        match self.run(problem, control) {
            Ok(solution) => solution,
            Err(e) => RawSolution::error(e.to_string()),
        }
    }
}

impl SimplexBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    fn run(&self, problem: &LpProblem, control: &SolveControl) -> Result<RawSolution, ProblemError> {
        problem.validate()?;
        if let Some(interrupt) = control.check() {
            return Ok(interrupt.into_solution());
        }

        let mut tableau = Tableau::build(problem);
        debug!(
            rows = problem.num_constraints(),
            vars = tableau.n_vars,
            artificial = tableau.n_artificial,
            "simplex tableau built"
        );

        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau, control) {
                Phase::Optimal => {}
                Phase::Infeasible => return Ok(RawSolution::infeasible()),
                Phase::Unbounded => {
                    // Phase 1 is bounded below by zero, so this only happens
                    // through numerical trouble.
                    return Ok(RawSolution::error("phase 1 reported an unbounded auxiliary problem"));
                }
                Phase::Interrupted(interrupt) => return Ok(interrupt.into_solution()),
                Phase::IterationLimit => {
                    return Ok(RawSolution::error(format!(
                        "phase 1 exceeded {} iterations",
                        self.max_iterations
                    )));
                }
            }
        }

        match self.phase2(&mut tableau, control) {
            Phase::Optimal => {}
            Phase::Unbounded => return Ok(RawSolution::unbounded()),
            Phase::Infeasible => return Ok(RawSolution::infeasible()),
            Phase::Interrupted(interrupt) => return Ok(interrupt.into_solution()),
            Phase::IterationLimit => {
                return Ok(RawSolution::error(format!(
                    "phase 2 exceeded {} iterations",
                    self.max_iterations
                )));
            }
        }

        Ok(self.extract_solution(&tableau, problem))
    }

    fn phase1(&self, tableau: &mut Tableau, control: &SolveControl) -> Phase {
        let obj_row = tableau.obj_row();
        let n_cols = tableau.n_cols();
        let art_start = tableau.art_start();

        // Maximize -sum(artificials)
        let orig_obj = std::mem::replace(&mut tableau.data[obj_row], vec![0.0; n_cols]);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj_row][j] = -1.0;
        }
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, n_cols - 1, control) {
            Phase::Optimal => {}
            other => return other,
        }

        let rhs_col = n_cols - 1;
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > self.tolerance {
                return Phase::Infeasible;
            }
        }

        self.drive_out_artificials(tableau);

        // Restore original objective and price out the basis
        tableau.data[obj_row] = orig_obj;
        for i in 0..obj_row {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        Phase::Optimal
    }

    /// Swap zero-level artificials for structural or slack columns. Rows where
    /// no such column exists are redundant and keep their artificial, which
    /// can never move again because the rest of the row is zero.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let art_start = tableau.art_start();
        for i in 0..tableau.obj_row() {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            if let Some(col) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                tableau.pivot(i, col);
            }
        }
    }

    fn phase2(&self, tableau: &mut Tableau, control: &SolveControl) -> Phase {
        let exclude_from = tableau.art_start();
        self.iterate(tableau, exclude_from, control)
    }

    /// Pivot until no column below `col_limit` improves the objective.
    fn iterate(&self, tableau: &mut Tableau, col_limit: usize, control: &SolveControl) -> Phase {
        for iteration in 0..self.max_iterations {
            if let Some(interrupt) = control.check() {
                debug!(iteration, ?interrupt, "simplex interrupted");
                return Phase::Interrupted(interrupt);
            }
            let Some(pivot_col) = self.find_pivot_column(tableau, col_limit) else {
                trace!(iteration, "simplex phase converged");
                return Phase::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return Phase::Unbounded;
            };
            tableau.pivot(pivot_row, pivot_col);
        }
        Phase::IterationLimit
    }

    /// Bland's rule: lowest-index column with a positive reduced cost.
    fn find_pivot_column(&self, tableau: &Tableau, col_limit: usize) -> Option<usize> {
        let obj_row = tableau.obj_row();
        (0..col_limit).find(|&j| tableau.data[obj_row][j] > self.tolerance)
    }

    /// Minimum ratio test, ties broken by the lowest basic variable index.
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.n_cols() - 1;
        let mut best: Option<(f64, usize)> = None;

        for i in 0..tableau.obj_row() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col] / val;
            best = match best {
                None => Some((ratio, i)),
                Some((best_ratio, best_row)) => {
                    if ratio < best_ratio - self.tolerance
                        || ((ratio - best_ratio).abs() <= self.tolerance
                            && tableau.basic_vars[i] < tableau.basic_vars[best_row])
                    {
                        Some((ratio, i))
                    } else {
                        Some((best_ratio, best_row))
                    }
                }
            };
        }

        best.map(|(_, row)| row)
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem) -> RawSolution {
        let rhs_col = tableau.n_cols() - 1;
        let mut values = vec![0.0; tableau.n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < tableau.n_vars {
                values[basic] = tableau.data[i][rhs_col];
            }
        }

        // The objective row's RHS holds -(p . x) where p is the maximized
        // objective, i.e. -c for minimization.
        let rhs = tableau.data[tableau.obj_row()][rhs_col];
        let objective_value = if problem.objective.minimize { rhs } else { -rhs };

        RawSolution::optimal(values, objective_value)
    }
}

struct Tableau {
    /// Constraint rows followed by the objective row; last column is the RHS
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

enum Phase {
    Optimal,
    Unbounded,
    Infeasible,
    Interrupted(Interrupt),
    IterationLimit,
}

impl Tableau {
    fn build(problem: &LpProblem) -> Self {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // Rows with a negative RHS are negated, which flips the inequality
        let normalized: Vec<(f64, ConstraintOp)> = problem
            .constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    let op = match c.op {
                        ConstraintOp::Le => ConstraintOp::Ge,
                        ConstraintOp::Ge => ConstraintOp::Le,
                        ConstraintOp::Eq => ConstraintOp::Eq,
                    };
                    (-1.0, op)
                } else {
                    (1.0, c.op)
                }
            })
            .collect();

        let mut n_slack = 0;
        let mut n_artificial = 0;
        for (_, op) in &normalized {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1;
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let total_cols = n_vars + n_slack + n_artificial + 1;
        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; n_constraints + 1],
            basic_vars: vec![0; n_constraints],
            n_vars,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (c, &(sign, op))) in problem.constraints.iter().zip(&normalized).enumerate() {
            for (j, &coef) in c.coefficients.iter().enumerate() {
                tableau.data[i][j] = sign * coef;
            }
            tableau.data[i][total_cols - 1] = sign * c.rhs;

            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Simplex maximizes, so minimization stores -c
        let obj_row = n_constraints;
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            tableau.data[obj_row][j] = if problem.objective.minimize { -coef } else { coef };
        }

        tableau
    }

    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn n_cols(&self) -> usize {
        self.data[0].len()
    }

    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let n_cols = self.n_cols();
        self.basic_vars[row] = col;

        let pivot_val = self.data[row][col];
        for j in 0..n_cols {
            self.data[row][j] /= pivot_val;
        }

        let pivot_row = self.data[row].clone();
        for (i, data_row) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = data_row[col];
            if factor != 0.0 {
                for (cell, &p) in data_row.iter_mut().zip(&pivot_row) {
                    *cell -= factor * p;
                }
            }
        }
    }
}
