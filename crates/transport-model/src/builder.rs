use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;
use tracing::debug;
use transport_solver::{ConstraintOp, LpProblem};

use crate::request::{Route, TransportRequest};

/// Which part of a [`TransportRequest`] an error points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Costs,
    Supply,
    Demand,
    Capacities,
    Minimums,
    Prohibited,
}

/// Where inside an input the offending value sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Index into a vector (supply or demand)
    Entry(usize),
    /// Cell of a matrix
    Route(Route),
}

/// Which extent of an input has the wrong size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    Rows,
    Row(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conflict {
    /// Prohibited forces zero flow while the minimum forces positive flow
    ProhibitedWithMinimum { minimum: f64 },
    CapacityBelowMinimum { capacity: f64, minimum: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Dimension mismatch in {input}: {extent} has length {actual}, expected {expected}")]
    DimensionMismatch {
        input: Input,
        extent: Extent,
        expected: usize,
        actual: usize,
    },
    #[error("Non-finite value {value} in {input} at {position}")]
    NonFiniteValue {
        input: Input,
        position: Position,
        value: f64,
    },
    #[error("Negative value {value} in {input} at {position}")]
    NegativeValue {
        input: Input,
        position: Position,
        value: f64,
    },
    #[error("Prohibited route {route} is outside the {origins}x{destinations} route grid")]
    IndexOutOfRange {
        route: Route,
        origins: usize,
        destinations: usize,
    },
    #[error("Conflicting constraints on route {route}: {conflict}")]
    ConflictingConstraint { route: Route, conflict: Conflict },
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Input::Costs => "costs",
            Input::Supply => "supply",
            Input::Demand => "demand",
            Input::Capacities => "capacities",
            Input::Minimums => "minimums",
            Input::Prohibited => "prohibited",
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Entry(i) => write!(f, "index {i}"),
            Position::Route(route) => write!(f, "route {route}"),
        }
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extent::Rows => f.write_str("row count"),
            Extent::Row(i) => write!(f, "row {i}"),
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::ProhibitedWithMinimum { minimum } => {
                write!(f, "route is prohibited but has minimum {minimum}")
            }
            Conflict::CapacityBelowMinimum { capacity, minimum } => {
                write!(f, "capacity {capacity} is below minimum {minimum}")
            }
        }
    }
}

/// A validated transportation LP, ready to hand to a backend.
///
/// Variable `x_i_j` sits at index `i * destinations + j`.
#[derive(Debug, Clone)]
pub struct TransportModel {
    origins: usize,
    destinations: usize,
    costs: Vec<Vec<f64>>,
    lp: LpProblem,
}

impl TransportModel {
    /// Shorthand for [`ModelBuilder::build`].
    pub fn build(request: &TransportRequest) -> Result<Self, ModelError> {
        ModelBuilder::new(request).build()
    }

    pub fn num_origins(&self) -> usize {
        self.origins
    }

    pub fn num_destinations(&self) -> usize {
        self.destinations
    }

    pub fn num_variables(&self) -> usize {
        self.origins * self.destinations
    }

    pub fn cost(&self, route: Route) -> f64 {
        self.costs[route.origin][route.destination]
    }

    pub fn costs(&self) -> &[Vec<f64>] {
        &self.costs
    }

    pub fn lp(&self) -> &LpProblem {
        &self.lp
    }

    pub fn variable(&self, route: Route) -> usize {
        route.origin * self.destinations + route.destination
    }

    pub fn route(&self, variable: usize) -> Route {
        Route::new(variable / self.destinations, variable % self.destinations)
    }
}

/// Validates a [`TransportRequest`] and assembles its LP.
pub struct ModelBuilder<'a> {
    request: &'a TransportRequest,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(request: &'a TransportRequest) -> Self {
        Self { request }
    }

    pub fn build(&self) -> Result<TransportModel, ModelError> {
        self.check_dimensions()?;
        self.check_values()?;
        let prohibited = self.check_prohibited()?;
        self.check_conflicts(&prohibited)?;

        let lp = self.assemble(&prohibited);
        debug!(
            origins = self.origins(),
            destinations = self.destinations(),
            constraints = lp.num_constraints(),
            "transport model assembled"
        );

        Ok(TransportModel {
            origins: self.origins(),
            destinations: self.destinations(),
            costs: self.request.costs.clone(),
            lp,
        })
    }

    fn origins(&self) -> usize {
        self.request.supply.len()
    }

    fn destinations(&self) -> usize {
        self.request.demand.len()
    }

    fn check_dimensions(&self) -> Result<(), ModelError> {
        let r = self.request;
        check_shape(Input::Costs, &r.costs, self.origins(), self.destinations())?;
        if let Some(capacities) = &r.capacities {
            check_shape(Input::Capacities, capacities, self.origins(), self.destinations())?;
        }
        if let Some(minimums) = &r.minimums {
            check_shape(Input::Minimums, minimums, self.origins(), self.destinations())?;
        }
        Ok(())
    }

    fn check_values(&self) -> Result<(), ModelError> {
        let r = self.request;
        // Costs may be zero or negative; only finiteness matters.
        check_matrix(Input::Costs, &r.costs, false)?;
        check_vector(Input::Supply, &r.supply)?;
        check_vector(Input::Demand, &r.demand)?;
        if let Some(capacities) = &r.capacities {
            check_matrix(Input::Capacities, capacities, true)?;
        }
        if let Some(minimums) = &r.minimums {
            check_matrix(Input::Minimums, minimums, true)?;
        }
        Ok(())
    }

    fn check_prohibited(&self) -> Result<BTreeSet<Route>, ModelError> {
        let mut routes = BTreeSet::new();
        for &route in self.request.prohibited.iter().flatten() {
            if route.origin >= self.origins() || route.destination >= self.destinations() {
                return Err(ModelError::IndexOutOfRange {
                    route,
                    origins: self.origins(),
                    destinations: self.destinations(),
                });
            }
            routes.insert(route);
        }
        Ok(routes)
    }

    fn check_conflicts(&self, prohibited: &BTreeSet<Route>) -> Result<(), ModelError> {
        let Some(minimums) = &self.request.minimums else {
            return Ok(());
        };

        for route in prohibited {
            let minimum = minimums[route.origin][route.destination];
            if minimum > 0.0 {
                return Err(ModelError::ConflictingConstraint {
                    route: *route,
                    conflict: Conflict::ProhibitedWithMinimum { minimum },
                });
            }
        }

        if let Some(capacities) = &self.request.capacities {
            for (i, (cap_row, min_row)) in capacities.iter().zip(minimums).enumerate() {
                for (j, (&capacity, &minimum)) in cap_row.iter().zip(min_row).enumerate() {
                    if capacity < minimum {
                        return Err(ModelError::ConflictingConstraint {
                            route: Route::new(i, j),
                            conflict: Conflict::CapacityBelowMinimum { capacity, minimum },
                        });
                    }
                }
            }
        }

        Ok(())
    }

    fn assemble(&self, prohibited: &BTreeSet<Route>) -> LpProblem {
        let r = self.request;
        let (m, n) = (self.origins(), self.destinations());

        let names = (0..m)
            .flat_map(|i| (0..n).map(move |j| format!("x_{i}_{j}")))
            .collect();
        let mut lp = LpProblem::new(names);
        lp.set_objective(r.costs.iter().flatten().copied().collect(), true);

        // Supply is a cap: origins need not ship everything they hold
        for (i, &supply) in r.supply.iter().enumerate() {
            let mut coeffs = vec![0.0; m * n];
            coeffs[i * n..(i + 1) * n].fill(1.0);
            lp.add_constraint(format!("supply_{i}"), coeffs, ConstraintOp::Le, supply);
        }

        // Demand must be met in full; overshoot is allowed
        for (j, &demand) in r.demand.iter().enumerate() {
            let mut coeffs = vec![0.0; m * n];
            for i in 0..m {
                coeffs[i * n + j] = 1.0;
            }
            lp.add_constraint(format!("demand_{j}"), coeffs, ConstraintOp::Ge, demand);
        }

        if let Some(capacities) = &r.capacities {
            for (i, row) in capacities.iter().enumerate() {
                for (j, &capacity) in row.iter().enumerate() {
                    lp.add_bound(format!("capacity_{i}_{j}"), i * n + j, ConstraintOp::Le, capacity);
                }
            }
        }

        if let Some(minimums) = &r.minimums {
            for (i, row) in minimums.iter().enumerate() {
                for (j, &minimum) in row.iter().enumerate() {
                    lp.add_bound(format!("minimum_{i}_{j}"), i * n + j, ConstraintOp::Ge, minimum);
                }
            }
        }

        for route in prohibited {
            let var = route.origin * n + route.destination;
            lp.add_bound(
                format!("prohibited_{}_{}", route.origin, route.destination),
                var,
                ConstraintOp::Eq,
                0.0,
            );
        }

        lp
    }
}

fn check_shape(input: Input, matrix: &[Vec<f64>], rows: usize, cols: usize) -> Result<(), ModelError> {
    if matrix.len() != rows {
        return Err(ModelError::DimensionMismatch {
            input,
            extent: Extent::Rows,
            expected: rows,
            actual: matrix.len(),
        });
    }
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != cols {
            return Err(ModelError::DimensionMismatch {
                input,
                extent: Extent::Row(i),
                expected: cols,
                actual: row.len(),
            });
        }
    }
    Ok(())
}

fn check_vector(input: Input, values: &[f64]) -> Result<(), ModelError> {
    for (i, &value) in values.iter().enumerate() {
        check_value(input, Position::Entry(i), value, true)?;
    }
    Ok(())
}

fn check_matrix(input: Input, matrix: &[Vec<f64>], non_negative: bool) -> Result<(), ModelError> {
    for (i, row) in matrix.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            check_value(input, Position::Route(Route::new(i, j)), value, non_negative)?;
        }
    }
    Ok(())
}

fn check_value(input: Input, position: Position, value: f64, non_negative: bool) -> Result<(), ModelError> {
    if !value.is_finite() {
        return Err(ModelError::NonFiniteValue { input, position, value });
    }
    if non_negative && value < 0.0 {
        return Err(ModelError::NegativeValue { input, position, value });
    }
    Ok(())
}
