//! Runs a [`TransportModel`] through an [`LpBackend`] and turns the raw answer
//! into a [`TransportResult`].

use std::time::Duration;

use tracing::{debug, info, warn};
use transport_solver::{LpBackend, RawSolution, RawStatus, SolveControl};

use crate::builder::{ModelError, TransportModel};
use crate::request::TransportRequest;
use crate::result::{ResultWarning, SolverDiagnostic, TransportResult, TransportStatus};
use crate::shipment::ShipmentMatrix;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InterpreterConfig {
    /// Negative values no smaller than `-zero_epsilon` are reported as zero
    pub zero_epsilon: f64,
    /// Relative tolerance between reported and recomputed total cost
    pub cost_tolerance: f64,
    /// Deadline applied by [`Interpreter::interpret`]
    pub timeout: Option<Duration>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            zero_epsilon: 1e-7,
            cost_tolerance: 1e-6,
            timeout: None,
        }
    }
}

impl InterpreterConfig {
    pub fn with_zero_epsilon(mut self, eps: f64) -> Self {
        self.zero_epsilon = eps;
        self
    }

    pub fn with_cost_tolerance(mut self, tol: f64) -> Self {
        self.cost_tolerance = tol;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

pub struct Interpreter<B> {
    backend: B,
    config: InterpreterConfig,
}

impl<B: LpBackend> Interpreter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: InterpreterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Build the model for `request` and interpret it.
    pub fn solve(&self, request: &TransportRequest) -> Result<TransportResult, ModelError> {
        let model = TransportModel::build(request)?;
        Ok(self.interpret(&model))
    }

    /// Solve with a fresh control carrying the configured timeout.
    pub fn interpret(&self, model: &TransportModel) -> TransportResult {
        let mut control = SolveControl::new();
        if let Some(timeout) = self.config.timeout {
            control = control.with_timeout(timeout);
        }
        self.interpret_with(model, &control)
    }

    /// Solve under a caller-owned control, e.g. one whose cancel flag is
    /// shared with another thread. The configured timeout is not applied.
    pub fn interpret_with(&self, model: &TransportModel, control: &SolveControl) -> TransportResult {
        let backend = self.backend.name();
        debug!(
            backend,
            vars = model.num_variables(),
            rows = model.lp().num_constraints(),
            "solving transport model"
        );

        let raw = self.backend.solve(model.lp(), control);
        let result = self.read(model, raw);

        match result.total_cost() {
            Some(cost) => info!(backend, status = %result.status(), cost, "transport solve finished"),
            None => info!(backend, status = %result.status(), "transport solve finished"),
        }
        result
    }

    fn read(&self, model: &TransportModel, raw: RawSolution) -> TransportResult {
        let backend = self.backend.name();
        match raw.status {
            RawStatus::Optimal => self.read_optimal(model, raw),
            RawStatus::Infeasible => TransportResult::without_solution(backend, TransportStatus::Infeasible),
            RawStatus::Unbounded => TransportResult::without_solution(backend, TransportStatus::Unbounded),
            RawStatus::TimedOut => {
                TransportResult::undefined(backend, SolverDiagnostic::Timeout { message: raw.message })
            }
            RawStatus::Cancelled => {
                TransportResult::undefined(backend, SolverDiagnostic::Cancelled { message: raw.message })
            }
            RawStatus::Error => {
                let message = raw.message.unwrap_or_else(|| "backend reported an error".to_string());
                warn!(backend, %message, "solver failed");
                TransportResult::undefined(backend, SolverDiagnostic::SolverFailure(message))
            }
            RawStatus::Unknown(code) => {
                warn!(backend, %code, message = raw.message.as_deref(), "unrecognized solver status");
                TransportResult::undefined(
                    backend,
                    SolverDiagnostic::UnrecognizedStatus {
                        code,
                        message: raw.message,
                    },
                )
            }
        }
    }

    fn read_optimal(&self, model: &TransportModel, raw: RawSolution) -> TransportResult {
        let backend = self.backend.name();
        let expected = model.num_variables();
        if raw.values.len() != expected {
            return TransportResult::undefined(
                backend,
                SolverDiagnostic::SolverFailure(format!(
                    "backend returned {} values for {} shipment variables",
                    raw.values.len(),
                    expected
                )),
            );
        }
        if let Some(bad) = raw.values.iter().position(|v| !v.is_finite()) {
            return TransportResult::undefined(
                backend,
                SolverDiagnostic::SolverFailure(format!(
                    "backend returned non-finite value for route {}",
                    model.route(bad)
                )),
            );
        }

        if let Some(reported) = raw.objective_value.filter(|r| !r.is_finite()) {
            return TransportResult::undefined(
                backend,
                SolverDiagnostic::SolverFailure(format!("backend returned non-finite objective {reported}")),
            );
        }

        let mut warnings = Vec::new();
        let mut values = raw.values;
        for (k, value) in values.iter_mut().enumerate() {
            if *value >= 0.0 {
                continue;
            }
            if *value >= -self.config.zero_epsilon {
                *value = 0.0;
            } else {
                let route = model.route(k);
                warn!(backend, %route, value = *value, "negative shipment beyond tolerance");
                warnings.push(ResultWarning::NegativeShipment { route, value: *value });
            }
        }

        let recomputed: f64 = model
            .costs()
            .iter()
            .flatten()
            .zip(&values)
            .map(|(c, x)| c * x)
            .sum();

        let total_cost = match raw.objective_value {
            Some(reported) => {
                let scale = reported.abs().max(1.0);
                if (reported - recomputed).abs() > self.config.cost_tolerance * scale {
                    warn!(backend, reported, recomputed, "solver objective disagrees with shipments");
                    warnings.push(ResultWarning::CostMismatch { reported, recomputed });
                }
                reported
            }
            None => recomputed,
        };

        let shipments = ShipmentMatrix::from_row_major(model.num_origins(), model.num_destinations(), values);
        TransportResult::optimal(backend, total_cost, shipments, warnings)
    }
}

/// Build and solve `request` on `backend` with default settings.
pub fn solve<B: LpBackend>(request: &TransportRequest, backend: B) -> Result<TransportResult, ModelError> {
    Interpreter::new(backend).solve(request)
}
