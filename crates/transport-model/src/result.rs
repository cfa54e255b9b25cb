use std::fmt;

use thiserror::Error;

use crate::request::Route;
use crate::shipment::ShipmentMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransportStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// The solver failed to produce a verdict; see [`TransportResult::diagnostic`]
    Undefined,
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportStatus::Optimal => "Optimal",
            TransportStatus::Infeasible => "Infeasible",
            TransportStatus::Unbounded => "Unbounded",
            TransportStatus::Undefined => "Undefined",
        })
    }
}

/// Why a solve ended in [`TransportStatus::Undefined`].
///
/// `message` is whatever text the backend attached to its answer.
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SolverDiagnostic {
    #[error("Solver timed out{}", detail(.message))]
    Timeout { message: Option<String> },
    #[error("Solve was cancelled{}", detail(.message))]
    Cancelled { message: Option<String> },
    #[error("Solver failure: {0}")]
    SolverFailure(String),
    #[error("Unrecognized solver status: {code}{}", detail(.message))]
    UnrecognizedStatus { code: String, message: Option<String> },
}

fn detail(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(" ({message})"),
        None => String::new(),
    }
}

/// Non-fatal issues attached to an otherwise optimal result.
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ResultWarning {
    /// Solver-reported and recomputed total cost disagree beyond tolerance
    #[error("Result consistency: solver reported cost {reported} but shipments cost {recomputed}")]
    CostMismatch { reported: f64, recomputed: f64 },
    #[error("Route {route} resolved to negative quantity {value}")]
    NegativeShipment { route: Route, value: f64 },
}

/// Outcome of one solve.
///
/// Total cost and shipments are present only for [`TransportStatus::Optimal`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TransportResult {
    status: TransportStatus,
    total_cost: Option<f64>,
    shipments: Option<ShipmentMatrix>,
    warnings: Vec<ResultWarning>,
    diagnostic: Option<SolverDiagnostic>,
    backend: String,
}

impl TransportResult {
    pub(crate) fn optimal(
        backend: &str,
        total_cost: f64,
        shipments: ShipmentMatrix,
        warnings: Vec<ResultWarning>,
    ) -> Self {
        Self {
            status: TransportStatus::Optimal,
            total_cost: Some(total_cost),
            shipments: Some(shipments),
            warnings,
            diagnostic: None,
            backend: backend.to_string(),
        }
    }

    pub(crate) fn without_solution(backend: &str, status: TransportStatus) -> Self {
        Self {
            status,
            total_cost: None,
            shipments: None,
            warnings: Vec::new(),
            diagnostic: None,
            backend: backend.to_string(),
        }
    }

    pub(crate) fn undefined(backend: &str, diagnostic: SolverDiagnostic) -> Self {
        Self {
            diagnostic: Some(diagnostic),
            ..Self::without_solution(backend, TransportStatus::Undefined)
        }
    }

    pub fn status(&self) -> TransportStatus {
        self.status
    }

    pub fn is_optimal(&self) -> bool {
        self.status == TransportStatus::Optimal
    }

    /// True only when the solver itself failed, as opposed to reporting
    /// that no feasible or bounded plan exists.
    pub fn is_failure(&self) -> bool {
        self.status == TransportStatus::Undefined
    }

    pub fn total_cost(&self) -> Option<f64> {
        self.total_cost
    }

    pub fn shipments(&self) -> Option<&ShipmentMatrix> {
        self.shipments.as_ref()
    }

    pub fn warnings(&self) -> &[ResultWarning] {
        &self.warnings
    }

    pub fn diagnostic(&self) -> Option<&SolverDiagnostic> {
        self.diagnostic.as_ref()
    }

    /// Name of the backend that produced this result.
    pub fn backend(&self) -> &str {
        &self.backend
    }
}
