use std::fmt;

/// What a backend reports after one solve attempt.
///
/// Backends fill `values` only for [`RawStatus::Optimal`]. Every other status
/// carries an empty vector so that callers never mistake a partial or
/// relaxed point for an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSolution {
    /// Solver status
    pub status: RawStatus,
    /// Value for each variable, in problem order
    pub values: Vec<f64>,
    /// Objective value as read back from the solver
    pub objective_value: Option<f64>,
    /// Free-form diagnostic from the backend
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The deadline passed before the solver finished
    TimedOut,
    /// The caller raised the cancel flag
    Cancelled,
    /// Solver encountered an error
    Error,
    /// A status code the backend could not classify
    Unknown(String),
}

impl RawSolution {
    pub fn optimal(values: Vec<f64>, objective_value: f64) -> Self {
        Self {
            status: RawStatus::Optimal,
            values,
            objective_value: Some(objective_value),
            message: None,
        }
    }

    pub fn infeasible() -> Self {
        Self::without_values(RawStatus::Infeasible)
    }

    pub fn unbounded() -> Self {
        Self::without_values(RawStatus::Unbounded)
    }

    pub fn timed_out() -> Self {
        Self::without_values(RawStatus::TimedOut)
    }

    pub fn cancelled() -> Self {
        Self::without_values(RawStatus::Cancelled)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::without_values(RawStatus::Error).with_message(message)
    }

    pub fn unknown(code: impl Into<String>) -> Self {
        Self::without_values(RawStatus::Unknown(code.into()))
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == RawStatus::Optimal
    }

    fn without_values(status: RawStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: None,
            message: None,
        }
    }
}

impl fmt::Display for RawStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawStatus::Optimal => f.write_str("optimal"),
            RawStatus::Infeasible => f.write_str("infeasible"),
            RawStatus::Unbounded => f.write_str("unbounded"),
            RawStatus::TimedOut => f.write_str("timed out"),
            RawStatus::Cancelled => f.write_str("cancelled"),
            RawStatus::Error => f.write_str("error"),
            RawStatus::Unknown(code) => write!(f, "unknown ({code})"),
        }
    }
}
