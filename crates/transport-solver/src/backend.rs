//! The narrow seam between model code and whatever actually solves the LP.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::problem::LpProblem;
use crate::solution::RawSolution;

/// Anything that can take an [`LpProblem`] and report a status plus values.
///
/// Implementations must be pure with respect to the problem: one call, one
/// answer, no state carried between calls.
pub trait LpBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Solve `problem`, honouring the deadline and cancel flag in `control`.
    fn solve(&self, problem: &LpProblem, control: &SolveControl) -> RawSolution;
}

impl<B: LpBackend + ?Sized> LpBackend for &B {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn solve(&self, problem: &LpProblem, control: &SolveControl) -> RawSolution {
        (**self).solve(problem, control)
    }
}

impl<B: LpBackend + ?Sized> LpBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn solve(&self, problem: &LpProblem, control: &SolveControl) -> RawSolution {
        (**self).solve(problem, control)
    }
}

/// Why a backend should stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Timeout,
    Cancelled,
}

/// Deadline and cooperative cancellation for a single solve.
#[derive(Debug, Clone, Default)]
pub struct SolveControl {
    deadline: Option<Instant>,
    cancel: Arc<AtomicBool>,
}

impl SolveControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort once `timeout` has elapsed from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Share an existing cancel flag, e.g. one owned by another thread.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Handle that another thread can use to cancel this solve.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Cancellation wins over timeout when both apply.
    pub fn check(&self) -> Option<Interrupt> {
        if self.is_cancelled() {
            return Some(Interrupt::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interrupt::Timeout),
            _ => None,
        }
    }
}

impl Interrupt {
    pub fn into_solution(self) -> RawSolution {
        match self {
            Interrupt::Timeout => RawSolution::timed_out(),
            Interrupt::Cancelled => RawSolution::cancelled(),
        }
    }
}
