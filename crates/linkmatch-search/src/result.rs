// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::stats::SolverStatistics;
use linkmatch_model::assignment::Assignment;
use num_traits::{PrimInt, Signed};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverResult<T> {
    /// We have proven that no feasible assignment exists.
    Infeasible,
    /// We have found an assignment and proven its optimality.
    Optimal(Assignment<T>),
    /// We have found an assignment, but not proven its optimality.
    Feasible(Assignment<T>),
    /// The search stopped without an assignment and without proving
    /// infeasibility.
    Unknown,
}

impl<T> SolverResult<T> {
    /// Returns the carried assignment, if any.
    #[inline]
    pub fn assignment(&self) -> Option<&Assignment<T>> {
        match self {
            SolverResult::Optimal(a) | SolverResult::Feasible(a) => Some(a),
            _ => None,
        }
    }
}

impl<T> std::fmt::Display for SolverResult<T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverResult::Infeasible => write!(f, "Infeasible"),
            SolverResult::Optimal(a) => write!(f, "Optimal(total_cost={})", a.total_cost()),
            SolverResult::Feasible(a) => write!(f, "Feasible(total_cost={})", a.total_cost()),
            SolverResult::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// The search found and proved optimality of an assignment.
    OptimalityProven,
    /// The search proved that the problem is infeasible.
    InfeasibilityProven,
    /// The search was stopped by a monitor (time limit, interrupt, ...).
    Aborted(String),
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::OptimalityProven => write!(f, "Optimality Proven"),
            TerminationReason::InfeasibilityProven => write!(f, "Infeasibility Proven"),
            TerminationReason::Aborted(reason) => write!(f, "Aborted: {}", reason),
        }
    }
}

/// What a backend hands back to the assigner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOutcome<T> {
    result: SolverResult<T>,
    reason: TerminationReason,
    statistics: SolverStatistics,
}

impl<T> BackendOutcome<T> {
    #[inline]
    pub fn optimal(assignment: Assignment<T>, statistics: SolverStatistics) -> Self {
        Self {
            result: SolverResult::Optimal(assignment),
            reason: TerminationReason::OptimalityProven,
            statistics,
        }
    }

    #[inline]
    pub fn infeasible(statistics: SolverStatistics) -> Self {
        Self {
            result: SolverResult::Infeasible,
            reason: TerminationReason::InfeasibilityProven,
            statistics,
        }
    }

    /// An aborted search. A best-so-far assignment becomes `Feasible`;
    /// without one the result is `Unknown`, never `Infeasible`.
    #[inline]
    pub fn aborted<R>(
        assignment: Option<Assignment<T>>,
        reason: R,
        statistics: SolverStatistics,
    ) -> Self
    where
        R: Into<String>,
    {
        let result = match assignment {
            Some(a) => SolverResult::Feasible(a),
            None => SolverResult::Unknown,
        };

        Self {
            result,
            reason: TerminationReason::Aborted(reason.into()),
            statistics,
        }
    }

    #[inline]
    pub fn result(&self) -> &SolverResult<T> {
        &self.result
    }

    #[inline]
    pub fn reason(&self) -> &TerminationReason {
        &self.reason
    }

    #[inline]
    pub fn statistics(&self) -> &SolverStatistics {
        &self.statistics
    }

    #[inline]
    pub fn is_optimal(&self) -> bool {
        matches!(self.result, SolverResult::Optimal(_))
    }

    #[inline]
    pub fn is_infeasible(&self) -> bool {
        matches!(self.result, SolverResult::Infeasible)
    }

    #[inline]
    pub fn into_parts(self) -> (SolverResult<T>, TerminationReason, SolverStatistics) {
        (self.result, self.reason, self.statistics)
    }
}

impl<T> std::fmt::Display for BackendOutcome<T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BackendOutcome(result: {}, reason: {})",
            self.result, self.reason
        )
    }
}
