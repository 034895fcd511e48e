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

//! # Assigner
//!
//! Turns a cost matrix into an optimal device-to-center assignment or an
//! explicit no-solution outcome. The assigner owns no solver: the backend is
//! passed in per call, and whatever it returns is checked against the matrix
//! before it is reported as a match.
//!
//! ```rust
//! use linkmatch_hungarian::hungarian::HungarianSolver;
//! use linkmatch_model::matrix::CostMatrix;
//! use linkmatch_solver::assigner::Assigner;
//!
//! let matrix = CostMatrix::<i64>::from_rows(vec![vec![4, 1], vec![2, 3]]);
//! let result = Assigner::new().assign(&matrix, &mut HungarianSolver::new());
//! assert_eq!(result.assignment().map(|a| a.total_cost()), Some(3));
//! ```

use linkmatch_model::{
    assignment::{Assignment, AssignmentViolation},
    matrix::CostMatrix,
};
use linkmatch_search::{
    backend::{AssignmentBackend, BackendUnavailable, SolveContext},
    monitor::{
        composite::CompositeMonitor, interrupt::InterruptMonitor, log::LogMonitor,
        time_limit::TimeLimitMonitor,
    },
    num::SolverNumeric,
    problem::AssignmentProblem,
    result::{SolverResult, TerminationReason},
    stats::SolverStatistics,
};
use std::{
    sync::{Arc, atomic::AtomicBool},
    time::Duration,
};

/// Why no assignment was produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoSolutionReason {
    /// More devices than centers, or the backend proved infeasibility.
    #[error("the assignment problem is infeasible")]
    Infeasible,
    /// The backend could not be constructed.
    #[error(transparent)]
    SolverUnavailable(#[from] BackendUnavailable),
    /// The backend was stopped before proving optimality.
    #[error("the search was aborted: {0}")]
    Aborted(String),
    /// The backend answered with an assignment that does not fit the matrix.
    #[error("the backend returned an invalid assignment: {0}")]
    InvalidSolution(#[from] AssignmentViolation),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<T> {
    Matched(Assignment<T>),
    NoSolution(NoSolutionReason),
}

impl<T> MatchOutcome<T> {
    #[inline]
    pub fn assignment(&self) -> Option<&Assignment<T>> {
        match self {
            MatchOutcome::Matched(a) => Some(a),
            MatchOutcome::NoSolution(_) => None,
        }
    }

    #[inline]
    pub fn no_solution_reason(&self) -> Option<&NoSolutionReason> {
        match self {
            MatchOutcome::Matched(_) => None,
            MatchOutcome::NoSolution(reason) => Some(reason),
        }
    }

    #[inline]
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }
}

/// The outcome of one `Assigner` call together with the backend's
/// statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult<T> {
    outcome: MatchOutcome<T>,
    statistics: SolverStatistics,
}

impl<T> MatchResult<T> {
    #[inline]
    pub fn new(outcome: MatchOutcome<T>, statistics: SolverStatistics) -> Self {
        Self {
            outcome,
            statistics,
        }
    }

    #[inline]
    fn no_solution(reason: NoSolutionReason, statistics: SolverStatistics) -> Self {
        Self::new(MatchOutcome::NoSolution(reason), statistics)
    }

    #[inline]
    pub fn outcome(&self) -> &MatchOutcome<T> {
        &self.outcome
    }

    #[inline]
    pub fn assignment(&self) -> Option<&Assignment<T>> {
        self.outcome.assignment()
    }

    #[inline]
    pub fn statistics(&self) -> &SolverStatistics {
        &self.statistics
    }

    #[inline]
    pub fn into_outcome(self) -> MatchOutcome<T> {
        self.outcome
    }
}

#[derive(Debug, Clone)]
pub struct Assigner {
    time_limit: Option<Duration>,
    interrupt: Option<Arc<AtomicBool>>,
    accept_feasible: bool,
    log_progress: bool,
    clock_check_mask: u64,
}

impl Default for Assigner {
    fn default() -> Self {
        Self::new()
    }
}

impl Assigner {
    /// Check the clock every 64 backend steps.
    pub const DEFAULT_CLOCK_CHECK_MASK: u64 = 0x3F;

    /// No time limit, no interrupt, unproven answers rejected.
    #[inline]
    pub fn new() -> Self {
        AssignerBuilder::new().build()
    }

    #[inline]
    pub fn builder() -> AssignerBuilder {
        AssignerBuilder::new()
    }

    #[inline]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    #[inline]
    pub fn accepts_feasible(&self) -> bool {
        self.accept_feasible
    }

    /// Solves `matrix` with `backend`.
    pub fn assign<T, B>(&self, matrix: &CostMatrix<T>, backend: &mut B) -> MatchResult<T>
    where
        T: SolverNumeric,
        B: AssignmentBackend<T> + ?Sized,
    {
        let problem = AssignmentProblem::new(matrix);

        if problem.is_structurally_infeasible() {
            tracing::info!(
                devices = problem.num_devices(),
                centers = problem.num_centers(),
                "more devices than centers, no assignment exists"
            );
            return MatchResult::no_solution(
                NoSolutionReason::Infeasible,
                SolverStatistics::default(),
            );
        }

        let mut monitor = CompositeMonitor::<T>::with_capacity(3);
        if let Some(flag) = &self.interrupt {
            monitor.add_monitor(InterruptMonitor::new(Arc::clone(flag)));
        }
        if let Some(limit) = self.time_limit {
            monitor.add_monitor(TimeLimitMonitor::with_clock_check_mask(
                limit,
                self.clock_check_mask,
            ));
        }
        if self.log_progress {
            monitor.add_monitor(LogMonitor::default());
        }

        tracing::debug!(
            backend = backend.name(),
            devices = problem.num_devices(),
            centers = problem.num_centers(),
            "solving assignment problem"
        );

        let (result, reason, statistics) = backend
            .solve(SolveContext::new(&problem, &mut monitor))
            .into_parts();

        let outcome = match result {
            SolverResult::Optimal(assignment) => Self::validate(&problem, assignment),
            SolverResult::Feasible(assignment) if self.accept_feasible => {
                tracing::debug!("accepting unproven assignment");
                Self::validate(&problem, assignment)
            }
            SolverResult::Feasible(_) | SolverResult::Unknown => {
                let message = match reason {
                    TerminationReason::Aborted(msg) => msg,
                    other => other.to_string(),
                };
                tracing::info!(reason = %message, "search aborted without proven optimum");
                MatchOutcome::NoSolution(NoSolutionReason::Aborted(message))
            }
            SolverResult::Infeasible => {
                tracing::info!(backend = backend.name(), "backend proved infeasibility");
                MatchOutcome::NoSolution(NoSolutionReason::Infeasible)
            }
        };

        MatchResult::new(outcome, statistics)
    }

    /// Builds a backend with `factory` and solves `matrix` with it. A
    /// factory error becomes `NoSolutionReason::SolverUnavailable`.
    pub fn assign_with<T, B, F>(&self, matrix: &CostMatrix<T>, factory: F) -> MatchResult<T>
    where
        T: SolverNumeric,
        B: AssignmentBackend<T>,
        F: FnOnce() -> Result<B, BackendUnavailable>,
    {
        match factory() {
            Ok(mut backend) => self.assign(matrix, &mut backend),
            Err(err) => {
                tracing::warn!(error = %err, "assignment backend unavailable");
                MatchResult::no_solution(err.into(), SolverStatistics::default())
            }
        }
    }

    fn validate<T>(problem: &AssignmentProblem<'_, T>, assignment: Assignment<T>) -> MatchOutcome<T>
    where
        T: SolverNumeric,
    {
        match problem.validate(&assignment) {
            Ok(()) => MatchOutcome::Matched(assignment),
            Err(violation) => {
                tracing::warn!(%violation, "rejecting backend assignment");
                MatchOutcome::NoSolution(violation.into())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssignerBuilder {
    time_limit: Option<Duration>,
    interrupt: Option<Arc<AtomicBool>>,
    accept_feasible: bool,
    log_progress: bool,
    clock_check_mask: u64,
}

impl Default for AssignerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignerBuilder {
    #[inline]
    pub fn new() -> Self {
        Self {
            time_limit: None,
            interrupt: None,
            accept_feasible: false,
            log_progress: false,
            clock_check_mask: Assigner::DEFAULT_CLOCK_CHECK_MASK,
        }
    }

    #[inline]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    #[inline]
    pub fn with_time_limit_opt(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    /// Stops the backend once `flag` is set.
    #[inline]
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Report an aborted search's best assignment instead of no solution.
    #[inline]
    pub fn with_accept_feasible(mut self, accept: bool) -> Self {
        self.accept_feasible = accept;
        self
    }

    #[inline]
    pub fn with_progress_logging(mut self, enabled: bool) -> Self {
        self.log_progress = enabled;
        self
    }

    #[inline]
    pub fn with_clock_check_mask(mut self, mask: u64) -> Self {
        self.clock_check_mask = mask;
        self
    }

    #[inline]
    pub fn build(self) -> Assigner {
        Assigner {
            time_limit: self.time_limit,
            interrupt: self.interrupt,
            accept_feasible: self.accept_feasible,
            log_progress: self.log_progress,
            clock_check_mask: self.clock_check_mask,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkmatch_bnb::bnb::BnbSolver;
    use linkmatch_hungarian::hungarian::HungarianSolver;
    use linkmatch_model::index::{CenterIndex, DeviceIndex};
    use linkmatch_search::result::BackendOutcome;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    type IntegerType = i64;

    /// Returns a fixed answer regardless of the problem.
    struct Scripted {
        outcome: BackendOutcome<IntegerType>,
        calls: usize,
    }

    impl Scripted {
        fn new(outcome: BackendOutcome<IntegerType>) -> Self {
            Self { outcome, calls: 0 }
        }
    }

    impl AssignmentBackend<IntegerType> for Scripted {
        fn name(&self) -> &str {
            "Scripted"
        }

        fn solve(&mut self, _ctx: SolveContext<'_, IntegerType>) -> BackendOutcome<IntegerType> {
            self.calls += 1;
            self.outcome.clone()
        }
    }

    fn c(j: usize) -> CenterIndex {
        CenterIndex::new(j)
    }

    fn matrix() -> CostMatrix<IntegerType> {
        CostMatrix::from_rows(vec![vec![4, 1, 3], vec![2, 0, 5]])
    }

    #[test]
    fn test_optimal_assignment_is_returned() {
        let m = matrix();
        let result = Assigner::new().assign(&m, &mut HungarianSolver::new());
        let a = result.assignment().expect("expected a match");
        // 0 -> 1, 1 -> 0 costs 3; 0 -> 2, 1 -> 1 costs 3 as well.
        assert_eq!(a.total_cost(), 3);
        assert_eq!(a.num_devices(), 2);
        assert_eq!(AssignmentProblem::new(&m).validate(a), Ok(()));
    }

    #[test]
    fn test_more_devices_than_centers_never_calls_backend() {
        let m = CostMatrix::from_rows(vec![vec![0], vec![0]]);
        let mut backend = Scripted::new(BackendOutcome::optimal(
            Assignment::from_parts(0, vec![c(0), c(0)], vec![0, 0]),
            SolverStatistics::default(),
        ));
        let result = Assigner::new().assign(&m, &mut backend);
        assert_eq!(
            result.outcome().no_solution_reason(),
            Some(&NoSolutionReason::Infeasible)
        );
        assert_eq!(backend.calls, 0);
    }

    #[test]
    fn test_backend_infeasible_is_no_solution() {
        let m = matrix();
        let mut backend = Scripted::new(BackendOutcome::infeasible(SolverStatistics::default()));
        let result = Assigner::new().assign(&m, &mut backend);
        assert_eq!(
            result.into_outcome(),
            MatchOutcome::NoSolution(NoSolutionReason::Infeasible)
        );
    }

    #[test]
    fn test_unavailable_backend_is_no_solution() {
        let m = matrix();
        let result = Assigner::new().assign_with(&m, || {
            Err::<HungarianSolver, _>(BackendUnavailable::new("mip", "no license"))
        });
        match result.outcome().no_solution_reason() {
            Some(NoSolutionReason::SolverUnavailable(err)) => assert_eq!(err.backend, "mip"),
            other => panic!("expected SolverUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_factory_backend_is_used() {
        let m = matrix();
        let result = Assigner::new().assign_with(&m, || Ok(BnbSolver::<IntegerType>::new()));
        assert_eq!(result.assignment().map(|a| a.total_cost()), Some(3));
    }

    #[test]
    fn test_inconsistent_answer_is_rejected() {
        let m = matrix();
        // Both devices on center 1.
        let mut backend = Scripted::new(BackendOutcome::optimal(
            Assignment::from_parts(0, vec![c(1), c(1)], vec![1, 0]),
            SolverStatistics::default(),
        ));
        let result = Assigner::new().assign(&m, &mut backend);
        assert_eq!(
            result.outcome().no_solution_reason(),
            Some(&NoSolutionReason::InvalidSolution(
                AssignmentViolation::CenterReused {
                    center: c(1),
                    first: DeviceIndex::new(0),
                    second: DeviceIndex::new(1),
                }
            ))
        );
    }

    #[test]
    fn test_answer_breaking_a_constraint_family_is_rejected() {
        let m = matrix();
        let answers = [
            // Device 1 left unassigned.
            Assignment::from_parts(1, vec![c(1)], vec![1]),
            // Center 3 does not exist; rejected before any cell is read.
            Assignment::from_parts(1, vec![c(1), c(3)], vec![1, 0]),
        ];
        for answer in answers {
            let mut backend =
                Scripted::new(BackendOutcome::optimal(answer, SolverStatistics::default()));
            let result = Assigner::new().assign(&m, &mut backend);
            match result.outcome().no_solution_reason() {
                Some(NoSolutionReason::InvalidSolution(
                    AssignmentViolation::DeviceCount { expected: 2, actual: 1 }
                    | AssignmentViolation::CenterOutOfBounds { num_centers: 3, .. },
                )) => {}
                other => panic!("expected a constraint violation, got {:?}", other),
            }
            assert_eq!(backend.calls, 1);
        }
    }

    #[test]
    fn test_total_that_is_not_the_objective_is_rejected() {
        let m = matrix();
        let mut backend = Scripted::new(BackendOutcome::optimal(
            Assignment::from_parts(1, vec![c(1), c(0)], vec![1, 2]),
            SolverStatistics::default(),
        ));
        let result = Assigner::new().assign(&m, &mut backend);
        assert_eq!(
            result.outcome().no_solution_reason(),
            Some(&NoSolutionReason::InvalidSolution(AssignmentViolation::TotalMismatch))
        );
    }

    #[test]
    fn test_accepted_feasible_answer_is_still_validated() {
        let m = matrix();
        let mut backend = Scripted::new(BackendOutcome::aborted(
            Some(Assignment::from_parts(2, vec![c(0), c(0)], vec![4, 2])),
            "time limit reached",
            SolverStatistics::default(),
        ));
        let result = Assigner::builder()
            .with_accept_feasible(true)
            .build()
            .assign(&m, &mut backend);
        assert!(matches!(
            result.outcome().no_solution_reason(),
            Some(NoSolutionReason::InvalidSolution(
                AssignmentViolation::CenterReused { .. }
            ))
        ));
    }

    #[test]
    fn test_misreported_cost_is_rejected() {
        let m = matrix();
        let mut backend = Scripted::new(BackendOutcome::optimal(
            Assignment::from_parts(0, vec![c(1), c(0)], vec![0, 0]),
            SolverStatistics::default(),
        ));
        let result = Assigner::new().assign(&m, &mut backend);
        assert!(matches!(
            result.outcome().no_solution_reason(),
            Some(NoSolutionReason::InvalidSolution(
                AssignmentViolation::CostMismatch { .. }
            ))
        ));
    }

    #[test]
    fn test_zero_time_limit_is_aborted_not_infeasible() {
        let m = matrix();
        let assigner = Assigner::builder()
            .with_time_limit(Duration::ZERO)
            .with_clock_check_mask(0)
            .build();

        for result in [
            assigner.assign(&m, &mut HungarianSolver::new()),
            assigner.assign(&m, &mut BnbSolver::new()),
        ] {
            assert!(
                matches!(
                    result.outcome().no_solution_reason(),
                    Some(NoSolutionReason::Aborted(_))
                ),
                "got {:?}",
                result.outcome()
            );
        }
    }

    #[test]
    fn test_accept_feasible_returns_unproven_incumbent() {
        let m = matrix();
        let assigner = Assigner::builder()
            .with_time_limit(Duration::ZERO)
            .with_clock_check_mask(0)
            .with_accept_feasible(true)
            .build();
        assert!(assigner.accepts_feasible());

        let result = assigner.assign(&m, &mut BnbSolver::new());
        let a = result.assignment().expect("greedy incumbent expected");
        assert_eq!(AssignmentProblem::new(&m).validate(a), Ok(()));
    }

    #[test]
    fn test_raised_interrupt_aborts() {
        let m = matrix();
        let assigner = Assigner::builder()
            .with_interrupt(Arc::new(AtomicBool::new(true)))
            .build();
        let result = assigner.assign(&m, &mut HungarianSolver::new());
        match result.outcome().no_solution_reason() {
            Some(NoSolutionReason::Aborted(msg)) => assert!(msg.contains("interrupt")),
            other => panic!("expected Aborted, got {:?}", other),
        }
    }

    #[test]
    fn test_complete_and_consistent_on_random_inputs() {
        let mut rng = StdRng::seed_from_u64(11);
        let assigner = Assigner::builder().with_progress_logging(true).build();
        for _ in 0..100 {
            let d = rng.random_range(0..=6);
            let c = rng.random_range(d..=7);
            let costs = (0..d * c).map(|_| rng.random_range(0..10)).collect();
            let m = CostMatrix::from_flat(d, c, costs);

            let lhs = assigner.assign(&m, &mut HungarianSolver::new());
            let rhs = assigner.assign(&m, &mut BnbSolver::new());
            let (lhs, rhs) = (lhs.assignment().unwrap(), rhs.assignment().unwrap());

            assert_eq!(lhs.num_devices(), d);
            assert_eq!(lhs.total_cost(), rhs.total_cost());
            let sum: IntegerType = (0..d)
                .map(|i| m.cost(DeviceIndex::new(i), lhs.center_for_device(DeviceIndex::new(i))))
                .sum();
            assert_eq!(lhs.total_cost(), sum);
        }
    }

    #[test]
    fn test_dyn_backend_is_accepted() {
        let m = matrix();
        let mut backend: Box<dyn AssignmentBackend<IntegerType>> = Box::new(HungarianSolver::new());
        let result = Assigner::new().assign(&m, backend.as_mut());
        assert!(result.outcome().is_matched());
    }

    #[test]
    fn test_no_solution_reason_messages() {
        assert_eq!(
            NoSolutionReason::Infeasible.to_string(),
            "the assignment problem is infeasible"
        );
        assert_eq!(
            NoSolutionReason::Aborted("time limit reached".into()).to_string(),
            "the search was aborted: time limit reached"
        );
    }
}
