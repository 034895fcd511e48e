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

use linkmatch_model::{assignment::Assignment, index::CenterIndex};
use linkmatch_search::{
    backend::{AssignmentBackend, SolveContext},
    monitor::search_monitor::SearchCommand,
    result::BackendOutcome,
    stats::SolverStatisticsBuilder,
};
use num_traits::{PrimInt, Signed};

const INF: i128 = i128::MAX;

/// Hungarian method for rectangular cost matrices with `rows <= cols`.
///
/// Potentials are kept as `i128` regardless of the cost type, so
/// intermediate reduced costs cannot overflow for any matrix a narrower
/// signed type can hold. The scratch buffers are reused across solves.
#[derive(Debug, Clone, Default)]
pub struct HungarianSolver {
    // Row potentials, indexed 1..=rows.
    u: Vec<i128>,
    // Column potentials, indexed 1..=cols.
    v: Vec<i128>,
    // p[j] is the row matched to column j, 0 if none.
    p: Vec<usize>,
    way: Vec<usize>,
    minv: Vec<i128>,
    used: Vec<bool>,
}

impl HungarianSolver {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a solver with buffers sized for `num_devices` by
    /// `num_centers` problems.
    #[inline]
    pub fn preallocated(num_devices: usize, num_centers: usize) -> Self {
        Self {
            u: Vec::with_capacity(num_devices + 1),
            v: Vec::with_capacity(num_centers + 1),
            p: Vec::with_capacity(num_centers + 1),
            way: Vec::with_capacity(num_centers + 1),
            minv: Vec::with_capacity(num_centers + 1),
            used: Vec::with_capacity(num_centers + 1),
        }
    }

    fn reset(&mut self, rows: usize, cols: usize) {
        self.u.clear();
        self.u.resize(rows + 1, 0);
        self.v.clear();
        self.v.resize(cols + 1, 0);
        self.p.clear();
        self.p.resize(cols + 1, 0);
        self.way.clear();
        self.way.resize(cols + 1, 0);
    }
}

impl<T> AssignmentBackend<T> for HungarianSolver
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "HungarianSolver"
    }

    fn solve(&mut self, ctx: SolveContext<'_, T>) -> BackendOutcome<T> {
        let start_time = std::time::Instant::now();
        let problem = ctx.problem;
        let monitor = ctx.monitor;
        let matrix = problem.matrix();
        let rows = problem.num_devices();
        let cols = problem.num_centers();

        monitor.on_enter_search(problem);

        let mut steps: u64 = 0;
        let finish = |steps: u64, solutions: u64| {
            SolverStatisticsBuilder::new()
                .steps(steps)
                .solutions_found(solutions)
                .solve_duration(start_time.elapsed())
                .build()
        };

        if problem.is_structurally_infeasible() {
            monitor.on_exit_search();
            return BackendOutcome::infeasible(finish(steps, 0));
        }

        self.reset(rows, cols);

        // Costs as i128, 1-indexed with a zero guard row and column.
        let cost = |i: usize, j: usize| -> i128 {
            matrix.as_slice()[(i - 1) * cols + (j - 1)]
                .to_i128()
                .unwrap_or(INF)
        };

        for i in 1..=rows {
            self.p[0] = i;
            let mut j0 = 0usize;
            self.minv.clear();
            self.minv.resize(cols + 1, INF);
            self.used.clear();
            self.used.resize(cols + 1, false);

            loop {
                if let SearchCommand::Terminate(reason) = monitor.search_command() {
                    monitor.on_exit_search();
                    return BackendOutcome::aborted(None, reason, finish(steps, 0));
                }

                self.used[j0] = true;
                let i0 = self.p[j0];
                let mut delta = INF;
                let mut j1 = 0usize;

                for j in 1..=cols {
                    if self.used[j] {
                        continue;
                    }
                    let cur = cost(i0, j)
                        .saturating_sub(self.u[i0])
                        .saturating_sub(self.v[j]);
                    if cur < self.minv[j] {
                        self.minv[j] = cur;
                        self.way[j] = j0;
                    }
                    if self.minv[j] < delta {
                        delta = self.minv[j];
                        j1 = j;
                    }
                }

                for j in 0..=cols {
                    if self.used[j] {
                        self.u[self.p[j]] += delta;
                        self.v[j] -= delta;
                    } else {
                        self.minv[j] = self.minv[j].saturating_sub(delta);
                    }
                }

                monitor.on_step();
                steps += 1;

                j0 = j1;
                if self.p[j0] == 0 {
                    break;
                }
            }

            // Flip the augmenting path.
            loop {
                let j1 = self.way[j0];
                self.p[j0] = self.p[j1];
                j0 = j1;
                if j0 == 0 {
                    break;
                }
            }
        }

        let mut centers = vec![CenterIndex::new(0); rows];
        for j in 1..=cols {
            if self.p[j] != 0 {
                centers[self.p[j] - 1] = CenterIndex::new(j - 1);
            }
        }

        let Some(assignment) = Assignment::from_matrix(matrix, centers) else {
            monitor.on_exit_search();
            return BackendOutcome::aborted(
                None,
                "total cost overflows the cost type",
                finish(steps, 0),
            );
        };

        monitor.on_solution_found(&assignment);
        monitor.on_exit_search();
        BackendOutcome::optimal(assignment, finish(steps, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkmatch_model::{index::DeviceIndex, matrix::CostMatrix};
    use linkmatch_search::{
        monitor::{
            interrupt::InterruptMonitor, no_op::NoOperationMonitor, time_limit::TimeLimitMonitor,
        },
        problem::AssignmentProblem,
        result::{SolverResult, TerminationReason},
    };
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use std::sync::{Arc, atomic::AtomicBool};
    use std::time::Duration;

    type IntegerType = i64;

    fn solve(m: &CostMatrix<IntegerType>) -> BackendOutcome<IntegerType> {
        let problem = AssignmentProblem::new(m);
        let mut monitor = NoOperationMonitor::new();
        HungarianSolver::new().solve(SolveContext::new(&problem, &mut monitor))
    }

    /// Exhaustive minimum over all injective device-to-center maps.
    fn brute_force(m: &CostMatrix<IntegerType>) -> Option<IntegerType> {
        fn go(
            m: &CostMatrix<IntegerType>,
            device: usize,
            used: &mut Vec<bool>,
            acc: IntegerType,
            best: &mut Option<IntegerType>,
        ) {
            if device == m.num_devices() {
                *best = Some(best.map_or(acc, |b| b.min(acc)));
                return;
            }
            for c in 0..m.num_centers() {
                if !used[c] {
                    used[c] = true;
                    let cost = m.cost(DeviceIndex::new(device), CenterIndex::new(c));
                    go(m, device + 1, used, acc + cost, best);
                    used[c] = false;
                }
            }
        }

        let mut best = None;
        go(m, 0, &mut vec![false; m.num_centers()], 0, &mut best);
        best
    }

    fn random_matrix(rng: &mut StdRng, d: usize, c: usize) -> CostMatrix<IntegerType> {
        let costs = (0..d * c).map(|_| rng.random_range(0..20)).collect();
        CostMatrix::from_flat(d, c, costs)
    }

    fn optimal_assignment(outcome: &BackendOutcome<IntegerType>) -> &Assignment<IntegerType> {
        match outcome.result() {
            SolverResult::Optimal(a) => a,
            other => panic!("expected Optimal, got {:?}", other),
        }
    }

    #[test]
    fn test_square_matrix_with_unique_optimum() {
        let m = CostMatrix::from_rows(vec![vec![0, 1, 2], vec![1, 0, 1], vec![2, 1, 0]]);
        let outcome = solve(&m);
        let a = optimal_assignment(&outcome);
        assert_eq!(a.total_cost(), 0);
        assert_eq!(
            a.centers(),
            &[CenterIndex::new(0), CenterIndex::new(1), CenterIndex::new(2)]
        );
        assert_eq!(AssignmentProblem::new(&m).validate(a), Ok(()));
        assert_eq!(outcome.statistics().solutions_found, 1);
    }

    #[test]
    fn test_rectangular_matrix_leaves_centers_unused() {
        let m = CostMatrix::from_rows(vec![vec![5, 1, 9, 3], vec![4, 2, 8, 0]]);
        let outcome = solve(&m);
        let a = optimal_assignment(&outcome);
        assert_eq!(a.total_cost(), 1);
        assert_eq!(a.center_for_device(DeviceIndex::new(0)), CenterIndex::new(1));
        assert_eq!(a.center_for_device(DeviceIndex::new(1)), CenterIndex::new(3));
    }

    #[test]
    fn test_conflicting_preferences_resolved_globally() {
        // Both devices prefer center 0; the greedy choice is suboptimal.
        let m = CostMatrix::from_rows(vec![vec![1, 2], vec![1, 10]]);
        let a = optimal_assignment(&solve(&m)).clone();
        assert_eq!(a.total_cost(), 3);
        assert_eq!(a.center_for_device(DeviceIndex::new(1)), CenterIndex::new(0));
    }

    #[test]
    fn test_matches_brute_force_on_random_matrices() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        for _ in 0..200 {
            let d = rng.random_range(1..=5);
            let c = rng.random_range(d..=6);
            let m = random_matrix(&mut rng, d, c);
            let outcome = solve(&m);
            let a = optimal_assignment(&outcome);
            assert_eq!(AssignmentProblem::new(&m).validate(a), Ok(()));
            assert_eq!(Some(a.total_cost()), brute_force(&m), "matrix:\n{}", m);
        }
    }

    #[test]
    fn test_more_devices_than_centers_is_infeasible() {
        let m = CostMatrix::from_rows(vec![vec![0, 1], vec![1, 0], vec![2, 2]]);
        let outcome = solve(&m);
        assert!(outcome.is_infeasible());
        assert_eq!(outcome.reason(), &TerminationReason::InfeasibilityProven);
    }

    #[test]
    fn test_no_devices_is_trivially_optimal() {
        let m = CostMatrix::<IntegerType>::from_flat(0, 3, Vec::new());
        let outcome = solve(&m);
        let a = optimal_assignment(&outcome);
        assert_eq!(a.num_devices(), 0);
        assert_eq!(a.total_cost(), 0);
    }

    #[test]
    fn test_zero_time_limit_aborts_without_assignment() {
        let m = CostMatrix::from_rows(vec![vec![1, 2], vec![3, 4]]);
        let problem = AssignmentProblem::new(&m);
        let mut monitor = TimeLimitMonitor::with_clock_check_mask(Duration::ZERO, 0);
        let outcome = HungarianSolver::new().solve(SolveContext::new(&problem, &mut monitor));

        assert_eq!(outcome.result(), &SolverResult::Unknown);
        assert!(matches!(outcome.reason(), TerminationReason::Aborted(_)));
    }

    #[test]
    fn test_raised_interrupt_aborts() {
        let m = CostMatrix::from_rows(vec![vec![1, 2], vec![3, 4]]);
        let problem = AssignmentProblem::new(&m);
        let mut monitor = InterruptMonitor::new(Arc::new(AtomicBool::new(true)));
        let outcome = HungarianSolver::new().solve(SolveContext::new(&problem, &mut monitor));
        assert_eq!(outcome.result(), &SolverResult::Unknown);
    }

    #[test]
    fn test_solver_is_reusable_across_problem_sizes() {
        let mut solver = HungarianSolver::preallocated(2, 2);
        let mut monitor = NoOperationMonitor::new();

        let big = CostMatrix::from_rows(vec![vec![3, 1, 2], vec![1, 3, 2], vec![2, 2, 0]]);
        let problem = AssignmentProblem::new(&big);
        let first = solver.solve(SolveContext::new(&problem, &mut monitor));
        assert_eq!(optimal_assignment(&first).total_cost(), 2);

        let small = CostMatrix::from_rows(vec![vec![7, 6]]);
        let problem = AssignmentProblem::new(&small);
        let second = solver.solve(SolveContext::new(&problem, &mut monitor));
        assert_eq!(optimal_assignment(&second).total_cost(), 6);
    }

    #[test]
    fn test_narrow_cost_type() {
        let m = CostMatrix::<i8>::from_rows(vec![vec![100, 120], vec![120, 100]]);
        let problem = AssignmentProblem::new(&m);
        let mut monitor = NoOperationMonitor::new();
        let outcome = HungarianSolver::new().solve(SolveContext::new(&problem, &mut monitor));
        // 200 does not fit in i8.
        assert_eq!(outcome.result(), &SolverResult::Unknown);
    }
}
