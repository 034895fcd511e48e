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

//! # Branch-and-Bound Backend
//!
//! Depth-first search over devices, one device per tree level, in the order
//! chosen by a `DeviceOrder`. Each level's candidates are the device's unused
//! centers, tried cheapest first. A greedy assignment seeds the incumbent,
//! and a `LowerBound` on the remaining devices prunes every subtree that
//! cannot beat it. Only strictly better assignments replace the incumbent,
//! so among equal-cost optima the first one found is kept.
//!
//! The search is exhaustive unless the monitor stops it, in which case the
//! incumbent is reported as feasible but unproven.

use crate::{
    bound::{LowerBound, UnusedColumnBound, mark},
    branching::{DeviceOrder, RegretOrder, cheapest_center},
    stack::{Candidate, SearchStack},
    stats::BnbStatistics,
};
use fixedbitset::FixedBitSet;
use linkmatch_model::{
    assignment::Assignment,
    index::{CenterIndex, DeviceIndex},
    matrix::CostMatrix,
};
use linkmatch_search::{
    backend::{AssignmentBackend, SolveContext},
    monitor::search_monitor::{SearchCommand, SearchMonitor},
    num::SolverNumeric,
    problem::AssignmentProblem,
    result::BackendOutcome,
};

pub struct BnbSolver<T, O = RegretOrder<T>, L = UnusedColumnBound> {
    stack: SearchStack<T>,
    trail: Vec<Candidate<T>>,
    scratch: Vec<Candidate<T>>,
    used: FixedBitSet,
    device_order: O,
    lower_bound: L,
}

impl<T> BnbSolver<T> {
    /// Regret ordering with the unused-column bound.
    #[inline]
    pub fn new() -> Self {
        Self::with_strategies(RegretOrder::new(), UnusedColumnBound)
    }
}

impl<T> Default for BnbSolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, O, L> BnbSolver<T, O, L> {
    #[inline]
    pub fn with_strategies(device_order: O, lower_bound: L) -> Self {
        Self {
            stack: SearchStack::new(),
            trail: Vec::new(),
            scratch: Vec::new(),
            used: FixedBitSet::new(),
            device_order,
            lower_bound,
        }
    }

    #[inline]
    pub fn device_order(&self) -> &O {
        &self.device_order
    }

    #[inline]
    pub fn lower_bound(&self) -> &L {
        &self.lower_bound
    }

    #[inline]
    fn reset(&mut self) {
        self.stack.reset();
        self.trail.clear();
        self.scratch.clear();
        self.used.clear();
    }
}

impl<T, O, L> std::fmt::Debug for BnbSolver<T, O, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BnbSolver")
            .field("stack", &self.stack.to_string())
            .field("trail_len", &self.trail.len())
            .finish()
    }
}

impl<T, O, L> AssignmentBackend<T> for BnbSolver<T, O, L>
where
    T: SolverNumeric,
    O: DeviceOrder<T>,
    L: LowerBound<T>,
{
    fn name(&self) -> &str {
        "BnbSolver"
    }

    fn solve(&mut self, ctx: SolveContext<'_, T>) -> BackendOutcome<T> {
        let session = BnbSearchSession::new(self, ctx.problem, ctx.monitor);
        let outcome = session.run();
        self.reset();
        outcome
    }
}

struct BnbSearchSession<'s, 'a, T, O, L>
where
    T: SolverNumeric,
{
    solver: &'s mut BnbSolver<T, O, L>,
    problem: &'a AssignmentProblem<'a, T>,
    monitor: &'a mut dyn SearchMonitor<T>,
    order: Vec<DeviceIndex>,
    current_cost: T,
    best: Option<Assignment<T>>,
    stats: BnbStatistics,
    start_time: std::time::Instant,
}

impl<'s, 'a, T, O, L> BnbSearchSession<'s, 'a, T, O, L>
where
    T: SolverNumeric,
    O: DeviceOrder<T>,
    L: LowerBound<T>,
{
    fn new(
        solver: &'s mut BnbSolver<T, O, L>,
        problem: &'a AssignmentProblem<'a, T>,
        monitor: &'a mut dyn SearchMonitor<T>,
    ) -> Self {
        Self {
            solver,
            problem,
            monitor,
            order: Vec::new(),
            current_cost: T::zero(),
            best: None,
            stats: BnbStatistics::default(),
            start_time: std::time::Instant::now(),
        }
    }

    #[inline]
    fn matrix(&self) -> &'a CostMatrix<T> {
        self.problem.matrix()
    }

    fn run(mut self) -> BackendOutcome<T> {
        self.monitor.on_enter_search(self.problem);

        if self.problem.is_structurally_infeasible() {
            self.stats.set_total_time(self.start_time.elapsed());
            self.monitor.on_exit_search();
            return BackendOutcome::infeasible(self.stats.to_solver_statistics());
        }

        if self.problem.num_devices() == 0 {
            self.install(Assignment::empty());
            return self.finish(None);
        }

        self.initialize();

        let aborted: Option<String> = loop {
            if let SearchCommand::Terminate(msg) = self.monitor.search_command() {
                break Some(msg);
            }
            self.monitor.on_step();

            if self.solver.stack.is_current_level_empty() {
                if self.solver.stack.depth() <= 1 {
                    break None;
                }
                self.backtrack();
            } else {
                self.process_next_candidate();
            }
        };

        self.finish(aborted)
    }

    fn initialize(&mut self) {
        let matrix = self.matrix();
        let num_centers = matrix.num_centers();

        self.solver
            .stack
            .ensure_capacity(matrix.num_devices(), num_centers);
        self.solver.used.clear();
        self.solver.used.grow(num_centers);
        self.order = self.solver.device_order.order(matrix);
        self.solver.lower_bound.prepare(matrix);

        debug_assert_eq!(
            self.order.len(),
            matrix.num_devices(),
            "device order `{}` must list every device exactly once",
            self.solver.device_order().name()
        );

        self.seed_greedy_incumbent();

        self.solver.stack.push_frame();
        self.push_candidates(self.order[0]);
        self.stats.on_node_explored();
        self.stats.on_depth_update(1);
    }

    /// Assigns devices in branching order to their cheapest free center.
    fn seed_greedy_incumbent(&mut self) {
        let matrix = self.matrix();
        let used = &mut self.solver.used;
        let mut centers = vec![CenterIndex::new(0); matrix.num_devices()];

        for &device in &self.order {
            let Some((center, _)) = cheapest_center(matrix, device, |c| !used.contains(c.get()))
            else {
                used.clear();
                return;
            };
            mark(used, center);
            centers[device.get()] = center;
        }
        used.clear();

        if let Some(assignment) = Assignment::from_matrix(matrix, centers) {
            self.install(assignment);
        }
    }

    /// Pushes the free centers of `device` so they pop cheapest first, lowest
    /// center index on ties.
    fn push_candidates(&mut self, device: DeviceIndex) {
        let solver = &mut *self.solver;
        solver.scratch.clear();
        solver.scratch.extend(
            self.problem
                .matrix()
                .row(device)
                .iter()
                .enumerate()
                .filter(|(j, _)| !solver.used.contains(*j))
                .map(|(j, &cost)| Candidate {
                    center: CenterIndex::new(j),
                    cost,
                }),
        );
        solver
            .scratch
            .sort_unstable_by(|a, b| b.cost.cmp(&a.cost).then_with(|| b.center.cmp(&a.center)));
        solver.stack.extend(solver.scratch.drain(..));
    }

    #[inline]
    fn is_dominated(&self, cost: T) -> bool {
        self.best.as_ref().is_some_and(|b| cost >= b.total_cost())
    }

    fn process_next_candidate(&mut self) {
        let Some(candidate) = self.solver.stack.pop() else {
            return;
        };
        let level = self.solver.trail.len();
        let num_devices = self.order.len();

        let Some(new_cost) = self.current_cost.checked_add(&candidate.cost) else {
            self.stats.on_pruning_bound();
            return;
        };

        // Candidates pop in ascending cost order, so the rest of the level
        // is dominated too.
        if self.is_dominated(new_cost) {
            self.solver.stack.clear_current_level();
            self.stats.on_pruning_bound();
            return;
        }

        if level + 1 == num_devices {
            self.record_leaf(candidate);
            return;
        }

        let matrix = self.matrix();
        mark(&mut self.solver.used, candidate.center);
        let completion = self.solver.lower_bound.completion_bound(
            matrix,
            &self.order[level + 1..],
            &self.solver.used,
        );
        let promising = match completion {
            Some(rest) => !self.is_dominated(new_cost.saturating_add(rest)),
            None => false,
        };
        if !promising {
            self.solver.used.set(candidate.center.get(), false);
            self.stats.on_pruning_bound();
            return;
        }

        self.solver.trail.push(candidate);
        self.current_cost = new_cost;
        self.solver.stack.push_frame();
        self.push_candidates(self.order[level + 1]);
        self.stats.on_node_explored();
        self.stats.on_depth_update((level + 2) as u64);
    }

    fn backtrack(&mut self) {
        self.solver.stack.pop_frame();
        self.stats.on_backtrack();
        if let Some(undone) = self.solver.trail.pop() {
            self.solver.used.set(undone.center.get(), false);
            self.current_cost = self.current_cost - undone.cost;
        }
    }

    fn record_leaf(&mut self, last: Candidate<T>) {
        let mut centers = vec![CenterIndex::new(0); self.order.len()];
        for (level, choice) in self.solver.trail.iter().enumerate() {
            centers[self.order[level].get()] = choice.center;
        }
        centers[self.order[self.order.len() - 1].get()] = last.center;

        if let Some(assignment) = Assignment::from_matrix(self.matrix(), centers) {
            self.install(assignment);
        }
    }

    fn install(&mut self, assignment: Assignment<T>) {
        tracing::trace!(
            total_cost = %assignment.total_cost(),
            nodes = self.stats.nodes_explored,
            "new incumbent"
        );
        self.monitor.on_solution_found(&assignment);
        self.stats.on_solution_found();
        self.best = Some(assignment);
    }

    fn finish(mut self, aborted: Option<String>) -> BackendOutcome<T> {
        self.stats.set_total_time(self.start_time.elapsed());
        self.monitor.on_exit_search();

        tracing::debug!(
            device_order = self.solver.device_order().name(),
            lower_bound = self.solver.lower_bound().name(),
            nodes = self.stats.nodes_explored,
            backtracks = self.stats.backtracks,
            prunings = self.stats.prunings_bound,
            solutions = self.stats.solutions_found,
            best = ?self.best.as_ref().map(|b| b.total_cost()),
            aborted = aborted.is_some(),
            "branch-and-bound finished"
        );

        let statistics = self.stats.to_solver_statistics();
        match (aborted, self.best) {
            (None, Some(best)) => BackendOutcome::optimal(best, statistics),
            (None, None) => {
                BackendOutcome::aborted(None, "total cost overflows the cost type", statistics)
            }
            (Some(msg), best) => BackendOutcome::aborted(best, msg, statistics),
        }
    }
}
