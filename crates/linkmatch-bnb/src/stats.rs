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

use linkmatch_search::stats::{SolverStatistics, SolverStatisticsBuilder};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BnbStatistics {
    /// Tree nodes entered.
    pub nodes_explored: u64,
    /// Levels closed after all their candidates were tried or pruned.
    pub backtracks: u64,
    /// Candidates discarded because their bound reached the incumbent.
    pub prunings_bound: u64,
    /// Strictly improving assignments, including the greedy start.
    pub solutions_found: u64,
    /// Deepest level reached.
    pub max_depth: u64,
    pub time_total: Duration,
}

impl BnbStatistics {
    #[inline]
    pub fn on_node_explored(&mut self) {
        self.nodes_explored = self.nodes_explored.saturating_add(1);
    }

    #[inline]
    pub fn on_backtrack(&mut self) {
        self.backtracks = self.backtracks.saturating_add(1);
    }

    #[inline]
    pub fn on_pruning_bound(&mut self) {
        self.prunings_bound = self.prunings_bound.saturating_add(1);
    }

    #[inline]
    pub fn on_solution_found(&mut self) {
        self.solutions_found = self.solutions_found.saturating_add(1);
    }

    #[inline]
    pub fn on_depth_update(&mut self, depth: u64) {
        self.max_depth = self.max_depth.max(depth);
    }

    #[inline]
    pub fn set_total_time(&mut self, duration: Duration) {
        self.time_total = duration;
    }

    /// Collapses the tree counters into the backend-independent summary.
    pub fn to_solver_statistics(&self) -> SolverStatistics {
        SolverStatisticsBuilder::new()
            .steps(self.nodes_explored)
            .solutions_found(self.solutions_found)
            .solve_duration(self.time_total)
            .build()
    }
}

impl std::fmt::Display for BnbStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Branch-and-Bound Statistics:")?;
        writeln!(f, "  Nodes Explored: {}", self.nodes_explored)?;
        writeln!(f, "  Backtracks: {}", self.backtracks)?;
        writeln!(f, "  Prunings (Bound): {}", self.prunings_bound)?;
        writeln!(f, "  Solutions Found: {}", self.solutions_found)?;
        writeln!(f, "  Max Depth: {}", self.max_depth)?;
        writeln!(
            f,
            "  Total Time (secs): {:.3}",
            self.time_total.as_secs_f64()
        )
    }
}
