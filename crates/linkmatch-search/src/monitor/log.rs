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

//! # Log Monitor
//!
//! Emits `tracing` events for the search lifecycle and a progress line at
//! most once per `log_interval`. The clock is consulted only when
//! `(steps & clock_check_mask) == 0`.

use crate::{
    monitor::search_monitor::{SearchCommand, SearchMonitor},
    problem::AssignmentProblem,
};
use linkmatch_model::assignment::Assignment;
use num_traits::{PrimInt, Signed};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct LogMonitor<T> {
    start_time: Instant,
    last_log_time: Instant,
    log_interval: Duration,
    clock_check_mask: u64,
    steps: u64,
    solutions: u64,
    best_objective: Option<T>,
}

impl<T> LogMonitor<T> {
    pub fn new(log_interval: Duration, clock_check_mask: u64) -> Self {
        Self {
            start_time: Instant::now(),
            last_log_time: Instant::now(),
            log_interval,
            clock_check_mask,
            steps: 0,
            solutions: 0,
            best_objective: None,
        }
    }

    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[inline]
    pub fn solutions(&self) -> u64 {
        self.solutions
    }
}

impl<T> Default for LogMonitor<T> {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 0xFFF)
    }
}

impl<T> SearchMonitor<T> for LogMonitor<T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn name(&self) -> &str {
        "LogMonitor"
    }

    fn on_enter_search(&mut self, problem: &AssignmentProblem<'_, T>) {
        self.start_time = Instant::now();
        self.last_log_time = self.start_time;
        self.steps = 0;
        self.solutions = 0;
        self.best_objective = None;
        tracing::debug!(
            devices = problem.num_devices(),
            centers = problem.num_centers(),
            "search started"
        );
    }

    fn on_exit_search(&mut self) {
        tracing::debug!(
            steps = self.steps,
            solutions = self.solutions,
            best = ?self.best_objective.map(|b| b.to_string()),
            elapsed_secs = self.start_time.elapsed().as_secs_f64(),
            "search finished"
        );
    }

    fn on_solution_found(&mut self, solution: &Assignment<T>) {
        self.solutions += 1;
        self.best_objective = Some(solution.total_cost());
        tracing::debug!(
            total_cost = %solution.total_cost(),
            step = self.steps,
            "improving assignment found"
        );
    }

    fn on_step(&mut self) {
        self.steps = self.steps.wrapping_add(1);
        if (self.steps & self.clock_check_mask) != 0 {
            return;
        }

        let now = Instant::now();
        if now.duration_since(self.last_log_time) >= self.log_interval {
            let best = match self.best_objective {
                Some(b) => b.to_string(),
                None => "Inf".to_string(),
            };
            tracing::info!(
                elapsed_secs = now.duration_since(self.start_time).as_secs_f64(),
                steps = self.steps,
                best = %best,
                "search progress"
            );
            self.last_log_time = now;
        }
    }

    #[inline(always)]
    fn search_command(&self) -> SearchCommand {
        SearchCommand::Continue
    }
}
