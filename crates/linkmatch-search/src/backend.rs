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

//! # Assignment Backends
//!
//! The assigner does not solve anything itself. It hands the problem and a
//! monitor to an `AssignmentBackend` and validates whatever comes back. A
//! backend must either prove optimality, prove infeasibility, or report that
//! it was stopped by the monitor.
//!
//! Backends that depend on something outside the process (a library, a
//! license, a remote service) are built through a fallible factory and report
//! `BackendUnavailable` when that dependency is missing.

use crate::{monitor::search_monitor::SearchMonitor, problem::AssignmentProblem, result::BackendOutcome};
use num_traits::{PrimInt, Signed};

/// Everything a backend gets to see during one solve.
pub struct SolveContext<'a, T>
where
    T: PrimInt + Signed,
{
    pub problem: &'a AssignmentProblem<'a, T>,
    pub monitor: &'a mut dyn SearchMonitor<T>,
}

impl<'a, T> SolveContext<'a, T>
where
    T: PrimInt + Signed,
{
    #[inline]
    pub fn new(
        problem: &'a AssignmentProblem<'a, T>,
        monitor: &'a mut dyn SearchMonitor<T>,
    ) -> Self {
        Self { problem, monitor }
    }
}

impl<'a, T> std::fmt::Debug for SolveContext<'a, T>
where
    T: PrimInt + Signed,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolveContext")
            .field("num_devices", &self.problem.num_devices())
            .field("num_centers", &self.problem.num_centers())
            .field("monitor", &self.monitor.name())
            .finish()
    }
}

pub trait AssignmentBackend<T>
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str;
    fn solve(&mut self, ctx: SolveContext<'_, T>) -> BackendOutcome<T>;
}

impl<T, B> AssignmentBackend<T> for Box<B>
where
    T: PrimInt + Signed,
    B: AssignmentBackend<T> + ?Sized,
{
    #[inline]
    fn name(&self) -> &str {
        (**self).name()
    }

    #[inline]
    fn solve(&mut self, ctx: SolveContext<'_, T>) -> BackendOutcome<T> {
        (**self).solve(ctx)
    }
}

impl<T> std::fmt::Debug for dyn AssignmentBackend<T> + '_
where
    T: PrimInt + Signed,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AssignmentBackend({})", self.name())
    }
}

/// A backend could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("assignment backend `{backend}` is unavailable: {reason}")]
pub struct BackendUnavailable {
    pub backend: String,
    pub reason: String,
}

impl BackendUnavailable {
    #[inline]
    pub fn new<B, R>(backend: B, reason: R) -> Self
    where
        B: Into<String>,
        R: Into<String>,
    {
        Self {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}
