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

//! # Match Reports
//!
//! Plain-text rendering of a match:
//!
//! ```text
//! Total cost = 2.0
//! Device A assigned to cluster center (1, 0). Cost: 1.0
//! Device B assigned to cluster center (0, 1). Cost: 1.0
//! ```
//!
//! or the single line `No solution found.` Costs carry one fractional digit.
//! Every line, including the last, ends with a newline.

use crate::assigner::MatchOutcome;
use linkmatch_model::signature::CenterToken;
use num_traits::{PrimInt, Signed};

pub const NO_SOLUTION_LINE: &str = "No solution found.";

/// A cost printed with one fractional digit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ReportCost<T>(T);

impl<T> std::fmt::Display for ReportCost<T>
where
    T: PrimInt,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.to_f64() {
            Some(value) => write!(f, "{:.1}", value),
            None => write!(f, "{}.0", self.0.to_i128().unwrap_or_default()),
        }
    }
}

/// Borrowed view of a match that renders as the report text.
#[derive(Debug)]
pub struct ReportView<'a, T, D> {
    devices: &'a [D],
    centers: &'a [CenterToken],
    outcome: &'a MatchOutcome<T>,
}

impl<'a, T, D> ReportView<'a, T, D>
where
    T: PrimInt + Signed,
    D: AsRef<str>,
{
    /// # Panics
    ///
    /// Panics if `outcome` is a match over a different number of devices
    /// than `devices` names.
    pub fn new(devices: &'a [D], centers: &'a [CenterToken], outcome: &'a MatchOutcome<T>) -> Self {
        if let Some(assignment) = outcome.assignment() {
            assert_eq!(
                assignment.num_devices(),
                devices.len(),
                "called `ReportView::new` with {} device names for an assignment of {} devices",
                devices.len(),
                assignment.num_devices()
            );
        }

        Self {
            devices,
            centers,
            outcome,
        }
    }
}

impl<'a, T, D> std::fmt::Display for ReportView<'a, T, D>
where
    T: PrimInt + Signed,
    D: AsRef<str>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(assignment) = self.outcome.assignment() else {
            return writeln!(f, "{}", NO_SOLUTION_LINE);
        };

        writeln!(f, "Total cost = {}", ReportCost(assignment.total_cost()))?;
        for pair in assignment.pairs() {
            writeln!(
                f,
                "Device {} assigned to cluster center {}. Cost: {}",
                self.devices[pair.device.get()].as_ref(),
                self.centers[pair.center.get()],
                ReportCost(pair.cost)
            )?;
        }
        Ok(())
    }
}

/// Renders `outcome` for the given device names and center tokens.
///
/// # Panics
///
/// Panics if the assignment refers to a device or center outside `devices`
/// or `centers`.
pub fn render<T, D>(devices: &[D], centers: &[CenterToken], outcome: &MatchOutcome<T>) -> String
where
    T: PrimInt + Signed,
    D: AsRef<str>,
{
    ReportView::new(devices, centers, outcome).to_string()
}
