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

//! # Assignment Problem Formulation
//!
//! The matching task as a 0/1 integer program over a cost matrix:
//!
//! ```text
//! minimize    Σ_i Σ_j cost[i][j] · x[i,j]
//! subject to  Σ_j x[i,j] = 1      for every device i
//!             Σ_i x[i,j] ≤ 1      for every center j
//!             x[i,j] ∈ {0, 1}
//! ```
//!
//! Backends receive an `AssignmentProblem` and may solve it any way they like
//! as long as the answer is globally optimal. The problem also knows how to
//! check and price a candidate solution, which makes it the single place a
//! backend answer is validated, and can be exported in CPLEX LP format for
//! inspection with external tools.

use linkmatch_model::{
    assignment::{Assignment, AssignmentViolation},
    index::{CenterIndex, DeviceIndex},
    matrix::CostMatrix,
};
use num_traits::{PrimInt, Signed};

/// The sense of a linear constraint with right-hand side `1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintSense {
    /// `Σ x = 1`
    Equal,
    /// `Σ x ≤ 1`
    AtMost,
}

impl ConstraintSense {
    #[inline]
    pub fn as_lp_operator(&self) -> &'static str {
        match self {
            ConstraintSense::Equal => "=",
            ConstraintSense::AtMost => "<=",
        }
    }
}

impl std::fmt::Display for ConstraintSense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} 1", self.as_lp_operator())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AssignmentProblem<'a, T> {
    matrix: &'a CostMatrix<T>,
}

impl<'a, T> AssignmentProblem<'a, T>
where
    T: PrimInt + Signed,
{
    /// Every device row must select exactly one center.
    pub const DEVICE_CONSTRAINT: ConstraintSense = ConstraintSense::Equal;
    /// Every center column may be selected by at most one device.
    pub const CENTER_CONSTRAINT: ConstraintSense = ConstraintSense::AtMost;

    #[inline]
    pub fn new(matrix: &'a CostMatrix<T>) -> Self {
        Self { matrix }
    }

    #[inline]
    pub fn matrix(&self) -> &'a CostMatrix<T> {
        self.matrix
    }

    #[inline]
    pub fn num_devices(&self) -> usize {
        self.matrix.num_devices()
    }

    #[inline]
    pub fn num_centers(&self) -> usize {
        self.matrix.num_centers()
    }

    /// More devices than centers: the device constraints cannot all hold.
    #[inline]
    pub fn is_structurally_infeasible(&self) -> bool {
        !self.matrix.admits_assignment()
    }

    /// Checks a candidate `centers[d]` against both constraint families and
    /// reports the first violated one.
    pub fn check_constraints(&self, centers: &[CenterIndex]) -> Result<(), AssignmentViolation> {
        if centers.len() != self.num_devices() {
            return Err(AssignmentViolation::DeviceCount {
                expected: self.num_devices(),
                actual: centers.len(),
            });
        }

        let mut owner: Vec<Option<DeviceIndex>> = vec![None; self.num_centers()];
        for (i, &center) in centers.iter().enumerate() {
            let device = DeviceIndex::new(i);
            let slot = owner.get_mut(center.get()).ok_or(
                AssignmentViolation::CenterOutOfBounds {
                    device,
                    center,
                    num_centers: self.num_centers(),
                },
            )?;
            if let Some(first) = *slot {
                return Err(AssignmentViolation::CenterReused {
                    center,
                    first,
                    second: device,
                });
            }
            *slot = Some(device);
        }

        Ok(())
    }

    #[inline]
    pub fn is_feasible(&self, centers: &[CenterIndex]) -> bool {
        self.check_constraints(centers).is_ok()
    }

    /// Returns the objective value of `centers`, or `None` on overflow.
    ///
    /// # Panics
    ///
    /// Panics if a device or center is out of bounds.
    pub fn objective_value(&self, centers: &[CenterIndex]) -> Option<T> {
        centers
            .iter()
            .enumerate()
            .try_fold(T::zero(), |acc, (i, &c)| {
                acc.checked_add(&self.matrix.cost(DeviceIndex::new(i), c))
            })
    }

    /// Accepts `assignment` only if it is feasible, every recorded cost is
    /// its matrix cell, and its total is the objective value.
    pub fn validate(&self, assignment: &Assignment<T>) -> Result<(), AssignmentViolation> {
        self.check_constraints(assignment.centers())?;
        assignment.verify_costs(self.matrix)?;
        match self.objective_value(assignment.centers()) {
            Some(objective) if objective == assignment.total_cost() => Ok(()),
            _ => Err(AssignmentViolation::TotalMismatch),
        }
    }

    /// Returns a `Display` view rendering the problem in CPLEX LP format.
    #[inline]
    pub fn lp_format(&self) -> LpFormat<'_, 'a, T> {
        LpFormat { problem: self }
    }

    /// Renders the problem in CPLEX LP format.
    #[inline]
    pub fn to_lp_format(&self) -> String
    where
        T: std::fmt::Display,
    {
        self.lp_format().to_string()
    }
}

/// CPLEX LP rendering of an `AssignmentProblem`, one `x_<device>_<center>`
/// binary per cell.
#[derive(Clone, Copy, Debug)]
pub struct LpFormat<'p, 'a, T> {
    problem: &'p AssignmentProblem<'a, T>,
}

impl<'p, 'a, T> LpFormat<'p, 'a, T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn write_sum<I>(f: &mut std::fmt::Formatter<'_>, terms: I) -> std::fmt::Result
    where
        I: IntoIterator<Item = String>,
    {
        let mut empty = true;
        for (k, term) in terms.into_iter().enumerate() {
            if k > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{}", term)?;
            empty = false;
        }
        if empty {
            write!(f, "0")?;
        }
        Ok(())
    }
}

impl<'p, 'a, T> std::fmt::Display for LpFormat<'p, 'a, T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let problem = self.problem;
        let matrix = problem.matrix();
        let d = problem.num_devices();
        let c = problem.num_centers();
        let var = |i: usize, j: usize| format!("x_{}_{}", i, j);

        writeln!(f, "\\ assignment problem: {} devices, {} centers", d, c)?;
        writeln!(f, "Minimize")?;
        write!(f, " obj: ")?;
        Self::write_sum(
            f,
            (0..d).flat_map(|i| {
                (0..c).map(move |j| {
                    let cost = matrix.cost(DeviceIndex::new(i), CenterIndex::new(j));
                    format!("{} {}", cost, var(i, j))
                })
            }),
        )?;
        writeln!(f)?;

        writeln!(f, "Subject To")?;
        for i in 0..d {
            write!(f, " device_{}: ", i)?;
            Self::write_sum(f, (0..c).map(|j| var(i, j)))?;
            writeln!(
                f,
                " {} 1",
                AssignmentProblem::<T>::DEVICE_CONSTRAINT.as_lp_operator()
            )?;
        }
        for j in 0..c {
            write!(f, " center_{}: ", j)?;
            Self::write_sum(f, (0..d).map(|i| var(i, j)))?;
            writeln!(
                f,
                " {} 1",
                AssignmentProblem::<T>::CENTER_CONSTRAINT.as_lp_operator()
            )?;
        }

        writeln!(f, "Binary")?;
        for i in 0..d {
            for j in 0..c {
                writeln!(f, " {}", var(i, j))?;
            }
        }
        writeln!(f, "End")
    }
}

impl<'a, T> std::fmt::Display for AssignmentProblem<'a, T>
where
    T: PrimInt + Signed,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AssignmentProblem(num_devices: {}, num_centers: {})",
            self.num_devices(),
            self.num_centers()
        )
    }
}
