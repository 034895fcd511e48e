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

use crate::{
    index::{CenterIndex, DeviceIndex},
    matrix::CostMatrix,
};
use num_traits::{PrimInt, Signed};

/// A complete device → center assignment.
///
/// This struct uses a Structure of Arrays (SoA) layout indexed directly by
/// `DeviceIndex`: `centers[d]` is the center of device `d` and `costs[d]` the
/// matrix cell it was charged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment<T> {
    total_cost: T,
    centers: Vec<CenterIndex>,
    costs: Vec<T>,
}

/// A single `(device, center, cost)` triple of an assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssignedPair<T> {
    pub device: DeviceIndex,
    pub center: CenterIndex,
    pub cost: T,
}

/// Reasons an assignment is not a valid answer for a cost matrix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentViolation {
    /// The assignment does not cover exactly the matrix devices.
    #[error("assignment covers {actual} devices but the matrix has {expected}")]
    DeviceCount { expected: usize, actual: usize },
    /// A device points past the last center.
    #[error("{device} is assigned to {center} which is out of bounds for {num_centers} centers")]
    CenterOutOfBounds {
        device: DeviceIndex,
        center: CenterIndex,
        num_centers: usize,
    },
    /// Two devices share a center.
    #[error("{center} is assigned to both {first} and {second}")]
    CenterReused {
        center: CenterIndex,
        first: DeviceIndex,
        second: DeviceIndex,
    },
    /// A recorded cost differs from the matrix cell.
    #[error("recorded cost of {device} on {center} differs from the matrix cell")]
    CostMismatch {
        device: DeviceIndex,
        center: CenterIndex,
    },
    /// The total cost is not the sum of the per-device costs.
    #[error("total cost does not equal the sum of the assigned cells")]
    TotalMismatch,
}

impl<T> Assignment<T>
where
    T: PrimInt + Signed,
{
    /// Builds an assignment by reading every chosen cell from `matrix`.
    ///
    /// Returns `None` if the summed cost overflows `T`.
    ///
    /// # Panics
    ///
    /// Panics if `centers.len()` differs from the number of devices or a
    /// center is out of bounds.
    pub fn from_matrix(matrix: &CostMatrix<T>, centers: Vec<CenterIndex>) -> Option<Self> {
        assert_eq!(
            centers.len(),
            matrix.num_devices(),
            "called `Assignment::from_matrix` with {} centers for {} devices",
            centers.len(),
            matrix.num_devices()
        );

        let costs: Vec<T> = centers
            .iter()
            .enumerate()
            .map(|(i, &c)| matrix.cost(DeviceIndex::new(i), c))
            .collect();
        let total_cost = costs
            .iter()
            .try_fold(T::zero(), |acc, &c| acc.checked_add(&c))?;

        Some(Self {
            total_cost,
            centers,
            costs,
        })
    }

    /// Constructs an assignment from raw parts without consulting a matrix.
    ///
    /// # Panics
    ///
    /// Panics if `centers` and `costs` have different lengths.
    pub fn from_parts(total_cost: T, centers: Vec<CenterIndex>, costs: Vec<T>) -> Self {
        assert_eq!(
            centers.len(),
            costs.len(),
            "called `Assignment::from_parts` with inconsistent vector lengths: centers.len() = {}, costs.len() = {}",
            centers.len(),
            costs.len()
        );

        Self {
            total_cost,
            centers,
            costs,
        }
    }

    /// The empty assignment for a matrix without devices.
    #[inline]
    pub fn empty() -> Self {
        Self {
            total_cost: T::zero(),
            centers: Vec::new(),
            costs: Vec::new(),
        }
    }

    #[inline]
    pub fn total_cost(&self) -> T {
        self.total_cost
    }

    #[inline]
    pub fn num_devices(&self) -> usize {
        self.centers.len()
    }

    /// Returns the center assigned to `device`.
    ///
    /// # Panics
    ///
    /// Panics if `device` is out of bounds.
    #[inline]
    pub fn center_for_device(&self, device: DeviceIndex) -> CenterIndex {
        let index = device.get();
        assert!(
            index < self.num_devices(),
            "called `Assignment::center_for_device` with device index out of bounds: the len is {} but the index is {}",
            self.num_devices(),
            index
        );

        self.centers[index]
    }

    /// Returns the cost charged for `device`.
    ///
    /// # Panics
    ///
    /// Panics if `device` is out of bounds.
    #[inline]
    pub fn cost_for_device(&self, device: DeviceIndex) -> T {
        let index = device.get();
        assert!(
            index < self.num_devices(),
            "called `Assignment::cost_for_device` with device index out of bounds: the len is {} but the index is {}",
            self.num_devices(),
            index
        );

        self.costs[index]
    }

    #[inline]
    pub fn centers(&self) -> &[CenterIndex] {
        &self.centers
    }

    #[inline]
    pub fn costs(&self) -> &[T] {
        &self.costs
    }

    /// Iterates over the assigned pairs in device order.
    pub fn pairs(&self) -> impl Iterator<Item = AssignedPair<T>> + '_ {
        self.centers
            .iter()
            .zip(&self.costs)
            .enumerate()
            .map(|(i, (&center, &cost))| AssignedPair {
                device: DeviceIndex::new(i),
                center,
                cost,
            })
    }

    /// Checks that every recorded cost equals its matrix cell. Whether the
    /// pairs form a feasible assignment is the problem's concern, see
    /// `AssignmentProblem::validate`.
    ///
    /// # Panics
    ///
    /// Panics if a device or center is out of bounds for `matrix`.
    pub fn verify_costs(&self, matrix: &CostMatrix<T>) -> Result<(), AssignmentViolation> {
        match self
            .pairs()
            .find(|pair| matrix.cost(pair.device, pair.center) != pair.cost)
        {
            Some(pair) => Err(AssignmentViolation::CostMismatch {
                device: pair.device,
                center: pair.center,
            }),
            None => Ok(()),
        }
    }
}

impl<T> std::fmt::Display for Assignment<T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Assignment Summary")?;
        writeln!(f, "   Total Cost: {}", self.total_cost)?;
        writeln!(f)?;

        if self.num_devices() == 0 {
            writeln!(f, "   (No devices assigned)")?;
            return Ok(());
        }

        writeln!(f, "   {:<10} | {:<10} | {:<8}", "Device", "Center", "Cost")?;
        writeln!(f, "   {:-<10}-+-{:-<10}-+-{:-<8}", "", "", "")?;
        for pair in self.pairs() {
            writeln!(
                f,
                "   {:<10} | {:<10} | {:<8}",
                pair.device.get(),
                pair.center.get(),
                pair.cost
            )?;
        }

        Ok(())
    }
}
