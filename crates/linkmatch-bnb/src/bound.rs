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

//! # Lower Bounds
//!
//! A lower bound estimates the cheapest possible completion of a partial
//! assignment. It must never exceed the true completion cost, otherwise the
//! search would prune optimal subtrees.

use fixedbitset::FixedBitSet;
use linkmatch_model::{
    index::{CenterIndex, DeviceIndex},
    matrix::CostMatrix,
};
use num_traits::{PrimInt, Signed};

pub trait LowerBound<T>
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str;

    /// Called once per solve before any call to `completion_bound`.
    fn prepare(&mut self, _matrix: &CostMatrix<T>) {}

    /// Bounds the cost of assigning every device in `remaining` to distinct
    /// centers outside `used`. Returns `None` if no such assignment exists.
    fn completion_bound(
        &self,
        matrix: &CostMatrix<T>,
        remaining: &[DeviceIndex],
        used: &FixedBitSet,
    ) -> Option<T>;
}

/// Sums each remaining device's cheapest center over all centers. Ignores
/// which centers are taken, so it is weak but constant time per device.
#[derive(Debug, Clone, Default)]
pub struct RowMinimumBound<T> {
    row_minima: Vec<T>,
}

impl<T> RowMinimumBound<T> {
    #[inline]
    pub fn new() -> Self {
        Self {
            row_minima: Vec::new(),
        }
    }
}

impl<T> LowerBound<T> for RowMinimumBound<T>
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "RowMinimumBound"
    }

    fn prepare(&mut self, matrix: &CostMatrix<T>) {
        self.row_minima.clear();
        self.row_minima.extend(matrix.devices().map(|d| {
            matrix
                .row(d)
                .iter()
                .copied()
                .min()
                .unwrap_or_else(T::max_value)
        }));
    }

    fn completion_bound(
        &self,
        _matrix: &CostMatrix<T>,
        remaining: &[DeviceIndex],
        _used: &FixedBitSet,
    ) -> Option<T> {
        Some(
            remaining
                .iter()
                .fold(T::zero(), |acc, d| acc.saturating_add(self.row_minima[d.get()])),
        )
    }
}

/// Sums each remaining device's cheapest center among the unused ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnusedColumnBound;

impl<T> LowerBound<T> for UnusedColumnBound
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "UnusedColumnBound"
    }

    fn completion_bound(
        &self,
        matrix: &CostMatrix<T>,
        remaining: &[DeviceIndex],
        used: &FixedBitSet,
    ) -> Option<T> {
        if remaining.len() > matrix.num_centers().saturating_sub(used.count_ones(..)) {
            return None;
        }

        let mut total = T::zero();
        for &device in remaining {
            let cheapest = matrix
                .row(device)
                .iter()
                .enumerate()
                .filter(|(j, _)| !used.contains(*j))
                .map(|(_, &cost)| cost)
                .min()?;
            total = total.saturating_add(cheapest);
        }
        Some(total)
    }
}

/// Marks `center` in `used`, growing the set if needed.
#[inline]
pub(crate) fn mark(used: &mut FixedBitSet, center: CenterIndex) {
    if center.get() >= used.len() {
        used.grow(center.get() + 1);
    }
    used.insert(center.get());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> CostMatrix<i64> {
        CostMatrix::from_rows(vec![vec![1, 5, 9], vec![2, 3, 7], vec![0, 8, 4]])
    }

    fn all_devices() -> Vec<DeviceIndex> {
        (0..3).map(DeviceIndex::new).collect()
    }

    #[test]
    fn test_row_minimum_bound_ignores_used_columns() {
        let m = matrix();
        let mut bound = RowMinimumBound::new();
        bound.prepare(&m);

        let mut used = FixedBitSet::with_capacity(3);
        mark(&mut used, CenterIndex::new(0));
        assert_eq!(bound.completion_bound(&m, &all_devices(), &used), Some(3));
    }

    #[test]
    fn test_unused_column_bound_skips_taken_centers() {
        let m = matrix();
        let mut used = FixedBitSet::with_capacity(3);
        mark(&mut used, CenterIndex::new(0));

        let remaining = [DeviceIndex::new(1), DeviceIndex::new(2)];
        // device 1 -> 3, device 2 -> 4
        assert_eq!(
            UnusedColumnBound.completion_bound(&m, &remaining, &used),
            Some(7)
        );
    }

    #[test]
    fn test_unused_column_bound_detects_too_few_centers() {
        let m = matrix();
        let mut used = FixedBitSet::with_capacity(3);
        mark(&mut used, CenterIndex::new(0));
        mark(&mut used, CenterIndex::new(1));
        assert_eq!(
            UnusedColumnBound.completion_bound(&m, &all_devices()[1..], &used),
            None
        );
    }

    #[test]
    fn test_bounds_never_exceed_optimal_completion() {
        let m = matrix();
        let used = FixedBitSet::with_capacity(3);
        let mut row = RowMinimumBound::new();
        row.prepare(&m);
        // 0 -> 0, 1 -> 1, 2 -> 2
        let optimum = 8;
        assert!(row.completion_bound(&m, &all_devices(), &used).unwrap() <= optimum);
        assert!(UnusedColumnBound.completion_bound(&m, &all_devices(), &used).unwrap() <= optimum);
    }

    #[test]
    fn test_empty_remaining_is_zero() {
        let m = matrix();
        let used = FixedBitSet::with_capacity(3);
        assert_eq!(UnusedColumnBound.completion_bound(&m, &[], &used), Some(0));
    }

    #[test]
    fn test_mark_grows_the_set() {
        let mut used = FixedBitSet::new();
        mark(&mut used, CenterIndex::new(4));
        assert!(used.contains(4));
        assert_eq!(used.len(), 5);
    }
}
