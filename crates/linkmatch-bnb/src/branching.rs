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

//! # Device Ordering
//!
//! The branch-and-bound search assigns devices one per tree level. The order
//! in which devices enter the tree does not change the optimum, but it
//! strongly affects how early good incumbents appear and how much of the
//! tree the bound can cut away.

use linkmatch_model::{
    index::{CenterIndex, DeviceIndex},
    matrix::CostMatrix,
};
use num_traits::{PrimInt, Signed};
use std::cmp::Ordering;

pub trait DeviceOrder<T>
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str;

    /// Returns every device of `matrix` exactly once, in branching order.
    fn order(&mut self, matrix: &CostMatrix<T>) -> Vec<DeviceIndex>;
}

/// Devices in input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputOrder;

impl<T> DeviceOrder<T> for InputOrder
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "InputOrder"
    }

    fn order(&mut self, matrix: &CostMatrix<T>) -> Vec<DeviceIndex> {
        matrix.devices().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RegretCandidate<T> {
    regret: T,
    best_cost: T,
    device: DeviceIndex,
}

impl<T> Ord for RegretCandidate<T>
where
    T: PrimInt + Signed,
{
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        // 1. Descending regret
        // 2. Ascending best cost
        // 3. Ascending device index
        other
            .regret
            .cmp(&self.regret)
            .then_with(|| self.best_cost.cmp(&other.best_cost))
            .then_with(|| self.device.cmp(&other.device))
    }
}

impl<T> PartialOrd for RegretCandidate<T>
where
    T: PrimInt + Signed,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Devices with the largest gap between their best and second-best center
/// first. A device with a single center has zero regret.
#[derive(Debug, Clone, Default)]
pub struct RegretOrder<T> {
    candidates: Vec<RegretCandidate<T>>,
}

impl<T> RegretOrder<T> {
    #[inline]
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }
}

impl<T> DeviceOrder<T> for RegretOrder<T>
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "RegretOrder"
    }

    fn order(&mut self, matrix: &CostMatrix<T>) -> Vec<DeviceIndex> {
        self.candidates.clear();

        for device in matrix.devices() {
            let mut first = T::max_value();
            let mut second = T::max_value();
            for &cost in matrix.row(device) {
                if cost < first {
                    second = first;
                    first = cost;
                } else if cost < second {
                    second = cost;
                }
            }

            let regret = if second == T::max_value() {
                T::zero()
            } else {
                second - first
            };

            self.candidates.push(RegretCandidate {
                regret,
                best_cost: first,
                device,
            });
        }

        self.candidates.sort_unstable();
        self.candidates.iter().map(|c| c.device).collect()
    }
}

/// The cheapest center of `device` that `is_free` accepts, lowest index on
/// ties.
pub(crate) fn cheapest_center<T, F>(
    matrix: &CostMatrix<T>,
    device: DeviceIndex,
    mut is_free: F,
) -> Option<(CenterIndex, T)>
where
    T: PrimInt + Signed,
    F: FnMut(CenterIndex) -> bool,
{
    let mut best: Option<(CenterIndex, T)> = None;
    for (j, &cost) in matrix.row(device).iter().enumerate() {
        let center = CenterIndex::new(j);
        if !is_free(center) {
            continue;
        }
        match best {
            Some((_, b)) if b <= cost => {}
            _ => best = Some((center, cost)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices(v: &[usize]) -> Vec<DeviceIndex> {
        v.iter().copied().map(DeviceIndex::new).collect()
    }

    #[test]
    fn test_input_order_is_identity() {
        let m = CostMatrix::<i64>::from_rows(vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
        assert_eq!(InputOrder.order(&m), devices(&[0, 1, 2]));
    }

    #[test]
    fn test_regret_order_prefers_large_gaps() {
        let m = CostMatrix::<i64>::from_rows(vec![
            vec![1, 2, 3], // regret 1
            vec![0, 9, 9], // regret 9
            vec![4, 4, 8], // regret 0
        ]);
        let mut order = RegretOrder::new();
        assert_eq!(order.order(&m), devices(&[1, 0, 2]));
        assert_eq!(DeviceOrder::<i64>::name(&order), "RegretOrder");
    }

    #[test]
    fn test_regret_ties_break_on_best_cost_then_index() {
        let m = CostMatrix::<i64>::from_rows(vec![vec![5, 6], vec![2, 3], vec![2, 3]]);
        assert_eq!(RegretOrder::new().order(&m), devices(&[1, 2, 0]));
    }

    #[test]
    fn test_single_center_has_zero_regret() {
        let m = CostMatrix::<i64>::from_rows(vec![vec![7], vec![3]]);
        assert_eq!(RegretOrder::new().order(&m), devices(&[1, 0]));
    }

    #[test]
    fn test_cheapest_center_respects_filter_and_ties() {
        let m = CostMatrix::<i64>::from_rows(vec![vec![2, 1, 1, 0]]);
        let d = DeviceIndex::new(0);
        assert_eq!(
            cheapest_center(&m, d, |_| true),
            Some((CenterIndex::new(3), 0))
        );
        assert_eq!(
            cheapest_center(&m, d, |c| c.get() != 3),
            Some((CenterIndex::new(1), 1))
        );
        assert_eq!(cheapest_center(&m, d, |_| false), None);
    }
}
