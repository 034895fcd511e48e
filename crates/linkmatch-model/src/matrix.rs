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

//! # Cost Matrix
//!
//! `CostMatrix<T>` is the dense device × center matrix consumed by the
//! assignment backends. It is stored row-major in a single flat vector, so a
//! device row is one contiguous slice.
//!
//! `CostMatrixBuilder` derives the matrix from the link universe:
//!
//! 1. every center token is validated and converted to a `LinkSet` before any
//!    cell is computed, so a malformed token fails the call up front;
//! 2. every device set is computed once;
//! 3. cells are filled row by row, optionally on several scoped threads that
//!    each own a disjoint chunk of rows.
//!
//! ```rust
//! use linkmatch_model::link::LinkIndex;
//! use linkmatch_model::matrix::CostMatrixBuilder;
//! use linkmatch_model::signature::CenterToken;
//! use linkmatch_model::index::{CenterIndex, DeviceIndex};
//!
//! let links = LinkIndex::new(["A.B", "C.D"]);
//! let centers = [CenterToken::from([1, 0]), CenterToken::from([0, 1])];
//! let matrix = CostMatrixBuilder::new(&links)
//!     .build::<i64, _>(&["A", "C"], &centers)
//!     .unwrap();
//! assert_eq!(matrix.cost(DeviceIndex::new(0), CenterIndex::new(0)), 0);
//! assert_eq!(matrix.cost(DeviceIndex::new(0), CenterIndex::new(1)), 2);
//! ```

use crate::{
    cost::{CostModel, SymmetricDifference},
    error::MatchError,
    index::{CenterIndex, DeviceIndex},
    link::LinkIndex,
    signature::{CenterToken, LinkSet, MatchPolicy, SignatureExtractor},
};
use num_traits::{NumCast, PrimInt, Signed};

#[inline(always)]
fn flatten_index(num_centers: usize, device: DeviceIndex, center: CenterIndex) -> usize {
    device.get() * num_centers + center.get()
}

#[derive(Clone, PartialEq, Eq)]
pub struct CostMatrix<T> {
    num_devices: usize,
    num_centers: usize,
    costs: Vec<T>,
}

impl<T> CostMatrix<T>
where
    T: PrimInt + Signed,
{
    /// Creates a matrix from row-major costs.
    ///
    /// # Panics
    ///
    /// Panics if `costs.len() != num_devices * num_centers` or if any cost is
    /// negative.
    pub fn from_flat(num_devices: usize, num_centers: usize, costs: Vec<T>) -> Self {
        assert_eq!(
            costs.len(),
            num_devices * num_centers,
            "called `CostMatrix::from_flat` with inconsistent dimensions: {} x {} but {} costs",
            num_devices,
            num_centers,
            costs.len()
        );
        assert!(
            costs.iter().all(|c| !c.is_negative()),
            "called `CostMatrix::from_flat` with a negative cost"
        );

        Self {
            num_devices,
            num_centers,
            costs,
        }
    }

    /// Creates a matrix from one vector per device.
    ///
    /// # Panics
    ///
    /// Panics if the rows have different lengths or any cost is negative.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Self {
        let num_devices = rows.len();
        let num_centers = rows.first().map_or(0, Vec::len);
        assert!(
            rows.iter().all(|r| r.len() == num_centers),
            "called `CostMatrix::from_rows` with rows of different lengths"
        );

        Self::from_flat(num_devices, num_centers, rows.into_iter().flatten().collect())
    }

    /// Returns the number of devices (rows), `D`.
    #[inline]
    pub fn num_devices(&self) -> usize {
        self.num_devices
    }

    /// Returns the number of cluster centers (columns), `C`.
    #[inline]
    pub fn num_centers(&self) -> usize {
        self.num_centers
    }

    /// Returns the cost of assigning `device` to `center`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn cost(&self, device: DeviceIndex, center: CenterIndex) -> T {
        assert!(
            device.get() < self.num_devices && center.get() < self.num_centers,
            "called `CostMatrix::cost` with index out of bounds: the dimensions are {} x {} but the index is ({}, {})",
            self.num_devices,
            self.num_centers,
            device.get(),
            center.get()
        );

        self.costs[flatten_index(self.num_centers, device, center)]
    }

    /// Returns the cost row of `device`, indexed by center.
    ///
    /// # Panics
    ///
    /// Panics if `device` is out of bounds.
    #[inline]
    pub fn row(&self, device: DeviceIndex) -> &[T] {
        let index = device.get();
        assert!(
            index < self.num_devices,
            "called `CostMatrix::row` with device index out of bounds: the len is {} but the index is {}",
            self.num_devices,
            index
        );

        let start = index * self.num_centers;
        &self.costs[start..start + self.num_centers]
    }

    /// Returns all costs in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.costs
    }

    /// `D <= C`: a device-total, center-injective assignment can exist.
    #[inline]
    pub fn admits_assignment(&self) -> bool {
        self.num_devices <= self.num_centers
    }

    #[inline]
    pub fn devices(&self) -> impl Iterator<Item = DeviceIndex> + use<T> {
        (0..self.num_devices).map(DeviceIndex::new)
    }

    #[inline]
    pub fn centers(&self) -> impl Iterator<Item = CenterIndex> + use<T> {
        (0..self.num_centers).map(CenterIndex::new)
    }
}

impl<T> std::fmt::Debug for CostMatrix<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostMatrix")
            .field("num_devices", &self.num_devices)
            .field("num_centers", &self.num_centers)
            .field("costs", &self.costs)
            .finish()
    }
}

impl<T> std::fmt::Display for CostMatrix<T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "CostMatrix({} x {})", self.num_devices, self.num_centers)?;
        if self.num_centers == 0 {
            return Ok(());
        }
        for row in self.costs.chunks_exact(self.num_centers) {
            let cells = row
                .iter()
                .map(|c| format!("{:>4}", c))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "   {}", cells)?;
        }
        Ok(())
    }
}

/// Builds a `CostMatrix` from devices, center tokens and a link universe.
#[derive(Clone, Debug)]
pub struct CostMatrixBuilder<'a, M = SymmetricDifference> {
    extractor: SignatureExtractor<'a>,
    cost_model: M,
    threads: usize,
}

impl<'a> CostMatrixBuilder<'a, SymmetricDifference> {
    /// Creates a single-threaded builder using substring matching and the
    /// symmetric-difference cost.
    #[inline]
    pub fn new(links: &'a LinkIndex) -> Self {
        Self {
            extractor: SignatureExtractor::new(links),
            cost_model: SymmetricDifference,
            threads: 1,
        }
    }
}

impl<'a, M> CostMatrixBuilder<'a, M>
where
    M: CostModel,
{
    #[inline]
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.extractor = SignatureExtractor::with_policy(self.extractor.links(), policy);
        self
    }

    #[inline]
    pub fn with_cost_model<N>(self, cost_model: N) -> CostMatrixBuilder<'a, N>
    where
        N: CostModel,
    {
        CostMatrixBuilder {
            extractor: self.extractor,
            cost_model,
            threads: self.threads,
        }
    }

    /// Sets the number of worker threads used to fill rows. `0` is treated
    /// as `1`.
    #[inline]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    #[inline]
    pub fn extractor(&self) -> &SignatureExtractor<'a> {
        &self.extractor
    }

    /// Converts every center token to its link set.
    ///
    /// # Errors
    ///
    /// Returns the first `MatchError::MalformedToken` in center order.
    pub fn center_signatures(&self, centers: &[CenterToken]) -> Result<Vec<LinkSet>, MatchError> {
        centers
            .iter()
            .enumerate()
            .map(|(j, token)| self.extractor.center_links(CenterIndex::new(j), token))
            .collect()
    }

    /// Computes the link set of every device.
    pub fn device_signatures<D>(&self, devices: &[D]) -> Vec<LinkSet>
    where
        D: AsRef<str>,
    {
        devices
            .iter()
            .map(|d| self.extractor.device_links(d.as_ref()))
            .collect()
    }

    /// Builds the `D × C` cost matrix.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::MalformedToken` before any cost is computed if a
    /// token does not match the link universe, and `MatchError::CostOverflow`
    /// if a cost does not fit `T`.
    pub fn build<T, D>(&self, devices: &[D], centers: &[CenterToken]) -> Result<CostMatrix<T>, MatchError>
    where
        T: PrimInt + Signed + Send,
        D: AsRef<str>,
    {
        let center_sets = self.center_signatures(centers)?;
        let device_sets = self.device_signatures(devices);

        let num_devices = device_sets.len();
        let num_centers = center_sets.len();
        let mut costs = vec![T::zero(); num_devices * num_centers];

        if num_devices == 0 || num_centers == 0 {
            return Ok(CostMatrix::from_flat(num_devices, num_centers, costs));
        }

        let threads = self.threads.min(num_devices);
        if threads <= 1 {
            fill_rows(&self.cost_model, 0, &device_sets, &center_sets, &mut costs)?;
        } else {
            let rows_per_chunk = num_devices.div_ceil(threads);
            let cost_model = &self.cost_model;
            let device_sets = &device_sets;
            let center_sets = &center_sets;

            let results: Vec<Result<(), MatchError>> = std::thread::scope(|scope| {
                let handles: Vec<_> = costs
                    .chunks_mut(rows_per_chunk * num_centers)
                    .enumerate()
                    .map(|(k, chunk)| {
                        scope.spawn(move || {
                            fill_rows(cost_model, k * rows_per_chunk, device_sets, center_sets, chunk)
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|h| h.join().expect("cost matrix worker thread panicked"))
                    .collect()
            });

            results.into_iter().collect::<Result<(), MatchError>>()?;
        }

        tracing::debug!(
            devices = num_devices,
            centers = num_centers,
            threads,
            cost_model = self.cost_model.name(),
            "cost matrix built"
        );

        Ok(CostMatrix::from_flat(num_devices, num_centers, costs))
    }
}

/// Fills `out` with the rows starting at `first_device`.
fn fill_rows<M, T>(
    cost_model: &M,
    first_device: usize,
    device_sets: &[LinkSet],
    center_sets: &[LinkSet],
    out: &mut [T],
) -> Result<(), MatchError>
where
    M: CostModel,
    T: PrimInt + Signed,
{
    let num_centers = center_sets.len();
    for (offset, row) in out.chunks_exact_mut(num_centers).enumerate() {
        let device = DeviceIndex::new(first_device + offset);
        let device_set = &device_sets[device.get()];
        for (j, (cell, center_set)) in row.iter_mut().zip(center_sets).enumerate() {
            let count = cost_model.score(device_set, center_set);
            *cell = <T as NumCast>::from(count).ok_or_else(|| MatchError::CostOverflow {
                device,
                center: CenterIndex::new(j),
                count,
            })?;
        }
    }
    Ok(())
}
