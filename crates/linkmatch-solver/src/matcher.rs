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

//! # Device Matcher
//!
//! The end-to-end pipeline: link names and center tokens in, a renderable
//! `MatchReport` out.
//!
//! ```text
//! links ─► LinkIndex ─► SignatureExtractor ─► CostMatrixBuilder ─► Assigner ─► MatchReport
//! ```
//!
//! Malformed input (a token of the wrong length, a cost that does not fit the
//! numeric type) is an error. Everything that goes wrong during the solve is a
//! no-solution outcome inside the report.

use crate::{
    assigner::{Assigner, MatchOutcome, MatchResult},
    report::{self, ReportView},
};
use linkmatch_bnb::bnb::BnbSolver;
use linkmatch_hungarian::hungarian::HungarianSolver;
use linkmatch_model::{
    error::MatchError, link::LinkIndex, matrix::CostMatrixBuilder, signature::CenterToken,
    signature::MatchPolicy,
};
use linkmatch_search::{
    backend::{AssignmentBackend, BackendUnavailable},
    num::SolverNumeric,
};
use std::{
    sync::{Arc, atomic::AtomicBool},
    time::Duration,
};

/// The built-in assignment backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendKind {
    /// Rectangular Hungarian method.
    #[default]
    Hungarian,
    /// Exact branch and bound over device-to-center choices.
    BranchAndBound,
}

impl BackendKind {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Hungarian => "hungarian",
            BackendKind::BranchAndBound => "branch-and-bound",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = BackendUnavailable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hungarian" => Ok(BackendKind::Hungarian),
            "branch-and-bound" | "bnb" => Ok(BackendKind::BranchAndBound),
            _ => Err(BackendUnavailable::new(s, "no such built-in backend")),
        }
    }
}

/// Constructs the backend selected by `kind`.
pub fn create_backend<T>(kind: BackendKind) -> Result<Box<dyn AssignmentBackend<T>>, BackendUnavailable>
where
    T: SolverNumeric,
{
    tracing::debug!(backend = %kind, "creating assignment backend");
    match kind {
        BackendKind::Hungarian => Ok(Box::new(HungarianSolver::new())),
        BackendKind::BranchAndBound => Ok(Box::new(BnbSolver::<T>::new())),
    }
}

#[derive(Debug, Clone)]
pub struct MatcherConfig {
    policy: MatchPolicy,
    threads: usize,
    backend: BackendKind,
    time_limit: Option<Duration>,
    accept_feasible: bool,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfigBuilder::new().build()
    }
}

impl MatcherConfig {
    #[inline]
    pub fn builder() -> MatcherConfigBuilder {
        MatcherConfigBuilder::new()
    }

    #[inline]
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    #[inline]
    pub fn threads(&self) -> usize {
        self.threads
    }

    #[inline]
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    #[inline]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    #[inline]
    pub fn accept_feasible(&self) -> bool {
        self.accept_feasible
    }

    fn assigner(&self) -> Assigner {
        let mut builder = Assigner::builder()
            .with_time_limit_opt(self.time_limit)
            .with_accept_feasible(self.accept_feasible);
        if let Some(flag) = &self.interrupt {
            builder = builder.with_interrupt(Arc::clone(flag));
        }
        builder.build()
    }
}

#[derive(Debug, Clone)]
pub struct MatcherConfigBuilder {
    policy: MatchPolicy,
    threads: usize,
    backend: BackendKind,
    time_limit: Option<Duration>,
    accept_feasible: bool,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Default for MatcherConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatcherConfigBuilder {
    /// Substring matching, one thread, Hungarian backend, no time limit.
    #[inline]
    pub fn new() -> Self {
        Self {
            policy: MatchPolicy::default(),
            threads: 1,
            backend: BackendKind::default(),
            time_limit: None,
            accept_feasible: false,
            interrupt: None,
        }
    }

    #[inline]
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Worker threads for the cost matrix. `0` is treated as `1`.
    #[inline]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Uses all available cores for the cost matrix.
    #[inline]
    pub fn with_available_parallelism(self) -> Self {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.with_threads(threads)
    }

    #[inline]
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    #[inline]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    #[inline]
    pub fn with_accept_feasible(mut self, accept: bool) -> Self {
        self.accept_feasible = accept;
        self
    }

    #[inline]
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    #[inline]
    pub fn build(self) -> MatcherConfig {
        MatcherConfig {
            policy: self.policy,
            threads: self.threads,
            backend: self.backend,
            time_limit: self.time_limit,
            accept_feasible: self.accept_feasible,
            interrupt: self.interrupt,
        }
    }
}

/// A finished match together with the inputs needed to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport<T> {
    devices: Vec<String>,
    centers: Vec<CenterToken>,
    result: MatchResult<T>,
}

impl<T> MatchReport<T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    #[inline]
    pub fn centers(&self) -> &[CenterToken] {
        &self.centers
    }

    #[inline]
    pub fn result(&self) -> &MatchResult<T> {
        &self.result
    }

    #[inline]
    pub fn outcome(&self) -> &MatchOutcome<T> {
        self.result.outcome()
    }

    /// The report text, see [`report`].
    #[inline]
    pub fn render(&self) -> String {
        report::render(self.devices.as_slice(), &self.centers, self.result.outcome())
    }
}

impl<T> std::fmt::Display for MatchReport<T>
where
    T: SolverNumeric,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            ReportView::new(self.devices.as_slice(), &self.centers, self.result.outcome())
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeviceMatcher {
    config: MatcherConfig,
}

impl DeviceMatcher {
    #[inline]
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Matches `devices` to `centers` over the link universe `links`, solving
    /// with `backend`.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::MalformedToken` if a center token's length differs
    /// from the number of links, before anything is solved, and
    /// `MatchError::CostOverflow` if a cost does not fit `T`.
    pub fn run<T, D, S, B>(
        &self,
        devices: &[D],
        centers: &[CenterToken],
        links: &[S],
        backend: &mut B,
    ) -> Result<MatchReport<T>, MatchError>
    where
        T: SolverNumeric,
        D: AsRef<str>,
        S: AsRef<str>,
        B: AssignmentBackend<T> + ?Sized,
    {
        self.run_inner(devices, centers, links, |assigner, matrix| {
            assigner.assign(matrix, backend)
        })
    }

    /// Like [`DeviceMatcher::run`], with the backend selected in the config.
    pub fn run_configured<T, D, S>(
        &self,
        devices: &[D],
        centers: &[CenterToken],
        links: &[S],
    ) -> Result<MatchReport<T>, MatchError>
    where
        T: SolverNumeric,
        D: AsRef<str>,
        S: AsRef<str>,
    {
        let kind = self.config.backend;
        self.run_inner(devices, centers, links, |assigner, matrix| {
            assigner.assign_with(matrix, || create_backend::<T>(kind))
        })
    }

    fn run_inner<T, D, S, F>(
        &self,
        devices: &[D],
        centers: &[CenterToken],
        links: &[S],
        solve: F,
    ) -> Result<MatchReport<T>, MatchError>
    where
        T: SolverNumeric,
        D: AsRef<str>,
        S: AsRef<str>,
        F: FnOnce(&Assigner, &linkmatch_model::matrix::CostMatrix<T>) -> MatchResult<T>,
    {
        let index = LinkIndex::new(links.iter().map(|l| l.as_ref()));
        tracing::debug!(
            links = index.len(),
            devices = devices.len(),
            centers = centers.len(),
            policy = %self.config.policy,
            "building cost matrix"
        );

        let matrix = CostMatrixBuilder::new(&index)
            .with_policy(self.config.policy)
            .with_threads(self.config.threads)
            .build::<T, D>(devices, centers)?;

        let result = solve(&self.config.assigner(), &matrix);
        match result.outcome() {
            MatchOutcome::Matched(a) => {
                tracing::info!(total_cost = %a.total_cost(), devices = a.num_devices(), "devices matched")
            }
            MatchOutcome::NoSolution(reason) => tracing::info!(%reason, "no solution found"),
        }

        Ok(MatchReport {
            devices: devices.iter().map(|d| d.as_ref().to_string()).collect(),
            centers: centers.to_vec(),
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assigner::NoSolutionReason;
    use linkmatch_model::index::{CenterIndex, DeviceIndex};

    type IntegerType = i64;

    fn tokens(rows: &[&[u8]]) -> Vec<CenterToken> {
        rows.iter().map(|r| CenterToken::new(r.to_vec())).collect()
    }

    fn run_all_backends(
        devices: &[&str],
        centers: &[CenterToken],
        links: &[&str],
    ) -> Vec<MatchReport<IntegerType>> {
        [BackendKind::Hungarian, BackendKind::BranchAndBound]
            .into_iter()
            .map(|kind| {
                let matcher = DeviceMatcher::new(MatcherConfig::builder().with_backend(kind).build());
                matcher
                    .run_configured(devices, centers, links)
                    .expect("inputs are well formed")
            })
            .collect()
    }

    #[test]
    fn test_more_devices_than_centers_reports_no_solution() {
        let links = ["A.B", "B.A"];
        let centers = tokens(&[&[1, 1]]);
        for report in run_all_backends(&["A", "B"], &centers, &links) {
            assert_eq!(report.render(), "No solution found.\n");
            assert_eq!(
                report.outcome().no_solution_reason(),
                Some(&NoSolutionReason::Infeasible)
            );
        }
    }

    #[test]
    fn test_four_devices_two_centers_reports_no_solution() {
        let links = ["A.B", "C.D"];
        let centers = tokens(&[&[1, 0], &[0, 1]]);
        for report in run_all_backends(&["A", "B", "C", "D"], &centers, &links) {
            assert_eq!(report.render(), "No solution found.\n");
        }
    }

    #[test]
    fn test_every_device_finds_a_zero_cost_center() {
        let links = ["A.B", "C.D"];
        let centers = tokens(&[&[1, 0], &[1, 0], &[0, 1], &[0, 1]]);
        for report in run_all_backends(&["A", "B", "C", "D"], &centers, &links) {
            let a = report.outcome().assignment().expect("expected a match");
            assert_eq!(a.total_cost(), 0);
            for d in 0..2 {
                assert!(a.center_for_device(DeviceIndex::new(d)).get() < 2);
            }
            for d in 2..4 {
                assert!(a.center_for_device(DeviceIndex::new(d)).get() >= 2);
            }

            let text = report.render();
            assert!(text.starts_with("Total cost = 0.0\n"));
            assert!(text.contains("Device A assigned to cluster center (1, 0). Cost: 0.0\n"));
            assert!(text.contains("Device D assigned to cluster center (0, 1). Cost: 0.0\n"));
            assert_eq!(text.lines().count(), 5);
        }
    }

    #[test]
    fn test_malformed_token_fails_before_solving() {
        struct Unreachable;
        impl AssignmentBackend<IntegerType> for Unreachable {
            fn name(&self) -> &str {
                "Unreachable"
            }
            fn solve(
                &mut self,
                _ctx: linkmatch_search::backend::SolveContext<'_, IntegerType>,
            ) -> linkmatch_search::result::BackendOutcome<IntegerType> {
                panic!("backend must not be called for malformed input")
            }
        }

        let links = ["A.B", "C.D"];
        let centers = tokens(&[&[1, 0], &[1, 0, 1]]);
        let err = DeviceMatcher::default()
            .run::<IntegerType, _, _, _>(&["A"], &centers, &links, &mut Unreachable)
            .unwrap_err();
        assert_eq!(
            err,
            MatchError::MalformedToken {
                center: CenterIndex::new(1),
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn test_substring_and_endpoint_policies_differ() {
        // "A" is a substring of "AB".
        let links = ["A.C", "AB.C"];
        let centers = tokens(&[&[1, 0], &[0, 1]]);

        let substring = DeviceMatcher::default()
            .run::<IntegerType, _, _, _>(&["A"], &centers, &links, &mut HungarianSolver::new())
            .unwrap();
        assert_eq!(substring.outcome().assignment().unwrap().total_cost(), 1);

        let endpoint = DeviceMatcher::new(
            MatcherConfig::builder()
                .with_policy(MatchPolicy::endpoint())
                .build(),
        )
        .run::<IntegerType, _, _, _>(&["A"], &centers, &links, &mut HungarianSolver::new())
        .unwrap();
        assert_eq!(endpoint.outcome().assignment().unwrap().total_cost(), 0);
    }

    #[test]
    fn test_repeated_runs_agree_on_total_cost() {
        let links = [
            "4C72700E0D.4C72700E1C",
            "4C72700E1C.4C72700E0D",
            "4C72700E1C.4C72700E2C",
            "4C72700E1C.f081731d0c40",
            "4C72700E2C.4C72700E1C",
            "4C72700E2C.4C72700E2E",
            "4C72700E2C.58d34926c760",
            "4C72700E2E.4C72700E2C",
        ];
        let index = LinkIndex::new(links);
        let combos: [&[&str]; 4] = [
            &["4C72700E0D.4C72700E1C", "4C72700E1C.4C72700E0D"],
            &["4C72700E2C.4C72700E2E", "4C72700E2E.4C72700E2C"],
            &["4C72700E2C.58d34926c760"],
            &["4C72700E1C.f081731d0c40", "4C72700E2C.4C72700E2E"],
        ];
        let centers: Vec<CenterToken> = combos
            .iter()
            .map(|active| CenterToken::from_active_links(&index, active.iter().copied()).unwrap())
            .collect();
        let devices = ["4C72700E0D", "4C72700E2E", "58d34926c760"];

        let matcher = DeviceMatcher::new(MatcherConfig::builder().with_threads(3).build());
        let first = matcher
            .run_configured::<IntegerType, _, _>(&devices, &centers, &links)
            .unwrap();
        let second = matcher
            .run_configured::<IntegerType, _, _>(&devices, &centers, &links)
            .unwrap();
        let bnb = DeviceMatcher::new(
            MatcherConfig::builder()
                .with_backend(BackendKind::BranchAndBound)
                .build(),
        )
        .run_configured::<IntegerType, _, _>(&devices, &centers, &links)
        .unwrap();

        let parallel_config = MatcherConfig::builder().with_available_parallelism().build();
        assert!(parallel_config.threads() >= 1);
        let parallel = DeviceMatcher::new(parallel_config)
            .run_configured::<IntegerType, _, _>(&devices, &centers, &links)
            .unwrap();

        let total = |r: &MatchReport<IntegerType>| r.outcome().assignment().unwrap().total_cost();
        assert_eq!(total(&first), total(&second));
        assert_eq!(total(&first), total(&bnb));
        assert_eq!(first.render(), second.render());
        assert_eq!(first.render(), parallel.render());
        assert_eq!(first.to_string(), first.render());
    }

    #[test]
    fn test_backend_kind_parsing_and_factory() {
        assert_eq!("bnb".parse::<BackendKind>(), Ok(BackendKind::BranchAndBound));
        assert_eq!("Hungarian".parse::<BackendKind>(), Ok(BackendKind::Hungarian));
        assert!("simplex".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::BranchAndBound.to_string(), "branch-and-bound");

        let backend = create_backend::<IntegerType>(BackendKind::BranchAndBound).unwrap();
        assert_eq!(backend.name(), "BnbSolver");
    }

    #[test]
    fn test_config_builder_defaults() {
        let config = MatcherConfig::default();
        assert_eq!(config.policy(), MatchPolicy::Substring);
        assert_eq!(config.threads(), 1);
        assert_eq!(config.backend(), BackendKind::Hungarian);
        assert_eq!(config.time_limit(), None);
        assert!(!config.accept_feasible());

        let config = MatcherConfig::builder()
            .with_threads(0)
            .with_time_limit(Duration::from_secs(2))
            .with_accept_feasible(true)
            .build();
        assert_eq!(config.threads(), 1);
        assert_eq!(config.time_limit(), Some(Duration::from_secs(2)));
        assert!(config.accept_feasible());
    }

    #[test]
    fn test_zero_time_limit_surfaces_as_aborted() {
        let links = ["A.B", "C.D"];
        let centers = tokens(&[&[1, 0], &[0, 1]]);
        let config = MatcherConfig::builder()
            .with_time_limit(Duration::ZERO)
            .with_interrupt(Arc::new(AtomicBool::new(true)))
            .build();
        let report = DeviceMatcher::new(config)
            .run_configured::<IntegerType, _, _>(&["A", "C"], &centers, &links)
            .unwrap();
        assert!(matches!(
            report.outcome().no_solution_reason(),
            Some(NoSolutionReason::Aborted(_))
        ));
        assert_eq!(report.to_string(), "No solution found.\n");
    }
}
