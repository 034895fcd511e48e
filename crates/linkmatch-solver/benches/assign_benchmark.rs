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

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use linkmatch_bnb::bnb::BnbSolver;
use linkmatch_hungarian::hungarian::HungarianSolver;
use linkmatch_model::{
    link::LinkIndex,
    matrix::{CostMatrix, CostMatrixBuilder},
    signature::CenterToken,
};
use linkmatch_solver::assigner::Assigner;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::hint::black_box;

fn random_matrix(seed: u64, num_devices: usize, num_centers: usize) -> CostMatrix<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let costs = (0..num_devices * num_centers)
        .map(|_| rng.random_range(0..32))
        .collect();
    CostMatrix::from_flat(num_devices, num_centers, costs)
}

/// A ring of `n` devices named `D0..D{n-1}` with both link directions, and
/// `n` random center tokens over those links.
fn random_topology(seed: u64, n: usize) -> (Vec<String>, Vec<String>, Vec<CenterToken>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let devices: Vec<String> = (0..n).map(|i| format!("D{:04}", i)).collect();
    let links: Vec<String> = (0..n)
        .flat_map(|i| {
            let j = (i + 1) % n;
            [
                format!("{}.{}", devices[i], devices[j]),
                format!("{}.{}", devices[j], devices[i]),
            ]
        })
        .collect();
    let centers = (0..n)
        .map(|_| CenterToken::new((0..links.len()).map(|_| rng.random_range(0..2u8)).collect()))
        .collect();
    (devices, links, centers)
}

fn bench_backends(c: &mut Criterion) {
    let mut group = c.benchmark_group("assign");
    let assigner = Assigner::new();

    for &(d, cc) in &[(8usize, 10usize), (32, 40), (128, 128)] {
        let matrix = random_matrix(0xC0FFEE, d, cc);
        group.throughput(Throughput::Elements((d * cc) as u64));

        group.bench_with_input(
            BenchmarkId::new("hungarian", format!("{}x{}", d, cc)),
            &matrix,
            |b, m| {
                let mut solver = HungarianSolver::preallocated(d, cc);
                b.iter(|| black_box(assigner.assign(black_box(m), &mut solver)))
            },
        );

        // Exhaustive search blows up quickly on random costs.
        if d <= 8 {
            group.bench_with_input(
                BenchmarkId::new("bnb", format!("{}x{}", d, cc)),
                &matrix,
                |b, m| {
                    let mut solver = BnbSolver::new();
                    b.iter(|| black_box(assigner.assign(black_box(m), &mut solver)))
                },
            );
        }
    }

    group.finish();
}

fn bench_cost_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("cost_matrix");

    for &n in &[64usize, 256] {
        let (devices, links, centers) = random_topology(7, n);
        let index = LinkIndex::new(links.iter().map(String::as_str));

        for threads in [1usize, 4] {
            group.bench_function(BenchmarkId::new(format!("threads_{}", threads), n), |b| {
                let builder = CostMatrixBuilder::new(&index).with_threads(threads);
                b.iter(|| {
                    black_box(
                        builder
                            .build::<i64, _>(black_box(devices.as_slice()), black_box(centers.as_slice()))
                            .expect("tokens match the universe"),
                    )
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_backends, bench_cost_matrix);
criterion_main!(benches);
