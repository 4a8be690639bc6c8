// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use eikonal_mesh::{Algorithm, EikonalSolver, TriangleMesh, UniformCost, VertexCost};

fn square(n: usize) -> Arc<TriangleMesh> {
    Arc::new(TriangleMesh::rectangle(0.0, 0.0, 1.0, 1.0, n, n).unwrap())
}

fn centre(n: usize) -> usize {
    (n / 2) * (n + 1) + n / 2
}

fn make_solver(
    mesh: &Arc<TriangleMesh>,
    n: usize,
    algorithm: Algorithm,
    threads: usize,
) -> EikonalSolver<UniformCost> {
    EikonalSolver::new(
        Arc::clone(mesh),
        UniformCost::default(),
        algorithm,
        &[centre(n)],
    )
    .unwrap()
    .with_threads(threads)
    .unwrap()
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Every algorithm on a 128x128 square, single thread where it applies.
fn bench_algorithms(c: &mut Criterion) {
    let n = 128;
    let mesh = square(n);
    let mut group = c.benchmark_group("algorithms_128x128");
    for algorithm in Algorithm::ALL {
        group.bench_function(algorithm.name(), |b| {
            b.iter_with_setup(
                || make_solver(&mesh, n, algorithm, 1),
                |mut solver| {
                    solver.solve().unwrap();
                    black_box(solver)
                },
            );
        });
    }
    group.finish();
}

/// Thread scaling of the lock-free FIM on a 256x256 square.
fn bench_thread_scaling(c: &mut Criterion) {
    let n = 256;
    let mesh = square(n);
    let cpus = num_cpus();
    let mut group = c.benchmark_group("parallel_fim_256x256");
    for &threads in &[1, 2, 4, 8] {
        if threads <= cpus {
            group.bench_function(format!("{}threads", threads), |b| {
                b.iter_with_setup(
                    || make_solver(&mesh, n, Algorithm::ParallelFim, threads),
                    |mut solver| {
                        solver.solve().unwrap();
                        black_box(solver)
                    },
                );
            });
        }
    }
    group.finish();
}

/// Mesh size scaling of FMM.
fn bench_mesh_size_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("fmm_mesh_size");
    for &n in &[64, 128, 256, 512] {
        let mesh = square(n);
        group.bench_function(format!("{}x{}", n, n), |b| {
            b.iter_with_setup(
                || make_solver(&mesh, n, Algorithm::Fmm, 1),
                |mut solver| {
                    solver.solve().unwrap();
                    black_box(solver)
                },
            );
        });
    }
    group.finish();
}

/// Incremental re-solve after a local cost change, against a full solve.
fn bench_incremental(c: &mut Criterion) {
    let n = 128;
    let mesh = square(n);
    let count = mesh.vertex_count();
    let patch: Vec<usize> = (0..count)
        .filter(|&v| {
            let p = mesh.position(v);
            (0.7..0.8).contains(&p.x) && (0.7..0.8).contains(&p.y)
        })
        .collect();

    let mut group = c.benchmark_group("incremental_128x128");
    for algorithm in [Algorithm::Fmm, Algorithm::Ifim, Algorithm::Dfmm] {
        group.bench_function(algorithm.name(), |b| {
            b.iter_with_setup(
                || {
                    let cost = VertexCost::new(vec![1.0; count]).unwrap();
                    let mut solver =
                        EikonalSolver::new(Arc::clone(&mesh), cost, algorithm, &[0]).unwrap();
                    solver.solve().unwrap();
                    for &v in &patch {
                        solver.cost_mut().set(v, 4.0).unwrap();
                    }
                    solver
                },
                |mut solver| {
                    solver.update().unwrap();
                    black_box(solver)
                },
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_algorithms,
    bench_thread_scaling,
    bench_mesh_size_scaling,
    bench_incremental,
);
criterion_main!(benches);
