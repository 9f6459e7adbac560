use borderkit::{
    Bordered, BorderScaling, BorderedSolver, BorderingBls, DenseLuSolver, Matrix, MatrixBls,
};
use borderkit_core::vector::euclidean;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mdarray::DTensor;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

struct Inputs {
    j: Matrix<f64>,
    col: Vec<Vec<f64>>,
    row: Vec<Vec<f64>>,
    corner: Matrix<f64>,
    r: Vec<f64>,
    s: Vec<f64>,
}

fn random_inputs(n: usize, seed: u64) -> Inputs {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut j = DTensor::<f64, 2>::from_fn([n, n], |_| rng.random::<f64>() - 0.5);
    for i in 0..n {
        j[[i, i]] += n as f64;
    }
    Inputs {
        j,
        col: vec![(0..n).map(|_| rng.random::<f64>()).collect()],
        row: vec![(0..n).map(|_| rng.random::<f64>()).collect()],
        corner: DTensor::<f64, 2>::from_fn([1, 1], |_| 1.0 + rng.random::<f64>()),
        r: (0..n).map(|_| rng.random::<f64>()).collect(),
        s: vec![rng.random::<f64>()],
    }
}

fn bench_backends(c: &mut Criterion) {
    let mut group = c.benchmark_group("bordered_solve");

    for &size in &[10, 50, 100, 200] {
        let inputs = random_inputs(size, 42);
        let sys = Bordered::new(
            &inputs.j,
            &inputs.col,
            &inputs.row,
            &inputs.corner,
            None,
        )
        .unwrap();

        let elimination = BorderingBls::new(DenseLuSolver);
        group.bench_with_input(BenchmarkId::new("elimination", size), &size, |b, _| {
            b.iter(|| {
                elimination
                    .solve_bordered(
                        &sys,
                        &inputs.r,
                        &inputs.s,
                        &BorderScaling::default(),
                        &euclidean,
                    )
                    .unwrap()
            });
        });

        let assembly = MatrixBls::new(DenseLuSolver);
        group.bench_with_input(BenchmarkId::new("assembly", size), &size, |b, _| {
            b.iter(|| {
                assembly
                    .solve_bordered(
                        &sys,
                        &inputs.r,
                        &inputs.s,
                        &BorderScaling::default(),
                        &euclidean,
                    )
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_backends);
criterion_main!(benches);
